//! # Evaluation and Reporting
//!
//! Scores a loudness measurement against the delivery targets and persists
//! the before/after measurements of a run as a TOML document next to the
//! rendered file.
//!
//! Scoring starts at 100 and deducts fixed amounts for loudness far from
//! target, peaks near or above the ceiling, unusual loudness range and a
//! large recommended offset:
//!
//! | Score   | Rating           |
//! |---------|------------------|
//! | ≥ 85    | Bueno            |
//! | ≥ 65    | Aceptable        |
//! | < 65    | Necesita trabajo |

pub mod evaluate;
pub mod writer;

pub use evaluate::{evaluate, format_analysis_summary, EvaluationResult, Rating};
pub use writer::{normalize_band_key, MasteringReport, MeasurementBlock, PresetNames, ReportSettings};
