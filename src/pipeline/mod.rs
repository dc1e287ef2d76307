//! # Loudness Pipeline
//!
//! Two-pass normalization and the orchestration around it:
//!
//! 1. **Measure**: the loudness filter runs after the planned filter graph
//!    and prints its statistics
//! 2. **Apply**: the same graph feeds the normalization filter (fed with the
//!    measured values), an optional limiter and fades, then the encoder
//! 3. **Re-measure**: the rendered file is measured and evaluated again
//!
//! [`MasteringEngine`] runs the whole sequence for one file or a batch, and
//! can move it onto a blocking worker thread.

pub mod engine;
pub mod loudness;
pub mod output;

pub use engine::{join_worker, BatchRequest, BatchSummary, MasteringEngine, MasteringOutcome, MasteringRequest};
pub use loudness::{LoudnessPipeline, LoudnessTargets};
pub use output::{batch_output_path, default_output_path, ensure_output_path, BitDepth, OutputFormat};
