//! # Loudmaster
//!
//! Loudness mastering driven by FFmpeg: two-pass normalization to a target
//! integrated loudness and true-peak ceiling, with optional de-essing,
//! multiband dynamic EQ, stereo width shaping, glue compression, limiting
//! and fades, followed by a re-measurement and a before/after report.
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use loudmaster::{
//!     config::Config,
//!     pipeline::{MasteringEngine, MasteringRequest, LoudnessTargets},
//!     report::PresetNames,
//! };
//!
//! # fn main() -> anyhow::Result<()> {
//! let mut config = Config::default();
//! config.processing.brickwall = true;
//!
//! let engine = MasteringEngine::new(config.executor());
//! let outcome = engine.process(&MasteringRequest {
//!     input: "mix.wav".into(),
//!     output: "mix_master.wav".into(),
//!     targets: LoudnessTargets { lufs: -14.0, true_peak: -1.0 },
//!     presets: PresetNames::default(),
//!     options: config.processing_options(),
//! })?;
//!
//! println!("{}", outcome.summary);
//! # Ok(())
//! # }
//! ```
//!
//! ## Architecture
//!
//! - [`executor`] - External executor seam and the FFmpeg implementation
//! - [`analysis`] - Loudness statistics parsing and band energy analysis
//! - [`graph`] - Filter graph stages and their composition
//! - [`pipeline`] - Two-pass normalization, output encoding, engine
//! - [`report`] - Mix evaluation and the persisted report
//! - [`config`] - Configuration and presets

pub mod analysis;
pub mod config;
pub mod error;
pub mod executor;
pub mod graph;
pub mod pipeline;
pub mod report;

// Re-export commonly used types for convenience
pub use crate::{
    config::Config,
    error::{MasteringError, Result},
    executor::{Executor, FfmpegExecutor},
    pipeline::{MasteringEngine, MasteringRequest},
};
