//! # Audio Analysis Module
//!
//! Turns executor text output into structured measurements.
//!
//! ## Core Features
//!
//! - **Loudness statistics**: the JSON block printed by the two-pass
//!   loudness filter (integrated loudness, true peak, LRA, threshold, offset)
//! - **Band energy**: band-limited RMS levels for six bands from sub-bass to
//!   air, plus a fixed vocal range
//! - **Band suggestions**: bands sitting outside `mean ± range` of the profile
//!
//! ## Usage
//!
//! ```rust,no_run
//! use loudmaster::analysis::{BandAnalyzer, BAND_CONFIG};
//! use loudmaster::executor::FfmpegExecutor;
//!
//! # fn main() -> loudmaster::Result<()> {
//! let executor = FfmpegExecutor::new();
//! let analysis = BandAnalyzer::new(&executor)
//!     .analyze_bands("mix.wav".as_ref(), &BAND_CONFIG, 3.0)?;
//!
//! for suggestion in &analysis.suggestions {
//!     println!("{}", suggestion);
//! }
//! # Ok(())
//! # }
//! ```

pub mod bands;
pub mod measurement;
pub mod types;

pub use bands::{suggest_adjustments, BandAnalysis, BandAnalyzer};
pub use measurement::{parse_last_rms, parse_loudness_stats};
pub use types::{
    BandDefinition, BandEnergy, BandSuggestion, Imbalance, LoudnessStats, MeasuredInputs, VoiceBand,
    BAND_CONFIG, VOICE_BAND,
};
