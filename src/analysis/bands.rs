use std::path::Path;

use tracing::{debug, info, warn};

use crate::analysis::measurement::parse_last_rms;
use crate::analysis::types::{BandDefinition, BandEnergy, BandSuggestion, Imbalance, VoiceBand, VOICE_BAND};
use crate::error::{ExecutorError, MasteringError, Result};
use crate::executor::{base_args, null_sink_args, Executor};

/// Per-band energy profile of one file plus the advisory notes derived from it
#[derive(Debug, Clone, Default, PartialEq)]
pub struct BandAnalysis {
    pub energy: BandEnergy,
    pub suggestions: Vec<BandSuggestion>,
}

/// Measures band-limited RMS energy through the executor, one invocation per band
pub struct BandAnalyzer<'a, E: Executor + ?Sized> {
    executor: &'a E,
}

impl<'a, E: Executor + ?Sized> BandAnalyzer<'a, E> {
    pub fn new(executor: &'a E) -> Self {
        Self { executor }
    }

    /// Measure every band and flag those outside `mean ± band_range_db`.
    ///
    /// A band whose invocation exits non-zero or prints no RMS value is left
    /// out of the result. Only an executor that cannot be launched at all is
    /// an error.
    pub fn analyze_bands(&self, input: &Path, bands: &[BandDefinition], band_range_db: f64) -> Result<BandAnalysis> {
        info!("Analyzing {} frequency bands of {:?}", bands.len(), input);

        let mut energy = BandEnergy::new();
        for band in bands {
            match self.measure_band(input, band.low_hz, band.high_hz, band.label)? {
                Some(rms) => {
                    debug!("   {}: {:.2} dB", band.label, rms);
                    energy.insert(band.label, rms);
                }
                None => warn!("Skipping band {}: no RMS level measured", band.label),
            }
        }

        let suggestions = suggest_adjustments(&energy, band_range_db);
        Ok(BandAnalysis { energy, suggestions })
    }

    /// RMS level of the fixed vocal range, reported alongside the band profile
    pub fn analyze_voice_band(&self, input: &Path) -> Result<Option<f64>> {
        let VoiceBand { label, low_hz, high_hz } = VOICE_BAND;
        let rms = self.measure_band(input, low_hz, high_hz, label)?;
        if rms.is_none() {
            warn!("Voice band {} could not be measured", label);
        }
        Ok(rms)
    }

    fn measure_band(&self, input: &Path, low_hz: u32, high_hz: u32, label: &str) -> Result<Option<f64>> {
        let mut args = base_args();
        args.extend([
            "-i".to_string(),
            input.display().to_string(),
            "-af".to_string(),
            band_filter(low_hz, high_hz),
        ]);
        args.extend(null_sink_args());

        match self.executor.run_checked(&format!("band analysis ({label})"), &args) {
            Ok(output) => Ok(parse_last_rms(&output.combined())),
            Err(MasteringError::Executor(ExecutorError::Failed { stderr, .. })) => {
                warn!("Band analysis for {} failed: {}", label, stderr);
                Ok(None)
            }
            Err(e) => Err(e),
        }
    }
}

/// Band-pass followed by a statistics filter that resets per frame
pub fn band_filter(low_hz: u32, high_hz: u32) -> String {
    format!("highpass=f={low_hz},lowpass=f={high_hz},astats=metadata=1:reset=1")
}

/// Flag bands above `mean + range` as excess and below `mean - range` as deficit
pub fn suggest_adjustments(energy: &BandEnergy, band_range_db: f64) -> Vec<BandSuggestion> {
    let Some(mean) = energy.mean() else {
        return Vec::new();
    };

    energy
        .iter()
        .filter_map(|(label, rms)| {
            let kind = if rms > mean + band_range_db {
                Imbalance::Excess
            } else if rms < mean - band_range_db {
                Imbalance::Deficit
            } else {
                return None;
            };
            Some(BandSuggestion {
                band: label.to_string(),
                kind,
                rms_db: rms,
            })
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::analysis::types::BAND_CONFIG;
    use crate::executor::testing::{astats_summary, ScriptedExecutor};

    #[test]
    fn test_excess_and_deficit_around_mean() {
        let energy: BandEnergy = BAND_CONFIG
            .iter()
            .zip([-10.0, -10.0, -10.0, -10.0, -10.0, -40.0])
            .map(|(band, rms)| (band.label, rms))
            .collect();
        assert!((energy.mean().unwrap() + 15.0).abs() < 1e-9);

        let suggestions = suggest_adjustments(&energy, 3.0);
        assert_eq!(suggestions.len(), 6);
        assert!(suggestions[..5].iter().all(|s| s.kind == Imbalance::Excess));
        assert_eq!(suggestions[5].kind, Imbalance::Deficit);
        assert_eq!(suggestions[5].band, "Air (6k-16k Hz)");
        assert!(suggestions[5].to_string().contains("posible falta"));
    }

    #[test]
    fn test_balanced_profile_has_no_suggestions() {
        let energy: BandEnergy = [("a", -20.0), ("b", -21.0), ("c", -19.5)].into_iter().collect();
        assert!(suggest_adjustments(&energy, 3.0).is_empty());
        assert!(suggest_adjustments(&BandEnergy::new(), 3.0).is_empty());
    }

    #[test]
    fn test_failed_band_is_skipped() {
        let executor = ScriptedExecutor::new()
            .respond_failure("highpass=f=20,", "Conversion failed!")
            .respond("highpass=f=60,", &astats_summary(-18.0))
            .respond("highpass=f=250,", &astats_summary(-20.0))
            .respond("highpass=f=500,", &astats_summary(-22.0))
            .respond("highpass=f=2000,", &astats_summary(-24.0))
            .respond("highpass=f=6000,", "no statistics printed");

        let analysis = BandAnalyzer::new(&executor)
            .analyze_bands(Path::new("mix.wav"), &BAND_CONFIG, 3.0)
            .unwrap();

        assert_eq!(analysis.energy.len(), 4);
        assert_eq!(analysis.energy.get("Subbass (20-60 Hz)"), None);
        assert_eq!(analysis.energy.get("Bass (60-250 Hz)"), Some(-18.0));
        assert_eq!(analysis.energy.get("Air (6k-16k Hz)"), None);
        assert_eq!(executor.calls().len(), 6);
    }

    #[test]
    fn test_voice_band_uses_fixed_range() {
        let executor = ScriptedExecutor::new().respond("highpass=f=300,lowpass=f=3000", &astats_summary(-19.25));
        let voice = BandAnalyzer::new(&executor)
            .analyze_voice_band(Path::new("mix.wav"))
            .unwrap();
        assert_eq!(voice, Some(-19.25));

        let call = &executor.calls()[0];
        assert_eq!(call[0], "-hide_banner");
        assert_eq!(call[call.len() - 3..], ["-f", "null", "-"]);
    }

    #[test]
    fn test_unavailable_executor_is_fatal() {
        let executor = ScriptedExecutor::new().unavailable();
        let result = BandAnalyzer::new(&executor).analyze_bands(Path::new("mix.wav"), &BAND_CONFIG, 3.0);
        assert!(result.unwrap_err().aborts_batch());
    }
}
