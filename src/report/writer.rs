use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

use chrono::Utc;
use serde::{Deserialize, Serialize};
use tracing::info;

use crate::analysis::{BandEnergy, LoudnessStats};
use crate::config::ProcessingOptions;
use crate::error::{ReportError, Result};
use crate::pipeline::LoudnessTargets;
use crate::report::evaluate::EvaluationResult;

/// Preset names shown in the report; they do not affect processing
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PresetNames {
    pub loudness: String,
    pub output: String,
}

impl Default for PresetNames {
    fn default() -> Self {
        Self {
            loudness: crate::config::MANUAL_PRESET.to_string(),
            output: crate::config::MANUAL_PRESET.to_string(),
        }
    }
}

fn round2(value: f64) -> f64 {
    (value * 100.0).round() / 100.0
}

/// Band label as a bare report key: `Low-Mid (250-500 Hz)` → `Low_Mid_250_500_Hz`
pub fn normalize_band_key(label: &str) -> String {
    label
        .chars()
        .filter(|c| !matches!(c, '(' | ')'))
        .map(|c| match c {
            ' ' | '-' | '/' => '_',
            other => other,
        })
        .collect()
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ReportSettings {
    pub loudness_preset: String,
    pub output_preset: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub output_format: Option<String>,
    pub target_lufs: f64,
    pub true_peak: f64,
    pub dynamic_eq: bool,
    pub stereo_width: bool,
    pub brickwall: bool,
    pub deesser: bool,
    pub glue: bool,
    pub transparent_mode: bool,
    pub fade_in: f64,
    pub fade_out: f64,
    pub analyze_only: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub output_sample_rate: Option<u32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub output_bit_depth: Option<String>,
}

impl ReportSettings {
    pub fn new(presets: &PresetNames, targets: LoudnessTargets, options: &ProcessingOptions) -> Self {
        Self {
            loudness_preset: presets.loudness.clone(),
            output_preset: presets.output.clone(),
            output_format: options.output.format.map(|f| f.to_string()),
            target_lufs: round2(targets.lufs),
            true_peak: round2(targets.true_peak),
            dynamic_eq: options.dynamic_eq,
            stereo_width: options.stereo_width,
            brickwall: options.brickwall,
            deesser: options.deesser,
            glue: options.glue.enabled,
            transparent_mode: options.transparent_mode,
            fade_in: round2(options.fade_in_s),
            fade_out: round2(options.fade_out_s),
            analyze_only: options.analyze_only,
            output_sample_rate: options.output.sample_rate,
            output_bit_depth: options.output.bit_depth.map(|d| d.to_string()),
        }
    }
}

/// Loudness, voice and band levels of one file plus their evaluation
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MeasurementBlock {
    pub input_i: f64,
    pub input_tp: f64,
    pub input_lra: f64,
    pub input_thresh: f64,
    pub target_offset: f64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub voice_rms: Option<f64>,
    pub rating: String,
    pub advice: Vec<String>,
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub bands: BTreeMap<String, f64>,
}

impl MeasurementBlock {
    pub fn new(stats: &LoudnessStats, bands: &BandEnergy, voice_rms: Option<f64>, evaluation: &EvaluationResult) -> Self {
        Self {
            input_i: round2(stats.integrated),
            input_tp: round2(stats.true_peak.unwrap_or(0.0)),
            input_lra: round2(stats.loudness_range.unwrap_or(0.0)),
            input_thresh: round2(stats.threshold.unwrap_or(0.0)),
            target_offset: round2(stats.target_offset.unwrap_or(0.0)),
            voice_rms: voice_rms.map(round2),
            rating: evaluation.rating.label().to_string(),
            advice: evaluation.advice.clone(),
            bands: bands
                .iter()
                .map(|(label, rms)| (normalize_band_key(label), round2(rms)))
                .collect(),
        }
    }
}

/// Persisted summary of one run: settings, the input measurement and, when
/// a file was rendered, the output measurement
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MasteringReport {
    /// RFC 3339 creation time
    pub generated_at: String,
    pub settings: ReportSettings,
    /// Metadata tags written into the rendered file
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub signature: BTreeMap<String, String>,
    pub before: MeasurementBlock,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub after: Option<MeasurementBlock>,
}

impl MasteringReport {
    pub fn new(settings: ReportSettings, before: MeasurementBlock, after: Option<MeasurementBlock>) -> Self {
        Self {
            generated_at: Utc::now().to_rfc3339(),
            settings,
            signature: BTreeMap::new(),
            before,
            after,
        }
    }

    pub fn with_signature(mut self, tags: &BTreeMap<String, String>) -> Self {
        self.signature = tags.clone();
        self
    }

    /// Report location for a given output: same path, `.toml` extension
    pub fn path_for(output: &Path) -> PathBuf {
        output.with_extension("toml")
    }

    pub fn to_toml(&self) -> Result<String> {
        toml::to_string(self).map_err(|e| ReportError::SerializeFailed { reason: e.to_string() }.into())
    }

    /// Write next to `output` and return the report path. Not atomic.
    pub fn write(&self, output: &Path) -> Result<PathBuf> {
        let path = Self::path_for(output);
        std::fs::write(&path, self.to_toml()?)?;
        info!("📝 Report written to {:?}", path);
        Ok(path)
    }

    pub fn read_from<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        let content = std::fs::read_to_string(path)?;
        toml::from_str(&content).map_err(|e| {
            ReportError::ParseFailed {
                path: path.display().to_string(),
                reason: e.to_string(),
            }
            .into()
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::analysis::BAND_CONFIG;
    use crate::pipeline::output::{BitDepth, OutputFormat};
    use crate::report::evaluate::evaluate;
    use tempfile::tempdir;

    fn targets() -> LoudnessTargets {
        LoudnessTargets { lufs: -14.0, true_peak: -1.0 }
    }

    fn block(stats: &LoudnessStats, voice: Option<f64>) -> MeasurementBlock {
        let bands: BandEnergy = BAND_CONFIG
            .iter()
            .zip([-30.123, -20.456, -22.0, -21.0, -25.0, -35.999])
            .map(|(band, rms)| (band.label, rms))
            .collect();
        MeasurementBlock::new(stats, &bands, voice, &evaluate(stats, targets()))
    }

    #[test]
    fn test_band_keys_are_bare() {
        assert_eq!(normalize_band_key("Low-Mid (250-500 Hz)"), "Low_Mid_250_500_Hz");
        assert_eq!(normalize_band_key("Voz (300-3k Hz)"), "Voz_300_3k_Hz");
        assert_eq!(normalize_band_key("A/B"), "A_B");
    }

    #[test]
    fn test_report_roundtrip() {
        let dir = tempdir().unwrap();
        let output = dir.path().join("master.wav");

        let mut options = ProcessingOptions { dynamic_eq: true, brickwall: true, ..Default::default() };
        options.output.format = Some(OutputFormat::Wav);
        options.output.bit_depth = Some(BitDepth::TwentyFour);
        options.output.sample_rate = Some(48000);
        options.metadata.insert("artist".to_string(), "Ana \"La Voz\" Ruiz".to_string());
        options.metadata.insert("copyright".to_string(), "© 2026 Ana Ruiz".to_string());

        let before = LoudnessStats::new(-20.004, -3.456, 6.789, -30.5, 0.126);
        let after = LoudnessStats::new(-14.02, -1.01, 5.5, -24.3, 0.01);
        let report = MasteringReport::new(
            ReportSettings::new(&PresetNames::default(), targets(), &options),
            block(&before, Some(-19.876)),
            Some(block(&after, None)),
        )
        .with_signature(&options.metadata);

        let path = report.write(&output).unwrap();
        assert_eq!(path, dir.path().join("master.toml"));

        let loaded = MasteringReport::read_from(&path).unwrap();
        assert_eq!(loaded, report);
        assert_eq!(loaded.before.input_tp, -3.46);
        assert_eq!(loaded.before.voice_rms, Some(-19.88));
        assert_eq!(loaded.before.bands.get("Air_6k_16k_Hz"), Some(&-36.0));
        assert_eq!(loaded.settings.output_bit_depth.as_deref(), Some("24"));
        assert!(loaded.after.is_some());
        assert_eq!(loaded.signature, options.metadata);
        assert_eq!(loaded.signature.get("artist").map(String::as_str), Some("Ana \"La Voz\" Ruiz"));
    }

    #[test]
    fn test_analyze_only_report_has_no_after_block() {
        let stats = LoudnessStats::new(-16.0, -2.0, 7.0, -26.0, 1.0);
        let options = ProcessingOptions { analyze_only: true, ..Default::default() };
        let report = MasteringReport::new(
            ReportSettings::new(&PresetNames::default(), targets(), &options),
            block(&stats, None),
            None,
        );

        let text = report.to_toml().unwrap();
        assert!(text.contains("[before]"));
        assert!(text.contains("[before.bands]"));
        assert!(!text.contains("[after]"));
        assert!(!text.contains("output_format"));
        assert!(!text.contains("[signature]"));
    }

    #[test]
    fn test_free_text_is_escaped() {
        let stats = LoudnessStats::new(-16.0, -2.0, 7.0, -26.0, 1.0);
        let presets = PresetNames {
            loudness: "Custom \"loud\" \\ preset".to_string(),
            output: "Manual".to_string(),
        };
        let report = MasteringReport::new(
            ReportSettings::new(&presets, targets(), &ProcessingOptions::default()),
            block(&stats, None),
            None,
        );

        let parsed: MasteringReport = toml::from_str(&report.to_toml().unwrap()).unwrap();
        assert_eq!(parsed.settings.loudness_preset, presets.loudness);
    }
}
