use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::{
    error::{ConfigError, Result},
    executor::FfmpegExecutor,
    pipeline::output::{BitDepth, OutputFormat},
};

/// Preset name that leaves the manual values untouched
pub const MANUAL_PRESET: &str = "Manual";

/// Streaming and broadcast loudness targets: (LUFS, dBTP)
pub const LOUDNESS_PRESETS: &[(&str, Option<(f64, f64)>)] = &[
    (MANUAL_PRESET, None),
    ("Spotify (-14 LUFS / -1.0 dBTP)", Some((-14.0, -1.0))),
    ("YouTube (-14 LUFS / -1.0 dBTP)", Some((-14.0, -1.0))),
    ("Apple Music (-16 LUFS / -1.0 dBTP)", Some((-16.0, -1.0))),
    ("Amazon Music (-14 LUFS / -1.0 dBTP)", Some((-14.0, -1.0))),
    ("Tidal (-14 LUFS / -1.0 dBTP)", Some((-14.0, -1.0))),
    ("Deezer (-14 LUFS / -1.0 dBTP)", Some((-14.0, -1.0))),
    ("SoundCloud (-14 LUFS / -1.0 dBTP)", Some((-14.0, -1.0))),
    ("Podcast (-16 LUFS / -1.0 dBTP)", Some((-16.0, -1.0))),
    ("Broadcast EBU R128 (-23 LUFS / -2.0 dBTP)", Some((-23.0, -2.0))),
];

/// Delivery formats: (sample rate, bit depth)
pub const OUTPUT_PRESETS: &[(&str, Option<(u32, BitDepth)>)] = &[
    (MANUAL_PRESET, None),
    ("Studio Max (96 kHz / 24-bit)", Some((96000, BitDepth::TwentyFour))),
    ("Hi-Res (48 kHz / 24-bit)", Some((48000, BitDepth::TwentyFour))),
    ("Tidal (48 kHz / 24-bit)", Some((48000, BitDepth::TwentyFour))),
    ("Apple Music (48 kHz / 24-bit)", Some((48000, BitDepth::TwentyFour))),
    ("Spotify (44.1 kHz / 16-bit)", Some((44100, BitDepth::Sixteen))),
    ("YouTube Music (44.1 kHz / 16-bit)", Some((44100, BitDepth::Sixteen))),
    ("SoundCloud (44.1 kHz / 16-bit)", Some((44100, BitDepth::Sixteen))),
];

/// Input extensions accepted by batch discovery
pub const INPUT_FORMATS: &[&str] = &["wav", "aiff", "aif", "flac"];

/// Look up a loudness preset; `Ok(None)` for the manual preset
pub fn loudness_preset(name: &str) -> Result<Option<(f64, f64)>> {
    LOUDNESS_PRESETS
        .iter()
        .find(|(preset, _)| preset.eq_ignore_ascii_case(name))
        .map(|(_, values)| *values)
        .ok_or_else(|| ConfigError::UnknownPreset { name: name.to_string() }.into())
}

/// Look up an output preset; `Ok(None)` for the manual preset
pub fn output_preset(name: &str) -> Result<Option<(u32, BitDepth)>> {
    OUTPUT_PRESETS
        .iter()
        .find(|(preset, _)| preset.eq_ignore_ascii_case(name))
        .map(|(_, values)| *values)
        .ok_or_else(|| ConfigError::UnknownPreset { name: name.to_string() }.into())
}

/// Main configuration for a mastering run
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Loudness targets and preset names
    pub targets: TargetConfig,

    /// Optional processing stages
    pub processing: ProcessingOptions,

    /// Signature written as output tags
    pub signature: Signature,

    /// External executor binaries
    pub tools: ToolsConfig,
}

impl Config {
    /// Load configuration from a TOML file
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        let content = std::fs::read_to_string(path)
            .map_err(|_| ConfigError::FileNotFound { path: path.display().to_string() })?;

        let config: Config = toml::from_str(&content)
            .map_err(|_| ConfigError::ParseFailed { path: path.display().to_string() })?;
        Ok(config)
    }

    /// Save configuration to a TOML file
    pub fn save_to_file<P: AsRef<Path>>(&self, path: P) -> Result<()> {
        let content = toml::to_string_pretty(self)
            .map_err(|e| ConfigError::InvalidValue {
                key: "config".to_string(),
                value: e.to_string()
            })?;

        std::fs::write(path, content)?;
        Ok(())
    }

    /// Overwrite manual values with the ones implied by the selected presets
    pub fn apply_presets(&mut self) -> Result<()> {
        if let Some((lufs, true_peak)) = loudness_preset(&self.targets.loudness_preset)? {
            self.targets.target_lufs = lufs;
            self.targets.true_peak = true_peak;
        }
        if let Some((sample_rate, bit_depth)) = output_preset(&self.targets.output_preset)? {
            self.processing.output.sample_rate = Some(sample_rate);
            self.processing.output.bit_depth = Some(bit_depth);
        }
        Ok(())
    }

    /// Processing options with the signature folded into the metadata tags
    pub fn processing_options(&self) -> ProcessingOptions {
        let mut options = self.processing.clone();
        options.metadata.extend(self.signature.to_tags());
        options
    }

    pub fn executor(&self) -> FfmpegExecutor {
        FfmpegExecutor::with_paths(&self.tools.ffmpeg, &self.tools.ffprobe)
    }

    /// Validate the configuration
    pub fn validate(&self) -> Result<()> {
        self.targets.validate()?;
        self.processing.validate()?;
        Ok(())
    }
}

fn invalid(key: &str, value: impl ToString) -> crate::error::MasteringError {
    ConfigError::InvalidValue {
        key: key.to_string(),
        value: value.to_string(),
    }
    .into()
}

/// Loudness targets
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct TargetConfig {
    /// Integrated loudness target (LUFS)
    pub target_lufs: f64,

    /// True-peak ceiling (dBTP)
    pub true_peak: f64,

    /// Name from [`LOUDNESS_PRESETS`]
    pub loudness_preset: String,

    /// Name from [`OUTPUT_PRESETS`]
    pub output_preset: String,
}

impl Default for TargetConfig {
    fn default() -> Self {
        Self {
            target_lufs: -14.0,
            true_peak: -1.0,
            loudness_preset: MANUAL_PRESET.to_string(),
            output_preset: MANUAL_PRESET.to_string(),
        }
    }
}

impl TargetConfig {
    fn validate(&self) -> Result<()> {
        if !(-70.0..=0.0).contains(&self.target_lufs) {
            return Err(invalid("targets.target_lufs", self.target_lufs));
        }

        if !(-9.0..=0.0).contains(&self.true_peak) {
            return Err(invalid("targets.true_peak", self.true_peak));
        }

        loudness_preset(&self.loudness_preset)?;
        output_preset(&self.output_preset)?;
        Ok(())
    }
}

/// Bus compression settings as entered by the user (milliseconds, dB)
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct GlueSettings {
    pub enabled: bool,
    pub threshold_db: f64,
    pub ratio: f64,
    pub attack_ms: f64,
    pub release_ms: f64,
    pub makeup_db: f64,
}

impl Default for GlueSettings {
    fn default() -> Self {
        Self {
            enabled: false,
            threshold_db: -18.0,
            ratio: 1.6,
            attack_ms: 20.0,
            release_ms: 120.0,
            makeup_db: 0.0,
        }
    }
}

/// Output encoding overrides; `None` keeps the container default
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct OutputSettings {
    pub sample_rate: Option<u32>,
    pub bit_depth: Option<BitDepth>,
    pub format: Option<OutputFormat>,
}

/// Every optional stage of a run. Read-only once processing starts.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ProcessingOptions {
    /// Per-band compander driven by the measured band profile
    pub dynamic_eq: bool,

    /// Per-band side level shaping
    pub stereo_width: bool,

    pub deesser: bool,

    /// Final limiter below the true-peak ceiling
    pub brickwall: bool,

    /// Fade-in length (s); 0 disables
    pub fade_in_s: f64,

    /// Fade-out length (s); 0 disables
    pub fade_out_s: f64,

    /// Narrower band window and smaller corrections
    pub transparent_mode: bool,

    /// Measure and report only, render nothing
    pub analyze_only: bool,

    /// Replace an existing output file
    pub overwrite: bool,

    pub glue: GlueSettings,

    pub output: OutputSettings,

    /// Output tags; empty values are not written
    pub metadata: BTreeMap<String, String>,
}

impl ProcessingOptions {
    fn validate(&self) -> Result<()> {
        if self.fade_in_s < 0.0 {
            return Err(invalid("processing.fade_in_s", self.fade_in_s));
        }

        if self.fade_out_s < 0.0 {
            return Err(invalid("processing.fade_out_s", self.fade_out_s));
        }

        if self.glue.ratio < 1.0 {
            return Err(invalid("processing.glue.ratio", self.glue.ratio));
        }

        if self.output.sample_rate == Some(0) {
            return Err(invalid("processing.output.sample_rate", 0));
        }

        Ok(())
    }
}

/// Authorship fields written as output tags
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Signature {
    pub artist: String,
    pub comment: String,
    /// A literal `<Artist>` is replaced by the artist name
    pub copyright: String,
    /// Written as both publisher and encoder
    pub company: String,
    pub url: String,
    pub contact: String,
}

impl Signature {
    pub fn to_tags(&self) -> BTreeMap<String, String> {
        let copyright = self.copyright.trim().replace("<Artist>", self.artist.trim());
        [
            ("artist", self.artist.trim().to_string()),
            ("comment", self.comment.trim().to_string()),
            ("copyright", copyright),
            ("publisher", self.company.trim().to_string()),
            ("encoded_by", self.company.trim().to_string()),
            ("url", self.url.trim().to_string()),
            ("contact", self.contact.trim().to_string()),
        ]
        .into_iter()
        .filter(|(_, value)| !value.is_empty())
        .map(|(key, value)| (key.to_string(), value))
        .collect()
    }
}

/// Executor binaries, looked up on PATH unless absolute
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ToolsConfig {
    pub ffmpeg: PathBuf,
    pub ffprobe: PathBuf,
}

impl Default for ToolsConfig {
    fn default() -> Self {
        Self {
            ffmpeg: PathBuf::from("ffmpeg"),
            ffprobe: PathBuf::from("ffprobe"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    #[test]
    fn test_default_config_is_valid() {
        let config = Config::default();
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_config_roundtrip() {
        let dir = tempdir().unwrap();
        let file_path = dir.path().join("test_config.toml");

        let mut original_config = Config::default();
        original_config.processing.dynamic_eq = true;
        original_config.processing.output.format = Some(OutputFormat::Flac);
        original_config.processing.output.bit_depth = Some(BitDepth::TwentyFour);

        original_config.save_to_file(&file_path).unwrap();
        let loaded_config = Config::from_file(&file_path).unwrap();

        assert_eq!(original_config.processing, loaded_config.processing);
        assert_eq!(original_config.targets.target_lufs, loaded_config.targets.target_lufs);
    }

    #[test]
    fn test_partial_file_uses_defaults() {
        let dir = tempdir().unwrap();
        let file_path = dir.path().join("partial.toml");
        std::fs::write(
            &file_path,
            "[targets]\nloudness_preset = \"Podcast (-16 LUFS / -1.0 dBTP)\"\n\n[processing.glue]\nenabled = true\n",
        )
        .unwrap();

        let mut config = Config::from_file(&file_path).unwrap();
        config.apply_presets().unwrap();
        assert_eq!(config.targets.target_lufs, -16.0);
        assert!(config.processing.glue.enabled);
        assert_eq!(config.processing.glue.ratio, 1.6);
    }

    #[test]
    fn test_output_preset_sets_rate_and_depth() {
        let mut config = Config::default();
        config.targets.output_preset = "Hi-Res (48 kHz / 24-bit)".to_string();
        config.apply_presets().unwrap();
        assert_eq!(config.processing.output.sample_rate, Some(48000));
        assert_eq!(config.processing.output.bit_depth, Some(BitDepth::TwentyFour));
    }

    #[test]
    fn test_invalid_values() {
        let mut config = Config::default();
        config.targets.true_peak = 2.0;
        assert!(config.validate().is_err());

        let mut config = Config::default();
        config.processing.fade_out_s = -1.0;
        assert!(config.validate().is_err());

        let mut config = Config::default();
        config.targets.loudness_preset = "Vinyl".to_string();
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_signature_tags() {
        let signature = Signature {
            artist: "Ana".to_string(),
            comment: "Master v2".to_string(),
            copyright: "(c) 2026 <Artist>".to_string(),
            company: "Sello".to_string(),
            url: String::new(),
            contact: "ana@example.com".to_string(),
        };

        let tags = signature.to_tags();
        assert_eq!(tags.get("copyright").map(String::as_str), Some("(c) 2026 Ana"));
        assert_eq!(tags.get("publisher"), tags.get("encoded_by"));
        assert!(!tags.contains_key("url"));
        assert_eq!(tags.len(), 6);
    }
}
