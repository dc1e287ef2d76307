use std::collections::BTreeMap;
use std::fmt;
use std::path::{Path, PathBuf};
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::config::OutputSettings;
use crate::error::{MasteringError, OutputError};

pub const MP3_BITRATE: &str = "320k";
pub const M4A_BITRATE: &str = "256k";

/// Extension used when neither a format nor an extension is given
pub const DEFAULT_EXTENSION: &str = "wav";

/// Container/codec requested for the rendered file
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum OutputFormat {
    Wav,
    #[serde(alias = "aif")]
    Aiff,
    Flac,
    M4a,
    Mp3,
}

impl OutputFormat {
    pub fn extension(&self) -> &'static str {
        match self {
            OutputFormat::Wav => "wav",
            OutputFormat::Aiff => "aiff",
            OutputFormat::Flac => "flac",
            OutputFormat::M4a => "m4a",
            OutputFormat::Mp3 => "mp3",
        }
    }
}

impl fmt::Display for OutputFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.extension())
    }
}

impl FromStr for OutputFormat {
    type Err = MasteringError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().trim_start_matches('.').to_ascii_lowercase().as_str() {
            "wav" => Ok(OutputFormat::Wav),
            "aiff" | "aif" => Ok(OutputFormat::Aiff),
            "flac" => Ok(OutputFormat::Flac),
            "m4a" => Ok(OutputFormat::M4a),
            "mp3" => Ok(OutputFormat::Mp3),
            other => Err(OutputError::UnsupportedFormat { format: other.to_string() }.into()),
        }
    }
}

/// PCM bit depth; only meaningful for lossless containers
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum BitDepth {
    #[serde(rename = "16")]
    Sixteen,
    #[serde(rename = "24")]
    TwentyFour,
}

impl BitDepth {
    pub fn bits(&self) -> u32 {
        match self {
            BitDepth::Sixteen => 16,
            BitDepth::TwentyFour => 24,
        }
    }
}

impl fmt::Display for BitDepth {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.bits())
    }
}

impl FromStr for BitDepth {
    type Err = MasteringError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim() {
            "16" => Ok(BitDepth::Sixteen),
            "24" => Ok(BitDepth::TwentyFour),
            other => Err(OutputError::UnsupportedBitDepth { value: other.to_string() }.into()),
        }
    }
}

fn pcm_le(depth: BitDepth) -> &'static str {
    match depth {
        BitDepth::Sixteen => "pcm_s16le",
        BitDepth::TwentyFour => "pcm_s24le",
    }
}

fn pcm_be(depth: BitDepth) -> &'static str {
    match depth {
        BitDepth::Sixteen => "pcm_s16be",
        BitDepth::TwentyFour => "pcm_s24be",
    }
}

/// Sample-rate and codec arguments for the apply pass.
///
/// Without an explicit format the container default codec is kept and only
/// a bit depth override turns into little-endian PCM.
pub fn codec_args(settings: &OutputSettings) -> Vec<String> {
    let mut args: Vec<String> = Vec::new();
    if let Some(rate) = settings.sample_rate {
        args.extend(["-ar".to_string(), rate.to_string()]);
    }

    let mut push = |values: &[&str]| args.extend(values.iter().map(|v| v.to_string()));
    match (settings.format, settings.bit_depth) {
        (Some(OutputFormat::Wav), Some(depth)) | (None, Some(depth)) => push(&["-c:a", pcm_le(depth)]),
        (Some(OutputFormat::Aiff), Some(depth)) => push(&["-c:a", pcm_be(depth)]),
        (Some(OutputFormat::Wav | OutputFormat::Aiff), None) | (None, None) => {}
        (Some(OutputFormat::Flac), depth) => {
            push(&["-c:a", "flac"]);
            match depth {
                Some(BitDepth::Sixteen) => push(&["-sample_fmt", "s16"]),
                Some(BitDepth::TwentyFour) => push(&["-sample_fmt", "s32"]),
                None => {}
            }
        }
        (Some(OutputFormat::M4a), _) => push(&["-c:a", "aac", "-b:a", M4A_BITRATE]),
        (Some(OutputFormat::Mp3), _) => push(&["-c:a", "libmp3lame", "-b:a", MP3_BITRATE]),
    }
    args
}

/// `-metadata key=value` pairs, skipping empty values
pub fn metadata_args(metadata: &BTreeMap<String, String>) -> Vec<String> {
    metadata
        .iter()
        .filter(|(_, value)| !value.is_empty())
        .flat_map(|(key, value)| ["-metadata".to_string(), format!("{key}={value}")])
        .collect()
}

/// Force the extension implied by `format`; fall back to `.wav` when the
/// path has no extension and no format was requested
pub fn ensure_output_path(path: &Path, format: Option<OutputFormat>) -> PathBuf {
    match format {
        Some(format) => {
            let matches = path
                .extension()
                .map(|ext| ext.to_string_lossy().eq_ignore_ascii_case(format.extension()))
                .unwrap_or(false);
            if matches {
                path.to_path_buf()
            } else {
                path.with_extension(format.extension())
            }
        }
        None if path.extension().is_some() => path.to_path_buf(),
        None => path.with_extension(DEFAULT_EXTENSION),
    }
}

/// `<dir>/<stem>_normalized.<ext>` next to the input
pub fn default_output_path(input: &Path, format: Option<OutputFormat>) -> PathBuf {
    let stem = input.file_stem().map(|s| s.to_string_lossy().into_owned()).unwrap_or_default();
    let extension = match format {
        Some(format) => format.extension().to_string(),
        None => input
            .extension()
            .map(|ext| ext.to_string_lossy().into_owned())
            .unwrap_or_else(|| DEFAULT_EXTENSION.to_string()),
    };
    input.with_file_name(format!("{stem}_normalized.{extension}"))
}

/// `<output_dir>/<stem><suffix>.<fmt>`, keeping the input extension when no format is set.
/// Without an output folder the file lands next to its input.
pub fn batch_output_path(input: &Path, output_dir: Option<&Path>, suffix: &str, format: Option<OutputFormat>) -> PathBuf {
    let stem = input.file_stem().map(|s| s.to_string_lossy().into_owned()).unwrap_or_default();
    let extension = match format {
        Some(format) => format.extension().to_string(),
        None => input
            .extension()
            .map(|ext| ext.to_string_lossy().to_ascii_lowercase())
            .unwrap_or_else(|| DEFAULT_EXTENSION.to_string()),
    };
    let folder = output_dir.or_else(|| input.parent()).unwrap_or_else(|| Path::new(""));
    folder.join(format!("{stem}{suffix}.{extension}"))
}
