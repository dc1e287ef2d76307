use std::collections::BTreeMap;
use std::fmt;

use serde::{Deserialize, Serialize};

use crate::error::{MeasurementError, Result};

/// Loudness statistics reported by one measurement pass
///
/// Only the integrated loudness is mandatory; a block without it is rejected
/// at parse time. The remaining fields are absent when the executor printed a
/// value that is not a number.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LoudnessStats {
    /// Integrated loudness (LUFS)
    pub integrated: f64,

    /// True peak (dBTP)
    pub true_peak: Option<f64>,

    /// Loudness range (LU)
    pub loudness_range: Option<f64>,

    /// Gating threshold (LUFS)
    pub threshold: Option<f64>,

    /// Offset gain recommended by the measurement filter (dB)
    pub target_offset: Option<f64>,

    /// Any other numeric keys present in the block (output_i, output_tp, ...)
    #[serde(default)]
    pub extra: BTreeMap<String, f64>,
}

/// The five values the normalization filter needs from a measure pass
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct MeasuredInputs {
    pub integrated: f64,
    pub loudness_range: f64,
    pub true_peak: f64,
    pub threshold: f64,
    pub target_offset: f64,
}

impl LoudnessStats {
    /// Record with every standard field present
    pub fn new(integrated: f64, true_peak: f64, loudness_range: f64, threshold: f64, target_offset: f64) -> Self {
        Self {
            integrated,
            true_peak: Some(true_peak),
            loudness_range: Some(loudness_range),
            threshold: Some(threshold),
            target_offset: Some(target_offset),
            extra: BTreeMap::new(),
        }
    }

    /// Extract the values required by the second pass, failing on the first missing one
    pub fn normalization_inputs(&self) -> Result<MeasuredInputs> {
        fn require(value: Option<f64>, field: &str) -> Result<f64> {
            value.ok_or_else(|| MeasurementError::MissingField { field: field.to_string() }.into())
        }

        Ok(MeasuredInputs {
            integrated: self.integrated,
            loudness_range: require(self.loudness_range, "input_lra")?,
            true_peak: require(self.true_peak, "input_tp")?,
            threshold: require(self.threshold, "input_thresh")?,
            target_offset: require(self.target_offset, "target_offset")?,
        })
    }
}

/// One frequency band of the multiband processor
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct BandDefinition {
    pub label: &'static str,
    pub low_hz: u32,
    pub high_hz: u32,
    /// Compander attack time (s)
    pub attack_s: f64,
    /// Compander release time (s)
    pub release_s: f64,
    /// Side-level factor applied when stereo width shaping is enabled
    pub stereo_width: f64,
}

/// Fixed band used to report the energy of the vocal range
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct VoiceBand {
    pub label: &'static str,
    pub low_hz: u32,
    pub high_hz: u32,
}

/// Contiguous, ascending bands from sub-bass to air
pub const BAND_CONFIG: [BandDefinition; 6] = [
    BandDefinition { label: "Subbass (20-60 Hz)", low_hz: 20, high_hz: 60, attack_s: 0.06, release_s: 0.40, stereo_width: 0.0 },
    BandDefinition { label: "Bass (60-250 Hz)", low_hz: 60, high_hz: 250, attack_s: 0.04, release_s: 0.30, stereo_width: 0.4 },
    BandDefinition { label: "Low-Mid (250-500 Hz)", low_hz: 250, high_hz: 500, attack_s: 0.03, release_s: 0.20, stereo_width: 0.7 },
    BandDefinition { label: "Mid (500-2k Hz)", low_hz: 500, high_hz: 2000, attack_s: 0.02, release_s: 0.15, stereo_width: 1.0 },
    BandDefinition { label: "High-Mid (2k-6k Hz)", low_hz: 2000, high_hz: 6000, attack_s: 0.01, release_s: 0.12, stereo_width: 1.2 },
    BandDefinition { label: "Air (6k-16k Hz)", low_hz: 6000, high_hz: 16000, attack_s: 0.005, release_s: 0.08, stereo_width: 1.4 },
];

pub const VOICE_BAND: VoiceBand = VoiceBand { label: "Voz (300-3k Hz)", low_hz: 300, high_hz: 3000 };

/// Measured RMS level (dB) per band label, in band order
///
/// Bands whose measurement failed are simply missing.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct BandEnergy {
    levels: Vec<(String, f64)>,
}

impl BandEnergy {
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the level of a band, replacing any previous value
    pub fn insert<S: Into<String>>(&mut self, label: S, rms_db: f64) {
        let label = label.into();
        match self.levels.iter_mut().find(|(existing, _)| *existing == label) {
            Some(entry) => entry.1 = rms_db,
            None => self.levels.push((label, rms_db)),
        }
    }

    pub fn get(&self, label: &str) -> Option<f64> {
        self.levels
            .iter()
            .find(|(existing, _)| existing == label)
            .map(|(_, rms)| *rms)
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, f64)> {
        self.levels.iter().map(|(label, rms)| (label.as_str(), *rms))
    }

    pub fn len(&self) -> usize {
        self.levels.len()
    }

    pub fn is_empty(&self) -> bool {
        self.levels.is_empty()
    }

    /// Arithmetic mean over measured bands
    pub fn mean(&self) -> Option<f64> {
        if self.levels.is_empty() {
            return None;
        }
        Some(self.levels.iter().map(|(_, rms)| rms).sum::<f64>() / self.levels.len() as f64)
    }
}

impl<S: Into<String>> FromIterator<(S, f64)> for BandEnergy {
    fn from_iter<I: IntoIterator<Item = (S, f64)>>(iter: I) -> Self {
        let mut energy = BandEnergy::new();
        for (label, rms) in iter {
            energy.insert(label, rms);
        }
        energy
    }
}

/// Direction of a band imbalance relative to the mean
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Imbalance {
    Excess,
    Deficit,
}

/// Advisory note about a band sitting outside the mean ± range window
#[derive(Debug, Clone, PartialEq)]
pub struct BandSuggestion {
    pub band: String,
    pub kind: Imbalance,
    pub rms_db: f64,
}

impl fmt::Display for BandSuggestion {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.kind {
            Imbalance::Excess => write!(f, "{}: posible exceso; considera bajar ~2-3 dB.", self.band),
            Imbalance::Deficit => write!(f, "{}: posible falta; considera subir ~2-3 dB.", self.band),
        }
    }
}
