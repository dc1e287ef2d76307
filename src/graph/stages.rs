//! Parameter records for each processing stage.
//!
//! Every derived value is clamped into the range the executor's filters
//! accept before it is rendered into filter text.

use crate::analysis::{BandDefinition, BandEnergy};
use crate::config::GlueSettings;
use crate::error::{GraphError, Result};

/// Sibilance frequency targeted by the de-esser
pub const DEESSER_TARGET_HZ: f64 = 6000.0;

/// Normalized de-esser frequency used when the sample rate cannot be probed
pub const DEESSER_FALLBACK_FREQUENCY: f64 = 0.5;

pub const MIN_STEREO_WIDTH: f64 = 1.0 / 64.0;
pub const MAX_STEREO_WIDTH: f64 = 64.0;

pub const MIN_LIMITER_LINEAR: f64 = 0.0625;
pub const MAX_LIMITER_LINEAR: f64 = 1.0;

pub const MIN_MAKEUP_LINEAR: f64 = 1.0;
pub const MAX_MAKEUP_LINEAR: f64 = 64.0;

/// Compander floor and ceiling (dBFS)
pub const COMPAND_FLOOR_DB: f64 = -90.0;
pub const COMPAND_CEILING_DB: f64 = 0.0;

/// Headroom added below the true-peak ceiling for the brickwall limiter
pub const BRICKWALL_EXTRA_DB: f64 = -0.5;

pub const DEFAULT_BAND_RANGE_DB: f64 = 3.0;
pub const TRANSPARENT_BAND_RANGE_DB: f64 = 2.0;
pub const DEFAULT_MAX_ADJUST_DB: f64 = 4.0;
pub const TRANSPARENT_MAX_ADJUST_DB: f64 = 2.0;

pub(crate) fn db_to_linear(db: f64) -> f64 {
    10f64.powf(db / 20.0)
}

/// Width of the hold window around each band's level and the gain applied outside it
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct BandTuning {
    pub band_range_db: f64,
    pub max_adjust_db: f64,
}

impl BandTuning {
    pub fn for_mode(transparent: bool) -> Self {
        if transparent {
            Self {
                band_range_db: TRANSPARENT_BAND_RANGE_DB,
                max_adjust_db: TRANSPARENT_MAX_ADJUST_DB,
            }
        } else {
            Self {
                band_range_db: DEFAULT_BAND_RANGE_DB,
                max_adjust_db: DEFAULT_MAX_ADJUST_DB,
            }
        }
    }
}

impl Default for BandTuning {
    fn default() -> Self {
        Self::for_mode(false)
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct DeesserParams {
    /// Target frequency relative to Nyquist, in `[0, 1]`
    pub normalized_frequency: f64,
}

impl DeesserParams {
    pub fn for_sample_rate(sample_rate: Option<f64>) -> Self {
        let normalized_frequency = match sample_rate {
            Some(rate) if rate > 0.0 => (DEESSER_TARGET_HZ / (rate / 2.0)).clamp(0.0, 1.0),
            _ => DEESSER_FALLBACK_FREQUENCY,
        };
        Self { normalized_frequency }
    }

    pub fn filter(&self) -> String {
        format!("deesser=i=0.5:m=0.5:f={:.4}:s=0.5", self.normalized_frequency)
    }
}

/// Four-point dynamic curve that holds a band flat around its measured level
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct CompandParams {
    pub attack_s: f64,
    pub release_s: f64,
    pub low_threshold_db: f64,
    pub high_threshold_db: f64,
    pub max_adjust_db: f64,
}

impl CompandParams {
    pub fn for_band(band: &BandDefinition, rms_db: f64, tuning: BandTuning) -> Self {
        Self {
            attack_s: band.attack_s,
            release_s: band.release_s,
            low_threshold_db: (rms_db - tuning.band_range_db).clamp(COMPAND_FLOOR_DB, COMPAND_CEILING_DB),
            high_threshold_db: (rms_db + tuning.band_range_db).clamp(COMPAND_FLOOR_DB, COMPAND_CEILING_DB),
            max_adjust_db: tuning.max_adjust_db,
        }
    }

    /// Quiet material is lifted and full-scale material pulled down by `max_adjust_db`
    pub fn filter(&self) -> String {
        format!(
            "compand=attacks={}:decays={}:points={:.0}/{:.2}|{:.2}/{:.2}|{:.2}/{:.2}|{:.0}/{:.2}",
            self.attack_s,
            self.release_s,
            COMPAND_FLOOR_DB,
            COMPAND_FLOOR_DB + self.max_adjust_db,
            self.low_threshold_db,
            self.low_threshold_db,
            self.high_threshold_db,
            self.high_threshold_db,
            COMPAND_CEILING_DB,
            -self.max_adjust_db,
        )
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct StereoWidthParams {
    /// Side level multiplier, in `[1/64, 64]`
    pub side_level: f64,
}

impl StereoWidthParams {
    pub fn from_factor(factor: f64) -> Self {
        Self {
            side_level: factor.clamp(MIN_STEREO_WIDTH, MAX_STEREO_WIDTH),
        }
    }

    pub fn filter(&self) -> String {
        format!("stereotools=mlev=1:slev={:.2}", self.side_level)
    }
}

/// One parallel branch of the multiband stage
#[derive(Debug, Clone, PartialEq)]
pub struct BandBranch {
    pub label: String,
    pub low_hz: u32,
    pub high_hz: u32,
    pub compand: Option<CompandParams>,
    pub width: Option<StereoWidthParams>,
}

impl BandBranch {
    /// Band-pass followed by the optional dynamic curve and width shaping
    pub fn chain(&self) -> String {
        let mut chain = format!("highpass=f={},lowpass=f={}", self.low_hz, self.high_hz);
        if let Some(compand) = &self.compand {
            chain.push(',');
            chain.push_str(&compand.filter());
        }
        if let Some(width) = &self.width {
            chain.push(',');
            chain.push_str(&width.filter());
        }
        chain
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct MultibandParams {
    pub branches: Vec<BandBranch>,
}

impl MultibandParams {
    /// Build one branch per band.
    ///
    /// Dynamic EQ needs a measured level for every band; a missing analysis or
    /// a missing band is an error rather than a silently skipped branch.
    pub fn from_bands(
        bands: &[BandDefinition],
        energy: Option<&BandEnergy>,
        dynamic_eq: bool,
        stereo_width: bool,
        tuning: BandTuning,
    ) -> Result<Self> {
        let mut branches = Vec::with_capacity(bands.len());
        for band in bands {
            let compand = if dynamic_eq {
                let energy = energy.ok_or(GraphError::MissingBandStatistics)?;
                let rms = energy.get(band.label).ok_or_else(|| GraphError::MissingBandLevel {
                    band: band.label.to_string(),
                })?;
                Some(CompandParams::for_band(band, rms, tuning))
            } else {
                None
            };

            branches.push(BandBranch {
                label: band.label.to_string(),
                low_hz: band.low_hz,
                high_hz: band.high_hz,
                compand,
                width: stereo_width.then(|| StereoWidthParams::from_factor(band.stereo_width)),
            });
        }
        Ok(Self { branches })
    }
}

/// Gentle bus compression with times in seconds and linear makeup gain
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct GlueParams {
    pub threshold_db: f64,
    pub ratio: f64,
    pub attack_s: f64,
    pub release_s: f64,
    pub makeup_linear: f64,
}

impl GlueParams {
    pub fn from_settings(settings: &GlueSettings) -> Self {
        Self {
            threshold_db: settings.threshold_db,
            ratio: settings.ratio,
            attack_s: (settings.attack_ms / 1000.0).max(0.001),
            release_s: (settings.release_ms / 1000.0).max(0.005),
            makeup_linear: db_to_linear(settings.makeup_db).clamp(MIN_MAKEUP_LINEAR, MAX_MAKEUP_LINEAR),
        }
    }

    pub fn filter(&self) -> String {
        format!(
            "acompressor=threshold={:.2}dB:ratio={:.2}:attack={:.3}:release={:.3}:makeup={:.2}",
            self.threshold_db, self.ratio, self.attack_s, self.release_s, self.makeup_linear
        )
    }
}

/// Final peak ceiling placed after normalization
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct LimiterParams {
    /// Linear limit, in `[0.0625, 1]`
    pub limit_linear: f64,
}

impl LimiterParams {
    pub fn for_true_peak(true_peak_db: f64) -> Self {
        Self {
            limit_linear: db_to_linear(true_peak_db + BRICKWALL_EXTRA_DB)
                .clamp(MIN_LIMITER_LINEAR, MAX_LIMITER_LINEAR),
        }
    }

    pub fn filter(&self) -> String {
        format!("alimiter=limit={:.6}:attack=1:release=100", self.limit_linear)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::analysis::BAND_CONFIG;

    #[test]
    fn test_deesser_normalizes_against_nyquist() {
        let params = DeesserParams::for_sample_rate(Some(44100.0));
        assert!((params.normalized_frequency - 6000.0 / 22050.0).abs() < 1e-12);
        assert_eq!(params.filter(), "deesser=i=0.5:m=0.5:f=0.2721:s=0.5");
    }

    #[test]
    fn test_deesser_clamps_and_falls_back() {
        // Nyquist 4 kHz is below the target
        assert_eq!(DeesserParams::for_sample_rate(Some(8000.0)).normalized_frequency, 1.0);
        assert_eq!(DeesserParams::for_sample_rate(None).normalized_frequency, 0.5);
        assert_eq!(DeesserParams::for_sample_rate(Some(0.0)).normalized_frequency, 0.5);
    }

    #[test]
    fn test_stereo_width_is_clamped() {
        for factor in [0.0, 0.001, 0.4, 1.0, 64.0, 1000.0, -3.0] {
            let width = StereoWidthParams::from_factor(factor);
            assert!((MIN_STEREO_WIDTH..=MAX_STEREO_WIDTH).contains(&width.side_level));
        }
        assert_eq!(StereoWidthParams::from_factor(1.4).filter(), "stereotools=mlev=1:slev=1.40");
    }

    #[test]
    fn test_limiter_is_clamped() {
        for tp in [-60.0, -24.0, -9.0, -1.0, 0.0, 3.0, 12.0] {
            let limiter = LimiterParams::for_true_peak(tp);
            assert!((MIN_LIMITER_LINEAR..=MAX_LIMITER_LINEAR).contains(&limiter.limit_linear));
        }
        // -1.0 dBTP ceiling minus 0.5 dB headroom
        assert_eq!(LimiterParams::for_true_peak(-1.0).filter(), "alimiter=limit=0.841395:attack=1:release=100");
    }

    #[test]
    fn test_glue_floors_times_and_clamps_makeup() {
        let settings = GlueSettings {
            enabled: true,
            threshold_db: -18.0,
            ratio: 1.6,
            attack_ms: 0.0,
            release_ms: 1.0,
            makeup_db: -6.0,
        };
        let glue = GlueParams::from_settings(&settings);
        assert_eq!(glue.attack_s, 0.001);
        assert_eq!(glue.release_s, 0.005);
        assert_eq!(glue.makeup_linear, 1.0);
        assert_eq!(
            glue.filter(),
            "acompressor=threshold=-18.00dB:ratio=1.60:attack=0.001:release=0.005:makeup=1.00"
        );

        for makeup_db in [-40.0, 0.0, 6.0, 36.0, 80.0] {
            let glue = GlueParams::from_settings(&GlueSettings { makeup_db, ..settings.clone() });
            assert!((MIN_MAKEUP_LINEAR..=MAX_MAKEUP_LINEAR).contains(&glue.makeup_linear));
        }
    }

    #[test]
    fn test_compand_thresholds_are_clamped() {
        let band = BAND_CONFIG[0];
        let quiet = CompandParams::for_band(&band, -89.0, BandTuning::default());
        assert_eq!(quiet.low_threshold_db, -90.0);
        assert_eq!(quiet.high_threshold_db, -86.0);

        let hot = CompandParams::for_band(&band, -1.0, BandTuning::default());
        assert_eq!(hot.high_threshold_db, 0.0);
        assert_eq!(
            hot.filter(),
            "compand=attacks=0.06:decays=0.4:points=-90/-86.00|-4.00/-4.00|0.00/0.00|0/-4.00"
        );
    }

    #[test]
    fn test_near_silent_band_keeps_points_increasing() {
        let band = BAND_CONFIG[0];
        for rms in [-100.0, -93.5, -140.0] {
            let silent = CompandParams::for_band(&band, rms, BandTuning::default());
            assert_eq!(silent.low_threshold_db, -90.0);
            assert_eq!(silent.high_threshold_db, -90.0);

            let filter = silent.filter();
            let points = filter.split("points=").nth(1).unwrap();
            let inputs: Vec<f64> = points
                .split('|')
                .map(|point| point.split('/').next().unwrap().parse().unwrap())
                .collect();
            assert_eq!(inputs.len(), 4);
            assert!(inputs.windows(2).all(|pair| pair[0] <= pair[1]), "{}", filter);
            assert!(inputs.iter().all(|x| (-90.0..=0.0).contains(x)), "{}", filter);
        }

        let loud = CompandParams::for_band(&band, 8.0, BandTuning::default());
        assert_eq!(loud.low_threshold_db, 0.0);
        assert_eq!(loud.high_threshold_db, 0.0);
    }

    #[test]
    fn test_dynamic_eq_requires_statistics() {
        let err = MultibandParams::from_bands(&BAND_CONFIG, None, true, false, BandTuning::default()).unwrap_err();
        assert!(matches!(
            err,
            crate::error::MasteringError::Graph(GraphError::MissingBandStatistics)
        ));

        let partial: BandEnergy = [("Bass (60-250 Hz)", -20.0)].into_iter().collect();
        let err = MultibandParams::from_bands(&BAND_CONFIG, Some(&partial), true, false, BandTuning::default())
            .unwrap_err();
        assert!(err.to_string().contains("Subbass"));
    }

    #[test]
    fn test_width_only_needs_no_statistics() {
        let params = MultibandParams::from_bands(&BAND_CONFIG, None, false, true, BandTuning::default()).unwrap();
        assert_eq!(params.branches.len(), 6);
        assert!(params.branches.iter().all(|b| b.compand.is_none() && b.width.is_some()));
        assert_eq!(params.branches[0].chain(), "highpass=f=20,lowpass=f=60,stereotools=mlev=1:slev=0.02");
    }
}
