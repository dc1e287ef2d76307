use std::fmt;

use serde::{Deserialize, Serialize};

use crate::analysis::{BandEnergy, LoudnessStats, VOICE_BAND};
use crate::pipeline::LoudnessTargets;

/// Advice line used when no rule fired
pub const NO_ADVICE: &str = "Sin recomendaciones específicas; parece estar bien balanceado.";

/// Overall verdict on a measured mix
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Rating {
    #[serde(rename = "Bueno")]
    Good,
    #[serde(rename = "Aceptable")]
    Acceptable,
    #[serde(rename = "Necesita trabajo")]
    NeedsWork,
}

impl Rating {
    pub fn from_score(score: i32) -> Self {
        if score >= 85 {
            Rating::Good
        } else if score >= 65 {
            Rating::Acceptable
        } else {
            Rating::NeedsWork
        }
    }

    pub fn label(&self) -> &'static str {
        match self {
            Rating::Good => "Bueno",
            Rating::Acceptable => "Aceptable",
            Rating::NeedsWork => "Necesita trabajo",
        }
    }
}

impl fmt::Display for Rating {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct EvaluationResult {
    pub rating: Rating,
    /// Score after deductions, starting from 100
    pub score: i32,
    pub advice: Vec<String>,
}

/// Score a measurement against the targets.
///
/// Each rule deducts independently from 100; missing statistics count as 0.
pub fn evaluate(stats: &LoudnessStats, targets: LoudnessTargets) -> EvaluationResult {
    let true_peak = stats.true_peak.unwrap_or(0.0);
    let lra = stats.loudness_range.unwrap_or(0.0);
    let offset = stats.target_offset.unwrap_or(0.0);

    let mut score = 100;
    let mut advice = Vec::new();
    let mut note = |deduction: i32, text: &str| {
        score -= deduction;
        advice.push(text.to_string());
    };

    let delta = stats.integrated - targets.lufs;
    if delta.abs() <= 1.0 {
        note(0, "Nivel integrado cerca del objetivo: OK.");
    } else if delta < -3.0 {
        note(20, "Muy bajo respecto al objetivo: considera aumentar ganancia o compresión.");
    } else if delta < -1.0 {
        note(10, "Bajo: subir leve ganancia o aplicar make-up after compression.");
    } else if delta > 1.0 {
        note(15, "Por encima del objetivo: reduce ganancia o aplica un normalizador previo.");
    }

    if true_peak >= targets.true_peak {
        note(25, "True peak excede o iguala el límite: usar limitador/trimming para evitar clipping.");
    } else if true_peak >= targets.true_peak - 1.0 {
        note(10, "True peak cercano al límite: revisar transientes y aplicar limitador suave.");
    }

    if lra > 10.0 {
        note(
            10,
            "LRA alto: la mezcla tiene dinámicas amplias; considera compresión multibanda o automatizaciones.",
        );
    } else if lra < 4.0 {
        note(5, "LRA bajo: la mezcla está muy comprimida; verifica si falta dinámica.");
    }

    if offset.abs() > 3.0 {
        note(
            10,
            "Offset recomendado grande: puede necesitar procesamiento significativo; revisar ganancia/processing chain.",
        );
    }

    if advice.is_empty() {
        advice.push(NO_ADVICE.to_string());
    }

    EvaluationResult {
        rating: Rating::from_score(score),
        score,
        advice,
    }
}

/// Human-readable block for one measurement, as printed by the CLI
pub fn format_analysis_summary(
    label: &str,
    stats: &LoudnessStats,
    bands: &BandEnergy,
    voice_rms: Option<f64>,
    targets: LoudnessTargets,
) -> String {
    let mut lines = vec![format!("{label}:")];
    lines.push(format!("  Input I (LUFS): {:.2}", stats.integrated));
    lines.push(format!("  Input TP (dBTP): {:.2}", stats.true_peak.unwrap_or(0.0)));
    lines.push(format!("  Input LRA (LU): {:.2}", stats.loudness_range.unwrap_or(0.0)));

    if let Some(rms) = voice_rms {
        lines.push(format!("  {}: {:.2} dB", VOICE_BAND.label, rms));
    }

    if !bands.is_empty() {
        lines.push("  Bandas (RMS dB):".to_string());
        for (band, rms) in bands.iter() {
            lines.push(format!("    {band}: {rms:.2}"));
        }
    }

    let evaluation = evaluate(stats, targets);
    lines.push(format!("  Evaluación: {}", evaluation.rating));
    lines.push(format!("  Consejos: {}", evaluation.advice.join("\n")));
    lines.join("\n")
}
