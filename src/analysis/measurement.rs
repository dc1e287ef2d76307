use std::collections::BTreeMap;

use once_cell::sync::Lazy;
use regex::Regex;
use serde_json::Value;

use crate::analysis::types::LoudnessStats;
use crate::error::{MeasurementError, Result};

static LOUDNESS_BLOCK_RE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r#"\{\s*"input_i"[\s\S]*?\}"#).expect("Invalid regex")
});

static METADATA_RMS_RE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"Overall\.RMS_level[:=]\s*(-?\d+(?:\.\d+)?)").expect("Invalid regex")
});

static SUMMARY_RMS_RE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"RMS level dB:\s*(-?\d+(?:\.\d+)?)").expect("Invalid regex")
});

/// Extract the loudness statistics block embedded in executor output.
///
/// Values may be quoted strings or bare numbers; anything that does not
/// convert to a float is dropped. The block must carry `input_i`.
pub fn parse_loudness_stats(text: &str) -> Result<LoudnessStats> {
    let block = LOUDNESS_BLOCK_RE
        .find(text)
        .ok_or_else(|| MeasurementError::NotFound {
            context: "expected a JSON object starting with \"input_i\"".to_string(),
        })?;

    let raw: BTreeMap<String, Value> = serde_json::from_str(block.as_str())
        .map_err(|e| MeasurementError::InvalidBlock { reason: e.to_string() })?;

    let mut values: BTreeMap<String, f64> = raw
        .into_iter()
        .filter_map(|(key, value)| to_float(&value).map(|v| (key, v)))
        .collect();

    let integrated = values.remove("input_i").ok_or_else(|| MeasurementError::MissingField {
        field: "input_i".to_string(),
    })?;

    Ok(LoudnessStats {
        integrated,
        true_peak: values.remove("input_tp"),
        loudness_range: values.remove("input_lra"),
        threshold: values.remove("input_thresh"),
        target_offset: values.remove("target_offset"),
        extra: values,
    })
}

fn to_float(value: &Value) -> Option<f64> {
    match value {
        Value::Number(n) => n.as_f64(),
        Value::String(s) => s.trim().parse::<f64>().ok(),
        _ => None,
    }
}

/// Last overall RMS level (dB) in the statistics output, if any.
///
/// Recognises both the per-frame metadata form (`Overall.RMS_level=-20.1`)
/// and the end-of-stream summary, where the `RMS level dB:` line that
/// follows an `Overall` header belongs to the mix of all channels. Later
/// values win over earlier ones.
pub fn parse_last_rms(text: &str) -> Option<f64> {
    let mut last = None;
    let mut in_overall = false;

    for line in text.lines() {
        if let Some(caps) = METADATA_RMS_RE.captures(line) {
            last = caps[1].parse::<f64>().ok().or(last);
            continue;
        }

        let content = line.rsplit(']').next().unwrap_or(line).trim();
        if content == "Overall" {
            in_overall = true;
            continue;
        }
        if content.starts_with("Channel:") {
            in_overall = false;
            continue;
        }

        if in_overall {
            if let Some(caps) = SUMMARY_RMS_RE.captures(content) {
                last = caps[1].parse::<f64>().ok().or(last);
            }
        }
    }

    last
}
