use tracing::debug;

use crate::analysis::{BandDefinition, BandEnergy};
use crate::config::ProcessingOptions;
use crate::error::Result;
use crate::graph::stages::{BandTuning, DeesserParams, GlueParams, MultibandParams};

/// Label of the raw input audio stream
pub const SOURCE_LABEL: &str = "0:a";

const DEESSER_LABEL: &str = "des";
const MULTIBAND_LABEL: &str = "mb";
const GLUE_LABEL: &str = "glue";

/// One slot of the processing chain
#[derive(Debug, Clone, PartialEq)]
pub enum Stage {
    /// Pass-through: the incoming label propagates unchanged
    Disabled,
    Deesser(DeesserParams),
    /// Parallel band split carrying dynamic EQ and/or stereo width per band
    Multiband(MultibandParams),
    Glue(GlueParams),
}

impl Stage {
    pub fn is_active(&self) -> bool {
        !matches!(self, Stage::Disabled)
    }

    /// Append this stage's segments to `parts`, returning the label of its output
    fn render(&self, input: &str, parts: &mut Vec<String>) -> String {
        match self {
            Stage::Disabled => input.to_string(),
            Stage::Deesser(params) => {
                parts.push(format!("[{input}]{}[{DEESSER_LABEL}]", params.filter()));
                DEESSER_LABEL.to_string()
            }
            Stage::Multiband(params) if params.branches.is_empty() => input.to_string(),
            Stage::Multiband(params) => {
                let count = params.branches.len();
                let split_labels: String = (0..count).map(|i| format!("[b{i}]")).collect();
                parts.push(format!("[{input}]asplit={count}{split_labels}"));

                for (i, branch) in params.branches.iter().enumerate() {
                    parts.push(format!("[b{i}]{}[c{i}]", branch.chain()));
                }

                // Branches are summed as-is; the limiter downstream handles the level
                let mix_inputs: String = (0..count).map(|i| format!("[c{i}]")).collect();
                parts.push(format!("{mix_inputs}amix=inputs={count}:normalize=0[{MULTIBAND_LABEL}]"));
                MULTIBAND_LABEL.to_string()
            }
            Stage::Glue(params) => {
                parts.push(format!("[{input}]{}[{GLUE_LABEL}]", params.filter()));
                GLUE_LABEL.to_string()
            }
        }
    }
}

/// Rendered filter graph and the label carrying its final signal
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FilterGraphDescriptor {
    pub graph_text: String,
    pub output_label: String,
}

impl FilterGraphDescriptor {
    /// Graph with no stages: the output is the raw source
    pub fn passthrough() -> Self {
        Self {
            graph_text: String::new(),
            output_label: SOURCE_LABEL.to_string(),
        }
    }

    pub fn is_passthrough(&self) -> bool {
        self.graph_text.is_empty()
    }

    /// Complete graph feeding the output label through `tail` into `[sink]`
    pub fn with_tail(&self, tail: &str, sink: &str) -> String {
        format!("{};[{}]{}[{}]", self.graph_text, self.output_label, tail, sink)
    }
}

/// Fold the stages in order, threading the current output label forward
pub fn build_graph(stages: &[Stage]) -> FilterGraphDescriptor {
    let mut parts = Vec::new();
    let mut label = SOURCE_LABEL.to_string();

    for stage in stages {
        label = stage.render(&label, &mut parts);
    }

    let descriptor = FilterGraphDescriptor {
        graph_text: parts.join(";"),
        output_label: label,
    };
    debug!("Built filter graph ending at [{}]: {}", descriptor.output_label, descriptor.graph_text);
    descriptor
}

/// Derive the ordered stage list (de-esser, multiband, glue) from the options.
///
/// `sample_rate` is only consulted by the de-esser; `band_energy` is required
/// when dynamic EQ is requested.
pub fn plan_stages(
    options: &ProcessingOptions,
    bands: &[BandDefinition],
    band_energy: Option<&BandEnergy>,
    sample_rate: Option<f64>,
) -> Result<Vec<Stage>> {
    let tuning = BandTuning::for_mode(options.transparent_mode);

    let deesser = if options.deesser {
        Stage::Deesser(DeesserParams::for_sample_rate(sample_rate))
    } else {
        Stage::Disabled
    };

    let multiband = if (options.dynamic_eq || options.stereo_width) && !bands.is_empty() {
        Stage::Multiband(MultibandParams::from_bands(
            bands,
            band_energy,
            options.dynamic_eq,
            options.stereo_width,
            tuning,
        )?)
    } else {
        Stage::Disabled
    };

    let glue = if options.glue.enabled {
        Stage::Glue(GlueParams::from_settings(&options.glue))
    } else {
        Stage::Disabled
    };

    Ok(vec![deesser, multiband, glue])
}
