use std::path::Path;

use serde::{Deserialize, Serialize};
use tracing::{debug, info, warn};

use crate::analysis::{parse_loudness_stats, LoudnessStats, MeasuredInputs};
use crate::config::ProcessingOptions;
use crate::error::{OutputError, Result};
use crate::executor::{base_args, null_sink_args, Executor};
use crate::graph::{FilterGraphDescriptor, LimiterParams};
use crate::pipeline::output::{codec_args, metadata_args};

/// Loudness range handed to the normalization filter
pub const TARGET_LRA: f64 = 11.0;

/// Label of the last node when the apply pass renders a filter graph
const OUTPUT_LABEL: &str = "out";

/// Integrated loudness and true-peak ceiling to normalize to
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct LoudnessTargets {
    /// Target integrated loudness (LUFS)
    pub lufs: f64,
    /// True-peak ceiling (dBTP)
    pub true_peak: f64,
}

impl Default for LoudnessTargets {
    fn default() -> Self {
        Self { lufs: -14.0, true_peak: -1.0 }
    }
}

/// First-pass filter: measure only, print the statistics as JSON
pub fn measure_filter(targets: LoudnessTargets) -> String {
    format!(
        "loudnorm=I={}:LRA={}:TP={}:print_format=json",
        targets.lufs, TARGET_LRA, targets.true_peak
    )
}

/// Second-pass filter fed with the first-pass statistics, in linear mode
pub fn normalize_filter(targets: LoudnessTargets, measured: &MeasuredInputs) -> String {
    format!(
        "loudnorm=I={}:LRA={}:TP={}:measured_I={}:measured_LRA={}:measured_TP={}:measured_thresh={}:offset={}:linear=true:print_format=summary",
        targets.lufs,
        TARGET_LRA,
        targets.true_peak,
        measured.integrated,
        measured.loudness_range,
        measured.true_peak,
        measured.threshold,
        measured.target_offset,
    )
}

pub fn fade_in_filter(seconds: f64) -> String {
    format!("afade=t=in:ss=0:d={seconds:.3}")
}

/// Fade ending at `duration`; the start is clamped at zero for short files
pub fn fade_out_filter(duration: f64, seconds: f64) -> String {
    let start = (duration - seconds).max(0.0);
    format!("afade=t=out:st={start:.3}:d={seconds:.3}")
}

/// Append `filter` to `graph` and route the result into `[out]`, or use a
/// plain `-af` chain when the graph is empty
fn filter_args(graph: &FilterGraphDescriptor, filter: &str) -> Vec<String> {
    if graph.is_passthrough() {
        vec!["-af".to_string(), filter.to_string()]
    } else {
        vec![
            "-filter_complex".to_string(),
            graph.with_tail(filter, OUTPUT_LABEL),
            "-map".to_string(),
            format!("[{OUTPUT_LABEL}]"),
        ]
    }
}

/// Two-pass loudness normalization over one executor
pub struct LoudnessPipeline<'a, E: Executor + ?Sized> {
    executor: &'a E,
    targets: LoudnessTargets,
}

impl<'a, E: Executor + ?Sized> LoudnessPipeline<'a, E> {
    pub fn new(executor: &'a E, targets: LoudnessTargets) -> Self {
        Self { executor, targets }
    }

    pub fn targets(&self) -> LoudnessTargets {
        self.targets
    }

    /// Arguments of the measure pass; the graph must be the one the apply pass will use
    pub fn measure_args(&self, input: &Path, graph: &FilterGraphDescriptor) -> Vec<String> {
        let mut args = base_args();
        args.extend(["-i".to_string(), input.display().to_string()]);
        args.extend(filter_args(graph, &measure_filter(self.targets)));
        args.extend(null_sink_args());
        args
    }

    /// Measure pass: run the loudness filter after `graph` and parse its statistics
    pub fn measure(&self, input: &Path, graph: &FilterGraphDescriptor) -> Result<LoudnessStats> {
        info!("📏 Measuring loudness of {:?}", input);
        if !graph.is_passthrough() {
            debug!("Measuring through filter graph ending at [{}]", graph.output_label);
        }

        let output = self.executor.run_checked("loudness measurement", &self.measure_args(input, graph))?;
        let stats = parse_loudness_stats(&output.combined())?;

        info!(
            "   I: {:.2} LUFS, TP: {} dBTP, LRA: {} LU",
            stats.integrated,
            display_opt(stats.true_peak),
            display_opt(stats.loudness_range)
        );
        Ok(stats)
    }

    /// Tail of the apply pass: normalization, optional limiter, fades
    pub fn tail_filters(&self, input: &Path, measured: &MeasuredInputs, options: &ProcessingOptions) -> Vec<String> {
        let mut filters = vec![normalize_filter(self.targets, measured)];

        if options.brickwall {
            filters.push(LimiterParams::for_true_peak(self.targets.true_peak).filter());
        }

        if options.fade_in_s > 0.0 {
            filters.push(fade_in_filter(options.fade_in_s));
        }

        if options.fade_out_s > 0.0 {
            match self.executor.probe_duration(input) {
                Some(duration) => filters.push(fade_out_filter(duration, options.fade_out_s)),
                None => warn!("Could not probe duration of {:?}; skipping fade-out", input),
            }
        }

        filters
    }

    /// Arguments of the apply pass
    pub fn apply_args(
        &self,
        input: &Path,
        output: &Path,
        measured: &MeasuredInputs,
        graph: &FilterGraphDescriptor,
        options: &ProcessingOptions,
    ) -> Vec<String> {
        let tail = self.tail_filters(input, measured, options).join(",");

        let mut args = base_args();
        args.push(if options.overwrite { "-y" } else { "-n" }.to_string());
        args.extend(["-i".to_string(), input.display().to_string()]);
        args.extend(filter_args(graph, &tail));
        args.extend(metadata_args(&options.metadata));
        args.extend(codec_args(&options.output));
        args.push(output.display().to_string());
        args
    }

    /// Apply pass: render `input` through `graph` and the normalization tail
    /// into `output`. Returns the executor's log text.
    pub fn apply(
        &self,
        input: &Path,
        output: &Path,
        stats: &LoudnessStats,
        graph: &FilterGraphDescriptor,
        options: &ProcessingOptions,
    ) -> Result<String> {
        if output.exists() && !options.overwrite {
            return Err(OutputError::OutputExists { path: output.display().to_string() }.into());
        }

        let measured = stats.normalization_inputs()?;
        info!("🎚️  Normalizing to {} LUFS / {} dBTP", self.targets.lufs, self.targets.true_peak);

        let args = self.apply_args(input, output, &measured, graph, options);
        let result = self.executor.run_checked("normalization", &args)?;

        info!("   Rendered {:?}", output);
        Ok(result.combined())
    }
}

fn display_opt(value: Option<f64>) -> String {
    value.map(|v| format!("{v:.2}")).unwrap_or_else(|| "n/a".to_string())
}
