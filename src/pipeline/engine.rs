use std::path::{Path, PathBuf};
use std::sync::Arc;

use tokio::task::JoinHandle;
use tracing::{debug, info, warn};

use crate::{
    analysis::{BandAnalysis, BandAnalyzer, BandDefinition, LoudnessStats, BAND_CONFIG},
    config::ProcessingOptions,
    error::{ExecutorError, OutputError, Result},
    executor::Executor,
    graph::{build_graph, plan_stages, BandTuning, FilterGraphDescriptor},
    pipeline::{
        loudness::{LoudnessPipeline, LoudnessTargets},
        output::{batch_output_path, ensure_output_path},
    },
    report::{evaluate, format_analysis_summary, MasteringReport, MeasurementBlock, PresetNames, ReportSettings},
};

/// Everything one single-file run needs, fixed before processing starts
#[derive(Debug, Clone)]
pub struct MasteringRequest {
    pub input: PathBuf,
    /// Rendered file; in analyze-only mode only its report path is used
    pub output: PathBuf,
    pub targets: LoudnessTargets,
    pub presets: PresetNames,
    pub options: ProcessingOptions,
}

/// Several inputs sharing one set of targets and options
#[derive(Debug, Clone)]
pub struct BatchRequest {
    pub inputs: Vec<PathBuf>,
    /// Destination folder; each output lands next to its input when unset
    pub output_dir: Option<PathBuf>,
    /// Appended to each input stem
    pub suffix: String,
    pub targets: LoudnessTargets,
    pub presets: PresetNames,
    pub options: ProcessingOptions,
}

/// Result of one completed run
#[derive(Debug, Clone)]
pub struct MasteringOutcome {
    pub input: PathBuf,
    /// `None` when nothing was rendered
    pub output: Option<PathBuf>,
    pub report_path: PathBuf,
    pub report: MasteringReport,
    /// Before/after text for display
    pub summary: String,
}

/// Per-file results of a batch
#[derive(Debug, Default)]
pub struct BatchSummary {
    pub completed: Vec<MasteringOutcome>,
    /// Input path and the user-facing error message
    pub failed: Vec<(PathBuf, String)>,
}

impl BatchSummary {
    pub fn total(&self) -> usize {
        self.completed.len() + self.failed.len()
    }

    pub fn all_succeeded(&self) -> bool {
        self.failed.is_empty()
    }
}

/// Input side of a run: loudness, band profile, voice level
struct Measurement {
    stats: LoudnessStats,
    bands: BandAnalysis,
    voice_rms: Option<f64>,
}

/// Main mastering engine: measure → plan → apply → re-measure → report
///
/// Every step is a blocking executor call and steps never overlap for one
/// file. Batches run their files one after the other.
pub struct MasteringEngine<E: Executor> {
    executor: E,
    bands: Vec<BandDefinition>,
}

impl<E: Executor> MasteringEngine<E> {
    /// Create an engine over `executor` using the standard six bands
    pub fn new(executor: E) -> Self {
        Self {
            executor,
            bands: BAND_CONFIG.to_vec(),
        }
    }

    /// Replace the band layout used for analysis and multiband processing
    pub fn with_bands(mut self, bands: Vec<BandDefinition>) -> Self {
        self.bands = bands;
        self
    }

    pub fn executor(&self) -> &E {
        &self.executor
    }

    /// Run the full pipeline for one file
    pub fn process(&self, request: &MasteringRequest) -> Result<MasteringOutcome> {
        let input = request.input.as_path();
        let output = ensure_output_path(&request.output, request.options.output.format);

        info!("🎛️  Mastering {:?}", input);
        info!("   Target: {} LUFS / {} dBTP", request.targets.lufs, request.targets.true_peak);
        debug!("Options: {:?}", request.options);

        self.executor.check_available()?;

        let tuning = BandTuning::for_mode(request.options.transparent_mode);
        let analyzer = BandAnalyzer::new(&self.executor);
        let pipeline = LoudnessPipeline::new(&self.executor, request.targets);

        // Pipeline Step 1: band profile of the input
        let bands = analyzer.analyze_bands(input, &self.bands, tuning.band_range_db)?;
        for suggestion in &bands.suggestions {
            info!("   💡 {}", suggestion);
        }
        let voice_rms = analyzer.analyze_voice_band(input)?;

        if request.options.analyze_only {
            let stats = pipeline.measure(input, &FilterGraphDescriptor::passthrough())?;
            let before = Measurement { stats, bands, voice_rms };
            return self.finish(request, &request.options, &output, before, None);
        }

        // Pipeline Step 2: plan the processing graph
        let options = self.effective_options(&request.options, &bands);
        let graph = self.plan_graph(input, &options, &bands)?;

        // Pipeline Step 3: measure through the graph the render will use
        let stats = pipeline.measure(input, &graph)?;

        // Pipeline Step 4: render
        pipeline.apply(input, &output, &stats, &graph, &options)?;

        // Pipeline Step 5: measure what was written
        info!("🔁 Re-measuring rendered file");
        let after = Measurement {
            stats: pipeline.measure(&output, &FilterGraphDescriptor::passthrough())?,
            bands: analyzer.analyze_bands(&output, &self.bands, tuning.band_range_db)?,
            voice_rms: analyzer.analyze_voice_band(&output)?,
        };

        let before = Measurement { stats, bands, voice_rms };
        self.finish(request, &options, &output, before, Some(after))
    }

    /// Run every input in order.
    ///
    /// An executor that cannot be launched stops the batch; any other
    /// failure is recorded for that file and the next file starts.
    pub fn process_batch(&self, request: &BatchRequest) -> Result<BatchSummary> {
        let inputs: Vec<&PathBuf> = request
            .inputs
            .iter()
            .filter(|path| {
                let exists = path.is_file();
                if !exists {
                    warn!("Skipping missing input {:?}", path);
                }
                exists
            })
            .collect();

        if inputs.is_empty() {
            return Err(OutputError::NoInputFiles.into());
        }

        self.executor.check_available()?;
        match &request.output_dir {
            Some(output_dir) => {
                std::fs::create_dir_all(output_dir)?;
                info!("📦 Batch of {} files into {:?}", inputs.len(), output_dir);
            }
            None => info!("📦 Batch of {} files next to their inputs", inputs.len()),
        }

        let mut summary = BatchSummary::default();
        for (index, input) in inputs.iter().enumerate() {
            info!("[{}/{}] {:?}", index + 1, inputs.len(), input);

            let single = MasteringRequest {
                input: input.to_path_buf(),
                output: batch_output_path(
                    input,
                    request.output_dir.as_deref(),
                    &request.suffix,
                    request.options.output.format,
                ),
                targets: request.targets,
                presets: request.presets.clone(),
                options: request.options.clone(),
            };

            match self.process(&single) {
                Ok(outcome) => summary.completed.push(outcome),
                Err(e) if e.aborts_batch() => return Err(e),
                Err(e) => {
                    warn!("Failed to process {:?}: {}", input, e);
                    summary.failed.push((input.to_path_buf(), e.user_message()));
                }
            }
        }

        info!(
            "✅ Batch finished: {} processed, {} failed",
            summary.completed.len(),
            summary.failed.len()
        );
        Ok(summary)
    }

    /// Drop dynamic EQ when no band could be measured
    fn effective_options(&self, requested: &ProcessingOptions, bands: &BandAnalysis) -> ProcessingOptions {
        let mut options = requested.clone();
        if options.dynamic_eq && bands.energy.is_empty() {
            warn!("No band could be measured; dynamic EQ disabled for this file");
            options.dynamic_eq = false;
        }
        options
    }

    fn plan_graph(&self, input: &Path, options: &ProcessingOptions, bands: &BandAnalysis) -> Result<FilterGraphDescriptor> {
        let sample_rate = if options.deesser {
            let rate = self.executor.probe_sample_rate(input);
            if rate.is_none() {
                warn!("Could not probe sample rate of {:?}; de-esser uses its default frequency", input);
            }
            rate
        } else {
            None
        };

        let stages = plan_stages(options, &self.bands, Some(&bands.energy), sample_rate)?;
        let active = stages.iter().filter(|s| s.is_active()).count();
        info!("🧩 {} processing stage(s) ahead of normalization", active);
        Ok(build_graph(&stages))
    }

    fn finish(
        &self,
        request: &MasteringRequest,
        options: &ProcessingOptions,
        output: &Path,
        before: Measurement,
        after: Option<Measurement>,
    ) -> Result<MasteringOutcome> {
        let targets = request.targets;
        let block = |m: &Measurement| {
            MeasurementBlock::new(&m.stats, &m.bands.energy, m.voice_rms, &evaluate(&m.stats, targets))
        };

        let mut summary = format_analysis_summary("Antes", &before.stats, &before.bands.energy, before.voice_rms, targets);
        if let Some(after) = &after {
            summary.push_str("\n\n");
            summary.push_str(&format_analysis_summary(
                "Después",
                &after.stats,
                &after.bands.energy,
                after.voice_rms,
                targets,
            ));
        }

        let report = MasteringReport::new(
            ReportSettings::new(&request.presets, targets, options),
            block(&before),
            after.as_ref().map(block),
        )
        .with_signature(&options.metadata);
        let report_path = report.write(output)?;

        Ok(MasteringOutcome {
            input: request.input.clone(),
            output: after.is_some().then(|| output.to_path_buf()),
            report_path,
            report,
            summary,
        })
    }
}

impl<E: Executor + 'static> MasteringEngine<E> {
    /// Run [`process`](Self::process) on the blocking pool. The run cannot be
    /// cancelled once started.
    pub fn spawn_process(self: &Arc<Self>, request: MasteringRequest) -> JoinHandle<Result<MasteringOutcome>> {
        let engine = Arc::clone(self);
        tokio::task::spawn_blocking(move || engine.process(&request))
    }

    /// Run [`process_batch`](Self::process_batch) on the blocking pool
    pub fn spawn_batch(self: &Arc<Self>, request: BatchRequest) -> JoinHandle<Result<BatchSummary>> {
        let engine = Arc::clone(self);
        tokio::task::spawn_blocking(move || engine.process_batch(&request))
    }
}

/// Await a worker, turning a panicked or aborted task into `WorkerFailed`
pub async fn join_worker<T>(handle: JoinHandle<Result<T>>) -> Result<T> {
    handle
        .await
        .map_err(|e| ExecutorError::WorkerFailed { reason: e.to_string() })?
}
