use std::path::{Path, PathBuf};
use std::sync::Arc;

use anyhow::{Context, Result};
use clap::{Args, Parser, Subcommand};
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;

use loudmaster::{
    config::{Config, INPUT_FORMATS, LOUDNESS_PRESETS, OUTPUT_PRESETS},
    pipeline::{
        default_output_path, join_worker, BatchRequest, BitDepth, LoudnessTargets, MasteringEngine,
        MasteringRequest, OutputFormat,
    },
    report::PresetNames,
    FfmpegExecutor, MasteringError,
};

#[derive(Parser)]
#[command(
    name = "loudmaster",
    version,
    about = "Master audio files to a target loudness and true-peak ceiling",
    long_about = "Loudmaster measures a mix, optionally shapes it with de-essing, multiband dynamic EQ, stereo width and glue compression, normalizes it in two passes with FFmpeg and reports the before/after loudness."
)]
struct Cli {
    /// Configuration file (optional)
    #[arg(short, long, global = true)]
    config: Option<PathBuf>,

    /// Enable verbose logging (prints every ffmpeg command)
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Master a single file
    Process {
        /// Input audio file (WAV, AIFF, FLAC)
        input: PathBuf,

        /// Output file (default: <input>_normalized.<ext>)
        #[arg(short, long)]
        output: Option<PathBuf>,

        /// Only measure and write the report
        #[arg(long)]
        analyze_only: bool,

        #[command(flatten)]
        mastering: MasteringArgs,
    },

    /// Measure a file and write its report without rendering
    Analyze {
        input: PathBuf,

        /// Path whose `.toml` sibling receives the report
        #[arg(short, long)]
        output: Option<PathBuf>,

        #[command(flatten)]
        mastering: MasteringArgs,
    },

    /// Master several files, or every supported file in the given folders
    Batch {
        /// Input files or folders
        #[arg(required = true)]
        inputs: Vec<PathBuf>,

        /// Destination folder (default: next to each input)
        #[arg(short = 'd', long)]
        output_dir: Option<PathBuf>,

        /// Appended to each output file name
        #[arg(long, default_value = "_normalized")]
        suffix: String,

        #[command(flatten)]
        mastering: MasteringArgs,
    },

    /// List loudness and output presets
    Presets,
}

/// Options shared by every processing command; unset flags keep the config file value
#[derive(Args, Debug)]
struct MasteringArgs {
    /// Target integrated loudness (LUFS)
    #[arg(long, allow_hyphen_values = true)]
    target_lufs: Option<f64>,

    /// True-peak ceiling (dBTP)
    #[arg(long, allow_hyphen_values = true)]
    true_peak: Option<f64>,

    /// Loudness preset name (see `presets`)
    #[arg(long)]
    loudness_preset: Option<String>,

    /// Output preset name (see `presets`)
    #[arg(long)]
    output_preset: Option<String>,

    /// Per-band dynamic EQ from the measured band profile
    #[arg(long)]
    dynamic_eq: bool,

    /// Per-band stereo width shaping
    #[arg(long)]
    stereo_width: bool,

    #[arg(long)]
    deesser: bool,

    /// Final limiter 0.5 dB below the true-peak ceiling
    #[arg(long)]
    brickwall: bool,

    /// Gentle bus compression ahead of normalization
    #[arg(long)]
    glue: bool,

    #[arg(long, allow_hyphen_values = true)]
    glue_threshold: Option<f64>,

    #[arg(long)]
    glue_ratio: Option<f64>,

    /// Glue attack (ms)
    #[arg(long)]
    glue_attack: Option<f64>,

    /// Glue release (ms)
    #[arg(long)]
    glue_release: Option<f64>,

    /// Glue makeup gain (dB)
    #[arg(long)]
    glue_makeup: Option<f64>,

    /// Fade-in length (s)
    #[arg(long)]
    fade_in: Option<f64>,

    /// Fade-out length (s)
    #[arg(long)]
    fade_out: Option<f64>,

    /// Smaller band corrections
    #[arg(long)]
    transparent: bool,

    /// Output format (wav, aiff, flac, m4a, mp3)
    #[arg(long)]
    format: Option<OutputFormat>,

    /// Output sample rate (Hz)
    #[arg(long)]
    sample_rate: Option<u32>,

    /// Output bit depth (16 or 24)
    #[arg(long)]
    bit_depth: Option<BitDepth>,

    /// Replace existing output files
    #[arg(long)]
    overwrite: bool,

    #[arg(long)]
    artist: Option<String>,

    #[arg(long)]
    comment: Option<String>,

    /// Copyright notice; `<Artist>` is replaced by the artist name
    #[arg(long)]
    copyright: Option<String>,

    /// Label or company, written as publisher and encoder
    #[arg(long)]
    company: Option<String>,

    #[arg(long)]
    url: Option<String>,

    #[arg(long)]
    contact: Option<String>,
}

impl MasteringArgs {
    /// Layer the command-line flags over `config`
    fn apply(&self, config: &mut Config) -> loudmaster::Result<()> {
        if let Some(name) = &self.loudness_preset {
            config.targets.loudness_preset = name.clone();
        }
        if let Some(name) = &self.output_preset {
            config.targets.output_preset = name.clone();
        }
        config.apply_presets()?;

        // Explicit values win over presets
        if let Some(lufs) = self.target_lufs {
            config.targets.target_lufs = lufs;
        }
        if let Some(true_peak) = self.true_peak {
            config.targets.true_peak = true_peak;
        }

        let processing = &mut config.processing;
        processing.dynamic_eq |= self.dynamic_eq;
        processing.stereo_width |= self.stereo_width;
        processing.deesser |= self.deesser;
        processing.brickwall |= self.brickwall;
        processing.transparent_mode |= self.transparent;
        processing.overwrite |= self.overwrite;

        let glue = &mut processing.glue;
        glue.enabled |= self.glue;
        set(&mut glue.threshold_db, self.glue_threshold);
        set(&mut glue.ratio, self.glue_ratio);
        set(&mut glue.attack_ms, self.glue_attack);
        set(&mut glue.release_ms, self.glue_release);
        set(&mut glue.makeup_db, self.glue_makeup);

        set(&mut processing.fade_in_s, self.fade_in);
        set(&mut processing.fade_out_s, self.fade_out);

        if self.format.is_some() {
            processing.output.format = self.format;
        }
        if self.sample_rate.is_some() {
            processing.output.sample_rate = self.sample_rate;
        }
        if self.bit_depth.is_some() {
            processing.output.bit_depth = self.bit_depth;
        }

        let signature = &mut config.signature;
        set(&mut signature.artist, self.artist.clone());
        set(&mut signature.comment, self.comment.clone());
        set(&mut signature.copyright, self.copyright.clone());
        set(&mut signature.company, self.company.clone());
        set(&mut signature.url, self.url.clone());
        set(&mut signature.contact, self.contact.clone());

        config.validate()
    }
}

fn set<T>(slot: &mut T, value: Option<T>) {
    if let Some(value) = value {
        *slot = value;
    }
}

fn load_config(path: Option<&Path>, args: &MasteringArgs) -> Result<Config> {
    let mut config = match path {
        Some(config_path) => {
            info!("Loading configuration from {:?}", config_path);
            Config::from_file(config_path).map_err(user_error)?
        }
        None => Config::default(),
    };
    args.apply(&mut config).map_err(user_error)?;
    Ok(config)
}

fn user_error(e: MasteringError) -> anyhow::Error {
    anyhow::anyhow!(e.user_message())
}

fn targets_of(config: &Config) -> LoudnessTargets {
    LoudnessTargets {
        lufs: config.targets.target_lufs,
        true_peak: config.targets.true_peak,
    }
}

fn presets_of(config: &Config) -> PresetNames {
    PresetNames {
        loudness: config.targets.loudness_preset.clone(),
        output: config.targets.output_preset.clone(),
    }
}

/// Expand folders into their supported audio files, sorted by name
fn collect_inputs(paths: &[PathBuf]) -> Result<Vec<PathBuf>> {
    let mut inputs = Vec::new();
    for path in paths {
        if !path.is_dir() {
            inputs.push(path.clone());
            continue;
        }

        let mut found: Vec<PathBuf> = std::fs::read_dir(path)
            .with_context(|| format!("Failed to read folder {:?}", path))?
            .filter_map(|entry| entry.ok().map(|e| e.path()))
            .filter(|p| {
                p.extension()
                    .map(|ext| INPUT_FORMATS.contains(&ext.to_string_lossy().to_ascii_lowercase().as_str()))
                    .unwrap_or(false)
            })
            .collect();
        found.sort();
        inputs.extend(found);
    }
    Ok(inputs)
}

async fn run_single(
    engine: &Arc<MasteringEngine<FfmpegExecutor>>,
    config: &Config,
    input: PathBuf,
    output: Option<PathBuf>,
    analyze_only: bool,
) -> Result<()> {
    let mut options = config.processing_options();
    options.analyze_only |= analyze_only;

    let output = output.unwrap_or_else(|| default_output_path(&input, options.output.format));
    let request = MasteringRequest {
        input,
        output,
        targets: targets_of(config),
        presets: presets_of(config),
        options,
    };

    let outcome = join_worker(engine.spawn_process(request)).await.map_err(user_error)?;

    println!("{}", outcome.summary);
    if let Some(output) = &outcome.output {
        info!("🎉 Mastered file saved to: {:?}", output);
    }
    info!("Report: {:?}", outcome.report_path);
    Ok(())
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    // Initialize logging; RUST_LOG overrides the verbosity flag
    let default_level = if cli.verbose { "debug" } else { "info" };
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level)))
        .init();

    info!("Starting Loudmaster v{}", env!("CARGO_PKG_VERSION"));

    match cli.command {
        Command::Presets => {
            println!("Loudness presets:");
            for (name, values) in LOUDNESS_PRESETS {
                match values {
                    Some((lufs, tp)) => println!("  {name:<45} {lufs:>6.1} LUFS {tp:>5.1} dBTP"),
                    None => println!("  {name}"),
                }
            }
            println!("\nOutput presets:");
            for (name, values) in OUTPUT_PRESETS {
                match values {
                    Some((rate, depth)) => println!("  {name:<45} {rate:>6} Hz {:>3}-bit", depth.bits()),
                    None => println!("  {name}"),
                }
            }
        }

        Command::Process { input, output, analyze_only, mastering } => {
            let config = load_config(cli.config.as_deref(), &mastering)?;
            let engine = Arc::new(MasteringEngine::new(config.executor()));
            run_single(&engine, &config, input, output, analyze_only).await?;
        }

        Command::Analyze { input, output, mastering } => {
            let config = load_config(cli.config.as_deref(), &mastering)?;
            let engine = Arc::new(MasteringEngine::new(config.executor()));
            run_single(&engine, &config, input, output, true).await?;
        }

        Command::Batch { inputs, output_dir, suffix, mastering } => {
            let config = load_config(cli.config.as_deref(), &mastering)?;
            let engine = Arc::new(MasteringEngine::new(config.executor()));

            let request = BatchRequest {
                inputs: collect_inputs(&inputs)?,
                output_dir,
                suffix,
                targets: targets_of(&config),
                presets: presets_of(&config),
                options: config.processing_options(),
            };

            let summary = join_worker(engine.spawn_batch(request)).await.map_err(user_error)?;

            for outcome in &summary.completed {
                println!("✅ {:?} → {:?}", outcome.input, outcome.output.as_ref().unwrap_or(&outcome.report_path));
            }
            for (input, message) in &summary.failed {
                warn!("❌ {:?}: {}", input, message);
            }
            info!("Batch complete: {}/{} files processed", summary.completed.len(), summary.total());

            if !summary.all_succeeded() {
                anyhow::bail!("{} file(s) failed", summary.failed.len());
            }
        }
    }

    Ok(())
}
