//! End-to-end runs against a real ffmpeg. Skipped when ffmpeg is not installed.

use std::f32::consts::PI;
use std::path::Path;

use loudmaster::{
    analysis::{BandAnalyzer, BAND_CONFIG},
    config::ProcessingOptions,
    executor::{Executor, FfmpegExecutor},
    graph::FilterGraphDescriptor,
    pipeline::{LoudnessPipeline, LoudnessTargets, MasteringEngine, MasteringRequest},
    report::{MasteringReport, PresetNames},
};
use tempfile::tempdir;

fn ffmpeg() -> Option<FfmpegExecutor> {
    let executor = FfmpegExecutor::new();
    match executor.check_available() {
        Ok(()) => Some(executor),
        Err(e) => {
            eprintln!("skipping: {}", e);
            None
        }
    }
}

/// Five seconds of a quiet stereo 440 Hz tone with a little 100 Hz underneath
fn write_tone(path: &Path) {
    let spec = hound::WavSpec {
        channels: 2,
        sample_rate: 44100,
        bits_per_sample: 16,
        sample_format: hound::SampleFormat::Int,
    };
    let mut writer = hound::WavWriter::create(path, spec).unwrap();
    for n in 0..44100 * 5 {
        let t = n as f32 / 44100.0;
        let sample = 0.1 * (2.0 * PI * 440.0 * t).sin() + 0.05 * (2.0 * PI * 100.0 * t).sin();
        let value = (sample * i16::MAX as f32) as i16;
        writer.write_sample(value).unwrap();
        writer.write_sample(value).unwrap();
    }
    writer.finalize().unwrap();
}

#[test]
fn test_measure_and_band_analysis() {
    let Some(executor) = ffmpeg() else { return };
    let dir = tempdir().unwrap();
    let input = dir.path().join("tone.wav");
    write_tone(&input);

    let pipeline = LoudnessPipeline::new(&executor, LoudnessTargets::default());
    let stats = pipeline.measure(&input, &FilterGraphDescriptor::passthrough()).unwrap();
    assert!(stats.integrated < -10.0 && stats.integrated > -40.0);
    assert!(stats.normalization_inputs().is_ok());

    let analysis = BandAnalyzer::new(&executor)
        .analyze_bands(&input, &BAND_CONFIG, 3.0)
        .unwrap();
    assert!(analysis.energy.get("Mid (500-2k Hz)").is_some() || analysis.energy.get("Low-Mid (250-500 Hz)").is_some());

    let rate = executor.probe_sample_rate(&input);
    assert_eq!(rate, Some(44100.0));
    let duration = executor.probe_duration(&input).unwrap();
    assert!((duration - 5.0).abs() < 0.05);
}

#[test]
fn test_plain_normalization_hits_target() {
    let Some(executor) = ffmpeg() else { return };
    let dir = tempdir().unwrap();
    let input = dir.path().join("tone.wav");
    let output = dir.path().join("tone_normalized.wav");
    write_tone(&input);

    let engine = MasteringEngine::new(executor);
    let outcome = engine
        .process(&MasteringRequest {
            input: input.clone(),
            output: output.clone(),
            targets: LoudnessTargets { lufs: -16.0, true_peak: -1.5 },
            presets: PresetNames::default(),
            options: ProcessingOptions::default(),
        })
        .unwrap();

    assert!(output.exists());
    let after = outcome.report.after.as_ref().unwrap();
    assert!((after.input_i + 16.0).abs() < 1.5, "rendered loudness {}", after.input_i);

    let stored = MasteringReport::read_from(&outcome.report_path).unwrap();
    assert_eq!(stored.before.input_i, outcome.report.before.input_i);
}
