use std::path::Path;
use std::sync::Mutex;

use crate::error::{ExecutorError, Result};
use crate::executor::{ExecOutput, Executor};

struct Rule {
    needles: Vec<String>,
    output: ExecOutput,
}

/// Test executor answering from canned output.
///
/// Each call is matched against the rules in insertion order; a rule fires
/// when every needle occurs in the space-joined argument vector. Unmatched
/// calls succeed with empty output. Every argument vector is recorded.
pub(crate) struct ScriptedExecutor {
    rules: Vec<Rule>,
    calls: Mutex<Vec<Vec<String>>>,
    duration: Option<f64>,
    sample_rate: Option<f64>,
    available: bool,
}

impl ScriptedExecutor {
    pub fn new() -> Self {
        Self {
            rules: Vec::new(),
            calls: Mutex::new(Vec::new()),
            duration: None,
            sample_rate: None,
            available: true,
        }
    }

    pub fn respond(self, needle: &str, stderr: &str) -> Self {
        self.respond_all(&[needle], stderr)
    }

    pub fn respond_all(mut self, needles: &[&str], stderr: &str) -> Self {
        self.rules.push(Rule {
            needles: needles.iter().map(|n| n.to_string()).collect(),
            output: ExecOutput {
                stdout: String::new(),
                stderr: stderr.to_string(),
                exit_code: Some(0),
            },
        });
        self
    }

    pub fn respond_failure(mut self, needle: &str, stderr: &str) -> Self {
        self.rules.push(Rule {
            needles: vec![needle.to_string()],
            output: ExecOutput {
                stdout: String::new(),
                stderr: stderr.to_string(),
                exit_code: Some(1),
            },
        });
        self
    }

    pub fn with_duration(mut self, seconds: f64) -> Self {
        self.duration = Some(seconds);
        self
    }

    pub fn with_sample_rate(mut self, hz: f64) -> Self {
        self.sample_rate = Some(hz);
        self
    }

    pub fn unavailable(mut self) -> Self {
        self.available = false;
        self
    }

    pub fn calls(&self) -> Vec<Vec<String>> {
        self.calls.lock().map(|calls| calls.clone()).unwrap_or_default()
    }
}

impl Executor for ScriptedExecutor {
    fn tool_name(&self) -> &str {
        "scripted"
    }

    fn run(&self, args: &[String]) -> Result<ExecOutput> {
        if !self.available {
            return Err(ExecutorError::ToolUnavailable {
                tool: "scripted".to_string(),
                reason: "disabled".to_string(),
            }
            .into());
        }

        if let Ok(mut calls) = self.calls.lock() {
            calls.push(args.to_vec());
        }

        let joined = args.join(" ");
        let output = self
            .rules
            .iter()
            .find(|rule| rule.needles.iter().all(|n| joined.contains(n.as_str())))
            .map(|rule| rule.output.clone())
            .unwrap_or(ExecOutput {
                exit_code: Some(0),
                ..Default::default()
            });
        Ok(output)
    }

    fn probe_duration(&self, _path: &Path) -> Option<f64> {
        self.duration
    }

    fn probe_sample_rate(&self, _path: &Path) -> Option<f64> {
        self.sample_rate
    }

    fn check_available(&self) -> Result<()> {
        if self.available {
            Ok(())
        } else {
            Err(ExecutorError::ToolUnavailable {
                tool: "scripted".to_string(),
                reason: "disabled".to_string(),
            }
            .into())
        }
    }
}

/// Loudness block as printed by the measurement filter
pub(crate) fn loudnorm_block(input_i: f64, input_tp: f64, input_lra: f64, thresh: f64, offset: f64) -> String {
    format!(
        "[Parsed_loudnorm_0 @ 0x55d1c8a0] \n{{\n\t\"input_i\" : \"{input_i:.2}\",\n\t\"input_tp\" : \"{input_tp:.2}\",\n\t\"input_lra\" : \"{input_lra:.2}\",\n\t\"input_thresh\" : \"{thresh:.2}\",\n\t\"output_i\" : \"-14.02\",\n\t\"output_tp\" : \"-1.00\",\n\t\"output_lra\" : \"5.10\",\n\t\"output_thresh\" : \"-24.30\",\n\t\"normalization_type\" : \"dynamic\",\n\t\"target_offset\" : \"{offset:.2}\"\n}}\n"
    )
}

/// Statistics summary as printed by the band statistics filter
pub(crate) fn astats_summary(rms_db: f64) -> String {
    format!(
        "[Parsed_astats_2 @ 0x55d1c8a0] Channel: 1\n[Parsed_astats_2 @ 0x55d1c8a0] RMS level dB: {:.6}\n[Parsed_astats_2 @ 0x55d1c8a0] Overall\n[Parsed_astats_2 @ 0x55d1c8a0] Peak level dB: -0.500000\n[Parsed_astats_2 @ 0x55d1c8a0] RMS level dB: {rms_db:.6}\n",
        rms_db - 1.0
    )
}
