use std::path::{Path, PathBuf};
use std::time::Duration;

use serde::Serialize;

use crate::config::ConvertConfig;
use crate::platform::{self, CommandOutput};

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum ConversionOutcome {
    Converted {
        output: PathBuf,
    },
    Skipped {
        reason: String,
    },
    Failed {
        reason: String,
        #[serde(skip_serializing_if = "Option::is_none")]
        exit_code: Option<i32>,
    },
}

#[derive(Debug, Clone, Default)]
pub struct ConversionAttempt {
    pub cmd: String,
    pub args: Vec<String>,
    pub output: Option<CommandOutput>,
    pub error: Option<String>,
}

pub trait DocumentConverter {
    fn name(&self) -> &str;

    fn convert(
        &self,
        markdown: &Path,
        output: &Path,
    ) -> (ConversionOutcome, Option<ConversionAttempt>);
}

#[derive(Debug, Clone)]
pub struct PandocConverter {
    pub program: String,
    pub timeout: Duration,
}

impl PandocConverter {
    pub fn args(markdown: &Path, output: &Path) -> Vec<String> {
        vec![
            markdown.display().to_string(),
            "-o".to_string(),
            output.display().to_string(),
            "--pdf-engine=xelatex".to_string(),
            "-V".to_string(),
            "geometry:margin=0.75in".to_string(),
        ]
    }
}

impl DocumentConverter for PandocConverter {
    fn name(&self) -> &str {
        &self.program
    }

    fn convert(
        &self,
        markdown: &Path,
        output: &Path,
    ) -> (ConversionOutcome, Option<ConversionAttempt>) {
        let args = Self::args(markdown, output);
        let arg_refs: Vec<&str> = args.iter().map(String::as_str).collect();
        let mut attempt = ConversionAttempt {
            cmd: self.program.clone(),
            args: args.clone(),
            ..ConversionAttempt::default()
        };

        let outcome = match platform::run_command(&self.program, &arg_refs, self.timeout) {
            Ok(out) if out.exit_code == 0 => {
                attempt.output = Some(out);
                ConversionOutcome::Converted {
                    output: output.to_path_buf(),
                }
            }
            Ok(out) => {
                let stderr = out.stderr.trim();
                let reason = if stderr.is_empty() {
                    format!("{} exited with code {}", self.program, out.exit_code)
                } else {
                    format!(
                        "{} exited with code {}: {}",
                        self.program,
                        out.exit_code,
                        stderr.lines().next().unwrap_or_default()
                    )
                };
                let exit_code = Some(out.exit_code);
                attempt.output = Some(out);
                ConversionOutcome::Failed { reason, exit_code }
            }
            Err(err) => {
                let reason = format!("{err:#}");
                attempt.error = Some(reason.clone());
                ConversionOutcome::Failed {
                    reason,
                    exit_code: None,
                }
            }
        };
        (outcome, Some(attempt))
    }
}

#[derive(Debug, Clone)]
pub struct NoopConverter {
    pub reason: String,
}

impl DocumentConverter for NoopConverter {
    fn name(&self) -> &str {
        "none"
    }

    fn convert(
        &self,
        _markdown: &Path,
        _output: &Path,
    ) -> (ConversionOutcome, Option<ConversionAttempt>) {
        (
            ConversionOutcome::Skipped {
                reason: self.reason.clone(),
            },
            None,
        )
    }
}

pub fn select_converter(cfg: &ConvertConfig, timeout: Duration) -> Box<dyn DocumentConverter> {
    if !cfg.enabled {
        return Box::new(NoopConverter {
            reason: "conversion disabled by configuration".to_string(),
        });
    }
    match platform::find_program(&cfg.program) {
        Some(_) => Box::new(PandocConverter {
            program: cfg.program.clone(),
            timeout,
        }),
        None => Box::new(NoopConverter {
            reason: format!("{} not available", cfg.program),
        }),
    }
}
