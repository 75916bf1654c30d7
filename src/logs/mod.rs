use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use serde::Serialize;
use time::OffsetDateTime;
use time::format_description::well_known::Rfc3339;

use crate::convert::{ConversionAttempt, ConversionOutcome};

const MAX_CMD_OUTPUT_BYTES: usize = 64 * 1024;

#[derive(Debug, Serialize)]
struct RenderLog {
    schema_version: &'static str,
    tool_version: String,
    command: &'static str,
    started_at: String,
    finished_at: String,
    input: String,
    output: String,
    char_count: usize,
    estimated_pages: f64,
    over_hard_cap: bool,
    converter: String,
    conversion: ConversionOutcome,
    #[serde(skip_serializing_if = "Option::is_none")]
    attempt: Option<CommandAttemptLog>,
}

#[derive(Debug, Serialize)]
struct CommandAttemptLog {
    cmd: String,
    args: Vec<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    exit_code: Option<i32>,
    #[serde(skip_serializing_if = "String::is_empty")]
    stdout: String,
    #[serde(skip_serializing_if = "String::is_empty")]
    stderr: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    error: Option<String>,
}

#[derive(Debug)]
pub struct RenderRun<'a> {
    pub started_at: OffsetDateTime,
    pub finished_at: OffsetDateTime,
    pub input: &'a Path,
    pub output: &'a Path,
    pub char_count: usize,
    pub estimated_pages: f64,
    pub over_hard_cap: bool,
    pub converter: &'a str,
    pub conversion: &'a ConversionOutcome,
    pub attempt: Option<&'a ConversionAttempt>,
}

pub fn logs_dir(output_dir: &Path) -> PathBuf {
    output_dir.join("logs")
}

pub fn write_render_log(output_dir: &Path, run: &RenderRun<'_>) -> Result<PathBuf> {
    let dir = logs_dir(output_dir);
    std::fs::create_dir_all(&dir)
        .with_context(|| format!("failed to create log directory: {}", dir.display()))?;

    let pid = std::process::id();
    let ts = run.finished_at.unix_timestamp_nanos();
    let path = dir.join(format!("render-{pid}-{ts}.json"));

    let log = RenderLog {
        schema_version: "1.0",
        tool_version: env!("CARGO_PKG_VERSION").to_string(),
        command: "render",
        started_at: format_time(run.started_at),
        finished_at: format_time(run.finished_at),
        input: run.input.display().to_string(),
        output: run.output.display().to_string(),
        char_count: run.char_count,
        estimated_pages: (run.estimated_pages * 10.0).round() / 10.0,
        over_hard_cap: run.over_hard_cap,
        converter: run.converter.to_string(),
        conversion: run.conversion.clone(),
        attempt: run.attempt.map(command_attempt),
    };

    let buf = serde_json::to_vec_pretty(&log).context("failed to serialize log (JSON)")?;
    std::fs::write(&path, buf)
        .with_context(|| format!("failed to write log: {}", path.display()))?;
    Ok(path)
}

fn format_time(t: OffsetDateTime) -> String {
    t.format(&Rfc3339).unwrap_or_else(|_| "unknown".to_string())
}

fn command_attempt(attempt: &ConversionAttempt) -> CommandAttemptLog {
    let (exit_code, stdout, stderr) = match &attempt.output {
        Some(out) => (
            Some(out.exit_code),
            truncate_utf8(&out.stdout, MAX_CMD_OUTPUT_BYTES),
            truncate_utf8(&out.stderr, MAX_CMD_OUTPUT_BYTES),
        ),
        None => (None, String::new(), String::new()),
    };
    CommandAttemptLog {
        cmd: attempt.cmd.clone(),
        args: attempt.args.clone(),
        exit_code,
        stdout,
        stderr,
        error: attempt.error.clone(),
    }
}

fn truncate_utf8(s: &str, max_bytes: usize) -> String {
    if s.len() <= max_bytes {
        return s.to_string();
    }
    let mut end = max_bytes;
    while end > 0 && !s.is_char_boundary(end) {
        end -= 1;
    }
    format!("{}…(truncated)", &s[..end])
}
