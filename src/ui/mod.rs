use anyhow::Error;
use std::io::{self, Write};
use std::path::Path;
use unicode_width::UnicodeWidthStr;

use crate::budget::{BudgetReport, Violation};
use crate::convert::ConversionOutcome;

#[derive(Debug, Clone)]
pub struct UiConfig {
    pub stderr_is_tty: bool,
    pub quiet: bool,
    pub verbose: bool,
}

pub fn eprintln_error(err: &Error) {
    let mut stderr = io::stderr().lock();
    let _ = writeln!(stderr, "error:");
    let _ = writeln!(stderr, "  {err}");

    // Exit-code tagging wraps an error without adding a message of its own.
    let mut last = err.to_string();
    let mut causes = Vec::new();
    for cause in err.chain().skip(1) {
        let msg = cause.to_string();
        if msg != last {
            causes.push(msg.clone());
        }
        last = msg;
    }
    if !causes.is_empty() {
        let _ = writeln!(stderr, "caused by:");
        for cause in causes {
            let _ = writeln!(stderr, "  - {cause}");
        }
    }

    let _ = writeln!(stderr, "next:");
    let _ = writeln!(
        stderr,
        "  - see `diagreport --help` for available commands and options"
    );
}

pub fn print_render_summary(
    output: &Path,
    char_count: usize,
    estimated_pages: f64,
    page_hard_cap: u32,
    cfg: &UiConfig,
) {
    if !cfg.quiet {
        let mut out = io::stdout().lock();
        let _ = writeln!(out, "Rendered Markdown: {}", output.display());
        let _ = writeln!(out, "Stats: {char_count} chars, ~{estimated_pages:.1} pages");
    }
    if estimated_pages > f64::from(page_hard_cap) {
        let mut stderr = io::stderr().lock();
        let _ = writeln!(
            stderr,
            "WARNING: Estimated pages exceed {page_hard_cap}-page hard cap!"
        );
    }
}

pub fn print_conversion_outcome(
    outcome: &ConversionOutcome,
    stderr_text: Option<&str>,
    cfg: &UiConfig,
) {
    if cfg.quiet {
        return;
    }
    let mut out = io::stdout().lock();
    match outcome {
        ConversionOutcome::Converted { output } => {
            let _ = writeln!(out, "Rendered PDF: {}", output.display());
        }
        ConversionOutcome::Skipped { reason } => {
            let _ = writeln!(out, "Info: {reason}; skipping PDF generation");
        }
        ConversionOutcome::Failed { reason, .. } => {
            let _ = writeln!(
                out,
                "Info: PDF generation failed ({reason}); the Markdown report is unaffected"
            );
        }
    }
    if cfg.verbose {
        if let Some(text) = stderr_text.map(str::trim).filter(|s| !s.is_empty()) {
            let mut stderr = io::stderr().lock();
            let _ = writeln!(stderr, "converter stderr:\n{text}");
        }
    }
}

pub fn print_log_hint(log_path: &Path, cfg: &UiConfig) {
    if cfg.verbose && !cfg.quiet {
        println!("Log: {}", log_path.display());
    }
}

pub fn eprintln_warning(message: &str) {
    let mut stderr = io::stderr().lock();
    let _ = writeln!(stderr, "warning: {message}");
}

pub fn eprintln_violations(violations: &[Violation]) {
    let mut stderr = io::stderr().lock();
    for v in violations {
        let _ = writeln!(stderr, "{}", format_violation(v));
    }
}

pub fn format_violation(v: &Violation) -> String {
    format!(
        "FAIL page_estimator: {} => {} pages (limit {})",
        v.document, v.estimated_pages, v.limit
    )
}

pub fn print_budget_table(report: &BudgetReport, cfg: &UiConfig) {
    if cfg.quiet {
        return;
    }
    let mut out = io::stdout().lock();
    if report.documents.is_empty() {
        let _ = writeln!(out, "No documents found in {}", report.corpus_dir);
        return;
    }

    let name_width = report
        .documents
        .iter()
        .map(|d| d.document.width())
        .max()
        .unwrap_or(0)
        .max("DOCUMENT".len());

    let _ = writeln!(
        out,
        "{}  {:>7}  {:>5}  {:>5}  STATUS",
        pad_right("DOCUMENT", name_width),
        "CHARS",
        "PAGES",
        "LIMIT"
    );
    for d in &report.documents {
        let status = if d.over_budget() { "FAIL" } else { "ok" };
        let _ = writeln!(
            out,
            "{}  {:>7}  {:>5}  {:>5}  {status}",
            pad_right(&d.document, name_width),
            d.char_count,
            d.estimated_pages,
            d.limit
        );
    }
    let _ = writeln!(
        out,
        "\n{} document(s) checked, {} violation(s)",
        report.documents.len(),
        report.violations.len()
    );
}

fn pad_right(s: &str, width: usize) -> String {
    let w = s.width();
    if w >= width {
        return s.to_string();
    }
    format!("{s}{}", " ".repeat(width - w))
}

pub fn budget_progress(cfg: &UiConfig) -> Option<indicatif::ProgressBar> {
    if !cfg.stderr_is_tty || cfg.quiet {
        return None;
    }
    let pb = indicatif::ProgressBar::new_spinner();
    pb.set_draw_target(indicatif::ProgressDrawTarget::stderr());
    pb.set_message("estimating pages...");
    pb.enable_steady_tick(std::time::Duration::from_millis(120));
    Some(pb)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn violation_line_format() {
        let v = Violation {
            document: "mock_H_big.json".to_string(),
            estimated_pages: 7,
            limit: 6,
        };
        assert_eq!(
            format_violation(&v),
            "FAIL page_estimator: mock_H_big.json => 7 pages (limit 6)"
        );
    }

    #[test]
    fn pad_right_uses_display_width() {
        assert_eq!(pad_right("ab", 4), "ab  ");
        assert_eq!(pad_right("日本", 6), "日本  ");
        assert_eq!(pad_right("toolong", 3), "toolong");
    }
}
