use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use globset::{Glob, GlobSet, GlobSetBuilder};
use serde::Serialize;
use walkdir::WalkDir;

pub const DEFAULT_CORPUS_DIR: &str = "tests/golden";

#[derive(Debug, Clone, Serialize)]
pub struct BudgetPolicy {
    pub chars_per_page: usize,
    pub default_limit: u32,
    pub extended_limit: u32,
    pub extended_marker: String,
    pub include: Vec<String>,
}

impl Default for BudgetPolicy {
    fn default() -> Self {
        Self {
            chars_per_page: 3000,
            default_limit: 4,
            extended_limit: 6,
            extended_marker: "mock_H".to_string(),
            include: vec!["*.json".to_string()],
        }
    }
}

impl BudgetPolicy {
    pub fn limit_for(&self, name: &str) -> u32 {
        if !self.extended_marker.is_empty() && name.contains(&self.extended_marker) {
            self.extended_limit
        } else {
            self.default_limit
        }
    }

    pub fn estimate_pages(&self, char_count: usize) -> u32 {
        if char_count == 0 || self.chars_per_page == 0 {
            return 0;
        }
        char_count.div_ceil(self.chars_per_page) as u32
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct DocumentEstimate {
    pub document: String,
    pub char_count: usize,
    pub estimated_pages: u32,
    pub limit: u32,
}

impl DocumentEstimate {
    pub fn over_budget(&self) -> bool {
        self.estimated_pages > self.limit
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Violation {
    pub document: String,
    pub estimated_pages: u32,
    pub limit: u32,
}

#[derive(Debug, Clone, Default, Serialize)]
pub struct BudgetReport {
    pub corpus_dir: String,
    pub documents: Vec<DocumentEstimate>,
    pub violations: Vec<Violation>,
}

impl BudgetReport {
    pub fn new(corpus_dir: &Path) -> Self {
        Self {
            corpus_dir: corpus_dir.display().to_string(),
            ..Self::default()
        }
    }

    pub fn record(&mut self, estimate: DocumentEstimate) {
        if estimate.over_budget() {
            self.violations.push(Violation {
                document: estimate.document.clone(),
                estimated_pages: estimate.estimated_pages,
                limit: estimate.limit,
            });
        }
        self.documents.push(estimate);
    }

    pub fn passed(&self) -> bool {
        self.violations.is_empty()
    }
}

pub fn estimate_document(name: &str, text: &str, policy: &BudgetPolicy) -> DocumentEstimate {
    let char_count = text.chars().count();
    DocumentEstimate {
        document: name.to_string(),
        char_count,
        estimated_pages: policy.estimate_pages(char_count),
        limit: policy.limit_for(name),
    }
}

pub fn build_include_set(patterns: &[String]) -> Result<GlobSet> {
    let mut builder = GlobSetBuilder::new();
    for pattern in patterns {
        let glob =
            Glob::new(pattern).with_context(|| format!("invalid include pattern: {pattern}"))?;
        builder.add(glob);
    }
    builder.build().context("failed to build include pattern set")
}

pub fn collect_documents(dir: &Path, include: &GlobSet) -> Result<Vec<PathBuf>> {
    let mut out = Vec::new();
    for entry in WalkDir::new(dir)
        .min_depth(1)
        .max_depth(1)
        .follow_links(true)
        .sort_by_file_name()
    {
        let entry =
            entry.with_context(|| format!("failed to read corpus directory: {}", dir.display()))?;
        if !entry.file_type().is_file() {
            continue;
        }
        if include.is_match(entry.file_name()) {
            out.push(entry.into_path());
        }
    }
    Ok(out)
}

pub fn validate(dir: &Path, policy: &BudgetPolicy) -> Result<BudgetReport> {
    validate_with_progress(dir, policy, |_| {})
}

pub fn validate_with_progress(
    dir: &Path,
    policy: &BudgetPolicy,
    mut on_document: impl FnMut(&DocumentEstimate),
) -> Result<BudgetReport> {
    if !dir.is_dir() {
        return Err(crate::exit::input_failed(format!(
            "corpus directory not found: {}",
            dir.display()
        )));
    }
    let include = build_include_set(&policy.include).map_err(crate::exit::invalid_args_err)?;
    let paths = collect_documents(dir, &include).map_err(crate::exit::input_failed_err)?;

    let mut report = BudgetReport::new(dir);
    for path in paths {
        let text = std::fs::read_to_string(&path)
            .with_context(|| format!("failed to read document: {}", path.display()))
            .map_err(crate::exit::input_failed_err)?;
        let name = path
            .file_name()
            .map(|n| n.to_string_lossy().to_string())
            .unwrap_or_else(|| path.display().to_string());
        let estimate = estimate_document(&name, &text, policy);
        on_document(&estimate);
        report.record(estimate);
    }
    Ok(report)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn pages_round_up_and_empty_is_zero() {
        let policy = BudgetPolicy::default();
        assert_eq!(policy.estimate_pages(0), 0);
        assert_eq!(policy.estimate_pages(1), 1);
        assert_eq!(policy.estimate_pages(3000), 1);
        assert_eq!(policy.estimate_pages(3001), 2);
        assert_eq!(policy.estimate_pages(20_000), 7);
    }

    #[test]
    fn extended_marker_raises_limit() {
        let policy = BudgetPolicy::default();
        assert_eq!(policy.limit_for("mock_H_long.json"), 6);
        assert_eq!(policy.limit_for("mock_A.json"), 4);
    }

    #[test]
    fn report_collects_every_violation() {
        let policy = BudgetPolicy::default();
        let mut report = BudgetReport::default();
        report.record(estimate_document("a.json", &"x".repeat(20_000), &policy));
        report.record(estimate_document("b.json", "short", &policy));
        report.record(estimate_document("mock_H.json", &"x".repeat(20_000), &policy));

        assert!(!report.passed());
        assert_eq!(report.documents.len(), 3);
        assert_eq!(
            report.violations,
            vec![
                Violation {
                    document: "a.json".to_string(),
                    estimated_pages: 7,
                    limit: 4,
                },
                Violation {
                    document: "mock_H.json".to_string(),
                    estimated_pages: 7,
                    limit: 6,
                },
            ]
        );
    }

    #[test]
    fn page_count_uses_characters_not_bytes() {
        let policy = BudgetPolicy::default();
        let est = estimate_document("x.json", &"é".repeat(3000), &policy);
        assert_eq!(est.char_count, 3000);
        assert_eq!(est.estimated_pages, 1);
    }
}
