use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};

use crate::budget::{BudgetPolicy, DEFAULT_CORPUS_DIR};

pub const DEFAULT_CONFIG_FILE: &str = "diagreport.toml";

#[derive(Debug, Clone, Serialize)]
pub struct EffectiveConfig {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub config_path: Option<String>,
    pub output: OutputConfig,
    pub render: RenderConfig,
    pub budget: BudgetConfig,
    pub convert: ConvertConfig,
}

#[derive(Debug, Clone, Serialize)]
pub struct OutputConfig {
    pub dir: String,
}

#[derive(Debug, Clone, Serialize)]
pub struct RenderConfig {
    pub page_hard_cap: u32,
    pub chars_per_page: usize,
}

#[derive(Debug, Clone, Serialize)]
pub struct BudgetConfig {
    pub corpus_dir: String,
    pub default_limit: u32,
    pub extended_limit: u32,
    pub extended_marker: String,
    pub include: Vec<String>,
}

#[derive(Debug, Clone, Serialize)]
pub struct ConvertConfig {
    pub enabled: bool,
    pub program: String,
}

impl Default for EffectiveConfig {
    fn default() -> Self {
        let policy = BudgetPolicy::default();
        Self {
            output: OutputConfig {
                dir: "docs/out".to_string(),
            },
            render: RenderConfig {
                page_hard_cap: 6,
                chars_per_page: policy.chars_per_page,
            },
            budget: BudgetConfig {
                corpus_dir: DEFAULT_CORPUS_DIR.to_string(),
                default_limit: policy.default_limit,
                extended_limit: policy.extended_limit,
                extended_marker: policy.extended_marker,
                include: policy.include,
            },
            convert: ConvertConfig {
                enabled: true,
                program: "pandoc".to_string(),
            },
            config_path: None,
        }
    }
}

impl EffectiveConfig {
    pub fn budget_policy(&self) -> BudgetPolicy {
        BudgetPolicy {
            chars_per_page: self.render.chars_per_page,
            default_limit: self.budget.default_limit,
            extended_limit: self.budget.extended_limit,
            extended_marker: self.budget.extended_marker.clone(),
            include: self.budget.include.clone(),
        }
    }
}

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
struct RawConfig {
    output: Option<RawOutputConfig>,
    render: Option<RawRenderConfig>,
    budget: Option<RawBudgetConfig>,
    convert: Option<RawConvertConfig>,
}

#[derive(Debug, Deserialize)]
struct RawOutputConfig {
    dir: Option<String>,
}

#[derive(Debug, Deserialize)]
struct RawRenderConfig {
    page_hard_cap: Option<u32>,
    chars_per_page: Option<usize>,
}

#[derive(Debug, Deserialize)]
struct RawBudgetConfig {
    corpus_dir: Option<String>,
    default_limit: Option<u32>,
    extended_limit: Option<u32>,
    extended_marker: Option<String>,
    include: Option<Vec<String>>,
}

#[derive(Debug, Deserialize)]
struct RawConvertConfig {
    enabled: Option<bool>,
    program: Option<String>,
}

pub fn load(config_path: Option<&Path>) -> Result<EffectiveConfig> {
    let mut cfg = EffectiveConfig::default();

    let (path, required) = match config_path {
        Some(p) => (p.to_path_buf(), true),
        None => (PathBuf::from(DEFAULT_CONFIG_FILE), false),
    };

    if path.exists() {
        let s = std::fs::read_to_string(&path)
            .with_context(|| format!("failed to read config file: {}", path.display()))?;
        let raw: RawConfig = toml::from_str(&s)
            .with_context(|| format!("failed to parse config file (TOML): {}", path.display()))?;
        apply_raw_config(&mut cfg, raw);
        cfg.config_path = Some(path.display().to_string());
    } else if required {
        return Err(anyhow::anyhow!(
            "config file not found: {}",
            path.display()
        ));
    }

    apply_env_overrides(&mut cfg)?;
    validate(&cfg)?;

    Ok(cfg)
}

fn apply_raw_config(cfg: &mut EffectiveConfig, raw: RawConfig) {
    if let Some(output) = raw.output {
        if let Some(dir) = output.dir {
            cfg.output.dir = dir;
        }
    }

    if let Some(render) = raw.render {
        if let Some(page_hard_cap) = render.page_hard_cap {
            cfg.render.page_hard_cap = page_hard_cap;
        }
        if let Some(chars_per_page) = render.chars_per_page {
            cfg.render.chars_per_page = chars_per_page;
        }
    }

    if let Some(budget) = raw.budget {
        if let Some(corpus_dir) = budget.corpus_dir {
            cfg.budget.corpus_dir = corpus_dir;
        }
        if let Some(default_limit) = budget.default_limit {
            cfg.budget.default_limit = default_limit;
        }
        if let Some(extended_limit) = budget.extended_limit {
            cfg.budget.extended_limit = extended_limit;
        }
        if let Some(extended_marker) = budget.extended_marker {
            cfg.budget.extended_marker = extended_marker;
        }
        if let Some(include) = budget.include {
            cfg.budget.include = include;
        }
    }

    if let Some(convert) = raw.convert {
        if let Some(enabled) = convert.enabled {
            cfg.convert.enabled = enabled;
        }
        if let Some(program) = convert.program {
            cfg.convert.program = program;
        }
    }
}

fn apply_env_overrides(cfg: &mut EffectiveConfig) -> Result<()> {
    if let Ok(v) = std::env::var("DIAGREPORT_OUTPUT_DIR") {
        let v = v.trim();
        if !v.is_empty() {
            cfg.output.dir = v.to_string();
        }
    }
    if let Ok(v) = std::env::var("DIAGREPORT_CORPUS_DIR") {
        let v = v.trim();
        if !v.is_empty() {
            cfg.budget.corpus_dir = v.to_string();
        }
    }
    if let Ok(v) = std::env::var("DIAGREPORT_PAGE_HARD_CAP") {
        cfg.render.page_hard_cap = v
            .trim()
            .parse::<u32>()
            .with_context(|| "DIAGREPORT_PAGE_HARD_CAP")?;
    }
    if let Ok(v) = std::env::var("DIAGREPORT_CONVERT_ENABLED") {
        cfg.convert.enabled = parse_bool(&v).with_context(|| "DIAGREPORT_CONVERT_ENABLED")?;
    }
    if let Ok(v) = std::env::var("DIAGREPORT_CONVERT_PROGRAM") {
        let v = v.trim();
        if !v.is_empty() {
            cfg.convert.program = v.to_string();
        }
    }

    Ok(())
}

fn validate(cfg: &EffectiveConfig) -> Result<()> {
    if cfg.render.chars_per_page == 0 {
        return Err(anyhow::anyhow!("render.chars_per_page must be greater than 0"));
    }
    if cfg.budget.include.is_empty() {
        return Err(anyhow::anyhow!("budget.include must list at least one pattern"));
    }
    Ok(())
}

fn parse_bool(s: &str) -> Result<bool> {
    let s = s.trim().to_ascii_lowercase();
    match s.as_str() {
        "1" | "true" | "yes" | "on" => Ok(true),
        "0" | "false" | "no" | "off" => Ok(false),
        _ => Err(anyhow::anyhow!(
            "invalid boolean: {s} (expected true|false|1|0|yes|no|on|off)"
        )),
    }
}
