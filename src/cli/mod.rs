use std::io;
use std::io::IsTerminal;
use std::path::{Path, PathBuf};
use std::time::Duration;

use anyhow::{Context, Result};
use clap::{Args, CommandFactory, Parser, Subcommand};
use serde::Serialize;

use crate::config::EffectiveConfig;
use crate::convert::ConversionOutcome;
use crate::core::DiagnosticPayload;
use crate::generate::{InputRecord, PayloadGenerator};
use crate::ui::UiConfig;

#[derive(Debug, Parser)]
#[command(
    name = "diagreport",
    version,
    about = "Generate diagnostic payloads, render them as fixed-format reports, and gate report length"
)]
pub struct Cli {
    #[arg(long, global = true)]
    pub json: bool,
    #[arg(long, global = true)]
    pub verbose: bool,
    #[arg(long, global = true)]
    pub quiet: bool,
    #[arg(long, global = true)]
    pub config: Option<PathBuf>,
    /// Seconds allowed for the external document converter.
    #[arg(long, default_value_t = 60, global = true)]
    pub timeout: u64,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Debug, Subcommand)]
pub enum Commands {
    /// Build a synthetic payload from an input record (file or stdin).
    Generate(GenerateArgs),
    /// Render a payload document to Markdown, then optionally to PDF.
    Render(RenderArgs),
    /// Check every payload document in the corpus against its page budget.
    Validate(ValidateArgs),
    Completion(CompletionArgs),
    Config(ConfigArgs),
}

#[derive(Debug, Args)]
pub struct GenerateArgs {
    pub input: Option<PathBuf>,
}

#[derive(Debug, Args)]
pub struct RenderArgs {
    pub input: PathBuf,
    pub output_base: Option<String>,
}

#[derive(Debug, Args)]
pub struct ValidateArgs {
    #[arg(long)]
    pub dir: Option<PathBuf>,
}

#[derive(Debug, Args)]
pub struct CompletionArgs {
    pub shell: String,
}

#[derive(Debug, Args)]
pub struct ConfigArgs {
    #[arg(long)]
    pub show: bool,
}

#[derive(Debug, Serialize)]
struct RenderSummary<'a> {
    output: String,
    char_count: usize,
    estimated_pages: f64,
    over_hard_cap: bool,
    conversion: &'a ConversionOutcome,
}

pub fn run() -> Result<()> {
    let cli = Cli::parse();

    let env_config_path = std::env::var_os("DIAGREPORT_CONFIG").map(PathBuf::from);
    let cfg = crate::config::load(cli.config.as_deref().or(env_config_path.as_deref()))
        .map_err(crate::exit::invalid_args_err)?;

    let ui_cfg = UiConfig {
        stderr_is_tty: io::stderr().is_terminal(),
        quiet: cli.quiet,
        verbose: cli.verbose,
    };

    match cli.command {
        Commands::Generate(args) => {
            let text = match &args.input {
                Some(path) => read_input_file(path)?,
                None => io::read_to_string(io::stdin())
                    .context("failed to read input from stdin")
                    .map_err(crate::exit::input_failed_err)?,
            };
            let input: InputRecord = parse_json(&text, args.input.as_deref())?;
            let payload = PayloadGenerator::default().generate(&input);
            write_json(&payload)?;
        }
        Commands::Render(args) => {
            render_command(&args, &cfg, &ui_cfg, cli.json, Duration::from_secs(cli.timeout))?;
        }
        Commands::Validate(args) => {
            let dir = args
                .dir
                .unwrap_or_else(|| PathBuf::from(&cfg.budget.corpus_dir));
            let policy = cfg.budget_policy();

            let pb = crate::ui::budget_progress(&ui_cfg);
            let report = crate::budget::validate_with_progress(&dir, &policy, |estimate| {
                if let Some(pb) = &pb {
                    pb.set_message(estimate.document.clone());
                    pb.inc(1);
                }
            });
            if let Some(pb) = pb {
                pb.finish_and_clear();
            }
            let report = report?;

            if cli.json {
                write_json(&report)?;
            } else {
                crate::ui::print_budget_table(&report, &ui_cfg);
            }
            crate::ui::eprintln_violations(&report.violations);

            if !report.passed() {
                return Err(crate::exit::budget_exceeded(format!(
                    "{} of {} document(s) exceed their page budget",
                    report.violations.len(),
                    report.documents.len()
                )));
            }
        }
        Commands::Completion(args) => {
            let shell = parse_shell(&args.shell)?;
            let mut cmd = Cli::command();
            let mut out = io::stdout().lock();
            clap_complete::generate(shell, &mut cmd, "diagreport", &mut out);
        }
        Commands::Config(args) => {
            if args.show {
                if cli.json {
                    write_json(&cfg)?;
                } else {
                    println!("{}", toml::to_string_pretty(&cfg)?);
                }
            } else if !ui_cfg.quiet {
                eprintln!("config: use `diagreport config --show`");
            }
        }
    }

    Ok(())
}

fn render_command(
    args: &RenderArgs,
    cfg: &EffectiveConfig,
    ui_cfg: &UiConfig,
    json: bool,
    timeout: Duration,
) -> Result<()> {
    let started_at = time::OffsetDateTime::now_utc();

    let base = match &args.output_base {
        Some(base) => base.trim().to_string(),
        None => args
            .input
            .file_stem()
            .map(|s| s.to_string_lossy().to_string())
            .unwrap_or_default(),
    };
    if base.is_empty() {
        return Err(crate::exit::invalid_args(
            "render: output base name must not be empty",
        ));
    }

    let text = read_input_file(&args.input)?;
    let payload: DiagnosticPayload = parse_json(&text, Some(&args.input))?;

    let document = crate::render::render(&payload);
    let markdown = document.to_markdown();

    let out_dir = PathBuf::from(&cfg.output.dir);
    std::fs::create_dir_all(&out_dir)
        .with_context(|| format!("failed to create output directory: {}", out_dir.display()))?;
    let md_path = out_dir.join(format!("{base}.md"));
    std::fs::write(&md_path, &markdown)
        .with_context(|| format!("failed to write report: {}", md_path.display()))?;

    let char_count = document.char_count();
    let estimated_pages = document.estimated_pages(cfg.render.chars_per_page);
    let over_hard_cap = estimated_pages > f64::from(cfg.render.page_hard_cap);
    if !json {
        crate::ui::print_render_summary(
            &md_path,
            char_count,
            estimated_pages,
            cfg.render.page_hard_cap,
            ui_cfg,
        );
    }

    let converter = crate::convert::select_converter(&cfg.convert, timeout);
    let pdf_path = out_dir.join(format!("{base}.pdf"));
    let (outcome, attempt) = converter.convert(&md_path, &pdf_path);

    if json {
        write_json(&RenderSummary {
            output: md_path.display().to_string(),
            char_count,
            estimated_pages,
            over_hard_cap,
            conversion: &outcome,
        })?;
    } else {
        let converter_stderr = attempt
            .as_ref()
            .and_then(|a| a.output.as_ref())
            .map(|o| o.stderr.as_str());
        crate::ui::print_conversion_outcome(&outcome, converter_stderr, ui_cfg);
    }

    let finished_at = time::OffsetDateTime::now_utc();
    let run = crate::logs::RenderRun {
        started_at,
        finished_at,
        input: &args.input,
        output: &md_path,
        char_count,
        estimated_pages,
        over_hard_cap,
        converter: converter.name(),
        conversion: &outcome,
        attempt: attempt.as_ref(),
    };
    match crate::logs::write_render_log(&out_dir, &run) {
        Ok(log_path) => crate::ui::print_log_hint(&log_path, ui_cfg),
        Err(err) => crate::ui::eprintln_warning(&format!("{err:#}")),
    }

    Ok(())
}

fn read_input_file(path: &Path) -> Result<String> {
    if !path.exists() {
        return Err(crate::exit::input_failed(format!(
            "input file not found: {}",
            path.display()
        )));
    }
    std::fs::read_to_string(path)
        .with_context(|| format!("failed to read input file: {}", path.display()))
        .map_err(crate::exit::input_failed_err)
}

fn parse_json<T: serde::de::DeserializeOwned>(text: &str, source: Option<&Path>) -> Result<T> {
    let source = source
        .map(|p| p.display().to_string())
        .unwrap_or_else(|| "<stdin>".to_string());
    serde_json::from_str(text)
        .with_context(|| format!("malformed input payload: {source}"))
        .map_err(crate::exit::input_failed_err)
}

fn write_json<T: Serialize + ?Sized>(value: &T) -> Result<()> {
    use std::io::Write;

    let buf = serde_json::to_vec_pretty(value)?;

    let mut stdout = io::stdout().lock();
    match stdout.write_all(&buf) {
        Ok(()) => {}
        Err(err) if err.kind() == io::ErrorKind::BrokenPipe => return Ok(()),
        Err(err) => return Err(err.into()),
    }
    match stdout.write_all(b"\n") {
        Ok(()) => Ok(()),
        Err(err) if err.kind() == io::ErrorKind::BrokenPipe => Ok(()),
        Err(err) => Err(err.into()),
    }
}

fn parse_shell(s: &str) -> Result<clap_complete::Shell> {
    let s = s.trim().to_ascii_lowercase();
    match s.as_str() {
        "bash" => Ok(clap_complete::Shell::Bash),
        "zsh" => Ok(clap_complete::Shell::Zsh),
        "fish" => Ok(clap_complete::Shell::Fish),
        other => Err(crate::exit::invalid_args(format!(
            "unsupported shell: {other} (expected bash|zsh|fish)"
        ))),
    }
}
