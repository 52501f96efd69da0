//! dom-audit CLI

use anyhow::{bail, Context, Result};
use clap::Parser;
use colored::Colorize;
use dom_audit::checks;
use dom_audit::output::{JsonFormatter, OutputFormatter, TextFormatter};
use dom_audit::{
    Category, ColorMode, Config, OutputFormat, Page, RuleId, ScanResult, Scanner, Severity,
    WindowSnapshot,
};
use std::io::{self, Read};
use std::path::{Path, PathBuf};
use std::process::ExitCode;
use walkdir::WalkDir;

#[derive(Parser)]
#[command(name = "dom-audit")]
#[command(about = "DOM best practices scanner - checks HTML documents for document, structure, link, form and script defects")]
#[command(version)]
struct Cli {
    /// Files or directories to scan (use - for stdin)
    #[arg(required_unless_present = "list_rules")]
    paths: Vec<String>,

    /// Document URL reported in results (decides mixed-content checks)
    #[arg(long)]
    url: Option<String>,

    /// JSON window snapshot with library globals and image metrics
    #[arg(long, value_name = "FILE")]
    window: Option<PathBuf>,

    /// External script text, as FILE or SRC=FILE (repeatable)
    #[arg(long = "script", value_name = "[SRC=]FILE")]
    scripts: Vec<String>,

    /// Configuration file path
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Output format
    #[arg(short, long)]
    format: Option<OutputFormat>,

    /// Pretty-print JSON output
    #[arg(long)]
    pretty: bool,

    /// Minimum severity to report
    #[arg(long)]
    min_severity: Option<Severity>,

    /// Categories to report (comma-separated)
    #[arg(long, value_delimiter = ',')]
    categories: Option<Vec<Category>>,

    /// Checks or rules to disable (comma-separated)
    #[arg(long, value_delimiter = ',')]
    disable: Vec<String>,

    /// List all rules and exit
    #[arg(long)]
    list_rules: bool,

    /// Show HTML snippets of reported elements
    #[arg(long)]
    show_html: bool,

    /// Disable colored output
    #[arg(long)]
    no_color: bool,

    /// Verbose output
    #[arg(short, long)]
    verbose: bool,
}

fn main() -> ExitCode {
    let cli = Cli::parse();

    let default_filter = if cli.verbose { "debug" } else { "warn" };
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or(default_filter))
        .init();

    if cli.no_color {
        colored::control::set_override(false);
    }

    match run(cli) {
        Ok(has_issues) => {
            if has_issues {
                ExitCode::from(1)
            } else {
                ExitCode::SUCCESS
            }
        }
        Err(e) => {
            eprintln!("{}: {:#}", "Error".red().bold(), e);
            ExitCode::from(2)
        }
    }
}

fn run(cli: Cli) -> Result<bool> {
    if cli.list_rules {
        list_rules();
        return Ok(false);
    }

    let mut config = match &cli.config {
        Some(path) => Config::load(path)
            .with_context(|| format!("failed to load config {}", path.display()))?,
        None => Config::load_default().context("failed to load config")?,
    };
    config.merge_cli(
        cli.format,
        cli.pretty.then_some(true),
        cli.no_color.then_some(ColorMode::Never),
        cli.min_severity,
        cli.categories.clone(),
        (!cli.disable.is_empty()).then(|| cli.disable.clone()),
    );
    config.validate()?;

    match config.output.color {
        ColorMode::Never => colored::control::set_override(false),
        ColorMode::Always => colored::control::set_override(true),
        ColorMode::Auto => {}
    }

    let window = match &cli.window {
        Some(path) => Some(WindowSnapshot::from_file(path)?),
        None => None,
    };
    let scripts = cli
        .scripts
        .iter()
        .map(|arg| read_script(arg))
        .collect::<Result<Vec<_>>>()?;

    let scanner = Scanner::with_config(config.clone());
    let mut results: Vec<ScanResult> = Vec::new();

    for input in collect_inputs(&cli.paths)? {
        let mut page = match &input {
            Input::Stdin => {
                let mut source = Vec::new();
                io::stdin()
                    .read_to_end(&mut source)
                    .context("failed to read stdin")?;
                Page::from_bytes(&source)
            }
            Input::File(path) => {
                if cli.verbose {
                    eprintln!("Scanning file: {}", path.display());
                }
                Page::from_file(path)?
            }
        };

        if let Some(url) = &cli.url {
            page = page.with_url(url.clone());
        }
        if let Some(window) = &window {
            page = page.with_window(window.clone());
        }
        for (src, text) in &scripts {
            page = page.with_external_script(src.clone(), text.clone());
        }

        results.push(scanner.scan(&page));
    }

    let has_issues = results.iter().any(|r| !r.is_empty());

    let formatter: Box<dyn OutputFormatter> = match config.output.format {
        OutputFormat::Text => {
            let mut text = TextFormatter::new();
            text.colored = config.output.color != ColorMode::Never;
            text.show_html = cli.show_html;
            Box::new(text)
        }
        OutputFormat::Json => Box::new(JsonFormatter {
            pretty: config.output.pretty,
        }),
    };
    print!("{}", formatter.format(&results));
    if config.output.format == OutputFormat::Json {
        println!();
    }

    Ok(has_issues)
}

enum Input {
    Stdin,
    File(PathBuf),
}

/// Expand paths into scan inputs; directories yield their `.html`/`.htm` files
fn collect_inputs(paths: &[String]) -> Result<Vec<Input>> {
    let mut inputs = Vec::new();

    for arg in paths {
        if arg == "-" {
            inputs.push(Input::Stdin);
            continue;
        }

        let path = PathBuf::from(arg);
        if path.is_dir() {
            let before = inputs.len();
            for entry in WalkDir::new(&path).sort_by_file_name() {
                let entry = entry.with_context(|| format!("failed to walk {}", path.display()))?;
                if entry.file_type().is_file() && is_html(entry.path()) {
                    inputs.push(Input::File(entry.into_path()));
                }
            }
            if inputs.len() == before {
                log::warn!("No HTML files found in {}", path.display());
            }
        } else if path.exists() {
            inputs.push(Input::File(path));
        } else {
            bail!("no such file or directory: {}", path.display());
        }
    }

    Ok(inputs)
}

fn is_html(path: &Path) -> bool {
    path.extension()
        .and_then(|e| e.to_str())
        .is_some_and(|e| e.eq_ignore_ascii_case("html") || e.eq_ignore_ascii_case("htm"))
}

/// Parse `SRC=FILE` or `FILE` into the script's src and text
fn read_script(arg: &str) -> Result<(String, String)> {
    let (src, file) = match arg.split_once('=') {
        Some((src, file)) => (src.to_string(), PathBuf::from(file)),
        None => {
            let file = PathBuf::from(arg);
            let name = file
                .file_name()
                .map(|n| n.to_string_lossy().into_owned())
                .unwrap_or_else(|| arg.to_string());
            (name, file)
        }
    };
    let text = std::fs::read_to_string(&file)
        .with_context(|| format!("failed to read script {}", file.display()))?;
    Ok((src, text))
}

fn list_rules() {
    let battery = checks::battery();
    let header = format!(
        "{:<26} {:<22} {:<9} {:<12} {}",
        "RULE", "CHECK", "SEVERITY", "CATEGORY", "TITLE"
    );
    println!("{}", header.bold());
    for rule in RuleId::ALL {
        let meta = rule.meta();
        let check = battery
            .iter()
            .find(|c| c.reports(rule))
            .map(|c| c.id)
            .unwrap_or("-");
        println!(
            "{:<26} {:<22} {:<9} {:<12} {}",
            meta.id, check, meta.severity, meta.category, meta.title
        );
    }
}
