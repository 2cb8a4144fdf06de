//! CLI definition, config resolution, and tracing setup.

use std::io::IsTerminal;
use std::path::PathBuf;
use std::time::Duration;

use clap::Parser;
use color_eyre::eyre::{Result, WrapErr, eyre};
use corpuslint_core::pipeline::{ProgressReporter, SilentProgress, Stage, run_lint};
use corpuslint_core::report::LintReport;
use corpuslint_shared::{LintConfig, ReportFormat, resolve_config};
use indicatif::{ProgressBar, ProgressStyle};
use tracing::info;

// ---------------------------------------------------------------------------
// CLI structure
// ---------------------------------------------------------------------------

/// Lint a course corpus for broken links and inconsistent metadata.
#[derive(Parser, Debug)]
#[command(
    name = "lint-corpus",
    version,
    about = "Check a course corpus for broken links, bad front-matter, and README count drift.",
    long_about = None,
)]
pub(crate) struct Cli {
    /// Corpus root directory (one subdirectory per course).
    pub root: PathBuf,

    /// Report format. Defaults to the configured format (text).
    #[arg(long)]
    pub format: Option<OutputFormat>,

    /// Write the report to a file instead of stdout.
    #[arg(short, long)]
    pub output: Option<PathBuf>,

    /// Explicit config file (skips the corpus and user config files).
    #[arg(short, long)]
    pub config: Option<PathBuf>,

    /// Number of files read concurrently.
    #[arg(short, long)]
    pub jobs: Option<usize>,

    /// Treat warnings as failures.
    #[arg(long)]
    pub deny_warnings: bool,

    /// Print the resolved configuration as TOML and exit.
    #[arg(long)]
    pub print_config: bool,

    /// Hide the progress spinner.
    #[arg(short, long)]
    pub quiet: bool,

    /// Log format: text (default) or json.
    #[arg(long, default_value = "text")]
    pub log_format: LogFormat,

    /// Verbosity level (-v, -vv, -vvv).
    #[arg(short, long, action = clap::ArgAction::Count)]
    pub verbose: u8,
}

/// Log output format.
#[derive(Clone, Debug, clap::ValueEnum)]
pub(crate) enum LogFormat {
    Text,
    Json,
}

/// Report output format.
#[derive(Clone, Copy, Debug, PartialEq, Eq, clap::ValueEnum)]
pub(crate) enum OutputFormat {
    Text,
    Json,
}

impl From<OutputFormat> for ReportFormat {
    fn from(f: OutputFormat) -> Self {
        match f {
            OutputFormat::Text => ReportFormat::Text,
            OutputFormat::Json => ReportFormat::Json,
        }
    }
}

// ---------------------------------------------------------------------------
// Tracing setup
// ---------------------------------------------------------------------------

/// Initialize tracing based on CLI flags. Logs go to stderr.
pub(crate) fn init_tracing(cli: &Cli) {
    use tracing_subscriber::{EnvFilter, fmt};

    let filter = match cli.verbose {
        0 => "corpuslint=info,lint_corpus=info",
        1 => "corpuslint=debug,lint_corpus=debug",
        _ => "corpuslint=trace,lint_corpus=trace",
    };

    let env_filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(filter));

    match cli.log_format {
        LogFormat::Text => {
            fmt()
                .with_env_filter(env_filter)
                .with_writer(std::io::stderr)
                .with_target(false)
                .init();
        }
        LogFormat::Json => {
            fmt()
                .json()
                .with_env_filter(env_filter)
                .with_writer(std::io::stderr)
                .init();
        }
    }
}

// ---------------------------------------------------------------------------
// Run
// ---------------------------------------------------------------------------

/// Apply command-line overrides on top of the file config.
pub(crate) fn effective_config(cli: &Cli, mut config: LintConfig) -> Result<LintConfig> {
    if let Some(jobs) = cli.jobs {
        config.loader.concurrency = jobs;
    }
    if let Some(format) = cli.format {
        config.report.format = format.into();
    }
    if cli.deny_warnings {
        config.report.deny_warnings = true;
    }
    config.validate()?;
    Ok(config)
}

/// Run the linter. Returns the process exit code.
pub(crate) async fn run(cli: Cli) -> Result<i32> {
    let file_config = resolve_config(cli.config.as_deref(), &cli.root)?;
    let config = effective_config(&cli, file_config)?;

    if cli.print_config {
        print!("{}", toml::to_string_pretty(&config)?);
        return Ok(0);
    }

    info!(root = %cli.root.display(), "linting corpus");

    let report = if cli.quiet || !std::io::stderr().is_terminal() {
        run_lint(&cli.root, &config, &SilentProgress).await?
    } else {
        run_lint(&cli.root, &config, &CliProgress::new()?).await?
    };

    let rendered = report.render(config.report.format)?;
    match &cli.output {
        Some(path) => {
            std::fs::write(path, &rendered)
                .wrap_err_with(|| format!("failed to write report to {}", path.display()))?;
            eprintln!("Report written to {}", path.display());
        }
        None => print!("{rendered}"),
    }

    let code = report.exit_code(config.report.deny_warnings);
    info!(
        errors = report.summary.errors,
        warnings = report.summary.warnings,
        exit_code = code,
        "done"
    );
    Ok(code)
}

// ---------------------------------------------------------------------------
// CLI progress reporter
// ---------------------------------------------------------------------------

/// CLI progress reporter using an indicatif spinner.
struct CliProgress {
    spinner: ProgressBar,
}

impl CliProgress {
    fn new() -> Result<Self> {
        let style = ProgressStyle::with_template("{spinner:.cyan} {msg}")
            .map_err(|e| eyre!("invalid spinner template: {e}"))?
            .tick_strings(&["⠋", "⠙", "⠹", "⠸", "⠼", "⠴", "⠦", "⠧", "⠇", "⠏"]);
        let spinner = ProgressBar::new_spinner();
        spinner.set_style(style);
        spinner.enable_steady_tick(Duration::from_millis(80));
        Ok(Self { spinner })
    }
}

impl ProgressReporter for CliProgress {
    fn phase(&self, stage: Stage) {
        self.spinner.set_message(stage.to_string());
    }

    fn done(&self, _report: &LintReport) {
        self.spinner.finish_and_clear();
    }
}
