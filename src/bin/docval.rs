//! CLI binary for docval.
//!
//! A thin shim over the library crate that maps CLI flags to
//! `ValidatorConfig`, drives a progress bar, and prints the reconciled report.

use anyhow::{Context, Result};
use clap::Parser;
use docval::{
    ClassifiedError, FailureNotifier, ImageChecks, PageRecord, ProgressSink, ValidationOutcome,
    ValidationReport, Validator, ValidatorConfig,
};
use indicatif::{ProgressBar, ProgressStyle};
use std::io;
use std::path::PathBuf;
use std::process::ExitCode;
use std::sync::Arc;
use std::time::Duration;
use tracing_subscriber::EnvFilter;

// ── ANSI colour helpers (no extra deps) ──────────────────────────────────────

fn green(s: &str) -> String {
    format!("\x1b[32m{s}\x1b[0m")
}
fn red(s: &str) -> String {
    format!("\x1b[31m{s}\x1b[0m")
}
fn dim(s: &str) -> String {
    format!("\x1b[2m{s}\x1b[0m")
}
fn bold(s: &str) -> String {
    format!("\x1b[1m{s}\x1b[0m")
}
fn cyan(s: &str) -> String {
    format!("\x1b[36m{s}\x1b[0m")
}

// ── Progress bar driven by the synthetic ramp ────────────────────────────────

/// Renders the submission ramp as a percentage bar.
struct CliProgress {
    bar: ProgressBar,
}

impl CliProgress {
    fn new() -> Arc<Self> {
        let bar = ProgressBar::new(100);
        let style = ProgressStyle::with_template(
            "{spinner:.cyan} {prefix:.bold}  [{bar:42.green/238}] {pos:>3}%  ⏱ {elapsed_precise}",
        )
        .unwrap_or_else(|_| ProgressStyle::default_bar())
        .progress_chars("█▉▊▋▌▍▎▏  ")
        .tick_strings(&["⠋", "⠙", "⠹", "⠸", "⠼", "⠴", "⠦", "⠧", "⠇", "⠏", "⠿"]);
        bar.set_style(style);
        bar.set_prefix("Validating");
        Arc::new(Self { bar })
    }
}

impl ProgressSink for CliProgress {
    fn on_submission_start(&self) {
        self.bar.enable_steady_tick(Duration::from_millis(80));
    }

    fn on_progress(&self, percent: u8) {
        self.bar.set_position(u64::from(percent));
    }

    fn on_submission_complete(&self, _success: bool) {
        self.bar.finish_and_clear();
    }
}

/// Prints the failure once, in red, on stderr.
struct CliNotifier;

impl FailureNotifier for CliNotifier {
    fn notify(&self, e: &ClassifiedError) {
        eprintln!("{} {}  {}", red("✘"), red(&e.message()), dim(e.kind()));
    }
}

const AFTER_HELP: &str = r#"EXAMPLES:
  # Validate a policy for one insured person
  docval policy.pdf --person "Ana Pérez"

  # Check validity against a reference date
  docval policy.pdf --person "Ana Pérez" --date 2024-03-07

  # Point at another service instance
  docval policy.pdf --person "Ana Pérez" --url https://validator.internal:9002

  # Machine-readable output
  docval --json policy.pdf --person "Ana Pérez" > report.json

ENVIRONMENT VARIABLES:
  VALIDATOR_API_URL     Validation service base URL (default http://localhost:9002)
  DOCVAL_PERSON         Insured person's name
  DOCVAL_DATE           Reference date (YYYY-MM-DD)
  DOCVAL_TIMEOUT        Request timeout in seconds
  DOCVAL_MAX_SIZE_MIB   Local upload ceiling in MiB
  RUST_LOG              Overrides the log filter

EXIT STATUS:
  0  the service returned a report (whatever its verdict)
  1  the attempt failed: bad input, network, timeout, rejection, malformed body
"#;

/// Validate scanned insurance PDFs against a remote validation service.
#[derive(Parser, Debug)]
#[command(
    name = "docval",
    version,
    about = "Validate scanned insurance PDFs against a remote validation service",
    long_about = "Upload a PDF policy document together with the insured person's name \
and an optional reference date. The service checks logos, signatures, the policy's validity \
window and the person named on it; docval prints one line per page and the final verdict.",
    arg_required_else_help = true,
    color = clap::ColorChoice::Auto,
    after_long_help = AFTER_HELP
)]
struct Cli {
    /// Local PDF file.
    file: PathBuf,

    /// Insured person's name, as expected on the document.
    #[arg(short, long, env = "DOCVAL_PERSON")]
    person: String,

    /// Reference date for the validity check (YYYY-MM-DD).
    #[arg(short, long, env = "DOCVAL_DATE")]
    date: Option<String>,

    /// Validation service base URL.
    #[arg(long, env = "VALIDATOR_API_URL")]
    url: Option<String>,

    /// Whole-request timeout in seconds.
    #[arg(long, env = "DOCVAL_TIMEOUT", default_value_t = 120)]
    timeout: u64,

    /// Largest accepted upload in MiB.
    #[arg(long, env = "DOCVAL_MAX_SIZE_MIB", default_value_t = 10)]
    max_size_mib: u64,

    /// Output the outcome as JSON instead of a summary.
    #[arg(long, env = "DOCVAL_JSON")]
    json: bool,

    /// Disable progress bar.
    #[arg(long, env = "DOCVAL_NO_PROGRESS")]
    no_progress: bool,

    /// Enable DEBUG-level tracing logs.
    #[arg(short, long, env = "DOCVAL_VERBOSE")]
    verbose: bool,

    /// Suppress all output except errors.
    #[arg(short, long, env = "DOCVAL_QUIET")]
    quiet: bool,
}

#[tokio::main]
async fn main() -> Result<ExitCode> {
    let cli = Cli::parse();

    // ── Logging setup ────────────────────────────────────────────────────
    // The bar and the notifier cover what matters; library INFO lines would
    // only tear the bar.
    let show_progress = !cli.quiet && !cli.no_progress && !cli.json;
    let filter = if cli.verbose {
        "debug"
    } else if cli.quiet || show_progress || cli.json {
        "error"
    } else {
        "info"
    };

    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(filter)),
        )
        .with_writer(io::stderr)
        .init();

    // ── Build validator ──────────────────────────────────────────────────
    let config = build_config(&cli)?;
    let mut validator = Validator::new(config).context("Failed to create validation client")?;
    if !cli.json {
        validator = validator.with_notifier(Arc::new(CliNotifier));
    }
    if show_progress {
        validator = validator.with_progress(CliProgress::new());
    }

    if !cli.quiet && !cli.json {
        eprintln!(
            "{} {}",
            cyan("◆"),
            bold(&format!(
                "Validating {} for {}",
                cli.file.display(),
                cli.person.trim()
            ))
        );
    }

    // ── Run validation ───────────────────────────────────────────────────
    let outcome = validator
        .validate_path(&cli.file, &cli.person, cli.date.as_deref())
        .await;

    if cli.json {
        let json = serde_json::to_string_pretty(&outcome).context("Failed to serialise outcome")?;
        println!("{json}");
    } else if let ValidationOutcome::Success(ref report) = outcome {
        print_report(report, cli.quiet);
    }

    Ok(if outcome.is_success() {
        ExitCode::SUCCESS
    } else {
        ExitCode::FAILURE
    })
}

/// Map CLI args to `ValidatorConfig`. Unset `--url` keeps the env/default.
fn build_config(cli: &Cli) -> Result<ValidatorConfig> {
    let mut builder = ValidatorConfig::builder_from_env()
        .timeout_secs(cli.timeout)
        .max_file_size_mib(cli.max_size_mib);
    if let Some(ref url) = cli.url {
        builder = builder.base_url(url.clone());
    }
    builder.build().context("Invalid configuration")
}

fn print_report(report: &ValidationReport, quiet: bool) {
    if !quiet {
        for page in &report.pages {
            println!("{}", page_line(page, report.total_pages));
        }
        println!();
    }

    let v = &report.final_verdict;
    let mark = if v.verdict { green("✔") } else { red("✘") };
    let label = if v.verdict {
        green("APPROVED")
    } else {
        red("REJECTED")
    };
    println!("{mark} {}", bold(&label));
    if !v.reason.is_empty() {
        println!("   {}", v.reason);
    }
    if !quiet {
        println!(
            "   logo {}  validity {}  signature {}  person {}",
            flag(v.logo_passed),
            flag(v.validity_passed),
            flag(v.signature_passed),
            flag(v.person_passed),
        );
        if let Some(n) = report.total_signatures {
            println!("   {} signature(s) found in the document", n);
        }
    }
}

fn page_line(page: &PageRecord, total: usize) -> String {
    if page.is_empty() {
        return format!(
            "  {} Page {:>3}/{:<3}  {}",
            dim("·"),
            page.page_number,
            total,
            dim("no findings")
        );
    }

    let verdict = page.observation.as_ref().and_then(|o| o.verdict);
    let mark = match verdict {
        Some(true) => green("✓"),
        Some(false) => red("✗"),
        None => dim("?"),
    };

    let mut parts = Vec::new();
    if let Some(ref info) = page.document_info {
        if let Some(ref company) = info.company {
            parts.push(company.clone());
        }
        if let Some(ref number) = info.policy_number {
            parts.push(format!("policy {number}"));
        }
        if let Some(ref validity) = info.validity {
            parts.push(format!("valid {validity}"));
        }
    }
    if let Some(ref checks) = page.image_checks {
        parts.push(image_summary(checks));
    }

    let reason = page
        .observation
        .as_ref()
        .and_then(|o| o.reason.as_deref())
        .unwrap_or_default();

    format!(
        "  {} Page {:>3}/{:<3}  {}  {}",
        mark,
        page.page_number,
        total,
        parts.join("  "),
        dim(reason)
    )
}

fn image_summary(checks: &ImageChecks) -> String {
    let logo = match checks.logo_detected {
        Some(true) => match checks.logo_label {
            Some(ref label) => format!("logo {label}"),
            None => "logo ✓".to_string(),
        },
        Some(false) => "logo ✗".to_string(),
        None => "logo ?".to_string(),
    };
    let signature = match (checks.signature_detected, checks.signatures_found) {
        (_, Some(n)) => format!("{n} signature(s)"),
        (Some(true), None) => "signature ✓".to_string(),
        (Some(false), None) => "signature ✗".to_string(),
        (None, None) => "signature ?".to_string(),
    };
    format!("{logo}  {signature}")
}

fn flag(value: Option<bool>) -> String {
    match value {
        Some(true) => green("✓"),
        Some(false) => red("✗"),
        None => dim("–"),
    }
}
