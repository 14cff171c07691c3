//! CLI binary for invoice-extract.
//!
//! `extract` runs a batch from the terminal and writes the CSV; `serve`
//! exposes the same pipeline over HTTP. Both are thin shims that map flags
//! to `ExtractionConfig`.

use anyhow::{Context, Result};
use clap::{Args, Parser, Subcommand};
use indicatif::{ProgressBar, ProgressStyle};
use invoice_extract::config::{
    DEFAULT_CSV_NAME, DEFAULT_DOWNLOAD_TIMEOUT_SECS, DEFAULT_MODEL, DEFAULT_PROVIDER,
};
use invoice_extract::{
    extract_files, render_table, to_json, write_csv, BatchProgressCallback, DocumentError,
    ExtractionConfig, ProgressCallback,
};
use std::io;
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;
use tracing_subscriber::EnvFilter;

// ── ANSI colour helpers ──────────────────────────────────────────────────────

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

// ── CLI progress callback ────────────────────────────────────────────────────

/// Terminal reporter: a progress bar (when enabled) plus an error panel with
/// the raw model output for every document that fails.
struct CliProgressCallback {
    bar: Option<ProgressBar>,
}

impl CliProgressCallback {
    fn new(show_bar: bool) -> Arc<Self> {
        let bar = show_bar.then(|| {
            let style = ProgressStyle::with_template(
                "{spinner:.cyan} {prefix:.bold}  \
                 [{bar:30.green/238}] {pos}/{len} files  {msg}",
            )
            .unwrap_or_else(|_| ProgressStyle::default_bar())
            .progress_chars("█▉▊▋▌▍▎▏  ");
            let bar = ProgressBar::new(0);
            bar.set_style(style);
            bar.set_prefix("Extracting");
            bar.enable_steady_tick(Duration::from_millis(80));
            bar
        });
        Arc::new(Self { bar })
    }

    /// Print a line above the bar, or straight to stderr without one.
    fn emit(&self, line: String) {
        match self.bar {
            Some(ref bar) => bar.println(line),
            None => eprintln!("{line}"),
        }
    }
}

impl BatchProgressCallback for CliProgressCallback {
    fn on_batch_start(&self, total_documents: usize) {
        if let Some(ref bar) = self.bar {
            bar.set_length(total_documents as u64);
        }
        self.emit(format!(
            "{} {}",
            cyan("◆"),
            bold(&format!("Processing {total_documents} files…"))
        ));
    }

    fn on_document_start(&self, _index: usize, _total: usize, name: &str) {
        if let Some(ref bar) = self.bar {
            bar.set_message(name.to_string());
        }
    }

    fn on_document_complete(&self, index: usize, total: usize, name: &str, missing_fields: usize) {
        let note = if missing_fields == 0 {
            String::new()
        } else {
            dim(&format!("{missing_fields} fields missing"))
        };
        self.emit(format!(
            "  {} {:>2}/{:<2}  {}  {}",
            green("✓"),
            index,
            total,
            name,
            note
        ));
        if let Some(ref bar) = self.bar {
            bar.inc(1);
        }
    }

    fn on_document_error(&self, index: usize, total: usize, error: &DocumentError) {
        let mut panel = format!(
            "  {} {:>2}/{:<2}  {}\n    {} {}",
            red("✗"),
            index,
            total,
            error.document_name(),
            red("│"),
            red(&error.to_string()),
        );
        if let Some(raw) = error.raw_response() {
            panel.push_str(&format!("\n    {} {}", red("│"), dim("LLM response:")));
            for line in raw.lines() {
                panel.push_str(&format!("\n    {} {}", red("│"), line));
            }
        }
        self.emit(panel);
        if let Some(ref bar) = self.bar {
            bar.inc(1);
        }
    }

    fn on_batch_complete(&self, total_documents: usize, success_count: usize) {
        if let Some(ref bar) = self.bar {
            bar.finish_and_clear();
        }
        let failed = total_documents.saturating_sub(success_count);
        let mark = if failed == 0 {
            green("✔")
        } else if success_count == 0 {
            red("✘")
        } else {
            cyan("⚠")
        };
        eprintln!(
            "{} {}/{} files extracted",
            mark,
            bold(&success_count.to_string()),
            total_documents
        );
    }
}

const AFTER_HELP: &str = r#"EXAMPLES:
  # Extract up to 10 invoices, print the table, write extracted_data.csv
  invoice-extract extract inv-001.pdf inv-002.pdf

  # Rows as JSON on stdout, CSV to a custom path
  invoice-extract extract --json -o out/march.csv scans/*.pdf

  # From a URL
  invoice-extract extract https://example.com/invoices/2513.pdf

  # Start the HTTP API on port 8000
  invoice-extract serve --bind 0.0.0.0:8000

ENVIRONMENT VARIABLES:
  OPENAI_API_KEY              Required. Also read from a .env file.
  INVOICE_EXTRACT_MODEL       Override model ID (default gpt-4)
  INVOICE_EXTRACT_PROVIDER    Override provider (default openai)
  RUST_LOG                    Log filter, e.g. invoice_extract=debug
"#;

/// Extract invoice fields from PDFs into a fixed-column table.
#[derive(Parser, Debug)]
#[command(
    name = "invoice-extract",
    version,
    about = "Extract invoice fields from PDFs into a fixed-column table using an LLM",
    arg_required_else_help = true,
    color = clap::ColorChoice::Auto,
    after_long_help = AFTER_HELP
)]
struct Cli {
    #[command(subcommand)]
    command: Command,

    /// Enable DEBUG-level tracing logs.
    #[arg(short, long, global = true, env = "INVOICE_EXTRACT_VERBOSE")]
    verbose: bool,

    /// Suppress all output except errors.
    #[arg(short, long, global = true, env = "INVOICE_EXTRACT_QUIET")]
    quiet: bool,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Extract fields from 1 to 10 PDF files or URLs.
    Extract(ExtractArgs),

    /// Serve the extraction API over HTTP.
    #[cfg(feature = "server")]
    Serve(ServeArgs),
}

#[derive(Args, Debug)]
struct ExtractArgs {
    /// Local PDF paths or HTTP/HTTPS URLs (at most 10).
    #[arg(required = true, num_args = 1..)]
    inputs: Vec<String>,

    /// Where to write the CSV table.
    #[arg(short, long, env = "INVOICE_EXTRACT_OUTPUT", default_value = DEFAULT_CSV_NAME)]
    output: PathBuf,

    /// Print rows as JSON instead of a table.
    #[arg(long, env = "INVOICE_EXTRACT_JSON")]
    json: bool,

    /// Disable the progress bar.
    #[arg(long, env = "INVOICE_EXTRACT_NO_PROGRESS")]
    no_progress: bool,

    /// HTTP download timeout in seconds.
    #[arg(
        long,
        env = "INVOICE_EXTRACT_DOWNLOAD_TIMEOUT",
        default_value_t = DEFAULT_DOWNLOAD_TIMEOUT_SECS
    )]
    download_timeout: u64,

    #[command(flatten)]
    llm: ModelArgs,
}

#[cfg(feature = "server")]
#[derive(Args, Debug)]
struct ServeArgs {
    /// Address to listen on.
    #[arg(long, env = "INVOICE_EXTRACT_BIND", default_value = "0.0.0.0:8000")]
    bind: std::net::SocketAddr,

    #[command(flatten)]
    llm: ModelArgs,
}

#[derive(Args, Debug)]
struct ModelArgs {
    /// LLM model ID.
    #[arg(long, env = "INVOICE_EXTRACT_MODEL", default_value = DEFAULT_MODEL)]
    model: String,

    /// LLM provider (openai, anthropic, gemini, ollama, ...).
    #[arg(long, env = "INVOICE_EXTRACT_PROVIDER", default_value = DEFAULT_PROVIDER)]
    provider: String,

    /// Sampling temperature (0.0–2.0). Provider default when unset.
    #[arg(long, env = "INVOICE_EXTRACT_TEMPERATURE")]
    temperature: Option<f32>,

    /// Max output tokens per document. Provider default when unset.
    #[arg(long, env = "INVOICE_EXTRACT_MAX_TOKENS")]
    max_tokens: Option<usize>,

    /// Path to a text file containing a custom system prompt.
    #[arg(long, env = "INVOICE_EXTRACT_SYSTEM_PROMPT")]
    system_prompt: Option<PathBuf>,
}

#[tokio::main]
async fn main() -> Result<()> {
    dotenvy::dotenv().ok();
    let cli = Cli::parse();

    // ── Logging setup ────────────────────────────────────────────────────
    // The progress bar replaces INFO-level library logs in extract mode.
    let show_progress = match cli.command {
        Command::Extract(ref args) => !cli.quiet && !args.no_progress && !args.json,
        #[cfg(feature = "server")]
        Command::Serve(_) => false,
    };
    let filter = if cli.verbose {
        "debug"
    } else if cli.quiet || show_progress {
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

    match cli.command {
        Command::Extract(args) => run_extract(args, cli.quiet, show_progress).await,
        #[cfg(feature = "server")]
        Command::Serve(args) => run_serve(args).await,
    }
}

async fn run_extract(args: ExtractArgs, quiet: bool, show_progress: bool) -> Result<()> {
    let progress: Option<ProgressCallback> = if quiet {
        None
    } else {
        Some(CliProgressCallback::new(show_progress) as Arc<dyn BatchProgressCallback>)
    };

    let config = build_config(&args.llm, args.download_timeout, progress).await?;

    let output = extract_files(&args.inputs, &config)
        .await
        .context("Extraction failed")?;

    if args.json {
        println!("{}", to_json(&output.rows).context("Failed to serialise rows")?);
    } else {
        print!("{}", render_table(&output.rows));
    }

    write_csv(&args.output, &output.rows)
        .await
        .context("Failed to write CSV")?;

    if !quiet {
        eprintln!(
            "{}  {} rows  {}ms  →  {}",
            green("✔"),
            output.rows.len(),
            output.stats.total_duration_ms,
            bold(&args.output.display().to_string()),
        );
        eprintln!(
            "   {} tokens in  /  {} tokens out",
            dim(&output.stats.total_prompt_tokens.to_string()),
            dim(&output.stats.total_completion_tokens.to_string()),
        );
    }

    Ok(())
}

#[cfg(feature = "server")]
async fn run_serve(args: ServeArgs) -> Result<()> {
    use invoice_extract::server::{serve, AppState};
    use invoice_extract::LlmCompletionClient;

    let config = build_config(&args.llm, DEFAULT_DOWNLOAD_TIMEOUT_SECS, None).await?;
    // Fails here, before the listener is bound, when the API key is missing.
    let client = LlmCompletionClient::from_config(&config)
        .context("Failed to set up the completion client")?;

    serve(args.bind, AppState::new(client, config))
        .await
        .context("Server stopped")
}

/// Map CLI args to `ExtractionConfig`.
async fn build_config(
    args: &ModelArgs,
    download_timeout: u64,
    progress: Option<ProgressCallback>,
) -> Result<ExtractionConfig> {
    let mut builder = ExtractionConfig::builder()
        .model(&args.model)
        .provider_name(&args.provider)
        .download_timeout_secs(download_timeout);

    if let Some(t) = args.temperature {
        builder = builder.temperature(t);
    }
    if let Some(n) = args.max_tokens {
        builder = builder.max_tokens(n);
    }
    if let Some(ref path) = args.system_prompt {
        let prompt = tokio::fs::read_to_string(path)
            .await
            .with_context(|| format!("Failed to read system prompt from {:?}", path))?;
        builder = builder.system_prompt(prompt);
    }
    if let Some(cb) = progress {
        builder = builder.progress_callback(cb);
    }

    builder.build().context("Invalid configuration")
}
