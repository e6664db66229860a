//! CLI binary for aidlens.
//!
//! A thin shim over the library crate that maps CLI flags to `Settings` and
//! `UserInput`, runs one analysis and prints the answer.

use aidlens::{
    AidLensError, AnalysisProgressCallback, Analyzer, AudioClip, ImageUpload, OutputLanguage,
    ProgressCallback, Role, Settings, Stage, UserInput,
};
use anyhow::{Context, Result};
use clap::Parser;
use indicatif::{ProgressBar, ProgressStyle};
use std::io::{self, Write};
use std::path::{Path, PathBuf};
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

const TICKS: &[&str] = &["⠋", "⠙", "⠹", "⠸", "⠼", "⠴", "⠦", "⠧", "⠇", "⠏", "⠿"];

// ── CLI progress callback using indicatif ────────────────────────────────────

/// One spinner line per stage; each finished stage leaves a ✓/✗ log line.
struct CliProgressCallback {
    bar: ProgressBar,
}

impl CliProgressCallback {
    fn new() -> Arc<Self> {
        let bar = ProgressBar::new_spinner();
        bar.set_style(
            ProgressStyle::with_template("{spinner:.cyan} {prefix:.bold}  {msg}")
                .unwrap_or_else(|_| ProgressStyle::default_spinner())
                .tick_strings(TICKS),
        );
        bar.set_prefix("AidLens");
        bar.set_message("preparing…");
        bar.enable_steady_tick(Duration::from_millis(80));
        Arc::new(Self { bar })
    }

    fn finish(&self) {
        self.bar.finish_and_clear();
    }
}

impl AnalysisProgressCallback for CliProgressCallback {
    fn on_stage_start(&self, stage: Stage) {
        self.bar.set_message(format!("{stage}…"));
    }

    fn on_stage_complete(&self, stage: Stage, elapsed_ms: u64) {
        self.bar.println(format!(
            "  {} {:<24} {}",
            green("✓"),
            stage.to_string(),
            dim(&format!("{:.1}s", elapsed_ms as f64 / 1000.0)),
        ));
    }

    fn on_stage_error(&self, stage: Stage, error: &str) {
        // Truncate very long error messages to keep output tidy.
        let msg = if error.chars().count() > 80 {
            format!("{}\u{2026}", error.chars().take(79).collect::<String>())
        } else {
            error.to_string()
        };
        self.bar
            .println(format!("  {} {:<24} {}", red("✗"), stage.to_string(), red(&msg)));
    }
}

const AFTER_HELP: &str = r#"EXAMPLES:
  # Ask a question in plain text
  aidlens --text "The camp needs a list of children under 5. Where do I start?"

  # Explain a photographed notice, in Hindi, for a volunteer
  aidlens --image notice.jpg --role volunteer --language hindi

  # Summarise a government circular (first 8 pages, 12,000 chars)
  aidlens --pdf circular.pdf --text "What changes for ration card holders?"

  # Voice note recorded on a phone (Hindi / Hinglish is fine)
  aidlens --audio note.m4a

  # Show the exact prompt that was sent, then the answer as JSON
  aidlens --text "..." --print-prompt --json

INPUTS:
  At least one of --text / --text-file / --image / --pdf / --audio / --mic
  is required. When both --mic and --audio are given, only --mic is
  transcribed. Images: PNG or JPEG. Audio: WAV, MP3, M4A or OGG.

ENVIRONMENT VARIABLES:
  GEMINI_API_KEY      Google Gemini API key (required for the default backend)
  GEMINI_MODEL        Model ID (default: gemini-2.5-flash; "models/" prefix optional)
  AIDLENS_PROVIDER    Use an edgequake provider instead (openai, anthropic, ollama, …)
  AIDLENS_ROLE        Default role (ngo-worker, volunteer, student)
  AIDLENS_LANGUAGE    Default answer language (english, hindi)
  PDFIUM_LIB_PATH     Path to an existing libpdfium; skips auto-download
  RUST_LOG            Override log filter (e.g. aidlens=debug)

  PDFium (~30 MB) is downloaded on the first PDF and cached; text, image
  and voice requests never need it.
"#;

/// Plain-language guidance from text, images, PDFs and voice notes.
#[derive(Parser, Debug)]
#[command(
    name = "aidlens",
    version,
    about = "Plain-language guidance for NGO workers, volunteers and students",
    long_about = "Combine a question, a photo, a PDF and a voice note into one structured answer: \
summary, key points, next steps, risks, and at most one clarifying question. Uses Google Gemini \
by default, or any edgequake-llm provider.",
    arg_required_else_help = true,
    color = clap::ColorChoice::Auto,
    after_long_help = AFTER_HELP
)]
struct Cli {
    /// Free-text question or notice.
    #[arg(short, long)]
    text: Option<String>,

    /// Read the free text from a file ("-" for stdin).
    #[arg(long, conflicts_with = "text")]
    text_file: Option<PathBuf>,

    /// Image file (PNG or JPEG).
    #[arg(short, long)]
    image: Option<PathBuf>,

    /// PDF document.
    #[arg(short, long)]
    pdf: Option<PathBuf>,

    /// Uploaded voice note (WAV, MP3, M4A, OGG).
    #[arg(short, long)]
    audio: Option<PathBuf>,

    /// Microphone recording; takes priority over --audio.
    #[arg(long)]
    mic: Option<PathBuf>,

    /// Content type of the audio, when the file name has no usable suffix.
    #[arg(long)]
    audio_type: Option<String>,

    /// Who the answer is for: ngo-worker, volunteer, student.
    #[arg(short, long, env = "AIDLENS_ROLE", default_value = "ngo-worker")]
    role: Role,

    /// Answer language: english, hindi.
    #[arg(short, long, env = "AIDLENS_LANGUAGE", default_value = "english")]
    language: OutputLanguage,

    /// Model ID, with or without the "models/" prefix.
    #[arg(short, long, env = "GEMINI_MODEL", default_value = aidlens::config::DEFAULT_MODEL)]
    model: String,

    /// Gemini API key.
    #[arg(long, env = "GEMINI_API_KEY", hide_env_values = true, default_value = "")]
    api_key: String,

    /// Edgequake provider instead of Gemini: openai, anthropic, ollama, azure.
    #[arg(long, env = "AIDLENS_PROVIDER")]
    provider: Option<String>,

    /// Maximum PDF pages to read.
    #[arg(long, default_value_t = 8)]
    max_pages: usize,

    /// Maximum PDF characters to keep.
    #[arg(long, default_value_t = 12_000)]
    max_chars: usize,

    /// Sampling temperature (0.0–2.0). Model default when unset.
    #[arg(long)]
    temperature: Option<f32>,

    /// Per-call model timeout in seconds.
    #[arg(long, env = "AIDLENS_API_TIMEOUT", default_value_t = 60)]
    api_timeout: u64,

    /// Output structured JSON (AnalysisOutput) instead of plain text.
    #[arg(long)]
    json: bool,

    /// Print the system instruction and user message to stderr.
    #[arg(long)]
    print_prompt: bool,

    /// Disable the progress spinner.
    #[arg(long)]
    no_progress: bool,

    /// Enable DEBUG-level tracing logs.
    #[arg(short, long)]
    verbose: bool,

    /// Suppress all output except errors.
    #[arg(short, long)]
    quiet: bool,
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    // ── Logging setup ────────────────────────────────────────────────────
    // The spinner gives all the feedback that matters, so library INFO logs
    // are hidden while it runs.
    let show_progress = !cli.quiet && !cli.no_progress && !cli.json;
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

    let settings = build_settings(&cli)?;
    let input = build_input(&cli).await?;

    // ── Ensure PDFium engine is available (PDF requests only) ───────────
    if input.pdf_document.is_some() && !pdfium_auto::is_pdfium_cached() {
        ensure_pdfium(cli.quiet)?;
    }

    // ── Run analysis ─────────────────────────────────────────────────────
    let progress = if show_progress {
        Some(CliProgressCallback::new())
    } else {
        None
    };

    let mut analyzer = Analyzer::new();
    if let Some(ref cb) = progress {
        analyzer = analyzer.with_progress(Arc::clone(cb) as ProgressCallback);
    }

    let result = analyzer.analyze(&settings, &input).await;
    if let Some(ref cb) = progress {
        cb.finish();
    }
    let output = match result {
        Ok(output) => output,
        Err(e) => return Err(report(e)),
    };

    if cli.print_prompt {
        eprintln!("{}\n{}\n", bold("System instruction:"), output.prompt.system_instruction);
        eprintln!("{}\n{}\n", bold("User message:"), output.prompt.user_message);
    }

    if cli.json {
        let json = serde_json::to_string_pretty(&output).context("Failed to serialise output")?;
        println!("{json}");
    } else {
        let stdout = io::stdout();
        let mut handle = stdout.lock();
        handle
            .write_all(output.text.as_bytes())
            .context("Failed to write to stdout")?;
        if !output.text.ends_with('\n') {
            handle.write_all(b"\n").ok();
        }
    }

    if !cli.quiet && !cli.json {
        eprintln!(
            "{} {}  {}",
            green("✔"),
            bold(&output.stats.model),
            dim(&format!("{}ms total", output.stats.total_duration_ms)),
        );
    }

    Ok(())
}

/// Turn a library error into the CLI's error, adding the category up front.
fn report(e: AidLensError) -> anyhow::Error {
    let kind = e.kind();
    anyhow::Error::new(e).context(format!("Analysis failed ({kind:?})"))
}

/// Map CLI args to `Settings`.
fn build_settings(cli: &Cli) -> Result<Settings> {
    let mut builder = Settings::builder()
        .role(cli.role)
        .language(cli.language)
        .model(cli.model.clone())
        .api_key(cli.api_key.clone())
        .max_pages(cli.max_pages)
        .max_chars(cli.max_chars)
        .api_timeout_secs(cli.api_timeout);

    if let Some(ref provider) = cli.provider {
        builder = builder.provider(provider.clone());
    }
    if let Some(t) = cli.temperature {
        builder = builder.temperature(t);
    }

    builder.build().context("Invalid configuration")
}

/// Read every supplied file and run it through upload acceptance.
async fn build_input(cli: &Cli) -> Result<UserInput> {
    let mut input = UserInput::new();

    if let Some(ref text) = cli.text {
        input = input.with_text(text.clone());
    } else if let Some(ref path) = cli.text_file {
        let text = if path.as_os_str() == "-" {
            tokio::task::spawn_blocking(|| io::read_to_string(io::stdin()))
                .await
                .context("stdin reader panicked")?
                .context("Failed to read text from stdin")?
        } else {
            tokio::fs::read_to_string(path)
                .await
                .with_context(|| format!("Failed to read text from {:?}", path))?
        };
        input = input.with_text(text);
    }

    if let Some(ref path) = cli.image {
        let image = ImageUpload::accept(&display_name(path), read_file(path).await?)?;
        input = input.with_image(image);
    }

    if let Some(ref path) = cli.pdf {
        let bytes = aidlens::input::accept_document(&display_name(path), read_file(path).await?)?;
        input = input.with_pdf(bytes);
    }

    if let Some(ref path) = cli.mic {
        let clip = AudioClip::accept(
            &display_name(path),
            cli.audio_type.as_deref(),
            read_file(path).await?,
        )?;
        input = input.with_microphone(clip);
    }

    if let Some(ref path) = cli.audio {
        let clip = AudioClip::accept(
            &display_name(path),
            cli.audio_type.as_deref(),
            read_file(path).await?,
        )?;
        input = input.with_audio_upload(clip);
    }

    Ok(input)
}

async fn read_file(path: &Path) -> Result<Vec<u8>, AidLensError> {
    tokio::fs::read(path)
        .await
        .map_err(|source| AidLensError::ReadFailed {
            path: path.to_path_buf(),
            source,
        })
}

fn display_name(path: &Path) -> String {
    path.file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_else(|| path.display().to_string())
}

/// First PDF request on this machine: download pdfium with a byte counter.
fn ensure_pdfium(quiet: bool) -> Result<()> {
    if quiet {
        tokio::task::block_in_place(|| pdfium_auto::ensure_pdfium_library(None))
            .context("Failed to download PDFium engine")?;
        return Ok(());
    }

    let dl_bar = ProgressBar::new(0);
    dl_bar.set_style(
        ProgressStyle::with_template(
            "{spinner:.cyan} {prefix:.bold}  \
             [{bar:42.green/238}] {bytes}/{total_bytes}  ETA {eta_precise}",
        )
        .unwrap_or_else(|_| ProgressStyle::default_bar())
        .progress_chars("█▉▊▋▌▍▎▏  ")
        .tick_strings(TICKS),
    );
    dl_bar.set_prefix("PDF engine");
    dl_bar.enable_steady_tick(Duration::from_millis(80));

    let bar = dl_bar.clone();
    tokio::task::block_in_place(|| {
        pdfium_auto::ensure_pdfium_library(Some(&|downloaded, total| {
            if let Some(t) = total {
                if bar.length().unwrap_or(0) != t {
                    bar.set_length(t);
                }
            }
            bar.set_position(downloaded);
        }))
    })
    .context("Failed to download PDFium engine")?;

    dl_bar.finish_with_message("ready ✓");
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn cli_parses_role_and_language() {
        let cli = Cli::try_parse_from([
            "aidlens", "--text", "hi", "--role", "student", "--language", "hi", "--api-key", "k",
        ])
        .unwrap();
        assert_eq!(cli.role, Role::Student);
        assert_eq!(cli.language, OutputLanguage::Hindi);
    }

    #[test]
    fn text_and_text_file_conflict() {
        let res = Cli::try_parse_from(["aidlens", "--text", "a", "--text-file", "b.txt"]);
        assert!(res.is_err());
    }

    #[test]
    fn settings_from_cli() {
        let cli = Cli::try_parse_from([
            "aidlens",
            "--text",
            "hi",
            "--model",
            "models/gemini-2.5-pro",
            "--api-key",
            "k",
            "--max-pages",
            "3",
            "--temperature",
            "0.3",
        ])
        .unwrap();
        let settings = build_settings(&cli).unwrap();
        assert_eq!(settings.model, "models/gemini-2.5-pro");
        assert_eq!(settings.limits.max_pages, 3);
        assert_eq!(settings.temperature, Some(0.3));
    }

    #[test]
    fn zero_caps_rejected() {
        let cli = Cli::try_parse_from(["aidlens", "--text", "hi", "--max-chars", "0"]).unwrap();
        assert!(build_settings(&cli).is_err());
    }

    #[test]
    fn display_name_uses_file_name() {
        assert_eq!(display_name(Path::new("/tmp/notes/voice.m4a")), "voice.m4a");
    }
}
