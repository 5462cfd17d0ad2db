//! Readtime CLI - Command-line interface for Docs Readtime
//!
//! Commands:
//! - estimate: Estimate reading time for a text or HTML page
//! - progress: Compute progress for an estimate and elapsed time
//! - render: Render overlay markup for a given timer state
//! - track: Run a live reading timer in the terminal
//! - config: Print the effective reading configuration

use clap::{Parser, Subcommand, ValueEnum};
use std::fs;
use std::io::{self, Read, Write};
use std::path::{Path, PathBuf};
use std::process::ExitCode;
use std::time::Duration;

use tokio::task::LocalSet;
use tracing_subscriber::EnvFilter;

use docs_readtime::content::DEFAULT_REGION;
use docs_readtime::overlay::{minutes_label, OverlayStatus};
use docs_readtime::types::{ProgressView, SessionId, SessionSnapshot};
use docs_readtime::{
    format_clock, ContentSource, Estimate, EstimateInput, EstimateOrigin, Estimator,
    HtmlDocument, IntervalTicker, OverlayModel, OverlayVariant, ProgressCalculator,
    ReadingConfig, ReadingError, ReadingSession, SessionCoordinator, SessionUpdate,
    StaticText, TimerState, PRODUCER_NAME, READTIME_VERSION,
};

/// Readtime - Reading-time estimation and timer engine
#[derive(Parser)]
#[command(name = "readtime")]
#[command(author = "Second Brain Docs")]
#[command(version = READTIME_VERSION)]
#[command(about = "Estimate and track reading time for documentation pages", long_about = None)]
struct Cli {
    /// Load reading configuration from a JSON file
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    /// Override the reading rate (words per minute)
    #[arg(long, global = true)]
    wpm: Option<u32>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Estimate reading time for a text or HTML page
    Estimate {
        #[command(flatten)]
        source: SourceArgs,

        /// Output as JSON
        #[arg(long)]
        json: bool,
    },

    /// Compute progress for an estimate and elapsed time
    Progress {
        /// Estimated reading time in minutes
        #[arg(long)]
        minutes: u64,

        /// Elapsed time in seconds
        #[arg(long)]
        elapsed: u64,

        /// Output as JSON
        #[arg(long)]
        json: bool,
    },

    /// Render overlay markup for a given timer state
    Render {
        /// Presentation variant
        #[arg(long, value_enum, default_value = "card")]
        variant: VariantArg,

        /// Estimated reading time in minutes
        #[arg(long)]
        minutes: u64,

        /// Elapsed time in seconds
        #[arg(long, default_value = "0")]
        elapsed: u64,

        /// Timer state
        #[arg(long, value_enum, default_value = "idle")]
        state: StateArg,
    },

    /// Run a live reading timer in the terminal
    Track {
        #[command(flatten)]
        source: SourceArgs,

        /// Stop after this many seconds (default: until Ctrl-C)
        #[arg(long)]
        duration: Option<u64>,
    },

    /// Print the effective reading configuration
    Config,
}

#[derive(clap::Args)]
struct SourceArgs {
    /// Input file path (use - for stdin)
    #[arg(short, long)]
    input: Option<PathBuf>,

    /// Treat the input as an HTML page and read only its content region
    #[arg(long)]
    html: bool,

    /// Content region element for HTML input
    #[arg(long, default_value = DEFAULT_REGION)]
    region: String,

    /// Precomputed reading time in minutes (wins over the input text)
    #[arg(long)]
    precomputed: Option<f64>,
}

#[derive(Clone, Copy, ValueEnum)]
enum VariantArg {
    /// Floating card mounted at the page root
    Card,
    /// Sticky bar inside the page layout
    Bar,
}

impl From<VariantArg> for OverlayVariant {
    fn from(arg: VariantArg) -> Self {
        match arg {
            VariantArg::Card => OverlayVariant::FloatingCard,
            VariantArg::Bar => OverlayVariant::StickyBar,
        }
    }
}

#[derive(Clone, Copy, ValueEnum)]
enum StateArg {
    Idle,
    Running,
    Stopped,
}

impl From<StateArg> for TimerState {
    fn from(arg: StateArg) -> Self {
        match arg {
            StateArg::Idle => TimerState::Idle,
            StateArg::Running => TimerState::Running,
            StateArg::Stopped => TimerState::Stopped,
        }
    }
}

fn main() -> ExitCode {
    init_logging();
    let cli = Cli::parse();

    match run(cli) {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            eprintln!(
                "{}",
                serde_json::to_string(&CliError::from(e))
                    .unwrap_or_else(|_| "Unknown error".to_string())
            );
            ExitCode::FAILURE
        }
    }
}

fn init_logging() {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn"));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(io::stderr)
        .init();
}

fn run(cli: Cli) -> Result<(), ReadtimeCliError> {
    let config = load_config(cli.config.as_deref(), cli.wpm)?;

    match cli.command {
        Commands::Estimate { source, json } => cmd_estimate(&config, &source, json),
        Commands::Progress {
            minutes,
            elapsed,
            json,
        } => cmd_progress(minutes, elapsed, json),
        Commands::Render {
            variant,
            minutes,
            elapsed,
            state,
        } => cmd_render(variant.into(), minutes, elapsed, state.into()),
        Commands::Track { source, duration } => cmd_track(&config, &source, duration),
        Commands::Config => cmd_config(&config),
    }
}

fn load_config(path: Option<&Path>, wpm: Option<u32>) -> Result<ReadingConfig, ReadtimeCliError> {
    let mut config = match path {
        Some(path) => ReadingConfig::from_json(&fs::read_to_string(path)?)?,
        None => ReadingConfig::default(),
    };

    if let Some(wpm) = wpm {
        config.words_per_minute = wpm;
        config.validate()?;
    }

    Ok(config)
}

fn read_input(path: &Path) -> io::Result<String> {
    if path.to_string_lossy() == "-" {
        let mut buffer = String::new();
        io::stdin().read_to_string(&mut buffer)?;
        Ok(buffer)
    } else {
        fs::read_to_string(path)
    }
}

fn load_content(source: &SourceArgs) -> Result<Option<Box<dyn ContentSource>>, ReadtimeCliError> {
    if source.input.is_none() && source.precomputed.is_none() {
        return Err(ReadtimeCliError::NoInput);
    }

    let Some(path) = &source.input else {
        return Ok(None);
    };

    let text = read_input(path)?;
    let content: Box<dyn ContentSource> = if source.html {
        Box::new(HtmlDocument::with_region(text, source.region.as_str()))
    } else {
        Box::new(StaticText::new(text))
    };
    Ok(Some(content))
}

fn estimate_input<'a>(
    source: &SourceArgs,
    content: Option<&'a dyn ContentSource>,
) -> EstimateInput<'a> {
    EstimateInput {
        precomputed: source.precomputed,
        content,
    }
}

fn cmd_estimate(
    config: &ReadingConfig,
    source: &SourceArgs,
    json: bool,
) -> Result<(), ReadtimeCliError> {
    let content = load_content(source)?;
    let input = estimate_input(source, content.as_deref());
    let estimator = Estimator::with_words_per_minute(config.words_per_minute);
    let estimate = estimator.estimate(&input);

    if json {
        let report = EstimateReport {
            words_per_minute: estimator.words_per_minute(),
            estimate,
        };
        println!("{}", serde_json::to_string_pretty(&report)?);
        return Ok(());
    }

    match estimate.origin {
        EstimateOrigin::Precomputed => {
            println!("{} (precomputed)", minutes_label(estimate.minutes));
        }
        EstimateOrigin::Text { metrics } => {
            println!(
                "{} ({} words at {} wpm)",
                minutes_label(estimate.minutes),
                metrics.word_count,
                estimator.words_per_minute()
            );
        }
        EstimateOrigin::Absent => {
            println!("No content region found; no overlay would be shown");
        }
    }

    Ok(())
}

fn progress_line(view: &ProgressView) -> String {
    match view.overage_percent {
        Some(percent) => OverlayStatus::DetailedRead { percent }.label(),
        None => OverlayStatus::Remaining {
            minutes: view.remaining_minutes.unwrap_or(0),
        }
        .label(),
    }
}

fn cmd_progress(minutes: u64, elapsed: u64, json: bool) -> Result<(), ReadtimeCliError> {
    let view = ProgressCalculator::compute(minutes, elapsed);

    if json {
        println!("{}", serde_json::to_string_pretty(&view)?);
    } else {
        println!(
            "{} elapsed, {:.1}% ({})",
            format_clock(elapsed),
            view.percent,
            progress_line(&view)
        );
    }

    Ok(())
}

fn cmd_render(
    variant: OverlayVariant,
    minutes: u64,
    elapsed: u64,
    state: TimerState,
) -> Result<(), ReadtimeCliError> {
    let session = ReadingSession {
        id: SessionId::new(),
        estimated_minutes: minutes,
        elapsed_seconds: elapsed,
        state,
    };
    let progress = ProgressCalculator::compute(minutes, elapsed);

    let model = OverlayModel::new(&session, &progress).ok_or(ReadtimeCliError::NoEstimate)?;
    println!("{}", variant.renderer().render(&model));
    Ok(())
}

fn status_line(update: &SessionUpdate) -> String {
    format!(
        "[{}] {}  {:>5.1}%  {}",
        update.session.state,
        format_clock(update.session.elapsed_seconds),
        update.progress.percent,
        progress_line(&update.progress)
    )
}

fn cmd_track(
    config: &ReadingConfig,
    source: &SourceArgs,
    duration: Option<u64>,
) -> Result<(), ReadtimeCliError> {
    let content = load_content(source)?;
    let input = estimate_input(source, content.as_deref());

    let session = SessionCoordinator::open(config, &input, Box::new(IntervalTicker::new()))
        .ok_or(ReadtimeCliError::NoEstimate)?;

    let interactive = atty::is(atty::Stream::Stdout);
    session.subscribe(move |update| {
        let line = status_line(update);
        let mut stdout = io::stdout();
        let written = if interactive {
            write!(stdout, "\r{}\x1b[K", line).and_then(|_| stdout.flush())
        } else {
            writeln!(stdout, "{}", line)
        };
        if let Err(e) = written {
            tracing::warn!(error = %e, "failed to write status line");
        }
    });

    let runtime = tokio::runtime::Builder::new_current_thread()
        .enable_all()
        .build()?;
    let local = LocalSet::new();

    local.block_on(&runtime, async {
        println!(
            "Tracking {} (expected {})",
            session.id(),
            minutes_label(session.estimated_minutes())
        );
        session.start();

        tokio::select! {
            _ = stop_after(duration) => {}
            result = tokio::signal::ctrl_c() => result?,
        }

        session.stop();
        Ok::<(), ReadtimeCliError>(())
    })?;

    if interactive {
        println!();
    }
    let summary = TrackSummary {
        producer: PRODUCER_NAME,
        snapshot: session.snapshot(),
    };
    println!("{}", serde_json::to_string_pretty(&summary)?);

    session.dispose();
    Ok(())
}

async fn stop_after(duration: Option<u64>) {
    match duration {
        Some(seconds) => tokio::time::sleep(Duration::from_secs(seconds)).await,
        None => std::future::pending::<()>().await,
    }
}

fn cmd_config(config: &ReadingConfig) -> Result<(), ReadtimeCliError> {
    println!("{}", config.to_json()?);
    Ok(())
}

// Report types

#[derive(serde::Serialize)]
struct EstimateReport {
    words_per_minute: u32,
    #[serde(flatten)]
    estimate: Estimate,
}

#[derive(serde::Serialize)]
struct TrackSummary {
    producer: &'static str,
    #[serde(flatten)]
    snapshot: SessionSnapshot,
}

// Error types

#[derive(Debug)]
enum ReadtimeCliError {
    Io(io::Error),
    Config(ReadingError),
    Json(serde_json::Error),
    NoInput,
    NoEstimate,
}

impl From<io::Error> for ReadtimeCliError {
    fn from(e: io::Error) -> Self {
        ReadtimeCliError::Io(e)
    }
}

impl From<ReadingError> for ReadtimeCliError {
    fn from(e: ReadingError) -> Self {
        ReadtimeCliError::Config(e)
    }
}

impl From<serde_json::Error> for ReadtimeCliError {
    fn from(e: serde_json::Error) -> Self {
        ReadtimeCliError::Json(e)
    }
}

#[derive(serde::Serialize)]
struct CliError {
    code: String,
    message: String,
    hint: Option<String>,
}

impl From<ReadtimeCliError> for CliError {
    fn from(e: ReadtimeCliError) -> Self {
        match e {
            ReadtimeCliError::Io(e) => CliError {
                code: "IO_ERROR".to_string(),
                message: e.to_string(),
                hint: Some("Check file paths and permissions".to_string()),
            },
            ReadtimeCliError::Config(e) => CliError {
                code: "CONFIG_ERROR".to_string(),
                message: e.to_string(),
                hint: Some("Run 'readtime config' to see a valid configuration".to_string()),
            },
            ReadtimeCliError::Json(e) => CliError {
                code: "JSON_ERROR".to_string(),
                message: e.to_string(),
                hint: None,
            },
            ReadtimeCliError::NoInput => CliError {
                code: "NO_INPUT".to_string(),
                message: "No input text or precomputed estimate given".to_string(),
                hint: Some(
                    "Pass --input <file> (or - for stdin) or --precomputed <minutes>".to_string(),
                ),
            },
            ReadtimeCliError::NoEstimate => CliError {
                code: "NO_ESTIMATE".to_string(),
                message: "Reading-time estimate is zero; no overlay is shown".to_string(),
                hint: Some("Check that the input has a content region with text".to_string()),
            },
        }
    }
}
