//! atscheck - ATS resume score checker
//!
//! A CLI tool that uploads a resume to a remote analysis service,
//! shows cosmetic progress while the service works, and renders the
//! scored report as Markdown or JSON.
//!
//! Exit codes:
//!   0 - Success (report rendered, or health check passed)
//!   1 - Runtime error (config, unreadable or rejected file, etc.)
//!   2 - The analysis itself failed
//!   130 - Interrupted while waiting for the service

mod analysis;
mod cli;
mod client;
mod config;
mod error;
mod models;
mod progress;
mod report;
mod upload;

use analysis::{AnalysisOrchestrator, AnalysisPhase};
use anyhow::{Context, Result};
use cli::{Args, OutputFormat};
use client::{AnalysisService, HttpAnalysisService};
use config::{Config, UploadConfig, CONFIG_FILE_NAME};
use error::ValidationError;
use indicatif::{ProgressBar, ProgressStyle};
use models::UploadCandidate;
use progress::{step_statuses, ProgressSimulator, ProgressTick, StepStatus, ANALYSIS_STEPS};
use report::ReportMetadata;
use std::io::{BufRead, IsTerminal, Write};
use std::path::PathBuf;
use std::time::{Duration, Instant};
use tokio::sync::watch;
use tokio::task::JoinHandle;
use tracing::{debug, error, info, warn};
use tracing_subscriber::FmtSubscriber;
use upload::{candidate_from_path, InputValidator};

#[tokio::main]
async fn main() -> Result<()> {
    // Parse command-line arguments
    let args = Args::parse_args();

    // Validate arguments
    if let Err(e) = args.validate() {
        eprintln!("Error: {}", e);
        std::process::exit(1);
    }

    // Handle --init-config early (no logging needed)
    if args.init_config {
        return handle_init_config();
    }

    // Initialize logging
    init_logging(&args);

    info!("atscheck v{}", env!("CARGO_PKG_VERSION"));
    debug!("Arguments: {:?}", args);

    match run(args).await {
        Ok(exit_code) => {
            std::process::exit(exit_code);
        }
        Err(e) => {
            error!("atscheck failed: {}", e);
            eprintln!("\n❌ Error: {:#}", e);
            std::process::exit(1);
        }
    }
}

/// Handle --init-config: generate a default .atscheck.toml.
fn handle_init_config() -> Result<()> {
    let path = std::path::Path::new(CONFIG_FILE_NAME);

    if path.exists() {
        eprintln!(
            "⚠️  {} already exists. Remove it first or edit it manually.",
            CONFIG_FILE_NAME
        );
        std::process::exit(1);
    }

    let content = Config::default_toml();
    std::fs::write(path, &content)
        .with_context(|| format!("Failed to write {}", CONFIG_FILE_NAME))?;

    println!("✅ Created {} with default settings.", CONFIG_FILE_NAME);
    println!("   Edit it to point at your analysis service and adjust limits.");
    Ok(())
}

/// Initialize logging based on verbosity settings.
fn init_logging(args: &Args) {
    let level = args.log_level();

    let subscriber = FmtSubscriber::builder()
        .with_max_level(level)
        .with_writer(std::io::stderr)
        .with_target(false)
        .with_thread_ids(false)
        .with_file(false)
        .with_line_number(false)
        .compact()
        .finish();

    if let Err(e) = tracing::subscriber::set_global_default(subscriber) {
        eprintln!("Failed to set tracing subscriber: {}", e);
    }
}

/// Run the complete workflow. Returns the process exit code.
async fn run(args: Args) -> Result<i32> {
    let mut config = load_config(&args)?;
    config.merge_with_args(&args);

    let service = HttpAnalysisService::new(config.service.clone())?;

    if args.health {
        return handle_health(&service).await;
    }

    // Step 1: Select and validate the file
    let mut orchestrator = AnalysisOrchestrator::new(
        service,
        InputValidator::from(&config.upload),
        ProgressSimulator::from_config(&config.progress),
    );

    if let Err(e) = select_files(&mut orchestrator, &args.files, &config.upload) {
        eprintln!("❌ {}", e);
        return Ok(1);
    }

    let candidate = match orchestrator.candidate() {
        Some(candidate) => candidate.clone(),
        None => return Ok(1),
    };

    // Step 2: Submit and wait
    if !args.quiet {
        println!("📄 {} ({})", candidate.name, candidate.display_size());
        println!(
            "🔍 Analyzing against ATS standards via {}",
            config.service.base_url
        );
        println!(
            "   ⏳ This may take a while. Timeout: {}s\n",
            config.service.timeout_ms / 1000
        );
    }

    let start_time = loop {
        let started = Instant::now();
        let spinner = (!args.quiet).then(|| spawn_spinner(orchestrator.progress().subscribe()));

        let interrupted = tokio::select! {
            _ = orchestrator.analyze() => false,
            _ = tokio::signal::ctrl_c() => true,
        };

        if let Some((bar, handle)) = spinner {
            handle.abort();
            bar.finish_and_clear();
        }

        if interrupted {
            orchestrator.cancel();
            orchestrator.clear_selection();
            eprintln!("⛔ Analysis interrupted.");
            return Ok(130);
        }

        match orchestrator.phase() {
            AnalysisPhase::Success => break started,
            AnalysisPhase::Failed => {
                let message = orchestrator.error().unwrap_or("Analysis failed.");
                eprintln!("⚠️  {}", message);

                if !confirm_retry(&args) {
                    return Ok(2);
                }

                orchestrator.reset();
                if let Err(e) = select_files(&mut orchestrator, &args.files, &config.upload) {
                    eprintln!("❌ {}", e);
                    return Ok(1);
                }
            }
            other => {
                warn!("Analysis ended in unexpected phase {}", other);
                return Ok(1);
            }
        }
    };

    // Step 3: Render the report
    apply_expansion(&mut orchestrator, &args, config.report.expand_all);
    let Some(view) = orchestrator.view() else {
        return Ok(1);
    };

    let metadata = ReportMetadata::new(&candidate, start_time.elapsed().as_secs_f64());
    let output = match OutputFormat::from_name(&config.report.format) {
        OutputFormat::Json => report::generate_json_report(&view, &metadata)?,
        OutputFormat::Markdown => report::generate_markdown_report(&view, &metadata),
    };

    write_output(&args, &output)?;
    Ok(0)
}

/// Handle --health: query the service and print its status.
async fn handle_health(service: &HttpAnalysisService) -> Result<i32> {
    match service.health().await {
        Ok(health) => {
            println!(
                "✅ {} is {} (version {})",
                service.config().base_url,
                health.status,
                health.version
            );
            Ok(0)
        }
        Err(e) => {
            eprintln!("❌ Health check failed: {}", e);
            Ok(1)
        }
    }
}

/// Turn the positional paths into upload candidates.
///
/// The count is checked before any path is read, so a second file is
/// reported as such even when it does not exist.
fn collect_candidates(
    files: &[PathBuf],
    config: &UploadConfig,
) -> std::result::Result<Vec<UploadCandidate>, ValidationError> {
    match files.len() {
        0 => Err(ValidationError::NoFile),
        1 => files
            .iter()
            .map(|path| candidate_from_path(path, config))
            .collect(),
        n => Err(ValidationError::MultipleFiles(n)),
    }
}

/// Resolve the paths and hand them to the orchestrator.
fn select_files<S: AnalysisService>(
    orchestrator: &mut AnalysisOrchestrator<S>,
    files: &[PathBuf],
    config: &UploadConfig,
) -> std::result::Result<(), ValidationError> {
    let candidates = collect_candidates(files, config)?;
    orchestrator.select_file(candidates)
}

/// Ask whether to resubmit after a failure. Only asked on a terminal.
fn confirm_retry(args: &Args) -> bool {
    if args.quiet || !std::io::stdin().is_terminal() {
        return false;
    }

    eprint!("🔁 Retry the analysis? [y/N] ");
    let _ = std::io::stderr().flush();

    let mut answer = String::new();
    match std::io::stdin().lock().read_line(&mut answer) {
        Ok(_) => is_yes(&answer),
        Err(e) => {
            debug!("Could not read answer: {}", e);
            false
        }
    }
}

fn is_yes(answer: &str) -> bool {
    matches!(answer.trim().to_lowercase().as_str(), "y" | "yes")
}

/// Expand the categories requested on the command line.
fn apply_expansion<S: AnalysisService>(
    orchestrator: &mut AnalysisOrchestrator<S>,
    args: &Args,
    expand_all: bool,
) {
    let keys: Vec<String> = orchestrator
        .report()
        .and_then(|r| r.category_scores.as_ref())
        .map(|scores| scores.keys().cloned().collect())
        .unwrap_or_default();

    let requested = if expand_all { keys.clone() } else { args.expand_keys() };

    for key in requested {
        if !keys.contains(&key) {
            warn!("No category named '{}' in this report", key);
            continue;
        }
        if !orchestrator.expand_state().is_expanded(&key) {
            orchestrator.toggle_category(&key);
        }
    }
}

/// Show the simulated step on a spinner until aborted.
fn spawn_spinner(mut rx: watch::Receiver<ProgressTick>) -> (ProgressBar, JoinHandle<()>) {
    let bar = ProgressBar::new_spinner();
    bar.set_style(
        ProgressStyle::default_spinner()
            .template("{spinner:.green} [{elapsed_precise}] {msg}")
            .unwrap_or_else(|_| ProgressStyle::default_spinner()),
    );
    bar.enable_steady_tick(Duration::from_millis(120));
    bar.set_message(step_message(rx.borrow().step));

    let ticker = bar.clone();
    let handle = tokio::spawn(async move {
        while rx.changed().await.is_ok() {
            let step = rx.borrow_and_update().step;
            ticker.set_message(step_message(step));
        }
    });

    (bar, handle)
}

fn step_message(step: usize) -> String {
    step_statuses(step)
        .into_iter()
        .enumerate()
        .find(|(_, (_, status))| *status == StepStatus::Active)
        .map(|(i, (label, status))| {
            format!(
                "{} {} ({}/{})",
                status.glyph(),
                label,
                i + 1,
                ANALYSIS_STEPS.len()
            )
        })
        .unwrap_or_default()
}

/// Write the rendered report to --output or stdout.
fn write_output(args: &Args, output: &str) -> Result<()> {
    match args.output {
        Some(ref path) => {
            std::fs::write(path, output)
                .with_context(|| format!("Failed to write report to {}", path.display()))?;
            if !args.quiet {
                println!("✅ Report saved to: {}", path.display());
            }
        }
        None => println!("{}", output),
    }
    Ok(())
}

/// Load configuration from file or use defaults.
fn load_config(args: &Args) -> Result<Config> {
    // Try explicit config path
    if let Some(ref config_path) = args.config {
        info!("Loading config from: {}", config_path.display());
        return Config::load(config_path);
    }

    // Try default location
    match Config::load_default() {
        Ok(Some(config)) => {
            info!("Loaded default config from {}", CONFIG_FILE_NAME);
            Ok(config)
        }
        Ok(None) => {
            debug!("No config file found, using defaults");
            Ok(Config::default())
        }
        Err(e) => {
            warn!("Failed to load config: {}", e);
            Ok(Config::default())
        }
    }
}
