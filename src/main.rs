//! ReadScore - readability and AI-visibility scoring engine
//!
//! A CLI tool that scores web pages from prepared check results and
//! extraction views, persists the analysis, and renders reports.
//!
//! Exit codes:
//!   0 - Success (score at/above --fail-under, or no --fail-under set)
//!   1 - Runtime error (validation, config, persistence failure, etc.)
//!   2 - Score below --fail-under threshold
//!   130 - Cancelled before commit

mod benchmark;
mod cache;
mod cli;
mod config;
mod consensus;
mod error;
mod models;
mod pipeline;
mod report;
mod scoring;
mod share;
mod storage;

use anyhow::{Context, Result};
use cache::AnalysisCache;
use chrono::Utc;
use cli::{Args, OutputFormat};
use config::Config;
use error::AnalysisError;
use indicatif::{ProgressBar, ProgressStyle};
use models::{AnalysisRequest, ScoreHistoryEntry};
use pipeline::{AnalysisPipeline, PipelineConfig, PipelineOutcome};
use std::path::{Path, PathBuf};
use std::time::Duration;
use storage::{JsonFileStore, JsonHistoryStore, RetentionPolicy};
use tokio_util::sync::CancellationToken;
use tracing::{debug, error, info, warn};
use tracing_subscriber::FmtSubscriber;

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

    info!("ReadScore v{}", env!("CARGO_PKG_VERSION"));
    debug!("Arguments: {:?}", args);

    // Run the analysis
    match run(args).await {
        Ok(exit_code) => {
            std::process::exit(exit_code);
        }
        Err(e) => {
            error!("Analysis failed: {}", e);
            eprintln!("\n❌ Error: {}", e);
            std::process::exit(1);
        }
    }
}

/// Handle --init-config: generate a default .readscore.toml.
fn handle_init_config() -> Result<()> {
    let path = Path::new(".readscore.toml");

    if path.exists() {
        eprintln!("⚠️  .readscore.toml already exists. Remove it first or edit it manually.");
        std::process::exit(1);
    }

    let content = Config::default_toml();
    std::fs::write(path, &content).context("Failed to write .readscore.toml")?;

    println!("✅ Created .readscore.toml with default settings.");
    println!("   Edit it to customize weights, versions, storage, and more.");
    Ok(())
}

/// Initialize logging based on verbosity settings.
fn init_logging(args: &Args) {
    let level = args.log_level();

    let subscriber = FmtSubscriber::builder()
        .with_max_level(level)
        .with_target(false)
        .with_thread_ids(false)
        .with_file(false)
        .with_line_number(false)
        .compact()
        .finish();

    tracing::subscriber::set_global_default(subscriber).expect("Failed to set tracing subscriber");
}

/// Run the complete workflow. Returns exit code (0, 2, or 130).
async fn run(args: Args) -> Result<i32> {
    // Load configuration
    let mut config = load_config(&args)?;
    config.merge_with_args(&args);

    let store = JsonFileStore::new(PathBuf::from(&config.storage.store_dir));

    // Handle --sweep: apply the retention policy and exit
    if args.sweep {
        return handle_sweep(&store, &config).await;
    }

    // Handle --revoke: withdraw a share link and exit
    if let Some(ref id) = args.revoke {
        return handle_revoke(&store, id).await;
    }

    // Step 1: Load the analysis request
    let input_path = args
        .input
        .as_ref()
        .context("an input request file is required")?;
    let mut request = load_request(input_path)?;

    if let Some(ref user) = args.user {
        request.user_id = Some(user.clone());
    }
    if args.share {
        request.share = true;
    }

    // Handle --dry-run: validate and summarize, no scoring or persistence
    if args.dry_run {
        return handle_dry_run(&request);
    }

    // Step 2: Assemble the pipeline
    let history_store = JsonHistoryStore::new(PathBuf::from(&config.storage.history_file));
    let pipeline_config = PipelineConfig {
        weights: config.scoring.weights.to_category_weights(),
        scoring_version: config.scoring.scoring_version.clone(),
        prompt_version: config.scoring.prompt_version.clone(),
        size_ceiling: config.storage.size_ceiling,
        share_days: config.share.default_days,
    };
    let cache = AnalysisCache::new(config.storage.cache_capacity);
    let mut pipeline =
        AnalysisPipeline::new(pipeline_config, store, history_store.clone(), cache);

    // Step 3: Run it, honoring Ctrl-C up to the commit point
    let cancel = CancellationToken::new();
    let signal_token = cancel.clone();
    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            signal_token.cancel();
        }
    });

    let spinner = make_spinner(&args);
    let outcome = match pipeline.run(request.clone(), &cancel).await {
        Ok(outcome) => outcome,
        Err(AnalysisError::Cancelled) => {
            spinner.finish_and_clear();
            eprintln!("\n⛔ Cancelled. Nothing was persisted.");
            return Ok(130);
        }
        Err(e @ AnalysisError::Persistence(_)) => {
            spinner.finish_and_clear();
            // Distinct so callers can wire a retry around the commit.
            eprintln!("\n❌ Persistence failed; the analysis was computed but not stored.");
            return Err(e.into());
        }
        Err(e) if e.is_validation() => {
            spinner.finish_and_clear();
            eprintln!("\n❌ The request was rejected before scoring: {}", e);
            return Err(e.into());
        }
        Err(e) => {
            spinner.finish_and_clear();
            return Err(e.into());
        }
    };
    spinner.finish_and_clear();

    // Step 4: Append this score to the user's history series
    if !outcome.from_cache {
        if let Some(ref user_id) = request.user_id {
            history_store
                .append(
                    user_id,
                    ScoreHistoryEntry {
                        overall_score: outcome.document.overall_score,
                        analyzed_at: outcome.document.analyzed_at,
                    },
                )
                .await?;
        }
    }

    // Step 5: Render and save the report
    let output = match args.format {
        OutputFormat::Json => report::generate_json_report(&outcome.document)?,
        OutputFormat::Markdown => report::generate_markdown_report(
            &outcome.document,
            outcome.benchmark.as_ref(),
            outcome.overflow,
        ),
    };

    let output_path = PathBuf::from(&config.general.output);
    std::fs::write(&output_path, &output)
        .with_context(|| format!("Failed to write report to {}", output_path.display()))?;

    print_summary(&outcome, &output_path);

    // Check --fail-under threshold
    if let Some(threshold) = args.fail_under {
        if outcome.document.overall_score < threshold {
            eprintln!(
                "\n⛔ Score {} below threshold {}. Failing (exit code 2).",
                outcome.document.overall_score, threshold
            );
            return Ok(2);
        }
    }

    Ok(0)
}

/// Handle --sweep: delete documents past the retention cutoff.
async fn handle_sweep(store: &JsonFileStore, config: &Config) -> Result<i32> {
    let policy = RetentionPolicy {
        days: config.storage.retention_days,
    };

    println!(
        "🧹 Sweeping documents older than {} days...",
        policy.days
    );
    let removed = policy.sweep(store, Utc::now()).await?;
    println!("✅ Sweep complete. Removed {} document(s).", removed);

    Ok(0)
}

/// Handle --revoke: withdraw the share link of a stored document.
async fn handle_revoke(store: &JsonFileStore, id: &str) -> Result<i32> {
    use storage::DocumentStore;

    let Some(mut document) = store.get(id).await? else {
        eprintln!("❌ No stored analysis with id {}", id);
        return Ok(1);
    };

    let was_active = share::is_share_active(&document, Utc::now());
    share::ShareLinkManager::default().revoke(&mut document);
    store.put(&document).await?;

    if was_active {
        println!("✅ Share link revoked for {}.", id);
    } else {
        println!("✅ Share fields cleared for {} (link was not active).", id);
    }
    Ok(0)
}

/// Handle --dry-run: validate the request and summarize what would run.
fn handle_dry_run(request: &AnalysisRequest) -> Result<i32> {
    println!("\n🔍 Dry run: validating request (no scoring, no persistence)...\n");

    pipeline::validate_request(request)?;

    let check_count: usize = request.check_results.values().map(|v| v.len()).sum();
    println!(
        "   Input: {} ({})",
        request
            .source_url
            .as_deref()
            .unwrap_or("inline content"),
        request.input_method
    );
    println!(
        "   Checks: {} across {} categories",
        check_count,
        request.check_results.len()
    );
    for (category, outcomes) in &request.check_results {
        println!("     📋 {} ({} checks)", category, outcomes.len());
    }
    if request.extractions.is_empty() {
        println!("   Extractions: none (consensus will be unavailable)");
    } else {
        println!("   Extractions: {} source(s)", request.extractions.len());
        for source in request.extractions.keys() {
            println!("     🤖 {}", source);
        }
    }

    println!("\n✅ Request is valid.");
    Ok(0)
}

/// Progress spinner for the pipeline run.
fn make_spinner(args: &Args) -> ProgressBar {
    if args.quiet {
        return ProgressBar::hidden();
    }

    let spinner = ProgressBar::new_spinner();
    spinner.set_style(
        ProgressStyle::default_spinner()
            .template("{spinner:.cyan} {msg}")
            .unwrap_or_else(|_| ProgressStyle::default_spinner()),
    );
    spinner.set_message("Scoring...");
    spinner.enable_steady_tick(Duration::from_millis(100));
    spinner
}

/// Print the closing summary.
fn print_summary(outcome: &PipelineOutcome, output_path: &Path) {
    let document = &outcome.document;
    let summary = &document.issue_summary;

    println!("\n📊 Analysis Summary:");
    if outcome.from_cache {
        println!("   Served from cache (identical request, same versions)");
    }
    println!(
        "   Score: {} / 100 — Grade {} ({})",
        document.overall_score, document.grade, document.grade_label
    );
    println!(
        "   Confidence: {}% — range {}-{}",
        document.score_confidence.confidence,
        document.score_confidence.range[0],
        document.score_confidence.range[1]
    );
    println!(
        "   Issues: 🔴 {} | 🟠 {} | 🟡 {} | 🟢 {} | ⚠️ {} | ✅ {} passed",
        summary.critical, summary.high, summary.medium, summary.low, summary.warning,
        summary.passed
    );
    if document.llm_consensus.available {
        println!(
            "   Extraction consensus: {}%",
            document.llm_consensus.overall
        );
    }
    if let Some(ref benchmark) = outcome.benchmark {
        println!(
            "   Benchmark: avg {} | trend {:+} | percentile {}%",
            benchmark.average, benchmark.trend, benchmark.percentile
        );
    }
    if outcome.overflow {
        println!("   ⚠️ Stored document was truncated to fit the size ceiling");
    }
    if document.is_shared {
        if let (Some(token), Some(expiry)) = (&document.share_token, document.share_expiry) {
            println!(
                "   Share token: {} (expires {})",
                token,
                expiry.format("%Y-%m-%d")
            );
        }
    }
    println!(
        "\n✅ Analysis complete! Report saved to: {}",
        output_path.display()
    );
}

/// Load the analysis request from a JSON file.
fn load_request(path: &Path) -> Result<AnalysisRequest> {
    let content = std::fs::read_to_string(path)
        .with_context(|| format!("Failed to read request file: {}", path.display()))?;

    let request: AnalysisRequest = serde_json::from_str(&content)
        .with_context(|| format!("Failed to parse request file: {}", path.display()))?;

    Ok(request)
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
            info!("Loaded default config from .readscore.toml");
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
