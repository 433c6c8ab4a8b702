//! MedalTally - Olympic medal dashboard data
//!
//! A CLI tool that loads a static medals dataset once, applies a
//! country/day/medal selection and writes the derived chart data as a
//! Markdown or JSON report.
//!
//! Exit codes:
//!   0 - Success
//!   1 - Runtime error (unreadable dataset, bad config, write failure, etc.)

use anyhow::{Context, Result};
use medaltally::analysis::{MedalAggregator, Selection};
use medaltally::cli::{Args, OutputFormat};
use medaltally::config::{Config, CONFIG_FILE};
use medaltally::dataset::{self, DatasetPaths, LoadState};
use medaltally::report;
use std::path::Path;
use std::time::Instant;
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

    // Configuration decides the log level, so it is read before logging starts
    let loaded = match load_config(&args) {
        Ok(loaded) => loaded,
        Err(e) => {
            eprintln!("\n❌ Error: {:#}", e);
            std::process::exit(1);
        }
    };

    // Initialize logging
    init_logging(loaded.config.log_level(&args));

    info!("MedalTally v{}", env!("CARGO_PKG_VERSION"));
    debug!("Arguments: {:?}", args);
    match &loaded.fallback {
        Some(reason) => warn!("Failed to load config: {}", reason),
        None => debug!("Configuration: {}", loaded.source),
    }

    match run(args, loaded.config).await {
        Ok(exit_code) => {
            std::process::exit(exit_code);
        }
        Err(e) => {
            error!("Run failed: {}", e);
            eprintln!("\n❌ Error: {:#}", e);
            std::process::exit(1);
        }
    }
}

/// Handle --init-config: generate a default .medaltally.toml.
fn handle_init_config() -> Result<()> {
    let path = Path::new(CONFIG_FILE);

    if path.exists() {
        eprintln!("⚠️  {} already exists. Remove it first or edit it manually.", CONFIG_FILE);
        std::process::exit(1);
    }

    let content = Config::default_toml();
    std::fs::write(path, &content).with_context(|| format!("Failed to write {}", CONFIG_FILE))?;

    println!("✅ Created {} with default settings.", CONFIG_FILE);
    println!("   Edit it to customize data paths, default countries and colors.");
    Ok(())
}

/// Initialize logging at the merged verbosity level.
fn init_logging(level: tracing::Level) {
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

/// Load the dataset, apply the selection and write the report. Returns the exit code.
async fn run(args: Args, config: Config) -> Result<i32> {
    let start_time = Instant::now();

    // Step 1: Load the dataset once
    let paths = DatasetPaths::from(&config.data);
    if !args.quiet {
        println!("📥 Loading medals: {}", paths.medals.display());
    }
    let state = dataset::load_with_progress(&paths, !args.quiet).await?;
    let aggregator = build_aggregator(state, &config);

    if args.check {
        return handle_check(&aggregator);
    }

    // Step 2: Apply the selection as the dashboard would on first render
    let (selection, notices) = build_selection(&aggregator, &config);

    // Step 3: Derive the chart data
    let report = report::build_report(&aggregator, &selection, &config.data.medals, notices);

    let output = match config.general.format {
        OutputFormat::Json => report::generate_json_report(&report)?,
        OutputFormat::Markdown => report::generate_markdown_report(&report, &config.report),
    };

    let output_path = Path::new(&config.general.output);
    std::fs::write(output_path, &output)
        .with_context(|| format!("Failed to write report to {}", output_path.display()))?;

    if !args.quiet {
        println!("\n📊 Selection Summary:");
        for count in &report.country_counts {
            println!("   {} - {}: {}", count.country_code, count.country_name, count.count);
        }
        println!("   Matching medals: {}", report.filtered_total);
        println!("   Highlighted events: {}", report.highlighted_events.len());
        println!("   Duration: {:.2}s", start_time.elapsed().as_secs_f64());
        println!("\n✅ Report saved to: {}", output_path.display());
    }

    Ok(0)
}

/// Tally over the configured games window, or over the dataset's own span.
fn build_aggregator(state: LoadState, config: &Config) -> MedalAggregator {
    let LoadState::Loaded(dataset) = state else {
        return MedalAggregator::pending();
    };

    if config.data.first_day.is_none() && config.data.last_day.is_none() {
        return MedalAggregator::new(dataset);
    }

    match medaltally::analysis::date_span(&dataset.records) {
        Some((first_medal, last_medal)) => {
            let first = config
                .data
                .first_day
                .unwrap_or_else(|| first_medal.pred_opt().unwrap_or(first_medal));
            let last = config.data.last_day.unwrap_or(last_medal);
            info!("Tallying from {} to {}", first, last);
            MedalAggregator::with_window(dataset, first, last)
        }
        None => MedalAggregator::new(dataset),
    }
}

/// Build the initial selection. Rejected changes become user-visible notices
/// and leave the selection as it was.
fn build_selection(aggregator: &MedalAggregator, config: &Config) -> (Selection, Vec<String>) {
    let mut selection = Selection::new(config.selection.color_pool());
    let mut notices = Vec::new();

    selection.set_medals(config.selection.medals);

    for code in &config.selection.countries {
        let result = match aggregator.dataset() {
            Some(dataset) => selection.add_known_country(code, |c| dataset.is_known_country(c)),
            None => selection.add_country(code),
        };
        if let Err(e) = result {
            warn!("Selection change rejected: {}", e);
            eprintln!("⚠️  {}", e);
            notices.push(e.to_string());
        }
    }

    if config.selection.all_dates {
        selection.select_dates(aggregator.medal_dates());
    } else {
        selection.select_dates(config.selection.dates.iter().copied());
    }

    debug!(
        "Selection: {} countries, {} days",
        selection.countries().len(),
        selection.dates().len()
    );
    (selection, notices)
}

/// Handle --check: summarize the loaded dataset and exit.
fn handle_check(aggregator: &MedalAggregator) -> Result<i32> {
    let Some(dataset) = aggregator.dataset() else {
        println!("   Dataset not loaded.");
        return Ok(0);
    };

    println!("\n🔍 Dataset check\n");
    println!("   Medals loaded: {}", dataset.records.len());
    println!("   Countries: {}", dataset.country_names.len());

    if let (Some(first), Some(last)) = (aggregator.tally().first(), aggregator.tally().last()) {
        println!(
            "   Tally: {} to {} ({} days)",
            first.date,
            last.date,
            aggregator.tally().len()
        );
    }

    if !dataset.skipped.is_empty() {
        println!("\n   Skipped {} rows:", dataset.skipped.len());
        for (row, reason) in dataset.skipped.iter().take(10) {
            println!("     row {}: {}", row, reason);
        }
    }

    if let Some(last) = aggregator.tally().last() {
        let mut leaders: Vec<_> = last.per_country.iter().collect();
        leaders.sort_by(|a, b| {
            (b.1.gold, b.1.silver, b.1.bronze).cmp(&(a.1.gold, a.1.silver, a.1.bronze))
        });

        println!("\n   Leaders:");
        for (code, counts) in leaders.into_iter().take(5) {
            println!(
                "     {} {:<20} {}",
                code,
                dataset.country_name(code),
                report::medal_line(counts)
            );
        }
    }

    println!("\n✅ Check complete.");
    Ok(0)
}

/// Configuration merged with the command line, and where it came from.
struct LoadedConfig {
    config: Config,
    source: String,
    /// Set when the default config file existed but could not be used.
    fallback: Option<String>,
}

/// Load configuration from file or use defaults, then apply CLI overrides.
fn load_config(args: &Args) -> Result<LoadedConfig> {
    let (mut config, source, fallback) = if let Some(ref config_path) = args.config {
        // Explicit path must load
        let config = Config::load(config_path)?;
        (config, config_path.display().to_string(), None)
    } else {
        match Config::load_default() {
            Ok(Some(config)) => (config, CONFIG_FILE.to_string(), None),
            Ok(None) => (Config::default(), "defaults".to_string(), None),
            Err(e) => (Config::default(), "defaults".to_string(), Some(format!("{:#}", e))),
        }
    };

    config.merge_with_args(args);
    Ok(LoadedConfig {
        config,
        source,
        fallback,
    })
}
