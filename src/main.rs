use analytics::{fit_merton, AnalyticsEngine};
use anyhow::Context;
use backtester::{CustodyReport, CustodyRunner};
use chrono::NaiveDate;
use clap::{Parser, Subcommand};
use configuration::{Config, LogFormat};
use core_types::{close_series, closes, Scenario};
use futures::future::join_all;
use indicatif::{ProgressBar, ProgressStyle};
use market_data::{load_bars, write_bars, LoadedSeries};
use rand::SeedableRng;
use rand::rngs::StdRng;
use simulator::ScenarioGenerator;
use std::path::{Path, PathBuf};

mod tables;

/// The main entry point for the QuantAgrify toolkit.
#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // A .env file is optional; it usually carries PORT or QUANTAGRIFY__* overrides.
    dotenvy::dotenv().ok();

    let cli = Cli::parse();
    let mut config = configuration::load_config(&cli.config)
        .with_context(|| format!("Failed to load configuration from {}", cli.config.display()))?;
    if let Some(format) = cli.log_format {
        config.logging.format = format;
    }
    let _guard = configuration::init_tracing(&config.logging)?;

    match cli.command {
        Commands::Serve(args) => handle_serve(args, config).await,
        Commands::Report(args) => handle_report(args, &config),
        Commands::Indicators(args) => handle_indicators(args, &config),
        Commands::Custody(args) => handle_custody(args, config).await,
        Commands::Simulate(args) => handle_simulate(args, &config),
        Commands::JumpDiffusion(args) => handle_jump_diffusion(args, &config),
    }
}

// ==============================================================================
// CLI Structure
// ==============================================================================

/// Quantitative analytics for agricultural commodity futures.
#[derive(Parser)]
#[command(author, version, about, long_about = None)]
struct Cli {
    /// Path to the TOML configuration file. A missing file means built-in defaults.
    #[arg(long, global = true, default_value = "config.toml")]
    config: PathBuf,

    /// Overrides the configured console log format.
    #[arg(long, global = true, value_enum)]
    log_format: Option<LogFormat>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Run the JSON HTTP service.
    Serve(ServeArgs),
    /// Data quality, performance report and risk profile of a bar file.
    Report(FileArgs),
    /// Latest indicator readings and detected rollover gaps of a bar file.
    Indicators(IndicatorArgs),
    /// Out-of-sample custody backtest of the robots on one or more bar files.
    Custody(CustodyArgs),
    /// Generate a synthetic scenario and write it as CSV.
    Simulate(SimulateArgs),
    /// Fit the jump-diffusion model and score a simulated path against held-out data.
    JumpDiffusion(JumpDiffusionArgs),
}

#[derive(Parser)]
struct ServeArgs {
    /// Port to listen on, overriding the configuration.
    #[arg(long)]
    port: Option<u16>,
}

#[derive(Parser)]
struct FileArgs {
    /// CSV file with date,open,high,low,close,volume[,open_interest] columns.
    #[arg(long)]
    file: PathBuf,

    /// Print JSON instead of tables.
    #[arg(long)]
    json: bool,
}

#[derive(Parser)]
struct IndicatorArgs {
    #[arg(long)]
    file: PathBuf,

    /// Number of most recent bars to show.
    #[arg(long, default_value_t = 10)]
    tail: usize,
}

#[derive(Parser)]
struct CustodyArgs {
    /// One or more bar files; they are processed concurrently.
    #[arg(long, num_args = 1.., required = true)]
    file: Vec<PathBuf>,

    #[arg(long)]
    json: bool,
}

#[derive(Parser)]
struct SimulateArgs {
    /// bull-shock, bear-harvest, rollover-gap or seasonal.
    #[arg(long)]
    scenario: Scenario,

    /// First date (format: YYYY-MM-DD).
    #[arg(long)]
    from: NaiveDate,

    /// Last date (format: YYYY-MM-DD).
    #[arg(long)]
    to: NaiveDate,

    /// Output CSV file.
    #[arg(long)]
    out: PathBuf,

    #[arg(long)]
    seed: Option<u64>,
}

#[derive(Parser)]
struct JumpDiffusionArgs {
    #[arg(long)]
    file: PathBuf,

    #[arg(long)]
    seed: Option<u64>,
}

// ==============================================================================
// Command Logic
// ==============================================================================

fn load(path: &Path) -> anyhow::Result<LoadedSeries> {
    load_bars(path).with_context(|| format!("Failed to load {}", path.display()))
}

async fn handle_serve(args: ServeArgs, mut config: Config) -> anyhow::Result<()> {
    if let Some(port) = args.port {
        config.server.port = port;
    }
    web_server::run_server(config).await
}

fn handle_report(args: FileArgs, config: &Config) -> anyhow::Result<()> {
    let loaded = load(&args.file)?;
    let engine = AnalyticsEngine::new(config.analytics.clone());
    let report = engine.calculate(&close_series(&loaded.bars))?;
    let risk = engine.risk_profile(&loaded.bars);

    if args.json {
        let out = serde_json::json!({
            "quality": loaded.quality,
            "report": report,
            "risk_profile": risk,
        });
        println!("{}", serde_json::to_string_pretty(&out)?);
    } else {
        println!("{}", tables::quality_table(&loaded.quality));
        println!("{}", tables::performance_table(&report, &risk));
    }
    Ok(())
}

fn handle_indicators(args: IndicatorArgs, config: &Config) -> anyhow::Result<()> {
    let loaded = load(&args.file)?;
    let engine = AnalyticsEngine::new(config.analytics.clone());
    let set = engine.indicator_set(&loaded.bars)?;

    println!("{}", tables::indicator_table(&loaded.bars, &set, args.tail));
    if set.gaps.is_empty() {
        println!("No rollover gaps detected.");
    } else {
        println!("{}", tables::gap_table(&set));
    }
    Ok(())
}

/// Runs the custody backtest for every file concurrently.
async fn handle_custody(args: CustodyArgs, config: Config) -> anyhow::Result<()> {
    let progress_bar = ProgressBar::new(args.file.len() as u64);
    progress_bar.set_style(
        ProgressStyle::default_bar()
            .template(
                "{spinner:.green} [{elapsed_precise}] [{bar:40.cyan/blue}] {pos}/{len} {msg}",
            )?
            .progress_chars("#>-"),
    );

    let tasks: Vec<_> = args
        .file
        .iter()
        .cloned()
        .map(|path| {
            let config = config.clone();
            let pb_clone = progress_bar.clone();
            tokio::task::spawn_blocking(move || {
                let loaded = load(&path)?;
                let runner = CustodyRunner::new(
                    config.custody.clone(),
                    config.robots.clone(),
                    AnalyticsEngine::new(config.analytics.clone()),
                );
                let report = runner.run(&loaded.bars)?;
                pb_clone.inc(1);
                pb_clone.set_message(format!("Done {}", path.display()));
                Ok::<(PathBuf, CustodyReport), anyhow::Error>((path, report))
            })
        })
        .collect();

    let results = join_all(tasks).await;
    progress_bar.finish_with_message("Custody complete!");

    let mut failures = 0;
    for result in results {
        match result? {
            Ok((path, report)) => {
                if args.json {
                    println!("{}", serde_json::to_string_pretty(&report)?);
                } else {
                    println!(
                        "\n{} (run {}, trading {} .. {})",
                        path.display(),
                        report.run_id,
                        report.first_trade_date,
                        report.last_trade_date
                    );
                    println!("{}", tables::custody_table(&report));
                }
            }
            Err(e) => {
                failures += 1;
                tracing::error!(error = %e, "A custody run failed.");
            }
        }
    }
    if failures > 0 {
        anyhow::bail!("{failures} of {} custody runs failed", args.file.len());
    }
    Ok(())
}

fn handle_simulate(args: SimulateArgs, config: &Config) -> anyhow::Result<()> {
    let seed = args.seed.or(config.simulation.seed).unwrap_or_else(rand::random);
    let mut generator = ScenarioGenerator::new(config.simulation.clone(), seed);
    let bars = generator.generate(args.scenario, args.from, args.to)?;
    write_bars(&args.out, &bars)?;
    println!(
        "Wrote {} {} bars to {} (seed {seed})",
        bars.len(),
        args.scenario,
        args.out.display()
    );
    Ok(())
}

fn handle_jump_diffusion(args: JumpDiffusionArgs, config: &Config) -> anyhow::Result<()> {
    let loaded = load(&args.file)?;
    let seed = args.seed.or(config.simulation.seed).unwrap_or_else(rand::random);
    let mut rng = StdRng::seed_from_u64(seed);

    let full_fit = fit_merton(
        &closes(&loaded.bars),
        config.analytics.periods_per_year,
        config.analytics.jump_threshold_sigmas,
    );
    let test = simulator::numerical_test(
        &loaded.bars,
        config.custody.train_ratio,
        config.analytics.periods_per_year,
        config.analytics.jump_threshold_sigmas,
        config.simulation.sample_points,
        &mut rng,
    )?;

    let out = serde_json::json!({
        "seed": seed,
        "full_sample_fit": full_fit,
        "numerical_test": test,
    });
    println!("{}", serde_json::to_string_pretty(&out)?);
    Ok(())
}
