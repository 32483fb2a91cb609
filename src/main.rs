use std::io::Write;
use std::path::PathBuf;
use std::sync::Arc;

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use tokio::sync::mpsc;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use team_gauge::config::AppConfig;
use team_gauge::fetch::RiotClient;
use team_gauge::pipeline::{AnalysisPipeline, AnalysisRequest, PipelineEvent};
use team_gauge::{parse_timeout, report, Region};

#[derive(Parser)]
#[command(name = "team-gauge")]
#[command(about = "Judge your recent teammates against the enemy team")]
#[command(version)]
struct Cli {
    /// Path to configuration file
    #[arg(long, default_value = "./team-gauge.toml")]
    config: PathBuf,

    /// Log level (trace, debug, info, warn, error)
    #[arg(long)]
    log_level: Option<String>,

    /// Output logs as JSON
    #[arg(long)]
    json_logs: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Analyze a player's recent matches
    Analyze {
        /// Riot ID game name (e.g. "T1 sosa")
        name: String,

        /// Riot ID tag line (e.g. "win")
        tag: String,

        /// Riot API key
        #[arg(long, env = "RIOT_API_KEY", hide_env_values = true)]
        api_key: String,

        /// Region code (see `regions`)
        #[arg(long)]
        region: Option<String>,

        /// Number of matches to analyze
        #[arg(long)]
        count: Option<u32>,

        /// Concurrent match detail requests
        #[arg(long)]
        concurrency: Option<usize>,

        /// Per-request timeout (e.g. "10s", "500ms")
        #[arg(long)]
        timeout: Option<String>,

        /// Print the full result as JSON instead of a text report
        #[arg(long)]
        json: bool,

        /// Hide progress output
        #[arg(long)]
        quiet: bool,
    },

    /// List supported region codes
    Regions,
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();
    let config = AppConfig::load_or_default(&cli.config)
        .with_context(|| format!("Failed to load {}", cli.config.display()))?;

    // Initialize tracing
    let level = cli.log_level.clone().unwrap_or_else(|| config.log_level.clone());
    let filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(&level));

    let registry = tracing_subscriber::registry().with(filter);
    if cli.json_logs {
        registry
            .with(tracing_subscriber::fmt::layer().json().with_writer(std::io::stderr))
            .init();
    } else {
        registry
            .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
            .init();
    }

    tracing::debug!("Starting team-gauge v{}", env!("CARGO_PKG_VERSION"));

    match cli.command {
        Commands::Regions => {
            for region in Region::all() {
                let route = region.route();
                println!(
                    "{:<5} {:<9} {}",
                    region.code(),
                    route.continental_host,
                    route.platform_host
                );
            }
        }
        Commands::Analyze {
            name,
            tag,
            api_key,
            region,
            count,
            concurrency,
            timeout,
            json,
            quiet,
        } => {
            let region_code = region.unwrap_or_else(|| config.defaults.region.code().to_string());
            let match_count = count.unwrap_or(config.defaults.match_count);
            let request = AnalysisRequest::new(&api_key, &name, &tag, &region_code, match_count)?;

            let mut fetcher_config = config.api.fetcher_config();
            if let Some(raw) = timeout {
                fetcher_config.timeout = parse_timeout(&raw)
                    .with_context(|| format!("Invalid --timeout value: {}", raw))?;
            }
            let mut pipeline_config = config.api.pipeline_config();
            if let Some(n) = concurrency {
                pipeline_config.max_concurrent_requests = n.max(1);
            }

            let client = RiotClient::new(fetcher_config).context("Failed to create HTTP client")?;
            let pipeline = AnalysisPipeline::new(Arc::new(client), pipeline_config);

            let (tx, rx) = mpsc::unbounded_channel();
            let printer = tokio::spawn(print_progress(rx, quiet || json));

            let outcome = pipeline.run(&request, Some(tx)).await;
            // The sender is dropped with the run, which ends the printer.
            printer.await.ok();

            let result = outcome?;
            if json {
                println!("{}", serde_json::to_string_pretty(&result)?);
            } else {
                print!("{}", report::render(&result, &request.riot_id()));
            }
        }
    }

    Ok(())
}

async fn print_progress(mut rx: mpsc::UnboundedReceiver<PipelineEvent>, quiet: bool) {
    while let Some(event) = rx.recv().await {
        if quiet {
            continue;
        }
        if let PipelineEvent::Progress { percent } = event {
            eprint!("\rAnalyzing... {:>3}%", percent);
            std::io::stderr().flush().ok();
        }
    }
    if !quiet {
        eprintln!();
    }
}
