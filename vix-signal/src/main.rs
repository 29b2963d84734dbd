//! # Evaluate the live signal
//! vix-signal live --config config/default.toml
//! vix-signal live --json
//!
//! # Classify given levels
//! vix-signal classify --vix9d 13.1 --vix 14.2 --vix3m 16.0 --vix6m 17.4
//!
//! # Score a ratio against a history
//! vix-signal score --vix9d 13.1 --vix 14.2 --history 0.85,0.91,0.88,1.02

use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};

use vix_signal::analytics::score_breakdown;
use vix_signal::{classify, Dashboard, HistoricalRatioSeries, QuoteSet, SignalConfig, YahooClient};

#[derive(Parser)]
#[command(name = "vix-signal")]
#[command(about = "VIX term-structure risk signal and ratio percentile score")]
#[command(version)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Fetch current and historical levels and print the dashboard
    Live {
        /// Path to configuration file
        #[arg(short, long)]
        config: Option<PathBuf>,

        /// Print the dashboard as JSON
        #[arg(long)]
        json: bool,
    },

    /// Classify the term structure from given levels
    Classify {
        #[arg(long)]
        vix9d: Option<f64>,
        #[arg(long)]
        vix: Option<f64>,
        #[arg(long)]
        vix3m: Option<f64>,
        #[arg(long)]
        vix6m: Option<f64>,
    },

    /// Score the VIX9D/VIX ratio against a comma-separated ratio history
    Score {
        #[arg(long)]
        vix9d: f64,
        #[arg(long)]
        vix: f64,
        #[arg(long, value_delimiter = ',')]
        history: Vec<f64>,
    },
}

fn init_logging(level: &str) -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::from_default_env()
                .add_directive(format!("vix_signal={}", level).parse()?),
        )
        .with_writer(std::io::stderr)
        .init();
    Ok(())
}

fn load_config(path: Option<PathBuf>) -> Result<SignalConfig> {
    let config = match path {
        Some(p) => SignalConfig::load(&p)
            .with_context(|| format!("Failed to load config from {}", p.display()))?,
        None => SignalConfig::default(),
    };
    let config = config.with_env_override()?;
    config.validate()?;
    Ok(config)
}

async fn cmd_live(config: SignalConfig, json: bool) -> Result<()> {
    let client = YahooClient::new(&config).context("Failed to build HTTP client")?;
    let dashboard = Dashboard::evaluate(&client, &config)
        .await
        .context("Failed to fetch ratio history")?;

    if json {
        println!("{}", serde_json::to_string_pretty(&dashboard)?);
    } else {
        println!("{}", dashboard.render());
    }
    Ok(())
}

fn cmd_classify(
    vix9d: Option<f64>,
    vix: Option<f64>,
    vix3m: Option<f64>,
    vix6m: Option<f64>,
) -> Result<()> {
    let quotes = QuoteSet::from_levels(vix9d, vix, vix3m, vix6m).context("Invalid index level")?;
    let label = classify(&quotes);

    println!("Signal: {} [{}]", label, label.color());
    println!("  {}", label.description());
    if !quotes.is_complete() {
        let names: Vec<&str> = quotes.missing().iter().map(|s| s.as_str()).collect();
        println!("  Missing: {}", names.join(", "));
    }
    Ok(())
}

fn cmd_score(vix9d: f64, vix: f64, history: Vec<f64>) -> Result<()> {
    let history = HistoricalRatioSeries::new(history).context("Invalid ratio history")?;
    let b = score_breakdown(vix9d, vix, &history).context("Failed to score ratio")?;

    println!("VIX9D/VIX ratio: {:.4}", b.current_ratio);
    println!("  Percentile: {:.1} ({} samples)", b.percentile, b.samples);
    println!("  Risk score: {} / 5", b.score);
    Ok(())
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    match cli.command {
        Commands::Live { config, json } => {
            let config = load_config(config)?;
            init_logging(&config.log_level)?;
            cmd_live(config, json).await?;
        }
        Commands::Classify {
            vix9d,
            vix,
            vix3m,
            vix6m,
        } => {
            init_logging("warn")?;
            cmd_classify(vix9d, vix, vix3m, vix6m)?;
        }
        Commands::Score {
            vix9d,
            vix,
            history,
        } => {
            init_logging("warn")?;
            cmd_score(vix9d, vix, history)?;
        }
    }

    Ok(())
}
