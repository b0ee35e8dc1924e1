//! tickforge CLI — run historical replays and probe the data store.
//!
//! Commands:
//! - `run` — execute a replay from a TOML config file and save the report
//! - `probe` — report what tick and bar history the store holds

use std::path::{Path, PathBuf};

use anyhow::{bail, Context, Result};
use clap::{Parser, Subcommand};

use tickforge_core::domain::Product;
use tickforge_replay::source::describe_range;
use tickforge_replay::{
    CsvHistoricalSource, HistoricalSource, ReplayConfig, ReplayEngine, ReplayReport,
};

#[derive(Parser)]
#[command(name = "tickforge", about = "tickforge — futures strategy replay engine")]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Execute a replay from a TOML config file.
    Run {
        /// Path to the replay config.
        #[arg(long)]
        config: PathBuf,

        /// Historical store directory.
        #[arg(long, default_value = "data")]
        data: PathBuf,

        /// Output directory for the report JSON.
        #[arg(long, default_value = "results")]
        output: PathBuf,
    },
    /// Report what history the store holds for a product.
    Probe {
        /// Product code: tx, mtx, or tmf.
        #[arg(long, default_value = "tx")]
        product: String,

        /// Historical store directory.
        #[arg(long, default_value = "data")]
        data: PathBuf,
    },
}

fn main() -> Result<()> {
    let cli = Cli::parse();
    match cli.command {
        Commands::Run {
            config,
            data,
            output,
        } => run_replay(&config, &data, &output),
        Commands::Probe { product, data } => run_probe(&product, &data),
    }
}

fn parse_product(code: &str) -> Result<Product> {
    match code {
        "tx" => Ok(Product::Tx),
        "mtx" => Ok(Product::Mtx),
        "tmf" => Ok(Product::Tmf),
        other => bail!("unknown product {other:?}; expected tx, mtx, or tmf"),
    }
}

fn run_replay(config_path: &Path, data_dir: &Path, output_dir: &Path) -> Result<()> {
    let text = std::fs::read_to_string(config_path)
        .with_context(|| format!("reading {}", config_path.display()))?;
    let config: ReplayConfig =
        toml::from_str(&text).with_context(|| format!("parsing {}", config_path.display()))?;

    let source = CsvHistoricalSource::new(data_dir);
    let engine = ReplayEngine::new(config, source)?;
    let report = engine.run()?;

    print_summary(&report);

    std::fs::create_dir_all(output_dir)
        .with_context(|| format!("creating {}", output_dir.display()))?;
    let path = output_dir.join(format!("{}.json", report.run_id));
    let json = serde_json::to_string_pretty(&report)?;
    std::fs::write(&path, json).with_context(|| format!("writing {}", path.display()))?;
    println!("Report saved to: {}", path.display());

    Ok(())
}

fn print_summary(report: &ReplayReport) {
    println!("Run {}", report.run_id);
    if report.cancelled {
        println!("  cancelled after {} of {} rows", report.processed_units, report.total_units);
    } else {
        println!("  processed {} of {} rows", report.processed_units, report.total_units);
    }
    println!("  total profit: {}", report.total_profit);
    println!("  sessions: {}", report.sessions.len());
    for session in &report.sessions {
        println!(
            "    #{} {} {:?} x{} realized {} ({})",
            session.id,
            session.start_time,
            session.side,
            session.trade_count,
            session.realized,
            session.close_reason.as_deref().unwrap_or("open"),
        );
    }
    println!("  signals: {}", report.signals.len());
}

fn run_probe(product_code: &str, data_dir: &Path) -> Result<()> {
    let product = parse_product(product_code)?;
    let source = CsvHistoricalSource::new(data_dir);

    let ticks = source.tick_range(product)?;
    let bars = source.bar_range(product)?;
    println!("Store {} / {product_code}", data_dir.display());
    println!("  ticks:   {}", describe_range(ticks));
    println!("  1m bars: {}", describe_range(bars));

    Ok(())
}
