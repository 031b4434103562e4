pub mod analytics;
pub mod api;
pub mod commands;
pub mod ingest;
pub mod models;

use anyhow::Context;
use clap::{Args, Parser, Subcommand};
use std::path::PathBuf;

use api::{HttpQuoteSource, LocalDirStore, QuoteCache};
use commands::{
    build_comparison_table, load_leverage_backtests, load_simple_backtests, write_comparison_csv,
    ComparisonRow,
};
use models::{PipelineSettings, UpdateSettingsInput};

#[derive(Parser)]
#[command(
    name = "backtest-analytics",
    version,
    about = "Select, parse and summarise backtest spreadsheet exports"
)]
struct Cli {
    /// JSON settings file. Missing fields use defaults.
    #[arg(long, global = true)]
    settings: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Single-sheet equity backtests, one canonical file per symbol.
    Simple(RunArgs),
    /// Trades/filtered-signals backtests, one canonical file per symbol and leverage.
    Leverage(RunArgs),
}

#[derive(Args)]
struct RunArgs {
    /// Directory holding the exported spreadsheets.
    #[arg(long)]
    dir: PathBuf,

    /// Key prefix to list under. Defaults to the configured prefix.
    #[arg(long)]
    prefix: Option<String>,

    /// Starting equity for the leverage ledger.
    #[arg(long)]
    initial_capital: Option<f64>,

    /// Also write the comparison table as CSV.
    #[arg(long)]
    csv: Option<PathBuf>,

    /// Attach current spot prices to each row.
    #[arg(long, default_value_t = false)]
    quotes: bool,
}

pub fn run() -> anyhow::Result<()> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    let cli = Cli::parse();
    let settings = match &cli.settings {
        Some(path) => PipelineSettings::load(path)?,
        None => PipelineSettings::default(),
    };

    let runtime = tokio::runtime::Runtime::new().context("Failed to start async runtime")?;
    let rows = runtime.block_on(execute(cli.command, settings))?;

    println!("{}", serde_json::to_string_pretty(&rows)?);
    Ok(())
}

async fn execute(command: Commands, settings: PipelineSettings) -> anyhow::Result<Vec<ComparisonRow>> {
    let leverage = matches!(command, Commands::Leverage(_));
    let (Commands::Simple(args) | Commands::Leverage(args)) = command;

    let update = if leverage {
        UpdateSettingsInput {
            leverage_prefix: args.prefix.clone(),
            initial_capital: args.initial_capital,
            ..Default::default()
        }
    } else {
        UpdateSettingsInput {
            simple_prefix: args.prefix.clone(),
            ..Default::default()
        }
    };
    let settings = settings.apply(update)?;

    let store = LocalDirStore::new(&args.dir);
    let cache = args
        .quotes
        .then(|| QuoteCache::from_settings(HttpQuoteSource::from_settings(&settings), &settings));

    let rows = if leverage {
        let report = load_leverage_backtests(&store, &settings).await?;
        build_comparison_table(&report, cache.as_ref()).await
    } else {
        let report = load_simple_backtests(&store, &settings).await?;
        build_comparison_table(&report, cache.as_ref()).await
    };
    log::info!("{} instrument(s) in comparison table", rows.len());

    if let Some(path) = &args.csv {
        let file = std::fs::File::create(path)
            .with_context(|| format!("Failed to create {}", path.display()))?;
        write_comparison_csv(&rows, file)?;
        log::info!("Wrote {}", path.display());
    }

    Ok(rows)
}
