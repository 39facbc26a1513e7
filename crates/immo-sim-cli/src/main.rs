mod commands;
mod input;
mod output;
mod reference;

use std::path::PathBuf;
use std::process;

use clap::{Parser, Subcommand, ValueEnum};
use colored::Colorize;
use tracing_subscriber::prelude::*;
use tracing_subscriber::{fmt, EnvFilter};

use commands::financing::{AmortizationArgs, IncomeTaxArgs, WealthTaxArgs};
use commands::investment::{AnalyzeArgs, ProjectArgs};
use commands::market::{
    CommunesArgs, ComparePriceArgs, MarketArgs, MarketStatsArgs, RecommendArgs, ScoreArgs,
    SimilarArgs, TopCommunesArgs,
};
use commands::tax::TaxArgs;
use reference::ReferenceConfig;

/// Rental property investment simulation and market analytics
#[derive(Parser)]
#[command(
    name = "immo",
    version,
    about = "Rental property investment simulation and market analytics",
    long_about = "A CLI for simulating buy-to-let investments with decimal precision. \
                  Covers loan amortization, cashflow and yield analysis, long-term \
                  projections, rental tax regimes, and market analytics over yearly \
                  transaction aggregates per municipality."
)]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Output format
    #[arg(long, default_value = "json", global = true)]
    output: OutputFormat,

    /// Directory holding the dvf<year>.csv market files
    #[arg(long, env = "IMMO_DATA_DIR", default_value = "data", global = true)]
    data_dir: PathBuf,

    /// Municipality registry CSV (COM, LIBELLE, TYPECOM columns)
    #[arg(long, env = "IMMO_COMMUNES_FILE", global = true)]
    communes: Option<PathBuf>,

    /// Restrict market data to these years (comma separated)
    #[arg(long, value_delimiter = ',', global = true)]
    market_years: Vec<i32>,
}

#[derive(Subcommand)]
enum Commands {
    /// Monthly payment and amortization table of a fixed-rate loan
    Amortization(AmortizationArgs),
    /// Cost, cashflow, yields and projection summary of an investment
    Analyze(AnalyzeArgs),
    /// Year-by-year projection of value, rent, debt and equity
    Project(ProjectArgs),
    /// Simulate one rental tax regime
    Tax(TaxArgs),
    /// Run every rental tax regime on the same input
    CompareRegimes(TaxArgs),
    /// Progressive household income tax
    IncomeTax(IncomeTaxArgs),
    /// Progressive tax on real-estate net worth
    WealthTax(WealthTaxArgs),
    /// Year-by-year market averages with year-over-year changes
    MarketEvolution(MarketArgs),
    /// Price-per-area trend classification
    MarketTrend(MarketArgs),
    /// Transaction liquidity of a market
    MarketLiquidity(MarketArgs),
    /// Descriptive price and surface statistics
    MarketStats(MarketStatsArgs),
    /// Composite 0-100 market score of a municipality
    MarketScore(ScoreArgs),
    /// Position a price per area against the market
    ComparePrice(ComparePriceArgs),
    /// Investment recommendation for a property in a municipality
    Recommend(RecommendArgs),
    /// Market rows with a comparable mean surface
    Similar(SimilarArgs),
    /// Rank municipalities by a market metric
    TopCommunes(TopCommunesArgs),
    /// Search the municipality registry
    Communes(CommunesArgs),
    /// Print version information
    Version,
}

#[derive(Debug, Clone, ValueEnum)]
pub enum OutputFormat {
    Json,
    Table,
    Csv,
    Minimal,
}

fn init_tracing() {
    let filter = EnvFilter::try_from_env("IMMO_LOG").unwrap_or_else(|_| EnvFilter::new("warn"));
    tracing_subscriber::registry()
        .with(filter)
        .with(fmt::layer().with_target(true).with_writer(std::io::stderr))
        .init();
}

fn main() {
    let cli = Cli::parse();
    init_tracing();

    let config = ReferenceConfig {
        data_dir: cli.data_dir,
        communes_file: cli.communes,
        years: cli.market_years,
    };

    let result: Result<serde_json::Value, Box<dyn std::error::Error>> = match cli.command {
        Commands::Amortization(args) => commands::financing::run_amortization(args),
        Commands::Analyze(args) => commands::investment::run_analyze(args),
        Commands::Project(args) => commands::investment::run_project(args),
        Commands::Tax(args) => commands::tax::run_tax(args),
        Commands::CompareRegimes(args) => commands::tax::run_compare_regimes(args),
        Commands::IncomeTax(args) => commands::financing::run_income_tax(args),
        Commands::WealthTax(args) => commands::financing::run_wealth_tax(args),
        Commands::MarketEvolution(args) => commands::market::run_evolution(args, &config),
        Commands::MarketTrend(args) => commands::market::run_trend(args, &config),
        Commands::MarketLiquidity(args) => commands::market::run_liquidity(args, &config),
        Commands::MarketStats(args) => commands::market::run_stats(args, &config),
        Commands::MarketScore(args) => commands::market::run_score(args, &config),
        Commands::ComparePrice(args) => commands::market::run_compare_price(args, &config),
        Commands::Recommend(args) => commands::market::run_recommend(args, &config),
        Commands::Similar(args) => commands::market::run_similar(args, &config),
        Commands::TopCommunes(args) => commands::market::run_top_communes(args, &config),
        Commands::Communes(args) => commands::market::run_communes(args, &config),
        Commands::Version => {
            println!("immo {}", env!("CARGO_PKG_VERSION"));
            return;
        }
    };

    match result {
        Ok(value) => {
            output::format_output(&cli.output, &value);
            process::exit(0);
        }
        Err(e) => {
            eprintln!("{}: {}", "error".red().bold(), e);
            process::exit(1);
        }
    }
}
