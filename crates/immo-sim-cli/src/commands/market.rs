use std::borrow::Cow;

use clap::{Args, ValueEnum};
use rust_decimal::Decimal;
use serde::Serialize;
use serde_json::{json, Value};

use immo_sim_core::market::comparison::DEFAULT_SIMILARITY_TOLERANCE;
use immo_sim_core::market::registry::DEFAULT_SEARCH_LIMIT;
use immo_sim_core::market::{
    analyze_price_trends, compare_to_market, investment_recommendation, market_evolution,
    market_liquidity, market_score, market_stats, similar_properties, top_municipalities,
    MarketTable, PropertyKind, RankingMetric,
};

use crate::reference::{reference_data, ReferenceConfig, ReferenceData};

/// Which part of the market table a command looks at
#[derive(Args)]
pub struct MarketArgs {
    /// Municipality code, name, or "Name (code)"; whole table when absent
    #[arg(long)]
    pub commune: Option<String>,

    /// Restrict to municipalities whose code starts with this department
    #[arg(long)]
    pub department: Option<String>,
}

#[derive(Debug, Clone, Copy, ValueEnum)]
pub enum KindArg {
    All,
    Houses,
    Apartments,
}

impl From<KindArg> for PropertyKind {
    fn from(arg: KindArg) -> Self {
        match arg {
            KindArg::All => PropertyKind::All,
            KindArg::Houses => PropertyKind::Houses,
            KindArg::Apartments => PropertyKind::Apartments,
        }
    }
}

#[derive(Debug, Clone, Copy, ValueEnum)]
pub enum MetricArg {
    PricePerArea,
    Price,
    Surface,
    Transactions,
}

impl From<MetricArg> for RankingMetric {
    fn from(arg: MetricArg) -> Self {
        match arg {
            MetricArg::PricePerArea => RankingMetric::PricePerArea,
            MetricArg::Price => RankingMetric::Price,
            MetricArg::Surface => RankingMetric::Surface,
            MetricArg::Transactions => RankingMetric::Transactions,
        }
    }
}

#[derive(Args)]
pub struct MarketStatsArgs {
    #[command(flatten)]
    pub scope: MarketArgs,

    /// Only rows where this kind of property sold
    #[arg(long, value_enum, default_value = "all")]
    pub kind: KindArg,
}

#[derive(Args)]
pub struct ScoreArgs {
    /// Municipality code, name, or "Name (code)"
    #[arg(long)]
    pub commune: String,
}

#[derive(Args)]
pub struct ComparePriceArgs {
    #[command(flatten)]
    pub scope: MarketArgs,

    /// Candidate price per square metre
    #[arg(long)]
    pub price_per_area: Decimal,
}

#[derive(Args)]
pub struct RecommendArgs {
    /// Municipality code, name, or "Name (code)"
    #[arg(long)]
    pub commune: String,

    /// Asking price per square metre
    #[arg(long)]
    pub price_per_area: Decimal,

    /// Living area in square metres
    #[arg(long)]
    pub surface: Decimal,
}

#[derive(Args)]
pub struct SimilarArgs {
    #[command(flatten)]
    pub scope: MarketArgs,

    /// Target surface in square metres
    #[arg(long)]
    pub surface: Decimal,

    /// Relative tolerance around the surface
    #[arg(long, default_value_t = DEFAULT_SIMILARITY_TOLERANCE)]
    pub tolerance: Decimal,
}

#[derive(Args)]
pub struct TopCommunesArgs {
    /// Restrict to a department code prefix
    #[arg(long)]
    pub department: Option<String>,

    #[arg(long, value_enum, default_value = "price-per-area")]
    pub metric: MetricArg,

    /// Number of municipalities to keep
    #[arg(long, default_value_t = 10)]
    pub limit: usize,

    /// Lowest values first
    #[arg(long)]
    pub ascending: bool,
}

#[derive(Args)]
pub struct CommunesArgs {
    /// Part of a municipality code or name
    #[arg(long)]
    pub search: String,

    #[arg(long, default_value_t = DEFAULT_SEARCH_LIMIT)]
    pub limit: usize,
}

// ---------------------------------------------------------------------------
// Scope resolution
// ---------------------------------------------------------------------------

struct Scope<'a> {
    table: Cow<'a, MarketTable>,
    municipality: Option<String>,
}

impl MarketArgs {
    fn resolve<'a>(
        &self,
        data: &'a ReferenceData,
    ) -> Result<Scope<'a>, Box<dyn std::error::Error>> {
        let table = match &self.department {
            Some(prefix) => Cow::Owned(data.market.department(prefix.trim())),
            None => Cow::Borrowed(&data.market),
        };
        let municipality = match &self.commune {
            Some(query) => Some(data.resolve_municipality(query)?),
            None => None,
        };
        Ok(Scope {
            table,
            municipality,
        })
    }
}

/// Wrap a market result with the municipality it describes.
fn envelope<T: Serialize>(
    data: &ReferenceData,
    municipality: Option<&str>,
    result: T,
) -> Result<Value, Box<dyn std::error::Error>> {
    Ok(json!({
        "municipality": municipality,
        "name": municipality.map(|code| data.display_name(code)),
        "result": serde_json::to_value(result)?,
    }))
}

// ---------------------------------------------------------------------------
// Commands
// ---------------------------------------------------------------------------

pub fn run_evolution(
    args: MarketArgs,
    config: &ReferenceConfig,
) -> Result<Value, Box<dyn std::error::Error>> {
    evolution(&args, reference_data(config))
}

pub fn run_trend(
    args: MarketArgs,
    config: &ReferenceConfig,
) -> Result<Value, Box<dyn std::error::Error>> {
    trend(&args, reference_data(config))
}

pub fn run_liquidity(
    args: MarketArgs,
    config: &ReferenceConfig,
) -> Result<Value, Box<dyn std::error::Error>> {
    liquidity(&args, reference_data(config))
}

pub fn run_stats(
    args: MarketStatsArgs,
    config: &ReferenceConfig,
) -> Result<Value, Box<dyn std::error::Error>> {
    stats(&args, reference_data(config))
}

pub fn run_score(
    args: ScoreArgs,
    config: &ReferenceConfig,
) -> Result<Value, Box<dyn std::error::Error>> {
    score(&args, reference_data(config))
}

pub fn run_compare_price(
    args: ComparePriceArgs,
    config: &ReferenceConfig,
) -> Result<Value, Box<dyn std::error::Error>> {
    if args.price_per_area <= Decimal::ZERO {
        return Err("--price-per-area must be positive".into());
    }
    compare_price(&args, reference_data(config))
}

pub fn run_recommend(
    args: RecommendArgs,
    config: &ReferenceConfig,
) -> Result<Value, Box<dyn std::error::Error>> {
    if args.price_per_area <= Decimal::ZERO || args.surface <= Decimal::ZERO {
        return Err("--price-per-area and --surface must be positive".into());
    }
    recommend(&args, reference_data(config))
}

pub fn run_similar(
    args: SimilarArgs,
    config: &ReferenceConfig,
) -> Result<Value, Box<dyn std::error::Error>> {
    if args.tolerance < Decimal::ZERO || args.tolerance > Decimal::ONE {
        return Err("--tolerance must lie between 0 and 1".into());
    }
    similar(&args, reference_data(config))
}

pub fn run_top_communes(
    args: TopCommunesArgs,
    config: &ReferenceConfig,
) -> Result<Value, Box<dyn std::error::Error>> {
    top_communes(&args, reference_data(config))
}

pub fn run_communes(
    args: CommunesArgs,
    config: &ReferenceConfig,
) -> Result<Value, Box<dyn std::error::Error>> {
    communes(&args, reference_data(config))
}

fn evolution(args: &MarketArgs, data: &ReferenceData) -> Result<Value, Box<dyn std::error::Error>> {
    let scope = args.resolve(data)?;
    let code = scope.municipality.as_deref();
    envelope(data, code, market_evolution(&scope.table, code))
}

fn trend(args: &MarketArgs, data: &ReferenceData) -> Result<Value, Box<dyn std::error::Error>> {
    let scope = args.resolve(data)?;
    let code = scope.municipality.as_deref();
    envelope(data, code, analyze_price_trends(&scope.table, code))
}

fn liquidity(args: &MarketArgs, data: &ReferenceData) -> Result<Value, Box<dyn std::error::Error>> {
    let scope = args.resolve(data)?;
    let code = scope.municipality.as_deref();
    envelope(data, code, market_liquidity(&scope.table, code))
}

fn stats(
    args: &MarketStatsArgs,
    data: &ReferenceData,
) -> Result<Value, Box<dyn std::error::Error>> {
    let scope = args.scope.resolve(data)?;
    let code = scope.municipality.as_deref();
    envelope(data, code, market_stats(&scope.table, code, args.kind.into()))
}

fn score(args: &ScoreArgs, data: &ReferenceData) -> Result<Value, Box<dyn std::error::Error>> {
    let code = data.resolve_municipality(&args.commune)?;
    envelope(data, Some(&code), market_score(&data.market, &code))
}

fn compare_price(
    args: &ComparePriceArgs,
    data: &ReferenceData,
) -> Result<Value, Box<dyn std::error::Error>> {
    let scope = args.scope.resolve(data)?;
    let code = scope.municipality.as_deref();
    envelope(
        data,
        code,
        compare_to_market(args.price_per_area, &scope.table, code),
    )
}

fn recommend(
    args: &RecommendArgs,
    data: &ReferenceData,
) -> Result<Value, Box<dyn std::error::Error>> {
    let code = data.resolve_municipality(&args.commune)?;
    let recommendation =
        investment_recommendation(&data.market, &code, args.price_per_area, args.surface);
    envelope(data, Some(&code), recommendation)
}

fn similar(args: &SimilarArgs, data: &ReferenceData) -> Result<Value, Box<dyn std::error::Error>> {
    let scope = args.scope.resolve(data)?;
    let code = scope.municipality.as_deref();
    let rows = similar_properties(args.surface, &scope.table, code, args.tolerance);
    envelope(data, code, rows)
}

fn top_communes(
    args: &TopCommunesArgs,
    data: &ReferenceData,
) -> Result<Value, Box<dyn std::error::Error>> {
    let table = match &args.department {
        Some(prefix) => Cow::Owned(data.market.department(prefix.trim())),
        None => Cow::Borrowed(&data.market),
    };

    let ranking: Vec<Value> =
        top_municipalities(&table, args.metric.into(), args.limit, args.ascending)
            .into_iter()
            .map(|row| {
                let name = data.display_name(&row.municipality).to_string();
                json!({
                    "municipality": row.municipality,
                    "name": name,
                    "value": row.value,
                    "transactions": row.transactions,
                })
            })
            .collect();
    Ok(json!({ "result": ranking }))
}

fn communes(args: &CommunesArgs, data: &ReferenceData) -> Result<Value, Box<dyn std::error::Error>> {
    if data.registry.is_empty() {
        return Err("No municipality registry loaded (set --communes or IMMO_COMMUNES_FILE)".into());
    }

    let matches: Vec<Value> = data
        .registry
        .search(&args.search, &data.available_codes(), args.limit)
        .into_iter()
        .map(|m| json!({ "code": m.code, "name": m.name, "display": m.display() }))
        .collect();
    Ok(json!({ "result": matches }))
}
