use rust_decimal::Decimal;
use rust_decimal_macros::dec;
use serde::{Deserialize, Serialize};
use std::cmp::Ordering;
use std::collections::BTreeMap;

use crate::market::data::{max, mean, median, min, present, std_dev, MarketAggregate, MarketTable};
use crate::types::{Area, Assessment, Money, Rate};

/// Surface tolerance used when looking for comparable sales.
pub const DEFAULT_SIMILARITY_TOLERANCE: Rate = dec!(0.20);

// ---------------------------------------------------------------------------
// Price comparison
// ---------------------------------------------------------------------------

/// Where a price per area sits relative to the market median.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PricePositioning {
    WellBelowMarket,
    BelowMarket,
    AtMarket,
    AboveMarket,
}

impl PricePositioning {
    /// <0.8× median, <1.0×, <1.2×, above.
    pub fn classify(price_per_area: Money, median: Money) -> Self {
        if price_per_area < median * dec!(0.8) {
            PricePositioning::WellBelowMarket
        } else if price_per_area < median {
            PricePositioning::BelowMarket
        } else if price_per_area < median * dec!(1.2) {
            PricePositioning::AtMarket
        } else {
            PricePositioning::AboveMarket
        }
    }

    pub fn label(&self) -> &'static str {
        match self {
            PricePositioning::WellBelowMarket => "Well below market",
            PricePositioning::BelowMarket => "Below market",
            PricePositioning::AtMarket => "At market",
            PricePositioning::AboveMarket => "Above market",
        }
    }

    pub fn evaluation(&self) -> &'static str {
        match self {
            PricePositioning::WellBelowMarket => "Excellent price",
            PricePositioning::BelowMarket => "Good price",
            PricePositioning::AtMarket => "Fair price",
            PricePositioning::AboveMarket => "High price",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PriceComparison {
    pub price_per_area: Money,
    pub market_mean: Money,
    pub market_median: Money,
    /// Undefined for a single observation
    pub market_std_dev: Option<Money>,
    /// (price - mean) / mean
    pub deviation: Rate,
    pub positioning: PricePositioning,
}

/// Compare a candidate price per area with the observed market.
pub fn compare_to_market(
    price_per_area: Money,
    table: &MarketTable,
    municipality: Option<&str>,
) -> Assessment<PriceComparison> {
    let values = present(
        table
            .select(municipality)
            .into_iter()
            .map(|r| r.mean_price_per_area),
    );

    let (market_mean, market_median) = match (mean(&values), median(&values)) {
        (Some(m), Some(md)) if m > Decimal::ZERO => (m, md),
        _ => return Assessment::InsufficientData,
    };

    Assessment::Available(PriceComparison {
        price_per_area,
        market_mean,
        market_median,
        market_std_dev: std_dev(&values),
        deviation: (price_per_area - market_mean) / market_mean,
        positioning: PricePositioning::classify(price_per_area, market_median),
    })
}

// ---------------------------------------------------------------------------
// Descriptive statistics
// ---------------------------------------------------------------------------

/// Restricts statistics to rows where a kind of property sold.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PropertyKind {
    #[default]
    All,
    Houses,
    Apartments,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MarketStats {
    pub rows: usize,
    pub mean_price: Option<Money>,
    pub median_price: Option<Money>,
    pub min_price: Option<Money>,
    pub max_price: Option<Money>,
    pub mean_price_per_area: Option<Money>,
    pub median_price_per_area: Option<Money>,
    pub min_price_per_area: Option<Money>,
    pub max_price_per_area: Option<Money>,
    pub mean_surface: Option<Area>,
    pub median_surface: Option<Area>,
    pub total_transactions: u64,
}

pub fn market_stats(
    table: &MarketTable,
    municipality: Option<&str>,
    kind: PropertyKind,
) -> Assessment<MarketStats> {
    let rows: Vec<&MarketAggregate> = table
        .select(municipality)
        .into_iter()
        .filter(|r| match kind {
            PropertyKind::All => true,
            PropertyKind::Houses => r.house_sales.unwrap_or(0) > 0,
            PropertyKind::Apartments => r.apartment_sales.unwrap_or(0) > 0,
        })
        .collect();
    if rows.is_empty() {
        return Assessment::InsufficientData;
    }

    let prices = present(rows.iter().map(|r| r.mean_price));
    let per_area = present(rows.iter().map(|r| r.mean_price_per_area));
    let surfaces = present(rows.iter().map(|r| r.mean_surface));

    Assessment::Available(MarketStats {
        rows: rows.len(),
        mean_price: mean(&prices),
        median_price: median(&prices),
        min_price: min(&prices),
        max_price: max(&prices),
        mean_price_per_area: mean(&per_area),
        median_price_per_area: median(&per_area),
        min_price_per_area: min(&per_area),
        max_price_per_area: max(&per_area),
        mean_surface: mean(&surfaces),
        median_surface: median(&surfaces),
        total_transactions: rows.iter().filter_map(|r| r.transactions).sum(),
    })
}

/// Rows whose mean surface lies within ±`tolerance` of `surface`, bounds included.
pub fn similar_properties(
    surface: Area,
    table: &MarketTable,
    municipality: Option<&str>,
    tolerance: Rate,
) -> Vec<MarketAggregate> {
    let low = surface * (Decimal::ONE - tolerance);
    let high = surface * (Decimal::ONE + tolerance);
    table
        .select(municipality)
        .into_iter()
        .filter(|r| r.mean_surface.is_some_and(|s| s >= low && s <= high))
        .cloned()
        .collect()
}

/// Column used to rank municipalities.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RankingMetric {
    #[default]
    PricePerArea,
    Price,
    Surface,
    Transactions,
}

impl RankingMetric {
    fn value(&self, row: &MarketAggregate) -> Option<Decimal> {
        match self {
            RankingMetric::PricePerArea => row.mean_price_per_area,
            RankingMetric::Price => row.mean_price,
            RankingMetric::Surface => row.mean_surface,
            RankingMetric::Transactions => row.transactions.map(Decimal::from),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MunicipalityRanking {
    pub municipality: String,
    /// Mean of the metric across the municipality's rows
    pub value: Decimal,
    pub transactions: u64,
}

/// The `n` municipalities with the highest (or lowest) mean of `metric`.
pub fn top_municipalities(
    table: &MarketTable,
    metric: RankingMetric,
    n: usize,
    ascending: bool,
) -> Vec<MunicipalityRanking> {
    let mut groups: BTreeMap<&str, (Vec<Decimal>, u64)> = BTreeMap::new();
    for row in table.rows() {
        let entry = groups.entry(row.municipality.as_str()).or_default();
        if let Some(v) = metric.value(row) {
            entry.0.push(v);
        }
        entry.1 += row.transactions.unwrap_or(0);
    }

    let mut ranking: Vec<MunicipalityRanking> = groups
        .into_iter()
        .filter_map(|(code, (values, transactions))| {
            mean(&values).map(|value| MunicipalityRanking {
                municipality: code.to_string(),
                value,
                transactions,
            })
        })
        .collect();

    ranking.sort_by(|a, b| {
        let order = a.value.cmp(&b.value);
        let order = if ascending { order } else { order.reverse() };
        match order {
            Ordering::Equal => a.municipality.cmp(&b.municipality),
            other => other,
        }
    });
    ranking.truncate(n);
    ranking
}
