use rust_decimal::Decimal;
use rust_decimal_macros::dec;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use tracing::debug;

use crate::market::data::{mean, MarketTable};
use crate::types::{Area, Assessment, Money, Rate};

/// Slope (currency per area per year) above which a rise is "strong".
const STRONG_SLOPE: Decimal = dec!(50);

/// Market figures of one year, averaged across the selected rows.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct YearlyMarket {
    pub year: i32,
    pub mean_price: Option<Money>,
    pub mean_price_per_area: Option<Money>,
    pub mean_surface: Option<Area>,
    pub transactions: u64,
    /// Change from the previous year; `None` for the first year
    pub price_change: Option<Rate>,
    pub price_per_area_change: Option<Rate>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TrendDirection {
    StrongRise,
    ModerateRise,
    ModerateDecline,
    StrongDecline,
}

impl TrendDirection {
    pub fn from_slope(slope: Decimal) -> Self {
        if slope > STRONG_SLOPE {
            TrendDirection::StrongRise
        } else if slope > Decimal::ZERO {
            TrendDirection::ModerateRise
        } else if slope > -STRONG_SLOPE {
            TrendDirection::ModerateDecline
        } else {
            TrendDirection::StrongDecline
        }
    }

    pub fn label(&self) -> &'static str {
        match self {
            TrendDirection::StrongRise => "Strong rise",
            TrendDirection::ModerateRise => "Moderate rise",
            TrendDirection::ModerateDecline => "Moderate decline",
            TrendDirection::StrongDecline => "Strong decline",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TrendAnalysis {
    pub years_observed: usize,
    /// Average of the year-over-year price changes
    pub mean_price_change: Option<Rate>,
    pub mean_price_per_area_change: Option<Rate>,
    /// Least-squares slope of price per area against year
    pub slope: Option<Money>,
    /// `None` when fewer than two years carry a price per area
    pub direction: Option<TrendDirection>,
    pub evolution: Vec<YearlyMarket>,
}

/// Year-by-year averages with year-over-year changes.
pub fn market_evolution(
    table: &MarketTable,
    municipality: Option<&str>,
) -> Assessment<Vec<YearlyMarket>> {
    let rows = table.select(municipality);

    let mut by_year: BTreeMap<i32, Vec<_>> = BTreeMap::new();
    for row in rows {
        if let Some(year) = row.year {
            by_year.entry(year).or_default().push(row);
        }
    }
    if by_year.is_empty() {
        return Assessment::InsufficientData;
    }

    let mut evolution: Vec<YearlyMarket> = Vec::with_capacity(by_year.len());
    for (year, rows) in by_year {
        let prices: Vec<Decimal> = rows.iter().filter_map(|r| r.mean_price).collect();
        let per_area: Vec<Decimal> = rows.iter().filter_map(|r| r.mean_price_per_area).collect();
        let surfaces: Vec<Decimal> = rows.iter().filter_map(|r| r.mean_surface).collect();
        let transactions = rows.iter().filter_map(|r| r.transactions).sum();

        let mean_price = mean(&prices);
        let mean_price_per_area = mean(&per_area);
        let (price_change, price_per_area_change) = match evolution.last() {
            Some(prev) => (
                change(prev.mean_price, mean_price),
                change(prev.mean_price_per_area, mean_price_per_area),
            ),
            None => (None, None),
        };

        evolution.push(YearlyMarket {
            year,
            mean_price,
            mean_price_per_area,
            mean_surface: mean(&surfaces),
            transactions,
            price_change,
            price_per_area_change,
        });
    }

    Assessment::Available(evolution)
}

/// Classify the price-per-area trend. Needs at least two distinct years.
pub fn analyze_price_trends(
    table: &MarketTable,
    municipality: Option<&str>,
) -> Assessment<TrendAnalysis> {
    let evolution = match market_evolution(table, municipality) {
        Assessment::Available(e) if e.len() >= 2 => e,
        _ => {
            debug!(?municipality, "not enough years for a trend");
            return Assessment::InsufficientData;
        }
    };

    let price_changes: Vec<Decimal> = evolution.iter().filter_map(|y| y.price_change).collect();
    let per_area_changes: Vec<Decimal> = evolution
        .iter()
        .filter_map(|y| y.price_per_area_change)
        .collect();

    let points: Vec<(Decimal, Decimal)> = evolution
        .iter()
        .filter_map(|y| y.mean_price_per_area.map(|p| (Decimal::from(y.year), p)))
        .collect();
    let slope = linear_slope(&points);

    Assessment::Available(TrendAnalysis {
        years_observed: evolution.len(),
        mean_price_change: mean(&price_changes),
        mean_price_per_area_change: mean(&per_area_changes),
        slope,
        direction: slope.map(TrendDirection::from_slope),
        evolution,
    })
}

fn change(previous: Option<Decimal>, current: Option<Decimal>) -> Option<Rate> {
    match (previous, current) {
        (Some(p), Some(c)) if !p.is_zero() => Some((c - p) / p),
        _ => None,
    }
}

/// Ordinary least-squares slope of y on x.
fn linear_slope(points: &[(Decimal, Decimal)]) -> Option<Decimal> {
    if points.len() < 2 {
        return None;
    }
    let n = Decimal::from(points.len());
    let mean_x = points.iter().map(|(x, _)| *x).sum::<Decimal>() / n;
    let mean_y = points.iter().map(|(_, y)| *y).sum::<Decimal>() / n;

    let (num, den) = points
        .iter()
        .fold((Decimal::ZERO, Decimal::ZERO), |(num, den), (x, y)| {
            let dx = *x - mean_x;
            (num + dx * (*y - mean_y), den + dx * dx)
        });
    if den.is_zero() {
        None
    } else {
        Some(num / den)
    }
}
