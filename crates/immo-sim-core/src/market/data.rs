use rust_decimal::Decimal;
use rust_decimal::MathematicalOps;
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;

use crate::types::{Area, Money, Rate};

/// Aggregated transactions of one municipality over one year.
///
/// Every measure is optional: reference files disagree on their columns and
/// cells that do not parse are kept as missing rather than dropped.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct MarketAggregate {
    /// Official municipality code
    pub municipality: String,
    #[serde(default)]
    pub year: Option<i32>,
    #[serde(default)]
    pub mean_price: Option<Money>,
    #[serde(default)]
    pub mean_price_per_area: Option<Money>,
    #[serde(default)]
    pub mean_surface: Option<Area>,
    /// Number of sales recorded
    #[serde(default)]
    pub transactions: Option<u64>,
    #[serde(default)]
    pub house_sales: Option<u64>,
    #[serde(default)]
    pub apartment_sales: Option<u64>,
    #[serde(default)]
    pub house_share: Option<Rate>,
    #[serde(default)]
    pub apartment_share: Option<Rate>,
}

impl MarketAggregate {
    /// mean price × transaction count, when both are known.
    pub fn volume(&self) -> Option<Money> {
        match (self.mean_price, self.transactions) {
            (Some(price), Some(count)) => Some(price * Decimal::from(count)),
            _ => None,
        }
    }
}

/// Read-only table of municipality-year aggregates.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct MarketTable {
    rows: Vec<MarketAggregate>,
}

impl MarketTable {
    pub fn new(rows: Vec<MarketAggregate>) -> Self {
        Self { rows }
    }

    pub fn rows(&self) -> &[MarketAggregate] {
        &self.rows
    }

    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    /// Rows of one municipality, or every row when `municipality` is `None`.
    pub fn select(&self, municipality: Option<&str>) -> Vec<&MarketAggregate> {
        match municipality {
            Some(code) => self.rows.iter().filter(|r| r.municipality == code).collect(),
            None => self.rows.iter().collect(),
        }
    }

    pub fn municipality(&self, code: &str) -> MarketTable {
        self.filtered(|r| r.municipality == code)
    }

    /// Rows whose municipality code starts with the department code ("75", "2A", "971").
    pub fn department(&self, prefix: &str) -> MarketTable {
        self.filtered(|r| r.municipality.starts_with(prefix))
    }

    /// Distinct municipality codes, sorted.
    pub fn municipalities(&self) -> Vec<String> {
        self.rows
            .iter()
            .map(|r| r.municipality.clone())
            .collect::<BTreeSet<_>>()
            .into_iter()
            .collect()
    }

    /// Distinct years present, sorted.
    pub fn years(&self) -> Vec<i32> {
        self.rows
            .iter()
            .filter_map(|r| r.year)
            .collect::<BTreeSet<_>>()
            .into_iter()
            .collect()
    }

    fn filtered(&self, keep: impl Fn(&MarketAggregate) -> bool) -> MarketTable {
        MarketTable {
            rows: self.rows.iter().filter(|r| keep(r)).cloned().collect(),
        }
    }
}

impl FromIterator<MarketAggregate> for MarketTable {
    fn from_iter<I: IntoIterator<Item = MarketAggregate>>(iter: I) -> Self {
        Self::new(iter.into_iter().collect())
    }
}

// ---------------------------------------------------------------------------
// Column statistics (missing values skipped)
// ---------------------------------------------------------------------------

pub(crate) fn present<I>(values: I) -> Vec<Decimal>
where
    I: IntoIterator<Item = Option<Decimal>>,
{
    values.into_iter().flatten().collect()
}

pub(crate) fn mean(values: &[Decimal]) -> Option<Decimal> {
    if values.is_empty() {
        return None;
    }
    let sum: Decimal = values.iter().copied().sum();
    Some(sum / Decimal::from(values.len()))
}

pub(crate) fn median(values: &[Decimal]) -> Option<Decimal> {
    if values.is_empty() {
        return None;
    }
    let mut sorted = values.to_vec();
    sorted.sort();
    let mid = sorted.len() / 2;
    if sorted.len() % 2 == 0 {
        Some((sorted[mid - 1] + sorted[mid]) / Decimal::TWO)
    } else {
        Some(sorted[mid])
    }
}

/// Sample standard deviation (n - 1); undefined below two values.
pub(crate) fn std_dev(values: &[Decimal]) -> Option<Decimal> {
    if values.len() < 2 {
        return None;
    }
    let m = mean(values)?;
    let sum_sq: Decimal = values.iter().map(|v| (*v - m) * (*v - m)).sum();
    (sum_sq / Decimal::from(values.len() - 1)).sqrt()
}

pub(crate) fn min(values: &[Decimal]) -> Option<Decimal> {
    values.iter().copied().min()
}

pub(crate) fn max(values: &[Decimal]) -> Option<Decimal> {
    values.iter().copied().max()
}
