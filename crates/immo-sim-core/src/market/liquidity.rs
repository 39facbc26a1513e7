use rust_decimal::Decimal;
use rust_decimal_macros::dec;
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;

use crate::market::data::MarketTable;
use crate::types::{Assessment, Money};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum LiquidityBand {
    VeryLiquid,
    Liquid,
    ModeratelyLiquid,
    Illiquid,
}

impl LiquidityBand {
    /// >100 very liquid, >50 liquid, >20 moderately liquid, else illiquid.
    pub fn from_transactions_per_year(per_year: Decimal) -> Self {
        if per_year > dec!(100) {
            LiquidityBand::VeryLiquid
        } else if per_year > dec!(50) {
            LiquidityBand::Liquid
        } else if per_year > dec!(20) {
            LiquidityBand::ModeratelyLiquid
        } else {
            LiquidityBand::Illiquid
        }
    }

    pub fn label(&self) -> &'static str {
        match self {
            LiquidityBand::VeryLiquid => "Very liquid",
            LiquidityBand::Liquid => "Liquid",
            LiquidityBand::ModeratelyLiquid => "Moderately liquid",
            LiquidityBand::Illiquid => "Illiquid",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MarketLiquidity {
    pub total_transactions: u64,
    pub years_observed: usize,
    /// Zero when no row carries a year
    pub transactions_per_year: Decimal,
    /// Σ mean price × transactions over the rows
    pub market_volume: Money,
    pub band: LiquidityBand,
}

pub fn market_liquidity(
    table: &MarketTable,
    municipality: Option<&str>,
) -> Assessment<MarketLiquidity> {
    let rows = table.select(municipality);
    if rows.is_empty() {
        return Assessment::InsufficientData;
    }

    let total_transactions: u64 = rows.iter().filter_map(|r| r.transactions).sum();
    let years_observed = rows
        .iter()
        .filter_map(|r| r.year)
        .collect::<BTreeSet<_>>()
        .len();
    let transactions_per_year = if years_observed == 0 {
        Decimal::ZERO
    } else {
        Decimal::from(total_transactions) / Decimal::from(years_observed)
    };
    let market_volume: Money = rows.iter().filter_map(|r| r.volume()).sum();

    Assessment::Available(MarketLiquidity {
        total_transactions,
        years_observed,
        transactions_per_year,
        market_volume,
        band: LiquidityBand::from_transactions_per_year(transactions_per_year),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::market::data::MarketAggregate;

    fn row(year: Option<i32>, price: Decimal, n: u64) -> MarketAggregate {
        MarketAggregate {
            municipality: "31555".into(),
            year,
            mean_price: Some(price),
            transactions: Some(n),
            ..Default::default()
        }
    }

    #[test]
    fn test_transactions_per_distinct_year() {
        let table = MarketTable::new(vec![
            row(Some(2022), dec!(200000), 60),
            row(Some(2022), dec!(180000), 40),
            row(Some(2023), dec!(210000), 110),
        ]);
        let l = market_liquidity(&table, Some("31555")).into_option().unwrap();
        assert_eq!(l.total_transactions, 210);
        assert_eq!(l.years_observed, 2);
        assert_eq!(l.transactions_per_year, dec!(105));
        assert_eq!(l.band, LiquidityBand::VeryLiquid);
        assert_eq!(l.market_volume, dec!(42300000));
    }

    #[test]
    fn test_band_boundaries_are_exclusive() {
        assert_eq!(LiquidityBand::from_transactions_per_year(dec!(100)), LiquidityBand::Liquid);
        assert_eq!(LiquidityBand::from_transactions_per_year(dec!(50)), LiquidityBand::ModeratelyLiquid);
        assert_eq!(LiquidityBand::from_transactions_per_year(dec!(20)), LiquidityBand::Illiquid);
    }

    #[test]
    fn test_rows_without_year() {
        let table = MarketTable::new(vec![row(None, dec!(100000), 30)]);
        let l = market_liquidity(&table, None).into_option().unwrap();
        assert_eq!(l.transactions_per_year, Decimal::ZERO);
        assert_eq!(l.band, LiquidityBand::Illiquid);
    }

    #[test]
    fn test_unknown_municipality() {
        let table = MarketTable::new(vec![row(Some(2022), dec!(100000), 30)]);
        assert_eq!(market_liquidity(&table, Some("00000")), Assessment::InsufficientData);
    }
}
