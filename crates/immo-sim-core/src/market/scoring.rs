use rust_decimal::Decimal;
use rust_decimal_macros::dec;
use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

use crate::market::comparison::{
    compare_to_market, similar_properties, PriceComparison, DEFAULT_SIMILARITY_TOLERANCE,
};
use crate::market::data::{mean, present, std_dev, MarketTable};
use crate::market::liquidity::{market_liquidity, LiquidityBand};
use crate::market::trends::{analyze_price_trends, TrendAnalysis};
use crate::types::{Area, Assessment, Money, Rate};

pub const MAX_SCORE: u32 = 100;

/// Price deviation from the market mean beyond which the recommendation moves.
const PRICE_ADJUSTMENT_THRESHOLD: Rate = dec!(0.20);
const PRICE_ADJUSTMENT_POINTS: i64 = 10;

// ---------------------------------------------------------------------------
// Types
// ---------------------------------------------------------------------------

/// Raw measurements the composite score is built from.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ScoreInputs {
    pub liquidity: LiquidityBand,
    /// Average yearly change of the price per area; missing counts as flat
    pub mean_price_per_area_change: Option<Rate>,
    pub market_volume: Money,
    /// std-dev / mean of the price per area
    pub coefficient_of_variation: Option<Rate>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct SubScores {
    /// Out of 25
    pub liquidity: u32,
    /// Out of 35
    pub trend: u32,
    /// Out of 20
    pub volume: u32,
    /// Out of 20
    pub stability: u32,
}

impl SubScores {
    pub fn total(&self) -> u32 {
        self.liquidity + self.trend + self.volume + self.stability
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MarketRating {
    Excellent,
    Good,
    Fair,
    Average,
    Difficult,
}

impl MarketRating {
    pub fn from_score(score: u32) -> Self {
        match score {
            85.. => MarketRating::Excellent,
            70..=84 => MarketRating::Good,
            55..=69 => MarketRating::Fair,
            40..=54 => MarketRating::Average,
            _ => MarketRating::Difficult,
        }
    }

    pub fn label(&self) -> &'static str {
        match self {
            MarketRating::Excellent => "Excellent market",
            MarketRating::Good => "Good market",
            MarketRating::Fair => "Fair market",
            MarketRating::Average => "Average market",
            MarketRating::Difficult => "Difficult market",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MarketScore {
    /// 0 to 100
    pub score: u32,
    pub rating: MarketRating,
    pub components: SubScores,
    pub inputs: ScoreInputs,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RecommendationTier {
    StronglyRecommended,
    Recommended,
    ToConsider,
    Caution,
    NotRecommended,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Severity {
    Success,
    Warning,
    Error,
}

impl RecommendationTier {
    pub fn from_score(score: u32) -> Self {
        match score {
            80.. => RecommendationTier::StronglyRecommended,
            65..=79 => RecommendationTier::Recommended,
            50..=64 => RecommendationTier::ToConsider,
            35..=49 => RecommendationTier::Caution,
            _ => RecommendationTier::NotRecommended,
        }
    }

    pub fn severity(&self) -> Severity {
        match self {
            RecommendationTier::StronglyRecommended | RecommendationTier::Recommended => {
                Severity::Success
            }
            RecommendationTier::ToConsider | RecommendationTier::Caution => Severity::Warning,
            RecommendationTier::NotRecommended => Severity::Error,
        }
    }

    pub fn label(&self) -> &'static str {
        match self {
            RecommendationTier::StronglyRecommended => "Strongly recommended",
            RecommendationTier::Recommended => "Recommended",
            RecommendationTier::ToConsider => "To consider",
            RecommendationTier::Caution => "Caution advised",
            RecommendationTier::NotRecommended => "Not recommended",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct InvestmentRecommendation {
    /// Market score adjusted for the asking price, clamped to 0..=100
    pub score: u32,
    pub tier: RecommendationTier,
    pub severity: Severity,
    pub market: MarketScore,
    pub comparison: Assessment<PriceComparison>,
    pub trend: Assessment<TrendAnalysis>,
    pub surface: Area,
    /// Rows of the municipality with a mean surface within ±20%
    pub similar_count: usize,
}

// ---------------------------------------------------------------------------
// Sub-scores
// ---------------------------------------------------------------------------

fn liquidity_points(band: LiquidityBand) -> u32 {
    match band {
        LiquidityBand::VeryLiquid => 25,
        LiquidityBand::Liquid => 20,
        LiquidityBand::ModeratelyLiquid => 15,
        LiquidityBand::Illiquid => 10,
    }
}

fn trend_points(change: Option<Rate>) -> u32 {
    let change = change.unwrap_or(Decimal::ZERO);
    if change > dec!(0.05) {
        35
    } else if change > dec!(0.02) {
        30
    } else if change > Decimal::ZERO {
        25
    } else if change > dec!(-0.02) {
        15
    } else {
        5
    }
}

fn volume_points(volume: Money) -> u32 {
    if volume >= dec!(10_000_000) {
        20
    } else if volume >= dec!(5_000_000) {
        15
    } else if volume >= dec!(1_000_000) {
        10
    } else {
        5
    }
}

fn stability_points(cv: Option<Rate>) -> u32 {
    match cv {
        Some(cv) if cv < dec!(0.10) => 20,
        Some(cv) if cv < dec!(0.20) => 15,
        Some(cv) if cv < dec!(0.30) => 10,
        _ => 5,
    }
}

// ---------------------------------------------------------------------------
// Public API
// ---------------------------------------------------------------------------

/// Combine the four measurements into a 0-100 score.
pub fn compose_score(inputs: ScoreInputs) -> MarketScore {
    let components = SubScores {
        liquidity: liquidity_points(inputs.liquidity),
        trend: trend_points(inputs.mean_price_per_area_change),
        volume: volume_points(inputs.market_volume),
        stability: stability_points(inputs.coefficient_of_variation),
    };
    let score = components.total().min(MAX_SCORE);

    MarketScore {
        score,
        rating: MarketRating::from_score(score),
        components,
        inputs,
    }
}

/// Composite attractiveness of one municipality's market.
pub fn market_score(table: &MarketTable, municipality: &str) -> Assessment<MarketScore> {
    let liquidity = match market_liquidity(table, Some(municipality)) {
        Assessment::Available(l) => l,
        Assessment::InsufficientData => {
            warn!(municipality, "no market data to score");
            return Assessment::InsufficientData;
        }
    };

    let trend = analyze_price_trends(table, Some(municipality));
    let per_area = present(
        table
            .select(Some(municipality))
            .into_iter()
            .map(|r| r.mean_price_per_area),
    );
    let coefficient_of_variation = match (std_dev(&per_area), mean(&per_area)) {
        (Some(sd), Some(m)) if m > Decimal::ZERO => Some(sd / m),
        _ => None,
    };

    let score = compose_score(ScoreInputs {
        liquidity: liquidity.band,
        mean_price_per_area_change: trend
            .as_available()
            .and_then(|t| t.mean_price_per_area_change),
        market_volume: liquidity.market_volume,
        coefficient_of_variation,
    });
    debug!(municipality, score = score.score, "market scored");

    Assessment::Available(score)
}

/// Move a market score by the price adjustment and clamp it to 0..=100.
pub fn adjust_for_price(market_score: u32, deviation: Option<Rate>) -> u32 {
    let adjustment = match deviation {
        Some(d) if d < -PRICE_ADJUSTMENT_THRESHOLD => PRICE_ADJUSTMENT_POINTS,
        Some(d) if d > PRICE_ADJUSTMENT_THRESHOLD => -PRICE_ADJUSTMENT_POINTS,
        _ => 0,
    };
    (i64::from(market_score) + adjustment).clamp(0, i64::from(MAX_SCORE)) as u32
}

/// Should a property at `price_per_area` in `municipality` be bought?
pub fn investment_recommendation(
    table: &MarketTable,
    municipality: &str,
    price_per_area: Money,
    surface: Area,
) -> Assessment<InvestmentRecommendation> {
    let market = match market_score(table, municipality) {
        Assessment::Available(m) => m,
        Assessment::InsufficientData => return Assessment::InsufficientData,
    };
    let comparison = compare_to_market(price_per_area, table, Some(municipality));
    let trend = analyze_price_trends(table, Some(municipality));
    let similar_count = similar_properties(
        surface,
        table,
        Some(municipality),
        DEFAULT_SIMILARITY_TOLERANCE,
    )
    .len();

    let score = adjust_for_price(
        market.score,
        comparison.as_available().map(|c| c.deviation),
    );
    let tier = RecommendationTier::from_score(score);

    Assessment::Available(InvestmentRecommendation {
        score,
        tier,
        severity: tier.severity(),
        market,
        comparison,
        trend,
        surface,
        similar_count,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::market::data::MarketAggregate;

    fn row(year: i32, per_area: Decimal, n: u64) -> MarketAggregate {
        MarketAggregate {
            municipality: "67482".into(),
            year: Some(year),
            mean_price: Some(per_area * dec!(60)),
            mean_price_per_area: Some(per_area),
            mean_surface: Some(dec!(60)),
            transactions: Some(n),
            ..Default::default()
        }
    }

    fn strong_market() -> MarketTable {
        MarketTable::new(vec![
            row(2021, dec!(3000), 150),
            row(2022, dec!(3200), 160),
            row(2023, dec!(3400), 170),
        ])
    }

    #[test]
    fn test_strong_market_scores_high() {
        let s = market_score(&strong_market(), "67482").into_option().unwrap();
        // 25 liquidity, 35 trend (> 5%/yr), 20 volume, 20 stability (cv ≈ 6%)
        assert_eq!(s.components.liquidity, 25);
        assert_eq!(s.components.trend, 35);
        assert_eq!(s.components.volume, 20);
        assert_eq!(s.components.stability, 20);
        assert_eq!(s.score, 100);
        assert_eq!(s.rating, MarketRating::Excellent);
    }

    #[test]
    fn test_single_row_scores_low_stability() {
        let table = MarketTable::new(vec![row(2023, dec!(1000), 5)]);
        let s = market_score(&table, "67482").into_option().unwrap();
        // Illiquid, no trend (flat), 300k volume, undefined CV
        assert_eq!(s.components, SubScores { liquidity: 10, trend: 15, volume: 5, stability: 5 });
        assert_eq!(s.score, 35);
        assert_eq!(s.rating, MarketRating::Difficult);
    }

    #[test]
    fn test_unknown_municipality_is_insufficient() {
        assert!(!market_score(&strong_market(), "99999").is_available());
        assert!(!investment_recommendation(&strong_market(), "99999", dec!(3000), dec!(60))
            .is_available());
    }

    #[test]
    fn test_rating_thresholds() {
        assert_eq!(MarketRating::from_score(85), MarketRating::Excellent);
        assert_eq!(MarketRating::from_score(84), MarketRating::Good);
        assert_eq!(MarketRating::from_score(55), MarketRating::Fair);
        assert_eq!(MarketRating::from_score(40), MarketRating::Average);
        assert_eq!(MarketRating::from_score(39), MarketRating::Difficult);
    }

    #[test]
    fn test_price_adjustment_clamped() {
        assert_eq!(adjust_for_price(95, Some(dec!(-0.25))), 100);
        assert_eq!(adjust_for_price(5, Some(dec!(0.25))), 0);
        assert_eq!(adjust_for_price(60, Some(dec!(-0.20))), 60);
        assert_eq!(adjust_for_price(60, None), 60);
    }

    #[test]
    fn test_overpriced_recommendation() {
        let r = investment_recommendation(&strong_market(), "67482", dec!(4500), dec!(60))
            .into_option()
            .unwrap();
        assert_eq!(r.score, 90);
        assert_eq!(r.tier, RecommendationTier::StronglyRecommended);
        assert_eq!(r.severity, Severity::Success);
        assert_eq!(r.similar_count, 3);
        assert!(r.trend.is_available());
    }

    #[test]
    fn test_tiers() {
        assert_eq!(RecommendationTier::from_score(65).severity(), Severity::Success);
        assert_eq!(RecommendationTier::from_score(50), RecommendationTier::ToConsider);
        assert_eq!(RecommendationTier::from_score(35).severity(), Severity::Warning);
        assert_eq!(RecommendationTier::from_score(34).severity(), Severity::Error);
    }
}
