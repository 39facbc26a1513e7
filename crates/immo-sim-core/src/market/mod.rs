//! Analytics over yearly transaction aggregates per municipality.
//!
//! Every function is a pure read of a [`MarketTable`]. Missing or thin data
//! yields [`Assessment::InsufficientData`](crate::Assessment) instead of an error.

pub mod comparison;
pub mod data;
pub mod liquidity;
pub mod registry;
pub mod scoring;
pub mod trends;

pub use comparison::{
    compare_to_market, market_stats, similar_properties, top_municipalities, PriceComparison,
    PropertyKind, RankingMetric,
};
pub use data::{MarketAggregate, MarketTable};
pub use liquidity::{market_liquidity, LiquidityBand, MarketLiquidity};
pub use registry::MunicipalityRegistry;
pub use scoring::{investment_recommendation, market_score, InvestmentRecommendation, MarketScore};
pub use trends::{analyze_price_trends, market_evolution, TrendAnalysis, YearlyMarket};
