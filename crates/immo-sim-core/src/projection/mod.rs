//! Multi-year simulation of a buy-to-let investment and saved scenarios.

pub mod investment;
pub mod scenarios;

pub use investment::{
    analyze_investment, project_investment, InvestmentAnalysis, InvestmentInput,
    InvestmentProjection, OperatingAssumptions, YearProjection, MAX_HORIZON_YEARS,
};
pub use scenarios::{ScenarioBook, ScenarioSnapshot};
