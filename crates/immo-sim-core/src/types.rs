use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

/// All monetary values. Wraps Decimal to prevent accidental f64 usage.
pub type Money = Decimal;

/// Rates expressed as decimals (0.05 = 5%). Never as percentages.
pub type Rate = Decimal;

/// Surface areas in square metres.
pub type Area = Decimal;

/// Outcome of an analysis that depends on reference data which may be
/// missing or too thin to say anything.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "status", content = "data", rename_all = "snake_case")]
pub enum Assessment<T> {
    Available(T),
    InsufficientData,
}

impl<T> Assessment<T> {
    pub fn is_available(&self) -> bool {
        matches!(self, Assessment::Available(_))
    }

    pub fn as_available(&self) -> Option<&T> {
        match self {
            Assessment::Available(v) => Some(v),
            Assessment::InsufficientData => None,
        }
    }

    pub fn into_option(self) -> Option<T> {
        match self {
            Assessment::Available(v) => Some(v),
            Assessment::InsufficientData => None,
        }
    }
}

impl<T> From<Option<T>> for Assessment<T> {
    fn from(value: Option<T>) -> Self {
        match value {
            Some(v) => Assessment::Available(v),
            None => Assessment::InsufficientData,
        }
    }
}

/// Standard computation output envelope
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ComputationOutput<T: Serialize> {
    pub result: T,
    pub methodology: String,
    pub assumptions: serde_json::Value,
    pub warnings: Vec<String>,
    pub metadata: ComputationMetadata,
}

/// Metadata for every computation
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ComputationMetadata {
    pub version: String,
    pub computation_time_us: u64,
    pub precision: String,
}

/// Helper to wrap computation results with metadata
pub fn with_metadata<T: Serialize>(
    methodology: &str,
    assumptions: &impl Serialize,
    warnings: Vec<String>,
    elapsed_us: u64,
    result: T,
) -> ComputationOutput<T> {
    ComputationOutput {
        result,
        methodology: methodology.to_string(),
        assumptions: serde_json::to_value(assumptions).unwrap_or_default(),
        warnings,
        metadata: ComputationMetadata {
            version: env!("CARGO_PKG_VERSION").to_string(),
            computation_time_us: elapsed_us,
            precision: "rust_decimal_128bit".to_string(),
        },
    }
}
