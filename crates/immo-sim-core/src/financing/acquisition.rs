use rust_decimal::Decimal;
use rust_decimal_macros::dec;
use serde::{Deserialize, Serialize};

use crate::error::ImmoSimError;
use crate::types::{Area, Money, Rate};
use crate::ImmoSimResult;

/// Notary fee rate applied to existing (non-new-build) properties.
pub const DEFAULT_NOTARY_FEE_RATE: Rate = dec!(0.08);

fn default_notary_fee_rate() -> Rate {
    DEFAULT_NOTARY_FEE_RATE
}

/// Purchase side of an investment: the price paid and what it costs to
/// actually own the property.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PropertyAcquisition {
    /// Agreed purchase price
    pub price: Money,
    /// Living area in square metres
    pub surface: Area,
    /// Renovation budget spent at acquisition
    #[serde(default)]
    pub renovation_cost: Money,
    /// Notary fees as a fraction of the price (0.08 = 8%)
    #[serde(default = "default_notary_fee_rate")]
    pub notary_fee_rate: Rate,
}

impl PropertyAcquisition {
    pub fn new(price: Money, surface: Area) -> Self {
        Self {
            price,
            surface,
            renovation_cost: Decimal::ZERO,
            notary_fee_rate: DEFAULT_NOTARY_FEE_RATE,
        }
    }

    pub fn notary_fees(&self) -> Money {
        self.price * self.notary_fee_rate
    }

    /// Price plus renovation, before fees.
    pub fn price_with_renovation(&self) -> Money {
        self.price + self.renovation_cost
    }

    /// price + renovation + price × notary rate
    pub fn total_cost(&self) -> Money {
        self.price_with_renovation() + self.notary_fees()
    }

    /// Price per square metre, `None` for a zero surface.
    pub fn price_per_area(&self) -> Option<Money> {
        if self.surface.is_zero() {
            None
        } else {
            Some(self.price / self.surface)
        }
    }

    pub fn validate(&self) -> ImmoSimResult<()> {
        if self.price <= Decimal::ZERO {
            return Err(ImmoSimError::InvalidInput {
                field: "price".into(),
                reason: "Purchase price must be positive".into(),
            });
        }
        if self.surface < Decimal::ZERO {
            return Err(ImmoSimError::InvalidInput {
                field: "surface".into(),
                reason: "Surface cannot be negative".into(),
            });
        }
        if self.renovation_cost < Decimal::ZERO {
            return Err(ImmoSimError::InvalidInput {
                field: "renovation_cost".into(),
                reason: "Renovation cost cannot be negative".into(),
            });
        }
        if self.notary_fee_rate < Decimal::ZERO || self.notary_fee_rate >= Decimal::ONE {
            return Err(ImmoSimError::InvalidInput {
                field: "notary_fee_rate".into(),
                reason: "Notary fee rate must be between 0 and 1".into(),
            });
        }
        Ok(())
    }
}
