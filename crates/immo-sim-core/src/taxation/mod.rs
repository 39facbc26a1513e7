//! Rental income tax regimes, progressive income tax and real-estate wealth tax.

pub mod brackets;
pub mod rental;

pub use rental::{compare_regimes, simulate_tax_regime, TaxRegimeId, TaxRegimeResult};
