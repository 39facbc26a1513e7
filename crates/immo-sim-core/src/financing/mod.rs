//! Acquisition cost, loan amortization and profitability ratios.

pub mod acquisition;
pub mod loan;
pub mod profitability;

pub use acquisition::PropertyAcquisition;
pub use loan::Financing;
