pub mod error;
pub mod financing;
pub mod time_value;
pub mod types;

#[cfg(feature = "taxation")]
pub mod taxation;

#[cfg(feature = "projection")]
pub mod projection;

#[cfg(feature = "market")]
pub mod market;

pub use error::ImmoSimError;
pub use types::*;

/// Standard result type for all immo-sim operations
pub type ImmoSimResult<T> = Result<T, ImmoSimError>;
