pub mod financing;
pub mod investment;
pub mod market;
pub mod tax;
