pub mod calculator;
pub mod costs;
pub mod snapshot;
pub mod types;
