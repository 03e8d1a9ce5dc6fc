//! Data module - CSV loading, caching and typed datasets

mod loader;
mod period;
mod schema;

pub use loader::{DataUnavailable, TableCache};
pub use period::Quarter;
pub use schema::{load_typed, CountyGrowthRecord, CountyQuarterRecord, LoanAgeRecord};
