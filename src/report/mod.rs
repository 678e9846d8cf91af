//! Results document generation.

pub mod results;

pub use results::{format_timestamp, validate_population, write_results};
