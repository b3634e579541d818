//! Validation functionality
//!
//! Provides the report tree shared by every validation routine. The checks
//! themselves live next to the definitions they inspect (`flight::validate`,
//! `flight::entity`, `flight::property`).

pub mod report;

pub use report::{LogLevel, ValidationReport};
