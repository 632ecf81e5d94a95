//! EC control protocol for Razer Blade laptops.
//!
//! This module contains the report codec, command constants and builders,
//! per-model capability lookups, and the pacing windows the firmware needs.

pub mod capabilities;
pub mod commands;
pub mod report;
pub mod timing;

pub use commands::*;
pub use report::{CommandId, REPORT_LEN, Report, Status, TransactionId, checksum};
pub use timing::Pacing;
