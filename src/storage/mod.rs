//! Settings storage and persistence module.
//!
//! Handles saving and loading the user config to/from disk.

pub mod settings;

pub use settings::*;
