//! Razer Laptop Control Library
//!
//! A Rust driver for the embedded controller of Razer Blade laptops.
//!
//! # Features
//!
//! - Manual or automatic fan speed, clamped to each model's range
//! - Power modes, including Custom with CPU/GPU boost levels
//! - Keyboard backlight brightness and per-key colour matrix
//! - Presets combining the above, stored in a JSON config file
//!
//! # Example
//!
//! ```no_run
//! use razer_laptop_control::device::{KeyMatrix, RazerLaptop, Rgb};
//! use razer_laptop_control::protocol::PowerMode;
//!
//! fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let laptop = RazerLaptop::open()?;
//!
//!     laptop.set_power_mode(PowerMode::Gaming)?;
//!     laptop.set_fan_rpm(4500)?;
//!     laptop.set_brightness(128)?;
//!     laptop.set_matrix(&KeyMatrix::filled(Rgb::new(0, 255, 0)))?;
//!
//!     println!("{}", laptop.get_state());
//!     Ok(())
//! }
//! ```

pub mod config;
pub mod device;
pub mod error;
pub mod protocol;
pub mod storage;
pub mod utils;

// Re-exports for convenience
pub use device::{KeyMatrix, RazerLaptop, Rgb};
pub use error::{ErrorKind, RazerError, Result};
pub use protocol::PowerMode;
