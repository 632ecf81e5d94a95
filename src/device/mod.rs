//! Device layer for Razer Blade laptops.
//!
//! Transport, transaction engine, host-side state and the high-level
//! command interface.

pub mod engine;
pub mod laptop;
pub mod state;
pub mod transport;

pub use engine::{Exchange, Sequence, StepFault};
pub use laptop::RazerLaptop;
pub use state::{DeviceState, KeyMatrix, Rgb, Row, StateSnapshot};
pub use transport::{ControlTransport, HidTransport};
