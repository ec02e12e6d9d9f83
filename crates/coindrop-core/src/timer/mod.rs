//! Session timer and coin-collection control.

pub mod controller;
pub mod session;

pub use controller::FocusController;
pub use session::{SessionTimer, TimerState, CYCLE_MS, CYCLE_SECS};
