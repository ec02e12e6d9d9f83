//! # Coindrop Core Library
//!
//! Core logic for the Coindrop focus timer: every completed 30-second
//! focus cycle drops a physically simulated coin; collected coins become
//! persisted session records that feed streak and statistics views.
//!
//! ## Architecture
//!
//! - **Physics**: a caller-driven rigid-body engine stepped at the display
//!   refresh rate, fed a tilt-derived gravity vector
//! - **Timer**: a wall-clock-based state machine that requires the caller
//!   to periodically invoke `tick()` for progress and cycle completion
//! - **Stats**: pure streak/aggregate computation over the session log
//! - **Storage**: SQLite session/activity storage and TOML configuration
//!
//! ## Key Components
//!
//! - [`PhysicsEngine`]: coin simulation (gravity, collisions, sleep)
//! - [`GravitySource`]: device-tilt to simulation-frame gravity
//! - [`SessionTimer`]: countdown state machine
//! - [`FocusController`]: cycle completion, collection, deferred credit
//! - [`Database`]: session and activity persistence

pub mod error;
pub mod events;
pub mod physics;
pub mod stats;
pub mod storage;
pub mod timer;

pub use error::{ConfigError, CoreError, DatabaseError, Result};
pub use events::Event;
pub use physics::{
    GravityHandle, GravitySource, PhysicsEngine, ScreenOrientation, SimulationBounds, Token,
    TOKEN_RADIUS,
};
pub use storage::{Activity, Config, Database, FocusSessionRecord};
pub use timer::{FocusController, SessionTimer, TimerState, CYCLE_MS, CYCLE_SECS};
