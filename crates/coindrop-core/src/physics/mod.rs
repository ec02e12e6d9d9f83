//! Real-time 2D rigid-body simulation for collected coins.

pub mod engine;
pub mod gravity;
pub mod token;

pub use engine::PhysicsEngine;
pub use gravity::{GravityHandle, GravitySource, ScreenOrientation};
pub use token::{SimulationBounds, Token, TOKEN_RADIUS};
