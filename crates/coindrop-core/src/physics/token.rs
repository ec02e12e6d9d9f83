//! Simulation entity types.
//!
//! Tokens are owned and mutated exclusively by the engine's per-frame
//! update; renderers only ever see them through the read-only snapshot.

use glam::Vec2;
use serde::{Deserialize, Serialize};

/// Radius of every token in pixels. Mass is uniformly 1.0 and implicit.
pub const TOKEN_RADIUS: f32 = 24.0;

/// A simulated circular reward coin.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Token {
    pub id: u64,
    /// Emoji/glyph label for rendering.
    pub glyph: String,
    pub pos: Vec2,
    pub vel: Vec2,
    /// Rotation angle in radians.
    pub rotation: f32,
    /// Angular velocity in radians/sec.
    pub angular_vel: f32,
    /// Frozen out of active integration once settled.
    pub resting: bool,
    /// Consecutive qualifying frames toward the rest transition.
    pub rest_frames: u32,
}

impl Token {
    pub fn new(id: u64, glyph: impl Into<String>, pos: Vec2, vel: Vec2, angular_vel: f32) -> Self {
        Self {
            id,
            glyph: glyph.into(),
            pos,
            vel,
            rotation: 0.0,
            angular_vel,
            resting: false,
            rest_frames: 0,
        }
    }

    pub fn speed(&self) -> f32 {
        self.vel.length()
    }

    /// Wake a resting token with an initial velocity kick.
    pub fn wake(&mut self, kick: Vec2) {
        self.resting = false;
        self.rest_frames = 0;
        self.vel = kick;
    }

    /// Freeze the token in place.
    pub fn freeze(&mut self) {
        self.resting = true;
        self.vel = Vec2::ZERO;
        self.angular_vel = 0.0;
    }
}

/// Playfield rectangle. Set by the external layout on viewport resize.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct SimulationBounds {
    pub min: Vec2,
    pub max: Vec2,
}

impl SimulationBounds {
    pub fn new(min_x: f32, min_y: f32, max_x: f32, max_y: f32) -> Self {
        Self {
            min: Vec2::new(min_x, min_y),
            max: Vec2::new(max_x, max_y),
        }
    }

    pub fn width(&self) -> f32 {
        self.max.x - self.min.x
    }

    pub fn height(&self) -> f32 {
        self.max.y - self.min.y
    }

    pub fn center_x(&self) -> f32 {
        (self.min.x + self.max.x) / 2.0
    }
}

impl Default for SimulationBounds {
    fn default() -> Self {
        // Portrait phone viewport; replaced by `configure` on first layout.
        Self::new(0.0, 0.0, 390.0, 700.0)
    }
}
