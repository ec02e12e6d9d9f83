//! Device-tilt gravity input.
//!
//! A sensor callback arrives on its own thread and only ever overwrites a
//! single (gx, gy) slot. The slot is a pair of relaxed atomics holding f32
//! bits; a torn read across the pair (gx from one sample, gy from the next)
//! is tolerable for a gravity direction and accepted by design.

use std::sync::atomic::{AtomicU32, Ordering};
use std::sync::Arc;

use glam::Vec2;
use serde::{Deserialize, Serialize};

/// Screen orientation, used to remap raw device axes into the simulation
/// frame so simulated "down" tracks true gravity regardless of rotation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ScreenOrientation {
    #[default]
    Portrait,
    LandscapeLeft,
    LandscapeRight,
    UpsideDown,
}

/// Lock-free (gx, gy) slot shared between the sensor writer and the
/// simulation tick.
#[derive(Debug)]
pub struct SharedGravity {
    gx: AtomicU32,
    gy: AtomicU32,
}

impl SharedGravity {
    fn new(gx: f32, gy: f32) -> Self {
        Self {
            gx: AtomicU32::new(gx.to_bits()),
            gy: AtomicU32::new(gy.to_bits()),
        }
    }

    fn store(&self, g: Vec2) {
        self.gx.store(g.x.to_bits(), Ordering::Relaxed);
        self.gy.store(g.y.to_bits(), Ordering::Relaxed);
    }

    fn load(&self) -> Vec2 {
        Vec2::new(
            f32::from_bits(self.gx.load(Ordering::Relaxed)),
            f32::from_bits(self.gy.load(Ordering::Relaxed)),
        )
    }
}

/// Cloneable reader handed to the physics engine.
#[derive(Debug, Clone)]
pub struct GravityHandle {
    shared: Arc<SharedGravity>,
}

impl GravityHandle {
    /// Current normalized gravity direction in the simulation frame.
    pub fn current(&self) -> Vec2 {
        self.shared.load()
    }
}

/// Converts raw 3-axis gravity samples into a normalized 2D direction in
/// the simulation frame (+y is down). Without a sensor the direction stays
/// at the default (0, 1) and the simulation degrades to vertical gravity.
#[derive(Debug)]
pub struct GravitySource {
    shared: Arc<SharedGravity>,
    orientation: ScreenOrientation,
}

impl GravitySource {
    pub fn new() -> Self {
        Self {
            shared: Arc::new(SharedGravity::new(0.0, 1.0)),
            orientation: ScreenOrientation::Portrait,
        }
    }

    pub fn handle(&self) -> GravityHandle {
        GravityHandle {
            shared: Arc::clone(&self.shared),
        }
    }

    pub fn orientation(&self) -> ScreenOrientation {
        self.orientation
    }

    pub fn set_orientation(&mut self, orientation: ScreenOrientation) {
        self.orientation = orientation;
    }

    /// Ingest one raw sensor sample (device frame, unit-gravity scale).
    /// The z component is discarded; the in-plane components are remapped
    /// per the current screen orientation and clamped to [-1, 1].
    pub fn push_sample(&self, x: f32, y: f32, _z: f32) {
        let g = remap(self.orientation, x, y);
        self.shared
            .store(Vec2::new(g.x.clamp(-1.0, 1.0), g.y.clamp(-1.0, 1.0)));
    }

    /// Reset to straight-down gravity (sensor lost or unsubscribed).
    pub fn reset(&self) {
        self.shared.store(Vec2::new(0.0, 1.0));
    }
}

impl Default for GravitySource {
    fn default() -> Self {
        Self::new()
    }
}

/// Device frame: x right, y up (portrait). Simulation frame: +y down.
fn remap(orientation: ScreenOrientation, x: f32, y: f32) -> Vec2 {
    match orientation {
        ScreenOrientation::Portrait => Vec2::new(x, -y),
        ScreenOrientation::LandscapeLeft => Vec2::new(-y, -x),
        ScreenOrientation::LandscapeRight => Vec2::new(y, x),
        ScreenOrientation::UpsideDown => Vec2::new(-x, y),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_to_straight_down() {
        let source = GravitySource::new();
        assert_eq!(source.handle().current(), Vec2::new(0.0, 1.0));
    }

    #[test]
    fn portrait_sample_maps_down() {
        let source = GravitySource::new();
        // Device upright: raw gravity points along device -y.
        source.push_sample(0.0, -1.0, 0.0);
        let g = source.handle().current();
        assert!((g.x).abs() < 1e-6);
        assert!((g.y - 1.0).abs() < 1e-6);
    }

    #[test]
    fn landscape_left_sample_maps_down() {
        let mut source = GravitySource::new();
        source.set_orientation(ScreenOrientation::LandscapeLeft);
        // Device rotated 90 deg CCW: raw gravity points along device -x.
        source.push_sample(-1.0, 0.0, 0.0);
        let g = source.handle().current();
        assert!((g.y - 1.0).abs() < 1e-6);
    }

    #[test]
    fn upside_down_sample_maps_down() {
        let mut source = GravitySource::new();
        source.set_orientation(ScreenOrientation::UpsideDown);
        source.push_sample(0.0, 1.0, 0.0);
        let g = source.handle().current();
        assert!((g.y - 1.0).abs() < 1e-6);
    }

    #[test]
    fn components_clamped_to_unit_range() {
        let source = GravitySource::new();
        source.push_sample(3.0, 2.0, 0.0);
        let g = source.handle().current();
        assert!(g.x <= 1.0 && g.x >= -1.0);
        assert!(g.y <= 1.0 && g.y >= -1.0);
    }

    #[test]
    fn handle_sees_writes_from_source() {
        let source = GravitySource::new();
        let handle = source.handle();
        source.push_sample(0.5, -0.5, 0.0);
        assert_eq!(handle.current(), Vec2::new(0.5, 0.5));
        source.reset();
        assert_eq!(handle.current(), Vec2::new(0.0, 1.0));
    }
}
