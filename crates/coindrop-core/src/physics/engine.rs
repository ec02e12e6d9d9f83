//! Rigid-body engine: integration, boundary and pairwise collision,
//! rest/sleep heuristic.
//!
//! The engine is caller-driven: the display loop calls `step(dt)` at the
//! refresh rate. Damping constants are calibrated to 60 Hz and applied per
//! tick; frame hitches are handled solely by the `dt` clamp. This keeps the
//! original per-frame feel rather than converting to continuous-time decay.

use glam::Vec2;
use rand::{Rng, SeedableRng};
use rand_pcg::Pcg32;

use super::gravity::GravityHandle;
use super::token::{SimulationBounds, Token, TOKEN_RADIUS};

/// World gravity in px/s^2 at full (unit) tilt.
pub const GRAVITY_SCALE: f32 = 1200.0;
/// Velocity retained along the collision normal on bounce.
pub const RESTITUTION: f32 = 0.65;
/// Tangential velocity bled on floor contact. Walls and ceiling do not
/// apply friction; the floor is the primary resting surface and the
/// asymmetry is intentional.
pub const FLOOR_FRICTION: f32 = 0.4;
/// Per-tick velocity damping (calibrated to 60 Hz).
pub const AIR_DAMPING: f32 = 0.995;
/// Per-tick angular velocity damping.
pub const SPIN_DAMPING: f32 = 0.98;
/// Speed below which a token may accumulate rest frames.
pub const REST_SPEED_THRESHOLD: f32 = 15.0;
/// Consecutive qualifying frames before a token freezes (0.5 s at 60 fps).
pub const REST_FRAMES_REQUIRED: u32 = 30;
/// Upper bound on a single step, to avoid instability on frame hitches.
pub const MAX_DT: f32 = 0.032;

/// Horizontal world gravity (px/s^2) that wakes resting tokens.
const WAKE_GRAVITY: f32 = 200.0;
/// Normalized horizontal tilt that wakes resting tokens.
const WAKE_TILT_X: f32 = 0.15;
/// Pairs closer than this are skipped to keep the collision normal finite.
const COLLISION_EPSILON: f32 = 0.001;
/// How far (normalized) gravity may deviate from straight down while
/// still counting as "level" for the sleep heuristic.
const LEVEL_TOLERANCE: f32 = 0.1;
/// Spawn jitter around the horizontal center, px.
const SPAWN_JITTER_X: f32 = 30.0;
/// Spawn height above the top bound, px.
const SPAWN_DROP_HEIGHT: f32 = 50.0;
/// Max initial spin magnitude, rad/s (120 deg/s).
const SPAWN_SPIN: f32 = 120.0 * std::f32::consts::PI / 180.0;

/// Owns the simulated tokens and advances them each frame under gravity,
/// boundary constraints, pairwise collision, and the sleep heuristic.
#[derive(Debug)]
pub struct PhysicsEngine {
    tokens: Vec<Token>,
    bounds: SimulationBounds,
    gravity: GravityHandle,
    running: bool,
    next_id: u64,
    rng: Pcg32,
}

impl PhysicsEngine {
    pub fn new(gravity: GravityHandle) -> Self {
        let seed = std::time::SystemTime::now()
            .duration_since(std::time::UNIX_EPOCH)
            .unwrap_or_default()
            .as_nanos() as u64;
        Self::with_seed(gravity, seed)
    }

    /// Seeded constructor for deterministic spawn jitter.
    pub fn with_seed(gravity: GravityHandle, seed: u64) -> Self {
        Self {
            tokens: Vec::new(),
            bounds: SimulationBounds::default(),
            gravity,
            running: false,
            next_id: 1,
            rng: Pcg32::seed_from_u64(seed),
        }
    }

    // ── Queries ──────────────────────────────────────────────────────

    /// Read-only token snapshot for rendering.
    pub fn tokens(&self) -> &[Token] {
        &self.tokens
    }

    pub fn token_count(&self) -> usize {
        self.tokens.len()
    }

    pub fn bounds(&self) -> SimulationBounds {
        self.bounds
    }

    pub fn is_running(&self) -> bool {
        self.running
    }

    // ── Commands ─────────────────────────────────────────────────────

    /// Replace the playfield bounds. Existing tokens may briefly lie
    /// outside the new rectangle; they are corrected on the next step.
    pub fn configure(&mut self, bounds: SimulationBounds) {
        self.bounds = bounds;
    }

    /// Idempotent: a running engine stays running.
    pub fn start(&mut self) {
        self.running = true;
    }

    /// Idempotent: a stopped engine stays stopped. `step` is a no-op
    /// while stopped.
    pub fn stop(&mut self) {
        self.running = false;
    }

    /// Drop a new token above the top bound with randomized velocity
    /// and spin. Token count is unbounded; the caller is expected to
    /// `clear()` periodically.
    pub fn spawn(&mut self, glyph: &str) -> u64 {
        let id = self.next_id;
        self.next_id += 1;
        let pos = Vec2::new(
            self.bounds.center_x() + self.rng.gen_range(-SPAWN_JITTER_X..=SPAWN_JITTER_X),
            self.bounds.min.y - SPAWN_DROP_HEIGHT,
        );
        let vel = Vec2::new(
            self.rng.gen_range(-50.0..=50.0),
            self.rng.gen_range(0.0..=100.0),
        );
        let spin = self.rng.gen_range(-SPAWN_SPIN..=SPAWN_SPIN);
        self.tokens.push(Token::new(id, glyph, pos, vel, spin));
        log::debug!("spawned token {id} ({} total)", self.tokens.len());
        id
    }

    /// Remove all tokens; returns the count removed. Atomic with respect
    /// to `step` -- a frame never observes a partial clear.
    pub fn clear(&mut self) -> usize {
        let removed = self.tokens.len();
        self.tokens.clear();
        removed
    }

    /// Advance the simulation by `dt` seconds (clamped to [`MAX_DT`]).
    pub fn step(&mut self, dt: f32) {
        if !self.running || self.tokens.is_empty() {
            return;
        }
        let dt = dt.min(MAX_DT);
        let g_dir = self.gravity.current();
        let g_world = g_dir * GRAVITY_SCALE;

        self.integrate(dt, g_dir, g_world);
        self.resolve_pairs();
        self.contain();
        self.settle(g_dir);
    }

    /// Wake checks, integration, and boundary resolution.
    fn integrate(&mut self, dt: f32, g_dir: Vec2, g_world: Vec2) {
        let lo = self.bounds.min + Vec2::splat(TOKEN_RADIUS);
        let hi = self.bounds.max - Vec2::splat(TOKEN_RADIUS);
        let tilted = g_world.x.abs() > WAKE_GRAVITY || g_dir.x.abs() > WAKE_TILT_X;

        for token in &mut self.tokens {
            if token.resting {
                if tilted {
                    token.wake(g_world * dt * 2.0);
                } else {
                    continue;
                }
            }

            token.vel += g_world * dt;
            token.vel *= AIR_DAMPING;
            token.pos += token.vel * dt;
            token.rotation += token.angular_vel * dt;
            token.angular_vel *= SPIN_DAMPING;

            // Side walls: reflect and reverse-halve the spin.
            if token.pos.x < lo.x {
                token.pos.x = lo.x;
                token.vel.x = -token.vel.x * RESTITUTION;
                token.angular_vel = -token.angular_vel * 0.5;
            } else if token.pos.x > hi.x {
                token.pos.x = hi.x;
                token.vel.x = -token.vel.x * RESTITUTION;
                token.angular_vel = -token.angular_vel * 0.5;
            }

            // Ceiling: plain reflection, no friction.
            if token.pos.y < lo.y {
                token.pos.y = lo.y;
                token.vel.y = -token.vel.y * RESTITUTION;
            } else if token.pos.y > hi.y {
                // Floor: reflect only when moving downward, and bleed
                // tangential energy.
                token.pos.y = hi.y;
                if token.vel.y > 0.0 {
                    token.vel.y = -token.vel.y * RESTITUTION;
                }
                token.vel.x *= 1.0 - FLOOR_FRICTION;
                token.angular_vel *= 0.7;
            }
        }
    }

    /// Single-pass impulse solver over unordered pairs. Shallow overlaps
    /// only, so no iterative relaxation.
    fn resolve_pairs(&mut self) {
        let n = self.tokens.len();
        for i in 0..n {
            for j in (i + 1)..n {
                let (left, right) = self.tokens.split_at_mut(j);
                let a = &mut left[i];
                let b = &mut right[0];
                if a.resting && b.resting {
                    continue;
                }

                let delta = b.pos - a.pos;
                let dist = delta.length();
                if dist >= 2.0 * TOKEN_RADIUS || dist <= COLLISION_EPSILON {
                    continue;
                }

                let normal = delta / dist;
                let half_overlap = (2.0 * TOKEN_RADIUS - dist) * 0.5;
                // Resting members act as immovable walls in the exchange.
                if !a.resting {
                    a.pos -= normal * half_overlap;
                }
                if !b.resting {
                    b.pos += normal * half_overlap;
                }

                let rel = a.vel - b.vel;
                let dvn = rel.dot(normal);
                if dvn > 0.0 {
                    let impulse = normal * (dvn * (1.0 + RESTITUTION) * 0.5);
                    if !a.resting {
                        a.vel -= impulse;
                    }
                    if !b.resting {
                        b.vel += impulse;
                    }
                    a.rest_frames = 0;
                    b.rest_frames = 0;

                    // Small tangential kick so collisions read as lively.
                    let tangent = Vec2::new(-normal.y, normal.x);
                    let spin = 0.1 * rel.dot(tangent) * 2.0;
                    a.angular_vel += spin;
                    b.angular_vel -= spin;
                }
            }
        }
    }

    /// Position-only containment: pairwise separation can push a token
    /// past a wall, and bounds may have shrunk since the last frame.
    fn contain(&mut self) {
        let lo = self.bounds.min + Vec2::splat(TOKEN_RADIUS);
        let hi = self.bounds.max - Vec2::splat(TOKEN_RADIUS);
        for token in &mut self.tokens {
            token.pos = token.pos.clamp(lo, hi);
        }
    }

    /// Sleep heuristic: slow, touching a boundary, device level.
    fn settle(&mut self, g_dir: Vec2) {
        let lo = self.bounds.min + Vec2::splat(TOKEN_RADIUS);
        let hi = self.bounds.max - Vec2::splat(TOKEN_RADIUS);
        let level = (g_dir - Vec2::new(0.0, 1.0)).length() < LEVEL_TOLERANCE;

        for token in &mut self.tokens {
            if token.resting {
                continue;
            }
            let touching = token.pos.x <= lo.x + 1.0
                || token.pos.x >= hi.x - 1.0
                || token.pos.y <= lo.y + 1.0
                || token.pos.y >= hi.y - 1.0;

            if level && touching && token.speed() < REST_SPEED_THRESHOLD {
                token.rest_frames += 1;
                if token.rest_frames >= REST_FRAMES_REQUIRED {
                    token.freeze();
                }
            } else {
                // Biased decay: one qualifying frame is undone by roughly
                // two frames of disqualification.
                token.rest_frames = token.rest_frames.saturating_sub(2);
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::physics::gravity::GravitySource;
    use proptest::prelude::*;

    const DT: f32 = 1.0 / 60.0;

    fn zero_gravity_engine() -> (GravitySource, PhysicsEngine) {
        let source = GravitySource::new();
        source.push_sample(0.0, 0.0, 0.0);
        let mut engine = PhysicsEngine::with_seed(source.handle(), 7);
        engine.configure(SimulationBounds::new(0.0, 0.0, 1000.0, 1000.0));
        engine.start();
        (source, engine)
    }

    fn level_gravity_engine() -> (GravitySource, PhysicsEngine) {
        let source = GravitySource::new();
        let mut engine = PhysicsEngine::with_seed(source.handle(), 7);
        engine.configure(SimulationBounds::new(0.0, 0.0, 400.0, 700.0));
        engine.start();
        (source, engine)
    }

    fn place(engine: &mut PhysicsEngine, pos: Vec2, vel: Vec2) {
        let id = engine.next_id;
        engine.next_id += 1;
        engine.tokens.push(Token::new(id, "🪙", pos, vel, 0.0));
    }

    #[test]
    fn free_flight_applies_only_air_damping() {
        let (_source, mut engine) = zero_gravity_engine();
        place(&mut engine, Vec2::new(500.0, 500.0), Vec2::new(120.0, -60.0));

        engine.step(DT);

        let token = &engine.tokens()[0];
        assert!((token.vel.x - 120.0 * AIR_DAMPING).abs() < 1e-4);
        assert!((token.vel.y - -60.0 * AIR_DAMPING).abs() < 1e-4);
    }

    #[test]
    fn positions_stay_within_bounds() {
        let (_source, mut engine) = level_gravity_engine();
        for _ in 0..8 {
            engine.spawn("🪙");
        }
        let bounds = engine.bounds();
        for _ in 0..600 {
            engine.step(DT);
            for token in engine.tokens() {
                assert!(token.pos.x >= bounds.min.x + TOKEN_RADIUS - 1e-3);
                assert!(token.pos.x <= bounds.max.x - TOKEN_RADIUS + 1e-3);
                assert!(token.pos.y >= bounds.min.y + TOKEN_RADIUS - 1e-3);
                assert!(token.pos.y <= bounds.max.y - TOKEN_RADIUS + 1e-3);
            }
        }
    }

    #[test]
    fn overlapping_pair_separates() {
        let (_source, mut engine) = zero_gravity_engine();
        place(&mut engine, Vec2::new(500.0, 500.0), Vec2::ZERO);
        place(&mut engine, Vec2::new(510.0, 500.0), Vec2::ZERO);

        let before = (engine.tokens[1].pos - engine.tokens[0].pos).length();
        engine.step(DT);
        let after = (engine.tokens[1].pos - engine.tokens[0].pos).length();

        assert!(after > before);
        assert!(after >= 2.0 * TOKEN_RADIUS - 1e-3);
    }

    #[test]
    fn degenerate_overlap_is_skipped() {
        let (_source, mut engine) = zero_gravity_engine();
        place(&mut engine, Vec2::new(500.0, 500.0), Vec2::ZERO);
        place(&mut engine, Vec2::new(500.0, 500.0), Vec2::ZERO);

        // Identical centers: no finite normal, pair skipped this frame.
        engine.step(DT);
        for token in engine.tokens() {
            assert!(token.pos.is_finite());
            assert!(token.vel.is_finite());
        }
    }

    #[test]
    fn floor_token_falls_asleep_and_tilt_wakes_it() {
        let (source, mut engine) = level_gravity_engine();
        let floor_y = engine.bounds().max.y - TOKEN_RADIUS;
        place(&mut engine, Vec2::new(200.0, floor_y), Vec2::ZERO);

        for _ in 0..120 {
            engine.step(DT);
        }
        let token = &engine.tokens()[0];
        assert!(token.resting);
        assert_eq!(token.vel, Vec2::ZERO);
        assert_eq!(token.angular_vel, 0.0);

        // Sharp tilt wakes it within one frame.
        source.push_sample(0.5, -0.8, 0.0);
        engine.step(DT);
        assert!(!engine.tokens()[0].resting);
    }

    #[test]
    fn resting_token_skips_integration_while_level() {
        let (_source, mut engine) = level_gravity_engine();
        let floor_y = engine.bounds().max.y - TOKEN_RADIUS;
        place(&mut engine, Vec2::new(200.0, floor_y), Vec2::ZERO);
        for _ in 0..120 {
            engine.step(DT);
        }
        let frozen_pos = engine.tokens()[0].pos;

        for _ in 0..60 {
            engine.step(DT);
        }
        assert_eq!(engine.tokens()[0].pos, frozen_pos);
    }

    #[test]
    fn clear_returns_count_then_zero() {
        let (_source, mut engine) = level_gravity_engine();
        for _ in 0..5 {
            engine.spawn("🪙");
        }
        assert_eq!(engine.clear(), 5);
        assert_eq!(engine.clear(), 0);
        assert!(engine.tokens().is_empty());
    }

    #[test]
    fn start_stop_are_idempotent() {
        let (_source, mut engine) = level_gravity_engine();
        engine.start();
        engine.start();
        assert!(engine.is_running());
        engine.stop();
        engine.stop();
        assert!(!engine.is_running());

        // Stopped engine does not advance tokens.
        engine.spawn("🪙");
        let pos = engine.tokens()[0].pos;
        engine.step(DT);
        assert_eq!(engine.tokens()[0].pos, pos);
    }

    #[test]
    fn spawn_jitter_stays_near_center() {
        let (_source, mut engine) = level_gravity_engine();
        let center = engine.bounds().center_x();
        for _ in 0..20 {
            engine.spawn("🪙");
        }
        for token in engine.tokens() {
            assert!((token.pos.x - center).abs() <= SPAWN_JITTER_X + 1e-3);
            assert_eq!(token.pos.y, engine.bounds.min.y - SPAWN_DROP_HEIGHT);
            assert!(token.vel.x.abs() <= 50.0);
            assert!((0.0..=100.0).contains(&token.vel.y));
        }
    }

    proptest! {
        #[test]
        fn bounds_hold_under_random_drops(
            xs in proptest::collection::vec(-200.0f32..600.0, 1..6),
            vys in proptest::collection::vec(-300.0f32..300.0, 1..6),
        ) {
            let (_source, mut engine) = level_gravity_engine();
            let n = xs.len().min(vys.len());
            for k in 0..n {
                place(&mut engine, Vec2::new(xs[k], 100.0), Vec2::new(0.0, vys[k]));
            }
            let bounds = engine.bounds();
            for _ in 0..240 {
                engine.step(DT);
            }
            for token in engine.tokens() {
                prop_assert!(token.pos.x >= bounds.min.x + TOKEN_RADIUS - 1e-3);
                prop_assert!(token.pos.x <= bounds.max.x - TOKEN_RADIUS + 1e-3);
                prop_assert!(token.pos.y <= bounds.max.y - TOKEN_RADIUS + 1e-3);
            }
        }
    }
}
