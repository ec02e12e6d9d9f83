//! Wires the session timer to coin accounting and persistence.
//!
//! Cycle completions are routed to exactly one of two accounting paths,
//! selected once at construction by the `coin_animation` config flag:
//! either the physics engine spawns a visible coin, or a pending counter
//! is incremented. `collect()` drains whichever path is active.

use chrono::Utc;

use crate::events::Event;
use crate::physics::PhysicsEngine;
use crate::stats;
use crate::storage::Database;
use crate::{CoreError, Result};

use super::session::{now_ms, SessionTimer, CYCLE_SECS};

/// Delay between persisting a collection and crediting the visible
/// total-collected counter (collection animation window).
const CREDIT_DELAY_MS: u64 = 300;

/// A one-shot deferred credit. Stamped with the controller generation at
/// schedule time; a stale stamp at fire time means the controller was shut
/// down in between and the credit is silently dropped.
#[derive(Debug, Clone, Copy)]
struct DeferredCredit {
    fire_at_ms: u64,
    amount: u32,
    generation: u64,
}

/// Drives a focus session: countdown, coin spawning, collection, and the
/// deferred credit of the visible total.
#[derive(Debug)]
pub struct FocusController {
    timer: SessionTimer,
    physics: PhysicsEngine,
    coin_animation: bool,
    /// Coins completed but not yet collected (no-animation path only).
    pending: u32,
    total_collected: u64,
    deferred: Vec<DeferredCredit>,
    generation: u64,
    activity_name: String,
    activity_glyph: String,
}

impl FocusController {
    pub fn new(physics: PhysicsEngine, coin_animation: bool) -> Self {
        Self {
            timer: SessionTimer::new(),
            physics,
            coin_animation,
            pending: 0,
            total_collected: 0,
            deferred: Vec::new(),
            generation: 0,
            activity_name: String::new(),
            activity_glyph: "🪙".to_string(),
        }
    }

    // ── Queries ──────────────────────────────────────────────────────

    pub fn timer(&self) -> &SessionTimer {
        &self.timer
    }

    pub fn timer_mut(&mut self) -> &mut SessionTimer {
        &mut self.timer
    }

    pub fn physics(&self) -> &PhysicsEngine {
        &self.physics
    }

    /// The display loop steps the engine through this at the refresh rate.
    pub fn physics_mut(&mut self) -> &mut PhysicsEngine {
        &mut self.physics
    }

    pub fn total_collected(&self) -> u64 {
        self.total_collected
    }

    /// Coins ready to collect, whichever accounting path is active.
    pub fn pending_count(&self) -> u32 {
        if self.coin_animation {
            self.physics.token_count() as u32
        } else {
            self.pending
        }
    }

    pub fn snapshot(&self) -> Event {
        Event::StateSnapshot {
            state: self.timer.state(),
            elapsed_ms: self.timer.elapsed_ms(),
            cycle_ms: self.timer.cycle_ms(),
            today_focus_secs: self.timer.today_focus_secs(),
            pending_coins: self.pending_count(),
            total_collected: self.total_collected,
            at: Utc::now(),
        }
    }

    // ── Commands ─────────────────────────────────────────────────────

    /// Denormalized activity snapshot stamped onto collected records.
    pub fn set_activity(&mut self, name: &str, glyph: &str) {
        self.activity_name = name.to_string();
        self.activity_glyph = glyph.to_string();
    }

    /// Recompute the daily total and all-time collected count from the
    /// persisted log. Called once at startup; neither value is stored
    /// independently, which keeps them drift-free.
    pub fn hydrate_from_log(&mut self, db: &Database) -> Result<()> {
        let records = db.list_sessions()?;
        let today = chrono::Local::now().date_naive();
        self.timer
            .set_today_focus_secs(stats::today_focus_secs(&records, today));
        self.total_collected = stats::totals(&records).total_coins;
        Ok(())
    }

    /// Session tick (10 Hz in practice): advances the timer, routes cycle
    /// completions to the active accounting path, and fires due deferred
    /// credits.
    pub fn tick(&mut self) -> Vec<Event> {
        self.tick_at(now_ms())
    }

    pub fn tick_at(&mut self, now_ms: u64) -> Vec<Event> {
        let mut events = self.timer.tick_at(now_ms);

        let completions = events
            .iter()
            .filter(|e| matches!(e, Event::CycleCompleted { .. }))
            .count();
        for _ in 0..completions {
            if self.coin_animation {
                self.physics.spawn(&self.activity_glyph);
            } else {
                self.pending += 1;
            }
        }

        self.flush_deferred(now_ms, &mut events);
        events
    }

    /// Collect all pending coins: drains the active accounting path,
    /// writes exactly one session record synchronously, and schedules the
    /// visible-counter credit for ~0.3 s later. No-op when nothing is
    /// pending.
    pub fn collect(&mut self, db: &Database) -> Result<Option<Event>> {
        self.collect_at(now_ms(), db)
    }

    pub fn collect_at(&mut self, now_ms: u64, db: &Database) -> Result<Option<Event>> {
        let count = if self.coin_animation {
            self.physics.clear() as u32
        } else {
            std::mem::take(&mut self.pending)
        };
        if count == 0 {
            return Ok(None);
        }

        let duration_secs = count * CYCLE_SECS;
        let at = Utc::now();
        db.insert_session(
            &self.activity_name,
            &self.activity_glyph,
            count,
            duration_secs,
            at,
        )
        .map_err(CoreError::from)?;

        self.deferred.push(DeferredCredit {
            fire_at_ms: now_ms + CREDIT_DELAY_MS,
            amount: count,
            generation: self.generation,
        });
        log::debug!("collected {count} coins ({duration_secs} s)");

        Ok(Some(Event::CoinsCollected {
            count,
            duration_secs,
            at,
        }))
    }

    /// Stop the simulation and invalidate in-flight deferred credits.
    /// A credit coming due after shutdown is dropped, not applied.
    pub fn shutdown(&mut self) {
        self.generation += 1;
        self.physics.stop();
        self.timer.pause();
    }

    // ── Internal ─────────────────────────────────────────────────────

    fn flush_deferred(&mut self, now_ms: u64, events: &mut Vec<Event>) {
        let generation = self.generation;
        let mut credited = 0u64;
        self.deferred.retain(|credit| {
            if credit.fire_at_ms > now_ms {
                return true;
            }
            if credit.generation == generation {
                credited += credit.amount as u64;
            }
            false
        });
        if credited > 0 {
            self.total_collected += credited;
            events.push(Event::TotalCollectedChanged {
                total: self.total_collected,
                at: Utc::now(),
            });
        }
    }
}
