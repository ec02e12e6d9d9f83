//! Single-cycle countdown state machine.
//!
//! The timer is wall-clock based and has no internal thread -- the caller
//! invokes `tick()` periodically (100 ms granularity in practice; cycle
//! boundaries are detected within one tick's error).
//!
//! ## State Transitions
//!
//! ```text
//! Idle -> Running -> (Paused) -> Idle
//! ```
//!
//! Pausing preserves `elapsed`; reset zeroes it.

use chrono::Utc;
use serde::{Deserialize, Serialize};

use crate::events::Event;

/// One focus cycle: 30 seconds. Completion spawns/credits one coin.
pub const CYCLE_MS: u64 = 30_000;
pub const CYCLE_SECS: u32 = 30;

/// How long the "just completed" pulse stays observable.
const COMPLETION_PULSE_MS: u64 = 100;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TimerState {
    Idle,
    Running,
    Paused,
}

/// Core countdown timer.
///
/// Operates on wall-clock deltas; every command and the tick have `_at`
/// variants taking an explicit epoch-ms clock so tests can drive time.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SessionTimer {
    state: TimerState,
    /// Elapsed time within the current cycle, 0 <= elapsed < CYCLE_MS
    /// between ticks.
    elapsed_ms: u64,
    cycle_ms: u64,
    /// Epoch ms when the timer was last started/resumed/ticked.
    #[serde(default)]
    last_tick_epoch_ms: Option<u64>,
    /// Sub-second remainder toward the next whole-second credit.
    #[serde(default)]
    second_acc_ms: u64,
    /// Running daily focus total. Recomputed from the session log at
    /// startup, never persisted on its own.
    today_focus_secs: u64,
    cycles_completed: u64,
    /// Transient completion pulse, auto-clearing after ~100 ms.
    #[serde(default)]
    just_completed_until_ms: Option<u64>,
}

impl SessionTimer {
    pub fn new() -> Self {
        Self {
            state: TimerState::Idle,
            elapsed_ms: 0,
            cycle_ms: CYCLE_MS,
            last_tick_epoch_ms: None,
            second_acc_ms: 0,
            today_focus_secs: 0,
            cycles_completed: 0,
            just_completed_until_ms: None,
        }
    }

    // ── Queries ──────────────────────────────────────────────────────

    pub fn state(&self) -> TimerState {
        self.state
    }

    pub fn is_running(&self) -> bool {
        self.state == TimerState::Running
    }

    pub fn elapsed_ms(&self) -> u64 {
        self.elapsed_ms
    }

    pub fn cycle_ms(&self) -> u64 {
        self.cycle_ms
    }

    pub fn today_focus_secs(&self) -> u64 {
        self.today_focus_secs
    }

    pub fn cycles_completed(&self) -> u64 {
        self.cycles_completed
    }

    /// 0.0 .. 1.0 progress within the current cycle.
    pub fn progress(&self) -> f64 {
        self.elapsed_ms as f64 / self.cycle_ms as f64
    }

    /// Whether the one-shot completion pulse is still observable.
    pub fn just_completed(&self) -> bool {
        self.just_completed_at(now_ms())
    }

    pub fn just_completed_at(&self, now_ms: u64) -> bool {
        self.just_completed_until_ms.is_some_and(|until| now_ms < until)
    }

    /// Seed the daily total from the persisted log at startup.
    pub fn set_today_focus_secs(&mut self, secs: u64) {
        self.today_focus_secs = secs;
    }

    // ── Commands ─────────────────────────────────────────────────────

    pub fn start(&mut self) -> Option<Event> {
        self.start_at(now_ms())
    }

    pub fn start_at(&mut self, now_ms: u64) -> Option<Event> {
        match self.state {
            TimerState::Idle | TimerState::Paused => {
                self.state = TimerState::Running;
                self.last_tick_epoch_ms = Some(now_ms);
                Some(Event::TimerStarted {
                    cycle_ms: self.cycle_ms,
                    at: Utc::now(),
                })
            }
            TimerState::Running => None, // Already running.
        }
    }

    pub fn pause(&mut self) -> Option<Event> {
        self.pause_at(now_ms())
    }

    pub fn pause_at(&mut self, now_ms: u64) -> Option<Event> {
        match self.state {
            TimerState::Running => {
                // Time folded in at pause counts toward the daily total,
                // same as a regular tick.
                self.today_focus_secs += self.flush_at(now_ms);
                self.state = TimerState::Paused;
                self.last_tick_epoch_ms = None;
                Some(Event::TimerPaused {
                    elapsed_ms: self.elapsed_ms,
                    at: Utc::now(),
                })
            }
            _ => None,
        }
    }

    pub fn reset(&mut self) -> Option<Event> {
        self.state = TimerState::Idle;
        self.elapsed_ms = 0;
        self.second_acc_ms = 0;
        self.last_tick_epoch_ms = None;
        self.just_completed_until_ms = None;
        Some(Event::TimerReset { at: Utc::now() })
    }

    /// Call periodically while running. Yields a `CycleTick` when one or
    /// more whole-second boundaries were crossed and a `CycleCompleted`
    /// per finished cycle.
    pub fn tick(&mut self) -> Vec<Event> {
        self.tick_at(now_ms())
    }

    pub fn tick_at(&mut self, now_ms: u64) -> Vec<Event> {
        let mut events = Vec::new();
        if self.state != TimerState::Running {
            return events;
        }

        let crossed = self.flush_at(now_ms);
        if crossed > 0 {
            self.today_focus_secs += crossed;
            events.push(Event::CycleTick {
                today_focus_secs: self.today_focus_secs,
                at: Utc::now(),
            });
        }

        // Subtract rather than zero so a late tick's overshoot carries
        // into the next cycle; the residual stays below one tick.
        while self.elapsed_ms >= self.cycle_ms {
            self.elapsed_ms -= self.cycle_ms;
            self.cycles_completed += 1;
            self.just_completed_until_ms = Some(now_ms + COMPLETION_PULSE_MS);
            events.push(Event::CycleCompleted {
                cycles_completed: self.cycles_completed,
                at: Utc::now(),
            });
        }
        events
    }

    // ── Internal ─────────────────────────────────────────────────────

    /// Fold the wall-clock delta into `elapsed_ms`; returns the number of
    /// whole-second boundaries crossed.
    fn flush_at(&mut self, now_ms: u64) -> u64 {
        let Some(last) = self.last_tick_epoch_ms else {
            return 0;
        };
        let delta = now_ms.saturating_sub(last);
        self.last_tick_epoch_ms = Some(now_ms);
        self.elapsed_ms += delta;
        self.second_acc_ms += delta;
        let crossed = self.second_acc_ms / 1000;
        self.second_acc_ms %= 1000;
        crossed
    }
}

impl Default for SessionTimer {
    fn default() -> Self {
        Self::new()
    }
}

pub(crate) fn now_ms() -> u64 {
    std::time::SystemTime::now()
        .duration_since(std::time::UNIX_EPOCH)
        .unwrap_or_default()
        .as_millis() as u64
}
