use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::timer::TimerState;

/// Every observable state change in the core produces an Event.
/// The GUI polls for events; a notification layer may translate the
/// `CycleTick` / `CycleCompleted` / `TotalCollectedChanged` pulses into
/// user-facing alerts or haptics.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "type")]
pub enum Event {
    TimerStarted {
        cycle_ms: u64,
        at: DateTime<Utc>,
    },
    TimerPaused {
        elapsed_ms: u64,
        at: DateTime<Utc>,
    },
    TimerReset {
        at: DateTime<Utc>,
    },
    /// A whole-second boundary crossed while running.
    CycleTick {
        today_focus_secs: u64,
        at: DateTime<Utc>,
    },
    /// One 30 s cycle finished; one coin was spawned (or queued as pending).
    CycleCompleted {
        cycles_completed: u64,
        at: DateTime<Utc>,
    },
    /// A batch of coins was collected and persisted.
    CoinsCollected {
        count: u32,
        duration_secs: u32,
        at: DateTime<Utc>,
    },
    /// The visible total-collected counter changed (fires after the
    /// deferred credit interval, not at collection time).
    TotalCollectedChanged {
        total: u64,
        at: DateTime<Utc>,
    },
    StateSnapshot {
        state: TimerState,
        elapsed_ms: u64,
        cycle_ms: u64,
        today_focus_secs: u64,
        pending_coins: u32,
        total_collected: u64,
        at: DateTime<Utc>,
    },
}
