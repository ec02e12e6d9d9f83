use chrono::Local;
use clap::Subcommand;
use coindrop_core::stats;
use coindrop_core::storage::Database;
use serde::Serialize;

#[derive(Subcommand)]
pub enum StatsAction {
    /// Today's totals and per-activity breakdown
    Today,
    /// All-time totals
    All,
    /// Current and longest streak
    Streak,
}

#[derive(Serialize)]
struct TodayReport {
    focus_secs: u64,
    qualifies_for_streak: bool,
    breakdown: Vec<stats::ActivityBreakdown>,
}

#[derive(Serialize)]
struct StreakReport {
    current_streak: u32,
    longest_streak: u32,
    threshold_secs: u64,
}

pub fn run(action: StatsAction) -> Result<(), Box<dyn std::error::Error>> {
    let db = Database::open()?;
    let records = db.list_sessions()?;
    let today = Local::now().date_naive();

    match action {
        StatsAction::Today => {
            let report = TodayReport {
                focus_secs: stats::today_focus_secs(&records, today),
                qualifies_for_streak: stats::day_qualifies(&records, today),
                breakdown: stats::daily_breakdown(&records, today),
            };
            println!("{}", serde_json::to_string_pretty(&report)?);
        }
        StatsAction::All => {
            let totals = stats::totals(&records);
            println!("{}", serde_json::to_string_pretty(&totals)?);
        }
        StatsAction::Streak => {
            let report = StreakReport {
                current_streak: stats::current_streak(&records, today),
                longest_streak: stats::longest_streak(&records),
                threshold_secs: stats::STREAK_THRESHOLD_SECS,
            };
            println!("{}", serde_json::to_string_pretty(&report)?);
        }
    }
    Ok(())
}
