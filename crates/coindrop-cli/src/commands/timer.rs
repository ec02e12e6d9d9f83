use std::time::Duration;

use clap::Subcommand;
use coindrop_core::physics::{GravitySource, PhysicsEngine, SimulationBounds};
use coindrop_core::storage::Database;
use coindrop_core::{Config, FocusController};

#[derive(Subcommand)]
pub enum TimerAction {
    /// Run focus cycles in the foreground, collecting at the end
    Run {
        /// Number of 30 s cycles to run
        #[arg(long, default_value = "1")]
        cycles: u64,
    },
    /// Print current totals and timer defaults as JSON
    Status,
}

pub fn run(action: TimerAction) -> Result<(), Box<dyn std::error::Error>> {
    let db = Database::open()?;

    match action {
        TimerAction::Run { cycles } => run_session(&db, cycles),
        TimerAction::Status => {
            let mut controller = headless_controller(&db)?;
            controller.hydrate_from_log(&db)?;
            println!("{}", serde_json::to_string_pretty(&controller.snapshot())?);
            Ok(())
        }
    }
}

/// A headless session uses the pending-counter accounting path; there is
/// no renderer to animate coins for.
fn headless_controller(db: &Database) -> Result<FocusController, Box<dyn std::error::Error>> {
    let config = Config::load()?;
    let gravity = GravitySource::new();
    let mut engine = PhysicsEngine::new(gravity.handle());
    engine.configure(SimulationBounds::default());

    let mut controller = FocusController::new(engine, false);
    let activity = match db.selected_activity_id()? {
        Some(id) => db.get_activity(&id)?,
        None => None,
    };
    match activity {
        Some(activity) => controller.set_activity(&activity.name, &activity.glyph),
        None => controller.set_activity("Focus", &config.default_glyph),
    }
    Ok(controller)
}

fn run_session(db: &Database, cycles: u64) -> Result<(), Box<dyn std::error::Error>> {
    let mut controller = headless_controller(db)?;
    controller.hydrate_from_log(db)?;
    controller.timer_mut().start();
    log::info!("running {cycles} focus cycle(s)");

    while controller.timer().cycles_completed() < cycles {
        std::thread::sleep(Duration::from_millis(100));
        for event in controller.tick() {
            println!("{}", serde_json::to_string(&event)?);
        }
    }

    if let Some(event) = controller.collect(db)? {
        println!("{}", serde_json::to_string(&event)?);
    }
    // Let the deferred credit land before the final snapshot.
    std::thread::sleep(Duration::from_millis(350));
    for event in controller.tick() {
        println!("{}", serde_json::to_string(&event)?);
    }
    println!("{}", serde_json::to_string_pretty(&controller.snapshot())?);
    Ok(())
}
