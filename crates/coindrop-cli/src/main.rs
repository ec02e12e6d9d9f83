use clap::{Parser, Subcommand};

mod commands;

#[derive(Parser)]
#[command(name = "coindrop-cli", version, about = "Coindrop CLI")]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Timer control
    Timer {
        #[command(subcommand)]
        action: commands::timer::TimerAction,
    },
    /// Session statistics and streaks
    Stats {
        #[command(subcommand)]
        action: commands::stats::StatsAction,
    },
    /// Activity management
    Activity {
        #[command(subcommand)]
        action: commands::activity::ActivityAction,
    },
}

fn main() {
    env_logger::init();
    let cli = Cli::parse();
    let result = match cli.command {
        Commands::Timer { action } => commands::timer::run(action),
        Commands::Stats { action } => commands::stats::run(action),
        Commands::Activity { action } => commands::activity::run(action),
    };
    if let Err(e) = result {
        eprintln!("error: {e}");
        std::process::exit(1);
    }
}
