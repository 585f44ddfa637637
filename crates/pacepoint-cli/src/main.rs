use clap::{Parser, Subcommand};

mod commands;

#[derive(Parser)]
#[command(name = "pacepoint-cli", version, about = "Pacepoint CLI")]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Water intake tracking
    Water {
        #[command(subcommand)]
        action: commands::water::WaterAction,
    },
    /// Step counters and daily goal
    Steps {
        #[command(subcommand)]
        action: commands::steps::StepsAction,
    },
    /// Workout sessions
    Workout {
        #[command(subcommand)]
        action: commands::workout::WorkoutAction,
    },
    /// Points, streaks, and badges
    Rewards {
        #[command(subcommand)]
        action: commands::rewards::RewardsAction,
    },
    /// Configuration management
    Config {
        #[command(subcommand)]
        action: commands::config::ConfigAction,
    },
}

fn main() {
    let cli = Cli::parse();
    let result = match cli.command {
        Commands::Water { action } => commands::water::run(action),
        Commands::Steps { action } => commands::steps::run(action),
        Commands::Workout { action } => commands::workout::run(action),
        Commands::Rewards { action } => commands::rewards::run(action),
        Commands::Config { action } => commands::config::run(action),
    };

    if let Err(e) = result {
        eprintln!("error: {e}");
        std::process::exit(1);
    }
}
