use clap::Subcommand;
use pacepoint_core::{Config, Database, RewardEngine};

#[derive(Subcommand)]
pub enum RewardsAction {
    /// Points total, streaks, and latest badges
    Summary {
        /// User id
        #[arg(long, default_value = "local")]
        uid: String,
    },
    /// Reward event history, newest first
    History {
        /// Max events to show
        #[arg(long)]
        limit: Option<usize>,
        /// User id
        #[arg(long, default_value = "local")]
        uid: String,
    },
    /// All earned badges, newest first
    Badges {
        /// User id
        #[arg(long, default_value = "local")]
        uid: String,
    },
}

pub fn run(action: RewardsAction) -> Result<(), Box<dyn std::error::Error>> {
    let db = Database::open()?;
    let config = Config::load_or_default();
    let engine = RewardEngine::with_config(&db, config.rewards.clone());

    match action {
        RewardsAction::Summary { uid } => {
            let summary = engine.summary(&uid)?;
            println!("{}", serde_json::to_string_pretty(&summary)?);
        }
        RewardsAction::History { limit, uid } => {
            let limit = limit.unwrap_or(config.activity.history_limit);
            let events = engine.history(&uid, limit)?;
            println!("{}", serde_json::to_string_pretty(&events)?);
        }
        RewardsAction::Badges { uid } => {
            let badges = engine.badges(&uid)?;
            println!("{}", serde_json::to_string_pretty(&badges)?);
        }
    }

    Ok(())
}
