use clap::Subcommand;
use pacepoint_core::{Config, Database, StepsTracker};

use super::parse_or_today;

#[derive(Subcommand)]
pub enum StepsAction {
    /// Record a day's step counters
    Log {
        /// Total steps for the day, as reported by the device
        steps: u64,
        /// Distance walked in meters
        #[arg(long, default_value_t = 0.0)]
        distance_m: f64,
        /// Calories burned
        #[arg(long, default_value_t = 0.0)]
        calories: f64,
        /// User id
        #[arg(long, default_value = "local")]
        uid: String,
        /// Day as YYYY-MM-DD (default: today)
        #[arg(long)]
        date: Option<String>,
    },
    /// Show stored counters for a date range
    Range {
        /// First day (YYYY-MM-DD)
        from: String,
        /// Last day (YYYY-MM-DD)
        to: String,
        /// User id
        #[arg(long, default_value = "local")]
        uid: String,
    },
    /// Daily step goal
    Goal {
        #[command(subcommand)]
        action: GoalAction,
    },
}

#[derive(Subcommand)]
pub enum GoalAction {
    /// Show the goal in effect
    Get {
        /// User id
        #[arg(long, default_value = "local")]
        uid: String,
    },
    /// Set the daily goal
    Set {
        /// Steps per day
        goal: u64,
        /// User id
        #[arg(long, default_value = "local")]
        uid: String,
    },
}

pub fn run(action: StepsAction) -> Result<(), Box<dyn std::error::Error>> {
    let db = Database::open()?;
    let config = Config::load_or_default();
    let tracker = StepsTracker::new(&db, &config);

    match action {
        StepsAction::Log {
            steps,
            distance_m,
            calories,
            uid,
            date,
        } => {
            let date_key = parse_or_today(date.as_deref())?;
            let update = tracker.update(&uid, date_key, steps, distance_m, calories)?;
            println!("{}", serde_json::to_string_pretty(&update)?);
        }
        StepsAction::Range { from, to, uid } => {
            let days = tracker.range(&uid, from.parse()?, to.parse()?)?;
            println!("{}", serde_json::to_string_pretty(&days)?);
        }
        StepsAction::Goal { action } => match action {
            GoalAction::Get { uid } => {
                let goal = tracker.goal(&uid)?;
                println!("{goal}");
            }
            GoalAction::Set { goal, uid } => {
                tracker.set_goal(&uid, goal)?;
                println!("goal set to {goal}");
            }
        },
    }

    Ok(())
}
