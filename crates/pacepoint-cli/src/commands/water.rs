use clap::Subcommand;
use pacepoint_core::{Config, Database, WaterTracker};

use super::parse_or_today;

#[derive(Subcommand)]
pub enum WaterAction {
    /// Record a day's water total in milliliters
    Log {
        /// New daily total in ml, as reported by the device
        ml: u64,
        /// User id
        #[arg(long, default_value = "local")]
        uid: String,
        /// Day as YYYY-MM-DD (default: today)
        #[arg(long)]
        date: Option<String>,
    },
    /// Show stored totals for a date range
    Range {
        /// First day (YYYY-MM-DD)
        from: String,
        /// Last day (YYYY-MM-DD)
        to: String,
        /// User id
        #[arg(long, default_value = "local")]
        uid: String,
    },
}

pub fn run(action: WaterAction) -> Result<(), Box<dyn std::error::Error>> {
    let db = Database::open()?;
    let config = Config::load_or_default();
    let tracker = WaterTracker::new(&db, &config);

    match action {
        WaterAction::Log { ml, uid, date } => {
            let date_key = parse_or_today(date.as_deref())?;
            let update = tracker.update(&uid, date_key, ml)?;
            println!("{}", serde_json::to_string_pretty(&update)?);
        }
        WaterAction::Range { from, to, uid } => {
            let days = tracker.range(&uid, from.parse()?, to.parse()?)?;
            println!("{}", serde_json::to_string_pretty(&days)?);
        }
    }

    Ok(())
}
