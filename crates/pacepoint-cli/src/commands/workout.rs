//! Workout session commands for CLI.

use clap::Subcommand;
use pacepoint_core::{Config, Database, RoutePoint, WorkoutLog, WorkoutMetrics};

use super::parse_or_today;

#[derive(Subcommand)]
pub enum WorkoutAction {
    /// Start a session
    Start {
        /// Workout kind (run, walk, ride, ...)
        #[arg(long, default_value = "run")]
        kind: String,
        /// User id
        #[arg(long, default_value = "local")]
        uid: String,
    },
    /// Append route points and counters to the active session
    Append {
        /// Session id
        id: String,
        /// Route point as "epoch_ms,lat,lng" (repeatable)
        #[arg(long = "point", value_parser = parse_route_point)]
        points: Vec<RoutePoint>,
        /// Distance covered so far in km
        #[arg(long, default_value_t = 0.0)]
        distance_km: f64,
        /// Steps taken so far
        #[arg(long, default_value_t = 0)]
        steps: u64,
        /// Calories burned so far
        #[arg(long, default_value_t = 0.0)]
        calories: f64,
        /// User id
        #[arg(long, default_value = "local")]
        uid: String,
    },
    /// Finish a session and collect the award
    Finish {
        /// Session id
        id: String,
        /// Total duration in seconds
        #[arg(long, default_value_t = 0)]
        duration_sec: u64,
        /// Total distance in km
        #[arg(long, default_value_t = 0.0)]
        distance_km: f64,
        /// Total steps
        #[arg(long, default_value_t = 0)]
        steps: u64,
        /// Total calories burned
        #[arg(long, default_value_t = 0.0)]
        calories: f64,
        /// Day the session counts toward, as YYYY-MM-DD (default: today)
        #[arg(long)]
        date: Option<String>,
        /// User id
        #[arg(long, default_value = "local")]
        uid: String,
    },
    /// Show the active session, if any
    Active {
        /// User id
        #[arg(long, default_value = "local")]
        uid: String,
    },
    /// List recent sessions, newest first
    List {
        /// Max sessions to show
        #[arg(long)]
        limit: Option<usize>,
        /// User id
        #[arg(long, default_value = "local")]
        uid: String,
    },
}

fn parse_route_point(raw: &str) -> Result<RoutePoint, String> {
    let parts: Vec<&str> = raw.split(',').collect();
    if parts.len() != 3 {
        return Err("expected \"epoch_ms,lat,lng\"".to_string());
    }
    let t = parts[0].trim().parse::<i64>().map_err(|e| e.to_string())?;
    let lat = parts[1].trim().parse::<f64>().map_err(|e| e.to_string())?;
    let lng = parts[2].trim().parse::<f64>().map_err(|e| e.to_string())?;
    Ok(RoutePoint { t, lat, lng })
}

pub fn run(action: WorkoutAction) -> Result<(), Box<dyn std::error::Error>> {
    let db = Database::open()?;
    let config = Config::load_or_default();
    let log = WorkoutLog::new(&db, &config);

    match action {
        WorkoutAction::Start { kind, uid } => {
            let workout = log.start(&uid, &kind)?;
            println!("Workout started: {}", workout.id);
            println!("{}", serde_json::to_string_pretty(&workout)?);
        }
        WorkoutAction::Append {
            id,
            points,
            distance_km,
            steps,
            calories,
            uid,
        } => {
            let metrics = WorkoutMetrics {
                duration_sec: 0,
                distance_km,
                steps,
                calories_kcal: calories,
            };
            let workout = log.append(&uid, &id, &points, metrics)?;
            println!("{}", serde_json::to_string_pretty(&workout)?);
        }
        WorkoutAction::Finish {
            id,
            duration_sec,
            distance_km,
            steps,
            calories,
            date,
            uid,
        } => {
            let date_key = parse_or_today(date.as_deref())?;
            let metrics = WorkoutMetrics {
                duration_sec,
                distance_km,
                steps,
                calories_kcal: calories,
            };
            let finish = log.finish(&uid, &id, date_key, metrics)?;
            println!("{}", serde_json::to_string_pretty(&finish)?);
        }
        WorkoutAction::Active { uid } => match log.active(&uid)? {
            Some(workout) => println!("{}", serde_json::to_string_pretty(&workout)?),
            None => println!("no active workout"),
        },
        WorkoutAction::List { limit, uid } => {
            let limit = limit.unwrap_or(config.activity.workout_list_limit);
            let workouts = log.recent(&uid, limit)?;
            println!("{}", serde_json::to_string_pretty(&workouts)?);
        }
    }

    Ok(())
}
