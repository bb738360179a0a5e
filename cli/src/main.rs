mod commands;
mod config;

use anyhow::Result;
use clap::{Parser, Subcommand};
use tracing_subscriber::EnvFilter;

use crate::commands::{cmd_history, cmd_log, cmd_profile, cmd_register, cmd_summary};
use crate::config::Config;
use kcal_core::KcalService;

#[derive(Parser)]
#[command(
    name = "kcal",
    version,
    about = "Track food intake and daily calorie targets"
)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Create or update a profile and derive its daily calorie target
    Register {
        /// Stable numeric user identity
        user_id: i64,
        /// Display name
        name: String,
        /// Sex: male or female
        sex: String,
        /// Age in years
        age: i32,
        /// Height in centimeters
        height: f64,
        /// Weight in kilograms
        weight: f64,
        /// Optional short handle (e.g. a chat username)
        #[arg(long)]
        handle: Option<String>,
        /// Output as JSON
        #[arg(long)]
        json: bool,
    },
    /// Show a stored profile
    Profile {
        user_id: i64,
        /// Output as JSON
        #[arg(long)]
        json: bool,
    },
    /// Log a food intake event
    Log {
        user_id: i64,
        /// Food name
        food: String,
        /// Calories in the logged portion
        calories: i32,
        /// Detection source: image, text, voice
        #[arg(short, long, default_value = "text")]
        source: String,
        /// Output as JSON
        #[arg(long)]
        json: bool,
    },
    /// List logged events, oldest first
    History {
        user_id: i64,
        /// Inclusive start date (YYYY-MM-DD, local)
        #[arg(long)]
        since: Option<String>,
        /// Inclusive end date (YYYY-MM-DD, local)
        #[arg(long)]
        until: Option<String>,
        /// Show only the most recent N events instead
        #[arg(long, conflicts_with_all = ["since", "until"])]
        last: Option<u32>,
        /// Output as JSON
        #[arg(long)]
        json: bool,
    },
    /// Show consumed vs. target calories for one day (default: today)
    Summary {
        user_id: i64,
        /// Date to summarize (YYYY-MM-DD, local)
        date: Option<String>,
        /// Output as JSON
        #[arg(long)]
        json: bool,
    },
}

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .init();

    let cli = Cli::parse();
    let config = Config::load()?;
    let service = KcalService::connect(&config.backend).await?;

    match cli.command {
        Commands::Register {
            user_id,
            name,
            sex,
            age,
            height,
            weight,
            handle,
            json,
        } => cmd_register(&service, user_id, &name, &sex, age, height, weight, handle, json).await,
        Commands::Profile { user_id, json } => cmd_profile(&service, user_id, json).await,
        Commands::Log {
            user_id,
            food,
            calories,
            source,
            json,
        } => cmd_log(&service, user_id, &food, calories, &source, json).await,
        Commands::History {
            user_id,
            since,
            until,
            last,
            json,
        } => cmd_history(&service, user_id, since.as_deref(), until.as_deref(), last, json).await,
        Commands::Summary { user_id, date, json } => {
            cmd_summary(&service, user_id, date.as_deref(), json).await
        }
    }
}
