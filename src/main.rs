//! treino - workout session tracker

use std::sync::Arc;

use anyhow::{Context, Result};
use chrono::{Datelike, Local};
use clap::{Parser, Subcommand};
use tracing::info;
use tracing_subscriber::EnvFilter;

use treino::api::{ApiClient, WorkoutApi};
use treino::auth::AuthSession;
use treino::config::Config;
use treino::db::Database;
use treino::notify::RestTimer;
use treino::progress::{Chart, HistoryEpoch, ProgressQuery, ProgressSeries, ProgressView};
use treino::routine::{Routine, Training, training_for_date};
use treino::session::{SessionController, SessionState};
use treino::summary::format_summary;
use treino::tui::App;

const BAR_WIDTH: usize = 20;

#[derive(Parser)]
#[command(name = "treino")]
#[command(author, version, about = "Workout session tracker")]
struct Cli {
    #[command(flatten)]
    config: Config,

    #[command(subcommand)]
    command: Option<Commands>,
}

#[derive(Subcommand)]
enum Commands {
    /// Log in and remember the session
    Login {
        #[arg(short, long)]
        email: String,

        /// Password (or set TREINO_PASSWORD env var)
        #[arg(short, long, env = "TREINO_PASSWORD", hide_env_values = true)]
        password: String,
    },

    /// Forget the stored session
    Logout,

    /// Show today's training
    Routine {
        /// Show every assigned routine instead
        #[arg(short, long)]
        all: bool,
    },

    /// Open the live workout screen for today's training
    Train,

    /// Show per-day progress
    Progress {
        /// Exercise id; all exercises when omitted
        exercise: Option<String>,
    },

    /// Show the summary of a finished workout
    Summary {
        workout_id: String,

        #[arg(short, long)]
        training: String,
    },
}

/// The workout screen owns the terminal, so its logs go to a file instead
fn init_tracing(config: &Config, tui: bool) -> Result<()> {
    let writer = config
        .log_writer(tui)
        .with_context(|| format!("Cannot open log file {}", config.log_path))?;
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .with_ansi(!tui)
        .with_writer(writer)
        .init();
    Ok(())
}

fn bar(fraction: f64) -> String {
    let filled = (fraction.clamp(0.0, 1.0) * BAR_WIDTH as f64).round() as usize;
    format!("{}{}", "█".repeat(filled), "·".repeat(BAR_WIDTH - filled))
}

/// One line per day: average load, average reps and total volume, each with a bar
fn progress_lines(series: &ProgressSeries) -> Vec<String> {
    match series.chart() {
        Chart::NotEnoughData => vec!["Not enough data yet - finish a workout first".to_string()],
        Chart::Ready(points) => {
            let mut lines: Vec<String> = series
                .days
                .iter()
                .zip(points)
                .map(|(day, point)| {
                    format!(
                        "{} | {:6.1} kg {} | {:5.1} reps {} | {:8.0} vol {}",
                        day.date,
                        day.avg_load,
                        bar(point.load),
                        day.avg_reps,
                        bar(point.reps),
                        day.volume,
                        bar(point.volume),
                    )
                })
                .collect();
            lines.push(format!(
                "Max: {:.1} kg, {:.0} reps, {:.0} volume",
                series.max_load, series.max_reps, series.max_volume
            ));
            lines
        }
    }
}

fn print_training(training: &Training) {
    let days: Vec<String> = training.weekdays.iter().map(|d| d.to_string()).collect();
    println!("{} ({})", training.name, days.join(", "));
    for exercise in &training.exercises {
        println!(
            "  • {:24} {} sets{}{}",
            exercise.name,
            exercise.sets,
            exercise
                .target_reps
                .as_deref()
                .map(|r| format!(" x {}", r))
                .unwrap_or_default(),
            exercise
                .rest_seconds
                .map(|s| format!(", rest {}s", s))
                .unwrap_or_default(),
        );
    }
}

fn print_routines(routines: &[Routine]) {
    for routine in routines {
        let until = routine
            .end_date
            .map(|d| d.to_string())
            .unwrap_or_else(|| "open".to_string());
        println!("{} [{} → {}]", routine.name, routine.start_date, until);
        println!("{:-<60}", "");
        for training in &routine.trainings {
            print_training(training);
        }
        println!();
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    // Load .env file if present
    dotenvy::dotenv().ok();

    let cli = Cli::parse();
    init_tracing(&cli.config, matches!(cli.command, None | Some(Commands::Train)))?;

    let db = Database::open(&cli.config.db_path).context("Cannot open local database")?;
    let mut auth = AuthSession::init(db)?;
    let client = ApiClient::new(cli.config.api_url.as_str())?.with_token(auth.token().map(str::to_string));
    let api: Arc<dyn WorkoutApi> = Arc::new(client);

    match cli.command {
        Some(Commands::Login { email, password }) => {
            let user = auth.login(api.as_ref(), &email, &password).await?;
            println!("Logged in as {} <{}>", user.name, user.email);
        }

        Some(Commands::Logout) => {
            auth.logout()?;
            println!("Logged out");
        }

        Some(Commands::Routine { all }) => {
            let user = auth.require_user()?;
            let routines = api.routines(&user.id).await.context("Cannot load routines")?;

            if all {
                print_routines(&routines);
            } else {
                let today = Local::now().date_naive();
                match training_for_date(&routines, today) {
                    Some(training) => print_training(training),
                    None => println!("Nothing scheduled for {} - rest day", today.weekday()),
                }
            }
        }

        Some(Commands::Progress { exercise }) => {
            let user = auth.require_user()?;
            let query = ProgressQuery {
                user_id: user.id.clone(),
                exercise_id: exercise,
            };
            let mut view = ProgressView::new(HistoryEpoch::new(), query);
            let series = view
                .refresh(api.as_ref())
                .await
                .context("Cannot load progress")?
                .clone();

            println!("Progress");
            println!("{:-<110}", "");
            for line in progress_lines(&series) {
                println!("{}", line);
            }

            if view.query().exercise_id.is_none() && !view.exercises().is_empty() {
                let names: Vec<String> = view
                    .exercises()
                    .iter()
                    .map(|(id, name)| format!("{} ({})", name, id))
                    .collect();
                println!("\nExercises: {}", names.join(", "));
            }
        }

        Some(Commands::Summary { workout_id, training }) => {
            let summary = api
                .workout_summary(&workout_id, &training)
                .await
                .context("Cannot load summary")?;
            println!("{}", format_summary(&summary));
        }

        Some(Commands::Train) | None => {
            let user = auth.require_user()?;
            let routines = api.routines(&user.id).await.context("Cannot load routines")?;
            let training = training_for_date(&routines, Local::now().date_naive())
                .cloned()
                .context("No training scheduled for today")?;
            let training_id = training.id.clone();

            let mut session = SessionController::new(api.clone(), training, HistoryEpoch::new());
            if session.resume().await.context("Cannot check for an open workout")? {
                info!("Resuming open workout");
            }

            let rest = RestTimer::new(cli.config.notifier());
            let mut app = App::new(session, rest, cli.config.default_rest());
            app.run().await?;

            if let SessionState::Stopped(workout) = app.session().state() {
                let summary = api
                    .workout_summary(&workout.id, &training_id)
                    .await
                    .context("Workout saved, but the summary could not be loaded")?;
                println!("{}", format_summary(&summary));
            }
        }
    }

    Ok(())
}
