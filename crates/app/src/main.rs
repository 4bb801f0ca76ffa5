use std::fmt;

use serde::Serialize;
use services::{AppServices, Clock};
use tracing_subscriber::EnvFilter;
use workout_core::finish::WorkoutStatsDelta;
use workout_core::model::{
    ExerciseId, MeasureType, SessionSettings, SessionSettingsDraft, SetPath, TemplateId, Weight,
    WorkoutSession,
};

#[derive(Debug)]
enum ArgsError {
    MissingValue { flag: &'static str },
    UnknownArg(String),
    UnknownCommand(String),
    InvalidDbUrl { raw: String },
    InvalidExerciseId { raw: String },
    InvalidTemplateId { raw: String },
    InvalidNumber { var: &'static str, raw: String },
    MissingExercise,
}

impl fmt::Display for ArgsError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ArgsError::MissingValue { flag } => write!(f, "{flag} requires a value"),
            ArgsError::UnknownArg(arg) => write!(f, "unknown argument: {arg}"),
            ArgsError::UnknownCommand(cmd) => write!(f, "unknown subcommand: {cmd}"),
            ArgsError::InvalidDbUrl { raw } => write!(f, "invalid --db value: {raw}"),
            ArgsError::InvalidExerciseId { raw } => write!(f, "invalid --exercise value: {raw}"),
            ArgsError::InvalidTemplateId { raw } => write!(f, "invalid --template value: {raw}"),
            ArgsError::InvalidNumber { var, raw } => write!(f, "invalid {var} value: {raw}"),
            ArgsError::MissingExercise => write!(f, "history requires --exercise <id>"),
        }
    }
}

impl std::error::Error for ArgsError {}

fn require_value(
    args: &mut impl Iterator<Item = String>,
    flag: &'static str,
) -> Result<String, ArgsError> {
    args.next().ok_or(ArgsError::MissingValue { flag })
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Command {
    Exercises,
    Templates,
    History,
    Stats,
    Simulate,
}

impl Command {
    fn from_arg(arg: &str) -> Option<Self> {
        match arg {
            "exercises" => Some(Self::Exercises),
            "templates" => Some(Self::Templates),
            "history" => Some(Self::History),
            "stats" => Some(Self::Stats),
            "simulate" => Some(Self::Simulate),
            _ => None,
        }
    }
}

struct Args {
    command: Command,
    db_url: String,
    json: bool,
    exercise_id: Option<ExerciseId>,
    template_id: Option<TemplateId>,
}

fn print_usage() {
    eprintln!("Usage:");
    eprintln!("  cargo run -p app -- exercises [--db <sqlite_url>] [--json]");
    eprintln!("  cargo run -p app -- templates [--db <sqlite_url>] [--json]");
    eprintln!("  cargo run -p app -- history --exercise <id> [--db <sqlite_url>] [--json]");
    eprintln!("  cargo run -p app -- stats     [--db <sqlite_url>] [--json]");
    eprintln!("  cargo run -p app -- simulate  [--template <id>] [--db <sqlite_url>] [--json]");
    eprintln!();
    eprintln!("Defaults:");
    eprintln!("  --db sqlite://workout.sqlite3");
    eprintln!();
    eprintln!("Environment:");
    eprintln!("  WORKOUT_DB_URL, WORKOUT_LOG (tracing filter, default info)");
    eprintln!("  WORKOUT_REST_SECS, WORKOUT_ADDED_SETS, WORKOUT_QUICK_NAME");
}

impl Args {
    fn parse(mut args: impl Iterator<Item = String>) -> Result<Self, ArgsError> {
        let command = match args.next() {
            None => {
                print_usage();
                std::process::exit(0);
            }
            Some(first) if first == "--help" || first == "-h" => {
                print_usage();
                std::process::exit(0);
            }
            Some(first) => Command::from_arg(&first).ok_or(ArgsError::UnknownCommand(first))?,
        };

        let mut db_url = std::env::var("WORKOUT_DB_URL")
            .ok()
            .map_or_else(|| "sqlite://workout.sqlite3".into(), normalize_sqlite_url);
        let mut json = false;
        let mut exercise_id = None;
        let mut template_id = None;

        while let Some(arg) = args.next() {
            match arg.as_str() {
                "--db" => {
                    let value = require_value(&mut args, "--db")?;
                    if value.trim().is_empty() {
                        return Err(ArgsError::InvalidDbUrl { raw: value });
                    }
                    db_url = normalize_sqlite_url(value);
                }
                "--exercise" => {
                    let value = require_value(&mut args, "--exercise")?;
                    let parsed = value
                        .parse::<ExerciseId>()
                        .map_err(|_| ArgsError::InvalidExerciseId { raw: value.clone() })?;
                    exercise_id = Some(parsed);
                }
                "--template" => {
                    let value = require_value(&mut args, "--template")?;
                    let parsed = value
                        .parse::<TemplateId>()
                        .map_err(|_| ArgsError::InvalidTemplateId { raw: value.clone() })?;
                    template_id = Some(parsed);
                }
                "--json" => json = true,
                "--help" | "-h" => {
                    print_usage();
                    std::process::exit(0);
                }
                _ => return Err(ArgsError::UnknownArg(arg)),
            }
        }

        if command == Command::History && exercise_id.is_none() {
            return Err(ArgsError::MissingExercise);
        }

        Ok(Self {
            command,
            db_url,
            json,
            exercise_id,
            template_id,
        })
    }
}

fn env_u32(var: &'static str) -> Result<Option<u32>, ArgsError> {
    match std::env::var(var) {
        Ok(raw) => raw
            .trim()
            .parse::<u32>()
            .map(Some)
            .map_err(|_| ArgsError::InvalidNumber { var, raw }),
        Err(_) => Ok(None),
    }
}

fn settings_from_env() -> Result<SessionSettings, Box<dyn std::error::Error>> {
    let draft = SessionSettingsDraft {
        default_rest_secs: env_u32("WORKOUT_REST_SECS")?,
        quick_workout_name: std::env::var("WORKOUT_QUICK_NAME").ok(),
        added_exercise_sets: env_u32("WORKOUT_ADDED_SETS")?,
    };
    Ok(draft.validate().map_err(workout_core::Error::from)?)
}

fn init_tracing() {
    let filter = EnvFilter::try_from_env("WORKOUT_LOG").unwrap_or_else(|_| EnvFilter::new("info"));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_writer(std::io::stderr)
        .init();
}

fn normalize_sqlite_url(raw: String) -> String {
    if raw == "sqlite::memory:" || raw.starts_with("sqlite://") {
        return raw;
    }

    let trimmed = raw.trim().to_string();
    let path_str = trimmed
        .strip_prefix("sqlite:")
        .unwrap_or(trimmed.as_str())
        .to_string();
    let path = std::path::Path::new(&path_str);
    let absolute = if path.is_absolute() {
        path.to_path_buf()
    } else {
        std::env::current_dir()
            .unwrap_or_else(|_| std::path::PathBuf::from("."))
            .join(path)
    };
    format!("sqlite://{}", absolute.display())
}

fn prepare_sqlite_file(db_url: &str) -> Result<(), Box<dyn std::error::Error>> {
    if db_url == "sqlite::memory:" {
        return Ok(());
    }

    let path = db_url
        .strip_prefix("sqlite://")
        .ok_or_else(|| ArgsError::InvalidDbUrl {
            raw: db_url.to_string(),
        })?;
    let path = path.split('?').next().unwrap_or(path);
    if path.is_empty() {
        return Err(ArgsError::InvalidDbUrl {
            raw: db_url.to_string(),
        }
        .into());
    }

    let path = std::path::Path::new(path);
    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent)?;
    }

    if !path.exists() {
        std::fs::OpenOptions::new()
            .create(true)
            .write(true)
            .truncate(false)
            .open(path)?;
    }

    Ok(())
}

//
// ─── OUTPUT ────────────────────────────────────────────────────────────────────
//

#[derive(Serialize)]
struct WorkoutReport<'a> {
    session: &'a WorkoutSession,
    stats: Option<&'a WorkoutStatsDelta>,
}

fn print_json<T: Serialize>(value: &T) -> Result<(), Box<dyn std::error::Error>> {
    println!("{}", serde_json::to_string_pretty(value)?);
    Ok(())
}

fn print_session(session: &WorkoutSession) {
    println!(
        "{} ({}) started {} lasted {}s",
        session.name(),
        session.id(),
        session.started_at().to_rfc3339(),
        session.duration_secs()
    );
    for entry in session.exercises() {
        println!("  {}", entry.exercise().name());
        for (i, set) in entry.sets().iter().enumerate() {
            let done = if set.is_completed() { "x" } else { " " };
            let pr = if set.is_personal_record() { " PR" } else { "" };
            println!("    [{done}] {}: {} x {}{pr}", i + 1, set.weight(), set.reps());
        }
    }
}

//
// ─── COMMANDS ──────────────────────────────────────────────────────────────────
//

/// Fill every set from last time's values, a little heavier, and finish.
async fn simulate(
    services: &AppServices,
    preferred: Option<TemplateId>,
    json: bool,
) -> Result<(), Box<dyn std::error::Error>> {
    let Some(template_id) = services.resolve_template(preferred).await? else {
        eprintln!("no templates stored; run the seed binary first");
        return Ok(());
    };
    let workouts = services.workouts();
    let Some(mut workout) = workouts.start_from_template(template_id).await? else {
        eprintln!("template {template_id} is unavailable");
        return Ok(());
    };

    let step = Weight::from_kg(2.5).map_err(workout_core::Error::from)?;
    let exercise_count = workout.session().exercises().len();
    for e in 0..exercise_count {
        let ghosts = workout.ghost_sets(e).await;
        let entry = workout.session().exercises()[e].clone();
        for s in 0..entry.sets().len() {
            let path = SetPath::new(e, s);
            let ghost = ghosts.get(s);
            match entry.exercise().measure() {
                MeasureType::WeightReps => {
                    let base = ghost.map_or(Weight::from_grams(20_000), |g| g.weight);
                    let weight = Weight::from_grams(base.grams().saturating_add(step.grams()));
                    workout.set_weight(path, weight)?;
                    workout.set_reps(path, ghost.map_or(5, |g| g.reps.max(1)))?;
                }
                MeasureType::RepsOnly => {
                    workout.set_reps(path, ghost.map_or(8, |g| g.reps + 1))?;
                }
                MeasureType::TimeOnly => {
                    workout.set_time(path, Some(ghost.and_then(|g| g.time_secs).unwrap_or(60)))?;
                }
                MeasureType::DistanceTime => {
                    let meters = ghost.and_then(|g| g.distance_m).unwrap_or(1000.0);
                    workout.set_distance(path, Some(meters))?;
                    workout.set_time(path, Some(ghost.and_then(|g| g.time_secs).unwrap_or(300)))?;
                }
            }
            workout.set_completed(path, true)?;
        }
    }
    workout.stop_rest();

    let finished = workout.finish().await?;
    if json {
        print_json(&WorkoutReport {
            session: &finished.session,
            stats: Some(&finished.stats),
        })?;
    } else {
        print_session(&finished.session);
        println!(
            "volume {:.1} kg, {} personal records",
            finished.stats.volume_kg, finished.stats.pr_count
        );
    }
    Ok(())
}

async fn run() -> Result<(), Box<dyn std::error::Error>> {
    let args = Args::parse(std::env::args().skip(1)).map_err(|e| {
        eprintln!("{e}");
        print_usage();
        e
    })?;
    init_tracing();
    let settings = settings_from_env()?;
    tracing::debug!(command = ?args.command, db_url = %args.db_url, "cli starting");

    // Open + migrate SQLite at startup; core and services stay storage-agnostic.
    prepare_sqlite_file(&args.db_url)?;
    let services = AppServices::new_sqlite(&args.db_url, Clock::default_clock(), settings).await?;

    match args.command {
        Command::Exercises => {
            let exercises = services.list_exercises().await?;
            if args.json {
                print_json(&exercises)?;
            } else {
                for exercise in &exercises {
                    println!(
                        "{:>4}  {} [{}] {}",
                        exercise.id(),
                        exercise.name(),
                        exercise.category(),
                        exercise.measure().as_str()
                    );
                }
            }
        }
        Command::Templates => {
            let templates = services.list_templates().await?;
            if args.json {
                print_json(&templates)?;
            } else {
                for template in &templates {
                    println!("{:>4}  {}", template.id(), template.name());
                    for slot in template.exercises() {
                        println!(
                            "        {} {}x{}",
                            slot.exercise.name(),
                            slot.target_sets,
                            slot.target_reps
                        );
                    }
                }
            }
        }
        Command::History => {
            let Some(exercise_id) = args.exercise_id else {
                return Err(ArgsError::MissingExercise.into());
            };
            match services.last_workout_for(exercise_id).await? {
                Some(session) if args.json => print_json(&WorkoutReport {
                    session: &session,
                    stats: None,
                })?,
                Some(session) => print_session(&session),
                None => eprintln!("no finished workout contains exercise {exercise_id}"),
            }
        }
        Command::Stats => {
            let stats = services.profile_stats().await?;
            if args.json {
                print_json(&stats)?;
            } else {
                println!("workouts:         {}", stats.workouts);
                println!("total volume:     {:.1} kg", stats.total_volume_kg);
                println!("total duration:   {}s", stats.total_duration_secs);
                println!("personal records: {}", stats.total_prs);
            }
        }
        Command::Simulate => simulate(&services, args.template_id, args.json).await?,
    }

    Ok(())
}

#[tokio::main]
async fn main() {
    if let Err(err) = run().await {
        eprintln!("{err}");
        std::process::exit(2);
    }
}
