use std::fmt;

use chrono::{DateTime, Duration, Utc};
use storage::repository::Storage;
use workout_core::finish::{PriorBests, finalize};
use workout_core::hydrate::Hydrator;
use workout_core::model::{
    Exercise, ExerciseId, MeasureType, SessionSettings, SetPath, Template, TemplateExercise,
    TemplateId, Weight,
};
use workout_core::time::whole_seconds_between;

#[derive(Debug, Clone)]
struct Args {
    db_url: String,
    sessions: u32,
    now: Option<DateTime<Utc>>,
}

#[derive(Debug)]
enum ArgsError {
    MissingValue { flag: &'static str },
    UnknownArg(String),
    InvalidSessions { raw: String },
    InvalidDbUrl { raw: String },
    InvalidNow { raw: String },
}

impl fmt::Display for ArgsError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ArgsError::MissingValue { flag } => write!(f, "{flag} requires a value"),
            ArgsError::UnknownArg(arg) => write!(f, "unknown argument: {arg}"),
            ArgsError::InvalidSessions { raw } => write!(f, "invalid --sessions value: {raw}"),
            ArgsError::InvalidDbUrl { raw } => write!(f, "invalid --db value: {raw}"),
            ArgsError::InvalidNow { raw } => {
                write!(f, "invalid --now value (expected RFC3339): {raw}")
            }
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

impl Args {
    fn parse() -> Result<Self, ArgsError> {
        let mut db_url = std::env::var("WORKOUT_DB_URL")
            .unwrap_or_else(|_| "sqlite://workout.sqlite3?mode=rwc".into());
        let mut sessions = std::env::var("WORKOUT_SEED_SESSIONS")
            .ok()
            .and_then(|value| value.parse::<u32>().ok())
            .unwrap_or(3);
        let mut now: Option<DateTime<Utc>> = None;

        let mut args = std::env::args().skip(1);
        while let Some(arg) = args.next() {
            match arg.as_str() {
                "--db" => {
                    let value = require_value(&mut args, "--db")?;
                    if value.trim().is_empty() {
                        return Err(ArgsError::InvalidDbUrl { raw: value });
                    }
                    db_url = value;
                }
                "--sessions" => {
                    let value = require_value(&mut args, "--sessions")?;
                    sessions = value
                        .parse::<u32>()
                        .map_err(|_| ArgsError::InvalidSessions { raw: value.clone() })?;
                }
                "--now" => {
                    let value = require_value(&mut args, "--now")?;
                    let parsed = DateTime::parse_from_rfc3339(&value)
                        .map_err(|_| ArgsError::InvalidNow { raw: value.clone() })?
                        .with_timezone(&Utc);
                    now = Some(parsed);
                }
                "--help" | "-h" => {
                    print_usage();
                    std::process::exit(0);
                }
                _ => return Err(ArgsError::UnknownArg(arg)),
            }
        }

        Ok(Self {
            db_url,
            sessions,
            now,
        })
    }
}

fn print_usage() {
    eprintln!("Usage:");
    eprintln!("  cargo run -p storage --bin seed -- [options]");
    eprintln!();
    eprintln!("Options:");
    eprintln!("  --db <sqlite_url>    SQLite URL (default: sqlite://workout.sqlite3?mode=rwc)");
    eprintln!("  --sessions <n>       Number of past workouts to record (default: 3)");
    eprintln!("  --now <rfc3339>      Fixed current time for deterministic seeding");
    eprintln!("  -h, --help           Show this help");
    eprintln!();
    eprintln!("Environment (same as flags):");
    eprintln!("  WORKOUT_DB_URL, WORKOUT_SEED_SESSIONS");
}

fn catalog() -> Result<Vec<Exercise>, workout_core::Error> {
    let rows = [
        (1, "Back Squat", "Legs", MeasureType::WeightReps),
        (2, "Bench Press", "Chest", MeasureType::WeightReps),
        (3, "Barbell Row", "Back", MeasureType::WeightReps),
        (4, "Pull Up", "Back", MeasureType::RepsOnly),
        (5, "Plank", "Core", MeasureType::TimeOnly),
        (6, "Rowing Machine", "Cardio", MeasureType::DistanceTime),
    ];
    let mut out = Vec::with_capacity(rows.len());
    for (id, name, category, measure) in rows {
        out.push(Exercise::new(ExerciseId::new(id), name, category, measure)?);
    }
    Ok(out)
}

fn strength_template(catalog: &[Exercise]) -> Result<Template, workout_core::Error> {
    let slots = catalog
        .iter()
        .filter(|e| e.measure() == MeasureType::WeightReps)
        .map(|e| TemplateExercise::new(e.clone(), 3, 5).with_rest_secs(120))
        .collect();
    Ok(Template::new(TemplateId::new(1), "Strength A", slots)?)
}

async fn run() -> Result<(), Box<dyn std::error::Error>> {
    let args = Args::parse().map_err(|e| {
        eprintln!("{e}");
        print_usage();
        e
    })?;

    let storage = Storage::sqlite(&args.db_url).await?;
    let now = args.now.unwrap_or_else(Utc::now);

    let exercises = catalog()?;
    for exercise in &exercises {
        storage.exercises.upsert_exercise(exercise).await?;
    }
    let template = strength_template(&exercises)?;
    storage.templates.upsert_template(&template).await?;

    let settings = SessionSettings::default();
    let hydrator = Hydrator::new(&settings);

    for i in 0..args.sessions {
        let sessions_ago = i64::from(args.sessions - i);
        let started_at = now - Duration::days(sessions_ago * 2) - Duration::minutes(50);
        let completed_at = started_at + Duration::minutes(45);

        // Each older workout is 2.5 kg lighter than the next.
        let base_kg = 60.0 + 2.5 * f64::from(i);
        let mut session = hydrator.from_template(&template, started_at);
        for (e, entry) in template.exercises().iter().enumerate() {
            for s in 0..entry.target_sets as usize {
                let weight = Weight::from_kg(base_kg)
                    .map_err(workout_core::Error::from)?;
                session = session.update_set(SetPath::new(e, s), |set| {
                    set.with_weight(weight)
                        .with_reps(entry.target_reps)
                        .with_completed(true)
                });
            }
        }

        let mut prior = PriorBests::new();
        for entry in template.exercises() {
            let best = storage.history.best_weight(entry.exercise_id()).await?;
            prior.insert(entry.exercise_id(), best);
        }

        let finished = finalize(
            &session,
            &prior,
            whole_seconds_between(started_at, completed_at),
        )
        .map_err(workout_core::Error::from)?;
        storage.sessions.save_session(&finished.session).await?;
        storage
            .stats
            .record_workout_completed(
                finished.stats.volume_kg,
                finished.stats.duration_secs,
                finished.stats.pr_count,
            )
            .await?;
    }

    println!(
        "Seeded {} exercises, template {} and {} past workouts into {}",
        exercises.len(),
        template.id().value(),
        args.sessions,
        args.db_url
    );

    Ok(())
}

#[tokio::main]
async fn main() {
    if let Err(err) = run().await {
        eprintln!("{err}");
        std::process::exit(2);
    }
}
