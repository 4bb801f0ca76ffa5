use chrono::Utc;
use sqlx::SqlitePool;

use super::SqliteInitError;

/// Runs a single, consolidated migration for the current schema.
///
/// Creates the exercise catalog, templates, finished sessions with their
/// exercises and sets, the profile totals row, and indexes.
#[allow(clippy::too_many_lines)]
pub async fn run_migrations(pool: &SqlitePool) -> Result<(), SqliteInitError> {
    async fn is_applied(pool: &SqlitePool, version: i64) -> Result<bool, sqlx::Error> {
        let row = sqlx::query("SELECT 1 FROM schema_migrations WHERE version = ?1")
            .bind(version)
            .fetch_optional(pool)
            .await?;
        Ok(row.is_some())
    }

    sqlx::query(
        r"
            CREATE TABLE IF NOT EXISTS schema_migrations (
                version INTEGER PRIMARY KEY,
                applied_at TEXT NOT NULL
            );
            ",
    )
    .execute(pool)
    .await?;

    // Version 1: full schema.
    if !is_applied(pool, 1).await? {
        let mut tx = pool.begin().await?;

        sqlx::query(
            r"
                CREATE TABLE IF NOT EXISTS exercises (
                    id INTEGER PRIMARY KEY,
                    name TEXT NOT NULL,
                    category TEXT NOT NULL,
                    measure TEXT NOT NULL
                );
            ",
        )
        .execute(&mut *tx)
        .await?;

        sqlx::query(
            r"
                CREATE TABLE IF NOT EXISTS templates (
                    id INTEGER PRIMARY KEY,
                    name TEXT NOT NULL
                );
            ",
        )
        .execute(&mut *tx)
        .await?;

        sqlx::query(
            r"
                CREATE TABLE IF NOT EXISTS template_exercises (
                    template_id INTEGER NOT NULL,
                    position INTEGER NOT NULL CHECK (position >= 0),
                    exercise_id INTEGER NOT NULL,
                    target_sets INTEGER NOT NULL CHECK (target_sets >= 0),
                    target_reps INTEGER NOT NULL CHECK (target_reps >= 0),
                    rest_secs INTEGER CHECK (rest_secs >= 0),
                    note TEXT,
                    PRIMARY KEY (template_id, position),
                    FOREIGN KEY (template_id) REFERENCES templates(id) ON DELETE CASCADE,
                    FOREIGN KEY (exercise_id) REFERENCES exercises(id)
                );
            ",
        )
        .execute(&mut *tx)
        .await?;

        sqlx::query(
            r"
                CREATE TABLE IF NOT EXISTS workout_sessions (
                    id TEXT PRIMARY KEY,
                    template_id INTEGER,
                    name TEXT NOT NULL,
                    started_at TEXT NOT NULL,
                    duration_secs INTEGER NOT NULL CHECK (duration_secs >= 0),
                    note TEXT
                );
            ",
        )
        .execute(&mut *tx)
        .await?;

        // Exercise name/category/measure are snapshotted so history survives catalog edits.
        sqlx::query(
            r"
                CREATE TABLE IF NOT EXISTS session_exercises (
                    id TEXT PRIMARY KEY,
                    session_id TEXT NOT NULL,
                    position INTEGER NOT NULL CHECK (position >= 0),
                    exercise_id INTEGER NOT NULL,
                    exercise_name TEXT NOT NULL,
                    category TEXT NOT NULL,
                    measure TEXT NOT NULL,
                    rest_secs INTEGER CHECK (rest_secs >= 0),
                    note TEXT,
                    FOREIGN KEY (session_id) REFERENCES workout_sessions(id) ON DELETE CASCADE
                );
            ",
        )
        .execute(&mut *tx)
        .await?;

        sqlx::query(
            r"
                CREATE TABLE IF NOT EXISTS workout_sets (
                    id TEXT PRIMARY KEY,
                    session_exercise_id TEXT NOT NULL,
                    position INTEGER NOT NULL CHECK (position >= 0),
                    order_index INTEGER NOT NULL CHECK (order_index >= 0),
                    weight_grams INTEGER NOT NULL CHECK (weight_grams >= 0),
                    reps INTEGER NOT NULL CHECK (reps >= 0),
                    completed INTEGER NOT NULL CHECK (completed IN (0, 1)),
                    effort_kind TEXT CHECK (effort_kind IN ('rpe', 'rir')),
                    effort_value REAL,
                    is_personal_record INTEGER NOT NULL CHECK (is_personal_record IN (0, 1)),
                    time_secs INTEGER CHECK (time_secs >= 0),
                    distance_m REAL CHECK (distance_m >= 0),
                    FOREIGN KEY (session_exercise_id)
                        REFERENCES session_exercises(id) ON DELETE CASCADE
                );
            ",
        )
        .execute(&mut *tx)
        .await?;

        sqlx::query(
            r"
                CREATE TABLE IF NOT EXISTS profile_stats (
                    id INTEGER PRIMARY KEY CHECK (id = 1),
                    workouts INTEGER NOT NULL CHECK (workouts >= 0),
                    total_volume_kg REAL NOT NULL CHECK (total_volume_kg >= 0),
                    total_duration_secs INTEGER NOT NULL CHECK (total_duration_secs >= 0),
                    total_prs INTEGER NOT NULL CHECK (total_prs >= 0)
                );
            ",
        )
        .execute(&mut *tx)
        .await?;

        sqlx::query(
            r"
                CREATE INDEX IF NOT EXISTS idx_session_exercises_exercise_session
                    ON session_exercises (exercise_id, session_id);
            ",
        )
        .execute(&mut *tx)
        .await?;

        sqlx::query(
            r"
                CREATE INDEX IF NOT EXISTS idx_workout_sessions_started_at
                    ON workout_sessions (started_at);
            ",
        )
        .execute(&mut *tx)
        .await?;

        sqlx::query(
            r"
                CREATE INDEX IF NOT EXISTS idx_workout_sets_session_exercise
                    ON workout_sets (session_exercise_id, position);
            ",
        )
        .execute(&mut *tx)
        .await?;

        sqlx::query(
            r"
                INSERT INTO schema_migrations (version, applied_at)
                VALUES (?1, ?2)
                ON CONFLICT(version) DO NOTHING
            ",
        )
        .bind(1_i64)
        .bind(Utc::now())
        .execute(&mut *tx)
        .await?;

        tx.commit().await?;
        tracing::info!(version = 1, "applied sqlite migration");
    }

    Ok(())
}
