use chrono::{DateTime, Utc};
use sqlx::Row;
use workout_core::model::{
    Exercise, ExerciseId, SessionExercise, SessionExerciseId, SessionId, Weight, WorkoutSession,
};

use super::SqliteRepository;
use super::mapping::{
    conn, effort_to_columns, exercise_id_from_i64, id_i64, map_set_row, opt_u32_from_i64,
    parse_measure, parse_uuid_id, ser, template_id_from_i64, u32_from_i64, u64_from_i64,
};
use crate::repository::{HistoryRepository, SessionRepository, StorageError};

fn insert_err(e: sqlx::Error) -> StorageError {
    match &e {
        sqlx::Error::Database(db) if db.is_unique_violation() => StorageError::Conflict,
        _ => conn(e),
    }
}

struct ExerciseHead {
    key: String,
    id: SessionExerciseId,
    exercise: Exercise,
    note: Option<String>,
    rest_secs: Option<u32>,
}

fn map_exercise_head(row: &sqlx::sqlite::SqliteRow) -> Result<ExerciseHead, StorageError> {
    let key: String = row.try_get("id").map_err(ser)?;
    let measure: String = row.try_get("measure").map_err(ser)?;
    let exercise = Exercise::new(
        exercise_id_from_i64(row.try_get::<i64, _>("exercise_id").map_err(ser)?)?,
        row.try_get::<String, _>("exercise_name").map_err(ser)?,
        row.try_get::<String, _>("category").map_err(ser)?,
        parse_measure(&measure)?,
    )
    .map_err(ser)?;

    Ok(ExerciseHead {
        id: parse_uuid_id::<SessionExerciseId>("session exercise id", &key)?,
        key,
        exercise,
        note: row.try_get("note").map_err(ser)?,
        rest_secs: opt_u32_from_i64(
            "rest_secs",
            row.try_get::<Option<i64>, _>("rest_secs").map_err(ser)?,
        )?,
    })
}

impl SqliteRepository {
    async fn load_session(&self, id: &str) -> Result<WorkoutSession, StorageError> {
        let row = sqlx::query(
            r"
                SELECT id, template_id, name, started_at, duration_secs, note
                FROM workout_sessions
                WHERE id = ?1
            ",
        )
        .bind(id)
        .fetch_optional(&self.pool)
        .await
        .map_err(conn)?
        .ok_or(StorageError::NotFound)?;

        let template_id = row
            .try_get::<Option<i64>, _>("template_id")
            .map_err(ser)?
            .map(template_id_from_i64)
            .transpose()?;
        let started_at: DateTime<Utc> = row.try_get("started_at").map_err(ser)?;
        let duration_secs = u64_from_i64(
            "duration_secs",
            row.try_get::<i64, _>("duration_secs").map_err(ser)?,
        )?;

        let exercise_rows = sqlx::query(
            r"
                SELECT id, exercise_id, exercise_name, category, measure, rest_secs, note
                FROM session_exercises
                WHERE session_id = ?1
                ORDER BY position ASC
            ",
        )
        .bind(id)
        .fetch_all(&self.pool)
        .await
        .map_err(conn)?;

        let mut exercises = Vec::with_capacity(exercise_rows.len());
        for exercise_row in &exercise_rows {
            let head = map_exercise_head(exercise_row)?;
            let set_rows = sqlx::query(
                r"
                    SELECT
                        id, order_index, weight_grams, reps, completed, effort_kind,
                        effort_value, is_personal_record, time_secs, distance_m
                    FROM workout_sets
                    WHERE session_exercise_id = ?1
                    ORDER BY position ASC
                ",
            )
            .bind(&head.key)
            .fetch_all(&self.pool)
            .await
            .map_err(conn)?;

            let sets = set_rows
                .iter()
                .map(map_set_row)
                .collect::<Result<Vec<_>, _>>()?;

            exercises.push(SessionExercise::from_persisted(
                head.id,
                head.exercise,
                sets,
                head.note,
                head.rest_secs,
            ));
        }

        Ok(WorkoutSession::from_persisted(
            parse_uuid_id::<SessionId>("session id", id)?,
            template_id,
            row.try_get("name").map_err(ser)?,
            started_at,
            duration_secs,
            exercises,
            row.try_get("note").map_err(ser)?,
        ))
    }
}

#[async_trait::async_trait]
impl SessionRepository for SqliteRepository {
    async fn save_session(&self, session: &WorkoutSession) -> Result<(), StorageError> {
        let session_key = session.id().to_string();
        let template_id = session
            .template_id()
            .map(|t| id_i64("template_id", t.value()))
            .transpose()?;

        let mut tx = self.pool.begin().await.map_err(conn)?;

        sqlx::query(
            r"
                INSERT INTO workout_sessions (
                    id, template_id, name, started_at, duration_secs, note
                )
                VALUES (?1, ?2, ?3, ?4, ?5, ?6)
            ",
        )
        .bind(&session_key)
        .bind(template_id)
        .bind(session.name())
        .bind(session.started_at())
        .bind(id_i64("duration_secs", session.duration_secs())?)
        .bind(session.note())
        .execute(&mut *tx)
        .await
        .map_err(insert_err)?;

        for (position, entry) in session.exercises().iter().enumerate() {
            let entry_key = entry.id().to_string();
            sqlx::query(
                r"
                    INSERT INTO session_exercises (
                        id, session_id, position, exercise_id, exercise_name,
                        category, measure, rest_secs, note
                    )
                    VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9)
                ",
            )
            .bind(&entry_key)
            .bind(&session_key)
            .bind(id_i64("position", position as u64)?)
            .bind(id_i64("exercise_id", entry.exercise_id().value())?)
            .bind(entry.exercise().name())
            .bind(entry.exercise().category())
            .bind(entry.exercise().measure().as_str())
            .bind(entry.rest_secs().map(i64::from))
            .bind(entry.note())
            .execute(&mut *tx)
            .await
            .map_err(insert_err)?;

            for (set_position, set) in entry.sets().iter().enumerate() {
                let (effort_kind, effort_value) = effort_to_columns(set.effort());
                sqlx::query(
                    r"
                        INSERT INTO workout_sets (
                            id, session_exercise_id, position, order_index, weight_grams,
                            reps, completed, effort_kind, effort_value,
                            is_personal_record, time_secs, distance_m
                        )
                        VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11, ?12)
                    ",
                )
                .bind(set.id().to_string())
                .bind(&entry_key)
                .bind(id_i64("position", set_position as u64)?)
                .bind(i64::from(set.order_index()))
                .bind(i64::from(set.weight().grams()))
                .bind(i64::from(set.reps()))
                .bind(set.is_completed())
                .bind(effort_kind)
                .bind(effort_value)
                .bind(set.is_personal_record())
                .bind(set.time_secs().map(i64::from))
                .bind(set.distance_m())
                .execute(&mut *tx)
                .await
                .map_err(insert_err)?;
            }
        }

        tx.commit().await.map_err(conn)?;
        tracing::debug!(session_id = %session.id(), "saved workout session");
        Ok(())
    }

    async fn get_session(&self, id: SessionId) -> Result<WorkoutSession, StorageError> {
        self.load_session(&id.to_string()).await
    }
}

#[async_trait::async_trait]
impl HistoryRepository for SqliteRepository {
    async fn last_session_for_exercise(
        &self,
        exercise_id: ExerciseId,
    ) -> Result<Option<WorkoutSession>, StorageError> {
        let row = sqlx::query(
            r"
                SELECT s.id
                FROM workout_sessions s
                JOIN session_exercises se ON se.session_id = s.id
                WHERE se.exercise_id = ?1
                ORDER BY s.started_at DESC, s.rowid DESC
                LIMIT 1
            ",
        )
        .bind(id_i64("exercise_id", exercise_id.value())?)
        .fetch_optional(&self.pool)
        .await
        .map_err(conn)?;

        match row {
            Some(row) => {
                let id: String = row.try_get("id").map_err(ser)?;
                self.load_session(&id).await.map(Some)
            }
            None => Ok(None),
        }
    }

    async fn best_weight(&self, exercise_id: ExerciseId) -> Result<Option<Weight>, StorageError> {
        let best: Option<i64> = sqlx::query_scalar(
            r"
                SELECT MAX(ws.weight_grams)
                FROM workout_sets ws
                JOIN session_exercises se ON se.id = ws.session_exercise_id
                WHERE se.exercise_id = ?1
                  AND ws.completed = 1
            ",
        )
        .bind(id_i64("exercise_id", exercise_id.value())?)
        .fetch_one(&self.pool)
        .await
        .map_err(conn)?;

        best.map(|grams| u32_from_i64("weight_grams", grams).map(Weight::from_grams))
            .transpose()
    }
}
