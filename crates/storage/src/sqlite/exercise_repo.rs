use workout_core::model::{Exercise, ExerciseId};

use super::SqliteRepository;
use super::mapping::{conn, id_i64, map_exercise_row};
use crate::repository::{ExerciseRepository, StorageError};

#[async_trait::async_trait]
impl ExerciseRepository for SqliteRepository {
    async fn upsert_exercise(&self, exercise: &Exercise) -> Result<(), StorageError> {
        sqlx::query(
            r"
                INSERT INTO exercises (id, name, category, measure)
                VALUES (?1, ?2, ?3, ?4)
                ON CONFLICT(id) DO UPDATE SET
                    name = excluded.name,
                    category = excluded.category,
                    measure = excluded.measure
            ",
        )
        .bind(id_i64("exercise_id", exercise.id().value())?)
        .bind(exercise.name())
        .bind(exercise.category())
        .bind(exercise.measure().as_str())
        .execute(&self.pool)
        .await
        .map_err(conn)?;
        Ok(())
    }

    async fn get_exercise(&self, id: ExerciseId) -> Result<Exercise, StorageError> {
        let row = sqlx::query(
            r"
                SELECT id, name, category, measure
                FROM exercises
                WHERE id = ?1
            ",
        )
        .bind(id_i64("exercise_id", id.value())?)
        .fetch_optional(&self.pool)
        .await
        .map_err(conn)?
        .ok_or(StorageError::NotFound)?;

        map_exercise_row(&row)
    }

    async fn list_exercises(&self) -> Result<Vec<Exercise>, StorageError> {
        let rows = sqlx::query(
            r"
                SELECT id, name, category, measure
                FROM exercises
                ORDER BY id ASC
            ",
        )
        .fetch_all(&self.pool)
        .await
        .map_err(conn)?;

        rows.iter().map(map_exercise_row).collect()
    }
}
