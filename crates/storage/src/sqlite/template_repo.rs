use sqlx::Row;
use workout_core::model::{Exercise, Template, TemplateExercise, TemplateId};

use super::SqliteRepository;
use super::mapping::{
    conn, exercise_id_from_i64, id_i64, opt_u32_from_i64, parse_measure, ser,
    template_id_from_i64, u32_from_i64,
};
use crate::repository::{StorageError, TemplateRepository};

fn map_slot_row(row: &sqlx::sqlite::SqliteRow) -> Result<TemplateExercise, StorageError> {
    let measure: String = row.try_get("measure").map_err(ser)?;
    let exercise = Exercise::new(
        exercise_id_from_i64(row.try_get::<i64, _>("exercise_id").map_err(ser)?)?,
        row.try_get::<String, _>("name").map_err(ser)?,
        row.try_get::<String, _>("category").map_err(ser)?,
        parse_measure(&measure)?,
    )
    .map_err(ser)?;

    Ok(TemplateExercise {
        exercise,
        target_sets: u32_from_i64(
            "target_sets",
            row.try_get::<i64, _>("target_sets").map_err(ser)?,
        )?,
        target_reps: u32_from_i64(
            "target_reps",
            row.try_get::<i64, _>("target_reps").map_err(ser)?,
        )?,
        rest_secs: opt_u32_from_i64(
            "rest_secs",
            row.try_get::<Option<i64>, _>("rest_secs").map_err(ser)?,
        )?,
        note: row.try_get("note").map_err(ser)?,
    })
}

impl SqliteRepository {
    async fn load_template(&self, id: i64, name: String) -> Result<Template, StorageError> {
        let rows = sqlx::query(
            r"
                SELECT
                    te.exercise_id, te.target_sets, te.target_reps, te.rest_secs, te.note,
                    e.name, e.category, e.measure
                FROM template_exercises te
                JOIN exercises e ON e.id = te.exercise_id
                WHERE te.template_id = ?1
                ORDER BY te.position ASC
            ",
        )
        .bind(id)
        .fetch_all(&self.pool)
        .await
        .map_err(conn)?;

        let slots = rows
            .iter()
            .map(map_slot_row)
            .collect::<Result<Vec<_>, _>>()?;

        Template::new(template_id_from_i64(id)?, name, slots).map_err(ser)
    }
}

#[async_trait::async_trait]
impl TemplateRepository for SqliteRepository {
    async fn upsert_template(&self, template: &Template) -> Result<(), StorageError> {
        let template_id = id_i64("template_id", template.id().value())?;
        let mut tx = self.pool.begin().await.map_err(conn)?;

        sqlx::query(
            r"
                INSERT INTO templates (id, name)
                VALUES (?1, ?2)
                ON CONFLICT(id) DO UPDATE SET name = excluded.name
            ",
        )
        .bind(template_id)
        .bind(template.name())
        .execute(&mut *tx)
        .await
        .map_err(conn)?;

        sqlx::query("DELETE FROM template_exercises WHERE template_id = ?1")
            .bind(template_id)
            .execute(&mut *tx)
            .await
            .map_err(conn)?;

        for (position, slot) in template.exercises().iter().enumerate() {
            sqlx::query(
                r"
                    INSERT INTO template_exercises (
                        template_id, position, exercise_id, target_sets,
                        target_reps, rest_secs, note
                    )
                    VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7)
                ",
            )
            .bind(template_id)
            .bind(id_i64("position", position as u64)?)
            .bind(id_i64("exercise_id", slot.exercise_id().value())?)
            .bind(i64::from(slot.target_sets))
            .bind(i64::from(slot.target_reps))
            .bind(slot.rest_secs.map(i64::from))
            .bind(slot.note.as_deref())
            .execute(&mut *tx)
            .await
            .map_err(conn)?;
        }

        tx.commit().await.map_err(conn)?;
        Ok(())
    }

    async fn get_template(&self, id: TemplateId) -> Result<Template, StorageError> {
        let template_id = id_i64("template_id", id.value())?;
        let row = sqlx::query("SELECT id, name FROM templates WHERE id = ?1")
            .bind(template_id)
            .fetch_optional(&self.pool)
            .await
            .map_err(conn)?
            .ok_or(StorageError::NotFound)?;

        let name: String = row.try_get("name").map_err(ser)?;
        self.load_template(template_id, name).await
    }

    async fn list_templates(&self) -> Result<Vec<Template>, StorageError> {
        let rows = sqlx::query("SELECT id, name FROM templates ORDER BY id ASC")
            .fetch_all(&self.pool)
            .await
            .map_err(conn)?;

        let mut out = Vec::with_capacity(rows.len());
        for row in rows {
            let id: i64 = row.try_get("id").map_err(ser)?;
            let name: String = row.try_get("name").map_err(ser)?;
            out.push(self.load_template(id, name).await?);
        }
        Ok(out)
    }
}
