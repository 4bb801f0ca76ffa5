use sqlx::Row;

use super::SqliteRepository;
use super::mapping::{conn, id_i64, ser, u32_from_i64, u64_from_i64};
use crate::repository::{ProfileStats, ProfileStatsRepository, StorageError};

#[async_trait::async_trait]
impl ProfileStatsRepository for SqliteRepository {
    async fn record_workout_completed(
        &self,
        volume_kg: f64,
        duration_secs: u64,
        pr_count: u32,
    ) -> Result<(), StorageError> {
        sqlx::query(
            r"
                INSERT INTO profile_stats (
                    id, workouts, total_volume_kg, total_duration_secs, total_prs
                )
                VALUES (1, 1, ?1, ?2, ?3)
                ON CONFLICT(id) DO UPDATE SET
                    workouts = workouts + 1,
                    total_volume_kg = total_volume_kg + excluded.total_volume_kg,
                    total_duration_secs = total_duration_secs + excluded.total_duration_secs,
                    total_prs = total_prs + excluded.total_prs
            ",
        )
        .bind(volume_kg.max(0.0))
        .bind(id_i64("duration_secs", duration_secs)?)
        .bind(i64::from(pr_count))
        .execute(&self.pool)
        .await
        .map_err(conn)?;
        Ok(())
    }

    async fn get_stats(&self) -> Result<ProfileStats, StorageError> {
        let row = sqlx::query(
            r"
                SELECT workouts, total_volume_kg, total_duration_secs, total_prs
                FROM profile_stats
                WHERE id = 1
            ",
        )
        .fetch_optional(&self.pool)
        .await
        .map_err(conn)?;

        let Some(row) = row else {
            return Ok(ProfileStats::default());
        };

        Ok(ProfileStats {
            workouts: u32_from_i64("workouts", row.try_get::<i64, _>("workouts").map_err(ser)?)?,
            total_volume_kg: row.try_get("total_volume_kg").map_err(ser)?,
            total_duration_secs: u64_from_i64(
                "total_duration_secs",
                row.try_get::<i64, _>("total_duration_secs").map_err(ser)?,
            )?,
            total_prs: u32_from_i64("total_prs", row.try_get::<i64, _>("total_prs").map_err(ser)?)?,
        })
    }
}
