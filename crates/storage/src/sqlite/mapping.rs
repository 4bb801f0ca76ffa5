use sqlx::Row;
use std::str::FromStr;
use workout_core::model::{
    Effort, Exercise, ExerciseId, MeasureType, SetId, TemplateId, Weight, WorkoutSet,
};

use crate::repository::StorageError;

pub(crate) fn ser<E: core::fmt::Display>(e: E) -> StorageError {
    StorageError::Serialization(e.to_string())
}

pub(crate) fn conn(e: sqlx::Error) -> StorageError {
    StorageError::Connection(e.to_string())
}

pub(crate) fn id_i64(field: &'static str, v: u64) -> Result<i64, StorageError> {
    i64::try_from(v).map_err(|_| StorageError::Serialization(format!("{field} overflow")))
}

pub(crate) fn u64_from_i64(field: &'static str, v: i64) -> Result<u64, StorageError> {
    u64::try_from(v).map_err(|_| StorageError::Serialization(format!("{field} sign overflow")))
}

pub(crate) fn u32_from_i64(field: &'static str, v: i64) -> Result<u32, StorageError> {
    u32::try_from(v).map_err(|_| StorageError::Serialization(format!("invalid {field}: {v}")))
}

pub(crate) fn opt_u32_from_i64(
    field: &'static str,
    v: Option<i64>,
) -> Result<Option<u32>, StorageError> {
    v.map(|raw| u32_from_i64(field, raw)).transpose()
}

pub(crate) fn exercise_id_from_i64(v: i64) -> Result<ExerciseId, StorageError> {
    Ok(ExerciseId::new(u64_from_i64("exercise_id", v)?))
}

pub(crate) fn template_id_from_i64(v: i64) -> Result<TemplateId, StorageError> {
    Ok(TemplateId::new(u64_from_i64("template_id", v)?))
}

/// Parses one of the UUID-backed identifiers stored as TEXT.
pub(crate) fn parse_uuid_id<T: FromStr>(field: &'static str, raw: &str) -> Result<T, StorageError> {
    raw.parse::<T>()
        .map_err(|_| StorageError::Serialization(format!("invalid {field}: {raw}")))
}

pub(crate) fn parse_measure(s: &str) -> Result<MeasureType, StorageError> {
    MeasureType::parse(s)
        .ok_or_else(|| StorageError::Serialization(format!("invalid measure: {s}")))
}

/// Storage encoding for effort: a kind tag plus a numeric value.
pub(crate) fn effort_to_columns(effort: Option<Effort>) -> (Option<&'static str>, Option<f64>) {
    match effort {
        Some(Effort::Rpe(value)) => (Some("rpe"), Some(f64::from(value))),
        Some(Effort::Rir(value)) => (Some("rir"), Some(f64::from(value))),
        None => (None, None),
    }
}

/// Inverse of `effort_to_columns`.
#[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss)]
pub(crate) fn effort_from_columns(
    kind: Option<&str>,
    value: Option<f64>,
) -> Result<Option<Effort>, StorageError> {
    match (kind, value) {
        (None, _) => Ok(None),
        (Some("rpe"), Some(v)) => Effort::rpe(v as f32).map(Some).map_err(ser),
        (Some("rir"), Some(v)) if (0.0..=255.0).contains(&v) => {
            Effort::rir(v.round() as u8).map(Some).map_err(ser)
        }
        (Some(other), v) => Err(StorageError::Serialization(format!(
            "invalid effort: {other} {v:?}"
        ))),
    }
}

pub(crate) fn map_exercise_row(row: &sqlx::sqlite::SqliteRow) -> Result<Exercise, StorageError> {
    let measure: String = row.try_get("measure").map_err(ser)?;
    Exercise::new(
        exercise_id_from_i64(row.try_get::<i64, _>("id").map_err(ser)?)?,
        row.try_get::<String, _>("name").map_err(ser)?,
        row.try_get::<String, _>("category").map_err(ser)?,
        parse_measure(&measure)?,
    )
    .map_err(ser)
}

pub(crate) fn map_set_row(row: &sqlx::sqlite::SqliteRow) -> Result<WorkoutSet, StorageError> {
    let id: String = row.try_get("id").map_err(ser)?;
    let weight_grams = u32_from_i64(
        "weight_grams",
        row.try_get::<i64, _>("weight_grams").map_err(ser)?,
    )?;
    let effort_kind: Option<String> = row.try_get("effort_kind").map_err(ser)?;
    let effort = effort_from_columns(
        effort_kind.as_deref(),
        row.try_get::<Option<f64>, _>("effort_value").map_err(ser)?,
    )?;

    Ok(WorkoutSet::from_persisted(
        parse_uuid_id::<SetId>("set id", &id)?,
        u32_from_i64("order_index", row.try_get::<i64, _>("order_index").map_err(ser)?)?,
        Weight::from_grams(weight_grams),
        u32_from_i64("reps", row.try_get::<i64, _>("reps").map_err(ser)?)?,
        row.try_get::<bool, _>("completed").map_err(ser)?,
        effort,
        row.try_get::<bool, _>("is_personal_record").map_err(ser)?,
        opt_u32_from_i64("time_secs", row.try_get::<Option<i64>, _>("time_secs").map_err(ser)?)?,
        row.try_get::<Option<f64>, _>("distance_m").map_err(ser)?,
    ))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn effort_columns_roundtrip() {
        let rpe = Effort::rpe(8.5).unwrap();
        let (kind, value) = effort_to_columns(Some(rpe));
        assert_eq!(effort_from_columns(kind, value).unwrap(), Some(rpe));

        let rir = Effort::rir(2).unwrap();
        let (kind, value) = effort_to_columns(Some(rir));
        assert_eq!(effort_from_columns(kind, value).unwrap(), Some(rir));

        assert_eq!(effort_from_columns(None, None).unwrap(), None);
    }

    #[test]
    fn unknown_effort_kind_is_rejected() {
        let err = effort_from_columns(Some("borg"), Some(12.0)).unwrap_err();
        assert!(matches!(err, StorageError::Serialization(_)));
    }

    #[test]
    fn negative_ids_are_rejected() {
        assert!(exercise_id_from_i64(-1).is_err());
        assert_eq!(template_id_from_i64(4).unwrap(), TemplateId::new(4));
    }
}
