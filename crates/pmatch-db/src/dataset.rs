//! Loading the inputs of one calculation run.

use chrono::NaiveDate;
use pmatch_core::{ActualValue, Aspect, Candidate, Criterion, Role, RoleDataset, Target};
use rust_decimal::Decimal;
use sqlx::PgPool;

use crate::numeric::to_f64;
use crate::DbError;

// ---------------------------------------------------------------------------
// Row types
// ---------------------------------------------------------------------------

#[derive(Debug, sqlx::FromRow)]
struct RoleRow {
    id: i64,
    name: String,
    description: Option<String>,
}

#[derive(Debug, sqlx::FromRow)]
struct AspectRow {
    id: i64,
    name: String,
    description: Option<String>,
    weight_percent: Decimal,
}

#[derive(Debug, sqlx::FromRow)]
struct CriterionRow {
    id: i64,
    aspect_id: i64,
    code: String,
    name: String,
    is_core: bool,
    weight: Decimal,
}

#[derive(Debug, sqlx::FromRow)]
struct TargetRow {
    role_id: i64,
    criterion_id: i64,
    target_value: Decimal,
}

#[derive(Debug, sqlx::FromRow)]
struct CandidateRow {
    id: i64,
    nik: String,
    name: String,
    birth_date: Option<NaiveDate>,
    address: Option<String>,
    phone: Option<String>,
}

#[derive(Debug, sqlx::FromRow)]
struct ActualValueRow {
    candidate_id: i64,
    criterion_id: i64,
    value: Decimal,
}

// ---------------------------------------------------------------------------
// Queries
// ---------------------------------------------------------------------------

/// Load a role together with every record a calculation for it reads.
///
/// All reads share one `REPEATABLE READ, READ ONLY` transaction so the run
/// sees a single snapshot. Only values recorded against the role's targeted
/// criteria are loaded.
///
/// Returns `Ok(None)` when the role does not exist.
///
/// # Errors
///
/// Returns [`DbError::Sqlx`] if any query fails, or
/// [`DbError::NumericOutOfRange`] if a stored number cannot be read as `f64`.
pub async fn load_role_dataset(pool: &PgPool, role_id: i64) -> Result<Option<RoleDataset>, DbError> {
    let mut tx = pool.begin().await?;
    sqlx::query("SET TRANSACTION ISOLATION LEVEL REPEATABLE READ, READ ONLY")
        .execute(&mut *tx)
        .await?;

    let Some(role) = sqlx::query_as::<_, RoleRow>(
        "SELECT id, name, description FROM roles WHERE id = $1",
    )
    .bind(role_id)
    .fetch_optional(&mut *tx)
    .await?
    else {
        tx.commit().await?;
        return Ok(None);
    };

    let aspects = sqlx::query_as::<_, AspectRow>(
        "SELECT id, name, description, weight_percent FROM aspects ORDER BY id",
    )
    .fetch_all(&mut *tx)
    .await?;

    let criteria = sqlx::query_as::<_, CriterionRow>(
        "SELECT id, aspect_id, code, name, is_core, weight FROM criteria ORDER BY id",
    )
    .fetch_all(&mut *tx)
    .await?;

    let targets = sqlx::query_as::<_, TargetRow>(
        "SELECT role_id, criterion_id, target_value \
         FROM target_profiles \
         WHERE role_id = $1 \
         ORDER BY criterion_id",
    )
    .bind(role_id)
    .fetch_all(&mut *tx)
    .await?;

    let candidates = sqlx::query_as::<_, CandidateRow>(
        "SELECT id, nik, name, birth_date, address, phone FROM candidates ORDER BY id",
    )
    .fetch_all(&mut *tx)
    .await?;

    let values = sqlx::query_as::<_, ActualValueRow>(
        "SELECT av.candidate_id, av.criterion_id, av.value \
         FROM actual_values av \
         JOIN target_profiles tp \
           ON tp.criterion_id = av.criterion_id AND tp.role_id = $1 \
         ORDER BY av.candidate_id, av.criterion_id",
    )
    .bind(role_id)
    .fetch_all(&mut *tx)
    .await?;

    tx.commit().await?;

    tracing::debug!(
        role_id,
        aspects = aspects.len(),
        criteria = criteria.len(),
        targets = targets.len(),
        candidates = candidates.len(),
        values = values.len(),
        "loaded role dataset"
    );

    Ok(Some(RoleDataset {
        role: Role {
            id: role.id,
            name: role.name,
            description: role.description,
        },
        aspects: aspects
            .into_iter()
            .map(|row| {
                Ok(Aspect {
                    id: row.id,
                    name: row.name,
                    description: row.description,
                    weight_percent: to_f64("weight_percent", row.weight_percent)?,
                })
            })
            .collect::<Result<_, DbError>>()?,
        criteria: criteria
            .into_iter()
            .map(|row| {
                Ok(Criterion {
                    id: row.id,
                    aspect_id: row.aspect_id,
                    code: row.code,
                    name: row.name,
                    is_core: row.is_core,
                    weight: to_f64("weight", row.weight)?,
                })
            })
            .collect::<Result<_, DbError>>()?,
        targets: targets
            .into_iter()
            .map(|row| {
                Ok(Target {
                    role_id: row.role_id,
                    criterion_id: row.criterion_id,
                    target_value: to_f64("target_value", row.target_value)?,
                })
            })
            .collect::<Result<_, DbError>>()?,
        candidates: candidates
            .into_iter()
            .map(|row| Candidate {
                id: row.id,
                nik: row.nik,
                name: row.name,
                birth_date: row.birth_date,
                address: row.address,
                phone: row.phone,
            })
            .collect(),
        values: values
            .into_iter()
            .map(|row| {
                Ok(ActualValue {
                    candidate_id: row.candidate_id,
                    criterion_id: row.criterion_id,
                    value: to_f64("value", row.value)?,
                })
            })
            .collect::<Result<_, DbError>>()?,
    }))
}
