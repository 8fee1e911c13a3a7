//! Database operations for the `calculation_runs` ledger.

use chrono::{DateTime, Utc};
use pmatch_engine::RunIssue;
use sqlx::PgPool;
use uuid::Uuid;

use crate::DbError;

const RUN_COLUMNS: &str = "id, public_id, role_id, trigger_source, status, result_count, \
                           issues, error_message, started_at, completed_at";

/// A row from the `calculation_runs` table.
#[derive(Debug, Clone, sqlx::FromRow)]
pub struct CalculationRunRow {
    pub id: i64,
    pub public_id: Uuid,
    pub role_id: i64,
    pub trigger_source: String,
    pub status: String,
    pub result_count: i32,
    /// JSON array of the run's issues; empty until the run completes.
    pub issues: serde_json::Value,
    pub error_message: Option<String>,
    pub started_at: DateTime<Utc>,
    pub completed_at: Option<DateTime<Utc>>,
}

/// Opens a ledger entry in `running` status.
///
/// # Errors
///
/// Returns [`DbError::Sqlx`] if the insert fails.
pub async fn create_calculation_run(
    pool: &PgPool,
    role_id: i64,
    trigger_source: &str,
) -> Result<CalculationRunRow, DbError> {
    let row = sqlx::query_as::<_, CalculationRunRow>(&format!(
        "INSERT INTO calculation_runs (public_id, role_id, trigger_source, status) \
         VALUES ($1, $2, $3, 'running') \
         RETURNING {RUN_COLUMNS}"
    ))
    .bind(Uuid::new_v4())
    .bind(role_id)
    .bind(trigger_source)
    .fetch_one(pool)
    .await?;

    Ok(row)
}

/// Marks a run as `succeeded` and records its result count and issues.
///
/// # Errors
///
/// Returns [`DbError::InvalidCalculationRunTransition`] if the run is not
/// `running`, or [`DbError::Sqlx`] if the update fails.
pub async fn complete_calculation_run(
    pool: &PgPool,
    id: i64,
    result_count: i32,
    issues: &[RunIssue],
) -> Result<(), DbError> {
    let issues = serde_json::to_value(issues)?;

    let result = sqlx::query(
        "UPDATE calculation_runs \
         SET status = 'succeeded', completed_at = NOW(), result_count = $1, issues = $2 \
         WHERE id = $3 AND status = 'running'",
    )
    .bind(result_count)
    .bind(issues)
    .bind(id)
    .execute(pool)
    .await?;

    if result.rows_affected() == 0 {
        return Err(DbError::InvalidCalculationRunTransition {
            id,
            expected_status: "running",
        });
    }

    Ok(())
}

/// Marks a run as `failed` and records the error.
///
/// # Errors
///
/// Returns [`DbError::InvalidCalculationRunTransition`] if the run is not
/// `running`, or [`DbError::Sqlx`] if the update fails.
pub async fn fail_calculation_run(
    pool: &PgPool,
    id: i64,
    error_message: &str,
) -> Result<(), DbError> {
    let result = sqlx::query(
        "UPDATE calculation_runs \
         SET status = 'failed', completed_at = NOW(), error_message = $1 \
         WHERE id = $2 AND status = 'running'",
    )
    .bind(error_message)
    .bind(id)
    .execute(pool)
    .await?;

    if result.rows_affected() == 0 {
        return Err(DbError::InvalidCalculationRunTransition {
            id,
            expected_status: "running",
        });
    }

    Ok(())
}

/// Fetches a single run by its internal `id`.
///
/// # Errors
///
/// Returns [`DbError::NotFound`] if no row exists with the given `id`, or
/// [`DbError::Sqlx`] if the query fails.
pub async fn get_calculation_run(pool: &PgPool, id: i64) -> Result<CalculationRunRow, DbError> {
    let row = sqlx::query_as::<_, CalculationRunRow>(&format!(
        "SELECT {RUN_COLUMNS} FROM calculation_runs WHERE id = $1"
    ))
    .bind(id)
    .fetch_optional(pool)
    .await?
    .ok_or(DbError::NotFound)?;

    Ok(row)
}

/// Returns the most recent `limit` runs for a role, newest first.
///
/// # Errors
///
/// Returns [`DbError::Sqlx`] if the query fails.
pub async fn list_calculation_runs(
    pool: &PgPool,
    role_id: i64,
    limit: i64,
) -> Result<Vec<CalculationRunRow>, DbError> {
    let rows = sqlx::query_as::<_, CalculationRunRow>(&format!(
        "SELECT {RUN_COLUMNS} FROM calculation_runs \
         WHERE role_id = $1 \
         ORDER BY started_at DESC, id DESC \
         LIMIT $2"
    ))
    .bind(role_id)
    .bind(limit)
    .fetch_all(pool)
    .await?;

    Ok(rows)
}
