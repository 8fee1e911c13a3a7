//! Database operations for `profile_match_results`.

use chrono::{DateTime, Utc};
use pmatch_engine::{AspectBreakdown, CalculationRun};
use rust_decimal::Decimal;
use sqlx::PgPool;

use crate::numeric::{to_decimal_dp, to_f64};
use crate::DbError;

/// Scale of the `total_score` column.
const TOTAL_SCORE_SCALE: u32 = 6;

const SELECT_RESULTS: &str = "SELECT r.id, r.candidate_id, c.nik AS candidate_nik, \
            c.name AS candidate_name, r.role_id, ro.name AS role_name, \
            r.calculation_run_id, r.total_score, r.rank, r.details, r.created_at \
     FROM profile_match_results r \
     JOIN candidates c ON c.id = r.candidate_id \
     JOIN roles ro ON ro.id = r.role_id";

// ---------------------------------------------------------------------------
// Row types
// ---------------------------------------------------------------------------

/// A stored result joined with its candidate and role names.
#[derive(Debug, Clone, sqlx::FromRow)]
pub struct MatchResultRow {
    pub id: i64,
    pub candidate_id: i64,
    pub candidate_nik: String,
    pub candidate_name: String,
    pub role_id: i64,
    pub role_name: String,
    pub calculation_run_id: Option<i64>,
    pub total_score: Decimal,
    pub rank: i32,
    /// JSON array of per-aspect breakdowns.
    pub details: serde_json::Value,
    pub created_at: DateTime<Utc>,
}

impl MatchResultRow {
    /// Decode the stored per-aspect breakdown.
    ///
    /// # Errors
    ///
    /// Returns [`DbError::Json`] if `details` does not hold a breakdown array.
    pub fn breakdown(&self) -> Result<Vec<AspectBreakdown>, DbError> {
        Ok(serde_json::from_value(self.details.clone())?)
    }

    /// # Errors
    ///
    /// Returns [`DbError::NumericOutOfRange`] if the stored total cannot be
    /// read as `f64`.
    pub fn total_score_f64(&self) -> Result<f64, DbError> {
        to_f64("total_score", self.total_score)
    }
}

// ---------------------------------------------------------------------------
// Operations
// ---------------------------------------------------------------------------

/// Replace every stored result for the run's role with the run's results.
///
/// The delete and all inserts share one transaction, so readers see either
/// the previous ranking or the new one, never a mix. `calculation_run_id`
/// links the rows to the ledger entry that produced them.
///
/// Returns the inserted ids in rank order.
///
/// # Errors
///
/// Returns [`DbError::Sqlx`] if any statement fails, or a conversion error if
/// a score or rank cannot be stored.
pub async fn replace_role_results(
    pool: &PgPool,
    run: &CalculationRun,
    calculation_run_id: Option<i64>,
) -> Result<Vec<i64>, DbError> {
    let mut tx = pool.begin().await?;

    let deleted = sqlx::query("DELETE FROM profile_match_results WHERE role_id = $1")
        .bind(run.role_id)
        .execute(&mut *tx)
        .await?
        .rows_affected();

    let mut ids = Vec::with_capacity(run.results.len());
    for result in &run.results {
        let total_score = to_decimal_dp("total_score", result.total_score, TOTAL_SCORE_SCALE)?;
        let rank = i32::try_from(result.rank).map_err(|_| DbError::RankOutOfRange(result.rank))?;
        let details = serde_json::to_value(&result.details)?;

        let id: i64 = sqlx::query_scalar(
            "INSERT INTO profile_match_results \
                 (candidate_id, role_id, calculation_run_id, total_score, rank, details) \
             VALUES ($1, $2, $3, $4, $5, $6) \
             RETURNING id",
        )
        .bind(result.candidate_id)
        .bind(result.role_id)
        .bind(calculation_run_id)
        .bind(total_score)
        .bind(rank)
        .bind(details)
        .fetch_one(&mut *tx)
        .await?;

        ids.push(id);
    }

    tx.commit().await?;

    tracing::info!(
        role_id = run.role_id,
        deleted,
        inserted = ids.len(),
        "replaced role results"
    );
    Ok(ids)
}

/// Results for one role, best rank first.
///
/// # Errors
///
/// Returns [`DbError::Sqlx`] if the query fails.
pub async fn list_results_by_role(
    pool: &PgPool,
    role_id: i64,
) -> Result<Vec<MatchResultRow>, DbError> {
    let rows = sqlx::query_as::<_, MatchResultRow>(&format!(
        "{SELECT_RESULTS} WHERE r.role_id = $1 ORDER BY r.rank, r.id"
    ))
    .bind(role_id)
    .fetch_all(pool)
    .await?;

    Ok(rows)
}

/// Every stored result, grouped by role and ranked within each role.
///
/// # Errors
///
/// Returns [`DbError::Sqlx`] if the query fails.
pub async fn list_all_results(pool: &PgPool) -> Result<Vec<MatchResultRow>, DbError> {
    let rows = sqlx::query_as::<_, MatchResultRow>(&format!(
        "{SELECT_RESULTS} ORDER BY r.role_id, r.rank, r.id"
    ))
    .fetch_all(pool)
    .await?;

    Ok(rows)
}

/// Fetches a single result by id.
///
/// # Errors
///
/// Returns [`DbError::NotFound`] if no row exists with the given `id`, or
/// [`DbError::Sqlx`] if the query fails.
pub async fn get_result(pool: &PgPool, id: i64) -> Result<MatchResultRow, DbError> {
    let row = sqlx::query_as::<_, MatchResultRow>(&format!("{SELECT_RESULTS} WHERE r.id = $1"))
        .bind(id)
        .fetch_optional(pool)
        .await?
        .ok_or(DbError::NotFound)?;

    Ok(row)
}
