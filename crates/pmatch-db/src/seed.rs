use pmatch_core::Dataset;
use sqlx::PgPool;

use crate::numeric::to_stored_decimal;
use crate::DbError;

/// Tables whose `BIGSERIAL` sequence must move past explicitly seeded ids.
const SEEDED_TABLES: &[&str] = &["roles", "aspects", "criteria", "candidates"];

/// Upsert every record of a dataset file into the database.
///
/// Rows keep the ids given in the dataset. Targets and actual values are
/// keyed on their composite keys. Returns the number of records processed.
/// All upserts run inside a single transaction; if any operation fails the
/// entire batch is rolled back.
///
/// # Errors
///
/// Returns [`DbError::Sqlx`] if any database operation fails, or
/// [`DbError::InvalidNumeric`] if a number cannot be stored.
pub async fn seed_dataset(pool: &PgPool, dataset: &Dataset) -> Result<usize, DbError> {
    let mut tx = pool.begin().await?;
    let mut count = 0usize;

    for role in &dataset.roles {
        sqlx::query(
            "INSERT INTO roles (id, name, description) \
             VALUES ($1, $2, $3) \
             ON CONFLICT (id) DO UPDATE SET \
                 name = EXCLUDED.name, \
                 description = EXCLUDED.description, \
                 updated_at = NOW()",
        )
        .bind(role.id)
        .bind(&role.name)
        .bind(&role.description)
        .execute(&mut *tx)
        .await?;
        count += 1;
    }

    for aspect in &dataset.aspects {
        sqlx::query(
            "INSERT INTO aspects (id, name, description, weight_percent) \
             VALUES ($1, $2, $3, $4) \
             ON CONFLICT (id) DO UPDATE SET \
                 name = EXCLUDED.name, \
                 description = EXCLUDED.description, \
                 weight_percent = EXCLUDED.weight_percent, \
                 updated_at = NOW()",
        )
        .bind(aspect.id)
        .bind(&aspect.name)
        .bind(&aspect.description)
        .bind(to_stored_decimal("weight_percent", aspect.weight_percent)?)
        .execute(&mut *tx)
        .await?;
        count += 1;
    }

    for criterion in &dataset.criteria {
        sqlx::query(
            "INSERT INTO criteria (id, aspect_id, code, name, is_core, weight) \
             VALUES ($1, $2, $3, $4, $5, $6) \
             ON CONFLICT (id) DO UPDATE SET \
                 aspect_id = EXCLUDED.aspect_id, \
                 code = EXCLUDED.code, \
                 name = EXCLUDED.name, \
                 is_core = EXCLUDED.is_core, \
                 weight = EXCLUDED.weight, \
                 updated_at = NOW()",
        )
        .bind(criterion.id)
        .bind(criterion.aspect_id)
        .bind(&criterion.code)
        .bind(&criterion.name)
        .bind(criterion.is_core)
        .bind(to_stored_decimal("weight", criterion.weight)?)
        .execute(&mut *tx)
        .await?;
        count += 1;
    }

    for target in &dataset.targets {
        sqlx::query(
            "INSERT INTO target_profiles (role_id, criterion_id, target_value) \
             VALUES ($1, $2, $3) \
             ON CONFLICT (role_id, criterion_id) DO UPDATE SET \
                 target_value = EXCLUDED.target_value, \
                 updated_at = NOW()",
        )
        .bind(target.role_id)
        .bind(target.criterion_id)
        .bind(to_stored_decimal("target_value", target.target_value)?)
        .execute(&mut *tx)
        .await?;
        count += 1;
    }

    for candidate in &dataset.candidates {
        sqlx::query(
            "INSERT INTO candidates (id, nik, name, birth_date, address, phone) \
             VALUES ($1, $2, $3, $4, $5, $6) \
             ON CONFLICT (id) DO UPDATE SET \
                 nik = EXCLUDED.nik, \
                 name = EXCLUDED.name, \
                 birth_date = EXCLUDED.birth_date, \
                 address = EXCLUDED.address, \
                 phone = EXCLUDED.phone, \
                 updated_at = NOW()",
        )
        .bind(candidate.id)
        .bind(&candidate.nik)
        .bind(&candidate.name)
        .bind(candidate.birth_date)
        .bind(&candidate.address)
        .bind(&candidate.phone)
        .execute(&mut *tx)
        .await?;
        count += 1;
    }

    for value in &dataset.values {
        sqlx::query(
            "INSERT INTO actual_values (candidate_id, criterion_id, value) \
             VALUES ($1, $2, $3) \
             ON CONFLICT (candidate_id, criterion_id) DO UPDATE SET \
                 value = EXCLUDED.value, \
                 updated_at = NOW()",
        )
        .bind(value.candidate_id)
        .bind(value.criterion_id)
        .bind(to_stored_decimal("value", value.value)?)
        .execute(&mut *tx)
        .await?;
        count += 1;
    }

    for table in SEEDED_TABLES {
        sqlx::query(&format!(
            "SELECT setval(pg_get_serial_sequence('{table}', 'id'), \
                    COALESCE((SELECT MAX(id) FROM {table}), 0) + 1, false)"
        ))
        .execute(&mut *tx)
        .await?;
    }

    tx.commit().await?;

    tracing::info!(records = count, "dataset seeded");
    Ok(count)
}
