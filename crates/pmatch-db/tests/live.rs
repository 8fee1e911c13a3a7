//! Live integration tests for pmatch-db using `#[sqlx::test]`.
//!
//! Each test gets a fresh, fully-migrated Postgres database spun up by the
//! sqlx test harness. The `migrations` path is relative to the crate root
//! (`crates/pmatch-db/`), so `"../../migrations"` resolves to the workspace
//! migration directory.

use std::path::Path;

use pmatch_core::{load_dataset, Dataset};
use pmatch_db::{
    complete_calculation_run, create_calculation_run, fail_calculation_run, get_calculation_run,
    get_result, list_all_results, list_calculation_runs, list_results_by_role, load_role_dataset,
    replace_role_results, seed_dataset, DbError,
};
use pmatch_engine::{calculate, CalculationRequest, CalculationRun, EngineOptions, RunIssue};

// ---------------------------------------------------------------------------
// Helpers
// ---------------------------------------------------------------------------

fn sample_dataset() -> Dataset {
    load_dataset(Path::new("../../config/dataset.yaml"))
        .unwrap_or_else(|e| panic!("sample dataset should load: {e}"))
}

async fn seeded_pool(pool: &sqlx::PgPool) -> Dataset {
    let dataset = sample_dataset();
    seed_dataset(pool, &dataset)
        .await
        .expect("seed_dataset failed");
    dataset
}

async fn calculate_role(pool: &sqlx::PgPool, role_id: i64) -> CalculationRun {
    let role_dataset = load_role_dataset(pool, role_id)
        .await
        .expect("load_role_dataset failed")
        .expect("role should exist");
    calculate(
        &role_dataset,
        &CalculationRequest::for_role(role_id),
        &EngineOptions::default(),
    )
    .expect("calculate failed")
}

async fn count(pool: &sqlx::PgPool, table: &str) -> i64 {
    sqlx::query_scalar::<_, i64>(&format!("SELECT COUNT(*) FROM {table}"))
        .fetch_one(pool)
        .await
        .unwrap_or_else(|e| panic!("count of {table} failed: {e}"))
}

// ---------------------------------------------------------------------------
// Section 1: Seeding and loading
// ---------------------------------------------------------------------------

#[sqlx::test(migrations = "../../migrations")]
async fn seed_dataset_inserts_every_record(pool: sqlx::PgPool) {
    let dataset = sample_dataset();
    let seeded = seed_dataset(&pool, &dataset)
        .await
        .expect("seed_dataset failed");

    let expected = dataset.roles.len()
        + dataset.aspects.len()
        + dataset.criteria.len()
        + dataset.targets.len()
        + dataset.candidates.len()
        + dataset.values.len();
    assert_eq!(seeded, expected);
    assert_eq!(count(&pool, "roles").await, 3);
    assert_eq!(count(&pool, "criteria").await, 8);
    assert_eq!(count(&pool, "actual_values").await, 31);
}

#[sqlx::test(migrations = "../../migrations")]
async fn seed_dataset_is_idempotent(pool: sqlx::PgPool) {
    let dataset = seeded_pool(&pool).await;
    seed_dataset(&pool, &dataset)
        .await
        .expect("second seed_dataset failed");

    assert_eq!(count(&pool, "candidates").await, 4);
    assert_eq!(count(&pool, "target_profiles").await, 14);
    assert_eq!(count(&pool, "actual_values").await, 31);
}

#[sqlx::test(migrations = "../../migrations")]
async fn seed_rejects_values_the_columns_would_round(pool: sqlx::PgPool) {
    let mut dataset = sample_dataset();
    dataset.values[0].value = 3.125;

    let result = seed_dataset(&pool, &dataset).await;

    assert!(
        matches!(result, Err(DbError::InvalidNumeric { field: "value", .. })),
        "expected InvalidNumeric, got {result:?}"
    );
    assert_eq!(count(&pool, "roles").await, 0, "seed should roll back");
    assert_eq!(count(&pool, "actual_values").await, 0);
}

#[sqlx::test(migrations = "../../migrations")]
async fn seeding_advances_id_sequences(pool: sqlx::PgPool) {
    seeded_pool(&pool).await;

    let id: i64 = sqlx::query_scalar("INSERT INTO roles (name) VALUES ('Mandor') RETURNING id")
        .fetch_one(&pool)
        .await
        .expect("insert after seed failed");
    assert_eq!(id, 4);
}

#[sqlx::test(migrations = "../../migrations")]
async fn load_role_dataset_returns_role_records(pool: sqlx::PgPool) {
    seeded_pool(&pool).await;

    let data = load_role_dataset(&pool, 2)
        .await
        .expect("load_role_dataset failed")
        .expect("role 2 should exist");

    assert_eq!(data.role.name, "Supervisor Quality Control");
    assert_eq!(data.aspects.len(), 3);
    assert_eq!(data.criteria.len(), 8);
    assert_eq!(data.targets.len(), 6);
    assert!(data.targets.iter().all(|t| t.role_id == 2));
    assert_eq!(data.candidates.len(), 4);
    // Values on criteria 2 and 5 are not targeted by role 2.
    assert_eq!(data.values.len(), 23);
    assert!((data.aspects[0].weight_percent - 40.0).abs() < f64::EPSILON);
}

#[sqlx::test(migrations = "../../migrations")]
async fn load_role_dataset_unknown_role_is_none(pool: sqlx::PgPool) {
    seeded_pool(&pool).await;

    let data = load_role_dataset(&pool, 99)
        .await
        .expect("load_role_dataset failed");
    assert!(data.is_none());
}

#[sqlx::test(migrations = "../../migrations")]
async fn database_load_matches_file_slice(pool: sqlx::PgPool) {
    let dataset = seeded_pool(&pool).await;

    let from_db = calculate_role(&pool, 1).await;
    let from_file = calculate(
        &dataset.role_dataset(1).expect("role 1 in file"),
        &CalculationRequest::for_role(1),
        &EngineOptions::default(),
    )
    .expect("calculate from file failed");

    assert_eq!(from_db, from_file);
}

// ---------------------------------------------------------------------------
// Section 2: Results
// ---------------------------------------------------------------------------

#[sqlx::test(migrations = "../../migrations")]
async fn replace_role_results_stores_ranked_results(pool: sqlx::PgPool) {
    seeded_pool(&pool).await;
    let run = calculate_role(&pool, 1).await;
    assert_eq!(run.results.len(), 3, "TK004 lacks P2 and is excluded");
    assert_eq!(run.excluded_candidates(), vec![4]);

    let ids = replace_role_results(&pool, &run, None)
        .await
        .expect("replace_role_results failed");
    assert_eq!(ids.len(), 3);

    let rows = list_results_by_role(&pool, 1)
        .await
        .expect("list_results_by_role failed");
    let ranks: Vec<i32> = rows.iter().map(|r| r.rank).collect();
    assert_eq!(ranks, vec![1, 2, 3]);
    assert_eq!(rows.iter().map(|r| r.id).collect::<Vec<_>>(), ids);

    for (row, result) in rows.iter().zip(&run.results) {
        assert_eq!(row.candidate_id, result.candidate_id);
        assert_eq!(row.role_name, "Operator Produksi");
        let total = row.total_score_f64().expect("total_score as f64");
        assert!((total - result.total_score).abs() < 1e-9);
        assert_eq!(row.breakdown().expect("breakdown"), result.details);
    }
}

#[sqlx::test(migrations = "../../migrations")]
async fn replace_role_results_removes_previous_ranking(pool: sqlx::PgPool) {
    seeded_pool(&pool).await;
    let run = calculate_role(&pool, 1).await;

    let first = replace_role_results(&pool, &run, None)
        .await
        .expect("first replace failed");
    let second = replace_role_results(&pool, &run, None)
        .await
        .expect("second replace failed");

    assert_eq!(count(&pool, "profile_match_results").await, 3);
    assert!(first.iter().all(|id| !second.contains(id)));
}

#[sqlx::test(migrations = "../../migrations")]
async fn replace_role_results_leaves_other_roles_alone(pool: sqlx::PgPool) {
    seeded_pool(&pool).await;
    let operator = calculate_role(&pool, 1).await;
    let supervisor = calculate_role(&pool, 2).await;

    replace_role_results(&pool, &operator, None)
        .await
        .expect("replace role 1 failed");
    replace_role_results(&pool, &supervisor, None)
        .await
        .expect("replace role 2 failed");
    replace_role_results(&pool, &operator, None)
        .await
        .expect("replace role 1 again failed");

    let all = list_all_results(&pool).await.expect("list_all_results failed");
    let role_ids: Vec<i64> = all.iter().map(|r| r.role_id).collect();
    assert_eq!(role_ids, vec![1, 1, 1, 2, 2, 2]);
}

#[sqlx::test(migrations = "../../migrations")]
async fn get_result_missing_id_is_not_found(pool: sqlx::PgPool) {
    let err = get_result(&pool, 12_345).await.unwrap_err();
    assert!(matches!(err, DbError::NotFound));
}

// ---------------------------------------------------------------------------
// Section 3: Calculation run ledger
// ---------------------------------------------------------------------------

#[sqlx::test(migrations = "../../migrations")]
async fn calculation_run_lifecycle_running_to_succeeded(pool: sqlx::PgPool) {
    seeded_pool(&pool).await;
    let ledger = create_calculation_run(&pool, 1, "cli")
        .await
        .expect("create_calculation_run failed");
    assert_eq!(ledger.status, "running");
    assert!(ledger.completed_at.is_none());

    let run = calculate_role(&pool, 1).await;
    let ids = replace_role_results(&pool, &run, Some(ledger.id))
        .await
        .expect("replace_role_results failed");
    let result_count = i32::try_from(ids.len()).expect("result count fits i32");
    complete_calculation_run(&pool, ledger.id, result_count, &run.issues)
        .await
        .expect("complete_calculation_run failed");

    let stored = get_calculation_run(&pool, ledger.id)
        .await
        .expect("get_calculation_run failed");
    assert_eq!(stored.status, "succeeded");
    assert_eq!(stored.result_count, 3);
    assert!(stored.completed_at.is_some());

    let issues: Vec<RunIssue> =
        serde_json::from_value(stored.issues).expect("issues should decode");
    assert_eq!(issues, run.issues);

    let result = get_result(&pool, ids[0]).await.expect("get_result failed");
    assert_eq!(result.calculation_run_id, Some(ledger.id));
}

#[sqlx::test(migrations = "../../migrations")]
async fn calculation_run_lifecycle_running_to_failed(pool: sqlx::PgPool) {
    seeded_pool(&pool).await;
    let ledger = create_calculation_run(&pool, 3, "cli")
        .await
        .expect("create_calculation_run failed");

    fail_calculation_run(&pool, ledger.id, "role 3 has no target profile")
        .await
        .expect("fail_calculation_run failed");

    let stored = get_calculation_run(&pool, ledger.id)
        .await
        .expect("get_calculation_run failed");
    assert_eq!(stored.status, "failed");
    assert_eq!(
        stored.error_message.as_deref(),
        Some("role 3 has no target profile")
    );
}

#[sqlx::test(migrations = "../../migrations")]
async fn finished_run_rejects_further_transitions(pool: sqlx::PgPool) {
    seeded_pool(&pool).await;
    let ledger = create_calculation_run(&pool, 1, "cli")
        .await
        .expect("create_calculation_run failed");
    complete_calculation_run(&pool, ledger.id, 0, &[])
        .await
        .expect("complete_calculation_run failed");

    let err = fail_calculation_run(&pool, ledger.id, "late failure")
        .await
        .unwrap_err();
    assert!(matches!(
        err,
        DbError::InvalidCalculationRunTransition {
            expected_status: "running",
            ..
        }
    ));
}

#[sqlx::test(migrations = "../../migrations")]
async fn list_calculation_runs_is_newest_first(pool: sqlx::PgPool) {
    seeded_pool(&pool).await;
    let first = create_calculation_run(&pool, 1, "cli")
        .await
        .expect("first run failed");
    let second = create_calculation_run(&pool, 1, "cli")
        .await
        .expect("second run failed");
    create_calculation_run(&pool, 2, "cli")
        .await
        .expect("other role run failed");

    let runs = list_calculation_runs(&pool, 1, 10)
        .await
        .expect("list_calculation_runs failed");
    let ids: Vec<i64> = runs.iter().map(|r| r.id).collect();
    assert_eq!(ids, vec![second.id, first.id]);
}
