//! `calculate` command handlers.
//!
//! The database path records every stored run in the `calculation_runs`
//! ledger; the offline path reads the dataset file and only prints.

use std::collections::HashMap;

use anyhow::anyhow;
use pmatch_core::{AppConfig, RoleDataset};
use pmatch_engine::{calculate, CalculationRequest, CalculationRun, EngineOptions, IssueSeverity};

fn engine_options(config: &AppConfig) -> EngineOptions {
    EngineOptions {
        weight_sum_tolerance: config.weight_sum_tolerance,
    }
}

fn request(role_id: i64, candidate_ids: Vec<i64>) -> CalculationRequest {
    CalculationRequest {
        role_id,
        candidate_ids,
    }
}

/// Rank candidates from the dataset file and print the result.
///
/// # Errors
///
/// Returns an error if the dataset cannot be loaded, the role is not in it,
/// or the engine rejects the inputs.
pub(crate) fn run_calculate_offline(
    config: &AppConfig,
    role_id: i64,
    candidate_ids: Vec<i64>,
) -> anyhow::Result<()> {
    let dataset = pmatch_core::load_dataset(&config.dataset_path)?;
    let role_dataset = dataset.role_dataset(role_id).ok_or_else(|| {
        anyhow!(
            "role {role_id} not found in {}",
            config.dataset_path.display()
        )
    })?;

    let run = calculate(
        &role_dataset,
        &request(role_id, candidate_ids),
        &engine_options(config),
    )?;
    print_run(&role_dataset, &run);
    Ok(())
}

/// Rank candidates from the database and replace the role's stored results.
///
/// When `dry_run` is `true` the ranking is printed and nothing is written,
/// not even a ledger entry.
///
/// # Errors
///
/// Returns an error if the role does not exist, the engine rejects the
/// inputs, or any database operation fails. Failures after the ledger entry
/// is created also mark the entry as failed.
pub(crate) async fn run_calculate(
    pool: &sqlx::PgPool,
    config: &AppConfig,
    role_id: i64,
    candidate_ids: Vec<i64>,
    dry_run: bool,
) -> anyhow::Result<()> {
    let role_dataset = pmatch_db::load_role_dataset(pool, role_id)
        .await?
        .ok_or_else(|| anyhow!("role {role_id} not found; run `db seed` first"))?;
    let request = request(role_id, candidate_ids);
    let options = engine_options(config);

    if dry_run {
        let run = calculate(&role_dataset, &request, &options)?;
        print_run(&role_dataset, &run);
        println!("dry-run: results not stored");
        return Ok(());
    }

    let ledger = pmatch_db::create_calculation_run(pool, role_id, "cli").await?;

    let run = match calculate(&role_dataset, &request, &options) {
        Ok(run) => run,
        Err(e) => {
            fail_run_best_effort(pool, ledger.id, e.to_string()).await;
            return Err(e.into());
        }
    };

    let ids = match pmatch_db::replace_role_results(pool, &run, Some(ledger.id)).await {
        Ok(ids) => ids,
        Err(e) => {
            fail_run_best_effort(pool, ledger.id, format!("{e:#}")).await;
            return Err(e.into());
        }
    };

    let result_count = i32::try_from(ids.len()).unwrap_or(i32::MAX);
    if let Err(e) =
        pmatch_db::complete_calculation_run(pool, ledger.id, result_count, &run.issues).await
    {
        fail_run_best_effort(pool, ledger.id, format!("{e:#}")).await;
        return Err(e.into());
    }

    print_run(&role_dataset, &run);
    println!(
        "stored {} result(s) for role {role_id} (run {})",
        ids.len(),
        ledger.public_id
    );
    Ok(())
}

/// Attempt to mark a calculation run as failed, logging any secondary error.
async fn fail_run_best_effort(pool: &sqlx::PgPool, run_id: i64, message: String) {
    if let Err(mark_err) = pmatch_db::fail_calculation_run(pool, run_id, &message).await {
        tracing::error!(
            run_id,
            error = %mark_err,
            "failed to mark calculation run as failed"
        );
    }
}

fn print_run(role_dataset: &RoleDataset, run: &CalculationRun) {
    println!(
        "{}",
        render_run(role_dataset, run).trim_end_matches('\n')
    );
}

/// Render a run as a ranking table followed by its issues.
pub(crate) fn render_run(role_dataset: &RoleDataset, run: &CalculationRun) -> String {
    let names: HashMap<i64, (&str, &str)> = role_dataset
        .candidates
        .iter()
        .map(|c| (c.id, (c.nik.as_str(), c.name.as_str())))
        .collect();

    let mut out = format!(
        "Role {}: {}\n{} ranked, {} excluded\n\n",
        role_dataset.role.id,
        role_dataset.role.name,
        run.results.len(),
        run.excluded_candidates().len()
    );

    if run.results.is_empty() {
        out.push_str("no candidates could be ranked\n");
    } else {
        out.push_str(&format!(
            "{:<6}{:<12}{:<28}{:>10}\n",
            "RANK", "NIK", "NAME", "TOTAL"
        ));
        for result in &run.results {
            let (nik, name) = names
                .get(&result.candidate_id)
                .copied()
                .unwrap_or(("\u{2014}", "\u{2014}"));
            out.push_str(&format!(
                "{:<6}{:<12}{:<28}{:>10.4}\n",
                result.rank, nik, name, result.total_score
            ));
        }
    }

    if !run.issues.is_empty() {
        out.push_str("\nIssues:\n");
        for issue in &run.issues {
            let label = match issue.severity() {
                IssueSeverity::Exclusion => "excluded",
                IssueSeverity::Warning => "warning",
            };
            out.push_str(&format!("  [{label}] {issue}\n"));
        }
    }

    out
}

#[cfg(test)]
mod tests {
    use pmatch_core::load_dataset;
    use std::path::Path;

    use super::*;

    fn sample_role(role_id: i64) -> RoleDataset {
        load_dataset(Path::new("../../config/dataset.yaml"))
            .unwrap()
            .role_dataset(role_id)
            .unwrap()
    }

    #[test]
    fn renders_ranking_and_exclusions() {
        let data = sample_role(1);
        let run = calculate(&data, &CalculationRequest::for_role(1), &EngineOptions::default())
            .unwrap();
        let text = render_run(&data, &run);

        assert!(text.starts_with("Role 1: Operator Produksi\n3 ranked, 1 excluded\n"));
        assert!(text.contains("RANK"));
        assert_eq!(text.lines().filter(|l| l.contains("TK00")).count(), 3);
        assert!(text.contains("[excluded] candidate 4 excluded: no value for criterion 'P2'"));
    }

    #[test]
    fn candidate_filter_limits_the_table() {
        let data = sample_role(1);
        let run = calculate(
            &data,
            &request(1, vec![2]),
            &EngineOptions::default(),
        )
        .unwrap();
        let text = render_run(&data, &run);

        assert!(text.contains("TK002"));
        assert!(!text.contains("TK001"));
        assert!(!text.contains("Issues:"));
    }

    #[test]
    fn empty_ranking_is_reported() {
        let data = sample_role(1);
        let run = calculate(&data, &request(1, vec![4]), &EngineOptions::default()).unwrap();
        let text = render_run(&data, &run);

        assert!(text.contains("no candidates could be ranked"));
    }

    #[test]
    fn engine_options_follow_config_tolerance() {
        let config = AppConfig {
            database_url: None,
            env: pmatch_core::Environment::Test,
            log_level: "info".to_string(),
            dataset_path: "../../config/dataset.yaml".into(),
            db_max_connections: 10,
            db_min_connections: 1,
            db_acquire_timeout_secs: 10,
            weight_sum_tolerance: 0.5,
        };
        let options = engine_options(&config);
        assert!((options.weight_sum_tolerance - 0.5).abs() < f64::EPSILON);
    }

    #[test]
    fn offline_run_rejects_unknown_role() {
        let config = AppConfig {
            database_url: None,
            env: pmatch_core::Environment::Test,
            log_level: "info".to_string(),
            dataset_path: "../../config/dataset.yaml".into(),
            db_max_connections: 10,
            db_min_connections: 1,
            db_acquire_timeout_secs: 10,
            weight_sum_tolerance: 0.01,
        };
        let err = run_calculate_offline(&config, 42, vec![]).unwrap_err();
        assert!(err.to_string().contains("role 42 not found"));
    }
}
