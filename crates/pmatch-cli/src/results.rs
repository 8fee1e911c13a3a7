//! Read-only views over stored profile matching results.

use clap::Subcommand;
use pmatch_db::MatchResultRow;
use pmatch_engine::AspectBreakdown;

/// Sub-commands available under `results`.
#[derive(Debug, Subcommand)]
pub enum ResultsCommands {
    /// List stored rankings, grouped by role
    List {
        /// Only show results for this role
        #[arg(long)]
        role: Option<i64>,
    },
    /// Show one result with its per-aspect breakdown
    Show {
        /// Result id as printed by `results list`
        id: i64,
        /// Print the stored breakdown as JSON
        #[arg(long)]
        json: bool,
    },
}

/// Format an optional factor, returning `"—"` when the partition was empty.
fn fmt_factor(factor: Option<f64>) -> String {
    factor.map_or_else(|| "\u{2014}".to_string(), |f| format!("{f:.4}"))
}

/// # Errors
///
/// Returns an error if the database query fails.
pub(crate) async fn run_results_list(
    pool: &sqlx::PgPool,
    role_filter: Option<i64>,
) -> anyhow::Result<()> {
    let rows = match role_filter {
        Some(role_id) => pmatch_db::list_results_by_role(pool, role_id).await?,
        None => pmatch_db::list_all_results(pool).await?,
    };

    if rows.is_empty() {
        println!(
            "no results found{}; run `calculate` first",
            role_filter
                .map(|r| format!(" for role {r}"))
                .unwrap_or_default()
        );
        return Ok(());
    }

    print!("{}", render_list(&rows));
    Ok(())
}

/// # Errors
///
/// Returns an error if the result does not exist, the query fails, or the
/// stored breakdown cannot be decoded.
pub(crate) async fn run_results_show(
    pool: &sqlx::PgPool,
    id: i64,
    json: bool,
) -> anyhow::Result<()> {
    let row = match pmatch_db::get_result(pool, id).await {
        Ok(row) => row,
        Err(pmatch_db::DbError::NotFound) => anyhow::bail!("result {id} not found"),
        Err(e) => return Err(e.into()),
    };

    if json {
        println!("{}", serde_json::to_string_pretty(&row.details)?);
        return Ok(());
    }

    let breakdown = row.breakdown()?;
    print!("{}", render_detail(&row, &breakdown));
    Ok(())
}

pub(crate) fn render_list(rows: &[MatchResultRow]) -> String {
    let mut out = String::new();
    let mut current_role = None;

    for row in rows {
        if current_role != Some(row.role_id) {
            if current_role.is_some() {
                out.push('\n');
            }
            out.push_str(&format!("Role {}: {}\n", row.role_id, row.role_name));
            out.push_str(&format!(
                "{:<8}{:<6}{:<12}{:<28}{:>10}  {}\n",
                "ID", "RANK", "NIK", "NAME", "TOTAL", "CALCULATED"
            ));
            current_role = Some(row.role_id);
        }
        out.push_str(&format!(
            "{:<8}{:<6}{:<12}{:<28}{:>10}  {}\n",
            row.id,
            row.rank,
            row.candidate_nik,
            row.candidate_name,
            row.total_score.round_dp(4),
            row.created_at.format("%Y-%m-%d %H:%M")
        ));
    }

    out
}

pub(crate) fn render_detail(row: &MatchResultRow, breakdown: &[AspectBreakdown]) -> String {
    let mut out = format!(
        "Candidate: {} ({})\nRole: {}\nRank: {}\nTotal score: {}\n",
        row.candidate_name,
        row.candidate_nik,
        row.role_name,
        row.rank,
        row.total_score.round_dp(4)
    );

    for aspect in breakdown {
        out.push_str(&format!(
            "\n{} ({}%)  core {}  secondary {}  score {:.4}\n",
            aspect.aspect_name,
            aspect.weight_percent,
            fmt_factor(aspect.core_factor),
            fmt_factor(aspect.secondary_factor),
            aspect.score
        ));
        out.push_str(&format!(
            "  {:<6}{:<28}{:<6}{:>8}{:>8}{:>6}{:>8}\n",
            "CODE", "CRITERION", "TYPE", "TARGET", "ACTUAL", "GAP", "WEIGHT"
        ));
        for criterion in &aspect.criteria {
            out.push_str(&format!(
                "  {:<6}{:<28}{:<6}{:>8}{:>8}{:>6}{:>8}\n",
                criterion.code,
                criterion.name,
                if criterion.is_core { "core" } else { "sec" },
                criterion.target_value,
                criterion.actual_value,
                criterion.gap,
                criterion.weight_score
            ));
        }
    }

    out
}

#[cfg(test)]
mod tests {
    use chrono::{TimeZone, Utc};
    use pmatch_engine::CriterionRow;
    use rust_decimal::Decimal;

    use super::*;

    fn row(id: i64, role_id: i64, rank: i32) -> MatchResultRow {
        MatchResultRow {
            id,
            candidate_id: id,
            candidate_nik: format!("TK{id:03}"),
            candidate_name: format!("Candidate {id}"),
            role_id,
            role_name: format!("Role {role_id}"),
            calculation_run_id: None,
            total_score: Decimal::new(2_600_000, 6),
            rank,
            details: serde_json::json!([]),
            created_at: Utc.with_ymd_and_hms(2026, 3, 1, 8, 30, 0).unwrap(),
        }
    }

    #[test]
    fn list_groups_rows_by_role() {
        let text = render_list(&[row(1, 1, 1), row(2, 1, 2), row(3, 2, 1)]);

        assert_eq!(text.matches("Role 1: Role 1").count(), 1);
        assert_eq!(text.matches("Role 2: Role 2").count(), 1);
        assert!(text.contains("TK003"));
        assert!(text.contains("2026-03-01 08:30"));
    }

    #[test]
    fn detail_marks_empty_partitions() {
        let breakdown = vec![AspectBreakdown {
            aspect_id: 1,
            aspect_name: "Kompetensi Teknis".to_string(),
            weight_percent: 100.0,
            core_factor: Some(2.6),
            secondary_factor: None,
            score: 2.6,
            criteria: vec![CriterionRow {
                criterion_id: 1,
                code: "K1".to_string(),
                name: "Pengetahuan Mesin".to_string(),
                target_value: 3.0,
                actual_value: 4.0,
                gap: 1.0,
                weight_score: 4.0,
                is_core: true,
            }],
        }];

        let text = render_detail(&row(1, 1, 1), &breakdown);

        assert!(text.contains("Total score: 2.6000"));
        assert!(text.contains("secondary \u{2014}"));
        assert!(text.contains("core 2.6000"));
        assert!(text.contains("K1"));
    }
}
