use std::collections::BTreeMap;

use polars::prelude::*;
use serde::Serialize;
use sqlx::AnyConnection;
use sqlx::{Connection, Row};
use tracing::{info, warn};

use crate::config::PipelineConfig;
use crate::db;
use crate::error::{PipelineError, Result};
use crate::records::{DiseaseLabel, HeartDiseaseRecord, LABEL_COLUMN, TABLE_NAME};

/// Grouping key and label of one persisted record.
#[derive(Debug, Clone, PartialEq)]
pub struct GroupRow {
    pub key: Option<i64>,
    pub label: Option<String>,
}

impl GroupRow {
    pub fn new(key: i64, label: &str) -> Self {
        Self {
            key: Some(key),
            label: Some(label.to_string()),
        }
    }
}

/// One row of the gold table.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct GroupSummary {
    pub key: i64,
    pub total_patients: i64,
    pub total_with_disease: i64,
    pub percentage_with_disease: f64,
}

/// `part / total * 100`, rounded to two decimals with ties going to the
/// even neighbour.
pub fn percentage(part: i64, total: i64) -> f64 {
    (part as f64 / total as f64 * 100.0 * 100.0).round_ties_even() / 100.0
}

fn check_grouping_column(column: &str) -> Result<()> {
    if HeartDiseaseRecord::is_grouping_column(column) {
        Ok(())
    } else {
        Err(PipelineError::InvalidGroupingColumn {
            column: column.to_string(),
        })
    }
}

/// Counts rows and disease flags per key, ordered by key.
pub fn summarize(rows: &[GroupRow]) -> Result<Vec<GroupSummary>> {
    if rows.is_empty() {
        return Err(PipelineError::EmptySource {
            table: TABLE_NAME.to_string(),
        });
    }

    let mut groups: BTreeMap<i64, (i64, i64)> = BTreeMap::new();
    let mut skipped = 0usize;
    for row in rows {
        let flag = match row.label.as_deref() {
            Some(label) => label.parse::<DiseaseLabel>()?.flag(),
            None => return Err(PipelineError::UnmappedLabel { label: None }),
        };
        let Some(key) = row.key else {
            skipped += 1;
            continue;
        };
        let entry = groups.entry(key).or_insert((0, 0));
        entry.0 += 1;
        entry.1 += flag;
    }

    if skipped > 0 {
        warn!(rows = skipped, "skipped rows without a grouping key");
    }
    if groups.is_empty() {
        return Err(PipelineError::EmptySource {
            table: TABLE_NAME.to_string(),
        });
    }

    Ok(groups
        .into_iter()
        .map(|(key, (total, with_disease))| GroupSummary {
            key,
            total_patients: total,
            total_with_disease: with_disease,
            percentage_with_disease: percentage(with_disease, total),
        })
        .collect())
}

pub async fn fetch_group_rows(conn: &mut AnyConnection, column: &str) -> Result<Vec<GroupRow>> {
    check_grouping_column(column)?;

    let sql = format!("SELECT {}, {} FROM {}", column, LABEL_COLUMN, TABLE_NAME);
    let rows = sqlx::query(&sql).fetch_all(&mut *conn).await?;

    rows.iter()
        .map(|row| -> Result<GroupRow> {
            Ok(GroupRow {
                key: row.try_get::<Option<i64>, _>(0)?,
                label: row.try_get::<Option<String>, _>(1)?,
            })
        })
        .collect()
}

/// Drops and rebuilds `table` with `summaries`, all in one transaction.
pub async fn replace_summary(
    conn: &mut AnyConnection,
    column: &str,
    table: &str,
    summaries: &[GroupSummary],
) -> Result<()> {
    check_grouping_column(column)?;

    let create = format!(
        "CREATE TABLE {} ({} BIGINT, total_patients BIGINT, total_with_disease BIGINT, percentage_with_disease DOUBLE PRECISION)",
        table, column
    );
    let insert = format!(
        "INSERT INTO {} ({}, total_patients, total_with_disease, percentage_with_disease) VALUES ({})",
        table,
        column,
        db::placeholders(conn.backend_name(), 4)
    );

    let mut tx = conn.begin().await?;
    sqlx::query(&format!("DROP TABLE IF EXISTS {}", table))
        .execute(&mut *tx)
        .await?;
    sqlx::query(&create).execute(&mut *tx).await?;
    for summary in summaries {
        sqlx::query(&insert)
            .bind(summary.key)
            .bind(summary.total_patients)
            .bind(summary.total_with_disease)
            .bind(summary.percentage_with_disease)
            .execute(&mut *tx)
            .await?;
    }
    tx.commit().await?;

    Ok(())
}

/// Reads a gold table back, ordered by key, as it is stored.
pub async fn fetch_summary(
    conn: &mut AnyConnection,
    column: &str,
    table: &str,
) -> Result<Vec<GroupSummary>> {
    check_grouping_column(column)?;

    let sql = format!(
        "SELECT {0}, total_patients, total_with_disease, percentage_with_disease FROM {1} ORDER BY {0}",
        column, table
    );
    let rows = sqlx::query(&sql).fetch_all(&mut *conn).await?;

    rows.iter()
        .map(|row| -> Result<GroupSummary> {
            Ok(GroupSummary {
                key: row.try_get(0)?,
                total_patients: row.try_get(1)?,
                total_with_disease: row.try_get(2)?,
                percentage_with_disease: row.try_get(3)?,
            })
        })
        .collect()
}

pub fn summary_frame(column: &str, summaries: &[GroupSummary]) -> Result<DataFrame> {
    let keys: Vec<i64> = summaries.iter().map(|s| s.key).collect();
    let totals: Vec<i64> = summaries.iter().map(|s| s.total_patients).collect();
    let with_disease: Vec<i64> = summaries.iter().map(|s| s.total_with_disease).collect();
    let percentages: Vec<f64> = summaries.iter().map(|s| s.percentage_with_disease).collect();

    let df = DataFrame::new(vec![
        Column::new(column.into(), keys),
        Column::new("total_patients".into(), totals),
        Column::new("total_with_disease".into(), with_disease),
        Column::new("percentage_with_disease".into(), percentages),
    ])?;

    Ok(df)
}

async fn aggregate_on(
    conn: &mut AnyConnection,
    column: &str,
    table: &str,
) -> Result<Vec<GroupSummary>> {
    let rows = fetch_group_rows(conn, column).await?;
    let summaries = summarize(&rows)?;
    replace_summary(conn, column, table, &summaries).await?;
    fetch_summary(conn, column, table).await
}

/// Table to gold: recomputes the summary from every persisted row and
/// returns the gold rows as written.
pub async fn run_aggregate(config: &PipelineConfig) -> Result<Vec<GroupSummary>> {
    let column = config.grouping_column.as_str();
    check_grouping_column(column)?;
    let table = config.summary_table();

    let mut conn = db::connect(&config.connection_string).await?;
    let result = aggregate_on(&mut conn, column, &table).await;
    let summaries = db::release(conn, result).await?;

    info!(table = %table, groups = summaries.len(), "replaced gold table");
    println!("{}", summary_frame(column, &summaries)?);

    Ok(summaries)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn scenario() -> Vec<GroupRow> {
        vec![
            GroupRow::new(0, "Presence"),
            GroupRow::new(0, "Absence"),
            GroupRow::new(1, "Presence"),
            GroupRow::new(1, "Presence"),
        ]
    }

    fn expected() -> Vec<GroupSummary> {
        vec![
            GroupSummary {
                key: 0,
                total_patients: 2,
                total_with_disease: 1,
                percentage_with_disease: 50.0,
            },
            GroupSummary {
                key: 1,
                total_patients: 2,
                total_with_disease: 2,
                percentage_with_disease: 100.0,
            },
        ]
    }

    async fn seeded() -> AnyConnection {
        let mut conn = db::connect("sqlite::memory:").await.unwrap();
        db::create_table(&mut conn).await.unwrap();
        for row in scenario() {
            sqlx::query("INSERT INTO heart_disease (sex, heart_disease) VALUES (?, ?)")
                .bind(row.key.unwrap())
                .bind(row.label.unwrap())
                .execute(&mut conn)
                .await
                .unwrap();
        }
        conn
    }

    #[test]
    fn percentage_rounds_to_two_decimals() {
        assert_eq!(percentage(1, 3), 33.33);
        assert_eq!(percentage(2, 3), 66.67);
        assert_eq!(percentage(0, 5), 0.0);
        // 3.125 and 9.375 are exact halves
        assert_eq!(percentage(1, 32), 3.12);
        assert_eq!(percentage(3, 32), 9.38);
    }

    #[test]
    fn summarizes_by_key() {
        assert_eq!(summarize(&scenario()).unwrap(), expected());
    }

    #[test]
    fn unmapped_label_fails() {
        let mut unknown = scenario();
        unknown.push(GroupRow::new(1, "Unknown"));
        assert!(matches!(
            summarize(&unknown),
            Err(PipelineError::UnmappedLabel { label: Some(_) })
        ));

        let mut missing = scenario();
        missing.push(GroupRow {
            key: Some(0),
            label: None,
        });
        assert!(matches!(
            summarize(&missing),
            Err(PipelineError::UnmappedLabel { label: None })
        ));
    }

    #[test]
    fn empty_source_fails() {
        assert!(matches!(
            summarize(&[]),
            Err(PipelineError::EmptySource { .. })
        ));
    }

    #[test]
    fn rows_without_key_are_skipped() {
        let mut rows = scenario();
        rows.push(GroupRow {
            key: None,
            label: Some("Absence".to_string()),
        });
        assert_eq!(summarize(&rows).unwrap(), expected());
    }

    #[test]
    fn frame_uses_grouping_column_name() {
        let df = summary_frame("sex", &expected()).unwrap();
        assert_eq!(df.shape(), (2, 4));
        assert_eq!(df.get_column_names()[0].as_str(), "sex");
    }

    #[tokio::test]
    async fn replaces_instead_of_accumulating() {
        let mut conn = seeded().await;

        let first = aggregate_on(&mut conn, "sex", "heart_disease_by_sex").await.unwrap();
        let stored_once = fetch_summary(&mut conn, "sex", "heart_disease_by_sex").await.unwrap();
        let second = aggregate_on(&mut conn, "sex", "heart_disease_by_sex").await.unwrap();
        let stored_twice = fetch_summary(&mut conn, "sex", "heart_disease_by_sex").await.unwrap();

        assert_eq!(first, expected());
        assert_eq!(second, first);
        assert_eq!(stored_once, expected());
        assert_eq!(stored_twice, stored_once);
    }

    #[tokio::test]
    async fn returns_the_stored_gold_rows() {
        let mut conn = seeded().await;
        sqlx::query("INSERT INTO heart_disease (sex, heart_disease) VALUES (?, ?)")
            .bind(None::<i64>)
            .bind("Presence")
            .execute(&mut conn)
            .await
            .unwrap();

        let returned = aggregate_on(&mut conn, "sex", "heart_disease_by_sex").await.unwrap();
        let stored = fetch_summary(&mut conn, "sex", "heart_disease_by_sex").await.unwrap();
        assert_eq!(returned, stored);
        assert_eq!(returned, expected());
    }

    #[tokio::test]
    async fn empty_table_fails_without_writing() {
        let mut conn = db::connect("sqlite::memory:").await.unwrap();
        db::create_table(&mut conn).await.unwrap();

        let err = aggregate_on(&mut conn, "sex", "heart_disease_by_sex").await.unwrap_err();
        assert!(matches!(err, PipelineError::EmptySource { .. }));
        assert!(fetch_summary(&mut conn, "sex", "heart_disease_by_sex").await.is_err());
    }

    #[tokio::test]
    async fn rejects_non_integer_grouping_column() {
        let mut conn = seeded().await;
        let err = fetch_group_rows(&mut conn, "heart_disease").await.unwrap_err();
        assert!(matches!(err, PipelineError::InvalidGroupingColumn { .. }));
    }
}
