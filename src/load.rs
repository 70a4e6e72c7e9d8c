use std::collections::HashSet;
use std::path::Path;

use sqlx::AnyConnection;
use sqlx::Connection;
use tracing::{debug, info};

use crate::config::PipelineConfig;
use crate::db;
use crate::error::{PipelineError, Result};
use crate::records::{HeartDiseaseRecord, COLUMNS, TABLE_NAME};

fn check_headers(headers: &csv::StringRecord) -> Result<()> {
    let found: HashSet<&str> = headers.iter().collect();
    if found.len() != headers.len() {
        return Err(PipelineError::SchemaMismatch(format!(
            "duplicate column in staging header: {:?}",
            headers
        )));
    }

    let expected: HashSet<&str> = HeartDiseaseRecord::column_names().collect();
    let mut missing: Vec<&str> = expected.difference(&found).copied().collect();
    let mut unexpected: Vec<&str> = found.difference(&expected).copied().collect();
    if missing.is_empty() && unexpected.is_empty() {
        return Ok(());
    }

    missing.sort_unstable();
    unexpected.sort_unstable();
    Err(PipelineError::SchemaMismatch(format!(
        "staging columns do not match {}: missing {:?}, unexpected {:?}",
        TABLE_NAME, missing, unexpected
    )))
}

/// Reads the silver file into typed records. Columns are matched by name,
/// so any column order in the file maps onto the table order.
pub fn read_staging<P: AsRef<Path>>(path: P) -> Result<Vec<HeartDiseaseRecord>> {
    let path = path.as_ref();
    if !path.is_file() {
        return Err(PipelineError::SourceNotFound {
            path: path.to_path_buf(),
        });
    }

    let mut reader = csv::Reader::from_path(path)?;
    check_headers(reader.headers()?)?;

    reader
        .deserialize::<HeartDiseaseRecord>()
        .map(|row| {
            row.map_err(|e| match e.kind() {
                csv::ErrorKind::Deserialize { .. } | csv::ErrorKind::UnequalLengths { .. } => {
                    PipelineError::SchemaMismatch(e.to_string())
                }
                _ => PipelineError::Csv(e),
            })
        })
        .collect()
}

/// Appends every record to `heart_disease` inside one transaction.
/// Existing rows are never compared against or replaced.
pub async fn append_records(
    conn: &mut AnyConnection,
    records: &[HeartDiseaseRecord],
) -> Result<u64> {
    let sql = format!(
        "INSERT INTO {} ({}) VALUES ({})",
        TABLE_NAME,
        HeartDiseaseRecord::column_names().collect::<Vec<_>>().join(", "),
        db::placeholders(conn.backend_name(), COLUMNS.len())
    );

    let mut tx = conn.begin().await?;
    let mut inserted = 0;
    for record in records {
        let result = sqlx::query(&sql)
            .bind(record.age)
            .bind(record.sex)
            .bind(record.chest_pain_type)
            .bind(record.bp)
            .bind(record.cholesterol)
            .bind(record.fbs_over_120)
            .bind(record.ekg_results)
            .bind(record.max_hr)
            .bind(record.exercise_angina)
            .bind(record.st_depression)
            .bind(record.slope_of_st)
            .bind(record.number_of_vessels_fluro)
            .bind(record.thallium)
            .bind(record.heart_disease.as_deref())
            .execute(&mut *tx)
            .await?;
        inserted += result.rows_affected();
    }
    tx.commit().await?;

    Ok(inserted)
}

pub async fn run_create_table(config: &PipelineConfig) -> Result<()> {
    let mut conn = db::connect(&config.connection_string).await?;
    let result = db::create_table(&mut conn).await;
    db::release(conn, result).await?;

    info!(table = TABLE_NAME, "table ready");
    Ok(())
}

/// Silver to table: reads the staging file and appends it.
pub async fn run_load(config: &PipelineConfig) -> Result<u64> {
    let records = read_staging(&config.staging_path)?;
    debug!(rows = records.len(), staging = ?config.staging_path, "read silver data");

    let mut conn = db::connect(&config.connection_string).await?;
    let result = append_records(&mut conn, &records).await;
    let inserted = db::release(conn, result).await?;

    info!(table = TABLE_NAME, rows = inserted, "appended silver data");
    Ok(inserted)
}
