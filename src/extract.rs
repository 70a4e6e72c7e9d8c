use std::path::{Path, PathBuf};

use polars::prelude::*;
use serde::Serialize;
use tracing::info;

use crate::config::PipelineConfig;
use crate::error::{PipelineError, Result};
use crate::records::HeartDiseaseRecord;

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ColumnInfo {
    pub name: String,
    pub dtype: String,
    pub null_count: usize,
}

/// Shape and metadata of a freshly read bronze file.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ExtractReport {
    pub source: PathBuf,
    pub structure: String,
    pub rows: usize,
    pub column_count: usize,
    pub columns: Vec<ColumnInfo>,
}

pub async fn read_csv<P: AsRef<Path>>(path: P) -> Result<DataFrame> {
    let path = path.as_ref();
    if !path.is_file() {
        return Err(PipelineError::SourceNotFound {
            path: path.to_path_buf(),
        });
    }

    // Known columns are read with their declared dtype so a stray value
    // fails here instead of turning the column into text.
    let mut reader = csv::Reader::from_path(path)?;
    let schema = HeartDiseaseRecord::schema_for(reader.headers()?.iter());

    let df = CsvReadOptions::default()
        .with_has_header(true)
        .with_schema_overwrite(Some(Arc::new(schema)))
        .try_into_reader_with_file_path(Some(path.to_path_buf()))?
        .finish()?;

    Ok(df)
}

pub fn describe(source: &Path, df: &DataFrame) -> ExtractReport {
    let columns = df
        .get_columns()
        .iter()
        .map(|column| ColumnInfo {
            name: column.name().to_string(),
            dtype: column.dtype().to_string(),
            null_count: column.null_count(),
        })
        .collect();

    ExtractReport {
        source: source.to_path_buf(),
        structure: std::any::type_name::<DataFrame>().to_string(),
        rows: df.height(),
        column_count: df.width(),
        columns,
    }
}

/// Reads the bronze file and reports what was found. Writes nothing.
pub async fn run_extract(config: &PipelineConfig) -> Result<(DataFrame, ExtractReport)> {
    let df = read_csv(&config.source_path).await?;
    let report = describe(&config.source_path, &df);

    info!(
        source = ?report.source,
        rows = report.rows,
        columns = report.column_count,
        "extracted bronze data"
    );
    println!(">> Visualization:\n{}", df.head(Some(config.preview_rows)));
    println!(">> Information:\n{}", serde_json::to_string_pretty(&report)?);

    Ok((df, report))
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use tempfile::tempdir;

    #[tokio::test]
    async fn reports_shape_and_nulls() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("bronze.csv");
        fs::write(
            &path,
            "Age,Sex,ST depression,Heart Disease\n70,1,2.4,Presence\n67,,1.6,Absence\n",
        )
        .unwrap();

        let df = read_csv(&path).await.unwrap();
        let report = describe(&path, &df);

        assert_eq!(report.rows, 2);
        assert_eq!(report.column_count, 4);
        assert!(report.structure.ends_with("DataFrame"));
        assert_eq!(report.columns[1].name, "Sex");
        assert_eq!(report.columns[1].null_count, 1);
        assert_eq!(report.columns[3].null_count, 0);
    }

    #[tokio::test]
    async fn known_columns_keep_declared_types() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("bronze.csv");
        fs::write(&path, "Age,Cholesterol,ST depression\n70,,2\n67,564,1.6\n").unwrap();

        let df = read_csv(&path).await.unwrap();
        assert_eq!(df.column("Cholesterol").unwrap().dtype(), &DataType::Int64);
        assert_eq!(df.column("Cholesterol").unwrap().null_count(), 1);
        assert_eq!(df.column("ST depression").unwrap().dtype(), &DataType::Float64);
    }

    #[tokio::test]
    async fn text_in_numeric_column_fails_early() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("bronze.csv");
        fs::write(&path, "Age,Cholesterol\n70,322\n67,high\n").unwrap();

        let err = read_csv(&path).await.unwrap_err();
        assert!(matches!(err, PipelineError::Polars(_)));
    }

    #[tokio::test]
    async fn missing_source_is_reported() {
        let dir = tempdir().unwrap();
        let err = read_csv(dir.path().join("absent.csv")).await.unwrap_err();
        assert!(matches!(err, PipelineError::SourceNotFound { .. }));
    }
}
