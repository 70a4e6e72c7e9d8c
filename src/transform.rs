use std::fs::{self, File};
use std::path::Path;

use polars::prelude::*;
use tracing::{debug, info};

use crate::config::PipelineConfig;
use crate::error::Result;
use crate::extract::read_csv;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TransformSummary {
    pub rows_read: usize,
    pub rows_written: usize,
    pub duplicates_dropped: usize,
}

pub fn snake_case(name: &str) -> String {
    name.replace(' ', "_").to_lowercase()
}

/// Lowercases every column name and replaces spaces with underscores.
pub fn normalize_names(df: &DataFrame) -> Result<DataFrame> {
    let columns = df
        .get_columns()
        .iter()
        .map(|column| {
            let name = snake_case(column.name());
            column.clone().with_name(name.into())
        })
        .collect::<Vec<_>>();

    Ok(DataFrame::new(columns)?)
}

/// Drops rows identical to an earlier row over all columns, keeping order.
pub fn deduplicate(df: &DataFrame) -> Result<DataFrame> {
    let unique = df
        .clone()
        .lazy()
        .unique_stable(None, UniqueKeepStrategy::First)
        .collect()?;

    Ok(unique)
}

pub fn clean(df: &DataFrame) -> Result<DataFrame> {
    deduplicate(&normalize_names(df)?)
}

pub async fn write_csv<P: AsRef<Path>>(path: P, df: &mut DataFrame) -> Result<()> {
    let path = path.as_ref();
    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        fs::create_dir_all(parent)?;
    }

    let mut file = File::create(path)?;
    CsvWriter::new(&mut file)
        .include_header(true)
        .with_separator(b',')
        .finish(df)?;

    Ok(())
}

/// Bronze to silver: normalize headers, drop duplicates, write staging CSV.
pub async fn run_transform(config: &PipelineConfig) -> Result<TransformSummary> {
    let raw = read_csv(&config.source_path).await?;
    let mut cleaned = clean(&raw)?;

    debug!(columns = ?cleaned.get_column_names(), "normalized column names");

    write_csv(&config.staging_path, &mut cleaned).await?;

    let summary = TransformSummary {
        rows_read: raw.height(),
        rows_written: cleaned.height(),
        duplicates_dropped: raw.height() - cleaned.height(),
    };
    info!(
        staging = ?config.staging_path,
        rows = summary.rows_written,
        duplicates = summary.duplicates_dropped,
        "wrote silver data"
    );

    Ok(summary)
}
