use std::str::FromStr;

use polars::prelude::{DataType, Schema};
use serde::{Deserialize, Serialize};

use crate::error::PipelineError;
use crate::transform::snake_case;

/// Table holding every loaded clinical record.
pub const TABLE_NAME: &str = "heart_disease";

/// Column carrying the `Presence` / `Absence` label.
pub const LABEL_COLUMN: &str = "heart_disease";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ColumnType {
    Integer,
    Decimal,
    Label,
}

impl ColumnType {
    pub fn sql_type(self) -> &'static str {
        match self {
            ColumnType::Integer => "INTEGER",
            ColumnType::Decimal => "DOUBLE PRECISION",
            ColumnType::Label => "VARCHAR(30)",
        }
    }

    pub fn dtype(self) -> DataType {
        match self {
            ColumnType::Integer => DataType::Int64,
            ColumnType::Decimal => DataType::Float64,
            ColumnType::Label => DataType::String,
        }
    }
}

/// Silver column names in table order.
pub const COLUMNS: [(&str, ColumnType); 14] = [
    ("age", ColumnType::Integer),
    ("sex", ColumnType::Integer),
    ("chest_pain_type", ColumnType::Integer),
    ("bp", ColumnType::Integer),
    ("cholesterol", ColumnType::Integer),
    ("fbs_over_120", ColumnType::Integer),
    ("ekg_results", ColumnType::Integer),
    ("max_hr", ColumnType::Integer),
    ("exercise_angina", ColumnType::Integer),
    ("st_depression", ColumnType::Decimal),
    ("slope_of_st", ColumnType::Integer),
    ("number_of_vessels_fluro", ColumnType::Integer),
    ("thallium", ColumnType::Integer),
    (LABEL_COLUMN, ColumnType::Label),
];

/// One cleaned row of the heart-disease dataset. Empty cells are `None`
/// and land in the table as NULL.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct HeartDiseaseRecord {
    pub age: Option<i32>,
    pub sex: Option<i32>,
    pub chest_pain_type: Option<i32>,
    pub bp: Option<i32>,
    pub cholesterol: Option<i32>,
    pub fbs_over_120: Option<i32>,
    pub ekg_results: Option<i32>,
    pub max_hr: Option<i32>,
    pub exercise_angina: Option<i32>,
    pub st_depression: Option<f64>,
    pub slope_of_st: Option<i32>,
    pub number_of_vessels_fluro: Option<i32>,
    pub thallium: Option<i32>,
    pub heart_disease: Option<String>,
}

impl HeartDiseaseRecord {
    pub fn column_names() -> impl Iterator<Item = &'static str> {
        COLUMNS.iter().map(|(name, _)| *name)
    }

    /// Integer-coded columns can partition rows for aggregation.
    pub fn is_grouping_column(name: &str) -> bool {
        COLUMNS
            .iter()
            .any(|(column, kind)| *column == name && *kind == ColumnType::Integer)
    }

    /// Polars dtypes for the known columns among `headers`, matched on their
    /// snake_case form so raw and cleaned headers both resolve.
    pub fn schema_for<'a, I>(headers: I) -> Schema
    where
        I: IntoIterator<Item = &'a str>,
    {
        let mut schema = Schema::with_capacity(COLUMNS.len());
        for header in headers {
            let normalized = snake_case(header);
            if let Some((_, kind)) = COLUMNS.iter().find(|(name, _)| *name == normalized) {
                schema.with_column(header.into(), kind.dtype());
            }
        }
        schema
    }

    pub fn create_table_sql() -> String {
        let columns = COLUMNS
            .iter()
            .map(|(name, kind)| format!("    {} {}", name, kind.sql_type()))
            .collect::<Vec<_>>()
            .join(",\n");

        format!("CREATE TABLE IF NOT EXISTS {} (\n{}\n)", TABLE_NAME, columns)
    }
}

/// Closed set of diagnosis labels.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DiseaseLabel {
    Presence,
    Absence,
}

impl DiseaseLabel {
    pub fn flag(self) -> i64 {
        match self {
            DiseaseLabel::Presence => 1,
            DiseaseLabel::Absence => 0,
        }
    }
}

impl FromStr for DiseaseLabel {
    type Err = PipelineError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "Presence" => Ok(DiseaseLabel::Presence),
            "Absence" => Ok(DiseaseLabel::Absence),
            other => Err(PipelineError::UnmappedLabel {
                label: Some(other.to_string()),
            }),
        }
    }
}
