//! Bronze/silver/gold batch pipeline for the heart-disease clinical dataset.
//!
//! Raw CSV is read by [`extract`], cleaned into a staging CSV by
//! [`transform`], appended to the `heart_disease` table by [`load`] and
//! summarized into `heart_disease_by_<column>` by [`aggregate`].

pub mod aggregate;
pub mod config;
pub mod db;
pub mod error;
pub mod extract;
pub mod load;
pub mod logging;
pub mod records;
pub mod transform;

pub use config::PipelineConfig;
pub use error::{ErrorKind, PipelineError, Result};
