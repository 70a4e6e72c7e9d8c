use tracing::error;
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

use crate::error::PipelineError;

/// Console logging filtered by `RUST_LOG`, defaulting to this crate at info.
pub fn init_logging() {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new("heart_disease_pipeline=info"));

    tracing_subscriber::registry()
        .with(filter)
        .with(fmt::layer().with_writer(std::io::stderr))
        .init();
}

/// Records a failed stage with its error class before the binary exits.
pub fn log_failure(err: &PipelineError) {
    error!(kind = ?err.kind(), error = %err, "pipeline stage failed");
}
