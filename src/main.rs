use std::time::Instant;

use heart_disease_pipeline::{aggregate, extract, load, logging, transform, PipelineConfig};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    logging::init_logging();
    let config = PipelineConfig::load().inspect_err(logging::log_failure)?;
    let start_time = Instant::now();

    extract::run_extract(&config).await.inspect_err(logging::log_failure)?;
    let cleaned = transform::run_transform(&config).await.inspect_err(logging::log_failure)?;
    load::run_create_table(&config).await.inspect_err(logging::log_failure)?;
    let loaded = load::run_load(&config).await.inspect_err(logging::log_failure)?;
    let summaries = aggregate::run_aggregate(&config).await.inspect_err(logging::log_failure)?;

    println!(
        "Pipeline finished in {:?}: {} silver rows, {} rows appended, {} groups in {}",
        start_time.elapsed(),
        cleaned.rows_written,
        loaded,
        summaries.len(),
        config.summary_table()
    );

    Ok(())
}
