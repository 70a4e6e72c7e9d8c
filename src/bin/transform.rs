use heart_disease_pipeline::{logging, transform, PipelineConfig};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    logging::init_logging();
    let config = PipelineConfig::load().inspect_err(logging::log_failure)?;

    let summary = transform::run_transform(&config).await.inspect_err(logging::log_failure)?;
    println!(
        "Silver data written to {} ({} rows, {} duplicates removed)",
        config.staging_path.display(),
        summary.rows_written,
        summary.duplicates_dropped
    );
    Ok(())
}
