use heart_disease_pipeline::{extract, logging, PipelineConfig};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    logging::init_logging();
    let config = PipelineConfig::load().inspect_err(logging::log_failure)?;

    let (_, report) = extract::run_extract(&config).await.inspect_err(logging::log_failure)?;
    println!(
        ">> {} rows x {} columns read from {}",
        report.rows,
        report.column_count,
        report.source.display()
    );
    Ok(())
}
