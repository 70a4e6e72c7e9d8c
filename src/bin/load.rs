use heart_disease_pipeline::{load, logging, PipelineConfig};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    logging::init_logging();
    let config = PipelineConfig::load().inspect_err(logging::log_failure)?;

    let rows = load::run_load(&config).await.inspect_err(logging::log_failure)?;
    println!("Appended {} rows from {} into heart_disease", rows, config.staging_path.display());
    Ok(())
}
