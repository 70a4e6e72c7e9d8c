use heart_disease_pipeline::{load, logging, PipelineConfig};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    logging::init_logging();
    let config = PipelineConfig::load().inspect_err(logging::log_failure)?;

    load::run_create_table(&config).await.inspect_err(logging::log_failure)?;
    println!("Table heart_disease is ready");
    Ok(())
}
