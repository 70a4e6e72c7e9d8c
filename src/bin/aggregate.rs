use heart_disease_pipeline::{aggregate, logging, PipelineConfig};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    logging::init_logging();
    let config = PipelineConfig::load().inspect_err(logging::log_failure)?;

    aggregate::run_aggregate(&config).await.inspect_err(logging::log_failure)?;
    println!("New {} table successfully created!", config.summary_table());
    Ok(())
}
