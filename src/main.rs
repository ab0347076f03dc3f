use anyhow::Context;
use tracing_subscriber::EnvFilter;

use fire_predict::{config, pipeline};

fn main() -> anyhow::Result<()> {
    // stdout carries only the prediction array
    tracing_subscriber::fmt()
        .with_writer(std::io::stderr)
        .with_ansi(false)
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn")),
        )
        .init();

    let model_path = config::resolve_model_path()?;
    let model = pipeline::load_model(&model_path).context("startup failed")?;

    let stdin = std::io::stdin().lock();
    let stdout = std::io::stdout().lock();
    let rows = pipeline::run(&model, stdin, stdout).context("batch inference failed")?;

    tracing::debug!(rows, "done");
    Ok(())
}
