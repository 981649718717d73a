use anyhow::Result;
use tabwatch::cli::run_cli;
use tracing::error;

#[tokio::main]
async fn main() -> Result<()> {
    run_cli().await.inspect_err(|e| {
        error!("Error running tabwatch {e:?}");
    })?;
    Ok(())
}
