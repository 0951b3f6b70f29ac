use anyhow::Context;
use clap::Parser;
use i94_etl::cli::{run, Cli};
use i94_etl::logging::init_logging;
use tracing::error;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();
    let _log_guard =
        init_logging(cli.verbose, cli.log_file.as_deref()).context("Failed to set up logging")?;

    rayon::ThreadPoolBuilder::new()
        .num_threads(cli.max_workers.max(1))
        .build_global()
        .context("Failed to build worker pool")?;

    if let Err(e) = run(cli).await {
        error!("{}", e);
        return Err(e.into());
    }
    Ok(())
}
