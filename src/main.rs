// src/main.rs

use assetflow::{cli, logging};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let args = cli::parse();
    logging::init_logging(args.log_level)?;

    assetflow::run(args).await?;

    Ok(())
}
