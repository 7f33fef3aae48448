mod action;

use clap::Parser;
use voucher_checkout::{config, logger};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let args = action::AppArgs::parse();

    let shutdown_handler = logger::setup_logging(&config::APP_CONFIG, args.log_level)?;

    let result = args.run().await;

    if let Some(shutdown_handler) = shutdown_handler {
        shutdown_handler.shutdown()?;
    }

    result
}
