// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

use clap::Parser;
use tokio_util::sync::CancellationToken;
use tracing::{error, info};

use galaxy_console::config::Config;

#[tokio::main]
async fn main() {
    let config = Config::parse();

    if let Err(e) = config.validate() {
        eprintln!("error: {e}");
        std::process::exit(2);
    }

    galaxy_console::init_tracing(&config);
    galaxy_console::tls::ensure_crypto();

    let shutdown = CancellationToken::new();
    {
        let shutdown = shutdown.clone();
        tokio::spawn(async move {
            if tokio::signal::ctrl_c().await.is_ok() {
                info!("interrupted, shutting down");
            }
            shutdown.cancel();
        });
    }

    if let Err(e) = galaxy_console::run(config, shutdown).await {
        error!("fatal: {e:#}");
        std::process::exit(1);
    }
    // The stdin reader may still be parked in a blocking read.
    std::process::exit(0);
}
