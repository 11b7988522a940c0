//! Rotation service command.
//!
//! Runs the periodic rotation loop until interrupted. Payloads go to the
//! logging deliverer; a real push transport plugs in behind the same
//! `Delivery` trait.

use std::sync::Arc;

use tokio_util::sync::CancellationToken;

use glimpse_core::config::sessions_path;
use glimpse_core::{Config, LogDelivery, RotationService, SessionRegistry};

pub fn run(interval: Option<u64>) -> Result<(), Box<dyn std::error::Error>> {
    let mut config = Config::load_or_default();
    if let Some(secs) = interval {
        config.rotation.interval_secs = secs;
    }

    let registry = SessionRegistry::load(sessions_path()?)?;
    println!(
        "serving {} sessions, rotating every {}s (ctrl-c to stop)",
        registry.len(),
        config.rotation.interval_secs
    );

    let runtime = tokio::runtime::Runtime::new()?;
    runtime.block_on(async {
        let service = RotationService::new(config, registry, Arc::new(LogDelivery));

        let cancel = CancellationToken::new();
        let watcher = cancel.clone();
        tokio::spawn(async move {
            if tokio::signal::ctrl_c().await.is_ok() {
                watcher.cancel();
            }
        });

        service.run(None, cancel).await;
    });

    Ok(())
}
