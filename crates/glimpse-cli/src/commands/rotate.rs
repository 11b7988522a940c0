//! One-shot rotation command.
//!
//! Runs a single selection cycle outside the service loop, prints the
//! outcome per session, and persists the updated bookkeeping.

use chrono::Utc;

use glimpse_core::config::sessions_path;
use glimpse_core::{Config, Delivery, FallbackCache, LogDelivery, Rotator, SessionRegistry};

pub fn run(device: Option<String>, deliver: bool) -> Result<(), Box<dyn std::error::Error>> {
    let config = Config::load_or_default();
    let mut registry = SessionRegistry::load(sessions_path()?)?;
    if registry.is_empty() {
        println!("No sessions registered.");
        return Ok(());
    }

    let device_refs = match device {
        Some(device_ref) => vec![device_ref],
        None => registry.device_refs(),
    };

    let cache = FallbackCache::new();
    let mut rotator = Rotator::new(&config.rotation);
    let deliverer = LogDelivery;
    let now = Utc::now();

    for device_ref in device_refs {
        let Some(session) = registry.get_mut(&device_ref) else {
            eprintln!("no such session: {device_ref}");
            std::process::exit(1);
        };

        let selection = rotator.rotate(session, &cache, now);
        let prefix: String = device_ref.chars().take(8).collect();
        println!(
            "{prefix}...  {:18} {:6.1}  {}",
            selection.presentation.to_string(),
            selection.score,
            selection.reason
        );

        if deliver {
            let outcome = deliverer.deliver(
                session.delivery_target(),
                &session.activity_ref,
                &selection.content,
            );
            println!("          delivery: {outcome:?}");
        }
    }

    registry.save()?;
    Ok(())
}
