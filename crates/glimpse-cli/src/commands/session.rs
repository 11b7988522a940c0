//! Session registry management commands.

use clap::Subcommand;

use chrono::Utc;
use glimpse_core::config::sessions_path;
use glimpse_core::{Registration, SessionRegistry, StateSync};

#[derive(Subcommand)]
pub enum SessionAction {
    /// List registered sessions
    List {
        /// Emit as JSON
        #[arg(long)]
        json: bool,
    },
    /// Register a device
    Register {
        /// Opaque device reference (at least 32 characters)
        device_ref: String,
        /// Rendering surface reference on the device
        activity_ref: String,
        /// Dedicated push target, if different from the device reference
        #[arg(long)]
        push_ref: Option<String>,
    },
    /// Remove a registered session
    Remove { device_ref: String },
    /// Merge a state snapshot (JSON file) into a session
    Sync {
        /// Path to a JSON file with the snapshot
        file: std::path::PathBuf,
    },
}

pub fn run(action: SessionAction) -> Result<(), Box<dyn std::error::Error>> {
    let path = sessions_path()?;
    let mut registry = SessionRegistry::load(path)?;

    match action {
        SessionAction::List { json } => {
            if json {
                let sessions: Vec<_> = registry.iter().collect();
                println!("{}", serde_json::to_string_pretty(&sessions)?);
                return Ok(());
            }
            if registry.is_empty() {
                println!("No sessions registered.");
                return Ok(());
            }
            println!("=== Sessions ({}) ===\n", registry.len());
            for session in registry.iter() {
                let prefix: String = session.device_ref.chars().take(8).collect();
                println!("{prefix}...");
                println!("  activity: {}", session.activity_ref);
                println!("  timezone: {}", session.timezone.as_deref().unwrap_or("-"));
                println!("  events: {}", session.calendar_events.len());
                println!("  unread: {}", session.unread_count());
                match session.last_shown {
                    Some(last) => println!("  last shown: {} at {}", last.presentation, last.at),
                    None => println!("  last shown: never"),
                }
                println!();
            }
        }
        SessionAction::Register {
            device_ref,
            activity_ref,
            push_ref,
        } => {
            registry.register(
                Registration {
                    device_ref,
                    activity_ref,
                    push_ref,
                },
                Utc::now(),
            )?;
            registry.save()?;
            println!("ok ({} sessions)", registry.len());
        }
        SessionAction::Remove { device_ref } => {
            if registry.unregister(&device_ref).is_some() {
                registry.save()?;
                println!("removed");
            } else {
                eprintln!("no such session");
                std::process::exit(1);
            }
        }
        SessionAction::Sync { file } => {
            let content = std::fs::read_to_string(&file)?;
            let sync: StateSync = serde_json::from_str(&content)?;
            registry.sync_state(sync, Utc::now())?;
            registry.save()?;
            println!("synced");
        }
    }

    Ok(())
}
