//! # Glimpse Core Library
//!
//! This library provides the core business logic for Glimpse, a service
//! that keeps a small set of live companion-device sessions showing the
//! right glanceable presentation. It implements a CLI-first philosophy
//! where all operations are available via a standalone CLI binary; any
//! HTTP/transport layer is a thin shell over the same core library.
//!
//! ## Architecture
//!
//! - **Rotation Engine**: a pure scorer plus a per-session selection cycle.
//!   The caller (or the built-in driver) invokes one cycle per session per
//!   tick; the engine never performs I/O itself
//! - **Session Registry**: explicit, JSON-persisted registry of device
//!   sessions and their synced context
//! - **Delivery Queue**: background worker that decouples slow push
//!   transports from the rotation loop
//! - **Fallback Cache**: shared calendar/mail snapshot used when a session
//!   has not synced data of its own
//!
//! ## Key Components
//!
//! - [`Rotator`]: one selection cycle for one session
//! - [`SessionRegistry`]: session bookkeeping and persistence
//! - [`RotationService`]: the periodic driver loop
//! - [`Delivery`]: trait for push-transport implementations
//! - [`ContextSource`]: trait for calendar/mail data sources

pub mod cache;
pub mod config;
pub mod content;
pub mod delivery;
pub mod driver;
pub mod error;
pub mod monitor;
pub mod presentation;
pub mod rotation;
pub mod session;

pub use cache::{ContextSource, FallbackCache};
pub use config::Config;
pub use content::ContentState;
pub use delivery::{Delivery, DeliveryOutcome, DeliveryQueue, LogDelivery};
pub use driver::RotationService;
pub use error::{ConfigError, CoreError, RegistryError};
pub use monitor::{ChangeTracker, DataChange};
pub use presentation::Presentation;
pub use rotation::{Hour, Jitter, RotationContext, Rotator, Scored, Selection};
pub use session::{
    CalendarEntry, EmailDigest, EmailMessage, EventStart, LastShown, Registration, SessionRecord,
    SessionRegistry, StateSync, WeatherSnapshot,
};
