//! Process-local stores.
//!
//! Both stores live for the lifetime of the server and are shared behind
//! `Arc`. Each guards its state with a single Tokio `RwLock`.

mod directory;
mod telemetry;

pub use directory::InMemoryDirectory;
pub use telemetry::InMemoryTelemetryRepository;
