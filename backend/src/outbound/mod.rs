//! Outbound adapters implementing domain ports for external infrastructure.
//!
//! - **memory**: process-local account, role and telemetry stores
//! - **password**: PBKDF2 password digests
//! - **xlsx**: spreadsheet rendering for exports
//!
//! Adapters are thin translators between domain types and their storage or
//! wire representation. They contain no business logic.

pub mod memory;
pub mod password;
pub mod xlsx;
