//! Role-gated telemetry dashboard backend.
//!
//! Hexagonal layout: `domain` holds the vocabulary, policies and services;
//! `inbound` adapts HTTP and WebSocket traffic onto the domain's driving
//! ports; `outbound` implements the driven ports; `server` wires them
//! together.

pub mod doc;
pub mod domain;
pub mod inbound;
pub mod middleware;
pub mod outbound;
pub mod server;
pub mod settings;
#[cfg(any(test, feature = "test-support"))]
pub mod test_support;

/// Public OpenAPI surface used by Swagger UI and tooling.
pub use doc::ApiDoc;
pub use middleware::Trace;
