//! Shared WebSocket adapter state.
//!
//! WebSocket entry points depend on domain ports and the realtime hub rather
//! than constructing services directly, so tests can swap in doubles.

use std::sync::Arc;

use crate::domain::ports::LoginService;
use crate::domain::realtime::RealtimeHub;

use super::origin::CorsPolicy;

/// Dependency bundle for WebSocket handlers.
#[derive(Clone)]
pub struct WsState {
    pub hub: RealtimeHub,
    pub login: Arc<dyn LoginService>,
    pub cors: CorsPolicy,
}

impl WsState {
    /// Construct state from explicit port implementations.
    pub fn new(hub: RealtimeHub, login: Arc<dyn LoginService>, cors: CorsPolicy) -> Self {
        Self { hub, login, cors }
    }
}
