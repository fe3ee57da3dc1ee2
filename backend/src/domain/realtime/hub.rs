//! Real-time use-cases: what each client event does.

use std::sync::Arc;

use mockable::Clock;
use tracing::{debug, warn};

use super::{
    ClientEvent, Connection, ConnectionId, ConnectionRegistry, RoomName, RoomPolicy, ServerEvent,
};
use crate::domain::ports::AccessControl;
use crate::domain::{Decision, Operation, PanelNumber, Principal};

/// Routes client events through the registry, applying the room policy.
#[derive(Clone)]
pub struct RealtimeHub {
    registry: Arc<ConnectionRegistry>,
    access: Arc<dyn AccessControl>,
    policy: RoomPolicy,
    clock: Arc<dyn Clock>,
}

impl RealtimeHub {
    pub fn new(
        registry: Arc<ConnectionRegistry>,
        access: Arc<dyn AccessControl>,
        policy: RoomPolicy,
        clock: Arc<dyn Clock>,
    ) -> Self {
        Self {
            registry,
            access,
            policy,
            clock,
        }
    }

    #[must_use]
    pub fn registry(&self) -> &Arc<ConnectionRegistry> {
        &self.registry
    }

    /// Register a connection for `principal` (anonymous when `None`).
    pub fn connect(&self, principal: Option<&Principal>) -> Connection {
        self.registry.connect(principal.map(|p| p.username().as_ref()))
    }

    /// Apply one client event on behalf of connection `id`.
    pub async fn handle(&self, id: ConnectionId, principal: Option<&Principal>, event: ClientEvent) {
        match event {
            ClientEvent::JoinRoom { room } => {
                if let Some(refusal) = self.join_refusal(principal, &room).await {
                    self.registry.unicast(id, &refusal);
                } else {
                    self.registry.join(id, room);
                }
            }
            ClientEvent::LeaveRoom { room } => {
                self.registry.leave(id, room);
            }
            ClientEvent::PanelUpdate { panel_id, data } => {
                let event = ServerEvent::PanelData {
                    panel_id,
                    data,
                    timestamp: self.clock.utc(),
                };
                let delivery = self.registry.publish_to_room(&RoomName::dashboard(), &event);
                debug!(
                    connection_id = %id,
                    delivered = delivery.delivered,
                    dropped = delivery.dropped,
                    "panel update fanned out"
                );
            }
            ClientEvent::PingLatency { client_time } => {
                let pong = ServerEvent::PongLatency {
                    client_time,
                    server_time: self.clock.utc().timestamp_millis(),
                };
                self.registry.unicast(id, &pong);
            }
            ClientEvent::Unknown { event } => {
                debug!(connection_id = %id, %event, "unsupported realtime event");
                self.registry.unicast(
                    id,
                    &ServerEvent::Error {
                        code: "unknown_event",
                        message: format!("unsupported event '{event}'"),
                        room: None,
                    },
                );
            }
        }
    }

    async fn join_refusal(&self, principal: Option<&Principal>, room: &RoomName) -> Option<ServerEvent> {
        if self.policy == RoomPolicy::Open || !room.is_dashboard() {
            return None;
        }
        let refuse = |code: &'static str, message: &str| {
            Some(ServerEvent::Error {
                code,
                message: message.to_owned(),
                room: Some(room.clone()),
            })
        };
        let Some(principal) = principal else {
            return refuse("unauthorized", "Login required to join this room");
        };
        let panel = Operation::ViewPanel(PanelNumber::ALL[0]);
        match self.access.authorize(principal, panel).await {
            Ok(Decision::Allow) => None,
            Ok(Decision::Deny(_)) => refuse("forbidden", "Insufficient permissions for this room"),
            Err(error) => {
                warn!(error = %error.message(), "room authorization failed");
                refuse("service_unavailable", "Authorization is temporarily unavailable")
            }
        }
    }
}
