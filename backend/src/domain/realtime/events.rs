//! Real-time channel vocabulary: identifiers, rooms, and the event envelopes.
//!
//! Frames are JSON objects `{"event": <name>, "data": {...}}`.

use std::fmt;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use uuid::Uuid;

/// Room every join/leave falls back to when none is named.
pub const DEFAULT_ROOM: &str = "default";
/// Room that receives panel updates.
pub const DASHBOARD_ROOM: &str = "dashboard";
/// Greeting sent in `connection_response`.
pub const CONNECTED_MESSAGE: &str = "Connected to MTI WebSocket server";
/// Maximum stored length of a room name.
pub const ROOM_NAME_MAX: usize = 100;

/// Opaque per-connection identifier.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(transparent)]
pub struct ConnectionId(Uuid);

impl ConnectionId {
    #[must_use]
    pub fn random() -> Self {
        Self(Uuid::new_v4())
    }

    #[must_use]
    pub const fn from_uuid(uuid: Uuid) -> Self {
        Self(uuid)
    }
}

impl fmt::Display for ConnectionId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt::Display::fmt(&self.0, f)
    }
}

/// Broadcast group name. Trimmed, non-empty.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
#[serde(transparent)]
pub struct RoomName(String);

impl RoomName {
    /// Normalise a client-supplied room, falling back to [`DEFAULT_ROOM`].
    #[must_use]
    pub fn from_client(raw: Option<&str>) -> Self {
        raw.map(str::trim)
            .filter(|room| !room.is_empty())
            .map(|room| room.chars().take(ROOM_NAME_MAX).collect::<String>())
            .map_or_else(Self::default_room, Self)
    }

    #[must_use]
    pub fn default_room() -> Self {
        Self(DEFAULT_ROOM.to_owned())
    }

    #[must_use]
    pub fn dashboard() -> Self {
        Self(DASHBOARD_ROOM.to_owned())
    }

    #[must_use]
    pub fn is_dashboard(&self) -> bool {
        self.0 == DASHBOARD_ROOM
    }
}

impl AsRef<str> for RoomName {
    fn as_ref(&self) -> &str {
        self.0.as_str()
    }
}

impl fmt::Display for RoomName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

#[derive(Debug, Deserialize)]
struct Envelope {
    event: String,
    #[serde(default)]
    data: Value,
}

/// Event received from a client.
#[derive(Debug, Clone, PartialEq)]
pub enum ClientEvent {
    JoinRoom { room: RoomName },
    LeaveRoom { room: RoomName },
    PanelUpdate { panel_id: Value, data: Value },
    PingLatency { client_time: Value },
    /// Well-formed envelope with an event name outside the contract.
    Unknown { event: String },
}

impl ClientEvent {
    /// Parse a text frame. Fails only when the frame is not an envelope.
    ///
    /// # Examples
    /// ```
    /// use telemetry_backend::domain::realtime::{ClientEvent, RoomName};
    ///
    /// let event = ClientEvent::parse(r#"{"event":"join_room","data":{}}"#).expect("envelope");
    /// assert_eq!(event, ClientEvent::JoinRoom { room: RoomName::default_room() });
    /// ```
    pub fn parse(text: &str) -> Result<Self, serde_json::Error> {
        let Envelope { event, data } = serde_json::from_str(text)?;
        let field = |name: &str| data.get(name).cloned().unwrap_or(Value::Null);
        let room = || RoomName::from_client(data.get("room").and_then(Value::as_str));
        Ok(match event.as_str() {
            "join_room" => Self::JoinRoom { room: room() },
            "leave_room" => Self::LeaveRoom { room: room() },
            "panel_update" => Self::PanelUpdate {
                panel_id: field("panel_id"),
                data: match field("data") {
                    Value::Null => Value::Object(serde_json::Map::new()),
                    other => other,
                },
            },
            "ping_latency" => Self::PingLatency {
                client_time: field("client_time"),
            },
            _ => Self::Unknown { event },
        })
    }
}

/// Event sent to clients.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "event", content = "data", rename_all = "snake_case")]
pub enum ServerEvent {
    ConnectionResponse {
        status: &'static str,
        client_id: ConnectionId,
        message: &'static str,
    },
    ClientCount {
        count: usize,
    },
    RoomJoined {
        room: RoomName,
    },
    RoomLeft {
        room: RoomName,
    },
    PanelData {
        panel_id: Value,
        data: Value,
        timestamp: DateTime<Utc>,
    },
    PongLatency {
        client_time: Value,
        /// Milliseconds since the Unix epoch.
        server_time: i64,
    },
    Error {
        code: &'static str,
        message: String,
        #[serde(skip_serializing_if = "Option::is_none")]
        room: Option<RoomName>,
    },
}

impl ServerEvent {
    #[must_use]
    pub fn connected(client_id: ConnectionId) -> Self {
        Self::ConnectionResponse {
            status: "connected",
            client_id,
            message: CONNECTED_MESSAGE,
        }
    }

    /// Wire name, as carried in the `event` field.
    #[must_use]
    pub const fn name(&self) -> &'static str {
        match self {
            Self::ConnectionResponse { .. } => "connection_response",
            Self::ClientCount { .. } => "client_count",
            Self::RoomJoined { .. } => "room_joined",
            Self::RoomLeft { .. } => "room_left",
            Self::PanelData { .. } => "panel_data",
            Self::PongLatency { .. } => "pong_latency",
            Self::Error { .. } => "error",
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;
    use insta::assert_json_snapshot;
    use rstest::rstest;
    use serde_json::json;

    #[rstest]
    #[case(r#"{"event":"join_room","data":{"room":"dashboard"}}"#, ClientEvent::JoinRoom { room: RoomName::dashboard() })]
    #[case(r#"{"event":"leave_room"}"#, ClientEvent::LeaveRoom { room: RoomName::default_room() })]
    #[case(r#"{"event":"join_room","data":{"room":"  "}}"#, ClientEvent::JoinRoom { room: RoomName::default_room() })]
    #[case(r#"{"event":"ping_latency","data":{"client_time":17}}"#, ClientEvent::PingLatency { client_time: json!(17) })]
    #[case(r#"{"event":"stress_test","data":{}}"#, ClientEvent::Unknown { event: "stress_test".into() })]
    fn parses_client_events(#[case] frame: &str, #[case] expected: ClientEvent) {
        assert_eq!(ClientEvent::parse(frame).expect("envelope"), expected);
    }

    #[rstest]
    fn panel_update_defaults_data_to_empty_object() {
        let event = ClientEvent::parse(r#"{"event":"panel_update","data":{"panel_id":2}}"#)
            .expect("envelope");
        assert_eq!(
            event,
            ClientEvent::PanelUpdate {
                panel_id: json!(2),
                data: json!({}),
            }
        );
    }

    #[rstest]
    #[case("not json")]
    #[case(r#"{"data":{}}"#)]
    #[case("[1,2]")]
    fn rejects_non_envelopes(#[case] frame: &str) {
        assert!(ClientEvent::parse(frame).is_err());
    }

    #[rstest]
    fn serialises_client_count() {
        assert_json_snapshot!(ServerEvent::ClientCount { count: 3 }, @r#"
        {
          "event": "client_count",
          "data": {
            "count": 3
          }
        }
        "#);
    }

    #[rstest]
    fn serialises_connection_response() {
        let id = ConnectionId::from_uuid(Uuid::nil());
        assert_json_snapshot!(ServerEvent::connected(id), @r#"
        {
          "event": "connection_response",
          "data": {
            "status": "connected",
            "client_id": "00000000-0000-0000-0000-000000000000",
            "message": "Connected to MTI WebSocket server"
          }
        }
        "#);
    }

    #[rstest]
    fn serialises_panel_data_with_utc_timestamp() {
        let event = ServerEvent::PanelData {
            panel_id: json!(1),
            data: json!({"value": 4}),
            timestamp: Utc
                .with_ymd_and_hms(2024, 1, 2, 3, 4, 5)
                .single()
                .expect("time"),
        };
        let value = serde_json::to_value(&event).expect("serialise");
        assert_eq!(value["event"], "panel_data");
        assert_eq!(value["data"]["panel_id"], 1);
        assert_eq!(value["data"]["timestamp"], "2024-01-02T03:04:05Z");
        assert_eq!(event.name(), "panel_data");
    }

    #[rstest]
    fn error_omits_absent_room() {
        let value = serde_json::to_value(ServerEvent::Error {
            code: "unknown_event",
            message: "unsupported event".into(),
            room: None,
        })
        .expect("serialise");
        assert_eq!(value, json!({"event": "error", "data": {"code": "unknown_event", "message": "unsupported event"}}));
    }
}
