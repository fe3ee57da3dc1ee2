//! Per-connection WebSocket handler.
//!
//! Keeps WebSocket framing and heartbeats at the edge while deferring
//! application behaviour to the [`RealtimeHub`]. The public contract pings
//! every 5s and considers a connection idle after 10s without client
//! traffic. Tests shorten these intervals to speed up feedback.

use std::time::{Duration, Instant};

use actix_ws::{CloseCode, CloseReason, Closed, Message, MessageStream, ProtocolError, Session};
use tokio::time;
use tracing::warn;

use crate::domain::Principal;
use crate::domain::realtime::{ClientEvent, Connection, RealtimeHub, ServerEvent};

/// Time between heartbeats to the client (5s in production, shorter in tests).
#[cfg(not(test))]
const HEARTBEAT_INTERVAL: Duration = Duration::from_secs(5);
#[cfg(test)]
const HEARTBEAT_INTERVAL: Duration = Duration::from_millis(50);

/// Max idle time before disconnecting the client (10s in production, shorter in tests).
#[cfg(not(test))]
const CLIENT_TIMEOUT: Duration = Duration::from_secs(10);
#[cfg(test)]
const CLIENT_TIMEOUT: Duration = Duration::from_millis(100);

pub(super) async fn handle_ws_session(
    hub: RealtimeHub,
    principal: Option<Principal>,
    connection: Connection,
    session: Session,
    stream: MessageStream,
) {
    WsSession {
        hub,
        principal,
        connection,
    }
    .run(session, stream)
    .await;
}

enum SessionError {
    ClientClosed(Option<CloseReason>),
    StreamClosed,
    HeartbeatTimeout,
    Protocol(ProtocolError),
    InvalidPayload,
    Network(Closed),
}

enum CloseAction {
    None,
    Close(Option<CloseReason>),
}

struct WsSession {
    hub: RealtimeHub,
    principal: Option<Principal>,
    connection: Connection,
}

impl WsSession {
    async fn run(mut self, mut session: Session, mut stream: MessageStream) {
        let mut last_heartbeat = Instant::now();
        let mut heartbeat = time::interval(HEARTBEAT_INTERVAL);

        loop {
            let result = tokio::select! {
                _ = heartbeat.tick() => {
                    Self::handle_heartbeat_tick(&mut session, &last_heartbeat).await
                }
                event = self.connection.next_event() => {
                    match event {
                        Some(event) => Self::send_json(&mut session, &event)
                            .await
                            .map_err(SessionError::Network),
                        None => Err(SessionError::StreamClosed),
                    }
                }
                message = stream.recv() => {
                    self.handle_stream_message(&mut session, &mut last_heartbeat, message)
                        .await
                }
            };

            if let Err(error) = result {
                Self::log_shutdown_reason(&error);
                let close_action = Self::close_action_for(&error);
                Self::close_session_if_needed(session, close_action).await;
                // Dropping `self` releases the connection from the registry.
                return;
            }
        }
    }

    async fn handle_heartbeat_tick(
        session: &mut Session,
        last_heartbeat: &Instant,
    ) -> Result<(), SessionError> {
        if Instant::now().duration_since(*last_heartbeat) > CLIENT_TIMEOUT {
            return Err(SessionError::HeartbeatTimeout);
        }

        session.ping(b"").await.map_err(SessionError::Network)
    }

    async fn handle_stream_message(
        &self,
        session: &mut Session,
        last_heartbeat: &mut Instant,
        message: Option<Result<Message, ProtocolError>>,
    ) -> Result<(), SessionError> {
        let Some(message) = message else {
            return Err(SessionError::StreamClosed);
        };

        match message {
            Ok(message) => self.handle_message(session, last_heartbeat, message).await,
            Err(error) => Err(SessionError::Protocol(error)),
        }
    }

    async fn handle_message(
        &self,
        session: &mut Session,
        last_heartbeat: &mut Instant,
        message: Message,
    ) -> Result<(), SessionError> {
        match message {
            Message::Ping(payload) => {
                *last_heartbeat = Instant::now();
                session
                    .pong(&payload)
                    .await
                    .map_err(SessionError::Network)?;
                Ok(())
            }
            Message::Text(text) => {
                *last_heartbeat = Instant::now();
                self.handle_text_message(text.as_ref()).await
            }
            Message::Pong(_) | Message::Binary(_) | Message::Continuation(_) | Message::Nop => {
                *last_heartbeat = Instant::now();
                Ok(())
            }
            Message::Close(reason) => Err(SessionError::ClientClosed(reason)),
        }
    }

    /// Replies travel back through the connection's outbox, not directly.
    async fn handle_text_message(&self, text: &str) -> Result<(), SessionError> {
        let event = match ClientEvent::parse(text) {
            Ok(event) => event,
            Err(error) => {
                warn!(
                    connection_id = %self.connection.id(),
                    error = %error,
                    "Rejected malformed WebSocket payload"
                );
                return Err(SessionError::InvalidPayload);
            }
        };
        self.hub
            .handle(self.connection.id(), self.principal.as_ref(), event)
            .await;
        Ok(())
    }

    async fn send_json(session: &mut Session, event: &ServerEvent) -> Result<(), Closed> {
        match serde_json::to_string(event) {
            Ok(body) => session.text(body).await,
            Err(error) => {
                // Debug builds fail fast so schema drift is fixed; release logs and carries on.
                if cfg!(debug_assertions) {
                    panic!("server events must serialize: {error}");
                } else {
                    warn!(error = %error, event = event.name(), "Failed to serialize WebSocket payload");
                }
                Ok(())
            }
        }
    }

    fn log_shutdown_reason(error: &SessionError) {
        match error {
            SessionError::HeartbeatTimeout => {
                warn!("WebSocket heartbeat timeout; closing connection");
            }
            SessionError::Protocol(error) => {
                warn!(error = %error, "WebSocket protocol error");
            }
            SessionError::Network(error) => {
                warn!(error = %error, "WebSocket send failed; closing connection");
            }
            SessionError::InvalidPayload
            | SessionError::ClientClosed(_)
            | SessionError::StreamClosed => {}
        }
    }

    fn close_action_for(error: &SessionError) -> CloseAction {
        match error {
            SessionError::HeartbeatTimeout => CloseAction::Close(Some(CloseReason {
                code: CloseCode::Normal,
                description: Some("heartbeat timeout".to_owned()),
            })),
            SessionError::Protocol(_) => CloseAction::Close(Some(CloseReason {
                code: CloseCode::Protocol,
                description: Some("protocol error".to_owned()),
            })),
            SessionError::InvalidPayload => CloseAction::Close(Some(CloseReason {
                code: CloseCode::Policy,
                description: Some("invalid payload".to_owned()),
            })),
            SessionError::ClientClosed(reason) => CloseAction::Close(reason.clone()),
            SessionError::StreamClosed | SessionError::Network(_) => CloseAction::None,
        }
    }

    async fn close_session_if_needed(session: Session, close_action: CloseAction) {
        if let CloseAction::Close(reason) = close_action {
            if let Err(error) = session.close(reason).await {
                warn!(error = %error, "Failed to close WebSocket session");
            }
        }
    }
}

#[cfg(test)]
#[path = "session_tests.rs"]
mod tests;
