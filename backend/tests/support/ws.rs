//! WebSocket-focused test helpers.
//!
//! Integration tests under `backend/tests/` compile as separate crates, so
//! sharing small WebSocket setup helpers helps avoid copy/paste drift.

use actix_web::HttpServer;
use actix_web::cookie::Cookie;
use actix_web::dev::ServerHandle;
use awc::{BoxedSocket, ws::Codec, ws::Frame, ws::Message};
use futures_util::{SinkExt, StreamExt};
use serde_json::{Value, json};
use telemetry_backend::server::build_app;
use telemetry_backend::test_support::TestBackend;

pub type Socket = actix_codec::Framed<BoxedSocket, Codec>;

/// A backend served on an ephemeral loopback port.
pub struct LiveServer {
    pub url: String,
    _handle: ServerHandle,
}

impl LiveServer {
    pub fn start(backend: &TestBackend) -> Self {
        let listener = std::net::TcpListener::bind("127.0.0.1:0").expect("bind test listener");
        let addr = listener.local_addr().expect("listener addr");
        let deps = backend.app_dependencies();
        let server = HttpServer::new(move || build_app(deps.clone()))
            .workers(1)
            .listen(listener)
            .expect("bind test server")
            .disable_signals()
            .run();
        let handle = server.handle();
        actix_web::rt::spawn(server);
        Self {
            url: format!("http://{addr}"),
            _handle: handle,
        }
    }

    /// Log in over HTTP and return the session cookie.
    pub async fn login(&self, username: &str, password: &str) -> Cookie<'static> {
        let res = awc::Client::default()
            .post(format!("{}/auth/login", self.url))
            .send_json(&json!({ "username": username, "password": password }))
            .await
            .expect("login request");
        assert!(res.status().is_success(), "login as {username}");
        res.cookie("session").expect("session cookie")
    }

    pub async fn connect(&self, cookie: Option<Cookie<'static>>) -> Socket {
        let mut request = awc::Client::default().ws(format!("{}/ws", self.url));
        if let Some(cookie) = cookie {
            request = request.cookie(cookie);
        }
        let (_resp, socket) = request.connect().await.expect("websocket connect");
        socket
    }
}

pub async fn send_event(socket: &mut Socket, event: &str, data: Value) {
    let body = json!({ "event": event, "data": data }).to_string();
    socket
        .send(Message::Text(body.into()))
        .await
        .expect("send text");
}

/// Next event that answers something the client did. Greetings and
/// connection counts are skipped; heartbeats are answered.
pub async fn next_reply(socket: &mut Socket) -> Value {
    loop {
        let frame = socket.next().await.expect("response frame").expect("frame");
        match frame {
            Frame::Text(bytes) => {
                let event: Value = serde_json::from_slice(&bytes).expect("json");
                if event["event"] != "client_count" && event["event"] != "connection_response" {
                    return event;
                }
            }
            Frame::Ping(payload) => socket.send(Message::Pong(payload)).await.expect("pong"),
            Frame::Pong(_) => {}
            other => panic!("expected text frame, got {other:?}"),
        }
    }
}
