//! WebSocket inbound adapter for the live dashboard channel.
//!
//! Responsibilities:
//! - validate upgrade requests against the origin policy
//! - resolve the optional principal from the session cookie
//! - hand the socket to a per-connection task driven by the realtime hub

use actix_web::web::{self, Payload};
use actix_web::{HttpRequest, HttpResponse, get};
use tracing::{error, warn};

use crate::inbound::http::session::SessionContext;

mod origin;
mod session;
pub mod state;

pub use origin::{CorsPolicy, CorsPolicyError};

/// Handle WebSocket upgrade for the `/ws` endpoint.
///
/// Anonymous sockets are accepted; a stale or unreadable session simply
/// yields an anonymous connection.
#[get("/ws")]
pub async fn ws_entry(
    state: web::Data<state::WsState>,
    user_session: SessionContext,
    req: HttpRequest,
    stream: Payload,
) -> actix_web::Result<HttpResponse> {
    origin::check_origin(&req, &state.cors)?;

    let principal = match user_session.user_id() {
        Ok(Some(user_id)) => match state.login.resolve(&user_id).await {
            Ok(principal) => principal,
            Err(err) => {
                warn!(%user_id, error = %err, "could not resolve socket principal");
                None
            }
        },
        Ok(None) => None,
        Err(err) => {
            warn!(error = %err, "could not read session for socket");
            None
        }
    };

    let (response, ws_session, messages) = actix_ws::handle(&req, stream).map_err(|error| {
        error!(error = %error, "WebSocket upgrade failed");
        error
    })?;

    let connection = state.hub.connect(principal.as_ref());
    actix_web::rt::spawn(session::handle_ws_session(
        state.hub.clone(),
        principal,
        connection,
        ws_session,
        messages,
    ));
    Ok(response)
}
