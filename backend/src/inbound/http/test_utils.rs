//! Test helpers for inbound HTTP components.

use actix_http::Request;
use actix_session::{SessionMiddleware, storage::CookieSessionStore};
use actix_web::body::MessageBody;
use actix_web::cookie::{Cookie, Key};
use actix_web::dev::{Service, ServiceResponse};
use actix_web::http::StatusCode;
use actix_web::test;
use serde_json::{Value, json};

/// Build a session middleware configured for tests.
///
/// - Generates a fresh signing/encryption key per invocation.
/// - Sets the cookie name to `session` and disables the `Secure` flag for
///   local HTTP tests.
pub fn test_session_middleware() -> SessionMiddleware<CookieSessionStore> {
    SessionMiddleware::builder(CookieSessionStore::default(), Key::generate())
        .cookie_name("session".to_owned())
        .cookie_secure(false)
        .build()
}

/// Log in through `POST /auth/login` and return the session cookie.
pub async fn login_cookie<S, B>(app: &S, username: &str, password: &str) -> Cookie<'static>
where
    S: Service<Request, Response = ServiceResponse<B>, Error = actix_web::Error>,
    B: MessageBody,
{
    let res = test::call_service(
        app,
        test::TestRequest::post()
            .uri("/auth/login")
            .set_json(json!({ "username": username, "password": password }))
            .to_request(),
    )
    .await;
    assert_eq!(res.status(), StatusCode::OK, "login as {username}");
    res.response()
        .cookies()
        .find(|cookie| cookie.name() == "session")
        .map(Cookie::into_owned)
        .unwrap_or_else(|| panic!("session cookie for {username}"))
}

/// Status and JSON body of a response.
pub async fn status_and_json<B>(res: ServiceResponse<B>) -> (StatusCode, Value)
where
    B: MessageBody,
{
    let status = res.status();
    let body = test::read_body(res).await;
    let value = if body.is_empty() {
        Value::Null
    } else {
        serde_json::from_slice(&body).unwrap_or_else(|err| panic!("json body: {err}"))
    };
    (status, value)
}
