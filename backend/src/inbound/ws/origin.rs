//! Origin allow-list for WebSocket upgrades.

use actix_web::HttpRequest;
use actix_web::http::header::{HeaderValue, ORIGIN};
use tracing::{error, warn};
use url::Url;

/// Which browser origins may open a socket.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub enum CorsPolicy {
    /// Every origin, including requests without an `Origin` header.
    #[default]
    Any,
    /// Exact ASCII-serialised origins such as `https://ops.example:8443`.
    AllowList(Vec<String>),
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum CorsPolicyError {
    #[error("origin allow-list is empty")]
    Empty,
    #[error("'{origin}' is not a valid origin: {reason}")]
    InvalidOrigin { origin: String, reason: String },
}

fn normalise(origin: &Url) -> Option<String> {
    let origin = origin.origin();
    origin.is_tuple().then(|| origin.ascii_serialization())
}

impl CorsPolicy {
    /// Parse a comma-separated list. `*` anywhere admits every origin and
    /// blank entries are ignored.
    ///
    /// # Examples
    /// ```
    /// use telemetry_backend::inbound::ws::CorsPolicy;
    ///
    /// let policy = CorsPolicy::parse("https://ops.example/, ,http://localhost:3000")
    ///     .expect("valid list");
    /// assert_eq!(
    ///     policy,
    ///     CorsPolicy::AllowList(vec![
    ///         "https://ops.example".to_owned(),
    ///         "http://localhost:3000".to_owned(),
    ///     ])
    /// );
    /// ```
    pub fn parse(raw: &str) -> Result<Self, CorsPolicyError> {
        let entries: Vec<&str> = raw
            .split(',')
            .map(str::trim)
            .filter(|entry| !entry.is_empty())
            .collect();
        if entries.contains(&"*") {
            return Ok(Self::Any);
        }
        if entries.is_empty() {
            return Err(CorsPolicyError::Empty);
        }
        let mut origins = Vec::with_capacity(entries.len());
        for entry in entries {
            let invalid = |reason: String| CorsPolicyError::InvalidOrigin {
                origin: entry.to_owned(),
                reason,
            };
            let url = Url::parse(entry).map_err(|err| invalid(err.to_string()))?;
            let origin = normalise(&url).ok_or_else(|| invalid("opaque origin".to_owned()))?;
            if !origins.contains(&origin) {
                origins.push(origin);
            }
        }
        Ok(Self::AllowList(origins))
    }

    #[must_use]
    pub fn allows(&self, origin: &Url) -> bool {
        match self {
            Self::Any => true,
            Self::AllowList(allowed) => {
                normalise(origin).is_some_and(|origin| allowed.contains(&origin))
            }
        }
    }
}

/// Reject upgrades whose `Origin` header is missing, duplicated, malformed
/// or outside the policy.
pub(super) fn check_origin(req: &HttpRequest, policy: &CorsPolicy) -> actix_web::Result<()> {
    let mut origins = req.headers().get_all(ORIGIN);
    let Some(header) = origins.next() else {
        if *policy == CorsPolicy::Any {
            return Ok(());
        }
        error!("Missing Origin header on WebSocket upgrade");
        return Err(actix_web::error::ErrorForbidden("Origin not allowed"));
    };
    if origins.next().is_some() {
        error!("Multiple Origin headers on WebSocket upgrade");
        return Err(actix_web::error::ErrorBadRequest("Invalid Origin header"));
    }
    validate_origin(header, policy)
}

fn validate_origin(header: &HeaderValue, policy: &CorsPolicy) -> actix_web::Result<()> {
    let value = header.to_str().map_err(|error| {
        error!(error = %error, "Failed to parse Origin header as string");
        actix_web::error::ErrorBadRequest("Invalid Origin header")
    })?;
    let origin = Url::parse(value).map_err(|error| {
        error!(error = %error, "Failed to parse Origin header as URL");
        actix_web::error::ErrorBadRequest("Invalid Origin header")
    })?;
    if policy.allows(&origin) {
        Ok(())
    } else {
        warn!(origin = value, "Rejected WS upgrade due to disallowed Origin");
        Err(actix_web::error::ErrorForbidden("Origin not allowed"))
    }
}
