//! Capability-gated principal extractor.
//!
//! A handler taking `Authorized<CanExport>` only runs for a logged-in user
//! whose role grants the export capability:
//!
//! ```ignore
//! #[get("/api/export")]
//! async fn export(user: Authorized<CanExport>) -> ApiResult<HttpResponse> { .. }
//! ```
//!
//! Anonymous requests fail with `401`, missing capabilities with `403`.
//! Checks that must run before the capability gate (self-deletion, for
//! example) stay in the domain services instead.

use std::marker::PhantomData;

use actix_web::{FromRequest, HttpRequest, dev::Payload, web};
use futures_util::future::LocalBoxFuture;

use crate::domain::{Error, Operation, Principal};
use crate::inbound::http::auth::current_principal;
use crate::inbound::http::session::SessionContext;
use crate::inbound::http::state::HttpState;

/// Names the operation an [`Authorized`] extractor checks.
pub trait Requirement {
    const OPERATION: Operation;
}

/// Spreadsheet export.
#[derive(Debug)]
pub struct CanExport;

impl Requirement for CanExport {
    const OPERATION: Operation = Operation::ExportData;
}

/// A principal already checked against `R::OPERATION`.
#[derive(Debug)]
pub struct Authorized<R> {
    principal: Principal,
    requirement: PhantomData<R>,
}

impl<R> Authorized<R> {
    pub fn principal(&self) -> &Principal {
        &self.principal
    }

    pub fn into_principal(self) -> Principal {
        self.principal
    }
}

impl<R: Requirement + 'static> FromRequest for Authorized<R> {
    type Error = Error;
    type Future = LocalBoxFuture<'static, Result<Self, Self::Error>>;

    fn from_request(req: &HttpRequest, payload: &mut Payload) -> Self::Future {
        let state = req.app_data::<web::Data<HttpState>>().cloned();
        let session = SessionContext::from_request(req, payload);
        Box::pin(async move {
            let state = state.ok_or_else(|| Error::internal("HTTP state is not configured"))?;
            let session = session.await?;
            let principal = current_principal(&state, &session).await?;
            state
                .access
                .authorize(&principal, R::OPERATION)
                .await?
                .into_result()?;
            Ok(Self {
                principal,
                requirement: PhantomData,
            })
        })
    }
}
