//! Admin authentication.
//!
//! Admin routes take an [`AdminIdentity`] argument. The extractor checks the `X-Admin-Token` header against the
//! configured token in constant time, and reads the acting admin's id from `X-Admin-Id`. That id is what ends up in
//! `changed_by`, `confirmed_by` and `verified_by` on the ledger.
use actix_web::{dev::Payload, web, FromRequest, HttpRequest};
use fpg_common::Secret;
use futures::future::{ready, Ready};
use log::*;
use subtle::ConstantTimeEq;

use crate::errors::{AuthError, ServerError};

pub const ADMIN_TOKEN_HEADER: &str = "X-Admin-Token";
pub const ADMIN_ID_HEADER: &str = "X-Admin-Id";

/// The configured admin token, registered as app data.
#[derive(Clone, Debug, Default)]
pub struct AdminAuth {
    token: Secret<String>,
}

impl AdminAuth {
    pub fn new(token: Secret<String>) -> Self {
        Self { token }
    }

    pub fn is_enabled(&self) -> bool {
        !self.token.is_empty()
    }

    pub fn check_token(&self, provided: &str) -> Result<(), AuthError> {
        if !self.is_enabled() {
            return Err(AuthError::AdminDisabled);
        }
        let expected = self.token.reveal().as_bytes();
        if bool::from(expected.ct_eq(provided.as_bytes())) {
            Ok(())
        } else {
            Err(AuthError::InvalidToken)
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct AdminIdentity {
    pub admin_id: i64,
}

impl FromRequest for AdminIdentity {
    type Error = ServerError;
    type Future = Ready<Result<Self, Self::Error>>;

    fn from_request(req: &HttpRequest, _payload: &mut Payload) -> Self::Future {
        ready(authenticate(req))
    }
}

fn authenticate(req: &HttpRequest) -> Result<AdminIdentity, ServerError> {
    let auth = req.app_data::<web::Data<AdminAuth>>().ok_or_else(|| {
        error!("💻️ AdminAuth is not registered as app data. Admin routes are unusable.");
        ServerError::AuthenticationError(AuthError::AdminDisabled)
    })?;
    let token = req
        .headers()
        .get(ADMIN_TOKEN_HEADER)
        .and_then(|v| v.to_str().ok())
        .ok_or(ServerError::AuthenticationError(AuthError::MissingToken))?;
    auth.check_token(token).map_err(|e| {
        warn!("💻️ Admin request to {} refused. {e}", req.path());
        ServerError::AuthenticationError(e)
    })?;
    let id = req.headers().get(ADMIN_ID_HEADER).and_then(|v| v.to_str().ok()).unwrap_or_default();
    let admin_id = id
        .trim()
        .parse::<i64>()
        .ok()
        .filter(|id| *id > 0)
        .ok_or_else(|| ServerError::AuthenticationError(AuthError::InvalidAdminId(format!("Got '{id}'"))))?;
    trace!("💻️ Admin {admin_id} authenticated for {}", req.path());
    Ok(AdminIdentity { admin_id })
}
