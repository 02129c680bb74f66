use actix_web::{
    error::ResponseError,
    http::{header::ContentType, StatusCode},
    HttpResponse,
};
use feepay_engine::traits::{ErrorKind, LedgerError, UsdtRateError};
use log::*;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum ServerError {
    #[error("Could not initialize server. {0}")]
    InitializeError(String),
    #[error("An error occurred on the backend of the server. {0}")]
    BackendError(String),
    #[error("Payload deserialization error. {0}")]
    CouldNotDeserializePayload(String),
    #[error("Invalid query string. {0}")]
    InvalidQuery(String),
    #[error("Could not read request path: {0}")]
    InvalidRequestPath(String),
    #[error("Invalid request. {0}")]
    ValidationError(String),
    #[error("An I/O error happened in the server. {0}")]
    IOError(#[from] std::io::Error),
    #[error("Invalid server configuration. {0}")]
    ConfigurationError(String),
    #[error("UnspecifiedError. {0}")]
    Unspecified(String),
    #[error("Authentication Error. {0}")]
    AuthenticationError(#[from] AuthError),
    #[error("Invalid signature")]
    SignatureInvalid,
    #[error("The data was not found. {0}")]
    NoRecordFound(String),
    #[error("The request conflicts with the current state. {0}")]
    Conflict(String),
    #[error("The supplier rejected the order. {0}")]
    SupplierRejected(String),
    #[error("An upstream provider failed. {0}")]
    UpstreamError(String),
}

impl ResponseError for ServerError {
    fn status_code(&self) -> StatusCode {
        match self {
            Self::CouldNotDeserializePayload(_) => StatusCode::UNPROCESSABLE_ENTITY,
            Self::InvalidQuery(_) => StatusCode::BAD_REQUEST,
            Self::InvalidRequestPath(_) => StatusCode::BAD_REQUEST,
            Self::ValidationError(_) => StatusCode::BAD_REQUEST,
            Self::SupplierRejected(_) => StatusCode::BAD_REQUEST,
            Self::AuthenticationError(e) => match e {
                AuthError::MissingToken => StatusCode::UNAUTHORIZED,
                AuthError::InvalidToken => StatusCode::UNAUTHORIZED,
                AuthError::AdminDisabled => StatusCode::UNAUTHORIZED,
                AuthError::InvalidAdminId(_) => StatusCode::BAD_REQUEST,
                AuthError::ForbiddenPeer => StatusCode::FORBIDDEN,
            },
            Self::SignatureInvalid => StatusCode::UNAUTHORIZED,
            Self::NoRecordFound(_) => StatusCode::NOT_FOUND,
            Self::Conflict(_) => StatusCode::CONFLICT,
            Self::UpstreamError(_) => StatusCode::BAD_GATEWAY,
            Self::InitializeError(_) => StatusCode::INTERNAL_SERVER_ERROR,
            Self::BackendError(_) => StatusCode::INTERNAL_SERVER_ERROR,
            Self::IOError(_) => StatusCode::INTERNAL_SERVER_ERROR,
            Self::ConfigurationError(_) => StatusCode::INTERNAL_SERVER_ERROR,
            Self::Unspecified(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    fn error_response(&self) -> HttpResponse {
        // SQL errors and raw upstream bodies stay in the logs
        let message = match self {
            Self::BackendError(_) |
            Self::InitializeError(_) |
            Self::IOError(_) |
            Self::ConfigurationError(_) |
            Self::Unspecified(_) => {
                error!("💻️ Internal error. {self}");
                "An internal error occurred. Please try again later.".to_string()
            },
            Self::UpstreamError(_) => {
                warn!("💻️ Upstream failure. {self}");
                "An upstream provider is unavailable. Please try again later.".to_string()
            },
            _ => self.to_string(),
        };
        HttpResponse::build(self.status_code())
            .insert_header(ContentType::json())
            .body(serde_json::json!({ "error": message }).to_string())
    }
}

#[derive(Debug, Clone, Error)]
pub enum AuthError {
    #[error("No admin token was provided.")]
    MissingToken,
    #[error("The admin token is invalid.")]
    InvalidToken,
    #[error("Admin access is not configured on this server.")]
    AdminDisabled,
    #[error("X-Admin-Id must be a positive integer. {0}")]
    InvalidAdminId(String),
    #[error("Requests from this address are not allowed.")]
    ForbiddenPeer,
}

impl From<LedgerError> for ServerError {
    fn from(e: LedgerError) -> Self {
        match e.kind() {
            ErrorKind::Validation => Self::ValidationError(e.to_string()),
            ErrorKind::NotFound => Self::NoRecordFound(e.to_string()),
            ErrorKind::SignatureInvalid => Self::SignatureInvalid,
            ErrorKind::Upstream => Self::UpstreamError(e.to_string()),
            ErrorKind::Conflict => Self::Conflict(e.to_string()),
            ErrorKind::Internal => Self::BackendError(e.to_string()),
        }
    }
}

impl From<UsdtRateError> for ServerError {
    fn from(e: UsdtRateError) -> Self {
        match e {
            UsdtRateError::DatabaseError(s) => Self::BackendError(format!("Database error: {s}")),
            UsdtRateError::RateDoesNotExist => Self::NoRecordFound(e.to_string()),
            UsdtRateError::InvalidRate(_) => Self::ValidationError(e.to_string()),
        }
    }
}
