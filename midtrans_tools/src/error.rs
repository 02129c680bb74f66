use thiserror::Error;

#[derive(Debug, Clone, Error)]
pub enum MidtransApiError {
    #[error("Could not initialize client: {0}")]
    Initialization(String),
    #[error("Request to Midtrans failed: {0}")]
    RequestError(String),
    #[error("Midtrans returned HTTP {status}. {message}")]
    QueryError { status: u16, message: String },
    #[error("Could not deserialize Midtrans response: {0}")]
    JsonError(String),
    #[error("Midtrans did not return a snap token: {0}")]
    MissingToken(String),
    #[error("Midtrans only accepts whole rupiah amounts. Got {0}")]
    InvalidAmount(String),
}

impl From<reqwest::Error> for MidtransApiError {
    fn from(e: reqwest::Error) -> Self {
        Self::RequestError(e.to_string())
    }
}
