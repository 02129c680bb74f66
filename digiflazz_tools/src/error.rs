use thiserror::Error;

#[derive(Debug, Clone, Error)]
pub enum DigiflazzApiError {
    #[error("Could not initialize client: {0}")]
    Initialization(String),
    #[error("Request to Digiflazz failed: {0}")]
    RequestError(String),
    #[error("Digiflazz request timed out: {0}")]
    Timeout(String),
    #[error("Digiflazz returned HTTP {status}. {message}")]
    QueryError { status: u16, message: String },
    #[error("Could not deserialize Digiflazz response: {0}")]
    JsonError(String),
    #[error("Digiflazz rejected the request: {0}")]
    Rejected(String),
}

impl From<reqwest::Error> for DigiflazzApiError {
    fn from(e: reqwest::Error) -> Self {
        if e.is_timeout() {
            Self::Timeout(e.to_string())
        } else {
            Self::RequestError(e.to_string())
        }
    }
}
