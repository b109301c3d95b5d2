use shared::error::ApiError;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum ConnectorError {
    #[error("invalid input: {0}")]
    Validation(String),
    #[error("invalid server url: {0}")]
    InvalidUrl(#[from] url::ParseError),
    #[error("transport error: {0}")]
    Transport(#[from] reqwest::Error),
    #[error("backend rejected {operation} (http {status}): {error}")]
    Backend {
        operation: String,
        status: u16,
        error: ApiError,
    },
    #[error("unexpected response for {operation}: {message}")]
    Decode { operation: String, message: String },
}

impl From<ApiError> for ConnectorError {
    fn from(value: ApiError) -> Self {
        ConnectorError::Validation(value.message)
    }
}

#[derive(Debug, Clone, Error)]
pub enum GenerativeError {
    #[error("missing api key: set GENERATIVE_API_KEY")]
    MissingApiKey,
    #[error("network error: {0}")]
    Transport(String),
    #[error("timeout")]
    Timeout,
    #[error("invalid api key")]
    InvalidApiKey,
    #[error("rate limited")]
    RateLimited,
    #[error("http {status}: {body}")]
    Http { status: u16, body: String },
    #[error("json error: {0}")]
    Serde(String),
    #[error("response contained no text or audio")]
    EmptyResponse,
}
