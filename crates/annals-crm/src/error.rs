use annals_core::CoreError;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum CrmError {
    #[cfg(feature = "rest")]
    #[error("http error: {0}")]
    Http(#[from] reqwest::Error),
    #[cfg(feature = "rest")]
    #[error("invalid url: {0}")]
    Url(#[from] url::ParseError),
    #[error("json error: {0}")]
    Json(#[from] serde_json::Error),
    #[error("crm api error {status}: {message}")]
    Api { status: u16, message: String },
    #[error("unexpected crm response: {0}")]
    UnexpectedResponse(String),
    #[error("missing field {field} in {module} record")]
    MissingField { module: String, field: String },
    #[error("invalid field {field} in {module} record: {value}")]
    InvalidField {
        module: String,
        field: String,
        value: String,
    },
    #[error("missing access token")]
    MissingToken,
    #[error("crm unavailable: {0}")]
    Unavailable(String),
    #[error("core error: {0}")]
    Core(#[from] CoreError),
}

pub type Result<T> = std::result::Result<T, CrmError>;
