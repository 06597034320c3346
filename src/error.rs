use thiserror::Error;

#[derive(Error, Debug)]
pub enum AppError {
    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    #[error("Client error: {0}")]
    Client(#[from] ClientError),

    #[error("Schema error: {0}")]
    Schema(#[from] SchemaError),

    #[error("Extraction error: {0}")]
    Extract(#[from] ExtractError),

    #[error("Invalid request: {0}")]
    InvalidRequest(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Serialization error: {0}")]
    Serde(#[from] serde_json::Error),
}

#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("Failed to read config file: {0}")]
    FileRead(#[from] std::io::Error),

    #[error("Failed to parse config: {0}")]
    Parse(#[from] toml::de::Error),

    #[error("Missing required configuration: {0}")]
    MissingField(String),

    #[error("Invalid configuration value: {0}")]
    InvalidValue(String),
}

#[derive(Error, Debug)]
pub enum ClientError {
    #[error("Failed to build client: {0}")]
    BuildError(String),

    #[error("Request failed: {0}")]
    RequestFailed(String),

    #[error("Response error {status_code}: {message}")]
    ResponseError { status_code: u16, message: String },

    #[error("Invalid URL: {0}")]
    InvalidUrl(String),
}

impl ClientError {
    /// Whether another attempt at the same URL could succeed.
    pub fn is_retryable(&self) -> bool {
        match self {
            ClientError::RequestFailed(_) => true,
            ClientError::ResponseError { status_code, .. } => {
                *status_code == 429 || *status_code >= 500
            }
            ClientError::BuildError(_) | ClientError::InvalidUrl(_) => false,
        }
    }
}

/// Rejections raised while turning caller input into an `ExtractionSchema`.
#[derive(Error, Debug, PartialEq, Eq)]
pub enum SchemaError {
    #[error("schema must declare a fields mapping")]
    MissingFields,

    #[error("field names must not be empty")]
    EmptyFieldName,

    #[error("field '{0}' has an empty selector")]
    EmptySelector(String),

    #[error("field '{0}' has an empty attr")]
    EmptyAttribute(String),

    #[error("list selector must not be empty")]
    EmptyListSelector,
}

#[derive(Error, Debug, Clone, PartialEq, Eq)]
#[error("invalid selector '{selector}': {message}")]
pub struct SelectorError {
    pub selector: String,
    pub message: String,
}

#[derive(Error, Debug, PartialEq, Eq)]
pub enum ExtractError {
    #[error("field '{field}': {source}")]
    InvalidSelector {
        field: String,
        #[source]
        source: SelectorError,
    },

    #[error("list selector: {0}")]
    InvalidListSelector(#[source] SelectorError),
}

pub type Result<T> = std::result::Result<T, AppError>;
