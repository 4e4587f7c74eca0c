//! Unified error types for the relay.
//!
//! Tool failures never appear here: primitives report them as
//! [`ToolResult::Failure`](crate::types::ToolResult) values so the model can
//! narrate them back to the user.

use std::fmt;

// ---------------------------------------------------------------------------
// ConfigError
// ---------------------------------------------------------------------------

/// Errors when loading or parsing configuration.
#[derive(Debug)]
pub enum ConfigError {
    Io(std::io::Error),
    Toml(toml::de::Error),
    Invalid(String),
}

impl fmt::Display for ConfigError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Io(e) => write!(f, "io: {e}"),
            Self::Toml(e) => write!(f, "toml: {e}"),
            Self::Invalid(msg) => write!(f, "invalid config: {msg}"),
        }
    }
}

impl std::error::Error for ConfigError {}

impl From<std::io::Error> for ConfigError {
    fn from(e: std::io::Error) -> Self {
        Self::Io(e)
    }
}

impl From<toml::de::Error> for ConfigError {
    fn from(e: toml::de::Error) -> Self {
        Self::Toml(e)
    }
}

// ---------------------------------------------------------------------------
// ApiError
// ---------------------------------------------------------------------------

/// Transport-level failures talking to the remote reasoning service.
#[derive(Debug)]
pub enum ApiError {
    /// Network / reqwest-level error.
    Http(reqwest::Error),
    /// Non-2xx status from the API.
    Status { code: u16, body: String },
    /// The service answered with something we could not interpret.
    InvalidResponse(String),
    /// The event stream broke or reported a failure mid-flight.
    Stream(String),
}

impl ApiError {
    pub fn status(code: u16, body: String) -> Self {
        Self::Status { code, body }
    }

    /// HTTP status code when the failure came from a non-2xx response.
    pub fn status_code(&self) -> Option<u16> {
        match self {
            Self::Status { code, .. } => Some(*code),
            _ => None,
        }
    }
}

impl fmt::Display for ApiError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Http(e) => write!(f, "http: {e}"),
            Self::Status { code, body } => write!(f, "status {code}: {body}"),
            Self::InvalidResponse(msg) => write!(f, "invalid response: {msg}"),
            Self::Stream(msg) => write!(f, "stream: {msg}"),
        }
    }
}

impl std::error::Error for ApiError {}

impl From<reqwest::Error> for ApiError {
    fn from(e: reqwest::Error) -> Self {
        Self::Http(e)
    }
}

// ---------------------------------------------------------------------------
// ValidationError
// ---------------------------------------------------------------------------

/// A caller request was malformed or missed a required field.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ValidationError(pub String);

impl ValidationError {
    pub fn new(msg: impl Into<String>) -> Self {
        Self(msg.into())
    }
}

impl fmt::Display for ValidationError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl std::error::Error for ValidationError {}

// ---------------------------------------------------------------------------
// ChatError
// ---------------------------------------------------------------------------

/// Top-level error type for one conversation turn.
#[derive(Debug)]
pub enum ChatError {
    Validation(ValidationError),
    Api(ApiError),
    /// The caller aborted the request. Not a failure to report.
    Cancelled,
}

impl ChatError {
    pub fn is_cancelled(&self) -> bool {
        matches!(self, Self::Cancelled)
    }
}

impl fmt::Display for ChatError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Validation(e) => write!(f, "{e}"),
            Self::Api(e) => write!(f, "{e}"),
            Self::Cancelled => write!(f, "request cancelled"),
        }
    }
}

impl std::error::Error for ChatError {}

impl From<ValidationError> for ChatError {
    fn from(e: ValidationError) -> Self {
        Self::Validation(e)
    }
}

impl From<ApiError> for ChatError {
    fn from(e: ApiError) -> Self {
        Self::Api(e)
    }
}
