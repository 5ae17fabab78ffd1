//! Crate-wide error hierarchy for tableau-client.

use thiserror::Error;

/// Convenient alias for crate-wide results.
pub type TableauResult<T> = Result<T, TableauError>;

/// Root error type for the tableau-client crate.
#[derive(Debug, Error)]
pub enum TableauError {
    /// Upstream call failed (status, timeout, network).
    #[error(transparent)]
    Provider(#[from] TableauProviderError),

    /// Upstream answered 2xx but the body was not what we expected.
    #[error(transparent)]
    Parse(#[from] TableauParseError),

    /// Configuration problems (base URL, timeouts).
    #[error(transparent)]
    Config(#[from] TableauConfigError),
}

/// Failures of the HTTP exchange itself.
#[derive(Debug, Error)]
pub enum TableauProviderError {
    /// Unauthorized (HTTP 401): bad credentials or expired token.
    #[error("tableau rejected the credentials or token")]
    Unauthorized,

    /// Forbidden (HTTP 403).
    #[error("tableau denied access to this resource")]
    Forbidden,

    /// Not found (HTTP 404).
    #[error("tableau resource not found")]
    NotFound,

    /// Gateway / server error (HTTP 5xx).
    #[error("tableau server error: status {0}")]
    Server(u16),

    /// Other HTTP status (non-2xx) not covered by specific variants.
    #[error("tableau http status error: status {0}")]
    HttpStatus(u16),

    /// Timeout at transport level.
    #[error("tableau request timed out")]
    Timeout,

    /// Network/transport failure without HTTP status (DNS/connect/reset).
    #[error("tableau network error: {0}")]
    Network(String),
}

/// Malformed or incomplete upstream payloads.
#[derive(Debug, Error)]
pub enum TableauParseError {
    /// XML could not be tokenized.
    #[error("invalid XML from tableau: {0}")]
    Xml(String),

    /// Expected element is absent.
    #[error("tableau response is missing <{0}>")]
    MissingElement(&'static str),

    /// Expected attribute is absent or empty.
    #[error("tableau response <{element}> is missing `{attribute}`")]
    MissingAttribute {
        element: &'static str,
        attribute: &'static str,
    },

    /// View data was not valid CSV.
    #[error("invalid CSV view data: {0}")]
    Csv(#[from] csv::Error),
}

/// Configuration and setup errors.
#[derive(Debug, Error)]
pub enum TableauConfigError {
    /// Server URL empty or not http(s).
    #[error("invalid tableau server url: {0}")]
    InvalidBaseUrl(String),

    /// A numeric setting failed to parse.
    #[error("invalid number in {var}: {reason}")]
    InvalidNumber {
        var: &'static str,
        reason: &'static str,
    },
}

// ===== Conversions for `?` ergonomics at the crate root =====

impl From<reqwest::Error> for TableauError {
    fn from(e: reqwest::Error) -> Self {
        TableauError::Provider(TableauProviderError::from(e))
    }
}

impl From<csv::Error> for TableauError {
    fn from(e: csv::Error) -> Self {
        TableauError::Parse(TableauParseError::Csv(e))
    }
}

// ===== Mapping from reqwest::Error into TableauProviderError =====

impl From<reqwest::Error> for TableauProviderError {
    fn from(e: reqwest::Error) -> Self {
        if e.is_timeout() {
            return TableauProviderError::Timeout;
        }

        if let Some(status) = e.status() {
            let code = status.as_u16();
            return match code {
                401 => TableauProviderError::Unauthorized,
                403 => TableauProviderError::Forbidden,
                404 => TableauProviderError::NotFound,
                500..=599 => TableauProviderError::Server(code),
                _ => TableauProviderError::HttpStatus(code),
            };
        }

        TableauProviderError::Network(e.to_string())
    }
}
