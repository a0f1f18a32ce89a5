//! Typed error handling for the store feed
//!
//! Errors are split by category so callers can react to a failed page fetch
//! differently from a broken configuration.
//!
//! # Error Categories
//!
//! - [`FetchError`]: a page request failed (transport or body decoding)
//! - [`ConfigError`]: configuration could not be loaded or is inconsistent
//! - [`ListingError`]: umbrella type returned by session-level operations
//!
//! # Example
//!
//! ```rust,ignore
//! match fetcher.fetch(&query, 2).await {
//!     Ok(page) => println!("{} stores", page.stores.len()),
//!     Err(FetchError::Transport { status: Some(503), .. }) => println!("backend busy"),
//!     Err(e) => eprintln!("{} ({})", e, e.error_code()),
//! }
//! ```

use thiserror::Error;

// =============================================================================
// Fetch Errors
// =============================================================================

/// A page request failed
///
/// Both variants surface to the user as a single message; the variant only
/// matters for logging and for callers that want to distinguish them.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum FetchError {
    /// Non-success response or network failure
    #[error("Failed to fetch stores: {message}")]
    Transport {
        /// HTTP status when the server answered at all
        status: Option<u16>,
        message: String,
    },

    /// The body could not be parsed as a list of stores
    #[error("Failed to read stores: {message}")]
    Decode { message: String },
}

impl FetchError {
    /// Build a transport error for a non-success HTTP status
    pub fn status(status: u16, message: impl Into<String>) -> Self {
        FetchError::Transport {
            status: Some(status),
            message: message.into(),
        }
    }

    /// Build a transport error for a failure below HTTP (DNS, connect, timeout)
    pub fn network(message: impl Into<String>) -> Self {
        FetchError::Transport {
            status: None,
            message: message.into(),
        }
    }

    /// Build a decode error
    pub fn decode(message: impl Into<String>) -> Self {
        FetchError::Decode {
            message: message.into(),
        }
    }

    /// Human-readable message shown in place of the list
    pub fn message(&self) -> String {
        self.to_string()
    }

    pub fn error_code(&self) -> &'static str {
        match self {
            FetchError::Transport { .. } => "TRANSPORT_ERROR",
            FetchError::Decode { .. } => "DECODE_ERROR",
        }
    }

    /// Whether the server answered with a status code
    pub fn http_status(&self) -> Option<u16> {
        match self {
            FetchError::Transport { status, .. } => *status,
            FetchError::Decode { .. } => None,
        }
    }
}

impl From<reqwest::Error> for FetchError {
    fn from(err: reqwest::Error) -> Self {
        if err.is_decode() {
            FetchError::decode(err.to_string())
        } else if let Some(status) = err.status() {
            FetchError::status(status.as_u16(), err.to_string())
        } else {
            FetchError::network(err.to_string())
        }
    }
}

impl From<serde_json::Error> for FetchError {
    fn from(err: serde_json::Error) -> Self {
        FetchError::decode(err.to_string())
    }
}

// =============================================================================
// Config Errors
// =============================================================================

/// Errors related to configuration
#[derive(Debug, Error)]
pub enum ConfigError {
    /// Failed to parse configuration
    #[error("Failed to parse config{}: {message}", file_suffix(.file))]
    ParseError {
        file: Option<String>,
        message: String,
    },

    /// Invalid value in configuration
    #[error("Invalid value '{value}' for field '{field}': {message}")]
    InvalidValue {
        field: String,
        value: String,
        message: String,
    },

    /// IO error while reading configuration
    #[error("IO error reading '{path}': {message}")]
    IoError { path: String, message: String },
}

fn file_suffix(file: &Option<String>) -> String {
    match file {
        Some(file) => format!(" file '{}'", file),
        None => String::new(),
    }
}

impl ConfigError {
    pub fn error_code(&self) -> &'static str {
        match self {
            ConfigError::ParseError { .. } => "CONFIG_PARSE_ERROR",
            ConfigError::InvalidValue { .. } => "CONFIG_INVALID_VALUE",
            ConfigError::IoError { .. } => "CONFIG_IO_ERROR",
        }
    }
}

impl From<serde_yaml::Error> for ConfigError {
    fn from(err: serde_yaml::Error) -> Self {
        ConfigError::ParseError {
            file: None,
            message: err.to_string(),
        }
    }
}

// =============================================================================
// Listing Errors
// =============================================================================

/// Top-level error for session operations
#[derive(Debug, Error)]
pub enum ListingError {
    #[error(transparent)]
    Fetch(#[from] FetchError),

    #[error(transparent)]
    Config(#[from] ConfigError),

    /// The session task has stopped and no longer accepts commands
    #[error("Listing session is closed")]
    SessionClosed,
}

impl ListingError {
    pub fn error_code(&self) -> &'static str {
        match self {
            ListingError::Fetch(e) => e.error_code(),
            ListingError::Config(e) => e.error_code(),
            ListingError::SessionClosed => "SESSION_CLOSED",
        }
    }
}
