// src/error.rs

//! Unified error handling for broadcast resolution.

use std::fmt;

use thiserror::Error;

/// Result type alias for resolver operations.
pub type Result<T> = std::result::Result<T, Error>;

/// Unified application error type.
#[derive(Error, Debug)]
pub enum Error {
    /// Target date/title absent after exhausting all available pages/stations
    #[error("not found: {target} ({scope})")]
    NotFound { target: String, scope: String },

    /// More than one match where exactly one was required
    #[error("ambiguous: {count} matches for {target} ({scope})")]
    Ambiguous {
        target: String,
        scope: String,
        count: usize,
    },

    /// Upstream explicitly signals the selection cannot be served
    #[error("media selection unavailable for {pid}")]
    Unavailable { pid: String },

    /// The media-selector descriptor had no usable delivery connection
    #[error("no dash/https delivery option for {pid}")]
    NoDeliveryOption { pid: String },

    /// A required field, namespace, or numeric value could not be parsed
    #[error("malformed upstream data from {context}: {message}")]
    MalformedUpstream { context: String, message: String },

    /// Retryable transport-level failure (resets, remote-closed connections)
    #[error("transient transport error: {0}")]
    TransientTransport(String),

    /// Non-success HTTP status
    #[error("HTTP status {status} for {url}")]
    Status { status: u16, url: String },

    /// A resolution-chain hop failed; carries which hop and which identifier
    #[error("resolution hop '{hop}' failed for {pid}: {source}")]
    Hop {
        hop: &'static str,
        pid: String,
        #[source]
        source: Box<Error>,
    },

    /// Invalid caller input
    #[error("configuration error: {0}")]
    Config(String),

    /// HTTP request failed
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    /// JSON serialization/deserialization failed
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// XML reading failed
    #[error("XML error: {0}")]
    Xml(#[from] quick_xml::Error),

    /// URL parsing failed
    #[error("URL parse error: {0}")]
    Url(#[from] url::ParseError),

    /// Catalogue store operation failed
    #[error("store error: {0}")]
    Store(#[from] sqlx::Error),

    /// TOML parsing failed
    #[error("TOML parse error: {0}")]
    Toml(#[from] toml::de::Error),

    /// I/O operation failed
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Blocking parse task failed to join
    #[error("worker task error: {0}")]
    Join(#[from] tokio::task::JoinError),
}

impl Error {
    /// Create a not-found error.
    pub fn not_found(target: impl Into<String>, scope: impl Into<String>) -> Self {
        Self::NotFound {
            target: target.into(),
            scope: scope.into(),
        }
    }

    /// Create an ambiguous-match error.
    pub fn ambiguous(target: impl Into<String>, scope: impl Into<String>, count: usize) -> Self {
        Self::Ambiguous {
            target: target.into(),
            scope: scope.into(),
            count,
        }
    }

    /// Create a malformed-upstream-data error.
    pub fn malformed(context: impl Into<String>, message: impl fmt::Display) -> Self {
        Self::MalformedUpstream {
            context: context.into(),
            message: message.to_string(),
        }
    }

    /// Create a configuration error.
    pub fn config(message: impl Into<String>) -> Self {
        Self::Config(message.into())
    }

    /// Wrap a failure with resolution-chain context (hop name + identifier).
    pub fn at_hop(self, hop: &'static str, pid: impl Into<String>) -> Self {
        Self::Hop {
            hop,
            pid: pid.into(),
            source: Box::new(self),
        }
    }

    /// Whether this failure belongs to the retryable transport class.
    ///
    /// Only this class triggers whole-batch retry; hop wrappers are
    /// transparent to the check.
    pub fn is_transient(&self) -> bool {
        match self {
            Self::TransientTransport(_) => true,
            Self::Hop { source, .. } => source.is_transient(),
            _ => false,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_hop_wrapping_preserves_transience() {
        let err =
            Error::TransientTransport("connection reset".into()).at_hop("playlist", "b006qykl");
        assert!(err.is_transient());
        assert!(err.to_string().contains("playlist"));
        assert!(err.to_string().contains("b006qykl"));
    }

    #[test]
    fn test_non_transient_classes() {
        assert!(!Error::not_found("x", "y").is_transient());
        assert!(
            !Error::Status {
                status: 404,
                url: "https://example.com".into()
            }
            .is_transient()
        );
    }
}
