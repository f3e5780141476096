// SPDX-FileCopyrightText: 2026 Multicast Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Error types for the multicast app delegate.

use thiserror::Error;

/// Error a delegate may return from any lifecycle callback.
///
/// Returned errors never reach the host: the broadcaster logs them at the
/// delegate's call site and keeps dispatching to the remaining delegates.
#[derive(Debug, Error)]
pub enum DelegateError {
    /// The delegate tried to handle the callback and failed.
    #[error("{message}")]
    Failed {
        message: String,
        source: Option<Box<dyn std::error::Error + Send + Sync>>,
    },

    /// The delegate is no longer able to serve callbacks (torn down, closed).
    #[error("delegate unavailable: {0}")]
    Unavailable(String),

    /// The delegate panicked while handling the callback.
    #[error("delegate panicked: {0}")]
    Panicked(String),
}

impl DelegateError {
    /// Shorthand for a [`DelegateError::Failed`] without an underlying source.
    pub fn failed(message: impl Into<String>) -> Self {
        Self::Failed {
            message: message.into(),
            source: None,
        }
    }
}

/// Errors raised by the multicast layer itself (never by dispatch).
#[derive(Debug, Error)]
pub enum MulticastError {
    /// A selector string did not match any callback in the policy table.
    #[error("unknown callback selector `{0}`")]
    UnknownSelector(String),

    /// A scenario or other input could not be parsed.
    #[error("invalid input: {0}")]
    InvalidInput(String),

    /// I/O failure while reading input files.
    #[error("i/o error: {source}")]
    Io {
        #[from]
        source: std::io::Error,
    },

    /// Internal or unexpected errors.
    #[error("internal error: {0}")]
    Internal(String),
}
