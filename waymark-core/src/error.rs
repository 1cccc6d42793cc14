// Error types for the waymark router

use crate::HttpStatus;
use serde::Serialize;
use std::fmt;
use thiserror::Error;

/// Outcome of a route creation attempt.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
pub enum CreationError {
    NoError,
    /// One or more DSL segments failed to parse
    PathPartError,
    /// Path does not start with `/`
    RootMissing,
    /// Path or pattern ends with `/`
    SlashTerminator,
    /// The compiled (or supplied) pattern is not a valid regular expression
    InvalidRegexProduced,
}

impl CreationError {
    pub fn as_str(&self) -> &'static str {
        match self {
            CreationError::NoError => "NO_ERROR",
            CreationError::PathPartError => "PATH_PART_ERROR",
            CreationError::RootMissing => "ROOT_MISSING",
            CreationError::SlashTerminator => "SLASH_TERMINATOR",
            CreationError::InvalidRegexProduced => "INVALID_REGEX_PRODUCED",
        }
    }
}

impl fmt::Display for CreationError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A failed route creation: the error kind plus a human readable message.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
#[error("{kind}: {message}")]
pub struct RouteError {
    kind: CreationError,
    message: String,
}

impl RouteError {
    pub fn new(kind: CreationError, message: impl Into<String>) -> Self {
        Self {
            kind,
            message: message.into(),
        }
    }

    pub fn kind(&self) -> CreationError {
        self.kind
    }

    pub fn message(&self) -> &str {
        &self.message
    }
}

#[derive(Error, Debug)]
pub enum Error {
    #[error("Route error: {0}")]
    Route(#[from] RouteError),

    #[error("Handler error: {0}")]
    Handler(String),

    #[error("Bad Request: {0}")]
    BadRequest(String),

    #[error("Not Found: {0}")]
    NotFound(String),

    #[error("Internal server error: {0}")]
    Internal(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Logging initialization failed: {0}")]
    Logging(String),
}

impl Error {
    /// Get the HTTP status code for this error
    pub fn status_code(&self) -> u16 {
        match self {
            Error::BadRequest(_) => HttpStatus::BadRequest.code(),
            Error::NotFound(_) => HttpStatus::NotFound.code(),
            Error::Route(_)
            | Error::Handler(_)
            | Error::Internal(_)
            | Error::Io(_)
            | Error::Logging(_) => HttpStatus::InternalServerError.code(),
        }
    }
}
