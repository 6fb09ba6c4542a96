// Copyright 2026, Jeroen van Erp <jeroen@geeko.me>
// SPDX-License-Identifier: Apache-2.0
use kube::error::ErrorResponse;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum ReflectorError {
    #[error("Object not found: {0}")]
    NotFound(String),

    #[error("Object already exists: {0}")]
    AlreadyExists(String),

    #[error("Conflict: {0}")]
    Conflict(String),

    #[error("Transient error: {0}")]
    Transient(String),

    #[error("Fatal error: {0}")]
    Fatal(String),
}

impl ReflectorError {
    /// Whether the dispatch layer should run the pass again later.
    /// Only `Fatal` errors are terminal.
    pub fn is_retryable(&self) -> bool {
        !matches!(self, ReflectorError::Fatal(_))
    }

    pub fn is_not_found(&self) -> bool {
        matches!(self, ReflectorError::NotFound(_))
    }

    pub fn is_conflict(&self) -> bool {
        matches!(self, ReflectorError::Conflict(_))
    }

    /// Create and update races that another pass already won
    pub fn is_benign_create_race(&self) -> bool {
        matches!(
            self,
            ReflectorError::AlreadyExists(_) | ReflectorError::Conflict(_)
        )
    }
}

impl From<kube::Error> for ReflectorError {
    fn from(err: kube::Error) -> Self {
        match err {
            kube::Error::Api(response) => from_error_response(response),
            kube::Error::SerdeError(e) => ReflectorError::Fatal(format!("serialization: {}", e)),
            kube::Error::BuildRequest(e) => ReflectorError::Fatal(format!("bad request: {}", e)),
            other => ReflectorError::Transient(other.to_string()),
        }
    }
}

fn from_error_response(response: ErrorResponse) -> ReflectorError {
    let message = response.message;
    match (response.code, response.reason.as_str()) {
        (404, _) => ReflectorError::NotFound(message),
        (409, "AlreadyExists") => ReflectorError::AlreadyExists(message),
        (409, _) => ReflectorError::Conflict(message),
        (429, _) => ReflectorError::Transient(message),
        (code, _) if code >= 500 => ReflectorError::Transient(message),
        _ => ReflectorError::Fatal(message),
    }
}

pub type Result<T> = std::result::Result<T, ReflectorError>;
