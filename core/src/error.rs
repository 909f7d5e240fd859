// Licensed to the Apache Software Foundation (ASF) under one
// or more contributor license agreements.  See the NOTICE file
// distributed with this work for additional information
// regarding copyright ownership.  The ASF licenses this file
// to you under the Apache License, Version 2.0 (the
// "License"); you may not use this file except in compliance
// with the License.  You may obtain a copy of the License at
//
//   http://www.apache.org/licenses/LICENSE-2.0
//
// Unless required by applicable law or agreed to in writing,
// software distributed under the License is distributed on an
// "AS IS" BASIS, WITHOUT WARRANTIES OR CONDITIONS OF ANY
// KIND, either express or implied.  See the License for the
// specific language governing permissions and limitations
// under the License.

use std::fmt;
use thiserror::Error;

/// The error type for resource broker operations
#[derive(Error, Debug)]
#[error("{message}")]
pub struct Error {
    kind: ErrorKind,
    message: String,
    #[source]
    source: Option<anyhow::Error>,
}

/// The kind of error that occurred
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    /// Resource type is neither `blob` nor `table`
    ResourceTypeUnsupported,

    /// Resource name is missing or blank
    NameMissing,

    /// Blob container is missing or blank
    ContainerMissing,

    /// Permission string is not one of the accepted tokens
    PermissionsInvalid,

    /// Expiration can't be parsed as a date/time
    ExpirationInvalid,

    /// Permission set can't be expressed for the resource type
    PermissionCombinationUnsupported,

    /// Target container or table does not exist
    ResourceNotFound,

    /// The signer failed to produce a signature
    SigningFailed,

    /// Configuration error (missing fields, invalid values)
    ConfigInvalid,

    /// Unexpected errors (network, I/O, service errors, etc.)
    Unexpected,
}

impl Error {
    /// Create a new error with the given kind and message
    pub fn new(kind: ErrorKind, message: impl Into<String>) -> Self {
        Self {
            kind,
            message: message.into(),
            source: None,
        }
    }

    /// Add a source error
    pub fn with_source(mut self, source: impl Into<anyhow::Error>) -> Self {
        self.source = Some(source.into());
        self
    }

    /// Get the error kind
    pub fn kind(&self) -> ErrorKind {
        self.kind
    }

    /// Check if this error comes from validating the client input.
    pub fn is_validation_error(&self) -> bool {
        matches!(
            self.kind,
            ErrorKind::ResourceTypeUnsupported
                | ErrorKind::NameMissing
                | ErrorKind::ContainerMissing
                | ErrorKind::PermissionsInvalid
                | ErrorKind::ExpirationInvalid
        )
    }

    /// Check if this error should be reported to the client as a bad request.
    pub fn is_bad_request(&self) -> bool {
        self.is_validation_error() || self.kind == ErrorKind::PermissionCombinationUnsupported
    }
}

// Convenience constructors
impl Error {
    /// Create a resource type unsupported error
    pub fn resource_type_unsupported(message: impl Into<String>) -> Self {
        Self::new(ErrorKind::ResourceTypeUnsupported, message)
    }

    /// Create a name missing error
    pub fn name_missing(message: impl Into<String>) -> Self {
        Self::new(ErrorKind::NameMissing, message)
    }

    /// Create a container missing error
    pub fn container_missing(message: impl Into<String>) -> Self {
        Self::new(ErrorKind::ContainerMissing, message)
    }

    /// Create a permissions invalid error
    pub fn permissions_invalid(message: impl Into<String>) -> Self {
        Self::new(ErrorKind::PermissionsInvalid, message)
    }

    /// Create an expiration invalid error
    pub fn expiration_invalid(message: impl Into<String>) -> Self {
        Self::new(ErrorKind::ExpirationInvalid, message)
    }

    /// Create a permission combination unsupported error
    pub fn permission_combination_unsupported(message: impl Into<String>) -> Self {
        Self::new(ErrorKind::PermissionCombinationUnsupported, message)
    }

    /// Create a resource not found error
    pub fn resource_not_found(message: impl Into<String>) -> Self {
        Self::new(ErrorKind::ResourceNotFound, message)
    }

    /// Create a signing failed error
    pub fn signing_failed(message: impl Into<String>) -> Self {
        Self::new(ErrorKind::SigningFailed, message)
    }

    /// Create a config invalid error
    pub fn config_invalid(message: impl Into<String>) -> Self {
        Self::new(ErrorKind::ConfigInvalid, message)
    }

    /// Create an unexpected error
    pub fn unexpected(message: impl Into<String>) -> Self {
        Self::new(ErrorKind::Unexpected, message)
    }
}

impl fmt::Display for ErrorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ErrorKind::ResourceTypeUnsupported => write!(f, "unsupported resource type"),
            ErrorKind::NameMissing => write!(f, "missing name"),
            ErrorKind::ContainerMissing => write!(f, "missing container"),
            ErrorKind::PermissionsInvalid => write!(f, "invalid permissions"),
            ErrorKind::ExpirationInvalid => write!(f, "invalid expiration"),
            ErrorKind::PermissionCombinationUnsupported => {
                write!(f, "unsupported permission combination")
            }
            ErrorKind::ResourceNotFound => write!(f, "resource not found"),
            ErrorKind::SigningFailed => write!(f, "signing failed"),
            ErrorKind::ConfigInvalid => write!(f, "invalid configuration"),
            ErrorKind::Unexpected => write!(f, "unexpected error"),
        }
    }
}

/// Convenience type alias for Results
pub type Result<T> = std::result::Result<T, Error>;

// Common From implementations
impl From<anyhow::Error> for Error {
    fn from(err: anyhow::Error) -> Self {
        Self::unexpected(err.to_string()).with_source(err)
    }
}

impl From<std::fmt::Error> for Error {
    fn from(err: std::fmt::Error) -> Self {
        Self::unexpected(err.to_string()).with_source(anyhow::Error::from(err))
    }
}

impl From<http::Error> for Error {
    fn from(err: http::Error) -> Self {
        Self::unexpected(err.to_string()).with_source(anyhow::Error::from(err))
    }
}

impl From<http::header::InvalidHeaderValue> for Error {
    fn from(err: http::header::InvalidHeaderValue) -> Self {
        Self::unexpected(err.to_string()).with_source(anyhow::Error::from(err))
    }
}

impl From<http::uri::InvalidUri> for Error {
    fn from(err: http::uri::InvalidUri) -> Self {
        Self::unexpected(err.to_string()).with_source(anyhow::Error::from(err))
    }
}

impl From<http::uri::InvalidUriParts> for Error {
    fn from(err: http::uri::InvalidUriParts) -> Self {
        Self::unexpected(err.to_string()).with_source(anyhow::Error::from(err))
    }
}

impl From<http::header::ToStrError> for Error {
    fn from(err: http::header::ToStrError) -> Self {
        Self::unexpected(err.to_string()).with_source(anyhow::Error::from(err))
    }
}
