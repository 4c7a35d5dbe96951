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
use std::io;
use thiserror::Error;

/// The error type for streamsign operations
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
    /// An argument is out of range or malformed: a zero chunk size, an
    /// empty credential, an invalid extension name, an unparsable URI.
    InvalidArgument,

    /// Header-mode signing without an `x-amz-content-sha256` header.
    MissingPayloadHash,

    /// The payload source failed while it was being read.
    SourceRead,

    /// The encoder was driven into a state it can't continue from.
    EncodingInvariant,

    /// A hash or HMAC primitive refused its input.
    CryptoBackend,
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

    /// Check if this error is fatal for the stream or signer that raised it.
    ///
    /// Argument errors can be fixed by the caller and retried, everything
    /// else leaves the producing object unusable.
    pub fn is_fatal(&self) -> bool {
        !matches!(
            self.kind,
            ErrorKind::InvalidArgument | ErrorKind::MissingPayloadHash
        )
    }
}

// Convenience constructors
impl Error {
    /// Create an invalid argument error
    pub fn invalid_argument(message: impl Into<String>) -> Self {
        Self::new(ErrorKind::InvalidArgument, message)
    }

    /// Create a missing payload hash error
    pub fn missing_payload_hash(message: impl Into<String>) -> Self {
        Self::new(ErrorKind::MissingPayloadHash, message)
    }

    /// Create a source read error
    pub fn source_read(message: impl Into<String>) -> Self {
        Self::new(ErrorKind::SourceRead, message)
    }

    /// Create an encoding invariant error
    pub fn encoding_invariant(message: impl Into<String>) -> Self {
        Self::new(ErrorKind::EncodingInvariant, message)
    }

    /// Create a crypto backend error
    pub fn crypto_backend(message: impl Into<String>) -> Self {
        Self::new(ErrorKind::CryptoBackend, message)
    }
}

impl fmt::Display for ErrorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ErrorKind::InvalidArgument => write!(f, "invalid argument"),
            ErrorKind::MissingPayloadHash => write!(f, "missing payload hash"),
            ErrorKind::SourceRead => write!(f, "source read failed"),
            ErrorKind::EncodingInvariant => write!(f, "encoding invariant violated"),
            ErrorKind::CryptoBackend => write!(f, "crypto backend failed"),
        }
    }
}

/// Convenience type alias for Results
pub type Result<T> = std::result::Result<T, Error>;

// Common From implementations
impl From<http::Error> for Error {
    fn from(err: http::Error) -> Self {
        Self::invalid_argument(err.to_string()).with_source(anyhow::Error::from(err))
    }
}

impl From<http::header::InvalidHeaderValue> for Error {
    fn from(err: http::header::InvalidHeaderValue) -> Self {
        Self::invalid_argument(err.to_string()).with_source(anyhow::Error::from(err))
    }
}

impl From<http::header::InvalidHeaderName> for Error {
    fn from(err: http::header::InvalidHeaderName) -> Self {
        Self::invalid_argument(err.to_string()).with_source(anyhow::Error::from(err))
    }
}

impl From<http::header::ToStrError> for Error {
    fn from(err: http::header::ToStrError) -> Self {
        Self::invalid_argument(err.to_string()).with_source(anyhow::Error::from(err))
    }
}

impl From<http::uri::InvalidUri> for Error {
    fn from(err: http::uri::InvalidUri) -> Self {
        Self::invalid_argument(err.to_string()).with_source(anyhow::Error::from(err))
    }
}

impl From<http::uri::InvalidUriParts> for Error {
    fn from(err: http::uri::InvalidUriParts) -> Self {
        Self::invalid_argument(err.to_string()).with_source(anyhow::Error::from(err))
    }
}

impl From<std::fmt::Error> for Error {
    fn from(err: std::fmt::Error) -> Self {
        Self::encoding_invariant(err.to_string()).with_source(anyhow::Error::from(err))
    }
}

impl From<std::str::Utf8Error> for Error {
    fn from(err: std::str::Utf8Error) -> Self {
        Self::invalid_argument(err.to_string()).with_source(anyhow::Error::from(err))
    }
}

impl From<io::Error> for Error {
    fn from(err: io::Error) -> Self {
        Self::source_read(err.to_string()).with_source(anyhow::Error::from(err))
    }
}

impl From<Error> for io::Error {
    fn from(err: Error) -> Self {
        io::Error::other(err)
    }
}
