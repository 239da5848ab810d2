// Copyright 2025 Janek Bevendorff
//
// Licensed under the Apache License, Version 2.0 (the "License");
// you may not use this file except in compliance with the License.
// You may obtain a copy of the License at
//
//     http://www.apache.org/licenses/LICENSE-2.0
//
// Unless required by applicable law or agreed to in writing, software
// distributed under the License is distributed on an "AS IS" BASIS,
// WITHOUT WARRANTIES OR CONDITIONS OF ANY KIND, either express or implied.
// See the License for the specific language governing permissions and
// limitations under the License.

//! Error types for WARC reading and writing.

use thiserror::Error;

/// Error type for WARC operations.
#[derive(Error, Debug)]
pub enum Error {
    /// IO or compression error of the underlying stream
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// Header block ended before its terminating blank line
    #[error("malformed header: stream ended before end of header block")]
    MalformedHeader,

    /// First line of a record is not a WARC version line
    #[error("bad version line: {0:?}")]
    BadVersionLine(String),

    /// WARC version is not supported
    #[error("unsupported WARC version: {0}")]
    UnsupportedVersion(String),

    /// Header line is not of the form `name: value`
    #[error("bad header line: {0:?}")]
    BadHeaderLine(String),

    /// Mandatory header field is missing
    #[error("missing mandatory header field: {0}")]
    MissingField(&'static str),

    /// Content-Length is not a non-negative integer
    #[error("invalid Content-Length: {0:?}")]
    InvalidContentLength(String),

    /// Stream ended before the full payload could be read
    #[error("truncated payload: expected {expected} bytes, got {actual}")]
    TruncatedPayload { expected: u64, actual: u64 },

    /// Record is not followed by the two-line record terminator
    #[error("bad record terminator: {0:?}")]
    BadTerminator(String),

    /// Digest algorithm or encoding is not supported
    #[error("unsupported digest: {0}")]
    UnsupportedDigest(String),

    /// Operation is not available in the file's mode
    #[error("operation not supported in {0} mode")]
    WrongMode(&'static str),
}

/// Result type alias for WARC operations.
pub type Result<T> = std::result::Result<T, Error>;
