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

//! Reading and writing of WARC web archive containers.
//!
//! A WARC file is a sequence of records, each consisting of a `WARC/1.0` version
//! line, a block of `Name: value` header fields, a blank line, exactly
//! `Content-Length` payload bytes and a `CRLF CRLF` record terminator.
//! Compressed files (`.warc.gz`) store every record as its own gzip member, so
//! any record can be decompressed on its own given its byte offset.
//!
//! ```no_run
//! use warc::{Record, WarcFile};
//!
//! # fn main() -> warc::Result<()> {
//! let mut out = WarcFile::create("out.warc.gz", None)?;
//! let mut record = Record::from_bytes([("WARC-Type", "resource")], b"hello".to_vec())?;
//! out.write_record(&mut record)?;
//! out.close()?;
//!
//! let mut input = WarcFile::open("out.warc.gz")?;
//! while let Some(mut record) = input.read_record()? {
//!     let len = record.read_payload()?.len();
//!     println!("{:?} {}", record.record_type(), len);
//! }
//! # Ok(())
//! # }
//! ```

pub mod case_map;
pub mod digest;
pub mod error;
pub mod file;
pub mod file_part;
pub mod header;
pub mod reader;
pub mod record;
pub mod stream;
pub mod writer;

pub use case_map::CaseInsensitiveMap;
pub use error::{Error, Result};
pub use file::WarcFile;
pub use file_part::FilePart;
pub use header::Header;
pub use reader::{Reader, ReaderConfig};
pub use record::{Payload, Record};
pub use stream::Compression;
pub use writer::{Writer, WriterConfig};


/// WARC record type enum
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum WarcRecordType {
    WarcInfo = 2,
    Response = 4,
    Resource = 8,
    Request = 16,
    Metadata = 32,
    Revisit = 64,
    Conversion = 128,
    Continuation = 256,
    Unknown = 512,
    AnyType = 65535,
    NoType = 0,
}

impl WarcRecordType {
    pub fn as_str(&self) -> &'static str {
        match self {
            WarcRecordType::WarcInfo => "warcinfo",
            WarcRecordType::Response => "response",
            WarcRecordType::Resource => "resource",
            WarcRecordType::Request => "request",
            WarcRecordType::Metadata => "metadata",
            WarcRecordType::Revisit => "revisit",
            WarcRecordType::Conversion => "conversion",
            WarcRecordType::Continuation => "continuation",
            _ => "unknown",
        }
    }

    pub fn matches_bitmask(&self, bitmask: u16) -> bool {
        (*self as u16) & bitmask != 0
    }

    /// Default `Content-Type` for records of this type.
    pub fn default_content_type(&self) -> &'static str {
        match self {
            WarcRecordType::Response => "application/http; msgtype=response",
            WarcRecordType::Request => "application/http; msgtype=request",
            WarcRecordType::WarcInfo => "application/warc-fields",
            _ => "application/octet-stream",
        }
    }

    /// Parse a `WARC-Type` value. Unrecognized types map to `Unknown`.
    pub fn from_field(value: &str) -> Self {
        WarcRecordType::try_from(value).unwrap_or(WarcRecordType::Unknown)
    }
}

impl TryFrom<&str> for WarcRecordType {
    type Error = &'static str;

    fn try_from(value: &str) -> std::result::Result<Self, Self::Error> {
        match value.trim().to_ascii_lowercase().as_str() {
            "warcinfo" => Ok(WarcRecordType::WarcInfo),
            "response" => Ok(WarcRecordType::Response),
            "resource" => Ok(WarcRecordType::Resource),
            "request" => Ok(WarcRecordType::Request),
            "metadata" => Ok(WarcRecordType::Metadata),
            "revisit" => Ok(WarcRecordType::Revisit),
            "conversion" => Ok(WarcRecordType::Conversion),
            "continuation" => Ok(WarcRecordType::Continuation),
            "unknown" => Ok(WarcRecordType::Unknown),
            _ => Err("Invalid enum value."),
        }
    }
}
