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

use std::fmt;
use std::io;
use chrono::{DateTime, Utc};
use encoding::{DecoderTrap, Encoding};
use encoding::all::WINDOWS_1252;
use uuid::Uuid;

use crate::case_map::CaseInsensitiveMap;
use crate::error::{Error, Result};
use crate::WarcRecordType;

/// Version line written for new headers.
pub const WARC_VERSION: &str = "WARC/1.0";

/// Version lines accepted when reading.
pub const SUPPORTED_VERSIONS: [&str; 2] = ["WARC/1.0", "WARC/1.1"];

/// Timestamp format of `WARC-Date`.
pub const DATE_FORMAT: &str = "%Y-%m-%dT%H:%M:%SZ";

pub const WARC_TYPE: &str = "WARC-Type";
pub const WARC_RECORD_ID: &str = "WARC-Record-ID";
pub const WARC_DATE: &str = "WARC-Date";
pub const WARC_TARGET_URI: &str = "WARC-Target-URI";
pub const WARC_PAYLOAD_DIGEST: &str = "WARC-Payload-Digest";
pub const CONTENT_LENGTH: &str = "Content-Length";
pub const CONTENT_TYPE: &str = "Content-Type";

/// Decode a header byte string. Values that are not valid UTF-8 are read as Windows-1252.
pub(crate) fn decode(byte_str: &[u8]) -> String {
    match std::str::from_utf8(byte_str) {
        Ok(s) => s.to_string(),
        Err(_) => WINDOWS_1252.decode(byte_str, DecoderTrap::Replace)
            .unwrap_or_else(|_| String::from_utf8_lossy(byte_str).into_owned()),
    }
}

/// WARC record header block.
///
/// Field names are case-insensitive on lookup, but keep the casing and order
/// of their first insertion.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Header {
    version: String,
    fields: CaseInsensitiveMap<String>,
}

impl Default for Header {
    fn default() -> Self {
        Self::new()
    }
}

impl Header {
    /// Create an empty `WARC/1.0` header.
    pub fn new() -> Self {
        Header {
            version: WARC_VERSION.to_string(),
            fields: CaseInsensitiveMap::new(),
        }
    }

    /// Create a header from `(name, value)` pairs.
    pub fn from_fields<I, K, V>(fields: I) -> Self
    where
        I: IntoIterator<Item = (K, V)>,
        K: Into<String>,
        V: Into<String>,
    {
        let mut header = Header::new();
        header.fields.extend(fields.into_iter().map(|(k, v)| (k, v.into())));
        header
    }

    /// Create a header from `(name, value)` pairs and fill in missing mandatory fields.
    ///
    /// See [`Header::fill_defaults`].
    pub fn with_defaults<I, K, V>(fields: I) -> Result<Self>
    where
        I: IntoIterator<Item = (K, V)>,
        K: Into<String>,
        V: Into<String>,
    {
        let mut header = Header::from_fields(fields);
        header.fill_defaults()?;
        Ok(header)
    }

    /// Fill in missing `WARC-Record-ID`, `WARC-Date` and `Content-Type` fields.
    ///
    /// A random URN is generated as record ID, the date is set to the current time and
    /// the content type is derived from `WARC-Type`, which must be set already.
    pub fn fill_defaults(&mut self) -> Result<()> {
        let record_type = self.warc_type().ok_or(Error::MissingField(WARC_TYPE))?;

        if !self.contains_key(WARC_RECORD_ID) {
            self.set(WARC_RECORD_ID, format!("<urn:uuid:{}>", Uuid::new_v4()));
        }
        if !self.contains_key(WARC_DATE) {
            self.set(WARC_DATE, Utc::now().format(DATE_FORMAT).to_string());
        }
        if !self.contains_key(CONTENT_TYPE) {
            self.set(CONTENT_TYPE, record_type.default_content_type());
        }
        Ok(())
    }

    /// Check that all mandatory fields are present and `Content-Length` is valid.
    pub fn validate(&self) -> Result<()> {
        for key in [WARC_TYPE, WARC_RECORD_ID, WARC_DATE, CONTENT_TYPE] {
            if !self.contains_key(key) {
                return Err(Error::MissingField(key));
            }
        }
        self.content_length().map(|_| ())
    }

    /// Version line (e.g. `WARC/1.0`).
    pub fn version(&self) -> &str {
        &self.version
    }

    /// Set version line.
    pub fn set_version(&mut self, version: impl Into<String>) {
        self.version = version.into();
    }

    /// Get value for (case-insensitive) field name.
    pub fn get(&self, key: &str) -> Option<&str> {
        self.fields.get(key).map(String::as_str)
    }

    /// Set a field. An existing field keeps its position and original casing.
    pub fn set(&mut self, key: impl Into<String>, value: impl Into<String>) {
        self.fields.insert(key, value.into());
    }

    /// Remove a field and return its value.
    pub fn remove(&mut self, key: &str) -> Option<String> {
        self.fields.remove(key)
    }

    /// Check if a (case-insensitive) field exists.
    pub fn contains_key(&self, key: &str) -> bool {
        self.fields.contains_key(key)
    }

    /// Number of fields.
    pub fn len(&self) -> usize {
        self.fields.len()
    }

    /// Check if the header has no fields.
    pub fn is_empty(&self) -> bool {
        self.fields.is_empty()
    }

    /// Iterator of field names and values in insertion order.
    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> + '_ {
        self.fields.iter().map(|(k, v)| (k, v.as_str()))
    }

    /// Underlying field map.
    pub fn fields(&self) -> &CaseInsensitiveMap<String> {
        &self.fields
    }

    /// `WARC-Type` value.
    pub fn record_type(&self) -> Option<&str> {
        self.get(WARC_TYPE)
    }

    /// `WARC-Type` as enum value (`None` if unset).
    pub fn warc_type(&self) -> Option<WarcRecordType> {
        self.record_type().map(WarcRecordType::from_field)
    }

    /// `WARC-Record-ID` value.
    pub fn record_id(&self) -> Option<&str> {
        self.get(WARC_RECORD_ID)
    }

    /// `WARC-Date` value.
    pub fn date(&self) -> Option<&str> {
        self.get(WARC_DATE)
    }

    /// `WARC-Date` parsed as UTC timestamp.
    pub fn date_time(&self) -> Option<DateTime<Utc>> {
        DateTime::parse_from_rfc3339(self.date()?)
            .ok()
            .map(|d| d.with_timezone(&Utc))
    }

    /// `WARC-Target-URI` value.
    pub fn target_uri(&self) -> Option<&str> {
        self.get(WARC_TARGET_URI)
    }

    /// `Content-Type` value.
    pub fn content_type(&self) -> Option<&str> {
        self.get(CONTENT_TYPE)
    }

    /// `Content-Length` value in bytes.
    pub fn content_length(&self) -> Result<u64> {
        let value = self.get(CONTENT_LENGTH).ok_or(Error::MissingField(CONTENT_LENGTH))?;
        value.trim()
            .parse::<u64>()
            .map_err(|_| Error::InvalidContentLength(value.to_string()))
    }

    /// Set `Content-Length`.
    pub fn set_content_length(&mut self, content_length: u64) {
        self.set(CONTENT_LENGTH, content_length.to_string());
    }

    /// Add a raw `Name: value` line as read from a stream (without line terminator).
    ///
    /// Lines starting with whitespace continue the value of the previous field.
    /// Repeated field names are joined into one comma-separated value.
    ///
    /// # Arguments
    ///
    /// * `line` - Header line
    /// * `last_key` - Name of the previously added field, updated by this call
    pub(crate) fn push_line(&mut self, line: &[u8], last_key: &mut Option<String>) -> Result<()> {
        let line = decode(line);
        if line.starts_with([' ', '\t']) {
            let value = line.trim();
            return match last_key.as_deref().and_then(|k| self.fields.get_mut(k)) {
                Some(v) => {
                    v.push(' ');
                    v.push_str(value);
                    Ok(())
                }
                None => Err(Error::BadHeaderLine(line)),
            };
        }

        let Some((name, value)) = line.split_once(':') else {
            return Err(Error::BadHeaderLine(line));
        };
        let name = name.trim();
        if name.is_empty() || !name.bytes().all(|b| b.is_ascii_graphic()) {
            return Err(Error::BadHeaderLine(line));
        }
        let value = value.trim();
        match self.fields.get_mut(name) {
            Some(v) => {
                v.push(',');
                v.push_str(value);
            }
            None => self.set(name, value),
        }
        *last_key = Some(name.to_string());
        Ok(())
    }

    /// Write header block including the terminating blank line into stream.
    pub fn write<W: io::Write>(&self, writer: &mut W) -> io::Result<usize> {
        let mut bytes_written = 0usize;
        writer.write_all(self.version.as_bytes())?;
        writer.write_all(b"\r\n")?;
        bytes_written += self.version.len() + 2;
        for (key, value) in self.iter() {
            writer.write_all(key.as_bytes())?;
            writer.write_all(b": ")?;
            writer.write_all(value.as_bytes())?;
            writer.write_all(b"\r\n")?;
            bytes_written += key.len() + value.len() + 4;
        }
        writer.write_all(b"\r\n")?;
        Ok(bytes_written + 2)
    }

    /// Serialized header block.
    pub fn to_bytes(&self) -> Vec<u8> {
        self.to_string().into_bytes()
    }
}

impl fmt::Display for Header {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}\r\n", self.version)?;
        for (key, value) in self.iter() {
            write!(f, "{key}: {value}\r\n")?;
        }
        f.write_str("\r\n")
    }
}
