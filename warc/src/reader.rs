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

use std::io::{self, Read};

use crate::error::{Error, Result};
use crate::file_part::FilePart;
use crate::header::{self, Header};
use crate::record::{Payload, Record};
use crate::stream::{Compression, Stream};
use crate::WarcRecordType;

/// Reader configuration.
#[derive(Debug, Clone)]
pub struct ReaderConfig {
    /// Enforce `CRLF` line endings, setting this to `false` will allow plain `LF` also
    pub strict_mode: bool,
    /// Bitmask of record types to return (others will be skipped)
    pub record_types: u16,
    /// Skip records with Content-Length less than this
    pub min_content_length: Option<u64>,
    /// Skip records with Content-Length larger than this
    pub max_content_length: Option<u64>,
}

impl Default for ReaderConfig {
    fn default() -> Self {
        ReaderConfig {
            strict_mode: true,
            record_types: WarcRecordType::AnyType as u16,
            min_content_length: None,
            max_content_length: None,
        }
    }
}

impl ReaderConfig {
    /// Require `CRLF` line endings.
    pub fn with_strict_mode(mut self, strict_mode: bool) -> Self {
        self.strict_mode = strict_mode;
        self
    }

    /// Only return records whose type is in the `WarcRecordType` bitmask.
    pub fn with_record_types(mut self, record_types: u16) -> Self {
        self.record_types = record_types;
        self
    }

    /// Skip records shorter than `min` bytes.
    pub fn with_min_content_length(mut self, min: u64) -> Self {
        self.min_content_length = Some(min);
        self
    }

    /// Skip records longer than `max` bytes.
    pub fn with_max_content_length(mut self, max: u64) -> Self {
        self.max_content_length = Some(max);
        self
    }

    fn accepts(&self, header: &Header, content_length: u64) -> bool {
        let record_type = header.warc_type().unwrap_or(WarcRecordType::NoType);
        (record_type == WarcRecordType::NoType || record_type.matches_bitmask(self.record_types))
            && self.min_content_length.map_or(true, |min| content_length >= min)
            && self.max_content_length.map_or(true, |max| content_length <= max)
    }
}

/// Reader state.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ReaderState {
    /// Looking for the next header block
    Scanning,
    /// A record payload has been handed out and may not be fully consumed
    InRecord,
    /// No more records
    Eof,
}

/// Line content without its line terminator, `None` if the line is not terminated.
fn strip_line_end(line: &[u8], strict_mode: bool) -> Result<Option<&[u8]>> {
    if let Some(content) = line.strip_suffix(b"\r\n") {
        Ok(Some(content))
    } else if let Some(content) = line.strip_suffix(b"\n") {
        if strict_mode {
            return Err(Error::BadHeaderLine(header::decode(line)));
        }
        Ok(Some(content))
    } else {
        Ok(None)
    }
}

/// WARC record stream reader.
///
/// Records are read one at a time with [`Reader::read_record`]. A record's payload
/// borrows the reader and must be dropped before the next record is read. Unread
/// payload bytes are skipped automatically.
pub struct Reader<R: Read> {
    stream: Stream<R>,
    config: ReaderConfig,
    state: ReaderState,
    record_length: u64,
    record_end: u64,
    records_read: u64,
}

impl<R: Read> Reader<R> {
    /// Create a reader with default configuration and detect compression.
    pub fn new(inner: R) -> Result<Self> {
        Self::with_config(inner, ReaderConfig::default())
    }

    /// Create a reader and detect compression from the leading bytes of `inner`.
    pub fn with_config(inner: R, config: ReaderConfig) -> Result<Self> {
        Ok(Self::from_stream(Stream::detect(inner)?, config))
    }

    /// Create a reader for a stream with known compression.
    pub fn with_compression(inner: R, compression: Compression, config: ReaderConfig) -> Self {
        Self::from_stream(Stream::new(inner, compression), config)
    }

    fn from_stream(stream: Stream<R>, config: ReaderConfig) -> Self {
        Reader {
            stream,
            config,
            state: ReaderState::Scanning,
            record_length: 0,
            record_end: 0,
            records_read: 0,
        }
    }

    /// Current reader state.
    pub fn state(&self) -> ReaderState {
        self.state
    }

    /// Input compression.
    pub fn compression(&self) -> Compression {
        self.stream.compression()
    }

    /// Logical (uncompressed) stream position.
    pub fn position(&self) -> u64 {
        self.stream.position()
    }

    /// Number of records returned so far.
    pub fn records_read(&self) -> u64 {
        self.records_read
    }

    /// Unwrap the underlying reader.
    pub fn into_inner(self) -> Option<R> {
        self.stream.into_inner()
    }

    /// Read the next WARC record from the stream.
    ///
    /// # Returns
    ///
    /// `Ok(Some(record))` if a record was read, `Ok(None)` if EOF, or an error.
    /// After an error, the reader is at EOF.
    pub fn read_record(&mut self) -> Result<Option<Record<Payload<'_, R>>>> {
        loop {
            if let Err(e) = self.finish_record() {
                self.state = ReaderState::Eof;
                return Err(e);
            }
            if self.state == ReaderState::Eof {
                return Ok(None);
            }

            let stream_pos = self.stream.position();
            let (header, content_length) = match self.read_header() {
                Ok(Some(header)) => match header.content_length() {
                    Ok(len) => (header, len),
                    Err(e) => {
                        self.state = ReaderState::Eof;
                        return Err(e);
                    }
                },
                Ok(None) => {
                    log::debug!("End of stream after {} records", self.records_read);
                    self.state = ReaderState::Eof;
                    return Ok(None);
                }
                Err(e) => {
                    self.state = ReaderState::Eof;
                    return Err(e);
                }
            };

            let Some(record_end) = self.stream.position().checked_add(content_length) else {
                self.state = ReaderState::Eof;
                return Err(Error::InvalidContentLength(content_length.to_string()));
            };
            self.state = ReaderState::InRecord;
            self.record_length = content_length;
            self.record_end = record_end;

            if !self.config.accepts(&header, content_length) {
                log::warn!(
                    "Skipping {} record at {} ({} bytes)",
                    header.record_type().unwrap_or("untyped"),
                    stream_pos,
                    content_length
                );
                continue;
            }

            log::debug!(
                "Read {} record at {} ({} bytes)",
                header.record_type().unwrap_or("untyped"),
                stream_pos,
                content_length
            );
            self.records_read += 1;
            let payload = Payload::new(&mut self.stream, content_length);
            return Ok(Some(Record::from_parts(header, payload, stream_pos)));
        }
    }

    /// Skip the rest of the current record including its terminator.
    ///
    /// Called by [`Reader::read_record`]; calling it directly is only needed to
    /// position the stream after the last record.
    pub fn finish_record(&mut self) -> Result<()> {
        if self.state != ReaderState::InRecord {
            return Ok(());
        }

        let remaining = self.record_end.saturating_sub(self.stream.position());
        let skipped = io::copy(&mut (&mut self.stream).take(remaining), &mut io::sink())?;
        if skipped < remaining {
            return Err(Error::TruncatedPayload {
                expected: self.record_length,
                actual: self.record_length - (remaining - skipped),
            });
        }

        let strict_mode = self.config.strict_mode;
        let mut part = FilePart::unbounded(&mut self.stream);
        let result = Self::read_terminator(&mut part, strict_mode);
        let pushback = part.take_pushback();
        self.stream.unread(pushback);
        result?;

        self.state = ReaderState::Scanning;
        Ok(())
    }

    fn read_terminator<S: Read>(part: &mut FilePart<S>, strict_mode: bool) -> Result<()> {
        for _ in 0..2 {
            let line = part.readline()?;
            if line.is_empty() && !strict_mode {
                log::warn!("Missing record terminator at end of stream");
                return Ok(());
            }
            match strip_line_end(&line, strict_mode) {
                Ok(Some(b"")) => {}
                _ => return Err(Error::BadTerminator(header::decode(&line))),
            }
        }
        Ok(())
    }

    fn read_header(&mut self) -> Result<Option<Header>> {
        let strict_mode = self.config.strict_mode;
        let mut part = FilePart::unbounded(&mut self.stream);
        let result = Self::scan_header(&mut part, strict_mode);
        let pushback = part.take_pushback();
        self.stream.unread(pushback);
        result
    }

    fn scan_header<S: Read>(part: &mut FilePart<S>, strict_mode: bool) -> Result<Option<Header>> {
        // Skip blank lines between records
        let version_line = loop {
            let line = part.readline()?;
            if line.is_empty() {
                return Ok(None);
            }
            match strip_line_end(&line, strict_mode)? {
                Some(b"") => continue,
                Some(content) => break header::decode(content),
                None => return Err(Error::MalformedHeader),
            }
        };

        let version = version_line.trim();
        if !version.starts_with("WARC/") {
            return Err(Error::BadVersionLine(version_line));
        }
        if !header::SUPPORTED_VERSIONS.contains(&version) {
            return Err(Error::UnsupportedVersion(version.to_string()));
        }

        let mut header = Header::new();
        header.set_version(version);
        let mut last_key = None;
        loop {
            let line = part.readline()?;
            let content = match strip_line_end(&line, strict_mode)? {
                Some(content) => content,
                None => return Err(Error::MalformedHeader),
            };
            if content.is_empty() {
                break;
            }
            log::trace!("Header line: {}", String::from_utf8_lossy(content));
            header.push_line(content, &mut last_key)?;
        }
        Ok(Some(header))
    }
}
