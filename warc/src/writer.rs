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

//! Record serialization.
//!
//! With [`Compression::Gzip`], every record is written as its own gzip member, which
//! is finished before the next record starts. A reader that knows the byte offset of
//! a record (see [`Writer::tell`]) can decompress it without touching the records
//! before it.

use std::io::{self, Read, Write};
use flate2::write::GzEncoder;

use crate::error::{Error, Result};
use crate::header::Header;
use crate::record::Record;
use crate::stream::Compression;

/// Writer configuration.
#[derive(Debug, Clone)]
pub struct WriterConfig {
    /// Record compression
    pub compression: Compression,
    /// Gzip compression level (0-9)
    pub level: u32,
}

impl Default for WriterConfig {
    fn default() -> Self {
        WriterConfig {
            compression: Compression::None,
            level: 6,
        }
    }
}

impl WriterConfig {
    /// Set record compression.
    pub fn with_compression(mut self, compression: Compression) -> Self {
        self.compression = compression;
        self
    }

    /// Set the gzip level, capped at 9.
    pub fn with_level(mut self, level: u32) -> Self {
        self.level = level.min(9);
        self
    }
}

/// Counts bytes passed through to the underlying writer.
struct CountingWriter<W> {
    inner: W,
    count: u64,
}

impl<W: Write> Write for CountingWriter<W> {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        let n = self.inner.write(buf)?;
        self.count += n as u64;
        Ok(n)
    }

    fn flush(&mut self) -> io::Result<()> {
        self.inner.flush()
    }
}

/// Write header, exactly `length` payload bytes and the record terminator.
fn write_block<W: Write, P: Read>(out: &mut W, header: &Header, payload: &mut P, length: u64) -> Result<()> {
    header.write(out)?;
    let copied = io::copy(&mut payload.take(length), out)?;
    if copied < length {
        return Err(Error::TruncatedPayload {
            expected: length,
            actual: copied,
        });
    }
    out.write_all(b"\r\n\r\n")?;
    Ok(())
}

/// WARC record writer.
pub struct Writer<W: Write> {
    inner: W,
    config: WriterConfig,
    position: u64,
    records_written: u64,
}

impl<W: Write> Writer<W> {
    /// Create a writer with default configuration (uncompressed).
    pub fn new(inner: W) -> Self {
        Self::with_config(inner, WriterConfig::default())
    }

    /// Create a writer with custom configuration.
    pub fn with_config(inner: W, config: WriterConfig) -> Self {
        Writer {
            inner,
            config,
            position: 0,
            records_written: 0,
        }
    }

    /// Set the offset reported by [`Writer::tell`] for the next record,
    /// e.g. when appending to an existing file.
    pub fn with_start_offset(mut self, offset: u64) -> Self {
        self.position = offset;
        self
    }

    /// Output compression.
    pub fn compression(&self) -> Compression {
        self.config.compression
    }

    /// Byte offset of the next record in the output.
    pub fn tell(&self) -> u64 {
        self.position
    }

    /// Number of records written so far.
    pub fn records_written(&self) -> u64 {
        self.records_written
    }

    /// Write WARC record onto the stream.
    ///
    /// The header is validated before anything is written. Exactly `Content-Length`
    /// bytes are taken from the payload; a payload that ends early fails with
    /// [`Error::TruncatedPayload`], leaving a partial record in the output.
    ///
    /// # Returns
    ///
    /// Number of bytes written to the underlying stream
    pub fn write_record<P: Read>(&mut self, record: &mut Record<P>) -> Result<u64> {
        record.header().validate()?;
        let length = record.content_length()?;
        let header = record.header().clone();
        let payload = record.payload();

        let mut out = CountingWriter {
            inner: &mut self.inner,
            count: 0,
        };
        match self.config.compression {
            Compression::None => write_block(&mut out, &header, payload, length)?,
            Compression::Gzip => {
                let mut gz = GzEncoder::new(&mut out, flate2::Compression::new(self.config.level));
                write_block(&mut gz, &header, payload, length)?;
                gz.finish()?;
            }
        }
        out.flush()?;

        let written = out.count;
        log::debug!(
            "Wrote {} record at {} ({} bytes payload, {} bytes written)",
            header.record_type().unwrap_or("untyped"),
            self.position,
            length,
            written
        );
        self.position += written;
        self.records_written += 1;
        Ok(written)
    }

    /// Flush the underlying stream.
    pub fn flush(&mut self) -> io::Result<()> {
        self.inner.flush()
    }

    /// Underlying writer.
    pub fn get_ref(&self) -> &W {
        &self.inner
    }

    /// Flush and return the underlying writer.
    pub fn finish(mut self) -> io::Result<W> {
        self.inner.flush()?;
        Ok(self.inner)
    }
}
