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

use std::io::{self, Cursor, Read};
use std::ops::{Deref, DerefMut};

use crate::digest;
use crate::error::Result;
use crate::file_part::FilePart;
use crate::header::{self, Header};
use crate::stream::Stream;
use crate::WarcRecordType;

/// Payload of a record read from a [`Reader`](crate::Reader).
///
/// The payload is a [`FilePart`] over the reader's stream, bounded to the record's
/// `Content-Length`. It borrows the reader, so it has to be dropped before the next
/// record can be read. Unread payload bytes are skipped by the reader.
///
/// The underlying stream is not reachable through the payload:
///
/// ```compile_fail
/// let data = b"WARC/1.0\r\nWARC-Type: resource\r\nContent-Length: 3\r\n\r\nabc\r\n\r\n";
/// let mut reader = warc::Reader::new(&data[..]).unwrap();
/// let mut record = reader.read_record().unwrap().unwrap();
/// let _stream = record.payload().get_mut();
/// ```
pub struct Payload<'a, R: Read> {
    part: FilePart<&'a mut Stream<R>>,
}

impl<'a, R: Read> Payload<'a, R> {
    pub(crate) fn new(stream: &'a mut Stream<R>, length: u64) -> Self {
        Payload {
            part: FilePart::new(stream, length),
        }
    }
}

impl<'a, R: Read> Deref for Payload<'a, R> {
    type Target = FilePart<&'a mut Stream<R>>;

    fn deref(&self) -> &Self::Target {
        &self.part
    }
}

impl<R: Read> DerefMut for Payload<'_, R> {
    fn deref_mut(&mut self) -> &mut Self::Target {
        &mut self.part
    }
}

impl<R: Read> Read for Payload<'_, R> {
    fn read(&mut self, buf: &mut [u8]) -> io::Result<usize> {
        self.part.read(buf)
    }
}

impl<R: Read> Drop for Payload<'_, R> {
    fn drop(&mut self) {
        // Bytes read ahead by readline() belong to the stream again
        let rest = self.part.take_pushback();
        self.part.get_mut().unread(rest);
    }
}

/// A WARC record: one header block and its payload.
///
/// Records returned by a reader carry a bounded [`Payload`] view, records built for
/// writing usually own their payload (see [`Record::from_bytes`]).
pub struct Record<P> {
    header: Header,
    payload: P,
    stream_pos: u64,
}

impl<P> Record<P> {
    /// Create a record for writing.
    ///
    /// Fails if the header lacks a mandatory field or has an invalid `Content-Length`.
    /// Use [`Header::with_defaults`] to fill in generated fields.
    pub fn new(header: Header, payload: P) -> Result<Self> {
        header.validate()?;
        Ok(Self::from_parts(header, payload, 0))
    }

    pub(crate) fn from_parts(header: Header, payload: P, stream_pos: u64) -> Self {
        Record {
            header,
            payload,
            stream_pos,
        }
    }

    /// WARC record header.
    pub fn header(&self) -> &Header {
        &self.header
    }

    /// WARC record header (mutable).
    pub fn header_mut(&mut self) -> &mut Header {
        &mut self.header
    }

    /// Record payload.
    pub fn payload(&mut self) -> &mut P {
        &mut self.payload
    }

    /// Split record into header and payload.
    pub fn into_parts(self) -> (Header, P) {
        (self.header, self.payload)
    }

    /// Record type (same as `header().record_type()`).
    pub fn record_type(&self) -> Option<&str> {
        self.header.record_type()
    }

    /// Record type as enum value.
    pub fn warc_type(&self) -> WarcRecordType {
        self.header.warc_type().unwrap_or(WarcRecordType::NoType)
    }

    /// Record ID (same as `header().record_id()`).
    pub fn record_id(&self) -> Option<&str> {
        self.header.record_id()
    }

    /// Record date (same as `header().date()`).
    pub fn date(&self) -> Option<&str> {
        self.header.date()
    }

    /// Payload length in bytes (same as `header().content_length()`).
    pub fn content_length(&self) -> Result<u64> {
        self.header.content_length()
    }

    /// WARC record start offset in the logical (uncompressed) stream.
    pub fn stream_pos(&self) -> u64 {
        self.stream_pos
    }
}

impl<P: Read> Record<P> {
    /// Read the remaining payload into memory.
    pub fn read_payload(&mut self) -> io::Result<Vec<u8>> {
        let mut content = Vec::new();
        self.payload.read_to_end(&mut content)?;
        Ok(content)
    }

    /// Verify `WARC-Payload-Digest` against the remaining payload, which is consumed.
    ///
    /// The digest covers the record payload as stored, HTTP messages are not parsed.
    /// Returns `None` if the record has no payload digest.
    pub fn verify_payload_digest(&mut self) -> Result<Option<bool>> {
        let Some(field) = self.header.get(header::WARC_PAYLOAD_DIGEST) else {
            return Ok(None);
        };
        let field = field.to_string();
        let hash = digest::sha1_of(&mut self.payload)?;
        digest::verify_hash(&field, &hash).map(Some)
    }
}

impl Record<Cursor<Vec<u8>>> {
    /// Create a write-ready record with an in-memory payload.
    ///
    /// `WARC-Type` defaults to `response`, the remaining mandatory fields are filled in
    /// as by [`Header::fill_defaults`]. `Content-Length` is always set to the payload
    /// length and a `WARC-Payload-Digest` is added unless given.
    pub fn from_bytes<I, K, V>(fields: I, payload: Vec<u8>) -> Result<Self>
    where
        I: IntoIterator<Item = (K, V)>,
        K: Into<String>,
        V: Into<String>,
    {
        let mut header = Header::from_fields(fields);
        if !header.contains_key(header::WARC_TYPE) {
            header.set(header::WARC_TYPE, WarcRecordType::Response.as_str());
        }
        header.fill_defaults()?;
        header.set_content_length(payload.len() as u64);
        if !header.contains_key(header::WARC_PAYLOAD_DIGEST) {
            header.set(header::WARC_PAYLOAD_DIGEST, digest::payload_digest(&payload));
        }
        Ok(Self::from_parts(header, Cursor::new(payload), 0))
    }
}
