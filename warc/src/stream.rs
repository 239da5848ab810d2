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

//! Logical (decompressed) input streams.
//!
//! WARC files are compressed record by record: a `.warc.gz` file is a sequence of
//! independent gzip members. [`Stream`] decompresses such files one member at a
//! time and presents the concatenated member contents as one plain byte stream.

use std::io::{self, BufRead, BufReader, Read};
use std::path::Path;
use flate2::bufread::GzDecoder;

/// Leading bytes of every gzip member.
pub const GZIP_MAGIC: [u8; 2] = [0x1f, 0x8b];

/// Compression of a WARC stream.
#[derive(Debug, PartialEq, Eq, Clone, Copy)]
pub enum Compression {
    /// Uncompressed data
    None,
    /// One gzip member per record
    Gzip,
}

impl Compression {
    /// Guess compression from a file name (`.gz` suffix).
    ///
    /// ```
    /// # use warc::Compression;
    /// assert_eq!(Compression::guess_for_filename("test.warc.gz"), Compression::Gzip);
    /// assert_eq!(Compression::guess_for_filename("test.warc"), Compression::None);
    /// ```
    pub fn guess_for_filename<P: AsRef<Path>>(path: P) -> Compression {
        match path.as_ref().extension() {
            Some(ext) if ext.eq_ignore_ascii_case("gz") => Compression::Gzip,
            _ => Compression::None,
        }
    }

    /// Detect compression from the leading bytes of a stream without consuming them.
    pub fn detect<R: BufRead>(reader: &mut R) -> io::Result<Compression> {
        if reader.fill_buf()?.starts_with(&GZIP_MAGIC) {
            Ok(Compression::Gzip)
        } else {
            Ok(Compression::None)
        }
    }
}

/// Gzip decompression restarted at each member boundary.
struct Members<R: BufRead> {
    decoder: Option<GzDecoder<R>>,
    count: u64,
}

impl<R: BufRead> Members<R> {
    fn new(inner: R) -> Self {
        Members {
            decoder: Some(GzDecoder::new(inner)),
            count: 1,
        }
    }

    fn into_inner(self) -> Option<R> {
        self.decoder.map(GzDecoder::into_inner)
    }
}

impl<R: BufRead> Read for Members<R> {
    fn read(&mut self, buf: &mut [u8]) -> io::Result<usize> {
        loop {
            let Some(decoder) = self.decoder.as_mut() else {
                return Ok(0);
            };
            let n = decoder.read(buf)?;
            if n > 0 || buf.is_empty() {
                return Ok(n);
            }

            // Current member is exhausted
            if decoder.get_mut().fill_buf()?.is_empty() {
                return Ok(0);
            }
            if let Some(finished) = self.decoder.take() {
                self.decoder = Some(GzDecoder::new(finished.into_inner()));
                self.count += 1;
                log::debug!("Starting gzip member {}", self.count);
            }
        }
    }
}

enum Source<R: Read> {
    Plain(BufReader<R>),
    Gzip(Members<BufReader<R>>),
}

/// Plain or decompressed WARC byte stream with a pushback slot.
///
/// `position()` counts logical (uncompressed) bytes consumed, excluding bytes that
/// have been pushed back.
pub struct Stream<R: Read> {
    source: Source<R>,
    pushback: Vec<u8>,
    position: u64,
}

impl<R: Read> Stream<R> {
    /// Create a stream with known compression.
    pub fn new(inner: R, compression: Compression) -> Self {
        Self::from_buffered(BufReader::new(inner), compression)
    }

    /// Create a stream and detect its compression from its leading bytes.
    pub fn detect(inner: R) -> io::Result<Self> {
        let mut inner = BufReader::new(inner);
        let compression = Compression::detect(&mut inner)?;
        log::debug!("Detected input compression: {:?}", compression);
        Ok(Self::from_buffered(inner, compression))
    }

    fn from_buffered(inner: BufReader<R>, compression: Compression) -> Self {
        let source = match compression {
            Compression::None => Source::Plain(inner),
            Compression::Gzip => Source::Gzip(Members::new(inner)),
        };
        Stream {
            source,
            pushback: Vec::new(),
            position: 0,
        }
    }

    /// Stream compression.
    pub fn compression(&self) -> Compression {
        match self.source {
            Source::Plain(_) => Compression::None,
            Source::Gzip(_) => Compression::Gzip,
        }
    }

    /// Logical bytes consumed so far.
    pub fn position(&self) -> u64 {
        self.position
    }

    /// Number of gzip members started so far (0 for uncompressed streams).
    pub fn members(&self) -> u64 {
        match &self.source {
            Source::Plain(_) => 0,
            Source::Gzip(m) => m.count,
        }
    }

    /// Return bytes to the stream. They are read again before any new data.
    pub(crate) fn unread(&mut self, mut bytes: Vec<u8>) {
        if bytes.is_empty() {
            return;
        }
        self.position -= bytes.len() as u64;
        if !self.pushback.is_empty() {
            bytes.extend_from_slice(&self.pushback);
        }
        self.pushback = bytes;
    }

    /// Unwrap the underlying reader. Buffered and pushed-back data is lost.
    pub fn into_inner(self) -> Option<R> {
        match self.source {
            Source::Plain(r) => Some(r.into_inner()),
            Source::Gzip(m) => m.into_inner().map(BufReader::into_inner),
        }
    }
}

impl<R: Read> Read for Stream<R> {
    fn read(&mut self, buf: &mut [u8]) -> io::Result<usize> {
        let n = if !self.pushback.is_empty() {
            let n = buf.len().min(self.pushback.len());
            buf[..n].copy_from_slice(&self.pushback[..n]);
            self.pushback.drain(..n);
            n
        } else {
            match &mut self.source {
                Source::Plain(r) => r.read(buf)?,
                Source::Gzip(m) => m.read(buf)?,
            }
        };
        self.position += n as u64;
        Ok(n)
    }
}
