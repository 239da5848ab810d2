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

use std::fs::{File, OpenOptions};
use std::io::{BufWriter, Read, Write};
use std::path::Path;

use crate::error::{Error, Result};
use crate::reader::{Reader, ReaderConfig};
use crate::record::{Payload, Record};
use crate::stream::Compression;
use crate::writer::{Writer, WriterConfig};

type BoxedRead<'a> = Box<dyn Read + 'a>;
type BoxedWrite<'a> = Box<dyn Write + 'a>;

enum Mode<'a> {
    Read(Reader<BoxedRead<'a>>),
    Write(Writer<BoxedWrite<'a>>),
    Closed,
}

/// WARC file opened for either reading or writing.
///
/// The input or output is resolved once at construction: a path or an already open
/// handle, compressed or plain. Reading detects compression from the leading bytes
/// of the input, writing takes it from an explicit flag or the file name.
pub struct WarcFile<'a> {
    mode: Mode<'a>,
}

fn compression_for(path: &Path, compress: Option<bool>) -> Compression {
    match compress {
        Some(true) => Compression::Gzip,
        Some(false) => Compression::None,
        None => Compression::guess_for_filename(path),
    }
}

impl WarcFile<'static> {
    /// Open a WARC file for reading.
    pub fn open<P: AsRef<Path>>(path: P) -> Result<Self> {
        Self::open_with(path, ReaderConfig::default())
    }

    /// Open a WARC file for reading with custom reader configuration.
    pub fn open_with<P: AsRef<Path>>(path: P, config: ReaderConfig) -> Result<Self> {
        let file = File::open(path.as_ref())?;
        log::debug!("Opened {} for reading", path.as_ref().display());
        WarcFile::from_reader_with(file, config)
    }

    /// Create (or truncate) a WARC file for writing.
    ///
    /// # Arguments
    ///
    /// * `path` - Output file path
    /// * `compress` - Write gzip members; if `None`, compress if the file name ends in `.gz`
    pub fn create<P: AsRef<Path>>(path: P, compress: Option<bool>) -> Result<Self> {
        let path = path.as_ref();
        let compression = compression_for(path, compress);
        let file = File::create(path)?;
        log::debug!("Created {} for writing ({:?})", path.display(), compression);
        Ok(WarcFile::from_writer_with(
            BufWriter::new(file),
            WriterConfig::default().with_compression(compression),
        ))
    }

    /// Open a WARC file for appending records, creating it if necessary.
    pub fn append<P: AsRef<Path>>(path: P, compress: Option<bool>) -> Result<Self> {
        let path = path.as_ref();
        let compression = compression_for(path, compress);
        let file = OpenOptions::new().create(true).append(true).open(path)?;
        let offset = file.metadata()?.len();
        log::debug!("Appending to {} at offset {}", path.display(), offset);
        let writer = Writer::with_config(
            Box::new(BufWriter::new(file)) as BoxedWrite<'static>,
            WriterConfig::default().with_compression(compression),
        );
        Ok(WarcFile {
            mode: Mode::Write(writer.with_start_offset(offset)),
        })
    }
}

impl<'a> WarcFile<'a> {
    /// Read WARC records from an open handle, detecting compression.
    pub fn from_reader<R: Read + 'a>(handle: R) -> Result<Self> {
        Self::from_reader_with(handle, ReaderConfig::default())
    }

    /// Read WARC records from an open handle with custom reader configuration.
    pub fn from_reader_with<R: Read + 'a>(handle: R, config: ReaderConfig) -> Result<Self> {
        let reader = Reader::with_config(Box::new(handle) as BoxedRead<'a>, config)?;
        Ok(WarcFile {
            mode: Mode::Read(reader),
        })
    }

    /// Write WARC records to an open handle.
    pub fn from_writer<W: Write + 'a>(handle: W, compress: bool) -> Self {
        let compression = if compress { Compression::Gzip } else { Compression::None };
        Self::from_writer_with(handle, WriterConfig::default().with_compression(compression))
    }

    /// Write WARC records to an open handle with custom writer configuration.
    pub fn from_writer_with<W: Write + 'a>(handle: W, config: WriterConfig) -> Self {
        WarcFile {
            mode: Mode::Write(Writer::with_config(Box::new(handle) as BoxedWrite<'a>, config)),
        }
    }

    fn mode_name(&self) -> &'static str {
        match self.mode {
            Mode::Read(_) => "read",
            Mode::Write(_) => "write",
            Mode::Closed => "closed",
        }
    }

    /// Whether the file was opened for writing.
    pub fn is_writable(&self) -> bool {
        matches!(self.mode, Mode::Write(_))
    }

    /// Stream compression.
    pub fn compression(&self) -> Option<Compression> {
        match &self.mode {
            Mode::Read(r) => Some(r.compression()),
            Mode::Write(w) => Some(w.compression()),
            Mode::Closed => None,
        }
    }

    /// Read the next record, `None` at the end of the file.
    pub fn read_record(&mut self) -> Result<Option<Record<Payload<'_, BoxedRead<'a>>>>> {
        let name = self.mode_name();
        match &mut self.mode {
            Mode::Read(reader) => reader.read_record(),
            _ => Err(Error::WrongMode(name)),
        }
    }

    /// Write one record and return the number of bytes written.
    pub fn write_record<P: Read>(&mut self, record: &mut Record<P>) -> Result<u64> {
        let name = self.mode_name();
        match &mut self.mode {
            Mode::Write(writer) => writer.write_record(record),
            _ => Err(Error::WrongMode(name)),
        }
    }

    /// Current offset: the output offset of the next record when writing, the
    /// logical (uncompressed) stream position when reading.
    pub fn tell(&self) -> u64 {
        match &self.mode {
            Mode::Read(r) => r.position(),
            Mode::Write(w) => w.tell(),
            Mode::Closed => 0,
        }
    }

    /// Flush pending output and close the file. Further reads and writes fail.
    pub fn close(&mut self) -> Result<()> {
        match std::mem::replace(&mut self.mode, Mode::Closed) {
            Mode::Write(writer) => {
                writer.finish()?;
            }
            Mode::Read(_) | Mode::Closed => {}
        }
        Ok(())
    }
}
