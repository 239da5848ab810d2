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

use std::cmp;
use std::io::{self, Read};

/// Number of bytes pulled per step when scanning for a line terminator.
pub const CHUNK_SIZE: usize = 1024;

/// Stream view over the next `length` bytes of another stream.
///
/// Reads never return more than `length` bytes in total, regardless of how much
/// data the underlying stream has to offer. Bytes read ahead while scanning for
/// line ends are kept in a pushback buffer and returned first on the next read.
///
/// A bounded part whose underlying stream ends before the budget is used up
/// fails with [`io::ErrorKind::UnexpectedEof`] instead of returning short data.
#[derive(Debug)]
pub struct FilePart<R> {
    inner: R,
    length: u64,
    bounded: bool,
    offset: u64,
    buf: Vec<u8>,
}

impl<R: Read> FilePart<R> {
    /// Create a view over the next `length` bytes of `inner`.
    ///
    /// # Arguments
    ///
    /// * `inner` - Underlying stream
    /// * `length` - Byte budget
    pub fn new(inner: R, length: u64) -> Self {
        FilePart {
            inner,
            length,
            bounded: true,
            offset: 0,
            buf: Vec::new(),
        }
    }

    /// Create a view without a byte budget that ends with the underlying stream.
    pub fn unbounded(inner: R) -> Self {
        FilePart {
            bounded: false,
            ..Self::new(inner, u64::MAX)
        }
    }

    /// Configured byte budget.
    pub fn len(&self) -> u64 {
        self.length
    }

    /// Whether the budget is zero.
    pub fn is_empty(&self) -> bool {
        self.length == 0
    }

    /// Bytes returned to the caller so far.
    pub fn offset(&self) -> u64 {
        self.offset
    }

    /// Bytes left in the budget (including pushed-back bytes).
    pub fn remaining(&self) -> u64 {
        self.length - self.offset
    }

    /// Read up to `size` bytes without exceeding the remaining budget.
    ///
    /// Fewer bytes are only returned if the budget is exhausted or an
    /// unbounded part reaches the end of the underlying stream.
    pub fn read_up_to(&mut self, size: usize) -> io::Result<Vec<u8>> {
        let mut content = Vec::new();
        self.by_ref().take(size as u64).read_to_end(&mut content)?;
        Ok(content)
    }

    /// Read everything that is left of the budget.
    pub fn read_all(&mut self) -> io::Result<Vec<u8>> {
        let mut content = Vec::new();
        self.read_to_end(&mut content)?;
        Ok(content)
    }

    /// Read one line including its `\n` terminator.
    ///
    /// The last line may lack a terminator if the budget or the stream ends
    /// mid-line. An empty result means the part is exhausted.
    pub fn readline(&mut self) -> io::Result<Vec<u8>> {
        let mut line = Vec::new();
        loop {
            let chunk = self.read_up_to(CHUNK_SIZE)?;
            if chunk.is_empty() {
                break;
            }
            if let Some(i) = chunk.iter().position(|&b| b == b'\n') {
                self.unread(&chunk[i + 1..]);
                line.extend_from_slice(&chunk[..=i]);
                break;
            }
            line.extend_from_slice(&chunk);
        }
        Ok(line)
    }

    /// Iterator of lines until the part is exhausted.
    pub fn lines(&mut self) -> Lines<'_, R> {
        Lines { part: self, done: false }
    }

    /// Consume the rest of the budget and return the number of bytes skipped.
    pub fn skip(&mut self) -> io::Result<u64> {
        io::copy(self, &mut io::sink())
    }

    fn unread(&mut self, content: &[u8]) {
        if content.is_empty() {
            return;
        }
        self.buf.splice(0..0, content.iter().copied());
        self.offset -= content.len() as u64;
    }

    /// Take the pushback buffer, e.g. to hand it back to the owner of the
    /// underlying stream. The taken bytes count as not yet read.
    pub fn take_pushback(&mut self) -> Vec<u8> {
        std::mem::take(&mut self.buf)
    }

    /// Underlying stream.
    pub(crate) fn get_ref(&self) -> &R {
        &self.inner
    }

    /// Underlying stream (mutable).
    pub(crate) fn get_mut(&mut self) -> &mut R {
        &mut self.inner
    }
}

impl<R: Read> Read for FilePart<R> {
    fn read(&mut self, out: &mut [u8]) -> io::Result<usize> {
        if out.is_empty() {
            return Ok(0);
        }
        if !self.buf.is_empty() {
            let n = cmp::min(out.len(), self.buf.len());
            out[..n].copy_from_slice(&self.buf[..n]);
            self.buf.drain(..n);
            self.offset += n as u64;
            return Ok(n);
        }

        let pull = cmp::min(out.len() as u64, self.remaining()) as usize;
        if pull == 0 {
            return Ok(0);
        }
        let n = self.inner.read(&mut out[..pull])?;
        if n == 0 && self.bounded {
            return Err(io::Error::new(
                io::ErrorKind::UnexpectedEof,
                format!("stream ended {} bytes before end of {}-byte part", self.remaining(), self.length),
            ));
        }
        self.offset += n as u64;
        Ok(n)
    }
}

/// Line iterator over a [`FilePart`].
pub struct Lines<'a, R> {
    part: &'a mut FilePart<R>,
    done: bool,
}

impl<R: Read> Iterator for Lines<'_, R> {
    type Item = io::Result<Vec<u8>>;

    fn next(&mut self) -> Option<Self::Item> {
        if self.done {
            return None;
        }
        match self.part.readline() {
            Ok(line) if line.is_empty() => {
                self.done = true;
                None
            }
            Ok(line) => Some(Ok(line)),
            Err(e) => {
                self.done = true;
                Some(Err(e))
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Cursor;

    // 5 bytes per line
    const TEXT: &[u8] = b"aaaa\nbbbb\ncccc\ndddd\neeee\nffff";

    #[test]
    fn test_read() {
        let mut part = FilePart::new(Cursor::new(TEXT), 0);
        assert_eq!(part.read_all().unwrap(), b"");

        let mut part = FilePart::new(Cursor::new(TEXT), 5);
        assert_eq!(part.read_all().unwrap(), b"aaaa\n");

        let mut part = FilePart::new(Cursor::new(TEXT), 10);
        assert_eq!(part.read_all().unwrap(), b"aaaa\nbbbb\n");

        let mut part = FilePart::new(Cursor::new(vec![b'a'; 10000]), 10);
        assert_eq!(part.read_all().unwrap().len(), 10);
        assert_eq!(part.read_all().unwrap(), b"");
        assert_eq!(part.get_ref().position(), 10);
    }

    #[test]
    fn test_read_with_size() {
        let mut part = FilePart::new(Cursor::new(TEXT), 10);
        assert_eq!(part.read_up_to(3).unwrap(), b"aaa");
        assert_eq!(part.read_up_to(3).unwrap(), b"a\nb");
        assert_eq!(part.read_up_to(3).unwrap(), b"bbb");
        assert_eq!(part.read_up_to(3).unwrap(), b"\n");
        assert_eq!(part.read_up_to(3).unwrap(), b"");
    }

    #[test]
    fn test_readline() {
        let mut part = FilePart::new(Cursor::new(TEXT), 11);
        assert_eq!(part.readline().unwrap(), b"aaaa\n");
        assert_eq!(part.readline().unwrap(), b"bbbb\n");
        assert_eq!(part.readline().unwrap(), b"c");
        assert_eq!(part.readline().unwrap(), b"");
        assert_eq!(part.get_ref().position(), 11);
    }

    #[test]
    fn test_lines() {
        let mut part = FilePart::new(Cursor::new(TEXT), 11);
        let lines: Vec<Vec<u8>> = part.lines().collect::<io::Result<_>>().unwrap();
        assert_eq!(lines, vec![b"aaaa\n".to_vec(), b"bbbb\n".to_vec(), b"c".to_vec()]);
    }

    #[test]
    fn test_read_spanning_pushback() {
        let mut part = FilePart::new(Cursor::new(TEXT), 23);
        assert_eq!(part.readline().unwrap(), b"aaaa\n");
        // the rest of the budget is in the pushback buffer now
        assert_eq!(part.read_up_to(7).unwrap(), b"bbbb\ncc");
        assert_eq!(part.offset(), 12);
        let rest = part.read_all().unwrap();
        assert_eq!(rest, b"cc\ndddd\neee");
        assert_eq!(part.offset(), 23);
        assert_eq!(part.remaining(), 0);
    }

    #[test]
    fn test_partial_reads_sum_to_budget() {
        let data: Vec<u8> = (0..=255u8).cycle().take(5000).collect();
        for size in [1, 7, 64, 1000, 4096] {
            let mut part = FilePart::new(Cursor::new(data.as_slice()), 3001);
            let mut out = part.readline().unwrap();
            loop {
                let chunk = part.read_up_to(size).unwrap();
                if chunk.is_empty() {
                    break;
                }
                out.extend_from_slice(&chunk);
            }
            assert_eq!(out, &data[..3001], "read size {size}");
        }
    }

    #[test]
    fn test_line_end_on_chunk_boundary() {
        let mut data = vec![b'x'; CHUNK_SIZE - 2];
        data.extend_from_slice(b"\r\n");
        data.extend_from_slice(b"next\r\n");
        let mut part = FilePart::new(Cursor::new(data.as_slice()), data.len() as u64);
        let first = part.readline().unwrap();
        assert_eq!(first.len(), CHUNK_SIZE);
        assert!(first.ends_with(b"x\r\n"));
        assert_eq!(part.readline().unwrap(), b"next\r\n");
        assert_eq!(part.readline().unwrap(), b"");
    }

    #[test]
    fn test_crlf_split_across_chunks() {
        let mut data = vec![b'y'; CHUNK_SIZE - 1];
        data.extend_from_slice(b"\r\nz");
        let mut part = FilePart::new(Cursor::new(data.as_slice()), data.len() as u64);
        let first = part.readline().unwrap();
        assert_eq!(first.len(), CHUNK_SIZE + 1);
        assert!(first.ends_with(b"\r\n"));
        assert_eq!(part.readline().unwrap(), b"z");
    }

    #[test]
    fn test_truncated() {
        let mut part = FilePart::new(Cursor::new(b"abc".as_slice()), 10);
        let err = part.read_all().unwrap_err();
        assert_eq!(err.kind(), io::ErrorKind::UnexpectedEof);

        let mut part = FilePart::unbounded(Cursor::new(b"abc".as_slice()));
        assert_eq!(part.read_all().unwrap(), b"abc");
        assert_eq!(part.readline().unwrap(), b"");
    }

    #[test]
    fn test_take_pushback() {
        let mut part = FilePart::unbounded(Cursor::new(TEXT));
        assert_eq!(part.readline().unwrap(), b"aaaa\n");
        assert_eq!(part.take_pushback(), &TEXT[5..]);
        assert_eq!(part.offset(), 5);
        assert_eq!(part.read_all().unwrap(), b"");
    }
}
