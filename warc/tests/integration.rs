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

//! End-to-end reading and writing of plain and gzip-compressed WARC files.

use std::io::{Read, Write};

use flate2::write::GzEncoder;
use warc::file_part::CHUNK_SIZE;
use warc::stream::GZIP_MAGIC;
use warc::{Compression, Error, Header, Reader, Record, WarcFile, Writer, WriterConfig};

const SAMPLE_WARC_RECORD_TEXT: &str = concat!(
    "WARC/1.0\r\n",
    "Content-Length: 10\r\n",
    "WARC-Date: 2012-02-10T16:15:52Z\r\n",
    "Content-Type: application/http; msgtype=response\r\n",
    "WARC-Type: response\r\n",
    "WARC-Record-ID: <urn:uuid:80fb9262-5402-11e1-8206-545200690126>\r\n",
    "WARC-Target-URI: http://example.com/\r\n",
    "\r\n",
    "Helloworld",
    "\r\n\r\n",
);

fn init_logging() {
    let _ = env_logger::builder().is_test(true).try_init();
}

fn gzip(data: &[u8]) -> Vec<u8> {
    let mut enc = GzEncoder::new(Vec::new(), flate2::Compression::default());
    enc.write_all(data).unwrap();
    enc.finish().unwrap()
}

fn fixed_record(i: usize) -> Record<std::io::Cursor<Vec<u8>>> {
    Record::from_bytes(
        [
            ("WARC-Type", "response".to_string()),
            ("WARC-Record-ID", format!("<urn:uuid:00000000-0000-0000-0000-{i:012}>")),
            ("WARC-Date", "2012-02-10T16:15:52Z".to_string()),
        ],
        format!("hello {i}").into_bytes(),
    ).unwrap()
}

#[test]
fn test_read_sample_record() {
    init_logging();
    let mut f = WarcFile::from_reader(SAMPLE_WARC_RECORD_TEXT.as_bytes()).unwrap();
    let mut record = f.read_record().unwrap().unwrap();
    assert_eq!(record.date(), Some("2012-02-10T16:15:52Z"));
    assert_eq!(record.record_type(), Some("response"));
    assert_eq!(record.content_length().unwrap(), 10);
    assert_eq!(record.read_payload().unwrap(), b"Helloworld");
    drop(record);
    assert!(f.read_record().unwrap().is_none());
}

#[test]
fn test_read_empty_stream() {
    let mut f = WarcFile::from_reader(&b""[..]).unwrap();
    assert!(f.read_record().unwrap().is_none());
}

#[test]
fn test_read_gzip_members() {
    init_logging();
    let mut data = Vec::new();
    for _ in 0..3 {
        data.extend(gzip(SAMPLE_WARC_RECORD_TEXT.as_bytes()));
    }
    let mut reader = Reader::new(&data[..]).unwrap();
    assert_eq!(reader.compression(), Compression::Gzip);
    let mut n = 0;
    while let Some(mut record) = reader.read_record().unwrap() {
        assert_eq!(record.read_payload().unwrap(), b"Helloworld");
        n += 1;
    }
    assert_eq!(n, 3);
}

#[test]
fn test_members_not_aligned_with_records() {
    let text = SAMPLE_WARC_RECORD_TEXT.repeat(4);
    let bytes = text.as_bytes();
    let mut data = Vec::new();
    for chunk in bytes.chunks(97) {
        data.extend(gzip(chunk));
    }
    let mut reader = Reader::new(&data[..]).unwrap();
    let mut n = 0;
    while let Some(record) = reader.read_record().unwrap() {
        assert_eq!(record.header().target_uri(), Some("http://example.com/"));
        n += 1;
    }
    assert_eq!(n, 4);
    assert_eq!(reader.position(), bytes.len() as u64);
}

#[test]
fn test_write_gz() {
    init_logging();
    let mut buffer = Vec::new();
    let config = WriterConfig::default()
        .with_compression(Compression::Gzip)
        .with_level(0);
    let mut f = WarcFile::from_writer_with(&mut buffer, config);
    for i in 0..10 {
        f.write_record(&mut fixed_record(i)).unwrap();
    }
    f.close().unwrap();
    drop(f);

    let magic_count = buffer.windows(2).filter(|w| *w == GZIP_MAGIC).count();
    assert_eq!(magic_count, 10);

    let mut f = WarcFile::from_reader(&buffer[..]).unwrap();
    assert_eq!(f.compression(), Some(Compression::Gzip));
    let mut i = 0;
    while let Some(mut record) = f.read_record().unwrap() {
        assert_eq!(record.read_payload().unwrap(), format!("hello {i}").as_bytes());
        i += 1;
    }
    assert_eq!(i, 10);
}

#[test]
fn test_random_access_by_offset() {
    let config = WriterConfig::default().with_compression(Compression::Gzip);
    let mut writer = Writer::with_config(Vec::new(), config);
    let mut offsets = Vec::new();
    for i in 0..5 {
        offsets.push(writer.tell());
        writer.write_record(&mut fixed_record(i)).unwrap();
    }
    let out = writer.finish().unwrap();

    for (i, &offset) in offsets.iter().enumerate().rev() {
        let mut reader = Reader::new(&out[offset as usize..]).unwrap();
        let mut record = reader.read_record().unwrap().unwrap();
        assert_eq!(
            record.record_id(),
            Some(format!("<urn:uuid:00000000-0000-0000-0000-{i:012}>").as_str())
        );
        assert_eq!(record.verify_payload_digest().unwrap(), Some(true));
    }
}

/// Build a gzipped record whose header block is exactly `header_len` bytes long.
fn record_with_header_len(header_len: usize, digest: &str, payload: &[u8]) -> Vec<u8> {
    let mut head = format!(
        "WARC/1.0\r\nWARC-Type: response\r\nContent-Length: {}\r\nX-Padding: ",
        payload.len()
    );
    let tail = format!("\r\nWARC-Payload-Digest: {digest}\r\n\r\n");
    let pad = header_len - head.len() - tail.len();
    head.push_str(&"x".repeat(pad));
    head.push_str(&tail);
    assert_eq!(head.len(), header_len);

    let mut record = head.into_bytes();
    record.extend_from_slice(payload);
    record.extend_from_slice(b"\r\n\r\n");
    gzip(&record)
}

#[test]
fn test_long_header() {
    let digest = "sha1:M4VJCCJQJKPACSSSBHURM572HSDQHO2P";
    let payload = b"payload after a long header";
    for header_len in (CHUNK_SIZE - 6..=CHUNK_SIZE + 6).chain([2 * CHUNK_SIZE, 2 * CHUNK_SIZE + 1]) {
        let mut data = record_with_header_len(header_len, digest, payload);
        data.extend(record_with_header_len(CHUNK_SIZE, digest, b"second"));

        let mut f = WarcFile::from_reader(&data[..]).unwrap();
        {
            let mut record = f.read_record().unwrap().unwrap();
            assert_eq!(record.header().get("WARC-Payload-Digest"), Some(digest), "header length {header_len}");
            assert_eq!(record.read_payload().unwrap(), payload, "header length {header_len}");
        }
        {
            let mut record = f.read_record().unwrap().unwrap();
            assert_eq!(record.read_payload().unwrap(), b"second");
        }
        assert!(f.read_record().unwrap().is_none());
    }
}

#[test]
fn test_header_round_trip() {
    let mut reader = Reader::new(SAMPLE_WARC_RECORD_TEXT.as_bytes()).unwrap();
    let original = reader.read_record().unwrap().unwrap().header().clone();

    let serialized = format!("{original}\r\n\r\n");
    let serialized = serialized.replacen("Content-Length: 10", "Content-Length: 0", 1);
    let mut reader = Reader::new(serialized.as_bytes()).unwrap();
    let mut parsed = reader.read_record().unwrap().unwrap().header().clone();
    parsed.set_content_length(10);
    assert_eq!(parsed, original);

    let lowered = Header::from_fields(original.iter().map(|(k, v)| (k.to_lowercase(), v.to_string())));
    assert_eq!(lowered, original);
}

#[test]
fn test_copy_records() {
    let data = SAMPLE_WARC_RECORD_TEXT.repeat(3);
    let mut reader = Reader::new(data.as_bytes()).unwrap();
    let mut writer = Writer::new(Vec::new());
    while let Some(mut record) = reader.read_record().unwrap() {
        writer.write_record(&mut record).unwrap();
    }
    let out = writer.finish().unwrap();
    assert_eq!(out.len(), data.len());

    let mut copied = Reader::new(&out[..]).unwrap();
    let mut n = 0;
    while let Some(mut record) = copied.read_record().unwrap() {
        assert_eq!(record.read_payload().unwrap(), b"Helloworld");
        assert_eq!(record.record_id(), Some("<urn:uuid:80fb9262-5402-11e1-8206-545200690126>"));
        n += 1;
    }
    assert_eq!(n, 3);
}

#[test]
fn test_files_on_disk() {
    init_logging();
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("test.warc.gz");

    let mut f = WarcFile::create(&path, None).unwrap();
    assert_eq!(f.compression(), Some(Compression::Gzip));
    for i in 0..3 {
        f.write_record(&mut fixed_record(i)).unwrap();
    }
    f.close().unwrap();

    let mut f = WarcFile::append(&path, None).unwrap();
    let offset = f.tell();
    assert_eq!(offset, std::fs::metadata(&path).unwrap().len());
    f.write_record(&mut fixed_record(3)).unwrap();
    f.close().unwrap();

    let mut raw = Vec::new();
    std::fs::File::open(&path).unwrap().read_to_end(&mut raw).unwrap();
    assert!(raw[offset as usize..].starts_with(&GZIP_MAGIC));

    let mut f = WarcFile::open(&path).unwrap();
    let mut ids = Vec::new();
    while let Some(record) = f.read_record().unwrap() {
        ids.push(record.record_id().unwrap().to_string());
    }
    assert_eq!(ids.len(), 4);
    assert!(ids[3].ends_with("000000000003>"));

    let plain = dir.path().join("test.warc");
    let mut f = WarcFile::create(&plain, None).unwrap();
    f.write_record(&mut fixed_record(0)).unwrap();
    f.close().unwrap();
    let mut f = WarcFile::open(&plain).unwrap();
    assert_eq!(f.compression(), Some(Compression::None));
    assert!(f.read_record().unwrap().is_some());
}

#[test]
fn test_truncated_gzip_payload() {
    let text = SAMPLE_WARC_RECORD_TEXT.replace("Content-Length: 10", "Content-Length: 100");
    let data = gzip(text.as_bytes());
    let mut f = WarcFile::from_reader(&data[..]).unwrap();
    drop(f.read_record().unwrap());
    assert!(matches!(f.read_record(), Err(Error::TruncatedPayload { expected: 100, .. })));
    assert!(f.read_record().unwrap().is_none());
}
