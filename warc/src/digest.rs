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

//! SHA-1 record digests (`WARC-Payload-Digest`, `WARC-Block-Digest`).
//!
//! Digests are written as `sha1:<hex>`. For verification, the digest value
//! may be encoded as base16, base32 or base64.

use std::io;
use base64::Engine;
use base64::engine::general_purpose::STANDARD as BASE64;
use sha1::{Digest, Sha1};

use crate::error::{Error, Result};

const BASE32_ALPHABET: &[u8; 32] = b"ABCDEFGHIJKLMNOPQRSTUVWXYZ234567";

fn to_base32(hash: &[u8]) -> String {
    let mut out = String::with_capacity(hash.len().div_ceil(5) * 8);
    for chunk in hash.chunks(5) {
        let mut buf = [0u8; 5];
        buf[..chunk.len()].copy_from_slice(chunk);
        let bits = buf.iter().fold(0u64, |acc, &b| (acc << 8) | b as u64);
        let n_chars = (chunk.len() * 8).div_ceil(5);
        for i in 0..8 {
            if i < n_chars {
                out.push(BASE32_ALPHABET[((bits >> (35 - i * 5)) & 0x1f) as usize] as char);
            } else {
                out.push('=');
            }
        }
    }
    out
}

/// SHA-1 hash of everything `reader` has left to offer.
pub fn sha1_of<R: io::Read>(reader: &mut R) -> io::Result<Vec<u8>> {
    let mut hasher = Sha1::new();
    io::copy(reader, &mut hasher)?;
    Ok(hasher.finalize().to_vec())
}

/// Digest field value for `bytes` as written to new records.
pub fn payload_digest(bytes: &[u8]) -> String {
    format!("sha1:{}", hex::encode(Sha1::digest(bytes)))
}

/// Check a digest field value against a precomputed SHA-1 hash.
///
/// # Arguments
///
/// * `digest_field` - Digest string from header (e.g., `"sha1:BASE32HASH"`)
/// * `hash` - SHA-1 hash of the digested data
pub fn verify_hash(digest_field: &str, hash: &[u8]) -> Result<bool> {
    let Some((algorithm, value)) = digest_field.trim().split_once(':') else {
        return Err(Error::UnsupportedDigest(digest_field.to_string()));
    };
    if !algorithm.eq_ignore_ascii_case("sha1") {
        return Err(Error::UnsupportedDigest(algorithm.to_string()));
    }

    Ok(match value.len() {
        40 => value.eq_ignore_ascii_case(&hex::encode(hash)),
        32 => value.trim_end_matches('=').eq_ignore_ascii_case(to_base32(hash).trim_end_matches('=')),
        _ => BASE64.decode(value).map(|v| v == hash).unwrap_or(false),
    })
}

/// Check a digest field value against `bytes`.
pub fn verify(digest_field: &str, bytes: &[u8]) -> Result<bool> {
    verify_hash(digest_field, &Sha1::digest(bytes))
}
