// src/digest.rs

//! Content fingerprints used for change detection.
//!
//! A [`Digest`] is the first 20 bytes of the BLAKE3 extendable output over
//! some bytes. It is a change detector only; nothing relies on it being a
//! secure hash. The cache stores and compares the lowercase hex rendering.

use std::fmt;
use std::io::Read;
use std::path::Path;

use anyhow::{Context, Result};
use blake3::Hasher;

use crate::fs::FileSystem;

/// Size of a digest in bytes.
pub const DIGEST_LEN: usize = 20;

/// Fixed-size content fingerprint.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Digest([u8; DIGEST_LEN]);

impl Digest {
    pub fn as_bytes(&self) -> &[u8; DIGEST_LEN] {
        &self.0
    }

    /// Lowercase hex, `2 * DIGEST_LEN` characters.
    pub fn to_hex(&self) -> String {
        encode_hex(self)
    }

    fn from_hasher(hasher: &Hasher) -> Self {
        let mut out = [0u8; DIGEST_LEN];
        hasher.finalize_xof().fill(&mut out);
        Digest(out)
    }
}

impl fmt::Display for Digest {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.to_hex())
    }
}

/// Fingerprint an in-memory byte sequence (e.g. a recipe body).
pub fn fingerprint(bytes: impl AsRef<[u8]>) -> Digest {
    let mut hasher = Hasher::new();
    hasher.update(bytes.as_ref());
    Digest::from_hasher(&hasher)
}

/// Fingerprint a file's contents, streaming it through the hasher.
pub fn fingerprint_file(fs: &dyn FileSystem, path: &Path) -> Result<Digest> {
    let reader = fs
        .open_read(path)
        .with_context(|| format!("opening file for hashing: {:?}", path))?;
    fingerprint_reader(reader).with_context(|| format!("hashing file {:?}", path))
}

/// Fingerprint everything readable from `reader`.
pub fn fingerprint_reader(mut reader: impl Read) -> Result<Digest> {
    let mut hasher = Hasher::new();
    let mut buf = [0u8; 8192];
    loop {
        let n = reader.read(&mut buf)?;
        if n == 0 {
            break;
        }
        hasher.update(&buf[..n]);
    }
    Ok(Digest::from_hasher(&hasher))
}

pub fn encode_hex(digest: &Digest) -> String {
    hex::encode(digest.as_bytes())
}
