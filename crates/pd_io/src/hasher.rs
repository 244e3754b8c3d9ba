//! SHA-256 digests for audit records. Hex output is always lowercase.
//!
//! Use [`sha256_canonical`] for values (hashes their canonical JSON) and
//! [`sha256_hex`] / [`sha256_file`] for raw bytes.

use std::path::Path;

use serde::Serialize;
use sha2::{Digest, Sha256};

use crate::canonical_json::to_canonical_bytes;
use crate::{read_file, IoResult};

pub fn sha256_hex(bytes: &[u8]) -> String {
    hex::encode(Sha256::digest(bytes))
}

/// Digest of the canonical JSON form of `value`: key order and whitespace in
/// the source never change the result.
pub fn sha256_canonical<T: Serialize + ?Sized>(value: &T) -> IoResult<String> {
    Ok(sha256_hex(&to_canonical_bytes(value)?))
}

pub fn sha256_file(path: &Path) -> IoResult<String> {
    Ok(sha256_hex(&read_file(path)?))
}
