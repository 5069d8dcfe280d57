//! Content hashing.
//!
//! Assets are addressed by the XXH3 64-bit digest of their bytes, rendered as
//! 16 lowercase hex characters. The digest is for change detection and blob
//! addressing only; it is not a security primitive.

use std::fs::File;
use std::io::{self, Read};
use std::path::Path;
use xxhash_rust::xxh3::Xxh3;

/// Length of a rendered content hash.
pub const HASH_LEN: usize = 16;

const BUF_SIZE: usize = 64 * 1024;

/// Incremental content hasher that also counts the bytes it has seen.
pub struct ContentHasher {
    inner: Xxh3,
    len: u64,
}

impl Default for ContentHasher {
    fn default() -> Self {
        Self::new()
    }
}

impl ContentHasher {
    pub fn new() -> Self {
        Self {
            inner: Xxh3::new(),
            len: 0,
        }
    }

    pub fn update(&mut self, data: &[u8]) {
        self.inner.update(data);
        self.len += data.len() as u64;
    }

    /// Number of bytes hashed so far.
    pub fn len(&self) -> u64 {
        self.len
    }

    pub fn is_empty(&self) -> bool {
        self.len == 0
    }

    pub fn finish(&self) -> String {
        format!("{:016x}", self.inner.digest())
    }
}

pub fn hash_bytes(data: &[u8]) -> String {
    let mut hasher = ContentHasher::new();
    hasher.update(data);
    hasher.finish()
}

/// Streams `reader` through the hasher in fixed-size buffers.
///
/// Returns the digest and the number of bytes read.
pub fn hash_reader<R: Read>(mut reader: R) -> io::Result<(String, u64)> {
    let mut hasher = ContentHasher::new();
    let mut buf = vec![0u8; BUF_SIZE];
    loop {
        let n = match reader.read(&mut buf) {
            Ok(0) => break,
            Ok(n) => n,
            Err(e) if e.kind() == io::ErrorKind::Interrupted => continue,
            Err(e) => return Err(e),
        };
        hasher.update(&buf[..n]);
    }
    Ok((hasher.finish(), hasher.len()))
}

pub fn hash_file(path: &Path) -> io::Result<(String, u64)> {
    hash_reader(File::open(path)?)
}

/// Returns true for exactly 16 lowercase hex characters.
pub fn is_content_hash(s: &str) -> bool {
    s.len() == HASH_LEN && s.bytes().all(|b| matches!(b, b'0'..=b'9' | b'a'..=b'f'))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_input_matches_reference_digest() {
        assert_eq!(hash_bytes(b""), "2d06800538d394c2");
    }

    #[test]
    fn digest_is_fixed_width_lowercase_hex() {
        let inputs: [&[u8]; 3] = [b"hello", b"a", &[0u8; 10_000]];
        for input in inputs {
            let hash = hash_bytes(input);
            assert!(is_content_hash(&hash), "{hash}");
        }
    }

    #[test]
    fn streaming_matches_one_shot() {
        // Spans several read buffers.
        let data: Vec<u8> = (0..(BUF_SIZE * 3 + 17)).map(|i| (i % 251) as u8).collect();

        let (hash, len) = hash_reader(data.as_slice()).unwrap();

        assert_eq!(hash, hash_bytes(&data));
        assert_eq!(len, data.len() as u64);
    }

    #[test]
    fn split_updates_match_single_update() {
        let mut hasher = ContentHasher::new();
        hasher.update(b"hel");
        hasher.update(b"lo");

        assert_eq!(hasher.finish(), hash_bytes(b"hello"));
        assert_eq!(hasher.len(), 5);
    }

    #[test]
    fn rejects_malformed_hashes() {
        assert!(is_content_hash("0123456789abcdef"));
        assert!(!is_content_hash("0123456789ABCDEF"));
        assert!(!is_content_hash("0123456789abcde"));
        assert!(!is_content_hash("0123456789abcdefa"));
        assert!(!is_content_hash("../../etc/passwd"));
    }
}
