// src/cache/signature.rs

use std::fmt;
use std::fs::File;
use std::io::Read;
use std::path::Path;

/// A cheap content fingerprint used to detect change: a blake3 hash of the
/// input bytes. Unchanged input produces an identical signature; any content
/// change produces a different one.
#[derive(Clone, Copy, PartialEq, Eq, Hash, Default)]
pub struct Signature([u8; 32]);

impl Signature {
    pub fn of_bytes(buffer: impl AsRef<[u8]>) -> Self {
        Signature(
            blake3::Hasher::new()
                .update(buffer.as_ref())
                .finalize()
                .into(),
        )
    }

    pub fn of_file(path: impl AsRef<Path>) -> std::io::Result<Self> {
        let mut hasher = blake3::Hasher::new();
        let mut file = File::open(path)?;
        let mut buf = [0u8; 8192];
        loop {
            let n = file.read(&mut buf)?;
            if n == 0 {
                break;
            }
            hasher.update(&buf[..n]);
        }
        Ok(Signature(hasher.finalize().into()))
    }

    /// Parse the hex form produced by `to_hex`.
    pub fn from_hex(s: &str) -> Option<Self> {
        if s.len() != 64 {
            return None;
        }
        let mut bytes = [0u8; 32];
        for (i, chunk) in s.as_bytes().chunks(2).enumerate() {
            let hi = (chunk[0] as char).to_digit(16)?;
            let lo = (chunk[1] as char).to_digit(16)?;
            bytes[i] = ((hi << 4) | lo) as u8;
        }
        Some(Signature(bytes))
    }

    pub fn to_hex(self) -> String {
        const HEX: &[u8; 16] = b"0123456789abcdef";
        let mut acc = vec![0u8; 64];

        for (i, &byte) in self.0.iter().enumerate() {
            acc[i * 2] = HEX[(byte >> 4) as usize];
            acc[i * 2 + 1] = HEX[(byte & 0xF) as usize];
        }

        String::from_utf8(acc).expect("hex output is always ascii")
    }
}

impl fmt::Debug for Signature {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Signature({})", self.to_hex())
    }
}

impl fmt::Display for Signature {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.to_hex())
    }
}
