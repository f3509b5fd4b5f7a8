use crate::StoreError;
use fwsync_schema::Sha256Hex;
use sha2::{Digest, Sha256};
use std::fs::File;
use std::io::{ErrorKind, Read};
use std::path::Path;

/// Read size used when streaming artifacts through the hasher.
pub const HASH_CHUNK_SIZE: usize = 64 * 1024;

/// SHA-256 digest and byte length of one artifact.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FileDigest {
    pub sha256: Sha256Hex,
    pub size: u64,
}

/// Hash a file in fixed-size chunks; the file is never loaded whole.
pub fn digest_file(path: &Path) -> Result<FileDigest, StoreError> {
    let file = File::open(path)?;
    digest_reader(file)
}

pub fn digest_reader(mut reader: impl Read) -> Result<FileDigest, StoreError> {
    let mut hasher = Sha256::new();
    let mut buf = vec![0u8; HASH_CHUNK_SIZE];
    let mut size: u64 = 0;
    loop {
        let read = match reader.read(&mut buf) {
            Ok(0) => break,
            Ok(n) => n,
            Err(e) if e.kind() == ErrorKind::Interrupted => continue,
            Err(e) => return Err(e.into()),
        };
        hasher.update(&buf[..read]);
        size += read as u64;
    }
    Ok(FileDigest {
        sha256: Sha256Hex::new(format!("{:x}", hasher.finalize())),
        size,
    })
}
