//! Content hashing with sentinel outcomes.
//!
//! Staleness comparison needs "can't read it anymore" to be a first-class,
//! displayable status rather than a crash, so hashing never returns an
//! error: files that are absent or unreadable map to the [`FileHash`]
//! sentinels instead.

use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};
use std::path::Path;
use tokio::fs::File;
use tokio::io::AsyncReadExt;
use tracing::warn;

/// Wire spelling for a file that was absent at hash time.
pub const MISSING_SENTINEL: &str = "FILE_MISSING";

/// Wire spelling for a file that could not be read.
pub const READ_ERROR_SENTINEL: &str = "HASH_ERROR";

/// Read buffer size for streaming hashing.
const HASH_CHUNK_SIZE: usize = 8192;

/// Outcome of hashing a single file.
///
/// Serialized as a plain string: the lowercase hex digest, or one of the
/// sentinel spellings. The sentinels are part of the persisted snapshot
/// format and must not change.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub enum FileHash {
    /// SHA-256 of the full file content, lowercase hex.
    Digest(String),
    /// The file did not exist when hashed.
    Missing,
    /// The file existed but could not be read (permissions, etc.).
    ReadError,
}

impl FileHash {
    pub fn is_digest(&self) -> bool {
        matches!(self, FileHash::Digest(_))
    }
}

impl From<FileHash> for String {
    fn from(hash: FileHash) -> Self {
        match hash {
            FileHash::Digest(hex) => hex,
            FileHash::Missing => MISSING_SENTINEL.to_string(),
            FileHash::ReadError => READ_ERROR_SENTINEL.to_string(),
        }
    }
}

impl From<String> for FileHash {
    fn from(raw: String) -> Self {
        match raw.as_str() {
            MISSING_SENTINEL => FileHash::Missing,
            READ_ERROR_SENTINEL => FileHash::ReadError,
            _ => FileHash::Digest(raw),
        }
    }
}

/// Hash a file's full byte content, streaming in bounded-size chunks.
///
/// Never returns an error: an absent file yields [`FileHash::Missing`] and
/// any other I/O failure yields [`FileHash::ReadError`].
pub async fn hash_file(path: &Path) -> FileHash {
    let mut file = match File::open(path).await {
        Ok(f) => f,
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => return FileHash::Missing,
        Err(e) => {
            warn!(path = %path.display(), error = %e, "Failed to open file for hashing");
            return FileHash::ReadError;
        }
    };

    let mut hasher = Sha256::new();
    let mut buf = [0u8; HASH_CHUNK_SIZE];
    loop {
        match file.read(&mut buf).await {
            Ok(0) => break,
            Ok(n) => hasher.update(&buf[..n]),
            Err(e) => {
                warn!(path = %path.display(), error = %e, "Read failed while hashing");
                return FileHash::ReadError;
            }
        }
    }

    FileHash::Digest(hex::encode(hasher.finalize()))
}
