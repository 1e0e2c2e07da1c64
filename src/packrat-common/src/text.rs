//! Text-file sniffing.
//!
//! Binary files are excluded from content tracking because their bytes do
//! not affect the rendered artifact. The probe reads a bounded prefix and
//! never fails: anything unreadable is treated as non-text.

use std::fs::File;
use std::io::Read;
use std::path::Path;

/// How many leading bytes are inspected when classifying a file.
pub const TEXT_CHECK_CHUNK_SIZE: usize = 1024;

/// Returns true if the file looks like text.
///
/// A NUL byte in the leading chunk classifies the file as binary. The
/// chunk must otherwise decode as UTF-8; a multi-byte sequence cut off by
/// the chunk boundary still counts as valid.
pub fn is_text_file(path: &Path) -> bool {
    let mut file = match File::open(path) {
        Ok(f) => f,
        Err(_) => return false,
    };

    let mut chunk = [0u8; TEXT_CHECK_CHUNK_SIZE];
    let read = match file.read(&mut chunk) {
        Ok(n) => n,
        Err(_) => return false,
    };
    let chunk = &chunk[..read];

    if chunk.contains(&0) {
        return false;
    }

    match std::str::from_utf8(chunk) {
        Ok(_) => true,
        // error_len() == None means the chunk ends mid-sequence, which is
        // expected when the boundary splits a multi-byte character.
        Err(e) => e.error_len().is_none(),
    }
}
