// ============================================
// File: crates/efris-core/src/crypto/compress.rs
// ============================================
//! # Lenient Gzip
//!
//! ## Creation Reason
//! Compressed gateway responses (`zipCode = "1"`) sometimes carry a few
//! junk bytes after the gzip trailer. A strict decoder rejects them, so
//! decompression retries with up to four trailing bytes stripped.
//!
//! ## ⚠️ Important Note for Next Developer
//! - A stream that decodes but leaves unconsumed input counts as a failure;
//!   otherwise junk of any length would be silently accepted
//! - Only a single gzip member is read
//!
//! ## Last Modified
//! v0.1.0 - Initial implementation

use std::io::Read;

use flate2::bufread::GzDecoder;
use tracing::debug;

use super::MAX_GZIP_TRAILING_JUNK;
use crate::error::{CoreError, Result};

/// Decompresses a gzip stream, tolerating 1..=4 junk trailing bytes.
///
/// # Errors
/// Returns `Decompress` with the last failure if no offset decodes cleanly.
pub fn gunzip_lenient(data: &[u8]) -> Result<Vec<u8>> {
    let mut last_error = String::from("empty input");

    for strip in 0..=MAX_GZIP_TRAILING_JUNK.min(data.len()) {
        match gunzip_exact(&data[..data.len() - strip]) {
            Ok(out) => {
                if strip > 0 {
                    debug!(stripped = strip, "Gzip stream decoded after stripping trailing bytes");
                }
                return Ok(out);
            }
            Err(e) => last_error = e,
        }
    }

    Err(CoreError::decompress(last_error))
}

/// Decodes one gzip member that must span the whole input.
fn gunzip_exact(data: &[u8]) -> std::result::Result<Vec<u8>, String> {
    let mut decoder = GzDecoder::new(data);
    let mut out = Vec::new();
    decoder.read_to_end(&mut out).map_err(|e| e.to_string())?;

    let rest = decoder.into_inner();
    if rest.is_empty() {
        Ok(out)
    } else {
        Err(format!("{} bytes left after gzip stream", rest.len()))
    }
}

// ============================================
// Tests
// ============================================
