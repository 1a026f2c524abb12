// nrbf-parser - A high-performance MS-NRBF binary parser and encoder.
// Copyright (C) 2026  driedpampas@proton.me
//
// This program is free software: you can redistribute it and/or modify
// it under the terms of the GNU General Public License as published by
// the Free Software Foundation, either version 3 of the License, or
// (at your option) any later version.
//
// This program is distributed in the hope that it will be useful,
// but WITHOUT ANY WARRANTY; without even the implied warranty of
// MERCHANTABILITY or FITNESS FOR A PARTICULAR PURPOSE.  See the
// GNU General Public License for more details.
//
// You should have received a copy of the GNU General Public License
// along with this program.  If not, see <https://www.gnu.org/licenses/>.

//! Gzip wrapping used by `.udlg` payloads.
//!
//! Writers in the wild fix the gzip header's XFL/OS bytes (offset 8 and 9 of the
//! 10-byte frame) to `04 00` rather than whatever libdeflate/zlib happens to emit.
//! [`compress`] reproduces that fixed header byte-for-byte; [`decompress`] doesn't
//! care what's there since the gzip trailer's CRC/length is what's checked.

use crate::error::{Error, Result};
use flate2::Compression;
use flate2::read::GzDecoder;
use flate2::write::GzEncoder;
use std::io::{Read, Write};

/// Gzip magic bytes a payload starts with when compressed.
pub const GZIP_MAGIC: [u8; 2] = [0x1f, 0x8b];

pub fn is_gzip(bytes: &[u8]) -> bool {
    bytes.len() >= 2 && bytes[0] == GZIP_MAGIC[0] && bytes[1] == GZIP_MAGIC[1]
}

/// Compresses `data` into a gzip stream, then canonicalizes the XFL/OS header bytes
/// to `04 00` so the output matches what existing `.udlg` writers produce.
pub fn compress(data: &[u8]) -> Result<Vec<u8>> {
    let mut encoder = GzEncoder::new(Vec::new(), Compression::default());
    encoder.write_all(data)?;
    let mut compressed = encoder.finish()?;
    if compressed.len() >= 10 {
        compressed[8] = 0x04;
        compressed[9] = 0x00;
    }
    Ok(compressed)
}

/// Decompresses a gzip stream. The XFL/OS header bytes are ignored by the decoder,
/// so no canonicalization is needed on this side.
pub fn decompress(data: &[u8]) -> Result<Vec<u8>> {
    let mut decoder = GzDecoder::new(data);
    let mut out = Vec::new();
    decoder
        .read_to_end(&mut out)
        .map_err(|e| Error::DecompressionError(e.to_string()))?;
    Ok(out)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn round_trips_through_compress_and_decompress() {
        let original = b"the quick brown fox jumps over the lazy dog".repeat(8);
        let compressed = compress(&original).unwrap();
        assert!(is_gzip(&compressed));
        let decompressed = decompress(&compressed).unwrap();
        assert_eq!(decompressed, original);
    }

    #[test]
    fn canonicalizes_xfl_and_os_bytes() {
        let compressed = compress(b"hello udlg").unwrap();
        assert_eq!(compressed[8], 0x04);
        assert_eq!(compressed[9], 0x00);
    }

    #[test]
    fn detects_gzip_magic() {
        assert!(is_gzip(&[0x1f, 0x8b, 0x08]));
        assert!(!is_gzip(&[0x00, 0x00]));
        assert!(!is_gzip(&[0x1f]));
    }
}
