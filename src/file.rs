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

//! Top-level `.udlg` container: a fixed 24-byte header in front of a record stream
//! that is either raw or gzip-wrapped.

use crate::compression;
use crate::cursor::ByteCursor;
use crate::decoder::Decoder;
use crate::encoder::Encoder;
use crate::error::{Error, Result};
use crate::graph::GraphStore;
use crate::records::Record;
use std::io::{Read, Write};

/// Fixed 16-byte signature every `.udlg` file begins with.
pub const SIGNATURE: [u8; 16] = [
    0xF9, 0x53, 0x8B, 0x83, 0x1F, 0x36, 0x32, 0x43, 0xBA, 0xAE, 0x0D, 0x17, 0x86, 0x5D, 0x08, 0x54,
];

const HEADER_LEN: usize = 8;

/// Returns true iff `bytes` begins with the fixed UDLG signature. Usable without
/// constructing a [`File`] — e.g. to let directory-walking tooling skip other files.
pub fn is_udlg(bytes: &[u8]) -> bool {
    bytes.len() >= SIGNATURE.len() && bytes[..SIGNATURE.len()] == SIGNATURE
}

/// A decoded `.udlg` file: the opaque 8-byte header, the record graph, and whether the
/// payload was gzip-compressed on disk.
#[derive(Debug, Clone)]
pub struct File {
    pub header: [u8; HEADER_LEN],
    pub records: GraphStore,
    pub compressed: bool,
}

impl File {
    /// Parses a complete `.udlg` file from `bytes`.
    pub fn parse(bytes: &[u8]) -> Result<Self> {
        if !is_udlg(bytes) {
            return Err(Error::BadSignature);
        }

        let mut cursor = ByteCursor::from_vec(bytes.to_vec());
        let mut sig = [0u8; SIGNATURE.len()];
        cursor.read_exact(&mut sig)?;

        let mut header = [0u8; HEADER_LEN];
        cursor.read_exact(&mut header)?;

        let payload = cursor.remaining().to_vec();
        let (payload, compressed) = if compression::is_gzip(&payload) {
            (compression::decompress(&payload)?, true)
        } else {
            (payload, false)
        };

        let mut decoder = Decoder::new(payload.as_slice());
        let mut records = GraphStore::new();
        loop {
            match decoder.decode_next()? {
                Some(record) => {
                    let is_end = matches!(record, Record::MessageEnd);
                    records.push(record);
                    if is_end {
                        break;
                    }
                }
                None => break,
            }
        }

        Ok(Self {
            header,
            records,
            compressed,
        })
    }

    /// Encodes this file back into its on-disk byte representation.
    pub fn encode(&self) -> Result<Vec<u8>> {
        let mut payload = ByteCursor::new();
        let mut encoder = Encoder::new(&mut payload);
        for record in self.records.records() {
            encoder.encode(record)?;
        }
        let payload = payload.into_inner();
        let payload = if self.compressed {
            compression::compress(&payload)?
        } else {
            payload
        };

        let mut out = ByteCursor::new();
        out.write_all(&SIGNATURE)?;
        out.write_all(&self.header)?;
        out.write_all(&payload)?;
        Ok(out.into_inner())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::records::SerializationHeader;

    fn minimal_records() -> Vec<Record> {
        vec![
            Record::SerializationHeader(SerializationHeader {
                root_id: 1,
                header_id: -1,
                major_version: 1,
                minor_version: 0,
            }),
            Record::MessageEnd,
        ]
    }

    #[test]
    fn rejects_files_without_the_signature() {
        let bytes = vec![0u8; 32];
        assert!(matches!(File::parse(&bytes), Err(Error::BadSignature)));
    }

    #[test]
    fn round_trips_an_uncompressed_file() {
        let file = File {
            header: [1, 2, 3, 4, 5, 6, 7, 8],
            records: minimal_records().into_iter().collect(),
            compressed: false,
        };
        let encoded = file.encode().unwrap();
        assert!(is_udlg(&encoded));

        let decoded = File::parse(&encoded).unwrap();
        assert_eq!(decoded.header, file.header);
        assert!(!decoded.compressed);
        assert_eq!(decoded.records.len(), file.records.len());
    }

    #[test]
    fn round_trips_a_compressed_file() {
        let file = File {
            header: [0; 8],
            records: minimal_records().into_iter().collect(),
            compressed: true,
        };
        let encoded = file.encode().unwrap();
        let decoded = File::parse(&encoded).unwrap();
        assert!(decoded.compressed);
        assert_eq!(decoded.records.len(), file.records.len());
    }
}
