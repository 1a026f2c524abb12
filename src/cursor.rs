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

//! An in-memory, seekable byte buffer, the Rust analogue of the `BytesIO` the original
//! tooling rewinds to sniff the gzip magic and to splice the header back in front of
//! the (possibly recompressed) payload.

use std::io::{self, Read, Seek, SeekFrom, Write};

/// A growable byte buffer supporting random-access read/write, mirroring the handful
/// of `BytesIO` operations `FileCodec` needs: `tell`, `seek`, read-to-end, and append.
#[derive(Debug, Default, Clone)]
pub struct ByteCursor {
    buf: Vec<u8>,
    pos: usize,
}

impl ByteCursor {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn from_vec(buf: Vec<u8>) -> Self {
        Self { buf, pos: 0 }
    }

    pub fn into_inner(self) -> Vec<u8> {
        self.buf
    }

    pub fn get_ref(&self) -> &[u8] {
        &self.buf
    }

    pub fn tell(&self) -> usize {
        self.pos
    }

    pub fn len(&self) -> usize {
        self.buf.len()
    }

    pub fn is_empty(&self) -> bool {
        self.buf.is_empty()
    }

    /// Remaining bytes from the current position to the end, without moving the cursor.
    pub fn remaining(&self) -> &[u8] {
        &self.buf[self.pos.min(self.buf.len())..]
    }
}

impl Read for ByteCursor {
    fn read(&mut self, out: &mut [u8]) -> io::Result<usize> {
        let available = &self.buf[self.pos.min(self.buf.len())..];
        let n = available.len().min(out.len());
        out[..n].copy_from_slice(&available[..n]);
        self.pos += n;
        Ok(n)
    }
}

impl Write for ByteCursor {
    fn write(&mut self, data: &[u8]) -> io::Result<usize> {
        let end = self.pos + data.len();
        if end > self.buf.len() {
            self.buf.resize(end, 0);
        }
        self.buf[self.pos..end].copy_from_slice(data);
        self.pos = end;
        Ok(data.len())
    }

    fn flush(&mut self) -> io::Result<()> {
        Ok(())
    }
}

impl Seek for ByteCursor {
    fn seek(&mut self, pos: SeekFrom) -> io::Result<u64> {
        let new_pos = match pos {
            SeekFrom::Start(n) => n as i64,
            SeekFrom::End(n) => self.buf.len() as i64 + n,
            SeekFrom::Current(n) => self.pos as i64 + n,
        };
        if new_pos < 0 {
            return Err(io::Error::new(
                io::ErrorKind::InvalidInput,
                "seek to a negative position",
            ));
        }
        self.pos = new_pos as usize;
        Ok(self.pos as u64)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn writes_then_reads_back() {
        let mut cursor = ByteCursor::new();
        cursor.write_all(b"hello world").unwrap();
        cursor.seek(SeekFrom::Start(0)).unwrap();
        let mut out = Vec::new();
        cursor.read_to_end(&mut out).unwrap();
        assert_eq!(out, b"hello world");
    }

    #[test]
    fn tell_tracks_position_across_seeks() {
        let mut cursor = ByteCursor::from_vec(vec![1, 2, 3, 4, 5]);
        assert_eq!(cursor.tell(), 0);
        cursor.seek(SeekFrom::Current(2)).unwrap();
        assert_eq!(cursor.tell(), 2);
        cursor.seek(SeekFrom::End(-1)).unwrap();
        assert_eq!(cursor.tell(), 4);
        assert_eq!(cursor.remaining(), &[5]);
    }
}
