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

use std::io;
use thiserror::Error;

/// Result type for NRBF parsing.
pub type Result<T> = std::result::Result<T, Error>;

#[derive(Error, Debug)]

pub enum Error {
    #[error("IO error: {0}")]
    Io(#[from] io::Error),

    #[error("Unsupported record type: {0}")]
    UnsupportedRecord(u8),

    #[error("Invalid binary type: {0}")]
    InvalidBinaryType(u8),

    #[error("Unsupported primitive type: {0}")]
    UnsupportedPrimitive(u8),

    #[error("Invalid UTF-8 string")]
    InvalidUtf8(#[from] std::string::FromUtf8Error),

    #[error("Invalid length-prefixed string: {0}")]
    InvalidStringLength(i32),

    #[error("7-bit encoded length exceeds 5 bytes")]
    InvalidVarint,

    #[error("file does not begin with the expected UDLG signature")]
    BadSignature,

    #[error("unsupported array shape: only rank-1 Single arrays are supported")]
    UnsupportedArrayShape,

    #[error("metadata id {0} does not resolve to a prior class record")]
    UnresolvedMetadata(i32),

    #[error("null run overruns declared array/member length")]
    ArrayOverrun,

    #[error("gzip decompression failed: {0}")]
    DecompressionError(String),

    #[error("Custom error: {0}")]
    Custom(String),
}
