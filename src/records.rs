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

use crate::error::Result;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum RecordType {
    SerializedStreamHeader = 0,
    ClassWithId = 1,
    SystemClassWithMembers = 2,
    ClassWithMembers = 3,
    SystemClassWithMembersAndTypes = 4,
    ClassWithMembersAndTypes = 5,
    BinaryObjectString = 6,
    BinaryArray = 7,
    MemberPrimitiveTyped = 8,
    MemberReference = 9,
    ObjectNull = 10,
    MessageEnd = 11,
    BinaryLibrary = 12,
    ObjectNullMultiple256 = 13,
    ObjectNullMultiple = 14,
    ArraySinglePrimitive = 15,
    ArraySingleObject = 16,
    ArraySingleString = 17,
    BinaryMethodCall = 21,
    BinaryMethodReturn = 22,
}

impl TryFrom<u8> for RecordType {
    type Error = crate::error::Error;

    fn try_from(value: u8) -> Result<Self> {
        match value {
            0 => Ok(RecordType::SerializedStreamHeader),
            1 => Ok(RecordType::ClassWithId),
            2 => Ok(RecordType::SystemClassWithMembers),
            3 => Ok(RecordType::ClassWithMembers),
            4 => Ok(RecordType::SystemClassWithMembersAndTypes),
            5 => Ok(RecordType::ClassWithMembersAndTypes),
            6 => Ok(RecordType::BinaryObjectString),
            7 => Ok(RecordType::BinaryArray),
            8 => Ok(RecordType::MemberPrimitiveTyped),
            9 => Ok(RecordType::MemberReference),
            10 => Ok(RecordType::ObjectNull),
            11 => Ok(RecordType::MessageEnd),
            12 => Ok(RecordType::BinaryLibrary),
            13 => Ok(RecordType::ObjectNullMultiple256),
            14 => Ok(RecordType::ObjectNullMultiple),
            15 => Ok(RecordType::ArraySinglePrimitive),
            16 => Ok(RecordType::ArraySingleObject),
            17 => Ok(RecordType::ArraySingleString),
            21 => Ok(RecordType::BinaryMethodCall),
            22 => Ok(RecordType::BinaryMethodReturn),
            _ => Err(crate::error::Error::UnsupportedRecord(value)),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum BinaryType {
    Primitive = 0,
    String = 1,
    Object = 2,
    SystemClass = 3,
    Class = 4,
    ObjectArray = 5,
    StringArray = 6,
    PrimitiveArray = 7,
}

impl TryFrom<u8> for BinaryType {
    type Error = crate::error::Error;

    fn try_from(value: u8) -> Result<Self> {
        match value {
            0 => Ok(BinaryType::Primitive),
            1 => Ok(BinaryType::String),
            2 => Ok(BinaryType::Object),
            3 => Ok(BinaryType::SystemClass),
            4 => Ok(BinaryType::Class),
            5 => Ok(BinaryType::ObjectArray),
            6 => Ok(BinaryType::StringArray),
            7 => Ok(BinaryType::PrimitiveArray),
            _ => Err(crate::error::Error::InvalidBinaryType(value)),
        }
    }
}

/// Shape of a `BinaryArray` record. Decoding only accepts `Single` with rank 1; every
/// other combination is rejected by `Decoder::read_binary_array_full` with
/// `UnsupportedArrayShape`. Encoding does not re-check the shape.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum BinaryArrayType {
    Single = 0,
    Jagged = 1,
    Rectangular = 2,
    SingleOffset = 3,
    JaggedOffset = 4,
    RectangularOffset = 5,
}

impl TryFrom<u8> for BinaryArrayType {
    type Error = crate::error::Error;

    fn try_from(value: u8) -> Result<Self> {
        match value {
            0 => Ok(BinaryArrayType::Single),
            1 => Ok(BinaryArrayType::Jagged),
            2 => Ok(BinaryArrayType::Rectangular),
            3 => Ok(BinaryArrayType::SingleOffset),
            4 => Ok(BinaryArrayType::JaggedOffset),
            5 => Ok(BinaryArrayType::RectangularOffset),
            _ => Err(crate::error::Error::InvalidBinaryType(value)),
        }
    }
}

impl BinaryArrayType {
    pub fn has_lower_bounds(self) -> bool {
        matches!(
            self,
            BinaryArrayType::SingleOffset
                | BinaryArrayType::JaggedOffset
                | BinaryArrayType::RectangularOffset
        )
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum PrimitiveType {
    Boolean = 1,
    Byte = 2,
    Char = 3,
    Decimal = 5,
    Double = 6,
    Int16 = 7,
    Int32 = 8,
    Int64 = 9,
    SByte = 10,
    Single = 11,
    TimeSpan = 12,
    DateTime = 13,
    UInt16 = 14,
    UInt32 = 15,
    UInt64 = 16,
    Null = 17,
    String = 18,
}

impl TryFrom<u8> for PrimitiveType {
    type Error = crate::error::Error;

    fn try_from(value: u8) -> Result<Self> {
        match value {
            1 => Ok(PrimitiveType::Boolean),
            2 => Ok(PrimitiveType::Byte),
            3 => Ok(PrimitiveType::Char),
            5 => Ok(PrimitiveType::Decimal),
            6 => Ok(PrimitiveType::Double),
            7 => Ok(PrimitiveType::Int16),
            8 => Ok(PrimitiveType::Int32),
            9 => Ok(PrimitiveType::Int64),
            10 => Ok(PrimitiveType::SByte),
            11 => Ok(PrimitiveType::Single),
            12 => Ok(PrimitiveType::TimeSpan),
            13 => Ok(PrimitiveType::DateTime),
            14 => Ok(PrimitiveType::UInt16),
            15 => Ok(PrimitiveType::UInt32),
            16 => Ok(PrimitiveType::UInt64),
            17 => Ok(PrimitiveType::Null),
            18 => Ok(PrimitiveType::String),
            _ => Err(crate::error::Error::UnsupportedPrimitive(value)),
        }
    }
}

/// Low two bits of a serialized DateTime's raw tick count. Both bits set is not
/// produced by any known writer but is accepted on decode: Utc wins.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum DateTimeKind {
    Unspecified,
    Utc,
    Local,
}

impl DateTimeKind {
    fn from_bits(raw: i64) -> Self {
        match raw & 0x3 {
            0 => DateTimeKind::Unspecified,
            2 => DateTimeKind::Local,
            _ => DateTimeKind::Utc,
        }
    }

    fn bits(self) -> i64 {
        match self {
            DateTimeKind::Unspecified => 0,
            DateTimeKind::Utc => 1,
            DateTimeKind::Local => 2,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct DateTimeValue {
    pub kind: DateTimeKind,
    pub ticks: i64,
}

impl DateTimeValue {
    pub fn from_raw(raw: i64) -> Self {
        Self {
            kind: DateTimeKind::from_bits(raw),
            ticks: raw & !0x3,
        }
    }

    pub fn to_raw(self) -> i64 {
        self.ticks | self.kind.bits()
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SerializationHeader {
    pub root_id: i32,
    pub header_id: i32,
    pub major_version: i32,
    pub minor_version: i32,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BinaryLibrary {
    pub library_id: i32,
    pub library_name: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ClassInfo {
    pub object_id: i32,
    pub name: String,
    pub member_count: i32,
    pub member_names: Vec<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ClassWithMembersAndTypes {
    pub class_info: ClassInfo,
    pub member_type_info: MemberTypeInfo,
    pub library_id: i32,
    pub member_values: Vec<ObjectValue>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SystemClassWithMembersAndTypes {
    pub class_info: ClassInfo,
    pub member_type_info: MemberTypeInfo,
    pub member_values: Vec<ObjectValue>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MemberTypeInfo {
    pub binary_type_enums: Vec<BinaryType>,
    pub additional_infos: Vec<AdditionalTypeInfo>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub enum AdditionalTypeInfo {
    Primitive(PrimitiveType),
    SystemClass(String),
    Class(ClassTypeInfo),
    None,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ClassTypeInfo {
    pub type_name: String,
    pub library_id: i32,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub enum ObjectValue {
    Primitive(PrimitiveValue),
    Record(Box<Record>),
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub enum PrimitiveValue {
    Boolean(bool),
    Byte(u8),
    /// Decoded as a 7-bit length-prefixed UTF-8 string rather than a single UTF-16 code
    /// unit; kept distinct from `String` so the originating `PrimitiveType` tag survives
    /// a round trip through the record tree.
    Char(String),
    Decimal(String),
    Double(f64),
    Int16(i16),
    Int32(i32),
    Int64(i64),
    SByte(i8),
    Single(f32),
    TimeSpan(i64),
    DateTime(DateTimeValue),
    UInt16(u16),
    UInt32(u32),
    UInt64(u64),
    String(String),
    Null,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ValueWithCode {
    pub primitive_type_enum: PrimitiveType,
    pub value: PrimitiveValue,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SystemClassWithMembers {
    pub class_info: ClassInfo,
    pub member_values: Vec<ObjectValue>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ClassWithMembers {
    pub class_info: ClassInfo,
    pub library_id: i32,
    pub member_values: Vec<ObjectValue>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ObjectNullMultiple {
    pub null_count: i32,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ObjectNullMultiple256 {
    pub null_count: u8,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BinaryArray {
    pub object_id: i32,
    pub binary_array_type_enum: BinaryArrayType,
    pub rank: i32,
    pub lengths: Vec<i32>,
    pub lower_bounds: Option<Vec<i32>>,
    pub type_enum: BinaryType,
    pub additional_type_info: AdditionalTypeInfo,
    pub element_values: Vec<ObjectValue>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ArraySingleObject {
    pub object_id: i32,
    pub length: i32,
    pub element_values: Vec<ObjectValue>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ArraySinglePrimitive {
    pub object_id: i32,
    pub length: i32,
    pub primitive_type_enum: PrimitiveType,
    pub element_values: Vec<PrimitiveValue>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ArraySingleString {
    pub object_id: i32,
    pub length: i32,
    pub element_values: Vec<ObjectValue>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ClassWithId {
    pub object_id: i32,
    pub metadata_id: i32,
    pub member_values: Vec<ObjectValue>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub enum Record {
    SerializationHeader(SerializationHeader),
    BinaryLibrary(BinaryLibrary),
    ClassWithMembersAndTypes(ClassWithMembersAndTypes),
    SystemClassWithMembersAndTypes(SystemClassWithMembersAndTypes),
    SystemClassWithMembers(SystemClassWithMembers),
    ClassWithMembers(ClassWithMembers),
    ClassWithId(ClassWithId),
    BinaryObjectString {
        object_id: i32,
        value: String,
    },
    BinaryArray(BinaryArray),
    ArraySingleObject(ArraySingleObject),
    ArraySinglePrimitive(ArraySinglePrimitive),
    ArraySingleString(ArraySingleString),
    MemberPrimitiveTyped {
        primitive_type_enum: PrimitiveType,
        value: PrimitiveValue,
    },
    MemberReference {
        id_ref: i32,
    },
    ObjectNull,
    ObjectNullMultiple(ObjectNullMultiple),
    ObjectNullMultiple256(ObjectNullMultiple256),
    MessageEnd,
}

impl Record {
    /// The object id this record introduces, if any. Used by `GraphStore` to index
    /// records for later `MemberReference` / `ClassWithId::metadata_id` lookups.
    pub fn object_id(&self) -> Option<i32> {
        match self {
            Record::BinaryObjectString { object_id, .. } => Some(*object_id),
            Record::BinaryArray(a) => Some(a.object_id),
            Record::ArraySingleObject(a) => Some(a.object_id),
            Record::ArraySinglePrimitive(a) => Some(a.object_id),
            Record::ArraySingleString(a) => Some(a.object_id),
            Record::ClassWithId(c) => Some(c.object_id),
            Record::ClassWithMembersAndTypes(c) => Some(c.class_info.object_id),
            Record::SystemClassWithMembersAndTypes(c) => Some(c.class_info.object_id),
            Record::ClassWithMembers(c) => Some(c.class_info.object_id),
            Record::SystemClassWithMembers(c) => Some(c.class_info.object_id),
            _ => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn record_type_round_trips_through_its_tag_byte() {
        for tag in [
            0u8, 1, 2, 3, 4, 5, 6, 7, 8, 9, 10, 11, 12, 13, 14, 15, 16, 17, 21, 22,
        ] {
            let rt = RecordType::try_from(tag).unwrap();
            assert_eq!(rt as u8, tag);
        }
        assert!(RecordType::try_from(18).is_err());
        assert!(RecordType::try_from(255).is_err());
    }

    #[test]
    fn primitive_type_rejects_unknown_kinds() {
        assert!(PrimitiveType::try_from(4).is_err());
        assert!(PrimitiveType::try_from(0).is_err());
        assert!(PrimitiveType::try_from(19).is_err());
    }

    #[test]
    fn datetime_bits_pack_and_unpack() {
        for (kind, bits) in [
            (DateTimeKind::Unspecified, 0i64),
            (DateTimeKind::Utc, 1),
            (DateTimeKind::Local, 2),
        ] {
            let value = DateTimeValue {
                kind,
                ticks: 123_456_789 << 2,
            };
            assert_eq!(value.to_raw() & 0x3, bits);
            assert_eq!(DateTimeValue::from_raw(value.to_raw()), value);
        }
    }

    #[test]
    fn object_id_extraction_covers_every_id_bearing_variant() {
        let class_info = ClassInfo {
            object_id: 9,
            name: "T".into(),
            member_count: 0,
            member_names: vec![],
        };
        assert_eq!(
            Record::BinaryObjectString {
                object_id: 1,
                value: "x".into()
            }
            .object_id(),
            Some(1)
        );
        assert_eq!(
            Record::ClassWithId(ClassWithId {
                object_id: 2,
                metadata_id: 9,
                member_values: vec![],
            })
            .object_id(),
            Some(2)
        );
        assert_eq!(
            Record::ClassWithMembers(ClassWithMembers {
                class_info,
                library_id: 1,
                member_values: vec![],
            })
            .object_id(),
            Some(9)
        );
        assert_eq!(Record::MessageEnd.object_id(), None);
        assert_eq!(Record::ObjectNull.object_id(), None);
    }
}
