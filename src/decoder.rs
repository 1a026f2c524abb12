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

use crate::error::{Error, Result};
use crate::records::*;
use std::collections::HashMap;
use std::io::Read;

/// A decoder for MS-NRBF binary streams.
pub struct Decoder<R: Read> {
    reader: R,
    metadata_registry: HashMap<i32, ClassInfoWithTypes>,
    /// Registry of libraries by ID.
    pub library_registry: HashMap<i32, String>,
    /// Current offset in the stream.
    pub offset: usize,
}

/// Metadata for a class including its types if available.
#[derive(Clone)]
pub struct ClassInfoWithTypes {
    pub class_info: ClassInfo,
    pub member_type_info: Option<MemberTypeInfo>,
    pub library_id: Option<i32>,
}

impl<R: Read> Decoder<R> {
    /// Creates a new decoder from a reader.
    pub fn new(reader: R) -> Self {
        Self {
            reader,
            metadata_registry: HashMap::new(),
            library_registry: HashMap::new(),
            offset: 0,
        }
    }

    /// Decodes the next record from the stream.
    ///
    /// Returns `Ok(Some(record))` if a record was successfully read,
    /// `Ok(None)` if the end of the stream was reached,
    /// or an `Err` if parsing failed.
    pub fn decode_next(&mut self) -> Result<Option<Record>> {
        let mut header = [0u8; 1];
        if self.reader.read_exact(&mut header).is_err() {
            return Ok(None);
        }
        self.offset += 1;

        let record_type = RecordType::try_from(header[0])?;
        match record_type {
            RecordType::SerializedStreamHeader => {
                let rec = self.read_serialization_header()?;
                Ok(Some(Record::SerializationHeader(rec)))
            }
            RecordType::BinaryLibrary => {
                let lib = self.read_binary_library()?;
                self.library_registry
                    .insert(lib.library_id, lib.library_name.clone());
                Ok(Some(Record::BinaryLibrary(lib)))
            }
            RecordType::ClassWithMembersAndTypes => {
                let rec = self.read_class_with_members_and_types()?;
                Ok(Some(Record::ClassWithMembersAndTypes(rec)))
            }
            RecordType::SystemClassWithMembersAndTypes => {
                let rec = self.read_system_class_with_members_and_types()?;
                Ok(Some(Record::SystemClassWithMembersAndTypes(rec)))
            }
            RecordType::SystemClassWithMembers => {
                let rec = self.read_system_class_with_members()?;
                Ok(Some(Record::SystemClassWithMembers(rec)))
            }
            RecordType::ClassWithMembers => {
                let rec = self.read_class_with_members()?;
                Ok(Some(Record::ClassWithMembers(rec)))
            }
            RecordType::ClassWithId => {
                let rec = self.read_class_with_id()?;
                Ok(Some(Record::ClassWithId(rec)))
            }
            RecordType::BinaryObjectString => {
                let object_id = self.read_i32()?;
                let value = self.read_length_prefixed_string()?;
                Ok(Some(Record::BinaryObjectString { object_id, value }))
            }
            RecordType::BinaryArray => {
                let rec = self.read_binary_array_full()?;
                Ok(Some(Record::BinaryArray(rec)))
            }
            RecordType::MemberPrimitiveTyped => {
                let pt = PrimitiveType::try_from(self.read_u8()?)?;
                let value = self.read_primitive_value(pt)?;
                Ok(Some(Record::MemberPrimitiveTyped {
                    primitive_type_enum: pt,
                    value,
                }))
            }
            RecordType::MemberReference => Ok(Some(Record::MemberReference {
                id_ref: self.read_i32()?,
            })),
            RecordType::ObjectNull => Ok(Some(Record::ObjectNull)),
            RecordType::ObjectNullMultiple256 => {
                Ok(Some(Record::ObjectNullMultiple256(ObjectNullMultiple256 {
                    null_count: self.read_u8()?,
                })))
            }
            RecordType::ObjectNullMultiple => {
                Ok(Some(Record::ObjectNullMultiple(ObjectNullMultiple {
                    null_count: self.read_i32()?,
                })))
            }
            RecordType::ArraySinglePrimitive => {
                let object_id = self.read_i32()?;
                let length = self.read_i32()?;
                let pt = PrimitiveType::try_from(self.read_u8()?)?;
                let mut values = Vec::with_capacity(length as usize);
                for _ in 0..length {
                    values.push(self.read_primitive_value(pt)?);
                }
                Ok(Some(Record::ArraySinglePrimitive(ArraySinglePrimitive {
                    object_id,
                    length,
                    primitive_type_enum: pt,
                    element_values: values,
                })))
            }
            RecordType::ArraySingleObject => {
                let object_id = self.read_i32()?;
                let length = self.read_i32()?;
                let values =
                    self.read_all_elements(length, BinaryType::Object, &AdditionalTypeInfo::None)?;
                Ok(Some(Record::ArraySingleObject(ArraySingleObject {
                    object_id,
                    length,
                    element_values: values,
                })))
            }
            RecordType::ArraySingleString => {
                let object_id = self.read_i32()?;
                let length = self.read_i32()?;
                let values =
                    self.read_all_elements(length, BinaryType::String, &AdditionalTypeInfo::None)?;
                Ok(Some(Record::ArraySingleString(ArraySingleString {
                    object_id,
                    length,
                    element_values: values,
                })))
            }
            RecordType::MessageEnd => Ok(Some(Record::MessageEnd)),
            RecordType::BinaryMethodCall | RecordType::BinaryMethodReturn => {
                Err(Error::UnsupportedRecord(header[0]))
            }
        }
    }

    fn read_i32(&mut self) -> Result<i32> {
        let mut buf = [0u8; 4];
        self.reader.read_exact(&mut buf)?;
        self.offset += 4;
        Ok(i32::from_le_bytes(buf))
    }

    fn read_u8(&mut self) -> Result<u8> {
        let mut buf = [0u8; 1];
        self.reader.read_exact(&mut buf)?;
        self.offset += 1;
        Ok(buf[0])
    }

    fn read_serialization_header(&mut self) -> Result<SerializationHeader> {
        Ok(SerializationHeader {
            root_id: self.read_i32()?,
            header_id: self.read_i32()?,
            major_version: self.read_i32()?,
            minor_version: self.read_i32()?,
        })
    }

    fn read_binary_library(&mut self) -> Result<BinaryLibrary> {
        Ok(BinaryLibrary {
            library_id: self.read_i32()?,
            library_name: self.read_length_prefixed_string()?,
        })
    }

    fn read_length_prefixed_string(&mut self) -> Result<String> {
        let length = self.read_variable_length_int()?;
        if length < 0 {
            return Err(Error::InvalidStringLength(length));
        }
        if length == 0 {
            return Ok(String::new());
        }
        let mut buf = vec![0u8; length as usize];
        self.reader.read_exact(&mut buf)?;
        self.offset += length as usize;
        Ok(String::from_utf8(buf)?)
    }

    fn read_variable_length_int(&mut self) -> Result<i32> {
        let mut value: i32 = 0;
        let mut shift = 0;
        loop {
            let b = self.read_u8()?;
            value |= ((b & 0x7F) as i32) << shift;
            if (b & 0x80) == 0 {
                break;
            }
            shift += 7;
            if shift >= 35 {
                return Err(Error::InvalidVarint);
            }
        }
        Ok(value)
    }

    fn read_class_info(&mut self) -> Result<ClassInfo> {
        let object_id = self.read_i32()?;
        let name = self.read_length_prefixed_string()?;
        let member_count = self.read_i32()?;
        let mut member_names = Vec::with_capacity(member_count as usize);
        for _ in 0..member_count {
            member_names.push(self.read_length_prefixed_string()?);
        }
        Ok(ClassInfo {
            object_id,
            name,
            member_count,
            member_names,
        })
    }

    fn read_member_type_info(&mut self, count: i32) -> Result<MemberTypeInfo> {
        let mut binary_type_enums = Vec::with_capacity(count as usize);
        for _ in 0..count {
            binary_type_enums.push(BinaryType::try_from(self.read_u8()?)?);
        }

        let mut additional_infos = Vec::with_capacity(count as usize);
        for i in 0..count {
            let bt = binary_type_enums[i as usize];
            let info = match bt {
                BinaryType::Primitive => {
                    AdditionalTypeInfo::Primitive(PrimitiveType::try_from(self.read_u8()?)?)
                }
                BinaryType::SystemClass => {
                    AdditionalTypeInfo::SystemClass(self.read_length_prefixed_string()?)
                }
                BinaryType::Class => AdditionalTypeInfo::Class(ClassTypeInfo {
                    type_name: self.read_length_prefixed_string()?,
                    library_id: self.read_i32()?,
                }),
                _ => AdditionalTypeInfo::None,
            };
            additional_infos.push(info);
        }

        Ok(MemberTypeInfo {
            binary_type_enums,
            additional_infos,
        })
    }

    fn read_class_with_members_and_types(&mut self) -> Result<ClassWithMembersAndTypes> {
        let class_info = self.read_class_info()?;
        let member_type_info = self.read_member_type_info(class_info.member_count)?;
        let library_id = self.read_i32()?;

        self.metadata_registry.insert(
            class_info.object_id,
            ClassInfoWithTypes {
                class_info: class_info.clone(),
                member_type_info: Some(member_type_info.clone()),
                library_id: Some(library_id),
            },
        );

        let member_values = self.read_all_member_values(&class_info, &member_type_info)?;
        Ok(ClassWithMembersAndTypes {
            class_info,
            member_type_info,
            library_id,
            member_values,
        })
    }

    fn read_system_class_with_members_and_types(
        &mut self,
    ) -> Result<SystemClassWithMembersAndTypes> {
        let class_info = self.read_class_info()?;
        let member_type_info = self.read_member_type_info(class_info.member_count)?;

        self.metadata_registry.insert(
            class_info.object_id,
            ClassInfoWithTypes {
                class_info: class_info.clone(),
                member_type_info: Some(member_type_info.clone()),
                library_id: None,
            },
        );

        let member_values = self.read_all_member_values(&class_info, &member_type_info)?;
        Ok(SystemClassWithMembersAndTypes {
            class_info,
            member_type_info,
            member_values,
        })
    }

    /// Structural only: no `MemberTypeInfo` and no member values follow the
    /// `ClassInfo` for this record kind (spec.md §4.3). Mirrors
    /// `handle_system_class_with_members` in `udlg_tools.py`, which reads the
    /// `ClassInfo` and returns without touching `read_write_class_values`.
    fn read_system_class_with_members(&mut self) -> Result<SystemClassWithMembers> {
        let class_info = self.read_class_info()?;

        self.metadata_registry.insert(
            class_info.object_id,
            ClassInfoWithTypes {
                class_info: class_info.clone(),
                member_type_info: None,
                library_id: None,
            },
        );

        Ok(SystemClassWithMembers {
            class_info,
            member_values: Vec::new(),
        })
    }

    /// Structural only: no `MemberTypeInfo` and no member values follow the
    /// `ClassInfo`/`library_id` for this record kind (spec.md §4.3). Mirrors
    /// `handle_class_with_members` in `udlg_tools.py`, which reads `ClassInfo`
    /// and `LibraryId` and returns without touching `read_write_class_values`.
    fn read_class_with_members(&mut self) -> Result<ClassWithMembers> {
        let class_info = self.read_class_info()?;
        let library_id = self.read_i32()?;

        self.metadata_registry.insert(
            class_info.object_id,
            ClassInfoWithTypes {
                class_info: class_info.clone(),
                member_type_info: None,
                library_id: Some(library_id),
            },
        );

        Ok(ClassWithMembers {
            class_info,
            library_id,
            member_values: Vec::new(),
        })
    }

    fn read_class_with_id(&mut self) -> Result<ClassWithId> {
        let object_id = self.read_i32()?;
        let metadata_id = self.read_i32()?;

        let meta = self
            .metadata_registry
            .get(&metadata_id)
            .ok_or(Error::UnresolvedMetadata(metadata_id))?
            .clone();

        let member_type_info = meta
            .member_type_info
            .as_ref()
            .ok_or(Error::UnresolvedMetadata(metadata_id))?;

        let member_values = self.read_all_member_values(&meta.class_info, member_type_info)?;

        Ok(ClassWithId {
            object_id,
            metadata_id,
            member_values,
        })
    }

    fn read_binary_array_full(&mut self) -> Result<BinaryArray> {
        let object_id = self.read_i32()?;
        let binary_array_type_enum = BinaryArrayType::try_from(self.read_u8()?)?;
        let rank = self.read_i32()?;

        if binary_array_type_enum != BinaryArrayType::Single || rank != 1 {
            return Err(Error::UnsupportedArrayShape);
        }

        let mut lengths = Vec::with_capacity(rank as usize);
        for _ in 0..rank {
            lengths.push(self.read_i32()?);
        }

        let mut lower_bounds = None;
        if binary_array_type_enum.has_lower_bounds() {
            let mut bounds = Vec::with_capacity(rank as usize);
            for _ in 0..rank {
                bounds.push(self.read_i32()?);
            }
            lower_bounds = Some(bounds);
        }

        let type_enum = BinaryType::try_from(self.read_u8()?)?;
        let additional_type_info = match type_enum {
            BinaryType::Primitive => {
                AdditionalTypeInfo::Primitive(PrimitiveType::try_from(self.read_u8()?)?)
            }
            BinaryType::SystemClass => {
                AdditionalTypeInfo::SystemClass(self.read_length_prefixed_string()?)
            }
            BinaryType::Class => AdditionalTypeInfo::Class(ClassTypeInfo {
                type_name: self.read_length_prefixed_string()?,
                library_id: self.read_i32()?,
            }),
            _ => AdditionalTypeInfo::None,
        };

        let total_elements: i32 = lengths.iter().product();
        let element_values =
            self.read_all_elements(total_elements, type_enum, &additional_type_info)?;

        Ok(BinaryArray {
            object_id,
            binary_array_type_enum,
            rank,
            lengths,
            lower_bounds,
            type_enum,
            additional_type_info,
            element_values,
        })
    }

    fn read_primitive_value(&mut self, pt: PrimitiveType) -> Result<PrimitiveValue> {
        match pt {
            PrimitiveType::Boolean => Ok(PrimitiveValue::Boolean(self.read_u8()? != 0)),
            PrimitiveType::Byte => Ok(PrimitiveValue::Byte(self.read_u8()?)),
            PrimitiveType::Char => Ok(PrimitiveValue::Char(self.read_length_prefixed_string()?)),
            PrimitiveType::Int16 => {
                let mut buf = [0u8; 2];
                self.reader.read_exact(&mut buf)?;
                self.offset += 2;
                Ok(PrimitiveValue::Int16(i16::from_le_bytes(buf)))
            }
            PrimitiveType::Int32 => Ok(PrimitiveValue::Int32(self.read_i32()?)),
            PrimitiveType::Int64 => {
                let mut buf = [0u8; 8];
                self.reader.read_exact(&mut buf)?;
                self.offset += 8;
                Ok(PrimitiveValue::Int64(i64::from_le_bytes(buf)))
            }
            PrimitiveType::TimeSpan => {
                let mut buf = [0u8; 8];
                self.reader.read_exact(&mut buf)?;
                self.offset += 8;
                Ok(PrimitiveValue::TimeSpan(i64::from_le_bytes(buf)))
            }
            PrimitiveType::DateTime => {
                let mut buf = [0u8; 8];
                self.reader.read_exact(&mut buf)?;
                self.offset += 8;
                Ok(PrimitiveValue::DateTime(DateTimeValue::from_raw(
                    i64::from_le_bytes(buf),
                )))
            }
            PrimitiveType::SByte => Ok(PrimitiveValue::SByte(self.read_u8()? as i8)),
            PrimitiveType::Single => {
                let mut buf = [0u8; 4];
                self.reader.read_exact(&mut buf)?;
                self.offset += 4;
                Ok(PrimitiveValue::Single(f32::from_le_bytes(buf)))
            }
            PrimitiveType::Double => {
                let mut buf = [0u8; 8];
                self.reader.read_exact(&mut buf)?;
                self.offset += 8;
                Ok(PrimitiveValue::Double(f64::from_le_bytes(buf)))
            }
            PrimitiveType::Decimal => Ok(PrimitiveValue::Decimal(
                self.read_length_prefixed_string()?,
            )),
            PrimitiveType::UInt16 => {
                let mut buf = [0u8; 2];
                self.reader.read_exact(&mut buf)?;
                self.offset += 2;
                Ok(PrimitiveValue::UInt16(u16::from_le_bytes(buf)))
            }
            PrimitiveType::UInt32 => {
                let mut buf = [0u8; 4];
                self.reader.read_exact(&mut buf)?;
                self.offset += 4;
                Ok(PrimitiveValue::UInt32(u32::from_le_bytes(buf)))
            }
            PrimitiveType::UInt64 => {
                let mut buf = [0u8; 8];
                self.reader.read_exact(&mut buf)?;
                self.offset += 8;
                Ok(PrimitiveValue::UInt64(u64::from_le_bytes(buf)))
            }
            PrimitiveType::String => {
                Ok(PrimitiveValue::String(self.read_length_prefixed_string()?))
            }
            PrimitiveType::Null => Ok(PrimitiveValue::Null),
        }
    }

    fn read_object_value(
        &mut self,
        bt: BinaryType,
        add_info: &AdditionalTypeInfo,
    ) -> Result<ObjectValue> {
        match bt {
            BinaryType::Primitive => {
                if let AdditionalTypeInfo::Primitive(pt) = add_info {
                    Ok(ObjectValue::Primitive(self.read_primitive_value(*pt)?))
                } else {
                    Err(Error::Custom("Expected primitive type info".into()))
                }
            }
            _ => {
                if let Some(record) = self.decode_next()? {
                    Ok(ObjectValue::Record(Box::new(record)))
                } else {
                    Err(Error::Custom("Expected record for object value".into()))
                }
            }
        }
    }

    fn read_all_member_values(
        &mut self,
        class_info: &ClassInfo,
        member_type_info: &MemberTypeInfo,
    ) -> Result<Vec<ObjectValue>> {
        let mut values = Vec::with_capacity(class_info.member_count as usize);
        for i in 0..class_info.member_count {
            let bt = member_type_info.binary_type_enums[i as usize];
            let add_info = &member_type_info.additional_infos[i as usize];
            values.push(self.read_object_value(bt, add_info)?);
        }
        Ok(values)
    }

    fn read_all_elements(
        &mut self,
        count: i32,
        bt: BinaryType,
        add_info: &AdditionalTypeInfo,
    ) -> Result<Vec<ObjectValue>> {
        let mut values = Vec::with_capacity(count as usize);
        let mut i: i64 = 0;
        while i < count as i64 {
            let val = self.read_object_value(bt, add_info)?;
            let run = match &val {
                ObjectValue::Record(r) => match r.as_ref() {
                    Record::ObjectNullMultiple(n) => n.null_count as i64,
                    Record::ObjectNullMultiple256(n) => n.null_count as i64,
                    _ => 1,
                },
                _ => 1,
            };
            i += run;
            if i > count as i64 {
                return Err(Error::ArrayOverrun);
            }
            values.push(val);
        }
        Ok(values)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn decode_one(bytes: &[u8]) -> Record {
        Decoder::new(bytes)
            .decode_next()
            .unwrap()
            .expect("expected a record")
    }

    #[test]
    fn s1_message_end_is_a_single_byte() {
        let record = decode_one(&[0x0B]);
        assert!(matches!(record, Record::MessageEnd));
    }

    #[test]
    fn s2_header_then_string_then_end() {
        let mut bytes = Vec::new();
        bytes.push(RecordType::SerializedStreamHeader as u8);
        bytes.extend_from_slice(&1i32.to_le_bytes());
        bytes.extend_from_slice(&(-1i32).to_le_bytes());
        bytes.extend_from_slice(&1i32.to_le_bytes());
        bytes.extend_from_slice(&0i32.to_le_bytes());
        bytes.push(RecordType::BinaryObjectString as u8);
        bytes.extend_from_slice(&1i32.to_le_bytes());
        bytes.push(5);
        bytes.extend_from_slice(b"hello");
        bytes.push(RecordType::MessageEnd as u8);

        let mut decoder = Decoder::new(bytes.as_slice());
        match decoder.decode_next().unwrap().unwrap() {
            Record::SerializationHeader(h) => {
                assert_eq!(h.root_id, 1);
                assert_eq!(h.header_id, -1);
                assert_eq!(h.major_version, 1);
                assert_eq!(h.minor_version, 0);
            }
            other => panic!("unexpected record: {other:?}"),
        }
        match decoder.decode_next().unwrap().unwrap() {
            Record::BinaryObjectString { object_id, value } => {
                assert_eq!(object_id, 1);
                assert_eq!(value, "hello");
            }
            other => panic!("unexpected record: {other:?}"),
        }
        assert!(matches!(
            decoder.decode_next().unwrap().unwrap(),
            Record::MessageEnd
        ));
    }

    #[test]
    fn s3_varint_byte_patterns() {
        let cases: &[(i32, &[u8])] = &[(0, &[0x00]), (127, &[0x7F]), (128, &[0x80, 0x01]), (300, &[0xAC, 0x02])];
        for (n, bytes) in cases {
            let mut decoder = Decoder::new(*bytes);
            assert_eq!(decoder.read_variable_length_int().unwrap(), *n);
        }
    }

    #[test]
    fn s4_class_with_members_and_types_round_trips_via_decode() {
        let mut bytes = Vec::new();
        bytes.push(RecordType::ClassWithMembersAndTypes as u8);
        // ClassInfo: object_id=2, name="C", member_count=3, member names.
        bytes.extend_from_slice(&2i32.to_le_bytes());
        bytes.push(1);
        bytes.extend_from_slice(b"C");
        bytes.extend_from_slice(&3i32.to_le_bytes());
        for name in ["a", "b", "c"] {
            bytes.push(name.len() as u8);
            bytes.extend_from_slice(name.as_bytes());
        }
        // MemberTypeInfo: Primitive(Int32), String, Object.
        bytes.push(BinaryType::Primitive as u8);
        bytes.push(BinaryType::String as u8);
        bytes.push(BinaryType::Object as u8);
        bytes.push(PrimitiveType::Int32 as u8);
        // library_id
        bytes.extend_from_slice(&1i32.to_le_bytes());
        // member 0: Int32 42
        bytes.extend_from_slice(&42i32.to_le_bytes());
        // member 1: BinaryObjectString{object_id=3, value="x"}
        bytes.push(RecordType::BinaryObjectString as u8);
        bytes.extend_from_slice(&3i32.to_le_bytes());
        bytes.push(1);
        bytes.extend_from_slice(b"x");
        // member 2: ObjectNull
        bytes.push(RecordType::ObjectNull as u8);

        let record = decode_one(&bytes);
        match record {
            Record::ClassWithMembersAndTypes(c) => {
                assert_eq!(c.class_info.name, "C");
                assert_eq!(c.member_values.len(), 3);
                assert!(matches!(
                    c.member_values[0],
                    ObjectValue::Primitive(PrimitiveValue::Int32(42))
                ));
                match &c.member_values[1] {
                    ObjectValue::Record(r) => assert!(matches!(
                        r.as_ref(),
                        Record::BinaryObjectString { object_id: 3, .. }
                    )),
                    other => panic!("unexpected member: {other:?}"),
                }
                match &c.member_values[2] {
                    ObjectValue::Record(r) => assert!(matches!(r.as_ref(), Record::ObjectNull)),
                    other => panic!("unexpected member: {other:?}"),
                }
            }
            other => panic!("unexpected record: {other:?}"),
        }
    }

    #[test]
    fn s5_null_run_sum_matches_declared_length() {
        let mut bytes = Vec::new();
        bytes.extend_from_slice(&3i32.to_le_bytes()); // object_id
        bytes.extend_from_slice(&5i32.to_le_bytes()); // length
        bytes.push(RecordType::ObjectNull as u8);
        bytes.push(RecordType::ObjectNullMultiple as u8);
        bytes.extend_from_slice(&3i32.to_le_bytes());
        bytes.push(RecordType::ObjectNull as u8);

        let mut decoder = Decoder::new(bytes.as_slice());
        let values = decoder
            .read_all_elements(5, BinaryType::Object, &AdditionalTypeInfo::None)
            .unwrap();
        // One entry per emitted record, not per slot: the null run stays a single record.
        assert_eq!(values.len(), 3);
        match &values[1] {
            ObjectValue::Record(r) => assert!(matches!(
                r.as_ref(),
                Record::ObjectNullMultiple(n) if n.null_count == 3
            )),
            other => panic!("unexpected value: {other:?}"),
        }
    }

    #[test]
    fn s5_variant_overruns_the_declared_length() {
        // Same shape as the valid S5 case, but the run's count pushes the slot
        // cursor strictly past the declared length of 5 (1 + 1 + 4 = 6).
        let mut bytes = Vec::new();
        bytes.push(RecordType::ObjectNull as u8);
        bytes.push(RecordType::ObjectNull as u8);
        bytes.push(RecordType::ObjectNullMultiple as u8);
        bytes.extend_from_slice(&4i32.to_le_bytes());

        let mut decoder = Decoder::new(bytes.as_slice());
        let err = decoder
            .read_all_elements(5, BinaryType::Object, &AdditionalTypeInfo::None)
            .unwrap_err();
        assert!(matches!(err, Error::ArrayOverrun));
    }

    #[test]
    fn datetime_kind_bits_both_set_resolve_to_utc() {
        let raw: i64 = 0xFF | 0b11;
        let dt = DateTimeValue::from_raw(raw);
        assert_eq!(dt.kind, DateTimeKind::Utc);
        assert_eq!(dt.ticks, raw & !0x3);
    }

    #[test]
    fn zero_length_string_is_a_single_zero_byte() {
        let mut decoder = Decoder::new(&[0x00][..]);
        assert_eq!(decoder.read_length_prefixed_string().unwrap(), "");
    }

    #[test]
    fn unresolved_metadata_id_fails() {
        let mut bytes = Vec::new();
        bytes.extend_from_slice(&9i32.to_le_bytes());
        bytes.extend_from_slice(&123i32.to_le_bytes());
        let mut decoder = Decoder::new(bytes.as_slice());
        let err = decoder.read_class_with_id().unwrap_err();
        assert!(matches!(err, Error::UnresolvedMetadata(123)));
    }

    #[test]
    fn class_with_id_pointing_at_a_structural_class_fails() {
        // Register object 2 as a structural-only class (no MemberTypeInfo), as
        // `read_system_class_with_members` would; a ClassWithId pointing at it
        // has no typed member layout to read.
        let mut bytes = Vec::new();
        bytes.extend_from_slice(&9i32.to_le_bytes()); // object_id
        bytes.extend_from_slice(&2i32.to_le_bytes()); // metadata_id
        let mut decoder = Decoder::new(bytes.as_slice());
        decoder.metadata_registry.insert(
            2,
            ClassInfoWithTypes {
                class_info: ClassInfo {
                    object_id: 2,
                    name: "C".to_string(),
                    member_count: 1,
                    member_names: vec!["a".to_string()],
                },
                member_type_info: None,
                library_id: None,
            },
        );
        let err = decoder.read_class_with_id().unwrap_err();
        assert!(matches!(err, Error::UnresolvedMetadata(2)));
    }

    #[test]
    fn non_single_array_shape_is_rejected() {
        let mut bytes = Vec::new();
        bytes.extend_from_slice(&1i32.to_le_bytes()); // object_id
        bytes.push(BinaryArrayType::Jagged as u8);
        bytes.extend_from_slice(&1i32.to_le_bytes()); // rank
        let mut decoder = Decoder::new(bytes.as_slice());
        let err = decoder.read_binary_array_full().unwrap_err();
        assert!(matches!(err, Error::UnsupportedArrayShape));
    }
}
