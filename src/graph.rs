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

//! Accumulates a decoded record stream and indexes it by `object_id`, the way the
//! original tooling appends to a flat `records` list and later looks members up by
//! scanning it for a matching id. `GraphStore` keeps the same flat list but adds an
//! index so `MemberReference`/`ClassWithId` lookups don't have to rescan it.

use crate::records::Record;
use std::collections::HashMap;

/// A decoded record stream plus an `object_id -> index` map.
///
/// Distinct from `Decoder`'s internal `metadata_registry`: that one resolves
/// `ClassWithId.metadata_id` against `ClassInfo`/`MemberTypeInfo` while still mid-decode.
/// `GraphStore` is the higher-level structure `FileCodec` hands back to callers who want
/// to walk the whole graph after decoding finishes.
#[derive(Debug, Default, Clone)]
pub struct GraphStore {
    records: Vec<Record>,
    by_object_id: HashMap<i32, usize>,
}

impl GraphStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Appends a record, indexing it by `object_id` if it introduces one.
    pub fn push(&mut self, record: Record) {
        if let Some(id) = record.object_id() {
            self.by_object_id.insert(id, self.records.len());
        }
        self.records.push(record);
    }

    pub fn records(&self) -> &[Record] {
        &self.records
    }

    pub fn into_records(self) -> Vec<Record> {
        self.records
    }

    /// Looks up the record that introduced a given `object_id`, as referenced by a
    /// `MemberReference.id_ref` or a `ClassWithId.metadata_id`.
    pub fn get_by_object_id(&self, object_id: i32) -> Option<&Record> {
        self.by_object_id
            .get(&object_id)
            .map(|&i| &self.records[i])
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }
}

impl FromIterator<Record> for GraphStore {
    fn from_iter<I: IntoIterator<Item = Record>>(iter: I) -> Self {
        let mut store = Self::new();
        for record in iter {
            store.push(record);
        }
        store
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::records::{BinaryLibrary, Record};

    #[test]
    fn indexes_records_by_object_id() {
        let mut store = GraphStore::new();
        store.push(Record::BinaryObjectString {
            object_id: 7,
            value: "hi".to_string(),
        });
        store.push(Record::BinaryLibrary(BinaryLibrary {
            library_id: 1,
            library_name: "mscorlib".to_string(),
        }));

        assert_eq!(store.len(), 2);
        match store.get_by_object_id(7) {
            Some(Record::BinaryObjectString { value, .. }) => assert_eq!(value, "hi"),
            other => panic!("unexpected lookup result: {other:?}"),
        }
        assert!(store.get_by_object_id(999).is_none());
    }
}
