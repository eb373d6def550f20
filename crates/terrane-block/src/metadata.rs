//! Per-node metadata: sparse, keyed by in-block position.

use std::collections::BTreeMap;

use terrane_geom::V3;

use crate::serialize::{
    ByteReader, SerializationError, put_i64, put_str16, put_str32, put_u8, put_u16,
};
use crate::{NODES_PER_BLOCK, rel_from_index, rel_index};

#[derive(Clone, Debug, PartialEq, Eq)]
pub enum MetaValue {
    Str(String),
    Int(i64),
}

const TAG_STR: u8 = 0;
const TAG_INT: u8 = 1;

/// A typed bag of fields attached to one node.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct NodeMetadata {
    /// Registered metadata type (the content's `metadata_name`).
    pub type_name: String,
    pub owner: Option<String>,
    /// Inventory serialized as text; opaque at this layer.
    pub inventory: Option<String>,
    fields: BTreeMap<String, MetaValue>,
}

impl NodeMetadata {
    pub fn new(type_name: impl Into<String>) -> Self {
        Self {
            type_name: type_name.into(),
            ..Self::default()
        }
    }

    pub fn get(&self, key: &str) -> Option<&MetaValue> {
        self.fields.get(key)
    }

    pub fn get_string(&self, key: &str) -> Option<&str> {
        match self.fields.get(key) {
            Some(MetaValue::Str(s)) => Some(s),
            _ => None,
        }
    }

    pub fn get_int(&self, key: &str) -> Option<i64> {
        match self.fields.get(key) {
            Some(MetaValue::Int(v)) => Some(*v),
            _ => None,
        }
    }

    pub fn set_string(&mut self, key: impl Into<String>, value: impl Into<String>) {
        self.fields.insert(key.into(), MetaValue::Str(value.into()));
    }

    pub fn set_int(&mut self, key: impl Into<String>, value: i64) {
        self.fields.insert(key.into(), MetaValue::Int(value));
    }

    pub fn remove(&mut self, key: &str) -> Option<MetaValue> {
        self.fields.remove(key)
    }

    pub fn fields(&self) -> impl Iterator<Item = (&str, &MetaValue)> {
        self.fields.iter().map(|(k, v)| (k.as_str(), v))
    }

    fn serialize(&self, out: &mut Vec<u8>) {
        put_str16(out, &self.type_name);
        for opt in [&self.owner, &self.inventory] {
            match opt {
                Some(s) => {
                    put_u8(out, 1);
                    put_str32(out, s);
                }
                None => put_u8(out, 0),
            }
        }
        put_u16(out, self.fields.len() as u16);
        for (k, v) in &self.fields {
            put_str16(out, k);
            match v {
                MetaValue::Str(s) => {
                    put_u8(out, TAG_STR);
                    put_str32(out, s);
                }
                MetaValue::Int(i) => {
                    put_u8(out, TAG_INT);
                    put_i64(out, *i);
                }
            }
        }
    }

    fn deserialize(r: &mut ByteReader<'_>) -> Result<Self, SerializationError> {
        let type_name = r.str16()?;
        let owner = if r.u8()? != 0 { Some(r.str32()?) } else { None };
        let inventory = if r.u8()? != 0 { Some(r.str32()?) } else { None };
        let n = r.u16()?;
        let mut fields = BTreeMap::new();
        for _ in 0..n {
            let key = r.str16()?;
            let at = r.position();
            let value = match r.u8()? {
                TAG_STR => MetaValue::Str(r.str32()?),
                TAG_INT => MetaValue::Int(r.i64()?),
                tag => return Err(SerializationError::BadTag { at, tag }),
            };
            fields.insert(key, value);
        }
        Ok(Self {
            type_name,
            owner,
            inventory,
            fields,
        })
    }
}

/// All metadata of one block.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct NodeMetadataList {
    entries: BTreeMap<u16, NodeMetadata>,
}

impl NodeMetadataList {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn get(&self, rel: V3) -> Option<&NodeMetadata> {
        self.entries.get(&(rel_index(rel) as u16))
    }

    pub fn get_mut(&mut self, rel: V3) -> Option<&mut NodeMetadata> {
        self.entries.get_mut(&(rel_index(rel) as u16))
    }

    /// Install or replace; returns the previous entry.
    pub fn set(&mut self, rel: V3, meta: NodeMetadata) -> Option<NodeMetadata> {
        self.entries.insert(rel_index(rel) as u16, meta)
    }

    pub fn remove(&mut self, rel: V3) -> Option<NodeMetadata> {
        self.entries.remove(&(rel_index(rel) as u16))
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn clear(&mut self) {
        self.entries.clear();
    }

    pub fn iter(&self) -> impl Iterator<Item = (V3, &NodeMetadata)> {
        self.entries
            .iter()
            .map(|(i, m)| (rel_from_index(*i as usize), m))
    }

    /// Advance every entry by `dtime`. `step` gets the in-block position and
    /// returns whether it changed the entry; the result is true if any did.
    pub fn step<F>(&mut self, dtime: f32, mut step: F) -> bool
    where
        F: FnMut(V3, &mut NodeMetadata, f32) -> bool,
    {
        let mut changed = false;
        for (i, m) in self.entries.iter_mut() {
            changed |= step(rel_from_index(*i as usize), m, dtime);
        }
        changed
    }

    pub(crate) fn serialize(&self, out: &mut Vec<u8>) {
        put_u16(out, self.entries.len() as u16);
        for (i, m) in &self.entries {
            put_u16(out, *i);
            m.serialize(out);
        }
    }

    pub(crate) fn deserialize(r: &mut ByteReader<'_>) -> Result<Self, SerializationError> {
        let n = r.u16()?;
        let mut entries = BTreeMap::new();
        for _ in 0..n {
            let at = r.position();
            let index = r.u16()?;
            if index as usize >= NODES_PER_BLOCK {
                return Err(SerializationError::BadPosition { at, index });
            }
            entries.insert(index, NodeMetadata::deserialize(r)?);
        }
        Ok(Self { entries })
    }
}
