use terrane_content::{CONTENT_AIR, ContentDefs, LightBank, Node};
use terrane_geom::V3;

use crate::metadata::NodeMetadataList;
use crate::serialize::{
    ByteReader, SER_FMT_VER_HIGHEST, SER_FMT_VER_LOWEST, SerializationError, put_u8, put_u16,
};
use crate::{NODES_PER_BLOCK, block_origin, rel_in_bounds, rel_index};

/// How urgently a block needs writing. Ordered by urgency.
#[derive(Copy, Clone, Debug, Default, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum ModState {
    #[default]
    Clean,
    WriteAtUnload,
    WriteNeeded,
}

const FLAG_UNDERGROUND: u8 = 0x01;
const FLAG_DAY_NIGHT_DIFFERS: u8 = 0x02;
const FLAG_LIGHTING_EXPIRED: u8 = 0x04;
const FLAG_GENERATED: u8 = 0x08;

const REASON_MAX_LEN: usize = 40;

/// A 16x16x16 cube of nodes. A block without node data is a dummy.
#[derive(Clone, Debug)]
pub struct Block {
    pos: V3,
    data: Option<Box<[Node]>>,
    modified: ModState,
    modified_reason: String,
    modified_reason_too_long: bool,
    lighting_expired: bool,
    day_night_differs: bool,
    is_underground: bool,
    generated: bool,
    usage_timer: f32,
    pub metadata: NodeMetadataList,
}

impl Block {
    /// Real block filled with CONTENT_IGNORE, awaiting generation or load.
    pub fn new_blank(pos: V3) -> Self {
        let mut b = Self::new_dummy(pos);
        b.reallocate();
        b
    }

    pub fn new_dummy(pos: V3) -> Self {
        Self {
            pos,
            data: None,
            modified: ModState::WriteNeeded,
            modified_reason: "initial".into(),
            modified_reason_too_long: false,
            lighting_expired: true,
            day_night_differs: false,
            is_underground: false,
            generated: false,
            usage_timer: 0.0,
            metadata: NodeMetadataList::new(),
        }
    }

    fn reallocate(&mut self) {
        self.data = Some(vec![Node::IGNORE; NODES_PER_BLOCK].into_boxed_slice());
    }

    #[inline]
    pub fn pos(&self) -> V3 {
        self.pos
    }

    /// Node position of the block's (0,0,0) corner.
    #[inline]
    pub fn origin(&self) -> V3 {
        block_origin(self.pos)
    }

    #[inline]
    pub fn is_dummy(&self) -> bool {
        self.data.is_none()
    }

    /// Give a dummy real (IGNORE-filled) storage.
    pub fn undummify(&mut self) {
        if self.data.is_none() {
            self.reallocate();
        }
    }

    /// Node at an in-block position; `None` for dummies or out-of-range positions.
    #[inline]
    pub fn get_node(&self, rel: V3) -> Option<Node> {
        if !rel_in_bounds(rel) {
            return None;
        }
        self.data.as_ref().map(|d| d[rel_index(rel)])
    }

    /// Write a node; returns false for dummies or out-of-range positions.
    pub fn set_node(&mut self, rel: V3, n: Node) -> bool {
        if !rel_in_bounds(rel) {
            return false;
        }
        match self.data.as_mut() {
            Some(d) => {
                d[rel_index(rel)] = n;
                self.raise_modified(ModState::WriteNeeded, "set_node");
                true
            }
            None => false,
        }
    }

    /// Raw node array in `rel_index` order.
    #[inline]
    pub fn nodes(&self) -> Option<&[Node]> {
        self.data.as_deref()
    }

    /// Mutable node array. Callers raise the modification state themselves.
    #[inline]
    pub fn nodes_mut(&mut self) -> Option<&mut [Node]> {
        self.data.as_deref_mut()
    }

    #[inline]
    pub fn modified(&self) -> ModState {
        self.modified
    }

    pub fn modified_reason(&self) -> &str {
        &self.modified_reason
    }

    /// Escalate the modification state. Reasons at the current level accumulate
    /// until they grow too long.
    pub fn raise_modified(&mut self, state: ModState, reason: &str) {
        if state > self.modified {
            self.modified = state;
            self.modified_reason = reason.to_string();
            self.modified_reason_too_long = false;
        } else if state == self.modified && !self.modified_reason_too_long {
            if self.modified_reason.len() < REASON_MAX_LEN {
                self.modified_reason.push_str(", ");
                self.modified_reason.push_str(reason);
            } else {
                self.modified_reason.push_str("...");
                self.modified_reason_too_long = true;
            }
        }
    }

    pub fn reset_modified(&mut self) {
        self.modified = ModState::Clean;
        self.modified_reason.clear();
        self.modified_reason_too_long = false;
    }

    #[inline]
    pub fn lighting_expired(&self) -> bool {
        self.lighting_expired
    }

    pub fn set_lighting_expired(&mut self, expired: bool) {
        if expired != self.lighting_expired {
            self.lighting_expired = expired;
            self.raise_modified(ModState::WriteNeeded, "set_lighting_expired");
        }
    }

    #[inline]
    pub fn is_underground(&self) -> bool {
        self.is_underground
    }

    pub fn set_is_underground(&mut self, underground: bool) {
        self.is_underground = underground;
        self.raise_modified(ModState::WriteNeeded, "set_is_underground");
    }

    #[inline]
    pub fn is_generated(&self) -> bool {
        self.generated
    }

    pub fn set_generated(&mut self, generated: bool) {
        if generated != self.generated {
            self.generated = generated;
            self.raise_modified(ModState::WriteNeeded, "set_generated");
        }
    }

    #[inline]
    pub fn day_night_differs(&self) -> bool {
        self.day_night_differs
    }

    /// Recompute the cached "day and night light differ somewhere" flag.
    /// A block made only of air never counts as differing.
    pub fn update_day_night_diff(&mut self, defs: &dyn ContentDefs) {
        let Some(data) = self.data.as_ref() else {
            self.day_night_differs = false;
            return;
        };
        let differs = data
            .iter()
            .any(|n| n.light(LightBank::Day, defs) != n.light(LightBank::Night, defs));
        let only_air = differs && data.iter().all(|n| n.content == CONTENT_AIR);
        self.day_night_differs = differs && !only_air;
    }

    #[inline]
    pub fn usage_timer(&self) -> f32 {
        self.usage_timer
    }

    pub fn increment_usage_timer(&mut self, dtime: f32) {
        self.usage_timer += dtime;
    }

    pub fn reset_usage_timer(&mut self) {
        self.usage_timer = 0.0;
    }

    /// Body bytes (without the leading version byte).
    pub fn serialize(&self, version: u8, out: &mut Vec<u8>) -> Result<(), SerializationError> {
        if !(SER_FMT_VER_LOWEST..=SER_FMT_VER_HIGHEST).contains(&version) {
            return Err(SerializationError::UnsupportedVersion(version));
        }
        let Some(data) = self.data.as_ref() else {
            return Err(SerializationError::Empty);
        };
        let mut flags = 0u8;
        if self.is_underground {
            flags |= FLAG_UNDERGROUND;
        }
        if self.day_night_differs {
            flags |= FLAG_DAY_NIGHT_DIFFERS;
        }
        if self.lighting_expired {
            flags |= FLAG_LIGHTING_EXPIRED;
        }
        if self.generated {
            flags |= FLAG_GENERATED;
        }
        put_u8(out, flags);
        out.reserve(NODES_PER_BLOCK * 4);
        for n in data.iter() {
            put_u16(out, n.content);
        }
        out.extend(data.iter().map(|n| n.param1));
        out.extend(data.iter().map(|n| n.param2));
        if version >= 2 {
            self.metadata.serialize(out);
        }
        Ok(())
    }

    /// Replace contents from body bytes. The block becomes non-dummy on success and
    /// is left untouched on error.
    pub fn deserialize(&mut self, bytes: &[u8], version: u8) -> Result<(), SerializationError> {
        if !(SER_FMT_VER_LOWEST..=SER_FMT_VER_HIGHEST).contains(&version) {
            return Err(SerializationError::UnsupportedVersion(version));
        }
        let mut r = ByteReader::new(bytes);
        let flags = r.u8()?;
        let content = r.take(NODES_PER_BLOCK * 2)?;
        let param1 = r.take(NODES_PER_BLOCK)?;
        let param2 = r.take(NODES_PER_BLOCK)?;
        let metadata = if version >= 2 {
            NodeMetadataList::deserialize(&mut r)?
        } else {
            NodeMetadataList::new()
        };

        let mut data = vec![Node::IGNORE; NODES_PER_BLOCK].into_boxed_slice();
        for (i, n) in data.iter_mut().enumerate() {
            n.content = u16::from_le_bytes([content[2 * i], content[2 * i + 1]]);
            n.param1 = param1[i];
            n.param2 = param2[i];
        }
        self.data = Some(data);
        self.metadata = metadata;
        self.is_underground = flags & FLAG_UNDERGROUND != 0;
        self.day_night_differs = flags & FLAG_DAY_NIGHT_DIFFERS != 0;
        self.lighting_expired = flags & FLAG_LIGHTING_EXPIRED != 0;
        self.generated = version < 2 || flags & FLAG_GENERATED != 0;
        Ok(())
    }

    /// Version byte followed by the body, as written to the store.
    pub fn to_blob(&self) -> Result<Vec<u8>, SerializationError> {
        let mut out = Vec::with_capacity(1 + NODES_PER_BLOCK * 4);
        put_u8(&mut out, SER_FMT_VER_HIGHEST);
        self.serialize(SER_FMT_VER_HIGHEST, &mut out)?;
        Ok(out)
    }

    /// Inverse of [`Block::to_blob`]; accepts any supported version.
    pub fn load_blob(&mut self, blob: &[u8]) -> Result<(), SerializationError> {
        let (&version, body) = blob.split_first().ok_or(SerializationError::Empty)?;
        if version < SER_FMT_VER_HIGHEST {
            log::debug!(target: "store", "block {} stored in old format {}", self.pos, version);
        }
        self.deserialize(body, version)
    }

    /// Fill every node with `n` (generation helpers and tests).
    pub fn fill(&mut self, n: Node) {
        if let Some(d) = self.data.as_mut() {
            d.fill(n);
            self.raise_modified(ModState::WriteNeeded, "fill");
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use terrane_content::{ContentRegistry, LIGHT_SUN, builtin};

    #[test]
    fn dummy_has_no_nodes() {
        let mut b = Block::new_dummy(V3::new(1, 2, 3));
        assert!(b.is_dummy());
        assert_eq!(b.get_node(V3::ZERO), None);
        assert!(!b.set_node(V3::ZERO, Node::AIR));
        b.undummify();
        assert_eq!(b.get_node(V3::ZERO), Some(Node::IGNORE));
        assert_eq!(b.origin(), V3::new(16, 32, 48));
    }

    #[test]
    fn set_node_bounds_and_dirty() {
        let mut b = Block::new_blank(V3::ZERO);
        b.reset_modified();
        assert!(!b.set_node(V3::new(16, 0, 0), Node::AIR));
        assert!(!b.set_node(V3::new(0, -1, 0), Node::AIR));
        assert_eq!(b.modified(), ModState::Clean);
        assert!(b.set_node(V3::new(15, 15, 15), Node::new(builtin::STONE)));
        assert_eq!(b.modified(), ModState::WriteNeeded);
        assert_eq!(
            b.get_node(V3::new(15, 15, 15)),
            Some(Node::new(builtin::STONE))
        );
    }

    #[test]
    fn modification_state_only_rises() {
        let mut b = Block::new_blank(V3::ZERO);
        b.reset_modified();
        b.raise_modified(ModState::WriteAtUnload, "a");
        assert_eq!(b.modified(), ModState::WriteAtUnload);
        b.raise_modified(ModState::Clean, "b");
        assert_eq!(b.modified(), ModState::WriteAtUnload);
        b.raise_modified(ModState::WriteAtUnload, "c");
        assert_eq!(b.modified_reason(), "a, c");
        b.raise_modified(ModState::WriteNeeded, "d");
        assert_eq!(b.modified_reason(), "d");
        for _ in 0..20 {
            b.raise_modified(ModState::WriteNeeded, "spam");
        }
        assert!(b.modified_reason().ends_with("..."));
        b.reset_modified();
        assert_eq!(b.modified(), ModState::Clean);
        assert_eq!(b.modified_reason(), "");
    }

    #[test]
    fn day_night_diff_ignores_pure_air() {
        let reg = ContentRegistry::builtin();
        let mut b = Block::new_blank(V3::ZERO);
        let mut lit = Node::AIR;
        lit.set_light(LightBank::Day, LIGHT_SUN, &reg);
        b.fill(lit);
        b.update_day_night_diff(&reg);
        assert!(!b.day_night_differs());
        b.set_node(V3::ZERO, Node::new(builtin::STONE));
        b.update_day_night_diff(&reg);
        assert!(b.day_night_differs());
        b.fill(Node::AIR);
        b.update_day_night_diff(&reg);
        assert!(!b.day_night_differs());
    }

    #[test]
    fn serialized_body_restores_nodes_flags_and_metadata() {
        let mut b = Block::new_blank(V3::new(-3, 0, 9));
        b.fill(Node::AIR);
        b.set_node(V3::new(1, 2, 3), Node::with_params(builtin::WATER_FLOWING, 0x5a, 0x0b));
        b.set_is_underground(true);
        b.set_generated(true);
        let mut m = crate::NodeMetadata::new("chest");
        m.set_string("infotext", "Chest");
        b.metadata.set(V3::new(4, 4, 4), m);

        let mut bytes = Vec::new();
        b.serialize(SER_FMT_VER_HIGHEST, &mut bytes).unwrap();
        let mut back = Block::new_dummy(b.pos());
        back.deserialize(&bytes, SER_FMT_VER_HIGHEST).unwrap();
        assert_eq!(back.nodes(), b.nodes());
        assert!(back.is_underground());
        assert!(back.is_generated());
        assert_eq!(back.metadata, b.metadata);
    }

    #[test]
    fn blob_carries_version_byte() {
        let mut b = Block::new_blank(V3::new(0, -1, 0));
        b.fill(Node::new(builtin::DIRT));
        let blob = b.to_blob().unwrap();
        assert_eq!(blob[0], SER_FMT_VER_HIGHEST);
        let mut back = Block::new_dummy(b.pos());
        back.load_blob(&blob).unwrap();
        assert_eq!(back.get_node(V3::new(7, 7, 7)), Some(Node::new(builtin::DIRT)));
        assert_eq!(back.load_blob(&[]), Err(SerializationError::Empty));
    }

    #[test]
    fn deserialize_rejects_truncated_and_unknown_versions() {
        let mut b = Block::new_dummy(V3::ZERO);
        assert!(matches!(
            b.deserialize(&[0u8; 10], SER_FMT_VER_HIGHEST),
            Err(SerializationError::Truncated { .. })
        ));
        assert!(b.is_dummy());
        assert_eq!(
            b.deserialize(&[], 99),
            Err(SerializationError::UnsupportedVersion(99))
        );
    }
}
