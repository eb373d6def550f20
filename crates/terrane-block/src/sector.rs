use std::collections::BTreeMap;

use terrane_geom::{V2, V3};

use crate::block::Block;
use crate::serialize::{ByteReader, SerializationError, put_u8, put_u16};

/// Sector metadata format version.
pub const SECTOR_META_VERSION: u8 = 1;

/// A column of blocks sharing (x, z). Owns its blocks.
#[derive(Debug)]
pub struct Sector {
    pos: V2,
    blocks: BTreeMap<i32, Block>,
    /// Sector metadata (not block data) needs writing.
    pub differs_from_disk: bool,
}

impl Sector {
    pub fn new(pos: V2) -> Self {
        Self {
            pos,
            blocks: BTreeMap::new(),
            differs_from_disk: true,
        }
    }

    #[inline]
    pub fn pos(&self) -> V2 {
        self.pos
    }

    pub fn get_block(&self, y: i32) -> Option<&Block> {
        self.blocks.get(&y)
    }

    pub fn get_block_mut(&mut self, y: i32) -> Option<&mut Block> {
        self.blocks.get_mut(&y)
    }

    /// Create a blank block at `y`. An existing dummy is replaced in place by real
    /// storage; an existing real block is returned untouched.
    pub fn create_blank_block(&mut self, y: i32) -> &mut Block {
        let pos = self.pos.with_y(y);
        let b = self.blocks.entry(y).or_insert_with(|| Block::new_blank(pos));
        b.undummify();
        b
    }

    /// Insert a fully built block, replacing whatever was at its y.
    pub fn insert_block(&mut self, block: Block) -> Option<Block> {
        debug_assert_eq!(block.pos().xz(), self.pos);
        self.blocks.insert(block.pos().y, block)
    }

    pub fn delete_block(&mut self, y: i32) -> Option<Block> {
        self.blocks.remove(&y)
    }

    pub fn is_empty(&self) -> bool {
        self.blocks.is_empty()
    }

    pub fn len(&self) -> usize {
        self.blocks.len()
    }

    pub fn blocks(&self) -> impl Iterator<Item = &Block> {
        self.blocks.values()
    }

    pub fn blocks_mut(&mut self) -> impl Iterator<Item = &mut Block> {
        self.blocks.values_mut()
    }

    pub fn block_positions(&self) -> impl Iterator<Item = V3> + '_ {
        self.blocks.values().map(Block::pos)
    }

    pub fn serialize_meta(&self) -> Vec<u8> {
        let mut out = Vec::with_capacity(3);
        put_u8(&mut out, SECTOR_META_VERSION);
        // Reserved payload length.
        put_u16(&mut out, 0);
        out
    }

    /// Reads metadata written by [`Sector::serialize_meta`]. Loaded metadata matches disk.
    pub fn deserialize_meta(&mut self, bytes: &[u8]) -> Result<(), SerializationError> {
        let mut r = ByteReader::new(bytes);
        let version = r.u8()?;
        if version == 0 || version > SECTOR_META_VERSION {
            return Err(SerializationError::UnsupportedVersion(version));
        }
        let reserved = r.u16()? as usize;
        r.take(reserved)?;
        self.differs_from_disk = false;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use terrane_content::Node;

    #[test]
    fn create_replaces_dummy_in_place() {
        let mut s = Sector::new(V2::new(2, -1));
        s.insert_block(Block::new_dummy(V3::new(2, 5, -1)));
        assert!(s.get_block(5).unwrap().is_dummy());
        let b = s.create_blank_block(5);
        assert!(!b.is_dummy());
        assert_eq!(b.pos(), V3::new(2, 5, -1));
        assert_eq!(s.len(), 1);
    }

    #[test]
    fn create_keeps_existing_real_block() {
        let mut s = Sector::new(V2::new(0, 0));
        s.create_blank_block(0).fill(Node::AIR);
        let b = s.create_blank_block(0);
        assert_eq!(b.get_node(V3::ZERO), Some(Node::AIR));
    }

    #[test]
    fn delete_leaves_sector_empty() {
        let mut s = Sector::new(V2::new(0, 0));
        s.create_blank_block(-3);
        s.create_blank_block(4);
        let ys: Vec<i32> = s.block_positions().map(|p| p.y).collect();
        assert_eq!(ys, vec![-3, 4]);
        assert!(s.delete_block(-3).is_some());
        assert!(s.delete_block(-3).is_none());
        assert!(s.delete_block(4).is_some());
        assert!(s.is_empty());
    }

    #[test]
    fn meta_clears_dirty_flag() {
        let mut s = Sector::new(V2::new(0, 0));
        assert!(s.differs_from_disk);
        let bytes = s.serialize_meta();
        s.deserialize_meta(&bytes).unwrap();
        assert!(!s.differs_from_disk);
        assert_eq!(
            s.deserialize_meta(&[9, 0, 0]),
            Err(SerializationError::UnsupportedVersion(9))
        );
    }
}
