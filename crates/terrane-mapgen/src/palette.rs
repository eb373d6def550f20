use terrane_content::{CONTENT_AIR, ContentDefs, ContentId, Node};

/// Content ids used by the generators, resolved by name.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub struct Palette {
    pub stone: ContentId,
    pub dirt: ContentId,
    pub grass: ContentId,
    pub sand: ContentId,
    pub water: ContentId,
}

impl Palette {
    /// Missing names fall back to stone (or air for water).
    pub fn resolve(defs: &dyn ContentDefs) -> Self {
        let stone = defs.id_by_name("stone").unwrap_or_else(|| {
            log::warn!(target: "mapgen", "no 'stone' content registered; generating air");
            CONTENT_AIR
        });
        let or_stone = |name: &str| defs.id_by_name(name).unwrap_or(stone);
        Self {
            stone,
            dirt: or_stone("dirt"),
            grass: or_stone("grass"),
            sand: or_stone("sand"),
            water: defs.id_by_name("water_source").unwrap_or(CONTENT_AIR),
        }
    }

    /// Node for height `y` in a column whose surface is at `ground`.
    pub fn column_node(&self, y: i32, ground: i32, water_level: i32) -> Node {
        let beach = ground <= water_level + 1;
        if y > ground {
            if y <= water_level { Node::new(self.water) } else { Node::AIR }
        } else if y == ground {
            Node::new(if beach { self.sand } else { self.grass })
        } else if y > ground - 3 {
            Node::new(if beach { self.sand } else { self.dirt })
        } else {
            Node::new(self.stone)
        }
    }
}
