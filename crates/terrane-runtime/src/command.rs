use terrane_content::Node;
use terrane_geom::V3;
use terrane_map::{MapError, MapStats, ModState, SaveStats};

/// Requests served by the tick thread.
#[derive(Clone, Debug)]
pub enum Command {
    AddNode { p: V3, node: Node },
    RemoveNode { p: V3 },
    /// Load (and optionally generate) a batch of blocks.
    Emerge { blocks: Vec<V3>, allow_generate: bool },
    Save(ModState),
    GetNode(V3),
    Stats,
    Shutdown,
}

#[derive(Debug)]
pub enum Reply {
    Edited(bool),
    /// Positions that are loaded after the request, in request order.
    Emerged(Vec<V3>),
    Saved(SaveStats),
    /// `None` when the position is not loaded.
    Node(Option<Node>),
    Stats(MapStats),
    Failed(MapError),
    ShuttingDown,
}
