use terrane_content::Node;
use terrane_geom::V3;

/// Read access to nodes by absolute position. `None` means the position holds no
/// usable data (not loaded, dummy, outside the buffer).
pub trait NodeSource {
    fn node(&self, p: V3) -> Option<Node>;
}

/// Write access matching [`NodeSource`]. Returns false where nothing was written.
pub trait NodeSink: NodeSource {
    fn put_node(&mut self, p: V3, n: Node) -> bool;
}
