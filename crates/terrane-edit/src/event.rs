use std::collections::BTreeSet;
use std::sync::{Arc, Mutex};

use terrane_content::Node;
use terrane_geom::V3;

#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash)]
pub enum MapEditKind {
    AddNode,
    RemoveNode,
    MetadataChanged,
    /// Bulk changes such as block generation.
    Other,
}

#[derive(Clone, Debug, PartialEq)]
pub struct MapEditEvent {
    pub kind: MapEditKind,
    /// Node position for add/remove/metadata, block position for `Other`.
    pub p: V3,
    /// Placed node; air for anything but `AddNode`.
    pub n: Node,
    pub modified_blocks: BTreeSet<V3>,
}

impl MapEditEvent {
    pub fn new(kind: MapEditKind, p: V3) -> Self {
        Self { kind, p, n: Node::AIR, modified_blocks: BTreeSet::new() }
    }

    pub fn add_node(p: V3, n: Node) -> Self {
        Self { n, ..Self::new(MapEditKind::AddNode, p) }
    }

    pub fn with_blocks(mut self, blocks: impl IntoIterator<Item = V3>) -> Self {
        self.modified_blocks.extend(blocks);
        self
    }
}

/// Observer of map edits. Receivers must not call back into the map.
pub trait MapEventReceiver {
    fn on_map_edit_event(&mut self, event: &MapEditEvent);
}

impl<R: MapEventReceiver + ?Sized> MapEventReceiver for Box<R> {
    fn on_map_edit_event(&mut self, event: &MapEditEvent) {
        (**self).on_map_edit_event(event)
    }
}

/// Lets the caller keep a handle on a receiver it registered.
impl<R: MapEventReceiver + ?Sized> MapEventReceiver for Arc<Mutex<R>> {
    fn on_map_edit_event(&mut self, event: &MapEditEvent) {
        let mut guard = match self.lock() {
            Ok(g) => g,
            Err(poisoned) => poisoned.into_inner(),
        };
        guard.on_map_edit_event(event)
    }
}

/// Records every event, optionally bounded to the most recent `cap`.
#[derive(Default, Debug, Clone)]
pub struct EventLog {
    events: Vec<MapEditEvent>,
    cap: Option<usize>,
}

impl EventLog {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn bounded(cap: usize) -> Self {
        Self { events: Vec::new(), cap: Some(cap.max(1)) }
    }

    pub fn events(&self) -> &[MapEditEvent] {
        &self.events
    }

    pub fn len(&self) -> usize {
        self.events.len()
    }

    pub fn is_empty(&self) -> bool {
        self.events.is_empty()
    }

    pub fn last(&self) -> Option<&MapEditEvent> {
        self.events.last()
    }

    pub fn drain(&mut self) -> Vec<MapEditEvent> {
        std::mem::take(&mut self.events)
    }
}

impl MapEventReceiver for EventLog {
    fn on_map_edit_event(&mut self, event: &MapEditEvent) {
        if let Some(cap) = self.cap {
            if self.events.len() >= cap {
                self.events.remove(0);
            }
        }
        self.events.push(event.clone());
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn bounded_log_keeps_latest() {
        let mut log = EventLog::bounded(2);
        for x in 0..3 {
            log.on_map_edit_event(&MapEditEvent::new(MapEditKind::RemoveNode, V3::new(x, 0, 0)));
        }
        let xs: Vec<i32> = log.events().iter().map(|e| e.p.x).collect();
        assert_eq!(xs, vec![1, 2]);
    }

    #[test]
    fn shared_handle_sees_events() {
        let shared = Arc::new(Mutex::new(EventLog::new()));
        let mut handle = shared.clone();
        handle.on_map_edit_event(&MapEditEvent::add_node(V3::ZERO, Node::new(1)));
        assert_eq!(shared.lock().unwrap().len(), 1);
        assert_eq!(shared.lock().unwrap().last().unwrap().n, Node::new(1));
    }
}
