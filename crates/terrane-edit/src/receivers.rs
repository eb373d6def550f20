use crate::{MapEditEvent, MapEventReceiver};

/// Handle returned on registration; used to unregister.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ReceiverId(u64);

/// Registered observers, notified in registration order.
#[derive(Default)]
pub struct EventReceivers {
    next: u64,
    list: Vec<(ReceiverId, Box<dyn MapEventReceiver + Send>)>,
}

impl EventReceivers {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add(&mut self, receiver: Box<dyn MapEventReceiver + Send>) -> ReceiverId {
        self.next += 1;
        let id = ReceiverId(self.next);
        self.list.push((id, receiver));
        id
    }

    pub fn remove(&mut self, id: ReceiverId) -> Option<Box<dyn MapEventReceiver + Send>> {
        let idx = self.list.iter().position(|(rid, _)| *rid == id)?;
        Some(self.list.remove(idx).1)
    }

    pub fn len(&self) -> usize {
        self.list.len()
    }

    pub fn is_empty(&self) -> bool {
        self.list.is_empty()
    }

    pub fn dispatch(&mut self, event: &MapEditEvent) {
        log::trace!(
            target: "events",
            "{:?} at ({}, {}, {}), {} block(s) -> {} receiver(s)",
            event.kind,
            event.p.x,
            event.p.y,
            event.p.z,
            event.modified_blocks.len(),
            self.list.len()
        );
        for (_, r) in self.list.iter_mut() {
            r.on_map_edit_event(event);
        }
    }
}
