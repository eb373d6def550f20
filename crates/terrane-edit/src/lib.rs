//! Map edit notifications and per-block revision tracking.
#![forbid(unsafe_code)]

mod dirty;
mod event;
mod receivers;

pub use dirty::{DirtyTracker, DirtyTrackerStats};
pub use event::{EventLog, MapEditEvent, MapEditKind, MapEventReceiver};
pub use receivers::{EventReceivers, ReceiverId};
