//! Outbound lifecycle events
//!
//! Events are produced by the lifecycle controller strictly after the
//! corresponding transition has been saved, never before. Consumers
//! (certificate issuance, notifications) sit behind [`SnapshotEventSink`].

use std::sync::{Mutex, PoisonError};

use serde::Serialize;

/// Lifecycle event published to external collaborators
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum SnapshotEvent {
    SnapshotActivated {
        snapshot_id: String,
        program_id: String,
    },
    SnapshotCompleted {
        snapshot_id: String,
        program_id: String,
    },
    SnapshotArchived {
        snapshot_id: String,
        program_id: String,
    },
}

impl SnapshotEvent {
    pub fn snapshot_id(&self) -> &str {
        match self {
            SnapshotEvent::SnapshotActivated { snapshot_id, .. }
            | SnapshotEvent::SnapshotCompleted { snapshot_id, .. }
            | SnapshotEvent::SnapshotArchived { snapshot_id, .. } => snapshot_id,
        }
    }

    pub fn name(&self) -> &'static str {
        match self {
            SnapshotEvent::SnapshotActivated { .. } => "snapshot_activated",
            SnapshotEvent::SnapshotCompleted { .. } => "snapshot_completed",
            SnapshotEvent::SnapshotArchived { .. } => "snapshot_archived",
        }
    }
}

/// Receiver for committed lifecycle events
///
/// Implementations must not block for long: they run on the request path,
/// after the commit but before the controller returns.
pub trait SnapshotEventSink: Send + Sync {
    fn publish(&self, event: SnapshotEvent);
}

/// Discards every event.
#[derive(Debug, Clone, Copy, Default)]
pub struct NoopEventSink;

impl SnapshotEventSink for NoopEventSink {
    fn publish(&self, _: SnapshotEvent) {}
}

/// Records events in memory, in publication order.
#[derive(Debug, Default)]
pub struct InMemoryEventSink {
    events: Mutex<Vec<SnapshotEvent>>,
}

impl InMemoryEventSink {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn events(&self) -> Vec<SnapshotEvent> {
        self.events
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }
}

impl SnapshotEventSink for InMemoryEventSink {
    fn publish(&self, event: SnapshotEvent) {
        self.events
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .push(event);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_in_memory_sink_keeps_order() {
        let sink = InMemoryEventSink::new();
        sink.publish(SnapshotEvent::SnapshotActivated {
            snapshot_id: "s1".into(),
            program_id: "p".into(),
        });
        sink.publish(SnapshotEvent::SnapshotArchived {
            snapshot_id: "s1".into(),
            program_id: "p".into(),
        });

        let names: Vec<_> = sink.events().iter().map(SnapshotEvent::name).collect();
        assert_eq!(names, vec!["snapshot_activated", "snapshot_archived"]);
    }

    #[test]
    fn test_event_serializes_with_type_tag() {
        let event = SnapshotEvent::SnapshotCompleted {
            snapshot_id: "s1".into(),
            program_id: "p".into(),
        };
        let json = serde_json::to_value(&event).unwrap();
        assert_eq!(json["type"], "snapshot_completed");
        assert_eq!(json["snapshot_id"], "s1");
    }
}
