//! Attribute mutation records
//!
//! Every attribute change on an element that is connected to the page is
//! published as a [`MutationRecord`]. Subscribers see the same stream a
//! mutation observer watching attributes on the whole document would see.

use serde::Serialize;
use tokio::sync::broadcast;

use crate::node::NodeId;

/// Default number of buffered records before slow subscribers lag
pub const DEFAULT_MUTATION_CAPACITY: usize = 64;

/// One observed attribute change
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct MutationRecord {
    /// Element whose attribute changed
    pub target: NodeId,
    /// Attribute name
    pub attribute_name: String,
    /// Value before the change (`None` if the attribute was absent)
    pub old_value: Option<String>,
}

/// Broadcast bus for mutation records.
///
/// Slow subscribers miss records (lagged) rather than blocking the page.
#[derive(Debug, Clone)]
pub struct MutationBus {
    sender: broadcast::Sender<MutationRecord>,
}

impl MutationBus {
    /// Create a bus with the given channel capacity
    #[must_use]
    pub fn new(capacity: usize) -> Self {
        let (sender, _) = broadcast::channel(capacity);
        Self { sender }
    }

    /// Subscribe to all future records
    #[must_use]
    pub fn subscribe(&self) -> broadcast::Receiver<MutationRecord> {
        self.sender.subscribe()
    }

    /// Publish a record; returns the number of subscribers reached
    pub fn publish(&self, record: MutationRecord) -> usize {
        // no receivers is fine
        self.sender.send(record).unwrap_or(0)
    }

    /// Number of active subscribers
    #[must_use]
    pub fn subscriber_count(&self) -> usize {
        self.sender.receiver_count()
    }
}

impl Default for MutationBus {
    fn default() -> Self {
        Self::new(DEFAULT_MUTATION_CAPACITY)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_publish_subscribe() {
        let bus = MutationBus::new(8);
        let mut rx = bus.subscribe();

        let count = bus.publish(MutationRecord {
            target: NodeId::new(0),
            attribute_name: "data-theme".to_string(),
            old_value: None,
        });
        assert_eq!(count, 1);

        let record = rx.recv().await.unwrap();
        assert_eq!(record.target, NodeId::new(0));
        assert_eq!(record.attribute_name, "data-theme");
        assert!(record.old_value.is_none());
    }

    #[test]
    fn test_receiver_wakes_on_publish() {
        let bus = MutationBus::new(8);
        let mut rx = bus.subscribe();
        let mut recv = tokio_test::task::spawn(rx.recv());
        tokio_test::assert_pending!(recv.poll());

        bus.publish(MutationRecord {
            target: NodeId::new(0),
            attribute_name: "data-theme".to_string(),
            old_value: None,
        });
        assert!(recv.is_woken());
        let record = tokio_test::assert_ready_ok!(recv.poll());
        assert_eq!(record.attribute_name, "data-theme");
    }

    #[test]
    fn test_publish_without_subscribers() {
        let bus = MutationBus::default();
        assert_eq!(bus.subscriber_count(), 0);
        let count = bus.publish(MutationRecord {
            target: NodeId::new(1),
            attribute_name: "class".to_string(),
            old_value: Some("a".to_string()),
        });
        assert_eq!(count, 0);
    }

    #[test]
    fn test_record_serialization() {
        let record = MutationRecord {
            target: NodeId::new(0),
            attribute_name: "data-theme".to_string(),
            old_value: Some("light".to_string()),
        };
        let json = serde_json::to_string(&record).unwrap();
        assert!(json.contains("\"attribute_name\":\"data-theme\""));
        assert!(json.contains("\"old_value\":\"light\""));
    }
}
