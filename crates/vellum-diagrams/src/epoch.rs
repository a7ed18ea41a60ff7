//! Render epochs
//!
//! Every pass reserves a fresh epoch before touching the engine. The epoch
//! and the diagram's position form the render identifier, so identifiers
//! never repeat within one controller even when passes overlap.

use serde::Serialize;
use std::fmt;
use std::sync::atomic::{AtomicU64, Ordering};

/// Epoch number of one render pass
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize)]
pub struct RenderEpoch(u64);

impl RenderEpoch {
    /// Raw epoch number
    #[must_use]
    pub fn value(self) -> u64 {
        self.0
    }

    /// Render identifier `<prefix>-<epoch>-<index>`
    #[must_use]
    pub fn render_id(self, prefix: &str, index: usize) -> String {
        format!("{prefix}-{}-{index}", self.0)
    }
}

impl fmt::Display for RenderEpoch {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Monotonic epoch source owned by one controller
#[derive(Debug, Default)]
pub struct RenderEpochCounter {
    next: AtomicU64,
}

impl RenderEpochCounter {
    /// Create a counter starting at epoch 0
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Reserve the next epoch
    pub fn reserve(&self) -> RenderEpoch {
        RenderEpoch(self.next.fetch_add(1, Ordering::SeqCst))
    }

    /// Epoch the next reservation will return
    #[must_use]
    pub fn peek(&self) -> RenderEpoch {
        RenderEpoch(self.next.load(Ordering::SeqCst))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashSet;
    use std::sync::Arc;

    #[test]
    fn test_reserve_is_monotonic() {
        let counter = RenderEpochCounter::new();
        assert_eq!(counter.peek().value(), 0);
        assert_eq!(counter.reserve().value(), 0);
        assert_eq!(counter.reserve().value(), 1);
        assert_eq!(counter.peek().value(), 2);
    }

    #[test]
    fn test_render_id_format() {
        let counter = RenderEpochCounter::new();
        counter.reserve();
        let epoch = counter.reserve();
        assert_eq!(epoch.render_id("mermaid", 3), "mermaid-1-3");
    }

    #[test]
    fn test_counters_are_isolated() {
        let a = RenderEpochCounter::new();
        let b = RenderEpochCounter::new();
        a.reserve();
        a.reserve();
        assert_eq!(b.reserve().value(), 0);
    }

    #[tokio::test]
    async fn test_concurrent_reservations_are_unique() {
        let counter = Arc::new(RenderEpochCounter::new());
        let handles: Vec<_> = (0..8)
            .map(|_| {
                let counter = Arc::clone(&counter);
                tokio::spawn(async move { (0..50).map(|_| counter.reserve()).collect::<Vec<_>>() })
            })
            .collect();

        let mut seen = HashSet::new();
        for epochs in futures::future::join_all(handles).await {
            for epoch in epochs.unwrap() {
                assert!(seen.insert(epoch));
            }
        }
        assert_eq!(seen.len(), 400);
    }
}
