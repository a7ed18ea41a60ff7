use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

/// Issues pass tickets; the newest ticket supersedes all older ones.
#[derive(Debug, Default)]
pub struct PassSequencer {
    latest: AtomicU64,
}

impl PassSequencer {
    /// Create a sequencer with no passes requested yet
    #[must_use]
    pub fn new() -> Arc<Self> {
        Arc::new(Self::default())
    }

    /// Request a new pass, making every earlier ticket stale
    pub fn begin(self: &Arc<Self>) -> PassTicket {
        let generation = self.latest.fetch_add(1, Ordering::SeqCst) + 1;
        PassTicket {
            generation,
            sequencer: Arc::clone(self),
        }
    }

    /// Generation of the most recently requested pass (0 if none)
    #[must_use]
    pub fn latest(&self) -> u64 {
        self.latest.load(Ordering::SeqCst)
    }
}

/// Permission for one pass to configure the engine and write results
#[derive(Debug, Clone)]
pub struct PassTicket {
    generation: u64,
    sequencer: Arc<PassSequencer>,
}

impl PassTicket {
    /// Generation number of this ticket
    #[must_use]
    pub fn generation(&self) -> u64 {
        self.generation
    }

    /// Whether no newer pass has been requested
    #[must_use]
    pub fn is_current(&self) -> bool {
        self.sequencer.latest() == self.generation
    }
}
