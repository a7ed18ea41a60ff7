//! Theme change watcher
//!
//! Observes attribute mutations on the page and requests one refresh pass
//! per batch of records that changes the theme marker on the document root.

use std::sync::Arc;
use tokio::sync::broadcast::error::{RecvError, TryRecvError};
use tokio::sync::broadcast::Receiver;
use tokio::task::{JoinHandle, JoinSet};
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};
use vellum_page::{MutationRecord, NodeId};

use crate::pipeline::{DiagramController, PassReport};

/// Triggers refresh passes when the root theme attribute changes
#[derive(Debug, Clone)]
pub struct ThemeChangeWatcher {
    controller: Arc<DiagramController>,
    attribute: String,
}

impl ThemeChangeWatcher {
    /// Create a watcher for the controller's theme attribute
    #[must_use]
    pub fn new(controller: Arc<DiagramController>) -> Self {
        let attribute = controller.settings().theme_attribute.clone();
        Self {
            controller,
            attribute,
        }
    }

    /// Run the watcher on a mutation subscription until cancelled or the
    /// page's mutation channel closes.
    ///
    /// Refresh passes still running are aborted on cancellation and awaited
    /// when the channel closes.
    pub fn spawn(self, receiver: Receiver<MutationRecord>, cancel: CancellationToken) -> JoinHandle<()> {
        tokio::spawn(async move { self.run(receiver, cancel).await })
    }

    async fn run(self, mut receiver: Receiver<MutationRecord>, cancel: CancellationToken) {
        let root = self.controller.page().read().await.root();
        let mut passes: JoinSet<PassReport> = JoinSet::new();
        info!(attribute = %self.attribute, "Theme watcher started");

        loop {
            let first = tokio::select! {
                biased;
                () = cancel.cancelled() => {
                    debug!("Theme watcher cancelled");
                    passes.abort_all();
                    break;
                }
                result = receiver.recv() => result,
            };

            let mut triggered = match first {
                Ok(record) => self.is_theme_change(&record, root),
                Err(RecvError::Lagged(missed)) => {
                    warn!(missed, "Theme watcher lagged, refreshing");
                    true
                }
                Err(RecvError::Closed) => {
                    self.drain(&mut passes).await;
                    break;
                }
            };

            let mut closed = false;
            loop {
                match receiver.try_recv() {
                    Ok(record) => triggered |= self.is_theme_change(&record, root),
                    Err(TryRecvError::Lagged(missed)) => {
                        warn!(missed, "Theme watcher lagged, refreshing");
                        triggered = true;
                    }
                    Err(TryRecvError::Empty) => break,
                    Err(TryRecvError::Closed) => {
                        closed = true;
                        break;
                    }
                }
            }

            if triggered {
                self.request_refresh(&mut passes);
            }
            while passes.try_join_next().is_some() {}

            if closed {
                self.drain(&mut passes).await;
                break;
            }
        }

        info!("Theme watcher stopped");
    }

    fn is_theme_change(&self, record: &MutationRecord, root: NodeId) -> bool {
        record.target == root && record.attribute_name == self.attribute
    }

    fn request_refresh(&self, passes: &mut JoinSet<PassReport>) {
        // ticket first: a later request must supersede this one even if
        // this task has not started yet
        let ticket = self.controller.begin_pass();
        debug!(generation = ticket.generation(), "Theme changed, refreshing diagrams");
        let controller = Arc::clone(&self.controller);
        passes.spawn(async move { controller.render_pass(ticket).await });
    }

    async fn drain(&self, passes: &mut JoinSet<PassReport>) {
        while let Some(result) = passes.join_next().await {
            if let Err(err) = result {
                warn!(error = %err, "Refresh pass task failed");
            }
        }
    }
}
