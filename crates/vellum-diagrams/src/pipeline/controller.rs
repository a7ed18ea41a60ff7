use std::sync::Arc;
use tokio::sync::{broadcast, Mutex, RwLock};
use tracing::{debug, info, instrument, warn};
use vellum_page::{escape_attribute, escape_text, NodeId, Page, SharedPage};

use super::report::PassReport;
use super::ticket::{PassSequencer, PassTicket};
use crate::engine::{EngineOptions, RenderEngine};
use crate::epoch::{RenderEpoch, RenderEpochCounter};
use crate::error::{Error, RenderError, Result};
use crate::registry::{DiagramRegistry, DiagramSource, RenderedDiagram};
use crate::scanner::{DiscoveredBlock, SourceScanner};
use crate::settings::RenderSettings;
use crate::theme::ThemeResolver;

const REPORT_CAPACITY: usize = 16;

/// Discovers diagrams on one page and runs render passes over them
pub struct DiagramController {
    page: SharedPage,
    engine: Arc<dyn RenderEngine>,
    settings: RenderSettings,
    scanner: SourceScanner,
    resolver: ThemeResolver,
    registry: RwLock<DiagramRegistry>,
    epochs: RenderEpochCounter,
    sequencer: Arc<PassSequencer>,
    /// Held while checking a ticket and configuring the engine
    engine_gate: Mutex<()>,
    reports: broadcast::Sender<PassReport>,
}

impl DiagramController {
    /// Create a controller; fails if the settings are invalid
    pub fn new(
        page: SharedPage,
        engine: Arc<dyn RenderEngine>,
        settings: RenderSettings,
    ) -> Result<Self> {
        settings.validate()?;
        let (reports, _) = broadcast::channel(REPORT_CAPACITY);
        Ok(Self {
            page,
            engine,
            scanner: SourceScanner::from_settings(&settings),
            resolver: ThemeResolver::from_settings(&settings),
            settings,
            registry: RwLock::new(DiagramRegistry::new()),
            epochs: RenderEpochCounter::new(),
            sequencer: PassSequencer::new(),
            engine_gate: Mutex::new(()),
            reports,
        })
    }

    /// Page this controller renders into
    #[must_use]
    pub fn page(&self) -> &SharedPage {
        &self.page
    }

    /// Active settings
    #[must_use]
    pub fn settings(&self) -> &RenderSettings {
        &self.settings
    }

    /// Owned copy of the registered diagrams
    pub async fn registry_snapshot(&self) -> Vec<RenderedDiagram> {
        self.registry.read().await.snapshot()
    }

    /// Original source registered for a container
    pub async fn lookup(&self, container: NodeId) -> Option<DiagramSource> {
        self.registry.read().await.lookup(container).cloned()
    }

    /// Number of registered diagrams
    pub async fn diagram_count(&self) -> usize {
        self.registry.read().await.len()
    }

    /// Epoch the next pass will reserve
    #[must_use]
    pub fn next_epoch(&self) -> RenderEpoch {
        self.epochs.peek()
    }

    /// Subscribe to reports of finished passes
    #[must_use]
    pub fn subscribe_reports(&self) -> broadcast::Receiver<PassReport> {
        self.reports.subscribe()
    }

    /// Request a pass, superseding every pass requested earlier
    pub fn begin_pass(&self) -> PassTicket {
        self.sequencer.begin()
    }

    /// Replace every new diagram source block with a registered container.
    ///
    /// Returns the number of diagrams registered.
    #[instrument(skip(self))]
    pub async fn discover(&self) -> usize {
        let mut page = self.page.write().await;
        let mut registry = self.registry.write().await;

        let mut registered = 0;
        for block in self.scanner.discover(&page) {
            let position = registry.len();
            match self.substitute(&mut page, &block, position) {
                Ok(container) => {
                    registry.register(container, block.source);
                    registered += 1;
                }
                Err(err) => {
                    warn!(
                        wrapper = %block.wrapper,
                        error = %err,
                        code = err.code(),
                        "Failed to replace diagram source"
                    );
                }
            }
        }

        debug!(registered, total = registry.len(), "Discovery finished");
        registered
    }

    /// Swap the block's wrapper for a container holding the escaped source
    pub(super) fn substitute(
        &self,
        page: &mut Page,
        block: &DiscoveredBlock,
        position: usize,
    ) -> Result<NodeId> {
        let container = page.create_element("div");
        page.set_attribute(container, "class", &self.settings.container_class)?;
        page.set_attribute(container, &self.settings.index_attribute, position.to_string())?;
        page.set_text(container, block.source.as_str())?;
        page.replace_node(block.wrapper, container)?;
        Ok(container)
    }

    /// Discover new diagrams, then render everything registered
    pub async fn discovery_pass(&self) -> PassReport {
        self.discover().await;
        let ticket = self.begin_pass();
        self.render_pass(ticket).await
    }

    /// Re-render every registered diagram without scanning
    pub async fn refresh_pass(&self) -> PassReport {
        let ticket = self.begin_pass();
        self.render_pass(ticket).await
    }

    /// Run one pass under `ticket`
    #[instrument(skip(self, ticket), fields(generation = ticket.generation()))]
    pub async fn render_pass(&self, ticket: PassTicket) -> PassReport {
        let epoch = self.epochs.reserve();

        let (theme, diagrams) = {
            let _gate = self.engine_gate.lock().await;
            if !ticket.is_current() {
                debug!(%epoch, "Pass superseded before configuration");
                return self.publish(PassReport::superseded_before_configuration(epoch));
            }
            let theme = self.resolver.resolve(&*self.page.read().await);
            self.engine
                .initialize(&EngineOptions::from_settings(theme, &self.settings));
            let diagrams = self.registry.read().await.snapshot();
            (theme, diagrams)
        };

        let mut report = PassReport::started(epoch, theme, diagrams.len());
        for (index, diagram) in diagrams.iter().enumerate() {
            if !ticket.is_current() {
                debug!(%epoch, index, "Pass superseded between renders");
                return self.publish(report.supersede());
            }

            let id = epoch.render_id(&self.settings.id_prefix, index);
            let result = self.engine.render(&id, diagram.source.as_str()).await;

            let mut page = self.page.write().await;
            if !ticket.is_current() {
                debug!(%epoch, index, render_id = %id, "Discarding stale render result");
                report.discarded += 1;
                return self.publish(report.supersede());
            }

            let applied = match result {
                Ok(output) => page
                    .set_inner_html(diagram.container, output.markup)
                    .map(|()| true),
                Err(err) => {
                    warn!(render_id = %id, error = %err, "Diagram render failed");
                    page.set_inner_html(diagram.container, self.placeholder(&err))
                        .map(|()| false)
                }
            };
            match applied.map_err(Error::from) {
                Ok(true) => report.rendered += 1,
                Ok(false) => report.failed += 1,
                Err(err) => {
                    warn!(
                        container = %diagram.container,
                        error = %err,
                        code = err.code(),
                        "Failed to update diagram container"
                    );
                    report.failed += 1;
                }
            }
        }

        info!(
            %epoch,
            %theme,
            rendered = report.rendered,
            failed = report.failed,
            "Render pass completed"
        );
        self.publish(report)
    }

    fn placeholder(&self, err: &RenderError) -> String {
        format!(
            "<pre class=\"{}\">Diagram render error: {}</pre>",
            escape_attribute(&self.settings.error_class),
            escape_text(&err.to_string())
        )
    }

    fn publish(&self, report: PassReport) -> PassReport {
        // no subscribers is fine
        let _ = self.reports.send(report.clone());
        report
    }
}

impl std::fmt::Debug for DiagramController {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("DiagramController")
            .field("settings", &self.settings)
            .field("next_epoch", &self.epochs.peek())
            .field("latest_pass", &self.sequencer.latest())
            .finish_non_exhaustive()
    }
}
