//! Activation entry point
//!
//! Wires a page, an engine and the settings into a running instance: the
//! page is scanned once, a theme watcher is started and the first render
//! pass runs before `activate` returns.

use anyhow::{Context, Result};
use std::sync::Arc;
use tokio::sync::broadcast;
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;
use tracing::{info, instrument, warn};
use vellum_diagrams::{
    DiagramController, PassReport, RenderEngine, RenderSettings, RenderedDiagram,
    ThemeChangeWatcher,
};
use vellum_page::SharedPage;

#[cfg(feature = "kroki")]
use crate::config::AppConfig;

/// Live diagrams on one page
#[derive(Debug)]
pub struct LiveDiagrams {
    controller: Arc<DiagramController>,
    cancel: CancellationToken,
    watcher: JoinHandle<()>,
}

impl LiveDiagrams {
    /// Discover diagrams, start the theme watcher and run the first pass.
    ///
    /// Returns the handle with the report of the first pass.
    #[instrument(skip_all)]
    pub async fn activate(
        page: SharedPage,
        engine: Arc<dyn RenderEngine>,
        settings: RenderSettings,
    ) -> Result<(Self, PassReport)> {
        let controller = Arc::new(
            DiagramController::new(Arc::clone(&page), engine, settings)
                .context("Failed to create diagram controller")?,
        );

        // subscribe before touching the page so no theme change is missed
        let mutations = page.read().await.subscribe();
        let discovered = controller.discover().await;
        let ticket = controller.begin_pass();

        let cancel = CancellationToken::new();
        let watcher =
            ThemeChangeWatcher::new(Arc::clone(&controller)).spawn(mutations, cancel.child_token());

        let report = controller.render_pass(ticket).await;
        info!(
            discovered,
            rendered = report.rendered,
            failed = report.failed,
            "Live diagrams activated"
        );

        Ok((
            Self {
                controller,
                cancel,
                watcher,
            },
            report,
        ))
    }

    /// Activate with the Kroki engine described by `config`
    #[cfg(feature = "kroki")]
    pub async fn activate_with_config(
        page: SharedPage,
        config: &AppConfig,
    ) -> Result<(Self, PassReport)> {
        config.validate()?;
        let engine = vellum_diagrams::KrokiEngine::new(config.kroki.clone())
            .context("Failed to create Kroki engine")?;
        Self::activate(page, Arc::new(engine), config.diagrams.clone()).await
    }

    /// Controller driving this page
    #[must_use]
    pub fn controller(&self) -> &Arc<DiagramController> {
        &self.controller
    }

    /// Registered diagrams with their original sources
    pub async fn diagrams(&self) -> Vec<RenderedDiagram> {
        self.controller.registry_snapshot().await
    }

    /// Re-render every registered diagram, superseding any running pass
    pub async fn refresh(&self) -> PassReport {
        self.controller.refresh_pass().await
    }

    /// Subscribe to reports of finished passes
    #[must_use]
    pub fn subscribe_reports(&self) -> broadcast::Receiver<PassReport> {
        self.controller.subscribe_reports()
    }

    /// Whether the theme watcher is still running
    #[must_use]
    pub fn is_watching(&self) -> bool {
        !self.watcher.is_finished()
    }

    /// Stop the theme watcher and wait for it to exit
    pub async fn shutdown(self) {
        self.cancel.cancel();
        if let Err(err) = self.watcher.await {
            warn!(error = %err, "Theme watcher task failed");
        }
        info!("Live diagrams stopped");
    }
}
