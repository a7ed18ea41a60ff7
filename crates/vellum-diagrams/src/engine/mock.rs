//! Scripted engine for tests and offline use
//!
//! Renders every diagram to a small `<svg>` that records the render id and
//! the theme it was configured with. Renders can be held back with a gate
//! to exercise overlapping passes.

use std::collections::HashMap;
use std::sync::Mutex;
use tokio::sync::{watch, Semaphore};
use vellum_page::escape_text;

use super::{EngineOptions, RenderEngine, RenderOutput};
use crate::error::RenderError;
use crate::theme::Theme;

/// One observed `render` call
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RenderCall {
    /// Render identifier
    pub id: String,
    /// Source text passed to the engine
    pub source: String,
    /// Theme configured when the call started
    pub theme: Option<Theme>,
}

/// An engine that renders deterministic markup and records every call
pub struct MockEngine {
    options: Mutex<Option<EngineOptions>>,
    initialize_calls: Mutex<Vec<EngineOptions>>,
    render_calls: Mutex<Vec<RenderCall>>,
    failures: Mutex<HashMap<String, String>>,
    gate: Option<Semaphore>,
    started: watch::Sender<usize>,
}

impl Default for MockEngine {
    fn default() -> Self {
        Self::new()
    }
}

impl MockEngine {
    /// Create an engine that renders immediately
    #[must_use]
    pub fn new() -> Self {
        Self::build(None)
    }

    /// Create an engine whose renders wait for [`MockEngine::release`]
    #[must_use]
    pub fn gated() -> Self {
        Self::build(Some(Semaphore::new(0)))
    }

    fn build(gate: Option<Semaphore>) -> Self {
        let (started, _) = watch::channel(0);
        Self {
            options: Mutex::new(None),
            initialize_calls: Mutex::new(Vec::new()),
            render_calls: Mutex::new(Vec::new()),
            failures: Mutex::new(HashMap::new()),
            gate,
            started,
        }
    }

    /// Fail every render of `source` with `message`
    #[must_use]
    pub fn with_failure(self, source: impl Into<String>, message: impl Into<String>) -> Self {
        self.failures
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .insert(source.into(), message.into());
        self
    }

    /// Let `count` gated renders complete
    pub fn release(&self, count: usize) {
        if let Some(gate) = &self.gate {
            gate.add_permits(count);
        }
    }

    /// Wait until at least `count` renders have started
    pub async fn wait_for_renders(&self, count: usize) {
        let mut started = self.started.subscribe();
        // sender lives as long as self
        let _ = started.wait_for(|n| *n >= count).await;
    }

    /// Options passed to every `initialize` call, in order
    #[must_use]
    pub fn initialize_calls(&self) -> Vec<EngineOptions> {
        self.initialize_calls
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .clone()
    }

    /// Every `render` call, in start order
    #[must_use]
    pub fn render_calls(&self) -> Vec<RenderCall> {
        self.render_calls
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .clone()
    }

    /// Currently configured theme
    #[must_use]
    pub fn current_theme(&self) -> Option<Theme> {
        self.options
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .as_ref()
            .map(|options| options.theme)
    }
}

#[async_trait::async_trait]
impl RenderEngine for MockEngine {
    fn initialize(&self, options: &EngineOptions) {
        *self.options.lock().unwrap_or_else(|e| e.into_inner()) = Some(options.clone());
        self.initialize_calls
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .push(options.clone());
    }

    async fn render(&self, id: &str, source: &str) -> Result<RenderOutput, RenderError> {
        let theme = self.current_theme();
        self.render_calls
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .push(RenderCall {
                id: id.to_string(),
                source: source.to_string(),
                theme,
            });
        self.started.send_modify(|n| *n += 1);

        if let Some(gate) = &self.gate {
            if let Ok(permit) = gate.acquire().await {
                permit.forget();
            }
        }

        let failure = self
            .failures
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .get(source)
            .cloned();
        if let Some(message) = failure {
            return Err(RenderError::engine(message));
        }
        if source.trim().is_empty() {
            return Err(RenderError::engine(format!(
                "No diagram type detected matching given configuration for text: {source}"
            )));
        }

        let engine_theme = theme.unwrap_or(Theme::Light).engine_theme();
        Ok(RenderOutput::new(format!(
            "<svg id=\"{id}\" data-theme=\"{engine_theme}\"><text>{}</text></svg>",
            escape_text(source.trim())
        )))
    }
}
