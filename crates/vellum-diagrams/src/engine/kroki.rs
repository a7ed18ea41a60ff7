//! Kroki rendering engine
//!
//! Posts diagram sources to a Kroki server and returns the SVG it produces.
//! Engine options are sent as `Kroki-Diagram-Options-*` headers. Kroki
//! picks its own root id for every SVG, so the returned markup is rewritten
//! to carry the render id instead.

use regex::{Captures, Regex};
use reqwest::Client;
use std::sync::{LazyLock, RwLock};
use std::time::Duration;
use tracing::{debug, instrument};
use vellum_page::escape_attribute;

use super::{EngineOptions, RenderEngine, RenderOutput};
use crate::error::{Error, RenderError, Result};
use crate::settings::KrokiConfig;

const OPTION_HEADER_PREFIX: &str = "Kroki-Diagram-Options-";

static ROOT_SVG_TAG: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"<svg\b[^>]*>").expect("ROOT_SVG_TAG is a compile-time constant"));

static ID_ATTRIBUTE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r#"\sid\s*=\s*"([^"]*)""#).expect("ID_ATTRIBUTE is a compile-time constant")
});

/// Engine backed by a Kroki server
pub struct KrokiEngine {
    client: Client,
    config: KrokiConfig,
    options: RwLock<Option<EngineOptions>>,
}

impl KrokiEngine {
    /// Create a new Kroki engine
    pub fn new(config: KrokiConfig) -> Result<Self> {
        let mut builder = Client::builder();
        if config.timeout_secs > 0 {
            builder = builder.timeout(Duration::from_secs(config.timeout_secs));
        }
        let client = builder
            .build()
            .map_err(|e| Error::Engine(format!("failed to build HTTP client: {e}")))?;

        Ok(Self {
            client,
            config,
            options: RwLock::new(None),
        })
    }

    /// Create with default configuration
    pub fn with_defaults() -> Result<Self> {
        Self::new(KrokiConfig::default())
    }

    /// Render endpoint for the configured diagram type
    #[must_use]
    pub fn endpoint(&self) -> String {
        format!(
            "{}/{}/svg",
            self.config.base_url.trim_end_matches('/'),
            self.config.diagram_type
        )
    }

    fn option_headers(&self) -> Vec<(String, String)> {
        let options = self.options.read().unwrap_or_else(|e| e.into_inner());
        options.as_ref().map(option_headers).unwrap_or_default()
    }
}

fn option_headers(options: &EngineOptions) -> Vec<(String, String)> {
    vec![
        (
            format!("{OPTION_HEADER_PREFIX}theme"),
            options.theme.engine_theme().to_string(),
        ),
        (
            format!("{OPTION_HEADER_PREFIX}fontFamily"),
            options.font_family.clone(),
        ),
        (
            format!("{OPTION_HEADER_PREFIX}securityLevel"),
            options.security_level.as_str().to_string(),
        ),
    ]
}

/// Give the root `<svg>` element `id` and point its `#old-id` selectors at it.
///
/// Markup without an `<svg>` tag is returned unchanged.
fn assign_render_id(markup: &str, id: &str) -> String {
    let Some(tag) = ROOT_SVG_TAG.find(markup) else {
        return markup.to_string();
    };
    let id = escape_attribute(id);

    let Some(old) = ID_ATTRIBUTE
        .captures(tag.as_str())
        .and_then(|captures| captures.get(1))
    else {
        let insert_at = tag.start() + "<svg".len();
        return format!(
            "{} id=\"{id}\"{}",
            &markup[..insert_at],
            &markup[insert_at..]
        );
    };

    let start = tag.start() + old.start();
    let end = tag.start() + old.end();
    let rewritten = format!("{}{id}{}", &markup[..start], &markup[end..]);

    let old = old.as_str();
    if old.is_empty() || old == id {
        return rewritten;
    }
    // `#old` followed by a name character is a different id
    match Regex::new(&format!(r"#{}([^\w-]|$)", regex::escape(old))) {
        Ok(selector) => selector
            .replace_all(&rewritten, |caps: &Captures| format!("#{id}{}", &caps[1]))
            .into_owned(),
        Err(err) => {
            debug!(error = %err, "Keeping Kroki selectors unchanged");
            rewritten
        }
    }
}

#[async_trait::async_trait]
impl RenderEngine for KrokiEngine {
    fn initialize(&self, options: &EngineOptions) {
        *self.options.write().unwrap_or_else(|e| e.into_inner()) = Some(options.clone());
    }

    #[instrument(skip(self, source), fields(diagram_type = %self.config.diagram_type))]
    async fn render(&self, id: &str, source: &str) -> std::result::Result<RenderOutput, RenderError> {
        let mut request = self
            .client
            .post(self.endpoint())
            .header("Content-Type", "text/plain")
            .header("Accept", "image/svg+xml");
        for (name, value) in self.option_headers() {
            request = request.header(name, value);
        }

        let response = request
            .body(source.to_string())
            .send()
            .await
            .map_err(|e| RenderError::transport(e.to_string()))?;

        let status = response.status();
        let body = response
            .text()
            .await
            .map_err(|e| RenderError::transport(e.to_string()))?;

        if !status.is_success() {
            debug!(%status, "Kroki rejected diagram");
            let message = body.trim();
            return Err(RenderError::engine(if message.is_empty() {
                format!("Kroki returned status {status}")
            } else {
                message.to_string()
            }));
        }

        Ok(RenderOutput::new(assign_render_id(&body, id)))
    }
}
