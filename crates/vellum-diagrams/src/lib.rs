//! Vellum Diagrams - Live diagram rendering
//!
//! This crate turns diagram source blocks on a [`vellum_page::Page`] into
//! rendered markup and keeps that markup in step with the page theme:
//! - Theme: light/dark resolution from the root attribute or host preference
//! - Scanner: discovery of diagram source blocks and their wrappers
//! - Registry: container to original source mapping
//! - Epoch: unique render identifiers across passes
//! - Engine: rendering engine interface, Kroki and scripted engines
//! - Pipeline: discovery and refresh passes with supersede semantics
//! - Watcher: theme attribute observation triggering refresh passes
//! - Settings: markup contract and engine options
//! - Error: Error types for diagram operations
//!
//! ## Usage
//!
//! ```ignore
//! use std::sync::Arc;
//! use vellum_diagrams::{DiagramController, MockEngine, RenderSettings, ThemeChangeWatcher};
//! use tokio_util::sync::CancellationToken;
//!
//! let page = vellum_page::shared(vellum_page::Page::from_markdown(markdown));
//! let engine = Arc::new(MockEngine::new());
//! let controller = Arc::new(DiagramController::new(page.clone(), engine, RenderSettings::default()));
//!
//! let mutations = page.read().await.subscribe();
//! let report = controller.discovery_pass().await;
//! let watcher = ThemeChangeWatcher::new(controller.clone()).spawn(mutations, CancellationToken::new());
//! ```

#![forbid(unsafe_code)]
#![warn(missing_docs)]

pub mod engine;
pub mod epoch;
pub mod error;
pub mod pipeline;
pub mod registry;
pub mod scanner;
pub mod settings;
pub mod theme;
pub mod watcher;

// Re-export main types
pub use engine::{EngineOptions, MockEngine, RenderCall, RenderEngine, RenderOutput, SecurityLevel};
pub use epoch::{RenderEpoch, RenderEpochCounter};
pub use error::{DiscoveryError, Error, RenderError, Result};
pub use pipeline::{DiagramController, PassOutcome, PassReport, PassSequencer, PassTicket};
pub use registry::{DiagramRegistry, DiagramSource, RenderedDiagram};
pub use scanner::{DiscoveredBlock, SourceScanner};
pub use settings::{KrokiConfig, RenderSettings};
pub use theme::{resolve_theme, Theme, ThemeResolver};
pub use watcher::ThemeChangeWatcher;

#[cfg(feature = "kroki")]
pub use engine::KrokiEngine;
