//! Vellum - Live diagrams for static documentation pages
//!
//! Finds diagram source blocks in a rendered page, replaces them with
//! rendered markup and keeps that markup in step with the page's light/dark
//! theme.
//!
//! ## Usage
//!
//! ```ignore
//! use vellum::{loader, telemetry, LiveDiagrams};
//! use vellum_page::{shared, Page};
//!
//! telemetry::init_tracing();
//! let config = loader::load_config()?;
//! let page = shared(Page::from_markdown(markdown));
//! let (live, report) = LiveDiagrams::activate_with_config(page.clone(), &config).await?;
//!
//! // flipping the root theme marker re-renders every diagram
//! {
//!     let mut page = page.write().await;
//!     let root = page.root();
//!     page.set_attribute(root, "data-theme", "dark")?;
//! }
//!
//! live.shutdown().await;
//! ```

#![forbid(unsafe_code)]
#![warn(missing_docs)]

pub mod activation;
pub mod config;
pub mod loader;
pub mod telemetry;

pub use activation::LiveDiagrams;
pub use config::AppConfig;
pub use loader::{load_config, load_config_from};

pub use vellum_diagrams;
pub use vellum_page;
