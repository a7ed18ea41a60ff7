//! Render pipeline
//!
//! A [`DiagramController`] owns the registry, the epoch counter and the pass
//! sequencer for one page. Passes are requested with a [`PassTicket`];
//! requesting a pass supersedes every pass requested before it:
//!
//! - a stale pass never configures the engine,
//! - a stale pass never writes to the page,
//! - an engine call already in flight is not aborted, its result is dropped.

mod controller;
mod report;
mod ticket;

pub use controller::DiagramController;
pub use report::{PassOutcome, PassReport};
pub use ticket::{PassSequencer, PassTicket};
