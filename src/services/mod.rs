//! Service layer for background work.
//!
//! Separates the worker-side pipeline from the UI-side state it reports to.

pub mod preview_service;

pub use preview_service::{PreviewEvent, PreviewEventKind, PreviewPipeline};
