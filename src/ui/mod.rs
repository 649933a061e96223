//! UI-thread side of the browser.
//!
//! Threading model:
//! - rayon worker pool: image decoding, scaling and thumbnail rendering
//! - crossbeam channel: results travel from the workers to the UI thread
//! - `PreviewPane`: the only place the displayed bitmap is swapped; it runs on
//!   whichever thread owns the event loop

pub mod preview_pane;

pub use preview_pane::{Cursor, PreviewPane};
