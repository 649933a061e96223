//! State management for the image browser.

use crate::config::ViewerConfig;
use crate::display_mode::Bounds;
use crate::error::{AppError, Result};
use crate::image_cache::ImageCache;
use crate::services::PreviewPipeline;
use crate::sorting::{Comparator, SortContext, SortKey};
use crate::ui::PreviewPane;
use crate::walkable::Walkable;
use std::path::Path;
use std::sync::atomic::AtomicU64;
use std::sync::{Arc, Mutex};

pub mod grid;

pub use grid::ThumbnailGrid;

/// Application-wide state container.
pub struct AppState {
    pub grid: ThumbnailGrid,
    /// Sort selection for the grid's current source.
    pub sort: SortContext,
    pub preview: PreviewPipeline,
}

impl AppState {
    /// Builds the worker pool and wires the preview pipeline to a new pane.
    /// The pane must stay on the thread that owns the UI.
    pub fn new(config: &ViewerConfig) -> Result<(Self, PreviewPane)> {
        let mut builder = rayon::ThreadPoolBuilder::new()
            .thread_name(|i| format!("preview-worker-{}", i));
        if let Some(threads) = config.worker_threads {
            builder = builder.num_threads(threads);
        }
        let pool = Arc::new(
            builder
                .build()
                .map_err(|e| AppError::Threading(e.to_string()))?,
        );

        let (tx, rx) = crossbeam_channel::unbounded();
        let latest = Arc::new(AtomicU64::new(0));
        let cache = Arc::new(Mutex::new(ImageCache::new(config.scaled_cache_capacity)));
        let preview = PreviewPipeline::new(
            cache,
            pool.clone(),
            tx,
            latest.clone(),
            config.display_mode,
            Bounds::new(config.viewport_width, config.viewport_height),
        );

        let state = Self {
            grid: ThumbnailGrid::new(config.thumb_size, pool),
            sort: SortContext::default(),
            preview,
        };
        Ok((state, PreviewPane::new(rx, latest, true)))
    }

    /// Opens a directory or archive in the grid.
    pub fn open(&mut self, path: &Path) -> Result<()> {
        let walkable = Walkable::from_path(path).ok_or_else(|| {
            AppError::Unsupported(format!("{} is not a directory or archive", path.display()))
        })?;
        self.sort.set_kind(walkable.kind());
        self.grid.set_source(Some(walkable))
    }

    /// Sorts the grid by `key` for the current source kind.
    pub fn sort_by(&mut self, key: SortKey) -> Comparator {
        let comparator = self.sort.select(key);
        self.grid.sort(&comparator);
        comparator
    }

    /// Reverses the last sort. Does nothing if the grid was never sorted.
    pub fn reverse_sort(&mut self) -> Option<Comparator> {
        let comparator = self.sort.reverse()?;
        self.grid.sort(&comparator);
        Some(comparator)
    }

    /// Selects a thumbnail: previews images, descends into folders and archives.
    pub fn select(&mut self, index: usize) -> Result<()> {
        match self.grid.select(index)? {
            Some(source) => self.preview.set_source(source),
            None => {
                self.grid.activate(index)?;
                if let Some(source) = self.grid.source() {
                    self.sort.set_kind(source.kind());
                }
            }
        }
        Ok(())
    }

    /// Index of the first thumbnail with this name.
    pub fn find(&self, name: &str) -> Option<usize> {
        self.grid.thumbnails().iter().position(|t| t.name() == name)
    }
}
