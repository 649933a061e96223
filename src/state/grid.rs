//! Thumbnail grid state: the current source, its thumbnails and the selection.

use crate::config::THUMB_MARGIN;
use crate::error::{AppError, Result};
use crate::file_utils::PathExt;
use crate::image_loader::ImageSource;
use crate::sorting::Comparator;
use crate::thumbnail::Thumbnail;
use crate::walkable::{Entry, Walkable};
use image::{Rgba, RgbaImage, imageops};
use log::{debug, info, warn};
use rayon::ThreadPool;
use rayon::prelude::*;
use std::fs;
use std::sync::Arc;

/// Manages the thumbnails of one walkable source.
pub struct ThumbnailGrid {
    source: Option<Walkable>,
    thumbnails: Vec<Thumbnail>,
    selected: Option<usize>,
    thumb_size: u32,
    pool: Arc<ThreadPool>,
}

impl ThumbnailGrid {
    pub fn new(thumb_size: u32, pool: Arc<ThreadPool>) -> Self {
        Self {
            source: None,
            thumbnails: Vec::new(),
            selected: None,
            thumb_size,
            pool,
        }
    }

    pub fn source(&self) -> Option<&Walkable> {
        self.source.as_ref()
    }

    pub fn thumbnails(&self) -> &[Thumbnail] {
        &self.thumbnails
    }

    pub fn names(&self) -> Vec<&str> {
        self.thumbnails.iter().map(Thumbnail::name).collect()
    }

    pub fn len(&self) -> usize {
        self.thumbnails.len()
    }

    pub fn is_empty(&self) -> bool {
        self.thumbnails.is_empty()
    }

    pub fn selected(&self) -> Option<usize> {
        self.selected
    }

    pub fn thumb_size(&self) -> u32 {
        self.thumb_size
    }

    /// Replaces the grid content with the children of `walkable`. `None` is ignored.
    pub fn set_source(&mut self, walkable: Option<Walkable>) -> Result<()> {
        let Some(walkable) = walkable else {
            return Ok(());
        };
        let start = std::time::Instant::now();
        let children = walkable.children()?;
        let size = self.thumb_size;

        self.thumbnails.clear();
        self.selected = None;
        self.thumbnails = self.pool.install(|| {
            children
                .into_par_iter()
                .map(|entry| Thumbnail::render(entry, size))
                .collect()
        });
        info!(
            "Loaded {} thumbnails from {} in {:?}",
            self.thumbnails.len(),
            walkable.path().format_for_log(),
            start.elapsed()
        );
        self.source = Some(walkable);
        Ok(())
    }

    /// Re-reads the current source.
    pub fn refresh(&mut self) -> Result<()> {
        let source = self.source.clone();
        self.set_source(source)
    }

    /// Stable sort, ties keep their current order.
    pub fn sort(&mut self, comparator: &Comparator) {
        let selected = self.selected.map(|i| self.thumbnails[i].entry().clone());
        self.thumbnails.sort_by(|a, b| comparator.compare(a, b));
        self.selected = selected.and_then(|entry| {
            self.thumbnails.iter().position(|t| *t.entry() == entry)
        });
        debug!("Sorted grid with {:?}", comparator);
    }

    fn thumbnail(&self, index: usize) -> Result<&Thumbnail> {
        self.thumbnails
            .get(index)
            .ok_or_else(|| AppError::Unsupported(format!("no thumbnail at index {}", index)))
    }

    /// Selects a thumbnail and returns the image to preview, if it has one.
    pub fn select(&mut self, index: usize) -> Result<Option<ImageSource>> {
        let entry = self.thumbnail(index)?.entry().clone();
        self.selected = Some(index);
        match entry {
            Entry::File(file) if file.walkable => Ok(None),
            Entry::File(file) => Ok(Some(ImageSource::File(file.path))),
            Entry::Archive(archive_entry) => Ok(Some(ImageSource::from_bytes(archive_entry.read()?))),
        }
    }

    /// Opens a walkable child as the new source. Returns whether it was one.
    pub fn activate(&mut self, index: usize) -> Result<bool> {
        let walkable = match self.thumbnail(index)?.entry() {
            Entry::File(file) if file.walkable => Walkable::from_path(&file.path),
            _ => None,
        };
        match walkable {
            Some(walkable) => {
                self.set_source(Some(walkable))?;
                Ok(true)
            }
            None => Ok(false),
        }
    }

    /// Deletes a file from disk and drops its thumbnail.
    pub fn delete(&mut self, index: usize) -> Result<()> {
        let path = match self.thumbnail(index)?.entry() {
            Entry::File(file) => file.path.clone(),
            Entry::Archive(entry) => {
                return Err(AppError::Unsupported(format!(
                    "cannot delete archive entry {}",
                    entry.name
                )));
            }
        };

        let removed = if path.is_dir() {
            fs::remove_dir_all(&path)
        } else {
            fs::remove_file(&path)
        };
        if let Err(e) = removed {
            warn!("Could not delete {}: {}", path.format_for_log(), e);
        }

        self.thumbnails.remove(index);
        self.selected = match self.selected {
            Some(i) if i == index => None,
            Some(i) if i > index => Some(i - 1),
            other => other,
        };
        Ok(())
    }

    pub fn set_thumb_size(&mut self, thumb_size: u32) -> Result<()> {
        self.thumb_size = thumb_size.max(1);
        self.refresh()
    }

    /// Shrinks thumbnails that no longer fit next to the scrollbar.
    /// Returns whether the size changed.
    pub fn resize_viewport(&mut self, width: u32, scrollbar_width: u32) -> Result<bool> {
        let needed = self.thumb_size + 2 * THUMB_MARGIN + scrollbar_width;
        if needed <= width {
            return Ok(false);
        }
        let size = width.saturating_sub(2 * THUMB_MARGIN + scrollbar_width);
        self.set_thumb_size(size)?;
        Ok(true)
    }

    /// Lays the thumbnails out left to right in rows of `columns` cells.
    /// There are never more columns than thumbnails.
    pub fn contact_sheet(&self, columns: u32) -> RgbaImage {
        let count = u32::try_from(self.thumbnails.len()).unwrap_or(u32::MAX);
        let columns = columns.clamp(1, count.max(1));
        let cell = self.thumb_size + 2 * THUMB_MARGIN;
        let rows = count.div_ceil(columns).max(1);
        let mut sheet = RgbaImage::from_pixel(columns * cell, rows * cell, Rgba([255, 255, 255, 255]));

        for (i, thumb) in self.thumbnails.iter().enumerate() {
            let Some(bitmap) = thumb.bitmap() else {
                continue;
            };
            let col = i as u32 % columns;
            let row = i as u32 / columns;
            let x = col * cell + THUMB_MARGIN + self.thumb_size.saturating_sub(bitmap.width()) / 2;
            let y = row * cell + THUMB_MARGIN + self.thumb_size.saturating_sub(bitmap.height()) / 2;
            imageops::overlay(&mut sheet, bitmap, i64::from(x), i64::from(y));
        }
        sheet
    }
}
