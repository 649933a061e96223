//! Thumbnails: one child item plus its rendered bitmap.

use crate::error::Result;
use crate::image_loader;
use crate::walkable::Entry;
use image::{DynamicImage, RgbaImage};
use log::warn;

/// A child item of the grid with the small bitmap rendered for it.
#[derive(Debug, Clone)]
pub struct Thumbnail {
    entry: Entry,
    bitmap: Option<RgbaImage>,
    /// Dimensions of the full source image, when it could be decoded.
    dimensions: Option<(u32, u32)>,
}

impl Thumbnail {
    pub fn new(entry: Entry, bitmap: Option<RgbaImage>, dimensions: Option<(u32, u32)>) -> Self {
        Self {
            entry,
            bitmap,
            dimensions,
        }
    }

    /// Renders the thumbnail for `entry` into a `size`×`size` square.
    ///
    /// Walkable children and undecodable images get no bitmap.
    pub fn render(entry: Entry, size: u32) -> Self {
        if entry.is_walkable() {
            return Self::new(entry, None, None);
        }
        match decode_entry(&entry) {
            Ok(image) => {
                let dimensions = Some((image.width(), image.height()));
                let bitmap = Some(image.thumbnail(size, size).to_rgba8());
                Self::new(entry, bitmap, dimensions)
            }
            Err(e) => {
                warn!("No thumbnail for {}: {}", entry.name(), e);
                Self::new(entry, None, None)
            }
        }
    }

    pub fn entry(&self) -> &Entry {
        &self.entry
    }

    pub fn name(&self) -> &str {
        self.entry.name()
    }

    pub fn bitmap(&self) -> Option<&RgbaImage> {
        self.bitmap.as_ref()
    }

    pub fn dimensions(&self) -> Option<(u32, u32)> {
        self.dimensions
    }
}

fn decode_entry(entry: &Entry) -> Result<DynamicImage> {
    match entry {
        Entry::File(file) => image_loader::decode_file(&file.path),
        Entry::Archive(archive_entry) => image_loader::decode_bytes(&archive_entry.read()?),
    }
}
