//! Application configuration constants and the optional JSON settings file.

use crate::display_mode::DisplayMode;
use crate::error::{AppError, Result};
use serde::Deserialize;
use std::fs;
use std::path::Path;

/// Supported image file extensions for scanning directories and archives.
pub const SUPPORTED_IMAGE_EXTENSIONS: [&str; 6] = ["jpg", "jpeg", "png", "gif", "bmp", "webp"];

/// Extension of archives that can be browsed like directories.
pub const ARCHIVE_EXTENSION: &str = "zip";

/// Edge length of a square thumbnail in pixels.
pub const DEFAULT_THUMB_SIZE: u32 = 135;

/// Gap around every thumbnail in the grid.
pub const THUMB_MARGIN: u32 = 10;

const DEFAULT_SCALED_CACHE_CAPACITY: usize = 4;
const DEFAULT_VIEWPORT: (u32, u32) = (800, 600);

/// User-tunable settings. Every field falls back to its default when absent.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(default)]
pub struct ViewerConfig {
    pub thumb_size: u32,
    /// Worker pool size; `None` lets rayon pick one thread per core.
    pub worker_threads: Option<usize>,
    pub display_mode: DisplayMode,
    /// Number of scaled derivatives kept for the current image.
    pub scaled_cache_capacity: usize,
    pub viewport_width: u32,
    pub viewport_height: u32,
}

impl Default for ViewerConfig {
    fn default() -> Self {
        Self {
            thumb_size: DEFAULT_THUMB_SIZE,
            worker_threads: None,
            display_mode: DisplayMode::default(),
            scaled_cache_capacity: DEFAULT_SCALED_CACHE_CAPACITY,
            viewport_width: DEFAULT_VIEWPORT.0,
            viewport_height: DEFAULT_VIEWPORT.1,
        }
    }
}

impl ViewerConfig {
    /// Reads settings from a JSON file.
    pub fn load(path: &Path) -> Result<Self> {
        let raw = fs::read_to_string(path).map_err(|e| {
            AppError::Config(format!("failed to read {}: {}", path.display(), e))
        })?;
        Self::from_json(&raw)
    }

    /// Parses settings from a JSON document and validates them.
    pub fn from_json(raw: &str) -> Result<Self> {
        let config: ViewerConfig =
            serde_json::from_str(raw).map_err(|e| AppError::Config(e.to_string()))?;
        config.validate()?;
        Ok(config)
    }

    fn validate(&self) -> Result<()> {
        if self.thumb_size == 0 {
            return Err(AppError::Config("thumb_size must be positive".to_string()));
        }
        if self.scaled_cache_capacity == 0 {
            return Err(AppError::Config(
                "scaled_cache_capacity must be positive".to_string(),
            ));
        }
        if self.worker_threads == Some(0) {
            return Err(AppError::Config(
                "worker_threads must be positive when set".to_string(),
            ));
        }
        Ok(())
    }
}
