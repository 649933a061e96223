//! Thumbnail browsing for image folders and ZIP archives with a background
//! preview pipeline.

pub mod config;
pub mod display_mode;
pub mod error;
pub mod file_utils;
pub mod image_cache;
pub mod image_loader;
pub mod services;
pub mod sorting;
pub mod state;
pub mod thumbnail;
pub mod ui;
pub mod walkable;
