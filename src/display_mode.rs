//! Display modes of the preview pane and the bounds they scale into.

use serde::Deserialize;
use std::fmt;
use std::str::FromStr;

/// Width and height of a display region in pixels.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Bounds {
    pub width: u32,
    pub height: u32,
}

impl Bounds {
    pub const fn new(width: u32, height: u32) -> Self {
        Self { width, height }
    }

    pub fn is_empty(&self) -> bool {
        self.width == 0 || self.height == 0
    }
}

/// Scrollbar visibility of the preview viewport.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ScrollbarPolicy {
    Never,
    AsNeeded,
}

/// How a loaded image is fit into the preview area.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Deserialize)]
#[serde(try_from = "String")]
pub enum DisplayMode {
    /// Follow the viewport, growing or shrinking the image to fit it.
    #[default]
    Autoresize,
    /// Original pixels, no scaling.
    ActualSize,
    Small,
    Medium,
    Large,
}

impl DisplayMode {
    pub const ALL: [DisplayMode; 5] = [
        DisplayMode::Autoresize,
        DisplayMode::ActualSize,
        DisplayMode::Small,
        DisplayMode::Medium,
        DisplayMode::Large,
    ];

    /// Menu label.
    pub fn label(&self) -> &'static str {
        match self {
            DisplayMode::Autoresize => "Autoresize",
            DisplayMode::ActualSize => "Actual size",
            DisplayMode::Small => "Small (320x240)",
            DisplayMode::Medium => "Medium (640x480)",
            DisplayMode::Large => "Large (1024x768)",
        }
    }

    /// Fixed bounds of the mode. `Autoresize` takes the viewport instead and
    /// `ActualSize` is unbounded.
    pub fn bounds(&self) -> Option<Bounds> {
        match self {
            DisplayMode::Small => Some(Bounds::new(320, 240)),
            DisplayMode::Medium => Some(Bounds::new(640, 480)),
            DisplayMode::Large => Some(Bounds::new(1024, 768)),
            DisplayMode::Autoresize | DisplayMode::ActualSize => None,
        }
    }

    /// Whether scaling may enlarge the image beyond its original resolution.
    pub fn allows_growth(&self) -> bool {
        matches!(self, DisplayMode::Autoresize)
    }

    pub fn scrollbar_policy(&self) -> ScrollbarPolicy {
        match self {
            DisplayMode::Autoresize => ScrollbarPolicy::Never,
            _ => ScrollbarPolicy::AsNeeded,
        }
    }
}

impl fmt::Display for DisplayMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

impl FromStr for DisplayMode {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "autoresize" | "auto" => Ok(DisplayMode::Autoresize),
            "actual" | "actual-size" | "actualsize" => Ok(DisplayMode::ActualSize),
            "small" => Ok(DisplayMode::Small),
            "medium" => Ok(DisplayMode::Medium),
            "large" => Ok(DisplayMode::Large),
            other => Err(format!("unknown display mode: {}", other)),
        }
    }
}

impl TryFrom<String> for DisplayMode {
    type Error = String;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        value.parse()
    }
}
