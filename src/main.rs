use anyhow::{Context, anyhow, bail};
use chrono::{DateTime, Local};
use clap::Parser;
use once_cell::sync::Lazy;
use regex::Regex;
use std::path::PathBuf;
use std::time::Duration;
use thumbnail_image_browser::config::ViewerConfig;
use thumbnail_image_browser::display_mode::DisplayMode;
use thumbnail_image_browser::sorting::SortKey;
use thumbnail_image_browser::state::AppState;
use thumbnail_image_browser::thumbnail::Thumbnail;
use thumbnail_image_browser::walkable::Entry;

static VIEWPORT_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^(\d+)[xX](\d+)$").expect("valid viewport pattern"));

const PREVIEW_TIMEOUT: Duration = Duration::from_secs(60);

#[derive(Parser, Debug)]
#[command(author, version, about)]
struct Cli {
    /// Directory or ZIP archive to browse
    #[arg(value_name = "SOURCE")]
    source: PathBuf,

    /// Sort key: name, size, modified or properties
    #[arg(long, default_value = "name")]
    sort: SortKey,

    /// Reverse the sort order
    #[arg(long)]
    reverse: bool,

    /// Entry to load into the preview
    #[arg(long, value_name = "NAME")]
    preview: Option<String>,

    /// Display mode: autoresize, actual, small, medium or large
    #[arg(long)]
    mode: Option<DisplayMode>,

    /// Preview viewport size
    #[arg(long, value_name = "WxH", value_parser = parse_viewport)]
    viewport: Option<(u32, u32)>,

    /// Where the previewed image is written
    #[arg(long, value_name = "FILE", default_value = "preview.png")]
    out: PathBuf,

    /// Write all thumbnails into one image
    #[arg(long, value_name = "FILE")]
    contact_sheet: Option<PathBuf>,

    /// Thumbnails per row of the contact sheet
    #[arg(long, default_value_t = 6)]
    columns: u32,

    /// JSON settings file
    #[arg(long, value_name = "FILE")]
    config: Option<PathBuf>,
}

fn parse_viewport(s: &str) -> Result<(u32, u32), String> {
    let caps = VIEWPORT_RE
        .captures(s)
        .ok_or_else(|| format!("expected WIDTHxHEIGHT, got {}", s))?;
    let width = caps[1].parse::<u32>().map_err(|e| e.to_string())?;
    let height = caps[2].parse::<u32>().map_err(|e| e.to_string())?;
    Ok((width, height))
}

fn describe(thumb: &Thumbnail) -> String {
    let modified = match thumb.entry() {
        Entry::File(file) => file
            .modified
            .map(|t| DateTime::<Local>::from(t).format("%Y-%m-%d %H:%M").to_string()),
        Entry::Archive(entry) => entry
            .modified
            .map(|t| t.format("%Y-%m-%d %H:%M").to_string()),
    };
    let dimensions = thumb
        .dimensions()
        .map(|(w, h)| format!("{}x{}", w, h))
        .unwrap_or_else(|| "-".to_string());
    format!(
        "{:<40} {:>10} {:>11} {}",
        thumb.name(),
        thumb.entry().size(),
        dimensions,
        modified.unwrap_or_else(|| "-".to_string())
    )
}

fn main() -> anyhow::Result<()> {
    #[cfg(debug_assertions)]
    env_logger::Builder::from_default_env()
        .filter_level(log::LevelFilter::Debug)
        .init();
    #[cfg(not(debug_assertions))]
    env_logger::init();

    let cli = Cli::parse();

    let mut config = match &cli.config {
        Some(path) => ViewerConfig::load(path)?,
        None => ViewerConfig::default(),
    };
    if let Some(mode) = cli.mode {
        config.display_mode = mode;
    }
    if let Some((width, height)) = cli.viewport {
        config.viewport_width = width;
        config.viewport_height = height;
    }

    let (mut state, mut pane) = AppState::new(&config)?;
    state
        .open(&cli.source)
        .with_context(|| format!("failed to open {}", cli.source.display()))?;

    state.sort_by(cli.sort);
    if cli.reverse {
        state.reverse_sort();
    }

    for thumb in state.grid.thumbnails() {
        println!("{}", describe(thumb));
    }

    if let Some(path) = &cli.contact_sheet {
        state
            .grid
            .contact_sheet(cli.columns)
            .save(path)
            .with_context(|| format!("failed to write {}", path.display()))?;
        log::info!("Contact sheet written to {}", path.display());
    }

    if let Some(name) = &cli.preview {
        let index = state
            .find(name)
            .ok_or_else(|| anyhow!("no entry named {}", name))?;
        state.select(index)?;

        if !pane.wait_until_settled(PREVIEW_TIMEOUT) {
            bail!("preview of {} did not finish", name);
        }
        if let Some(err) = pane.last_error() {
            bail!("preview of {} failed: {}", name, err);
        }
        let image = pane
            .displayed_image()
            .ok_or_else(|| anyhow!("nothing displayed for {}", name))?;
        image
            .save(&cli.out)
            .with_context(|| format!("failed to write {}", cli.out.display()))?;
        println!(
            "Preview {} ({}x{}, {}) written to {}",
            name,
            image.width(),
            image.height(),
            state.preview.display_mode(),
            cli.out.display()
        );
    }

    Ok(())
}
