//! Single-slot image cache for the preview pane.
//!
//! Holds at most one decoded image, the one currently previewed, plus its
//! scaled derivatives keyed by display mode. Loading a new source replaces
//! everything; a failed load leaves the previous image in place.

use crate::display_mode::{Bounds, DisplayMode};
use crate::error::Result;
use crate::image_loader::{self, ImageSource, SourceId};
use image::DynamicImage;
use image::imageops::FilterType;
use lru::LruCache;
use std::num::NonZeroUsize;
use std::sync::Arc;

/// What an image is scaled into.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ScaleTarget {
    /// Autoresize into the preview container's current size.
    Viewport(Bounds),
    /// A display mode's own bounds. `Autoresize` here has no container and
    /// leaves the image at its original size.
    Mode(DisplayMode),
}

impl ScaleTarget {
    pub fn resolve(mode: DisplayMode, viewport: Bounds) -> Self {
        match mode {
            DisplayMode::Autoresize => ScaleTarget::Viewport(viewport),
            other => ScaleTarget::Mode(other),
        }
    }

    /// Cache slot of the derivative produced for this target.
    pub fn mode(&self) -> DisplayMode {
        match self {
            ScaleTarget::Viewport(_) => DisplayMode::Autoresize,
            ScaleTarget::Mode(mode) => *mode,
        }
    }
}

/// Dimensions of `(width, height)` scaled to fit `bounds` with the aspect
/// ratio kept. Without `grow` the result never exceeds the original size.
pub fn fit_dimensions(width: u32, height: u32, bounds: Bounds, grow: bool) -> (u32, u32) {
    if width == 0 || height == 0 {
        return (width, height);
    }
    let ratio = f64::min(
        f64::from(bounds.width) / f64::from(width),
        f64::from(bounds.height) / f64::from(height),
    );
    if ratio >= 1.0 && !grow {
        return (width, height);
    }
    let scaled = |side: u32, limit: u32| {
        ((f64::from(side) * ratio).round() as u32).clamp(1, limit.max(1))
    };
    (scaled(width, bounds.width), scaled(height, bounds.height))
}

/// Scales `image` proportionally for `target`. Returns `None` for a missing
/// image or an empty viewport.
pub fn proportional_scale(image: Option<&DynamicImage>, target: ScaleTarget) -> Option<DynamicImage> {
    let image = image?;
    let (bounds, grow) = match target {
        ScaleTarget::Viewport(bounds) => (Some(bounds), true),
        ScaleTarget::Mode(mode) => (mode.bounds(), mode.allows_growth()),
    };
    let Some(bounds) = bounds else {
        return Some(image.clone());
    };
    if bounds.is_empty() {
        return None;
    }
    let (width, height) = fit_dimensions(image.width(), image.height(), bounds, grow);
    if (width, height) == (image.width(), image.height()) {
        return Some(image.clone());
    }
    Some(image.resize_exact(width, height, FilterType::Triangle))
}

#[derive(Clone)]
struct ScaledImage {
    target: ScaleTarget,
    image: Arc<DynamicImage>,
}

/// The preview's single resident image and its scaled derivatives.
pub struct ImageCache {
    current: Option<Arc<DynamicImage>>,
    current_id: Option<SourceId>,
    scaled: LruCache<DisplayMode, ScaledImage>,
}

impl ImageCache {
    /// Creates an empty cache keeping up to `capacity` scaled derivatives.
    pub fn new(capacity: usize) -> Self {
        let capacity = NonZeroUsize::new(capacity).unwrap_or(NonZeroUsize::MIN);
        Self {
            current: None,
            current_id: None,
            scaled: LruCache::new(capacity),
        }
    }

    /// Decodes `source` and makes it the current image.
    pub fn load(&mut self, source: ImageSource) -> Result<()> {
        let id = source.id();
        let image = image_loader::decode(source)?;
        self.install(id, image);
        Ok(())
    }

    /// Replaces the current image with an already decoded one.
    pub fn install(&mut self, id: SourceId, image: DynamicImage) {
        log::info!(
            "Cache PUT: {:?} ({}x{})",
            id,
            image.width(),
            image.height()
        );
        self.current = Some(Arc::new(image));
        self.current_id = Some(id);
        self.scaled.clear();
    }

    /// Installs a bitmap that has no source identity.
    pub fn set_current_image(&mut self, image: DynamicImage) {
        self.install(SourceId::unique(), image);
    }

    pub fn current_image(&self) -> Option<Arc<DynamicImage>> {
        self.current.clone()
    }

    /// True only if `id` is the identity of the last successful load.
    pub fn is_cached(&self, id: &SourceId) -> bool {
        let hit = self.current_id.as_ref() == Some(id);
        if hit {
            log::info!("Cache HIT: {:?}", id);
        } else {
            log::info!("Cache MISS: {:?}", id);
        }
        hit
    }

    /// Derivative previously stored for exactly this target.
    pub fn lookup_scaled(&mut self, target: ScaleTarget) -> Option<Arc<DynamicImage>> {
        self.scaled
            .get(&target.mode())
            .filter(|scaled| scaled.target == target)
            .map(|scaled| scaled.image.clone())
    }

    pub fn store_scaled(&mut self, target: ScaleTarget, image: Arc<DynamicImage>) {
        self.scaled.put(target.mode(), ScaledImage { target, image });
    }

    /// Scales the current image for `target`, reusing a stored derivative.
    pub fn scaled(&mut self, target: ScaleTarget) -> Option<Arc<DynamicImage>> {
        if let Some(hit) = self.lookup_scaled(target) {
            return Some(hit);
        }
        let image = Arc::new(proportional_scale(self.current.as_deref(), target)?);
        self.store_scaled(target, image.clone());
        Some(image)
    }

    /// The stored autoresize derivative, whatever viewport it was made for.
    pub fn autoscale_image(&self) -> Option<Arc<DynamicImage>> {
        self.scaled
            .peek(&DisplayMode::Autoresize)
            .map(|scaled| scaled.image.clone())
    }

    /// Drops the autoresize derivative, keeping the full-resolution image.
    pub fn reset_autoscale_image(&mut self) {
        self.scaled.pop(&DisplayMode::Autoresize);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::AppError;
    use std::io::Cursor;
    use std::path::PathBuf;

    fn png_file(dir: &std::path::Path, name: &str, width: u32, height: u32) -> PathBuf {
        let path = dir.join(name);
        image::RgbImage::new(width, height).save(&path).unwrap();
        path
    }

    fn assert_aspect(orig: (u32, u32), scaled: (u32, u32)) {
        let expected_h = f64::from(scaled.0) * f64::from(orig.1) / f64::from(orig.0);
        assert!(
            (expected_h - f64::from(scaled.1)).abs() <= 1.0,
            "{:?} -> {:?}",
            orig,
            scaled
        );
    }

    #[test]
    fn landscape_into_square() {
        let img = DynamicImage::new_rgb8(400, 200);
        let out = proportional_scale(Some(&img), ScaleTarget::Viewport(Bounds::new(100, 100)))
            .unwrap();
        assert_eq!((out.width(), out.height()), (100, 50));
        assert_aspect((400, 200), (out.width(), out.height()));
    }

    #[test]
    fn portrait_into_landscape() {
        let img = DynamicImage::new_rgb8(200, 400);
        let out = proportional_scale(Some(&img), ScaleTarget::Viewport(Bounds::new(300, 150)))
            .unwrap();
        assert_eq!((out.width(), out.height()), (75, 150));
        assert_aspect((200, 400), (out.width(), out.height()));
    }

    #[test]
    fn exact_fit_keeps_dimensions() {
        let img = DynamicImage::new_rgb8(640, 480);
        let out = proportional_scale(Some(&img), ScaleTarget::Mode(DisplayMode::Medium)).unwrap();
        assert_eq!((out.width(), out.height()), (640, 480));
    }

    #[test]
    fn fixed_modes_never_upscale() {
        let img = DynamicImage::new_rgb8(100, 50);
        let out = proportional_scale(Some(&img), ScaleTarget::Mode(DisplayMode::Large)).unwrap();
        assert_eq!((out.width(), out.height()), (100, 50));
    }

    #[test]
    fn autoresize_grows_to_fit() {
        let img = DynamicImage::new_rgb8(100, 50);
        let out = proportional_scale(Some(&img), ScaleTarget::Viewport(Bounds::new(400, 400)))
            .unwrap();
        assert_eq!((out.width(), out.height()), (400, 200));
    }

    #[test]
    fn actual_size_is_untouched() {
        let img = DynamicImage::new_rgb8(5000, 10);
        let out =
            proportional_scale(Some(&img), ScaleTarget::Mode(DisplayMode::ActualSize)).unwrap();
        assert_eq!((out.width(), out.height()), (5000, 10));
    }

    #[test]
    fn missing_image_scales_to_none() {
        for mode in DisplayMode::ALL {
            assert!(proportional_scale(None, ScaleTarget::Mode(mode)).is_none());
        }
        assert!(proportional_scale(None, ScaleTarget::Viewport(Bounds::new(10, 10))).is_none());
    }

    #[test]
    fn empty_viewport_scales_to_none() {
        let img = DynamicImage::new_rgb8(10, 10);
        assert!(proportional_scale(Some(&img), ScaleTarget::Viewport(Bounds::new(0, 10))).is_none());
    }

    #[test]
    fn single_slot_eviction() {
        let dir = tempfile::tempdir().unwrap();
        let a = png_file(dir.path(), "a.png", 4, 4);
        let b = png_file(dir.path(), "b.png", 8, 8);
        let mut cache = ImageCache::new(4);

        cache.load(ImageSource::File(a.clone())).unwrap();
        assert!(cache.is_cached(&SourceId::Path(a.clone())));

        cache.load(ImageSource::File(b.clone())).unwrap();
        assert!(!cache.is_cached(&SourceId::Path(a)));
        assert!(cache.is_cached(&SourceId::Path(b)));
    }

    #[test]
    fn failed_load_keeps_previous_image() {
        let dir = tempfile::tempdir().unwrap();
        let a = png_file(dir.path(), "a.png", 4, 4);
        let mut cache = ImageCache::new(4);
        cache.load(ImageSource::File(a.clone())).unwrap();

        let err = cache
            .load(ImageSource::Stream(Box::new(Cursor::new(b"junk".to_vec()))))
            .unwrap_err();
        assert!(matches!(err, AppError::ImageDecode(_)));
        assert!(cache.is_cached(&SourceId::Path(a)));
        assert_eq!(cache.current_image().unwrap().width(), 4);
    }

    #[test]
    fn load_invalidates_scaled_derivatives() {
        let mut cache = ImageCache::new(4);
        cache.set_current_image(DynamicImage::new_rgb8(400, 400));
        let target = ScaleTarget::Viewport(Bounds::new(100, 100));
        assert!(cache.scaled(target).is_some());
        assert!(cache.autoscale_image().is_some());

        cache.set_current_image(DynamicImage::new_rgb8(50, 50));
        assert!(cache.autoscale_image().is_none());
        assert_eq!(cache.scaled(target).unwrap().width(), 100);
    }

    #[test]
    fn reset_autoscale_keeps_other_derivatives() {
        let mut cache = ImageCache::new(4);
        cache.set_current_image(DynamicImage::new_rgb8(2000, 1000));
        cache.scaled(ScaleTarget::Viewport(Bounds::new(100, 100)));
        cache.scaled(ScaleTarget::Mode(DisplayMode::Small));

        cache.reset_autoscale_image();
        assert!(cache.autoscale_image().is_none());
        assert!(
            cache
                .lookup_scaled(ScaleTarget::Mode(DisplayMode::Small))
                .is_some()
        );
        assert_eq!(cache.current_image().unwrap().width(), 2000);
    }

    #[test]
    fn bitmaps_are_never_cache_hits() {
        let mut cache = ImageCache::new(1);
        let source = ImageSource::Bitmap(DynamicImage::new_rgb8(1, 1));
        let id = source.id();
        cache.set_current_image(DynamicImage::new_rgb8(1, 1));
        assert!(!cache.is_cached(&id));
    }
}
