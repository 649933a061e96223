//! Background load-and-scale pipeline for the preview pane.
//!
//! Every trigger (new source, viewport resize, display mode change) queues one
//! job. Jobs of a pipeline run one after another on the shared worker pool and
//! report to the UI thread over a channel; the pixel swap itself happens in
//! `PreviewPane`. Each job carries a generation number, and a job that has been
//! superseded by a newer one skips its remaining work instead of overwriting
//! the newer result.

use crate::display_mode::{Bounds, DisplayMode};
use crate::error::AppError;
use crate::image_cache::{ImageCache, ScaleTarget, proportional_scale};
use crate::image_loader::{self, ImageSource, SourceId};
use crossbeam_channel::Sender;
use image::DynamicImage;
use log::{debug, error, info, warn};
use rayon::ThreadPool;
use std::collections::VecDeque;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex};

/// What a job reports to the UI thread.
#[derive(Debug, Clone)]
pub enum PreviewEventKind {
    /// Work started: show the placeholder.
    Loading,
    /// Swap this bitmap into the view.
    Displayed(Arc<DynamicImage>),
    /// Load or scale failed; keep the previous image.
    Failed(String),
}

#[derive(Debug, Clone)]
pub struct PreviewEvent {
    pub generation: u64,
    pub kind: PreviewEventKind,
}

/// Listener for display mode changes, called with `(old, new)`.
pub type DisplayModeListener = Box<dyn Fn(DisplayMode, DisplayMode) + Send>;

enum JobKind {
    Load { id: SourceId, source: ImageSource },
    Refresh,
}

struct Job {
    generation: u64,
    target: ScaleTarget,
    kind: JobKind,
}

#[derive(Default)]
struct JobQueue {
    jobs: VecDeque<Job>,
    draining: bool,
}

/// State shared between the pipeline and its jobs.
struct Shared {
    cache: Arc<Mutex<ImageCache>>,
    events: Sender<PreviewEvent>,
    latest: Arc<AtomicU64>,
    latest_load: AtomicU64,
    /// Newest load generation whose job has finished, installed or not.
    settled_load: AtomicU64,
    queue: Mutex<JobQueue>,
}

impl Shared {
    fn is_current(&self, generation: u64) -> bool {
        self.latest.load(Ordering::Acquire) == generation
    }

    /// A queued load may still replace the cached image.
    fn load_pending(&self) -> bool {
        self.settled_load.load(Ordering::Acquire) < self.latest_load.load(Ordering::Acquire)
    }

    fn send(&self, generation: u64, kind: PreviewEventKind) {
        if self.events.send(PreviewEvent { generation, kind }).is_err() {
            // Known gap: the job cannot tell the caller that nothing was shown.
            let err = AppError::Threading("preview pane is gone".to_string());
            warn!("Dropping result of job {}: {}", generation, err);
        }
    }
}

/// Worker side of the preview: owns the display mode and viewport and queues
/// refresh jobs.
pub struct PreviewPipeline {
    shared: Arc<Shared>,
    pool: Arc<ThreadPool>,
    display_mode: DisplayMode,
    viewport: Bounds,
    listeners: Vec<DisplayModeListener>,
    submitted: u64,
}

impl PreviewPipeline {
    pub fn new(
        cache: Arc<Mutex<ImageCache>>,
        pool: Arc<ThreadPool>,
        events: Sender<PreviewEvent>,
        latest: Arc<AtomicU64>,
        display_mode: DisplayMode,
        viewport: Bounds,
    ) -> Self {
        Self {
            shared: Arc::new(Shared {
                cache,
                events,
                latest,
                latest_load: AtomicU64::new(0),
                settled_load: AtomicU64::new(0),
                queue: Mutex::new(JobQueue::default()),
            }),
            pool,
            display_mode,
            viewport,
            listeners: Vec::new(),
            submitted: 0,
        }
    }

    pub fn display_mode(&self) -> DisplayMode {
        self.display_mode
    }

    pub fn viewport(&self) -> Bounds {
        self.viewport
    }

    /// Number of jobs queued so far.
    pub fn jobs_submitted(&self) -> u64 {
        self.submitted
    }

    pub fn cache(&self) -> Arc<Mutex<ImageCache>> {
        self.shared.cache.clone()
    }

    /// Registers a callback for display mode changes.
    pub fn on_display_mode_change<F>(&mut self, listener: F)
    where
        F: Fn(DisplayMode, DisplayMode) + Send + 'static,
    {
        self.listeners.push(Box::new(listener));
    }

    /// Shows `source`. A source that is already cached is only rescaled, unless
    /// a queued load is about to replace the cached image.
    pub fn set_source(&mut self, source: ImageSource) {
        let id = source.id();
        let cached = !self.shared.load_pending()
            && self
                .shared
                .cache
                .lock()
                .map(|cache| cache.is_cached(&id))
                .unwrap_or(false);

        if cached {
            self.submit(JobKind::Refresh);
        } else {
            self.submit(JobKind::Load { id, source });
        }
    }

    /// Records a new viewport size. Under autoresize, queues a rescale when the
    /// stored derivative no longer fits. Returns whether a job was queued.
    pub fn resize(&mut self, width: u32, height: u32) -> bool {
        self.viewport = Bounds::new(width, height);
        if self.display_mode != DisplayMode::Autoresize {
            return false;
        }

        {
            let Ok(mut cache) = self.shared.cache.lock() else {
                return false;
            };
            if cache.current_image().is_none() {
                return false;
            }
            let fits = cache
                .autoscale_image()
                .map(|img| fits_viewport(img.width(), img.height(), self.viewport))
                .unwrap_or(false);
            if fits {
                debug!("Autoresized image still fits {:?}", self.viewport);
                return false;
            }
            cache.reset_autoscale_image();
        }

        self.submit(JobKind::Refresh);
        true
    }

    /// Switches the display mode and rescales the current image for it.
    pub fn set_display_mode(&mut self, mode: DisplayMode) {
        if self.display_mode == mode {
            return;
        }
        let old = self.display_mode;
        self.display_mode = mode;
        info!("Display mode changed: {} -> {}", old, mode);
        for listener in &self.listeners {
            listener(old, mode);
        }

        let loaded = self
            .shared
            .cache
            .lock()
            .map(|cache| cache.current_image().is_some())
            .unwrap_or(false);
        if loaded {
            self.submit(JobKind::Refresh);
        }
    }

    /// Rescales the current image with the current mode and viewport.
    pub fn refresh(&mut self) {
        self.submit(JobKind::Refresh);
    }

    fn submit(&mut self, kind: JobKind) {
        let generation = self.shared.latest.fetch_add(1, Ordering::AcqRel) + 1;
        if matches!(kind, JobKind::Load { .. }) {
            self.shared.latest_load.store(generation, Ordering::Release);
        }
        self.submitted += 1;

        let job = Job {
            generation,
            target: ScaleTarget::resolve(self.display_mode, self.viewport),
            kind,
        };
        debug!("Queued preview job {}", generation);

        let start_drain = {
            let mut queue = match self.shared.queue.lock() {
                Ok(queue) => queue,
                Err(poisoned) => poisoned.into_inner(),
            };
            queue.jobs.push_back(job);
            !std::mem::replace(&mut queue.draining, true)
        };

        if start_drain {
            let shared = self.shared.clone();
            self.pool.spawn(move || drain(&shared));
        }
    }
}

/// The image touches the viewport on one axis and fits on the other.
fn fits_viewport(width: u32, height: u32, viewport: Bounds) -> bool {
    (width == viewport.width && height <= viewport.height)
        || (height == viewport.height && width <= viewport.width)
}

fn drain(shared: &Shared) {
    loop {
        let job = {
            let mut queue = match shared.queue.lock() {
                Ok(queue) => queue,
                Err(poisoned) => poisoned.into_inner(),
            };
            match queue.jobs.pop_front() {
                Some(job) => job,
                None => {
                    queue.draining = false;
                    return;
                }
            }
        };
        run_job(shared, job);
    }
}

fn run_job(shared: &Shared, job: Job) {
    let Job {
        generation,
        target,
        kind,
    } = job;

    if shared.is_current(generation) {
        shared.send(generation, PreviewEventKind::Loading);
    }

    if let JobKind::Load { id, source } = kind {
        let installed = load(shared, generation, id, source);
        shared.settled_load.fetch_max(generation, Ordering::AcqRel);
        if !installed {
            return;
        }
    }

    if !shared.is_current(generation) {
        debug!("Job {} superseded before scaling", generation);
        return;
    }

    match scale(shared, target) {
        Some(image) => {
            if shared.is_current(generation) {
                shared.send(generation, PreviewEventKind::Displayed(image));
            } else {
                debug!("Job {} superseded after scaling", generation);
            }
        }
        None => shared.send(
            generation,
            PreviewEventKind::Failed("nothing to display".to_string()),
        ),
    }
}

/// Decodes and installs `source`. Returns whether the cache now holds it.
fn load(shared: &Shared, generation: u64, id: SourceId, source: ImageSource) -> bool {
    // Later refresh jobs depend on the newest load, so it runs even when superseded.
    if shared.latest_load.load(Ordering::Acquire) != generation {
        debug!("Skipping superseded load {}", generation);
        return false;
    }
    let start = std::time::Instant::now();
    match image_loader::decode(source) {
        Ok(image) => {
            if let Ok(mut cache) = shared.cache.lock() {
                cache.install(id, image);
            }
            debug!("Decoded job {} in {:?}", generation, start.elapsed());
            true
        }
        Err(e) => {
            error!("Failed to load preview image: {}", e);
            if shared.is_current(generation) {
                shared.send(generation, PreviewEventKind::Failed(e.to_string()));
            }
            false
        }
    }
}

fn scale(shared: &Shared, target: ScaleTarget) -> Option<Arc<DynamicImage>> {
    let current = {
        let mut cache = shared.cache.lock().ok()?;
        if let Some(hit) = cache.lookup_scaled(target) {
            return Some(hit);
        }
        cache.current_image()?
    };

    // Scale outside the lock so resize checks on the UI thread are not blocked.
    let scaled = Arc::new(proportional_scale(Some(&current), target)?);
    if let Ok(mut cache) = shared.cache.lock() {
        if cache
            .current_image()
            .is_some_and(|now| Arc::ptr_eq(&now, &current))
        {
            cache.store_scaled(target, scaled.clone());
        }
    }
    Some(scaled)
}
