//! UI-side half of the preview: consumes pipeline events and owns what is shown.

use crate::services::preview_service::{PreviewEvent, PreviewEventKind};
use crossbeam_channel::{Receiver, RecvTimeoutError};
use image::{DynamicImage, Rgba, RgbaImage};
use log::{debug, error};
use once_cell::sync::Lazy;
use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};
use std::time::{Duration, Instant};

/// Hint shown in an empty pane that accepts drops.
pub const DROP_HINT: &str = "Drop image";

/// Shown while a job is running.
static PLACEHOLDER: Lazy<Arc<DynamicImage>> = Lazy::new(|| {
    Arc::new(DynamicImage::ImageRgba8(RgbaImage::from_pixel(
        32,
        32,
        Rgba([200, 200, 200, 255]),
    )))
});

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Cursor {
    Default,
    Wait,
}

/// The visible preview widget state. Lives on the UI thread.
pub struct PreviewPane {
    events: Receiver<PreviewEvent>,
    latest: Arc<AtomicU64>,
    displayed: Option<Arc<DynamicImage>>,
    busy: bool,
    cursor: Cursor,
    dnd_enabled: bool,
    hint: Option<&'static str>,
    last_error: Option<String>,
    settled: u64,
}

impl PreviewPane {
    pub fn new(events: Receiver<PreviewEvent>, latest: Arc<AtomicU64>, dnd_enabled: bool) -> Self {
        Self {
            events,
            latest,
            displayed: None,
            busy: false,
            cursor: Cursor::Default,
            dnd_enabled,
            hint: dnd_enabled.then_some(DROP_HINT),
            last_error: None,
            settled: 0,
        }
    }

    /// What the widget paints right now: the placeholder while busy.
    pub fn visible_image(&self) -> Option<Arc<DynamicImage>> {
        if self.busy {
            Some(PLACEHOLDER.clone())
        } else {
            self.displayed.clone()
        }
    }

    pub fn displayed_image(&self) -> Option<Arc<DynamicImage>> {
        self.displayed.clone()
    }

    pub fn is_busy(&self) -> bool {
        self.busy
    }

    pub fn cursor(&self) -> Cursor {
        self.cursor
    }

    pub fn hint(&self) -> Option<&'static str> {
        self.hint
    }

    pub fn is_dnd_enabled(&self) -> bool {
        self.dnd_enabled
    }

    pub fn set_dnd_enabled(&mut self, enabled: bool) {
        self.dnd_enabled = enabled;
        if !enabled {
            self.hint = None;
        } else if self.displayed.is_none() && !self.busy {
            self.hint = Some(DROP_HINT);
        }
    }

    pub fn last_error(&self) -> Option<&str> {
        self.last_error.as_deref()
    }

    /// Applies one event. Events of superseded jobs are ignored.
    pub fn apply(&mut self, event: PreviewEvent) -> bool {
        if event.generation != self.latest.load(Ordering::Acquire) {
            debug!("Ignoring stale preview event {}", event.generation);
            return false;
        }
        match event.kind {
            PreviewEventKind::Loading => {
                self.busy = true;
                self.cursor = Cursor::Wait;
                if self.dnd_enabled {
                    self.hint = None;
                }
            }
            PreviewEventKind::Displayed(image) => {
                self.displayed = Some(image);
                self.busy = false;
                self.cursor = Cursor::Default;
                self.last_error = None;
                self.settled = event.generation;
            }
            PreviewEventKind::Failed(message) => {
                error!("Preview failed: {}", message);
                self.busy = false;
                self.cursor = Cursor::Default;
                self.last_error = Some(message);
                self.settled = event.generation;
            }
        }
        true
    }

    /// Applies every event already queued. Returns how many were applied.
    pub fn process_pending(&mut self) -> usize {
        let pending: Vec<PreviewEvent> = self.events.try_iter().collect();
        let mut applied = 0;
        for event in pending {
            if self.apply(event) {
                applied += 1;
            }
        }
        applied
    }

    /// Runs the event loop until the newest job has finished or `timeout`
    /// elapses. Returns whether the pane settled.
    pub fn wait_until_settled(&mut self, timeout: Duration) -> bool {
        let deadline = Instant::now() + timeout;
        while self.settled != self.latest.load(Ordering::Acquire) {
            let remaining = deadline.saturating_duration_since(Instant::now());
            match self.events.recv_timeout(remaining) {
                Ok(event) => {
                    self.apply(event);
                }
                Err(RecvTimeoutError::Timeout) | Err(RecvTimeoutError::Disconnected) => {
                    return false;
                }
            }
        }
        true
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crossbeam_channel::unbounded;

    fn pane() -> (PreviewPane, crossbeam_channel::Sender<PreviewEvent>, Arc<AtomicU64>) {
        let (tx, rx) = unbounded();
        let latest = Arc::new(AtomicU64::new(0));
        (PreviewPane::new(rx, latest.clone(), true), tx, latest)
    }

    fn event(generation: u64, kind: PreviewEventKind) -> PreviewEvent {
        PreviewEvent { generation, kind }
    }

    #[test]
    fn loading_shows_placeholder_and_hides_hint() {
        let (mut pane, _tx, latest) = pane();
        assert_eq!(pane.hint(), Some(DROP_HINT));
        latest.store(1, Ordering::Release);

        assert!(pane.apply(event(1, PreviewEventKind::Loading)));
        assert!(pane.is_busy());
        assert_eq!(pane.cursor(), Cursor::Wait);
        assert_eq!(pane.hint(), None);
        assert_eq!(pane.visible_image().unwrap().width(), 32);
    }

    #[test]
    fn failure_restores_previous_image() {
        let (mut pane, _tx, latest) = pane();
        latest.store(1, Ordering::Release);
        let first = Arc::new(DynamicImage::new_rgb8(5, 5));
        pane.apply(event(1, PreviewEventKind::Displayed(first)));

        latest.store(2, Ordering::Release);
        pane.apply(event(2, PreviewEventKind::Loading));
        pane.apply(event(2, PreviewEventKind::Failed("bad".to_string())));
        assert!(!pane.is_busy());
        assert_eq!(pane.visible_image().unwrap().width(), 5);
        assert_eq!(pane.last_error(), Some("bad"));
    }

    #[test]
    fn stale_events_are_ignored() {
        let (mut pane, tx, latest) = pane();
        latest.store(3, Ordering::Release);
        tx.send(event(2, PreviewEventKind::Displayed(Arc::new(DynamicImage::new_rgb8(2, 2)))))
            .unwrap();
        tx.send(event(3, PreviewEventKind::Displayed(Arc::new(DynamicImage::new_rgb8(3, 3)))))
            .unwrap();

        assert_eq!(pane.process_pending(), 1);
        assert_eq!(pane.displayed_image().unwrap().width(), 3);
    }

    #[test]
    fn wait_times_out_without_events() {
        let (mut pane, _tx, latest) = pane();
        latest.store(1, Ordering::Release);
        assert!(!pane.wait_until_settled(Duration::from_millis(20)));
    }
}
