//! Display surfaces a session and capturer render into.
//!
//! [`Page`] is a cheap cloneable handle; sessions keep only the id of the
//! surface they are bound to and look it up through the page.

use std::collections::HashMap;
use std::sync::{Arc, Mutex, MutexGuard};

use super::Resolution;

/// Live video element state.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct VideoSurface {
    /// Dimensions of the attached stream, if any.
    pub source: Option<Resolution>,
    /// Whether playback has started.
    pub playing: bool,
}

impl VideoSurface {
    /// Returns true if a stream is attached and playing.
    pub fn is_showing_stream(&self) -> bool {
        self.source.is_some() && self.playing
    }
}

/// Still image element state.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ImageSurface {
    /// Image source as a data URL.
    pub src: Option<String>,
    /// Whether the element is shown.
    pub visible: bool,
}

#[derive(Debug, Default)]
struct Surfaces {
    videos: HashMap<String, VideoSurface>,
    images: HashMap<String, ImageSurface>,
}

/// Shared registry of named surfaces.
#[derive(Debug, Clone, Default)]
pub struct Page {
    inner: Arc<Mutex<Surfaces>>,
}

impl Page {
    /// Creates an empty page.
    pub fn new() -> Self {
        Self::default()
    }

    fn lock(&self) -> MutexGuard<'_, Surfaces> {
        self.inner.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    /// Adds an empty video surface, replacing any with the same id.
    pub fn add_video_surface(&self, id: impl Into<String>) {
        self.lock().videos.insert(id.into(), VideoSurface::default());
    }

    /// Adds a hidden image surface, replacing any with the same id.
    pub fn add_image_surface(&self, id: impl Into<String>) {
        self.lock().images.insert(id.into(), ImageSurface::default());
    }

    /// Snapshot of a video surface.
    pub fn video_surface(&self, id: &str) -> Option<VideoSurface> {
        self.lock().videos.get(id).cloned()
    }

    /// Snapshot of an image surface.
    pub fn image_surface(&self, id: &str) -> Option<ImageSurface> {
        self.lock().images.get(id).cloned()
    }

    pub(crate) fn has_video_surface(&self, id: &str) -> bool {
        self.lock().videos.contains_key(id)
    }

    /// Attaches a stream of the given size and starts playback.
    pub(crate) fn attach_and_play(&self, id: &str, resolution: Resolution) -> bool {
        match self.lock().videos.get_mut(id) {
            Some(surface) => {
                surface.source = Some(resolution);
                surface.playing = true;
                true
            }
            None => false,
        }
    }

    pub(crate) fn detach(&self, id: &str) {
        if let Some(surface) = self.lock().videos.get_mut(id) {
            surface.source = None;
            surface.playing = false;
        }
    }

    pub(crate) fn show_image(&self, id: &str, src: String) -> bool {
        match self.lock().images.get_mut(id) {
            Some(surface) => {
                surface.src = Some(src);
                surface.visible = true;
                true
            }
            None => false,
        }
    }
}
