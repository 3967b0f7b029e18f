//! Playlist carousel.
//!
//! [`Carousel`] owns the ordered media list and the current index. Every index
//! change goes through [`Carousel::show_at`], which drives a [`MediaSurfaces`]
//! implementation: the app uses GPU-backed surfaces, tests use a recorder.

mod timer;

pub use timer::AutoAdvance;

use std::fmt;

#[derive(Debug, Clone, Copy, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MediaKind {
    Image,
    Video,
}

/// One playlist entry.
#[derive(Debug, Clone, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
pub struct MediaItem {
    #[serde(rename = "type")]
    pub kind: MediaKind,
    #[serde(rename = "src")]
    pub source: String,
}

impl MediaItem {
    pub fn image(source: impl Into<String>) -> Self {
        Self {
            kind: MediaKind::Image,
            source: source.into(),
        }
    }

    pub fn video(source: impl Into<String>) -> Self {
        Self {
            kind: MediaKind::Video,
            source: source.into(),
        }
    }
}

impl fmt::Display for MediaItem {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.kind {
            MediaKind::Image => write!(f, "image {}", self.source),
            MediaKind::Video => write!(f, "video {}", self.source),
        }
    }
}

/// The two display surfaces the carousel switches between.
pub trait MediaSurfaces {
    fn hide_all(&mut self);
    fn pause_video(&mut self);
    fn show_image(&mut self, source: &str);
    fn show_video(&mut self, source: &str);
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CarouselCommand {
    Next,
    Previous,
    /// Auto-advance timer fired; same as `Next`.
    Tick,
}

#[derive(Debug, thiserror::Error)]
pub enum CarouselError {
    #[error("carousel playlist is empty")]
    EmptyPlaylist,
}

#[derive(Debug, Clone)]
pub struct Carousel {
    items: Vec<MediaItem>,
    current_index: usize,
}

impl Carousel {
    pub fn new(items: Vec<MediaItem>) -> Result<Self, CarouselError> {
        if items.is_empty() {
            return Err(CarouselError::EmptyPlaylist);
        }
        Ok(Self {
            items,
            current_index: 0,
        })
    }

    pub fn len(&self) -> usize {
        self.items.len()
    }

    pub fn current_index(&self) -> usize {
        self.current_index
    }

    pub fn current_item(&self) -> &MediaItem {
        &self.items[self.current_index]
    }

    /// Shows the item at `index`.
    ///
    /// Playback is paused before anything else so a previous video never keeps
    /// running underneath the next item, even when that item is a video too.
    pub fn show_at<S: MediaSurfaces + ?Sized>(&mut self, index: usize, surfaces: &mut S) {
        surfaces.hide_all();
        surfaces.pause_video();

        let Some(item) = self.items.get(index) else {
            log::warn!(
                "carousel index {} out of range ({} items)",
                index,
                self.items.len()
            );
            return;
        };
        self.current_index = index;
        log::debug!("carousel showing #{}: {}", index, item);

        match item.kind {
            MediaKind::Image => surfaces.show_image(&item.source),
            MediaKind::Video => surfaces.show_video(&item.source),
        }
    }

    pub fn next<S: MediaSurfaces + ?Sized>(&mut self, surfaces: &mut S) -> usize {
        let index = wrap_index(self.current_index, 1, self.items.len());
        self.show_at(index, surfaces);
        self.current_index
    }

    pub fn previous<S: MediaSurfaces + ?Sized>(&mut self, surfaces: &mut S) -> usize {
        let index = wrap_index(self.current_index, -1, self.items.len());
        self.show_at(index, surfaces);
        self.current_index
    }

    pub fn handle<S: MediaSurfaces + ?Sized>(
        &mut self,
        command: CarouselCommand,
        surfaces: &mut S,
    ) -> usize {
        match command {
            CarouselCommand::Next | CarouselCommand::Tick => self.next(surfaces),
            CarouselCommand::Previous => self.previous(surfaces),
        }
    }
}

fn wrap_index(index: usize, step: isize, len: usize) -> usize {
    let len = len as isize;
    ((index as isize + step + len) % len) as usize
}
