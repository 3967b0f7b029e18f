//! Looping, muted video sources.
//!
//! Animated GIF/WebP/APNG (and still images) decode through the `image` crate.
//! Container formats (mp4, mov, webm, mkv) go through the default `ffmpeg`
//! feature, which decodes on a background thread.

mod clock;
#[cfg(feature = "ffmpeg")]
mod ffmpeg;
mod frames;

#[cfg(feature = "ffmpeg")]
pub use ffmpeg::FfmpegVideo;
pub use frames::FrameSequence;

use std::path::Path;
use std::time::Instant;

/// Play/pause control of a video element.
pub trait VideoPlayback {
    fn play(&mut self);
    fn pause(&mut self);
    fn is_playing(&self) -> bool;
}

/// Decoded RGBA8 frame.
#[derive(Clone)]
pub struct VideoFrame {
    pub width: u32,
    pub height: u32,
    pub rgba: Vec<u8>,
}

impl VideoFrame {
    pub fn expected_len(width: u32, height: u32) -> usize {
        width as usize * height as usize * 4
    }
}

impl std::fmt::Debug for VideoFrame {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("VideoFrame")
            .field("width", &self.width)
            .field("height", &self.height)
            .field("bytes", &self.rgba.len())
            .finish()
    }
}

pub trait VideoSource: VideoPlayback {
    /// Returns the current frame if it changed since the previous call.
    fn poll_frame(&mut self, now: Instant) -> Option<&VideoFrame>;

    /// Native size, if known before the first frame.
    fn size(&self) -> Option<(u32, u32)>;
}

#[derive(Debug, thiserror::Error)]
pub enum VideoError {
    #[error("failed to open video {path}: {source}")]
    Open {
        path: String,
        #[source]
        source: std::io::Error,
    },
    #[error("failed to decode video {path}: {source}")]
    Decode {
        path: String,
        #[source]
        source: image::ImageError,
    },
    #[error("video {path} has no frames")]
    Empty { path: String },
    #[cfg(not(feature = "ffmpeg"))]
    #[error("{path}: container video needs mediaview built with the `ffmpeg` feature")]
    NeedsFfmpeg { path: String },
    #[cfg(feature = "ffmpeg")]
    #[error("ffmpeg failed on {path}: {source}")]
    Ffmpeg {
        path: String,
        #[source]
        source: ffmpeg_next::Error,
    },
    #[cfg(feature = "ffmpeg")]
    #[error("no video stream in {path}")]
    NoVideoStream { path: String },
}

const CONTAINER_EXTENSIONS: &[&str] = &["mp4", "m4v", "mov", "webm", "mkv", "avi", "ogv"];

pub fn is_container_video(path: &Path) -> bool {
    path.extension()
        .and_then(|ext| ext.to_str())
        .map(|ext| CONTAINER_EXTENSIONS.contains(&ext.to_ascii_lowercase().as_str()))
        .unwrap_or(false)
}

/// Opens `path` with the decoder matching its extension. Starts paused.
pub fn open_video(path: &Path) -> Result<Box<dyn VideoSource>, VideoError> {
    if is_container_video(path) {
        #[cfg(feature = "ffmpeg")]
        {
            return Ok(Box::new(FfmpegVideo::open(path)?));
        }
        #[cfg(not(feature = "ffmpeg"))]
        {
            return Err(VideoError::NeedsFfmpeg {
                path: path.display().to_string(),
            });
        }
    }
    Ok(Box::new(FrameSequence::open(path)?))
}

/// Opens `path`, falling back to a blank source when it cannot be decoded.
pub fn open_video_or_blank(path: &Path) -> Box<dyn VideoSource> {
    match open_video(path) {
        Ok(video) => {
            log::info!("Opened video {} ({:?})", path.display(), video.size());
            video
        }
        Err(err) => {
            log::warn!("{}", err);
            Box::new(BlankVideo::default())
        }
    }
}

/// A video element with no decodable source. Tracks play state only.
#[derive(Debug, Default)]
pub struct BlankVideo {
    playing: bool,
}

impl VideoPlayback for BlankVideo {
    fn play(&mut self) {
        self.playing = true;
    }

    fn pause(&mut self) {
        self.playing = false;
    }

    fn is_playing(&self) -> bool {
        self.playing
    }
}

impl VideoSource for BlankVideo {
    fn poll_frame(&mut self, _now: Instant) -> Option<&VideoFrame> {
        None
    }

    fn size(&self) -> Option<(u32, u32)> {
        None
    }
}

#[cfg(test)]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum PlaybackCall {
    Play,
    Pause,
}

#[cfg(test)]
#[derive(Debug, Default)]
pub(crate) struct RecordingPlayback {
    pub calls: Vec<PlaybackCall>,
}

#[cfg(test)]
impl VideoPlayback for RecordingPlayback {
    fn play(&mut self) {
        self.calls.push(PlaybackCall::Play);
    }

    fn pause(&mut self) {
        self.calls.push(PlaybackCall::Pause);
    }

    fn is_playing(&self) -> bool {
        self.calls.last() == Some(&PlaybackCall::Play)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn container_extensions_are_detected() {
        assert!(is_container_video(Path::new("video.mp4")));
        assert!(is_container_video(Path::new("assets/videos/CLIP.MOV")));
        assert!(!is_container_video(Path::new("loop.gif")));
        assert!(!is_container_video(Path::new("noext")));
    }

    #[cfg(not(feature = "ffmpeg"))]
    #[test]
    fn container_video_without_ffmpeg_is_an_error() {
        let err = open_video(Path::new("video.mp4")).err().unwrap();
        assert!(matches!(err, VideoError::NeedsFfmpeg { .. }));
    }

    #[test]
    fn missing_file_falls_back_to_blank() {
        let mut video = open_video_or_blank(Path::new("definitely/not/here.gif"));
        assert!(!video.is_playing());
        video.play();
        assert!(video.is_playing());
        assert!(video.poll_frame(Instant::now()).is_none());
    }
}
