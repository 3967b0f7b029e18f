use super::clock::{looped_frame_index, PlaybackClock};
use super::{VideoError, VideoFrame, VideoPlayback, VideoSource};
use image::codecs::gif::GifDecoder;
use image::codecs::png::PngDecoder;
use image::codecs::webp::WebPDecoder;
use image::{AnimationDecoder, Frames};
use std::fs::File;
use std::io::BufReader;
use std::path::Path;
use std::time::{Duration, Instant};

/// Browsers stretch zero or near-zero GIF delays to this.
const MIN_FRAME_DELAY: Duration = Duration::from_millis(20);
const DEFAULT_FRAME_DELAY: Duration = Duration::from_millis(100);

/// Fully decoded animation (or a single still) played back on a [`PlaybackClock`].
pub struct FrameSequence {
    frames: Vec<VideoFrame>,
    delays: Vec<Duration>,
    clock: PlaybackClock,
    shown: Option<usize>,
}

impl FrameSequence {
    pub fn open(path: &Path) -> Result<Self, VideoError> {
        let display = path.display().to_string();
        let extension = path
            .extension()
            .and_then(|ext| ext.to_str())
            .map(str::to_ascii_lowercase)
            .unwrap_or_default();
        let decode_err = |source| VideoError::Decode {
            path: display.clone(),
            source,
        };
        let open = || {
            File::open(path)
                .map(BufReader::new)
                .map_err(|source| VideoError::Open {
                    path: display.clone(),
                    source,
                })
        };

        let (frames, delays) = match extension.as_str() {
            "gif" => collect_frames(GifDecoder::new(open()?).map_err(decode_err)?.into_frames())
                .map_err(decode_err)?,
            "webp" => collect_frames(WebPDecoder::new(open()?).map_err(decode_err)?.into_frames())
                .map_err(decode_err)?,
            "png" | "apng" => {
                let decoder = PngDecoder::new(open()?).map_err(decode_err)?;
                if decoder.is_apng().map_err(decode_err)? {
                    collect_frames(decoder.apng().map_err(decode_err)?.into_frames())
                        .map_err(decode_err)?
                } else {
                    still(path).map_err(decode_err)?
                }
            }
            _ => still(path).map_err(decode_err)?,
        };

        if frames.is_empty() {
            return Err(VideoError::Empty { path: display });
        }
        log::debug!("{}: {} frame(s)", display, frames.len());
        Ok(Self::from_frames(frames, delays))
    }

    pub fn from_frames(frames: Vec<VideoFrame>, delays: Vec<Duration>) -> Self {
        Self {
            frames,
            delays,
            clock: PlaybackClock::new(),
            shown: None,
        }
    }

    #[cfg(test)]
    pub fn frame_count(&self) -> usize {
        self.frames.len()
    }

    #[cfg(test)]
    pub fn duration(&self) -> Duration {
        self.delays.iter().sum()
    }
}

impl VideoPlayback for FrameSequence {
    fn play(&mut self) {
        self.clock.play_at(Instant::now());
    }

    fn pause(&mut self) {
        self.clock.pause_at(Instant::now());
    }

    fn is_playing(&self) -> bool {
        self.clock.is_playing()
    }
}

impl VideoSource for FrameSequence {
    fn poll_frame(&mut self, now: Instant) -> Option<&VideoFrame> {
        let index = looped_frame_index(&self.delays, self.clock.position(now));
        if self.shown == Some(index) {
            return None;
        }
        self.shown = Some(index);
        self.frames.get(index)
    }

    fn size(&self) -> Option<(u32, u32)> {
        self.frames.first().map(|frame| (frame.width, frame.height))
    }
}

fn collect_frames(frames: Frames<'_>) -> image::ImageResult<(Vec<VideoFrame>, Vec<Duration>)> {
    let mut out = Vec::new();
    let mut delays = Vec::new();
    for frame in frames {
        let frame = frame?;
        let (numer, denom) = frame.delay().numer_denom_ms();
        let delay = if denom == 0 || numer == 0 {
            DEFAULT_FRAME_DELAY
        } else {
            Duration::from_micros(u64::from(numer) * 1000 / u64::from(denom)).max(MIN_FRAME_DELAY)
        };
        let buffer = frame.into_buffer();
        out.push(VideoFrame {
            width: buffer.width(),
            height: buffer.height(),
            rgba: buffer.into_raw(),
        });
        delays.push(delay);
    }
    Ok((out, delays))
}

fn still(path: &Path) -> image::ImageResult<(Vec<VideoFrame>, Vec<Duration>)> {
    let image = image::open(path)?.into_rgba8();
    Ok((
        vec![VideoFrame {
            width: image.width(),
            height: image.height(),
            rgba: image.into_raw(),
        }],
        vec![DEFAULT_FRAME_DELAY],
    ))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn solid(width: u32, height: u32, value: u8) -> VideoFrame {
        VideoFrame {
            width,
            height,
            rgba: vec![value; VideoFrame::expected_len(width, height)],
        }
    }

    #[test]
    fn paused_sequence_holds_first_frame() {
        let mut video = FrameSequence::from_frames(
            vec![solid(2, 2, 10), solid(2, 2, 20)],
            vec![Duration::from_millis(50), Duration::from_millis(50)],
        );
        let now = Instant::now();
        assert_eq!(video.poll_frame(now).map(|f| f.rgba[0]), Some(10));
        assert!(video.poll_frame(now + Duration::from_secs(1)).is_none());
        assert!(!video.is_playing());
    }

    #[test]
    fn playing_sequence_advances_and_loops() {
        let mut video = FrameSequence::from_frames(
            vec![solid(1, 1, 1), solid(1, 1, 2), solid(1, 1, 3)],
            vec![Duration::from_millis(100); 3],
        );
        let start = Instant::now();
        video.clock.play_at(start);

        assert_eq!(video.poll_frame(start).map(|f| f.rgba[0]), Some(1));
        assert_eq!(
            video.poll_frame(start + Duration::from_millis(120)).map(|f| f.rgba[0]),
            Some(2)
        );
        assert_eq!(
            video.poll_frame(start + Duration::from_millis(250)).map(|f| f.rgba[0]),
            Some(3)
        );
        assert_eq!(
            video.poll_frame(start + Duration::from_millis(310)).map(|f| f.rgba[0]),
            Some(1)
        );
        assert_eq!(video.duration(), Duration::from_millis(300));
    }

    #[test]
    fn decodes_a_gif_from_disk() {
        use image::codecs::gif::GifEncoder;
        use image::{Delay, Frame, RgbaImage};

        let path = std::env::temp_dir().join(format!("mediaview-frames-{}.gif", std::process::id()));
        {
            let file = File::create(&path).unwrap();
            let mut encoder = GifEncoder::new(file);
            let frames = [0u8, 255].map(|value| {
                Frame::from_parts(
                    RgbaImage::from_pixel(4, 3, image::Rgba([value, value, value, 255])),
                    0,
                    0,
                    Delay::from_numer_denom_ms(80, 1),
                )
            });
            encoder.encode_frames(frames).unwrap();
        }

        let video = FrameSequence::open(&path).unwrap();
        assert_eq!(video.frame_count(), 2);
        assert_eq!(video.size(), Some((4, 3)));
        assert_eq!(video.duration(), Duration::from_millis(160));

        let _ = std::fs::remove_file(path);
    }
}
