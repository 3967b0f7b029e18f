//! Container video through FFmpeg.
//!
//! A decode thread paces frames at the stream's frame rate and parks the latest
//! one in shared state; the UI thread picks it up in `poll_frame`. Playback
//! loops by seeking back to the start at end of stream. Audio is never decoded.

use super::{VideoError, VideoFrame, VideoPlayback, VideoSource};
use ffmpeg_next::format::Pixel;
use ffmpeg_next::software::scaling::{Context as Scaler, Flags};
use std::path::Path;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex};
use std::thread::{self, JoinHandle};
use std::time::{Duration, Instant};

/// Consecutive decode failures after which the decode thread gives up.
const MAX_DECODE_ERRORS: u32 = 30;

struct Decoder {
    input: ffmpeg_next::format::context::Input,
    stream_index: usize,
    decoder: ffmpeg_next::decoder::Video,
    scaler: Scaler,
    width: u32,
    height: u32,
    frame_rate: f64,
}

impl Decoder {
    fn open(path: &Path) -> Result<Self, VideoError> {
        let display = path.display().to_string();
        let ffmpeg_err = |source| VideoError::Ffmpeg {
            path: display.clone(),
            source,
        };
        ffmpeg_next::init().map_err(ffmpeg_err)?;

        let input = ffmpeg_next::format::input(&path).map_err(ffmpeg_err)?;
        let stream = input
            .streams()
            .best(ffmpeg_next::media::Type::Video)
            .ok_or_else(|| VideoError::NoVideoStream {
                path: display.clone(),
            })?;
        let stream_index = stream.index();
        let rate = stream.avg_frame_rate();
        let frame_rate = if rate.denominator() > 0 && rate.numerator() > 0 {
            rate.numerator() as f64 / rate.denominator() as f64
        } else {
            30.0
        };

        let context = ffmpeg_next::codec::context::Context::from_parameters(stream.parameters())
            .map_err(ffmpeg_err)?;
        let decoder = context.decoder().video().map_err(ffmpeg_err)?;
        let (width, height) = (decoder.width(), decoder.height());
        let scaler = Scaler::get(
            decoder.format(),
            width,
            height,
            Pixel::RGBA,
            width,
            height,
            Flags::BILINEAR,
        )
        .map_err(ffmpeg_err)?;

        log::info!(
            "Opened {}: {}x{} @ {:.2} fps",
            display,
            width,
            height,
            frame_rate
        );

        Ok(Self {
            input,
            stream_index,
            decoder,
            scaler,
            width,
            height,
            frame_rate,
        })
    }

    /// Next frame, or `None` at end of stream.
    fn next_frame(&mut self) -> Result<Option<VideoFrame>, ffmpeg_next::Error> {
        let mut decoded = ffmpeg_next::frame::Video::empty();
        loop {
            match self.decoder.receive_frame(&mut decoded) {
                Ok(()) => {
                    let mut rgba = ffmpeg_next::frame::Video::empty();
                    self.scaler.run(&decoded, &mut rgba)?;
                    return Ok(Some(self.pack(&rgba)));
                }
                Err(ffmpeg_next::Error::Other {
                    errno: ffmpeg_next::error::EAGAIN,
                }) => {}
                Err(ffmpeg_next::Error::Eof) => return Ok(None),
                Err(err) => return Err(err),
            }

            loop {
                match self.input.packets().next() {
                    Some((stream, packet)) => {
                        if stream.index() == self.stream_index {
                            self.decoder.send_packet(&packet)?;
                            break;
                        }
                    }
                    None => {
                        self.decoder.send_eof()?;
                        break;
                    }
                }
            }
        }
    }

    fn pack(&self, frame: &ffmpeg_next::frame::Video) -> VideoFrame {
        let data = frame.data(0);
        let stride = frame.stride(0);
        let row = self.width as usize * 4;
        let rgba = if stride == row {
            data[..VideoFrame::expected_len(self.width, self.height)].to_vec()
        } else {
            let mut out = Vec::with_capacity(VideoFrame::expected_len(self.width, self.height));
            for y in 0..self.height as usize {
                out.extend_from_slice(&data[y * stride..y * stride + row]);
            }
            out
        };
        VideoFrame {
            width: self.width,
            height: self.height,
            rgba,
        }
    }

    fn rewind(&mut self) -> Result<(), ffmpeg_next::Error> {
        self.input.seek(0, ..)?;
        self.decoder.flush();
        Ok(())
    }
}

struct Shared {
    latest: Mutex<Option<VideoFrame>>,
    fresh: AtomicBool,
    running: AtomicBool,
    paused: AtomicBool,
}

pub struct FfmpegVideo {
    shared: Arc<Shared>,
    thread: Option<JoinHandle<()>>,
    size: (u32, u32),
    current: Option<VideoFrame>,
}

impl FfmpegVideo {
    /// Opens `path` and starts the decode thread, paused.
    pub fn open(path: &Path) -> Result<Self, VideoError> {
        // FFmpeg contexts stay on the thread that opened them, so this first open only
        // reads the size and poster frame; the decode thread opens its own.
        let mut poster = Decoder::open(path)?;
        let size = (poster.width, poster.height);
        let shared = Arc::new(Shared {
            latest: Mutex::new(None),
            fresh: AtomicBool::new(false),
            running: AtomicBool::new(true),
            paused: AtomicBool::new(true),
        });

        // The first frame is shown even while paused, like a poster frame.
        if let Ok(Some(frame)) = poster.next_frame() {
            if let Ok(mut latest) = shared.latest.lock() {
                *latest = Some(frame);
                shared.fresh.store(true, Ordering::Release);
            }
        }

        drop(poster);

        let thread_shared = Arc::clone(&shared);
        let thread_path = path.to_path_buf();
        let thread = thread::Builder::new()
            .name("video-decode".to_string())
            .spawn(move || match Decoder::open(&thread_path) {
                Ok(decoder) => decode_loop(decoder, thread_shared),
                Err(err) => log::warn!("{}", err),
            })
            .map_err(|source| VideoError::Open {
                path: path.display().to_string(),
                source,
            })?;

        Ok(Self {
            shared,
            thread: Some(thread),
            size,
            current: None,
        })
    }
}

/// Length of the current run of decode failures.
#[derive(Debug, Default)]
struct ErrorRun {
    count: u32,
}

impl ErrorRun {
    fn reset(&mut self) {
        self.count = 0;
    }

    /// Records a failure; true once the run is long enough to stop decoding.
    fn record(&mut self) -> bool {
        self.count += 1;
        self.count >= MAX_DECODE_ERRORS
    }
}

fn decode_loop(mut decoder: Decoder, shared: Arc<Shared>) {
    let frame_duration = Duration::from_secs_f64(1.0 / decoder.frame_rate.max(1.0));
    let mut next_frame_at = Instant::now();
    let mut errors = ErrorRun::default();

    while shared.running.load(Ordering::Acquire) {
        if shared.paused.load(Ordering::Acquire) {
            thread::sleep(Duration::from_millis(10));
            next_frame_at = Instant::now();
            continue;
        }

        let now = Instant::now();
        if now < next_frame_at {
            thread::sleep(next_frame_at - now);
        }

        match decoder.next_frame() {
            Ok(Some(frame)) => {
                errors.reset();
                if let Ok(mut latest) = shared.latest.lock() {
                    *latest = Some(frame);
                    shared.fresh.store(true, Ordering::Release);
                }
            }
            Ok(None) => {
                if let Err(err) = decoder.rewind() {
                    log::warn!("video rewind failed: {}", err);
                    break;
                }
                log::debug!("video looped");
            }
            Err(err) => {
                if errors.record() {
                    log::error!(
                        "video decode failed {} times in a row, stopping: {}",
                        MAX_DECODE_ERRORS,
                        err
                    );
                    break;
                }
                log::debug!("video decode error: {}", err);
            }
        }

        next_frame_at += frame_duration;
        let now = Instant::now();
        if next_frame_at < now {
            next_frame_at = now;
        }
    }
    log::debug!("video decode thread stopped");
}

impl VideoPlayback for FfmpegVideo {
    fn play(&mut self) {
        self.shared.paused.store(false, Ordering::Release);
    }

    fn pause(&mut self) {
        self.shared.paused.store(true, Ordering::Release);
    }

    fn is_playing(&self) -> bool {
        !self.shared.paused.load(Ordering::Acquire)
    }
}

impl VideoSource for FfmpegVideo {
    fn poll_frame(&mut self, _now: Instant) -> Option<&VideoFrame> {
        if !self.shared.fresh.swap(false, Ordering::AcqRel) {
            return None;
        }
        let frame = self.shared.latest.lock().ok()?.take()?;
        self.current = Some(frame);
        self.current.as_ref()
    }

    fn size(&self) -> Option<(u32, u32)> {
        Some(self.size)
    }
}

impl Drop for FfmpegVideo {
    fn drop(&mut self) {
        self.shared.running.store(false, Ordering::Release);
        if let Some(handle) = self.thread.take() {
            if handle.join().is_err() {
                log::warn!("video decode thread panicked");
            }
        }
    }
}
