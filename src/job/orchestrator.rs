use std::panic::AssertUnwindSafe;
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::mpsc::{channel, Receiver, Sender};
use std::sync::Arc;
use std::thread::{self, JoinHandle};
use std::time::{Duration, Instant};

use crate::audio::decode;
use crate::audio::features;
use crate::config::VisualizerConfig;
use crate::encode::ffmpeg::{AudioMuxer, MuxStatus, VideoEncoder};
use crate::render::canvas::Canvas;
use crate::viz::{self, Visualizer};

use super::error::JobError;

/// One render job at a time; concurrent jobs are refused at the call site.
static RENDER_ACTIVE: AtomicBool = AtomicBool::new(false);

const PROGRESS_INTERVAL: f64 = 0.5;
const MUX_POLL: Duration = Duration::from_millis(50);

/// Job phases, in transition order. The terminal outcomes are carried by
/// [`JobEvent`] instead.
#[derive(Debug, Clone, Copy)]
enum Phase {
    Preparing,
    Rendering,
    MuxingAudio,
    Finalizing,
}

#[derive(Debug, Clone)]
pub struct VideoMeta {
    pub path: PathBuf,
    pub width: u32,
    pub height: u32,
    pub fps: u32,
    pub frames: usize,
}

/// Everything a job reports back to its caller. Exactly one of the
/// terminal events (`Finished`/`Failed`/`Canceled`) is sent per job.
#[derive(Debug)]
pub enum JobEvent {
    Status(String),
    Progress { current: usize, total: usize, elapsed: f64 },
    Finished(VideoMeta),
    Failed(String),
    Canceled,
}

#[derive(Debug, Clone)]
pub struct JobRequest {
    pub audio_path: PathBuf,
    pub output_path: PathBuf,
    pub width: u32,
    pub height: u32,
    pub fps: u32,
    pub codec: String,
    pub pix_fmt: String,
    pub crf: u32,
    pub bitrate: Option<String>,
    pub supersampling: u32,
    pub include_audio: bool,
    pub preview_seconds: Option<u32>,
}

/// Caller-side control surface. Dropping the handle does not cancel the
/// job; call [`JobHandle::cancel`] for that.
pub struct JobHandle {
    cancel: Arc<AtomicBool>,
    thread: Option<JoinHandle<()>>,
}

impl JobHandle {
    /// Requests cooperative cancellation. Takes effect at the next poll
    /// point: per frame while rendering, sub-frame while muxing.
    pub fn cancel(&self) {
        self.cancel.store(true, Ordering::SeqCst);
    }

    pub fn join(mut self) {
        if let Some(thread) = self.thread.take() {
            let _ = thread.join();
        }
    }
}

enum Outcome {
    Finished(VideoMeta),
    Failed(String),
    Canceled,
}

struct ActiveGuard;

impl Drop for ActiveGuard {
    fn drop(&mut self) {
        RENDER_ACTIVE.store(false, Ordering::SeqCst);
    }
}

/// Validates the settings, claims the single render slot and spawns the
/// worker thread. Configuration faults surface here, before any file is
/// touched.
pub fn start(
    request: JobRequest,
    viz_cfg: &VisualizerConfig,
) -> Result<(JobHandle, Receiver<JobEvent>), JobError> {
    if request.fps == 0 {
        return Err(JobError::Config("fps must be positive".into()));
    }
    if request.width == 0 || request.height == 0 {
        return Err(JobError::Config("video dimensions must be positive".into()));
    }
    let visualizer = viz::build(viz_cfg, request.width, request.height, request.supersampling)?;

    if RENDER_ACTIVE
        .compare_exchange(false, true, Ordering::SeqCst, Ordering::SeqCst)
        .is_err()
    {
        return Err(JobError::Busy);
    }

    let cancel = Arc::new(AtomicBool::new(false));
    let (events, receiver) = channel();
    let flag = cancel.clone();
    let thread = thread::spawn(move || {
        let _active = ActiveGuard;
        let outcome = std::panic::catch_unwind(AssertUnwindSafe(|| {
            run(&request, visualizer, &flag, &events)
        }))
        .unwrap_or_else(|_| {
            Outcome::Failed("unexpected error during render; see log for details".into())
        });

        let terminal = match outcome {
            Outcome::Finished(meta) => JobEvent::Finished(meta),
            Outcome::Failed(message) => {
                log::error!("Render failed: {}", message);
                JobEvent::Failed(message)
            }
            Outcome::Canceled => JobEvent::Canceled,
        };
        let _ = events.send(terminal);
    });

    Ok((
        JobHandle {
            cancel,
            thread: Some(thread),
        },
        receiver,
    ))
}

fn run(
    request: &JobRequest,
    mut visualizer: Box<dyn Visualizer>,
    cancel: &AtomicBool,
    events: &Sender<JobEvent>,
) -> Outcome {
    let status = |message: &str| {
        let _ = events.send(JobEvent::Status(message.to_string()));
    };
    let canceled = || cancel.load(Ordering::SeqCst);

    log::debug!("render job entering {:?}", Phase::Preparing);
    status("Opening audio file...");
    let track = match decode::decode_audio(&request.audio_path, request.preview_seconds) {
        Ok(track) => track,
        Err(e) => return Outcome::Failed(JobError::Input(format!("{e:#}")).to_string()),
    };
    log::debug!("decoded {:.1}s of audio", track.duration_seconds());
    if canceled() {
        return Outcome::Canceled;
    }

    status("Analyzing audio data...");
    let feature_set = features::analyze(&track, request.fps);
    if canceled() {
        return Outcome::Canceled;
    }

    status("Preparing video environment...");
    let video_path = if request.include_audio {
        video_only_path(&request.output_path)
    } else {
        request.output_path.clone()
    };
    let mut encoder = match VideoEncoder::open(
        &video_path,
        request.width,
        request.height,
        request.fps,
        &request.codec,
        &request.pix_fmt,
        request.crf,
        request.bitrate.as_deref(),
    ) {
        Ok(encoder) => encoder,
        Err(e) => return Outcome::Failed(JobError::Output(format!("{e:#}")).to_string()),
    };
    if canceled() {
        encoder.abort();
        return Outcome::Canceled;
    }

    visualizer.prepare_shapes();

    log::debug!("render job entering {:?}", Phase::Rendering);
    let total = bounded_frame_count(feature_set.len(), request.fps, request.preview_seconds);
    status(&format!("Rendering video ({} frames)...", total));

    let mut canvas = Canvas::new(request.width, request.height, request.supersampling);
    let start_time = Instant::now();
    let mut last_emit: Option<Instant> = None;

    for frame_index in 0..total {
        if canceled() {
            encoder.abort();
            return Outcome::Canceled;
        }

        canvas.clear();
        visualizer.render_frame(frame_index, &feature_set, &mut canvas);
        if let Err(e) = encoder.write_frame(&canvas.finish()) {
            encoder.abort();
            return Outcome::Failed(JobError::Output(format!("{e:#}")).to_string());
        }

        let now = Instant::now();
        let due = last_emit
            .map_or(true, |t| now.duration_since(t).as_secs_f64() >= PROGRESS_INTERVAL);
        if due || frame_index + 1 == total {
            let _ = events.send(JobEvent::Progress {
                current: frame_index + 1,
                total,
                elapsed: start_time.elapsed().as_secs_f64(),
            });
            last_emit = Some(now);
        }
    }

    status("Render finished, saving file...");
    if let Err(e) = encoder.finish() {
        return Outcome::Failed(JobError::Output(format!("{e:#}")).to_string());
    }

    if request.include_audio {
        log::debug!("render job entering {:?}", Phase::MuxingAudio);
        status("Muxing audio...");
        let mut muxer = match AudioMuxer::spawn(
            &video_path,
            &request.audio_path,
            &request.output_path,
            request.preview_seconds,
        ) {
            Ok(muxer) => muxer,
            Err(e) => {
                log::warn!("Video-only output kept at {}", video_path.display());
                return Outcome::Failed(JobError::Mux(format!("{e:#}")).to_string());
            }
        };

        loop {
            if canceled() {
                muxer.abort();
                return Outcome::Canceled;
            }
            match muxer.poll() {
                MuxStatus::Running => thread::sleep(MUX_POLL),
                MuxStatus::Finished => break,
                MuxStatus::Failed(message) => {
                    // The mux pass failed but the video-only render is
                    // intact; leave it for the caller to decide about.
                    log::warn!("Video-only output kept at {}", video_path.display());
                    return Outcome::Failed(JobError::Mux(message).to_string());
                }
            }
        }

        log::debug!("render job entering {:?}", Phase::Finalizing);
        if let Err(e) = std::fs::remove_file(&video_path) {
            log::warn!(
                "Could not remove intermediate video {}: {}",
                video_path.display(),
                e
            );
        }
    } else {
        log::debug!("render job entering {:?}", Phase::Finalizing);
    }

    Outcome::Finished(VideoMeta {
        path: request.output_path.clone(),
        width: request.width,
        height: request.height,
        fps: request.fps,
        frames: total,
    })
}

/// Preview renders stop after `fps * preview_seconds` frames.
fn bounded_frame_count(all_frames: usize, fps: u32, preview_seconds: Option<u32>) -> usize {
    match preview_seconds {
        Some(seconds) => all_frames.min((fps * seconds) as usize),
        None => all_frames,
    }
}

/// Intermediate video-only artifact written next to the final output while
/// the audio mux is pending.
fn video_only_path(output: &Path) -> PathBuf {
    let ext = output
        .extension()
        .and_then(|e| e.to_str())
        .unwrap_or("mp4");
    output.with_extension(format!("video.{ext}"))
}
