use anyhow::{Context, Result};
use std::io::Write;
use std::path::Path;
use std::process::{Child, Command, Stdio};

/// Video container handle: an ffmpeg process consuming rgb24 rawvideo on
/// stdin. Owned exclusively by the render worker for the job's duration.
pub struct VideoEncoder {
    child: Child,
}

impl VideoEncoder {
    pub fn open(
        output_path: &Path,
        width: u32,
        height: u32,
        fps: u32,
        codec: &str,
        pix_fmt: &str,
        crf: u32,
        bitrate: Option<&str>,
    ) -> Result<Self> {
        let mut args = vec![
            "-y".to_string(),
            "-loglevel".into(), "error".into(),
            "-f".into(), "rawvideo".into(),
            "-pixel_format".into(), "rgb24".into(),
            "-video_size".into(), format!("{}x{}", width, height),
            "-framerate".into(), fps.to_string(),
            "-i".into(), "pipe:0".into(),
            "-c:v".into(), codec.to_string(),
            "-pix_fmt".into(), pix_fmt.to_string(),
        ];

        if let Some(br) = bitrate {
            args.extend(["-b:v".to_string(), br.to_string()]);
        } else {
            args.extend(["-crf".to_string(), crf.to_string()]);
            args.extend(["-preset".to_string(), "medium".to_string()]);
        }

        args.push(output_path.to_string_lossy().into_owned());

        let child = Command::new("ffmpeg")
            .args(&args)
            .stdin(Stdio::piped())
            .stdout(Stdio::null())
            .stderr(Stdio::piped())
            .spawn()
            .context("Failed to spawn ffmpeg. Is ffmpeg installed?")?;

        log::info!("FFmpeg encoder started: {}x{} @ {}fps, codec={}", width, height, fps, codec);

        Ok(Self { child })
    }

    pub fn write_frame(&mut self, rgb_pixels: &[u8]) -> Result<()> {
        let stdin = self.child.stdin.as_mut().context("FFmpeg stdin not available")?;
        stdin.write_all(rgb_pixels).context("Failed to write frame to ffmpeg")?;
        Ok(())
    }

    /// Signals EOF and waits for the encoder to flush and close the
    /// container.
    pub fn finish(mut self) -> Result<()> {
        drop(self.child.stdin.take());

        let output = self.child.wait_with_output().context("Failed to wait for ffmpeg")?;

        if !output.status.success() {
            let stderr = String::from_utf8_lossy(&output.stderr);
            anyhow::bail!("FFmpeg exited with error:\n{}", stderr);
        }

        log::info!("FFmpeg encoding complete");
        Ok(())
    }

    /// Tears the encoder down without flushing. Used on cancellation so the
    /// container handle is closed before the terminal signal goes out.
    pub fn abort(mut self) {
        drop(self.child.stdin.take());
        let _ = self.child.kill();
        let _ = self.child.wait();
    }
}

/// Audio mux pass: demux/decode the source audio, resample/encode it to
/// aac and mux it against the already-rendered video stream (copied, not
/// re-encoded). `preview_seconds` bounds the audio to the preview cutoff.
pub struct AudioMuxer {
    child: Child,
}

/// Outcome of one muxer poll.
pub enum MuxStatus {
    Running,
    Finished,
    Failed(String),
}

impl AudioMuxer {
    pub fn spawn(
        video_path: &Path,
        audio_path: &Path,
        output_path: &Path,
        preview_seconds: Option<u32>,
    ) -> Result<Self> {
        let mut args = vec![
            "-y".to_string(),
            "-loglevel".into(), "error".into(),
            "-i".into(), video_path.to_string_lossy().into_owned(),
            "-i".into(), audio_path.to_string_lossy().into_owned(),
            "-map".into(), "0:v".into(),
            "-map".into(), "1:a".into(),
            "-c:v".into(), "copy".into(),
            "-c:a".into(), "aac".into(),
            "-b:a".into(), "192k".into(),
        ];

        if let Some(seconds) = preview_seconds {
            args.extend(["-t".to_string(), seconds.to_string()]);
        }

        args.extend(["-shortest".to_string(), output_path.to_string_lossy().into_owned()]);

        let child = Command::new("ffmpeg")
            .args(&args)
            .stdin(Stdio::null())
            .stdout(Stdio::null())
            .stderr(Stdio::null())
            .spawn()
            .context("Failed to spawn ffmpeg for audio mux")?;

        log::info!("FFmpeg audio mux started: {}", output_path.display());

        Ok(Self { child })
    }

    /// Non-blocking status check, called between cancellation polls.
    pub fn poll(&mut self) -> MuxStatus {
        match self.child.try_wait() {
            Ok(None) => MuxStatus::Running,
            Ok(Some(status)) if status.success() => MuxStatus::Finished,
            Ok(Some(status)) => MuxStatus::Failed(format!("ffmpeg mux exited with {}", status)),
            Err(e) => MuxStatus::Failed(format!("failed to poll ffmpeg mux: {}", e)),
        }
    }

    /// Kills the mux process, closing its input and output handles.
    pub fn abort(mut self) {
        let _ = self.child.kill();
        let _ = self.child.wait();
    }
}
