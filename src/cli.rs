use clap::Parser;
use std::path::PathBuf;

use crate::viz::{Alignment, Flow, VizKind};

#[derive(Parser, Debug)]
#[command(name = "oscilla", about = "Audio-reactive shape visualizer video generator")]
pub struct Cli {
    /// Input audio file (WAV, MP3, FLAC, OGG)
    pub input: Option<PathBuf>,

    /// Output video file
    #[arg(short, long, default_value = "output.mp4")]
    pub output: PathBuf,

    /// Visualizer variant
    #[arg(short, long, value_enum, default_value = "rectangle-volume")]
    pub visualizer: VizKind,

    /// Flow direction (overrides the config file)
    #[arg(long, value_enum)]
    pub flow: Option<Flow>,

    /// Baseline alignment (overrides the config file)
    #[arg(long, value_enum)]
    pub alignment: Option<Alignment>,

    /// Video width in pixels
    #[arg(long, default_value_t = 1920)]
    pub width: u32,

    /// Video height in pixels
    #[arg(long, default_value_t = 1080)]
    pub height: u32,

    /// Frames per second
    #[arg(long, default_value_t = 30)]
    pub fps: u32,

    /// Supersampling factor for antialiasing (1 disables)
    #[arg(long, default_value_t = 2)]
    pub supersampling: u32,

    /// H.264 CRF quality (0-51, lower = better). Ignored when --bitrate is set.
    #[arg(long, default_value_t = 18)]
    pub crf: u32,

    /// Video bitrate (e.g. 2400k, 5M). When set, uses -b:v instead of -crf.
    #[arg(short, long)]
    pub bitrate: Option<String>,

    /// Render only the first N seconds for fast iteration
    #[arg(long, value_name = "SECONDS", num_args = 0..=1, default_missing_value = "30")]
    pub preview: Option<u32>,

    /// Skip muxing the source audio into the output
    #[arg(long)]
    pub no_audio: bool,

    /// FFmpeg video codec
    #[arg(long, default_value = "libx264")]
    pub codec: String,

    /// FFmpeg pixel format
    #[arg(long, default_value = "yuv420p")]
    pub pix_fmt: String,

    /// Config file path (defaults to oscilla.toml / the user config dir)
    #[arg(long)]
    pub config: Option<PathBuf>,

    /// Check GitHub for a newer release while rendering
    #[arg(long)]
    pub check_update: bool,
}
