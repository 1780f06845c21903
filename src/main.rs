mod audio;
mod cli;
mod config;
mod encode;
mod job;
mod render;
mod update;
mod viz;

use anyhow::{Context, Result};
use clap::Parser;
use indicatif::{ProgressBar, ProgressStyle};

use cli::Cli;
use job::{JobEvent, JobRequest};
use viz::VizKind;

fn main() -> Result<()> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info"))
        .format_timestamp_millis()
        .init();

    let mut cli = Cli::parse();

    // Load config: explicit --config path, or auto-detect oscilla.toml / global config
    let config_path = cli.config.clone().or_else(|| {
        let local = std::path::PathBuf::from("oscilla.toml");
        if local.exists() {
            return Some(local);
        }
        if let Some(home) = dirs::home_dir() {
            let xdg = home.join(".config").join("oscilla").join("config.toml");
            if xdg.exists() {
                return Some(xdg);
            }
        }
        if let Some(config_dir) = dirs::config_dir() {
            let platform = config_dir.join("oscilla").join("config.toml");
            if platform.exists() {
                return Some(platform);
            }
        }
        None
    });

    let mut visualizer_cfg = config::VisualizerConfig::default();
    let mut include_audio = !cli.no_audio;
    if let Some(ref path) = config_path {
        if let Some(cfg) = config::load_config(path) {
            log::info!("Loaded config from {}", path.display());
            // Merge: config values apply only when CLI is at its default
            if cli.width == 1920 { cli.width = cfg.output.width; }
            if cli.height == 1080 { cli.height = cfg.output.height; }
            if cli.fps == 30 { cli.fps = cfg.output.fps; }
            if cli.crf == 18 { cli.crf = cfg.output.crf; }
            if cli.codec == "libx264" { cli.codec = cfg.output.codec; }
            if cli.pix_fmt == "yuv420p" { cli.pix_fmt = cfg.output.pix_fmt; }
            if cli.supersampling == 2 { cli.supersampling = cfg.output.supersampling; }
            if !cli.no_audio { include_audio = cfg.audio.include; }
            visualizer_cfg = cfg.visualizer;
        } else {
            log::warn!("Failed to load config from {}", path.display());
        }
    }
    if cli.visualizer != VizKind::RectangleVolume {
        visualizer_cfg.kind = cli.visualizer;
    }
    if let Some(flow) = cli.flow {
        visualizer_cfg.flow = flow;
    }
    if let Some(alignment) = cli.alignment {
        visualizer_cfg.alignment = alignment;
    }

    let input = cli.input.as_ref().context("Input audio file is required")?;
    if !input.exists() {
        anyhow::bail!("Input file not found: {}", input.display());
    }

    log::info!("oscilla - audio-reactive shape visualizer");
    log::info!("Input: {}", input.display());
    log::info!("Output: {}", cli.output.display());
    log::info!("Visualizer: {:?}", visualizer_cfg.kind);
    log::info!(
        "Resolution: {}x{} @ {}fps (supersampling {}x)",
        cli.width, cli.height, cli.fps, cli.supersampling
    );
    if let Some(seconds) = cli.preview {
        log::info!("Preview render: first {}s only", seconds);
    }

    // The update check runs on its own worker, concurrent with the render
    // job; the two share nothing.
    let update_check = if cli.check_update {
        Some(std::thread::spawn(update::fetch_latest_release))
    } else {
        None
    };

    let request = JobRequest {
        audio_path: input.clone(),
        output_path: cli.output.clone(),
        width: cli.width,
        height: cli.height,
        fps: cli.fps,
        codec: cli.codec.clone(),
        pix_fmt: cli.pix_fmt.clone(),
        crf: cli.crf,
        bitrate: cli.bitrate.clone(),
        supersampling: cli.supersampling,
        include_audio,
        preview_seconds: cli.preview,
    };

    let (handle, events) = job::start(request, &visualizer_cfg)?;

    let mut progress: Option<ProgressBar> = None;
    let mut failure: Option<String> = None;
    let mut canceled = false;

    for event in events {
        match event {
            JobEvent::Status(message) => log::info!("{}", message),
            JobEvent::Progress { current, total, elapsed } => {
                let bar = progress.get_or_insert_with(|| {
                    let bar = ProgressBar::new(total as u64);
                    bar.set_style(
                        ProgressStyle::default_bar()
                            .template("[{elapsed_precise}] {bar:40.cyan/blue} {pos}/{len} frames ({eta} remaining)")
                            .unwrap()
                            .progress_chars("=>-"),
                    );
                    bar
                });
                bar.set_position(current as u64);
                log::debug!("progress {}/{} after {:.1}s", current, total, elapsed);
            }
            JobEvent::Finished(meta) => {
                if let Some(bar) = progress.take() {
                    bar.finish_with_message("Rendering complete");
                }
                log::info!(
                    "Done! Output: {} ({} frames, {}x{} @ {}fps)",
                    meta.path.display(), meta.frames, meta.width, meta.height, meta.fps
                );
            }
            JobEvent::Failed(message) => {
                if let Some(bar) = progress.take() {
                    bar.abandon();
                }
                failure = Some(message);
            }
            JobEvent::Canceled => {
                if let Some(bar) = progress.take() {
                    bar.abandon();
                }
                canceled = true;
            }
        }
    }

    handle.join();

    if let Some(check) = update_check {
        match check.join() {
            Ok(Ok(latest)) => {
                if update::is_update_available(update::CURRENT_VERSION, &latest.version) {
                    log::info!(
                        "Update available: {} -> {} ({})",
                        update::CURRENT_VERSION, latest.version, latest.url
                    );
                } else {
                    log::info!("oscilla {} is up to date", update::CURRENT_VERSION);
                }
            }
            Ok(Err(e)) => log::warn!("Update check failed: {:#}", e),
            Err(_) => log::warn!("Update check worker panicked"),
        }
    }

    if canceled {
        log::warn!("Render canceled.");
    }
    if let Some(message) = failure {
        anyhow::bail!("{}", message);
    }
    Ok(())
}
