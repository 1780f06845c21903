use serde::Deserialize;
use std::path::PathBuf;

use crate::viz::color::ColorMode;
use crate::viz::{Alignment, Flow, VizKind};

#[derive(Debug, Default, Deserialize)]
pub struct Config {
    #[serde(default)]
    pub output: OutputConfig,
    #[serde(default)]
    pub audio: AudioConfig,
    #[serde(default)]
    pub visualizer: VisualizerConfig,
}

#[derive(Debug, Deserialize)]
pub struct OutputConfig {
    #[serde(default = "default_width")]
    pub width: u32,
    #[serde(default = "default_height")]
    pub height: u32,
    #[serde(default = "default_fps")]
    pub fps: u32,
    #[serde(default = "default_crf")]
    pub crf: u32,
    #[serde(default = "default_codec")]
    pub codec: String,
    #[serde(default = "default_pix_fmt")]
    pub pix_fmt: String,
    #[serde(default = "default_supersampling")]
    pub supersampling: u32,
}

#[derive(Debug, Deserialize)]
pub struct AudioConfig {
    #[serde(default = "default_include")]
    pub include: bool,
}

/// Per-visualizer settings block. The flat keys apply to every kind; the
/// `rect`/`circle`/`line`/`rope` tables carry the kind-specific knobs.
#[derive(Debug, Clone, Deserialize)]
pub struct VisualizerConfig {
    #[serde(default = "default_kind")]
    pub kind: VizKind,
    #[serde(default)]
    pub x: i32,
    /// Baseline y in output pixels; defaults to three quarters down the
    /// frame when unset.
    #[serde(default)]
    pub y: Option<i32>,
    #[serde(default = "default_flow")]
    pub flow: Flow,
    #[serde(default = "default_alignment")]
    pub alignment: Alignment,
    #[serde(default = "default_color")]
    pub color: [u8; 3],
    /// Outline color; falls back to the fill color.
    #[serde(default)]
    pub border_color: Option<[u8; 3]>,
    #[serde(default = "default_color_mode")]
    pub color_mode: ColorMode,
    #[serde(default)]
    pub gradient_start: Option<[u8; 3]>,
    #[serde(default)]
    pub gradient_end: Option<[u8; 3]>,
    #[serde(default)]
    pub band_colors: Vec<[u8; 3]>,
    #[serde(default)]
    pub rect: RectParams,
    #[serde(default)]
    pub circle: CircleParams,
    #[serde(default)]
    pub line: LineParams,
    #[serde(default)]
    pub rope: RopeConfig,
}

#[derive(Debug, Clone, Deserialize)]
pub struct RectParams {
    #[serde(default = "default_box_width")]
    pub box_width: f32,
    #[serde(default = "default_box_height")]
    pub box_height: f32,
    #[serde(default = "default_border_width")]
    pub border_width: f32,
    #[serde(default = "default_spacing")]
    pub spacing: f32,
    #[serde(default)]
    pub corner_radius: f32,
    /// -1 derives the count from the frame width.
    #[serde(default = "default_count")]
    pub count: i32,
}

#[derive(Debug, Clone, Deserialize)]
pub struct CircleParams {
    #[serde(default = "default_max_radius")]
    pub max_radius: f32,
    #[serde(default = "default_border_width")]
    pub border_width: f32,
    #[serde(default = "default_spacing")]
    pub spacing: f32,
    /// -1 derives the count from the frame width.
    #[serde(default = "default_count")]
    pub count: i32,
}

#[derive(Debug, Clone, Deserialize)]
pub struct LineParams {
    #[serde(default = "default_max_height")]
    pub max_height: f32,
    #[serde(default = "default_thickness")]
    pub thickness: f32,
    #[serde(default = "default_spacing")]
    pub spacing: f32,
    #[serde(default = "default_smoothness")]
    pub smoothness: u32,
    #[serde(default = "default_band_spacing")]
    pub band_spacing: f32,
}

#[derive(Debug, Clone, Deserialize)]
pub struct RopeConfig {
    #[serde(default = "default_points")]
    pub points: u32,
    #[serde(default = "default_tension")]
    pub tension: f32,
    #[serde(default = "default_damping")]
    pub damping: f32,
    #[serde(default = "default_rope_gravity")]
    pub gravity: f32,
    #[serde(default = "default_strength")]
    pub impulse_strength: f32,
    #[serde(default = "default_strength")]
    pub force_strength: f32,
}

impl Default for OutputConfig {
    fn default() -> Self {
        Self {
            width: default_width(),
            height: default_height(),
            fps: default_fps(),
            crf: default_crf(),
            codec: default_codec(),
            pix_fmt: default_pix_fmt(),
            supersampling: default_supersampling(),
        }
    }
}

impl Default for AudioConfig {
    fn default() -> Self {
        Self { include: default_include() }
    }
}

impl Default for VisualizerConfig {
    fn default() -> Self {
        Self {
            kind: default_kind(),
            x: 0,
            y: None,
            flow: default_flow(),
            alignment: default_alignment(),
            color: default_color(),
            border_color: None,
            color_mode: default_color_mode(),
            gradient_start: None,
            gradient_end: None,
            band_colors: Vec::new(),
            rect: RectParams::default(),
            circle: CircleParams::default(),
            line: LineParams::default(),
            rope: RopeConfig::default(),
        }
    }
}

impl Default for RectParams {
    fn default() -> Self {
        Self {
            box_width: default_box_width(),
            box_height: default_box_height(),
            border_width: default_border_width(),
            spacing: default_spacing(),
            corner_radius: 0.0,
            count: default_count(),
        }
    }
}

impl Default for CircleParams {
    fn default() -> Self {
        Self {
            max_radius: default_max_radius(),
            border_width: default_border_width(),
            spacing: default_spacing(),
            count: default_count(),
        }
    }
}

impl Default for LineParams {
    fn default() -> Self {
        Self {
            max_height: default_max_height(),
            thickness: default_thickness(),
            spacing: default_spacing(),
            smoothness: default_smoothness(),
            band_spacing: default_band_spacing(),
        }
    }
}

impl Default for RopeConfig {
    fn default() -> Self {
        Self {
            points: default_points(),
            tension: default_tension(),
            damping: default_damping(),
            gravity: default_rope_gravity(),
            impulse_strength: default_strength(),
            force_strength: default_strength(),
        }
    }
}

fn default_width() -> u32 { 1920 }
fn default_height() -> u32 { 1080 }
fn default_fps() -> u32 { 30 }
fn default_crf() -> u32 { 18 }
fn default_codec() -> String { "libx264".into() }
fn default_pix_fmt() -> String { "yuv420p".into() }
fn default_supersampling() -> u32 { 2 }
fn default_include() -> bool { true }
fn default_kind() -> VizKind { VizKind::RectangleVolume }
fn default_flow() -> Flow { Flow::LeftToRight }
fn default_alignment() -> Alignment { Alignment::Bottom }
fn default_color() -> [u8; 3] { [255, 255, 255] }
fn default_color_mode() -> ColorMode { ColorMode::Single }
fn default_box_width() -> f32 { 10.0 }
fn default_box_height() -> f32 { 50.0 }
fn default_border_width() -> f32 { 1.0 }
fn default_spacing() -> f32 { 5.0 }
fn default_count() -> i32 { -1 }
fn default_max_radius() -> f32 { 10.0 }
fn default_max_height() -> f32 { 50.0 }
fn default_thickness() -> f32 { 2.0 }
fn default_smoothness() -> u32 { 8 }
fn default_band_spacing() -> f32 { 6.0 }
fn default_points() -> u32 { 80 }
fn default_tension() -> f32 { 0.08 }
fn default_damping() -> f32 { 0.02 }
fn default_rope_gravity() -> f32 { 0.02 }
fn default_strength() -> f32 { 1.0 }

pub fn load_config(path: &PathBuf) -> Option<Config> {
    let content = std::fs::read_to_string(path).ok()?;
    toml::from_str(&content).ok()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_document_uses_defaults() {
        let cfg: Config = toml::from_str("").unwrap();
        assert_eq!(cfg.output.width, 1920);
        assert_eq!(cfg.output.fps, 30);
        assert!(cfg.audio.include);
        assert_eq!(cfg.visualizer.kind, VizKind::RectangleVolume);
        assert_eq!(cfg.visualizer.rope.points, 80);
    }

    #[test]
    fn parses_visualizer_block() {
        let cfg: Config = toml::from_str(
            r#"
            [output]
            width = 1280
            height = 720
            fps = 24

            [visualizer]
            kind = "force-line-chroma"
            flow = "out-from-center"
            alignment = "center"
            color = [227, 209, 169]
            color_mode = "gradient"
            gradient_start = [255, 0, 0]
            gradient_end = [0, 0, 255]

            [visualizer.rope]
            points = 120
            tension = 0.1
            "#,
        )
        .unwrap();
        assert_eq!(cfg.output.width, 1280);
        assert_eq!(cfg.visualizer.kind, VizKind::ForceLineChroma);
        assert_eq!(cfg.visualizer.flow, Flow::OutFromCenter);
        assert_eq!(cfg.visualizer.alignment, Alignment::Center);
        assert_eq!(cfg.visualizer.color_mode, ColorMode::Gradient);
        assert_eq!(cfg.visualizer.rope.points, 120);
        assert!((cfg.visualizer.rope.tension - 0.1).abs() < 1e-6);
        // Unset rope knobs keep their defaults.
        assert!((cfg.visualizer.rope.damping - 0.02).abs() < 1e-6);
    }

    #[test]
    fn band_colors_roundtrip() {
        let cfg: Config = toml::from_str(
            r#"
            [visualizer]
            kind = "line-bands-chroma"
            color_mode = "per-band"
            band_colors = [
                [1,1,1],[2,2,2],[3,3,3],[4,4,4],[5,5,5],[6,6,6],
                [7,7,7],[8,8,8],[9,9,9],[10,10,10],[11,11,11],[12,12,12],
            ]
            "#,
        )
        .unwrap();
        assert_eq!(cfg.visualizer.band_colors.len(), 12);
        assert_eq!(cfg.visualizer.band_colors[11], [12, 12, 12]);
    }
}
