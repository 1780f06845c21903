use clap::ValueEnum;
use serde::Deserialize;

use crate::audio::features::FeatureSet;
use crate::config::VisualizerConfig;
use crate::job::error::JobError;
use crate::render::canvas::Canvas;

pub mod chroma;
pub mod color;
pub mod force;
pub mod line;
pub mod volume;

/// Direction a visual history/wave propagates.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize, ValueEnum)]
#[serde(rename_all = "kebab-case")]
pub enum Flow {
    LeftToRight,
    OutFromCenter,
}

/// Whether a shape's resting baseline is its bottom edge or its vertical
/// center.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize, ValueEnum)]
#[serde(rename_all = "kebab-case")]
pub enum Alignment {
    Bottom,
    Center,
}

/// The selectable visualizer variants.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize, ValueEnum)]
#[serde(rename_all = "kebab-case")]
pub enum VizKind {
    RectangleVolume,
    CircleVolume,
    LineVolume,
    ForceLineVolume,
    RectangleChroma,
    CircleChroma,
    LineChroma,
    LineBandsChroma,
    ForceRectangleChroma,
    ForceLineChroma,
    ForceLinesChroma,
}

/// One animated shape family. `prepare_shapes` runs once before the frame
/// loop; `render_frame` mutates the shape state in place and draws it, in
/// frame order.
pub trait Visualizer: Send {
    fn prepare_shapes(&mut self);
    fn render_frame(&mut self, frame_index: usize, features: &FeatureSet, canvas: &mut Canvas);
}

/// Supersampled drawing area every visualizer works in. `x`/`y` are the
/// configured origin and baseline already scaled into buffer space.
#[derive(Debug, Clone, Copy)]
pub struct Layout {
    pub width: f32,
    pub height: f32,
    pub ss: f32,
    pub x: f32,
    pub y: f32,
}

impl Layout {
    pub fn new(width: u32, height: u32, supersampling: u32, x: i32, y: i32) -> Self {
        let ss = supersampling.max(1) as f32;
        Layout {
            width: width as f32 * ss,
            height: height as f32 * ss,
            ss,
            x: x as f32 * ss,
            y: y as f32 * ss,
        }
    }
}

/// The shared shift-register update. `LeftToRight` scrolls history toward
/// the high indices and inserts the fresh value at 0; `OutFromCenter`
/// pushes both halves away from `center_index` and inserts there. The scan
/// order matches the propagation direction so no value is read after being
/// overwritten.
pub fn flow_shift(values: &mut [f32], flow: Flow, center_index: usize, new_value: f32) {
    if values.is_empty() {
        return;
    }
    match flow {
        Flow::LeftToRight => {
            for i in (1..values.len()).rev() {
                values[i] = values[i - 1];
            }
            values[0] = new_value;
        }
        Flow::OutFromCenter => {
            let n = values.len();
            for i in 0..center_index {
                values[i] = values[i + 1];
                values[n - i - 1] = values[n - i - 2];
            }
            values[center_index] = new_value;
        }
    }
}

/// Constructs the configured visualizer, validating settings up front so
/// configuration faults never surface inside the render loop.
pub fn build(
    cfg: &VisualizerConfig,
    width: u32,
    height: u32,
    supersampling: u32,
) -> Result<Box<dyn Visualizer>, JobError> {
    let y = cfg.y.unwrap_or((height as i32) * 3 / 4);
    let layout = Layout::new(width, height, supersampling, cfg.x, y);
    Ok(match cfg.kind {
        VizKind::RectangleVolume => Box::new(volume::RectangleVolume::new(layout, cfg)?),
        VizKind::CircleVolume => Box::new(volume::CircleVolume::new(layout, cfg)?),
        VizKind::LineVolume => Box::new(line::LineVolume::new(layout, cfg)?),
        VizKind::ForceLineVolume => Box::new(force::ForceLineVolume::new(layout, cfg)?),
        VizKind::RectangleChroma => Box::new(chroma::RectangleChroma::new(layout, cfg)?),
        VizKind::CircleChroma => Box::new(chroma::CircleChroma::new(layout, cfg)?),
        VizKind::LineChroma => Box::new(line::LineChroma::new(layout, cfg)?),
        VizKind::LineBandsChroma => Box::new(line::LineBandsChroma::new(layout, cfg)?),
        VizKind::ForceRectangleChroma => {
            Box::new(chroma::ForceRectangleChroma::new(layout, cfg)?)
        }
        VizKind::ForceLineChroma => Box::new(force::ForceLineChroma::new(layout, cfg)?),
        VizKind::ForceLinesChroma => Box::new(force::ForceLinesChroma::new(layout, cfg)?),
    })
}
