use crate::audio::chroma::CHROMA_BANDS;
use crate::audio::features::FeatureSet;
use crate::config::VisualizerConfig;
use crate::job::error::JobError;
use crate::render::canvas::{Canvas, Rgb};

use super::{Alignment, Layout, Visualizer};

/// Twelve bars, one per pitch class, re-rendered from the current chroma
/// vector each frame. Band position is spatial, so nothing scrolls.
pub struct RectangleChroma {
    layout: Layout,
    box_width: f32,
    box_height: f32,
    border_width: f32,
    spacing: f32,
    corner_radius: f32,
    border: Rgb,
    colors: Vec<Rgb>,
    alignment: Alignment,
    xs: Vec<f32>,
}

impl RectangleChroma {
    pub fn new(layout: Layout, cfg: &VisualizerConfig) -> Result<Self, JobError> {
        let ss = layout.ss;
        let border_width = cfg.rect.border_width * ss;
        let spacing = cfg.rect.spacing * ss;
        let box_width = (layout.width - (spacing - border_width) * CHROMA_BANDS as f32)
            / CHROMA_BANDS as f32;
        let colors = super::color::resolve(
            cfg.color_mode,
            cfg.color,
            cfg.gradient_start,
            cfg.gradient_end,
            &cfg.band_colors,
            CHROMA_BANDS,
        )?;
        Ok(Self {
            layout,
            box_width,
            box_height: cfg.rect.box_height * ss,
            border_width,
            spacing,
            corner_radius: cfg.rect.corner_radius * ss,
            border: cfg.border_color.unwrap_or(cfg.color),
            colors,
            alignment: cfg.alignment,
            xs: Vec::new(),
        })
    }
}

impl Visualizer for RectangleChroma {
    fn prepare_shapes(&mut self) {
        self.xs = (0..CHROMA_BANDS)
            .map(|i| self.layout.x + i as f32 * (self.box_width + self.spacing))
            .collect();
    }

    fn render_frame(&mut self, frame_index: usize, features: &FeatureSet, canvas: &mut Canvas) {
        let chroma = features.chroma(frame_index);
        let y = self.layout.y;
        for (band, &x1) in self.xs.iter().enumerate() {
            let height = self.box_height * chroma[band];
            let (y1, y2) = match self.alignment {
                Alignment::Bottom => (y - height, y),
                Alignment::Center => (y - height / 2.0, y + height / 2.0),
            };
            canvas.fill_rounded_rect(
                x1,
                y1,
                x1 + self.box_width,
                y2,
                self.corner_radius,
                self.colors[band],
                self.border,
                self.border_width,
            );
        }
    }
}

/// Twelve circles, one per pitch class, radius tracking the band energy.
pub struct CircleChroma {
    layout: Layout,
    max_radius: f32,
    border_width: f32,
    spacing: f32,
    border: Rgb,
    colors: Vec<Rgb>,
    alignment: Alignment,
    centers: Vec<f32>,
}

impl CircleChroma {
    pub fn new(layout: Layout, cfg: &VisualizerConfig) -> Result<Self, JobError> {
        let ss = layout.ss;
        let border_width = cfg.circle.border_width * ss;
        let spacing = cfg.circle.spacing * ss;
        // The radius is bounded both by the frame height and by fitting all
        // twelve diameters plus their gaps across the width.
        let max_v = (layout.height - border_width * 2.0) / 2.0;
        let max_h = (layout.width - spacing * 11.0 - border_width * 24.0) / 24.0;
        let colors = super::color::resolve(
            cfg.color_mode,
            cfg.color,
            cfg.gradient_start,
            cfg.gradient_end,
            &cfg.band_colors,
            CHROMA_BANDS,
        )?;
        Ok(Self {
            layout,
            max_radius: max_v.min(max_h).max(0.0),
            border_width,
            spacing,
            border: cfg.border_color.unwrap_or(cfg.color),
            colors,
            alignment: cfg.alignment,
            centers: Vec::new(),
        })
    }
}

impl Visualizer for CircleChroma {
    fn prepare_shapes(&mut self) {
        let step = self.max_radius * 2.0 + self.spacing + self.border_width;
        self.centers = (0..CHROMA_BANDS)
            .map(|i| self.layout.x + i as f32 * step + self.max_radius)
            .collect();
    }

    fn render_frame(&mut self, frame_index: usize, features: &FeatureSet, canvas: &mut Canvas) {
        let chroma = features.chroma(frame_index);
        let y = self.layout.y;
        for (band, &cx) in self.centers.iter().enumerate() {
            let r = self.max_radius * chroma[band];
            let (y1, y2) = match self.alignment {
                Alignment::Bottom => (y - r * 2.0, y),
                Alignment::Center => (y - r, y + r),
            };
            canvas.fill_ellipse(cx - r, y1, cx + r, y2, self.colors[band], self.border, self.border_width);
        }
    }
}

/// Chroma bars with inertia: each band's energy is a force inflating the
/// bar against a gravity pull, integrated per frame and clamped to the bar
/// extent.
pub struct ForceRectangleChroma {
    layout: Layout,
    box_width: f32,
    box_height: f32,
    border_width: f32,
    spacing: f32,
    corner_radius: f32,
    gravity: f32,
    force_strength: f32,
    border: Rgb,
    colors: Vec<Rgb>,
    alignment: Alignment,
    xs: Vec<f32>,
    heights: Vec<f32>,
    velocities: Vec<f32>,
}

impl ForceRectangleChroma {
    pub fn new(layout: Layout, cfg: &VisualizerConfig) -> Result<Self, JobError> {
        let ss = layout.ss;
        let border_width = cfg.rect.border_width * ss;
        let spacing = cfg.rect.spacing * ss;
        let box_width = (layout.width - (spacing - border_width) * CHROMA_BANDS as f32)
            / CHROMA_BANDS as f32;
        let colors = super::color::resolve(
            cfg.color_mode,
            cfg.color,
            cfg.gradient_start,
            cfg.gradient_end,
            &cfg.band_colors,
            CHROMA_BANDS,
        )?;
        Ok(Self {
            layout,
            box_width,
            box_height: cfg.rect.box_height * ss,
            border_width,
            spacing,
            corner_radius: cfg.rect.corner_radius * ss,
            gravity: cfg.rope.gravity,
            force_strength: cfg.rope.force_strength,
            border: cfg.border_color.unwrap_or(cfg.color),
            colors,
            alignment: cfg.alignment,
            xs: Vec::new(),
            heights: Vec::new(),
            velocities: Vec::new(),
        })
    }
}

impl Visualizer for ForceRectangleChroma {
    fn prepare_shapes(&mut self) {
        self.xs = (0..CHROMA_BANDS)
            .map(|i| self.layout.x + i as f32 * (self.box_width + self.spacing))
            .collect();
        self.heights = vec![0.0; CHROMA_BANDS];
        self.velocities = vec![0.0; CHROMA_BANDS];
    }

    fn render_frame(&mut self, frame_index: usize, features: &FeatureSet, canvas: &mut Canvas) {
        let chroma = features.chroma(frame_index);
        let y = self.layout.y;
        for (band, &x1) in self.xs.iter().enumerate() {
            let force = chroma[band] * self.box_height * self.force_strength;
            let accel = force - self.gravity * self.heights[band];
            self.velocities[band] += accel;
            self.heights[band] += self.velocities[band];
            if self.heights[band] < 0.0 {
                self.heights[band] = 0.0;
                self.velocities[band] = 0.0;
            }
            if self.heights[band] > self.box_height {
                self.heights[band] = self.box_height;
                self.velocities[band] = 0.0;
            }

            let height = self.heights[band];
            let (y1, y2) = match self.alignment {
                Alignment::Bottom => (y - height, y),
                Alignment::Center => (y - height / 2.0, y + height / 2.0),
            };
            canvas.fill_rounded_rect(
                x1,
                y1,
                x1 + self.box_width,
                y2,
                self.corner_radius,
                self.colors[band],
                self.border,
                self.border_width,
            );
        }
    }
}
