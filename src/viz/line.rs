use crate::audio::chroma::CHROMA_BANDS;
use crate::audio::features::FeatureSet;
use crate::config::VisualizerConfig;
use crate::job::error::JobError;
use crate::render::canvas::{Canvas, Rgb};
use crate::render::spline::catmull_rom;

use super::{color, flow_shift, Alignment, Flow, Layout, Visualizer};

fn aligned_y(baseline: f32, height: f32, alignment: Alignment) -> f32 {
    match alignment {
        Alignment::Bottom => baseline - height,
        Alignment::Center => baseline - height / 2.0,
    }
}

/// Smooth line whose sample heights scroll with the volume history.
pub struct LineVolume {
    layout: Layout,
    max_height: f32,
    thickness: f32,
    spacing: f32,
    smoothness: usize,
    color: Rgb,
    flow: Flow,
    alignment: Alignment,
    xs: Vec<f32>,
    heights: Vec<f32>,
    center_index: usize,
}

impl LineVolume {
    pub fn new(layout: Layout, cfg: &VisualizerConfig) -> Result<Self, JobError> {
        let ss = layout.ss;
        Ok(Self {
            layout,
            max_height: cfg.line.max_height * ss,
            thickness: (cfg.line.thickness * ss).max(1.0),
            spacing: (cfg.line.spacing * ss).max(1.0),
            smoothness: cfg.line.smoothness.max(2) as usize,
            color: cfg.color,
            flow: cfg.flow,
            alignment: cfg.alignment,
            xs: Vec::new(),
            heights: Vec::new(),
            center_index: 0,
        })
    }
}

impl Visualizer for LineVolume {
    fn prepare_shapes(&mut self) {
        self.xs.clear();
        let mut x = self.layout.x;
        while x <= self.layout.width {
            self.xs.push(x);
            x += self.spacing;
        }
        if self.flow == Flow::OutFromCenter && self.xs.len() % 2 == 0 {
            self.xs.pop();
        }
        self.center_index = self.xs.len() / 2;
        self.heights = vec![0.0; self.xs.len()];
    }

    fn render_frame(&mut self, frame_index: usize, features: &FeatureSet, canvas: &mut Canvas) {
        let new_height = self.max_height * features.norm_volume(frame_index);
        flow_shift(&mut self.heights, self.flow, self.center_index, new_height);

        let points: Vec<(f32, f32)> = self
            .xs
            .iter()
            .zip(self.heights.iter())
            .map(|(&x, &h)| (x, aligned_y(self.layout.y, h, self.alignment)))
            .collect();

        let smooth = catmull_rom(&points, self.smoothness);
        if smooth.len() >= 2 {
            canvas.draw_polyline(&smooth, self.thickness, self.color);
        }
    }
}

/// One smooth line across the 12 chroma bands, re-rendered from the current
/// chroma vector every frame — the bands are spatial, so there is no
/// history to scroll.
pub struct LineChroma {
    layout: Layout,
    max_height: f32,
    thickness: f32,
    smoothness: usize,
    color: Rgb,
    alignment: Alignment,
    xs: Vec<f32>,
}

impl LineChroma {
    pub fn new(layout: Layout, cfg: &VisualizerConfig) -> Result<Self, JobError> {
        let ss = layout.ss;
        Ok(Self {
            layout,
            max_height: cfg.line.max_height * ss,
            thickness: (cfg.line.thickness * ss).max(1.0),
            smoothness: cfg.line.smoothness.max(2) as usize,
            color: cfg.color,
            alignment: cfg.alignment,
            xs: Vec::new(),
        })
    }
}

impl Visualizer for LineChroma {
    fn prepare_shapes(&mut self) {
        let usable = self.layout.width - self.layout.x;
        let step = usable / CHROMA_BANDS as f32;
        self.xs = (0..=CHROMA_BANDS)
            .map(|i| self.layout.x + i as f32 * step)
            .collect();
    }

    fn render_frame(&mut self, frame_index: usize, features: &FeatureSet, canvas: &mut Canvas) {
        let chroma = features.chroma(frame_index);
        let points: Vec<(f32, f32)> = self
            .xs
            .iter()
            .enumerate()
            .map(|(i, &x)| {
                let value = chroma[i.min(CHROMA_BANDS - 1)];
                (x, aligned_y(self.layout.y, self.max_height * value, self.alignment))
            })
            .collect();

        let smooth = catmull_rom(&points, self.smoothness);
        if smooth.len() >= 2 {
            canvas.draw_polyline(&smooth, self.thickness, self.color);
        }
    }
}

/// Twelve independent scrolling lines, one per chroma band, stacked with a
/// configurable vertical offset and per-band colors.
pub struct LineBandsChroma {
    layout: Layout,
    max_height: f32,
    thickness: f32,
    spacing: f32,
    smoothness: usize,
    band_spacing: f32,
    colors: Vec<Rgb>,
    flow: Flow,
    alignment: Alignment,
    xs: Vec<f32>,
    lines: Vec<Vec<f32>>,
    center_index: usize,
}

impl LineBandsChroma {
    pub fn new(layout: Layout, cfg: &VisualizerConfig) -> Result<Self, JobError> {
        let ss = layout.ss;
        let colors = color::resolve(
            cfg.color_mode,
            cfg.color,
            cfg.gradient_start,
            cfg.gradient_end,
            &cfg.band_colors,
            CHROMA_BANDS,
        )?;
        Ok(Self {
            layout,
            max_height: cfg.line.max_height * ss,
            thickness: (cfg.line.thickness * ss).max(1.0),
            spacing: (cfg.line.spacing * ss).max(1.0),
            smoothness: cfg.line.smoothness.max(2) as usize,
            band_spacing: cfg.line.band_spacing * ss,
            colors,
            flow: cfg.flow,
            alignment: cfg.alignment,
            xs: Vec::new(),
            lines: Vec::new(),
            center_index: 0,
        })
    }
}

impl Visualizer for LineBandsChroma {
    fn prepare_shapes(&mut self) {
        self.xs.clear();
        let mut x = self.layout.x;
        while x <= self.layout.width {
            self.xs.push(x);
            x += self.spacing;
        }
        if self.flow == Flow::OutFromCenter && self.xs.len() % 2 == 0 {
            self.xs.pop();
        }
        self.center_index = self.xs.len() / 2;
        self.lines = vec![vec![0.0; self.xs.len()]; CHROMA_BANDS];
    }

    fn render_frame(&mut self, frame_index: usize, features: &FeatureSet, canvas: &mut Canvas) {
        let chroma = features.chroma(frame_index);
        for band in 0..CHROMA_BANDS {
            let new_height = self.max_height * chroma[band];
            let heights = &mut self.lines[band];
            flow_shift(heights, self.flow, self.center_index, new_height);

            let baseline = self.layout.y + band as f32 * self.band_spacing;
            let points: Vec<(f32, f32)> = self
                .xs
                .iter()
                .zip(heights.iter())
                .map(|(&x, &h)| (x, aligned_y(baseline, h, self.alignment)))
                .collect();

            let smooth = catmull_rom(&points, self.smoothness);
            if smooth.len() >= 2 {
                canvas.draw_polyline(&smooth, self.thickness, self.colors[band]);
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::audio::features::FrameFeatures;
    use crate::viz::color::ColorMode;

    fn volume_features(volumes: &[f32]) -> FeatureSet {
        let max = volumes.iter().copied().fold(f32::NEG_INFINITY, f32::max);
        FeatureSet {
            frames: volumes
                .iter()
                .map(|&v| FrameFeatures { average_volume: v, chroma: [0.0; 12] })
                .collect(),
            max_volume: max,
            min_volume: 0.0,
        }
    }

    fn chroma_features(chroma: [f32; 12]) -> FeatureSet {
        FeatureSet {
            frames: vec![FrameFeatures { average_volume: 0.5, chroma }],
            max_volume: 0.5,
            min_volume: 0.5,
        }
    }

    #[test]
    fn line_volume_scrolls_history() {
        let layout = Layout::new(100, 100, 1, 0, 80);
        let mut viz = LineVolume::new(layout, &VisualizerConfig::default()).unwrap();
        viz.prepare_shapes();
        let feats = volume_features(&[1.0, 0.0]);
        let mut canvas = Canvas::new(100, 100, 1);
        viz.render_frame(0, &feats, &mut canvas);
        assert_eq!(viz.heights[0], 50.0);
        viz.render_frame(1, &feats, &mut canvas);
        assert_eq!(viz.heights[0], 0.0);
        assert_eq!(viz.heights[1], 50.0);
    }

    #[test]
    fn line_volume_center_flow_odd() {
        let layout = Layout::new(100, 100, 1, 0, 80);
        let mut cfg = VisualizerConfig::default();
        cfg.flow = Flow::OutFromCenter;
        let mut viz = LineVolume::new(layout, &cfg).unwrap();
        viz.prepare_shapes();
        assert_eq!(viz.xs.len() % 2, 1);
        assert_eq!(viz.heights.len(), viz.xs.len());
    }

    #[test]
    fn line_chroma_has_thirteen_samples() {
        let layout = Layout::new(130, 100, 1, 0, 80);
        let mut viz = LineChroma::new(layout, &VisualizerConfig::default()).unwrap();
        viz.prepare_shapes();
        assert_eq!(viz.xs.len(), 13);
        assert_eq!(viz.xs[0], 0.0);
        assert!((viz.xs[12] - 130.0).abs() < 1e-3);
    }

    #[test]
    fn line_chroma_draws_at_band_height() {
        let layout = Layout::new(130, 100, 1, 0, 80);
        let mut viz = LineChroma::new(layout, &VisualizerConfig::default()).unwrap();
        viz.prepare_shapes();
        let mut chroma = [0.0; 12];
        chroma[0] = 1.0;
        let feats = chroma_features(chroma);
        let mut canvas = Canvas::new(130, 100, 1);
        viz.render_frame(0, &feats, &mut canvas);
        // Band 0 peaks at max_height above the baseline near x=0.
        assert_eq!(canvas.pixel(0, 30), [255, 255, 255]);
    }

    #[test]
    fn line_bands_keeps_twelve_independent_lines() {
        let layout = Layout::new(100, 200, 1, 0, 50);
        let mut viz = LineBandsChroma::new(layout, &VisualizerConfig::default()).unwrap();
        viz.prepare_shapes();
        assert_eq!(viz.lines.len(), 12);

        let mut chroma = [0.0; 12];
        chroma[3] = 1.0;
        let feats = chroma_features(chroma);
        let mut canvas = Canvas::new(100, 200, 1);
        viz.render_frame(0, &feats, &mut canvas);
        assert_eq!(viz.lines[3][0], 50.0);
        assert_eq!(viz.lines[2][0], 0.0);
    }

    #[test]
    fn line_bands_rejects_wrong_band_color_count() {
        let layout = Layout::new(100, 200, 1, 0, 50);
        let mut cfg = VisualizerConfig::default();
        cfg.color_mode = ColorMode::PerBand;
        cfg.band_colors = vec![[1, 1, 1]; 5];
        assert!(matches!(
            LineBandsChroma::new(layout, &cfg),
            Err(JobError::Config(_))
        ));
    }
}
