use crate::audio::chroma::CHROMA_BANDS;
use crate::audio::features::FeatureSet;
use crate::config::VisualizerConfig;
use crate::job::error::JobError;
use crate::render::canvas::{Canvas, Rgb};
use crate::render::rope::{spread_anchors, Rope, RopeParams};
use crate::render::spline::catmull_rom;

use super::{color, Flow, Layout, Visualizer};

fn rope_params(cfg: &VisualizerConfig) -> RopeParams {
    RopeParams {
        tension: cfg.rope.tension,
        damping: cfg.rope.damping,
        gravity: cfg.rope.gravity,
    }
}

fn rope_x_positions(layout: &Layout, points: usize) -> Vec<f32> {
    let step = layout.width / (points - 1) as f32;
    (0..points).map(|i| layout.x + i as f32 * step).collect()
}

/// Rope excited by a volume impulse — at the left end for left-to-right
/// flow, at the middle for center flow.
pub struct ForceLineVolume {
    layout: Layout,
    thickness: f32,
    points_count: usize,
    impulse_strength: f32,
    params: RopeParams,
    color: Rgb,
    flow: Flow,
    xs: Vec<f32>,
    rope: Rope,
    inject_index: usize,
}

impl ForceLineVolume {
    pub fn new(layout: Layout, cfg: &VisualizerConfig) -> Result<Self, JobError> {
        let points_count = (cfg.rope.points as usize).max(3);
        Ok(Self {
            layout,
            thickness: (cfg.line.thickness * layout.ss).max(1.0),
            points_count,
            impulse_strength: cfg.rope.impulse_strength,
            params: rope_params(cfg),
            color: cfg.color,
            flow: cfg.flow,
            xs: Vec::new(),
            rope: Rope::new(points_count),
            inject_index: 0,
        })
    }
}

impl Visualizer for ForceLineVolume {
    fn prepare_shapes(&mut self) {
        self.xs = rope_x_positions(&self.layout, self.points_count);
        self.rope = Rope::new(self.points_count);
        self.inject_index = match self.flow {
            Flow::LeftToRight => 0,
            Flow::OutFromCenter => self.points_count / 2,
        };
    }

    fn render_frame(&mut self, frame_index: usize, features: &FeatureSet, canvas: &mut Canvas) {
        let impulse = features.norm_volume(frame_index) * self.impulse_strength;
        self.rope.step(&self.params, &[(self.inject_index, impulse)]);

        let points: Vec<(f32, f32)> = self
            .xs
            .iter()
            .zip(self.rope.offsets.iter())
            .map(|(&x, &offset)| (x, self.layout.y - offset))
            .collect();
        canvas.draw_polyline(&points, self.thickness, self.color);
    }
}

/// One rope with twelve evenly spaced anchors; each chroma band pushes its
/// anchor after the diffusion pass.
pub struct ForceLineChroma {
    layout: Layout,
    thickness: f32,
    points_count: usize,
    force_strength: f32,
    smoothness: usize,
    params: RopeParams,
    color: Rgb,
    xs: Vec<f32>,
    rope: Rope,
    anchors: Vec<usize>,
}

impl ForceLineChroma {
    pub fn new(layout: Layout, cfg: &VisualizerConfig) -> Result<Self, JobError> {
        let points_count = (cfg.rope.points as usize).max(3);
        Ok(Self {
            layout,
            thickness: (cfg.line.thickness * layout.ss).max(1.0),
            points_count,
            force_strength: cfg.rope.force_strength,
            smoothness: cfg.line.smoothness.max(2) as usize,
            params: rope_params(cfg),
            color: cfg.color,
            xs: Vec::new(),
            rope: Rope::new(points_count),
            anchors: Vec::new(),
        })
    }
}

impl Visualizer for ForceLineChroma {
    fn prepare_shapes(&mut self) {
        self.xs = rope_x_positions(&self.layout, self.points_count);
        self.rope = Rope::new(self.points_count);
        self.anchors = spread_anchors(self.points_count, CHROMA_BANDS);
    }

    fn render_frame(&mut self, frame_index: usize, features: &FeatureSet, canvas: &mut Canvas) {
        let chroma = features.chroma(frame_index);
        self.rope.step(&self.params, &[]);
        for (band, &anchor) in self.anchors.iter().enumerate() {
            self.rope.excite(anchor, chroma[band] * self.force_strength);
        }

        let points: Vec<(f32, f32)> = self
            .xs
            .iter()
            .zip(self.rope.offsets.iter())
            .map(|(&x, &offset)| (x, self.layout.y - offset))
            .collect();
        let smooth = catmull_rom(&points, self.smoothness);
        if smooth.len() >= 2 {
            canvas.draw_polyline(&smooth, self.thickness, self.color);
        }
    }
}

/// Twelve independent ropes, one per chroma band, each excited at its left
/// end and stacked with a vertical offset.
pub struct ForceLinesChroma {
    layout: Layout,
    thickness: f32,
    points_count: usize,
    force_strength: f32,
    smoothness: usize,
    band_spacing: f32,
    params: RopeParams,
    colors: Vec<Rgb>,
    xs: Vec<f32>,
    ropes: Vec<Rope>,
}

impl ForceLinesChroma {
    pub fn new(layout: Layout, cfg: &VisualizerConfig) -> Result<Self, JobError> {
        let points_count = (cfg.rope.points as usize).max(3);
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
            thickness: (cfg.line.thickness * layout.ss).max(1.0),
            points_count,
            force_strength: cfg.rope.force_strength,
            smoothness: cfg.line.smoothness.max(2) as usize,
            band_spacing: cfg.line.band_spacing * layout.ss,
            params: rope_params(cfg),
            colors,
            xs: Vec::new(),
            ropes: Vec::new(),
        })
    }
}

impl Visualizer for ForceLinesChroma {
    fn prepare_shapes(&mut self) {
        self.xs = rope_x_positions(&self.layout, self.points_count);
        self.ropes = (0..CHROMA_BANDS)
            .map(|_| Rope::new(self.points_count))
            .collect();
    }

    fn render_frame(&mut self, frame_index: usize, features: &FeatureSet, canvas: &mut Canvas) {
        let chroma = features.chroma(frame_index);
        for (band, rope) in self.ropes.iter_mut().enumerate() {
            let force = chroma[band] * self.force_strength;
            rope.step(&self.params, &[(0, force)]);

            let baseline = self.layout.y + band as f32 * self.band_spacing;
            let points: Vec<(f32, f32)> = self
                .xs
                .iter()
                .zip(rope.offsets.iter())
                .map(|(&x, &offset)| (x, baseline - offset))
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

    fn chroma_features(frames: Vec<[f32; 12]>) -> FeatureSet {
        FeatureSet {
            frames: frames
                .into_iter()
                .map(|chroma| FrameFeatures { average_volume: 0.5, chroma })
                .collect(),
            max_volume: 0.5,
            min_volume: 0.5,
        }
    }

    #[test]
    fn volume_rope_injects_at_flow_anchor() {
        let layout = Layout::new(200, 100, 1, 0, 50);
        let mut cfg = VisualizerConfig::default();
        cfg.rope.points = 9;
        let mut viz = ForceLineVolume::new(layout, &cfg).unwrap();
        viz.prepare_shapes();
        assert_eq!(viz.inject_index, 0);

        cfg.flow = Flow::OutFromCenter;
        let mut centered = ForceLineVolume::new(layout, &cfg).unwrap();
        centered.prepare_shapes();
        assert_eq!(centered.inject_index, 4);

        let feats = volume_features(&[1.0]);
        let mut canvas = Canvas::new(200, 100, 1);
        viz.render_frame(0, &feats, &mut canvas);
        assert!(viz.rope.offsets[0] > 0.0);
        // Tension carries only an attenuated ripple to the far end.
        assert!(viz.rope.offsets[8].abs() < viz.rope.offsets[0]);
    }

    #[test]
    fn volume_rope_replays_identically() {
        let layout = Layout::new(200, 100, 1, 0, 50);
        let cfg = VisualizerConfig::default();
        let feats = volume_features(&[0.3, 0.9, 0.1, 0.7]);

        let mut canvas = Canvas::new(200, 100, 1);
        let mut run = || {
            let mut viz = ForceLineVolume::new(layout, &cfg).unwrap();
            viz.prepare_shapes();
            for i in 0..4 {
                viz.render_frame(i, &feats, &mut canvas);
            }
            viz.rope.offsets.clone()
        };
        let first = run();
        let second = run();
        assert_eq!(first, second);
    }

    #[test]
    fn chroma_rope_has_twelve_anchors() {
        let layout = Layout::new(200, 100, 1, 0, 50);
        let mut cfg = VisualizerConfig::default();
        cfg.rope.points = 80;
        let mut viz = ForceLineChroma::new(layout, &cfg).unwrap();
        viz.prepare_shapes();
        assert_eq!(viz.anchors.len(), 12);
        assert_eq!(viz.anchors[0], 0);
        assert_eq!(*viz.anchors.last().unwrap(), 79);
    }

    #[test]
    fn chroma_rope_anchor_moves_with_band() {
        let layout = Layout::new(200, 100, 1, 0, 50);
        let mut viz = ForceLineChroma::new(layout, &VisualizerConfig::default()).unwrap();
        viz.prepare_shapes();
        let mut chroma = [0.0; 12];
        chroma[11] = 1.0;
        let feats = chroma_features(vec![chroma]);
        let mut canvas = Canvas::new(200, 100, 1);
        viz.render_frame(0, &feats, &mut canvas);
        let last = *viz.anchors.last().unwrap();
        assert!(viz.rope.offsets[last] > 0.0);
        assert_eq!(viz.rope.offsets[viz.anchors[0]], 0.0);
    }

    #[test]
    fn independent_chains_per_band() {
        let layout = Layout::new(200, 200, 1, 0, 20);
        let mut viz = ForceLinesChroma::new(layout, &VisualizerConfig::default()).unwrap();
        viz.prepare_shapes();
        assert_eq!(viz.ropes.len(), 12);

        let mut chroma = [0.0; 12];
        chroma[5] = 1.0;
        let feats = chroma_features(vec![chroma]);
        let mut canvas = Canvas::new(200, 200, 1);
        viz.render_frame(0, &feats, &mut canvas);
        assert!(viz.ropes[5].offsets[0] > 0.0);
        assert_eq!(viz.ropes[4].offsets[0], 0.0);
    }
}
