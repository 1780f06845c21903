use crate::audio::features::FeatureSet;
use crate::config::VisualizerConfig;
use crate::job::error::JobError;
use crate::render::canvas::{Canvas, Rgb};

use super::{flow_shift, Alignment, Flow, Layout, Visualizer};

/// Scrolling history of volume bars. Every frame the bar heights shift one
/// slot along the flow direction and the freshly measured volume enters at
/// the insert point.
pub struct RectangleVolume {
    layout: Layout,
    box_width: f32,
    box_height: f32,
    border_width: f32,
    spacing: f32,
    corner_radius: f32,
    requested_count: i32,
    fill: Rgb,
    border: Rgb,
    flow: Flow,
    alignment: Alignment,
    xs: Vec<f32>,
    heights: Vec<f32>,
    center_index: usize,
}

impl RectangleVolume {
    pub fn new(layout: Layout, cfg: &VisualizerConfig) -> Result<Self, JobError> {
        let ss = layout.ss;
        Ok(Self {
            layout,
            box_width: cfg.rect.box_width * ss,
            box_height: cfg.rect.box_height * ss,
            border_width: cfg.rect.border_width * ss,
            spacing: cfg.rect.spacing * ss,
            corner_radius: cfg.rect.corner_radius * ss,
            requested_count: cfg.rect.count,
            fill: cfg.color,
            border: cfg.border_color.unwrap_or(cfg.color),
            flow: cfg.flow,
            alignment: cfg.alignment,
            xs: Vec::new(),
            heights: Vec::new(),
            center_index: 0,
        })
    }
}

impl Visualizer for RectangleVolume {
    fn prepare_shapes(&mut self) {
        let step = self.box_width + self.spacing;
        let count = if self.requested_count >= 0 {
            self.requested_count as usize
        } else {
            (self.layout.width / step) as usize
        };

        self.xs.clear();
        for i in 0..count {
            let x1 = self.layout.x + i as f32 * step;
            // Boxes that would cross the frame edge are dropped here, not
            // clipped at draw time.
            if x1 + self.box_width >= self.layout.width {
                break;
            }
            self.xs.push(x1);
        }

        if self.flow == Flow::OutFromCenter && self.xs.len() % 2 == 0 {
            self.xs.pop();
        }
        self.center_index = self.xs.len() / 2;
        self.heights = vec![0.0; self.xs.len()];
    }

    fn render_frame(&mut self, frame_index: usize, features: &FeatureSet, canvas: &mut Canvas) {
        let new_height = self.box_height * features.norm_volume(frame_index);
        flow_shift(&mut self.heights, self.flow, self.center_index, new_height);

        let y = self.layout.y;
        for (&x1, &h) in self.xs.iter().zip(self.heights.iter()) {
            let (y1, y2) = match self.alignment {
                Alignment::Bottom => (y - h, y + self.border_width),
                Alignment::Center => (y - h / 2.0, y + h / 2.0),
            };
            canvas.fill_rounded_rect(
                x1,
                y1,
                x1 + self.box_width,
                y2,
                self.corner_radius,
                self.fill,
                self.border,
                self.border_width,
            );
        }
    }
}

/// Scrolling history of volume circles; the radius carries the history so
/// redraw only needs the fixed center x and the baseline.
pub struct CircleVolume {
    layout: Layout,
    max_radius: f32,
    border_width: f32,
    spacing: f32,
    requested_count: i32,
    fill: Rgb,
    border: Rgb,
    flow: Flow,
    alignment: Alignment,
    centers: Vec<f32>,
    radii: Vec<f32>,
    center_index: usize,
}

impl CircleVolume {
    pub fn new(layout: Layout, cfg: &VisualizerConfig) -> Result<Self, JobError> {
        let ss = layout.ss;
        Ok(Self {
            layout,
            max_radius: cfg.circle.max_radius * ss,
            border_width: cfg.circle.border_width * ss,
            spacing: cfg.circle.spacing * ss,
            requested_count: cfg.circle.count,
            fill: cfg.color,
            border: cfg.border_color.unwrap_or(cfg.color),
            flow: cfg.flow,
            alignment: cfg.alignment,
            centers: Vec::new(),
            radii: Vec::new(),
            center_index: 0,
        })
    }
}

impl Visualizer for CircleVolume {
    fn prepare_shapes(&mut self) {
        let step = self.max_radius * 2.0 + self.spacing;
        let count = if self.requested_count >= 0 {
            self.requested_count as usize
        } else {
            (self.layout.width / step) as usize
        };

        self.centers.clear();
        for i in 0..count {
            let cx = self.layout.x + i as f32 * step + self.max_radius;
            if cx + self.max_radius + self.border_width >= self.layout.width {
                break;
            }
            self.centers.push(cx);
        }

        if self.flow == Flow::OutFromCenter && self.centers.len() % 2 == 0 {
            self.centers.pop();
        }
        self.center_index = self.centers.len() / 2;
        self.radii = vec![0.0; self.centers.len()];
    }

    fn render_frame(&mut self, frame_index: usize, features: &FeatureSet, canvas: &mut Canvas) {
        let new_radius = self.max_radius * features.norm_volume(frame_index);
        flow_shift(&mut self.radii, self.flow, self.center_index, new_radius);

        let y = self.layout.y;
        for (&cx, &r) in self.centers.iter().zip(self.radii.iter()) {
            let (y1, y2) = match self.alignment {
                Alignment::Bottom => (y - r * 2.0, y),
                Alignment::Center => (y - r, y + r),
            };
            canvas.fill_ellipse(cx - r, y1, cx + r, y2, self.fill, self.border, self.border_width);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::audio::features::FrameFeatures;

    fn features(volumes: &[f32]) -> FeatureSet {
        let max = volumes.iter().copied().fold(f32::NEG_INFINITY, f32::max);
        let min = volumes.iter().copied().fold(f32::INFINITY, f32::min);
        FeatureSet {
            frames: volumes
                .iter()
                .map(|&v| FrameFeatures { average_volume: v, chroma: [0.0; 12] })
                .collect(),
            max_volume: max,
            min_volume: min,
        }
    }

    fn config() -> VisualizerConfig {
        VisualizerConfig::default()
    }

    #[test]
    fn rectangle_history_shifts_left_to_right() {
        let layout = Layout::new(320, 240, 1, 0, 180);
        let mut viz = RectangleVolume::new(layout, &config()).unwrap();
        viz.prepare_shapes();
        let feats = features(&[1.0, 0.0, 0.0]);

        let mut canvas = Canvas::new(320, 240, 1);
        viz.render_frame(0, &feats, &mut canvas);
        assert_eq!(viz.heights[0], 50.0);

        let before = viz.heights.clone();
        viz.render_frame(1, &feats, &mut canvas);
        assert_eq!(viz.heights[0], 0.0);
        assert_eq!(&viz.heights[1..], &before[..before.len() - 1]);
    }

    #[test]
    fn rectangle_center_flow_forces_odd_count() {
        let layout = Layout::new(320, 240, 1, 0, 180);
        let mut cfg = config();
        cfg.flow = Flow::OutFromCenter;
        let mut viz = RectangleVolume::new(layout, &cfg).unwrap();
        viz.prepare_shapes();
        assert_eq!(viz.xs.len() % 2, 1);
        assert_eq!(viz.center_index, viz.xs.len() / 2);
    }

    #[test]
    fn rectangle_out_of_bounds_boxes_dropped() {
        // 40px frame fits at most two 10+5 boxes before hitting the edge.
        let layout = Layout::new(40, 240, 1, 0, 180);
        let mut viz = RectangleVolume::new(layout, &config()).unwrap();
        viz.prepare_shapes();
        assert!(viz.xs.len() <= 2);
        for &x in &viz.xs {
            assert!(x + viz.box_width < 40.0);
        }
    }

    #[test]
    fn rectangle_draws_above_bottom_baseline() {
        let layout = Layout::new(64, 64, 1, 0, 60);
        let mut cfg = config();
        cfg.rect.box_height = 40.0;
        let mut viz = RectangleVolume::new(layout, &cfg).unwrap();
        viz.prepare_shapes();
        let feats = features(&[1.0]);
        let mut canvas = Canvas::new(64, 64, 1);
        viz.render_frame(0, &feats, &mut canvas);
        // First box spans x 0..10, y 20..60ish.
        assert_eq!(canvas.pixel(5, 40), [255, 255, 255]);
        assert_eq!(canvas.pixel(5, 10), [0, 0, 0]);
    }

    #[test]
    fn circle_radius_tracks_volume() {
        let layout = Layout::new(320, 240, 1, 0, 120);
        let mut cfg = config();
        cfg.circle.max_radius = 20.0;
        let mut viz = CircleVolume::new(layout, &cfg).unwrap();
        viz.prepare_shapes();
        let feats = features(&[0.5, 1.0]);
        let mut canvas = Canvas::new(320, 240, 1);
        viz.render_frame(0, &feats, &mut canvas);
        assert_eq!(viz.radii[0], 10.0);
        viz.render_frame(1, &feats, &mut canvas);
        assert_eq!(viz.radii[0], 20.0);
        assert_eq!(viz.radii[1], 10.0);
    }

    #[test]
    fn circle_center_flow_is_odd_after_drop_pass() {
        let layout = Layout::new(300, 240, 1, 0, 120);
        let mut cfg = config();
        cfg.flow = Flow::OutFromCenter;
        let mut viz = CircleVolume::new(layout, &cfg).unwrap();
        viz.prepare_shapes();
        assert_eq!(viz.centers.len() % 2, 1);
        assert_eq!(viz.center_index, viz.centers.len() / 2);
    }

    #[test]
    fn silent_track_keeps_all_heights_zero() {
        let layout = Layout::new(320, 240, 1, 0, 180);
        let mut viz = RectangleVolume::new(layout, &config()).unwrap();
        viz.prepare_shapes();
        let feats = features(&[0.0, 0.0, 0.0]);
        let mut canvas = Canvas::new(320, 240, 1);
        for i in 0..3 {
            viz.render_frame(i, &feats, &mut canvas);
        }
        assert!(viz.heights.iter().all(|&h| h == 0.0));
    }
}
