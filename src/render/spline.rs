/// Catmull-Rom smoothing of a polyline.
///
/// Each consecutive point pair becomes one spline segment; the missing
/// outer control points at the sequence boundaries are filled in by
/// duplicating the first/last point. Every segment emits
/// `samples_per_segment + 1` points (t in [0, 1] inclusive), so the curve
/// passes exactly through all input points.
pub fn catmull_rom(points: &[(f32, f32)], samples_per_segment: usize) -> Vec<(f32, f32)> {
    if points.len() < 2 {
        return points.to_vec();
    }

    let samples = samples_per_segment.max(2);
    let mut out = Vec::with_capacity((points.len() - 1) * (samples + 1));

    for i in 0..points.len() - 1 {
        let p0 = if i >= 1 { points[i - 1] } else { points[i] };
        let p1 = points[i];
        let p2 = points[i + 1];
        let p3 = if i + 2 < points.len() { points[i + 2] } else { points[i + 1] };

        for j in 0..=samples {
            let t = j as f32 / samples as f32;
            let t2 = t * t;
            let t3 = t2 * t;
            let x = 0.5
                * (2.0 * p1.0
                    + (-p0.0 + p2.0) * t
                    + (2.0 * p0.0 - 5.0 * p1.0 + 4.0 * p2.0 - p3.0) * t2
                    + (-p0.0 + 3.0 * p1.0 - 3.0 * p2.0 + p3.0) * t3);
            let y = 0.5
                * (2.0 * p1.1
                    + (-p0.1 + p2.1) * t
                    + (2.0 * p0.1 - 5.0 * p1.1 + 4.0 * p2.1 - p3.1) * t2
                    + (-p0.1 + 3.0 * p1.1 - 3.0 * p2.1 + p3.1) * t3);
            out.push((x, y));
        }
    }

    out
}

#[cfg(test)]
mod tests {
    use super::*;

    fn close(a: (f32, f32), b: (f32, f32)) -> bool {
        (a.0 - b.0).abs() < 1e-4 && (a.1 - b.1).abs() < 1e-4
    }

    #[test]
    fn degenerate_input_returned_unchanged() {
        assert!(catmull_rom(&[], 8).is_empty());
        let one = vec![(3.0, 4.0)];
        assert_eq!(catmull_rom(&one, 8), one);
    }

    #[test]
    fn endpoints_preserved() {
        let pts = vec![(0.0, 0.0), (10.0, 5.0), (20.0, -3.0), (30.0, 1.0)];
        let smooth = catmull_rom(&pts, 8);
        assert!(close(smooth[0], pts[0]));
        assert!(close(*smooth.last().unwrap(), *pts.last().unwrap()));
    }

    #[test]
    fn passes_through_every_control_point() {
        let pts = vec![(0.0, 2.0), (5.0, 9.0), (10.0, 4.0), (15.0, 7.0)];
        let smooth = catmull_rom(&pts, 4);
        for p in &pts {
            assert!(
                smooth.iter().any(|s| close(*s, *p)),
                "control point {:?} missing from curve",
                p
            );
        }
    }

    #[test]
    fn densifies_by_segment_count() {
        let pts = vec![(0.0, 0.0), (1.0, 1.0), (2.0, 0.0)];
        let smooth = catmull_rom(&pts, 10);
        assert_eq!(smooth.len(), (pts.len() - 1) * 11);
    }

    #[test]
    fn straight_line_stays_straight() {
        let pts = vec![(0.0, 0.0), (10.0, 10.0), (20.0, 20.0), (30.0, 30.0)];
        for (x, y) in catmull_rom(&pts, 6) {
            assert!((x - y).abs() < 1e-3);
        }
    }
}
