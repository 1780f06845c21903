use serde::Deserialize;

use crate::job::error::JobError;
use crate::render::canvas::Rgb;

/// How a multi-shape visualizer colors its bands/segments.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize, clap::ValueEnum)]
#[serde(rename_all = "kebab-case")]
pub enum ColorMode {
    Single,
    Gradient,
    PerBand,
}

/// Resolves the color mode to an exact `steps`-length list, once, at
/// preparation time. Per-band mode demands exactly `steps` caller colors;
/// anything else is a configuration fault, not a runtime one.
pub fn resolve(
    mode: ColorMode,
    single: Rgb,
    gradient_start: Option<Rgb>,
    gradient_end: Option<Rgb>,
    band_colors: &[Rgb],
    steps: usize,
) -> Result<Vec<Rgb>, JobError> {
    match mode {
        ColorMode::Single => Ok(vec![single; steps]),
        ColorMode::Gradient => {
            let (start, end) = match (gradient_start, gradient_end) {
                (Some(start), Some(end)) => (start, end),
                _ => {
                    return Err(JobError::Config(
                        "gradient color mode requires gradient-start and gradient-end".into(),
                    ))
                }
            };
            Ok(gradient(start, end, steps))
        }
        ColorMode::PerBand => {
            if band_colors.len() != steps {
                return Err(JobError::Config(format!(
                    "per-band color mode needs exactly {} colors, got {}",
                    steps,
                    band_colors.len()
                )));
            }
            Ok(band_colors.to_vec())
        }
    }
}

/// Linear per-channel interpolation across `steps` evenly spaced t values
/// in [0, 1].
pub fn gradient(start: Rgb, end: Rgb, steps: usize) -> Vec<Rgb> {
    if steps <= 1 {
        return vec![start];
    }
    (0..steps)
        .map(|i| {
            let t = i as f32 / (steps - 1) as f32;
            let mut color = [0u8; 3];
            for c in 0..3 {
                color[c] = (start[c] as f32 + (end[c] as f32 - start[c] as f32) * t) as u8;
            }
            color
        })
        .collect()
}
