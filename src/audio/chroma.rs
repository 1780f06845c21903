use rustfft::{num_complex::Complex, FftPlanner};

pub const CHROMA_BANDS: usize = 12;

const FFT_SIZE: usize = 2048;
const HOP_SIZE: usize = 512;

/// Short-time chroma transform of one sample slice.
///
/// Runs a hann-windowed STFT over the slice, folds each column's power
/// spectrum onto the 12 pitch classes, normalizes every column by its own
/// peak, and averages the columns. Slices shorter than the FFT size are
/// zero-padded into a single column.
pub fn chroma_vector(samples: &[f32], sample_rate: u32) -> [f32; CHROMA_BANDS] {
    let mut planner = FftPlanner::<f32>::new();
    let fft = planner.plan_fft_forward(FFT_SIZE);
    let hann = hann_window(FFT_SIZE);
    let bin_class = pitch_class_map(sample_rate);

    let mut accum = [0.0f32; CHROMA_BANDS];
    let mut columns = 0usize;

    let mut pos = 0;
    loop {
        let mut buffer: Vec<Complex<f32>> = (0..FFT_SIZE)
            .map(|i| {
                let sample = samples.get(pos + i).copied().unwrap_or(0.0);
                Complex::new(sample * hann[i], 0.0)
            })
            .collect();
        fft.process(&mut buffer);

        let mut column = [0.0f32; CHROMA_BANDS];
        for (k, class) in bin_class.iter().enumerate() {
            if let Some(class) = class {
                let power = buffer[k].norm_sqr();
                column[*class] += power;
            }
        }

        let peak = column.iter().copied().fold(0.0f32, f32::max);
        if peak > 0.0 {
            for (acc, value) in accum.iter_mut().zip(column.iter()) {
                *acc += value / peak;
            }
        }
        columns += 1;

        pos += HOP_SIZE;
        if pos >= samples.len() {
            break;
        }
    }

    if columns > 0 {
        for value in accum.iter_mut() {
            *value /= columns as f32;
        }
    }
    accum
}

/// Maps each FFT bin below Nyquist to its pitch class. Bins under 20 Hz are
/// discarded as DC/rumble.
fn pitch_class_map(sample_rate: u32) -> Vec<Option<usize>> {
    let freq_resolution = sample_rate as f32 / FFT_SIZE as f32;
    (0..FFT_SIZE / 2)
        .map(|k| {
            let freq = k as f32 * freq_resolution;
            if freq < 20.0 {
                return None;
            }
            let midi = 69.0 + 12.0 * (freq / 440.0).log2();
            let class = (midi.round() as i64).rem_euclid(12) as usize;
            Some(class)
        })
        .collect()
}

fn hann_window(size: usize) -> Vec<f32> {
    (0..size)
        .map(|i| {
            0.5 * (1.0 - (2.0 * std::f32::consts::PI * i as f32 / (size - 1) as f32).cos())
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sine(freq: f32, sample_rate: u32, seconds: f32) -> Vec<f32> {
        let count = (sample_rate as f32 * seconds) as usize;
        (0..count)
            .map(|i| (2.0 * std::f32::consts::PI * freq * i as f32 / sample_rate as f32).sin())
            .collect()
    }

    #[test]
    fn silence_yields_zero_energy() {
        let chroma = chroma_vector(&vec![0.0; 4096], 22050);
        assert!(chroma.iter().all(|&v| v == 0.0));
    }

    #[test]
    fn values_bounded_by_column_normalization() {
        let samples = sine(440.0, 22050, 0.5);
        let chroma = chroma_vector(&samples, 22050);
        for &v in &chroma {
            assert!((0.0..=1.0).contains(&v), "band out of range: {}", v);
        }
    }

    #[test]
    fn pure_tone_peaks_at_its_pitch_class() {
        // 440 Hz is A, pitch class 9.
        let samples = sine(440.0, 22050, 0.5);
        let chroma = chroma_vector(&samples, 22050);
        let peak_band = chroma
            .iter()
            .enumerate()
            .max_by(|a, b| a.1.partial_cmp(b.1).unwrap())
            .map(|(i, _)| i)
            .unwrap();
        assert_eq!(peak_band, 9);
        assert!(chroma[9] > 0.9);
    }

    #[test]
    fn short_slice_is_zero_padded() {
        let samples = sine(261.63, 22050, 0.05); // C4, shorter than one FFT window
        let chroma = chroma_vector(&samples, 22050);
        let peak_band = chroma
            .iter()
            .enumerate()
            .max_by(|a, b| a.1.partial_cmp(b.1).unwrap())
            .map(|(i, _)| i)
            .unwrap();
        assert_eq!(peak_band, 0);
    }

    #[test]
    fn pitch_class_map_ranges() {
        let map = pitch_class_map(22050);
        assert_eq!(map.len(), FFT_SIZE / 2);
        assert!(map[0].is_none());
        assert!(map.iter().flatten().all(|&c| c < 12));
    }
}
