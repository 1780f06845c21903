use rayon::prelude::*;

use super::chroma::{chroma_vector, CHROMA_BANDS};
use super::decode::AudioTrack;

/// Per-video-frame audio features. Volume is the mean absolute sample of
/// the frame's slice; chroma is the 12-band pitch-class energy vector.
/// Neither is normalized here — the volume denominator lives on
/// [`FeatureSet`].
#[derive(Clone, Debug)]
pub struct FrameFeatures {
    pub average_volume: f32,
    pub chroma: [f32; CHROMA_BANDS],
}

/// All per-frame features for a track plus the running volume extrema used
/// for normalization.
pub struct FeatureSet {
    pub frames: Vec<FrameFeatures>,
    pub max_volume: f32,
    /// Quietest frame volume, tracked alongside the peak.
    #[allow(dead_code)]
    pub min_volume: f32,
}

impl FeatureSet {
    pub fn len(&self) -> usize {
        self.frames.len()
    }

    pub fn is_empty(&self) -> bool {
        self.frames.is_empty()
    }

    /// Volume normalization denominator, guarded against silence: a
    /// non-positive peak normalizes against 1.0 instead of dividing by zero.
    pub fn volume_denominator(&self) -> f32 {
        if self.max_volume > 0.0 {
            self.max_volume
        } else {
            1.0
        }
    }

    /// Frame volume scaled into [0, 1] (1.0 for the loudest frame).
    pub fn norm_volume(&self, frame_index: usize) -> f32 {
        self.frames[frame_index].average_volume / self.volume_denominator()
    }

    pub fn chroma(&self, frame_index: usize) -> &[f32; CHROMA_BANDS] {
        &self.frames[frame_index].chroma
    }
}

/// Samples per output video frame at the given rate.
pub fn samples_per_frame(sample_rate: u32, fps: u32) -> usize {
    ((sample_rate as f32 / fps as f32).round() as usize).max(1)
}

/// Slices the track into one chunk per output video frame. The final chunk
/// takes whatever samples remain, so no sample is discarded and
/// `len == ceil(samples / samples_per_frame)`.
pub fn chunk(track: &AudioTrack, fps: u32) -> Vec<&[f32]> {
    let spf = samples_per_frame(track.sample_rate, fps);
    track.samples.chunks(spf).collect()
}

/// Extracts per-frame features from the whole track. Chroma analysis runs
/// one FFT plan per slice on the rayon pool (rayon-safe, like the per-frame
/// FFT pass it is modeled on); the extrema fold afterwards is sequential.
pub fn analyze(track: &AudioTrack, fps: u32) -> FeatureSet {
    let slices = chunk(track, fps);
    log::info!("Analyzing {} audio frames at {} fps...", slices.len(), fps);

    let frames: Vec<FrameFeatures> = slices
        .par_iter()
        .map(|slice| {
            let average_volume = if slice.is_empty() {
                0.0
            } else {
                slice.iter().map(|s| s.abs()).sum::<f32>() / slice.len() as f32
            };
            FrameFeatures {
                average_volume,
                chroma: chroma_vector(slice, track.sample_rate),
            }
        })
        .collect();

    let mut max_volume = f32::NEG_INFINITY;
    let mut min_volume = f32::INFINITY;
    for frame in &frames {
        max_volume = max_volume.max(frame.average_volume);
        min_volume = min_volume.min(frame.average_volume);
    }

    FeatureSet {
        frames,
        max_volume,
        min_volume,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn track(samples: Vec<f32>, sample_rate: u32) -> AudioTrack {
        AudioTrack { samples, sample_rate }
    }

    fn sine(freq: f32, sample_rate: u32, seconds: f32) -> Vec<f32> {
        let count = (sample_rate as f32 * seconds) as usize;
        (0..count)
            .map(|i| (2.0 * std::f32::consts::PI * freq * i as f32 / sample_rate as f32).sin())
            .collect()
    }

    #[test]
    fn chunks_cover_every_sample() {
        let t = track(vec![0.5; 22050 + 137], 22050);
        for fps in [10u32, 24, 30, 60] {
            let spf = samples_per_frame(t.sample_rate, fps);
            let chunks = chunk(&t, fps);
            let total: usize = chunks.iter().map(|c| c.len()).sum();
            assert_eq!(total, t.samples.len());
            assert_eq!(chunks.len(), t.samples.len().div_ceil(spf));
            for c in &chunks[..chunks.len() - 1] {
                assert_eq!(c.len(), spf);
            }
        }
    }

    #[test]
    fn trailing_partial_chunk_kept() {
        let t = track(vec![0.1; 2205 * 3 + 100], 22050);
        let chunks = chunk(&t, 10);
        assert_eq!(chunks.len(), 4);
        assert_eq!(chunks[3].len(), 100);
    }

    #[test]
    fn one_second_sine_at_ten_fps_is_ten_frames() {
        let t = track(sine(440.0, 22050, 1.0), 22050);
        let features = analyze(&t, 10);
        assert_eq!(features.len(), 10);
        assert!(features.max_volume > 0.0);
    }

    #[test]
    fn loudest_frame_normalizes_to_one() {
        let mut samples = vec![0.1f32; 1000];
        samples.extend(vec![0.9f32; 1000]);
        let t = track(samples, 1000);
        let features = analyze(&t, 1);
        let loudest = (0..features.len())
            .map(|i| features.norm_volume(i))
            .fold(0.0f32, f32::max);
        assert!((loudest - 1.0).abs() < 1e-6);
        for i in 0..features.len() {
            assert!(features.norm_volume(i) >= 0.0);
            assert!(features.norm_volume(i) <= 1.0);
        }
    }

    #[test]
    fn silent_audio_guards_denominator() {
        let t = track(vec![0.0; 22050], 22050);
        let features = analyze(&t, 10);
        assert_eq!(features.volume_denominator(), 1.0);
        for i in 0..features.len() {
            assert_eq!(features.norm_volume(i), 0.0);
        }
    }

    #[test]
    fn empty_track_has_no_frames() {
        let t = track(vec![], 22050);
        let features = analyze(&t, 30);
        assert!(features.is_empty());
        assert_eq!(features.volume_denominator(), 1.0);
    }

    #[test]
    fn volume_is_mean_absolute_value() {
        let t = track(vec![0.5, -0.5, 0.25, -0.25], 4);
        let features = analyze(&t, 1);
        assert_eq!(features.len(), 1);
        assert!((features.frames[0].average_volume - 0.375).abs() < 1e-6);
    }
}
