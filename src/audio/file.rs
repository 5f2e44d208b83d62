use std::path::{Path, PathBuf};
use std::rc::Rc;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

use super::output::{Playback, SharedOutput};
use super::{AudioBackend, AudioError, BackendKind};

/// Plays the configured alarm WAV on a loop.
pub struct FileBackend {
    asset: Option<PathBuf>,
    output: Rc<SharedOutput>,
    position: Arc<AtomicUsize>,
    playback: Option<Playback>,
    /// Decoded clip and the output rate it was resampled for.
    clip: Option<(u32, Arc<Vec<f32>>)>,
}

impl FileBackend {
    pub fn new(asset: Option<PathBuf>, output: Rc<SharedOutput>) -> Self {
        Self {
            asset,
            output,
            position: Arc::new(AtomicUsize::new(0)),
            playback: None,
            clip: None,
        }
    }

    fn clip_for(&mut self, rate: u32) -> Result<Arc<Vec<f32>>, AudioError> {
        if let Some((cached_rate, clip)) = &self.clip {
            if *cached_rate == rate {
                return Ok(clip.clone());
            }
        }
        let path = self.asset.as_deref().ok_or(AudioError::NoAsset)?;
        let (samples, source_rate) = decode_wav(path)?;
        if samples.is_empty() {
            return Err(AudioError::Asset {
                path: path.to_path_buf(),
                reason: "no samples".into(),
            });
        }
        let clip = Arc::new(resample(&samples, source_rate, rate));
        self.clip = Some((rate, clip.clone()));
        Ok(clip)
    }

    /// Current frame within the clip.
    #[cfg(test)]
    pub fn position(&self) -> usize {
        self.position.load(Ordering::Relaxed)
    }

    #[cfg(test)]
    pub fn is_playing(&self) -> bool {
        self.playback.is_some()
    }
}

impl AudioBackend for FileBackend {
    fn kind(&self) -> BackendKind {
        BackendKind::File
    }

    fn start(&mut self) -> Result<(), AudioError> {
        if self.playback.is_some() {
            return Ok(());
        }
        if self.asset.is_none() {
            return Err(AudioError::NoAsset);
        }
        let output = self.output.get()?;
        let clip = self.clip_for(output.sample_rate())?;

        self.position.store(0, Ordering::Relaxed);
        let position = self.position.clone();
        let playback = output.play(Box::new(move |data: &mut [f32]| {
            let mut idx = position.load(Ordering::Relaxed);
            for sample in data.iter_mut() {
                *sample = clip[idx];
                idx = (idx + 1) % clip.len();
            }
            position.store(idx, Ordering::Relaxed);
        }))?;

        if let Some(path) = &self.asset {
            log::info!("Playing alarm sound {}", path.display());
        }
        self.playback = Some(playback);
        Ok(())
    }

    fn stop(&mut self) {
        self.playback = None;
        self.position.store(0, Ordering::Relaxed);
    }
}

/// Decode a WAV file into mono f32 samples and its sample rate.
pub fn decode_wav(path: &Path) -> Result<(Vec<f32>, u32), AudioError> {
    let is_wav = path
        .extension()
        .is_some_and(|ext| ext.eq_ignore_ascii_case("wav"));
    if !is_wav {
        return Err(AudioError::Unsupported(path.to_path_buf()));
    }

    let asset_err = |reason: String| AudioError::Asset {
        path: path.to_path_buf(),
        reason,
    };

    let mut reader = hound::WavReader::open(path).map_err(|e| asset_err(e.to_string()))?;
    let spec = reader.spec();
    let channels = spec.channels.max(1) as usize;

    let interleaved: Vec<f32> = match spec.sample_format {
        hound::SampleFormat::Float => reader
            .samples::<f32>()
            .collect::<Result<_, _>>()
            .map_err(|e| asset_err(e.to_string()))?,
        hound::SampleFormat::Int => {
            let scale = (1i64 << (spec.bits_per_sample.clamp(1, 32) - 1)) as f32;
            reader
                .samples::<i32>()
                .map(|s| s.map(|v| v as f32 / scale))
                .collect::<Result<_, _>>()
                .map_err(|e| asset_err(e.to_string()))?
        }
    };

    let mono = interleaved
        .chunks(channels)
        .map(|frame| frame.iter().sum::<f32>() / frame.len() as f32)
        .collect();
    Ok((mono, spec.sample_rate))
}

/// Linear resampling between rates.
fn resample(samples: &[f32], from: u32, to: u32) -> Vec<f32> {
    if from == to || from == 0 || to == 0 || samples.len() < 2 {
        return samples.to_vec();
    }
    let ratio = from as f64 / to as f64;
    let out_len = ((samples.len() as f64) / ratio).floor().max(1.0) as usize;
    (0..out_len)
        .map(|i| {
            let pos = i as f64 * ratio;
            let idx = pos.floor() as usize;
            let frac = (pos - idx as f64) as f32;
            let a = samples[idx.min(samples.len() - 1)];
            let b = samples[(idx + 1).min(samples.len() - 1)];
            a + (b - a) * frac
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::audio::output::testing::{shared, unavailable, MockOutput};

    fn write_wav(path: &Path, rate: u32, channels: u16, samples: &[i16]) {
        let spec = hound::WavSpec {
            channels,
            sample_rate: rate,
            bits_per_sample: 16,
            sample_format: hound::SampleFormat::Int,
        };
        let mut writer = hound::WavWriter::create(path, spec).unwrap();
        for &s in samples {
            writer.write_sample(s).unwrap();
        }
        writer.finalize().unwrap();
    }

    #[test]
    fn no_asset_configured_fails() {
        let mock = MockOutput::new(8000);
        let mut backend = FileBackend::new(None, shared(&mock));
        assert!(matches!(backend.start(), Err(AudioError::NoAsset)));
        assert_eq!(mock.plays.get(), 0);
    }

    #[test]
    fn missing_asset_fails() {
        let dir = tempfile::tempdir().unwrap();
        let mock = MockOutput::new(8000);
        let mut backend = FileBackend::new(Some(dir.path().join("alarm.wav")), shared(&mock));
        assert!(matches!(backend.start(), Err(AudioError::Asset { .. })));
        assert!(!backend.is_playing());
    }

    #[test]
    fn non_wav_asset_is_unsupported() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("alarm.mp3");
        std::fs::write(&path, b"ID3").unwrap();
        let mut backend = FileBackend::new(Some(path), shared(&MockOutput::new(8000)));
        assert!(matches!(backend.start(), Err(AudioError::Unsupported(_))));
    }

    #[test]
    fn no_output_device_fails() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("alarm.wav");
        write_wav(&path, 8000, 1, &[1000; 16]);
        let mut backend = FileBackend::new(Some(path), unavailable());
        assert!(matches!(backend.start(), Err(AudioError::NoDevice)));
    }

    #[test]
    fn plays_from_zero_and_rewinds_on_stop() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("alarm.wav");
        let samples: Vec<i16> = (0..8).map(|i| i * 1000).collect();
        write_wav(&path, 8000, 1, &samples);

        let mock = MockOutput::new(8000);
        let mut backend = FileBackend::new(Some(path), shared(&mock));
        backend.start().unwrap();
        backend.start().unwrap();
        assert_eq!(mock.plays.get(), 1);

        let pulled = mock.pull(10);
        assert_eq!(pulled[0], 0.0);
        assert!((pulled[1] - 1000.0 / 32768.0).abs() < 1e-6);
        // loops back to the start of the clip
        assert_eq!(pulled[8], 0.0);
        assert_eq!(backend.position(), 2);

        backend.stop();
        assert_eq!(backend.position(), 0);
        assert_eq!(mock.live.get(), 0);
        backend.stop();
        assert!(!backend.is_playing());
    }

    #[test]
    fn clip_is_decoded_once() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("alarm.wav");
        write_wav(&path, 8000, 1, &[1000; 16]);

        let mock = MockOutput::new(8000);
        let mut backend = FileBackend::new(Some(path.clone()), shared(&mock));
        backend.start().unwrap();
        backend.stop();

        std::fs::remove_file(&path).unwrap();
        backend.start().unwrap();
        assert!(backend.is_playing());
        assert_eq!(mock.plays.get(), 2);
    }

    #[test]
    fn missing_device_skips_decoding() {
        let dir = tempfile::tempdir().unwrap();
        let mut backend = FileBackend::new(Some(dir.path().join("absent.wav")), unavailable());
        assert!(matches!(backend.start(), Err(AudioError::NoDevice)));
    }

    #[test]
    fn downmixes_stereo() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("stereo.wav");
        write_wav(&path, 22050, 2, &[16384, 0, -16384, -16384]);
        let (mono, rate) = decode_wav(&path).unwrap();
        assert_eq!(rate, 22050);
        assert_eq!(mono, vec![0.25, -0.5]);
    }

    #[test]
    fn resample_halves_length() {
        let input: Vec<f32> = (0..100).map(|i| i as f32).collect();
        let out = resample(&input, 44100, 22050);
        assert_eq!(out.len(), 50);
        assert_eq!(out[10], 20.0);
    }
}
