use std::f32::consts::PI;
use std::rc::Rc;
use std::sync::atomic::{AtomicU32, Ordering};
use std::sync::Arc;
use std::time::Duration;

use serde::{Deserialize, Serialize};
use tokio::runtime::Handle;
use tokio::task::JoinHandle;

use super::output::{Playback, SharedOutput};
use super::{AudioBackend, AudioError, BackendKind};

/// Siren tone settings.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SirenConfig {
    /// Base tone, also the first half of each cycle
    pub high_hz: f32,
    pub low_hz: f32,
    /// Linear output gain, 0.0..=1.0
    pub gain: f32,
    /// Time spent on each pitch
    pub modulation_ms: u64,
}

impl Default for SirenConfig {
    fn default() -> Self {
        Self {
            high_hz: 800.0,
            low_hz: 600.0,
            gain: 0.3,
            modulation_ms: 500,
        }
    }
}

impl SirenConfig {
    pub fn modulation_period(&self) -> Duration {
        Duration::from_millis(self.modulation_ms.max(1))
    }
}

/// Periodic pitch flip. Aborted when dropped.
struct SirenTimer(JoinHandle<()>);

impl SirenTimer {
    fn spawn(runtime: &Handle, frequency: Arc<AtomicU32>, siren: &SirenConfig) -> Self {
        let period = siren.modulation_period();
        let (high, low) = (siren.high_hz, siren.low_hz);
        let task = runtime.spawn(async move {
            let mut ticker = tokio::time::interval_at(tokio::time::Instant::now() + period, period);
            let mut is_high = true;
            loop {
                ticker.tick().await;
                is_high = !is_high;
                let hz = if is_high { high } else { low };
                frequency.store(hz.to_bits(), Ordering::Relaxed);
            }
        });
        Self(task)
    }
}

impl Drop for SirenTimer {
    fn drop(&mut self) {
        self.0.abort();
    }
}

/// A running tone: oscillator plus gain stage on the output, and its timer.
struct Voice {
    _playback: Playback,
    frequency: Arc<AtomicU32>,
    _timer: SirenTimer,
}

/// Siren generated on the fly, for when no alarm asset can be played.
pub struct SynthesizedBackend {
    output: Rc<SharedOutput>,
    siren: SirenConfig,
    runtime: Handle,
    voice: Option<Voice>,
}

impl SynthesizedBackend {
    pub fn new(output: Rc<SharedOutput>, siren: SirenConfig, runtime: Handle) -> Self {
        Self {
            output,
            siren,
            runtime,
            voice: None,
        }
    }

    /// Pitch currently being generated, if running.
    #[cfg(test)]
    pub fn frequency(&self) -> Option<f32> {
        self.voice
            .as_ref()
            .map(|v| f32::from_bits(v.frequency.load(Ordering::Relaxed)))
    }

    #[cfg(test)]
    pub fn is_running(&self) -> bool {
        self.voice.is_some()
    }
}

impl AudioBackend for SynthesizedBackend {
    fn kind(&self) -> BackendKind {
        BackendKind::Synthesized
    }

    fn start(&mut self) -> Result<(), AudioError> {
        if self.voice.is_some() {
            return Ok(());
        }
        let output = self.output.get()?;
        let sample_rate = output.sample_rate() as f32;
        let gain = self.siren.gain.clamp(0.0, 1.0);

        let frequency = Arc::new(AtomicU32::new(self.siren.high_hz.to_bits()));
        let osc_frequency = frequency.clone();
        let mut phase = 0.0_f32;
        let playback = output.play(Box::new(move |data: &mut [f32]| {
            let hz = f32::from_bits(osc_frequency.load(Ordering::Relaxed));
            let step = 2.0 * PI * hz / sample_rate;
            for sample in data.iter_mut() {
                *sample = phase.sin() * gain;
                phase = (phase + step) % (2.0 * PI);
            }
        }))?;

        let timer = SirenTimer::spawn(&self.runtime, frequency.clone(), &self.siren);
        log::info!(
            "Synthesized siren started ({}/{} Hz)",
            self.siren.high_hz,
            self.siren.low_hz
        );
        self.voice = Some(Voice {
            _playback: playback,
            frequency,
            _timer: timer,
        });
        Ok(())
    }

    fn stop(&mut self) {
        if let Some(voice) = self.voice.take() {
            let hz = f32::from_bits(voice.frequency.load(Ordering::Relaxed));
            log::info!("Synthesized siren stopped (at {hz} Hz)");
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::audio::output::testing::{shared, unavailable, MockOutput};

    fn backend(mock: &Rc<MockOutput>) -> SynthesizedBackend {
        SynthesizedBackend::new(shared(mock), SirenConfig::default(), Handle::current())
    }

    #[tokio::test(start_paused = true)]
    async fn alternates_pitch_every_period() {
        let mock = MockOutput::new(8000);
        let mut siren = backend(&mock);
        siren.start().unwrap();

        tokio::time::sleep(Duration::from_millis(250)).await;
        assert_eq!(siren.frequency(), Some(800.0));
        tokio::time::sleep(Duration::from_millis(500)).await;
        assert_eq!(siren.frequency(), Some(600.0));
        tokio::time::sleep(Duration::from_millis(500)).await;
        assert_eq!(siren.frequency(), Some(800.0));
        tokio::time::sleep(Duration::from_millis(500)).await;
        assert_eq!(siren.frequency(), Some(600.0));
    }

    #[tokio::test(start_paused = true)]
    async fn double_start_keeps_one_voice() {
        let mock = MockOutput::new(8000);
        let mut siren = backend(&mock);
        siren.start().unwrap();
        siren.start().unwrap();
        assert_eq!(mock.plays.get(), 1);
        assert_eq!(mock.live.get(), 1);

        // one timer: a single flip per period
        tokio::time::sleep(Duration::from_millis(750)).await;
        assert_eq!(siren.frequency(), Some(600.0));
    }

    #[tokio::test(start_paused = true)]
    async fn stop_cancels_timer_and_restart_reuses_output() {
        let mock = MockOutput::new(8000);
        let mut siren = backend(&mock);
        siren.stop();

        siren.start().unwrap();
        let frequency = siren.voice.as_ref().unwrap().frequency.clone();
        siren.stop();
        assert!(!siren.is_running());
        assert_eq!(mock.live.get(), 0);

        tokio::time::sleep(Duration::from_millis(1600)).await;
        assert_eq!(f32::from_bits(frequency.load(Ordering::Relaxed)), 800.0);

        siren.start().unwrap();
        assert_eq!(mock.plays.get(), 2);
        assert_eq!(mock.opens.get(), 1);
        assert_eq!(siren.frequency(), Some(800.0));
    }

    #[tokio::test]
    async fn renders_tone_at_fixed_gain() {
        let mock = MockOutput::new(48000);
        let mut siren = backend(&mock);
        siren.start().unwrap();
        let samples = mock.pull(48000);
        let peak = samples.iter().fold(0.0_f32, |m, s| m.max(s.abs()));
        assert!(peak > 0.299 && peak <= 0.3 + 1e-6, "peak {peak}");
        // 800 Hz over one second crosses zero upward ~800 times
        let rising = samples.windows(2).filter(|w| w[0] < 0.0 && w[1] >= 0.0).count();
        assert!((795..=805).contains(&rising), "rising {rising}");
    }

    #[tokio::test]
    async fn unavailable_output_fails_start() {
        let mut siren =
            SynthesizedBackend::new(unavailable(), SirenConfig::default(), Handle::current());
        assert!(matches!(siren.start(), Err(AudioError::NoDevice)));
        assert!(!siren.is_running());
    }
}
