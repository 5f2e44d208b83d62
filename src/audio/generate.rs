use std::f32::consts::PI;
use std::fs;
use std::path::Path;

/// Sample rate of generated alarm assets.
pub const ALARM_SAMPLE_RATE: u32 = 44_100;
const HIGH_HZ: f32 = 800.0;
const LOW_HZ: f32 = 600.0;
const BEEP_SECS: f32 = 0.5;

/// Alternating two-tone beeps, full scale.
pub fn alarm_samples(sample_rate: u32, duration_secs: f32) -> Vec<f32> {
    let rate = sample_rate as f32;
    let total = (rate * duration_secs.max(0.0)) as usize;
    let beep_len = ((rate * BEEP_SECS) as usize).max(1);

    (0..total)
        .map(|i| {
            let freq = if (i / beep_len) % 2 == 0 { HIGH_HZ } else { LOW_HZ };
            (2.0 * PI * freq * i as f32 / rate).sin()
        })
        .collect()
}

/// Write an alarm WAV (mono 16-bit PCM) that `FileBackend` can play.
pub fn write_alarm_wav(
    path: &Path,
    duration_secs: f32,
) -> Result<(), Box<dyn std::error::Error + Send + Sync>> {
    if let Some(dir) = path.parent().filter(|d| !d.as_os_str().is_empty()) {
        fs::create_dir_all(dir)?;
    }

    let spec = hound::WavSpec {
        channels: 1,
        sample_rate: ALARM_SAMPLE_RATE,
        bits_per_sample: 16,
        sample_format: hound::SampleFormat::Int,
    };
    let mut writer = hound::WavWriter::create(path, spec)?;
    for s in alarm_samples(ALARM_SAMPLE_RATE, duration_secs) {
        let clamped = s.clamp(-1.0, 1.0);
        writer.write_sample((clamped * i16::MAX as f32) as i16)?;
    }
    writer.finalize()?;

    log::info!(
        "Alarm sound written to {} ({duration_secs}s at {ALARM_SAMPLE_RATE}Hz)",
        path.display()
    );
    Ok(())
}
