use std::any::Any;
use std::cell::OnceCell;
use std::rc::Rc;

use cpal::traits::{DeviceTrait, HostTrait, StreamTrait};
use cpal::{FromSample, Sample, SizedSample};

use super::AudioError;

/// Fills a buffer of mono frames. Runs on the audio thread.
pub type RenderFn = Box<dyn FnMut(&mut [f32]) + Send + 'static>;

/// Opens the output the first time it is needed.
pub type OutputOpener = Box<dyn Fn() -> Result<Rc<dyn AudioOutput>, AudioError>>;

/// Something that can play rendered mono audio.
pub trait AudioOutput {
    fn sample_rate(&self) -> u32;
    fn play(&self, render: RenderFn) -> Result<Playback, AudioError>;
}

/// A live output stream. Playback ends when this is dropped.
pub struct Playback {
    _stream: Box<dyn Any>,
}

impl Playback {
    pub fn new<T: 'static>(stream: T) -> Self {
        Self {
            _stream: Box::new(stream),
        }
    }
}

/// The default cpal output device.
pub struct CpalOutput {
    device: cpal::Device,
    config: cpal::StreamConfig,
    format: cpal::SampleFormat,
    sample_rate: u32,
    channels: usize,
}

impl CpalOutput {
    pub fn open_default() -> Result<Self, AudioError> {
        let host = cpal::default_host();
        let device = host.default_output_device().ok_or(AudioError::NoDevice)?;
        let supported = device
            .default_output_config()
            .map_err(|e| AudioError::DeviceConfig(e.to_string()))?;
        let sample_rate = supported.sample_rate();
        let channels = supported.channels() as usize;
        let format = supported.sample_format();

        log::info!(
            "Output device: {:?} ({sample_rate}Hz, {channels}ch, {format:?})",
            device.description()
        );

        Ok(Self {
            device,
            config: supported.into(),
            format,
            sample_rate,
            channels,
        })
    }
}

impl AudioOutput for CpalOutput {
    fn sample_rate(&self) -> u32 {
        self.sample_rate
    }

    fn play(&self, render: RenderFn) -> Result<Playback, AudioError> {
        let stream = match self.format {
            cpal::SampleFormat::F32 => self.build::<f32>(render)?,
            cpal::SampleFormat::I16 => self.build::<i16>(render)?,
            cpal::SampleFormat::U16 => self.build::<u16>(render)?,
            cpal::SampleFormat::I32 => self.build::<i32>(render)?,
            other => {
                return Err(AudioError::StreamBuild(format!(
                    "unsupported sample format {other:?}"
                )))
            }
        };

        stream
            .play()
            .map_err(|e| AudioError::StreamPlay(e.to_string()))?;
        Ok(Playback::new(stream))
    }
}

impl CpalOutput {
    fn build<T>(&self, mut render: RenderFn) -> Result<cpal::Stream, AudioError>
    where
        T: SizedSample + FromSample<f32>,
    {
        let channels = self.channels.max(1);
        let mut mono: Vec<f32> = Vec::new();

        self.device
            .build_output_stream(
                &self.config,
                move |data: &mut [T], _: &cpal::OutputCallbackInfo| {
                    mono.resize(data.len() / channels, 0.0);
                    render(&mut mono);
                    fan_out(data, &mono, channels);
                },
                |err| log::error!("Audio output error: {err}"),
                None,
            )
            .map_err(|e| AudioError::StreamBuild(format!("{e} ({:?})", self.format)))
    }
}

/// Copy each mono frame to every channel, converting to the device format.
fn fan_out<T>(data: &mut [T], mono: &[f32], channels: usize)
where
    T: Sample + FromSample<f32>,
{
    for (frame, &value) in data.chunks_mut(channels).zip(mono.iter()) {
        let value = T::from_sample(value);
        for sample in frame.iter_mut() {
            *sample = value;
        }
    }
}

/// Process-wide output shared by every backend. Opened on first use and
/// kept for the rest of the session; a failed open is retried next time.
pub struct SharedOutput {
    opener: OutputOpener,
    output: OnceCell<Rc<dyn AudioOutput>>,
}

impl SharedOutput {
    pub fn new(opener: OutputOpener) -> Self {
        Self {
            opener,
            output: OnceCell::new(),
        }
    }

    /// Backed by the host's default output device.
    pub fn cpal() -> Self {
        Self::new(Box::new(|| {
            let output: Rc<dyn AudioOutput> = Rc::new(CpalOutput::open_default()?);
            Ok(output)
        }))
    }

    pub fn get(&self) -> Result<Rc<dyn AudioOutput>, AudioError> {
        if let Some(output) = self.output.get() {
            return Ok(output.clone());
        }
        let output = (self.opener)()?;
        let _ = self.output.set(output.clone());
        Ok(output)
    }
}
