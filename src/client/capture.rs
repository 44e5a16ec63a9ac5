//! Native microphone capture

use std::sync::{Arc, Mutex};

use cpal::traits::{DeviceTrait, HostTrait, StreamTrait};
use cpal::{SampleRate, Stream, StreamConfig};

use super::recorder::{CaptureStream, Microphone};
use crate::audio::{SAMPLE_RATE, samples_to_wav};
use crate::{Error, Result};

/// The default input device, captured as 16 kHz mono
#[derive(Debug, Default, Clone, Copy)]
pub struct CpalMicrophone;

/// A live capture on the default input device
pub struct CpalStream {
    buffer: Arc<Mutex<Vec<f32>>>,
    stream: Stream,
}

fn input_config(device: &cpal::Device) -> Result<StreamConfig> {
    let supported = device
        .supported_input_configs()
        .map_err(|e| Error::Audio(e.to_string()))?
        .find(|c| {
            c.channels() == 1
                && c.min_sample_rate() <= SampleRate(SAMPLE_RATE)
                && c.max_sample_rate() >= SampleRate(SAMPLE_RATE)
        })
        .ok_or_else(|| Error::Audio("no suitable audio config found".to_string()))?;

    Ok(supported.with_sample_rate(SampleRate(SAMPLE_RATE)).config())
}

impl Microphone for CpalMicrophone {
    type Stream = CpalStream;

    fn open(&self) -> Result<CpalStream> {
        let host = cpal::default_host();
        let device = host
            .default_input_device()
            .ok_or_else(|| Error::PermissionDenied("no input device available".to_string()))?;
        let config = input_config(&device)?;

        tracing::debug!(
            device = device.name().unwrap_or_default(),
            sample_rate = SAMPLE_RATE,
            channels = config.channels,
            "opening microphone"
        );

        let buffer = Arc::new(Mutex::new(Vec::new()));
        let sink = Arc::clone(&buffer);

        let stream = device
            .build_input_stream(
                &config,
                move |data: &[f32], _: &cpal::InputCallbackInfo| {
                    if let Ok(mut buf) = sink.lock() {
                        buf.extend_from_slice(data);
                    }
                },
                |err| {
                    tracing::error!(error = %err, "audio capture error");
                },
                None,
            )
            .map_err(|e| {
                if matches!(e, cpal::BuildStreamError::DeviceNotAvailable) {
                    Error::PermissionDenied(e.to_string())
                } else {
                    Error::Audio(e.to_string())
                }
            })?;

        stream.play().map_err(|e| Error::Audio(e.to_string()))?;

        Ok(CpalStream { buffer, stream })
    }
}

impl CaptureStream for CpalStream {
    fn mime_type(&self) -> &str {
        "audio/wav"
    }

    fn take_chunk(&mut self) -> Vec<u8> {
        let samples = self
            .buffer
            .lock()
            .map(|mut buf| std::mem::take(&mut *buf))
            .unwrap_or_default();
        samples.iter().flat_map(|s| s.to_le_bytes()).collect()
    }

    fn finish(self, data: Vec<u8>) -> Result<Vec<u8>> {
        drop(self.stream);
        tracing::debug!("microphone released");

        let samples: Vec<f32> = data
            .chunks_exact(4)
            .map(|b| f32::from_le_bytes([b[0], b[1], b[2], b[3]]))
            .collect();
        samples_to_wav(&samples, SAMPLE_RATE)
    }
}
