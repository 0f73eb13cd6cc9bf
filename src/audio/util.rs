use rodio::{
    Device, DeviceTrait, OutputStream, OutputStreamBuilder,
    cpal::{
        BufferSize, SampleFormat, SampleRate, StreamConfig, default_host,
        traits::HostTrait,
    },
};

use crate::audio::error::AudioError;

pub fn setup_device_config() -> Result<(Device, StreamConfig, SampleFormat), AudioError> {
    let host = default_host();
    let device = host
        .default_output_device()
        .ok_or_else(|| AudioError::DeviceError("no default output device".into()))?;

    let preferred = device
        .supported_output_configs()
        .ok()
        .and_then(|configs| configs.max_by_key(|cfg| cfg.max_sample_rate().0));

    let (config, sample_format) = match preferred {
        Some(cfg) => (
            StreamConfig {
                channels: cfg.channels(),
                sample_rate: cfg.max_sample_rate(),
                buffer_size: BufferSize::Fixed(4096),
            },
            cfg.sample_format(),
        ),
        None => (
            StreamConfig {
                channels: 2,
                sample_rate: SampleRate(48000),
                buffer_size: BufferSize::Fixed(4096),
            },
            SampleFormat::F32,
        ),
    };

    Ok((device, config, sample_format))
}

pub fn open_output_stream(
    device: Device,
    config: &StreamConfig,
    sample_format: SampleFormat,
) -> Result<OutputStream, AudioError> {
    OutputStreamBuilder::default()
        .with_buffer_size(config.buffer_size)
        .with_sample_rate(config.sample_rate.0)
        .with_device(device)
        .with_sample_format(sample_format)
        .open_stream_or_fallback()
        .map_err(|e| AudioError::DeviceError(e.to_string()))
}
