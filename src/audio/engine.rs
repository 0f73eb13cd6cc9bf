use async_trait::async_trait;
use rodio::{Decoder, OutputStream, Sink, Source, mixer::Mixer};
use std::{
    io::Cursor,
    sync::{Arc, Mutex},
    time::{Duration, Instant},
};
use tokio::task::JoinHandle;
use tracing::{debug, info};

use crate::{
    audio::{
        error::AudioError,
        traits::{AudioBackend, SoundSession, StatusReporter},
        util::{open_output_stream, setup_device_config},
    },
    config::AudioConfig,
    model::Track,
};

type EncodedAudio = Arc<[u8]>;

/// Plays tracks through the default output device. Each session gets its own
/// sink on the shared output stream.
pub struct RodioBackend {
    // Held only to keep the device open; sinks attach through `mixer`.
    _stream: Mutex<OutputStream>,
    mixer: Mixer,
    http_client: reqwest::Client,
    progress_interval: Duration,
}

impl RodioBackend {
    pub fn new(config: &AudioConfig, http_client: reqwest::Client) -> Result<Self, AudioError> {
        let (device, stream_config, sample_format) = setup_device_config()?;
        let stream = open_output_stream(device, &stream_config, sample_format)?;

        Ok(Self {
            mixer: stream.mixer().clone(),
            _stream: Mutex::new(stream),
            http_client,
            progress_interval: config.progress_interval,
        })
    }

    async fn fetch(&self, url: &str) -> Result<EncodedAudio, AudioError> {
        let response = self
            .http_client
            .get(url)
            .send()
            .await
            .and_then(|r| r.error_for_status())
            .map_err(|e| AudioError::NetworkError(e.to_string()))?;
        let bytes = response
            .bytes()
            .await
            .map_err(|e| AudioError::StreamError(e.to_string()))?;
        Ok(Arc::from(bytes.as_ref()))
    }
}

#[async_trait]
impl AudioBackend for RodioBackend {
    async fn load(
        &self,
        track: &Track,
        reporter: StatusReporter,
    ) -> Result<Box<dyn SoundSession>, AudioError> {
        let start = Instant::now();
        let audio = self.fetch(&track.audio_url).await?;
        let source = decode_blocking(audio.clone()).await?;
        let duration = source.total_duration();

        let sink = Arc::new(Sink::connect_new(&self.mixer));
        sink.pause();
        sink.append(source);

        let generation = reporter.generation();
        let sampler = spawn_sampler(sink.clone(), duration, reporter, self.progress_interval);

        info!(
            id = track.id.as_str(),
            generation,
            bytes = audio.len(),
            duration_ms = duration.map(|d| d.as_millis() as u64),
            elapsed_ms = start.elapsed().as_millis() as u64,
            "engine_session_created"
        );

        Ok(Box::new(RodioSession {
            generation,
            sink,
            audio,
            sampler: Some(sampler),
        }))
    }
}

pub struct RodioSession {
    generation: u64,
    sink: Arc<Sink>,
    audio: EncodedAudio,
    sampler: Option<JoinHandle<()>>,
}

#[async_trait]
impl SoundSession for RodioSession {
    fn generation(&self) -> u64 {
        self.generation
    }

    async fn play(&mut self) -> Result<(), AudioError> {
        self.sink.play();
        Ok(())
    }

    async fn pause(&mut self) -> Result<(), AudioError> {
        self.sink.pause();
        Ok(())
    }

    async fn seek(&mut self, position: Duration) -> Result<(), AudioError> {
        // A drained sink has dropped its source; decode the buffered audio again.
        if self.sink.empty() {
            let source = decode_blocking(self.audio.clone()).await?;
            self.sink.append(source);
        }
        self.sink
            .try_seek(position)
            .map_err(|e| AudioError::SeekError(e.to_string()))
    }

    async fn release(&mut self) {
        if let Some(sampler) = self.sampler.take() {
            sampler.abort();
        }
        self.sink.stop();
        debug!(generation = self.generation, "engine_session_released");
    }
}

async fn decode_blocking(audio: EncodedAudio) -> Result<Decoder<Cursor<EncodedAudio>>, AudioError> {
    tokio::task::spawn_blocking(move || {
        Decoder::new(Cursor::new(audio)).map_err(|e| AudioError::DecodingError(e.to_string()))
    })
    .await
    .map_err(|e| AudioError::Unknown(e.to_string()))?
}

/// Reports position every `interval`. While the sink is drained and not
/// paused every sample carries `did_just_finish`; the controller acts on the
/// first one it sees for a bound session and ignores the rest.
fn spawn_sampler(
    sink: Arc<Sink>,
    duration: Option<Duration>,
    reporter: StatusReporter,
    interval: Duration,
) -> JoinHandle<()> {
    tokio::spawn(async move {
        let mut ticker = tokio::time::interval(interval);
        loop {
            ticker.tick().await;

            let empty = sink.empty();
            let position = match (empty, duration) {
                (true, Some(total)) => total,
                _ => sink.get_pos(),
            };
            let finished = finish_flag(empty, sink.is_paused());

            if !reporter.report(position, duration, finished) {
                break;
            }
        }
    })
}

/// A drained sink only counts as finished while it is meant to be playing;
/// a session created paused must not report before it is started.
fn finish_flag(empty: bool, paused: bool) -> bool {
    empty && !paused
}
