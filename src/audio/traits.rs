use async_trait::async_trait;
use flume::Sender;
use std::time::Duration;

use crate::{
    audio::{commands::ControllerMessage, error::AudioError},
    http::ApiError,
    model::Track,
};

/// One status report from the audio output, tagged with the generation of
/// the session that produced it.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct StatusUpdate {
    pub generation: u64,
    pub position_ms: u64,
    pub duration_ms: u64,
    pub is_loaded: bool,
    pub did_just_finish: bool,
}

/// Handed to the backend with every load so the session it creates can
/// report back into the controller's mailbox.
#[derive(Clone)]
pub struct StatusReporter {
    generation: u64,
    tx: Sender<ControllerMessage>,
}

impl StatusReporter {
    pub(crate) fn new(generation: u64, tx: Sender<ControllerMessage>) -> Self {
        Self { generation, tx }
    }

    pub fn generation(&self) -> u64 {
        self.generation
    }

    /// Returns `false` once the controller is gone.
    pub fn report(
        &self,
        position: Duration,
        duration: Option<Duration>,
        did_just_finish: bool,
    ) -> bool {
        let update = StatusUpdate {
            generation: self.generation,
            position_ms: position.as_millis() as u64,
            duration_ms: duration.map_or(0, |d| d.as_millis() as u64),
            is_loaded: true,
            did_just_finish,
        };
        self.tx.send(ControllerMessage::Status(update)).is_ok()
    }
}

/// A live, bound audio resource. Only the controller holds one.
#[async_trait]
pub trait SoundSession: Send {
    fn generation(&self) -> u64;
    async fn play(&mut self) -> Result<(), AudioError>;
    async fn pause(&mut self) -> Result<(), AudioError>;
    async fn seek(&mut self, position: Duration) -> Result<(), AudioError>;
    async fn release(&mut self);
}

#[async_trait]
pub trait AudioBackend: Send + Sync + 'static {
    /// Creates a paused session for `track`. The controller starts it.
    async fn load(
        &self,
        track: &Track,
        reporter: StatusReporter,
    ) -> Result<Box<dyn SoundSession>, AudioError>;
}

#[async_trait]
pub trait LikesApi: Send + Sync + 'static {
    async fn fetch_liked_songs(&self) -> Result<Vec<Track>, ApiError>;
    async fn add_like(&self, track_id: &str) -> Result<(), ApiError>;
    async fn remove_like(&self, track_id: &str) -> Result<(), ApiError>;
}
