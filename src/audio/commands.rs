use tokio::sync::oneshot;

use crate::{
    audio::{
        error::AudioError,
        traits::{SoundSession, StatusUpdate},
    },
    model::Track,
};

#[derive(Debug, Clone)]
pub enum PlayerCommand {
    PlayTrack { track: Track, queue: Vec<Track> },
    TogglePlayPause,
    SeekTo(u64),
    Next,
    Previous,
    ToggleRepeat,
    Stop,
}

/// Everything the controller task consumes, in arrival order.
pub enum ControllerMessage {
    Command(PlayerCommand),
    Status(StatusUpdate),
    Loaded {
        generation: u64,
        result: Result<Box<dyn SoundSession>, AudioError>,
    },
    Shutdown(oneshot::Sender<()>),
}
