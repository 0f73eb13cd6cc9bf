use crate::model::Track;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum RepeatMode {
    #[default]
    Off,
    All,
    One,
}

impl RepeatMode {
    pub fn cycle(self) -> Self {
        match self {
            RepeatMode::Off => RepeatMode::All,
            RepeatMode::All => RepeatMode::One,
            RepeatMode::One => RepeatMode::Off,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Default)]
pub enum PlaybackState {
    #[default]
    Idle,
    Loading(Track),
    Playing(Track),
    Paused(Track),
}

impl PlaybackState {
    pub fn track(&self) -> Option<&Track> {
        match self {
            PlaybackState::Loading(t) | PlaybackState::Playing(t) | PlaybackState::Paused(t) => {
                Some(t)
            }
            PlaybackState::Idle => None,
        }
    }

    pub fn is_playing(&self) -> bool {
        matches!(self, PlaybackState::Playing(_))
    }

    pub fn is_loading(&self) -> bool {
        matches!(self, PlaybackState::Loading(_))
    }

    pub fn is_idle(&self) -> bool {
        matches!(self, PlaybackState::Idle)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct TransportState {
    pub is_playing: bool,
    pub position_ms: u64,
    pub duration_ms: u64,
    pub repeat_mode: RepeatMode,
}

/// What every observer renders from. Published by the controller after each
/// transition; never mutated in place.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct PlayerSnapshot {
    pub state: PlaybackState,
    pub index: Option<usize>,
    pub queue_len: usize,
    pub transport: TransportState,
    pub generation: u64,
}

impl PlayerSnapshot {
    pub fn current_track(&self) -> Option<&Track> {
        self.state.track()
    }
}
