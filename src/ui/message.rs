#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AppMessage {
    // Playback
    TogglePlayPause,
    Stop,
    NextTrack,
    PreviousTrack,
    SeekForward,
    SeekBackward,
    ToggleRepeat,
    ToggleLike,

    // Navigation
    Quit,
    SwitchView,
    SelectNext,
    SelectPrevious,
    PlaySelected,
    GoBack,
    ToggleFullPlayer,
    RefreshLikes,

    // Search
    StartSearch,
    SearchInput(char),
    SearchBackspace,
    SubmitSearch,
    CancelSearch,
}
