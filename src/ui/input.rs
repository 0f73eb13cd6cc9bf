use crate::ui::message::AppMessage;
use ratatui::crossterm::event::{KeyCode, KeyEvent, KeyModifiers};

pub struct InputHandler;

impl InputHandler {
    /// Maps a key press to a message. While the search box is focused every
    /// printable key goes into the query instead.
    pub fn handle_key(key: KeyEvent, searching: bool) -> Option<AppMessage> {
        if let (KeyCode::Char('c'), KeyModifiers::CONTROL) = (key.code, key.modifiers) {
            return Some(AppMessage::Quit);
        }

        if searching {
            return match key.code {
                KeyCode::Esc => Some(AppMessage::CancelSearch),
                KeyCode::Enter => Some(AppMessage::SubmitSearch),
                KeyCode::Backspace => Some(AppMessage::SearchBackspace),
                KeyCode::Char(c) => Some(AppMessage::SearchInput(c)),
                _ => None,
            };
        }

        match (key.code, key.modifiers) {
            (KeyCode::Char('q'), _) => Some(AppMessage::Quit),
            (KeyCode::Char(' '), _) => Some(AppMessage::TogglePlayPause),
            (KeyCode::Char('s'), _) => Some(AppMessage::Stop),
            (KeyCode::Char('n'), _) => Some(AppMessage::NextTrack),
            (KeyCode::Char('p'), _) => Some(AppMessage::PreviousTrack),
            (KeyCode::Char('r'), _) => Some(AppMessage::ToggleRepeat),
            (KeyCode::Char('R'), _) => Some(AppMessage::RefreshLikes),
            (KeyCode::Char('l'), _) => Some(AppMessage::ToggleLike),
            (KeyCode::Char('f'), _) => Some(AppMessage::ToggleFullPlayer),
            (KeyCode::Char('/'), _) => Some(AppMessage::StartSearch),
            (KeyCode::Left, _) => Some(AppMessage::SeekBackward),
            (KeyCode::Right, _) => Some(AppMessage::SeekForward),
            (KeyCode::Down | KeyCode::Char('j'), _) => Some(AppMessage::SelectNext),
            (KeyCode::Up | KeyCode::Char('k'), _) => Some(AppMessage::SelectPrevious),
            (KeyCode::Enter, _) => Some(AppMessage::PlaySelected),
            (KeyCode::Tab | KeyCode::BackTab, _) => Some(AppMessage::SwitchView),
            (KeyCode::Esc | KeyCode::Backspace, _) => Some(AppMessage::GoBack),
            _ => None,
        }
    }
}
