use std::time::Instant;

use ratatui::crossterm::event::KeyEvent;
use tracing::{debug, info, warn};

use crate::{
    event::events::Event,
    ui::{
        app::App,
        input::InputHandler,
        tui::{TerminalEvent, Tui},
    },
};

pub struct EventHandler;

impl EventHandler {
    pub async fn handle_events(app: &mut App, tui: &mut Tui) -> color_eyre::Result<bool> {
        let mut should_render = false;
        if let Some(evt) = tui.next().await {
            if Self::handle_event(app, evt, tui).await? {
                should_render = true;
            }
        }

        while let Ok(evt) = app.event_rx.try_recv() {
            Self::handle_action(app, evt);
            should_render = true;
        }
        app.sync_likes();

        Ok(should_render)
    }

    pub async fn handle_event(
        app: &mut App,
        evt: TerminalEvent,
        tui: &mut Tui,
    ) -> color_eyre::Result<bool> {
        match evt {
            TerminalEvent::Init => {
                app.fetch_songs();
                app.refresh_likes();
            }
            TerminalEvent::FocusGained => {
                app.has_focus = true;
                tui.clear()?;
            }
            TerminalEvent::FocusLost => app.has_focus = false,
            TerminalEvent::Key(key) => Self::handle_key_event(app, key),
            TerminalEvent::Tick => {
                return Ok(app.has_focus);
            }
            TerminalEvent::Resize(..) => {}
        }

        Ok(true)
    }

    pub fn handle_action(app: &mut App, evt: Event) {
        let now = Instant::now();
        match evt {
            Event::TrackStarted(track, index) => {
                info!(id = track.id.as_str(), index, "ui_track_started");
            }
            Event::QueueEnded => app.state.show_toast("End of queue", now),
            Event::PlaybackError(message) => {
                warn!(message = message.as_str(), "ui_playback_error");
                app.state.show_toast(message, now);
            }
            Event::SongsFetched(songs) => {
                app.state.songs = songs;
                app.state.songs_loading = false;
                app.state.clamp_selection();
            }
            Event::LikedSongsFetched(songs) => {
                app.state.liked_songs = songs;
                app.state.liked_loading = false;
                app.state.clamp_selection();
            }
            Event::CollectionsFetched(kind, collections) => {
                app.state.set_collections(kind, collections);
            }
            Event::CollectionSongsFetched(collection, songs) => {
                if !app.state.set_collection_songs(&collection, songs) {
                    debug!(id = collection.id.as_str(), "ui_stale_collection_songs");
                }
            }
            Event::FetchError(source, message) => {
                warn!(?source, message = message.as_str(), "ui_fetch_error");
                app.state.fetch_failed(source);
                app.state.show_toast(message, now);
            }
        }
    }

    fn handle_key_event(app: &mut App, key: KeyEvent) {
        if let Some(msg) = InputHandler::handle_key(key, app.state.is_searching) {
            app.update(msg);
        }
    }
}
