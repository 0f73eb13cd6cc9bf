use std::{sync::Arc, time::Instant};

use flume::{Receiver, Sender};

use ratatui::Frame;
use tracing::{debug, info};

use crate::{
    audio::{
        controller::{PlaybackController, PlayerHandle},
        engine::RodioBackend, likes::LikedSet,
    },
    config::AppConfig,
    event::events::{Event, FetchSource},
    http::ApiService,
    model::{Collection, CollectionKind},
    util::task::TaskManager,
};

use super::{
    message::AppMessage,
    state::AppState,
    tui::{self, TerminalEvent},
    util::handler::EventHandler,
};

pub struct App {
    pub config: AppConfig,
    pub event_rx: Receiver<Event>,
    pub event_tx: Sender<Event>,
    pub api: Arc<ApiService>,
    pub player: PlayerHandle,
    pub state: AppState,
    pub tasks: TaskManager,
    pub has_focus: bool,
    pub should_quit: bool,
}

impl App {
    pub async fn new() -> color_eyre::Result<Self> {
        let config = AppConfig::from_env();
        let (event_tx, event_rx) = flume::unbounded();
        let api = Arc::new(ApiService::new(&config)?);
        let likes = Arc::new(LikedSet::new(api.clone()));
        let backend = Arc::new(RodioBackend::new(&config.audio, api.http_client())?);
        let player = PlaybackController::spawn(backend, likes, event_tx.clone());

        info!(api_url = config.api_url.as_str(), "app_started");

        Ok(Self {
            config,
            event_rx,
            event_tx,
            api,
            player,
            state: AppState::default(),
            tasks: TaskManager::new(),
            has_focus: true,
            should_quit: false,
        })
    }

    pub async fn run(&mut self) -> color_eyre::Result<()> {
        let mut tui = tui::Tui::new(self.config.tick_rate)?;
        tui.enter()?;

        EventHandler::handle_event(self, TerminalEvent::Init, &mut tui).await?;
        while !self.should_quit {
            tui.draw(|f| {
                self.ui(f);
            })?;

            EventHandler::handle_events(self, &mut tui).await?;
        }

        self.player.shutdown().await;
        self.tasks.abort_all();
        tui.exit()?;
        Ok(())
    }

    fn ui(&self, frame: &mut Frame) {
        if self.has_focus {
            frame.render_widget(self, frame.area());
        }
    }

    pub fn fetch_songs(&mut self) {
        self.state.songs_loading = true;
        let api = self.api.clone();
        let tx = self.event_tx.clone();
        let limit = self.config.song_limit;

        self.tasks.spawn(
            "songs",
            tokio::spawn(async move {
                let event = match api.fetch_songs(limit).await {
                    Ok(songs) => Event::SongsFetched(songs),
                    Err(e) => {
                        Event::FetchError(FetchSource::Songs, format!("Could not load songs: {e}"))
                    }
                };
                let _ = tx.send(event);
            }),
        );
    }

    pub fn refresh_likes(&mut self) {
        if self.tasks.is_running("likes") {
            return;
        }
        self.state.liked_loading = true;
        let likes = self.player.likes().clone();
        let tx = self.event_tx.clone();

        self.tasks.spawn(
            "likes",
            tokio::spawn(async move {
                let event = match likes.refresh().await {
                    Ok(songs) => Event::LikedSongsFetched(songs),
                    Err(e) => Event::FetchError(
                        FetchSource::Likes,
                        format!("Could not load liked songs: {e}"),
                    ),
                };
                let _ = tx.send(event);
            }),
        );
    }

    pub fn fetch_collections(&mut self, kind: CollectionKind) {
        let key = match kind {
            CollectionKind::Playlist => "playlists",
            CollectionKind::Artist => "artists",
        };
        if self.tasks.is_running(key) {
            return;
        }
        self.state.set_collections_loading(kind, true);
        let api = self.api.clone();
        let tx = self.event_tx.clone();

        self.tasks.spawn(
            key,
            tokio::spawn(async move {
                let event = match api.fetch_collections(kind).await {
                    Ok(collections) => Event::CollectionsFetched(kind, collections),
                    Err(e) => Event::FetchError(
                        FetchSource::Collections(kind),
                        format!("Could not load {key}: {e}"),
                    ),
                };
                let _ = tx.send(event);
            }),
        );
    }

    /// Shows `collection` and loads its songs. Opening another collection
    /// aborts the previous load.
    pub fn open_collection(&mut self, collection: Collection) {
        info!(kind = ?collection.kind, id = collection.id.as_str(), "collection_opened");
        self.state.open_collection(collection.clone());
        let api = self.api.clone();
        let tx = self.event_tx.clone();

        self.tasks.spawn(
            "collection",
            tokio::spawn(async move {
                let event = match api.fetch_collection_songs(&collection).await {
                    Ok(songs) => Event::CollectionSongsFetched(collection, songs),
                    Err(e) => Event::FetchError(
                        FetchSource::CollectionSongs,
                        format!("Could not load {}: {e}", collection.name),
                    ),
                };
                let _ = tx.send(event);
            }),
        );
    }

    /// Copies the player's liked ids into the view state.
    pub fn sync_likes(&mut self) {
        let ids = self.player.likes().ids();
        if !Arc::ptr_eq(&ids, &self.state.liked_ids) {
            self.state.liked_ids = ids;
            self.state.clamp_selection();
        }
    }

    fn switch_view(&mut self) {
        self.state.switch_route();
        if let Some(kind) = self.state.route.collection_kind() {
            if self.state.collections(kind).is_empty() {
                self.fetch_collections(kind);
            }
        }
    }

    fn play_selected(&mut self) {
        if let Some(collection) = self.state.selected_collection() {
            self.open_collection(collection);
        } else if let Some(track) = self.state.selected_song() {
            self.player.play_track(track, self.state.visible_songs());
        }
    }

    pub fn update(&mut self, msg: AppMessage) {
        debug!(?msg, "app_message");
        let seek_step = self.config.audio.seek_step_secs;

        match msg {
            AppMessage::Quit => self.should_quit = true,
            AppMessage::TogglePlayPause => self.player.toggle_play_pause(),
            AppMessage::Stop => self.player.stop(),
            AppMessage::NextTrack => self.player.play_next(),
            AppMessage::PreviousTrack => self.player.play_previous(),
            AppMessage::SeekForward => self.player.seek_forwards(seek_step),
            AppMessage::SeekBackward => self.player.seek_backwards(seek_step),
            AppMessage::ToggleRepeat => self.player.toggle_repeat(),
            AppMessage::ToggleLike => self.toggle_like(),
            AppMessage::SwitchView => self.switch_view(),
            AppMessage::SelectNext => self.state.select_next(),
            AppMessage::SelectPrevious => self.state.select_previous(),
            AppMessage::PlaySelected => self.play_selected(),
            AppMessage::GoBack => self.state.go_back(),
            AppMessage::ToggleFullPlayer => self.state.show_player = !self.state.show_player,
            AppMessage::RefreshLikes => self.refresh_likes(),
            AppMessage::StartSearch => self.state.is_searching = true,
            AppMessage::SearchInput(c) => self.state.push_search(c),
            AppMessage::SearchBackspace => self.state.pop_search(),
            AppMessage::SubmitSearch => self.state.is_searching = false,
            AppMessage::CancelSearch => self.state.clear_search(),
        }
    }

    /// Likes the current track, or the selected song when nothing is loaded.
    fn toggle_like(&mut self) {
        let snapshot = self.player.snapshot();
        let target = snapshot
            .current_track()
            .cloned()
            .or_else(|| self.state.selected_song());

        if let Some(track) = target {
            let liked = self.player.toggle_like(&track.id);
            info!(id = track.id.as_str(), liked, "like_toggled");
            self.sync_likes();
            self.state
                .show_toast(if liked { "Liked" } else { "Removed from liked" }, Instant::now());
        }
    }
}
