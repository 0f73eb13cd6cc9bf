use arc_swap::ArcSwap;
use flume::{Receiver, Sender};
use std::{sync::Arc, time::Duration};
use tokio::sync::oneshot;
use tracing::{debug, info, trace, warn};

use crate::{
    audio::{
        commands::{ControllerMessage, PlayerCommand},
        error::AudioError,
        likes::LikedSet,
        progress::TrackProgress,
        queue::Queue,
        state::{PlaybackState, PlayerSnapshot, RepeatMode, TransportState},
        traits::{AudioBackend, SoundSession, StatusReporter, StatusUpdate},
    },
    event::events::Event,
    model::Track,
};

/// Owns the one live sound session and everything that decides what it
/// plays. Runs as a single task; every mutation arrives through its mailbox,
/// so transitions never interleave.
///
/// Each load is tagged with a generation. A load or status update carrying
/// an older generation than the current one has been superseded and is
/// dropped (loads release themselves).
pub struct PlaybackController {
    backend: Arc<dyn AudioBackend>,
    mailbox: Receiver<ControllerMessage>,
    mailbox_tx: Sender<ControllerMessage>,
    event_tx: Sender<Event>,
    queue: Queue,
    state: PlaybackState,
    session: Option<Box<dyn SoundSession>>,
    generation: u64,
    repeat_mode: RepeatMode,
    // Set once the current session's finish has been acted on.
    finish_handled: bool,
    progress: Arc<TrackProgress>,
    snapshot: Arc<ArcSwap<PlayerSnapshot>>,
}

/// Cheap, cloneable access to the controller for views.
#[derive(Clone)]
pub struct PlayerHandle {
    tx: Sender<ControllerMessage>,
    snapshot: Arc<ArcSwap<PlayerSnapshot>>,
    progress: Arc<TrackProgress>,
    likes: Arc<LikedSet>,
}

impl PlaybackController {
    pub fn new(
        backend: Arc<dyn AudioBackend>,
        likes: Arc<LikedSet>,
        event_tx: Sender<Event>,
    ) -> (Self, PlayerHandle) {
        let (mailbox_tx, mailbox) = flume::unbounded();
        let snapshot = Arc::new(ArcSwap::from_pointee(PlayerSnapshot::default()));
        let progress = Arc::new(TrackProgress::new());

        let handle = PlayerHandle {
            tx: mailbox_tx.clone(),
            snapshot: snapshot.clone(),
            progress: progress.clone(),
            likes,
        };

        let controller = Self {
            backend,
            mailbox,
            mailbox_tx,
            event_tx,
            queue: Queue::default(),
            state: PlaybackState::Idle,
            session: None,
            generation: 0,
            repeat_mode: RepeatMode::Off,
            finish_handled: false,
            progress,
            snapshot,
        };

        (controller, handle)
    }

    pub fn spawn(
        backend: Arc<dyn AudioBackend>,
        likes: Arc<LikedSet>,
        event_tx: Sender<Event>,
    ) -> PlayerHandle {
        let (controller, handle) = Self::new(backend, likes, event_tx);
        tokio::spawn(controller.run());
        handle
    }

    pub async fn run(mut self) {
        while let Ok(msg) = self.mailbox.recv_async().await {
            let shutdown = matches!(msg, ControllerMessage::Shutdown(_));
            self.handle(msg).await;
            if shutdown {
                info!("controller_shutdown");
                return;
            }
        }
    }

    async fn handle(&mut self, msg: ControllerMessage) {
        match msg {
            ControllerMessage::Command(cmd) => self.handle_command(cmd).await,
            ControllerMessage::Status(update) => self.on_status(update).await,
            ControllerMessage::Loaded { generation, result } => {
                self.on_loaded(generation, result).await
            }
            ControllerMessage::Shutdown(ack) => {
                self.stop().await;
                self.publish();
                let _ = ack.send(());
            }
        }
        self.publish();
    }

    async fn handle_command(&mut self, cmd: PlayerCommand) {
        match cmd {
            PlayerCommand::PlayTrack { track, queue } => self.play_track(track, queue).await,
            PlayerCommand::TogglePlayPause => self.toggle_play_pause().await,
            PlayerCommand::SeekTo(position_ms) => self.seek_to(position_ms).await,
            PlayerCommand::Next => self.skip(true).await,
            PlayerCommand::Previous => self.skip(false).await,
            PlayerCommand::ToggleRepeat => {
                self.repeat_mode = self.repeat_mode.cycle();
                info!(mode = ?self.repeat_mode, "controller_repeat_mode");
            }
            PlayerCommand::Stop => self.stop().await,
        }
    }

    /// Precondition: `track` is part of `queue` and has an audio URL.
    /// Violations are logged and ignored. Queue entries without an audio URL
    /// are dropped so next/previous never land on them.
    async fn play_track(&mut self, track: Track, queue: Vec<Track>) {
        if !track.is_playable() {
            warn!(id = track.id.as_str(), "controller_track_without_audio_url");
            return;
        }
        let offered = queue.len();
        let queue: Vec<Track> = queue.into_iter().filter(Track::is_playable).collect();
        if queue.len() < offered {
            debug!(dropped = offered - queue.len(), "controller_unplayable_tracks_dropped");
        }
        let Some(index) = Queue::position_of(&queue, &track) else {
            warn!(
                id = track.id.as_str(),
                queue_len = queue.len(),
                "controller_track_not_in_queue"
            );
            return;
        };

        self.queue.replace(queue, index);
        self.start_current().await;
    }

    async fn skip(&mut self, forward: bool) {
        let target = if forward {
            self.queue.next_index()
        } else {
            self.queue.previous_index()
        };
        let Some(index) = target else {
            debug!(forward, "controller_skip_on_empty_queue");
            return;
        };

        self.queue.select(index);
        self.start_current().await;
    }

    /// Releases whatever is bound and starts loading the queue's current
    /// track under a fresh generation.
    async fn start_current(&mut self) {
        let Some(track) = self.queue.current().cloned() else {
            return;
        };

        self.generation += 1;
        let generation = self.generation;
        self.release_session().await;
        self.finish_handled = false;
        self.progress.reset(generation);
        self.state = PlaybackState::Loading(track.clone());

        info!(
            generation,
            id = track.id.as_str(),
            index = self.queue.index(),
            "controller_load_requested"
        );

        let backend = self.backend.clone();
        let reporter = StatusReporter::new(generation, self.mailbox_tx.clone());
        let tx = self.mailbox_tx.clone();
        tokio::spawn(async move {
            let result = backend.load(&track, reporter).await;
            if let Err(flume::SendError(ControllerMessage::Loaded {
                result: Ok(mut session),
                ..
            })) = tx.send(ControllerMessage::Loaded { generation, result })
            {
                session.release().await;
            }
        });
    }

    async fn on_loaded(
        &mut self,
        generation: u64,
        result: Result<Box<dyn SoundSession>, AudioError>,
    ) {
        if generation != self.generation {
            debug!(generation, current = self.generation, "controller_stale_load");
            if let Ok(mut session) = result {
                session.release().await;
            }
            return;
        }

        let Some(track) = self.state.track().cloned() else {
            if let Ok(mut session) = result {
                session.release().await;
            }
            return;
        };

        let started = match result {
            Ok(mut session) => match session.play().await {
                Ok(()) => Ok(session),
                Err(e) => {
                    session.release().await;
                    Err(e)
                }
            },
            Err(e) => Err(e),
        };

        match started {
            Ok(session) => {
                self.session = Some(session);
                self.state = PlaybackState::Playing(track.clone());
                let index = self.queue.index().unwrap_or_default();
                info!(generation, id = track.id.as_str(), index, "controller_track_started");
                let _ = self.event_tx.send(Event::TrackStarted(track, index));
            }
            Err(e) => {
                warn!(generation, id = track.id.as_str(), error = %e, "controller_load_failed");
                self.queue.clear();
                self.state = PlaybackState::Idle;
                self.progress.reset(generation);
                let _ = self
                    .event_tx
                    .send(Event::PlaybackError(format!("Could not play {}: {e}", track.title)));
            }
        }
    }

    async fn on_status(&mut self, update: StatusUpdate) {
        if update.generation != self.generation || self.session.is_none() {
            trace!(
                generation = update.generation,
                current = self.generation,
                "controller_stale_status"
            );
            return;
        }
        if !self.progress.sample(&update) {
            return;
        }
        if update.did_just_finish {
            self.on_track_finished().await;
        }
    }

    async fn on_track_finished(&mut self) {
        if self.finish_handled {
            debug!(generation = self.generation, "controller_duplicate_finish");
            return;
        }

        match self.repeat_mode {
            RepeatMode::One => self.restart_current().await,
            RepeatMode::Off if self.queue.is_last() => {
                self.finish_handled = true;
                if let Some(session) = self.session.as_mut() {
                    if let Err(e) = session.pause().await {
                        warn!(error = %e, "controller_pause_failed");
                    }
                }
                if let Some(track) = self.state.track().cloned() {
                    self.state = PlaybackState::Paused(track);
                }
                info!(generation = self.generation, "controller_queue_ended");
                let _ = self.event_tx.send(Event::QueueEnded);
            }
            RepeatMode::Off | RepeatMode::All => {
                self.finish_handled = true;
                self.skip(true).await;
            }
        }
    }

    async fn restart_current(&mut self) {
        let Some(session) = self.session.as_mut() else {
            return;
        };
        if let Err(e) = session.seek(Duration::ZERO).await {
            warn!(error = %e, "controller_restart_seek_failed");
        }
        if let Err(e) = session.play().await {
            warn!(error = %e, "controller_restart_play_failed");
        }
        self.progress.restart();
        self.finish_handled = false;
        if let Some(track) = self.state.track().cloned() {
            self.state = PlaybackState::Playing(track);
        }
        debug!(generation = self.generation, "controller_track_restarted");
    }

    async fn toggle_play_pause(&mut self) {
        let Some(session) = self.session.as_mut() else {
            return;
        };

        match &self.state {
            PlaybackState::Playing(track) => {
                let track = track.clone();
                match session.pause().await {
                    Ok(()) => self.state = PlaybackState::Paused(track),
                    Err(e) => warn!(error = %e, "controller_pause_failed"),
                }
            }
            PlaybackState::Paused(track) => {
                let track = track.clone();
                if self.finish_handled {
                    if let Err(e) = session.seek(Duration::ZERO).await {
                        warn!(error = %e, "controller_rewind_failed");
                    }
                    self.progress.restart();
                    self.finish_handled = false;
                }
                match session.play().await {
                    Ok(()) => self.state = PlaybackState::Playing(track),
                    Err(e) => warn!(error = %e, "controller_resume_failed"),
                }
            }
            PlaybackState::Idle | PlaybackState::Loading(_) => {}
        }
    }

    async fn seek_to(&mut self, position_ms: u64) {
        let Some(session) = self.session.as_mut() else {
            return;
        };

        let (_, duration_ms) = self.progress.get_progress();
        let target = if duration_ms > 0 {
            position_ms.min(duration_ms)
        } else {
            position_ms
        };

        match session.seek(Duration::from_millis(target)).await {
            Ok(()) => {
                self.progress
                    .set_current_position(Duration::from_millis(target));
                self.finish_handled = false;
            }
            Err(e) => warn!(position_ms = target, error = %e, "controller_seek_failed"),
        }
    }

    async fn stop(&mut self) {
        self.generation += 1;
        self.release_session().await;
        self.queue.clear();
        self.state = PlaybackState::Idle;
        self.finish_handled = false;
        self.progress.reset(self.generation);
    }

    async fn release_session(&mut self) {
        if let Some(mut session) = self.session.take() {
            debug!(generation = session.generation(), "controller_session_released");
            session.release().await;
        }
    }

    fn publish(&self) {
        let (position_ms, duration_ms) = self.progress.get_progress();
        self.snapshot.store(Arc::new(PlayerSnapshot {
            state: self.state.clone(),
            index: self.queue.index(),
            queue_len: self.queue.len(),
            transport: TransportState {
                is_playing: self.state.is_playing(),
                position_ms,
                duration_ms,
                repeat_mode: self.repeat_mode,
            },
            generation: self.generation,
        }));
    }
}

impl PlayerHandle {
    pub fn play_track(&self, track: Track, queue: Vec<Track>) {
        self.send(PlayerCommand::PlayTrack { track, queue });
    }

    pub fn toggle_play_pause(&self) {
        self.send(PlayerCommand::TogglePlayPause);
    }

    pub fn seek_to(&self, position_ms: u64) {
        self.send(PlayerCommand::SeekTo(position_ms));
    }

    pub fn seek_backwards(&self, seconds: u64) {
        let (current_ms, _) = self.progress.get_progress();
        self.seek_to(current_ms.saturating_sub(seconds * 1000));
    }

    pub fn seek_forwards(&self, seconds: u64) {
        let (current_ms, _) = self.progress.get_progress();
        self.seek_to(current_ms.saturating_add(seconds * 1000));
    }

    pub fn play_next(&self) {
        self.send(PlayerCommand::Next);
    }

    pub fn play_previous(&self) {
        self.send(PlayerCommand::Previous);
    }

    pub fn toggle_repeat(&self) {
        self.send(PlayerCommand::ToggleRepeat);
    }

    pub fn stop(&self) {
        self.send(PlayerCommand::Stop);
    }

    pub fn toggle_like(&self, track_id: &str) -> bool {
        self.likes.toggle(track_id)
    }

    pub fn is_liked(&self, track_id: &str) -> bool {
        self.likes.contains(track_id)
    }

    pub fn likes(&self) -> &Arc<LikedSet> {
        &self.likes
    }

    pub fn snapshot(&self) -> Arc<PlayerSnapshot> {
        self.snapshot.load_full()
    }

    pub fn progress(&self) -> &Arc<TrackProgress> {
        &self.progress
    }

    /// Releases the live session and stops the controller task.
    pub async fn shutdown(&self) {
        let (ack, done) = oneshot::channel();
        if self.tx.send(ControllerMessage::Shutdown(ack)).is_ok() {
            let _ = done.await;
        }
    }

    fn send(&self, cmd: PlayerCommand) {
        if self.tx.send(ControllerMessage::Command(cmd)).is_err() {
            warn!("controller_gone");
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::audio::likes::tests::FakeLikesApi;
    use async_trait::async_trait;
    use std::collections::{HashMap, HashSet};
    use std::sync::Mutex;
    use std::sync::atomic::{AtomicUsize, Ordering};

    #[derive(Default)]
    struct Counters {
        created: AtomicUsize,
        released: AtomicUsize,
        playing: AtomicUsize,
        max_playing: AtomicUsize,
        ops: Mutex<Vec<String>>,
    }

    impl Counters {
        fn op(&self, op: String) {
            self.ops.lock().unwrap().push(op);
        }

        fn ops(&self) -> Vec<String> {
            self.ops.lock().unwrap().clone()
        }
    }

    #[derive(Default)]
    struct FakeBackend {
        counters: Arc<Counters>,
        gates: Mutex<HashMap<String, oneshot::Receiver<()>>>,
        broken_urls: Mutex<HashSet<String>>,
    }

    impl FakeBackend {
        fn gate(&self, track: &Track) -> oneshot::Sender<()> {
            let (tx, rx) = oneshot::channel();
            self.gates.lock().unwrap().insert(track.id.clone(), rx);
            tx
        }

        fn break_url(&self, track: &Track) {
            self.broken_urls
                .lock()
                .unwrap()
                .insert(track.audio_url.clone());
        }
    }

    struct FakeSession {
        id: String,
        generation: u64,
        bound: bool,
        released: bool,
        counters: Arc<Counters>,
    }

    #[async_trait]
    impl SoundSession for FakeSession {
        fn generation(&self) -> u64 {
            self.generation
        }

        async fn play(&mut self) -> Result<(), AudioError> {
            if !self.bound {
                self.bound = true;
                let now = self.counters.playing.fetch_add(1, Ordering::SeqCst) + 1;
                self.counters.max_playing.fetch_max(now, Ordering::SeqCst);
            }
            self.counters.op(format!("play:{}", self.id));
            Ok(())
        }

        async fn pause(&mut self) -> Result<(), AudioError> {
            self.counters.op(format!("pause:{}", self.id));
            Ok(())
        }

        async fn seek(&mut self, position: Duration) -> Result<(), AudioError> {
            self.counters
                .op(format!("seek:{}:{}", self.id, position.as_millis()));
            Ok(())
        }

        async fn release(&mut self) {
            assert!(!self.released, "session {} released twice", self.id);
            self.released = true;
            if self.bound {
                self.counters.playing.fetch_sub(1, Ordering::SeqCst);
            }
            self.counters.released.fetch_add(1, Ordering::SeqCst);
            self.counters.op(format!("release:{}", self.id));
        }
    }

    #[async_trait]
    impl AudioBackend for FakeBackend {
        async fn load(
            &self,
            track: &Track,
            reporter: StatusReporter,
        ) -> Result<Box<dyn SoundSession>, AudioError> {
            let gate = self.gates.lock().unwrap().remove(&track.id);
            if let Some(gate) = gate {
                let _ = gate.await;
            }
            if self.broken_urls.lock().unwrap().contains(&track.audio_url) {
                return Err(AudioError::NetworkError("404".into()));
            }
            self.counters.created.fetch_add(1, Ordering::SeqCst);
            Ok(Box::new(FakeSession {
                id: track.id.clone(),
                generation: reporter.generation(),
                bound: false,
                released: false,
                counters: self.counters.clone(),
            }))
        }
    }

    struct Harness {
        controller: PlaybackController,
        handle: PlayerHandle,
        backend: Arc<FakeBackend>,
        events: Receiver<Event>,
    }

    impl Harness {
        fn new() -> Self {
            let backend = Arc::new(FakeBackend::default());
            let likes = Arc::new(LikedSet::new(Arc::new(FakeLikesApi::default())));
            let (event_tx, events) = flume::unbounded();
            let (controller, handle) = PlaybackController::new(backend.clone(), likes, event_tx);
            Self {
                controller,
                handle,
                backend,
                events,
            }
        }

        async fn command(&mut self, cmd: PlayerCommand) {
            self.controller
                .handle(ControllerMessage::Command(cmd))
                .await;
        }

        async fn play(&mut self, track: &Track, queue: &[Track]) {
            self.command(PlayerCommand::PlayTrack {
                track: track.clone(),
                queue: queue.to_vec(),
            })
            .await;
        }

        /// Handles the next message from the mailbox (load results, status
        /// updates sent by the backend).
        async fn pump(&mut self) {
            let msg = tokio::time::timeout(
                Duration::from_secs(1),
                self.controller.mailbox.recv_async(),
            )
            .await
            .expect("controller mailbox stayed empty")
            .expect("mailbox closed");
            self.controller.handle(msg).await;
        }

        async fn status(&mut self, position_ms: u64, did_just_finish: bool) {
            let update = StatusUpdate {
                generation: self.controller.generation,
                position_ms,
                duration_ms: 180_000,
                is_loaded: true,
                did_just_finish,
            };
            self.controller
                .handle(ControllerMessage::Status(update))
                .await;
        }

        async fn finish(&mut self) {
            self.status(180_000, true).await;
        }

        fn snapshot(&self) -> Arc<PlayerSnapshot> {
            self.handle.snapshot()
        }

        fn current_id(&self) -> Option<String> {
            self.snapshot().current_track().map(|t| t.id.clone())
        }

        fn counters(&self) -> &Counters {
            &self.backend.counters
        }

        fn drain_events(&self) -> Vec<Event> {
            self.events.drain().collect()
        }
    }

    fn track(id: &str) -> Track {
        Track {
            id: id.into(),
            title: format!("Song {id}"),
            artist: "Artist".into(),
            cover_url: format!("https://cdn/{id}.jpg"),
            audio_url: format!("https://cdn/{id}.mp3"),
        }
    }

    fn abc() -> Vec<Track> {
        vec![track("a"), track("b"), track("c")]
    }

    #[tokio::test]
    async fn test_play_track_binds_and_autoplays() {
        let mut h = Harness::new();
        let queue = abc();

        h.play(&queue[1], &queue).await;
        assert!(h.snapshot().state.is_loading());
        assert_eq!(h.snapshot().index, Some(1));

        h.pump().await;
        let snapshot = h.snapshot();
        assert_eq!(snapshot.state, PlaybackState::Playing(queue[1].clone()));
        assert!(snapshot.transport.is_playing);
        assert_eq!(snapshot.queue_len, 3);
        assert_eq!(h.counters().ops(), vec!["play:b".to_string()]);
        assert!(matches!(
            h.drain_events().as_slice(),
            [Event::TrackStarted(t, 1)] if t.id == "b"
        ));
    }

    #[tokio::test]
    async fn test_rapid_play_requests_leave_one_session() {
        let mut h = Harness::new();
        let queue = abc();

        for t in queue.iter().chain(queue.iter()) {
            h.play(t, &queue).await;
        }
        for _ in 0..6 {
            h.pump().await;
        }

        let counters = h.counters();
        assert_eq!(counters.created.load(Ordering::SeqCst), 6);
        assert_eq!(counters.released.load(Ordering::SeqCst), 5);
        assert_eq!(counters.playing.load(Ordering::SeqCst), 1);
        assert_eq!(counters.max_playing.load(Ordering::SeqCst), 1);
        assert_eq!(h.current_id().as_deref(), Some("c"));
        assert!(h.snapshot().state.is_playing());
    }

    #[tokio::test]
    async fn test_previous_session_released_before_next_load() {
        let mut h = Harness::new();
        let queue = abc();

        h.play(&queue[0], &queue).await;
        h.pump().await;
        h.play(&queue[1], &queue).await;

        // Nothing bound while b is still loading.
        assert_eq!(h.counters().playing.load(Ordering::SeqCst), 0);
        assert_eq!(h.counters().ops().last().map(String::as_str), Some("release:a"));

        h.pump().await;
        assert_eq!(h.counters().playing.load(Ordering::SeqCst), 1);
        assert_eq!(h.counters().max_playing.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn test_next_wraps_to_first() {
        let mut h = Harness::new();
        let queue = abc();

        h.play(&queue[2], &queue).await;
        h.pump().await;
        h.command(PlayerCommand::Next).await;
        h.pump().await;

        assert_eq!(h.snapshot().index, Some(0));
        assert_eq!(h.current_id().as_deref(), Some("a"));
    }

    #[tokio::test]
    async fn test_previous_wraps_to_last() {
        let mut h = Harness::new();
        let queue = abc();

        h.play(&queue[0], &queue).await;
        h.pump().await;
        h.command(PlayerCommand::Previous).await;
        h.pump().await;

        assert_eq!(h.snapshot().index, Some(2));
        assert_eq!(h.current_id().as_deref(), Some("c"));
    }

    #[tokio::test]
    async fn test_empty_queue_operations_are_noops() {
        let mut h = Harness::new();

        h.command(PlayerCommand::Next).await;
        h.command(PlayerCommand::Previous).await;
        h.command(PlayerCommand::SeekTo(10_000)).await;
        h.command(PlayerCommand::TogglePlayPause).await;

        assert!(h.snapshot().state.is_idle());
        assert_eq!(h.snapshot().generation, 0);
        assert!(h.counters().ops().is_empty());
        assert!(h.controller.mailbox.is_empty());
    }

    #[tokio::test]
    async fn test_toggle_play_pause_reuses_session() {
        let mut h = Harness::new();
        let queue = abc();
        h.play(&queue[0], &queue).await;
        h.pump().await;

        h.command(PlayerCommand::TogglePlayPause).await;
        assert_eq!(h.snapshot().state, PlaybackState::Paused(queue[0].clone()));
        assert!(!h.snapshot().transport.is_playing);

        h.command(PlayerCommand::TogglePlayPause).await;
        assert_eq!(h.snapshot().state, PlaybackState::Playing(queue[0].clone()));

        assert_eq!(h.counters().created.load(Ordering::SeqCst), 1);
        assert_eq!(
            h.counters().ops(),
            vec!["play:a".to_string(), "pause:a".to_string(), "play:a".to_string()]
        );
    }

    #[tokio::test]
    async fn test_toggle_while_loading_is_noop() {
        let mut h = Harness::new();
        let queue = abc();
        let gate = h.backend.gate(&queue[0]);

        h.play(&queue[0], &queue).await;
        h.command(PlayerCommand::TogglePlayPause).await;
        assert!(h.snapshot().state.is_loading());

        gate.send(()).unwrap();
        h.pump().await;
        assert!(h.snapshot().state.is_playing());
    }

    #[tokio::test]
    async fn test_seek_clamps_to_duration() {
        let mut h = Harness::new();
        let queue = abc();
        h.play(&queue[0], &queue).await;
        h.pump().await;
        h.status(1_000, false).await;

        h.command(PlayerCommand::SeekTo(999_999)).await;

        assert_eq!(h.counters().ops().last().map(String::as_str), Some("seek:a:180000"));
        assert_eq!(h.snapshot().transport.position_ms, 180_000);
    }

    #[tokio::test]
    async fn test_status_updates_feed_transport() {
        let mut h = Harness::new();
        let queue = abc();
        h.play(&queue[0], &queue).await;
        h.pump().await;

        h.status(42_000, false).await;

        let transport = h.snapshot().transport;
        assert_eq!(transport.position_ms, 42_000);
        assert_eq!(transport.duration_ms, 180_000);
    }

    #[tokio::test]
    async fn test_repeat_toggle_cycles() {
        let mut h = Harness::new();
        let mut seen = Vec::new();
        for _ in 0..3 {
            h.command(PlayerCommand::ToggleRepeat).await;
            seen.push(h.snapshot().transport.repeat_mode);
        }
        assert_eq!(seen, vec![RepeatMode::All, RepeatMode::One, RepeatMode::Off]);
        assert!(h.counters().ops().is_empty());
    }

    #[tokio::test]
    async fn test_repeat_one_restarts_on_every_finish() {
        let mut h = Harness::new();
        let queue = abc();
        h.play(&queue[0], &queue).await;
        h.pump().await;
        h.command(PlayerCommand::ToggleRepeat).await;
        h.command(PlayerCommand::ToggleRepeat).await;
        assert_eq!(h.snapshot().transport.repeat_mode, RepeatMode::One);

        for _ in 0..3 {
            h.finish().await;
            let snapshot = h.snapshot();
            assert_eq!(snapshot.state, PlaybackState::Playing(queue[0].clone()));
            assert_eq!(snapshot.index, Some(0));
            assert_eq!(snapshot.transport.position_ms, 0);
        }

        let ops = h.counters().ops();
        assert_eq!(ops.iter().filter(|op| *op == "seek:a:0").count(), 3);
        assert_eq!(h.counters().created.load(Ordering::SeqCst), 1);
        assert!(h.controller.mailbox.is_empty());
    }

    #[tokio::test]
    async fn test_repeat_all_wraps_at_end() {
        let mut h = Harness::new();
        let queue = abc();
        h.command(PlayerCommand::ToggleRepeat).await;
        h.play(&queue[2], &queue).await;
        h.pump().await;

        h.finish().await;
        h.pump().await;

        assert_eq!(h.current_id().as_deref(), Some("a"));
        assert!(h.snapshot().state.is_playing());
    }

    #[tokio::test]
    async fn test_repeat_off_advances_mid_queue() {
        let mut h = Harness::new();
        let queue = abc();
        h.play(&queue[0], &queue).await;
        h.pump().await;

        h.finish().await;
        assert_eq!(h.snapshot().state, PlaybackState::Loading(queue[1].clone()));
        h.pump().await;

        assert_eq!(h.current_id().as_deref(), Some("b"));
        assert_eq!(h.snapshot().index, Some(1));
    }

    #[tokio::test]
    async fn test_unplayable_neighbours_are_skipped() {
        let mut h = Harness::new();
        let mut silent = track("b");
        silent.audio_url.clear();
        let queue = vec![track("a"), silent, track("c")];
        h.play(&queue[0], &queue).await;
        h.pump().await;
        assert_eq!(h.snapshot().queue_len, 2);

        h.finish().await;
        h.pump().await;

        assert_eq!(h.current_id().as_deref(), Some("c"));
        assert_eq!(h.snapshot().index, Some(1));
        assert!(h.snapshot().state.is_playing());

        h.command(PlayerCommand::Next).await;
        h.pump().await;
        assert_eq!(h.current_id().as_deref(), Some("a"));
    }

    #[tokio::test]
    async fn test_finish_before_bind_is_reported_again_after() {
        let mut h = Harness::new();
        let queue = abc();
        h.play(&queue[0], &queue).await;

        // The source drained while the load was still in flight.
        h.finish().await;
        assert!(h.snapshot().state.is_loading());

        h.pump().await;
        assert_eq!(h.current_id().as_deref(), Some("a"));

        // The sampler keeps flagging the drained sink once it is playing.
        h.finish().await;
        h.finish().await;
        h.pump().await;
        assert_eq!(h.current_id().as_deref(), Some("b"));
        assert_eq!(h.counters().created.load(Ordering::SeqCst), 2);
    }

    #[tokio::test]
    async fn test_repeat_off_stops_on_last_track() {
        let mut h = Harness::new();
        let queue = vec![track("a"), track("b")];
        h.play(&queue[1], &queue).await;
        h.pump().await;
        h.drain_events();

        h.finish().await;

        let snapshot = h.snapshot();
        assert_eq!(snapshot.state, PlaybackState::Paused(queue[1].clone()));
        assert_eq!(snapshot.index, Some(1));
        assert!(!snapshot.transport.is_playing);
        assert_eq!(h.counters().created.load(Ordering::SeqCst), 1);
        assert_eq!(h.counters().playing.load(Ordering::SeqCst), 1);
        assert!(matches!(h.drain_events().as_slice(), [Event::QueueEnded]));
    }

    #[tokio::test]
    async fn test_resume_after_queue_end_restarts_track() {
        let mut h = Harness::new();
        let queue = vec![track("a")];
        h.play(&queue[0], &queue).await;
        h.pump().await;
        h.finish().await;

        h.command(PlayerCommand::TogglePlayPause).await;

        assert!(h.snapshot().state.is_playing());
        assert_eq!(h.snapshot().transport.position_ms, 0);
        let ops = h.counters().ops();
        assert_eq!(&ops[ops.len() - 2..], ["seek:a:0".to_string(), "play:a".to_string()]);
    }

    #[tokio::test]
    async fn test_duplicate_finish_advances_once() {
        let mut h = Harness::new();
        let queue = abc();
        h.play(&queue[0], &queue).await;
        h.pump().await;
        let finished_generation = h.controller.generation;

        let duplicate = StatusUpdate {
            generation: finished_generation,
            position_ms: 180_000,
            duration_ms: 180_000,
            is_loaded: true,
            did_just_finish: true,
        };
        h.controller
            .handle(ControllerMessage::Status(duplicate))
            .await;
        h.controller
            .handle(ControllerMessage::Status(duplicate))
            .await;
        h.pump().await;

        assert_eq!(h.snapshot().index, Some(1));
        assert_eq!(h.current_id().as_deref(), Some("b"));
        assert_eq!(h.counters().created.load(Ordering::SeqCst), 2);
        assert!(h.controller.mailbox.is_empty());
    }

    #[tokio::test]
    async fn test_duplicate_finish_on_last_track_is_ignored() {
        let mut h = Harness::new();
        let queue = vec![track("a"), track("b")];
        h.play(&queue[1], &queue).await;
        h.pump().await;

        h.finish().await;
        h.finish().await;

        assert_eq!(h.snapshot().state, PlaybackState::Paused(queue[1].clone()));
        let pauses = h
            .counters()
            .ops()
            .into_iter()
            .filter(|op| op == "pause:b")
            .count();
        assert_eq!(pauses, 1);
    }

    #[tokio::test]
    async fn test_stale_load_is_discarded() {
        let mut h = Harness::new();
        let queue = vec![track("a"), track("b")];
        let gate_a = h.backend.gate(&queue[0]);

        h.play(&queue[0], &queue).await;
        h.play(&queue[1], &queue).await;
        h.pump().await;
        assert_eq!(h.snapshot().state, PlaybackState::Playing(queue[1].clone()));

        gate_a.send(()).unwrap();
        h.pump().await;

        let snapshot = h.snapshot();
        assert_eq!(snapshot.state, PlaybackState::Playing(queue[1].clone()));
        assert_eq!(snapshot.index, Some(1));
        let ops = h.counters().ops();
        assert!(ops.contains(&"release:a".to_string()));
        assert!(!ops.contains(&"play:a".to_string()));
        let started: Vec<String> = h
            .drain_events()
            .into_iter()
            .filter_map(|e| match e {
                Event::TrackStarted(t, _) => Some(t.id),
                _ => None,
            })
            .collect();
        assert_eq!(started, vec!["b".to_string()]);
    }

    #[tokio::test]
    async fn test_stale_status_is_discarded() {
        let mut h = Harness::new();
        let queue = abc();
        h.play(&queue[0], &queue).await;
        h.pump().await;
        let old_generation = h.controller.generation;
        h.command(PlayerCommand::Next).await;
        h.pump().await;

        h.controller
            .handle(ControllerMessage::Status(StatusUpdate {
                generation: old_generation,
                position_ms: 90_000,
                duration_ms: 180_000,
                is_loaded: true,
                did_just_finish: true,
            }))
            .await;

        assert_eq!(h.current_id().as_deref(), Some("b"));
        assert_eq!(h.snapshot().transport.position_ms, 0);
        assert!(h.controller.mailbox.is_empty());
    }

    #[tokio::test]
    async fn test_load_failure_returns_to_idle() {
        let mut h = Harness::new();
        let queue = abc();
        h.backend.break_url(&queue[1]);
        h.play(&queue[0], &queue).await;
        h.pump().await;
        h.drain_events();

        h.command(PlayerCommand::Next).await;
        h.pump().await;

        let snapshot = h.snapshot();
        assert!(snapshot.state.is_idle());
        assert_eq!(snapshot.index, None);
        assert_eq!(snapshot.queue_len, 0);
        assert_eq!(h.counters().playing.load(Ordering::SeqCst), 0);
        assert!(matches!(h.drain_events().as_slice(), [Event::PlaybackError(_)]));

        // The next request plays normally.
        h.play(&queue[2], &queue).await;
        h.pump().await;
        assert_eq!(h.current_id().as_deref(), Some("c"));
    }

    #[tokio::test]
    async fn test_track_missing_from_queue_is_ignored() {
        let mut h = Harness::new();
        let queue = abc();
        h.play(&queue[0], &queue).await;
        h.pump().await;
        let before = h.snapshot();

        h.play(&track("zzz"), &queue).await;
        let mut silent = track("b");
        silent.audio_url.clear();
        h.play(&silent, &queue).await;

        assert_eq!(*h.snapshot(), *before);
        assert!(h.controller.mailbox.is_empty());
    }

    #[tokio::test]
    async fn test_stop_releases_and_idles() {
        let mut h = Harness::new();
        let queue = abc();
        h.play(&queue[0], &queue).await;
        h.pump().await;

        h.command(PlayerCommand::Stop).await;

        assert!(h.snapshot().state.is_idle());
        assert_eq!(h.counters().playing.load(Ordering::SeqCst), 0);
        assert_eq!(h.counters().released.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn test_spawned_controller_shutdown_releases_session() {
        let backend = Arc::new(FakeBackend::default());
        let likes = Arc::new(LikedSet::new(Arc::new(FakeLikesApi::default())));
        let (event_tx, events) = flume::unbounded();
        let handle = PlaybackController::spawn(backend.clone(), likes, event_tx);
        let queue = abc();

        handle.play_track(queue[0].clone(), queue.clone());
        let started = tokio::time::timeout(Duration::from_secs(1), events.recv_async())
            .await
            .unwrap()
            .unwrap();
        assert!(matches!(started, Event::TrackStarted(_, 0)));

        handle.shutdown().await;

        assert_eq!(backend.counters.playing.load(Ordering::SeqCst), 0);
        assert_eq!(backend.counters.released.load(Ordering::SeqCst), 1);
        assert!(handle.snapshot().state.is_idle());
    }

    #[tokio::test]
    async fn test_like_toggle_is_independent_of_playback() {
        let h = Harness::new();

        assert!(h.handle.toggle_like("a"));
        assert!(h.handle.is_liked("a"));
        assert!(!h.handle.toggle_like("a"));
        assert!(!h.handle.is_liked("a"));
        assert!(h.snapshot().state.is_idle());
    }
}
