//! Voice playback session - core orchestration
//!
//! [`MusicPlayer`] owns one voice channel's playback: the connection, queue,
//! history, loop flags, volume and idle timer. It coordinates the collaborators
//! from [`crate::backend`] and reports every state change as a [`PlayerEvent`].
//!
//! # Serialization
//!
//! Operations that await (`play`, `previous`, the sink's idle advance and the
//! idle timer) run one at a time behind a per-session gate, so two overlapping
//! `play` calls can never both start playback. Synchronous controls only take
//! the short state lock.
//!
//! `stop` and `disconnect` bump the session epoch. An in-flight operation that
//! sees a different epoch after one of its awaits drops its result instead of
//! handing it to the sink.

use crate::backend::{Backends, SinkEvent, SinkEvents, VoiceConnection};
use crate::config::SessionConfig;
use crate::error::{PlayerError, Result};
use crate::events::PlayerEvent;
use crate::history::History;
use crate::queue::Queue;
use crate::types::{TrackMetadata, VoiceChannel};
use crate::volume::{to_percent, Volume, VolumeControl};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError, Weak};
use tokio::sync::broadcast;
use tokio::task::JoinHandle;
use tracing::{debug, info, warn};
use url::Url;

/// Armed auto-disconnect
struct IdleTimer {
    id: u64,
    handle: JoinHandle<()>,
}

/// Mutable session state, guarded by `Inner::state`
struct SessionState {
    connection: Option<Box<dyn VoiceConnection>>,

    volume: Volume,
    /// Volume control of the resource the sink is playing
    live_volume: Option<Arc<dyn VolumeControl>>,

    queue: Queue,
    history: History,
    /// Metadata of the track the sink is playing
    current: Option<TrackMetadata>,

    loop_queue: bool,
    loop_track: bool,
    playing: bool,

    idle_timer: Option<IdleTimer>,
    next_timer_id: u64,

    /// Bumped by stop/disconnect to invalidate in-flight operations
    epoch: u64,
}

impl SessionState {
    fn new(config: &SessionConfig) -> Self {
        Self {
            connection: None,
            volume: Volume::from_initial_percent(config.initial_volume),
            live_volume: None,
            queue: Queue::new(),
            history: History::new(config.history_size),
            current: None,
            loop_queue: false,
            loop_track: false,
            playing: false,
            idle_timer: None,
            next_timer_id: 0,
            epoch: 0,
        }
    }

    fn cancel_idle_timer(&mut self) {
        if let Some(timer) = self.idle_timer.take() {
            timer.handle.abort();
            debug!(timer = timer.id, "Idle timer cleared");
        }
    }

    /// Forget everything about the current playback
    fn reset_playback(&mut self) {
        self.cancel_idle_timer();
        self.epoch = self.epoch.wrapping_add(1);
        self.playing = false;
        self.queue.clear();
        self.history.clear();
        self.current = None;
        self.live_volume = None;
    }
}

struct Inner {
    channel: VoiceChannel,
    config: SessionConfig,
    backends: Backends,
    state: Mutex<SessionState>,
    /// Serializes the awaiting operations
    gate: tokio::sync::Mutex<()>,
    events: broadcast::Sender<PlayerEvent>,
}

/// Playback session for one voice channel
///
/// Cheap to clone; clones share the same session. Dropping the last handle
/// leaves the channel.
///
/// # Example
///
/// ```rust,ignore
/// use harmony_playback::{Backends, MusicPlayer, PlayerEvent, SessionConfig, VoiceChannel};
///
/// let player = MusicPlayer::new(VoiceChannel::new(channel_id, guild_id), backends, SessionConfig::default());
/// let mut events = player.subscribe();
///
/// player.play("never gonna give you up").await;
/// while let Ok(event) = events.recv().await {
///     if let PlayerEvent::Start { metadata, .. } = event {
///         println!("Now playing {:?}", metadata.title);
///     }
/// }
/// ```
#[derive(Clone)]
pub struct MusicPlayer {
    inner: Arc<Inner>,
}

impl MusicPlayer {
    /// Create a session for `channel`
    ///
    /// Subscribes to the sink right away, so this must be called inside a
    /// Tokio runtime.
    pub fn new(channel: VoiceChannel, backends: Backends, config: SessionConfig) -> Self {
        let (events, _) = broadcast::channel(config.event_capacity.max(1));
        let sink_events = backends.sink.subscribe();

        let inner = Arc::new(Inner {
            channel,
            state: Mutex::new(SessionState::new(&config)),
            config,
            backends,
            gate: tokio::sync::Mutex::new(()),
            events,
        });

        tokio::spawn(listen_sink(Arc::downgrade(&inner), sink_events));
        debug!(channel = channel.id, guild = channel.guild_id, "Session created");

        Self { inner }
    }

    /// Subscribe to session events
    pub fn subscribe(&self) -> broadcast::Receiver<PlayerEvent> {
        self.inner.events.subscribe()
    }

    pub fn channel(&self) -> VoiceChannel {
        self.inner.channel
    }

    // ===== Playback =====

    /// Play `input` now, or queue it if something is already playing
    ///
    /// `input` is a URL or free text to search for. Failures are reported as
    /// [`PlayerEvent::Error`].
    pub async fn play(&self, input: &str) {
        self.inner.play(input).await;
    }

    /// Resolve `query` to a playable URL
    ///
    /// Absolute `http(s)` URLs are returned unchanged.
    pub async fn search(&self, query: &str) -> Option<String> {
        self.inner.search(query).await
    }

    pub fn pause(&self) {
        self.inner.backends.sink.pause();
        self.inner.emit(PlayerEvent::Pause);
    }

    pub fn resume(&self) {
        self.inner.backends.sink.unpause();
        self.inner.emit(PlayerEvent::Resume);
    }

    /// Skip the current track; the idle handler picks what plays next
    pub fn skip(&self) {
        let (queue, history) = {
            let state = self.inner.state();
            (state.queue.snapshot(), state.history.snapshot())
        };
        self.inner.emit(PlayerEvent::Skip { queue, history });
        self.inner.backends.sink.stop();
    }

    /// Go back to the track played before the current one
    ///
    /// The current track goes back to the head of the queue.
    pub async fn previous(&self) {
        self.inner.previous().await;
    }

    /// Stop playback and clear queue and history
    ///
    /// With `no_leave == false` the session also leaves the channel.
    pub fn stop(&self, no_leave: bool) {
        {
            let mut state = self.inner.state();
            state.reset_playback();
            self.inner.backends.sink.stop();
        }
        info!(channel = self.inner.channel.id, "Playback stopped");
        self.inner.emit(PlayerEvent::Stop);

        if no_leave {
            self.inner.start_idle_timer();
        } else {
            self.disconnect();
        }
    }

    /// Leave the voice channel and reset the session
    ///
    /// Calling this again while disconnected does nothing.
    pub fn disconnect(&self) {
        if self.inner.teardown() {
            self.inner.emit(PlayerEvent::Disconnect);
        }
    }

    // ===== Volume =====

    /// Set volume in percent (0-200)
    ///
    /// Values above 200, and negative values, are taken as 200.
    pub fn set_volume(&self, percent: f32) {
        let volume = {
            let mut state = self.inner.state();
            state.volume.set_percent(percent);
            let multiplier = state.volume.multiplier();
            if let Some(control) = &state.live_volume {
                control.set_volume(multiplier);
            }
            state.volume.percent()
        };
        debug!(channel = self.inner.channel.id, volume, "Volume changed");
        self.inner.emit(PlayerEvent::VolumeChange { volume });
    }

    /// Volume in percent
    ///
    /// Reads the playing resource's volume when there is one, otherwise the
    /// recorded session volume.
    pub fn volume(&self) -> u32 {
        let state = self.inner.state();
        if let Some(control) = &state.live_volume {
            let live = control.volume();
            if live != 0.0 {
                return to_percent(live);
            }
        }
        state.volume.percent()
    }

    // ===== Queue =====

    /// Shuffle the queue (uniformly random)
    pub fn shuffle(&self) {
        let queue = {
            let mut guard = self.inner.state();
            let state = &mut *guard;
            state.queue.shuffle(&state.history);
            state.queue.snapshot()
        };
        self.inner.emit(PlayerEvent::Shuffle { queue });
    }

    /// Restore the queue order from before the last shuffle
    ///
    /// Tracks played since the shuffle are not re-inserted. Announces the
    /// queue with [`PlayerEvent::Shuffle`] even when there was nothing to undo.
    pub fn undo_shuffle(&self) {
        let queue = {
            let mut guard = self.inner.state();
            let state = &mut *guard;
            if !state.queue.undo_shuffle(&state.history) {
                debug!(channel = self.inner.channel.id, "No shuffle to undo");
            }
            state.queue.snapshot()
        };
        self.inner.emit(PlayerEvent::Shuffle { queue });
    }

    pub fn toggle_loop_queue(&self) {
        let enabled = {
            let mut state = self.inner.state();
            state.loop_queue = !state.loop_queue;
            state.loop_queue
        };
        self.inner.emit(PlayerEvent::LoopQueue { enabled });
    }

    pub fn toggle_loop_track(&self) {
        let enabled = {
            let mut state = self.inner.state();
            state.loop_track = !state.loop_track;
            state.loop_track
        };
        self.inner.emit(PlayerEvent::LoopTrack { enabled });
    }

    // ===== Queries =====

    /// Copy of the upcoming tracks, next first
    pub fn queue(&self) -> Vec<TrackMetadata> {
        self.inner.state().queue.snapshot()
    }

    /// Copy of the played URLs, most recent last
    pub fn history(&self) -> Vec<String> {
        self.inner.state().history.snapshot()
    }

    pub fn current_track(&self) -> Option<TrackMetadata> {
        self.inner.state().current.clone()
    }

    pub fn is_playing(&self) -> bool {
        self.inner.state().playing
    }

    pub fn is_loop_queue(&self) -> bool {
        self.inner.state().loop_queue
    }

    pub fn is_loop_track(&self) -> bool {
        self.inner.state().loop_track
    }

    pub fn is_shuffled(&self) -> bool {
        self.inner.state().queue.is_shuffled()
    }

    pub fn is_connected(&self) -> bool {
        self.inner.state().connection.is_some()
    }
}

impl std::fmt::Debug for MusicPlayer {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("MusicPlayer")
            .field("channel", &self.inner.channel)
            .finish_non_exhaustive()
    }
}

/// Forward sink notifications into the session until either side goes away
async fn listen_sink(session: Weak<Inner>, mut events: SinkEvents) {
    while let Some(event) = events.recv().await {
        let Some(inner) = session.upgrade() else {
            break;
        };

        match event {
            SinkEvent::Idle => inner.on_idle().await,
            SinkEvent::Playing => inner.state().cancel_idle_timer(),
            SinkEvent::Error(message) => inner.report(PlayerError::sink(message)),
        }
    }
}

impl Inner {
    fn state(&self) -> MutexGuard<'_, SessionState> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }

    fn emit(&self, event: PlayerEvent) {
        debug!(channel = self.channel.id, event = event.name(), "Session event");
        // No subscribers is fine
        let _ = self.events.send(event);
    }

    /// Emit a recoverable error
    fn report(&self, err: PlayerError) {
        if matches!(err, PlayerError::Superseded) {
            debug!(channel = self.channel.id, "Operation superseded, result dropped");
            return;
        }
        warn!(channel = self.channel.id, error = %err, "Session error");
        self.emit(err.into());
    }

    fn is_current(&self, epoch: u64) -> bool {
        self.state().epoch == epoch
    }

    // ===== Connection lifecycle =====

    async fn ensure_connection(&self, epoch: u64) -> Result<()> {
        if self.state().connection.is_some() {
            return Ok(());
        }

        debug!(channel = self.channel.id, guild = self.channel.guild_id, "Joining voice channel");
        let connection = self
            .backends
            .connector
            .connect(&self.channel)
            .await
            .map_err(into_connection_error)?;

        let timeout = self.config.connect_timeout();
        let ready = tokio::time::timeout(timeout, connection.wait_ready()).await;
        let ready = match ready {
            Ok(result) => result.map_err(into_connection_error),
            Err(_) => Err(PlayerError::ConnectTimeout(timeout)),
        };
        if let Err(err) = ready {
            connection.teardown();
            if !self.is_current(epoch) {
                return Err(PlayerError::Superseded);
            }
            return Err(err);
        }

        let mut state = self.state();
        if state.epoch != epoch {
            drop(state);
            connection.teardown();
            return Err(PlayerError::Superseded);
        }

        connection.bind(Arc::clone(&self.backends.sink));
        state.connection = Some(connection);
        info!(channel = self.channel.id, guild = self.channel.guild_id, "Joined voice channel");
        Ok(())
    }

    /// Release the connection and reset all playback state
    ///
    /// Returns whether there was anything to tear down.
    fn teardown(&self) -> bool {
        let mut state = self.state();
        let active = state.connection.is_some() || state.playing;

        state.reset_playback();
        self.backends.sink.stop();

        if let Some(connection) = state.connection.take() {
            connection.teardown();
            info!(channel = self.channel.id, "Left voice channel");
        }
        active
    }

    // ===== Idle timer =====

    fn start_idle_timer(self: &Arc<Self>) {
        let Some(delay) = self.config.auto_leave_on_idle() else {
            return;
        };

        let mut state = self.state();
        if state.idle_timer.is_some() || state.playing || state.connection.is_none() {
            return;
        }

        state.next_timer_id += 1;
        let id = state.next_timer_id;
        let session = Arc::downgrade(self);
        let handle = tokio::spawn(async move {
            tokio::time::sleep(delay).await;
            if let Some(inner) = session.upgrade() {
                inner.on_idle_timeout(id).await;
            }
        });

        state.idle_timer = Some(IdleTimer { id, handle });
        debug!(channel = self.channel.id, timer = id, delay_ms = delay.as_millis() as u64, "Idle timer armed");
    }

    async fn on_idle_timeout(&self, id: u64) {
        let _gate = self.gate.lock().await;
        {
            let mut state = self.state();
            if state.idle_timer.as_ref().map(|timer| timer.id) != Some(id) {
                return;
            }
            state.idle_timer = None;
            if state.playing {
                return;
            }
        }

        info!(channel = self.channel.id, "Idle for too long, leaving voice channel");
        self.teardown();
        self.emit(PlayerEvent::Disconnect);
    }

    // ===== Resolution =====

    async fn search(&self, query: &str) -> Option<String> {
        let query = query.trim();
        if is_absolute_url(query) {
            return Some(query.to_string());
        }
        if query.is_empty() {
            return None;
        }
        self.backends.resolver.search(query).await
    }

    // ===== Playback =====

    async fn play(self: &Arc<Self>, input: &str) {
        let _gate = self.gate.lock().await;
        let epoch = self.state().epoch;

        if let Err(err) = self.ensure_connection(epoch).await {
            self.report(err);
            return;
        }

        let Some(url) = self.search(input).await else {
            if self.is_current(epoch) {
                self.report(PlayerError::nothing_found(input.trim()));
            }
            return;
        };

        let metadata = self.backends.resolver.fetch_metadata(&url).await;
        if !self.is_current(epoch) {
            self.report(PlayerError::Superseded);
            return;
        }

        let queued = {
            let mut state = self.state();
            if state.playing {
                state.queue.push_back(metadata.clone());
                Some(state.queue.snapshot())
            } else {
                None
            }
        };

        if let Some(queue) = queued {
            info!(channel = self.channel.id, url = %url, position = queue.len(), "Track queued");
            self.emit(PlayerEvent::QueueAdd { metadata, queue });
            return;
        }

        if let Err(err) = self.play_url(url, metadata, epoch).await {
            self.report(err);
            self.start_idle_timer();
        }
    }

    /// Open a stream for `url` and hand it to the sink
    ///
    /// History, `playing` and the live volume only change once the sink has
    /// the resource.
    async fn play_url(&self, url: String, metadata: TrackMetadata, epoch: u64) -> Result<()> {
        let stream = self.backends.streams.open_stream(&url).await;
        if !self.is_current(epoch) {
            return Err(PlayerError::Superseded);
        }

        let stream = stream.ok_or_else(|| PlayerError::no_stream(&url))?;
        let resource = self.backends.resources.build(stream)?;
        let live_volume = resource.volume.clone();

        let queue = {
            let mut state = self.state();
            if let Some(control) = &live_volume {
                control.set_volume(state.volume.multiplier());
            }

            state.history.push(url.clone());
            state.current = Some(metadata.clone());
            state.live_volume = live_volume;
            state.playing = true;
            state.cancel_idle_timer();
            self.backends.sink.play(resource);

            state.queue.snapshot()
        };

        info!(channel = self.channel.id, url = %url, title = ?metadata.title, "Playback started");
        self.emit(PlayerEvent::Start { metadata, queue });
        Ok(())
    }

    /// Decide what plays after the sink went idle
    ///
    /// Order: repeat the track if looping it, else advance the queue (re-queueing
    /// the popped track when looping the queue), else finish.
    async fn on_idle(self: &Arc<Self>) {
        let _gate = self.gate.lock().await;

        let (epoch, replay) = {
            let state = self.state();
            if !state.playing {
                debug!(channel = self.channel.id, "Sink idle while not playing, ignoring");
                return;
            }
            let replay = if state.loop_track {
                state.history.last().map(str::to_string)
            } else {
                None
            };
            (state.epoch, replay)
        };

        if let Some(url) = replay {
            let metadata = self.backends.resolver.fetch_metadata(&url).await;
            match self.play_url(url, metadata, epoch).await {
                Ok(()) | Err(PlayerError::Superseded) => return,
                Err(err) => self.report(err),
            }
        } else {
            // Each queued track gets one attempt, so a looping queue of broken
            // tracks cannot spin forever
            let attempts = self.state().queue.len();
            for _ in 0..attempts {
                let next = {
                    let mut state = self.state();
                    if state.epoch != epoch {
                        return;
                    }
                    let Some(next) = state.queue.pop_front() else {
                        break;
                    };
                    if state.loop_queue {
                        state.queue.push_back(next.clone());
                    }
                    next
                };

                let metadata = self.backends.resolver.fetch_metadata(&next.url).await;
                match self.play_url(next.url, metadata, epoch).await {
                    Ok(()) | Err(PlayerError::Superseded) => return,
                    Err(err) => self.report(err),
                }
            }
        }

        self.finish(epoch);
    }

    /// Nothing left to play
    fn finish(self: &Arc<Self>, epoch: u64) {
        let (queue, history) = {
            let mut state = self.state();
            if state.epoch != epoch {
                return;
            }
            state.playing = false;
            state.current = None;
            state.live_volume = None;
            (state.queue.snapshot(), state.history.snapshot())
        };

        info!(channel = self.channel.id, played = history.len(), "Queue finished");
        self.emit(PlayerEvent::Finish { queue, history });

        if self.config.auto_leave_on_empty_queue {
            self.teardown();
            self.emit(PlayerEvent::Disconnect);
        } else {
            self.start_idle_timer();
        }
    }

    async fn previous(self: &Arc<Self>) {
        let _gate = self.gate.lock().await;

        let (epoch, target, current_url, current) = {
            let mut state = self.state();
            if state.history.len() < 2 {
                drop(state);
                self.report(PlayerError::NoPreviousTrack);
                return;
            }

            let (Some(current_url), Some(target)) = (state.history.pop(), state.history.pop())
            else {
                return;
            };
            let current = state
                .current
                .take()
                .filter(|track| track.url == current_url);

            (state.epoch, target, current_url, current)
        };

        // Finished sessions no longer hold the last track's metadata
        let current = match current {
            Some(track) => track,
            None => self.backends.resolver.fetch_metadata(&current_url).await,
        };
        let metadata = self.backends.resolver.fetch_metadata(&target).await;

        let (queue, history) = {
            let mut state = self.state();
            if state.epoch != epoch {
                return;
            }
            state.queue.push_front(current);
            (state.queue.snapshot(), state.history.snapshot())
        };

        info!(channel = self.channel.id, url = %target, "Going back to previous track");
        self.emit(PlayerEvent::Previous {
            metadata: metadata.clone(),
            queue,
            history,
        });

        if let Err(err) = self.play_url(target, metadata, epoch).await {
            self.report(err);
            // Let the idle handler move on to the head of the queue
            if self.state().playing {
                self.backends.sink.stop();
            } else {
                self.start_idle_timer();
            }
        }
    }
}

impl Drop for Inner {
    fn drop(&mut self) {
        let state = self.state.get_mut().unwrap_or_else(PoisonError::into_inner);
        state.cancel_idle_timer();
        if let Some(connection) = state.connection.take() {
            connection.teardown();
        }
    }
}

/// Whether `input` is a well-formed absolute `http(s)` URL
///
/// Such input is played as given instead of being searched for.
pub fn is_absolute_url(input: &str) -> bool {
    match Url::parse(input.trim()) {
        Ok(url) => matches!(url.scheme(), "http" | "https") && url.host_str().is_some(),
        Err(_) => false,
    }
}

fn into_connection_error(err: PlayerError) -> PlayerError {
    match err {
        PlayerError::Connection(_) | PlayerError::ConnectTimeout(_) => err,
        other => PlayerError::connection(other.to_string()),
    }
}
