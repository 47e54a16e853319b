//! Shared test doubles for session tests
//!
//! Every collaborator is an in-memory fake that records what the session asked
//! it to do. The sink only goes idle when a test calls [`MockSink::finish`] or
//! the session stops it.

#![allow(dead_code)]

use async_trait::async_trait;
use harmony_playback::{
    AudioResource, AudioSink, AudioStream, Backends, MusicPlayer, PlayerError, PlayerEvent,
    SessionConfig, SinkEvent, SinkEvents, StreamSource, TrackMetadata, TrackResolver, TrackSource,
    VoiceChannel, VoiceConnection, VoiceConnector, VolumeControl,
};
use std::collections::{HashMap, HashSet};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;
use tokio::sync::{broadcast, mpsc};

// ===== Sink =====

#[derive(Default)]
struct SinkState {
    subscribers: Vec<mpsc::UnboundedSender<SinkEvent>>,
    playing: bool,
    paused: bool,
    plays: usize,
    volume: Option<Arc<dyn VolumeControl>>,
}

#[derive(Default)]
pub struct MockSink {
    state: Mutex<SinkState>,
}

impl MockSink {
    fn send(state: &mut SinkState, event: SinkEvent) {
        state.subscribers.retain(|tx| tx.send(event.clone()).is_ok());
    }

    /// The current resource ran to its end
    pub fn finish(&self) {
        let mut state = self.state.lock().unwrap();
        if state.playing {
            state.playing = false;
            Self::send(&mut state, SinkEvent::Idle);
        }
    }

    /// Report a playback failure
    pub fn fail(&self, message: &str) {
        let mut state = self.state.lock().unwrap();
        Self::send(&mut state, SinkEvent::Error(message.to_string()));
    }

    pub fn plays(&self) -> usize {
        self.state.lock().unwrap().plays
    }

    pub fn is_playing(&self) -> bool {
        self.state.lock().unwrap().playing
    }

    pub fn is_paused(&self) -> bool {
        self.state.lock().unwrap().paused
    }

    /// Multiplier of the resource last handed to the sink
    pub fn resource_volume(&self) -> Option<f32> {
        self.state.lock().unwrap().volume.as_ref().map(|v| v.volume())
    }

    /// Run `samples` through the current resource's volume control
    pub fn render(&self, samples: &[f32]) -> Vec<f32> {
        let mut buffer = samples.to_vec();
        if let Some(volume) = &self.state.lock().unwrap().volume {
            volume.apply(&mut buffer);
        }
        buffer
    }
}

impl AudioSink for MockSink {
    fn play(&self, resource: AudioResource) {
        let mut state = self.state.lock().unwrap();
        state.playing = true;
        state.paused = false;
        state.plays += 1;
        state.volume = resource.volume;
        Self::send(&mut state, SinkEvent::Playing);
    }

    fn pause(&self) {
        self.state.lock().unwrap().paused = true;
    }

    fn unpause(&self) {
        self.state.lock().unwrap().paused = false;
    }

    fn stop(&self) {
        let mut state = self.state.lock().unwrap();
        state.paused = false;
        if state.playing {
            state.playing = false;
            Self::send(&mut state, SinkEvent::Idle);
        }
    }

    fn subscribe(&self) -> SinkEvents {
        let (tx, rx) = mpsc::unbounded_channel();
        self.state.lock().unwrap().subscribers.push(tx);
        rx
    }
}

// ===== Voice connection =====

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConnectBehavior {
    Ready,
    /// `wait_ready` fails
    Fail,
    /// `wait_ready` never resolves
    Hang,
    /// `wait_ready` succeeds after a delay
    Slow(Duration),
}

pub struct MockConnector {
    behavior: Mutex<ConnectBehavior>,
    connects: AtomicUsize,
    binds: Arc<AtomicUsize>,
    teardowns: Arc<AtomicUsize>,
}

impl MockConnector {
    pub fn new(behavior: ConnectBehavior) -> Self {
        Self {
            behavior: Mutex::new(behavior),
            connects: AtomicUsize::new(0),
            binds: Arc::new(AtomicUsize::new(0)),
            teardowns: Arc::new(AtomicUsize::new(0)),
        }
    }

    pub fn set_behavior(&self, behavior: ConnectBehavior) {
        *self.behavior.lock().unwrap() = behavior;
    }

    pub fn connects(&self) -> usize {
        self.connects.load(Ordering::SeqCst)
    }

    pub fn binds(&self) -> usize {
        self.binds.load(Ordering::SeqCst)
    }

    pub fn teardowns(&self) -> usize {
        self.teardowns.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl VoiceConnector for MockConnector {
    async fn connect(&self, _channel: &VoiceChannel) -> harmony_playback::Result<Box<dyn VoiceConnection>> {
        self.connects.fetch_add(1, Ordering::SeqCst);
        Ok(Box::new(MockConnection {
            behavior: *self.behavior.lock().unwrap(),
            binds: Arc::clone(&self.binds),
            teardowns: Arc::clone(&self.teardowns),
        }))
    }
}

struct MockConnection {
    behavior: ConnectBehavior,
    binds: Arc<AtomicUsize>,
    teardowns: Arc<AtomicUsize>,
}

#[async_trait]
impl VoiceConnection for MockConnection {
    async fn wait_ready(&self) -> harmony_playback::Result<()> {
        match self.behavior {
            ConnectBehavior::Ready => Ok(()),
            ConnectBehavior::Fail => Err(PlayerError::connection("handshake rejected")),
            ConnectBehavior::Hang => std::future::pending().await,
            ConnectBehavior::Slow(delay) => {
                tokio::time::sleep(delay).await;
                Ok(())
            }
        }
    }

    fn bind(&self, _sink: Arc<dyn AudioSink>) {
        self.binds.fetch_add(1, Ordering::SeqCst);
    }

    fn teardown(&self) {
        self.teardowns.fetch_add(1, Ordering::SeqCst);
    }
}

// ===== Resolver =====

/// Resolves `query words` to `https://youtu.be/query-words`
///
/// Queries starting with "nothing" find nothing.
#[derive(Default)]
pub struct MockResolver {
    search_delays: Mutex<HashMap<String, Duration>>,
    searches: AtomicUsize,
}

impl MockResolver {
    pub fn delay_search(&self, query: &str, delay: Duration) {
        self.search_delays
            .lock()
            .unwrap()
            .insert(query.to_string(), delay);
    }

    pub fn searches(&self) -> usize {
        self.searches.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl TrackResolver for MockResolver {
    async fn search(&self, query: &str) -> Option<String> {
        self.searches.fetch_add(1, Ordering::SeqCst);
        let delay = self.search_delays.lock().unwrap().get(query).copied();
        if let Some(delay) = delay {
            tokio::time::sleep(delay).await;
        }

        if query.starts_with("nothing") {
            return None;
        }
        Some(url(&query.replace(' ', "-")))
    }

    async fn fetch_metadata(&self, url: &str) -> TrackMetadata {
        track(url)
    }
}

// ===== Streams =====

#[derive(Default)]
pub struct MockStreams {
    failing: Mutex<HashSet<String>>,
    opened: Mutex<Vec<String>>,
}

impl MockStreams {
    /// Make every provider fail for `url`
    pub fn fail(&self, url: &str) {
        self.failing.lock().unwrap().insert(url.to_string());
    }

    pub fn opened(&self) -> Vec<String> {
        self.opened.lock().unwrap().clone()
    }
}

#[async_trait]
impl StreamSource for MockStreams {
    async fn open_stream(&self, url: &str) -> Option<AudioStream> {
        self.opened.lock().unwrap().push(url.to_string());
        if self.failing.lock().unwrap().contains(url) {
            return None;
        }
        Some(Box::new(tokio::io::empty()))
    }
}

// ===== Harness =====

pub struct Harness {
    pub player: MusicPlayer,
    pub events: broadcast::Receiver<PlayerEvent>,
    pub sink: Arc<MockSink>,
    pub connector: Arc<MockConnector>,
    pub resolver: Arc<MockResolver>,
    pub streams: Arc<MockStreams>,
}

pub fn harness(config: SessionConfig) -> Harness {
    harness_with(config, ConnectBehavior::Ready)
}

pub fn harness_with(config: SessionConfig, behavior: ConnectBehavior) -> Harness {
    let sink = Arc::new(MockSink::default());
    let connector = Arc::new(MockConnector::new(behavior));
    let resolver = Arc::new(MockResolver::default());
    let streams = Arc::new(MockStreams::default());

    let backends = Backends::new(
        connector.clone(),
        sink.clone(),
        resolver.clone(),
        streams.clone(),
    );
    let player = MusicPlayer::new(VoiceChannel::new(10, 1), backends, config);
    let events = player.subscribe();

    Harness {
        player,
        events,
        sink,
        connector,
        resolver,
        streams,
    }
}

/// Config that stays in the channel and never times out on its own
pub fn staying_config() -> SessionConfig {
    SessionConfig {
        auto_leave_on_empty_queue: false,
        auto_leave_on_idle_ms: 0,
        ..SessionConfig::default()
    }
}

pub fn url(id: &str) -> String {
    format!("https://youtu.be/{}", id)
}

pub fn track(url: &str) -> TrackMetadata {
    TrackMetadata {
        title: Some(format!("Title of {}", url)),
        author: Some("Test Artist".to_string()),
        duration: Some(180),
        thumbnail: None,
        source: TrackSource::Youtube,
        url: url.to_string(),
    }
}

pub fn urls(tracks: &[TrackMetadata]) -> Vec<String> {
    tracks.iter().map(|t| t.url.clone()).collect()
}

/// Next event, failing the test if none arrives
pub async fn next_event(events: &mut broadcast::Receiver<PlayerEvent>) -> PlayerEvent {
    tokio::time::timeout(Duration::from_secs(5), events.recv())
        .await
        .expect("timed out waiting for event")
        .expect("event channel closed")
}

/// Everything already emitted
pub fn drain(events: &mut broadcast::Receiver<PlayerEvent>) -> Vec<PlayerEvent> {
    let mut drained = Vec::new();
    while let Ok(event) = events.try_recv() {
        drained.push(event);
    }
    drained
}

/// Let the sink listener and spawned timers catch up
pub async fn settle() {
    tokio::time::sleep(Duration::from_millis(10)).await;
}

/// Start `ids` in order: the first plays, the rest are queued
pub async fn play_all(h: &mut Harness, ids: &[&str]) {
    for id in ids {
        h.player.play(&url(id)).await;
    }
    drain(&mut h.events);
}
