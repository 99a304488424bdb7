//! Per-guild playback sessions.
//!
//! A [`Session`] is the single owner of what a guild should be playing. It
//! validates each operation, applies it to local state, then forwards the
//! matching command to its node through an ordered [`NodeDispatcher`].
//!
//! Callers are expected to drive one session from one logical context at a
//! time. Locks are only held for the duration of a local mutation and are
//! always taken in `state` then `scheduler` then `queue` order.

pub mod playback;
pub mod registry;
pub mod repeat;
pub mod state;

use std::{
    sync::{Arc, Weak},
    time::Duration,
};

use parking_lot::Mutex;
use tracing::{debug, info};

use crate::{
    common::{
        SessionError, SessionResult,
        types::{ChannelId, GuildId, now_ms},
    },
    events::EventSink,
    node::{NodeDispatcher, RemoteNode, TrackResolver},
    protocol::{PlayerUpdate, SessionEvent, VoiceStateFrame},
    queue::{Queue, SharedQueue},
    voice::VoiceSignaler,
};

pub use playback::PlayArgument;
pub use registry::SessionRegistry;
pub use repeat::RepeatScheduler;
pub use state::{ConnectionState, RepeatMode, SessionSnapshot, StateChange};

use registry::SessionMap;
use state::SessionState;

/// Options for [`SessionRegistry::get_or_create`]. Unset values fall back to
/// the registry's [`SessionDefaults`](crate::configs::SessionDefaults).
#[derive(Debug, Clone)]
pub struct SessionOptions {
    pub guild_id: GuildId,
    pub voice_channel: Option<ChannelId>,
    pub text_channel: Option<ChannelId>,
    /// Identifier of the preferred node.
    pub node: Option<String>,
    pub volume: Option<f64>,
    pub self_mute: Option<bool>,
    pub self_deafen: Option<bool>,
}

impl SessionOptions {
    pub fn new(guild_id: impl Into<GuildId>) -> Self {
        Self {
            guild_id: guild_id.into(),
            voice_channel: None,
            text_channel: None,
            node: None,
            volume: None,
            self_mute: None,
            self_deafen: None,
        }
    }

    pub fn voice_channel(mut self, channel: impl Into<ChannelId>) -> Self {
        self.voice_channel = Some(channel.into());
        self
    }

    pub fn text_channel(mut self, channel: impl Into<ChannelId>) -> Self {
        self.text_channel = Some(channel.into());
        self
    }

    pub fn node(mut self, identifier: impl Into<String>) -> Self {
        self.node = Some(identifier.into());
        self
    }

    pub fn volume(mut self, volume: f64) -> Self {
        self.volume = Some(volume);
        self
    }

    pub fn self_mute(mut self, mute: bool) -> Self {
        self.self_mute = Some(mute);
        self
    }

    pub fn self_deafen(mut self, deafen: bool) -> Self {
        self.self_deafen = Some(deafen);
        self
    }

    fn validate(&self) -> SessionResult<()> {
        if self.guild_id.trim().is_empty() {
            return Err(SessionError::validation("Guild id must be a non-empty string."));
        }
        if self.voice_channel.as_ref().is_some_and(|c| c.trim().is_empty()) {
            return Err(SessionError::validation(
                "Voice channel must be a non-empty string.",
            ));
        }
        if self.text_channel.as_ref().is_some_and(|c| c.trim().is_empty()) {
            return Err(SessionError::validation(
                "Text channel must be a non-empty string.",
            ));
        }
        if let Some(volume) = self.volume {
            check_volume(volume)?;
        }
        Ok(())
    }
}

pub(crate) fn check_volume(volume: f64) -> SessionResult<()> {
    if !volume.is_finite() {
        return Err(SessionError::validation("Volume must be a finite number."));
    }
    if volume < 0.0 {
        return Err(SessionError::range("Volume must not be negative."));
    }
    Ok(())
}

pub struct Session {
    guild_id: GuildId,
    node: Arc<dyn RemoteNode>,
    dispatcher: NodeDispatcher,
    voice: Arc<dyn VoiceSignaler>,
    events: Arc<dyn EventSink>,
    resolver: Option<Arc<dyn TrackResolver>>,
    queue: SharedQueue,
    state: Mutex<SessionState>,
    scheduler: Mutex<RepeatScheduler>,
    repeat_interval: Duration,
    registry: Weak<SessionMap>,
}

impl Session {
    pub fn guild_id(&self) -> &GuildId {
        &self.guild_id
    }

    pub fn node(&self) -> &Arc<dyn RemoteNode> {
        &self.node
    }

    pub fn queue(&self) -> &SharedQueue {
        &self.queue
    }

    pub fn connection_state(&self) -> ConnectionState {
        self.state.lock().connection
    }

    pub fn voice_channel(&self) -> Option<ChannelId> {
        self.state.lock().voice_channel.clone()
    }

    pub fn text_channel(&self) -> Option<ChannelId> {
        self.state.lock().text_channel.clone()
    }

    pub fn now_playing_reference(&self) -> Option<String> {
        self.state.lock().now_playing.clone()
    }

    pub fn is_playing(&self) -> bool {
        self.state.lock().playing
    }

    pub fn is_paused(&self) -> bool {
        self.state.lock().paused
    }

    /// Milliseconds into the current track, as last set locally.
    pub fn position(&self) -> u64 {
        self.state.lock().position
    }

    pub fn volume(&self) -> f64 {
        self.state.lock().volume
    }

    pub fn repeat_mode(&self) -> RepeatMode {
        self.state.lock().repeat
    }

    pub fn is_destroyed(&self) -> bool {
        self.state.lock().connection == ConnectionState::Destroying
    }

    pub fn snapshot(&self) -> SessionSnapshot {
        let state = self.state.lock();
        let queue = self.queue.lock();
        self.snapshot_of(&state, &queue)
    }

    /// Waits until every node command issued so far has been executed.
    pub async fn flush(&self) {
        self.dispatcher.flush().await;
    }

    pub fn set_data(&self, key: impl Into<String>, value: impl Into<serde_json::Value>) {
        self.state.lock().data.insert(key.into(), value.into());
    }

    pub fn data(&self, key: &str) -> Option<serde_json::Value> {
        self.state.lock().data.get(key).cloned()
    }

    pub fn remove_data(&self, key: &str) -> Option<serde_json::Value> {
        self.state.lock().data.remove(key)
    }

    /// Sends a join frame for the bound voice channel.
    pub fn connect(&self) -> SessionResult<()> {
        let frame = {
            let mut state = self.state.lock();
            ensure_alive(&state)?;
            let channel = state
                .voice_channel
                .clone()
                .ok_or_else(|| SessionError::configuration("No voice channel has been set."))?;
            state.connection = ConnectionState::Connecting;
            VoiceStateFrame::join(channel, state.self_mute, state.self_deafen)
        };

        debug!(
            "[{}] joining voice channel {:?}",
            self.guild_id, frame.channel_id
        );
        self.voice.send_voice_state(&self.guild_id, frame);
        self.state.lock().connection = ConnectionState::Connected;
        Ok(())
    }

    /// Pauses, leaves the voice channel and forgets it. No-op when no channel is bound.
    pub fn disconnect(&self) -> SessionResult<()> {
        ensure_alive(&self.state.lock())?;
        self.leave_voice();
        Ok(())
    }

    /// Tears the session down: cancels dynamic repeat, optionally leaves voice,
    /// discards the node's player and removes the session from its registry.
    ///
    /// Destroying an already destroyed session does nothing.
    pub fn destroy(&self, disconnect: bool) -> SessionResult<()> {
        {
            let mut state = self.state.lock();
            if state.connection == ConnectionState::Destroying {
                debug!("[{}] session already destroyed", self.guild_id);
                return Ok(());
            }
            state.connection = ConnectionState::Destroying;
            if state.repeat == RepeatMode::Dynamic {
                state.repeat = RepeatMode::None;
            }
        }
        self.scheduler.lock().disarm();

        if disconnect {
            self.leave_voice();
        }
        self.dispatcher.destroy();
        self.events.emit(SessionEvent::SessionDestroyed {
            session: self.snapshot(),
        });

        if let Some(sessions) = self.registry.upgrade() {
            sessions.remove_if(&self.guild_id, |_, s| std::ptr::eq(Arc::as_ptr(s), self));
        }
        info!("[{}] session destroyed", self.guild_id);
        Ok(())
    }

    /// Binds a voice channel and connects to it.
    pub fn set_voice_channel(&self, channel: impl Into<ChannelId>) -> SessionResult<()> {
        let channel = channel.into();
        if channel.trim().is_empty() {
            return Err(SessionError::validation("Channel must be a non-empty string."));
        }
        {
            let mut state = self.state.lock();
            ensure_alive(&state)?;
            state.voice_channel = Some(channel);
        }
        self.connect()
    }

    pub fn set_text_channel(&self, channel: impl Into<ChannelId>) -> SessionResult<()> {
        let channel = channel.into();
        if channel.trim().is_empty() {
            return Err(SessionError::validation("Channel must be a non-empty string."));
        }
        let mut state = self.state.lock();
        ensure_alive(&state)?;
        state.text_channel = Some(channel);
        Ok(())
    }

    /// Remembers the id of the message announcing the current track.
    pub fn set_now_playing_reference(&self, reference: impl Into<String>) -> SessionResult<()> {
        let reference = reference.into();
        if reference.trim().is_empty() {
            return Err(SessionError::validation(
                "Now playing reference must be a non-empty string.",
            ));
        }
        let mut state = self.state.lock();
        ensure_alive(&state)?;
        state.now_playing = Some(reference);
        Ok(())
    }

    pub fn set_track_repeat(&self, enabled: bool) -> SessionResult<()> {
        self.set_repeat(if enabled {
            RepeatMode::Track
        } else {
            RepeatMode::None
        })
    }

    pub fn set_queue_repeat(&self, enabled: bool) -> SessionResult<()> {
        self.set_repeat(if enabled {
            RepeatMode::Queue
        } else {
            RepeatMode::None
        })
    }

    /// Turns dynamic repeat on or off. `interval` defaults to the configured one.
    ///
    /// Enabling needs at least two pending tracks to shuffle. Disabling clears
    /// every repeat mode, like the other repeat setters.
    pub fn set_dynamic_repeat(
        &self,
        enabled: bool,
        interval: Option<Duration>,
    ) -> SessionResult<()> {
        let interval = interval.unwrap_or(self.repeat_interval);
        let before = {
            let mut state = self.state.lock();
            ensure_alive(&state)?;

            let queue = self.queue.lock();
            if enabled && queue.size() <= 1 {
                return Err(SessionError::range(
                    "The queue size must be greater than 1 to enable dynamic repeat.",
                ));
            }
            if enabled && interval.is_zero() {
                return Err(SessionError::range(
                    "Dynamic repeat interval must be greater than zero.",
                ));
            }
            let before = self.snapshot_of(&state, &queue);
            drop(queue);

            let mut scheduler = self.scheduler.lock();
            if enabled {
                scheduler.arm(self.guild_id.clone(), self.queue.clone(), interval);
                state.repeat = RepeatMode::Dynamic;
            } else {
                scheduler.disarm();
                state.repeat = RepeatMode::None;
            }
            before
        };

        debug!(
            "[{}] dynamic repeat {} ({:?})",
            self.guild_id,
            if enabled { "enabled" } else { "disabled" },
            interval
        );
        self.emit_state_update(before);
        Ok(())
    }

    fn set_repeat(&self, mode: RepeatMode) -> SessionResult<()> {
        let before = {
            let mut state = self.state.lock();
            ensure_alive(&state)?;
            let before = self.snapshot_of(&state, &self.queue.lock());
            self.scheduler.lock().disarm();
            state.repeat = mode;
            before
        };

        debug!("[{}] repeat mode set to {:?}", self.guild_id, mode);
        self.emit_state_update(before);
        Ok(())
    }

    /// Flips the pause flags when they change and something is queued.
    /// Returns whether anything happened.
    fn apply_pause(&self, paused: bool) -> bool {
        let before = {
            let mut state = self.state.lock();
            let queue = self.queue.lock();
            if state.paused == paused || queue.total_size() == 0 {
                return false;
            }
            let before = self.snapshot_of(&state, &queue);
            drop(queue);
            state.playing = !paused;
            state.paused = paused;
            before
        };

        self.dispatcher.send(PlayerUpdate::pause(paused));
        self.emit_state_update(before);
        true
    }

    fn leave_voice(&self) {
        {
            let mut state = self.state.lock();
            if state.voice_channel.is_none() {
                return;
            }
            set_connection(&mut state, ConnectionState::Disconnecting);
        }

        self.apply_pause(true);
        self.voice
            .send_voice_state(&self.guild_id, VoiceStateFrame::leave());

        let mut state = self.state.lock();
        state.voice_channel = None;
        set_connection(&mut state, ConnectionState::Disconnected);
        debug!("[{}] left voice", self.guild_id);
    }

    fn snapshot_of(&self, state: &SessionState, queue: &Queue) -> SessionSnapshot {
        SessionSnapshot {
            guild_id: self.guild_id.clone(),
            node: self.node.identifier().to_string(),
            state: state.connection,
            voice_channel: state.voice_channel.clone(),
            text_channel: state.text_channel.clone(),
            playing: state.playing,
            paused: state.paused,
            position: state.position,
            volume: state.volume,
            repeat: state.repeat,
            current: queue.current.clone(),
            queue_size: queue.size(),
            time: now_ms(),
        }
    }

    fn emit_state_update(&self, before: SessionSnapshot) {
        let after = self.snapshot();
        let changes = before.diff(&after);
        self.events.emit(SessionEvent::StateUpdated {
            before,
            after,
            changes,
        });
    }
}

impl std::fmt::Debug for Session {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Session")
            .field("guild_id", &self.guild_id)
            .field("node", &self.node.identifier())
            .field("state", &self.connection_state())
            .finish_non_exhaustive()
    }
}

fn ensure_alive(state: &SessionState) -> SessionResult<()> {
    if state.connection == ConnectionState::Destroying {
        return Err(SessionError::state("The session has been destroyed."));
    }
    Ok(())
}

/// `Destroying` is terminal.
fn set_connection(state: &mut SessionState, connection: ConnectionState) {
    if state.connection != ConnectionState::Destroying {
        state.connection = connection;
    }
}
