use std::collections::HashMap;

use serde::Serialize;

use crate::{
    common::types::{ChannelId, GuildId},
    protocol::TrackEntry,
};

/// Voice connection lifecycle. `Destroying` is terminal.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ConnectionState {
    Disconnected,
    Connecting,
    Connected,
    Disconnecting,
    Destroying,
}

/// Exactly one repeat behaviour is active at a time.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize)]
#[serde(rename_all = "camelCase")]
pub enum RepeatMode {
    #[default]
    None,
    /// Replay the current track.
    Track,
    /// Re-append finished tracks to the queue.
    Queue,
    /// Like `Queue`, with the pending list reshuffled on a timer.
    Dynamic,
}

/// Mutable part of a session, guarded by the session's lock.
#[derive(Debug)]
pub(crate) struct SessionState {
    pub connection: ConnectionState,
    pub voice_channel: Option<ChannelId>,
    pub text_channel: Option<ChannelId>,
    pub now_playing: Option<String>,
    pub playing: bool,
    pub paused: bool,
    /// Milliseconds into the current track.
    pub position: u64,
    pub volume: f64,
    pub repeat: RepeatMode,
    pub self_mute: bool,
    pub self_deafen: bool,
    pub data: HashMap<String, serde_json::Value>,
}

impl SessionState {
    pub fn new(volume: f64, self_mute: bool, self_deafen: bool) -> Self {
        Self {
            connection: ConnectionState::Disconnected,
            voice_channel: None,
            text_channel: None,
            now_playing: None,
            playing: false,
            paused: false,
            position: 0,
            volume,
            repeat: RepeatMode::None,
            self_mute,
            self_deafen,
            data: HashMap::new(),
        }
    }
}

/// Point-in-time copy of a session, as carried by events.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SessionSnapshot {
    pub guild_id: GuildId,
    pub node: String,
    pub state: ConnectionState,
    pub voice_channel: Option<ChannelId>,
    pub text_channel: Option<ChannelId>,
    pub playing: bool,
    pub paused: bool,
    pub position: u64,
    pub volume: f64,
    pub repeat: RepeatMode,
    pub current: Option<TrackEntry>,
    pub queue_size: usize,
    /// Unix timestamp in milliseconds.
    pub time: u64,
}

impl SessionSnapshot {
    pub fn track_repeat(&self) -> bool {
        self.repeat == RepeatMode::Track
    }

    pub fn queue_repeat(&self) -> bool {
        self.repeat == RepeatMode::Queue
    }

    pub fn dynamic_repeat(&self) -> bool {
        self.repeat == RepeatMode::Dynamic
    }

    /// Lists what differs between `self` (before) and `after`. `time` is ignored.
    pub fn diff(&self, after: &SessionSnapshot) -> Vec<StateChange> {
        let mut changes = Vec::new();

        if self.state != after.state {
            changes.push(StateChange::Connection {
                from: self.state,
                to: after.state,
            });
        }
        if self.voice_channel != after.voice_channel {
            changes.push(StateChange::VoiceChannel {
                from: self.voice_channel.clone(),
                to: after.voice_channel.clone(),
            });
        }
        if self.text_channel != after.text_channel {
            changes.push(StateChange::TextChannel {
                from: self.text_channel.clone(),
                to: after.text_channel.clone(),
            });
        }
        if self.playing != after.playing {
            changes.push(StateChange::Playing {
                from: self.playing,
                to: after.playing,
            });
        }
        if self.paused != after.paused {
            changes.push(StateChange::Paused {
                from: self.paused,
                to: after.paused,
            });
        }
        if self.position != after.position {
            changes.push(StateChange::Position {
                from: self.position,
                to: after.position,
            });
        }
        if self.volume != after.volume {
            changes.push(StateChange::Volume {
                from: self.volume,
                to: after.volume,
            });
        }
        if self.repeat != after.repeat {
            changes.push(StateChange::Repeat {
                from: self.repeat,
                to: after.repeat,
            });
        }
        if self.current != after.current {
            changes.push(StateChange::Track {
                from: self.current.as_ref().map(|t| t.title().to_string()),
                to: after.current.as_ref().map(|t| t.title().to_string()),
            });
        }
        if self.queue_size != after.queue_size {
            changes.push(StateChange::Queue {
                from: self.queue_size,
                to: after.queue_size,
            });
        }

        changes
    }
}

/// One field that changed between two snapshots.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "field", rename_all = "camelCase")]
pub enum StateChange {
    Connection {
        from: ConnectionState,
        to: ConnectionState,
    },
    VoiceChannel {
        from: Option<ChannelId>,
        to: Option<ChannelId>,
    },
    TextChannel {
        from: Option<ChannelId>,
        to: Option<ChannelId>,
    },
    Playing {
        from: bool,
        to: bool,
    },
    Paused {
        from: bool,
        to: bool,
    },
    Position {
        from: u64,
        to: u64,
    },
    Volume {
        from: f64,
        to: f64,
    },
    Repeat {
        from: RepeatMode,
        to: RepeatMode,
    },
    /// Titles of the current track.
    Track {
        from: Option<String>,
        to: Option<String>,
    },
    Queue {
        from: usize,
        to: usize,
    },
}
