use serde::Serialize;

use crate::{
    common::types::GuildId,
    protocol::tracks::TrackEntry,
    session::{SessionSnapshot, StateChange},
};

/// Notifications emitted by sessions, in the order their mutations happened.
#[derive(Debug, Clone, Serialize)]
#[serde(tag = "type")]
pub enum SessionEvent {
    #[serde(rename = "SessionCreatedEvent")]
    SessionCreated { session: SessionSnapshot },

    #[serde(rename = "SessionDestroyedEvent")]
    SessionDestroyed { session: SessionSnapshot },

    #[serde(rename = "StateUpdatedEvent")]
    StateUpdated {
        before: SessionSnapshot,
        after: SessionSnapshot,
        changes: Vec<StateChange>,
    },

    #[serde(rename = "TrackErrorEvent")]
    TrackError {
        #[serde(rename = "guildId")]
        guild_id: GuildId,
        track: TrackEntry,
        error: String,
    },
}

impl SessionEvent {
    pub fn guild_id(&self) -> &GuildId {
        match self {
            Self::SessionCreated { session } | Self::SessionDestroyed { session } => {
                &session.guild_id
            }
            Self::StateUpdated { after, .. } => &after.guild_id,
            Self::TrackError { guild_id, .. } => guild_id,
        }
    }

    pub fn name(&self) -> &'static str {
        match self {
            Self::SessionCreated { .. } => "sessionCreated",
            Self::SessionDestroyed { .. } => "sessionDestroyed",
            Self::StateUpdated { .. } => "stateUpdated",
            Self::TrackError { .. } => "trackError",
        }
    }
}
