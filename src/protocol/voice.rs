use serde::Serialize;

use crate::common::types::{ChannelId, GuildId};

/// Discord gateway opcode for a voice state update.
pub const VOICE_STATE_UPDATE: u8 = 4;

/// A join (`channel_id` set) or leave (`channel_id` null) request.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct VoiceStateFrame {
    pub channel_id: Option<ChannelId>,
    pub self_mute: bool,
    #[serde(rename = "self_deaf")]
    pub self_deafen: bool,
}

impl VoiceStateFrame {
    pub fn join(channel_id: ChannelId, self_mute: bool, self_deafen: bool) -> Self {
        Self {
            channel_id: Some(channel_id),
            self_mute,
            self_deafen,
        }
    }

    pub fn leave() -> Self {
        Self {
            channel_id: None,
            self_mute: false,
            self_deafen: false,
        }
    }

    pub fn is_join(&self) -> bool {
        self.channel_id.is_some()
    }

    /// Renders the frame as the op 4 payload a Discord shard sends.
    pub fn to_gateway_payload(&self, guild_id: &GuildId) -> serde_json::Value {
        serde_json::json!({
            "op": VOICE_STATE_UPDATE,
            "d": {
                "guild_id": guild_id,
                "channel_id": self.channel_id,
                "self_mute": self.self_mute,
                "self_deaf": self.self_deafen,
            }
        })
    }
}
