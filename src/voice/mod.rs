use tracing::debug;

use crate::{common::types::GuildId, protocol::VoiceStateFrame};

/// Sends voice state updates to Discord on a session's behalf.
///
/// Fire-and-forget: sessions never wait for the gateway to acknowledge.
pub trait VoiceSignaler: Send + Sync {
    fn send_voice_state(&self, guild_id: &GuildId, frame: VoiceStateFrame);
}

/// Hands frames to whichever shard loop owns the receiving end.
impl VoiceSignaler for flume::Sender<(GuildId, VoiceStateFrame)> {
    fn send_voice_state(&self, guild_id: &GuildId, frame: VoiceStateFrame) {
        if self.send((guild_id.clone(), frame)).is_err() {
            debug!("[{}] voice state receiver dropped", guild_id);
        }
    }
}

/// Renders frames as op 4 gateway payloads for a raw websocket writer.
impl VoiceSignaler for flume::Sender<serde_json::Value> {
    fn send_voice_state(&self, guild_id: &GuildId, frame: VoiceStateFrame) {
        if self.send(frame.to_gateway_payload(guild_id)).is_err() {
            debug!("[{}] gateway payload receiver dropped", guild_id);
        }
    }
}
