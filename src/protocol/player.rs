use serde::{Deserialize, Serialize};

/// Track identity in an update. `Clear` serializes to `null`, which stops playback.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(untagged)]
pub enum TrackEncoded {
    Clear,
    Set(String),
}

/// Body of `PATCH /v4/sessions/{sessionId}/players/{guildId}`.
///
/// Unset fields are omitted so the node keeps its current value for them.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PlayerUpdate {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub encoded_track: Option<TrackEncoded>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub position: Option<u64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub paused: Option<bool>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub volume: Option<i32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub start_time: Option<u64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub end_time: Option<u64>,
}

impl PlayerUpdate {
    pub fn play(encoded: impl Into<String>, options: &PlayOptions) -> Self {
        Self {
            encoded_track: Some(TrackEncoded::Set(encoded.into())),
            start_time: options.start_time,
            end_time: options.end_time,
            ..Default::default()
        }
    }

    pub fn stop() -> Self {
        Self {
            encoded_track: Some(TrackEncoded::Clear),
            ..Default::default()
        }
    }

    pub fn seek(position: u64) -> Self {
        Self {
            position: Some(position),
            ..Default::default()
        }
    }

    pub fn restart(encoded: impl Into<String>) -> Self {
        Self {
            encoded_track: Some(TrackEncoded::Set(encoded.into())),
            position: Some(0),
            ..Default::default()
        }
    }

    pub fn pause(paused: bool) -> Self {
        Self {
            paused: Some(paused),
            ..Default::default()
        }
    }

    /// Nodes take whole percentages, so the volume is rounded.
    pub fn volume(volume: f64) -> Self {
        Self {
            volume: Some(volume.round() as i32),
            ..Default::default()
        }
    }
}

/// Optional knobs for `play`.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PlayOptions {
    /// Where to start, in milliseconds.
    pub start_time: Option<u64>,
    /// Where to stop, in milliseconds.
    pub end_time: Option<u64>,
    /// Leave an already playing track alone.
    pub no_replace: Option<bool>,
}

impl PlayOptions {
    pub fn no_replace(&self) -> bool {
        self.no_replace.unwrap_or(false)
    }
}
