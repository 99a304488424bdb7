use serde::{Deserialize, Serialize};

use crate::common::Severity;

/// A playable track as returned by the node.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Track {
    /// Base64-encoded track data, the identity sent back to the node.
    pub encoded: String,
    pub info: TrackInfo,
    #[serde(default = "default_json_object")]
    pub plugin_info: serde_json::Value,
    #[serde(default = "default_json_object")]
    pub user_data: serde_json::Value,
    /// Who queued the track. Never sent to the node.
    #[serde(default, skip_serializing)]
    pub requester: Option<String>,
}

fn default_json_object() -> serde_json::Value {
    serde_json::json!({})
}

impl Track {
    pub fn new(encoded: impl Into<String>, info: TrackInfo) -> Self {
        Self {
            encoded: encoded.into(),
            info,
            plugin_info: default_json_object(),
            user_data: default_json_object(),
            requester: None,
        }
    }

    pub fn with_requester(mut self, requester: impl Into<String>) -> Self {
        self.requester = Some(requester.into());
        self
    }

    /// Duration in milliseconds. 0 for live streams.
    pub fn duration(&self) -> u64 {
        self.info.length
    }
}

/// Metadata for an audio track.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Default)]
#[serde(rename_all = "camelCase")]
pub struct TrackInfo {
    pub identifier: String,
    pub is_seekable: bool,
    pub author: String,
    /// Duration in milliseconds. 0 for live streams.
    pub length: u64,
    pub is_stream: bool,
    pub position: u64,
    pub title: String,
    pub uri: Option<String>,
    pub artwork_url: Option<String>,
    pub isrc: Option<String>,
    pub source_name: String,
}

/// A placeholder that must be searched for before the node can play it.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UnresolvedTrack {
    pub title: String,
    pub author: Option<String>,
    /// Expected duration in milliseconds, used to pick the closest match.
    pub duration: Option<u64>,
    pub requester: Option<String>,
}

impl UnresolvedTrack {
    pub fn new(title: impl Into<String>) -> Self {
        Self {
            title: title.into(),
            ..Default::default()
        }
    }

    pub fn with_author(mut self, author: impl Into<String>) -> Self {
        self.author = Some(author.into());
        self
    }

    pub fn with_duration(mut self, duration: u64) -> Self {
        self.duration = Some(duration);
        self
    }

    /// Search text: `author - title`, or the bare title.
    pub fn query(&self) -> String {
        match self.author.as_deref().filter(|a| !a.is_empty()) {
            Some(author) => format!("{} - {}", author, self.title),
            None => self.title.clone(),
        }
    }
}

/// What a queue slot holds.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "kind", content = "track", rename_all = "camelCase")]
pub enum TrackEntry {
    Resolved(Track),
    Unresolved(UnresolvedTrack),
}

impl TrackEntry {
    /// A resolved track needs an encoded identity, a placeholder needs a title.
    pub fn is_valid(&self) -> bool {
        match self {
            Self::Resolved(track) => !track.encoded.is_empty(),
            Self::Unresolved(track) => !track.title.trim().is_empty(),
        }
    }

    pub fn is_unresolved(&self) -> bool {
        matches!(self, Self::Unresolved(_))
    }

    pub fn as_resolved(&self) -> Option<&Track> {
        match self {
            Self::Resolved(track) => Some(track),
            Self::Unresolved(_) => None,
        }
    }

    pub fn encoded(&self) -> Option<&str> {
        self.as_resolved().map(|t| t.encoded.as_str())
    }

    /// Duration in milliseconds; placeholders without a hint count as 0.
    pub fn duration(&self) -> u64 {
        match self {
            Self::Resolved(track) => track.duration(),
            Self::Unresolved(track) => track.duration.unwrap_or(0),
        }
    }

    pub fn title(&self) -> &str {
        match self {
            Self::Resolved(track) => &track.info.title,
            Self::Unresolved(track) => &track.title,
        }
    }
}

impl From<Track> for TrackEntry {
    fn from(track: Track) -> Self {
        Self::Resolved(track)
    }
}

impl From<UnresolvedTrack> for TrackEntry {
    fn from(track: UnresolvedTrack) -> Self {
        Self::Unresolved(track)
    }
}

/// Response of `GET /v4/loadtracks`.
#[derive(Debug, Deserialize)]
#[serde(tag = "loadType", content = "data", rename_all = "camelCase")]
pub enum LoadResult {
    Track(Track),
    Playlist(PlaylistData),
    Search(Vec<Track>),
    Empty {},
    Error(LoadError),
}

impl LoadResult {
    /// Flattens every variant into its candidate tracks.
    pub fn into_tracks(self) -> Vec<Track> {
        match self {
            Self::Track(track) => vec![track],
            Self::Playlist(playlist) => playlist.tracks,
            Self::Search(tracks) => tracks,
            Self::Empty {} | Self::Error(_) => Vec::new(),
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PlaylistData {
    pub info: PlaylistInfo,
    #[serde(default = "default_json_object")]
    pub plugin_info: serde_json::Value,
    pub tracks: Vec<Track>,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PlaylistInfo {
    pub name: String,
    /// Index of the selected track, or -1 if none.
    pub selected_track: i32,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LoadError {
    pub message: Option<String>,
    pub severity: Severity,
    pub cause: String,
}
