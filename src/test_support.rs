//! Recording collaborators shared by unit tests.

use std::{
    collections::HashMap,
    sync::{
        Arc,
        atomic::{AtomicBool, Ordering},
    },
};

use async_trait::async_trait;
use parking_lot::Mutex;

use crate::{
    common::{NodeError, ResolveError, types::GuildId},
    node::{RemoteNode, TrackResolver},
    protocol::{PlayerUpdate, Track, TrackEntry, TrackInfo, UnresolvedTrack, VoiceStateFrame},
    session::SessionRegistry,
    voice::VoiceSignaler,
};

#[derive(Debug, Clone, PartialEq)]
pub enum NodeCall {
    Update(GuildId, PlayerUpdate, bool),
    Destroy(GuildId),
}

pub struct RecordingNode {
    identifier: String,
    calls: Mutex<Vec<NodeCall>>,
    fail: AtomicBool,
}

impl RecordingNode {
    pub fn new(identifier: &str) -> Self {
        Self {
            identifier: identifier.to_string(),
            calls: Mutex::new(Vec::new()),
            fail: AtomicBool::new(false),
        }
    }

    pub fn fail_updates(&self, fail: bool) {
        self.fail.store(fail, Ordering::SeqCst);
    }

    pub fn calls(&self) -> Vec<NodeCall> {
        self.calls.lock().clone()
    }

    pub fn updates(&self) -> Vec<PlayerUpdate> {
        self.calls
            .lock()
            .iter()
            .filter_map(|call| match call {
                NodeCall::Update(_, update, _) => Some(update.clone()),
                NodeCall::Destroy(_) => None,
            })
            .collect()
    }

    pub fn clear(&self) {
        self.calls.lock().clear();
    }
}

#[async_trait]
impl RemoteNode for RecordingNode {
    fn identifier(&self) -> &str {
        &self.identifier
    }

    async fn update_player(
        &self,
        guild_id: &GuildId,
        update: &PlayerUpdate,
        no_replace: bool,
    ) -> Result<(), NodeError> {
        self.calls
            .lock()
            .push(NodeCall::Update(guild_id.clone(), update.clone(), no_replace));
        if self.fail.load(Ordering::SeqCst) {
            return Err(NodeError::Rejected("recording node set to fail".into()));
        }
        Ok(())
    }

    async fn destroy_player(&self, guild_id: &GuildId) -> Result<(), NodeError> {
        self.calls.lock().push(NodeCall::Destroy(guild_id.clone()));
        Ok(())
    }
}

#[derive(Default)]
pub struct RecordingSignaler {
    frames: Mutex<Vec<(GuildId, VoiceStateFrame)>>,
}

impl RecordingSignaler {
    pub fn frames(&self) -> Vec<(GuildId, VoiceStateFrame)> {
        self.frames.lock().clone()
    }

    pub fn joins(&self) -> Vec<VoiceStateFrame> {
        self.frames
            .lock()
            .iter()
            .filter(|(_, f)| f.is_join())
            .map(|(_, f)| f.clone())
            .collect()
    }
}

impl VoiceSignaler for RecordingSignaler {
    fn send_voice_state(&self, guild_id: &GuildId, frame: VoiceStateFrame) {
        self.frames.lock().push((guild_id.clone(), frame));
    }
}

/// Resolves placeholders by title from a fixed table.
#[derive(Default)]
pub struct StaticResolver {
    tracks: HashMap<String, Track>,
}

impl StaticResolver {
    pub fn with(mut self, title: &str, track: Track) -> Self {
        self.tracks.insert(title.to_string(), track);
        self
    }
}

#[async_trait]
impl TrackResolver for StaticResolver {
    async fn search(&self, query: &str) -> Result<Vec<Track>, ResolveError> {
        let mut found: Vec<Track> = self
            .tracks
            .iter()
            .filter(|(title, _)| title.contains(query))
            .map(|(_, track)| track.clone())
            .collect();
        found.sort_by(|a, b| a.info.title.cmp(&b.info.title));
        Ok(found)
    }

    async fn resolve(&self, track: &UnresolvedTrack) -> Result<Track, ResolveError> {
        self.tracks
            .get(&track.title)
            .cloned()
            .ok_or_else(|| ResolveError::NoMatches(track.query()))
    }
}

pub fn track(title: &str, length: u64) -> Track {
    Track::new(
        format!("enc:{title}"),
        TrackInfo {
            identifier: title.to_string(),
            is_seekable: true,
            author: "Band".to_string(),
            length,
            title: title.to_string(),
            source_name: "http".to_string(),
            ..Default::default()
        },
    )
}

pub fn resolved(title: &str) -> TrackEntry {
    track(title, 180_000).into()
}

pub fn placeholder(title: &str) -> TrackEntry {
    UnresolvedTrack::new(title).with_duration(180_000).into()
}

pub struct Harness {
    pub registry: SessionRegistry,
    pub node: Arc<RecordingNode>,
    pub voice: Arc<RecordingSignaler>,
}

pub fn harness() -> Harness {
    let node = Arc::new(RecordingNode::new("main"));
    let voice = Arc::new(RecordingSignaler::default());
    let registry = SessionRegistry::new(voice.clone());
    registry.add_node(node.clone());
    Harness {
        registry,
        node,
        voice,
    }
}
