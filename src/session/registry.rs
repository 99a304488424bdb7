use std::{sync::Arc, time::Duration};

use dashmap::{DashMap, mapref::entry::Entry};
use parking_lot::{Mutex, RwLock};
use tracing::{info, warn};

use super::{RepeatScheduler, Session, SessionOptions, state::SessionState};
use crate::{
    common::{SessionError, SessionResult, types::GuildId},
    configs::{Config, SessionDefaults},
    events::{EventBus, EventSink},
    node::{NodeDispatcher, RemoteNode, RestNode, TrackResolver},
    protocol::{PlayerUpdate, SessionEvent},
    queue::Queue,
    voice::VoiceSignaler,
};

pub(crate) type SessionMap = DashMap<GuildId, Arc<Session>>;

/// Owns every live session and the collaborators handed to new ones.
pub struct SessionRegistry {
    sessions: Arc<SessionMap>,
    nodes: RwLock<Vec<Arc<dyn RemoteNode>>>,
    voice: Arc<dyn VoiceSignaler>,
    events: Arc<EventBus>,
    resolver: RwLock<Option<Arc<dyn TrackResolver>>>,
    defaults: SessionDefaults,
}

impl SessionRegistry {
    pub fn new(voice: Arc<dyn VoiceSignaler>) -> Self {
        Self::with_defaults(voice, SessionDefaults::default())
    }

    pub fn with_defaults(voice: Arc<dyn VoiceSignaler>, defaults: SessionDefaults) -> Self {
        Self {
            sessions: Arc::new(DashMap::new()),
            nodes: RwLock::new(Vec::new()),
            voice,
            events: Arc::new(EventBus::new()),
            resolver: RwLock::new(None),
            defaults,
        }
    }

    /// Builds a registry with a REST node per configured node. The first node
    /// also resolves placeholder tracks.
    pub fn from_config(config: &Config, voice: Arc<dyn VoiceSignaler>) -> SessionResult<Self> {
        let registry = Self::with_defaults(voice, config.session.clone());
        for node_config in &config.nodes {
            let node = Arc::new(RestNode::new(node_config)?);
            if registry.resolver.read().is_none() {
                registry.set_resolver(node.clone());
            }
            registry.add_node(node);
        }
        Ok(registry)
    }

    pub fn add_node(&self, node: Arc<dyn RemoteNode>) {
        info!("Registered node {}", node.identifier());
        self.nodes.write().push(node);
    }

    /// Existing sessions keep the node they were created with.
    pub fn remove_node(&self, identifier: &str) -> Option<Arc<dyn RemoteNode>> {
        let mut nodes = self.nodes.write();
        let index = nodes.iter().position(|n| n.identifier() == identifier)?;
        Some(nodes.remove(index))
    }

    pub fn nodes(&self) -> Vec<Arc<dyn RemoteNode>> {
        self.nodes.read().clone()
    }

    pub fn set_resolver(&self, resolver: Arc<dyn TrackResolver>) {
        *self.resolver.write() = Some(resolver);
    }

    pub fn subscribe(&self) -> flume::Receiver<SessionEvent> {
        self.events.subscribe()
    }

    pub fn events(&self) -> &Arc<EventBus> {
        &self.events
    }

    pub fn defaults(&self) -> &SessionDefaults {
        &self.defaults
    }

    /// Returns the session for `options.guild_id`, creating it on first use.
    ///
    /// A new session announces itself with [`SessionEvent::SessionCreated`] and
    /// pushes its initial volume to the node. Must be called inside a tokio
    /// runtime.
    pub fn get_or_create(&self, options: SessionOptions) -> SessionResult<Arc<Session>> {
        options.validate()?;
        if let Some(session) = self.get(&options.guild_id) {
            return Ok(session);
        }

        let node = self.pick_node(options.node.as_deref())?;
        let (session, created) = match self.sessions.entry(options.guild_id.clone()) {
            Entry::Occupied(entry) => (entry.get().clone(), false),
            Entry::Vacant(entry) => {
                let session = Arc::new(self.build(&options, node));
                entry.insert(session.clone());
                (session, true)
            }
        };

        if created {
            self.events.emit(SessionEvent::SessionCreated {
                session: session.snapshot(),
            });
            session
                .dispatcher
                .send(PlayerUpdate::volume(session.volume()));
            info!(
                "[{}] session created on node {}",
                session.guild_id,
                session.node.identifier()
            );
        }
        Ok(session)
    }

    pub fn get(&self, guild_id: &GuildId) -> Option<Arc<Session>> {
        self.sessions.get(guild_id).map(|s| s.value().clone())
    }

    /// Drops the session from the registry without tearing it down.
    pub fn remove(&self, guild_id: &GuildId) -> Option<Arc<Session>> {
        self.sessions.remove(guild_id).map(|(_, s)| s)
    }

    /// Destroys and removes the session. Returns whether one existed.
    pub fn destroy(&self, guild_id: &GuildId) -> bool {
        let Some(session) = self.get(guild_id) else {
            return false;
        };
        if let Err(e) = session.destroy(true) {
            warn!("[{}] destroy failed: {}", guild_id, e);
        }
        true
    }

    pub fn len(&self) -> usize {
        self.sessions.len()
    }

    pub fn is_empty(&self) -> bool {
        self.sessions.is_empty()
    }

    pub fn guild_ids(&self) -> Vec<GuildId> {
        self.sessions.iter().map(|s| s.key().clone()).collect()
    }

    fn pick_node(&self, preferred: Option<&str>) -> SessionResult<Arc<dyn RemoteNode>> {
        let nodes = self.nodes.read();
        preferred
            .and_then(|id| nodes.iter().find(|n| n.identifier() == id))
            .or_else(|| nodes.first())
            .cloned()
            .ok_or_else(|| SessionError::configuration("No available nodes."))
    }

    fn build(&self, options: &SessionOptions, node: Arc<dyn RemoteNode>) -> Session {
        let mut state = SessionState::new(
            options.volume.unwrap_or(self.defaults.volume),
            options.self_mute.unwrap_or(self.defaults.self_mute),
            options.self_deafen.unwrap_or(self.defaults.self_deafen),
        );
        state.voice_channel = options.voice_channel.clone();
        state.text_channel = options.text_channel.clone();

        let events: Arc<dyn EventSink> = self.events.clone();
        Session {
            guild_id: options.guild_id.clone(),
            dispatcher: NodeDispatcher::spawn(options.guild_id.clone(), node.clone()),
            node,
            voice: self.voice.clone(),
            events,
            resolver: self.resolver.read().clone(),
            queue: Queue::shared(),
            state: Mutex::new(state),
            scheduler: Mutex::new(RepeatScheduler::default()),
            repeat_interval: Duration::from_millis(self.defaults.dynamic_repeat_interval_ms),
            registry: Arc::downgrade(&self.sessions),
        }
    }
}
