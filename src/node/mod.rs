pub mod dispatcher;
pub mod resolve;
pub mod rest;

use async_trait::async_trait;

use crate::{
    common::{NodeError, ResolveError, types::GuildId},
    protocol::{PlayerUpdate, Track, UnresolvedTrack},
};

pub use dispatcher::NodeDispatcher;
pub use resolve::closest_track;
pub use rest::RestNode;

/// The remote node that decodes and streams audio for a guild.
#[async_trait]
pub trait RemoteNode: Send + Sync {
    fn identifier(&self) -> &str;

    async fn update_player(
        &self,
        guild_id: &GuildId,
        update: &PlayerUpdate,
        no_replace: bool,
    ) -> Result<(), NodeError>;

    async fn destroy_player(&self, guild_id: &GuildId) -> Result<(), NodeError>;
}

/// Looks tracks up on a node.
#[async_trait]
pub trait TrackResolver: Send + Sync {
    /// Candidates for a URL or free-text query.
    async fn search(&self, query: &str) -> Result<Vec<Track>, ResolveError>;

    /// Turns a placeholder into a playable track.
    async fn resolve(&self, track: &UnresolvedTrack) -> Result<Track, ResolveError>;
}
