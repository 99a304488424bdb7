use std::time::Duration;

use async_trait::async_trait;
use parking_lot::RwLock;
use reqwest::{Client, Response};
use tracing::debug;

use super::{RemoteNode, TrackResolver, resolve::closest_track};
use crate::{
    common::{NodeError, NodeErrorBody, ResolveError, types::GuildId},
    configs::NodeConfig,
    protocol::{LoadResult, PlayerUpdate, Track, UnresolvedTrack, tracks::LoadError},
};

const CLIENT_NAME: &str = concat!("rustalink-client/", env!("CARGO_PKG_VERSION"));

/// Lavalink v4 REST transport for a single node.
pub struct RestNode {
    identifier: String,
    base_url: String,
    password: String,
    search_prefix: String,
    session_id: RwLock<Option<String>>,
    client: Client,
}

impl RestNode {
    pub fn new(config: &NodeConfig) -> Result<Self, NodeError> {
        let client = Client::builder()
            .user_agent(CLIENT_NAME)
            .timeout(Duration::from_millis(config.request_timeout_ms))
            .build()?;

        Ok(Self {
            identifier: config.identifier.clone(),
            base_url: config.base_url(),
            password: config.password.clone(),
            search_prefix: config.search_prefix.clone(),
            session_id: RwLock::new(config.session_id.clone()),
            client,
        })
    }

    /// Stores the session id announced by the node's `ready` op.
    pub fn set_session_id(&self, session_id: impl Into<String>) {
        *self.session_id.write() = Some(session_id.into());
    }

    pub fn session_id(&self) -> Option<String> {
        self.session_id.read().clone()
    }

    fn player_url(&self, guild_id: &GuildId) -> Result<String, NodeError> {
        let session_id = self
            .session_id()
            .ok_or_else(|| NodeError::Rejected("node session id is not known yet".into()))?;
        Ok(format!(
            "{}/v4/sessions/{}/players/{}",
            self.base_url, session_id, guild_id
        ))
    }

    fn load_tracks_url(&self, identifier: &str) -> String {
        format!(
            "{}/v4/loadtracks?identifier={}",
            self.base_url,
            urlencoding::encode(identifier)
        )
    }

    /// URLs go to the node untouched, anything else is searched with the
    /// configured prefix.
    fn search_identifier(&self, query: &str) -> String {
        if query.starts_with("http://") || query.starts_with("https://") {
            query.to_string()
        } else {
            format!("{}:{}", self.search_prefix, query)
        }
    }

    pub async fn load_tracks(&self, identifier: &str) -> Result<LoadResult, NodeError> {
        let response = self
            .client
            .get(self.load_tracks_url(identifier))
            .header("Authorization", &self.password)
            .send()
            .await?;
        let response = check_status(response).await?;
        Ok(response.json::<LoadResult>().await?)
    }
}

async fn check_status(response: Response) -> Result<Response, NodeError> {
    let status = response.status();
    if status.is_success() {
        return Ok(response);
    }

    let text = response.text().await.unwrap_or_default();
    Err(match serde_json::from_str::<NodeErrorBody>(&text) {
        Ok(body) => body.into(),
        Err(_) => NodeError::Status {
            status: status.as_u16(),
            message: text,
        },
    })
}

#[async_trait]
impl RemoteNode for RestNode {
    fn identifier(&self) -> &str {
        &self.identifier
    }

    async fn update_player(
        &self,
        guild_id: &GuildId,
        update: &PlayerUpdate,
        no_replace: bool,
    ) -> Result<(), NodeError> {
        let url = self.player_url(guild_id)?;
        debug!("PATCH {} noReplace={} {:?}", url, no_replace, update);

        let response = self
            .client
            .patch(url)
            .query(&[("noReplace", no_replace)])
            .header("Authorization", &self.password)
            .json(update)
            .send()
            .await?;
        check_status(response).await?;
        Ok(())
    }

    async fn destroy_player(&self, guild_id: &GuildId) -> Result<(), NodeError> {
        let url = self.player_url(guild_id)?;
        debug!("DELETE {}", url);

        let response = self
            .client
            .delete(url)
            .header("Authorization", &self.password)
            .send()
            .await?;
        check_status(response).await?;
        Ok(())
    }
}

#[async_trait]
impl TrackResolver for RestNode {
    async fn search(&self, query: &str) -> Result<Vec<Track>, ResolveError> {
        match self.load_tracks(&self.search_identifier(query)).await? {
            LoadResult::Error(LoadError {
                message,
                severity,
                cause,
            }) => Err(ResolveError::LoadFailed {
                severity,
                message: message.unwrap_or(cause),
            }),
            result => Ok(result.into_tracks()),
        }
    }

    async fn resolve(&self, track: &UnresolvedTrack) -> Result<Track, ResolveError> {
        let query = track.query();
        let tracks = self.search(&query).await?;
        closest_track(track, tracks).ok_or(ResolveError::NoMatches(query))
    }
}
