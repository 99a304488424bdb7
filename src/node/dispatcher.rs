use std::sync::Arc;

use tokio::sync::oneshot;
use tracing::{debug, warn};

use super::RemoteNode;
use crate::{
    common::{NodeError, types::GuildId},
    protocol::PlayerUpdate,
};

pub(crate) enum NodeCommand {
    Update {
        update: PlayerUpdate,
        no_replace: bool,
        reply: Option<oneshot::Sender<Result<(), NodeError>>>,
    },
    Destroy,
    Flush(oneshot::Sender<()>),
}

/// Ordered command pipe from one session to its node.
///
/// Commands are executed one at a time by a single task, so the node sees them
/// in the order the session issued them even when callers do not wait.
#[derive(Clone)]
pub struct NodeDispatcher {
    guild_id: GuildId,
    tx: flume::Sender<NodeCommand>,
}

impl NodeDispatcher {
    /// Starts the worker task. Must be called inside a tokio runtime.
    pub fn spawn(guild_id: GuildId, node: Arc<dyn RemoteNode>) -> Self {
        let (tx, rx) = flume::unbounded();
        tokio::spawn(run(guild_id.clone(), node, rx));
        Self { guild_id, tx }
    }

    /// Queues an update without waiting for the node.
    pub fn send(&self, update: PlayerUpdate) {
        self.push(NodeCommand::Update {
            update,
            no_replace: false,
            reply: None,
        });
    }

    /// Queues an update and waits for the node's answer.
    pub async fn request(&self, update: PlayerUpdate, no_replace: bool) -> Result<(), NodeError> {
        let (reply, rx) = oneshot::channel();
        self.push(NodeCommand::Update {
            update,
            no_replace,
            reply: Some(reply),
        });
        rx.await.unwrap_or(Err(NodeError::Closed))
    }

    pub fn destroy(&self) {
        self.push(NodeCommand::Destroy);
    }

    /// Resolves once every command queued before it has been executed.
    pub async fn flush(&self) {
        let (done, rx) = oneshot::channel();
        self.push(NodeCommand::Flush(done));
        let _ = rx.await;
    }

    fn push(&self, command: NodeCommand) {
        if self.tx.send(command).is_err() {
            debug!("[{}] node dispatcher already stopped", self.guild_id);
        }
    }
}

async fn run(guild_id: GuildId, node: Arc<dyn RemoteNode>, rx: flume::Receiver<NodeCommand>) {
    while let Ok(command) = rx.recv_async().await {
        match command {
            NodeCommand::Update {
                update,
                no_replace,
                reply,
            } => {
                let result = node.update_player(&guild_id, &update, no_replace).await;
                match reply {
                    Some(reply) => {
                        let _ = reply.send(result);
                    }
                    None => {
                        if let Err(e) = result {
                            warn!(
                                "[{}] update on node {} failed: {}",
                                guild_id,
                                node.identifier(),
                                e
                            );
                        }
                    }
                }
            }
            NodeCommand::Destroy => {
                if let Err(e) = node.destroy_player(&guild_id).await {
                    warn!(
                        "[{}] destroy on node {} failed: {}",
                        guild_id,
                        node.identifier(),
                        e
                    );
                }
            }
            NodeCommand::Flush(done) => {
                let _ = done.send(());
            }
        }
    }
    debug!("[{}] node dispatcher stopped", guild_id);
}
