//! Client-side player sessions for Rustalink and other Lavalink v4 nodes.
//!
//! A [`SessionRegistry`] hands out one [`Session`] per guild. Sessions keep
//! the authoritative local view of connection, queue, repeat and volume state
//! and forward playback commands to a [`RemoteNode`] in issue order.

pub mod common;
pub mod configs;
pub mod events;
pub mod node;
pub mod protocol;
pub mod queue;
pub mod session;
pub mod voice;

#[cfg(test)]
mod test_support;

pub use common::{ConfigError, NodeError, ResolveError, SessionError, SessionResult};
pub use configs::Config;
pub use events::{EventBus, EventSink};
pub use node::{RemoteNode, RestNode, TrackResolver};
pub use protocol::{PlayOptions, SessionEvent, Track, TrackEntry, UnresolvedTrack};
pub use queue::Queue;
pub use session::{
    ConnectionState, PlayArgument, RepeatMode, Session, SessionOptions, SessionRegistry,
    SessionSnapshot,
};
pub use voice::VoiceSignaler;
