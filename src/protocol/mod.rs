pub mod events;
pub mod player;
pub mod tracks;
pub mod voice;

pub use events::SessionEvent;
pub use player::{PlayOptions, PlayerUpdate, TrackEncoded};
pub use tracks::{LoadResult, Track, TrackEntry, TrackInfo, UnresolvedTrack};
pub use voice::VoiceStateFrame;
