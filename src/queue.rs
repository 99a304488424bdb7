//! In-memory track queue with `current` and `previous` slots.
//!
//! Size convention: [`Queue::size`] counts pending entries only, while
//! [`Queue::total_size`] also counts the current track.

use std::collections::VecDeque;

use crate::{common::types::Shared, protocol::tracks::TrackEntry};

pub type SharedQueue = Shared<Queue>;

#[derive(Debug, Clone, Default)]
pub struct Queue {
    pub current: Option<TrackEntry>,
    pub previous: Option<TrackEntry>,
    tracks: VecDeque<TrackEntry>,
}

impl Queue {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn shared() -> SharedQueue {
        std::sync::Arc::new(parking_lot::Mutex::new(Self::new()))
    }

    /// Appends to the end of the pending list.
    pub fn add(&mut self, track: impl Into<TrackEntry>) {
        self.tracks.push_back(track.into());
    }

    pub fn add_many<I, T>(&mut self, tracks: I)
    where
        I: IntoIterator<Item = T>,
        T: Into<TrackEntry>,
    {
        self.tracks.extend(tracks.into_iter().map(Into::into));
    }

    pub fn insert_front(&mut self, track: impl Into<TrackEntry>) {
        self.tracks.push_front(track.into());
    }

    /// Removes the pending list. `current` and `previous` are kept.
    pub fn clear(&mut self) {
        self.tracks.clear();
    }

    /// Removes up to `count` pending entries starting at `start`, returning them.
    pub fn remove_range(&mut self, start: usize, count: usize) -> Vec<TrackEntry> {
        if start >= self.tracks.len() {
            return Vec::new();
        }
        let end = start.saturating_add(count).min(self.tracks.len());
        self.tracks.drain(start..end).collect()
    }

    pub fn take_front(&mut self) -> Option<TrackEntry> {
        self.tracks.pop_front()
    }

    pub fn front(&self) -> Option<&TrackEntry> {
        self.tracks.front()
    }

    /// Pending entries, current excluded.
    pub fn size(&self) -> usize {
        self.tracks.len()
    }

    /// Pending entries plus the current track.
    pub fn total_size(&self) -> usize {
        self.tracks.len() + usize::from(self.current.is_some())
    }

    pub fn is_empty(&self) -> bool {
        self.tracks.is_empty()
    }

    pub fn pending(&self) -> impl Iterator<Item = &TrackEntry> {
        self.tracks.iter()
    }

    /// Summed duration of current and pending entries in milliseconds.
    pub fn duration(&self) -> u64 {
        self.current
            .iter()
            .chain(self.tracks.iter())
            .map(TrackEntry::duration)
            .sum()
    }

    /// Makes `track` current, moving the old current into `previous`.
    pub fn set_current(&mut self, track: TrackEntry) {
        if let Some(old) = self.current.replace(track) {
            self.previous = Some(old);
        }
    }
}
