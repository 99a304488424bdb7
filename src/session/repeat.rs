use std::time::Duration;

use rand::seq::SliceRandom;
use tokio::{
    task::JoinHandle,
    time::{Instant, MissedTickBehavior},
};
use tokio_util::sync::CancellationToken;
use tracing::{debug, trace};

use crate::{common::types::GuildId, queue::SharedQueue};

/// Timer that reshuffles a session's pending tracks while dynamic repeat is on.
#[derive(Debug, Default)]
pub enum RepeatScheduler {
    #[default]
    Disarmed,
    Armed(ArmedTimer),
}

/// A running timer. Dropping it cancels the token and aborts the task.
#[derive(Debug)]
pub struct ArmedTimer {
    token: CancellationToken,
    task: JoinHandle<()>,
    interval: Duration,
}

impl Drop for ArmedTimer {
    fn drop(&mut self) {
        self.token.cancel();
        self.task.abort();
    }
}

impl RepeatScheduler {
    /// Starts ticking every `interval`, replacing any running timer.
    /// Must be called inside a tokio runtime.
    pub fn arm(&mut self, guild_id: GuildId, queue: SharedQueue, interval: Duration) {
        self.disarm();

        let token = CancellationToken::new();
        let task = tokio::spawn(rotate_loop(guild_id, queue, token.clone(), interval));
        *self = Self::Armed(ArmedTimer {
            token,
            task,
            interval,
        });
    }

    /// Stops the timer. Returns whether one was running.
    pub fn disarm(&mut self) -> bool {
        matches!(std::mem::take(self), Self::Armed(_))
    }

    pub fn is_armed(&self) -> bool {
        matches!(self, Self::Armed(_))
    }

    pub fn interval(&self) -> Option<Duration> {
        match self {
            Self::Disarmed => None,
            Self::Armed(timer) => Some(timer.interval),
        }
    }
}

async fn rotate_loop(
    guild_id: GuildId,
    queue: SharedQueue,
    token: CancellationToken,
    interval: Duration,
) {
    let mut ticker = tokio::time::interval_at(Instant::now() + interval, interval);
    ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);

    loop {
        tokio::select! {
            _ = token.cancelled() => break,
            _ = ticker.tick() => {
                if !shuffle_pending(&queue, &token) {
                    break;
                }
                trace!("[{}] dynamic repeat reshuffled the queue", guild_id);
            }
        }
    }
    debug!("[{}] dynamic repeat timer stopped", guild_id);
}

/// Reorders the pending tracks uniformly at random.
///
/// The cancellation check happens under the queue lock, so a tick that loses
/// the race against `disarm` leaves the queue untouched.
pub(crate) fn shuffle_pending(queue: &SharedQueue, token: &CancellationToken) -> bool {
    let mut queue = queue.lock();
    if token.is_cancelled() {
        return false;
    }

    let size = queue.size();
    let mut tracks = queue.remove_range(0, size);
    tracks.shuffle(&mut rand::thread_rng());
    queue.clear();
    queue.add_many(tracks);
    true
}
