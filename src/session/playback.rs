use tracing::{debug, warn};

use super::{Session, check_volume, ensure_alive};
use crate::{
    common::{ResolveError, SessionError, SessionResult},
    protocol::{PlayOptions, PlayerUpdate, SessionEvent, Track, TrackEntry, UnresolvedTrack},
};

/// First argument of [`Session::play`]: a track to make current, or options
/// for playing the current one.
#[derive(Debug, Clone)]
pub enum PlayArgument {
    Track(TrackEntry),
    Options(PlayOptions),
}

impl From<TrackEntry> for PlayArgument {
    fn from(track: TrackEntry) -> Self {
        Self::Track(track)
    }
}

impl From<Track> for PlayArgument {
    fn from(track: Track) -> Self {
        Self::Track(track.into())
    }
}

impl From<UnresolvedTrack> for PlayArgument {
    fn from(track: UnresolvedTrack) -> Self {
        Self::Track(track.into())
    }
}

impl From<PlayOptions> for PlayArgument {
    fn from(options: PlayOptions) -> Self {
        Self::Options(options)
    }
}

impl Session {
    /// Starts the current track on the node, making `argument` current first
    /// when it is a valid track.
    ///
    /// Placeholders are resolved before playing. A placeholder that fails to
    /// resolve emits [`SessionEvent::TrackError`] and the next pending track is
    /// tried instead; when nothing is left this returns `Ok` without playing.
    /// Explicit `options` win over options passed as the argument.
    pub async fn play(
        &self,
        argument: Option<PlayArgument>,
        options: Option<PlayOptions>,
    ) -> SessionResult<()> {
        let (track, argument_options) = match argument {
            Some(PlayArgument::Track(track)) => (Some(track), None),
            Some(PlayArgument::Options(options)) => (None, Some(options)),
            None => (None, None),
        };
        let mut options = options.or(argument_options).unwrap_or_default();

        let mut entry = {
            let state = self.state.lock();
            ensure_alive(&state)?;
            let mut queue = self.queue.lock();
            if let Some(track) = track.filter(TrackEntry::is_valid) {
                queue.set_current(track);
            }
            queue
                .current
                .clone()
                .ok_or_else(|| SessionError::state("No current track."))?
        };

        let track = loop {
            let placeholder = match entry {
                TrackEntry::Resolved(track) => break track,
                TrackEntry::Unresolved(placeholder) => placeholder,
            };

            match self.resolve(&placeholder).await {
                Ok(track) => {
                    let mut queue = self.queue.lock();
                    let still_current = matches!(
                        &queue.current,
                        Some(TrackEntry::Unresolved(current)) if *current == placeholder
                    );
                    if still_current {
                        queue.current = Some(track.clone().into());
                    }
                    break track;
                }
                Err(e) => {
                    warn!(
                        "[{}] failed to resolve '{}': {}",
                        self.guild_id,
                        placeholder.query(),
                        e
                    );
                    self.events.emit(SessionEvent::TrackError {
                        guild_id: self.guild_id.clone(),
                        track: placeholder.into(),
                        error: e.to_string(),
                    });

                    let next = {
                        let mut queue = self.queue.lock();
                        let next = queue.take_front();
                        if next.is_some() {
                            queue.current = next.clone();
                        }
                        next
                    };
                    match next {
                        Some(next) => {
                            entry = next;
                            options = PlayOptions::default();
                        }
                        None => return Ok(()),
                    }
                }
            }
        };

        let update = PlayerUpdate::play(track.encoded.as_str(), &options);
        self.dispatcher
            .request(update, options.no_replace())
            .await?;

        {
            let mut state = self.state.lock();
            state.position = 0;
            state.playing = true;
        }
        debug!("[{}] playing '{}'", self.guild_id, track.info.title);
        Ok(())
    }

    async fn resolve(&self, track: &UnresolvedTrack) -> Result<Track, ResolveError> {
        match &self.resolver {
            Some(resolver) => resolver.resolve(track).await,
            None => Err(ResolveError::NoResolver),
        }
    }

    /// Looks up tracks through the registry's resolver without touching the
    /// queue. Every result is tagged with `requester` when one is given.
    pub async fn search(
        &self,
        query: &str,
        requester: Option<&str>,
    ) -> Result<Vec<Track>, ResolveError> {
        let resolver = self.resolver.as_ref().ok_or(ResolveError::NoResolver)?;
        let tracks = resolver.search(query).await?;
        Ok(match requester {
            Some(requester) => tracks
                .into_iter()
                .map(|track| track.with_requester(requester))
                .collect(),
            None => tracks,
        })
    }

    /// Clears the node's track. With `skip > 1`, the `skip - 1` tracks after
    /// the current one are dropped as well.
    pub fn stop(&self, skip: Option<usize>) -> SessionResult<()> {
        {
            let state = self.state.lock();
            ensure_alive(&state)?;
            if let Some(skip) = skip.filter(|&s| s > 1) {
                let mut queue = self.queue.lock();
                if skip > queue.size() {
                    return Err(SessionError::range("Cannot skip more than the queue length."));
                }
                queue.remove_range(0, skip - 1);
            }
        }

        self.dispatcher.send(PlayerUpdate::stop());
        Ok(())
    }

    /// Returns whether the pause state changed. Nothing happens when the
    /// session is already in the requested state or nothing is queued.
    pub fn pause(&self, paused: bool) -> SessionResult<bool> {
        ensure_alive(&self.state.lock())?;
        Ok(self.apply_pause(paused))
    }

    /// Puts the previous track back in front of the queue and stops the current one.
    pub fn previous(&self) -> SessionResult<()> {
        {
            let state = self.state.lock();
            ensure_alive(&state)?;
            let mut queue = self.queue.lock();
            if let Some(previous) = queue.previous.take() {
                queue.insert_front(previous);
            }
        }
        self.stop(None)
    }

    /// Moves to `position` ms, clamped to the current track.
    ///
    /// Returns the stored position, or `None` when there is no current track.
    pub fn seek(&self, position: f64) -> SessionResult<Option<u64>> {
        let position = {
            let mut state = self.state.lock();
            ensure_alive(&state)?;
            let queue = self.queue.lock();
            let Some(current) = queue.current.as_ref() else {
                return Ok(None);
            };
            if position.is_nan() {
                return Err(SessionError::validation("Position must be a number."));
            }

            let position = position.clamp(0.0, current.duration() as f64) as u64;
            state.position = position;
            position
        };

        self.dispatcher.send(PlayerUpdate::seek(position));
        Ok(Some(position))
    }

    /// Replays the current track from the start without touching the pause flags.
    ///
    /// With nothing current, the next pending track is promoted and played.
    pub async fn restart(&self) -> SessionResult<()> {
        let encoded = {
            let mut state = self.state.lock();
            ensure_alive(&state)?;
            let mut queue = self.queue.lock();
            match queue.current.as_ref() {
                Some(TrackEntry::Resolved(track)) => {
                    state.position = 0;
                    Some(track.encoded.clone())
                }
                Some(TrackEntry::Unresolved(_)) => None,
                None => {
                    let Some(next) = queue.take_front() else {
                        return Ok(());
                    };
                    queue.current = Some(next);
                    None
                }
            }
        };

        match encoded {
            Some(encoded) => {
                self.dispatcher.send(PlayerUpdate::restart(encoded));
                Ok(())
            }
            None => self.play(None, None).await,
        }
    }

    /// Sends the volume to the node and keeps it locally whatever the node answers.
    pub fn set_volume(&self, volume: f64) -> SessionResult<()> {
        check_volume(volume)?;
        ensure_alive(&self.state.lock())?;

        self.dispatcher.send(PlayerUpdate::volume(volume));
        self.state.lock().volume = volume;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use super::*;
    use crate::{
        session::SessionOptions,
        test_support::{
            Harness, NodeCall, StaticResolver, harness, placeholder, resolved, track,
        },
    };

    async fn fresh(h: &Harness) -> Arc<Session> {
        let session = h.registry.get_or_create(SessionOptions::new("G1")).unwrap();
        session.flush().await;
        h.node.clear();
        session
    }

    fn pending(session: &Session) -> Vec<String> {
        session
            .queue()
            .lock()
            .pending()
            .map(|t| t.title().to_string())
            .collect()
    }

    fn current_title(session: &Session) -> Option<String> {
        session
            .queue()
            .lock()
            .current
            .as_ref()
            .map(|t| t.title().to_string())
    }

    #[tokio::test]
    async fn test_play_track_argument() {
        let h = harness();
        let session = fresh(&h).await;

        session.play(Some(resolved("first").into()), None).await.unwrap();
        session.play(Some(resolved("second").into()), None).await.unwrap();

        assert_eq!(current_title(&session).as_deref(), Some("second"));
        assert_eq!(
            session
                .queue()
                .lock()
                .previous
                .as_ref()
                .map(|t| t.title().to_string()),
            Some("first".into())
        );
        assert!(session.is_playing());
        assert_eq!(session.position(), 0);
        assert_eq!(
            h.node.updates(),
            vec![
                PlayerUpdate::play("enc:first", &PlayOptions::default()),
                PlayerUpdate::play("enc:second", &PlayOptions::default()),
            ]
        );
    }

    #[tokio::test]
    async fn test_play_without_track_fails() {
        let h = harness();
        let session = fresh(&h).await;

        let err = session.play(None, None).await.unwrap_err();
        assert!(matches!(err, SessionError::State(_)));

        // an invalid argument is ignored, leaving nothing to play
        let empty = Track::new("", Default::default());
        let err = session.play(Some(empty.into()), None).await.unwrap_err();
        assert!(matches!(err, SessionError::State(_)));
        assert!(h.node.calls().is_empty());
    }

    #[tokio::test]
    async fn test_play_leaves_pause_flag() {
        let h = harness();
        let session = fresh(&h).await;
        session.queue().lock().current = Some(resolved("a"));
        session.pause(true).unwrap();

        session.play(None, None).await.unwrap();
        assert!(session.is_playing());
        assert!(session.is_paused());
    }

    #[tokio::test]
    async fn test_play_options() {
        let h = harness();
        let session = fresh(&h).await;
        session.queue().lock().current = Some(resolved("a"));

        let from_argument = PlayOptions {
            start_time: Some(1000),
            ..Default::default()
        };
        session.play(Some(from_argument.into()), None).await.unwrap();

        let explicit = PlayOptions {
            end_time: Some(9000),
            no_replace: Some(true),
            ..Default::default()
        };
        session
            .play(Some(from_argument.into()), Some(explicit))
            .await
            .unwrap();

        assert_eq!(
            h.node.calls(),
            vec![
                NodeCall::Update("G1".into(), PlayerUpdate::play("enc:a", &from_argument), false),
                NodeCall::Update("G1".into(), PlayerUpdate::play("enc:a", &explicit), true),
            ]
        );
    }

    #[tokio::test]
    async fn test_search_tags_requester_and_leaves_queue() {
        let h = harness();
        let session = fresh(&h).await;
        assert!(matches!(
            session.search("song", None).await,
            Err(ResolveError::NoResolver)
        ));

        let h = harness();
        h.registry.set_resolver(Arc::new(
            StaticResolver::default()
                .with("song one", track("song one", 1000))
                .with("other", track("other", 1000)),
        ));
        let session = fresh(&h).await;

        let found = session.search("song", Some("user-1")).await.unwrap();
        assert_eq!(found.len(), 1);
        assert_eq!(found[0].info.title, "song one");
        assert_eq!(found[0].requester.as_deref(), Some("user-1"));
        assert_eq!(session.queue().lock().total_size(), 0);
        assert!(h.node.calls().is_empty());
    }

    #[tokio::test]
    async fn test_play_resolves_placeholder() {
        let h = harness();
        h.registry
            .set_resolver(Arc::new(StaticResolver::default().with("song", track("song", 1000))));
        let session = fresh(&h).await;

        session.play(Some(placeholder("song").into()), None).await.unwrap();

        let current = session.queue().lock().current.clone().unwrap();
        assert!(!current.is_unresolved());
        assert_eq!(current.encoded(), Some("enc:song"));
        assert_eq!(
            h.node.updates(),
            vec![PlayerUpdate::play("enc:song", &PlayOptions::default())]
        );
    }

    #[tokio::test]
    async fn test_failed_resolution_falls_back_to_next() {
        let h = harness();
        h.registry
            .set_resolver(Arc::new(StaticResolver::default().with("good", track("good", 1000))));
        let session = fresh(&h).await;
        session
            .queue()
            .lock()
            .add_many([placeholder("good"), placeholder("later")]);
        let events = h.registry.subscribe();

        session.play(Some(placeholder("missing").into()), None).await.unwrap();

        match events.try_recv().unwrap() {
            SessionEvent::TrackError { track, .. } => assert_eq!(track.title(), "missing"),
            other => panic!("unexpected event: {other:?}"),
        }
        assert_eq!(current_title(&session).as_deref(), Some("good"));
        assert_eq!(pending(&session), vec!["later"]);
        assert_eq!(
            h.node.updates(),
            vec![PlayerUpdate::play("enc:good", &PlayOptions::default())]
        );
    }

    #[tokio::test]
    async fn test_failed_resolution_without_next_is_ok() {
        let h = harness();
        let session = fresh(&h).await;
        let events = h.registry.subscribe();

        session.play(Some(placeholder("missing").into()), None).await.unwrap();

        assert_eq!(events.drain().map(|e| e.name()).collect::<Vec<_>>(), vec!["trackError"]);
        assert!(!session.is_playing());
        assert!(h.node.calls().is_empty());
    }

    #[tokio::test]
    async fn test_play_surfaces_node_failure() {
        let h = harness();
        let session = fresh(&h).await;
        h.node.fail_updates(true);

        let err = session.play(Some(resolved("a").into()), None).await.unwrap_err();
        assert!(matches!(err, SessionError::Node(_)));
        assert!(!session.is_playing());
    }

    #[tokio::test]
    async fn test_stop_past_queue_length_fails() {
        let h = harness();
        let session = fresh(&h).await;
        session
            .queue()
            .lock()
            .add_many([resolved("a"), resolved("b"), resolved("c")]);

        let err = session.stop(Some(5)).unwrap_err();
        assert!(matches!(err, SessionError::Range(_)));
        session.flush().await;
        assert_eq!(pending(&session), vec!["a", "b", "c"]);
        assert!(h.node.calls().is_empty());
    }

    #[tokio::test]
    async fn test_stop_skips_leading_tracks() {
        let h = harness();
        let session = fresh(&h).await;
        session
            .queue()
            .lock()
            .add_many([resolved("a"), resolved("b"), resolved("c")]);

        session.stop(Some(3)).unwrap();
        session.stop(None).unwrap();
        session.flush().await;

        assert_eq!(pending(&session), vec!["c"]);
        assert_eq!(h.node.updates(), vec![PlayerUpdate::stop(), PlayerUpdate::stop()]);
    }

    #[tokio::test]
    async fn test_pause_is_idempotent() {
        let h = harness();
        let session = fresh(&h).await;
        session.queue().lock().add(resolved("a"));
        let events = h.registry.subscribe();

        assert!(session.pause(true).unwrap());
        assert!(!session.pause(true).unwrap());
        session.flush().await;

        assert_eq!(events.drain().count(), 1);
        assert_eq!(h.node.updates(), vec![PlayerUpdate::pause(true)]);
        assert!(session.is_paused());
        assert!(!session.is_playing());

        assert!(session.pause(false).unwrap());
        assert!(session.is_playing());
    }

    #[tokio::test]
    async fn test_pause_with_empty_queue_does_nothing() {
        let h = harness();
        let session = fresh(&h).await;
        let events = h.registry.subscribe();
        let before = session.snapshot();

        assert!(!session.pause(true).unwrap());
        session.flush().await;

        assert!(events.is_empty());
        assert!(h.node.calls().is_empty());
        assert!(before.diff(&session.snapshot()).is_empty());
    }

    #[tokio::test]
    async fn test_seek_clamps_into_track() {
        let h = harness();
        let session = fresh(&h).await;

        assert_eq!(session.seek(10.0).unwrap(), None);

        session.queue().lock().current = Some(track("a", 5000).into());
        assert_eq!(session.seek(-50.0).unwrap(), Some(0));
        assert_eq!(session.seek(1e12).unwrap(), Some(5000));
        assert_eq!(session.seek(f64::INFINITY).unwrap(), Some(5000));
        assert_eq!(session.seek(2500.7).unwrap(), Some(2500));
        assert_eq!(session.position(), 2500);
        assert!(matches!(session.seek(f64::NAN), Err(SessionError::Validation(_))));
        assert_eq!(session.position(), 2500);

        session.flush().await;
        assert_eq!(
            h.node.updates(),
            vec![
                PlayerUpdate::seek(0),
                PlayerUpdate::seek(5000),
                PlayerUpdate::seek(5000),
                PlayerUpdate::seek(2500),
            ]
        );
    }

    #[tokio::test]
    async fn test_previous_requeues_and_stops() {
        let h = harness();
        let session = fresh(&h).await;
        session.play(Some(resolved("old").into()), None).await.unwrap();
        session.play(Some(resolved("new").into()), None).await.unwrap();
        session.queue().lock().add(resolved("next"));
        h.node.clear();

        session.previous().unwrap();
        session.flush().await;

        assert_eq!(pending(&session), vec!["old", "next"]);
        assert_eq!(h.node.updates(), vec![PlayerUpdate::stop()]);
    }

    #[tokio::test]
    async fn test_restart_current_track() {
        let h = harness();
        let session = fresh(&h).await;
        session.queue().lock().current = Some(track("a", 5000).into());
        session.pause(true).unwrap();
        session.seek(3000.0).unwrap();
        h.node.clear();

        session.restart().await.unwrap();
        session.flush().await;

        assert_eq!(h.node.updates(), vec![PlayerUpdate::restart("enc:a")]);
        assert_eq!(session.position(), 0);
        assert!(session.is_paused());
    }

    #[tokio::test]
    async fn test_restart_without_current_plays_next() {
        let h = harness();
        let session = fresh(&h).await;

        session.restart().await.unwrap();
        assert!(h.node.calls().is_empty());

        session.queue().lock().add_many([resolved("a"), resolved("b")]);
        session.restart().await.unwrap();

        assert_eq!(current_title(&session).as_deref(), Some("a"));
        assert_eq!(pending(&session), vec!["b"]);
        assert!(session.is_playing());
        assert_eq!(
            h.node.updates(),
            vec![PlayerUpdate::play("enc:a", &PlayOptions::default())]
        );
    }

    #[tokio::test]
    async fn test_set_volume() {
        let h = harness();
        let session = fresh(&h).await;

        assert!(matches!(session.set_volume(f64::NAN), Err(SessionError::Validation(_))));
        assert!(matches!(session.set_volume(-5.0), Err(SessionError::Range(_))));
        assert_eq!(session.volume(), 100.0);

        h.node.fail_updates(true);
        session.set_volume(42.4).unwrap();
        session.flush().await;

        assert_eq!(session.volume(), 42.4);
        let updates = h.node.updates();
        assert_eq!(updates.len(), 1);
        assert_eq!(updates[0].volume, Some(42));
    }
}
