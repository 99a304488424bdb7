use crate::protocol::{Track, UnresolvedTrack};

/// Accepted duration drift when matching by length, in milliseconds.
const DURATION_TOLERANCE_MS: u64 = 1500;

/// Picks the search result that best matches a placeholder.
///
/// An author or title match wins, then a result of about the same length,
/// then whatever the node ranked first. The placeholder's requester is carried over.
pub fn closest_track(wanted: &UnresolvedTrack, candidates: Vec<Track>) -> Option<Track> {
    let by_name = candidates.iter().position(|track| {
        // official uploads live on "<artist> - Topic" channels
        let author_matches = wanted.author.as_deref().is_some_and(|author| {
            let names = [author.to_string(), format!("{author} - Topic")];
            names
                .iter()
                .any(|name| name.eq_ignore_ascii_case(&track.info.author))
        });
        author_matches || wanted.title.eq_ignore_ascii_case(&track.info.title)
    });

    let index = by_name
        .or_else(|| {
            let duration = wanted.duration?;
            candidates
                .iter()
                .position(|track| track.duration().abs_diff(duration) <= DURATION_TOLERANCE_MS)
        })
        .unwrap_or(0);

    let mut track = candidates.into_iter().nth(index)?;
    if track.requester.is_none() {
        track.requester = wanted.requester.clone();
    }
    Some(track)
}
