//! Infinite radio: keeps the queue going once the current track ends.

use std::sync::Mutex;

use log::{info, warn};
use rand::Rng;

use crate::{
    catalog::RecommendationProvider,
    domain::{queue::PlaybackQueue, track::Track},
    storage::{error::StorageError, lock, operations::Storage},
};

pub mod selector;

pub use selector::{SelectionPolicy, Tier, select_next};

/// What happened to the queue after a track ended
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Advance {
    /// moved to a track that was already queued
    Queued(Track),
    /// a recommendation was appended and is now current
    Enqueued { track: Track, tier: Tier },
    /// nothing to play, the queue is unchanged
    Exhausted,
    /// the queue changed while recommendations were fetched, the result was dropped
    Stale,
}

/// Snapshot of the queue taken before the recommendations are fetched
#[derive(Debug, Clone)]
pub struct RadioRequest {
    pub finished: Track,
    history: Vec<Track>,
    revision: u64,
}

impl RadioRequest {
    /// `None` when nothing is playing
    pub fn from_queue(queue: &PlaybackQueue) -> Option<Self> {
        let finished = queue.current()?.clone();
        Some(Self {
            finished,
            history: queue.history().to_vec(),
            revision: queue.revision(),
        })
    }

    /// Applies the fetched candidates to the queue, unless it moved on meanwhile.
    pub fn apply<R: Rng + ?Sized>(
        self,
        queue: &mut PlaybackQueue,
        candidates: &[Track],
        policy: &SelectionPolicy,
        rng: &mut R,
    ) -> Advance {
        if queue.revision() != self.revision {
            info!(
                "Dropping recommendations for {}: queue changed (revision {} -> {})",
                self.finished.id,
                self.revision,
                queue.revision()
            );
            return Advance::Stale;
        }

        match policy.select(&self.history, &self.finished, candidates, rng) {
            Some(selection) => {
                info!(
                    "Playing next: {} - {} ({} of {} candidates, tier: {})",
                    selection.track.metadata.artist,
                    selection.track.metadata.title,
                    selection.track.id,
                    candidates.len(),
                    selection.tier
                );
                queue.push_and_advance(selection.track.clone());
                Advance::Enqueued {
                    track: selection.track,
                    tier: selection.tier,
                }
            }
            None => {
                info!("No recommendations left after {}", self.finished.id);
                Advance::Exhausted
            }
        }
    }
}

/// fetches recommendations, never fails: a provider error counts as no candidates
pub fn fetch_candidates<P: RecommendationProvider + ?Sized>(
    provider: &P,
    finished: &Track,
) -> Vec<Track> {
    info!("Fetching recommendations for {}", finished.id);
    match provider.recommendations(&finished.id) {
        Ok(candidates) => candidates,
        Err(e) => {
            warn!("Could not fetch recommendations for {}: {e}", finished.id);
            Vec::new()
        }
    }
}

/// Moves the queue past its current track.
///
/// Already queued tracks play first, then the radio takes over.
pub fn advance<P: RecommendationProvider + ?Sized, R: Rng + ?Sized>(
    queue: &mut PlaybackQueue,
    provider: &P,
    policy: &SelectionPolicy,
    rng: &mut R,
) -> Advance {
    if let Some(next) = queue.advance() {
        return Advance::Queued(next.clone());
    }
    let Some(request) = RadioRequest::from_queue(queue) else {
        return Advance::Exhausted;
    };
    let candidates = fetch_candidates(provider, &request.finished);
    request.apply(queue, &candidates, policy, rng)
}

/// [`advance`] on the queue kept in `storage`.
///
/// The storage is not locked while recommendations are fetched, the queue is
/// read again afterwards and the result is dropped if it changed meanwhile.
pub fn advance_stored<P: RecommendationProvider + ?Sized, R: Rng + ?Sized>(
    storage: &Mutex<Storage>,
    provider: &P,
    policy: &SelectionPolicy,
    rng: &mut R,
) -> Result<Advance, StorageError> {
    let request = {
        let mut storage = lock(storage)?;
        let mut queue = storage.load_queue()?;
        if let Some(next) = queue.advance().cloned() {
            storage.save_queue(&queue)?;
            return Ok(Advance::Queued(next));
        }
        match RadioRequest::from_queue(&queue) {
            Some(request) => request,
            None => return Ok(Advance::Exhausted),
        }
    };

    let candidates = fetch_candidates(provider, &request.finished);

    let mut storage = lock(storage)?;
    let mut queue = storage.load_queue()?;
    let advance = request.apply(&mut queue, &candidates, policy, rng);
    if matches!(advance, Advance::Enqueued { .. }) {
        storage.save_queue(&queue)?;
    }
    Ok(advance)
}
