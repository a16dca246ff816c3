//! Picks the next radio track among the recommendations for the finished one.

use std::{collections::HashSet, fmt::Display};

use rand::Rng;

use crate::domain::{id::TrackId, track::Track};

pub const RECENT_WINDOW: usize = 10;
pub const POOL_SIZE: usize = 5;

/// Filter that produced the pool the next track was drawn from
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Tier {
    /// never played in this queue
    Novel,
    /// played, but not among the last `recent_window` tracks
    OutsideRecent,
    /// anything but the track that just finished
    NotFinished,
}

impl Display for Tier {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Tier::Novel => write!(f, "novel"),
            Tier::OutsideRecent => write!(f, "outside recent window"),
            Tier::NotFinished => write!(f, "not the finished track"),
        }
    }
}

#[derive(Debug, Clone)]
pub struct Selection {
    pub track: Track,
    pub tier: Tier,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SelectionPolicy {
    recent_window: usize,
    pool_size: usize,
}

impl Default for SelectionPolicy {
    fn default() -> Self {
        Self {
            recent_window: RECENT_WINDOW,
            pool_size: POOL_SIZE,
        }
    }
}

impl SelectionPolicy {
    /// Both sizes are at least 1, so the finished track is always in the recent window.
    pub fn new(recent_window: usize, pool_size: usize) -> Self {
        Self {
            recent_window: recent_window.max(1),
            pool_size: pool_size.max(1),
        }
    }

    pub fn recent_window(&self) -> usize {
        self.recent_window
    }

    pub fn pool_size(&self) -> usize {
        self.pool_size
    }

    /// Chooses the next track, or `None` when no candidate survives any tier.
    ///
    /// `history` is the play order of the queue ending with `finished`.
    /// The first non-empty tier wins, and the track is drawn uniformly from its
    /// first `pool_size` entries in the order the candidates were given.
    pub fn select<R: Rng + ?Sized>(
        &self,
        history: &[Track],
        finished: &Track,
        candidates: &[Track],
        rng: &mut R,
    ) -> Option<Selection> {
        let (tier, eligible) = self.winning_tier(history, finished, candidates)?;
        let pool = &eligible[..eligible.len().min(self.pool_size)];
        let track = pool[rng.random_range(0..pool.len())].clone();
        Some(Selection { track, tier })
    }

    fn winning_tier<'a>(
        &self,
        history: &[Track],
        finished: &Track,
        candidates: &'a [Track],
    ) -> Option<(Tier, Vec<&'a Track>)> {
        let keep = |excluded: &HashSet<&TrackId>| -> Vec<&'a Track> {
            candidates
                .iter()
                .filter(|c| !excluded.contains(&c.id))
                .collect()
        };

        let played: HashSet<&TrackId> = history.iter().map(|t| &t.id).collect();
        let novel = keep(&played);
        if !novel.is_empty() {
            return Some((Tier::Novel, novel));
        }
        log::debug!("no novel recommendations, relaxing to the recent window");

        let recent: HashSet<&TrackId> = history
            .iter()
            .rev()
            .take(self.recent_window)
            .map(|t| &t.id)
            .collect();
        let outside_recent = keep(&recent);
        if !outside_recent.is_empty() {
            return Some((Tier::OutsideRecent, outside_recent));
        }
        log::debug!("recent window exhausted, only avoiding {}", finished.id);

        let not_finished = keep(&HashSet::from([&finished.id]));
        (!not_finished.is_empty()).then_some((Tier::NotFinished, not_finished))
    }
}

/// [`SelectionPolicy::select`] with the default window and pool size
pub fn select_next<R: Rng + ?Sized>(
    history: &[Track],
    finished: &Track,
    candidates: &[Track],
    rng: &mut R,
) -> Option<Track> {
    SelectionPolicy::default()
        .select(history, finished, candidates, rng)
        .map(|s| s.track)
}

#[cfg(test)]
mod tests {
    use rand::{RngCore, SeedableRng, rngs::StdRng};

    use super::*;

    /// random source that always yields zero bits
    struct ZeroRng;

    impl RngCore for ZeroRng {
        fn next_u32(&mut self) -> u32 {
            0
        }

        fn next_u64(&mut self) -> u64 {
            0
        }

        fn fill_bytes(&mut self, dst: &mut [u8]) {
            dst.fill(0);
        }
    }

    fn track(id: &str) -> Track {
        Track::new(id, id, "artist")
    }

    fn tracks(ids: &[&str]) -> Vec<Track> {
        ids.iter().map(|id| track(id)).collect()
    }

    fn rng() -> StdRng {
        StdRng::seed_from_u64(7)
    }

    #[test]
    fn test_empty_candidates_yield_none() {
        let history = tracks(&["a"]);
        assert!(select_next(&history, &history[0], &[], &mut rng()).is_none());
    }

    #[test]
    fn test_only_finished_track_yields_none() {
        let history = tracks(&["a", "b", "a"]);
        let candidates = tracks(&["a"]);
        assert!(select_next(&history, &history[2], &candidates, &mut rng()).is_none());
    }

    #[test]
    fn test_fresh_queue_picks_novel_candidate() {
        let history = tracks(&["a"]);
        let candidates = tracks(&["b", "c", "d"]);

        for seed in 0..50 {
            let mut rng = StdRng::seed_from_u64(seed);
            let selection = SelectionPolicy::default()
                .select(&history, &history[0], &candidates, &mut rng)
                .unwrap();
            assert_eq!(selection.tier, Tier::Novel);
            assert!(candidates.contains(&selection.track));
        }
    }

    #[test]
    fn test_novel_tier_skips_played_tracks() {
        let history = tracks(&["a", "b", "c"]);
        let candidates = tracks(&["b", "a", "x", "c"]);

        for seed in 0..50 {
            let mut rng = StdRng::seed_from_u64(seed);
            let next = select_next(&history, &history[2], &candidates, &mut rng).unwrap();
            assert_eq!(next.id.as_str(), "x");
        }
    }

    #[test]
    fn test_outside_recent_tier() {
        // "old" was played, then 10 other tracks
        let mut ids = vec!["old"];
        let recent = ["r0", "r1", "r2", "r3", "r4", "r5", "r6", "r7", "r8", "r9"];
        ids.extend(recent);
        let history = tracks(&ids);
        let candidates = tracks(&["r3", "old", "r9"]);

        let selection = SelectionPolicy::default()
            .select(&history, &history[10], &candidates, &mut rng())
            .unwrap();
        assert_eq!(selection.tier, Tier::OutsideRecent);
        assert_eq!(selection.track.id.as_str(), "old");
    }

    #[test]
    fn test_short_history_window_covers_everything() {
        let history = tracks(&["a", "b", "c"]);
        let candidates = tracks(&["a", "b"]);

        let selection = SelectionPolicy::default()
            .select(&history, &history[2], &candidates, &mut ZeroRng)
            .unwrap();
        assert_eq!(selection.tier, Tier::NotFinished);
        assert_eq!(selection.track.id.as_str(), "a");
    }

    #[test]
    fn test_alternating_history_falls_to_last_tier() {
        let history = tracks(&["a", "b", "a", "b", "a", "b", "a", "b", "a", "b", "a"]);
        let candidates = tracks(&["a", "b"]);

        for seed in 0..50 {
            let mut rng = StdRng::seed_from_u64(seed);
            let selection = SelectionPolicy::default()
                .select(&history, &history[10], &candidates, &mut rng)
                .unwrap();
            assert_eq!(selection.tier, Tier::NotFinished);
            assert_eq!(selection.track.id.as_str(), "b");
        }
    }

    #[test]
    fn test_pool_limited_to_first_five() {
        let history = tracks(&["seed"]);
        let ids: Vec<String> = (0..20).map(|i| format!("n{i}")).collect();
        let candidates: Vec<Track> = ids.iter().map(|id| track(id)).collect();
        let top: Vec<&Track> = candidates.iter().take(POOL_SIZE).collect();

        let mut seen = HashSet::new();
        for seed in 0..500 {
            let mut rng = StdRng::seed_from_u64(seed);
            let next = select_next(&history, &history[0], &candidates, &mut rng).unwrap();
            assert!(top.contains(&&next), "{} is outside the pool", next.id);
            seen.insert(next.id);
        }
        // uniform over five entries, 500 draws reach all of them
        assert_eq!(seen.len(), POOL_SIZE);
    }

    #[test]
    fn test_pool_preserves_candidate_order() {
        let history = tracks(&["a", "b"]);
        let candidates = tracks(&["a", "z", "b", "y"]);

        let next = select_next(&history, &history[1], &candidates, &mut ZeroRng).unwrap();
        assert_eq!(next.id.as_str(), "z");
    }

    #[test]
    fn test_constant_rng_is_deterministic() {
        let history = tracks(&["a"]);
        let candidates = tracks(&["b", "c", "d", "e"]);

        let first = select_next(&history, &history[0], &candidates, &mut ZeroRng).unwrap();
        for _ in 0..10 {
            let again = select_next(&history, &history[0], &candidates, &mut ZeroRng).unwrap();
            assert_eq!(again, first);
        }
    }

    #[test]
    fn test_same_seed_same_pick() {
        let history = tracks(&["a"]);
        let candidates = tracks(&["b", "c", "d", "e", "f"]);

        let one = select_next(&history, &history[0], &candidates, &mut rng());
        let two = select_next(&history, &history[0], &candidates, &mut rng());
        assert_eq!(one, two);
    }

    #[test]
    fn test_inputs_are_not_mutated() {
        let history = tracks(&["a", "b"]);
        let candidates = tracks(&["c", "a"]);
        let (history_before, candidates_before) = (history.clone(), candidates.clone());

        select_next(&history, &history[1], &candidates, &mut rng());

        assert_eq!(history, history_before);
        assert_eq!(candidates, candidates_before);
    }

    #[test]
    fn test_policy_clamps_pool_size() {
        let policy = SelectionPolicy::new(3, 0);
        assert_eq!(policy.pool_size(), 1);

        let history = tracks(&["a"]);
        let candidates = tracks(&["b", "c"]);
        for seed in 0..20 {
            let mut rng = StdRng::seed_from_u64(seed);
            let selection = policy
                .select(&history, &history[0], &candidates, &mut rng)
                .unwrap();
            assert_eq!(selection.track.id.as_str(), "b");
        }
    }

    #[test]
    fn test_policy_clamps_recent_window() {
        let policy = SelectionPolicy::new(0, 5);
        assert_eq!(policy.recent_window(), 1);

        let history = tracks(&["a", "b"]);
        let candidates = tracks(&["b"]);
        assert!(
            policy
                .select(&history, &history[1], &candidates, &mut ZeroRng)
                .is_none()
        );

        let candidates = tracks(&["b", "a"]);
        let selection = policy
            .select(&history, &history[1], &candidates, &mut ZeroRng)
            .unwrap();
        assert_eq!(selection.tier, Tier::OutsideRecent);
        assert_eq!(selection.track.id.as_str(), "a");
    }

    #[test]
    fn test_custom_recent_window() {
        let history = tracks(&["a", "b", "c"]);
        let candidates = tracks(&["a", "b"]);

        let selection = SelectionPolicy::new(1, 5)
            .select(&history, &history[2], &candidates, &mut ZeroRng)
            .unwrap();
        assert_eq!(selection.tier, Tier::OutsideRecent);
        assert_eq!(selection.track.id.as_str(), "a");
    }
}
