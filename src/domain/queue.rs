use serde::{Deserialize, Serialize};

use super::track::Track;

/// Ordered tracks of the current listening session and the cursor of the playing one.
///
/// The cursor is `None` exactly when the queue is empty. Every mutation bumps
/// `revision`, so a caller holding an older revision knows its view is stale.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct PlaybackQueue {
    tracks: Vec<Track>,
    cursor: Option<usize>,
    #[serde(default)]
    revision: u64,
}

impl PlaybackQueue {
    pub fn new() -> Self {
        Self::default()
    }

    /// replaces the whole queue, e.g. when a search result or a stored playlist is opened
    pub fn replace(&mut self, tracks: Vec<Track>, start: usize) {
        self.cursor = if tracks.is_empty() {
            None
        } else {
            Some(start.min(tracks.len() - 1))
        };
        self.tracks = tracks;
        self.bump();
    }

    pub fn play_single(&mut self, track: Track) {
        self.replace(vec![track], 0);
    }

    /// appends a track at the tail and makes it the current one
    pub fn push_and_advance(&mut self, track: Track) {
        self.tracks.push(track);
        self.cursor = Some(self.tracks.len() - 1);
        self.bump();
    }

    /// moves to the already queued track after the current one, if any
    pub fn advance(&mut self) -> Option<&Track> {
        let next = self.cursor.map(|c| c + 1).filter(|&n| n < self.tracks.len())?;
        self.cursor = Some(next);
        self.bump();
        self.tracks.get(next)
    }

    /// moves one track back, staying on the first one
    pub fn previous(&mut self) -> Option<&Track> {
        let prev = self.cursor?.saturating_sub(1);
        if Some(prev) != self.cursor {
            self.cursor = Some(prev);
            self.bump();
        }
        self.tracks.get(prev)
    }

    pub fn current(&self) -> Option<&Track> {
        self.cursor.and_then(|c| self.tracks.get(c))
    }

    /// tracks played so far, the current one being the last
    pub fn history(&self) -> &[Track] {
        match self.cursor {
            Some(c) => &self.tracks[..=c],
            None => &[],
        }
    }

    pub fn has_upcoming(&self) -> bool {
        self.cursor.is_some_and(|c| c + 1 < self.tracks.len())
    }

    pub fn tracks(&self) -> &[Track] {
        &self.tracks
    }

    pub fn cursor(&self) -> Option<usize> {
        self.cursor
    }

    pub fn revision(&self) -> u64 {
        self.revision
    }

    pub fn is_empty(&self) -> bool {
        self.tracks.is_empty()
    }

    /// restores the cursor invariant on a queue read back from storage
    pub fn validated(mut self) -> Self {
        let len = self.tracks.len();
        self.cursor = match self.cursor {
            _ if len == 0 => None,
            Some(c) if c < len => Some(c),
            Some(_) => Some(len - 1),
            None => Some(0),
        };
        self
    }

    fn bump(&mut self) {
        self.revision = self.revision.wrapping_add(1);
    }
}
