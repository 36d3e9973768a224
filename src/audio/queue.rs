use im::Vector;

use super::{state::QueueEntry, track::PlayableTrack};

/// Tracks waiting to be played, in insertion order.
///
/// Backed by a persistent vector: both ends are cheap for play-next and
/// advance, and removal from the middle for select is logarithmic.
#[derive(Debug, Clone, Default)]
pub struct PendingQueue {
    tracks: Vector<PlayableTrack>,
}

impl PendingQueue {
    pub fn new() -> Self {
        Self {
            tracks: Vector::new(),
        }
    }

    pub fn len(&self) -> usize {
        self.tracks.len()
    }

    pub fn is_empty(&self) -> bool {
        self.tracks.is_empty()
    }

    pub fn push_back(&mut self, track: PlayableTrack) {
        self.tracks.push_back(track);
    }

    pub fn push_front(&mut self, track: PlayableTrack) {
        self.tracks.push_front(track);
    }

    pub fn pop_front(&mut self) -> Option<PlayableTrack> {
        self.tracks.pop_front()
    }

    /// Removes the entry at a 0-based position.
    pub fn remove(&mut self, position: usize) -> Option<PlayableTrack> {
        if position >= self.tracks.len() {
            return None;
        }
        Some(self.tracks.remove(position))
    }

    pub fn clear(&mut self) {
        self.tracks.clear();
    }

    pub fn iter(&self) -> impl Iterator<Item = &PlayableTrack> {
        self.tracks.iter()
    }

    /// 1-based listing used for display and selection.
    pub fn entries(&self) -> Vec<QueueEntry> {
        self.tracks
            .iter()
            .enumerate()
            .map(|(i, track)| QueueEntry {
                index: i + 1,
                title: track.title.clone(),
                duration: track.duration,
            })
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;

    fn track(title: &str) -> PlayableTrack {
        PlayableTrack::new(title, format!("https://video.example/{title}"))
    }

    fn titles(queue: &PendingQueue) -> Vec<String> {
        queue.iter().map(|t| t.title.clone()).collect()
    }

    #[test]
    fn push_back_keeps_fifo_order() {
        let mut queue = PendingQueue::new();
        queue.push_back(track("a"));
        queue.push_back(track("b"));
        queue.push_back(track("c"));

        assert_eq!(queue.pop_front().map(|t| t.title), Some("a".into()));
        assert_eq!(titles(&queue), vec!["b", "c"]);
    }

    #[test]
    fn push_front_jumps_the_line() {
        let mut queue = PendingQueue::new();
        queue.push_back(track("a"));
        queue.push_front(track("next"));

        assert_eq!(titles(&queue), vec!["next", "a"]);
    }

    #[test]
    fn remove_out_of_range_is_none() {
        let mut queue = PendingQueue::new();
        queue.push_back(track("a"));

        assert!(queue.remove(1).is_none());
        assert_eq!(queue.len(), 1);
        assert_eq!(queue.remove(0).map(|t| t.title), Some("a".into()));
        assert!(queue.is_empty());
    }

    #[test]
    fn entries_are_one_based() {
        let mut queue = PendingQueue::new();
        queue.push_back(track("a").with_duration(Duration::from_secs(90)));
        queue.push_back(track("b"));

        let entries = queue.entries();
        assert_eq!(
            entries[0],
            QueueEntry {
                index: 1,
                title: "a".into(),
                duration: Some(Duration::from_secs(90)),
            }
        );
        assert_eq!(
            entries[1],
            QueueEntry {
                index: 2,
                title: "b".into(),
                duration: None,
            }
        );
    }

    #[test]
    fn clear_empties_the_queue() {
        let mut queue = PendingQueue::new();
        queue.push_back(track("a"));
        queue.push_back(track("b"));

        queue.clear();
        assert!(queue.is_empty());
        assert!(queue.pop_front().is_none());
    }
}
