//! Playlist state and playback session transitions.
//!
//! The playlist is an insertion-ordered sequence of audio entries, unique by
//! name. Playback state is a small state machine over that sequence:
//!
//! `Idle -> Loaded (select) -> Playing <-> Paused -> Paused on media end`
//!
//! All transitions here are pure; the media element is driven by the caller.

/// One playable file: its stored name and a (time-limited) playable URL.
#[derive(Debug, Clone, PartialEq)]
pub struct AudioEntry {
    pub name: String,
    pub url: String,
}

impl AudioEntry {
    pub fn new(name: impl Into<String>, url: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            url: url.into(),
        }
    }
}

/// Ordered, de-duplicated collection of known audio entries.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Playlist {
    entries: Vec<AudioEntry>,
}

impl Playlist {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn entries(&self) -> &[AudioEntry] {
        &self.entries
    }

    #[allow(dead_code)]
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    #[allow(dead_code)]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn contains(&self, name: &str) -> bool {
        self.entries.iter().any(|entry| entry.name == name)
    }

    pub fn get(&self, name: &str) -> Option<&AudioEntry> {
        self.entries.iter().find(|entry| entry.name == name)
    }

    /// Optimistic append of a freshly uploaded entry. Returns false when the
    /// name is already present (the existing entry wins).
    pub fn add(&mut self, entry: AudioEntry) -> bool {
        if self.contains(&entry.name) {
            return false;
        }
        self.entries.push(entry);
        true
    }

    /// Point an existing entry at a refreshed URL.
    pub fn set_url(&mut self, name: &str, url: &str) -> bool {
        match self.entries.iter_mut().find(|entry| entry.name == name) {
            Some(entry) => {
                entry.url = url.to_string();
                true
            }
            None => false,
        }
    }

    pub fn remove(&mut self, name: &str) -> Option<AudioEntry> {
        let index = self.entries.iter().position(|entry| entry.name == name)?;
        Some(self.entries.remove(index))
    }

    /// Append-only merge of a fresh listing: names already present are
    /// skipped, nothing is ever removed. Calling it twice with the same
    /// input leaves the playlist unchanged. Returns how many entries landed.
    pub fn merge(&mut self, incoming: Vec<AudioEntry>) -> usize {
        let mut added = 0;
        for entry in incoming {
            if self.add(entry) {
                added += 1;
            }
        }
        added
    }

    pub fn clear(&mut self) {
        self.entries.clear();
    }

    fn index_of(&self, name: &str) -> Option<usize> {
        self.entries.iter().position(|entry| entry.name == name)
    }

    /// The entry after `current`, wrapping past the end to index 0. A current
    /// entry that is missing from the sequence selects index 0.
    pub fn next_after(&self, current: Option<&str>) -> Option<&AudioEntry> {
        if self.entries.is_empty() {
            return None;
        }
        let index = match current.and_then(|name| self.index_of(name)) {
            Some(index) => (index + 1) % self.entries.len(),
            None => 0,
        };
        self.entries.get(index)
    }

    /// The entry before `current`, wrapping before index 0 to the last
    /// index. A missing current entry selects index 0.
    pub fn previous_before(&self, current: Option<&str>) -> Option<&AudioEntry> {
        if self.entries.is_empty() {
            return None;
        }
        let index = match current.and_then(|name| self.index_of(name)) {
            Some(index) => (index + self.entries.len() - 1) % self.entries.len(),
            None => 0,
        };
        self.entries.get(index)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum PlaybackStatus {
    #[default]
    Idle,
    Loaded,
    Playing,
    Paused,
}

/// Currently selected/playing state over the playlist.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct PlaybackSession {
    current: Option<String>,
    status: PlaybackStatus,
}

impl PlaybackSession {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn current(&self) -> Option<&str> {
        self.current.as_deref()
    }

    #[allow(dead_code)]
    pub fn status(&self) -> PlaybackStatus {
        self.status
    }

    pub fn is_playing(&self) -> bool {
        self.status == PlaybackStatus::Playing
    }

    /// Selecting an entry (from any state) loads it paused. Re-selecting the
    /// current entry reloads it the same way.
    pub fn select(&mut self, name: impl Into<String>) {
        self.current = Some(name.into());
        self.status = PlaybackStatus::Loaded;
    }

    /// Flip play/pause. No-op without a selection. Returns the state the
    /// media element should be driven into.
    pub fn toggle(&mut self) -> Option<bool> {
        self.current.as_ref()?;
        match self.status {
            PlaybackStatus::Idle => None,
            PlaybackStatus::Playing => {
                self.status = PlaybackStatus::Paused;
                Some(false)
            }
            PlaybackStatus::Loaded | PlaybackStatus::Paused => {
                self.status = PlaybackStatus::Playing;
                Some(true)
            }
        }
    }

    /// The media element reported the track ended.
    pub fn media_ended(&mut self) {
        if self.status == PlaybackStatus::Playing {
            self.status = PlaybackStatus::Paused;
        }
    }

    pub fn clear(&mut self) {
        self.current = None;
        self.status = PlaybackStatus::Idle;
    }
}

/// At most one in-progress instance of an asynchronous operation per key.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct SingleFlight {
    in_flight: Option<String>,
}

impl SingleFlight {
    pub fn new() -> Self {
        Self::default()
    }

    /// Claim the latch for `key`. Returns false when a flight for the same
    /// key is already in progress; a different key takes the latch over.
    pub fn begin(&mut self, key: &str) -> bool {
        if self.in_flight.as_deref() == Some(key) {
            return false;
        }
        self.in_flight = Some(key.to_string());
        true
    }

    pub fn finish(&mut self) {
        self.in_flight = None;
    }

    #[allow(dead_code)]
    pub fn is_in_flight(&self, key: &str) -> bool {
        self.in_flight.as_deref() == Some(key)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn playlist(names: &[&str]) -> Playlist {
        let mut list = Playlist::new();
        for name in names {
            list.add(AudioEntry::new(*name, format!("https://cdn/{name}")));
        }
        list
    }

    #[test]
    fn merge_is_append_only_and_idempotent() {
        let mut list = playlist(&["a.mp3", "b.mp3"]);
        let incoming = vec![
            AudioEntry::new("b.mp3", "https://cdn/b2"),
            AudioEntry::new("c.mp3", "https://cdn/c"),
        ];

        assert_eq!(list.merge(incoming.clone()), 1);
        assert_eq!(list.merge(incoming), 0);

        let names: Vec<&str> = list.entries().iter().map(|e| e.name.as_str()).collect();
        assert_eq!(names, vec!["a.mp3", "b.mp3", "c.mp3"]);
        // Existing entries are never replaced by a merge.
        assert_eq!(list.get("b.mp3").unwrap().url, "https://cdn/b.mp3");
    }

    #[test]
    fn next_and_previous_wrap_at_both_ends() {
        let list = playlist(&["a", "b", "c"]);

        assert_eq!(list.next_after(Some("b")).unwrap().name, "c");
        assert_eq!(list.next_after(Some("c")).unwrap().name, "a");
        assert_eq!(list.previous_before(Some("a")).unwrap().name, "c");
        assert_eq!(list.previous_before(Some("b")).unwrap().name, "a");
    }

    #[test]
    fn next_and_previous_are_inverse_from_every_index() {
        let list = playlist(&["a", "b", "c", "d"]);
        for entry in list.entries() {
            let forward = list.next_after(Some(&entry.name)).unwrap();
            let back = list.previous_before(Some(&forward.name)).unwrap();
            assert_eq!(back.name, entry.name);
        }
    }

    #[test]
    fn missing_current_selects_index_zero() {
        let list = playlist(&["a", "b", "c"]);
        assert_eq!(list.next_after(Some("gone")).unwrap().name, "a");
        assert_eq!(list.previous_before(Some("gone")).unwrap().name, "a");
        assert_eq!(list.next_after(None).unwrap().name, "a");
    }

    #[test]
    fn single_entry_playlist_wraps_onto_itself() {
        let list = playlist(&["only"]);
        assert_eq!(list.next_after(Some("only")).unwrap().name, "only");
        assert_eq!(list.previous_before(Some("only")).unwrap().name, "only");
    }

    #[test]
    fn empty_playlist_has_no_navigation() {
        let list = Playlist::new();
        assert!(list.next_after(Some("a")).is_none());
        assert!(list.previous_before(None).is_none());
    }

    #[test]
    fn add_rejects_duplicates_and_upload_lands_last() {
        let mut list = playlist(&["a", "b"]);
        assert!(list.add(AudioEntry::new("My_Song__.mp3", "blob:x")));
        assert!(!list.add(AudioEntry::new("a", "blob:y")));
        assert_eq!(list.entries().last().unwrap().name, "My_Song__.mp3");

        // An upload selects the new entry, paused.
        let mut session = PlaybackSession::new();
        session.select("My_Song__.mp3");
        assert_eq!(session.current(), Some("My_Song__.mp3"));
        assert_eq!(session.status(), PlaybackStatus::Loaded);
    }

    #[test]
    fn playback_follows_the_state_machine() {
        let mut session = PlaybackSession::new();
        assert_eq!(session.status(), PlaybackStatus::Idle);
        assert_eq!(session.toggle(), None);

        session.select("a");
        assert_eq!(session.status(), PlaybackStatus::Loaded);
        assert!(!session.is_playing());

        assert_eq!(session.toggle(), Some(true));
        assert!(session.is_playing());
        assert_eq!(session.toggle(), Some(false));
        assert_eq!(session.status(), PlaybackStatus::Paused);
        assert_eq!(session.toggle(), Some(true));

        session.media_ended();
        assert_eq!(session.status(), PlaybackStatus::Paused);
        // Ending is only meaningful while playing.
        session.media_ended();
        assert_eq!(session.status(), PlaybackStatus::Paused);

        session.select("b");
        assert_eq!(session.status(), PlaybackStatus::Loaded);
        assert_eq!(session.current(), Some("b"));

        session.clear();
        assert_eq!(session.status(), PlaybackStatus::Idle);
        assert_eq!(session.current(), None);
    }

    #[test]
    fn single_flight_admits_one_load_per_key() {
        let mut flight = SingleFlight::new();
        assert!(flight.begin("user-1"));
        assert!(!flight.begin("user-1"));
        assert!(flight.is_in_flight("user-1"));

        flight.finish();
        assert!(flight.begin("user-1"));

        // A different identity takes the latch over.
        assert!(flight.begin("user-2"));
        assert!(!flight.is_in_flight("user-1"));
    }
}
