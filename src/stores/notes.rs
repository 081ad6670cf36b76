//! Note collection state: title/content pairs persisted as individual text
//! objects under the user's namespace.

use crate::utils::sanitize_note_title;

const NOTE_EXTENSION: &str = ".txt";

#[derive(Debug, Clone, Default, PartialEq)]
pub struct Note {
    pub title: String,
    pub content: String,
}

impl Note {
    pub fn new(title: impl Into<String>, content: impl Into<String>) -> Self {
        Self {
            title: title.into(),
            content: content.into(),
        }
    }
}

/// In-memory mirror of the user's saved notes. Non-authoritative; the
/// storage collaborator holds the truth.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct NotesStore {
    notes: Vec<Note>,
}

impl NotesStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn notes(&self) -> &[Note] {
        &self.notes
    }

    #[allow(dead_code)]
    pub fn len(&self) -> usize {
        self.notes.len()
    }

    #[allow(dead_code)]
    pub fn is_empty(&self) -> bool {
        self.notes.is_empty()
    }

    #[allow(dead_code)]
    pub fn get(&self, title: &str) -> Option<&Note> {
        self.notes.iter().find(|note| note.title == title)
    }

    /// Optimistic write-through: replace the note with the same title or
    /// append a new one.
    pub fn upsert(&mut self, note: Note) {
        match self.notes.iter_mut().find(|n| n.title == note.title) {
            Some(existing) => *existing = note,
            None => self.notes.push(note),
        }
    }

    /// Reconciliation: adopt a freshly loaded collection wholesale.
    pub fn replace(&mut self, notes: Vec<Note>) {
        self.notes = notes;
    }

    pub fn clear(&mut self) {
        self.notes.clear();
    }
}

/// Validate the edit buffer before any write is attempted. Returns the
/// trimmed title/content pair, or the message to show the user.
pub fn validate_draft(title: &str, content: &str) -> Result<(String, String), String> {
    let title = title.trim();
    let content = content.trim();
    if title.is_empty() || content.is_empty() {
        return Err("Please enter both title and content".to_string());
    }
    Ok((title.to_string(), content.to_string()))
}

/// Object name a note is stored under, e.g. `Shopping_List.txt`.
pub fn note_object_name(title: &str) -> String {
    format!("{}{NOTE_EXTENSION}", sanitize_note_title(title))
}

/// Display title recovered from a stored object name.
pub fn title_from_object_name(name: &str) -> String {
    name.strip_suffix(NOTE_EXTENSION).unwrap_or(name).to_string()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_drafts_are_rejected_before_any_write() {
        assert!(validate_draft("", "body").is_err());
        assert!(validate_draft("title", "").is_err());
        assert!(validate_draft("   ", "body").is_err());
        assert!(validate_draft("title", "\n\t ").is_err());
    }

    #[test]
    fn valid_drafts_come_back_trimmed() {
        let (title, content) = validate_draft("  Groceries ", " milk\neggs ").unwrap();
        assert_eq!(title, "Groceries");
        assert_eq!(content, "milk\neggs");
    }

    #[test]
    fn rejection_leaves_the_store_untouched() {
        let mut store = NotesStore::new();
        store.upsert(Note::new("kept", "original"));

        if validate_draft("", "anything").is_ok() {
            store.upsert(Note::new("", "anything"));
        }
        assert_eq!(store.len(), 1);
        assert_eq!(store.get("kept").unwrap().content, "original");
    }

    #[test]
    fn upsert_replaces_by_title() {
        let mut store = NotesStore::new();
        store.upsert(Note::new("a", "one"));
        store.upsert(Note::new("b", "two"));
        store.upsert(Note::new("a", "three"));

        assert_eq!(store.len(), 2);
        assert_eq!(store.get("a").unwrap().content, "three");
        // Order of first insertion is preserved.
        assert_eq!(store.notes()[0].title, "a");
    }

    #[test]
    fn object_names_round_trip_through_sanitization() {
        assert_eq!(note_object_name("Shopping List!"), "Shopping_List_.txt");
        assert_eq!(title_from_object_name("Shopping_List_.txt"), "Shopping_List_");
        assert_eq!(title_from_object_name("no-extension"), "no-extension");
    }

    #[test]
    fn replace_adopts_the_loaded_collection() {
        let mut store = NotesStore::new();
        store.upsert(Note::new("stale", "x"));
        store.replace(vec![Note::new("fresh", "y")]);
        assert_eq!(store.len(), 1);
        assert!(store.get("stale").is_none());
    }
}
