/// Utility helpers for Chelly

/// Listing artifact Supabase leaves behind to mark otherwise-empty folders.
const EMPTY_FOLDER_PLACEHOLDER: &str = ".emptyFolderPlaceholder";

/// Sanitize a file name for storage.
/// Keeps ASCII letters, digits, `.`, `-` and `_`; every other character is
/// replaced one-for-one with `_` so the stored name stays the same length.
pub fn sanitize_object_name<S: AsRef<str>>(name: S) -> String {
    name.as_ref()
        .chars()
        .map(|ch| {
            if ch.is_ascii_alphanumeric() || matches!(ch, '.' | '-' | '_') {
                ch
            } else {
                '_'
            }
        })
        .collect()
}

/// Sanitize a note title for use as a storage object name.
/// Same one-for-one replacement as [`sanitize_object_name`], but dots are not
/// allowed so a title can never smuggle in a fake extension.
pub fn sanitize_note_title<S: AsRef<str>>(title: S) -> String {
    title
        .as_ref()
        .chars()
        .map(|ch| {
            if ch.is_ascii_alphanumeric() || matches!(ch, '-' | '_') {
                ch
            } else {
                '_'
            }
        })
        .collect()
}

/// Whether a listed object is a storage-internal placeholder rather than
/// real user data.
pub fn is_placeholder_entry(name: &str) -> bool {
    name == EMPTY_FOLDER_PLACEHOLDER
}

/// Content type for an uploaded audio file when the file picker does not
/// report one, derived from the extension.
pub fn audio_mime_for(name: &str) -> String {
    let extension = name
        .rsplit('.')
        .next()
        .unwrap_or_default()
        .to_ascii_lowercase();
    let mime = match extension.as_str() {
        "mp3" => "audio/mpeg",
        "wav" => "audio/wav",
        "ogg" | "oga" => "audio/ogg",
        "m4a" | "mp4" => "audio/mp4",
        "flac" => "audio/flac",
        "aac" => "audio/aac",
        "opus" => "audio/opus",
        "webm" => "audio/webm",
        _ => "application/octet-stream",
    };
    mime.to_string()
}

/// Surface a message to the user. Browser alert on web, stderr elsewhere.
#[cfg(target_arch = "wasm32")]
pub fn notify_user(message: &str) {
    if let Some(window) = web_sys::window() {
        let _ = window.alert_with_message(message);
    }
}

#[cfg(not(target_arch = "wasm32"))]
pub fn notify_user(message: &str) {
    eprintln!("{message}");
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn object_name_replaces_rejected_chars_one_for_one() {
        assert_eq!(sanitize_object_name("My Song!!.mp3"), "My_Song__.mp3");
        assert_eq!(
            sanitize_object_name("already_clean-1.ogg"),
            "already_clean-1.ogg"
        );
        assert_eq!(sanitize_object_name("sp ce & st ff.wav"), "sp_ce___st_ff.wav");
    }

    #[test]
    fn object_name_preserves_length() {
        let raw = "a b/c:d*e?.flac";
        assert_eq!(sanitize_object_name(raw).chars().count(), raw.chars().count());
    }

    #[test]
    fn note_title_rejects_dots() {
        assert_eq!(sanitize_note_title("Shopping List!"), "Shopping_List_");
        assert_eq!(sanitize_note_title("v1.2 notes"), "v1_2_notes");
    }

    #[test]
    fn audio_mime_falls_back_by_extension() {
        assert_eq!(audio_mime_for("My_Song__.mp3"), "audio/mpeg");
        assert_eq!(audio_mime_for("take.FLAC"), "audio/flac");
        assert_eq!(audio_mime_for("mystery.bin"), "application/octet-stream");
    }

    #[test]
    fn placeholder_entries_are_detected() {
        assert!(is_placeholder_entry(".emptyFolderPlaceholder"));
        assert!(!is_placeholder_entry("song.mp3"));
        assert!(!is_placeholder_entry(".hidden"));
    }
}
