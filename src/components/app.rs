use crate::api::{BackendConfig, SupabaseClient};
use crate::cache::SignedUrlCache;
use crate::components::{AudioController, MediaFailure, PlaybackErrorSignal, Route};
use crate::db;
use crate::diagnostics::log_error;
use crate::session::SessionStore;
use crate::stores::{NotesStore, PlaybackSession, Playlist, SingleFlight};
use dioxus::prelude::*;

/// Single-flight latch for playlist loads.
#[derive(Clone, Copy)]
pub struct PlaylistLoadGuard(pub Signal<SingleFlight>);

/// Single-flight latch for note loads.
#[derive(Clone, Copy)]
pub struct NotesLoadGuard(pub Signal<SingleFlight>);

/// Name of the selection that already used its one stale-URL refresh.
#[derive(Clone, Copy)]
pub struct StaleRetrySignal(pub Signal<Option<String>>);

/// Application shell: owns every piece of shared state and hands it to the
/// routed views through context. Lifecycle of all of it is the page session.
#[component]
pub fn AppShell() -> Element {
    let mut session = use_signal(SessionStore::new);
    let cache = use_signal(SignedUrlCache::new);
    let playlist = use_signal(Playlist::new);
    let playback = use_signal(PlaybackSession::new);
    let notes = use_signal(NotesStore::new);
    let playlist_guard = use_signal(SingleFlight::new);
    let notes_guard = use_signal(SingleFlight::new);
    let playback_error = use_signal(|| None::<MediaFailure>);
    let stale_retry = use_signal(|| None::<String>);
    let mut session_restored = use_signal(|| false);

    use_context_provider(|| SupabaseClient::new(BackendConfig::from_env()));
    use_context_provider(|| session);
    use_context_provider(|| cache);
    use_context_provider(|| playlist);
    use_context_provider(|| playback);
    use_context_provider(|| notes);
    use_context_provider(|| PlaylistLoadGuard(playlist_guard));
    use_context_provider(|| NotesLoadGuard(notes_guard));
    use_context_provider(|| PlaybackErrorSignal(playback_error));
    use_context_provider(|| StaleRetrySignal(stale_retry));

    // Pick up a persisted sign-in before any view decides to redirect.
    use_effect(move || {
        spawn(async move {
            match db::load_session().await {
                Ok(Some(saved)) => session.with_mut(|s| s.restore(saved)),
                Ok(None) => {}
                Err(err) => log_error("db", &format!("failed to load saved session: {err}")),
            }
            session_restored.set(true);
        });
    });

    // Page teardown releases any page-local object URLs held by the cache.
    use_drop(move || {
        for url in cache.peek().blob_urls() {
            crate::cache::release_url_if_blob(&url);
        }
    });

    rsx! {
        if session_restored() {
            Outlet::<Route> {}
        } else {
            div { class: "bg-[#22221E] min-h-screen" }
        }

        // Audio controller - manages the media element separately from the UI
        AudioController {}
    }
}
