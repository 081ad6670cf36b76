use crate::api::{SupabaseClient, BUCKET_AUDIO};
use crate::cache::{
    is_blob_url, now_ms, release_url_if_blob, SignedUrlCache, LOCAL_BLOB_TTL_SECS,
    SIGNED_URL_TTL_SECS,
};
use crate::components::{
    clear_audio_source, click_element, create_blob_url, pause_audio, play_audio,
    set_audio_source, MediaFailure, PlaybackErrorSignal, PlayerControls, PlaylistLoadGuard,
    Route, StaleRetrySignal,
};
use crate::diagnostics::log_error;
use crate::session::SessionStore;
use crate::stores::{AudioEntry, PlaybackSession, Playlist, SingleFlight};
use crate::utils::{audio_mime_for, is_placeholder_entry, notify_user, sanitize_object_name};
use dioxus::prelude::*;
use futures_util::future::join_all;
use std::collections::HashMap;

const FILE_INPUT_ID: &str = "audio-file-input";

fn audio_prefix(user_id: &str) -> String {
    format!("{user_id}/audio")
}

fn audio_object_path(user_id: &str, name: &str) -> String {
    format!("{user_id}/audio/{name}")
}

/// List the user's stored audio, reuse valid cached URLs, sign the rest
/// concurrently, and merge the outcome into the playlist as one atomic
/// state update. Individual signing failures drop that entry only.
pub(crate) async fn refresh_playlist(
    client: SupabaseClient,
    user_id: String,
    access_token: Option<String>,
    mut cache: Signal<SignedUrlCache>,
    mut playlist: Signal<Playlist>,
    mut guard: Signal<SingleFlight>,
) {
    if !guard.with_mut(|g| g.begin(&user_id)) {
        return;
    }

    let prefix = audio_prefix(&user_id);
    let listing = match client
        .list_objects(BUCKET_AUDIO, &prefix, access_token.as_deref())
        .await
    {
        Ok(objects) => objects,
        Err(err) => {
            log_error("playlist", &format!("listing failed: {err}"));
            guard.with_mut(|g| g.finish());
            return;
        }
    };

    let names: Vec<String> = listing
        .into_iter()
        .map(|object| object.name)
        .filter(|name| !is_placeholder_entry(name))
        .collect();

    let now = now_ms();
    let mut reused: Vec<(String, String)> = Vec::new();
    let mut pending: Vec<String> = Vec::new();
    {
        let cached = cache.peek();
        for name in &names {
            match cached.get(name, now) {
                Some(url) => reused.push((name.clone(), url.to_string())),
                None => pending.push(name.clone()),
            }
        }
    }

    let requests = pending.into_iter().map(|name| {
        let client = client.clone();
        let token = access_token.clone();
        let path = audio_object_path(&user_id, &name);
        async move {
            let result = client
                .create_signed_url(BUCKET_AUDIO, &path, SIGNED_URL_TTL_SECS, token.as_deref())
                .await;
            (name, result)
        }
    });

    let mut fresh: Vec<(String, String)> = Vec::new();
    for (name, result) in join_all(requests).await {
        match result {
            Ok(url) => fresh.push((name, url)),
            Err(err) => log_error("playlist", &format!("dropping \"{name}\": {err}")),
        }
    }

    let now = now_ms();
    cache.with_mut(|c| {
        for (name, url) in &fresh {
            if let Some(replaced) = c.put(name.clone(), url.clone(), SIGNED_URL_TTL_SECS, now) {
                release_url_if_blob(&replaced);
            }
        }
    });

    let mut by_name: HashMap<String, String> = reused.into_iter().chain(fresh).collect();
    let entries: Vec<AudioEntry> = names
        .iter()
        .filter_map(|name| {
            by_name
                .remove(name)
                .map(|url| AudioEntry::new(name.clone(), url))
        })
        .collect();
    playlist.with_mut(|p| {
        p.merge(entries);
    });
    guard.with_mut(|g| g.finish());
}

/// Make an entry current: stop playback, reset the retry budget and point
/// the media element at its URL.
fn select_entry(
    entry: &AudioEntry,
    mut playback: Signal<PlaybackSession>,
    mut playback_error: Signal<Option<MediaFailure>>,
    mut stale_retry: Signal<Option<String>>,
) {
    playback.with_mut(|p| p.select(&entry.name));
    playback_error.set(None);
    stale_retry.set(None);
    set_audio_source(&entry.url);
}

#[component]
pub fn Home() -> Element {
    let client = use_context::<SupabaseClient>();
    let session = use_context::<Signal<SessionStore>>();
    let cache = use_context::<Signal<SignedUrlCache>>();
    let playlist = use_context::<Signal<Playlist>>();
    let playback = use_context::<Signal<PlaybackSession>>();
    let playlist_guard = use_context::<PlaylistLoadGuard>().0;
    let playback_error = use_context::<PlaybackErrorSignal>().0;
    let stale_retry = use_context::<StaleRetrySignal>().0;
    let navigator = use_navigator();

    let mut bootstrapped = use_signal(|| false);

    // Identity guard, then the initial playlist load.
    {
        let client = client.clone();
        use_effect(move || {
            if bootstrapped() {
                return;
            }
            bootstrapped.set(true);
            let client = client.clone();
            spawn(async move {
                match super::ensure_identity(&client, session).await {
                    Some(user_id) => {
                        let token = session.peek().access_token().map(str::to_string);
                        refresh_playlist(client, user_id, token, cache, playlist, playlist_guard)
                            .await;
                    }
                    None => {
                        navigator.replace(Route::Auth {});
                    }
                }
            });
        });
    }

    // Bounded recovery from stale signed URLs: one refresh per selection,
    // then the failure is surfaced to the user.
    {
        let client = client.clone();
        use_effect(move || {
            let mut playback_error = playback_error;
            let mut stale_retry = stale_retry;
            let Some(failure) = playback_error() else {
                return;
            };
            if playback.peek().current() != Some(failure.name.as_str()) {
                playback_error.set(None);
                return;
            }

            let already_retried = stale_retry.peek().as_deref() == Some(failure.name.as_str());
            if failure.suggests_stale_url() && !already_retried {
                stale_retry.set(Some(failure.name.clone()));
                playback_error.set(None);
                let client = client.clone();
                spawn(async move {
                    let mut session = session;
                    let mut cache = cache;
                    let mut playlist = playlist;
                    let user_id = session.with_mut(|s| s.identity_or_anonymous());
                    let token = session.peek().access_token().map(str::to_string);

                    cache.with_mut(|c| {
                        c.remove(&failure.name);
                    });
                    refresh_playlist(client, user_id, token, cache, playlist, playlist_guard)
                        .await;

                    let url = cache
                        .peek()
                        .get(&failure.name, now_ms())
                        .map(str::to_string);
                    match url {
                        Some(url) => {
                            playlist.with_mut(|p| {
                                p.set_url(&failure.name, &url);
                            });
                            set_audio_source(&url);
                            if playback.peek().is_playing() {
                                play_audio();
                            }
                        }
                        None => {
                            log_error(
                                "playback",
                                &format!("no fresh URL for \"{}\"", failure.name),
                            );
                            notify_user(&failure.user_message());
                        }
                    }
                });
            } else {
                playback_error.set(None);
                log_error(
                    "playback",
                    &format!("giving up on \"{}\" (code {})", failure.name, failure.code),
                );
                notify_user(&failure.user_message());
            }
        });
    }

    let on_toggle = move |_| {
        let mut playback = playback;
        match playback.with_mut(|p| p.toggle()) {
            Some(true) => play_audio(),
            Some(false) => pause_audio(),
            None => {}
        }
    };

    let on_next = move |_| {
        let entry = {
            let list = playlist.peek();
            let pb = playback.peek();
            list.next_after(pb.current()).cloned()
        };
        if let Some(entry) = entry {
            select_entry(&entry, playback, playback_error, stale_retry);
        }
    };

    let on_previous = move |_| {
        let entry = {
            let list = playlist.peek();
            let pb = playback.peek();
            list.previous_before(pb.current()).cloned()
        };
        if let Some(entry) = entry {
            select_entry(&entry, playback, playback_error, stale_retry);
        }
    };

    // Upload path: sanitize, play the picked bytes right away through a
    // page-local URL, store under the user's namespace, then swap in the
    // signed URL for the fresh object.
    let on_file_selected = {
        let client = client.clone();
        move |event: Event<FormData>| {
            let mut files = event.files();
            let Some(file) = files.pop() else {
                return;
            };
            let client = client.clone();
            spawn(async move {
                let mut session = session;
                let mut cache = cache;
                let mut playlist = playlist;
                let mut playback = playback;

                let raw_name = file.name();
                let bytes = match file.read_bytes().await {
                    Ok(bytes) => bytes.to_vec(),
                    Err(err) => {
                        notify_user(&format!("Could not read the selected file: {err}"));
                        return;
                    }
                };

                let clean = sanitize_object_name(raw_name.trim());
                if clean.trim_matches(|c: char| c == '.' || c == '_').is_empty() {
                    notify_user("The selected file has no usable name.");
                    return;
                }

                if let Some(existing) = playlist.peek().get(&clean).cloned() {
                    select_entry(&existing, playback, playback_error, stale_retry);
                    return;
                }

                let content_type = file
                    .content_type()
                    .filter(|ct| !ct.trim().is_empty())
                    .unwrap_or_else(|| audio_mime_for(&clean));

                // Instant local playback while the upload runs.
                let blob_url = create_blob_url(&bytes);
                if let Some(url) = &blob_url {
                    cache.with_mut(|c| {
                        c.put(clean.clone(), url.clone(), LOCAL_BLOB_TTL_SECS, now_ms());
                    });
                    let entry = AudioEntry::new(clean.clone(), url.clone());
                    playlist.with_mut(|p| {
                        p.add(entry.clone());
                    });
                    select_entry(&entry, playback, playback_error, stale_retry);
                }

                let user_id = session.with_mut(|s| s.identity_or_anonymous());
                let token = session.peek().access_token().map(str::to_string);
                let path = audio_object_path(&user_id, &clean);

                if let Err(err) = client
                    .upload_object(
                        BUCKET_AUDIO,
                        &path,
                        bytes,
                        &content_type,
                        false,
                        token.as_deref(),
                    )
                    .await
                {
                    log_error("upload", &format!("upload of \"{clean}\" failed: {err}"));
                    // A failed write leaves nothing committed.
                    if playback.peek().current() == Some(clean.as_str()) {
                        playback.with_mut(|p| p.clear());
                        clear_audio_source();
                    }
                    playlist.with_mut(|p| {
                        p.remove(&clean);
                    });
                    cache.with_mut(|c| {
                        c.remove(&clean);
                    });
                    notify_user(&format!("Upload failed: {err}"));
                    return;
                }

                match client
                    .create_signed_url(BUCKET_AUDIO, &path, SIGNED_URL_TTL_SECS, token.as_deref())
                    .await
                {
                    Ok(url) => {
                        let replaced = cache.with_mut(|c| {
                            c.put(clean.clone(), url.clone(), SIGNED_URL_TTL_SECS, now_ms())
                        });
                        if let Some(old) = replaced {
                            // The blob stays alive while the element plays it;
                            // teardown or the next selection covers the rest.
                            let still_playing = playback.peek().current()
                                == Some(clean.as_str())
                                && is_blob_url(&old);
                            if !still_playing {
                                release_url_if_blob(&old);
                            }
                        }
                        playlist.with_mut(|p| {
                            if !p.set_url(&clean, &url) {
                                p.add(AudioEntry::new(clean.clone(), url.clone()));
                            }
                        });
                        if blob_url.is_none() {
                            if let Some(entry) = playlist.peek().get(&clean).cloned() {
                                select_entry(&entry, playback, playback_error, stale_retry);
                            }
                        }
                    }
                    Err(err) => {
                        log_error(
                            "upload",
                            &format!("signed URL for fresh \"{clean}\" failed: {err}"),
                        );
                    }
                }

                // Background reconciliation against the listing.
                refresh_playlist(client, user_id, token, cache, playlist, playlist_guard).await;
            });
        }
    };

    let playback_now = playback();
    let current_name = playback_now.current().map(str::to_string);
    let is_playing = playback_now.is_playing();
    let entries = playlist().entries().to_vec();

    rsx! {
        div { class: "bg-[#22221E]",
            div { class: "flex justify-center items-center h-screen",
                div { class: "flex flex-row bg-[#59ADFD] shadow-xl h-[60%] w-[70%] rounded-[10px] text-gray-800",
                    div { class: "bg-[#3F82FD] w-[25%] pl-4 pt-4 pr-4 rounded-[10px]",
                        div { class: "flex flex-col gap-4",
                            ul {
                                for entry in entries {
                                    li {
                                        key: "{entry.name}",
                                        class: if current_name.as_deref() == Some(entry.name.as_str()) { "flex justify-center hover:cursor-pointer pt-3 font-bold" } else { "flex justify-center hover:cursor-pointer pt-3" },
                                        onclick: {
                                            let entry = entry.clone();
                                            move |_| select_entry(&entry, playback, playback_error, stale_retry)
                                        },
                                        "{entry.name}"
                                    }
                                }
                            }
                        }
                    }
                    div { class: "flex flex-col w-full h-full",
                        div { class: "border-2 border-[#22221E] rounded-lg ml-12 mr-12 pt-12 pb-12 mt-20",
                            div { class: "flex justify-center font-bold",
                                {current_name.clone().unwrap_or_else(|| "No audio file selected".to_string())}
                            }
                            PlayerControls {
                                is_playing,
                                on_previous,
                                on_toggle,
                                on_next,
                            }
                            div { class: "flex justify-center",
                                input {
                                    id: FILE_INPUT_ID,
                                    r#type: "file",
                                    accept: "audio/*",
                                    class: "hidden",
                                    onchange: on_file_selected,
                                }
                                button {
                                    class: "hover:opacity-90",
                                    onclick: move |_| click_element(FILE_INPUT_ID),
                                    "Upload New Audio"
                                }
                            }
                            div { class: "flex justify-center pt-4",
                                button {
                                    class: "text-sm hover:opacity-90",
                                    onclick: move |_| {
                                        navigator.push(Route::Notes {});
                                    },
                                    "Notes"
                                }
                            }
                        }
                    }
                }
            }
        }
    }
}
