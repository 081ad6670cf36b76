use crate::api::{SupabaseClient, BUCKET_NOTES};
use crate::cache::SignedUrlCache;
use crate::components::{clear_audio_source, NotesLoadGuard, Route};
use crate::db;
use crate::diagnostics::log_error;
use crate::session::SessionStore;
use crate::stores::{
    note_object_name, title_from_object_name, validate_draft, Note, NotesStore, PlaybackSession,
    Playlist, SingleFlight,
};
use crate::utils::{is_placeholder_entry, notify_user};
use dioxus::prelude::*;
use futures_util::future::join_all;

fn notes_prefix(user_id: &str) -> String {
    format!("{user_id}/notes")
}

fn note_object_path(user_id: &str, object_name: &str) -> String {
    format!("{user_id}/notes/{object_name}")
}

/// List the user's note objects, download and decode each one concurrently,
/// and adopt the result wholesale. A note that fails to download or decode
/// is logged and dropped; the rest of the batch survives.
pub(crate) async fn refresh_notes(
    client: SupabaseClient,
    user_id: String,
    access_token: Option<String>,
    mut notes: Signal<NotesStore>,
    mut guard: Signal<SingleFlight>,
) {
    if !guard.with_mut(|g| g.begin(&user_id)) {
        return;
    }

    let prefix = notes_prefix(&user_id);
    let listing = match client
        .list_objects(BUCKET_NOTES, &prefix, access_token.as_deref())
        .await
    {
        Ok(objects) => objects,
        Err(err) => {
            log_error("notes", &format!("listing failed: {err}"));
            guard.with_mut(|g| g.finish());
            return;
        }
    };

    let downloads = listing
        .into_iter()
        .map(|object| object.name)
        .filter(|name| !is_placeholder_entry(name))
        .map(|name| {
            let client = client.clone();
            let token = access_token.clone();
            let path = note_object_path(&user_id, &name);
            async move {
                let result = client
                    .download_object(BUCKET_NOTES, &path, token.as_deref())
                    .await;
                (name, result)
            }
        });

    let mut loaded = Vec::new();
    for (name, result) in join_all(downloads).await {
        match result {
            Ok(bytes) => match String::from_utf8(bytes) {
                Ok(text) => loaded.push(Note::new(title_from_object_name(&name), text)),
                Err(err) => {
                    log_error("notes", &format!("dropping \"{name}\": not text: {err}"))
                }
            },
            Err(err) => log_error("notes", &format!("dropping \"{name}\": {err}")),
        }
    }

    notes.with_mut(|store| store.replace(loaded));
    guard.with_mut(|g| g.finish());
}

#[component]
pub fn Notes() -> Element {
    let client = use_context::<SupabaseClient>();
    let session = use_context::<Signal<SessionStore>>();
    let notes = use_context::<Signal<NotesStore>>();
    let notes_guard = use_context::<NotesLoadGuard>().0;
    let cache = use_context::<Signal<SignedUrlCache>>();
    let playlist = use_context::<Signal<Playlist>>();
    let playback = use_context::<Signal<PlaybackSession>>();
    let navigator = use_navigator();

    let mut title = use_signal(String::new);
    let mut content = use_signal(String::new);
    let mut saving = use_signal(|| false);
    let mut bootstrapped = use_signal(|| false);

    // Identity guard, then the initial note load.
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
                        refresh_notes(client, user_id, token, notes, notes_guard).await;
                    }
                    None => {
                        navigator.replace(Route::Auth {});
                    }
                }
            });
        });
    }

    let on_save = {
        let client = client.clone();
        move |_| {
            if saving() {
                return;
            }
            let draft = validate_draft(&title(), &content());
            let (draft_title, draft_content) = match draft {
                Ok(pair) => pair,
                Err(message) => {
                    notify_user(&message);
                    return;
                }
            };

            saving.set(true);
            let client = client.clone();
            spawn(async move {
                let mut session = session;
                let mut notes = notes;
                let mut title = title;
                let mut content = content;
                let mut saving = saving;

                let user_id = session.with_mut(|s| s.identity_or_anonymous());
                let token = session.peek().access_token().map(str::to_string);
                let object_name = note_object_name(&draft_title);
                let path = note_object_path(&user_id, &object_name);

                match client
                    .upload_object(
                        BUCKET_NOTES,
                        &path,
                        draft_content.clone().into_bytes(),
                        "text/plain",
                        true,
                        token.as_deref(),
                    )
                    .await
                {
                    Ok(()) => {
                        // Optimistic upsert; the reload below reconciles.
                        let display_title = title_from_object_name(&object_name);
                        notes.with_mut(|store| {
                            store.upsert(Note::new(display_title, draft_content))
                        });
                        title.set(String::new());
                        content.set(String::new());
                        notify_user("Note saved successfully!");
                        refresh_notes(client, user_id, token, notes, notes_guard).await;
                    }
                    Err(err) => {
                        log_error("notes", &format!("saving \"{object_name}\" failed: {err}"));
                        notify_user(&format!("Failed to save note: {err}"));
                    }
                }

                saving.set(false);
            });
        }
    };

    let on_logout = {
        let client = client.clone();
        move |_| {
            let client = client.clone();
            spawn(async move {
                let mut session = session;
                let mut cache = cache;
                let mut playlist = playlist;
                let mut playback = playback;
                let mut notes = notes;

                if let Some(token) = session.peek().access_token().map(str::to_string) {
                    if let Err(err) = client.sign_out(&token).await {
                        log_error("auth", &format!("sign-out failed: {err}"));
                        return;
                    }
                }

                // End of session: wipe client-side state, release cached URLs.
                session.with_mut(|s| s.clear());
                if let Err(err) = db::clear_session().await {
                    log_error("db", &format!("failed to clear saved session: {err}"));
                }
                cache.with_mut(|c| c.release_all());
                playlist.with_mut(|p| p.clear());
                playback.with_mut(|p| p.clear());
                notes.with_mut(|s| s.clear());
                clear_audio_source();
                navigator.replace(Route::Auth {});
            });
        }
    };

    let session_now = session();
    let user_email = session_now
        .user_email()
        .unwrap_or("No email associated with this account")
        .to_string();
    let current_title = title();
    let note_list = notes().notes().to_vec();

    rsx! {
        div { class: "bg-[#22221E]",
            div { class: "flex flex-col justify-center items-center h-screen",
                div { class: "absolute top-4 left-4",
                    button {
                        class: "text-white hover:opacity-90",
                        onclick: move |_| {
                            navigator.push(Route::Home {});
                        },
                        "Audio"
                    }
                }
                div { class: "absolute top-4 right-4 flex flex-col items-end",
                    p { class: "text-white", "{user_email}" }
                    button {
                        class: "mb-[5%] text-white hover:opacity-90",
                        onclick: on_logout,
                        "Log Out"
                    }
                }
                div { class: "flex flex-row bg-[#59ADFD] shadow-xl h-[60%] w-[70%] rounded-[10px] text-gray-800",
                    div { class: "bg-[#3F82FD] w-[25%] pl-4 pr-4 rounded-[10px]",
                        div { class: "flex flex-col gap-4 pt-4",
                            for note in note_list {
                                div {
                                    key: "{note.title}",
                                    class: if current_title == note.title { "flex justify-center hover:cursor-pointer pt-3 px-2 break-words whitespace-normal overflow-hidden text-xl font-bold" } else { "flex justify-center hover:cursor-pointer pt-3 px-2 break-words whitespace-normal overflow-hidden text-xl" },
                                    onclick: {
                                        let note = note.clone();
                                        move |_| {
                                            // Switching notes replaces the edit
                                            // buffer; unsaved edits are discarded.
                                            title.set(note.title.clone());
                                            content.set(note.content.clone());
                                        }
                                    },
                                    "{note.title}"
                                }
                            }
                        }
                    }
                    div { class: "flex flex-col justify-center items-center w-[75%] pl-4 pr-4",
                        div { class: "flex flex-col justify-center items-center mb-4",
                            input {
                                value: "{title}",
                                oninput: move |e| title.set(e.value()),
                                class: "text-sm font-bold p-1 rounded-[4px]",
                                placeholder: "Title...",
                            }
                        }
                        div { class: "flex flex-col justify-center items-center w-[75%] pl-4 pr-4",
                            textarea {
                                value: "{content}",
                                oninput: move |e| content.set(e.value()),
                                class: "resize-none rounded-[10px] w-[700px] h-[400px] p-3",
                                name: "textarea",
                            }
                        }
                        div { class: "flex flex-col justify-center items-center w-full mt-4",
                            button {
                                class: "mt-4 bg-[#22221E] text-white px-4 py-2 rounded-lg hover:opacity-90",
                                disabled: saving(),
                                onclick: on_save,
                                "Save Note"
                            }
                        }
                    }
                }
            }
        }
    }
}
