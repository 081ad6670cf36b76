//! Browser audio element glue. Keeps media side-effects isolated from the
//! component render cycle; state transitions stay in the playback store.

use dioxus::prelude::*;

use crate::stores::PlaybackSession;

#[cfg(target_arch = "wasm32")]
use wasm_bindgen::JsCast;
#[cfg(target_arch = "wasm32")]
use web_sys::{window, HtmlAudioElement};

pub const AUDIO_ELEMENT_ID: &str = "chelly-audio";

/// How often the controller mirrors element state into signals.
#[cfg(target_arch = "wasm32")]
const POLL_INTERVAL_MS: u32 = 200;

/// A media element failure, tagged with the entry that was loaded.
#[derive(Debug, Clone, PartialEq)]
pub struct MediaFailure {
    pub name: String,
    pub code: u16,
}

impl MediaFailure {
    /// Error codes that suggest the source URL went stale rather than the
    /// bytes being undecodable: network failure (2) or no usable source (4).
    pub fn suggests_stale_url(&self) -> bool {
        matches!(self.code, 2 | 4)
    }

    pub fn user_message(&self) -> String {
        match self.code {
            1 => format!("Playback of \"{}\" was aborted before it loaded.", self.name),
            2 => format!("Network error while loading \"{}\".", self.name),
            3 => format!("\"{}\" could not be decoded.", self.name),
            4 => format!("No supported source was found for \"{}\".", self.name),
            _ => format!("Unable to play \"{}\".", self.name),
        }
    }
}

/// Signal carrying the latest unhandled media failure.
#[derive(Clone, Copy)]
pub struct PlaybackErrorSignal(pub Signal<Option<MediaFailure>>);

/// Initialize the shared audio element once.
#[cfg(target_arch = "wasm32")]
pub fn get_or_create_audio_element() -> Option<HtmlAudioElement> {
    let document = window()?.document()?;

    if let Some(existing) = document.get_element_by_id(AUDIO_ELEMENT_ID) {
        return existing.dyn_into::<HtmlAudioElement>().ok();
    }

    let audio: HtmlAudioElement = document.create_element("audio").ok()?.dyn_into().ok()?;
    audio.set_id(AUDIO_ELEMENT_ID);
    audio.set_attribute("preload", "metadata").ok()?;
    document.body()?.append_child(&audio).ok()?;

    Some(audio)
}

#[cfg(not(target_arch = "wasm32"))]
#[allow(dead_code)]
pub fn get_or_create_audio_element() -> Option<()> {
    None
}

/// Point the element at a new source and make it reload.
#[cfg(target_arch = "wasm32")]
pub fn set_audio_source(url: &str) {
    if let Some(audio) = get_or_create_audio_element() {
        audio.set_src(url);
        audio.load();
    }
}

#[cfg(not(target_arch = "wasm32"))]
pub fn set_audio_source(_url: &str) {}

#[cfg(target_arch = "wasm32")]
pub fn clear_audio_source() {
    if let Some(audio) = get_or_create_audio_element() {
        audio.set_src("");
    }
}

#[cfg(not(target_arch = "wasm32"))]
pub fn clear_audio_source() {}

#[cfg(target_arch = "wasm32")]
pub fn play_audio() {
    if let Some(audio) = get_or_create_audio_element() {
        if let Ok(promise) = audio.play() {
            spawn(async move {
                let _ = wasm_bindgen_futures::JsFuture::from(promise).await;
            });
        }
    }
}

#[cfg(not(target_arch = "wasm32"))]
pub fn play_audio() {}

#[cfg(target_arch = "wasm32")]
pub fn pause_audio() {
    if let Some(audio) = get_or_create_audio_element() {
        let _ = audio.pause();
    }
}

#[cfg(not(target_arch = "wasm32"))]
pub fn pause_audio() {}

#[cfg(target_arch = "wasm32")]
fn media_error_code(audio: &HtmlAudioElement) -> Option<u16> {
    let audio_js = wasm_bindgen::JsValue::from(audio.clone());
    let error_js = js_sys::Reflect::get(&audio_js, &"error".into()).ok()?;
    if error_js.is_null() || error_js.is_undefined() {
        return None;
    }
    let code = js_sys::Reflect::get(&error_js, &"code".into())
        .ok()
        .and_then(|value| value.as_f64())
        .unwrap_or(0.0) as u16;
    Some(code)
}

/// Wrap picked file bytes in a page-local object URL for instant playback.
#[cfg(target_arch = "wasm32")]
pub fn create_blob_url(bytes: &[u8]) -> Option<String> {
    let parts = js_sys::Array::new();
    parts.push(&js_sys::Uint8Array::from(bytes).into());
    let blob = web_sys::Blob::new_with_u8_array_sequence(parts.as_ref()).ok()?;
    web_sys::Url::create_object_url_with_blob(&blob).ok()
}

#[cfg(not(target_arch = "wasm32"))]
pub fn create_blob_url(_bytes: &[u8]) -> Option<String> {
    None
}

/// Programmatic click, used to open the hidden file input.
#[cfg(target_arch = "wasm32")]
pub fn click_element(id: &str) {
    if let Some(doc) = window().and_then(|w| w.document()) {
        if let Some(element) = doc.get_element_by_id(id) {
            if let Ok(html) = element.dyn_into::<web_sys::HtmlElement>() {
                html.click();
            }
        }
    }
}

#[cfg(not(target_arch = "wasm32"))]
pub fn click_element(_id: &str) {}

/// Audio controller - watches the media element outside the render cycle and
/// mirrors end-of-track and failure states into the shared signals.
#[cfg(target_arch = "wasm32")]
#[component]
pub fn AudioController() -> Element {
    let mut playback = use_context::<Signal<PlaybackSession>>();
    let mut playback_error = use_context::<PlaybackErrorSignal>().0;

    use_effect(move || {
        let Some(_audio) = get_or_create_audio_element() else {
            return;
        };

        spawn(async move {
            let mut playback = playback;
            let mut playback_error = playback_error;
            let mut ended_for: Option<String> = None;
            let mut error_reported_for: Option<String> = None;

            loop {
                gloo_timers::future::TimeoutFuture::new(POLL_INTERVAL_MS).await;

                let Some(audio) = get_or_create_audio_element() else {
                    continue;
                };
                let current = playback.peek().current().map(str::to_string);
                if current.is_none() {
                    ended_for = None;
                    error_reported_for = None;
                    continue;
                }

                match media_error_code(&audio) {
                    Some(code) => {
                        if error_reported_for != current {
                            error_reported_for = current.clone();
                            if let Some(name) = current.clone() {
                                playback_error.set(Some(MediaFailure { name, code }));
                            }
                        }
                        continue;
                    }
                    None => {
                        // A successful (re)load resets the report latch.
                        error_reported_for = None;
                    }
                }

                if audio.ended() {
                    if ended_for != current {
                        ended_for = current.clone();
                        playback.with_mut(|session| session.media_ended());
                    }
                } else {
                    ended_for = None;
                }
            }
        });
    });

    rsx! {}
}

#[cfg(not(target_arch = "wasm32"))]
#[component]
pub fn AudioController() -> Element {
    // Media playback needs a browser; native builds only exercise the stores.
    let _playback = use_context::<Signal<PlaybackSession>>();
    let _playback_error = use_context::<PlaybackErrorSignal>().0;
    rsx! {}
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn stale_url_detection_matches_network_and_source_errors() {
        let network = MediaFailure {
            name: "a.mp3".into(),
            code: 2,
        };
        let unsupported = MediaFailure {
            name: "a.mp3".into(),
            code: 4,
        };
        let decode = MediaFailure {
            name: "a.mp3".into(),
            code: 3,
        };
        assert!(network.suggests_stale_url());
        assert!(unsupported.suggests_stale_url());
        assert!(!decode.suggests_stale_url());
    }
}
