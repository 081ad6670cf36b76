use crate::components::Icon;
use dioxus::prelude::*;

/// Transport controls: previous / play-pause / next. Pure presentation; the
/// owning view wires the intents into the playback session.
#[component]
pub fn PlayerControls(
    is_playing: bool,
    on_previous: EventHandler<()>,
    on_toggle: EventHandler<()>,
    on_next: EventHandler<()>,
) -> Element {
    rsx! {
        div { class: "flex flex-row justify-center",
            button {
                id: "prev-btn",
                class: "ml-4 hover:opacity-[75%] hover:cursor-pointer active:opacity-[55%]",
                aria_label: "Previous track",
                onclick: move |_| on_previous.call(()),
                Icon {
                    name: "skip-back".to_string(),
                    class: "w-16 h-16".to_string(),
                }
            }
            button {
                id: "play-pause-btn",
                class: "hover:opacity-[75%] hover:cursor-pointer active:opacity-[55%]",
                aria_label: if is_playing { "Pause" } else { "Play" },
                onclick: move |_| on_toggle.call(()),
                Icon {
                    name: if is_playing { "pause".to_string() } else { "play".to_string() },
                    class: "w-16 h-16".to_string(),
                }
            }
            button {
                id: "next-btn",
                class: "mr-4 hover:opacity-[75%] hover:cursor-pointer active:opacity-[55%]",
                aria_label: "Next track",
                onclick: move |_| on_next.call(()),
                Icon {
                    name: "skip-forward".to_string(),
                    class: "w-16 h-16".to_string(),
                }
            }
        }
    }
}
