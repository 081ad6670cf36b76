use dioxus::prelude::*;

#[component]
pub fn Icon(name: String, class: String) -> Element {
    let svg_content = match name.as_str() {
        "play" => rsx! {
            svg {
                class: "{class}",
                view_box: "0 0 24 24",
                fill: "currentColor",
                stroke: "none",
                polygon { points: "6 3 20 12 6 21 6 3" }
            }
        },
        "pause" => rsx! {
            svg {
                class: "{class}",
                view_box: "0 0 24 24",
                fill: "currentColor",
                stroke: "none",
                rect { x: "5", y: "4", width: "5", height: "16", rx: "1" }
                rect { x: "14", y: "4", width: "5", height: "16", rx: "1" }
            }
        },
        "skip-back" => rsx! {
            svg {
                class: "{class}",
                view_box: "0 0 24 24",
                fill: "currentColor",
                stroke: "none",
                polygon { points: "19 20 9 12 19 4 19 20" }
                rect { x: "5", y: "4", width: "2", height: "16" }
            }
        },
        "skip-forward" => rsx! {
            svg {
                class: "{class}",
                view_box: "0 0 24 24",
                fill: "currentColor",
                stroke: "none",
                polygon { points: "5 4 15 12 5 20 5 4" }
                rect { x: "17", y: "4", width: "2", height: "16" }
            }
        },
        "music" => rsx! {
            svg {
                class: "{class}",
                view_box: "0 0 24 24",
                fill: "none",
                stroke: "currentColor",
                stroke_width: "2",
                path { d: "M9 18V5l12-2v13" }
                circle { cx: "6", cy: "18", r: "3" }
                circle { cx: "18", cy: "16", r: "3" }
            }
        },
        _ => rsx! {
            svg { class: "{class}", view_box: "0 0 24 24" }
        },
    };

    svg_content
}
