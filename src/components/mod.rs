//! The components module contains all shared components for our app.

use dioxus::prelude::*;

mod app;
mod audio;
mod icons;
mod player;
mod views;

pub use app::*;
pub use audio::*;
pub use icons::*;
pub use player::*;

use views::{Auth, Home, Notes};

#[derive(Debug, Clone, Routable, PartialEq)]
pub enum Route {
    #[layout(AppShell)]
    #[redirect("/home", || Route::Home {})]
    #[route("/")]
    Home {},
    #[route("/note")]
    Notes {},
    #[route("/auth")]
    Auth {},
}
