mod auth;
mod home;
mod notes;

pub use auth::Auth;
pub use home::Home;
pub use notes::Notes;

use crate::api::SupabaseClient;
use crate::diagnostics::log_error;
use crate::session::SessionStore;
use dioxus::prelude::*;

/// Confirm a usable identity for the current page session.
///
/// Resolution is memoized in the session store, so the identity collaborator
/// is queried at most once per session no matter which view asks first.
/// Returns `None` when there is no signed-in session or the lookup fails;
/// callers treat that as a hard redirect to the auth view.
pub(crate) async fn ensure_identity(
    client: &SupabaseClient,
    mut session: Signal<SessionStore>,
) -> Option<String> {
    if let Some(id) = session.peek().resolved_id().map(str::to_string) {
        return Some(id);
    }

    let token = session.peek().access_token().map(str::to_string)?;
    match client.current_user(&token).await {
        Ok(user) => Some(session.with_mut(|s| s.resolve_from(Some(user)))),
        Err(err) => {
            log_error("auth", &format!("identity lookup failed: {err}"));
            None
        }
    }
}
