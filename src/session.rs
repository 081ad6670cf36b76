//! Session state and identity resolution.
//!
//! The identity is resolved at most once per page session and memoized,
//! including the `anonymous` fallback. Held in a signal owned by the app
//! shell rather than in module-level statics, so its lifecycle is the page
//! session and nothing else.

use crate::api::{AuthSession, AuthUser};

/// Fallback identity used to namespace storage paths when no user can be
/// resolved. A valid value, not an error.
pub const ANONYMOUS_USER: &str = "anonymous";

#[derive(Debug, Clone, Default, PartialEq)]
pub struct SessionStore {
    session: Option<AuthSession>,
    resolved: Option<String>,
}

impl SessionStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Adopt a session restored from client-side persistence. The identity
    /// still has to be confirmed against the collaborator before it counts
    /// as resolved.
    pub fn restore(&mut self, session: AuthSession) {
        self.session = Some(session);
    }

    /// Adopt a freshly established sign-in. This is a session boundary: the
    /// new user id becomes the memoized identity.
    pub fn establish(&mut self, session: AuthSession) {
        self.resolved = Some(session.user.id.clone());
        self.session = Some(session);
    }

    /// Sign-out / teardown. Clears both the tokens and the memoized identity.
    pub fn clear(&mut self) {
        self.session = None;
        self.resolved = None;
    }

    pub fn is_authenticated(&self) -> bool {
        self.session.is_some()
    }

    pub fn access_token(&self) -> Option<&str> {
        self.session.as_ref().map(|s| s.access_token.as_str())
    }

    pub fn user_email(&self) -> Option<&str> {
        self.session
            .as_ref()
            .and_then(|s| s.user.email.as_deref())
            .filter(|email| !email.trim().is_empty())
    }

    /// The memoized identity, if one has been resolved this session.
    pub fn resolved_id(&self) -> Option<&str> {
        self.resolved.as_deref()
    }

    /// Memoize the outcome of an identity lookup. The first resolution wins
    /// for the rest of the page session; later calls return it unchanged and
    /// never re-resolve. `None` memoizes the `anonymous` fallback.
    pub fn resolve_from(&mut self, user: Option<AuthUser>) -> String {
        if let Some(existing) = &self.resolved {
            return existing.clone();
        }
        let id = user
            .map(|u| u.id)
            .filter(|id| !id.trim().is_empty())
            .unwrap_or_else(|| ANONYMOUS_USER.to_string());
        self.resolved = Some(id.clone());
        id
    }

    /// The identity to namespace storage paths with, resolving to the
    /// anonymous fallback when nothing better is known.
    pub fn identity_or_anonymous(&mut self) -> String {
        match &self.resolved {
            Some(id) => id.clone(),
            None => {
                let user = self.session.as_ref().map(|s| s.user.clone());
                self.resolve_from(user)
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn session_for(id: &str, email: Option<&str>) -> AuthSession {
        AuthSession {
            access_token: format!("token-{id}"),
            refresh_token: None,
            user: AuthUser {
                id: id.to_string(),
                email: email.map(str::to_string),
            },
        }
    }

    #[test]
    fn first_resolution_is_memoized() {
        let mut store = SessionStore::new();
        let user = AuthUser {
            id: "user-1".into(),
            email: None,
        };
        assert_eq!(store.resolve_from(Some(user)), "user-1");
        // A later lookup with a different answer does not re-resolve.
        assert_eq!(
            store.resolve_from(Some(AuthUser {
                id: "user-2".into(),
                email: None
            })),
            "user-1"
        );
        assert_eq!(store.resolved_id(), Some("user-1"));
    }

    #[test]
    fn anonymous_fallback_is_memoized_too() {
        let mut store = SessionStore::new();
        assert_eq!(store.resolve_from(None), ANONYMOUS_USER);
        assert_eq!(
            store.resolve_from(Some(AuthUser {
                id: "late".into(),
                email: None
            })),
            ANONYMOUS_USER
        );
    }

    #[test]
    fn establish_starts_a_new_resolved_session() {
        let mut store = SessionStore::new();
        assert_eq!(store.resolve_from(None), ANONYMOUS_USER);

        store.establish(session_for("user-9", Some("u@example.com")));
        assert_eq!(store.resolved_id(), Some("user-9"));
        assert!(store.is_authenticated());
        assert_eq!(store.access_token(), Some("token-user-9"));
        assert_eq!(store.user_email(), Some("u@example.com"));
    }

    #[test]
    fn restore_keeps_identity_unresolved() {
        let mut store = SessionStore::new();
        store.restore(session_for("user-3", None));
        assert!(store.is_authenticated());
        assert_eq!(store.resolved_id(), None);
        assert_eq!(store.identity_or_anonymous(), "user-3");
    }

    #[test]
    fn clear_resets_everything() {
        let mut store = SessionStore::new();
        store.establish(session_for("user-1", None));
        store.clear();
        assert!(!store.is_authenticated());
        assert_eq!(store.resolved_id(), None);
        assert_eq!(store.access_token(), None);
    }

    #[test]
    fn blank_emails_are_treated_as_missing() {
        let mut store = SessionStore::new();
        store.establish(session_for("user-1", Some("  ")));
        assert_eq!(store.user_email(), None);
    }
}
