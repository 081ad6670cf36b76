use serde::{Deserialize, Serialize};

/// Connection details for the hosted backend.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BackendConfig {
    pub url: String,
    pub anon_key: String,
}

const DEFAULT_BACKEND_URL: &str = "https://chelly-demo.supabase.co";
const DEFAULT_BACKEND_ANON_KEY: &str = "sb_publishable_chelly_demo_key";

impl BackendConfig {
    pub fn new(url: impl Into<String>, anon_key: impl Into<String>) -> Self {
        Self {
            url: url.into().trim_end_matches('/').to_string(),
            anon_key: anon_key.into(),
        }
    }

    /// Project URL and publishable key are baked in at build time; the env
    /// vars let a deployment point at its own project without code changes.
    pub fn from_env() -> Self {
        Self::new(
            option_env!("SUPABASE_URL").unwrap_or(DEFAULT_BACKEND_URL),
            option_env!("SUPABASE_ANON_KEY").unwrap_or(DEFAULT_BACKEND_ANON_KEY),
        )
    }
}

/// The authenticated user as the identity collaborator reports it.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Default)]
pub struct AuthUser {
    pub id: String,
    #[serde(default)]
    pub email: Option<String>,
}

/// An established sign-in: bearer token plus the user it belongs to.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AuthSession {
    pub access_token: String,
    #[serde(default)]
    pub refresh_token: Option<String>,
    pub user: AuthUser,
}

/// Outcome of a sign-up attempt. Projects with email confirmation enabled
/// return a user but no session until the address is confirmed.
#[derive(Debug, Clone, PartialEq)]
pub enum SignUpOutcome {
    SignedIn(AuthSession),
    ConfirmationRequired,
}

/// One object from a storage listing. Only the name matters to the client;
/// everything else in the payload is ignored.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Default)]
pub struct StoredObject {
    pub name: String,
}

#[derive(Debug, Deserialize)]
pub(crate) struct SignedUrlResponse {
    #[serde(rename = "signedURL", alias = "signedUrl")]
    pub signed_url: String,
}
