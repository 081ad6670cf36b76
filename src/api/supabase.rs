//! Client for the hosted backend (Supabase-style REST): authentication and
//! per-user object storage, consumed strictly through its public interface.

use crate::api::models::*;
use once_cell::sync::Lazy;
use serde_json::json;

static HTTP_CLIENT: Lazy<reqwest::Client> = Lazy::new(reqwest::Client::new);

/// Bucket holding uploaded audio files, one folder per user.
pub const BUCKET_AUDIO: &str = "audio-storage";
/// Bucket holding note text objects, one folder per user.
pub const BUCKET_NOTES: &str = "notes-storage";

/// Hard deadline applied to every collaborator call. There is no retry or
/// backoff behind it; a timeout surfaces like any other failed request.
const REQUEST_TIMEOUT_SECS: u64 = 20;

const LIST_PAGE_LIMIT: u32 = 1000;

#[derive(Debug, Clone)]
pub struct SupabaseClient {
    pub config: BackendConfig,
}

impl SupabaseClient {
    pub fn new(config: BackendConfig) -> Self {
        Self { config }
    }

    fn auth_url(&self, endpoint: &str) -> String {
        format!("{}/auth/v1/{}", self.config.url, endpoint)
    }

    fn storage_url(&self, endpoint: &str) -> String {
        format!("{}/storage/v1/{}", self.config.url, endpoint)
    }

    fn bearer(&self, access_token: Option<&str>) -> String {
        format!(
            "Bearer {}",
            access_token.unwrap_or(self.config.anon_key.as_str())
        )
    }

    fn authorized(
        &self,
        request: reqwest::RequestBuilder,
        access_token: Option<&str>,
    ) -> reqwest::RequestBuilder {
        request
            .header("apikey", self.config.anon_key.as_str())
            .header("Authorization", self.bearer(access_token))
    }

    // --- Identity -----------------------------------------------------------

    pub async fn sign_up(&self, email: &str, password: &str) -> Result<SignUpOutcome, String> {
        let request = self
            .authorized(HTTP_CLIENT.post(self.auth_url("signup")), None)
            .json(&json!({ "email": email, "password": password }));
        let response = expect_success(send_request(request).await?).await?;
        let body = response.text().await.map_err(|e| e.to_string())?;

        // A project with email confirmation enabled answers with a bare user
        // record; only a confirmed (or auto-confirmed) account gets tokens.
        match serde_json::from_str::<AuthSession>(&body) {
            Ok(session) => Ok(SignUpOutcome::SignedIn(session)),
            Err(_) => Ok(SignUpOutcome::ConfirmationRequired),
        }
    }

    pub async fn sign_in(&self, email: &str, password: &str) -> Result<AuthSession, String> {
        let request = self
            .authorized(
                HTTP_CLIENT.post(format!(
                    "{}?grant_type=password",
                    self.auth_url("token")
                )),
                None,
            )
            .json(&json!({ "email": email, "password": password }));
        let response = expect_success(send_request(request).await?).await?;
        response
            .json::<AuthSession>()
            .await
            .map_err(|e| e.to_string())
    }

    pub async fn current_user(&self, access_token: &str) -> Result<AuthUser, String> {
        let request = self.authorized(
            HTTP_CLIENT.get(self.auth_url("user")),
            Some(access_token),
        );
        let response = expect_success(send_request(request).await?).await?;
        response.json::<AuthUser>().await.map_err(|e| e.to_string())
    }

    pub async fn sign_out(&self, access_token: &str) -> Result<(), String> {
        let request = self.authorized(
            HTTP_CLIENT.post(self.auth_url("logout")),
            Some(access_token),
        );
        expect_success(send_request(request).await?).await?;
        Ok(())
    }

    // --- Object storage -----------------------------------------------------

    pub async fn upload_object(
        &self,
        bucket: &str,
        path: &str,
        bytes: Vec<u8>,
        content_type: &str,
        upsert: bool,
        access_token: Option<&str>,
    ) -> Result<(), String> {
        let url = self.storage_url(&format!("object/{}/{}", bucket, encode_object_path(path)));
        let mut request = self
            .authorized(HTTP_CLIENT.post(url), access_token)
            .header("Content-Type", content_type)
            .body(bytes);
        if upsert {
            request = request.header("x-upsert", "true");
        }
        expect_success(send_request(request).await?).await?;
        Ok(())
    }

    pub async fn list_objects(
        &self,
        bucket: &str,
        prefix: &str,
        access_token: Option<&str>,
    ) -> Result<Vec<StoredObject>, String> {
        let url = self.storage_url(&format!("object/list/{bucket}"));
        let request = self.authorized(HTTP_CLIENT.post(url), access_token).json(&json!({
            "prefix": prefix,
            "limit": LIST_PAGE_LIMIT,
            "offset": 0,
            "sortBy": { "column": "name", "order": "asc" },
        }));
        let response = expect_success(send_request(request).await?).await?;
        response
            .json::<Vec<StoredObject>>()
            .await
            .map_err(|e| e.to_string())
    }

    /// Ask the storage collaborator for a time-limited read URL.
    pub async fn create_signed_url(
        &self,
        bucket: &str,
        path: &str,
        expires_in_secs: u32,
        access_token: Option<&str>,
    ) -> Result<String, String> {
        let url = self.storage_url(&format!(
            "object/sign/{}/{}",
            bucket,
            encode_object_path(path)
        ));
        let request = self
            .authorized(HTTP_CLIENT.post(url), access_token)
            .json(&json!({ "expiresIn": expires_in_secs }));
        let response = expect_success(send_request(request).await?).await?;
        let signed = response
            .json::<SignedUrlResponse>()
            .await
            .map_err(|e| e.to_string())?;
        Ok(resolve_signed_url(&self.config.url, &signed.signed_url))
    }

    pub async fn download_object(
        &self,
        bucket: &str,
        path: &str,
        access_token: Option<&str>,
    ) -> Result<Vec<u8>, String> {
        let url = self.storage_url(&format!(
            "object/authenticated/{}/{}",
            bucket,
            encode_object_path(path)
        ));
        let request = self.authorized(HTTP_CLIENT.get(url), access_token);
        let response = expect_success(send_request(request).await?).await?;
        response
            .bytes()
            .await
            .map(|bytes| bytes.to_vec())
            .map_err(|e| e.to_string())
    }
}

async fn send_request(request: reqwest::RequestBuilder) -> Result<reqwest::Response, String> {
    with_timeout(async move { request.send().await }).await
}

async fn expect_success(response: reqwest::Response) -> Result<reqwest::Response, String> {
    let status = response.status();
    if status.is_success() {
        return Ok(response);
    }
    let body = response.text().await.unwrap_or_default();
    Err(error_message(status.as_u16(), &body))
}

#[cfg(not(target_arch = "wasm32"))]
async fn with_timeout<T, E, F>(future: F) -> Result<T, String>
where
    F: std::future::Future<Output = Result<T, E>>,
    E: ToString,
{
    match tokio::time::timeout(
        std::time::Duration::from_secs(REQUEST_TIMEOUT_SECS),
        future,
    )
    .await
    {
        Ok(result) => result.map_err(|e| e.to_string()),
        Err(_) => Err(format!(
            "Request timed out after {REQUEST_TIMEOUT_SECS} seconds."
        )),
    }
}

#[cfg(target_arch = "wasm32")]
async fn with_timeout<T, E, F>(future: F) -> Result<T, String>
where
    F: std::future::Future<Output = Result<T, E>>,
    E: ToString,
{
    use futures_util::future::{select, Either};

    let deadline = gloo_timers::future::TimeoutFuture::new((REQUEST_TIMEOUT_SECS * 1000) as u32);
    futures_util::pin_mut!(future);
    futures_util::pin_mut!(deadline);
    match select(future, deadline).await {
        Either::Left((result, _)) => result.map_err(|e| e.to_string()),
        Either::Right(_) => Err(format!(
            "Request timed out after {REQUEST_TIMEOUT_SECS} seconds."
        )),
    }
}

/// Percent-encode each path segment while keeping the separators.
fn encode_object_path(path: &str) -> String {
    path.split('/')
        .map(|segment| urlencoding::encode(segment).into_owned())
        .collect::<Vec<_>>()
        .join("/")
}

/// The sign endpoint answers with a path relative to the storage root;
/// older deployments have returned absolute URLs or `/storage/v1/...`.
fn resolve_signed_url(base_url: &str, signed: &str) -> String {
    if signed.starts_with("http://") || signed.starts_with("https://") {
        return signed.to_string();
    }
    let relative = signed.trim_start_matches('/');
    let relative = relative.strip_prefix("storage/v1/").unwrap_or(relative);
    format!("{base_url}/storage/v1/{relative}")
}

fn json_pick_string(value: &serde_json::Value, keys: &[&str]) -> Option<String> {
    let object = value.as_object()?;
    for key in keys {
        if let Some(serde_json::Value::String(text)) = object.get(*key) {
            let trimmed = text.trim();
            if !trimmed.is_empty() {
                return Some(trimmed.to_string());
            }
        }
    }
    None
}

/// Prefer the human-readable message the backend puts in its error body;
/// fall back to the bare status code.
fn error_message(status: u16, body: &str) -> String {
    serde_json::from_str::<serde_json::Value>(body)
        .ok()
        .and_then(|value| {
            json_pick_string(&value, &["msg", "message", "error_description", "error"])
        })
        .unwrap_or_else(|| format!("Request failed with status {status}"))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn object_paths_are_encoded_per_segment() {
        assert_eq!(
            encode_object_path("user-1/audio/My_Song__.mp3"),
            "user-1/audio/My_Song__.mp3"
        );
        assert_eq!(
            encode_object_path("user 1/notes/a#b.txt"),
            "user%201/notes/a%23b.txt"
        );
    }

    #[test]
    fn signed_urls_are_resolved_against_the_storage_root() {
        let base = "https://proj.supabase.co";
        assert_eq!(
            resolve_signed_url(base, "/object/sign/audio-storage/u/a.mp3?token=abc"),
            "https://proj.supabase.co/storage/v1/object/sign/audio-storage/u/a.mp3?token=abc"
        );
        assert_eq!(
            resolve_signed_url(base, "/storage/v1/object/sign/b?token=x"),
            "https://proj.supabase.co/storage/v1/object/sign/b?token=x"
        );
        assert_eq!(
            resolve_signed_url(base, "https://cdn.example/object?token=x"),
            "https://cdn.example/object?token=x"
        );
    }

    #[test]
    fn error_messages_prefer_the_backend_body() {
        assert_eq!(
            error_message(400, r#"{"msg":"Invalid login credentials"}"#),
            "Invalid login credentials"
        );
        assert_eq!(
            error_message(409, r#"{"error":"Duplicate","message":"The resource already exists"}"#),
            "The resource already exists"
        );
        assert_eq!(
            error_message(500, "not json"),
            "Request failed with status 500"
        );
    }
}
