//! Thin HTTP client mirroring the REST surface, one method per endpoint,
//! with file-backed persistence of the access token between runs.

use reqwest::{RequestBuilder, StatusCode};
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use serde_json::json;
use std::path::PathBuf;

use crate::db::models::{BookmarkView, UserView};
use crate::handlers::auth::TokenResponse;
use crate::handlers::stats::StatsResponse;

#[derive(Debug, thiserror::Error)]
pub enum ClientError {
    #[error("transport error: {0}")]
    Transport(#[from] reqwest::Error),

    #[error("{code}: {message}")]
    Api {
        status: StatusCode,
        code: String,
        message: String,
    },

    #[error("token store error: {0}")]
    TokenStore(#[from] std::io::Error),

    #[error("not logged in")]
    NotLoggedIn,
}

/// Error body as the server puts it on the wire.
#[derive(Debug, Deserialize)]
struct WireError {
    message: String,
    error: String,
}

/// Persists the access token to a file so a new client starts where the last
/// one left off.
pub struct TokenStore {
    path: PathBuf,
}

impl TokenStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn load(&self) -> Option<String> {
        std::fs::read_to_string(&self.path)
            .ok()
            .map(|raw| raw.trim().to_string())
            .filter(|token| !token.is_empty())
    }

    pub fn save(&self, token: &str) -> Result<(), std::io::Error> {
        if let Some(parent) = self.path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        std::fs::write(&self.path, token)
    }

    pub fn clear(&self) -> Result<(), std::io::Error> {
        match std::fs::remove_file(&self.path) {
            Err(e) if e.kind() != std::io::ErrorKind::NotFound => Err(e),
            _ => Ok(()),
        }
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct NewBookmark {
    pub title: String,
    pub url: String,
    pub category: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub status: Option<String>,
}

/// Partial update; absent fields are left untouched server-side.
#[derive(Debug, Clone, Default, Serialize)]
pub struct BookmarkPatch {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub url: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub category: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub status: Option<String>,
}

pub struct ApiClient {
    base_url: String,
    http: reqwest::Client,
    store: TokenStore,
    token: Option<String>,
}

impl ApiClient {
    /// A client rooted at `base_url`, resuming any token persisted at
    /// `token_path`.
    pub fn new(base_url: impl Into<String>, token_path: impl Into<PathBuf>) -> Self {
        let store = TokenStore::new(token_path);
        let token = store.load();
        Self {
            base_url: base_url.into(),
            http: reqwest::Client::new(),
            store,
            token,
        }
    }

    pub fn token(&self) -> Option<&str> {
        self.token.as_deref()
    }

    pub async fn register(
        &self,
        name: &str,
        email: &str,
        password: &str,
    ) -> Result<UserView, ClientError> {
        self.execute(self.http.post(self.url("/auth/register")).json(&json!({
            "name": name,
            "email": email,
            "password": password,
        })))
        .await
    }

    /// On success the token is persisted and used for subsequent requests.
    pub async fn login(&mut self, email: &str, password: &str) -> Result<TokenResponse, ClientError> {
        let response: TokenResponse = self
            .execute(self.http.post(self.url("/auth/login")).json(&json!({
                "email": email,
                "password": password,
            })))
            .await?;
        self.store.save(&response.access_token)?;
        self.token = Some(response.access_token.clone());
        Ok(response)
    }

    pub fn logout(&mut self) -> Result<(), ClientError> {
        self.store.clear()?;
        self.token = None;
        Ok(())
    }

    pub async fn me(&self) -> Result<UserView, ClientError> {
        self.execute(self.authed(self.http.get(self.url("/me")))?)
            .await
    }

    pub async fn create_bookmark(&self, bookmark: &NewBookmark) -> Result<BookmarkView, ClientError> {
        self.execute(self.authed(self.http.post(self.url("/bookmarks")))?.json(bookmark))
            .await
    }

    pub async fn bookmarks(&self) -> Result<Vec<BookmarkView>, ClientError> {
        self.execute(self.authed(self.http.get(self.url("/bookmarks")))?)
            .await
    }

    pub async fn bookmark(&self, id: i64) -> Result<BookmarkView, ClientError> {
        self.execute(self.authed(self.http.get(self.url(&format!("/bookmarks/{id}"))))?)
            .await
    }

    pub async fn update_bookmark(
        &self,
        id: i64,
        patch: &BookmarkPatch,
    ) -> Result<BookmarkView, ClientError> {
        self.execute(
            self.authed(self.http.put(self.url(&format!("/bookmarks/{id}"))))?
                .json(patch),
        )
        .await
    }

    pub async fn delete_bookmark(&self, id: i64) -> Result<(), ClientError> {
        let request = self.authed(self.http.delete(self.url(&format!("/bookmarks/{id}"))))?;
        let response = request.send().await?;
        if response.status().is_success() {
            Ok(())
        } else {
            Err(Self::api_error(response).await)
        }
    }

    pub async fn mark_as_read(&self, id: i64) -> Result<BookmarkView, ClientError> {
        self.execute(self.authed(self.http.patch(self.url(&format!("/bookmarks/{id}/read"))))?)
            .await
    }

    pub async fn stats(&self) -> Result<StatsResponse, ClientError> {
        self.execute(self.authed(self.http.get(self.url("/stats")))?)
            .await
    }

    fn url(&self, path: &str) -> String {
        format!("{}{}", self.base_url.trim_end_matches('/'), path)
    }

    fn authed(&self, request: RequestBuilder) -> Result<RequestBuilder, ClientError> {
        let token = self.token.as_deref().ok_or(ClientError::NotLoggedIn)?;
        Ok(request.bearer_auth(token))
    }

    async fn execute<T: DeserializeOwned>(&self, request: RequestBuilder) -> Result<T, ClientError> {
        let response = request.send().await?;
        if response.status().is_success() {
            Ok(response.json().await?)
        } else {
            Err(Self::api_error(response).await)
        }
    }

    async fn api_error(response: reqwest::Response) -> ClientError {
        let status = response.status();
        match response.json::<WireError>().await {
            Ok(body) => ClientError::Api {
                status,
                code: body.error,
                message: body.message,
            },
            Err(_) => ClientError::Api {
                status,
                code: "UNKNOWN".to_string(),
                message: "unexpected response body".to_string(),
            },
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::{SystemTime, UNIX_EPOCH};

    fn temp_token_path(tag: &str) -> PathBuf {
        let nanos = SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .expect("system time before UNIX_EPOCH")
            .as_nanos();
        let mut path = std::env::temp_dir();
        path.push(format!(
            "linkstash-token-{tag}-{}-{nanos}",
            std::process::id()
        ));
        path
    }

    #[test]
    fn token_store_round_trip() {
        let store = TokenStore::new(temp_token_path("round-trip"));
        assert_eq!(store.load(), None);

        store.save("abc.def.ghi").expect("save");
        assert_eq!(store.load().as_deref(), Some("abc.def.ghi"));

        store.clear().expect("clear");
        assert_eq!(store.load(), None);
        // clearing twice is fine
        store.clear().expect("clear again");
    }

    #[test]
    fn blank_token_file_counts_as_absent() {
        let path = temp_token_path("blank");
        std::fs::write(&path, "  \n").expect("write");
        let store = TokenStore::new(&path);
        assert_eq!(store.load(), None);
        store.clear().expect("clear");
    }

    #[test]
    fn client_resumes_persisted_token() {
        let path = temp_token_path("resume");
        TokenStore::new(&path).save("persisted-token").expect("save");

        let client = ApiClient::new("http://localhost:3000", &path);
        assert_eq!(client.token(), Some("persisted-token"));

        TokenStore::new(&path).clear().expect("clear");
    }
}
