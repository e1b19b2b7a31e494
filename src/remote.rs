use base64::engine::general_purpose::STANDARD as BASE64;
use base64::Engine as _;
use serde_json::json;

use crate::error::ApiError;

const GITHUB_API: &str = "https://api.github.com";
const API_VERSION: &str = "2022-11-28";
const USER_AGENT: &str = concat!("chronicle/", env!("CARGO_PKG_VERSION"));

/// What the remote store knows about a path. The version hash is the ticket
/// for updating or deleting without clobbering concurrent edits; its absence
/// means the file does not exist there yet.
#[derive(Debug, Clone, PartialEq)]
pub enum RemoteFile {
    Found { sha: String },
    NotFound,
}

/// Thin client for a GitHub-contents-style store. The loose response JSON is
/// decoded defensively; anything that is not clearly a hit or a 404 becomes
/// an upstream error.
pub struct RemoteRepo {
    owner: String,
    name: String,
    token: String,
}

impl RemoteRepo {
    pub fn from_parts(repo: &str, token: &str) -> Result<RemoteRepo, ApiError> {
        let mut parts = repo.split('/').filter(|p| !p.is_empty());
        match (parts.next(), parts.next(), parts.next()) {
            (Some(owner), Some(name), None) => Ok(RemoteRepo {
                owner: owner.to_string(),
                name: name.to_string(),
                token: token.to_string(),
            }),
            _ => Err(ApiError::NotConfigured(
                "Invalid remote repository (use owner/name)".to_string(),
            )),
        }
    }

    fn contents_url(&self, path: &str) -> String {
        format!("{}/repos/{}/{}/contents/{}", GITHUB_API, self.owner, self.name, path)
    }

    fn client(&self) -> Result<reqwest::Client, ApiError> {
        reqwest::Client::builder()
            .user_agent(USER_AGENT)
            .build()
            .map_err(|e| ApiError::Upstream(format!("Remote API client error: {}", e)))
    }

    fn with_auth(&self, req: reqwest::RequestBuilder) -> reqwest::RequestBuilder {
        req.header("Accept", "application/vnd.github+json")
            .bearer_auth(&self.token)
            .header("X-GitHub-Api-Version", API_VERSION)
    }

    /// Fetches the current version hash at `path`. A 404 is a regular
    /// outcome here, not an error: it flips the caller into create
    /// semantics.
    pub async fn get_file(&self, path: &str) -> Result<RemoteFile, ApiError> {
        let client = self.client()?;
        let resp = self.with_auth(client.get(self.contents_url(path)))
            .send()
            .await
            .map_err(|_| ApiError::Upstream("Remote API request failed".to_string()))?;

        let status = resp.status();
        if status.as_u16() == 404 {
            return Ok(RemoteFile::NotFound);
        }
        if !status.is_success() {
            let text = resp.text().await.unwrap_or_default();
            let detail = if text.is_empty() { status.to_string() } else { text };
            return Err(ApiError::Upstream(format!("Remote API: {}", detail)));
        }

        let body: serde_json::Value = resp.json().await
            .map_err(|_| ApiError::Upstream("Invalid remote response".to_string()))?;

        match body.get("sha").and_then(|s| s.as_str()) {
            Some(sha) => Ok(RemoteFile::Found { sha: sha.to_string() }),
            None => Err(ApiError::Upstream("Invalid remote response: missing sha".to_string())),
        }
    }

    /// Creates or updates `path`. Passing the current hash makes this an
    /// update; the store rejects stale hashes, which is the only
    /// lost-update protection in the system.
    pub async fn put_file(&self, path: &str, content: &[u8], sha: Option<&str>, message: &str) -> Result<(), ApiError> {
        let mut body = json!({
            "message": message,
            "content": BASE64.encode(content),
        });
        if let Some(sha) = sha {
            body["sha"] = json!(sha);
        }

        let client = self.client()?;
        let resp = self.with_auth(client.put(self.contents_url(path)))
            .json(&body)
            .send()
            .await
            .map_err(|_| ApiError::Upstream("Remote API request failed".to_string()))?;

        if resp.status().is_success() {
            return Ok(());
        }
        Err(Self::api_failure(resp, "Remote save failed").await)
    }

    /// Deletes `path`; the hash is mandatory for the same reason as above.
    pub async fn delete_file(&self, path: &str, sha: &str, message: &str) -> Result<(), ApiError> {
        let body = json!({
            "message": message,
            "sha": sha,
        });

        let client = self.client()?;
        let resp = self.with_auth(client.delete(self.contents_url(path)))
            .json(&body)
            .send()
            .await
            .map_err(|_| ApiError::Upstream("Remote API request failed".to_string()))?;

        if resp.status().is_success() {
            return Ok(());
        }
        Err(Self::api_failure(resp, "Remote delete failed").await)
    }

    /// The store answers errors with `{"message": …}` most of the time, but
    /// not always.
    async fn api_failure(resp: reqwest::Response, fallback: &str) -> ApiError {
        let status = resp.status();
        let message = match resp.json::<serde_json::Value>().await {
            Ok(body) => body.get("message")
                .and_then(|m| m.as_str())
                .map(|m| m.to_string()),
            Err(_) => None,
        };

        let message = message.unwrap_or_else(|| {
            let reason = status.canonical_reason().unwrap_or("");
            if reason.is_empty() { fallback.to_string() } else { reason.to_string() }
        });

        ApiError::Upstream(message)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_from_parts() {
        let repo = RemoteRepo::from_parts("someone/blog", "tkn").unwrap();
        assert_eq!(repo.contents_url("content/blog/a.md"),
                   "https://api.github.com/repos/someone/blog/contents/content/blog/a.md");
    }

    #[test]
    fn test_from_parts_tolerates_stray_slashes() {
        let repo = RemoteRepo::from_parts("/someone/blog/", "tkn").unwrap();
        assert_eq!(repo.owner, "someone");
        assert_eq!(repo.name, "blog");
    }

    #[test]
    fn test_from_parts_rejects_bad_shapes() {
        assert!(matches!(RemoteRepo::from_parts("justaname", "tkn"), Err(ApiError::NotConfigured(_))));
        assert!(matches!(RemoteRepo::from_parts("a/b/c", "tkn"), Err(ApiError::NotConfigured(_))));
        assert!(matches!(RemoteRepo::from_parts("", "tkn"), Err(ApiError::NotConfigured(_))));
    }
}
