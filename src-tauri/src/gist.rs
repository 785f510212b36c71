//! GitHub Gist upload for shared snippets.
//!
//! The personal access token is read from `CODECAP_GITHUB_TOKEN` first,
//! then from the OS keychain. It is never written to `settings.json`.

use serde::Serialize;
use std::collections::BTreeMap;

const GISTS_URL: &str = "https://api.github.com/gists";
const KEYRING_SERVICE: &str = "codecap";
const KEYRING_ENTRY: &str = "github";
const TOKEN_ENV: &str = "CODECAP_GITHUB_TOKEN";
const DEFAULT_DESCRIPTION: &str = "Shared via CodeCap";

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct GistCreated {
    pub url: String,
    pub id: String,
}

#[derive(Debug, thiserror::Error)]
pub enum GistError {
    #[error("No GitHub token configured — add one in Settings")]
    MissingToken,

    #[error("Nothing to upload")]
    NoFiles,

    #[error("Keyring error: {0}")]
    Keyring(#[from] keyring::Error),

    #[error("Gist request failed: {0}")]
    Http(#[from] reqwest::Error),

    #[error("GitHub API error {status}: {message}")]
    Api { status: u16, message: String },
}

/// Token from the environment, else the keychain.
pub fn load_token() -> Option<String> {
    if let Ok(token) = std::env::var(TOKEN_ENV) {
        if !token.trim().is_empty() {
            return Some(token);
        }
    }
    let entry = keyring::Entry::new(KEYRING_SERVICE, KEYRING_ENTRY).ok()?;
    match entry.get_password() {
        Ok(token) if !token.is_empty() => Some(token),
        Ok(_) => None,
        Err(keyring::Error::NoEntry) => None,
        Err(e) => {
            log::warn!("[SHARE] Could not read GitHub token from keychain: {}", e);
            None
        }
    }
}

/// Stores the token in the keychain. An empty token removes it.
pub fn save_token(token: &str) -> Result<(), GistError> {
    let entry = keyring::Entry::new(KEYRING_SERVICE, KEYRING_ENTRY)?;
    if token.trim().is_empty() {
        match entry.delete_credential() {
            Ok(()) | Err(keyring::Error::NoEntry) => {}
            Err(e) => return Err(e.into()),
        }
        log::info!("[SETTINGS] GitHub token removed from keychain");
    } else {
        entry.set_password(token.trim())?;
        log::info!("[SETTINGS] GitHub token saved to keychain");
    }
    Ok(())
}

pub fn has_token() -> bool {
    load_token().is_some()
}

/// Request body for `POST /gists`.
pub fn gist_payload(
    files: &BTreeMap<String, String>,
    description: Option<&str>,
    public: bool,
) -> serde_json::Value {
    let files: serde_json::Map<String, serde_json::Value> = files
        .iter()
        .map(|(name, content)| (name.clone(), serde_json::json!({ "content": content })))
        .collect();
    serde_json::json!({
        "description": description.filter(|d| !d.trim().is_empty()).unwrap_or(DEFAULT_DESCRIPTION),
        "public": public,
        "files": files,
    })
}

fn api_error(status: u16, body: &serde_json::Value) -> GistError {
    let message = body
        .get("message")
        .and_then(|m| m.as_str())
        .unwrap_or("Unknown error")
        .to_string();
    GistError::Api { status, message }
}

pub async fn create_gist(
    files: &BTreeMap<String, String>,
    description: Option<&str>,
    public: bool,
    token: &str,
) -> Result<GistCreated, GistError> {
    if files.is_empty() {
        return Err(GistError::NoFiles);
    }
    let start = std::time::Instant::now();
    let payload = gist_payload(files, description, public);

    let resp = reqwest::Client::new()
        .post(GISTS_URL)
        .header("User-Agent", "CodeCap")
        .header("Accept", "application/vnd.github+json")
        .header("Authorization", format!("token {}", token))
        .json(&payload)
        .send()
        .await?;

    let status = resp.status().as_u16();
    let body: serde_json::Value = resp.json().await.unwrap_or(serde_json::Value::Null);
    log::info!(
        "[SHARE] Gist upload ({} files): status {} in {}ms",
        files.len(),
        status,
        start.elapsed().as_millis()
    );

    if status != 201 {
        return Err(api_error(status, &body));
    }

    let field = |name: &str| {
        body.get(name)
            .and_then(|v| v.as_str())
            .unwrap_or_default()
            .to_string()
    };
    Ok(GistCreated {
        url: field("html_url"),
        id: field("id"),
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn files() -> BTreeMap<String, String> {
        let mut files = BTreeMap::new();
        files.insert("hello.rs".to_string(), "fn main() {}".to_string());
        files.insert("notes.md".to_string(), "# notes".to_string());
        files
    }

    #[test]
    fn payload_wraps_each_file_content() {
        let payload = gist_payload(&files(), Some("demo"), true);
        assert_eq!(payload["description"], "demo");
        assert_eq!(payload["public"], true);
        assert_eq!(payload["files"]["hello.rs"]["content"], "fn main() {}");
        assert_eq!(payload["files"]["notes.md"]["content"], "# notes");
    }

    #[test]
    fn blank_description_uses_default() {
        let payload = gist_payload(&files(), Some("  "), false);
        assert_eq!(payload["description"], DEFAULT_DESCRIPTION);
        assert_eq!(payload["public"], false);

        let payload = gist_payload(&files(), None, false);
        assert_eq!(payload["description"], DEFAULT_DESCRIPTION);
    }

    #[test]
    fn api_error_carries_github_message() {
        let body = serde_json::json!({ "message": "Bad credentials" });
        let err = api_error(401, &body);
        assert_eq!(err.to_string(), "GitHub API error 401: Bad credentials");

        let err = api_error(500, &serde_json::Value::Null);
        assert_eq!(err.to_string(), "GitHub API error 500: Unknown error");
    }

    #[tokio::test]
    async fn empty_upload_is_rejected_before_any_request() {
        let err = create_gist(&BTreeMap::new(), None, false, "token").await.unwrap_err();
        assert!(matches!(err, GistError::NoFiles));
    }
}
