//! Integration test for Gist upload.
//!
//! Uploads a secret gist with a real token, then checks the returned URL.
//! Loads the token from .env.local using dotenvy — same as the app.

use codecap_lib::gist;
use std::collections::BTreeMap;

fn load_env() {
    let manifest_dir = std::path::Path::new(env!("CARGO_MANIFEST_DIR"));
    let project_root = manifest_dir.parent().unwrap_or(manifest_dir);
    let env_path = project_root.join(".env.local");
    if env_path.exists() {
        dotenvy::from_path(&env_path).expect("Failed to load .env.local");
        eprintln!("[TEST] Loaded .env.local");
    }
}

fn live_token() -> Option<String> {
    load_env();
    std::env::var("CODECAP_GITHUB_TOKEN").ok().filter(|t| !t.is_empty())
}

#[tokio::test]
async fn test_create_secret_gist() {
    let Some(token) = live_token() else {
        eprintln!("SKIP: No CODECAP_GITHUB_TOKEN");
        return;
    };

    let files = BTreeMap::from([(
        "codecap-integration.md".to_string(),
        "## codecap integration\n\n```\nok\n```\n".to_string(),
    )]);
    let created = gist::create_gist(&files, Some("CodeCap integration test"), false, &token)
        .await
        .expect("gist upload failed");

    eprintln!("[TEST] Created gist {} at {}", created.id, created.url);
    assert!(!created.id.is_empty());
    assert!(created.url.starts_with("https://gist.github.com/"));
}

#[tokio::test]
async fn test_bad_token_reports_github_message() {
    if live_token().is_none() {
        eprintln!("SKIP: No CODECAP_GITHUB_TOKEN (network tests disabled)");
        return;
    }

    let files = BTreeMap::from([("x.txt".to_string(), "x".to_string())]);
    let err = gist::create_gist(&files, None, false, "not-a-real-token")
        .await
        .unwrap_err();

    match err {
        gist::GistError::Api { status, message } => {
            assert_eq!(status, 401);
            assert!(!message.is_empty());
        }
        other => panic!("expected API error, got {other}"),
    }
}
