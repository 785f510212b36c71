//! Snippet persistence — a JSON file plus one PNG per captured snippet.
//!
//! Layout under the data directory:
//!   snippets.json        — every record, newest first
//!   images/{id}.png      — the crop a snippet was recognized from

use crate::enrich::Enrichment;
use crate::ports::SnippetStore;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::sync::Mutex;

const STORE_FILE: &str = "snippets.json";
const IMAGES_DIR: &str = "images";
const DEFAULT_TITLE: &str = "Untitled";
const DEFAULT_CATEGORY: &str = "code";

/// A persisted snippet.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Snippet {
    pub id: String,
    pub title: String,
    #[serde(default)]
    pub body: String,
    #[serde(default = "default_category")]
    pub category: String,
    #[serde(default)]
    pub tags: Vec<String>,
    /// Epoch milliseconds.
    pub created_at: i64,
    pub updated_at: i64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub ai_summary: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub ai_tags: Option<Vec<String>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub language: Option<String>,
    /// File name inside the store's image directory.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub image_file: Option<String>,
}

fn default_category() -> String {
    DEFAULT_CATEGORY.to_string()
}

/// Input to `SnippetStore::save`. `None` fields keep the existing value on
/// update and take the default on insert.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SnippetDraft {
    pub id: Option<String>,
    pub title: Option<String>,
    pub body: Option<String>,
    pub category: Option<String>,
    pub tags: Option<Vec<String>>,
    pub enrichment: Option<Enrichment>,
    /// PNG crop to keep alongside the record.
    #[serde(skip)]
    pub image_png: Option<Vec<u8>>,
}

#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    #[error("Snippet store I/O failed: {0}")]
    Io(#[from] std::io::Error),

    #[error("Snippet store serialization failed: {0}")]
    Serialize(#[from] serde_json::Error),

    #[error("No snippet with id {0}")]
    NotFound(String),

    #[error("Snippet store lock poisoned")]
    Poisoned,
}

/// Default data directory: `{data_dir}/codecap`.
pub fn default_data_dir() -> PathBuf {
    dirs::data_dir()
        .unwrap_or_else(|| PathBuf::from("."))
        .join("codecap")
}

pub struct JsonSnippetStore {
    dir: PathBuf,
    snippets: Mutex<Vec<Snippet>>,
}

impl JsonSnippetStore {
    /// Opens (or creates) the store in `dir`.
    ///
    /// A corrupt `snippets.json` is logged and replaced by an empty store
    /// rather than failing startup.
    pub fn open(dir: impl AsRef<Path>) -> Result<Self, StoreError> {
        let dir = dir.as_ref().to_path_buf();
        std::fs::create_dir_all(dir.join(IMAGES_DIR))?;

        let path = dir.join(STORE_FILE);
        let existed = path.exists();
        let snippets = if existed {
            let raw = std::fs::read_to_string(&path)?;
            match serde_json::from_str::<Vec<Snippet>>(&raw) {
                Ok(list) => list,
                Err(e) => {
                    log::warn!("[STORE] Failed to parse {}, starting fresh: {}", path.display(), e);
                    Vec::new()
                }
            }
        } else {
            Vec::new()
        };

        let store = Self {
            dir,
            snippets: Mutex::new(Vec::new()),
        };
        if !existed {
            store.persist(&snippets)?;
        }
        log::info!("[STORE] Loaded {} snippets from {}", snippets.len(), path.display());
        *store.snippets.lock().map_err(|_| StoreError::Poisoned)? = snippets;
        Ok(store)
    }

    pub fn open_default() -> Result<Self, StoreError> {
        Self::open(default_data_dir())
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    /// Absolute path of a snippet's crop, if it has one.
    pub fn image_path(&self, snippet: &Snippet) -> Option<PathBuf> {
        snippet
            .image_file
            .as_ref()
            .map(|name| self.dir.join(IMAGES_DIR).join(name))
    }

    pub fn get(&self, id: &str) -> Result<Snippet, StoreError> {
        let guard = self.snippets.lock().map_err(|_| StoreError::Poisoned)?;
        guard
            .iter()
            .find(|s| s.id == id)
            .cloned()
            .ok_or_else(|| StoreError::NotFound(id.to_string()))
    }

    fn persist(&self, snippets: &[Snippet]) -> Result<(), StoreError> {
        let json = serde_json::to_string_pretty(snippets)?;
        std::fs::write(self.dir.join(STORE_FILE), json)?;
        Ok(())
    }

    fn write_image(&self, id: &str, png: &[u8]) -> Result<String, StoreError> {
        let name = format!("{}.png", id);
        std::fs::write(self.dir.join(IMAGES_DIR).join(&name), png)?;
        Ok(name)
    }
}

fn now_ms() -> i64 {
    chrono::Utc::now().timestamp_millis()
}

fn newest_first(mut list: Vec<Snippet>) -> Vec<Snippet> {
    list.sort_by(|a, b| b.created_at.cmp(&a.created_at));
    list
}

fn apply_draft(record: &mut Snippet, draft: SnippetDraft) {
    if let Some(title) = draft.title {
        record.title = title;
    }
    if let Some(body) = draft.body {
        record.body = body;
    }
    if let Some(category) = draft.category {
        record.category = category;
    }
    if let Some(tags) = draft.tags {
        record.tags = tags;
    }
    if let Some(enrichment) = draft.enrichment {
        record.ai_summary = Some(enrichment.summary);
        record.ai_tags = Some(enrichment.tags);
        record.language = Some(enrichment.language.as_str().to_string());
    }
}

impl SnippetStore for JsonSnippetStore {
    fn save(&self, mut draft: SnippetDraft) -> Result<Snippet, StoreError> {
        let mut guard = self.snippets.lock().map_err(|_| StoreError::Poisoned)?;
        let mut next = guard.clone();
        let now = now_ms();
        let image = draft.image_png.take();

        let existing = draft
            .id
            .as_ref()
            .and_then(|id| next.iter().position(|s| &s.id == id));

        let record = match existing {
            Some(index) => {
                let record = &mut next[index];
                apply_draft(record, draft);
                record.updated_at = now;
                if let Some(png) = image.as_deref() {
                    record.image_file = Some(self.write_image(&record.id, png)?);
                }
                record.clone()
            }
            None => {
                let id = draft
                    .id
                    .take()
                    .unwrap_or_else(|| uuid::Uuid::new_v4().to_string());
                let mut record = Snippet {
                    id,
                    title: DEFAULT_TITLE.to_string(),
                    body: String::new(),
                    category: default_category(),
                    tags: Vec::new(),
                    created_at: now,
                    updated_at: now,
                    ai_summary: None,
                    ai_tags: None,
                    language: None,
                    image_file: None,
                };
                apply_draft(&mut record, draft);
                if let Some(png) = image.as_deref() {
                    record.image_file = Some(self.write_image(&record.id, png)?);
                }
                next.insert(0, record.clone());
                record
            }
        };

        self.persist(&next)?;
        *guard = next;
        log::info!("[STORE] Saved snippet {} ('{}')", record.id, record.title);
        Ok(record)
    }

    fn list_all(&self) -> Result<Vec<Snippet>, StoreError> {
        let guard = self.snippets.lock().map_err(|_| StoreError::Poisoned)?;
        Ok(newest_first(guard.clone()))
    }

    fn search(&self, query: &str) -> Result<Vec<Snippet>, StoreError> {
        let q = query.to_lowercase();
        let guard = self.snippets.lock().map_err(|_| StoreError::Poisoned)?;
        let hits = guard
            .iter()
            .filter(|s| s.title.to_lowercase().contains(&q) || s.body.to_lowercase().contains(&q))
            .cloned()
            .collect();
        Ok(newest_first(hits))
    }

    fn delete(&self, id: &str) -> Result<(), StoreError> {
        let mut guard = self.snippets.lock().map_err(|_| StoreError::Poisoned)?;
        let index = guard
            .iter()
            .position(|s| s.id == id)
            .ok_or_else(|| StoreError::NotFound(id.to_string()))?;

        let mut next = guard.clone();
        let removed = next.remove(index);
        self.persist(&next)?;
        *guard = next;

        if let Some(path) = self.image_path(&removed) {
            if let Err(e) = std::fs::remove_file(&path) {
                log::debug!("[STORE] Could not remove {}: {}", path.display(), e);
            }
        }
        log::info!("[STORE] Deleted snippet {}", id);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::enrich::ContentKind;

    fn temp_store(name: &str) -> (JsonSnippetStore, PathBuf) {
        let dir = std::env::temp_dir().join(format!("codecap-store-{}-{}", name, std::process::id()));
        let _ = std::fs::remove_dir_all(&dir);
        (JsonSnippetStore::open(&dir).unwrap(), dir)
    }

    fn draft(title: &str, body: &str) -> SnippetDraft {
        SnippetDraft {
            title: Some(title.to_string()),
            body: Some(body.to_string()),
            ..Default::default()
        }
    }

    #[test]
    fn open_creates_empty_file() {
        let (store, dir) = temp_store("create");
        assert!(dir.join(STORE_FILE).exists());
        assert!(store.list_all().unwrap().is_empty());
        let _ = std::fs::remove_dir_all(&dir);
    }

    #[test]
    fn insert_applies_defaults() {
        let (store, dir) = temp_store("defaults");
        let saved = store.save(SnippetDraft::default()).unwrap();
        assert_eq!(saved.title, "Untitled");
        assert_eq!(saved.category, "code");
        assert!(saved.body.is_empty());
        assert_eq!(saved.created_at, saved.updated_at);
        assert!(uuid::Uuid::parse_str(&saved.id).is_ok());
        let _ = std::fs::remove_dir_all(&dir);
    }

    #[test]
    fn update_merges_and_keeps_created_at() {
        let (store, dir) = temp_store("merge");
        let first = store.save(draft("Old", "body")).unwrap();
        let updated = store
            .save(SnippetDraft {
                id: Some(first.id.clone()),
                title: Some("New".to_string()),
                ..Default::default()
            })
            .unwrap();
        assert_eq!(updated.title, "New");
        assert_eq!(updated.body, "body");
        assert_eq!(updated.created_at, first.created_at);
        assert!(updated.updated_at >= first.updated_at);
        assert_eq!(store.list_all().unwrap().len(), 1);
        let _ = std::fs::remove_dir_all(&dir);
    }

    #[test]
    fn unknown_id_is_inserted_with_that_id() {
        let (store, dir) = temp_store("unknown-id");
        let saved = store
            .save(SnippetDraft {
                id: Some("fixed-id".to_string()),
                ..Default::default()
            })
            .unwrap();
        assert_eq!(saved.id, "fixed-id");
        let _ = std::fs::remove_dir_all(&dir);
    }

    #[test]
    fn enrichment_and_image_are_recorded() {
        let (store, dir) = temp_store("enrich");
        let saved = store
            .save(SnippetDraft {
                body: Some("fn x() {}".to_string()),
                enrichment: Some(Enrichment {
                    summary: "fn x".to_string(),
                    tags: vec!["rust".to_string()],
                    language: ContentKind::Code,
                }),
                image_png: Some(vec![0x89, 0x50, 0x4E, 0x47]),
                ..Default::default()
            })
            .unwrap();
        assert_eq!(saved.language.as_deref(), Some("code"));
        assert_eq!(saved.ai_tags, Some(vec!["rust".to_string()]));
        let image = store.image_path(&saved).unwrap();
        assert_eq!(std::fs::read(&image).unwrap(), vec![0x89, 0x50, 0x4E, 0x47]);
        let _ = std::fs::remove_dir_all(&dir);
    }

    #[test]
    fn records_survive_reopen() {
        let (store, dir) = temp_store("reopen");
        store.save(draft("Persisted", "text")).unwrap();
        drop(store);
        let reopened = JsonSnippetStore::open(&dir).unwrap();
        let all = reopened.list_all().unwrap();
        assert_eq!(all.len(), 1);
        assert_eq!(all[0].title, "Persisted");
        let _ = std::fs::remove_dir_all(&dir);
    }

    #[test]
    fn corrupt_file_starts_fresh() {
        let dir = std::env::temp_dir().join(format!("codecap-store-corrupt-{}", std::process::id()));
        let _ = std::fs::remove_dir_all(&dir);
        std::fs::create_dir_all(&dir).unwrap();
        std::fs::write(dir.join(STORE_FILE), "{not json").unwrap();
        let store = JsonSnippetStore::open(&dir).unwrap();
        assert!(store.list_all().unwrap().is_empty());
        let _ = std::fs::remove_dir_all(&dir);
    }

    #[test]
    fn search_is_case_insensitive_over_title_and_body() {
        let (store, dir) = temp_store("search");
        store.save(draft("Tokio notes", "runtime")).unwrap();
        store.save(draft("Shopping", "buy TOKIO stickers")).unwrap();
        store.save(draft("Other", "nothing")).unwrap();
        let hits = store.search("tokio").unwrap();
        assert_eq!(hits.len(), 2);
        assert!(hits[0].created_at >= hits[1].created_at);
        let _ = std::fs::remove_dir_all(&dir);
    }

    #[test]
    fn delete_removes_record_and_image() {
        let (store, dir) = temp_store("delete");
        let saved = store
            .save(SnippetDraft {
                image_png: Some(vec![1, 2, 3]),
                ..Default::default()
            })
            .unwrap();
        let image = store.image_path(&saved).unwrap();
        store.delete(&saved.id).unwrap();
        assert!(!image.exists());
        assert!(matches!(store.delete(&saved.id), Err(StoreError::NotFound(_))));
        let _ = std::fs::remove_dir_all(&dir);
    }
}
