//! Collaborator boundaries the session controller talks to.
//!
//! Recognition is async and may fail; persistence is a synchronous local
//! store. Both have default implementations elsewhere in the workspace
//! (tesseract / WinRT OCR in the desktop shell, `JsonSnippetStore` here).

use crate::enrich::Enrichment;
use crate::store::{Snippet, SnippetDraft, StoreError};
use std::future::Future;
use std::sync::Arc;

#[derive(Debug, thiserror::Error)]
pub enum RecognitionError {
    #[error("OCR engine unavailable: {0}")]
    Unavailable(String),

    #[error("OCR failed: {0}")]
    Failed(String),
}

/// Turns a PNG crop into text.
pub trait Recognizer: Send + Sync {
    fn recognize(&self, png: &[u8]) -> impl Future<Output = Result<String, RecognitionError>> + Send;
}

impl<T: Recognizer> Recognizer for Arc<T> {
    fn recognize(&self, png: &[u8]) -> impl Future<Output = Result<String, RecognitionError>> + Send {
        (**self).recognize(png)
    }
}

/// Snippet persistence.
pub trait SnippetStore: Send + Sync {
    /// Inserts a new record, or merges into the record with `draft.id`.
    fn save(&self, draft: SnippetDraft) -> Result<Snippet, StoreError>;

    /// All records, newest first.
    fn list_all(&self) -> Result<Vec<Snippet>, StoreError>;

    /// Case-insensitive match on title or body, newest first.
    fn search(&self, query: &str) -> Result<Vec<Snippet>, StoreError>;

    fn delete(&self, id: &str) -> Result<(), StoreError>;
}

impl<T: SnippetStore + ?Sized> SnippetStore for Arc<T> {
    fn save(&self, draft: SnippetDraft) -> Result<Snippet, StoreError> {
        (**self).save(draft)
    }

    fn list_all(&self) -> Result<Vec<Snippet>, StoreError> {
        (**self).list_all()
    }

    fn search(&self, query: &str) -> Result<Vec<Snippet>, StoreError> {
        (**self).search(query)
    }

    fn delete(&self, id: &str) -> Result<(), StoreError> {
        (**self).delete(id)
    }
}

/// Advisory summary/tags/classification for recognized text. Called by
/// the review surface; never on the save path.
pub trait Enricher: Send + Sync {
    fn enrich(&self, text: &str) -> Enrichment;
}
