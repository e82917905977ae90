//! Document Store Interface
//!
//! The final document store is an external collaborator; the import
//! pipeline only needs create, lookup and link derivation. The in-memory
//! implementation backs tests and tooling; the desktop application injects
//! its own store.

use async_trait::async_trait;
use std::collections::HashMap;
use tokio::sync::Mutex;

use crate::models::{Document, DocumentLink};

/// External document store consumed by the import processor.
#[async_trait]
pub trait DocumentStore: Send + Sync {
    /// Commit a document under its pre-allocated id; returns the id.
    async fn create_document(&self, document: Document) -> anyhow::Result<String>;

    async fn find_by_id(&self, id: &str) -> anyhow::Result<Option<Document>>;

    /// All documents whose front matter title matches exactly.
    async fn find_by_title(&self, title: &str) -> anyhow::Result<Vec<Document>>;

    /// Replace the derived outgoing links of a document.
    async fn set_document_links(
        &self,
        document_id: &str,
        target_ids: &[String],
    ) -> anyhow::Result<()>;
}

#[derive(Default)]
struct InMemoryState {
    documents: HashMap<String, Document>,
    links: Vec<DocumentLink>,
}

/// Hash-map backed [`DocumentStore`].
#[derive(Default)]
pub struct InMemoryDocumentStore {
    state: Mutex<InMemoryState>,
}

impl InMemoryDocumentStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// All derived document links, for inspection.
    pub async fn links(&self) -> Vec<DocumentLink> {
        self.state.lock().await.links.clone()
    }

    pub async fn len(&self) -> usize {
        self.state.lock().await.documents.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.len().await == 0
    }
}

#[async_trait]
impl DocumentStore for InMemoryDocumentStore {
    async fn create_document(&self, document: Document) -> anyhow::Result<String> {
        let mut state = self.state.lock().await;
        if state.documents.contains_key(&document.id) {
            anyhow::bail!("document {} already exists", document.id);
        }
        let id = document.id.clone();
        state.documents.insert(id.clone(), document);
        Ok(id)
    }

    async fn find_by_id(&self, id: &str) -> anyhow::Result<Option<Document>> {
        Ok(self.state.lock().await.documents.get(id).cloned())
    }

    async fn find_by_title(&self, title: &str) -> anyhow::Result<Vec<Document>> {
        Ok(self
            .state
            .lock()
            .await
            .documents
            .values()
            .filter(|doc| doc.front_matter.title == title)
            .cloned()
            .collect())
    }

    async fn set_document_links(
        &self,
        document_id: &str,
        target_ids: &[String],
    ) -> anyhow::Result<()> {
        let mut state = self.state.lock().await;
        state.links.retain(|link| link.document_id != document_id);
        for target in target_ids {
            state.links.push(DocumentLink {
                document_id: document_id.to_string(),
                target_id: target.clone(),
            });
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::FrontMatter;

    fn doc(id: &str, title: &str) -> Document {
        Document {
            id: id.to_string(),
            journal: "test".to_string(),
            content: String::new(),
            front_matter: FrontMatter {
                title: title.to_string(),
                ..Default::default()
            },
        }
    }

    #[tokio::test]
    async fn create_and_find() {
        let store = InMemoryDocumentStore::new();
        store.create_document(doc("a", "First")).await.unwrap();

        assert!(store.find_by_id("a").await.unwrap().is_some());
        assert_eq!(store.find_by_title("First").await.unwrap().len(), 1);
        assert!(store.find_by_title("Other").await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn duplicate_ids_are_rejected() {
        let store = InMemoryDocumentStore::new();
        store.create_document(doc("a", "First")).await.unwrap();
        assert!(store.create_document(doc("a", "Again")).await.is_err());
    }

    #[tokio::test]
    async fn links_are_replaced_per_document() {
        let store = InMemoryDocumentStore::new();
        store
            .set_document_links("a", &["b".to_string(), "c".to_string()])
            .await
            .unwrap();
        store.set_document_links("a", &["b".to_string()]).await.unwrap();

        let links = store.links().await;
        assert_eq!(links.len(), 1);
        assert_eq!(links[0].target_id, "b");
    }
}
