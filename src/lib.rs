//! Shared fixtures for the workspace scenario tests

use std::collections::HashMap;

use async_trait::async_trait;
use parking_lot::RwLock;
use warden_permissions::{
    register_resource_type, Caller, HookResult, Resource, ResourceHooks, ResourceType,
};

register_resource_type!("document", "Text document held by a DocumentStore");

/// A document addressed by id
#[derive(Debug, Clone)]
pub struct Document {
    pub id: String,
}

impl Document {
    pub fn new(id: impl Into<String>) -> Self {
        Self { id: id.into() }
    }
}

impl Resource for Document {
    fn id(&self) -> &str {
        &self.id
    }

    fn resource_type(&self) -> ResourceType {
        ResourceType::new("document")
    }
}

/// In-memory document backend
#[derive(Debug, Default)]
pub struct DocumentStore {
    documents: RwLock<HashMap<String, String>>,
}

impl DocumentStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn contains(&self, id: &str) -> bool {
        self.documents.read().contains_key(id)
    }

    pub fn len(&self) -> usize {
        self.documents.read().len()
    }

    pub fn is_empty(&self) -> bool {
        self.documents.read().is_empty()
    }
}

#[async_trait]
impl ResourceHooks<Document> for DocumentStore {
    type Value = String;
    type Args = Option<String>;

    async fn create(
        &self,
        caller: &Caller,
        doc: &Document,
        body: Option<String>,
    ) -> HookResult<String> {
        let mut documents = self.documents.write();
        if documents.contains_key(&doc.id) {
            return Err(format!("document '{}' already exists", doc.id));
        }
        documents.insert(doc.id.clone(), body.unwrap_or_default());
        Ok(format!("{} created '{}'", caller.id, doc.id))
    }

    async fn read(&self, _: &Caller, doc: &Document, _: Option<String>) -> HookResult<String> {
        self.documents
            .read()
            .get(&doc.id)
            .cloned()
            .ok_or_else(|| format!("document '{}' not found", doc.id))
    }

    async fn update(
        &self,
        caller: &Caller,
        doc: &Document,
        body: Option<String>,
    ) -> HookResult<String> {
        let mut documents = self.documents.write();
        match documents.get_mut(&doc.id) {
            Some(existing) => {
                *existing = body.unwrap_or_default();
                Ok(format!("{} updated '{}'", caller.id, doc.id))
            }
            None => Err(format!("document '{}' not found", doc.id)),
        }
    }

    async fn delete(
        &self,
        caller: &Caller,
        doc: &Document,
        _: Option<String>,
    ) -> HookResult<String> {
        match self.documents.write().remove(&doc.id) {
            Some(_) => Ok(format!("{} deleted '{}'", caller.id, doc.id)),
            None => Err(format!("document '{}' not found", doc.id)),
        }
    }
}
