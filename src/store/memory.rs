use super::{Document, DocumentStore};
use crate::error::StoreError;

/// Keeps the serialized document in memory so tests exercise the same
/// JSON encoding as the file store.
#[derive(Clone, Debug, Default)]
pub struct MemoryStore {
    json: Option<String>,
}

impl MemoryStore {
    pub fn new() -> Self { Self::default() }

    pub fn with_document(document: &Document) -> Result<Self, StoreError> {
        Ok(Self { json: Some(document.to_json()?) })
    }
}

impl DocumentStore for MemoryStore {
    fn load(&mut self) -> Result<Document, StoreError> {
        if let Some(doc) = self.json.as_deref().and_then(|json| Document::from_json(json).ok()) {
            return Ok(doc);
        }
        let seed = Document::seeded();
        self.save(&seed)?;
        Ok(seed)
    }

    fn save(&mut self, document: &Document) -> Result<(), StoreError> {
        self.json = Some(document.to_json()?);
        Ok(())
    }
}
