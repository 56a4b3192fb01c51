use super::{Document, DocumentStore};
use crate::error::StoreError;
use std::fs;
use std::io::ErrorKind;
use std::path::PathBuf;

/// The document as a JSON file on disk.
#[derive(Clone, Debug)]
pub struct JsonFileStore {
    path: PathBuf,
}

impl JsonFileStore {
    pub fn new(path: impl Into<PathBuf>) -> Self { Self { path: path.into() } }

    fn seed(&mut self) -> Result<Document, StoreError> {
        let seed = Document::seeded();
        self.save(&seed)?;
        tracing::info!(path = %self.path.display(), "Initialised new back-office document");
        Ok(seed)
    }

    /// Moves an unparseable file out of the way so seeding cannot destroy it.
    fn quarantine(&self) -> Result<PathBuf, StoreError> {
        let mut name = self.path.clone().into_os_string();
        name.push(format!(".corrupt-{}", chrono::Utc::now().timestamp()));
        let target = PathBuf::from(name);
        fs::rename(&self.path, &target)?;
        Ok(target)
    }
}

impl DocumentStore for JsonFileStore {
    fn load(&mut self) -> Result<Document, StoreError> {
        let text = match fs::read_to_string(&self.path) {
            Ok(text) => text,
            Err(e) => {
                if e.kind() != ErrorKind::NotFound {
                    tracing::warn!(path = %self.path.display(), error = %e, "Unreadable document, seeding a new one");
                }
                return self.seed();
            }
        };
        match Document::from_json(&text) {
            Ok(doc) => Ok(doc),
            Err(e) => {
                let moved = self.quarantine()?;
                tracing::error!(error = %e, moved_to = %moved.display(), "Corrupt document set aside, seeding a new one");
                self.seed()
            }
        }
    }

    /// Writes a sibling temp file and renames it over the document, so a
    /// reader never sees half a file.
    fn save(&mut self, document: &Document) -> Result<(), StoreError> {
        if let Some(dir) = self.path.parent().filter(|d| !d.as_os_str().is_empty()) {
            fs::create_dir_all(dir)?;
        }
        let mut tmp = self.path.clone().into_os_string();
        tmp.push(".tmp");
        let tmp = PathBuf::from(tmp);
        fs::write(&tmp, document.to_json()?)?;
        fs::rename(&tmp, &self.path)?;
        Ok(())
    }
}
