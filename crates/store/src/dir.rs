//! Directory-backed document store: one `<id>.json` file per document

use crate::record::{
    DocumentStore, Mutation, NewDocument, SharedListener, StoredDocument, WritableStore,
};
use crate::{Result, StoreError};
use ontograph_core::{Document, DocumentId};
use std::fs;
use std::io;
use std::path::{Path, PathBuf};
use std::sync::Mutex;
use tracing::{debug, instrument, warn};

/// Records the highest id ever issued so deleted ids are never reused
const LAST_ID_FILE: &str = ".last_id";

pub struct DirStore {
    root: PathBuf,
    /// Serializes id allocation between writers in this process
    write_lock: Mutex<()>,
    listener: Option<SharedListener>,
}

impl DirStore {
    /// Open (and create if needed) a store rooted at `root`
    pub fn open(root: impl AsRef<Path>) -> Result<Self> {
        let root = root.as_ref().to_path_buf();
        fs::create_dir_all(&root)?;
        Ok(Self {
            root,
            write_lock: Mutex::new(()),
            listener: None,
        })
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    fn path_for(&self, id: DocumentId) -> PathBuf {
        self.root.join(format!("{}.json", id))
    }

    /// Highest id issued so far, 0 for a fresh directory
    fn last_issued_id(&self) -> Result<DocumentId> {
        let path = self.root.join(LAST_ID_FILE);
        match fs::read_to_string(&path) {
            Ok(text) => Ok(text.trim().parse().unwrap_or_else(|_| {
                warn!("Ignoring unreadable {}", path.display());
                0
            })),
            Err(e) if e.kind() == io::ErrorKind::NotFound => Ok(0),
            Err(e) => Err(e.into()),
        }
    }

    fn read_record(&self, path: &Path) -> Result<StoredDocument> {
        let bytes = fs::read(path)?;
        Ok(serde_json::from_slice(&bytes)?)
    }

    /// Ids of every `<id>.json` file, ascending
    fn ids(&self) -> Result<Vec<DocumentId>> {
        let mut ids = Vec::new();
        for entry in fs::read_dir(&self.root)? {
            let path = entry?.path();
            if path.extension().and_then(|e| e.to_str()) != Some("json") {
                continue;
            }
            if let Some(id) = path
                .file_stem()
                .and_then(|s| s.to_str())
                .and_then(|s| s.parse::<DocumentId>().ok())
            {
                ids.push(id);
            }
        }
        ids.sort_unstable();
        Ok(ids)
    }

    /// Every readable record, ascending by id. Unreadable files are skipped.
    fn load_all(&self) -> Result<Vec<StoredDocument>> {
        let mut records = Vec::new();
        for id in self.ids()? {
            match self.read_record(&self.path_for(id)) {
                Ok(record) => records.push(record),
                Err(e) => warn!("Skipping unreadable document {}: {}", id, e),
            }
        }
        Ok(records)
    }

    fn notify(&self, mutation: Mutation) {
        if let Some(listener) = &self.listener {
            listener.on_mutation(mutation);
        }
    }
}

impl DocumentStore for DirStore {
    fn list(&self) -> Result<Vec<Document>> {
        Ok(self
            .load_all()?
            .iter()
            .map(StoredDocument::to_document)
            .collect())
    }

    fn get(&self, id: DocumentId) -> Result<Option<Document>> {
        let path = self.path_for(id);
        if !path.exists() {
            return Ok(None);
        }
        Ok(Some(self.read_record(&path)?.to_document()))
    }
}

impl WritableStore for DirStore {
    #[instrument(skip(self, document), fields(root = %self.root.display()))]
    fn create(&self, document: NewDocument) -> Result<StoredDocument> {
        let stored = {
            let _guard = self.write_lock.lock().map_err(|_| StoreError::LockPoisoned)?;
            let newest_file = self.ids()?.last().copied().unwrap_or(0);
            let id = self.last_issued_id()?.max(newest_file) + 1;
            let stored = document.into_stored(id);
            let tmp = self.root.join(format!(".{}.json.tmp", id));
            fs::write(&tmp, serde_json::to_vec_pretty(&stored)?)?;
            fs::rename(&tmp, self.path_for(id))?;
            fs::write(self.root.join(LAST_ID_FILE), id.to_string())?;
            stored
        };
        debug!("Wrote document {}", stored.id);
        self.notify(Mutation::Saved(stored.id));
        Ok(stored)
    }

    #[instrument(skip(self))]
    fn delete(&self, id: DocumentId) -> Result<()> {
        let path = self.path_for(id);
        if !path.exists() {
            return Err(StoreError::NotFound(id));
        }
        fs::remove_file(path)?;
        self.notify(Mutation::Deleted(id));
        Ok(())
    }

    fn records(&self) -> Result<Vec<StoredDocument>> {
        let mut records = self.load_all()?;
        records.sort_by(|a, b| b.created_at.cmp(&a.created_at).then(b.id.cmp(&a.id)));
        Ok(records)
    }

    fn set_listener(&mut self, listener: SharedListener) {
        self.listener = Some(listener);
    }
}
