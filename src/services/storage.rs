// src/services/storage.rs
//! Blob storage for auction media. The marketplace only needs upload,
//! fetch and delete.
use log::debug;
use std::collections::HashMap;
use std::fs;
use std::io;
use std::path::{Component, Path, PathBuf};
use std::sync::Mutex;
use thiserror::Error;
use uuid::Uuid;

use crate::domain::media::{MediaItem, MediaKind, NewFile};

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum StorageError {
    #[error("Upload of {filename} failed: {reason}")]
    Upload { filename: String, reason: String },

    #[error("Unknown storage key: {0}")]
    UnknownKey(String),

    #[error("Storage unavailable: {0}")]
    Unavailable(String),
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StoredObject {
    pub content_type: String,
    pub content: Vec<u8>,
}

pub trait MediaStorage: Send + Sync {
    fn upload(&self, kind: MediaKind, file: &NewFile) -> Result<MediaItem, StorageError>;

    fn delete(&self, storage_key: &str) -> Result<(), StorageError>;

    fn fetch(&self, storage_key: &str) -> Option<StoredObject>;
}

fn sanitize(filename: &str) -> String {
    filename
        .chars()
        .map(|c| if c.is_ascii_alphanumeric() || c == '.' || c == '-' || c == '_' { c } else { '_' })
        .collect()
}

fn new_item(base_url: &str, kind: MediaKind, file: &NewFile) -> MediaItem {
    let id = Uuid::new_v4();
    let storage_key = format!("{}/{}-{}", kind.field(), id.simple(), sanitize(&file.signature.filename));
    MediaItem {
        id,
        url: format!("{}/{}", base_url, storage_key),
        caption: String::new(),
        storage_key,
        filename: file.signature.filename.clone(),
    }
}

/// Keeps uploads in process memory and serves them back under `base_url`.
pub struct InMemoryMediaStorage {
    base_url: String,
    objects: Mutex<HashMap<String, StoredObject>>,
}

impl InMemoryMediaStorage {
    pub fn new(base_url: &str) -> Self {
        InMemoryMediaStorage {
            base_url: base_url.trim_end_matches('/').to_string(),
            objects: Mutex::new(HashMap::new()),
        }
    }

    pub fn len(&self) -> usize {
        self.objects.lock().map(|objects| objects.len()).unwrap_or(0)
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl MediaStorage for InMemoryMediaStorage {
    fn upload(&self, kind: MediaKind, file: &NewFile) -> Result<MediaItem, StorageError> {
        let item = new_item(&self.base_url, kind, file);
        let mut objects = self
            .objects
            .lock()
            .map_err(|e| StorageError::Unavailable(e.to_string()))?;
        objects.insert(
            item.storage_key.clone(),
            StoredObject {
                content_type: file.content_type.clone(),
                content: file.content.clone(),
            },
        );
        debug!("stored {} ({} bytes)", item.storage_key, file.content.len());
        Ok(item)
    }

    fn delete(&self, storage_key: &str) -> Result<(), StorageError> {
        let mut objects = self
            .objects
            .lock()
            .map_err(|e| StorageError::Unavailable(e.to_string()))?;
        objects
            .remove(storage_key)
            .map(|_| ())
            .ok_or_else(|| StorageError::UnknownKey(storage_key.to_string()))
    }

    fn fetch(&self, storage_key: &str) -> Option<StoredObject> {
        self.objects.lock().ok()?.get(storage_key).cloned()
    }
}

const CONTENT_TYPE_SUFFIX: &str = ".content-type";

/// Writes uploads below `root`, one file per object plus a sidecar holding
/// its content type. Survives restarts, so it pairs with the journal.
pub struct FileMediaStorage {
    root: PathBuf,
    base_url: String,
}

impl FileMediaStorage {
    pub fn new(root: impl Into<PathBuf>, base_url: &str) -> Result<Self, StorageError> {
        let root = root.into();
        fs::create_dir_all(&root).map_err(|e| StorageError::Unavailable(format!("{}: {}", root.display(), e)))?;
        Ok(FileMediaStorage {
            root,
            base_url: base_url.trim_end_matches('/').to_string(),
        })
    }

    /// Resolves a key inside the root; keys that climb out of it are unknown.
    fn path_of(&self, storage_key: &str) -> Option<PathBuf> {
        let relative = Path::new(storage_key);
        let plain = relative.components().all(|c| matches!(c, Component::Normal(_)));
        (plain && !storage_key.is_empty()).then(|| self.root.join(relative))
    }

    fn sidecar(path: &Path) -> PathBuf {
        let mut name = path.as_os_str().to_owned();
        name.push(CONTENT_TYPE_SUFFIX);
        PathBuf::from(name)
    }

    fn write(path: &Path, file: &NewFile) -> io::Result<()> {
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent)?;
        }
        fs::write(path, &file.content)?;
        fs::write(Self::sidecar(path), &file.content_type)
    }
}

impl MediaStorage for FileMediaStorage {
    fn upload(&self, kind: MediaKind, file: &NewFile) -> Result<MediaItem, StorageError> {
        let item = new_item(&self.base_url, kind, file);
        let path = self
            .path_of(&item.storage_key)
            .ok_or_else(|| StorageError::UnknownKey(item.storage_key.clone()))?;
        Self::write(&path, file).map_err(|e| StorageError::Upload {
            filename: file.signature.filename.clone(),
            reason: e.to_string(),
        })?;
        debug!("wrote {} ({} bytes)", path.display(), file.content.len());
        Ok(item)
    }

    fn delete(&self, storage_key: &str) -> Result<(), StorageError> {
        let path = self
            .path_of(storage_key)
            .filter(|path| path.is_file())
            .ok_or_else(|| StorageError::UnknownKey(storage_key.to_string()))?;
        fs::remove_file(&path).map_err(|e| StorageError::Unavailable(e.to_string()))?;
        let _ = fs::remove_file(Self::sidecar(&path));
        Ok(())
    }

    fn fetch(&self, storage_key: &str) -> Option<StoredObject> {
        if storage_key.ends_with(CONTENT_TYPE_SUFFIX) {
            return None;
        }
        let path = self.path_of(storage_key)?;
        let content = fs::read(&path).ok()?;
        let content_type = fs::read_to_string(Self::sidecar(&path))
            .unwrap_or_else(|_| "application/octet-stream".to_string());
        Some(StoredObject { content_type, content })
    }
}
