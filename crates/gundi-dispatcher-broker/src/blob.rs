// crates/gundi-dispatcher-broker/src/blob.rs
// ============================================================================
// Module: Gundi Dispatcher Blob Stores
// Description: Directory-backed and in-memory attachment storage.
// Purpose: Read and remove attachment files referenced by queue messages.
// Dependencies: cap-std, gundi-dispatcher-core, tokio
// ============================================================================

//! ## Overview
//! [`DirectoryBlobStore`] serves attachment files from a root directory using
//! capability-scoped handles; [`MemoryBlobStore`] keeps files in memory.
//! Invariants:
//! - Paths are relative to the store root and cannot escape it.
//! - Filesystem calls run on the blocking pool.
//!
//! Security posture: blob paths come from untrusted payloads.

// ============================================================================
// SECTION: Imports
// ============================================================================

use std::collections::BTreeMap;
use std::io::ErrorKind;
use std::path::Component;
use std::path::Path;
use std::path::PathBuf;
use std::sync::Arc;
use std::sync::Mutex;

use async_trait::async_trait;
use cap_std::ambient_authority;
use cap_std::fs::Dir;
use gundi_dispatcher_core::BlobError;
use gundi_dispatcher_core::BlobFile;
use gundi_dispatcher_core::BlobStore;

// ============================================================================
// SECTION: Path Validation
// ============================================================================

/// Validates a store-relative path.
fn relative_path(path: &str) -> Result<PathBuf, BlobError> {
    let trimmed = path.trim().trim_start_matches('/');
    if trimmed.is_empty() {
        return Err(BlobError::InvalidPath("empty path".to_string()));
    }
    let candidate = Path::new(trimmed);
    if candidate.components().any(|component| !matches!(component, Component::Normal(_))) {
        return Err(BlobError::InvalidPath(trimmed.to_string()));
    }
    Ok(candidate.to_path_buf())
}

/// Maps an I/O error for `path` into a blob error.
fn io_error(path: &str, err: &std::io::Error) -> BlobError {
    if err.kind() == ErrorKind::NotFound {
        BlobError::NotFound(path.to_string())
    } else {
        BlobError::Io(format!("{path}: {err}"))
    }
}

// ============================================================================
// SECTION: Directory Store
// ============================================================================

/// Blob store rooted at a local directory.
#[derive(Debug, Clone)]
pub struct DirectoryBlobStore {
    /// Capability handle for the root directory.
    root: Arc<Dir>,
}

impl DirectoryBlobStore {
    /// Opens a store rooted at `root`.
    ///
    /// # Errors
    ///
    /// Returns [`BlobError::Io`] when the directory cannot be opened.
    pub fn open(root: impl AsRef<Path>) -> Result<Self, BlobError> {
        let root = root.as_ref();
        let dir = Dir::open_ambient_dir(root, ambient_authority())
            .map_err(|err| BlobError::Io(format!("{}: {err}", root.display())))?;
        Ok(Self {
            root: Arc::new(dir),
        })
    }
}

#[async_trait]
impl BlobStore for DirectoryBlobStore {
    async fn download(&self, path: &str) -> Result<BlobFile, BlobError> {
        let relative = relative_path(path)?;
        let root = Arc::clone(&self.root);
        let owned = path.to_string();
        tokio::task::spawn_blocking(move || {
            root.read(&relative)
                .map(|bytes| BlobFile::new(owned.trim_start_matches('/'), bytes))
                .map_err(|err| io_error(&owned, &err))
        })
        .await
        .map_err(|err| BlobError::Io(err.to_string()))?
    }

    async fn remove(&self, path: &str) -> Result<(), BlobError> {
        let relative = relative_path(path)?;
        let root = Arc::clone(&self.root);
        let owned = path.to_string();
        tokio::task::spawn_blocking(move || {
            root.remove_file(&relative).map_err(|err| io_error(&owned, &err))
        })
        .await
        .map_err(|err| BlobError::Io(err.to_string()))?
    }
}

// ============================================================================
// SECTION: Memory Store
// ============================================================================

/// In-memory blob store.
#[derive(Debug, Default)]
pub struct MemoryBlobStore {
    /// Files keyed by path.
    files: Mutex<BTreeMap<String, Vec<u8>>>,
}

impl MemoryBlobStore {
    /// Creates an empty store.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Stores a file.
    ///
    /// # Errors
    ///
    /// Returns [`BlobError::Io`] when the store lock is poisoned.
    pub fn insert(&self, path: impl Into<String>, bytes: Vec<u8>) -> Result<(), BlobError> {
        self.files
            .lock()
            .map_err(|_| BlobError::Io("blob store lock poisoned".to_string()))?
            .insert(path.into(), bytes);
        Ok(())
    }

    /// Returns true when a file is stored at `path`.
    #[must_use]
    pub fn contains(&self, path: &str) -> bool {
        self.files.lock().is_ok_and(|files| files.contains_key(path))
    }
}

#[async_trait]
impl BlobStore for MemoryBlobStore {
    async fn download(&self, path: &str) -> Result<BlobFile, BlobError> {
        let files =
            self.files.lock().map_err(|_| BlobError::Io("blob store lock poisoned".to_string()))?;
        files
            .get(path)
            .map(|bytes| BlobFile::new(path, bytes.clone()))
            .ok_or_else(|| BlobError::NotFound(path.to_string()))
    }

    async fn remove(&self, path: &str) -> Result<(), BlobError> {
        let mut files =
            self.files.lock().map_err(|_| BlobError::Io("blob store lock poisoned".to_string()))?;
        files.remove(path).map(|_| ()).ok_or_else(|| BlobError::NotFound(path.to_string()))
    }
}

// ============================================================================
// SECTION: Tests
// ============================================================================
