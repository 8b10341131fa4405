use std::path::{Path, PathBuf};

use crate::error::StorageError;
use crate::sanitize::sanitize_filename;

/// Raw upload bytes laid out as `<root>/<document_id>/<filename>`.
#[derive(Debug, Clone)]
pub struct BlobStore {
    root: PathBuf,
}

impl BlobStore {
    pub fn new<P: AsRef<Path>>(root: P) -> Self {
        Self {
            root: root.as_ref().to_path_buf(),
        }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    fn document_dir(&self, id: &str) -> Result<PathBuf, StorageError> {
        let valid = !id.is_empty()
            && id
                .chars()
                .all(|c| c.is_ascii_alphanumeric() || c == '-' || c == '_');
        if !valid {
            return Err(StorageError::InvalidFilename(id.to_string()));
        }
        Ok(self.root.join(id))
    }

    /// Where the blob for `(id, filename)` lives. The file need not exist.
    pub fn path_for(&self, id: &str, filename: &str) -> Result<PathBuf, StorageError> {
        let name = sanitize_filename(filename)
            .ok_or_else(|| StorageError::InvalidFilename(filename.to_string()))?;
        Ok(self.document_dir(id)?.join(name))
    }

    /// Writes `content`, creating the document directory as needed.
    pub fn save(&self, id: &str, filename: &str, content: &[u8]) -> Result<PathBuf, StorageError> {
        let path = self.path_for(id, filename)?;
        let dir = self.document_dir(id)?;

        std::fs::create_dir_all(&dir).map_err(|e| StorageError::CreateDirectory {
            path: dir.clone(),
            source: e,
        })?;
        std::fs::write(&path, content).map_err(|e| StorageError::WriteFile {
            path: path.clone(),
            source: e,
        })?;

        log::debug!("Stored {} bytes at {}", content.len(), path.display());
        Ok(path)
    }

    /// Removes the document directory. Returns false when it did not exist.
    pub fn remove(&self, id: &str) -> Result<bool, StorageError> {
        let dir = self.document_dir(id)?;
        match std::fs::remove_dir_all(&dir) {
            Ok(()) => Ok(true),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(false),
            Err(e) => Err(StorageError::RemoveDirectory {
                path: dir,
                source: e,
            }),
        }
    }
}
