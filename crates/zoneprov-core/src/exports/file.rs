// # File Export Store
//
// File-based implementation of ExportStore.
//
// ## Crash Recovery
//
// - Atomic writes: Uses write-then-rename for atomicity
// - Automatic backup: Keeps .backup of last known good file
// - Recovery: Falls back to backup if the main file does not parse
//
// ## File Format
//
// ```json
// {
//   "version": "1.0",
//   "zones": {
//     "example-com": {
//       "exports": {
//         "id": "example-com",
//         "name": "example.com.",
//         "nameservers": ["ns-cloud-a1.googledomains.com."]
//       },
//       "exported_at": "2026-01-09T12:00:00Z"
//     }
//   }
// }
// ```

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tokio::fs;
use tokio::io::AsyncWriteExt;
use tokio::sync::RwLock;

use crate::Error;
use crate::traits::export_store::{ExportRecord, ExportStore, ExportStoreFactory, ZoneExports};

/// Exports file format version
const EXPORTS_FILE_VERSION: &str = "1.0";

/// File-based export store with crash recovery
///
/// Every mutation is written through to disk immediately.
#[derive(Debug)]
pub struct FileExportStore {
    path: PathBuf,
    state: Arc<RwLock<FileState>>,
}

#[derive(Debug)]
struct FileState {
    zones: BTreeMap<String, ExportRecord>,
    dirty: bool,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
struct ExportsFileFormat {
    version: String,
    zones: BTreeMap<String, ExportRecord>,
}

/// Outcome of reading the exports file
enum Loaded {
    Missing,
    Parsed(BTreeMap<String, ExportRecord>),
    Corrupt(String),
}

impl FileExportStore {
    /// Create or load a file export store
    ///
    /// Parent directories are created if needed. A corrupt file is replaced
    /// by its backup when one parses; otherwise the store starts empty.
    pub async fn new<P: AsRef<Path>>(path: P) -> Result<Self, Error> {
        let path = path.as_ref().to_path_buf();

        if let Some(parent) = path.parent()
            && !parent.as_os_str().is_empty()
            && !parent.exists()
        {
            fs::create_dir_all(parent).await.map_err(|e| {
                Error::config(format!(
                    "Failed to create exports directory {}: {}",
                    parent.display(),
                    e
                ))
            })?;
        }

        let zones = Self::load_with_recovery(&path).await?;

        Ok(Self {
            path,
            state: Arc::new(RwLock::new(FileState {
                zones,
                dirty: false,
            })),
        })
    }

    async fn load_with_recovery(path: &Path) -> Result<BTreeMap<String, ExportRecord>, Error> {
        match Self::load(path).await? {
            Loaded::Missing => {
                tracing::debug!("Exports file does not exist: {}", path.display());
                Ok(BTreeMap::new())
            }
            Loaded::Parsed(zones) => {
                tracing::debug!("Loaded exports file: {} zone(s)", zones.len());
                Ok(zones)
            }
            Loaded::Corrupt(reason) => {
                tracing::warn!(
                    "Exports file {} appears corrupted: {}. Attempting recovery from backup.",
                    path.display(),
                    reason
                );

                let backup_path = Self::backup_path(path);
                match Self::load(&backup_path).await? {
                    Loaded::Parsed(zones) => {
                        tracing::info!("Recovered exports from backup: {} zone(s)", zones.len());
                        if let Err(e) = fs::copy(&backup_path, path).await {
                            tracing::error!("Failed to restore exports file from backup: {}", e);
                        }
                        Ok(zones)
                    }
                    Loaded::Missing => {
                        tracing::warn!("No backup file found. Starting with empty exports.");
                        Ok(BTreeMap::new())
                    }
                    Loaded::Corrupt(backup_reason) => {
                        tracing::error!(
                            "Backup also corrupted: {}. Starting with empty exports.",
                            backup_reason
                        );
                        Ok(BTreeMap::new())
                    }
                }
            }
        }
    }

    async fn load(path: &Path) -> Result<Loaded, Error> {
        if !path.exists() {
            return Ok(Loaded::Missing);
        }

        let content = fs::read_to_string(path).await.map_err(|e| {
            Error::export_store(format!(
                "Failed to read exports file {}: {}",
                path.display(),
                e
            ))
        })?;

        let file: ExportsFileFormat = match serde_json::from_str(&content) {
            Ok(file) => file,
            Err(e) => return Ok(Loaded::Corrupt(e.to_string())),
        };

        if file.version != EXPORTS_FILE_VERSION {
            tracing::warn!(
                "Exports file version mismatch: expected {}, got {}. Attempting to load anyway.",
                EXPORTS_FILE_VERSION,
                file.version
            );
        }

        Ok(Loaded::Parsed(file.zones))
    }

    /// Write the exports file atomically
    async fn write(&self) -> Result<(), Error> {
        let mut state = self.state.write().await;

        let file = ExportsFileFormat {
            version: EXPORTS_FILE_VERSION.to_string(),
            zones: state.zones.clone(),
        };
        let json = serde_json::to_string_pretty(&file)
            .map_err(|e| Error::export_store(format!("Failed to serialize exports: {}", e)))?;

        let temp_path = self.temp_path();
        {
            let mut temp = fs::File::create(&temp_path).await.map_err(|e| {
                Error::export_store(format!(
                    "Failed to create temp file {}: {}",
                    temp_path.display(),
                    e
                ))
            })?;
            temp.write_all(json.as_bytes()).await.map_err(|e| {
                Error::export_store(format!(
                    "Failed to write temp file {}: {}",
                    temp_path.display(),
                    e
                ))
            })?;
            temp.flush().await.map_err(|e| {
                Error::export_store(format!(
                    "Failed to flush temp file {}: {}",
                    temp_path.display(),
                    e
                ))
            })?;
        }

        if self.path.exists()
            && let Err(e) = fs::copy(&self.path, Self::backup_path(&self.path)).await
        {
            tracing::warn!("Failed to create exports backup: {}", e);
        }

        fs::rename(&temp_path, &self.path).await.map_err(|e| {
            Error::export_store(format!(
                "Failed to rename {} to {}: {}",
                temp_path.display(),
                self.path.display(),
                e
            ))
        })?;

        state.dirty = false;
        tracing::trace!("Exports written to {}", self.path.display());
        Ok(())
    }

    fn temp_path(&self) -> PathBuf {
        let mut temp = self.path.clone();
        temp.set_extension("tmp");
        temp
    }

    fn backup_path(path: &Path) -> PathBuf {
        let mut backup = path.to_path_buf();
        backup.set_extension("backup");
        backup
    }

    /// Path of the exports file
    pub fn path(&self) -> &Path {
        &self.path
    }
}

#[async_trait]
impl ExportStore for FileExportStore {
    async fn get_exports(&self, zone_id: &str) -> Result<Option<ExportRecord>, Error> {
        let state = self.state.read().await;
        Ok(state.zones.get(zone_id).cloned())
    }

    async fn set_exports(&self, exports: &ZoneExports) -> Result<(), Error> {
        {
            let mut state = self.state.write().await;
            state
                .zones
                .insert(exports.id.clone(), ExportRecord::new(exports.clone()));
            state.dirty = true;
        }
        self.write().await
    }

    async fn delete_exports(&self, zone_id: &str) -> Result<(), Error> {
        {
            let mut state = self.state.write().await;
            if state.zones.remove(zone_id).is_none() {
                return Ok(());
            }
            state.dirty = true;
        }
        self.write().await
    }

    async fn list_exports(&self) -> Result<Vec<String>, Error> {
        let state = self.state.read().await;
        Ok(state.zones.keys().cloned().collect())
    }

    async fn flush(&self) -> Result<(), Error> {
        let dirty = self.state.read().await.dirty;
        if dirty { self.write().await } else { Ok(()) }
    }
}

/// Factory for file export stores
///
/// Expects settings of the form `{ "path": "<file>" }`.
pub struct FileExportStoreFactory;

#[async_trait]
impl ExportStoreFactory for FileExportStoreFactory {
    async fn create(&self, config: &serde_json::Value) -> Result<Box<dyn ExportStore>, Error> {
        let path = config["path"]
            .as_str()
            .filter(|p| !p.is_empty())
            .ok_or_else(|| Error::config("File export store requires a 'path'"))?
            .to_string();

        Ok(Box::new(FileExportStore::new(path).await?))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    fn exports(id: &str, nameservers: &[&str]) -> ZoneExports {
        ZoneExports {
            id: id.to_string(),
            name: format!("{}.", id.replace('-', ".")),
            nameservers: nameservers.iter().map(|s| s.to_string()).collect(),
        }
    }

    #[tokio::test]
    async fn test_file_store_persists() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("exports.json");

        let store = FileExportStore::new(&path).await.unwrap();
        assert!(store.list_exports().await.unwrap().is_empty());

        store
            .set_exports(&exports("example-com", &["ns-cloud-a1.googledomains.com."]))
            .await
            .unwrap();
        assert!(path.exists());

        let reloaded = FileExportStore::new(&path).await.unwrap();
        let record = reloaded.get_exports("example-com").await.unwrap().unwrap();
        assert_eq!(record.exports.name, "example.com.");
        assert_eq!(
            record.exports.nameservers,
            vec!["ns-cloud-a1.googledomains.com.".to_string()]
        );
    }

    #[tokio::test]
    async fn test_file_store_creates_parent_dirs() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("nested/out/exports.json");

        let store = FileExportStore::new(&path).await.unwrap();
        store.set_exports(&exports("a-com", &[])).await.unwrap();
        assert!(path.exists());
    }

    #[tokio::test]
    async fn test_file_store_corruption_recovery() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("exports.json");

        let store = FileExportStore::new(&path).await.unwrap();
        store.set_exports(&exports("a-com", &["ns1."])).await.unwrap();
        // Second write leaves the first one in the backup
        store.set_exports(&exports("b-com", &["ns2."])).await.unwrap();
        assert!(FileExportStore::backup_path(&path).exists());

        fs::write(&path, b"not json").await.unwrap();

        let recovered = FileExportStore::new(&path).await.unwrap();
        assert_eq!(recovered.list_exports().await.unwrap(), vec!["a-com".to_string()]);
    }

    #[tokio::test]
    async fn test_file_store_delete() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("exports.json");

        let store = FileExportStore::new(&path).await.unwrap();
        store.set_exports(&exports("a-com", &[])).await.unwrap();
        store.delete_exports("a-com").await.unwrap();
        store.delete_exports("missing").await.unwrap();

        let reloaded = FileExportStore::new(&path).await.unwrap();
        assert!(reloaded.list_exports().await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_factory_requires_path() {
        let factory = FileExportStoreFactory;
        assert!(factory.create(&serde_json::json!({})).await.is_err());

        let dir = tempdir().unwrap();
        let path = dir.path().join("exports.json");
        let store = factory
            .create(&serde_json::json!({ "path": path.to_string_lossy() }))
            .await
            .unwrap();
        assert!(store.list_exports().await.unwrap().is_empty());
    }
}
