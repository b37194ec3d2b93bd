use async_trait::async_trait;
use std::io;
use std::path::{Path, PathBuf};
use thiserror::Error;
use tokio::fs;
use url::form_urlencoded;

use crate::section::DocSection;

#[derive(Debug, Error)]
pub enum StoreError {
    #[error("Section id {0:?} is not usable as a cache file name")]
    InvalidId(String),

    #[error("Cache I/O error for {path:?}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    #[error("Corrupt cache record {path:?}: {source}")]
    Corrupt {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },

    #[error("Failed to serialize section {id:?}: {source}")]
    Serialize {
        id: String,
        #[source]
        source: serde_json::Error,
    },
}

/// Durable per-section records that survive restarts.
///
/// Every operation reports failure explicitly. Callers treat errors as cache
/// misses: the in-memory copy is always authoritative.
#[async_trait]
pub trait SectionStore: Send + Sync {
    /// `Ok(None)` when no record exists for `id`.
    async fn get(&self, id: &str) -> Result<Option<DocSection>, StoreError>;
    /// Overwrites any previous record for `section.id`.
    async fn put(&self, section: &DocSection) -> Result<(), StoreError>;
    /// Removes every record, returning how many were deleted. Records that
    /// cannot be removed are logged and skipped.
    async fn clear(&self) -> Result<usize, StoreError>;
    async fn list_ids(&self) -> Result<Vec<String>, StoreError>;
}

/// One `<id>.json` file per section under `cache_dir`.
#[derive(Debug, Clone)]
pub struct FileSectionStore {
    cache_dir: PathBuf,
}

impl FileSectionStore {
    pub fn new(cache_dir: PathBuf) -> Self {
        Self { cache_dir }
    }

    pub fn cache_dir(&self) -> &Path {
        &self.cache_dir
    }

    /// Ids are percent-encoded into file names, so nested ids such as
    /// `webui/network` stay inside `cache_dir`.
    fn record_path(&self, id: &str) -> Result<PathBuf, StoreError> {
        if id.is_empty() {
            return Err(StoreError::InvalidId(id.to_string()));
        }
        Ok(self.cache_dir.join(format!("{}.json", encode_id(id))))
    }

    fn io_error(path: &Path, source: io::Error) -> StoreError {
        StoreError::Io {
            path: path.to_path_buf(),
            source,
        }
    }

    /// Paths of all `*.json` records. A missing directory has none.
    async fn record_paths(&self) -> Result<Vec<PathBuf>, StoreError> {
        let dir_path = &self.cache_dir;
        let mut entries = match fs::read_dir(dir_path).await {
            Ok(entries) => entries,
            Err(e) if e.kind() == io::ErrorKind::NotFound => return Ok(Vec::new()),
            Err(e) => return Err(Self::io_error(dir_path, e)),
        };

        let mut paths = Vec::new();
        while let Some(entry) = entries
            .next_entry()
            .await
            .map_err(|e| Self::io_error(dir_path, e))?
        {
            let path = entry.path();
            if path.is_file() && path.extension().is_some_and(|ext| ext == "json") {
                paths.push(path);
            }
        }
        Ok(paths)
    }
}

#[async_trait]
impl SectionStore for FileSectionStore {
    async fn get(&self, id: &str) -> Result<Option<DocSection>, StoreError> {
        let path = self.record_path(id)?;
        let content = match fs::read_to_string(&path).await {
            Ok(content) => content,
            Err(e) if e.kind() == io::ErrorKind::NotFound => return Ok(None),
            Err(e) => return Err(Self::io_error(&path, e)),
        };

        let section = serde_json::from_str::<DocSection>(&content)
            .map_err(|source| StoreError::Corrupt { path, source })?;
        Ok(Some(section))
    }

    async fn put(&self, section: &DocSection) -> Result<(), StoreError> {
        let path = self.record_path(&section.id)?;
        let serialized =
            serde_json::to_string_pretty(section).map_err(|source| StoreError::Serialize {
                id: section.id.clone(),
                source,
            })?;

        fs::create_dir_all(&self.cache_dir)
            .await
            .map_err(|e| Self::io_error(&self.cache_dir, e))?;
        fs::write(&path, serialized)
            .await
            .map_err(|e| Self::io_error(&path, e))?;

        tracing::debug!("Saved section '{}' to {:?}", section.id, path);
        Ok(())
    }

    async fn clear(&self) -> Result<usize, StoreError> {
        let mut removed = 0;
        for path in self.record_paths().await? {
            match fs::remove_file(&path).await {
                Ok(()) => removed += 1,
                Err(e) => tracing::warn!("Failed to remove cache file {:?}: {}", path, e),
            }
        }
        tracing::info!("Removed {} cached sections from {:?}", removed, self.cache_dir);
        Ok(removed)
    }

    async fn list_ids(&self) -> Result<Vec<String>, StoreError> {
        let mut ids: Vec<String> = self
            .record_paths()
            .await?
            .iter()
            .filter_map(|path| decode_id(path.file_stem()?.to_str()?))
            .collect();
        ids.sort();
        Ok(ids)
    }
}

fn encode_id(id: &str) -> String {
    form_urlencoded::byte_serialize(id.as_bytes()).collect()
}

fn decode_id(stem: &str) -> Option<String> {
    form_urlencoded::parse(stem.as_bytes())
        .next()
        .map(|(id, _)| id.into_owned())
}
