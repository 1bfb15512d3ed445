// SPDX-FileCopyrightText: 2026 Parley Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Whole-document JSON persistence.
//!
//! Writes go to a sibling temp file that is renamed over the target, so a
//! crash mid-write never leaves a truncated document behind.

use std::marker::PhantomData;
use std::path::{Path, PathBuf};

use parley_core::ParleyError;
use serde::de::DeserializeOwned;
use serde::Serialize;
use tracing::{debug, warn};

/// A JSON document on disk holding a value of type `T`.
#[derive(Debug, Clone)]
pub struct JsonFile<T> {
    path: PathBuf,
    _marker: PhantomData<fn() -> T>,
}

impl<T> JsonFile<T>
where
    T: Serialize + DeserializeOwned + Default,
{
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
            _marker: PhantomData,
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Reads the document.
    ///
    /// A missing, unreadable or malformed file yields `T::default()`.
    pub async fn load(&self) -> T {
        let bytes = match tokio::fs::read(&self.path).await {
            Ok(bytes) => bytes,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                debug!(path = %self.path.display(), "store file absent, starting empty");
                return T::default();
            }
            Err(e) => {
                warn!(path = %self.path.display(), error = %e, "failed to read store file, starting empty");
                return T::default();
            }
        };

        match serde_json::from_slice(&bytes) {
            Ok(value) => value,
            Err(e) => {
                warn!(path = %self.path.display(), error = %e, "malformed store file, starting empty");
                T::default()
            }
        }
    }

    /// Writes the whole document atomically.
    pub async fn save(&self, value: &T) -> Result<(), ParleyError> {
        let json = serde_json::to_vec_pretty(value).map_err(ParleyError::storage)?;

        if let Some(parent) = self.path.parent()
            && !parent.as_os_str().is_empty()
        {
            tokio::fs::create_dir_all(parent)
                .await
                .map_err(ParleyError::storage)?;
        }

        let tmp = self.temp_path();
        tokio::fs::write(&tmp, &json)
            .await
            .map_err(ParleyError::storage)?;
        tokio::fs::rename(&tmp, &self.path)
            .await
            .map_err(ParleyError::storage)?;
        Ok(())
    }

    fn temp_path(&self) -> PathBuf {
        let mut name = self
            .path
            .file_name()
            .map(|n| n.to_os_string())
            .unwrap_or_default();
        name.push(".tmp");
        self.path.with_file_name(name)
    }
}

#[cfg(test)]
mod tests {
    use std::collections::BTreeMap;

    use super::*;

    #[tokio::test]
    async fn missing_file_loads_default() {
        let dir = tempfile::tempdir().unwrap();
        let file: JsonFile<BTreeMap<String, u32>> = JsonFile::new(dir.path().join("absent.json"));
        assert!(file.load().await.is_empty());
    }

    #[tokio::test]
    async fn save_then_load() {
        let dir = tempfile::tempdir().unwrap();
        let file = JsonFile::new(dir.path().join("nested/doc.json"));
        let mut value = BTreeMap::new();
        value.insert("a".to_string(), 1u32);
        file.save(&value).await.unwrap();

        assert_eq!(file.load().await, value);
        assert!(!dir.path().join("nested/doc.json.tmp").exists());
    }

    #[tokio::test]
    async fn malformed_file_loads_default() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("bad.json");
        std::fs::write(&path, b"{not json").unwrap();
        let file: JsonFile<BTreeMap<String, u32>> = JsonFile::new(path);
        assert!(file.load().await.is_empty());
    }
}
