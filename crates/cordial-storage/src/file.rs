//! JSON file key/value store.

use std::path::{Path, PathBuf};

use async_trait::async_trait;
use cordial_protocols::{KeyValueStore, StorageError};
use serde_json::{Map, Value};
use tokio::fs;
use tokio::sync::RwLock;
use tracing::{debug, info};

/// Store persisted as one JSON object.
///
/// The whole object is cached in memory and rewritten on every change,
/// through a temporary file and a rename so readers never see a partial file.
/// The cache only takes a change once it is on disk.
pub struct JsonFileStore {
    path: PathBuf,
    cache: RwLock<Map<String, Value>>,
}

impl JsonFileStore {
    /// Open the store at `path`, creating parent directories as needed.
    ///
    /// A missing file is an empty store; a file that is not a JSON object is
    /// [`StorageError::Corrupted`].
    pub async fn open(path: impl AsRef<Path>) -> Result<Self, StorageError> {
        let path = path.as_ref().to_path_buf();

        if let Some(parent) = path.parent() {
            if !parent.as_os_str().is_empty() && !parent.exists() {
                fs::create_dir_all(parent).await?;
                info!("Created storage directory: {:?}", parent);
            }
        }

        let cache = if path.exists() {
            let content = fs::read_to_string(&path).await?;
            if content.trim().is_empty() {
                Map::new()
            } else {
                match serde_json::from_str::<Value>(&content)? {
                    Value::Object(map) => map,
                    other => {
                        return Err(StorageError::Corrupted(format!(
                            "{} holds {} instead of an object",
                            path.display(),
                            json_type(&other)
                        )));
                    }
                }
            }
        } else {
            Map::new()
        };

        debug!("Opened storage {:?} with {} keys", path, cache.len());
        Ok(Self {
            path,
            cache: RwLock::new(cache),
        })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    async fn persist(&self, map: &Map<String, Value>) -> Result<(), StorageError> {
        let content = serde_json::to_string_pretty(map)?;
        let tmp = self.path.with_extension("json.tmp");
        fs::write(&tmp, content).await?;
        fs::rename(&tmp, &self.path).await?;
        debug!("Saved storage to {:?}", self.path);
        Ok(())
    }
}

fn json_type(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "a boolean",
        Value::Number(_) => "a number",
        Value::String(_) => "a string",
        Value::Array(_) => "an array",
        Value::Object(_) => "an object",
    }
}

#[async_trait]
impl KeyValueStore for JsonFileStore {
    async fn get(&self, key: &str) -> Result<Option<Value>, StorageError> {
        Ok(self.cache.read().await.get(key).cloned())
    }

    async fn set(&self, key: &str, value: Value) -> Result<(), StorageError> {
        let mut cache = self.cache.write().await;
        let mut updated = cache.clone();
        updated.insert(key.to_string(), value);
        self.persist(&updated).await?;
        *cache = updated;
        Ok(())
    }

    async fn remove(&self, key: &str) -> Result<(), StorageError> {
        let mut cache = self.cache.write().await;
        if !cache.contains_key(key) {
            return Ok(());
        }
        let mut updated = cache.clone();
        updated.remove(key);
        self.persist(&updated).await?;
        *cache = updated;
        Ok(())
    }
}

impl std::fmt::Debug for JsonFileStore {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("JsonFileStore")
            .field("path", &self.path)
            .finish_non_exhaustive()
    }
}

#[cfg(test)]
#[path = "file_tests.rs"]
mod tests;
