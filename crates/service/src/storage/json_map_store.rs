use std::{collections::HashMap, hash::Hash, path::PathBuf, sync::Arc};
use tokio::{fs, sync::RwLock};
use tracing::debug;

use crate::errors::ServiceError;

/// JSON file-backed key-value map.
///
/// The whole map is held in memory and rewritten on every mutation. Writes
/// go to a sibling temp file that is renamed over the existing one, so readers
/// of the file never see a half-written document. The in-memory map only
/// changes once the new contents are on disk.
pub struct JsonMapStore<K, V> {
    inner: RwLock<HashMap<K, V>>,
    file_path: PathBuf,
}

impl<K, V> JsonMapStore<K, V>
where
    K: Eq + Hash + serde::Serialize + serde::de::DeserializeOwned + Clone,
    V: serde::Serialize + serde::de::DeserializeOwned + Clone,
{
    /// Open the store at `path`, creating an empty file when missing.
    /// A file that exists but cannot be parsed is an error, not an empty map.
    pub async fn open<P: Into<PathBuf>>(path: P) -> Result<Arc<Self>, ServiceError> {
        let file_path = path.into();
        if let Some(parent) = file_path.parent() {
            fs::create_dir_all(parent).await.map_err(ServiceError::storage)?;
        }

        let map: HashMap<K, V> = match fs::read(&file_path).await {
            Ok(bytes) if bytes.is_empty() => HashMap::new(),
            Ok(bytes) => serde_json::from_slice(&bytes).map_err(|e| {
                ServiceError::Storage(format!("corrupt store {}: {e}", file_path.display()))
            })?,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                let empty: HashMap<K, V> = HashMap::new();
                write_atomic(&file_path, &empty).await?;
                empty
            }
            Err(e) => return Err(ServiceError::storage(e)),
        };
        debug!(path = %file_path.display(), entries = map.len(), "json store opened");

        Ok(Arc::new(Self { inner: RwLock::new(map), file_path }))
    }

    pub async fn len(&self) -> usize {
        self.inner.read().await.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.inner.read().await.is_empty()
    }

    pub async fn get(&self, key: &K) -> Option<V> {
        self.inner.read().await.get(key).cloned()
    }

    /// Clone out every value matching `pred`.
    pub async fn values_where<F>(&self, pred: F) -> Vec<V>
    where
        F: Fn(&V) -> bool,
    {
        let map = self.inner.read().await;
        map.values().filter(|v| pred(v)).cloned().collect()
    }

    /// Insert or replace a value and persist.
    pub async fn insert(&self, key: K, value: V) -> Result<(), ServiceError> {
        let mut map = self.inner.write().await;
        let mut next = map.clone();
        next.insert(key, value);
        write_atomic(&self.file_path, &next).await?;
        *map = next;
        Ok(())
    }

    /// Remove `key` if `pred` accepts its value; persists only when something was removed.
    pub async fn remove_if<F>(&self, key: &K, pred: F) -> Result<bool, ServiceError>
    where
        F: FnOnce(&V) -> bool,
    {
        let mut map = self.inner.write().await;
        match map.get(key) {
            Some(v) if pred(v) => {
                let mut next = map.clone();
                next.remove(key);
                write_atomic(&self.file_path, &next).await?;
                *map = next;
                Ok(true)
            }
            _ => Ok(false),
        }
    }
}

async fn write_atomic<K, V>(path: &PathBuf, map: &HashMap<K, V>) -> Result<(), ServiceError>
where
    K: Eq + Hash + serde::Serialize,
    V: serde::Serialize,
{
    let data = serde_json::to_vec(map).map_err(ServiceError::storage)?;
    let tmp = path.with_extension("json.tmp");
    fs::write(&tmp, data).await.map_err(ServiceError::storage)?;
    fs::rename(&tmp, path).await.map_err(ServiceError::storage)?;
    Ok(())
}
