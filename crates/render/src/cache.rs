use crate::config::CacheConfig;
use crate::error::CacheError;
use async_trait::async_trait;
use lens_source_map::PositionMap;
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};
use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicU64, Ordering};
use tokio::sync::Mutex;

const ENTRY_VERSION: u32 = 1;

static TMP_COUNTER: AtomicU64 = AtomicU64::new(0);

/// Identity of a cached render: the absolute source path and its modification time.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct CacheKey {
    pub path: PathBuf,
    pub mtime_ms: u64,
}

impl CacheKey {
    pub fn new(path: impl Into<PathBuf>, mtime_ms: u64) -> Self {
        Self {
            path: path.into(),
            mtime_ms,
        }
    }

    /// An entry stored at `stored_mtime_ms` is valid for this key only if it is
    /// at least as new as the source.
    pub fn accepts(&self, stored_mtime_ms: u64) -> bool {
        stored_mtime_ms >= self.mtime_ms
    }
}

/// The cached artifacts of one successful render
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CachedRender {
    pub text: String,
    pub map: PositionMap,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CacheLookup {
    Hit(CachedRender),
    /// An entry exists for the path but predates the source
    Stale,
    Miss,
}

/// Last-writer-wins store for rendered text and maps.
///
/// Reads fail closed: anything unreadable or inconsistent is a miss.
#[async_trait]
pub trait CacheStore: Send + Sync {
    async fn get(&self, key: &CacheKey) -> CacheLookup;

    async fn put(&self, key: &CacheKey, render: &CachedRender) -> Result<(), CacheError>;
}

#[derive(Debug, Serialize, Deserialize)]
struct CacheEnvelope {
    v: u32,
    path: String,
    mtime_ms: u64,
    text: String,
    map: PositionMap,
}

/// On-disk store: one JSON envelope per source path, sharded by path digest.
#[derive(Debug, Clone)]
pub struct FsCacheStore {
    base_dir: PathBuf,
}

impl FsCacheStore {
    pub fn new(base_dir: impl Into<PathBuf>) -> Self {
        Self {
            base_dir: base_dir.into(),
        }
    }

    pub fn from_config(config: &CacheConfig) -> Self {
        Self::new(config.dir.clone())
    }

    pub fn base_dir(&self) -> &Path {
        &self.base_dir
    }

    pub fn entry_path(&self, source: &Path) -> PathBuf {
        let key = path_digest(source);
        let (shard_a, shard_b) = shard_dirs(&key);
        self.base_dir
            .join(shard_a)
            .join(shard_b)
            .join(format!("{key}.json"))
    }
}

#[async_trait]
impl CacheStore for FsCacheStore {
    async fn get(&self, key: &CacheKey) -> CacheLookup {
        let path = self.entry_path(&key.path);
        let Ok(bytes) = tokio::fs::read(&path).await else {
            return CacheLookup::Miss;
        };
        let envelope: CacheEnvelope = match serde_json::from_slice(&bytes) {
            Ok(envelope) => envelope,
            Err(err) => {
                log::debug!("Ignoring unreadable cache entry {}: {err}", path.display());
                return CacheLookup::Miss;
            }
        };
        if envelope.v != ENTRY_VERSION || envelope.path != key.path.to_string_lossy() {
            return CacheLookup::Miss;
        }
        if !key.accepts(envelope.mtime_ms) {
            return CacheLookup::Stale;
        }
        CacheLookup::Hit(CachedRender {
            text: envelope.text,
            map: envelope.map,
        })
    }

    async fn put(&self, key: &CacheKey, render: &CachedRender) -> Result<(), CacheError> {
        let path = self.entry_path(&key.path);
        if let Some(parent) = path.parent() {
            tokio::fs::create_dir_all(parent)
                .await
                .map_err(|e| CacheError::from_io(parent, e))?;
        }

        let envelope = CacheEnvelope {
            v: ENTRY_VERSION,
            path: key.path.to_string_lossy().into_owned(),
            mtime_ms: key.mtime_ms,
            text: render.text.clone(),
            map: render.map.clone(),
        };
        let data = serde_json::to_vec(&envelope)?;

        let tmp = unique_tmp_path(&path);
        if let Err(err) = tokio::fs::write(&tmp, &data).await {
            let _ = tokio::fs::remove_file(&tmp).await;
            return Err(CacheError::from_io(&tmp, err));
        }
        if let Err(err) = tokio::fs::rename(&tmp, &path).await {
            let _ = tokio::fs::remove_file(&tmp).await;
            return Err(CacheError::from_io(&path, err));
        }
        Ok(())
    }
}

/// In-process store, one entry per path.
#[derive(Debug, Default)]
pub struct MemoryCacheStore {
    entries: Mutex<HashMap<PathBuf, (u64, CachedRender)>>,
}

impl MemoryCacheStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub async fn len(&self) -> usize {
        self.entries.lock().await.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.entries.lock().await.is_empty()
    }
}

#[async_trait]
impl CacheStore for MemoryCacheStore {
    async fn get(&self, key: &CacheKey) -> CacheLookup {
        let entries = self.entries.lock().await;
        match entries.get(&key.path) {
            Some((mtime_ms, render)) if key.accepts(*mtime_ms) => CacheLookup::Hit(render.clone()),
            Some(_) => CacheLookup::Stale,
            None => CacheLookup::Miss,
        }
    }

    async fn put(&self, key: &CacheKey, render: &CachedRender) -> Result<(), CacheError> {
        self.entries
            .lock()
            .await
            .insert(key.path.clone(), (key.mtime_ms, render.clone()));
        Ok(())
    }
}

fn path_digest(path: &Path) -> String {
    let mut hasher = Sha256::new();
    hasher.update(path.to_string_lossy().as_bytes());
    format!("{:x}", hasher.finalize())
}

fn shard_dirs(hex: &str) -> (String, String) {
    let a = hex.get(0..2).unwrap_or("00").to_string();
    let b = hex.get(2..4).unwrap_or("00").to_string();
    (a, b)
}

fn unique_tmp_path(path: &Path) -> PathBuf {
    let seq = TMP_COUNTER.fetch_add(1, Ordering::Relaxed);
    path.with_extension(format!("json.{}.{seq}.tmp", std::process::id()))
}
