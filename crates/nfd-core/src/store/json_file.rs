use std::{
    collections::BTreeMap,
    path::{Path, PathBuf},
};

use async_trait::async_trait;
use serde_json::Value;
use tokio::{io::AsyncWriteExt, sync::Mutex};

use crate::{store::KvStore, Result};

/// Durable store backed by a single JSON object on disk.
///
/// The whole map lives in memory; every `put` rewrites the file through a
/// synced temp file + rename so a crash never leaves a half-written document.
/// A `put` whose write fails leaves both memory and disk unchanged.
#[derive(Debug)]
pub struct JsonFileStore {
    path: PathBuf,
    inner: Mutex<BTreeMap<String, Value>>,
}

impl JsonFileStore {
    /// Missing or empty file means an empty store.
    pub async fn open(path: impl Into<PathBuf>) -> Result<Self> {
        let path = path.into();
        let entries = load_entries(&path).await?;
        Ok(Self {
            path,
            inner: Mutex::new(entries),
        })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

#[async_trait]
impl KvStore for JsonFileStore {
    async fn get(&self, key: &str) -> Result<Option<Value>> {
        Ok(self.inner.lock().await.get(key).cloned())
    }

    async fn put(&self, key: &str, value: Value) -> Result<()> {
        let mut guard = self.inner.lock().await;
        let mut next = guard.clone();
        next.insert(key.to_string(), value);
        let txt = serde_json::to_string(&next)?;
        save_file(&self.path, txt).await?;
        *guard = next;
        Ok(())
    }
}

async fn load_entries(path: &Path) -> Result<BTreeMap<String, Value>> {
    if !tokio::fs::try_exists(path).await? {
        return Ok(BTreeMap::new());
    }
    let txt = tokio::fs::read_to_string(path).await?;
    if txt.trim().is_empty() {
        return Ok(BTreeMap::new());
    }
    Ok(serde_json::from_str(&txt)?)
}

async fn save_file(path: &Path, txt: String) -> Result<()> {
    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        tokio::fs::create_dir_all(parent).await?;
    }
    let mut tmp = path.as_os_str().to_owned();
    tmp.push(".tmp");
    let tmp = PathBuf::from(tmp);
    let mut file = tokio::fs::File::create(&tmp).await?;
    file.write_all(txt.as_bytes()).await?;
    file.sync_all().await?;
    drop(file);
    tokio::fs::rename(&tmp, path).await?;
    Ok(())
}
