use std::collections::HashMap;
use std::path::PathBuf;

use async_trait::async_trait;
use tokio::sync::Mutex;

use crate::error::Result;

mod events;
mod locations;
mod user;

pub use events::EventStore;
pub use locations::LocationStore;
pub use user::UserStore;

/// Key group for the user profile, security settings and contacts.
pub const GROUP_USER_PREFS: &str = "user_preferences";
/// Key group for anti-theft state, password state, events and locations.
pub const GROUP_SECURE_PREFS: &str = "phone_secure_prefs";

/// Durable string key-value persistence. Values are JSON documents
/// serialized by the stores layered on top.
#[async_trait]
pub trait KvStore: Send + Sync {
    async fn get(&self, group: &str, key: &str) -> Result<Option<String>>;
    async fn put(&self, group: &str, key: &str, value: String) -> Result<()>;
    async fn remove(&self, group: &str, key: &str) -> Result<()>;
}

/// File-backed store: one JSON document per `{group}.{key}.json` file
/// inside the data directory. Writes go through a temp file and rename
/// so a crash mid-write never leaves a truncated document.
pub struct FileKvStore {
    dir: PathBuf,
}

impl FileKvStore {
    pub async fn open(dir: impl Into<PathBuf>) -> Result<Self> {
        let dir = dir.into();
        tokio::fs::create_dir_all(&dir).await?;
        Ok(Self { dir })
    }

    fn path_for(&self, group: &str, key: &str) -> PathBuf {
        self.dir.join(format!("{}.{}.json", group, key))
    }
}

#[async_trait]
impl KvStore for FileKvStore {
    async fn get(&self, group: &str, key: &str) -> Result<Option<String>> {
        match tokio::fs::read_to_string(self.path_for(group, key)).await {
            Ok(contents) => Ok(Some(contents)),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(None),
            Err(e) => Err(e.into()),
        }
    }

    async fn put(&self, group: &str, key: &str, value: String) -> Result<()> {
        let path = self.path_for(group, key);
        let tmp = path.with_extension("json.tmp");
        tokio::fs::write(&tmp, value).await?;
        tokio::fs::rename(&tmp, &path).await?;
        Ok(())
    }

    async fn remove(&self, group: &str, key: &str) -> Result<()> {
        match tokio::fs::remove_file(self.path_for(group, key)).await {
            Ok(()) => Ok(()),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(()),
            Err(e) => Err(e.into()),
        }
    }
}

/// In-memory store for tests and dry runs.
#[derive(Default)]
pub struct MemoryKvStore {
    entries: Mutex<HashMap<(String, String), String>>,
}

impl MemoryKvStore {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl KvStore for MemoryKvStore {
    async fn get(&self, group: &str, key: &str) -> Result<Option<String>> {
        let entries = self.entries.lock().await;
        Ok(entries.get(&(group.to_string(), key.to_string())).cloned())
    }

    async fn put(&self, group: &str, key: &str, value: String) -> Result<()> {
        let mut entries = self.entries.lock().await;
        entries.insert((group.to_string(), key.to_string()), value);
        Ok(())
    }

    async fn remove(&self, group: &str, key: &str) -> Result<()> {
        let mut entries = self.entries.lock().await;
        entries.remove(&(group.to_string(), key.to_string()));
        Ok(())
    }
}
