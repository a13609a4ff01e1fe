//! JSON file-backed engine.
//!
//! Holds every entity in an in-memory map and writes the whole map to one
//! JSON file on `save`: an object mapping `"<Kind>.<id>"` to the entity's
//! flat record. Writes go to `<file>.tmp` first and are renamed over the
//! target, so a crash mid-write leaves the previous snapshot intact.
//!
//! One writer process per file. Two processes sharing a file each overwrite
//! the other's snapshot on `save`.

use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

use async_trait::async_trait;
use models::codec::{self, FlatRecord};
use models::password::PasswordHasher;
use models::{EntityKind, Object, StorageKey};
use serde_json::{Map, Value};
use tokio::io::AsyncWriteExt;
use tokio::sync::{Mutex, RwLock};
use tokio::fs;
use tracing::{debug, info, instrument, warn};
use uuid::Uuid;

use super::Storage;
use crate::errors::ServiceError;

pub struct FileStorage {
    objects: RwLock<BTreeMap<StorageKey, Object>>,
    // serialises snapshot writes; taken before `objects`
    save_lock: Mutex<()>,
    file_path: PathBuf,
    hasher: PasswordHasher,
}

impl FileStorage {
    /// Engine bound to `path`. Nothing is read until `reload`.
    pub fn open<P: Into<PathBuf>>(path: P, hasher: PasswordHasher) -> Self {
        Self {
            objects: RwLock::new(BTreeMap::new()),
            save_lock: Mutex::new(()),
            file_path: path.into(),
            hasher,
        }
    }

    pub fn file_path(&self) -> &Path {
        &self.file_path
    }

    fn tmp_path(&self) -> PathBuf {
        let mut tmp = self.file_path.as_os_str().to_owned();
        tmp.push(".tmp");
        PathBuf::from(tmp)
    }

    async fn write_snapshot(&self, bytes: &[u8]) -> Result<(), ServiceError> {
        common::env::ensure_parent_dir(&self.file_path)
            .await
            .map_err(ServiceError::persistence)?;
        let tmp = self.tmp_path();
        let mut file = fs::File::create(&tmp).await.map_err(ServiceError::persistence)?;
        file.write_all(bytes).await.map_err(ServiceError::persistence)?;
        file.sync_all().await.map_err(ServiceError::persistence)?;
        drop(file);
        fs::rename(&tmp, &self.file_path).await.map_err(ServiceError::persistence)?;
        Ok(())
    }

    /// Parse a snapshot, skipping records that cannot be decoded.
    fn decode_snapshot(&self, bytes: &[u8]) -> BTreeMap<StorageKey, Object> {
        let raw: Map<String, Value> = match serde_json::from_slice(bytes) {
            Ok(raw) => raw,
            Err(e) => {
                warn!(path = %self.file_path.display(), err = %e, "unparsable store file, starting empty");
                return BTreeMap::new();
            }
        };

        let mut objects = BTreeMap::new();
        for (key, value) in raw {
            let record: FlatRecord = match value {
                Value::Object(record) => record,
                other => {
                    warn!(%key, found = %type_name(&other), "skipping non-object record");
                    continue;
                }
            };
            let object = match codec::decode(record) {
                Ok(object) => object,
                Err(e) => {
                    warn!(%key, err = %e, "skipping undecodable record");
                    continue;
                }
            };
            let actual = object.key();
            if key.parse::<StorageKey>().ok() != Some(actual) {
                warn!(%key, %actual, "record stored under a foreign key, re-keying");
            }
            objects.insert(actual, object);
        }
        objects
    }
}

fn type_name(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "bool",
        Value::Number(_) => "number",
        Value::String(_) => "string",
        Value::Array(_) => "array",
        Value::Object(_) => "object",
    }
}

#[async_trait]
impl Storage for FileStorage {
    async fn all(&self, kind: Option<EntityKind>) -> Result<BTreeMap<StorageKey, Object>, ServiceError> {
        let objects = self.objects.read().await;
        Ok(objects
            .iter()
            .filter(|(key, _)| kind.map_or(true, |k| key.kind == k))
            .map(|(key, object)| (*key, object.clone()))
            .collect())
    }

    async fn get(&self, kind: EntityKind, id: Uuid) -> Result<Option<Object>, ServiceError> {
        let objects = self.objects.read().await;
        Ok(objects.get(&StorageKey::new(kind, id)).cloned())
    }

    async fn new(&self, mut object: Object) -> Result<(), ServiceError> {
        object.hash_password(&self.hasher)?;
        let key = object.key();
        self.objects.write().await.insert(key, object);
        debug!(%key, "registered");
        Ok(())
    }

    #[instrument(skip(self))]
    async fn save(&self) -> Result<(), ServiceError> {
        let _guard = self.save_lock.lock().await;
        let (bytes, entries) = {
            let objects = self.objects.read().await;
            let mut snapshot = Map::new();
            for (key, object) in objects.iter() {
                snapshot.insert(key.to_string(), Value::Object(codec::encode(object, &self.hasher)?));
            }
            let bytes = serde_json::to_vec(&snapshot).map_err(ServiceError::persistence)?;
            (bytes, objects.len())
        };
        self.write_snapshot(&bytes).await?;
        info!(path = %self.file_path.display(), entries, bytes = bytes.len(), "store saved");
        Ok(())
    }

    async fn delete(&self, object: Option<&Object>) -> Result<(), ServiceError> {
        let Some(object) = object else { return Ok(()) };
        let key = object.key();
        if self.objects.write().await.remove(&key).is_some() {
            debug!(%key, "removed");
        }
        Ok(())
    }

    async fn count(&self, kind: Option<EntityKind>) -> Result<usize, ServiceError> {
        let objects = self.objects.read().await;
        Ok(match kind {
            Some(k) => objects.keys().filter(|key| key.kind == k).count(),
            None => objects.len(),
        })
    }

    #[instrument(skip(self))]
    async fn reload(&self) -> Result<(), ServiceError> {
        let _guard = self.save_lock.lock().await;
        let loaded = match fs::read(&self.file_path).await {
            Ok(bytes) => self.decode_snapshot(&bytes),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                info!(path = %self.file_path.display(), "no store file yet, starting empty");
                BTreeMap::new()
            }
            Err(e) => return Err(ServiceError::persistence(e)),
        };
        let entries = loaded.len();
        *self.objects.write().await = loaded;
        info!(path = %self.file_path.display(), entries, "store reloaded");
        Ok(())
    }

    async fn close(&self) -> Result<(), ServiceError> {
        self.reload().await
    }
}
