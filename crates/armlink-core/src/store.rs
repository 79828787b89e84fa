//! Pose persistence
//!
//! An "active" slot holds the last pose of the session; named configurations
//! are saved under derived keys with an index list of their names. The
//! backend is a localStorage-shaped key-value interface, with two
//! implementations: in-memory (tests, ephemeral sessions) and a JSON file
//! on disk. All payloads use the canonical flat pose encoding.

use std::collections::HashMap;
use std::path::{Path, PathBuf};
use thiserror::Error;
use tracing::{info, warn};

use crate::pose::Pose;

/// Key holding the active pose
pub const ACTIVE_POSE_KEY: &str = "armlink.pose.active";

/// Key holding the index list of named-configuration names
pub const SAVED_INDEX_KEY: &str = "armlink.pose.index";

/// Key holding one named configuration
pub fn saved_pose_key(name: &str) -> String {
    format!("armlink.pose.saved.{name}")
}

#[derive(Error, Debug)]
pub enum StoreError {
    #[error("malformed pose payload: {0}")]
    MalformedPayload(#[from] serde_json::Error),
    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),
}

/// Key-value persistence backend
pub trait KvBackend: Send + Sync {
    fn get(&self, key: &str) -> Option<String>;
    fn set(&mut self, key: &str, value: &str);
    fn remove(&mut self, key: &str);
}

/// Volatile backend; contents die with the process
#[derive(Debug, Default)]
pub struct MemoryBackend {
    map: HashMap<String, String>,
}

impl MemoryBackend {
    pub fn new() -> Self {
        Self::default()
    }
}

impl KvBackend for MemoryBackend {
    fn get(&self, key: &str) -> Option<String> {
        self.map.get(key).cloned()
    }

    fn set(&mut self, key: &str, value: &str) {
        self.map.insert(key.to_string(), value.to_string());
    }

    fn remove(&mut self, key: &str) {
        self.map.remove(key);
    }
}

/// Backend persisted as a single JSON object on disk. Every mutation is
/// written through; a write failure degrades to a logged warning so a
/// storage glitch never takes the session down.
#[derive(Debug)]
pub struct FileBackend {
    path: PathBuf,
    map: HashMap<String, String>,
}

impl FileBackend {
    /// Open or create the backing file. An unparsable file is reported and
    /// treated as empty rather than failing the session.
    pub fn open(path: impl Into<PathBuf>) -> Result<Self, StoreError> {
        let path = path.into();
        let map = if path.exists() {
            let content = std::fs::read_to_string(&path)?;
            match serde_json::from_str(&content) {
                Ok(map) => {
                    info!(path = %path.display(), "Loaded pose storage");
                    map
                }
                Err(e) => {
                    warn!(path = %path.display(), error = %e, "Pose storage unreadable, starting empty");
                    HashMap::new()
                }
            }
        } else {
            HashMap::new()
        };
        Ok(Self { path, map })
    }

    fn persist(&self) {
        let content = match serde_json::to_string_pretty(&self.map) {
            Ok(content) => content,
            Err(e) => {
                warn!(error = %e, "Failed to serialize pose storage");
                return;
            }
        };
        if let Err(e) = std::fs::write(&self.path, content) {
            warn!(path = %self.path.display(), error = %e, "Failed to write pose storage");
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl KvBackend for FileBackend {
    fn get(&self, key: &str) -> Option<String> {
        self.map.get(key).cloned()
    }

    fn set(&mut self, key: &str, value: &str) {
        self.map.insert(key.to_string(), value.to_string());
        self.persist();
    }

    fn remove(&mut self, key: &str) {
        if self.map.remove(key).is_some() {
            self.persist();
        }
    }
}

/// Serializes and restores poses against a persistence backend
pub struct PoseStore {
    backend: Box<dyn KvBackend>,
}

impl PoseStore {
    pub fn new(backend: impl KvBackend + 'static) -> Self {
        Self {
            backend: Box::new(backend),
        }
    }

    /// Write the active pose slot
    pub fn save_active(&mut self, pose: &Pose) {
        self.backend.set(ACTIVE_POSE_KEY, &pose.to_json());
    }

    /// Read the active pose slot. Missing key yields `None`; a payload that
    /// fails to parse is reported to the caller, who keeps the current pose.
    pub fn load_active(&self) -> Result<Option<Pose>, StoreError> {
        match self.backend.get(ACTIVE_POSE_KEY) {
            Some(payload) => Ok(Some(Pose::from_json(&payload)?)),
            None => Ok(None),
        }
    }

    pub fn clear_active(&mut self) {
        self.backend.remove(ACTIVE_POSE_KEY);
    }

    /// Save a named configuration and add its name to the index (once)
    pub fn save_named(&mut self, name: &str, pose: &Pose) {
        self.backend.set(&saved_pose_key(name), &pose.to_json());
        let mut names = self.list_names();
        if !names.iter().any(|n| n == name) {
            names.push(name.to_string());
            self.write_index(&names);
        }
    }

    pub fn load_named(&self, name: &str) -> Result<Option<Pose>, StoreError> {
        match self.backend.get(&saved_pose_key(name)) {
            Some(payload) => Ok(Some(Pose::from_json(&payload)?)),
            None => Ok(None),
        }
    }

    /// Remove a named configuration's payload and its index entry
    pub fn delete_named(&mut self, name: &str) {
        self.backend.remove(&saved_pose_key(name));
        let names: Vec<String> = self
            .list_names()
            .into_iter()
            .filter(|n| n != name)
            .collect();
        self.write_index(&names);
    }

    /// Names of all saved configurations, in save order. An unreadable
    /// index is reported and treated as empty.
    pub fn list_names(&self) -> Vec<String> {
        let Some(payload) = self.backend.get(SAVED_INDEX_KEY) else {
            return Vec::new();
        };
        match serde_json::from_str(&payload) {
            Ok(names) => names,
            Err(e) => {
                warn!(error = %e, "Saved-configuration index unreadable, treating as empty");
                Vec::new()
            }
        }
    }

    /// Canonical structured-text encoding of a pose
    pub fn export_text(&self, pose: &Pose) -> String {
        pose.to_json()
    }

    /// Parse the canonical structured-text encoding. Invalid syntax yields
    /// `MalformedPayload`; the store itself is untouched either way.
    pub fn import_text(&self, text: &str) -> Result<Pose, StoreError> {
        Ok(Pose::from_json(text)?)
    }

    fn write_index(&mut self, names: &[String]) {
        match serde_json::to_string(names) {
            Ok(payload) => self.backend.set(SAVED_INDEX_KEY, &payload),
            Err(e) => warn!(error = %e, "Failed to serialize saved-configuration index"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn pose(entries: &[(&str, f64)]) -> Pose {
        let mut pose = Pose::new();
        for (name, deg) in entries {
            pose.set(*name, *deg);
        }
        pose
    }

    #[test]
    fn test_active_slot_round_trip() {
        let mut store = PoseStore::new(MemoryBackend::new());
        assert!(store.load_active().unwrap().is_none());

        let saved = pose(&[("A1", 45.0), ("A6", -345.0)]);
        store.save_active(&saved);
        assert_eq!(store.load_active().unwrap().unwrap(), saved);

        store.clear_active();
        assert!(store.load_active().unwrap().is_none());
    }

    #[test]
    fn test_malformed_active_is_reported_not_fatal() {
        let mut backend = MemoryBackend::new();
        backend.set(ACTIVE_POSE_KEY, "not json");
        let store = PoseStore::new(backend);
        assert!(matches!(
            store.load_active(),
            Err(StoreError::MalformedPayload(_))
        ));
    }

    #[test]
    fn test_named_configuration_round_trip() {
        let mut store = PoseStore::new(MemoryBackend::new());
        let pickup = pose(&[("A1", 30.0), ("A2", -45.0)]);

        store.save_named("pickup", &pickup);
        // Saving twice keeps a single index entry
        store.save_named("pickup", &pickup);
        assert_eq!(store.list_names(), ["pickup"]);
        assert_eq!(store.load_named("pickup").unwrap().unwrap(), pickup);

        store.delete_named("pickup");
        assert!(store.list_names().is_empty());
        assert!(store.load_named("pickup").unwrap().is_none());
    }

    #[test]
    fn test_list_preserves_save_order() {
        let mut store = PoseStore::new(MemoryBackend::new());
        store.save_named("pickup", &pose(&[("A1", 1.0)]));
        store.save_named("dropoff", &pose(&[("A1", 2.0)]));
        store.save_named("rest", &pose(&[("A1", 3.0)]));
        assert_eq!(store.list_names(), ["pickup", "dropoff", "rest"]);

        store.delete_named("dropoff");
        assert_eq!(store.list_names(), ["pickup", "rest"]);
    }

    #[test]
    fn test_import_text() {
        let store = PoseStore::new(MemoryBackend::new());
        let imported = store.import_text("{\"A1\": 30, \"A6\": -345}").unwrap();
        assert_eq!(imported.len(), 2);

        let mut store = store;
        store.save_active(&pose(&[("A2", 10.0)]));
        let before = store.load_active().unwrap();
        assert!(matches!(
            store.import_text("not json"),
            Err(StoreError::MalformedPayload(_))
        ));
        // A failed import leaves the active slot untouched
        assert_eq!(store.load_active().unwrap(), before);
    }

    #[test]
    fn test_export_import_round_trip() {
        let store = PoseStore::new(MemoryBackend::new());
        let original = pose(&[("A3", 15.5), ("A4", -120.0)]);
        let text = store.export_text(&original);
        assert_eq!(store.import_text(&text).unwrap(), original);
    }

    #[test]
    fn test_file_backend_survives_reopen() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("poses.json");

        let backend = FileBackend::open(&path).unwrap();
        let mut store = PoseStore::new(backend);
        store.save_named("park", &pose(&[("A1", -90.0)]));
        store.save_active(&pose(&[("A5", 60.0)]));

        let reopened = PoseStore::new(FileBackend::open(&path).unwrap());
        assert_eq!(reopened.list_names(), ["park"]);
        assert_eq!(
            reopened.load_named("park").unwrap().unwrap(),
            pose(&[("A1", -90.0)])
        );
        assert_eq!(
            reopened.load_active().unwrap().unwrap(),
            pose(&[("A5", 60.0)])
        );
    }

    #[test]
    fn test_file_backend_unreadable_file_starts_empty() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("poses.json");
        std::fs::write(&path, "garbage").unwrap();

        let store = PoseStore::new(FileBackend::open(&path).unwrap());
        assert!(store.load_active().unwrap().is_none());
        assert!(store.list_names().is_empty());
    }
}
