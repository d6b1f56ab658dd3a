//! Topic-to-session index.
//!
//! Repeated runs for the same topic must resume the existing session instead
//! of starting a parallel one, so the mapping is persisted next to the other
//! metadata. A missing or unreadable index means "no prior session known".

use anyhow::{Context, Result};
use std::collections::HashMap;
use std::fs;
use std::path::{Path, PathBuf};

const INDEX_FILE: &str = "session_index.json";

pub struct SessionRegistry {
    path: PathBuf,
    topics: HashMap<String, String>,
}

impl SessionRegistry {
    pub fn open(metadata_dir: impl AsRef<Path>) -> Self {
        let path = metadata_dir.as_ref().join(INDEX_FILE);
        let topics = fs::read_to_string(&path)
            .ok()
            .and_then(|content| match serde_json::from_str(&content) {
                Ok(map) => Some(map),
                Err(e) => {
                    log::warn!("Ignoring corrupt session index {:?}: {}", path, e);
                    None
                }
            })
            .unwrap_or_default();
        Self { path, topics }
    }

    pub fn lookup(&self, topic: &str) -> Option<String> {
        self.topics.get(topic).cloned()
    }

    /// Upserts the mapping and rewrites the index immediately.
    pub fn register(&mut self, topic: &str, session_id: &str) -> Result<()> {
        self.topics
            .insert(topic.to_string(), session_id.to_string());
        if let Some(parent) = self.path.parent() {
            fs::create_dir_all(parent)?;
        }
        let content = serde_json::to_string_pretty(&self.topics)?;
        fs::write(&self.path, content)
            .with_context(|| format!("Failed to write session index {:?}", self.path))?;
        Ok(())
    }
}
