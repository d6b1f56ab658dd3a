//! Durable per-session stage artifacts.
//!
//! Every stage persists its output as a JSON document at a path derived from
//! the session id, so a later run can skip completed work. Loads are
//! fail-open: a missing or corrupt file is "no prior state", never an error.
//! Saves rewrite the whole document.

use crate::story::{ChapterProgress, Foundation, OutlineProgress, SeriesData};
use anyhow::{Context, Result};
use serde::de::DeserializeOwned;
use serde::Serialize;
use std::fs;
use std::path::{Path, PathBuf};

pub struct CheckpointStore {
    metadata_dir: PathBuf,
}

impl CheckpointStore {
    pub fn new(metadata_dir: impl Into<PathBuf>) -> Self {
        Self {
            metadata_dir: metadata_dir.into(),
        }
    }

    pub fn load_foundation(&self, session_id: &str) -> Option<Foundation> {
        load_json(&self.path(session_id, "foundation"))
    }

    pub fn save_foundation(&self, session_id: &str, foundation: &Foundation) -> Result<()> {
        save_json(&self.path(session_id, "foundation"), foundation)
    }

    pub fn load_series(&self, session_id: &str) -> Option<SeriesData> {
        load_json(&self.path(session_id, "all_chapters"))
    }

    pub fn save_series(&self, session_id: &str, series: &SeriesData) -> Result<()> {
        save_json(&self.path(session_id, "all_chapters"), series)
    }

    pub fn load_outline_progress(&self, session_id: &str) -> Option<OutlineProgress> {
        load_json(&self.path(session_id, "outline_progress"))
    }

    pub fn save_outline_progress(&self, session_id: &str, progress: &OutlineProgress) -> Result<()> {
        save_json(&self.path(session_id, "outline_progress"), progress)
    }

    /// Removes the outline progress checkpoint once the canonical document
    /// holds all chapters and the progress file has nothing left to add.
    pub fn clear_outline_progress(&self, session_id: &str) {
        let path = self.path(session_id, "outline_progress");
        if let Err(e) = fs::remove_file(&path) {
            if e.kind() != std::io::ErrorKind::NotFound {
                log::warn!("Could not remove outline progress {:?}: {}", path, e);
            }
        }
    }

    pub fn load_chapter_progress(&self, session_id: &str) -> Option<ChapterProgress> {
        load_json(&self.path(session_id, "chapter_progress"))
    }

    pub fn save_chapter_progress(&self, session_id: &str, progress: &ChapterProgress) -> Result<()> {
        save_json(&self.path(session_id, "chapter_progress"), progress)
    }

    fn path(&self, session_id: &str, stage: &str) -> PathBuf {
        self.metadata_dir
            .join(format!("{}_{}.json", session_id, stage))
    }
}

fn load_json<T: DeserializeOwned>(path: &Path) -> Option<T> {
    let content = fs::read_to_string(path).ok()?;
    match serde_json::from_str(&content) {
        Ok(value) => Some(value),
        Err(e) => {
            log::warn!("Ignoring corrupt checkpoint {:?}: {}", path, e);
            None
        }
    }
}

fn save_json<T: Serialize>(path: &Path, value: &T) -> Result<()> {
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent)?;
    }
    let content = serde_json::to_string_pretty(value)?;
    fs::write(path, content).with_context(|| format!("Failed to write checkpoint {:?}", path))?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::story::ChapterOutline;

    #[test]
    fn test_foundation_round_trip() {
        let dir = tempfile::tempdir().unwrap();
        let store = CheckpointStore::new(dir.path());

        assert!(store.load_foundation("s1").is_none());

        let foundation = Foundation {
            series_title: "छाया का खेल".to_string(),
            skill_topic: "negotiation".to_string(),
            ..Default::default()
        };
        store.save_foundation("s1", &foundation).unwrap();

        let loaded = store.load_foundation("s1").unwrap();
        assert_eq!(loaded.series_title, "छाया का खेल");
    }

    #[test]
    fn test_corrupt_checkpoint_is_none() {
        let dir = tempfile::tempdir().unwrap();
        let store = CheckpointStore::new(dir.path());

        fs::write(dir.path().join("s1_foundation.json"), "{ not json").unwrap();
        assert!(store.load_foundation("s1").is_none());
    }

    #[test]
    fn test_outline_progress_lifecycle() {
        let dir = tempfile::tempdir().unwrap();
        let store = CheckpointStore::new(dir.path());

        let progress = OutlineProgress {
            completed_batches: vec![(1, 20)],
            chapters: vec![ChapterOutline {
                chapter_num: 1,
                ..Default::default()
            }],
        };
        store.save_outline_progress("s1", &progress).unwrap();
        assert_eq!(
            store.load_outline_progress("s1").unwrap().completed_batches,
            vec![(1, 20)]
        );

        store.clear_outline_progress("s1");
        assert!(store.load_outline_progress("s1").is_none());
        // Clearing twice is harmless.
        store.clear_outline_progress("s1");
    }

    #[test]
    fn test_chapter_progress_round_trip() {
        let dir = tempfile::tempdir().unwrap();
        let store = CheckpointStore::new(dir.path());

        let progress = ChapterProgress {
            last_completed_chapter: 42,
            failed: vec![17],
        };
        store.save_chapter_progress("s1", &progress).unwrap();
        let loaded = store.load_chapter_progress("s1").unwrap();
        assert_eq!(loaded.last_completed_chapter, 42);
        assert_eq!(loaded.failed, vec![17]);
    }
}
