//! Chapter-to-chapter continuity.
//!
//! Long-range memory is approximated by a bounded window: each chapter prompt
//! gets the summaries of the last three finished chapters plus the literal
//! tail text of the immediately preceding one, read back from disk. Prompt
//! size stays roughly constant across all 100 chapters.

use crate::story::ChapterSummary;
use anyhow::{Context as _, Result};
use std::fs;
use std::path::{Path, PathBuf};

pub struct ContextManager {
    context_dir: PathBuf,
    summaries: Vec<ChapterSummary>,
}

impl ContextManager {
    pub fn new(context_dir: impl Into<PathBuf>) -> Self {
        Self {
            context_dir: context_dir.into(),
            summaries: Vec::new(),
        }
    }

    pub fn push_summary(&mut self, summary: ChapterSummary) {
        self.summaries.push(summary);
    }

    /// Builds the continuity block for a chapter prompt: the last up-to-3
    /// chapter summaries, then the persisted ending of the previous chapter.
    /// Chapter 1 gets no context.
    pub fn previous_context(&self, chapter_num: u32) -> String {
        if chapter_num <= 1 {
            return String::new();
        }

        let mut parts = Vec::new();

        let start = self.summaries.len().saturating_sub(3);
        let recent = &self.summaries[start..];
        if !recent.is_empty() {
            parts.push("पिछले अध्यायों का सारांश:".to_string());
            for summary in recent {
                parts.push(format!("अध्याय {}: {}", summary.chapter_num, summary.title));
                let brief: String = summary.summary.chars().take(300).collect();
                parts.push(format!("- {}...", brief));
                parts.push(format!("- अंत: {}", summary.ending));
                parts.push(String::new());
            }
        }

        let ending = self.read_previous_ending(chapter_num);
        if !ending.is_empty() {
            parts.push("पिछले अध्याय के अंतिम पैराग्राफ:".to_string());
            parts.push(ending);
        }

        parts.join("\n")
    }

    /// Persists the tail of a finished chapter for the next chapter's prompt:
    /// the last 800 words when the chapter exceeds 800, otherwise the last 500
    /// (which is the whole text for short chapters).
    pub fn save_chapter_ending(&self, chapter_num: u32, content: &str) -> Result<()> {
        let words: Vec<&str> = content.split_whitespace().collect();
        let keep = if words.len() > 800 { 800 } else { 500 };
        let start = words.len().saturating_sub(keep);
        let ending = words[start..].join(" ");

        let path = self.ending_path(chapter_num);
        fs::write(&path, ending)
            .with_context(|| format!("Failed to write chapter ending {:?}", path))?;
        Ok(())
    }

    /// Reads the persisted ending of the chapter before `chapter_num`, empty
    /// if none was saved.
    pub fn read_previous_ending(&self, chapter_num: u32) -> String {
        if chapter_num <= 1 {
            return String::new();
        }
        let path = self.ending_path(chapter_num - 1);
        read_if_exists(&path)
    }

    fn ending_path(&self, chapter_num: u32) -> PathBuf {
        self.context_dir
            .join(format!("ch{:03}_ending.txt", chapter_num))
    }
}

fn read_if_exists(path: &Path) -> String {
    fs::read_to_string(path).unwrap_or_default()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn summary(n: u32) -> ChapterSummary {
        ChapterSummary {
            chapter_num: n,
            title: format!("शीर्षक {}", n),
            summary: format!("अध्याय {} की कहानी", n),
            ending: format!("सस्पेंस {}", n),
        }
    }

    #[test]
    fn test_no_context_for_first_chapter() {
        let dir = tempfile::tempdir().unwrap();
        let mut manager = ContextManager::new(dir.path());
        manager.push_summary(summary(1));
        assert_eq!(manager.previous_context(1), "");
    }

    #[test]
    fn test_window_is_last_three_summaries() {
        let dir = tempfile::tempdir().unwrap();
        let mut manager = ContextManager::new(dir.path());
        for n in 1..=4 {
            manager.push_summary(summary(n));
        }
        let context = manager.previous_context(5);
        assert!(!context.contains("अध्याय 1:"));
        assert!(context.contains("अध्याय 2:"));
        assert!(context.contains("अध्याय 3:"));
        assert!(context.contains("अध्याय 4:"));
    }

    #[test]
    fn test_previous_ending_round_trip() {
        let dir = tempfile::tempdir().unwrap();
        let manager = ContextManager::new(dir.path());
        manager.save_chapter_ending(4, "आख़िरी पल में सब बदल गया").unwrap();

        let context = manager.previous_context(5);
        assert!(context.contains("पिछले अध्याय के अंतिम पैराग्राफ:"));
        assert!(context.contains("आख़िरी पल में सब बदल गया"));
        assert_eq!(manager.read_previous_ending(4), "");
    }

    #[test]
    fn test_ending_keeps_last_800_words_of_long_chapter() {
        let dir = tempfile::tempdir().unwrap();
        let manager = ContextManager::new(dir.path());

        let long: Vec<String> = (0..1000).map(|i| format!("w{}", i)).collect();
        manager.save_chapter_ending(1, &long.join(" ")).unwrap();
        let saved = manager.read_previous_ending(2);
        let words: Vec<&str> = saved.split_whitespace().collect();
        assert_eq!(words.len(), 800);
        assert_eq!(words[0], "w200");

        let short: Vec<String> = (0..100).map(|i| format!("s{}", i)).collect();
        manager.save_chapter_ending(2, &short.join(" ")).unwrap();
        let saved = manager.read_previous_ending(3);
        assert_eq!(saved.split_whitespace().count(), 100);
    }
}
