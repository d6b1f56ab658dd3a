use serde::{Deserialize, Serialize};

/// Series-level bible generated once per session before any chapters.
#[derive(Debug, Serialize, Deserialize, Clone, Default)]
pub struct Foundation {
    pub series_title: String,
    #[serde(default)]
    pub skill_topic: String,
    #[serde(default)]
    pub story_overview: String,
    #[serde(default)]
    pub main_storyline: String,
    #[serde(default)]
    pub world_setting: String,
    #[serde(default)]
    pub central_conflict: String,
    #[serde(default)]
    pub characters: Vec<Character>,
}

impl Foundation {
    /// Filesystem-safe series title used in chapter filenames.
    pub fn safe_title(&self) -> String {
        self.series_title
            .replace(' ', "_")
            .chars()
            .take(30)
            .collect()
    }
}

#[derive(Debug, Serialize, Deserialize, Clone, Default)]
pub struct Character {
    pub name: String,
    #[serde(default)]
    pub role: String,
    #[serde(default)]
    pub personality: String,
    #[serde(default)]
    pub intelligence_type: String,
    #[serde(default)]
    pub background: String,
    #[serde(default)]
    pub character_arc: String,
    #[serde(default)]
    pub signature_trait: String,
}

/// Per-chapter structured plan produced by the outline stage.
#[derive(Debug, Serialize, Deserialize, Clone, Default)]
pub struct ChapterOutline {
    pub chapter_num: u32,
    #[serde(default)]
    pub title: String,
    #[serde(default)]
    pub lesson_focus: String,
    #[serde(default)]
    pub plot_summary: String,
    #[serde(default)]
    pub character_focus: String,
    #[serde(default)]
    pub key_scenes: String,
    #[serde(default)]
    pub smart_moments: String,
    #[serde(default)]
    pub cliffhanger: String,
    #[serde(default)]
    pub difficulty: String,
}

/// Canonical per-session document: foundation plus every outline so far.
#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct SeriesData {
    pub foundation: Foundation,
    pub chapters: Vec<ChapterOutline>,
    pub total: usize,
}

/// Compressed record of a finished chapter, kept in memory for the rolling
/// continuity window fed into the next chapter's prompt.
#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct ChapterSummary {
    pub chapter_num: u32,
    pub title: String,
    pub summary: String,
    pub ending: String,
}

/// Outline-stage checkpoint, deleted once all 100 outlines exist.
#[derive(Debug, Serialize, Deserialize, Clone, Default)]
pub struct OutlineProgress {
    pub completed_batches: Vec<(u32, u32)>,
    pub chapters: Vec<ChapterOutline>,
}

/// Chapter-stage checkpoint, rewritten after every attempt.
#[derive(Debug, Serialize, Deserialize, Clone, Default)]
pub struct ChapterProgress {
    pub last_completed_chapter: u32,
    pub failed: Vec<u32>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_safe_title_truncates() {
        let foundation = Foundation {
            series_title: "a very long series title that keeps going".to_string(),
            ..Default::default()
        };
        let safe = foundation.safe_title();
        assert_eq!(safe.chars().count(), 30);
        assert!(!safe.contains(' '));
    }

    #[test]
    fn test_outline_tolerates_missing_fields() {
        let outline: ChapterOutline =
            serde_json::from_str(r#"{"chapter_num": 7, "title": "परीक्षा"}"#).unwrap();
        assert_eq!(outline.chapter_num, 7);
        assert!(outline.cliffhanger.is_empty());
    }
}
