//! Deterministic text scrubbing so generated prose is safe for speech
//! synthesis: markdown symbols, stage directions, emoji, and stray
//! punctuation all read terribly when spoken aloud.

use regex::Regex;
use std::sync::OnceLock;

/// Ordered substitution table. Order matters: bracketed asides must go before
/// the quote stripping, and whitespace collapse runs last.
fn rules() -> &'static Vec<(Regex, &'static str)> {
    static RULES: OnceLock<Vec<(Regex, &'static str)>> = OnceLock::new();
    RULES.get_or_init(|| {
        let patterns: &[(&str, &str)] = &[
            (r"\*+", ""),
            (r"#+", ""),
            (r"_+", ""),
            (r"(?s)```.*?```", ""),
            (r"\[.*?\]", ""),
            (r"\(.*?\)", ""),
            (r"\{.*?\}", ""),
            (r"(?i)(panel|scene|दृश्य|पैनल)\s*\d+", ""),
            (r"(?i)(visual|caption|narrator|कथावाचक):", ""),
            // Emoji and pictograph blocks.
            (
                "[\u{1F600}-\u{1F64F}\u{1F300}-\u{1F5FF}\u{1F680}-\u{1F6FF}\u{1F1E0}-\u{1F1FF}\u{2500}-\u{2BEF}\u{2702}-\u{27B0}\u{24C2}-\u{1F251}]+",
                "",
            ),
            (r"[=\-_]{3,}", ""),
            (r"[•·∙‣⁃]", ""),
            // Script-style speaker labels become spoken attribution.
            (r"([A-Z][A-Za-z]+):\s*", "$1 ने कहा - "),
            (r#"["“”'‘’`]"#, ""),
            // Normalize spacing around the danda and commas, then sentence stops.
            (r"\s+([।,])", "$1"),
            (r"([।,])\s*", "$1 "),
            (r"([.!?])\s*", "$1 "),
            (r"\n{3,}", "\n\n"),
            (r" {2,}", " "),
            (r"\t+", " "),
        ];
        patterns
            .iter()
            .map(|(pat, rep)| (Regex::new(pat).expect("static cleanup pattern"), *rep))
            .collect()
    })
}

/// Deep cleaning for TTS compatibility.
pub fn deep_clean_for_tts(text: &str) -> String {
    let mut out = text.to_string();
    for (re, replacement) in rules() {
        out = re.replace_all(&out, *replacement).into_owned();
    }
    out.trim().to_string()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_strips_markdown_symbols() {
        let cleaned = deep_clean_for_tts("**बहुत** ##ज़रूरी## _बात_");
        assert!(!cleaned.contains('*'));
        assert!(!cleaned.contains('#'));
        assert!(!cleaned.contains('_'));
    }

    #[test]
    fn test_strips_scene_markers_and_asides() {
        let cleaned = deep_clean_for_tts("Scene 3 [visual: city] मार्कस आगे बढ़ा (धीरे से)");
        assert!(!cleaned.to_lowercase().contains("scene"));
        assert!(!cleaned.contains('['));
        assert!(!cleaned.contains('('));
        assert!(cleaned.contains("मार्कस आगे बढ़ा"));
    }

    #[test]
    fn test_strips_emoji() {
        let cleaned = deep_clean_for_tts("जीत 🎉 का पल 📚");
        assert!(!cleaned.contains('🎉'));
        assert!(!cleaned.contains('📚'));
    }

    #[test]
    fn test_speaker_label_becomes_attribution() {
        let cleaned = deep_clean_for_tts("Marcus: अब मेरी चाल");
        assert!(cleaned.contains("Marcus ने कहा - अब मेरी चाल"));
    }

    #[test]
    fn test_danda_spacing_normalized() {
        let cleaned = deep_clean_for_tts("वह रुका   ।फिर बोला");
        assert!(cleaned.contains("वह रुका। फिर बोला"));
    }

    #[test]
    fn test_collapses_blank_lines_and_spaces() {
        let cleaned = deep_clean_for_tts("पहला\n\n\n\nदूसरा   तीसरा");
        assert!(!cleaned.contains("\n\n\n"));
        assert!(!cleaned.contains("  "));
        assert_eq!(deep_clean_for_tts("अब\tचलो"), "अब चलो");
    }
}
