use crate::config::Config;
use anyhow::{anyhow, bail, Result};
use async_trait::async_trait;
use serde::Deserialize;

/// Kokoro's model rejects phoneme sequences beyond this length, so chapter
/// text is synthesized in fixed windows and the samples concatenated.
pub const MAX_PHONEMES: usize = 480;

#[derive(Debug, Deserialize, Clone)]
pub struct TtsAudio {
    pub samples: Vec<f32>,
    pub sample_rate: u32,
}

#[async_trait]
pub trait TtsClient: Send + Sync {
    /// Hindi grapheme-to-phoneme conversion, done server-side.
    async fn phonemize(&self, text: &str) -> Result<String>;
    /// Synthesizes one phoneme window with the given voice and speed.
    async fn synthesize(&self, phonemes: &str, voice: &str, speed: f32) -> Result<TtsAudio>;
}

pub fn create_tts_client(config: &Config) -> Result<Option<Box<dyn TtsClient>>> {
    match config.audio.provider.as_str() {
        "kokoro" => {
            if !(0.5..=2.0).contains(&config.audio.speed) {
                bail!(
                    "TTS speed must be between 0.5 and 2.0, got {}",
                    config.audio.speed
                );
            }
            Ok(Some(Box::new(KokoroClient::new(&config.audio.base_url))))
        }
        "none" => Ok(None),
        other => Err(anyhow!("Unknown TTS provider: {}", other)),
    }
}

/// Synthesizes a full chapter: phonemize, chunk into 480-phoneme windows,
/// synthesize each window, concatenate the sample arrays.
pub async fn synthesize_chapter(
    tts: &dyn TtsClient,
    text: &str,
    voice: &str,
    speed: f32,
) -> Result<TtsAudio> {
    let phonemes = tts.phonemize(text).await?;
    let chars: Vec<char> = phonemes.chars().collect();
    if chars.is_empty() {
        bail!("Phonemizer returned an empty stream");
    }

    let mut samples = Vec::new();
    let mut sample_rate = 0;

    let total = chars.len().div_ceil(MAX_PHONEMES);
    for (i, window) in chars.chunks(MAX_PHONEMES).enumerate() {
        log::debug!("Synthesizing window {}/{}", i + 1, total);
        let chunk: String = window.iter().collect();
        let audio = tts.synthesize(&chunk, voice, speed).await?;
        sample_rate = audio.sample_rate;
        samples.extend(audio.samples);
    }

    Ok(TtsAudio {
        samples,
        sample_rate,
    })
}

// --- Self-hosted Kokoro server ---

pub struct KokoroClient {
    base_url: String,
    client: reqwest::Client,
}

impl KokoroClient {
    pub fn new(base_url: &str) -> Self {
        Self {
            base_url: base_url.trim_end_matches('/').to_string(),
            client: reqwest::Client::new(),
        }
    }
}

#[derive(Deserialize)]
struct PhonemizeResponse {
    phonemes: String,
}

#[async_trait]
impl TtsClient for KokoroClient {
    async fn phonemize(&self, text: &str) -> Result<String> {
        let url = format!("{}/phonemize", self.base_url);
        let body = serde_json::json!({ "text": text, "language": "hi" });

        let resp = self.client.post(&url).json(&body).send().await?;
        if !resp.status().is_success() {
            let err_text = resp.text().await?;
            return Err(anyhow!("Kokoro phonemize error: {}", err_text));
        }

        let result: PhonemizeResponse = resp.json().await?;
        Ok(result.phonemes)
    }

    async fn synthesize(&self, phonemes: &str, voice: &str, speed: f32) -> Result<TtsAudio> {
        let url = format!("{}/synthesize", self.base_url);
        let body = serde_json::json!({
            "phonemes": phonemes,
            "voice": voice,
            "speed": speed,
            "is_phonemes": true,
        });

        let resp = self.client.post(&url).json(&body).send().await?;
        if !resp.status().is_success() {
            let err_text = resp.text().await?;
            return Err(anyhow!("Kokoro synthesize error: {}", err_text));
        }

        let audio: TtsAudio = resp.json().await?;
        Ok(audio)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};

    struct MockTts {
        calls: AtomicUsize,
    }

    #[async_trait]
    impl TtsClient for MockTts {
        async fn phonemize(&self, text: &str) -> Result<String> {
            // One phoneme per input char, good enough for chunking math.
            Ok(text.to_string())
        }

        async fn synthesize(&self, phonemes: &str, _voice: &str, _speed: f32) -> Result<TtsAudio> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            Ok(TtsAudio {
                samples: vec![0.0; phonemes.chars().count()],
                sample_rate: 24000,
            })
        }
    }

    #[tokio::test]
    async fn test_chapter_is_synthesized_in_windows() {
        let tts = MockTts {
            calls: AtomicUsize::new(0),
        };
        let text = "क".repeat(MAX_PHONEMES * 2 + 10);

        let audio = synthesize_chapter(&tts, &text, "hf_alpha", 1.0).await.unwrap();
        assert_eq!(tts.calls.load(Ordering::SeqCst), 3);
        assert_eq!(audio.samples.len(), MAX_PHONEMES * 2 + 10);
        assert_eq!(audio.sample_rate, 24000);
    }

    #[tokio::test]
    async fn test_short_text_single_window() {
        let tts = MockTts {
            calls: AtomicUsize::new(0),
        };
        let audio = synthesize_chapter(&tts, "नमस्ते", "hf_alpha", 1.0).await.unwrap();
        assert_eq!(tts.calls.load(Ordering::SeqCst), 1);
        assert!(!audio.samples.is_empty());
    }

    #[tokio::test]
    async fn test_empty_phoneme_stream_is_error() {
        let tts = MockTts {
            calls: AtomicUsize::new(0),
        };
        assert!(synthesize_chapter(&tts, "", "hf_alpha", 1.0).await.is_err());
    }
}
