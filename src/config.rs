use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::Path;

#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct Config {
    /// Final chapter prose, one .txt per chapter.
    #[serde(default = "default_output")]
    pub output_folder: String,

    /// Session index and all per-session checkpoints.
    #[serde(default = "default_metadata")]
    pub metadata_folder: String,

    /// Persisted chapter tail excerpts used as continuity seeds.
    #[serde(default = "default_context")]
    pub context_folder: String,

    /// Synthesized chapter audio.
    #[serde(default = "default_audio_out")]
    pub audiobook_folder: String,

    pub llm: LlmConfig,

    #[serde(default)]
    pub audio: AudioConfig,

    #[serde(default)]
    pub backoff: BackoffConfig,
}

#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct LlmConfig {
    pub provider: String, // "gemini"
    pub gemini: Option<GeminiConfig>,
}

#[derive(Debug, Serialize, Deserialize, Clone, Default)]
pub struct GeminiConfig {
    /// Empty means: take it from the GEMINI_API_KEY environment variable.
    #[serde(default)]
    pub api_key: String,
    #[serde(default = "default_model")]
    pub model: String,
}

impl GeminiConfig {
    pub fn resolve_api_key(&self) -> Result<String> {
        if !self.api_key.is_empty() {
            return Ok(self.api_key.clone());
        }
        std::env::var("GEMINI_API_KEY")
            .context("No API key in config.yml and GEMINI_API_KEY is not set")
    }
}

#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct AudioConfig {
    /// "kokoro" for the self-hosted Kokoro server, "none" to skip audio.
    #[serde(default = "default_tts_provider")]
    pub provider: String,
    #[serde(default = "default_voice")]
    pub voice: String,
    #[serde(default = "default_speed")]
    pub speed: f32,
    #[serde(default = "default_kokoro_base_url")]
    pub base_url: String,
}

impl Default for AudioConfig {
    fn default() -> Self {
        Self {
            provider: default_tts_provider(),
            voice: default_voice(),
            speed: default_speed(),
            base_url: default_kokoro_base_url(),
        }
    }
}

/// Explicit backoff policy for the pipeline's two recovery paths.
#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct BackoffConfig {
    /// Sleep before the single retry of a failed outline batch.
    #[serde(default = "default_outline_retry")]
    pub outline_retry_seconds: u64,
    /// Cooldown after a failed chapter before moving to the next one.
    #[serde(default = "default_chapter_cooldown")]
    pub chapter_cooldown_seconds: u64,
}

impl Default for BackoffConfig {
    fn default() -> Self {
        Self {
            outline_retry_seconds: default_outline_retry(),
            chapter_cooldown_seconds: default_chapter_cooldown(),
        }
    }
}

/// Free-tier Gemini quota tier.
#[derive(Debug, Clone, Copy)]
pub struct ModelQuota {
    pub rpm: usize,
    pub tpm: u64,
    pub rpd: usize,
}

pub const DEFAULT_MODEL: &str = "gemini-2.5-flash-lite";

pub fn model_quota(model_id: &str) -> ModelQuota {
    match model_id {
        "gemini-2.0-flash-lite" => ModelQuota { rpm: 30, tpm: 1_000_000, rpd: 200 },
        "gemini-2.0-flash-exp" => ModelQuota { rpm: 15, tpm: 1_000_000, rpd: 200 },
        "gemini-2.5-flash" => ModelQuota { rpm: 10, tpm: 250_000, rpd: 250 },
        "gemini-2.5-flash-lite" => ModelQuota { rpm: 15, tpm: 250_000, rpd: 1000 },
        "gemini-2.5-flash-lite-preview-09-2025" => ModelQuota { rpm: 15, tpm: 250_000, rpd: 1000 },
        _ => ModelQuota { rpm: 15, tpm: 250_000, rpd: 1000 },
    }
}

fn default_output() -> String {
    "manhwa_content".to_string()
}
fn default_metadata() -> String {
    "manhwa_metadata".to_string()
}
fn default_context() -> String {
    "chapter_context".to_string()
}
fn default_audio_out() -> String {
    "manhwa_audiobooks".to_string()
}
fn default_model() -> String {
    DEFAULT_MODEL.to_string()
}
fn default_tts_provider() -> String {
    "kokoro".to_string()
}
fn default_voice() -> String {
    "hf_alpha".to_string()
}
fn default_speed() -> f32 {
    1.0
}
fn default_kokoro_base_url() -> String {
    "http://127.0.0.1:8880".to_string()
}
fn default_outline_retry() -> u64 {
    5
}
fn default_chapter_cooldown() -> u64 {
    10
}

impl Config {
    pub fn load() -> Result<Self> {
        let path = Path::new("config.yml");
        if !path.exists() {
            anyhow::bail!("config.yml not found. Please create one.");
        }

        let content = fs::read_to_string(path).context("Failed to read config.yml")?;
        let config: Config =
            serde_yaml_ng::from_str(&content).context("Failed to parse config.yml")?;
        Ok(config)
    }

    pub fn ensure_directories(&self) -> Result<()> {
        fs::create_dir_all(&self.output_folder)?;
        fs::create_dir_all(&self.metadata_folder)?;
        fs::create_dir_all(&self.context_folder)?;
        fs::create_dir_all(&self.audiobook_folder)?;
        Ok(())
    }
}
