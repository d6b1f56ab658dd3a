use crate::audio::write_wav;
use crate::checkpoint::CheckpointStore;
use crate::clean::deep_clean_for_tts;
use crate::config::{model_quota, Config, DEFAULT_MODEL};
use crate::context::ContextManager;
use crate::extract;
use crate::llm::LlmClient;
use crate::prompts;
use crate::rate_limit::RateLimiter;
use crate::registry::SessionRegistry;
use crate::story::{ChapterOutline, ChapterSummary, Foundation, SeriesData};
use crate::tts::{synthesize_chapter, TtsClient};
use anyhow::{Context, Result};
use chrono::Local;
use std::fs;
use std::io::Write as _;
use std::path::Path;
use std::time::Duration;

/// The 1..=100 chapter range is outlined in five fixed batches.
pub const OUTLINE_BATCHES: [(u32, u32); 5] = [(1, 20), (21, 40), (41, 60), (61, 80), (81, 100)];
pub const TOTAL_CHAPTERS: usize = 100;

/// Per-chapter generation result. Failures are values aggregated by the
/// caller, never a reason to abort the run.
#[derive(Debug)]
pub enum ChapterOutcome {
    Completed { chapter_num: u32, words: usize },
    Failed { chapter_num: u32, reason: String },
}

/// Drives the three sequential stages for one session:
/// foundation, then outlines in batches, then chapter content per chapter.
/// Every stage checkpoints its output before proceeding, so a re-run for the
/// same topic only performs the remaining work.
pub struct WorkflowManager {
    config: Config,
    llm: Box<dyn LlmClient>,
    tts: Option<Box<dyn TtsClient>>,
    rate_limiter: RateLimiter,
    store: CheckpointStore,
    registry: SessionRegistry,
    session_id: String,
    foundation: Option<Foundation>,
    chapters: Vec<ChapterOutline>,
    context: ContextManager,
}

impl WorkflowManager {
    pub fn new(config: Config, llm: Box<dyn LlmClient>, tts: Option<Box<dyn TtsClient>>) -> Self {
        let model_id = config
            .llm
            .gemini
            .as_ref()
            .map(|g| g.model.clone())
            .unwrap_or_else(|| DEFAULT_MODEL.to_string());
        let quota = model_quota(&model_id);

        let store = CheckpointStore::new(&config.metadata_folder);
        let registry = SessionRegistry::open(&config.metadata_folder);
        let context = ContextManager::new(&config.context_folder);
        let session_id = format!("manhwa_{}", Local::now().format("%Y%m%d_%H%M%S"));

        Self {
            rate_limiter: RateLimiter::new(quota.rpm, quota.tpm, quota.rpd),
            config,
            llm,
            tts,
            store,
            registry,
            session_id,
            foundation: None,
            chapters: Vec::new(),
            context,
        }
    }

    pub fn session_id(&self) -> &str {
        &self.session_id
    }

    pub fn chapters(&self) -> &[ChapterOutline] {
        &self.chapters
    }

    /// Blocks until the rate limiter allows a request, printing the remaining
    /// wait in one-second steps.
    async fn wait_for_rate_limit(&mut self) {
        loop {
            let (allowed, message) = self.rate_limiter.can_make_request();
            if allowed {
                return;
            }
            let wait = self.rate_limiter.get_wait_time().max(1);
            println!("{}", message);
            println!("   Waiting {} seconds...", wait);
            for i in 0..wait {
                tokio::time::sleep(Duration::from_secs(1)).await;
                print!("   {}s remaining...\r", wait - i - 1);
                let _ = std::io::stdout().flush();
            }
            println!();
        }
    }

    /// Issues one planner call. The request is recorded against the quota
    /// whether or not the call succeeded.
    async fn call_planner(&mut self, prompt: &str) -> Result<String> {
        let result = self.llm.chat(prompts::planner_instructions(), prompt).await;
        self.rate_limiter.record_request();
        result
    }

    async fn call_writer(&mut self, prompt: &str) -> Result<String> {
        let result = self.llm.chat(prompts::writer_instructions(), prompt).await;
        self.rate_limiter.record_request();
        result
    }

    /// Stage 1: the series foundation. A registered session with a loadable
    /// foundation checkpoint is reused without any external call. Returns
    /// `None` when generation or shape validation failed; nothing downstream
    /// can run without a foundation.
    pub async fn generate_series_foundation(
        &mut self,
        skill_topic: &str,
    ) -> Result<Option<Foundation>> {
        println!("Generating series foundation...");

        if let Some(session_id) = self.registry.lookup(skill_topic) {
            if let Some(foundation) = self.store.load_foundation(&session_id) {
                println!(
                    "Resuming session {} for topic \"{}\"",
                    session_id, skill_topic
                );
                self.session_id = session_id;
                self.foundation = Some(foundation.clone());
                return Ok(Some(foundation));
            }
        }

        self.wait_for_rate_limit().await;
        let prompt = prompts::foundation_prompt(skill_topic);
        let raw = match self.call_planner(&prompt).await {
            Ok(raw) => raw,
            Err(e) => {
                println!("Foundation call failed: {:#}", e);
                return Ok(None);
            }
        };

        let payload = match extract::parse_payload(raw.trim()) {
            Ok(payload) => payload,
            Err(e) => {
                println!("Foundation response was not parseable: {:#}", e);
                return Ok(None);
            }
        };
        let Some(map) = extract::unwrap_single_record(payload, "series_title") else {
            println!("Foundation response had the wrong shape");
            return Ok(None);
        };
        let foundation: Foundation = match serde_json::from_value(serde_json::Value::Object(map)) {
            Ok(foundation) => foundation,
            Err(e) => {
                println!("Foundation JSON missing required fields: {}", e);
                return Ok(None);
            }
        };

        self.store.save_foundation(&self.session_id, &foundation)?;
        self.registry.register(skill_topic, &self.session_id)?;

        println!(
            "Foundation ready: {} ({} characters)",
            foundation.series_title,
            foundation.characters.len()
        );
        self.foundation = Some(foundation.clone());
        Ok(Some(foundation))
    }

    /// One outline batch. Call or parse failures come back as an empty batch;
    /// entries without a `chapter_num` are dropped, a bare record is wrapped
    /// into a one-element batch.
    async fn generate_chapter_batch(&mut self, start: u32, end: u32) -> Vec<ChapterOutline> {
        let Some(foundation) = self.foundation.clone() else {
            return Vec::new();
        };

        println!("Outlining chapters {}-{}...", start, end);
        self.wait_for_rate_limit().await;

        let prompt = prompts::outline_batch_prompt(&foundation, start, end);
        let raw = match self.call_planner(&prompt).await {
            Ok(raw) => raw,
            Err(e) => {
                log::warn!("Outline batch {}-{} call failed: {:#}", start, end, e);
                return Vec::new();
            }
        };

        let payload = match extract::parse_payload(raw.trim()) {
            Ok(payload) => payload,
            Err(e) => {
                log::warn!("Outline batch {}-{} not parseable: {:#}", start, end, e);
                return Vec::new();
            }
        };

        let outlines: Vec<ChapterOutline> = extract::into_records(payload)
            .into_iter()
            .filter(|v| v.get("chapter_num").is_some())
            .filter_map(|v| serde_json::from_value(v).ok())
            .collect();

        println!("   {} outlines parsed", outlines.len());
        outlines
    }

    /// Stage 2: all 100 chapter outlines. A complete canonical document is
    /// reused as-is. Otherwise already-completed batches are skipped via the
    /// progress checkpoint, each remaining batch gets one retry after a fixed
    /// backoff, and a second failure stops the stage for this run. The
    /// canonical snapshot is written regardless of completeness.
    pub async fn generate_all_chapter_outlines(&mut self) -> Result<Vec<ChapterOutline>> {
        let foundation = self
            .foundation
            .clone()
            .context("Foundation must be generated before outlines")?;

        if let Some(series) = self.store.load_series(&self.session_id) {
            if series.chapters.len() >= TOTAL_CHAPTERS {
                println!(
                    "All {} chapter outlines already exist, reusing them",
                    series.chapters.len()
                );
                let mut chapters = series.chapters;
                chapters.sort_by_key(|c| c.chapter_num);
                self.chapters = chapters.clone();
                return Ok(chapters);
            }
        }

        println!("Outlining all {} chapters...", TOTAL_CHAPTERS);
        let mut progress = self
            .store
            .load_outline_progress(&self.session_id)
            .unwrap_or_default();

        for (idx, (start, end)) in OUTLINE_BATCHES.iter().copied().enumerate() {
            if progress.completed_batches.contains(&(start, end)) {
                println!(
                    "Batch {}/{} (chapters {}-{}) already complete, skipping",
                    idx + 1,
                    OUTLINE_BATCHES.len(),
                    start,
                    end
                );
                continue;
            }

            println!("Batch {}/{}", idx + 1, OUTLINE_BATCHES.len());
            let mut batch = self.generate_chapter_batch(start, end).await;
            if batch.is_empty() {
                let backoff = self.config.backoff.outline_retry_seconds;
                println!("   Batch failed, retrying in {}s...", backoff);
                tokio::time::sleep(Duration::from_secs(backoff)).await;
                batch = self.generate_chapter_batch(start, end).await;
            }
            if batch.is_empty() {
                println!(
                    "   Batch {}-{} failed twice, stopping outline generation for this run",
                    start, end
                );
                break;
            }

            progress.chapters.extend(batch);
            progress.completed_batches.push((start, end));
            self.store
                .save_outline_progress(&self.session_id, &progress)?;
        }

        let mut chapters = progress.chapters.clone();
        chapters.sort_by_key(|c| c.chapter_num);

        let series = SeriesData {
            foundation,
            chapters: chapters.clone(),
            total: chapters.len(),
        };
        self.store.save_series(&self.session_id, &series)?;
        println!("{} chapter outlines ready", chapters.len());

        if chapters.len() >= TOTAL_CHAPTERS {
            self.store.clear_outline_progress(&self.session_id);
        }

        self.chapters = chapters.clone();
        Ok(chapters)
    }

    /// Generates one chapter's prose: builds the prompt from the foundation,
    /// all character descriptors, the rolling context window, and the outline;
    /// cleans the result for TTS; persists the tail excerpt, the chapter file,
    /// and (best-effort) the audio.
    async fn generate_chapter_content(&mut self, chapter_num: u32) -> Result<String> {
        let foundation = self.foundation.clone().context("Foundation missing")?;
        let outline = self
            .chapters
            .iter()
            .find(|c| c.chapter_num == chapter_num)
            .cloned()
            .with_context(|| format!("No outline for chapter {}", chapter_num))?;

        println!("Writing chapter {}: {}", chapter_num, outline.title);
        self.wait_for_rate_limit().await;

        let prev_context = self.context.previous_context(chapter_num);
        let prompt = prompts::chapter_prompt(&foundation, &outline, &prev_context);
        let raw = self.call_writer(&prompt).await?;

        let content = deep_clean_for_tts(raw.trim());
        self.context.save_chapter_ending(chapter_num, &content)?;
        self.context.push_summary(ChapterSummary {
            chapter_num,
            title: outline.title.clone(),
            summary: outline.plot_summary.clone(),
            ending: outline.cliffhanger.clone(),
        });

        let filename = format!("{}_ch{:03}.txt", foundation.safe_title(), chapter_num);
        let path = Path::new(&self.config.output_folder).join(&filename);
        fs::write(&path, &content)
            .with_context(|| format!("Failed to write chapter file {:?}", path))?;

        let words = content.split_whitespace().count();
        println!("   Chapter {} done: {} words, saved {}", chapter_num, words, filename);

        self.synthesize_audio(&foundation, chapter_num, &content).await;

        Ok(content)
    }

    /// Audio is best-effort: a TTS failure never fails the chapter text.
    async fn synthesize_audio(&self, foundation: &Foundation, chapter_num: u32, content: &str) {
        let Some(tts) = self.tts.as_deref() else {
            return;
        };

        let voice = &self.config.audio.voice;
        let speed = self.config.audio.speed;
        match synthesize_chapter(tts, content, voice, speed).await {
            Ok(audio) => {
                let filename = format!("{}_ch{:03}.wav", foundation.safe_title(), chapter_num);
                let path = Path::new(&self.config.audiobook_folder).join(&filename);
                match write_wav(&path, &audio.samples, audio.sample_rate) {
                    Ok(()) => {
                        let minutes =
                            audio.samples.len() as f64 / audio.sample_rate as f64 / 60.0;
                        println!("   Audio: {:.1} minutes, saved {}", minutes, filename);
                    }
                    Err(e) => log::warn!("Could not write audio for chapter {}: {:#}", chapter_num, e),
                }
            }
            Err(e) => {
                println!("   Audio skipped for chapter {}: {:#}", chapter_num, e);
            }
        }
    }

    /// One chapter attempt with its checkpoint update and failure cooldown.
    pub async fn generate_chapter(&mut self, chapter_num: u32) -> ChapterOutcome {
        let outcome = match self.generate_chapter_content(chapter_num).await {
            Ok(content) => ChapterOutcome::Completed {
                chapter_num,
                words: content.split_whitespace().count(),
            },
            Err(e) => ChapterOutcome::Failed {
                chapter_num,
                reason: format!("{:#}", e),
            },
        };

        self.record_outcome(&outcome);

        if let ChapterOutcome::Failed { reason, .. } = &outcome {
            println!("   Chapter {} failed: {}", chapter_num, reason);
            let cooldown = self.config.backoff.chapter_cooldown_seconds;
            tokio::time::sleep(Duration::from_secs(cooldown)).await;
        }

        outcome
    }

    /// Persists chapter progress after every attempt. The resume pointer
    /// tracks whichever chapter finished last, even when an out-of-order
    /// regeneration moves it backward.
    fn record_outcome(&mut self, outcome: &ChapterOutcome) {
        let mut progress = self
            .store
            .load_chapter_progress(&self.session_id)
            .unwrap_or_default();

        match outcome {
            ChapterOutcome::Completed { chapter_num, .. } => {
                progress.failed.retain(|n| n != chapter_num);
                progress.last_completed_chapter = *chapter_num;
            }
            ChapterOutcome::Failed { chapter_num, .. } => {
                if !progress.failed.contains(chapter_num) {
                    progress.failed.push(*chapter_num);
                }
            }
        }

        if let Err(e) = self.store.save_chapter_progress(&self.session_id, &progress) {
            log::warn!("Could not persist chapter progress: {:#}", e);
        }
    }

    /// Stage 3: chapter content from the resume point onward. The resume
    /// point is `max(start_from, last_completed + 1)`; a single chapter's
    /// failure is recorded and skipped, never fatal to the run. Returns the
    /// success count and the chapters that failed in this run.
    pub async fn generate_all_chapters(&mut self, start_from: u32) -> (usize, Vec<u32>) {
        let progress = self
            .store
            .load_chapter_progress(&self.session_id)
            .unwrap_or_default();
        let resume = start_from.max(progress.last_completed_chapter + 1);
        if resume > start_from {
            println!(
                "Resuming from chapter {} (last completed: {})",
                resume, progress.last_completed_chapter
            );
        }

        let pending: Vec<u32> = self
            .chapters
            .iter()
            .map(|c| c.chapter_num)
            .filter(|n| *n >= resume)
            .collect();
        let total = self.chapters.len();

        let mut success = 0;
        let mut failed = Vec::new();

        for chapter_num in pending {
            println!("\n[{}/{}] Processing...", chapter_num, total);
            match self.generate_chapter(chapter_num).await {
                ChapterOutcome::Completed { .. } => success += 1,
                ChapterOutcome::Failed { chapter_num, .. } => failed.push(chapter_num),
            }
        }

        println!("\nGeneration summary: {} succeeded, {} failed", success, failed.len());
        if !failed.is_empty() {
            println!("Failed chapters: {:?}", failed);
        }

        (success, failed)
    }

    /// Explicit range generation from the menu. The range is taken literally
    /// so a user can regenerate earlier chapters on purpose.
    pub async fn generate_chapter_range(&mut self, start: u32, end: u32) -> (usize, Vec<u32>) {
        let pending: Vec<u32> = self
            .chapters
            .iter()
            .map(|c| c.chapter_num)
            .filter(|n| *n >= start && *n <= end)
            .collect();

        let mut success = 0;
        let mut failed = Vec::new();
        for chapter_num in pending {
            match self.generate_chapter(chapter_num).await {
                ChapterOutcome::Completed { .. } => success += 1,
                ChapterOutcome::Failed { chapter_num, .. } => failed.push(chapter_num),
            }
        }
        (success, failed)
    }
}
