mod audio;
mod checkpoint;
mod clean;
mod config;
mod context;
mod extract;
mod llm;
mod menu;
mod prompts;
mod rate_limit;
mod registry;
mod story;
mod tts;
mod workflow;

use anyhow::Result;
use config::Config;
use workflow::WorkflowManager;

#[tokio::main]
async fn main() -> Result<()> {
    env_logger::init();

    let config = match Config::load() {
        Ok(config) => config,
        Err(e) => {
            eprintln!("Error loading config: {:#}", e);
            eprintln!("Please ensure 'config.yml' exists with valid LLM settings.");
            return Ok(());
        }
    };
    config.ensure_directories()?;

    let llm = match llm::create_llm(&config) {
        Ok(llm) => llm,
        Err(e) => {
            eprintln!("LLM setup failed: {:#}", e);
            return Ok(());
        }
    };
    let tts = match tts::create_tts_client(&config) {
        Ok(tts) => tts,
        Err(e) => {
            eprintln!("TTS setup failed: {:#}", e);
            return Ok(());
        }
    };
    if tts.is_none() {
        println!("Audio synthesis is disabled; generating text only.");
    }

    let topic = match inquire::Text::new("Skill topic for the series:").prompt() {
        Ok(topic) => topic,
        Err(e) => {
            println!("Input closed: {}", e);
            return Ok(());
        }
    };
    let topic = topic.trim().to_string();
    if topic.is_empty() {
        println!("No topic given, nothing to do.");
        return Ok(());
    }

    let mut manager = WorkflowManager::new(config, llm, tts);

    let Some(_) = manager.generate_series_foundation(&topic).await? else {
        println!("Foundation generation failed; try again later.");
        return Ok(());
    };

    let outlines = manager.generate_all_chapter_outlines().await?;
    if outlines.is_empty() {
        println!("No chapter outlines available; try again later.");
        return Ok(());
    }

    menu::run_menu(&mut manager).await;
    Ok(())
}
