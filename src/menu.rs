use crate::workflow::WorkflowManager;
use inquire::{CustomType, Select};

const GENERATE_ALL: &str = "1) Generate all remaining chapters";
const GENERATE_RANGE: &str = "2) Generate a chapter range";
const GENERATE_ONE: &str = "3) Generate a single chapter";
const EXIT: &str = "4) Exit";

/// Interactive chapter-stage loop. Outline data is already in place by the
/// time this runs; every choice returns here until the user exits. A closed
/// or cancelled prompt ends the loop like an explicit exit.
pub async fn run_menu(manager: &mut WorkflowManager) {
    loop {
        println!();
        let choice = match Select::new(
            "What would you like to generate?",
            vec![GENERATE_ALL, GENERATE_RANGE, GENERATE_ONE, EXIT],
        )
        .prompt()
        {
            Ok(choice) => choice,
            Err(e) => {
                println!("Input closed: {}", e);
                return;
            }
        };

        match choice {
            GENERATE_ALL => {
                manager.generate_all_chapters(1).await;
            }
            GENERATE_RANGE => {
                let Some(start) = prompt_chapter("Start chapter:") else {
                    continue;
                };
                let Some(end) = prompt_chapter("End chapter:") else {
                    continue;
                };
                if start > end {
                    println!("Start chapter must not exceed end chapter.");
                    continue;
                }
                let (success, failed) = manager.generate_chapter_range(start, end).await;
                println!("Range done: {} succeeded, {} failed", success, failed.len());
            }
            GENERATE_ONE => {
                let Some(chapter) = prompt_chapter("Chapter number:") else {
                    continue;
                };
                if !manager.chapters().iter().any(|c| c.chapter_num == chapter) {
                    println!("No outline exists for chapter {}.", chapter);
                    continue;
                }
                manager.generate_chapter(chapter).await;
            }
            _ => {
                println!("Bye!");
                return;
            }
        }
    }
}

fn prompt_chapter(message: &str) -> Option<u32> {
    match CustomType::new(message).prompt() {
        Ok(n) => Some(n),
        Err(e) => {
            println!("Input closed: {}", e);
            None
        }
    }
}
