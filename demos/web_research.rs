//! Research-and-summarize pipeline: fetch a URL, summarize its content,
//! save the summary.
//!
//! ```bash
//! cargo run --example web_research -- https://example.com
//! ```
//!
//! The summarizer here is a stand-in [`TextGenerator`]; swap in a real
//! model client to get real summaries.

use async_trait::async_trait;
use chorus::agents::{FetchAgent, SummarizeAgent};
use chorus::tools::{GenerationTool, HttpFetchTool, TextGenerator};
use chorus::{Agent, ChatMode, GroupChat, TerminationPolicy};
use std::sync::Arc;
use std::time::Duration;

/// Echoes the first non-empty content line back as a "summary".
struct HeadlineModel;

#[async_trait]
impl TextGenerator for HeadlineModel {
    async fn generate(
        &self,
        prompt: &str,
    ) -> Result<String, Box<dyn std::error::Error + Send + Sync>> {
        let headline = prompt
            .lines()
            .skip(1)
            .map(str::trim)
            .find(|line| !line.is_empty())
            .unwrap_or("nothing fetched");
        Ok(format!(
            "summary: {}",
            headline.chars().take(120).collect::<String>()
        ))
    }

    fn model_name(&self) -> &str {
        "headline-stub"
    }
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    chorus::init_logger();

    let url = std::env::args()
        .nth(1)
        .unwrap_or_else(|| "https://example.com".to_string());

    let fetch = Arc::new(HttpFetchTool::new().with_timeout(Duration::from_secs(15)));
    let generate = Arc::new(GenerationTool::new(Arc::new(HeadlineModel)));

    let agents: Vec<Box<dyn Agent>> = vec![
        Box::new(FetchAgent::new(fetch)),
        Box::new(SummarizeAgent::new(generate)),
    ];
    let mut chat = GroupChat::new(
        "web-research",
        agents,
        ChatMode::Pipeline,
        TerminationPolicy::max_iterations(2)?,
    )?
    .with_input(url);

    let record = chat.run().await?;

    let summary = record.final_output().unwrap_or("<no summary>");
    println!("\nFinal Summary\n\n{}", summary);

    std::fs::write("summary.txt", summary)?;
    println!("\nSummary saved to 'summary.txt'");
    Ok(())
}
