//! Retrieval-augmented answering: query an in-memory FAQ index, then
//! compose a grounded answer.
//!
//! ```bash
//! cargo run --example faq_answer -- "How are refunds requested?"
//! ```

use async_trait::async_trait;
use chorus::agents::{AnswerAgent, RetrievalAgent};
use chorus::tools::{GenerationTool, KeywordIndex, RetrievalTool, TextGenerator};
use chorus::{Agent, ChatMode, GroupChat, TerminationPolicy};
use std::sync::Arc;

/// Answers with the best-matching context line.
struct ContextEchoModel;

#[async_trait]
impl TextGenerator for ContextEchoModel {
    async fn generate(
        &self,
        prompt: &str,
    ) -> Result<String, Box<dyn std::error::Error + Send + Sync>> {
        let answer = prompt
            .lines()
            .skip_while(|line| line.trim() != "Context:")
            .nth(1)
            .unwrap_or("I don't know.");
        Ok(answer.to_string())
    }

    fn model_name(&self) -> &str {
        "context-echo-stub"
    }
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    chorus::init_logger();

    let question = std::env::args()
        .nth(1)
        .unwrap_or_else(|| "How are refunds requested?".to_string());

    let index = Arc::new(KeywordIndex::new().with_documents([
        "You can reset your password by going to the settings page.",
        "Our support hours are 9am to 5pm Monday through Friday.",
        "Refunds can be requested within 30 days of purchase.",
    ]));
    let retrieval = Arc::new(RetrievalTool::new(index));
    let generate = Arc::new(GenerationTool::new(Arc::new(ContextEchoModel)));

    let agents: Vec<Box<dyn Agent>> = vec![
        Box::new(RetrievalAgent::new(retrieval)),
        Box::new(AnswerAgent::new(generate)),
    ];
    let mut chat = GroupChat::new(
        "faq-answer",
        agents,
        ChatMode::Pipeline,
        TerminationPolicy::max_iterations(2)?,
    )?
    .with_input(question);

    let record = chat.run().await?;
    println!("Answer: {}", record.final_output().unwrap_or("<no answer>"));
    Ok(())
}
