//! Producer/reviewer refinement loop over a shell snippet.
//!
//! The producer seeds a script with a syntax error, the reviewer lints it
//! with `sh -n` and executes it, and a stand-in generator "fixes" the
//! script. The loop converges once the reviewer reports clean feedback.
//!
//! ```bash
//! cargo run --example code_refinement
//! ```

use async_trait::async_trait;
use chorus::agents::{ProducerAgent, ReviewerAgent, CLEAN_FEEDBACK};
use chorus::tools::{GenerationTool, ProcessTool, TextGenerator};
use chorus::{Agent, ChatMode, GroupChat, TerminationPolicy};
use std::sync::Arc;

const BROKEN: &str = "echo \"hello\n";
const FIXED: &str = "echo \"hello\"\n";

/// Always answers with the corrected script.
struct FixerModel;

#[async_trait]
impl TextGenerator for FixerModel {
    async fn generate(
        &self,
        _prompt: &str,
    ) -> Result<String, Box<dyn std::error::Error + Send + Sync>> {
        Ok(FIXED.to_string())
    }

    fn model_name(&self) -> &str {
        "fixer-stub"
    }
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    chorus::init_logger();

    let process = Arc::new(
        ProcessTool::new(vec!["sh".into()])
            .with_linter(vec!["sh".into(), "-n".into()])
            .with_extension("sh"),
    );
    let generate = Arc::new(GenerationTool::new(Arc::new(FixerModel)));

    let agents: Vec<Box<dyn Agent>> = vec![
        Box::new(ProducerAgent::new(BROKEN)),
        Box::new(ReviewerAgent::new(process).with_generator(generate)),
    ];
    let policy = TerminationPolicy::max_iterations(3)?
        .with_convergence(|_, ctx| ctx.get_str("feedback") == Some(CLEAN_FEEDBACK));
    let mut chat = GroupChat::new("code-refinement", agents, ChatMode::Refinement, policy)?;

    let record = chat.run().await?;
    println!(
        "finished after {} cycles with status {:?}",
        record.cycles, record.status
    );

    let context = chat.into_context();
    let code = context.get_str("code").unwrap_or_default();
    let feedback = context.get_str("feedback").unwrap_or_default();
    println!("\nFinal Code\n\n{}", code);
    println!("\nFinal Feedback\n\n{}", feedback);

    std::fs::write("final_code.sh", code)?;
    std::fs::write("final_feedback.txt", feedback)?;
    Ok(())
}
