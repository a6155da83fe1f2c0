//! # Chorus
//!
//! Chorus is a Rust toolkit for orchestrating small ensembles of agents
//! (units of work that read and write a shared context and call external
//! capabilities through a uniform tool interface) under an explicit
//! termination policy, with a full audit trail of every turn.
//!
//! The crate provides carefully layered abstractions for:
//!
//! * **Agents**: the [`Agent`] trait — one polymorphic capability,
//!   "execute a turn against the shared context" — with ready-made
//!   variants in [`agents`] (fetch/summarize, produce/review,
//!   load/report, retrieve/answer)
//! * **Tool Adapters**: the [`ToolAdapter`] boundary in [`tool`], through
//!   which every external capability (web fetch, text generation,
//!   subprocess execution and lint, tabular statistics, chart rendering,
//!   vector retrieval) is reached — see [`tools`] for the shipped adapters
//! * **Shared Context**: [`SharedContext`], the mutable keyed store agents
//!   communicate through, snapshotted into the audit trail after every turn
//! * **Scheduling**: [`GroupChat`], which drives agents in one of three
//!   modes — single-pass pipeline, persistent round-robin, or bounded
//!   iterative refinement with convergence detection
//! * **Termination**: [`TerminationPolicy`], combining an iteration budget,
//!   a pure convergence predicate, and a fail-fast flag, applied between
//!   turns in a fixed priority order
//! * **Audit**: [`RunRecord`], the ordered trail of every turn (payload or
//!   failure, plus a context snapshot), returned even when a run fails
//!
//! ## A two-stage pipeline
//!
//! ```rust,no_run
//! use chorus::agents::{FetchAgent, SummarizeAgent};
//! use chorus::tools::{GenerationTool, HttpFetchTool, TextGenerator};
//! use chorus::{ChatMode, GroupChat, TerminationPolicy};
//! use std::sync::Arc;
//!
//! # struct MyModel;
//! # #[async_trait::async_trait]
//! # impl TextGenerator for MyModel {
//! #     async fn generate(
//! #         &self,
//! #         _prompt: &str,
//! #     ) -> Result<String, Box<dyn std::error::Error + Send + Sync>> {
//! #         Ok("a summary".into())
//! #     }
//! #     fn model_name(&self) -> &str { "my-model" }
//! # }
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     chorus::init_logger();
//!
//!     let fetch = Arc::new(HttpFetchTool::new());
//!     let generate = Arc::new(GenerationTool::new(Arc::new(MyModel)));
//!
//!     let mut chat = GroupChat::new(
//!         "web-research",
//!         vec![
//!             Box::new(FetchAgent::new(fetch)),
//!             Box::new(SummarizeAgent::new(generate)),
//!         ],
//!         ChatMode::Pipeline,
//!         TerminationPolicy::max_iterations(2)?,
//!     )?
//!     .with_input("https://example.com");
//!
//!     let record = chat.run().await?;
//!     println!("{}", record.final_output().unwrap_or("<no output>"));
//!     Ok(())
//! }
//! ```
//!
//! ## A refinement loop with convergence
//!
//! A producer/reviewer pair cycles until the reviewer reports clean
//! feedback, bounded by a cycle budget:
//!
//! ```rust,no_run
//! use chorus::agents::{ProducerAgent, ReviewerAgent, CLEAN_FEEDBACK};
//! use chorus::tools::ProcessTool;
//! use chorus::{ChatMode, GroupChat, TerminationPolicy};
//! use std::sync::Arc;
//!
//! # async {
//! let process = Arc::new(
//!     ProcessTool::new(vec!["python3".into()])
//!         .with_linter(vec!["pylint".into(), "--disable=all".into(), "--enable=E".into()])
//!         .with_extension("py"),
//! );
//!
//! let policy = TerminationPolicy::max_iterations(3)?
//!     .with_convergence(|_, ctx| ctx.get_str("feedback") == Some(CLEAN_FEEDBACK));
//!
//! let mut chat = GroupChat::new(
//!     "code-refinement",
//!     vec![
//!         Box::new(ProducerAgent::new("print('hello')\n")),
//!         Box::new(ReviewerAgent::new(process)),
//!     ],
//!     ChatMode::Refinement,
//!     policy,
//! )?;
//!
//! let record = chat.run().await?;
//! println!("finished {:?} after {} cycles", record.status, record.cycles);
//! # Ok::<(), Box<dyn std::error::Error>>(())
//! # };
//! ```
//!
//! Runs are single-threaded and cooperative: one agent's turn completes,
//! including its tool calls (the only suspension points), before the next
//! begins, so agents only ever observe fully-committed writes. A
//! [`StopHandle`](group_chat::StopHandle) and an optional run deadline
//! abort long runs between turns; each tool call carries its own deadline
//! independently.

use std::sync::Once;

static INIT_LOGGER: Once = Once::new();

/// Initialise the global [`env_logger`] subscriber exactly once.
///
/// The helper is intentionally lightweight so applications embedding Chorus
/// can opt in to simple `RUST_LOG` driven diagnostics without committing to
/// a logging backend upfront.
///
/// ```rust
/// chorus::init_logger();
/// log::info!("Logger is ready");
/// ```
pub fn init_logger() {
    INIT_LOGGER.call_once(|| {
        env_logger::init();
    });
}

// Import the top-level `chorus` module.
pub mod chorus;

// Re-exporting key items for easier external access.
pub use crate::chorus::agent::{Agent, AgentFailure, AgentResult};
pub use crate::chorus::agents;
pub use crate::chorus::context::{ContextSnapshot, SharedContext};
pub use crate::chorus::event;
pub use crate::chorus::event::{ChatEvent, EventHandler};
pub use crate::chorus::group_chat;
pub use crate::chorus::group_chat::{ChatMode, ChatState, GroupChat, StopHandle, LAST_OUTPUT_KEY};
pub use crate::chorus::record::{RunRecord, TurnRecord};
pub use crate::chorus::termination::{
    ConfigurationError, ConvergencePredicate, PolicyDecision, RunStatus, TerminationPolicy,
    TurnProbe,
};
pub use crate::chorus::tool;
pub use crate::chorus::tool::{ToolAdapter, ToolFailure, ToolOutcome, ToolRequest};
pub use crate::chorus::tools;
