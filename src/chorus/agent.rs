//! Agent Capability
//!
//! An [`Agent`] is the schedulable unit of work in a group chat: one logical
//! turn executed against the [`SharedContext`](crate::SharedContext). Agents
//! are polymorphic over this single capability — a pipeline stage, a
//! producer, a reviewer, and a retrieval agent are all just `Agent`
//! implementations selected at construction time.
//!
//! Agents may read and write arbitrary context keys and may invoke any
//! number of [`ToolAdapter`](crate::ToolAdapter)s. They must not depend on
//! being scheduled at a particular absolute turn count — only on their
//! logical predecessors having already written the keys they read. Ordering
//! is the caller's responsibility when composing the agent list; the
//! scheduler does not enforce a dependency graph.
//!
//! A failing tool call (timeout, non-zero external status, malformed
//! response) must be returned as a failed [`AgentResult`], never raised past
//! the agent boundary. External side effects a tool already performed are
//! not rolled back; idempotence is the tool's concern.
//!
//! # Example
//!
//! ```rust
//! use async_trait::async_trait;
//! use chorus::{Agent, AgentResult, SharedContext};
//!
//! struct Greeter;
//!
//! #[async_trait]
//! impl Agent for Greeter {
//!     fn name(&self) -> &str {
//!         "greeter"
//!     }
//!
//!     async fn run(&mut self, ctx: &mut SharedContext, input: Option<&str>) -> AgentResult {
//!         let who = input.unwrap_or("world");
//!         let greeting = format!("hello, {}", who);
//!         ctx.set("greeting", greeting.clone());
//!         Ok(greeting)
//!     }
//! }
//! ```

use crate::chorus::context::SharedContext;
use crate::chorus::tool::ToolFailure;
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::error::Error;
use std::fmt;

/// Why an agent's turn failed.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub enum AgentFailure {
    /// A tool call the agent depended on failed.
    Tool(ToolFailure),
    /// The agent's own contract was violated: a context key it requires is
    /// missing, or an upstream payload had an unusable shape.
    Contract(String),
}

impl fmt::Display for AgentFailure {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            AgentFailure::Tool(failure) => write!(f, "tool failure: {}", failure),
            AgentFailure::Contract(msg) => write!(f, "contract violation: {}", msg),
        }
    }
}

impl Error for AgentFailure {}

impl From<ToolFailure> for AgentFailure {
    fn from(failure: ToolFailure) -> Self {
        AgentFailure::Tool(failure)
    }
}

/// Outcome of one agent turn: an opaque success payload (text, a status
/// string) or a failure descriptor. Never both.
pub type AgentResult = Result<String, AgentFailure>;

/// A unit of work scheduled by a [`GroupChat`](crate::GroupChat).
///
/// Constructed once before a run and reused across all of that run's turns.
/// Any state an agent needs beyond its own private fields lives in the
/// shared context.
#[async_trait]
pub trait Agent: Send {
    /// The agent's identity, used in run records, events, and logs.
    fn name(&self) -> &str;

    /// Execute one turn.
    ///
    /// `input` is the directly-threaded value in pipeline mode (the previous
    /// agent's payload, or the chat's seed input for the first agent) and
    /// `None` in the other modes, where agents communicate through `ctx`
    /// alone.
    async fn run(&mut self, ctx: &mut SharedContext, input: Option<&str>) -> AgentResult;
}
