// src/chorus/mod.rs

pub mod agent;
pub mod agents;
pub mod context;
pub mod event;
pub mod group_chat;
pub mod record;
pub mod termination;
pub mod tool;
pub mod tools;

// Explicitly export the core types so callers reach them as
// chorus::GroupChat instead of chorus::group_chat::GroupChat.
pub use agent::{Agent, AgentFailure, AgentResult};
pub use context::{ContextSnapshot, SharedContext};
pub use group_chat::{ChatMode, ChatState, GroupChat, StopHandle, LAST_OUTPUT_KEY};
pub use record::{RunRecord, TurnRecord};
pub use termination::{
    ConfigurationError, ConvergencePredicate, PolicyDecision, RunStatus, TerminationPolicy,
    TurnProbe,
};
pub use tool::{ToolAdapter, ToolFailure, ToolOutcome, ToolRequest};
