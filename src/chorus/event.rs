//! Group-chat event system.
//!
//! A callback-based observability layer for runs. Implement
//! [`EventHandler`] and attach it via
//! [`GroupChat::with_event_handler`](crate::GroupChat::with_event_handler)
//! to receive real-time notifications about run lifecycle, turn outcomes,
//! cycle boundaries, and convergence checks. The handler method has a
//! default no-op implementation, so a handler only reacts to what it cares
//! about.
//!
//! # Example
//!
//! ```rust
//! use async_trait::async_trait;
//! use chorus::event::{ChatEvent, EventHandler};
//!
//! struct Narrator;
//!
//! #[async_trait]
//! impl EventHandler for Narrator {
//!     async fn on_chat_event(&self, event: &ChatEvent) {
//!         if let ChatEvent::TurnCompleted { agent, turn, .. } = event {
//!             println!("turn {} done by {}", turn, agent);
//!         }
//!     }
//! }
//! ```

use crate::chorus::termination::RunStatus;
use async_trait::async_trait;

/// Events emitted by a [`GroupChat`](crate::GroupChat) while it runs.
///
/// Every variant carries the chat's name so one handler can observe several
/// chats without external state.
#[derive(Debug, Clone)]
pub enum ChatEvent {
    /// The chat left `Idle` and took its first turn.
    RunStarted {
        /// Name of the chat.
        chat: String,
        /// Operating mode, e.g. `"pipeline"`.
        mode: &'static str,
        /// Number of registered agents.
        agents: usize,
    },
    /// An agent is about to take a turn.
    TurnStarted {
        chat: String,
        agent: String,
        /// Zero-based turn index.
        turn: usize,
    },
    /// An agent's turn produced a payload.
    TurnCompleted {
        chat: String,
        agent: String,
        turn: usize,
        /// Character length of the payload.
        payload_len: usize,
    },
    /// An agent's turn failed. Whether the run halts is the termination
    /// policy's decision, not implied by this event.
    TurnFailed {
        chat: String,
        agent: String,
        turn: usize,
        error: String,
    },
    /// A complete pass through the agent set finished.
    CycleCompleted {
        chat: String,
        /// One-based count of completed cycles.
        cycle: usize,
    },
    /// The convergence predicate was evaluated.
    ConvergenceChecked {
        chat: String,
        turn: usize,
        converged: bool,
    },
    /// The run reached a terminal state.
    RunFinished {
        chat: String,
        status: RunStatus,
        /// Total turns recorded.
        turns: usize,
    },
}

/// Receiver for [`ChatEvent`]s.
///
/// Stored as `Arc<dyn EventHandler>` on the chat; the default
/// implementation ignores everything.
#[async_trait]
pub trait EventHandler: Send + Sync {
    /// Called for every event the chat emits.
    async fn on_chat_event(&self, _event: &ChatEvent) {}
}
