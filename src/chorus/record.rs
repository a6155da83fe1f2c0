//! Run Records
//!
//! The audit trail of a run: one [`TurnRecord`] per agent turn, in the
//! exact order turns were scheduled, plus the terminal status once the run
//! finishes. A failed run still carries its record, so callers can see
//! which turn failed and why, and decide whether to retry, continue
//! manually, or report the partial output.
//!
//! Records serialize with `serde`, so persisting an audit trail is a
//! caller-side `serde_json::to_string(&record)` away — the core defines no
//! file format of its own.

use crate::chorus::agent::AgentResult;
use crate::chorus::context::ContextSnapshot;
use crate::chorus::termination::RunStatus;
use chrono::{DateTime, Utc};
use serde::Serialize;

/// One agent turn as it happened.
#[derive(Debug, Clone, Serialize)]
pub struct TurnRecord {
    /// Name of the agent that took the turn.
    pub agent: String,
    /// Zero-based turn index within the run.
    pub turn: usize,
    /// The turn's outcome: payload or failure descriptor.
    pub result: AgentResult,
    /// The shared context as it stood after the turn's writes committed.
    pub snapshot: ContextSnapshot,
    /// UTC timestamp recorded when the turn finished.
    pub timestamp: DateTime<Utc>,
}

impl TurnRecord {
    /// Whether the turn succeeded.
    pub fn succeeded(&self) -> bool {
        self.result.is_ok()
    }

    /// The turn's success payload, if any.
    pub fn payload(&self) -> Option<&str> {
        self.result.as_deref().ok()
    }
}

/// Ordered audit trail of all turns in a run.
#[derive(Debug, Clone, Serialize)]
pub struct RunRecord {
    /// Unique identifier for the run.
    pub run_id: String,
    /// Name of the group chat that produced the record.
    pub chat: String,
    /// Every turn, in scheduling order.
    pub turns: Vec<TurnRecord>,
    /// Terminal status, or `None` while the chat can still continue (a
    /// round-robin run between `run_turns` calls).
    pub status: Option<RunStatus>,
    /// Complete passes through the agent set.
    pub cycles: usize,
}

impl RunRecord {
    pub(crate) fn new(chat: impl Into<String>) -> Self {
        Self {
            run_id: uuid::Uuid::new_v4().to_string(),
            chat: chat.into(),
            turns: Vec::new(),
            status: None,
            cycles: 0,
        }
    }

    /// Number of turns recorded so far.
    pub fn len(&self) -> usize {
        self.turns.len()
    }

    /// Whether no turn has been recorded.
    pub fn is_empty(&self) -> bool {
        self.turns.is_empty()
    }

    /// The last successful payload produced during the run — the "direct
    /// output" of a pipeline, or the freshest result of a cycling run.
    pub fn final_output(&self) -> Option<&str> {
        self.turns.iter().rev().find_map(|turn| turn.payload())
    }
}
