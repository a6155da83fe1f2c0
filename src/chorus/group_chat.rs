//! Group-Chat Scheduler
//!
//! This module provides the engine that drives a set of [`Agent`]s against
//! a [`SharedContext`] under a [`TerminationPolicy`]. One of three
//! operating modes is selected at construction:
//!
//! | Mode | Pattern | Termination |
//! |------|---------|-------------|
//! | `Pipeline` | Each agent runs exactly once, in registration order | After the last agent, or earlier per policy |
//! | `RoundRobin` | Agents take turns cyclically, cursor persists across calls | Caller-requested turn count, bounded by policy |
//! | `Refinement` | A small set cycles tightly; convergence checked per cycle | Convergence or cycle budget |
//!
//! The chat is a state machine: `Idle → Running → Finished(status)` where
//! the terminal status is one of [`RunStatus::Converged`],
//! [`RunStatus::MaxIterationsReached`], or [`RunStatus::Failed`]. Every
//! turn — success or failure — lands in the [`RunRecord`]; whether a
//! failure halts the run is governed solely by the policy's fail-fast flag,
//! uniformly across all three modes.
//!
//! Turns are cooperative and never interleave: the chat drives one agent's
//! turn to completion (including any tool calls it makes) before starting
//! the next, so the context only ever reflects fully-committed writes from
//! prior turns. A stop signal ([`GroupChat::stop_handle`]) and an optional
//! run deadline ([`GroupChat::with_deadline`]) are checked between turns,
//! so a long cycling run can be aborted without waiting out its budget.
//!
//! # Example
//!
//! ```rust
//! use async_trait::async_trait;
//! use chorus::{Agent, AgentResult, ChatMode, GroupChat, SharedContext, TerminationPolicy};
//!
//! struct Shout;
//!
//! #[async_trait]
//! impl Agent for Shout {
//!     fn name(&self) -> &str {
//!         "shout"
//!     }
//!
//!     async fn run(&mut self, _ctx: &mut SharedContext, input: Option<&str>) -> AgentResult {
//!         Ok(input.unwrap_or("").to_uppercase())
//!     }
//! }
//!
//! # async {
//! let policy = TerminationPolicy::max_iterations(1).unwrap();
//! let mut chat = GroupChat::new("demo", vec![Box::new(Shout)], ChatMode::Pipeline, policy)
//!     .unwrap()
//!     .with_input("hello");
//!
//! let record = chat.run().await.unwrap();
//! assert_eq!(record.final_output(), Some("HELLO"));
//! # };
//! ```

use crate::chorus::agent::Agent;
use crate::chorus::context::SharedContext;
use crate::chorus::event::{ChatEvent, EventHandler};
use crate::chorus::record::{RunRecord, TurnRecord};
use crate::chorus::termination::{
    ConfigurationError, RunStatus, TerminationPolicy, TurnProbe,
};
use chrono::Utc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::{Duration, Instant};

/// Context key under which the scheduler publishes each turn's successful
/// payload, so the freshest output is always addressable by key.
pub const LAST_OUTPUT_KEY: &str = "last_output";

/// Operating mode of a [`GroupChat`], selected at construction.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ChatMode {
    /// Single pass: every agent runs exactly once, in registration order,
    /// with each payload threaded into the next agent's input.
    Pipeline,
    /// Persistent cyclic turns driven by [`GroupChat::run_turns`]; the
    /// cursor survives across calls, so `run_turns(1)` three times equals
    /// `run_turns(3)`.
    RoundRobin,
    /// Bounded iterative refinement: the agent set cycles tightly and the
    /// convergence predicate is consulted once per complete cycle, against
    /// the freshest write.
    Refinement,
}

impl ChatMode {
    fn name(&self) -> &'static str {
        match self {
            ChatMode::Pipeline => "pipeline",
            ChatMode::RoundRobin => "round-robin",
            ChatMode::Refinement => "refinement",
        }
    }
}

/// Lifecycle state of a [`GroupChat`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ChatState {
    /// Constructed, no turn taken yet.
    Idle,
    /// At least one turn taken, no terminal status reached.
    Running,
    /// Terminal. Further `run`/`run_turns` calls fail with
    /// [`ConfigurationError::AlreadyFinished`].
    Finished(RunStatus),
}

/// Cloneable handle that aborts a running chat between turns.
///
/// Safe to trigger from another task or thread; the chat notices before its
/// next turn and finishes with [`RunStatus::Failed`], keeping the partial
/// record intact. An in-flight tool call still honors its own per-call
/// deadline independently.
#[derive(Clone)]
pub struct StopHandle(Arc<AtomicBool>);

impl StopHandle {
    /// Request the run to stop before its next turn.
    pub fn stop(&self) {
        self.0.store(true, Ordering::SeqCst);
    }

    /// Whether a stop has been requested.
    pub fn is_stopped(&self) -> bool {
        self.0.load(Ordering::SeqCst)
    }
}

struct TurnSummary {
    failed: bool,
    payload: Option<String>,
}

/// The scheduler: owns the agents, the shared context, the policy, and the
/// accumulating [`RunRecord`] for one run.
///
/// The context is owned exclusively by the chat for the run's lifetime and
/// handed to agents by mutable reference one turn at a time, so no agent
/// can retain access beyond its own turn.
pub struct GroupChat {
    /// Human-readable name used in records, events, and logs.
    pub name: String,
    agents: Vec<Box<dyn Agent>>,
    mode: ChatMode,
    policy: TerminationPolicy,
    context: SharedContext,
    state: ChatState,
    /// Next agent index for round-robin resumption.
    cursor: usize,
    turns_taken: usize,
    cycles_completed: usize,
    record: RunRecord,
    input: Option<String>,
    deadline: Option<Duration>,
    stop: Arc<AtomicBool>,
    event_handler: Option<Arc<dyn EventHandler>>,
}

impl GroupChat {
    /// Create a chat over an ordered agent list.
    ///
    /// The agent order is the scheduling order for every mode. Fails with
    /// [`ConfigurationError::NoAgents`] on an empty list.
    pub fn new(
        name: impl Into<String>,
        agents: Vec<Box<dyn Agent>>,
        mode: ChatMode,
        policy: TerminationPolicy,
    ) -> Result<Self, ConfigurationError> {
        if agents.is_empty() {
            return Err(ConfigurationError::NoAgents);
        }
        let name = name.into();
        let record = RunRecord::new(name.clone());
        Ok(Self {
            name,
            agents,
            mode,
            policy,
            context: SharedContext::new(),
            state: ChatState::Idle,
            cursor: 0,
            turns_taken: 0,
            cycles_completed: 0,
            record,
            input: None,
            deadline: None,
            stop: Arc::new(AtomicBool::new(false)),
            event_handler: None,
        })
    }

    /// Seed the value threaded into the first pipeline agent (builder
    /// pattern). Ignored by the cycling modes, which communicate through
    /// the context alone.
    pub fn with_input(mut self, input: impl Into<String>) -> Self {
        self.input = Some(input.into());
        self
    }

    /// Start from a pre-populated context (builder pattern).
    pub fn with_context(mut self, context: SharedContext) -> Self {
        self.context = context;
        self
    }

    /// Bound each `run`/`run_turns` call by a wall-clock deadline (builder
    /// pattern). Checked between turns; expiry finishes the run as
    /// [`RunStatus::Failed`] with a truthful partial record.
    pub fn with_deadline(mut self, deadline: Duration) -> Self {
        self.deadline = Some(deadline);
        self
    }

    /// Attach an [`EventHandler`] for run observability (builder pattern).
    pub fn with_event_handler(mut self, handler: Arc<dyn EventHandler>) -> Self {
        self.event_handler = Some(handler);
        self
    }

    /// A handle that can abort the run between turns.
    pub fn stop_handle(&self) -> StopHandle {
        StopHandle(Arc::clone(&self.stop))
    }

    /// Borrow the shared context (e.g. to seed keys before running).
    pub fn context(&self) -> &SharedContext {
        &self.context
    }

    /// Mutably borrow the shared context.
    pub fn context_mut(&mut self) -> &mut SharedContext {
        &mut self.context
    }

    /// Consume the chat, keeping the context's terminal values.
    pub fn into_context(self) -> SharedContext {
        self.context
    }

    /// Current lifecycle state.
    pub fn state(&self) -> ChatState {
        self.state
    }

    /// The record accumulated so far.
    pub fn record(&self) -> &RunRecord {
        &self.record
    }

    /// Turns taken so far, across every call.
    pub fn turns_taken(&self) -> usize {
        self.turns_taken
    }

    /// Execute a pipeline or refinement run to its terminal state.
    ///
    /// Returns the complete [`RunRecord`]; a failed run is an `Ok` record
    /// with status [`RunStatus::Failed`], not an error. `Err` is reserved
    /// for caller mistakes: calling this on a round-robin chat or on a chat
    /// that already finished.
    pub async fn run(&mut self) -> Result<RunRecord, ConfigurationError> {
        match self.mode {
            ChatMode::Pipeline => self.run_pipeline().await,
            ChatMode::Refinement => self.run_refinement().await,
            ChatMode::RoundRobin => Err(ConfigurationError::WrongMode(
                "round-robin chats are driven with run_turns(n)".into(),
            )),
        }
    }

    /// Execute up to `n` round-robin turns, resuming from the persistent
    /// cursor.
    ///
    /// `n` need not be a multiple of the agent count; the next call picks
    /// up where this one left off. Each call returns the record accumulated
    /// across all calls so far.
    pub async fn run_turns(&mut self, n: usize) -> Result<RunRecord, ConfigurationError> {
        if self.mode != ChatMode::RoundRobin {
            return Err(ConfigurationError::WrongMode(
                "run_turns(n) applies to round-robin chats; use run()".into(),
            ));
        }
        self.begin_run().await?;
        let started = Instant::now();
        let total = self.agents.len();
        let mut outcome = None;

        for _ in 0..n {
            if let Some(status) = self.abort_status(started) {
                outcome = Some(status);
                break;
            }
            let summary = self.take_turn(self.cursor, None).await;
            // Round-robin index arithmetic: turn count modulo agent count.
            self.cursor = self.turns_taken % total;
            if self.cursor == 0 {
                self.cycles_completed += 1;
                self.emit(ChatEvent::CycleCompleted {
                    chat: self.name.clone(),
                    cycle: self.cycles_completed,
                })
                .await;
            }
            if let Some(status) = self.decide_after_turn(&summary, self.turns_taken, true).await {
                outcome = Some(status);
                break;
            }
        }

        self.record.cycles = self.cycles_completed;
        if let Some(status) = outcome {
            self.finish(status).await;
        }
        Ok(self.record.clone())
    }

    async fn run_pipeline(&mut self) -> Result<RunRecord, ConfigurationError> {
        self.begin_run().await?;
        let started = Instant::now();
        let total = self.agents.len();
        let mut thread = self.input.clone();
        let mut outcome = None;

        for idx in 0..total {
            if let Some(status) = self.abort_status(started) {
                outcome = Some(status);
                break;
            }
            let summary = self.take_turn(idx, thread.take()).await;
            thread = summary.payload.clone();
            if let Some(status) = self.decide_after_turn(&summary, self.turns_taken, true).await {
                outcome = Some(status);
                break;
            }
        }

        if self.turns_taken == total {
            self.cycles_completed = 1;
            self.emit(ChatEvent::CycleCompleted {
                chat: self.name.clone(),
                cycle: 1,
            })
            .await;
        }
        // A completed pass spent its budget of exactly one pass.
        let status = outcome.unwrap_or(RunStatus::MaxIterationsReached);
        self.finish(status).await;
        Ok(self.record.clone())
    }

    async fn run_refinement(&mut self) -> Result<RunRecord, ConfigurationError> {
        self.begin_run().await?;
        let started = Instant::now();
        let total = self.agents.len();
        let mut outcome = None;

        'run: loop {
            for idx in 0..total {
                if let Some(status) = self.abort_status(started) {
                    outcome = Some(status);
                    break 'run;
                }
                let summary = self.take_turn(idx, None).await;
                let boundary = idx + 1 == total;
                if boundary {
                    self.cycles_completed += 1;
                    self.emit(ChatEvent::CycleCompleted {
                        chat: self.name.clone(),
                        cycle: self.cycles_completed,
                    })
                    .await;
                }
                // Convergence is a property of a cycle's outcome: the
                // predicate is consulted only at cycle boundaries, and the
                // budget counts cycles, not turns.
                if let Some(status) = self
                    .decide_after_turn(&summary, self.cycles_completed, boundary)
                    .await
                {
                    outcome = Some(status);
                    break 'run;
                }
            }
        }

        let status = outcome.unwrap_or(RunStatus::Failed);
        self.finish(status).await;
        Ok(self.record.clone())
    }

    /// Drive one agent's turn to completion and record it.
    async fn take_turn(&mut self, idx: usize, input: Option<String>) -> TurnSummary {
        let turn = self.turns_taken;
        let agent_name = self.agents[idx].name().to_string();
        log::debug!("[{}] turn {} -> '{}'", self.name, turn, agent_name);
        self.emit(ChatEvent::TurnStarted {
            chat: self.name.clone(),
            agent: agent_name.clone(),
            turn,
        })
        .await;

        let result = self.agents[idx]
            .run(&mut self.context, input.as_deref())
            .await;
        self.turns_taken += 1;

        let summary = match &result {
            Ok(payload) => TurnSummary {
                failed: false,
                payload: Some(payload.clone()),
            },
            Err(_) => TurnSummary {
                failed: true,
                payload: None,
            },
        };

        if let Some(payload) = &summary.payload {
            self.context.set(LAST_OUTPUT_KEY, payload.clone());
        }

        match &result {
            Ok(payload) => {
                self.emit(ChatEvent::TurnCompleted {
                    chat: self.name.clone(),
                    agent: agent_name.clone(),
                    turn,
                    payload_len: payload.len(),
                })
                .await;
            }
            Err(failure) => {
                log::warn!(
                    "[{}] turn {} by '{}' failed: {}",
                    self.name,
                    turn,
                    agent_name,
                    failure
                );
                self.emit(ChatEvent::TurnFailed {
                    chat: self.name.clone(),
                    agent: agent_name.clone(),
                    turn,
                    error: failure.to_string(),
                })
                .await;
            }
        }

        self.record.turns.push(TurnRecord {
            agent: agent_name,
            turn,
            result,
            snapshot: self.context.snapshot(),
            timestamp: Utc::now(),
        });

        summary
    }

    /// Apply the termination policy after a turn and surface the predicate
    /// outcome as an event when it was consulted.
    async fn decide_after_turn(
        &mut self,
        summary: &TurnSummary,
        iterations_completed: usize,
        check_convergence: bool,
    ) -> Option<RunStatus> {
        let decision = {
            let probe = TurnProbe {
                iterations_completed,
                check_convergence,
                turn_failed: summary.failed,
                latest: summary.payload.as_deref(),
                context: &self.context,
            };
            self.policy.decide(&probe)
        };
        if let Some(converged) = decision.convergence {
            self.emit(ChatEvent::ConvergenceChecked {
                chat: self.name.clone(),
                turn: self.turns_taken.saturating_sub(1),
                converged,
            })
            .await;
        }
        decision.status
    }

    async fn begin_run(&mut self) -> Result<(), ConfigurationError> {
        match self.state {
            ChatState::Finished(_) => Err(ConfigurationError::AlreadyFinished),
            ChatState::Running => Ok(()),
            ChatState::Idle => {
                self.state = ChatState::Running;
                log::info!(
                    "[{}] run started: mode={}, agents={}",
                    self.name,
                    self.mode.name(),
                    self.agents.len()
                );
                self.emit(ChatEvent::RunStarted {
                    chat: self.name.clone(),
                    mode: self.mode.name(),
                    agents: self.agents.len(),
                })
                .await;
                Ok(())
            }
        }
    }

    fn abort_status(&self, started: Instant) -> Option<RunStatus> {
        if self.stop.load(Ordering::SeqCst) {
            log::warn!("[{}] stop signal honored between turns", self.name);
            return Some(RunStatus::Failed);
        }
        if let Some(deadline) = self.deadline {
            if started.elapsed() >= deadline {
                log::warn!("[{}] run deadline {:?} expired", self.name, deadline);
                return Some(RunStatus::Failed);
            }
        }
        None
    }

    async fn finish(&mut self, status: RunStatus) {
        self.state = ChatState::Finished(status);
        self.record.status = Some(status);
        self.record.cycles = self.cycles_completed;
        log::info!(
            "[{}] run finished: status={}, turns={}, cycles={}",
            self.name,
            status,
            self.record.turns.len(),
            self.cycles_completed
        );
        self.emit(ChatEvent::RunFinished {
            chat: self.name.clone(),
            status,
            turns: self.record.turns.len(),
        })
        .await;
    }

    async fn emit(&self, event: ChatEvent) {
        if let Some(handler) = &self.event_handler {
            handler.on_chat_event(&event).await;
        }
    }
}
