//! Termination Policy
//!
//! Decides, after every agent turn, whether a run should stop. The policy
//! combines an optional iteration budget, an optional convergence
//! predicate, and a fail-fast flag, and is evaluated by the scheduler in a
//! fixed priority order:
//!
//! 1. The turn failed and fail-fast is enabled → [`RunStatus::Failed`].
//! 2. The convergence predicate (when consulted) returns true →
//!    [`RunStatus::Converged`].
//! 3. The iteration budget is exhausted → [`RunStatus::MaxIterationsReached`].
//! 4. Otherwise the run continues.
//!
//! The iteration budget counts individual turns in pipeline and round-robin
//! modes and complete cycles in refinement mode. The predicate is a pure
//! function over the latest successful payload and the shared context —
//! never ad hoc string matching buried in a loop. A policy with neither a
//! budget nor a predicate would never stop a run, so constructing one fails
//! with [`ConfigurationError::NoStoppingCondition`] before any turn runs.
//!
//! # Example
//!
//! ```rust
//! use chorus::TerminationPolicy;
//!
//! // Budget of four cycles, stop early once feedback reports clean,
//! // keep going past individual agent failures.
//! let policy = TerminationPolicy::max_iterations(4)
//!     .unwrap()
//!     .with_convergence(|_latest, ctx| {
//!         ctx.get_str("feedback") == Some("no issues detected")
//!     })
//!     .with_fail_fast(false);
//!
//! assert_eq!(policy.iteration_budget(), Some(4));
//! assert!(!policy.fail_fast());
//! ```

use crate::chorus::context::SharedContext;
use serde::{Deserialize, Serialize};
use std::error::Error;
use std::fmt;
use std::sync::Arc;

/// Terminal outcome of a run.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum RunStatus {
    /// The convergence predicate confirmed further iteration is unnecessary.
    Converged,
    /// The iteration budget (turns, cycles, or a pipeline's single pass)
    /// was spent.
    MaxIterationsReached,
    /// Fail-fast stopped the run on an agent failure, or a stop signal /
    /// run deadline aborted it between turns.
    Failed,
}

impl fmt::Display for RunStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            RunStatus::Converged => write!(f, "converged"),
            RunStatus::MaxIterationsReached => write!(f, "max iterations reached"),
            RunStatus::Failed => write!(f, "failed"),
        }
    }
}

/// Caller configuration errors, fatal before any turn runs.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ConfigurationError {
    /// Neither an iteration budget nor a convergence predicate was set.
    NoStoppingCondition,
    /// An iteration budget of zero can never admit a turn.
    ZeroIterationBudget,
    /// A group chat needs at least one agent.
    NoAgents,
    /// The entry point does not match the chat's mode (e.g. `run_turns` on
    /// a pipeline).
    WrongMode(String),
    /// The chat already reached a terminal state.
    AlreadyFinished,
}

impl fmt::Display for ConfigurationError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ConfigurationError::NoStoppingCondition => {
                write!(f, "termination policy needs a max-iteration budget or a convergence predicate")
            }
            ConfigurationError::ZeroIterationBudget => {
                write!(f, "iteration budget must be at least 1")
            }
            ConfigurationError::NoAgents => write!(f, "no agents registered"),
            ConfigurationError::WrongMode(msg) => write!(f, "wrong mode: {}", msg),
            ConfigurationError::AlreadyFinished => {
                write!(f, "run already reached a terminal state")
            }
        }
    }
}

impl Error for ConfigurationError {}

/// A pure function deciding whether further iteration is unnecessary.
///
/// The first argument is the latest successful payload (`None` when the
/// latest turn failed or produced nothing — which must read as "not yet
/// evaluated", never as convergence). The second is the shared context
/// reflecting every committed write so far.
pub type ConvergencePredicate = Arc<dyn Fn(Option<&str>, &SharedContext) -> bool + Send + Sync>;

/// What the scheduler shows the policy after a turn.
pub struct TurnProbe<'a> {
    /// Mode-appropriate iteration count: turns completed so far in pipeline
    /// and round-robin modes, full cycles completed in refinement mode.
    pub iterations_completed: usize,
    /// Whether the predicate may be consulted for this turn. True after
    /// every turn in pipeline/round-robin, true only at cycle boundaries in
    /// refinement.
    pub check_convergence: bool,
    /// Whether this turn's agent failed.
    pub turn_failed: bool,
    /// The latest successful payload, if any.
    pub latest: Option<&'a str>,
    /// The shared context after the turn's writes committed.
    pub context: &'a SharedContext,
}

/// The policy's answer for one turn.
#[derive(Debug, Clone, Copy)]
pub struct PolicyDecision {
    /// Terminal status to adopt, or `None` to continue.
    pub status: Option<RunStatus>,
    /// Outcome of the convergence predicate when it was consulted this
    /// turn, for observability. `None` when it was not evaluated.
    pub convergence: Option<bool>,
}

/// Stop rules for a run. See the module docs for the priority order.
#[derive(Clone)]
pub struct TerminationPolicy {
    max_iterations: Option<usize>,
    convergence: Option<ConvergencePredicate>,
    fail_fast: bool,
}

impl fmt::Debug for TerminationPolicy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("TerminationPolicy")
            .field("max_iterations", &self.max_iterations)
            .field("convergence", &self.convergence.is_some())
            .field("fail_fast", &self.fail_fast)
            .finish()
    }
}

impl TerminationPolicy {
    /// Build a policy from optional parts.
    ///
    /// Fails with [`ConfigurationError::NoStoppingCondition`] when both are
    /// `None`, and with [`ConfigurationError::ZeroIterationBudget`] for a
    /// budget of zero.
    pub fn new(
        max_iterations: Option<usize>,
        convergence: Option<ConvergencePredicate>,
    ) -> Result<Self, ConfigurationError> {
        if max_iterations.is_none() && convergence.is_none() {
            return Err(ConfigurationError::NoStoppingCondition);
        }
        if max_iterations == Some(0) {
            return Err(ConfigurationError::ZeroIterationBudget);
        }
        Ok(Self {
            max_iterations,
            convergence,
            fail_fast: true,
        })
    }

    /// Policy bounded by an iteration budget alone.
    pub fn max_iterations(limit: usize) -> Result<Self, ConfigurationError> {
        Self::new(Some(limit), None)
    }

    /// Policy bounded by a convergence predicate alone.
    ///
    /// Note that a predicate that never returns true leaves the run
    /// unbounded; combine with [`with_max_iterations`](Self::with_max_iterations)
    /// or a run deadline unless the predicate is guaranteed to fire.
    pub fn converge_when<F>(predicate: F) -> Self
    where
        F: Fn(Option<&str>, &SharedContext) -> bool + Send + Sync + 'static,
    {
        Self {
            max_iterations: None,
            convergence: Some(Arc::new(predicate)),
            fail_fast: true,
        }
    }

    /// Add or replace the iteration budget (builder pattern).
    pub fn with_max_iterations(mut self, limit: usize) -> Self {
        self.max_iterations = Some(limit);
        self
    }

    /// Add or replace the convergence predicate (builder pattern).
    pub fn with_convergence<F>(mut self, predicate: F) -> Self
    where
        F: Fn(Option<&str>, &SharedContext) -> bool + Send + Sync + 'static,
    {
        self.convergence = Some(Arc::new(predicate));
        self
    }

    /// Set whether an agent failure halts the run (builder pattern).
    ///
    /// Defaults to `true`. With `false`, failures are recorded and the run
    /// continues against whatever partial context exists.
    pub fn with_fail_fast(mut self, fail_fast: bool) -> Self {
        self.fail_fast = fail_fast;
        self
    }

    /// The configured iteration budget, if any.
    pub fn iteration_budget(&self) -> Option<usize> {
        self.max_iterations
    }

    /// Whether agent failure halts the run.
    pub fn fail_fast(&self) -> bool {
        self.fail_fast
    }

    /// Whether a convergence predicate is configured.
    pub fn has_convergence(&self) -> bool {
        self.convergence.is_some()
    }

    /// Decide whether the run stops after this turn.
    ///
    /// The predicate is evaluated at most once per call, and only when the
    /// probe allows it and no higher-priority rule already decided.
    pub fn decide(&self, probe: &TurnProbe<'_>) -> PolicyDecision {
        if probe.turn_failed && self.fail_fast {
            return PolicyDecision {
                status: Some(RunStatus::Failed),
                convergence: None,
            };
        }

        let mut convergence = None;
        if probe.check_convergence {
            if let Some(predicate) = &self.convergence {
                let converged = predicate(probe.latest, probe.context);
                convergence = Some(converged);
                if converged {
                    return PolicyDecision {
                        status: Some(RunStatus::Converged),
                        convergence,
                    };
                }
            }
        }

        if let Some(limit) = self.max_iterations {
            if probe.iterations_completed >= limit {
                return PolicyDecision {
                    status: Some(RunStatus::MaxIterationsReached),
                    convergence,
                };
            }
        }

        PolicyDecision {
            status: None,
            convergence,
        }
    }
}
