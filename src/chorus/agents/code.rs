//! Code-refinement agents: a producer seeds source, a reviewer checks and
//! fixes it.
//!
//! These two form the canonical refinement pair. [`ProducerAgent`] writes
//! the starting source under the `code` key; [`ReviewerAgent`] lints and
//! executes whatever is there, always writes an explicit verdict under the
//! `feedback` key, and — when issues are found and a generator is attached
//! — asks it to produce fixed source.
//!
//! The feedback key is the convergence signal: a run converges when it
//! holds [`CLEAN_FEEDBACK`]. An absent key means the reviewer has not run
//! yet, which a predicate must treat as "keep iterating", never as clean —
//! that is why the reviewer writes its verdict unconditionally.
//!
//! ```rust
//! use chorus::TerminationPolicy;
//! use chorus::agents::CLEAN_FEEDBACK;
//!
//! let policy = TerminationPolicy::max_iterations(3)
//!     .unwrap()
//!     .with_convergence(|_, ctx| ctx.get_str("feedback") == Some(CLEAN_FEEDBACK));
//! # let _ = policy;
//! ```

use crate::chorus::agent::{Agent, AgentFailure, AgentResult};
use crate::chorus::context::SharedContext;
use crate::chorus::tool::{ToolAdapter, ToolRequest};
use async_trait::async_trait;
use serde_json::json;
use std::sync::Arc;

/// The verdict a [`ReviewerAgent`] writes when lint and execution are both
/// clean.
pub const CLEAN_FEEDBACK: &str = "no issues detected";

/// Seeds the shared context with initial source on its first turn.
///
/// On later turns the code key already holds the (possibly fixed) source,
/// which the producer leaves untouched and returns as its payload.
pub struct ProducerAgent {
    name: String,
    initial_source: String,
    code_key: String,
}

impl ProducerAgent {
    /// Create a producer that seeds the given source.
    pub fn new(initial_source: impl Into<String>) -> Self {
        Self {
            name: "producer".into(),
            initial_source: initial_source.into(),
            code_key: "code".into(),
        }
    }

    /// Override the agent name (builder pattern).
    pub fn with_name(mut self, name: impl Into<String>) -> Self {
        self.name = name.into();
        self
    }

    /// Override the context key the source lives under (builder pattern).
    pub fn with_code_key(mut self, code_key: impl Into<String>) -> Self {
        self.code_key = code_key.into();
        self
    }
}

#[async_trait]
impl Agent for ProducerAgent {
    fn name(&self) -> &str {
        &self.name
    }

    async fn run(&mut self, ctx: &mut SharedContext, _input: Option<&str>) -> AgentResult {
        if !ctx.contains(&self.code_key) {
            log::info!("[{}] seeding initial source", self.name);
            ctx.set(self.code_key.as_str(), self.initial_source.clone());
        }
        ctx.get_str(&self.code_key)
            .map(str::to_string)
            .ok_or_else(|| {
                AgentFailure::Contract(format!("'{}' does not hold source text", self.code_key))
            })
    }
}

/// Lints and executes the current source, records an explicit verdict, and
/// optionally requests fixed source from a generator.
pub struct ReviewerAgent {
    name: String,
    process: Arc<dyn ToolAdapter>,
    generator: Option<Arc<dyn ToolAdapter>>,
    code_key: String,
    feedback_key: String,
}

impl ReviewerAgent {
    /// Create a reviewer over a process adapter (lint + execute).
    pub fn new(process: Arc<dyn ToolAdapter>) -> Self {
        Self {
            name: "reviewer".into(),
            process,
            generator: None,
            code_key: "code".into(),
            feedback_key: "feedback".into(),
        }
    }

    /// Override the agent name (builder pattern).
    pub fn with_name(mut self, name: impl Into<String>) -> Self {
        self.name = name.into();
        self
    }

    /// Attach a generation adapter used to fix the source when issues are
    /// found (builder pattern). Without one the reviewer only reports.
    pub fn with_generator(mut self, generator: Arc<dyn ToolAdapter>) -> Self {
        self.generator = Some(generator);
        self
    }

    /// Override the context keys read and written (builder pattern).
    pub fn with_keys(
        mut self,
        code_key: impl Into<String>,
        feedback_key: impl Into<String>,
    ) -> Self {
        self.code_key = code_key.into();
        self.feedback_key = feedback_key.into();
        self
    }
}

#[async_trait]
impl Agent for ReviewerAgent {
    fn name(&self) -> &str {
        &self.name
    }

    async fn run(&mut self, ctx: &mut SharedContext, _input: Option<&str>) -> AgentResult {
        let code = ctx
            .get_str(&self.code_key)
            .map(str::to_string)
            .ok_or_else(|| {
                AgentFailure::Contract(format!("no source under '{}'", self.code_key))
            })?;

        log::info!("[{}] running linter and executor", self.name);
        let lint = self
            .process
            .call(ToolRequest::new("lint", json!({ "source": code })))
            .await?;
        let diagnostics: Vec<String> = lint["diagnostics"]
            .as_array()
            .map(|entries| {
                entries
                    .iter()
                    .filter_map(|entry| entry.as_str().map(str::to_string))
                    .collect()
            })
            .unwrap_or_default();

        let execution = self
            .process
            .call(ToolRequest::new("execute", json!({ "source": code })))
            .await?;
        let exit_status = execution["exit_status"].as_i64().unwrap_or(-1);
        let stderr = execution["stderr"].as_str().unwrap_or("");

        let clean = diagnostics.is_empty() && exit_status == 0;
        let feedback = if clean {
            CLEAN_FEEDBACK.to_string()
        } else {
            format!(
                "linter feedback:\n{}\n\nexecution (status {}):\n{}",
                diagnostics.join("\n"),
                exit_status,
                stderr
            )
        };
        // Written on every turn: an absent feedback key means "not yet
        // reviewed", and only an explicit clean verdict may converge a run.
        ctx.set(self.feedback_key.as_str(), feedback.clone());

        if !clean {
            if let Some(generator) = &self.generator {
                log::info!("[{}] issues found, requesting fixed source", self.name);
                let prompt = format!(
                    "This code has issues:\n{}\n\nHere is the lint and execution feedback:\n{}\n\
                     Please fix the code and return the fixed code only.",
                    code, feedback
                );
                let completion = generator
                    .call(ToolRequest::new("generate", json!({ "prompt": prompt })))
                    .await?;
                let fixed = completion["text"].as_str().ok_or_else(|| {
                    AgentFailure::Contract("generation payload is missing 'text'".into())
                })?;
                ctx.set(self.code_key.as_str(), fixed.to_string());
            }
        }

        Ok(feedback)
    }
}
