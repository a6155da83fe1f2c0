//! Text-generation adapter.
//!
//! Text generation is an external collaborator: the crate ships no model
//! client. Instead, [`TextGenerator`] is the boundary trait a language
//! model integration implements, and [`GenerationTool`] exposes it through
//! the uniform [`ToolAdapter`] interface as `generate {prompt} -> {text}`,
//! adding the per-call deadline and the failure mapping the orchestration
//! core expects:
//!
//! - deadline expiry → [`ToolFailure::Timeout`]
//! - transport/provider error → [`ToolFailure::NonZeroStatus`]
//! - an empty completion → [`ToolFailure::MalformedResponse`]
//!
//! # Example
//!
//! ```rust
//! use async_trait::async_trait;
//! use chorus::tools::{GenerationTool, TextGenerator};
//! use chorus::tool::{ToolAdapter, ToolRequest};
//! use serde_json::json;
//! use std::sync::Arc;
//!
//! struct Parrot;
//!
//! #[async_trait]
//! impl TextGenerator for Parrot {
//!     async fn generate(
//!         &self,
//!         prompt: &str,
//!     ) -> Result<String, Box<dyn std::error::Error + Send + Sync>> {
//!         Ok(format!("you said: {}", prompt))
//!     }
//!
//!     fn model_name(&self) -> &str {
//!         "parrot-1"
//!     }
//! }
//!
//! # async {
//! let tool = GenerationTool::new(Arc::new(Parrot));
//! let out = tool
//!     .call(ToolRequest::new("generate", json!({"prompt": "hi"})))
//!     .await
//!     .unwrap();
//! assert_eq!(out["text"], "you said: hi");
//! # };
//! ```

use crate::chorus::tool::{ToolAdapter, ToolFailure, ToolOutcome, ToolRequest};
use async_trait::async_trait;
use serde_json::json;
use std::error::Error;
use std::sync::Arc;
use std::time::Duration;

const DEFAULT_TIMEOUT: Duration = Duration::from_secs(60);

/// Boundary trait for a language-model backend.
#[async_trait]
pub trait TextGenerator: Send + Sync {
    /// Produce a completion for the prompt.
    async fn generate(&self, prompt: &str) -> Result<String, Box<dyn Error + Send + Sync>>;

    /// Identifier of the backing model, for logs and failure messages.
    fn model_name(&self) -> &str;
}

/// Exposes a [`TextGenerator`] as a [`ToolAdapter`].
pub struct GenerationTool {
    generator: Arc<dyn TextGenerator>,
    timeout: Duration,
}

impl GenerationTool {
    /// Wrap a generator with the default deadline.
    pub fn new(generator: Arc<dyn TextGenerator>) -> Self {
        Self {
            generator,
            timeout: DEFAULT_TIMEOUT,
        }
    }

    /// Override the per-call deadline (builder pattern).
    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }
}

#[async_trait]
impl ToolAdapter for GenerationTool {
    fn name(&self) -> &str {
        "generation"
    }

    async fn call(&self, request: ToolRequest) -> ToolOutcome {
        if request.operation != "generate" {
            return Err(ToolFailure::InvalidInput(format!(
                "generation has no operation '{}'",
                request.operation
            )));
        }
        let prompt = request.params["prompt"]
            .as_str()
            .ok_or_else(|| ToolFailure::InvalidInput("missing string parameter 'prompt'".into()))?;

        log::debug!(
            "generation: {} chars -> model '{}'",
            prompt.len(),
            self.generator.model_name()
        );
        let completion = tokio::time::timeout(self.timeout, self.generator.generate(prompt))
            .await
            .map_err(|_| {
                ToolFailure::Timeout(format!(
                    "model '{}' after {:?}",
                    self.generator.model_name(),
                    self.timeout
                ))
            })?
            .map_err(|e| {
                ToolFailure::NonZeroStatus(format!(
                    "model '{}' failed: {}",
                    self.generator.model_name(),
                    e
                ))
            })?;

        if completion.trim().is_empty() {
            return Err(ToolFailure::MalformedResponse(format!(
                "model '{}' returned an empty completion",
                self.generator.model_name()
            )));
        }
        Ok(json!({ "text": completion }))
    }
}
