//! Tool Adapter Boundary
//!
//! Every external capability — a web fetch, a text generation request, a
//! subprocess, a tabular engine, a vector index — is reached through the
//! single [`ToolAdapter`] trait. The orchestration core depends on this
//! interface only, never on a concrete tool, so any capability can be
//! swapped for a stub in tests or for a different backend in production.
//!
//! A call is a [`ToolRequest`] (operation name plus JSON parameters) and the
//! outcome is either a JSON payload or a [`ToolFailure`]. Adapters that
//! represent external work carry a per-call deadline and report expiry as
//! [`ToolFailure::Timeout`] instead of blocking the scheduler.
//!
//! # Example
//!
//! ```rust
//! use chorus::tool::ToolRequest;
//! use serde_json::json;
//!
//! let request = ToolRequest::new("fetch", json!({"url": "https://example.com"}));
//! assert_eq!(request.operation, "fetch");
//! ```

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::error::Error;
use std::fmt;

/// A request to invoke one operation on a tool adapter.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ToolRequest {
    /// Operation selector within the adapter (e.g. `"fetch"`, `"lint"`).
    pub operation: String,
    /// JSON parameters for the operation. Adapters are responsible for
    /// validating this payload and reporting bad shapes as
    /// [`ToolFailure::InvalidInput`].
    pub params: serde_json::Value,
}

impl ToolRequest {
    /// Build a request from an operation name and JSON parameters.
    pub fn new(operation: impl Into<String>, params: serde_json::Value) -> Self {
        Self {
            operation: operation.into(),
            params,
        }
    }
}

/// Recoverable failure of a tool call.
///
/// These never escape an agent's boundary uncaught: agents convert them
/// into failed [`AgentResult`](crate::AgentResult)s, which in turn become
/// run-record entries.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub enum ToolFailure {
    /// The call did not finish within the adapter's deadline.
    Timeout(String),
    /// The external process or service failed (network error, spawn error,
    /// non-success HTTP status, provider refusal).
    NonZeroStatus(String),
    /// The external side answered, but with a payload the adapter could not
    /// use (empty completion, undecodable body).
    MalformedResponse(String),
    /// The request itself was unusable: unknown operation, missing or
    /// ill-typed parameter, unsupported URL scheme.
    InvalidInput(String),
}

impl fmt::Display for ToolFailure {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ToolFailure::Timeout(msg) => write!(f, "tool call timed out: {}", msg),
            ToolFailure::NonZeroStatus(msg) => write!(f, "external failure: {}", msg),
            ToolFailure::MalformedResponse(msg) => write!(f, "malformed response: {}", msg),
            ToolFailure::InvalidInput(msg) => write!(f, "invalid input: {}", msg),
        }
    }
}

impl Error for ToolFailure {}

/// Outcome of a tool call: a JSON payload or a recoverable failure.
pub type ToolOutcome = Result<serde_json::Value, ToolFailure>;

/// A capability wrapper around one external collaborator.
///
/// Implementations must be safe to call repeatedly — no setup or teardown
/// coupled to the scheduler — and are shared across agents as
/// `Arc<dyn ToolAdapter>`.
#[async_trait]
pub trait ToolAdapter: Send + Sync {
    /// Stable adapter name, used in logs and failure messages.
    fn name(&self) -> &str;

    /// Execute one operation.
    async fn call(&self, request: ToolRequest) -> ToolOutcome;
}
