//! Built-in Agent Variants
//!
//! Thin, tool-backed [`Agent`](crate::Agent) implementations covering the
//! common group-chat compositions:
//!
//! - **Web research** (pipeline): [`FetchAgent`] → [`SummarizeAgent`]
//! - **Code refinement** (refinement): [`ProducerAgent`] → [`ReviewerAgent`]
//! - **Tabular reporting** (round-robin): [`TableLoadAgent`] →
//!   [`TableReportAgent`]
//! - **Grounded answering** (pipeline): [`RetrievalAgent`] → [`AnswerAgent`]
//!
//! Each agent holds its tools as `Arc<dyn ToolAdapter>` and communicates
//! through well-known context keys, all overridable with `with_*` builders,
//! so variants can be mixed into custom compositions.

pub mod code;
pub mod data;
pub mod rag;
pub mod web;

pub use code::{ProducerAgent, ReviewerAgent, CLEAN_FEEDBACK};
pub use data::{TableLoadAgent, TableReportAgent};
pub use rag::{AnswerAgent, RetrievalAgent};
pub use web::{FetchAgent, SummarizeAgent};
