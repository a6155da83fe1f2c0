//! Built-in Tool Adapters
//!
//! Concrete [`ToolAdapter`](crate::ToolAdapter) implementations for the
//! external capabilities the shipped agents use, plus the boundary traits
//! callers implement to plug in real backends:
//!
//! - **HttpFetchTool**: URL → page text, with scheme validation, a size
//!   cap, and a per-request deadline
//! - **GenerationTool**: prompt → completion over the [`TextGenerator`]
//!   boundary trait (no model client ships with the crate)
//! - **ProcessTool**: source → execution output or lint diagnostics via
//!   configured subprocess commands with kill-on-timeout
//! - **TabularTool** / **ChartTool**: table operations and histogram
//!   rendering over the [`TableStore`] / [`ChartRenderer`] boundary traits,
//!   with the [`StaticTableStore`] and [`TextHistogramRenderer`] in-memory
//!   fixtures
//! - **RetrievalTool**: query → ordered documents over the
//!   [`DocumentIndex`] boundary trait, with the in-memory [`KeywordIndex`]
//!
//! Every adapter is `Send + Sync` and shared across agents as
//! `Arc<dyn ToolAdapter>`.

pub mod fetch;
pub mod generate;
pub mod process;
pub mod retrieval;
pub mod tabular;

pub use fetch::HttpFetchTool;
pub use generate::{GenerationTool, TextGenerator};
pub use process::ProcessTool;
pub use retrieval::{Document, DocumentIndex, KeywordIndex, RetrievalTool};
pub use tabular::{
    ChartRenderer, ChartTool, StaticTableStore, TablePreview, TableStore, TabularTool,
    TextHistogramRenderer,
};
