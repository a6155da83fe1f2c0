//! Vector-retrieval adapter.
//!
//! Document retrieval is an external collaborator: [`DocumentIndex`] is the
//! boundary trait a vector store integration implements, and
//! [`RetrievalTool`] exposes it through the uniform [`ToolAdapter`]
//! interface as `query {text, k} -> {documents}`, an ordered list of the
//! `k` closest documents.
//!
//! [`KeywordIndex`] is the in-memory implementation that ships with the
//! crate: it scores documents by word overlap with the query, which is
//! plenty for demos, tests, and small FAQ sets.

use crate::chorus::tool::{ToolAdapter, ToolFailure, ToolOutcome, ToolRequest};
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use serde_json::json;
use std::collections::HashSet;
use std::sync::Arc;
use std::time::Duration;

const DEFAULT_TIMEOUT: Duration = Duration::from_secs(30);
const DEFAULT_K: usize = 3;

/// A retrievable document.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Document {
    /// Stable identifier within the index.
    pub id: String,
    /// Document text.
    pub text: String,
}

impl Document {
    /// Build a document from an id and its text.
    pub fn new(id: impl Into<String>, text: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            text: text.into(),
        }
    }
}

/// Boundary trait for a vector store.
#[async_trait]
pub trait DocumentIndex: Send + Sync {
    /// The `k` documents closest to `text`, best first.
    async fn query(&self, text: &str, k: usize) -> Result<Vec<Document>, ToolFailure>;
}

/// Exposes a [`DocumentIndex`] as a [`ToolAdapter`].
pub struct RetrievalTool {
    index: Arc<dyn DocumentIndex>,
    timeout: Duration,
}

impl RetrievalTool {
    /// Wrap an index with the default deadline.
    pub fn new(index: Arc<dyn DocumentIndex>) -> Self {
        Self {
            index,
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
impl ToolAdapter for RetrievalTool {
    fn name(&self) -> &str {
        "retrieval"
    }

    async fn call(&self, request: ToolRequest) -> ToolOutcome {
        if request.operation != "query" {
            return Err(ToolFailure::InvalidInput(format!(
                "retrieval has no operation '{}'",
                request.operation
            )));
        }
        let text = request.params["text"]
            .as_str()
            .ok_or_else(|| ToolFailure::InvalidInput("missing string parameter 'text'".into()))?;
        let k = match &request.params["k"] {
            serde_json::Value::Null => DEFAULT_K,
            value => value
                .as_u64()
                .ok_or_else(|| ToolFailure::InvalidInput("'k' must be a positive integer".into()))?
                as usize,
        };

        let documents = tokio::time::timeout(self.timeout, self.index.query(text, k))
            .await
            .map_err(|_| ToolFailure::Timeout(format!("query after {:?}", self.timeout)))??;
        Ok(json!({ "documents": documents }))
    }
}

/// In-memory [`DocumentIndex`] scored by word overlap.
#[derive(Default)]
pub struct KeywordIndex {
    documents: Vec<Document>,
}

impl KeywordIndex {
    /// Create an empty index.
    pub fn new() -> Self {
        Self::default()
    }

    /// Add documents, ids assigned by insertion order (builder pattern).
    pub fn with_documents<I, S>(mut self, texts: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        for text in texts {
            let id = self.documents.len().to_string();
            self.documents.push(Document::new(id, text));
        }
        self
    }

    /// Add one document with an explicit id.
    pub fn add_document(&mut self, document: Document) {
        self.documents.push(document);
    }

    fn words(text: &str) -> HashSet<String> {
        text.split(|c: char| !c.is_alphanumeric())
            .filter(|w| !w.is_empty())
            .map(str::to_lowercase)
            .collect()
    }
}

#[async_trait]
impl DocumentIndex for KeywordIndex {
    async fn query(&self, text: &str, k: usize) -> Result<Vec<Document>, ToolFailure> {
        let query_words = Self::words(text);
        let mut scored: Vec<(usize, &Document)> = self
            .documents
            .iter()
            .map(|doc| {
                let overlap = Self::words(&doc.text)
                    .intersection(&query_words)
                    .count();
                (overlap, doc)
            })
            .collect();
        // Stable sort keeps insertion order for ties.
        scored.sort_by(|a, b| b.0.cmp(&a.0));
        Ok(scored
            .into_iter()
            .take(k)
            .map(|(_, doc)| doc.clone())
            .collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn query_orders_by_overlap_and_respects_k() {
        let index = KeywordIndex::new().with_documents([
            "You can reset your password on the settings page.",
            "Support hours are 9am to 5pm on weekdays.",
            "Refunds can be requested within 30 days of purchase.",
        ]);

        let hits = index.query("How do refunds work?", 2).await.unwrap();
        assert_eq!(hits.len(), 2);
        assert!(hits[0].text.contains("Refunds"));
    }

    #[tokio::test]
    async fn adapter_validates_k() {
        let tool = RetrievalTool::new(Arc::new(KeywordIndex::new()));
        let err = tool
            .call(ToolRequest::new(
                "query",
                json!({"text": "q", "k": "three"}),
            ))
            .await
            .unwrap_err();
        assert!(matches!(err, ToolFailure::InvalidInput(_)));
    }
}
