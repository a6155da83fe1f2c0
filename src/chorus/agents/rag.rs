//! Retrieval-augmented answering agents: retrieve supporting documents,
//! then compose a grounded answer.

use crate::chorus::agent::{Agent, AgentFailure, AgentResult};
use crate::chorus::context::SharedContext;
use crate::chorus::tool::{ToolAdapter, ToolRequest};
use async_trait::async_trait;
use serde_json::json;
use std::sync::Arc;

/// Queries a document index with the question and stores the hits.
///
/// The question comes from the threaded input when present, otherwise from
/// the `question` key; either way it is (re)written to the context so the
/// answering agent can read it. The retrieved documents land under the
/// `documents` key as a JSON array.
pub struct RetrievalAgent {
    name: String,
    retrieval: Arc<dyn ToolAdapter>,
    k: usize,
    question_key: String,
    documents_key: String,
}

impl RetrievalAgent {
    /// Create a retriever over a retrieval adapter.
    pub fn new(retrieval: Arc<dyn ToolAdapter>) -> Self {
        Self {
            name: "retriever".into(),
            retrieval,
            k: 3,
            question_key: "question".into(),
            documents_key: "documents".into(),
        }
    }

    /// Override the agent name (builder pattern).
    pub fn with_name(mut self, name: impl Into<String>) -> Self {
        self.name = name.into();
        self
    }

    /// Override how many documents are requested (builder pattern).
    pub fn with_k(mut self, k: usize) -> Self {
        self.k = k;
        self
    }

    /// Override the context keys read and written (builder pattern).
    pub fn with_keys(
        mut self,
        question_key: impl Into<String>,
        documents_key: impl Into<String>,
    ) -> Self {
        self.question_key = question_key.into();
        self.documents_key = documents_key.into();
        self
    }
}

#[async_trait]
impl Agent for RetrievalAgent {
    fn name(&self) -> &str {
        &self.name
    }

    async fn run(&mut self, ctx: &mut SharedContext, input: Option<&str>) -> AgentResult {
        let question = match input {
            Some(question) => question.to_string(),
            None => ctx
                .get_str(&self.question_key)
                .map(str::to_string)
                .ok_or_else(|| {
                    AgentFailure::Contract(format!("no input and no '{}' key", self.question_key))
                })?,
        };
        ctx.set(self.question_key.as_str(), question.clone());

        log::info!("[{}] retrieving {} documents", self.name, self.k);
        let hits = self
            .retrieval
            .call(ToolRequest::new(
                "query",
                json!({ "text": question, "k": self.k }),
            ))
            .await?;
        let documents = hits["documents"].clone();
        let joined = documents
            .as_array()
            .map(|entries| {
                entries
                    .iter()
                    .filter_map(|entry| entry["text"].as_str())
                    .collect::<Vec<_>>()
                    .join("\n")
            })
            .unwrap_or_default();
        ctx.set(self.documents_key.as_str(), documents);

        Ok(joined)
    }
}

/// Composes an answer to the stored question from the retrieved documents.
pub struct AnswerAgent {
    name: String,
    generator: Arc<dyn ToolAdapter>,
    question_key: String,
    documents_key: String,
    answer_key: String,
}

impl AnswerAgent {
    /// Create an answerer over a generation adapter.
    pub fn new(generator: Arc<dyn ToolAdapter>) -> Self {
        Self {
            name: "answerer".into(),
            generator,
            question_key: "question".into(),
            documents_key: "documents".into(),
            answer_key: "answer".into(),
        }
    }

    /// Override the agent name (builder pattern).
    pub fn with_name(mut self, name: impl Into<String>) -> Self {
        self.name = name.into();
        self
    }

    /// Override the context keys read and written (builder pattern).
    pub fn with_keys(
        mut self,
        question_key: impl Into<String>,
        documents_key: impl Into<String>,
        answer_key: impl Into<String>,
    ) -> Self {
        self.question_key = question_key.into();
        self.documents_key = documents_key.into();
        self.answer_key = answer_key.into();
        self
    }
}

#[async_trait]
impl Agent for AnswerAgent {
    fn name(&self) -> &str {
        &self.name
    }

    async fn run(&mut self, ctx: &mut SharedContext, _input: Option<&str>) -> AgentResult {
        let question = ctx
            .get_str(&self.question_key)
            .map(str::to_string)
            .ok_or_else(|| {
                AgentFailure::Contract(format!("no question under '{}'", self.question_key))
            })?;
        let documents = ctx.get(&self.documents_key).ok_or_else(|| {
            AgentFailure::Contract(format!("no documents under '{}'", self.documents_key))
        })?;
        let context_text = documents
            .as_array()
            .map(|entries| {
                entries
                    .iter()
                    .filter_map(|entry| entry["text"].as_str().or_else(|| entry.as_str()))
                    .collect::<Vec<_>>()
                    .join("\n")
            })
            .unwrap_or_default();

        log::info!("[{}] composing grounded answer", self.name);
        let prompt = format!(
            "Answer the following question using this context:\n\nContext:\n{}\n\nQuestion: {}",
            context_text, question
        );
        let completion = self
            .generator
            .call(ToolRequest::new("generate", json!({ "prompt": prompt })))
            .await?;
        let answer = completion["text"]
            .as_str()
            .ok_or_else(|| AgentFailure::Contract("generation payload is missing 'text'".into()))?
            .to_string();

        ctx.set(self.answer_key.as_str(), answer.clone());
        Ok(answer)
    }
}
