//! Web-research agents: fetch a page, then summarize it.
//!
//! [`FetchAgent`] pulls a URL's text into the context; [`SummarizeAgent`]
//! turns that content into a summary via a generation tool. Chained in a
//! pipeline they form the classic research-and-summarize flow.

use crate::chorus::agent::{Agent, AgentFailure, AgentResult};
use crate::chorus::context::SharedContext;
use crate::chorus::tool::{ToolAdapter, ToolRequest};
use async_trait::async_trait;
use serde_json::json;
use std::sync::Arc;

/// Fetches a URL's text into the context.
///
/// The URL comes from the threaded pipeline input when present, otherwise
/// from the `url` context key. The fetched text lands under the `content`
/// key and is also the turn's payload.
pub struct FetchAgent {
    name: String,
    fetcher: Arc<dyn ToolAdapter>,
    url_key: String,
    content_key: String,
}

impl FetchAgent {
    /// Create a fetch agent over a content-fetch adapter.
    pub fn new(fetcher: Arc<dyn ToolAdapter>) -> Self {
        Self {
            name: "researcher".into(),
            fetcher,
            url_key: "url".into(),
            content_key: "content".into(),
        }
    }

    /// Override the agent name (builder pattern).
    pub fn with_name(mut self, name: impl Into<String>) -> Self {
        self.name = name.into();
        self
    }

    /// Override the context keys read and written (builder pattern).
    pub fn with_keys(mut self, url_key: impl Into<String>, content_key: impl Into<String>) -> Self {
        self.url_key = url_key.into();
        self.content_key = content_key.into();
        self
    }
}

#[async_trait]
impl Agent for FetchAgent {
    fn name(&self) -> &str {
        &self.name
    }

    async fn run(&mut self, ctx: &mut SharedContext, input: Option<&str>) -> AgentResult {
        let url = match input {
            Some(url) => url.to_string(),
            None => ctx
                .get_str(&self.url_key)
                .map(str::to_string)
                .ok_or_else(|| {
                    AgentFailure::Contract(format!("no input and no '{}' key", self.url_key))
                })?,
        };

        log::info!("[{}] fetching content from {}", self.name, url);
        let page = self
            .fetcher
            .call(ToolRequest::new("fetch", json!({ "url": url })))
            .await?;
        let text = page["text"]
            .as_str()
            .ok_or_else(|| AgentFailure::Contract("fetch payload is missing 'text'".into()))?
            .to_string();

        ctx.set(self.content_key.as_str(), text.clone());
        Ok(text)
    }
}

/// How much fetched content is included in the summarization prompt.
const MAX_PROMPT_CONTENT: usize = 8_000;

/// Summarizes the fetched content via a generation tool.
pub struct SummarizeAgent {
    name: String,
    generator: Arc<dyn ToolAdapter>,
    content_key: String,
    summary_key: String,
}

impl SummarizeAgent {
    /// Create a summarize agent over a generation adapter.
    pub fn new(generator: Arc<dyn ToolAdapter>) -> Self {
        Self {
            name: "summarizer".into(),
            generator,
            content_key: "content".into(),
            summary_key: "summary".into(),
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
        content_key: impl Into<String>,
        summary_key: impl Into<String>,
    ) -> Self {
        self.content_key = content_key.into();
        self.summary_key = summary_key.into();
        self
    }
}

#[async_trait]
impl Agent for SummarizeAgent {
    fn name(&self) -> &str {
        &self.name
    }

    async fn run(&mut self, ctx: &mut SharedContext, input: Option<&str>) -> AgentResult {
        let content = match input {
            Some(content) => content.to_string(),
            None => ctx
                .get_str(&self.content_key)
                .map(str::to_string)
                .ok_or_else(|| {
                    AgentFailure::Contract(format!("no input and no '{}' key", self.content_key))
                })?,
        };

        log::info!("[{}] generating summary", self.name);
        let clipped: String = content.chars().take(MAX_PROMPT_CONTENT).collect();
        let prompt = format!("Summarize this:\n{}", clipped);
        let completion = self
            .generator
            .call(ToolRequest::new("generate", json!({ "prompt": prompt })))
            .await?;
        let summary = completion["text"]
            .as_str()
            .ok_or_else(|| AgentFailure::Contract("generation payload is missing 'text'".into()))?
            .to_string();

        ctx.set(self.summary_key.as_str(), summary.clone());
        Ok(summary)
    }
}
