//! Tabular-reporting agents: load and clean a table, then describe and
//! chart it.

use crate::chorus::agent::{Agent, AgentFailure, AgentResult};
use crate::chorus::context::SharedContext;
use crate::chorus::tool::{ToolAdapter, ToolRequest};
use async_trait::async_trait;
use serde_json::json;
use std::sync::Arc;

/// Loads a table and drops rows with missing values.
///
/// The table handle lands under the `table` key; the payload is the load
/// preview plus the cleaning status.
pub struct TableLoadAgent {
    name: String,
    tabular: Arc<dyn ToolAdapter>,
    path: String,
    handle_key: String,
}

impl TableLoadAgent {
    /// Create a loader for the table at `path`.
    pub fn new(tabular: Arc<dyn ToolAdapter>, path: impl Into<String>) -> Self {
        Self {
            name: "data_fetcher".into(),
            tabular,
            path: path.into(),
            handle_key: "table".into(),
        }
    }

    /// Override the agent name (builder pattern).
    pub fn with_name(mut self, name: impl Into<String>) -> Self {
        self.name = name.into();
        self
    }

    /// Override the context key the handle is written to (builder pattern).
    pub fn with_handle_key(mut self, handle_key: impl Into<String>) -> Self {
        self.handle_key = handle_key.into();
        self
    }
}

#[async_trait]
impl Agent for TableLoadAgent {
    fn name(&self) -> &str {
        &self.name
    }

    async fn run(&mut self, ctx: &mut SharedContext, _input: Option<&str>) -> AgentResult {
        log::info!("[{}] loading {}", self.name, self.path);
        let loaded = self
            .tabular
            .call(ToolRequest::new("load", json!({ "path": self.path })))
            .await?;
        let handle = loaded["handle"]
            .as_str()
            .ok_or_else(|| AgentFailure::Contract("load payload is missing 'handle'".into()))?
            .to_string();
        let preview = loaded["preview"].as_str().unwrap_or("").to_string();
        ctx.set(self.handle_key.as_str(), handle.clone());

        let cleaned = self
            .tabular
            .call(ToolRequest::new("drop_missing", json!({ "handle": handle })))
            .await?;
        let status = cleaned["status"].as_str().unwrap_or("cleaned");

        Ok(format!("{}\n{}", preview, status))
    }
}

/// Describes a loaded table and renders a histogram of one column.
pub struct TableReportAgent {
    name: String,
    tabular: Arc<dyn ToolAdapter>,
    chart: Arc<dyn ToolAdapter>,
    column: String,
    handle_key: String,
    report_key: String,
}

impl TableReportAgent {
    /// Create an analyst that charts `column`.
    pub fn new(
        tabular: Arc<dyn ToolAdapter>,
        chart: Arc<dyn ToolAdapter>,
        column: impl Into<String>,
    ) -> Self {
        Self {
            name: "analyst".into(),
            tabular,
            chart,
            column: column.into(),
            handle_key: "table".into(),
            report_key: "report".into(),
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
        handle_key: impl Into<String>,
        report_key: impl Into<String>,
    ) -> Self {
        self.handle_key = handle_key.into();
        self.report_key = report_key.into();
        self
    }
}

#[async_trait]
impl Agent for TableReportAgent {
    fn name(&self) -> &str {
        &self.name
    }

    async fn run(&mut self, ctx: &mut SharedContext, _input: Option<&str>) -> AgentResult {
        let handle = ctx
            .get_str(&self.handle_key)
            .map(str::to_string)
            .ok_or_else(|| {
                AgentFailure::Contract(format!("no table handle under '{}'", self.handle_key))
            })?;

        log::info!("[{}] describing table '{}'", self.name, handle);
        let described = self
            .tabular
            .call(ToolRequest::new("describe", json!({ "handle": handle })))
            .await?;
        let summary = described["summary"]
            .as_str()
            .ok_or_else(|| AgentFailure::Contract("describe payload is missing 'summary'".into()))?;

        let plotted = self
            .chart
            .call(ToolRequest::new(
                "plot_histogram",
                json!({ "handle": handle, "column": self.column }),
            ))
            .await?;
        let artifact = plotted["artifact_path"].as_str().ok_or_else(|| {
            AgentFailure::Contract("chart payload is missing 'artifact_path'".into())
        })?;

        let report = format!("{}histogram saved as {}", summary, artifact);
        ctx.set(self.report_key.as_str(), report.clone());
        Ok(report)
    }
}
