//! Adapter-level behavior: deadlines, failure kinds, subprocess capture.

use async_trait::async_trait;
use chorus::tools::{
    ChartRenderer, GenerationTool, KeywordIndex, ProcessTool, RetrievalTool, StaticTableStore,
    TabularTool, TextGenerator, TextHistogramRenderer,
};
use chorus::{ToolAdapter, ToolFailure, ToolRequest};
use serde_json::json;
use std::sync::Arc;
use std::time::Duration;

struct SlowGenerator;

#[async_trait]
impl TextGenerator for SlowGenerator {
    async fn generate(&self, _prompt: &str) -> Result<String, Box<dyn std::error::Error + Send + Sync>> {
        tokio::time::sleep(Duration::from_millis(500)).await;
        Ok("too late".into())
    }

    fn model_name(&self) -> &str {
        "slow-model"
    }
}

struct EmptyGenerator;

#[async_trait]
impl TextGenerator for EmptyGenerator {
    async fn generate(&self, _prompt: &str) -> Result<String, Box<dyn std::error::Error + Send + Sync>> {
        Ok("   ".into())
    }

    fn model_name(&self) -> &str {
        "empty-model"
    }
}

#[tokio::test]
async fn generation_deadline_expiry_is_a_timeout_failure() {
    let tool = GenerationTool::new(Arc::new(SlowGenerator)).with_timeout(Duration::from_millis(20));

    let err = tool
        .call(ToolRequest::new("generate", json!({"prompt": "hi"})))
        .await
        .unwrap_err();

    assert!(matches!(err, ToolFailure::Timeout(_)));
}

#[tokio::test]
async fn empty_completion_is_a_malformed_response() {
    let tool = GenerationTool::new(Arc::new(EmptyGenerator));

    let err = tool
        .call(ToolRequest::new("generate", json!({"prompt": "hi"})))
        .await
        .unwrap_err();

    assert!(matches!(err, ToolFailure::MalformedResponse(_)));
}

#[tokio::test]
async fn generation_requires_a_prompt() {
    let tool = GenerationTool::new(Arc::new(EmptyGenerator));

    let err = tool
        .call(ToolRequest::new("generate", json!({})))
        .await
        .unwrap_err();

    assert!(matches!(err, ToolFailure::InvalidInput(_)));
}

#[tokio::test]
async fn process_execute_captures_stdout_and_exit_status() {
    let tool = ProcessTool::new(vec!["sh".into()]).with_extension("sh");

    let out = tool
        .call(ToolRequest::new("execute", json!({"source": "echo hello"})))
        .await
        .unwrap();

    assert_eq!(out["exit_status"], 0);
    assert!(out["stdout"].as_str().unwrap().contains("hello"));
}

#[tokio::test]
async fn process_nonzero_exit_is_data_not_failure() {
    let tool = ProcessTool::new(vec!["sh".into()]).with_extension("sh");

    let out = tool
        .call(ToolRequest::new("execute", json!({"source": "exit 3"})))
        .await
        .unwrap();

    assert_eq!(out["exit_status"], 3);
}

#[tokio::test]
async fn process_kills_the_child_on_deadline_expiry() {
    let tool = ProcessTool::new(vec!["sh".into()])
        .with_extension("sh")
        .with_timeout(Duration::from_millis(50));

    let err = tool
        .call(ToolRequest::new("execute", json!({"source": "sleep 5"})))
        .await
        .unwrap_err();

    assert!(matches!(err, ToolFailure::Timeout(_)));
}

#[tokio::test]
async fn process_lint_reports_diagnostics_and_clean_runs() {
    let tool = ProcessTool::new(vec!["sh".into()])
        .with_linter(vec!["sh".into(), "-n".into()])
        .with_extension("sh");

    let clean = tool
        .call(ToolRequest::new("lint", json!({"source": "echo ok"})))
        .await
        .unwrap();
    assert_eq!(clean["diagnostics"].as_array().unwrap().len(), 0);

    let dirty = tool
        .call(ToolRequest::new(
            "lint",
            json!({"source": "if true; then"}),
        ))
        .await
        .unwrap();
    assert!(!dirty["diagnostics"].as_array().unwrap().is_empty());
}

#[tokio::test]
async fn process_lint_without_a_linter_is_invalid_input() {
    let tool = ProcessTool::new(vec!["sh".into()]);

    let err = tool
        .call(ToolRequest::new("lint", json!({"source": "echo"})))
        .await
        .unwrap_err();

    assert!(matches!(err, ToolFailure::InvalidInput(_)));
}

#[tokio::test]
async fn retrieval_tool_returns_k_ordered_documents() {
    let index = Arc::new(KeywordIndex::new().with_documents([
        "Password resets happen on the settings page.",
        "Refunds can be requested within 30 days of purchase.",
        "Support hours are 9am to 5pm.",
    ]));
    let tool = RetrievalTool::new(index);

    let out = tool
        .call(ToolRequest::new(
            "query",
            json!({"text": "how do refunds work", "k": 2}),
        ))
        .await
        .unwrap();

    let documents = out["documents"].as_array().unwrap();
    assert_eq!(documents.len(), 2);
    assert!(documents[0]["text"].as_str().unwrap().contains("Refunds"));
}

#[tokio::test]
async fn tabular_tool_load_describe_and_clean() {
    let store = Arc::new(StaticTableStore::new().with_table(
        "t.csv",
        vec![("x".into(), vec![Some(1.0), None, Some(3.0)])],
    ));
    let tool = TabularTool::new(store);

    let loaded = tool
        .call(ToolRequest::new("load", json!({"path": "t.csv"})))
        .await
        .unwrap();
    assert_eq!(loaded["handle"], "t.csv");

    let cleaned = tool
        .call(ToolRequest::new("drop_missing", json!({"handle": "t.csv"})))
        .await
        .unwrap();
    assert_eq!(cleaned["dropped"], 1);

    let described = tool
        .call(ToolRequest::new("describe", json!({"handle": "t.csv"})))
        .await
        .unwrap();
    assert!(described["summary"].as_str().unwrap().contains("x: count=2"));
}

#[tokio::test]
async fn histogram_renderer_buckets_every_value() {
    let store = Arc::new(StaticTableStore::new().with_table(
        "t.csv",
        vec![(
            "x".into(),
            vec![Some(1.0), Some(2.0), Some(2.5), Some(9.0)],
        )],
    ));
    let dir = tempfile::tempdir().unwrap();
    let renderer = TextHistogramRenderer::new(store, dir.path().to_path_buf()).with_buckets(4);

    let path = renderer.plot_histogram("t.csv", "x").await.unwrap();
    let body = std::fs::read_to_string(&path).unwrap();

    // Four values, four '#' marks across the buckets.
    assert_eq!(body.matches('#').count(), 4);
    assert!(path.ends_with("x_histogram.txt"));
}
