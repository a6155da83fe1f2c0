//! End-to-end compositions of the shipped agents over stubbed or in-memory
//! tools.

use async_trait::async_trait;
use chorus::agents::{
    AnswerAgent, FetchAgent, ProducerAgent, RetrievalAgent, ReviewerAgent, SummarizeAgent,
    TableLoadAgent, TableReportAgent, CLEAN_FEEDBACK,
};
use chorus::tools::{
    ChartTool, KeywordIndex, RetrievalTool, StaticTableStore, TabularTool, TextHistogramRenderer,
};
use chorus::{
    Agent, ChatMode, GroupChat, RunStatus, TerminationPolicy, ToolAdapter, ToolFailure,
    ToolOutcome, ToolRequest,
};
use serde_json::json;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

/// Content-fetch stub that always serves the same page text.
struct StubFetch {
    text: String,
}

#[async_trait]
impl ToolAdapter for StubFetch {
    fn name(&self) -> &str {
        "stub_fetch"
    }

    async fn call(&self, request: ToolRequest) -> ToolOutcome {
        match request.operation.as_str() {
            "fetch" => Ok(json!({ "text": self.text })),
            other => Err(ToolFailure::InvalidInput(format!(
                "unknown operation '{}'",
                other
            ))),
        }
    }
}

/// Generation stub that always answers with the same completion.
struct StubGenerate {
    reply: String,
}

#[async_trait]
impl ToolAdapter for StubGenerate {
    fn name(&self) -> &str {
        "stub_generate"
    }

    async fn call(&self, request: ToolRequest) -> ToolOutcome {
        match request.operation.as_str() {
            "generate" => Ok(json!({ "text": self.reply })),
            other => Err(ToolFailure::InvalidInput(format!(
                "unknown operation '{}'",
                other
            ))),
        }
    }
}

/// Process stub whose linter reports an issue on the first pass and comes
/// back clean afterwards; execution always succeeds.
struct FlakyLintProcess {
    lint_calls: AtomicUsize,
}

#[async_trait]
impl ToolAdapter for FlakyLintProcess {
    fn name(&self) -> &str {
        "flaky_process"
    }

    async fn call(&self, request: ToolRequest) -> ToolOutcome {
        match request.operation.as_str() {
            "lint" => {
                let call = self.lint_calls.fetch_add(1, Ordering::SeqCst);
                if call == 0 {
                    Ok(json!({ "diagnostics": ["E999 syntax error on line 1"] }))
                } else {
                    Ok(json!({ "diagnostics": [] }))
                }
            }
            "execute" => Ok(json!({ "stdout": "", "stderr": "", "exit_status": 0 })),
            other => Err(ToolFailure::InvalidInput(format!(
                "unknown operation '{}'",
                other
            ))),
        }
    }
}

#[tokio::test]
async fn fetch_then_summarize_pipeline_yields_the_summary() {
    let fetch = Arc::new(StubFetch {
        text: "hello world".into(),
    });
    let generate = Arc::new(StubGenerate {
        reply: "summary: hello".into(),
    });

    let agents: Vec<Box<dyn Agent>> = vec![
        Box::new(FetchAgent::new(fetch)),
        Box::new(SummarizeAgent::new(generate)),
    ];
    let mut chat = GroupChat::new(
        "web-research",
        agents,
        ChatMode::Pipeline,
        TerminationPolicy::max_iterations(2).unwrap(),
    )
    .unwrap()
    .with_input("http://example.com");

    let record = chat.run().await.unwrap();

    assert_eq!(record.turns.len(), 2);
    assert_eq!(record.final_output(), Some("summary: hello"));
    assert_eq!(chat.context().get_str("content"), Some("hello world"));
    assert_eq!(chat.context().get_str("summary"), Some("summary: hello"));
}

#[tokio::test]
async fn refinement_converges_on_the_second_cycle() {
    let process = Arc::new(FlakyLintProcess {
        lint_calls: AtomicUsize::new(0),
    });
    let generate = Arc::new(StubGenerate {
        reply: "fixed code".into(),
    });

    let agents: Vec<Box<dyn Agent>> = vec![
        Box::new(ProducerAgent::new("broken code")),
        Box::new(ReviewerAgent::new(process).with_generator(generate)),
    ];
    let policy = TerminationPolicy::max_iterations(3)
        .unwrap()
        .with_convergence(|_, ctx| ctx.get_str("feedback") == Some(CLEAN_FEEDBACK));
    let mut chat = GroupChat::new("code-refinement", agents, ChatMode::Refinement, policy).unwrap();

    let record = chat.run().await.unwrap();

    assert_eq!(record.status, Some(RunStatus::Converged));
    assert_eq!(record.cycles, 2);
    assert_eq!(record.turns.len(), 4);
    // The reviewer routed the dirty source through the generator.
    assert_eq!(chat.context().get_str("code"), Some("fixed code"));
    assert_eq!(chat.context().get_str("feedback"), Some(CLEAN_FEEDBACK));
}

#[tokio::test]
async fn tabular_round_robin_produces_a_report_and_an_artifact() {
    let out_dir = tempfile::tempdir().unwrap();
    let store = Arc::new(StaticTableStore::new().with_table(
        "measurements.csv",
        vec![
            (
                "sepal_length".into(),
                vec![Some(5.1), Some(4.9), None, Some(6.2), Some(5.8)],
            ),
            (
                "sepal_width".into(),
                vec![Some(3.5), Some(3.0), Some(3.1), None, Some(2.9)],
            ),
        ],
    ));
    let tabular = Arc::new(TabularTool::new(store.clone()));
    let chart = Arc::new(ChartTool::new(Arc::new(TextHistogramRenderer::new(
        store,
        out_dir.path().to_path_buf(),
    ))));

    let agents: Vec<Box<dyn Agent>> = vec![
        Box::new(TableLoadAgent::new(tabular.clone(), "measurements.csv")),
        Box::new(TableReportAgent::new(tabular, chart, "sepal_length")),
    ];
    let mut chat = GroupChat::new(
        "data-report",
        agents,
        ChatMode::RoundRobin,
        TerminationPolicy::max_iterations(10).unwrap(),
    )
    .unwrap();

    // One full cycle: load + clean, then describe + chart.
    let record = chat.run_turns(2).await.unwrap();

    assert_eq!(record.turns.len(), 2);
    let report = chat.context().get_str("report").unwrap();
    assert!(report.contains("sepal_length: count=3"));
    assert!(report.contains("histogram saved as"));

    let artifact = out_dir.path().join("sepal_length_histogram.txt");
    let body = std::fs::read_to_string(artifact).unwrap();
    assert!(body.contains("histogram of sepal_length"));
}

#[tokio::test]
async fn retrieval_then_answer_pipeline_grounds_the_generation() {
    let index = Arc::new(KeywordIndex::new().with_documents([
        "You can reset your password by going to the settings page.",
        "Our support hours are 9am to 5pm Monday through Friday.",
        "Refunds can be requested within 30 days of purchase.",
    ]));
    let retrieval = Arc::new(RetrievalTool::new(index));
    let generate = Arc::new(StubGenerate {
        reply: "Request a refund within 30 days of purchase.".into(),
    });

    let agents: Vec<Box<dyn Agent>> = vec![
        Box::new(RetrievalAgent::new(retrieval)),
        Box::new(AnswerAgent::new(generate)),
    ];
    let mut chat = GroupChat::new(
        "faq-answer",
        agents,
        ChatMode::Pipeline,
        TerminationPolicy::max_iterations(2).unwrap(),
    )
    .unwrap()
    .with_input("How can refunds be requested?");

    let record = chat.run().await.unwrap();

    assert_eq!(record.turns.len(), 2);
    let documents = chat.context().get("documents").unwrap();
    let top = documents[0]["text"].as_str().unwrap();
    assert!(top.contains("Refunds"));
    assert_eq!(
        chat.context().get_str("answer"),
        Some("Request a refund within 30 days of purchase.")
    );
}

#[tokio::test]
async fn run_records_serialize_for_caller_side_persistence() {
    let fetch = Arc::new(StubFetch {
        text: "hello world".into(),
    });
    let generate = Arc::new(StubGenerate {
        reply: "summary: hello".into(),
    });
    let agents: Vec<Box<dyn Agent>> = vec![
        Box::new(FetchAgent::new(fetch)),
        Box::new(SummarizeAgent::new(generate)),
    ];
    let mut chat = GroupChat::new(
        "serializable",
        agents,
        ChatMode::Pipeline,
        TerminationPolicy::max_iterations(2).unwrap(),
    )
    .unwrap()
    .with_input("http://example.com");

    let record = chat.run().await.unwrap();
    let value = serde_json::to_value(&record).unwrap();

    assert_eq!(value["chat"], "serializable");
    assert_eq!(value["turns"][0]["agent"], "researcher");
    assert_eq!(value["turns"][1]["result"]["Ok"], "summary: hello");
    assert_eq!(value["turns"][1]["snapshot"]["summary"], "summary: hello");
    assert_eq!(value["status"], "MaxIterationsReached");
}
