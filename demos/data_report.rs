//! Tabular reporting over one round-robin cycle: load and clean a table,
//! then describe it and render a histogram artifact.
//!
//! ```bash
//! cargo run --example data_report
//! ```

use chorus::agents::{TableLoadAgent, TableReportAgent};
use chorus::tools::{ChartTool, StaticTableStore, TabularTool, TextHistogramRenderer};
use chorus::{Agent, ChatMode, GroupChat, TerminationPolicy};
use std::sync::Arc;

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    chorus::init_logger();

    // An iris-style numeric table with a few missing cells.
    let store = Arc::new(StaticTableStore::new().with_table(
        "iris_missingdata.csv",
        vec![
            (
                "sepal_length".into(),
                vec![Some(5.1), Some(4.9), None, Some(6.2), Some(5.8), Some(5.0)],
            ),
            (
                "sepal_width".into(),
                vec![Some(3.5), Some(3.0), Some(3.1), None, Some(2.9), Some(3.3)],
            ),
            (
                "petal_length".into(),
                vec![Some(1.4), Some(1.4), Some(1.5), Some(4.5), Some(5.1), Some(1.6)],
            ),
        ],
    ));
    let tabular = Arc::new(TabularTool::new(store.clone()));
    let chart = Arc::new(ChartTool::new(Arc::new(TextHistogramRenderer::new(
        store,
        std::env::temp_dir(),
    ))));

    let agents: Vec<Box<dyn Agent>> = vec![
        Box::new(TableLoadAgent::new(tabular.clone(), "iris_missingdata.csv")),
        Box::new(TableReportAgent::new(tabular, chart, "sepal_length")),
    ];
    let mut chat = GroupChat::new(
        "data-report",
        agents,
        ChatMode::RoundRobin,
        TerminationPolicy::max_iterations(10)?,
    )?;

    // One full cycle: fetcher then analyst.
    let record = chat.run_turns(2).await?;
    for turn in &record.turns {
        println!("[{}]\n{}\n", turn.agent, turn.payload().unwrap_or("<failed>"));
    }
    Ok(())
}
