//! Tabular-data and chart adapters.
//!
//! Dataframe engines and plotting libraries are external collaborators, so
//! this module defines their boundary traits — [`TableStore`] and
//! [`ChartRenderer`] — and the [`ToolAdapter`]s that expose them:
//!
//! - [`TabularTool`]: `load {path}` → `{handle, preview}`,
//!   `describe {handle}` → `{summary}`,
//!   `drop_missing {handle}` → `{status, dropped}`
//! - [`ChartTool`]: `plot_histogram {handle, column}` → `{artifact_path}`
//!
//! Two small in-memory implementations ship for demos and tests:
//! [`StaticTableStore`], which serves caller-registered numeric columns
//! (it parses nothing), and [`TextHistogramRenderer`], which writes a
//! bucket-count text artifact. Production callers plug in their own
//! engine behind the traits.

use crate::chorus::tool::{ToolAdapter, ToolFailure, ToolOutcome, ToolRequest};
use async_trait::async_trait;
use serde_json::json;
use std::collections::HashMap;
use std::path::PathBuf;
use std::sync::{Arc, Mutex};
use std::time::Duration;

const DEFAULT_TIMEOUT: Duration = Duration::from_secs(30);

/// A loaded table: its handle plus a short textual preview.
#[derive(Debug, Clone)]
pub struct TablePreview {
    /// Opaque handle later operations refer to.
    pub handle: String,
    /// First rows, formatted for humans.
    pub preview: String,
}

/// Boundary trait for a tabular-data engine.
#[async_trait]
pub trait TableStore: Send + Sync {
    /// Load the table at `path` and return its handle and a preview.
    async fn load(&self, path: &str) -> Result<TablePreview, ToolFailure>;

    /// Summary statistics for a loaded table.
    async fn describe(&self, handle: &str) -> Result<String, ToolFailure>;

    /// Drop rows with missing values; returns how many rows went.
    async fn drop_missing(&self, handle: &str) -> Result<usize, ToolFailure>;
}

/// Boundary trait for a chart backend.
#[async_trait]
pub trait ChartRenderer: Send + Sync {
    /// Render a histogram of one column and return the artifact path.
    async fn plot_histogram(&self, handle: &str, column: &str) -> Result<PathBuf, ToolFailure>;
}

/// Exposes a [`TableStore`] as a [`ToolAdapter`].
pub struct TabularTool {
    store: Arc<dyn TableStore>,
    timeout: Duration,
}

impl TabularTool {
    /// Wrap a store with the default deadline.
    pub fn new(store: Arc<dyn TableStore>) -> Self {
        Self {
            store,
            timeout: DEFAULT_TIMEOUT,
        }
    }

    /// Override the per-call deadline (builder pattern).
    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    fn required<'a>(params: &'a serde_json::Value, key: &str) -> Result<&'a str, ToolFailure> {
        params[key]
            .as_str()
            .ok_or_else(|| ToolFailure::InvalidInput(format!("missing string parameter '{}'", key)))
    }
}

#[async_trait]
impl ToolAdapter for TabularTool {
    fn name(&self) -> &str {
        "tabular"
    }

    async fn call(&self, request: ToolRequest) -> ToolOutcome {
        let deadline = self.timeout;
        match request.operation.as_str() {
            "load" => {
                let path = Self::required(&request.params, "path")?;
                let table = tokio::time::timeout(deadline, self.store.load(path))
                    .await
                    .map_err(|_| ToolFailure::Timeout(format!("load of '{}'", path)))??;
                Ok(json!({ "handle": table.handle, "preview": table.preview }))
            }
            "describe" => {
                let handle = Self::required(&request.params, "handle")?;
                let summary = tokio::time::timeout(deadline, self.store.describe(handle))
                    .await
                    .map_err(|_| ToolFailure::Timeout(format!("describe of '{}'", handle)))??;
                Ok(json!({ "summary": summary }))
            }
            "drop_missing" => {
                let handle = Self::required(&request.params, "handle")?;
                let dropped = tokio::time::timeout(deadline, self.store.drop_missing(handle))
                    .await
                    .map_err(|_| ToolFailure::Timeout(format!("drop_missing of '{}'", handle)))??;
                Ok(json!({ "status": "missing values dropped", "dropped": dropped }))
            }
            other => Err(ToolFailure::InvalidInput(format!(
                "tabular has no operation '{}'",
                other
            ))),
        }
    }
}

/// Exposes a [`ChartRenderer`] as a [`ToolAdapter`].
pub struct ChartTool {
    renderer: Arc<dyn ChartRenderer>,
    timeout: Duration,
}

impl ChartTool {
    /// Wrap a renderer with the default deadline.
    pub fn new(renderer: Arc<dyn ChartRenderer>) -> Self {
        Self {
            renderer,
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
impl ToolAdapter for ChartTool {
    fn name(&self) -> &str {
        "chart"
    }

    async fn call(&self, request: ToolRequest) -> ToolOutcome {
        if request.operation != "plot_histogram" {
            return Err(ToolFailure::InvalidInput(format!(
                "chart has no operation '{}'",
                request.operation
            )));
        }
        let handle = request.params["handle"]
            .as_str()
            .ok_or_else(|| ToolFailure::InvalidInput("missing string parameter 'handle'".into()))?;
        let column = request.params["column"]
            .as_str()
            .ok_or_else(|| ToolFailure::InvalidInput("missing string parameter 'column'".into()))?;

        let artifact = tokio::time::timeout(
            self.timeout,
            self.renderer.plot_histogram(handle, column),
        )
        .await
        .map_err(|_| ToolFailure::Timeout(format!("histogram of '{}'", column)))??;
        Ok(json!({ "artifact_path": artifact.display().to_string() }))
    }
}

type Columns = Vec<(String, Vec<Option<f64>>)>;

/// In-memory [`TableStore`] over caller-registered numeric columns.
///
/// Nothing is parsed from disk: tables are registered up front with
/// [`with_table`](Self::with_table) and `load(path)` resolves the
/// registered entry, using the path itself as the handle. Missing cells are
/// `None`.
#[derive(Default)]
pub struct StaticTableStore {
    tables: Mutex<HashMap<String, Columns>>,
}

impl StaticTableStore {
    /// Create an empty store.
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a table under a path (builder pattern). Columns must share
    /// one length.
    pub fn with_table(self, path: impl Into<String>, columns: Columns) -> Self {
        if let Ok(mut tables) = self.tables.lock() {
            tables.insert(path.into(), columns);
        }
        self
    }

    /// Non-missing values of one column, for renderers.
    pub fn column(&self, handle: &str, column: &str) -> Option<Vec<f64>> {
        let tables = self.tables.lock().ok()?;
        let table = tables.get(handle)?;
        let (_, cells) = table.iter().find(|(name, _)| name == column)?;
        Some(cells.iter().filter_map(|cell| *cell).collect())
    }

    fn row_count(columns: &Columns) -> usize {
        columns.first().map(|(_, cells)| cells.len()).unwrap_or(0)
    }
}

#[async_trait]
impl TableStore for StaticTableStore {
    async fn load(&self, path: &str) -> Result<TablePreview, ToolFailure> {
        let tables = self
            .tables
            .lock()
            .map_err(|_| ToolFailure::NonZeroStatus("table store poisoned".into()))?;
        let table = tables
            .get(path)
            .ok_or_else(|| ToolFailure::InvalidInput(format!("no table registered at '{}'", path)))?;

        let header: Vec<&str> = table.iter().map(|(name, _)| name.as_str()).collect();
        let mut preview = header.join("  ");
        for row in 0..Self::row_count(table).min(5) {
            let cells: Vec<String> = table
                .iter()
                .map(|(_, cells)| match cells.get(row) {
                    Some(Some(value)) => format!("{}", value),
                    _ => "NaN".to_string(),
                })
                .collect();
            preview.push('\n');
            preview.push_str(&cells.join("  "));
        }
        Ok(TablePreview {
            handle: path.to_string(),
            preview,
        })
    }

    async fn describe(&self, handle: &str) -> Result<String, ToolFailure> {
        let tables = self
            .tables
            .lock()
            .map_err(|_| ToolFailure::NonZeroStatus("table store poisoned".into()))?;
        let table = tables
            .get(handle)
            .ok_or_else(|| ToolFailure::InvalidInput(format!("unknown handle '{}'", handle)))?;

        let mut summary = String::new();
        for (name, cells) in table {
            let values: Vec<f64> = cells.iter().filter_map(|cell| *cell).collect();
            if values.is_empty() {
                summary.push_str(&format!("{}: count=0\n", name));
                continue;
            }
            let count = values.len();
            let mean = values.iter().sum::<f64>() / count as f64;
            let min = values.iter().cloned().fold(f64::INFINITY, f64::min);
            let max = values.iter().cloned().fold(f64::NEG_INFINITY, f64::max);
            summary.push_str(&format!(
                "{}: count={} mean={:.3} min={:.3} max={:.3}\n",
                name, count, mean, min, max
            ));
        }
        Ok(summary)
    }

    async fn drop_missing(&self, handle: &str) -> Result<usize, ToolFailure> {
        let mut tables = self
            .tables
            .lock()
            .map_err(|_| ToolFailure::NonZeroStatus("table store poisoned".into()))?;
        let table = tables
            .get_mut(handle)
            .ok_or_else(|| ToolFailure::InvalidInput(format!("unknown handle '{}'", handle)))?;

        let rows = Self::row_count(table);
        let keep: Vec<bool> = (0..rows)
            .map(|row| table.iter().all(|(_, cells)| cells[row].is_some()))
            .collect();
        for (_, cells) in table.iter_mut() {
            let mut row = 0;
            cells.retain(|_| {
                let kept = keep[row];
                row += 1;
                kept
            });
        }
        Ok(keep.iter().filter(|kept| !**kept).count())
    }
}

/// [`ChartRenderer`] that writes a plain-text bucket histogram.
pub struct TextHistogramRenderer {
    store: Arc<StaticTableStore>,
    out_dir: PathBuf,
    buckets: usize,
}

impl TextHistogramRenderer {
    /// Render histograms of columns served by `store` into `out_dir`.
    pub fn new(store: Arc<StaticTableStore>, out_dir: PathBuf) -> Self {
        Self {
            store,
            out_dir,
            buckets: 10,
        }
    }

    /// Override the bucket count (builder pattern).
    pub fn with_buckets(mut self, buckets: usize) -> Self {
        self.buckets = buckets.max(1);
        self
    }
}

#[async_trait]
impl ChartRenderer for TextHistogramRenderer {
    async fn plot_histogram(&self, handle: &str, column: &str) -> Result<PathBuf, ToolFailure> {
        let values = self.store.column(handle, column).ok_or_else(|| {
            ToolFailure::InvalidInput(format!("no column '{}' in '{}'", column, handle))
        })?;
        if values.is_empty() {
            return Err(ToolFailure::InvalidInput(format!(
                "column '{}' has no values",
                column
            )));
        }

        let min = values.iter().cloned().fold(f64::INFINITY, f64::min);
        let max = values.iter().cloned().fold(f64::NEG_INFINITY, f64::max);
        let width = ((max - min) / self.buckets as f64).max(f64::EPSILON);

        let mut counts = vec![0usize; self.buckets];
        for value in &values {
            let bucket = (((value - min) / width) as usize).min(self.buckets - 1);
            counts[bucket] += 1;
        }

        let mut body = format!("histogram of {}\n", column);
        for (index, count) in counts.iter().enumerate() {
            let lo = min + width * index as f64;
            body.push_str(&format!(
                "{:>10.3} .. {:>10.3} | {}\n",
                lo,
                lo + width,
                "#".repeat(*count)
            ));
        }

        let path = self.out_dir.join(format!("{}_histogram.txt", column));
        tokio::fs::write(&path, body).await.map_err(|e| {
            ToolFailure::NonZeroStatus(format!("could not write {}: {}", path.display(), e))
        })?;
        Ok(path)
    }
}
