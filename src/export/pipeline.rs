//! Export pipeline orchestration
//!
//! [`CsvGrid`] pulls batches from a [`BatchCursor`], resolves columns on the
//! first non-empty batch, renders header/body/footer cell rows and appends
//! them to output files obtained from an [`ExportResult`], rotating files
//! when the per-file row limit is reached. The pipeline is a single-task
//! pull loop: each batch is fully consumed before the next one is fetched,
//! so peak memory stays bounded to one batch plus one open file handle.

use std::sync::Arc;
use std::time::Instant;

use serde_json::Value;
use tracing::{debug, info};

use crate::column::{Column, ColumnSpec, RenderContext, resolve_columns};
use crate::config::ExportConfig;
use crate::error::Result;
use crate::format::{LabelSource, RawFormatter, ValueFormatter};
use crate::source::{BatchCursor, PaginatedProvider, RowStream, VecProvider};

use super::progress::ProgressTracker;
use super::result::{Archiver, ExportResult};

/// Streaming CSV export of a batched data source.
///
/// Configure columns, source and output settings with the builder methods,
/// then call [`CsvGrid::export`].
///
/// # Example
///
/// ```no_run
/// use csvgrid::{CsvGrid, Result};
/// use serde_json::json;
///
/// # async fn run() -> Result<()> {
/// let rows = vec![
///     json!({"id": 1, "name": "Alice"}),
///     json!({"id": 2, "name": "Bob"}),
/// ];
/// let mut result = CsvGrid::new().with_rows(rows).export().await?;
/// let artifact = result.result_path().await?;
/// # Ok(())
/// # }
/// ```
pub struct CsvGrid {
    config: ExportConfig,
    columns: Vec<ColumnSpec>,
    formatter: Arc<dyn ValueFormatter>,
    labels: Option<Arc<dyn LabelSource>>,
    archiver: Option<Box<dyn Archiver>>,
    stream: Option<RowStream>,
    provider: Option<Box<dyn PaginatedProvider>>,
    show_progress: bool,
}

impl CsvGrid {
    pub fn new() -> Self {
        Self::from_config(ExportConfig::default())
    }

    pub fn from_config(config: ExportConfig) -> Self {
        Self {
            config,
            columns: Vec::new(),
            formatter: Arc::new(RawFormatter),
            labels: None,
            archiver: None,
            stream: None,
            provider: None,
            show_progress: false,
        }
    }

    /// Declare the export columns. With no declared columns, one data
    /// column per key of the first row is derived automatically.
    pub fn with_columns(mut self, specs: Vec<ColumnSpec>) -> Self {
        self.columns = specs;
        self
    }

    /// Append one column spec.
    pub fn with_column(mut self, spec: impl Into<ColumnSpec>) -> Self {
        self.columns.push(spec.into());
        self
    }

    /// Use a streaming cursor source. Takes precedence over a provider.
    pub fn with_stream(mut self, stream: RowStream) -> Self {
        self.stream = Some(stream);
        self
    }

    /// Use a paginated provider source.
    pub fn with_provider(mut self, provider: impl PaginatedProvider + 'static) -> Self {
        self.provider = Some(Box::new(provider));
        self
    }

    /// Use an in-memory row vector source, paged by the configured batch
    /// size.
    pub fn with_rows(self, rows: Vec<Value>) -> Self {
        let batch_size = self.config.batch_size;
        self.with_provider(VecProvider::new(rows, batch_size))
    }

    /// Substitute the value formatter applied to data cells.
    pub fn with_formatter(mut self, formatter: impl ValueFormatter + 'static) -> Self {
        self.formatter = Arc::new(formatter);
        self
    }

    /// Supply an attribute-label source for header derivation.
    pub fn with_labels(mut self, labels: impl LabelSource + 'static) -> Self {
        self.labels = Some(Arc::new(labels));
        self
    }

    /// Substitute the archive strategy of the export result.
    pub fn with_archiver(mut self, archiver: Box<dyn Archiver>) -> Self {
        self.archiver = Some(archiver);
        self
    }

    /// Display a progress spinner while exporting.
    pub fn with_progress(mut self, enabled: bool) -> Self {
        self.show_progress = enabled;
        self
    }

    pub fn with_batch_size(mut self, batch_size: usize) -> Self {
        self.config.batch_size = batch_size;
        self
    }

    pub fn with_max_entries_per_file(mut self, limit: Option<usize>) -> Self {
        self.config.max_entries_per_file = limit;
        self
    }

    pub fn with_show_header(mut self, show_header: bool) -> Self {
        self.config.show_header = show_header;
        self
    }

    pub fn with_show_footer(mut self, show_footer: bool) -> Self {
        self.config.show_footer = show_footer;
        self
    }

    /// Run the export and return its result.
    ///
    /// An empty data source yields a result with zero output files and no
    /// artifact. On failure, files written so far stay on disk until the
    /// result (created internally) is dropped or cleaned up.
    pub async fn export(mut self) -> Result<ExportResult> {
        self.config.validate()?;
        let start_time = Instant::now();
        info!("Starting CSV export");

        let mut result = ExportResult::new(&self.config.result);
        if let Some(archiver) = self.archiver.take() {
            result = result.with_archiver(archiver);
        }

        let mut cursor = BatchCursor::new(self.stream.take(), self.provider.take());
        let tracker = ProgressTracker::new(self.show_progress);
        let ctx = RenderContext {
            empty_cell: &self.config.empty_cell,
            null_display: &self.config.null_display,
            formatter: self.formatter.as_ref(),
            labels: self.labels.as_deref(),
        };

        let mut specs = Some(std::mem::take(&mut self.columns));
        let mut columns: Option<Vec<Box<dyn Column>>> = None;
        let mut row_index: usize = 0;
        let mut rows_in_file: usize = 0;
        let mut file_open = false;
        let mut header_written = false;
        let mut batch_count = 0u32;

        while let Some(batch) = cursor.next_batch().await? {
            batch_count += 1;
            debug!("Processing batch #{} ({} rows)", batch_count, batch.models.len());

            if columns.is_none() {
                if let Some(first_row) = batch.models.first() {
                    columns = Some(resolve_columns(
                        specs.take().unwrap_or_default(),
                        first_row,
                    )?);
                }
            }
            let Some(resolved) = columns.as_deref() else {
                // Batch without rows; columns stay unresolved
                continue;
            };

            for (position, model) in batch.models.iter().enumerate() {
                let key = batch
                    .keys
                    .get(position)
                    .cloned()
                    .unwrap_or_else(|| Value::from(position as u64));

                if !file_open {
                    let file = result.new_csv_file(&self.config.csv);
                    file_open = true;
                    rows_in_file = 0;
                    if self.config.show_header && (self.config.repeat_header || !header_written) {
                        let header = compose_header_row(resolved, &ctx);
                        file.write_row(&header).await?;
                        header_written = true;
                    }
                }

                let cells = compose_body_row(resolved, model, &key, row_index, &ctx);
                // file_open guarantees a current file
                if let Some(file) = result.current_file_mut() {
                    file.write_row(&cells).await?;
                    row_index += 1;
                    rows_in_file += 1;

                    if let Some(limit) = self.config.max_entries_per_file {
                        if rows_in_file >= limit {
                            debug!("Rotating output file after {} rows", rows_in_file);
                            file.close().await?;
                            file_open = false;
                        }
                    }
                }
            }

            // Batch dropped here; nothing further to reclaim
            tracker.update(row_index as u64);
        }

        if file_open {
            if let Some(file) = result.current_file_mut() {
                if self.config.show_footer {
                    if let Some(resolved) = columns.as_deref() {
                        let footer = compose_footer_row(resolved, &ctx);
                        file.write_row(&footer).await?;
                    }
                }
                file.close().await?;
            }
        }

        tracker.finish();
        info!(
            "Export completed: {} rows, {} files, {} ms",
            row_index,
            result.file_count(),
            start_time.elapsed().as_millis()
        );
        Ok(result)
    }
}

impl Default for CsvGrid {
    fn default() -> Self {
        Self::new()
    }
}

fn compose_header_row(columns: &[Box<dyn Column>], ctx: &RenderContext<'_>) -> Vec<String> {
    columns.iter().map(|c| c.render_header(ctx)).collect()
}

fn compose_footer_row(columns: &[Box<dyn Column>], ctx: &RenderContext<'_>) -> Vec<String> {
    columns.iter().map(|c| c.render_footer(ctx)).collect()
}

fn compose_body_row(
    columns: &[Box<dyn Column>],
    model: &Value,
    key: &Value,
    index: usize,
    ctx: &RenderContext<'_>,
) -> Vec<String> {
    columns
        .iter()
        .map(|c| c.render_body(model, key, index, ctx))
        .collect()
}
