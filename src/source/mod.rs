//! Data source abstractions for batched row retrieval
//!
//! The export pipeline pulls rows through a [`BatchCursor`], which hides the
//! two supported fetch strategies behind one "next batch or end" contract:
//!
//! - a **streaming cursor**: any [`RowStream`] of page-sized row vectors,
//!   advanced one step per call;
//! - a **paginated provider**: a [`PaginatedProvider`] walked page by page,
//!   with zero-pagination meaning "exactly one batch containing everything".
//!
//! The strategy is selected lazily on the first fetch; the streaming
//! capability takes precedence when both are configured.

use async_trait::async_trait;
use futures::TryStreamExt;
use futures::stream::BoxStream;
use serde_json::Value;
use tracing::debug;

use crate::error::{ConfigError, Result};

/// Streaming cursor capability: a stream of page-sized row vectors.
pub type RowStream = BoxStream<'static, Result<Vec<Value>>>;

/// One page-sized group of rows fetched in a single retrieval call.
///
/// `keys` may be empty, in which case downstream consumers fall back to
/// batch-local row positions as synthetic keys.
#[derive(Debug, Clone)]
pub struct Batch {
    pub models: Vec<Value>,
    pub keys: Vec<Value>,
}

/// Pagination facts reported by a provider.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Pagination {
    pub page_count: usize,
}

/// Paginated data source capability.
///
/// The cursor drives the provider: it sets the page, forces a re-fetch and
/// reads the page's models and keys. A provider reporting no pagination (or
/// zero pages) is read exactly once.
#[async_trait]
pub trait PaginatedProvider: Send {
    /// Fetch or re-fetch the current page's data.
    async fn prepare(&mut self, force_refetch: bool) -> Result<()>;

    /// Models of the current page.
    fn models(&self) -> Vec<Value>;

    /// Keys of the current page, parallel to [`Self::models`].
    fn keys(&self) -> Vec<Value>;

    /// Pagination facts, or `None` when the source is not paginated.
    fn pagination(&self) -> Option<Pagination>;

    /// Select the zero-based page for the next [`Self::prepare`] call.
    fn set_page(&mut self, page: usize);
}

enum CursorState {
    Pending {
        stream: Option<RowStream>,
        provider: Option<Box<dyn PaginatedProvider>>,
    },
    Stream {
        stream: RowStream,
        fetched: u64,
    },
    Paged {
        provider: Box<dyn PaginatedProvider>,
        page: usize,
    },
    Done,
}

/// Incremental batch retrieval over either source capability.
///
/// Once the underlying source is exhausted (or fails), the cursor latches
/// and every further call returns `None`.
pub struct BatchCursor {
    state: CursorState,
}

impl BatchCursor {
    /// Create a cursor over the configured capabilities.
    ///
    /// Strategy selection happens on the first [`Self::next_batch`] call;
    /// a stream takes precedence over a provider.
    pub fn new(stream: Option<RowStream>, provider: Option<Box<dyn PaginatedProvider>>) -> Self {
        Self {
            state: CursorState::Pending { stream, provider },
        }
    }

    /// Fetch the next batch of rows, or `None` once the source is exhausted.
    ///
    /// # Errors
    /// * `ConfigError::MissingSource` when neither capability was configured
    /// * any error surfaced by the underlying source
    pub async fn next_batch(&mut self) -> Result<Option<Batch>> {
        loop {
            match std::mem::replace(&mut self.state, CursorState::Done) {
                CursorState::Pending { stream, provider } => {
                    self.state = if let Some(stream) = stream {
                        debug!("Batch cursor using streaming strategy");
                        CursorState::Stream { stream, fetched: 0 }
                    } else if let Some(provider) = provider {
                        debug!("Batch cursor using paginated provider strategy");
                        CursorState::Paged { provider, page: 0 }
                    } else {
                        return Err(ConfigError::MissingSource.into());
                    };
                }
                CursorState::Stream { mut stream, fetched } => {
                    match stream.try_next().await {
                        Ok(Some(models)) => {
                            let fetched = fetched + models.len() as u64;
                            debug!("Fetched batch of {} rows (total: {})", models.len(), fetched);
                            self.state = CursorState::Stream { stream, fetched };
                            return Ok(Some(Batch {
                                models,
                                keys: Vec::new(),
                            }));
                        }
                        Ok(None) => {
                            debug!("Row stream exhausted after {} rows", fetched);
                            return Ok(None);
                        }
                        // State stays Done so the failure latches
                        Err(e) => return Err(e),
                    }
                }
                CursorState::Paged { mut provider, page } => match provider.pagination() {
                    None | Some(Pagination { page_count: 0 }) => {
                        if page > 0 {
                            return Ok(None);
                        }
                        provider.prepare(false).await?;
                        let batch = Batch {
                            models: provider.models(),
                            keys: provider.keys(),
                        };
                        debug!("Fetched single unpaginated batch of {} rows", batch.models.len());
                        self.state = CursorState::Paged { provider, page: 1 };
                        return Ok(Some(batch));
                    }
                    Some(pagination) => {
                        if page >= pagination.page_count {
                            debug!("Paginated provider exhausted after {} pages", page);
                            return Ok(None);
                        }
                        provider.set_page(page);
                        provider.prepare(true).await?;
                        let batch = Batch {
                            models: provider.models(),
                            keys: provider.keys(),
                        };
                        debug!(
                            "Fetched page {}/{} with {} rows",
                            page + 1,
                            pagination.page_count,
                            batch.models.len()
                        );
                        self.state = CursorState::Paged {
                            provider,
                            page: page + 1,
                        };
                        return Ok(Some(batch));
                    }
                },
                CursorState::Done => return Ok(None),
            }
        }
    }
}

/// In-memory paginated provider over a row vector.
///
/// Keys are the global row indices. A `page_size` of zero disables
/// pagination, so the whole vector is served as one batch.
pub struct VecProvider {
    rows: Vec<Value>,
    page_size: usize,
    page: usize,
}

impl VecProvider {
    pub fn new(rows: Vec<Value>, page_size: usize) -> Self {
        Self {
            rows,
            page_size,
            page: 0,
        }
    }

    fn page_bounds(&self) -> (usize, usize) {
        if self.page_size == 0 {
            return (0, self.rows.len());
        }
        let start = (self.page * self.page_size).min(self.rows.len());
        let end = (start + self.page_size).min(self.rows.len());
        (start, end)
    }
}

#[async_trait]
impl PaginatedProvider for VecProvider {
    async fn prepare(&mut self, _force_refetch: bool) -> Result<()> {
        Ok(())
    }

    fn models(&self) -> Vec<Value> {
        let (start, end) = self.page_bounds();
        self.rows[start..end].to_vec()
    }

    fn keys(&self) -> Vec<Value> {
        let (start, end) = self.page_bounds();
        (start..end).map(|i| Value::from(i as u64)).collect()
    }

    fn pagination(&self) -> Option<Pagination> {
        if self.page_size == 0 {
            return None;
        }
        Some(Pagination {
            page_count: self.rows.len().div_ceil(self.page_size),
        })
    }

    fn set_page(&mut self, page: usize) {
        self.page = page;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use futures::StreamExt;
    use serde_json::json;

    fn stream_of(batches: Vec<Vec<Value>>) -> RowStream {
        futures::stream::iter(batches.into_iter().map(Ok)).boxed()
    }

    #[tokio::test]
    async fn test_stream_strategy() {
        let batches = vec![vec![json!({"id": 1}), json!({"id": 2})], vec![json!({"id": 3})]];
        let mut cursor = BatchCursor::new(Some(stream_of(batches)), None);

        let first = cursor.next_batch().await.unwrap().unwrap();
        assert_eq!(first.models.len(), 2);
        assert!(first.keys.is_empty());

        let second = cursor.next_batch().await.unwrap().unwrap();
        assert_eq!(second.models.len(), 1);

        assert!(cursor.next_batch().await.unwrap().is_none());
        // Exhaustion latches
        assert!(cursor.next_batch().await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_stream_takes_precedence_over_provider() {
        let stream = stream_of(vec![vec![json!({"from": "stream"})]]);
        let provider = VecProvider::new(vec![json!({"from": "provider"})], 10);
        let mut cursor = BatchCursor::new(Some(stream), Some(Box::new(provider)));

        let batch = cursor.next_batch().await.unwrap().unwrap();
        assert_eq!(batch.models[0]["from"], "stream");
    }

    #[tokio::test]
    async fn test_provider_paging() {
        let rows: Vec<Value> = (0..5).map(|i| json!({"id": i})).collect();
        let mut cursor = BatchCursor::new(None, Some(Box::new(VecProvider::new(rows, 2))));

        let mut sizes = Vec::new();
        while let Some(batch) = cursor.next_batch().await.unwrap() {
            assert_eq!(batch.keys.len(), batch.models.len());
            sizes.push(batch.models.len());
        }
        assert_eq!(sizes, vec![2, 2, 1]);
        assert!(cursor.next_batch().await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_provider_keys_are_global_indices() {
        let rows: Vec<Value> = (0..4).map(|i| json!({"id": i})).collect();
        let mut cursor = BatchCursor::new(None, Some(Box::new(VecProvider::new(rows, 3))));

        cursor.next_batch().await.unwrap().unwrap();
        let second = cursor.next_batch().await.unwrap().unwrap();
        assert_eq!(second.keys, vec![json!(3)]);
    }

    #[tokio::test]
    async fn test_unpaginated_provider_single_batch() {
        let rows: Vec<Value> = (0..7).map(|i| json!({"id": i})).collect();
        let mut cursor = BatchCursor::new(None, Some(Box::new(VecProvider::new(rows, 0))));

        let batch = cursor.next_batch().await.unwrap().unwrap();
        assert_eq!(batch.models.len(), 7);
        assert!(cursor.next_batch().await.unwrap().is_none());
        assert!(cursor.next_batch().await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_empty_provider_with_pagination() {
        // Zero rows means zero pages, which is read as one empty batch
        let mut cursor = BatchCursor::new(None, Some(Box::new(VecProvider::new(Vec::new(), 10))));

        let batch = cursor.next_batch().await.unwrap().unwrap();
        assert!(batch.models.is_empty());
        assert!(cursor.next_batch().await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_missing_source() {
        let mut cursor = BatchCursor::new(None, None);
        let err = cursor.next_batch().await.unwrap_err();
        assert!(matches!(
            err,
            crate::error::ExportError::Config(ConfigError::MissingSource)
        ));
        // Failure latches as end
        assert!(cursor.next_batch().await.unwrap().is_none());
    }
}
