//! Record sources.
//!
//! A [`RecordSource`] hands out the records of a collection in bounded
//! batches. An in-memory list and a paged store implement it the same way,
//! so the indexer never needs to know which one it is reading.

use std::collections::VecDeque;

use async_trait::async_trait;
use tracing::debug;

use crate::errors::IngestError;

/// Iterate all records of a collection in bounded batches.
///
/// An empty batch signals the end of the collection.
#[async_trait]
pub trait RecordSource: Send {
    type Record: Send;

    /// Return up to `batch_size` records.
    async fn next_batch(&mut self, batch_size: usize) -> Result<Vec<Self::Record>, IngestError>;
}

/// A finite, in-memory list of records.
#[derive(Debug, Clone)]
pub struct VecSource<T> {
    records: VecDeque<T>,
}

impl<T> VecSource<T> {
    pub fn new(records: Vec<T>) -> Self {
        Self {
            records: records.into(),
        }
    }

    pub fn remaining(&self) -> usize {
        self.records.len()
    }
}

impl<T> From<Vec<T>> for VecSource<T> {
    fn from(records: Vec<T>) -> Self {
        Self::new(records)
    }
}

#[async_trait]
impl<T: Send> RecordSource for VecSource<T> {
    type Record = T;

    async fn next_batch(&mut self, batch_size: usize) -> Result<Vec<T>, IngestError> {
        let count = batch_size.max(1).min(self.records.len());
        Ok(self.records.drain(..count).collect())
    }
}

/// Loads one page of a paged store, e.g. a database table read with
/// `LIMIT`/`OFFSET`.
#[async_trait]
pub trait PageLoader: Send + Sync {
    type Record: Send;

    async fn load_page(&self, offset: u64, limit: usize) -> Result<Vec<Self::Record>, IngestError>;
}

/// Adapts a [`PageLoader`] to [`RecordSource`], walking pages until one
/// comes back short.
pub struct PagedSource<L> {
    loader: L,
    offset: u64,
    finished: bool,
}

impl<L> PagedSource<L> {
    pub fn new(loader: L) -> Self {
        Self {
            loader,
            offset: 0,
            finished: false,
        }
    }
}

#[async_trait]
impl<L: PageLoader> RecordSource for PagedSource<L> {
    type Record = L::Record;

    async fn next_batch(&mut self, batch_size: usize) -> Result<Vec<L::Record>, IngestError> {
        if self.finished {
            return Ok(Vec::new());
        }

        let batch_size = batch_size.max(1);
        let page = self.loader.load_page(self.offset, batch_size).await?;
        debug!(offset = self.offset, count = page.len(), "Loaded page");

        self.offset += page.len() as u64;
        if page.len() < batch_size {
            self.finished = true;
        }
        Ok(page)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};

    struct NumberTable {
        rows: Vec<u32>,
        calls: AtomicUsize,
    }

    #[async_trait]
    impl PageLoader for NumberTable {
        type Record = u32;

        async fn load_page(&self, offset: u64, limit: usize) -> Result<Vec<u32>, IngestError> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            Ok(self
                .rows
                .iter()
                .skip(offset as usize)
                .take(limit)
                .copied()
                .collect())
        }
    }

    #[tokio::test]
    async fn test_vec_source_batches() {
        let mut source = VecSource::new(vec![1, 2, 3, 4, 5]);

        assert_eq!(source.next_batch(2).await.unwrap(), vec![1, 2]);
        assert_eq!(source.next_batch(2).await.unwrap(), vec![3, 4]);
        assert_eq!(source.next_batch(2).await.unwrap(), vec![5]);
        assert!(source.next_batch(2).await.unwrap().is_empty());
        assert_eq!(source.remaining(), 0);
    }

    #[tokio::test]
    async fn test_paged_source_stops_on_short_page() {
        let mut source = PagedSource::new(NumberTable {
            rows: (1..=5).collect(),
            calls: AtomicUsize::new(0),
        });

        let mut seen = Vec::new();
        loop {
            let batch = source.next_batch(2).await.unwrap();
            if batch.is_empty() {
                break;
            }
            seen.extend(batch);
        }

        assert_eq!(seen, vec![1, 2, 3, 4, 5]);
        assert_eq!(source.loader.calls.load(Ordering::SeqCst), 3);
    }

    #[tokio::test]
    async fn test_paged_source_exact_multiple_reads_one_empty_page() {
        let mut source = PagedSource::new(NumberTable {
            rows: (1..=4).collect(),
            calls: AtomicUsize::new(0),
        });

        assert_eq!(source.next_batch(2).await.unwrap().len(), 2);
        assert_eq!(source.next_batch(2).await.unwrap().len(), 2);
        assert!(source.next_batch(2).await.unwrap().is_empty());
        assert!(source.next_batch(2).await.unwrap().is_empty());
        assert_eq!(source.loader.calls.load(Ordering::SeqCst), 3);
    }
}
