//! # Chunk Scheduler
//!
//! Splits one category's changes into size-bounded, order-preserving slices and builds one
//! fresh atomic unit per slice, all slices in parallel. Bounding the slice size bounds how
//! long any single commit holds its locks.

use super::unit_scheduler::UnitScheduler;
use crate::category::Category;
use crate::error::{Result, StagingError, TaskLabel};
use crate::options::ImportOptions;
use crate::registry::ChangesRegistry;
use tracing::{debug, info, instrument};

impl UnitScheduler {
    /// Pop `category` and build one unit per chunk of at most `chunk_size` changes.
    ///
    /// An absent category yields no units and returns the registry unchanged. Units come back
    /// in completion order. Any crashed chunk, or any chunk unfinished when the join budget
    /// elapses, fails the whole call.
    #[instrument(skip_all, fields(category = %category, chunk_size = chunk_size))]
    pub async fn chunk_every<C: Category>(
        &self,
        registry: ChangesRegistry<C>,
        category: C,
        chunk_size: usize,
        options: &ImportOptions,
    ) -> Result<(Vec<C::Unit>, ChangesRegistry<C>)> {
        if chunk_size == 0 {
            return Err(StagingError::configuration(format!(
                "chunk size for {category} must be greater than zero"
            )));
        }

        let (changes, remaining) = registry.pop(&category);
        let Some(changes) = changes else {
            debug!("No pending changes, skipping");
            return Ok((Vec::new(), remaining));
        };

        let change_count = changes.len();
        let mut tasks = self.task_group::<C::Unit>();

        for (index, chunk) in into_chunks(changes, chunk_size).into_iter().enumerate() {
            let options = options.clone();
            tasks.spawn(TaskLabel::chunk(category, index), async move {
                category.execute(C::Unit::default(), chunk, &options).await
            });
        }

        let dispatched = tasks.len();
        debug!(change_count, chunk_size, dispatched, "Dispatched chunk tasks");

        let units = tasks.join(self.join_timeout()).await?;

        info!(change_count, units = units.len(), "Chunked category staged");
        Ok((units, remaining))
    }
}

/// Consecutive slices of at most `size` items; only the last may be shorter.
pub(crate) fn into_chunks<T>(items: Vec<T>, size: usize) -> Vec<Vec<T>> {
    debug_assert!(size > 0);
    let mut chunks = Vec::with_capacity(items.len().div_ceil(size));
    let mut current = Vec::with_capacity(size.min(items.len()));

    for item in items {
        current.push(item);
        if current.len() == size {
            chunks.push(std::mem::replace(&mut current, Vec::with_capacity(size)));
        }
    }
    if !current.is_empty() {
        chunks.push(current);
    }

    chunks
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_into_chunks_sizes() {
        let chunks = into_chunks((1..=10).collect(), 4);
        assert_eq!(chunks, vec![vec![1, 2, 3, 4], vec![5, 6, 7, 8], vec![9, 10]]);
    }

    #[test]
    fn test_into_chunks_exact_multiple() {
        let chunks = into_chunks(vec!['a', 'b', 'c', 'd'], 2);
        assert_eq!(chunks, vec![vec!['a', 'b'], vec!['c', 'd']]);
    }

    #[test]
    fn test_into_chunks_empty_list_has_no_chunks() {
        assert!(into_chunks(Vec::<u8>::new(), 3).is_empty());
    }

    #[test]
    fn test_into_chunks_larger_than_list() {
        assert_eq!(into_chunks(vec![1, 2], 50), vec![vec![1, 2]]);
    }
}
