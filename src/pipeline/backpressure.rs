//! Bounded-group batch processing with retry/backoff (spec §5 "Backpressure"): batch
//! operations against C3 are processed in bounded-size groups; a retryable error retries
//! the group with exponential backoff up to a small fixed bound, then fails the stage.
//!
//! Grounded on the teacher's worker-pool idiom in `performance/concurrent_operations.rs`
//! (bounded units of work dispatched to a fixed-size pool) generalized here to retry
//! semantics rather than thread dispatch, since C3 in this crate is in-process rather than
//! a remote service with its own queueing.

use std::thread;
use std::time::Duration;

use crate::error::VectorError;
use crate::vector::{VectorDocument, VectorStore};

/// Default group size for chunk upserts (spec §5: "processed in bounded-size groups").
pub const DEFAULT_GROUP_SIZE: usize = 64;
/// Small fixed retry bound (spec §5: "retries... up to a small fixed bound, then fails").
const MAX_RETRIES: u32 = 3;
const INITIAL_BACKOFF: Duration = Duration::from_millis(50);

fn is_retryable(error: &VectorError) -> bool {
    matches!(error, VectorError::BackendUnavailable(_))
}

/// Upserts `documents` in groups of `group_size`, retrying each group with exponential
/// backoff on a retryable error. Returns the total count upserted across all groups, or
/// the first non-retryable (or retry-exhausted) error, at which point the remaining
/// groups are not attempted — the caller's stage fails as a whole (spec §5: "then fails
/// the stage").
pub fn upsert_in_groups(
    vector: &mut dyn VectorStore,
    documents: Vec<VectorDocument>,
    group_size: usize,
) -> Result<usize, VectorError> {
    let mut total = 0;
    for group in documents.chunks(group_size.max(1)) {
        let mut attempt = 0;
        let mut backoff = INITIAL_BACKOFF;
        loop {
            match vector.upsert_batch(group.to_vec()) {
                Ok(count) => {
                    total += count;
                    break;
                }
                Err(e) if is_retryable(&e) && attempt < MAX_RETRIES => {
                    attempt += 1;
                    thread::sleep(backoff);
                    backoff *= 2;
                }
                Err(e) => return Err(e),
            }
        }
    }
    Ok(total)
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;
    use std::collections::HashMap;
    use std::sync::atomic::{AtomicUsize, Ordering};

    struct FlakyStore {
        fail_until: AtomicUsize,
        calls: AtomicUsize,
        stored: Vec<VectorDocument>,
    }

    impl VectorStore for FlakyStore {
        fn initialize(&mut self) -> crate::error::VectorResult<()> {
            Ok(())
        }

        fn upsert_batch(&mut self, documents: Vec<VectorDocument>) -> crate::error::VectorResult<usize> {
            let call = self.calls.fetch_add(1, Ordering::SeqCst);
            if call < self.fail_until.load(Ordering::SeqCst) {
                return Err(VectorError::BackendUnavailable("flaky".to_string()));
            }
            let count = documents.len();
            self.stored.extend(documents);
            Ok(count)
        }

        fn search(&self, _query_text: &str, _k: usize) -> crate::error::VectorResult<Vec<crate::vector::ScoredDocument>> {
            Ok(Vec::new())
        }

        fn delete(&mut self, _id: &str) -> crate::error::VectorResult<bool> {
            Ok(false)
        }

        fn statistics(&self) -> crate::vector::VectorStats {
            crate::vector::VectorStats {
                document_count: self.stored.len(),
                embedding_dim: 0,
                backend: "flaky".to_string(),
            }
        }
    }

    fn doc(id: &str) -> VectorDocument {
        VectorDocument {
            id: id.to_string(),
            text: "text".to_string(),
            embedding: None,
            source: "test".to_string(),
            kind: "general".to_string(),
            created_at: Utc::now(),
            metadata: HashMap::new(),
        }
    }

    #[test]
    fn retries_a_retryable_failure_and_then_succeeds() {
        let mut store = FlakyStore {
            fail_until: AtomicUsize::new(2),
            calls: AtomicUsize::new(0),
            stored: Vec::new(),
        };
        let docs = vec![doc("a"), doc("b")];
        let result = upsert_in_groups(&mut store, docs, 10);
        assert_eq!(result.unwrap(), 2);
    }

    #[test]
    fn gives_up_after_the_fixed_retry_bound() {
        let mut store = FlakyStore {
            fail_until: AtomicUsize::new(100),
            calls: AtomicUsize::new(0),
            stored: Vec::new(),
        };
        let docs = vec![doc("a")];
        let result = upsert_in_groups(&mut store, docs, 10);
        assert!(result.is_err());
    }

    #[test]
    fn processes_documents_in_multiple_groups() {
        let mut store = FlakyStore {
            fail_until: AtomicUsize::new(0),
            calls: AtomicUsize::new(0),
            stored: Vec::new(),
        };
        let docs: Vec<_> = (0..25).map(|i| doc(&i.to_string())).collect();
        let result = upsert_in_groups(&mut store, docs, 10);
        assert_eq!(result.unwrap(), 25);
        assert_eq!(store.calls.load(Ordering::SeqCst), 3);
    }
}
