use parking_lot::Mutex;

use crate::allocator::{IdAllocator, IdSeed, Partition};
use crate::resolve::{resolve, resolve_batch, PayloadBatch, Resolved};
use crate::row::RowData;
use crate::template::Template;

/// One load/compare session: the allocator behind a single lock.
///
/// A batch holds the lock from its first row to its last, so IDs drawn by
/// one batch are contiguous per partition even with concurrent callers.
#[derive(Debug)]
pub struct Session {
    allocator: Mutex<IdAllocator>,
}

impl Session {
    pub fn new(allocator: IdAllocator) -> Self {
        Self { allocator: Mutex::new(allocator) }
    }

    pub fn from_seed(seed: &IdSeed) -> Self {
        Self::new(IdAllocator::from_seed(seed))
    }

    pub fn resolve(&self, template: &Template, row: &RowData) -> Resolved {
        let mut allocator = self.allocator.lock();
        resolve(template, row, &mut allocator)
    }

    pub fn resolve_batch(&self, template: &Template, rows: &[RowData]) -> PayloadBatch {
        let mut allocator = self.allocator.lock();
        resolve_batch(template, rows, &mut allocator)
    }

    pub fn peek(&self, partition: Partition) -> u64 {
        self.allocator.lock().peek(partition)
    }

    /// Start over from a newly loaded dataset.
    pub fn reseed(&self, seed: &IdSeed) {
        *self.allocator.lock() = IdAllocator::from_seed(seed);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;

    fn rows(n: usize) -> Vec<RowData> {
        (0..n).map(|i| RowData::from_iter([("Name", format!("VQ_{i}"))]).with_entity_class("VQ")).collect()
    }

    #[test]
    fn concurrent_batches_never_interleave() {
        let session = Arc::new(Session::from_seed(&IdSeed::new(0, 0)));
        let template = Arc::new(Template::from_json(r#"{"id": "{func.next_id}"}"#).unwrap());

        let handles: Vec<_> = (0..4)
            .map(|_| {
                let session = Arc::clone(&session);
                let template = Arc::clone(&template);
                std::thread::spawn(move || session.resolve_batch(&template, &rows(5)))
            })
            .collect();

        let mut all = Vec::new();
        for handle in handles {
            let batch = handle.join().unwrap();
            let ids: Vec<u64> = batch.payloads.iter().map(|p| p["id"].as_u64().unwrap()).collect();
            assert!(ids.windows(2).all(|w| w[1] == w[0] + 1), "batch ids not contiguous: {ids:?}");
            all.extend(ids);
        }
        all.sort_unstable();
        assert_eq!(all, (1..=20).collect::<Vec<u64>>());
        assert_eq!(session.peek(Partition::Vq), 21);
    }

    #[test]
    fn reseed_restarts_counters() {
        let session = Session::from_seed(&IdSeed::new(41, 7));
        let template = Template::from_json(r#"{"id": "{func.next_id}"}"#).unwrap();
        let row = RowData::from_iter([("Name", "VQ_A")]).with_entity_class("VQ");

        assert_eq!(session.resolve(&template, &row).payload["id"], 42);
        session.reseed(&IdSeed::new(100, 7));
        assert_eq!(session.resolve(&template, &row).payload["id"], 101);
        assert_eq!(session.peek(Partition::Other), 8);
    }
}
