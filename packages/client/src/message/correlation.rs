//! Correlation id allocation for the binary protocol
//!
//! The protocol's opaque field is a signed 32-bit integer. Ids are drawn from
//! a single process-wide counter and wrap from `i32::MAX` to `i32::MIN`;
//! negative ids are valid. Uniqueness therefore only holds between wraps,
//! which response matching in the dispatch loop must tolerate.

use std::sync::atomic::{AtomicI32, Ordering};

use crossbeam_utils::CachePadded;

/// Lock-free generator of wrapping correlation ids.
#[derive(Debug)]
pub struct CorrelationIdGenerator {
    next: CachePadded<AtomicI32>,
}

impl CorrelationIdGenerator {
    /// Create a generator whose first id is `0`.
    #[inline]
    pub const fn new() -> Self {
        Self::starting_at(0)
    }

    /// Create a generator whose first id is `first`.
    #[inline]
    pub const fn starting_at(first: i32) -> Self {
        Self {
            next: CachePadded::new(AtomicI32::new(first)),
        }
    }

    /// Allocate the next id.
    ///
    /// `fetch_add` wraps on overflow, so the sequence continues into
    /// negative territory after `i32::MAX`.
    #[inline]
    pub fn next_id(&self) -> i32 {
        self.next.fetch_add(1, Ordering::Relaxed)
    }

    /// Peek at the id the next call to [`next_id`](Self::next_id) returns.
    #[inline]
    pub fn peek(&self) -> i32 {
        self.next.load(Ordering::Relaxed)
    }
}

impl Default for CorrelationIdGenerator {
    fn default() -> Self {
        Self::new()
    }
}

/// Generator shared by every request constructed in this process.
pub static GLOBAL_CORRELATION_IDS: CorrelationIdGenerator = CorrelationIdGenerator::new();

#[cfg(test)]
mod tests {
    use std::collections::HashSet;
    use std::sync::Arc;
    use std::thread;

    use super::*;

    #[test]
    fn test_sequential_ids() {
        let ids = CorrelationIdGenerator::new();
        assert_eq!(ids.next_id(), 0);
        assert_eq!(ids.next_id(), 1);
        assert_eq!(ids.peek(), 2);
    }

    #[test]
    fn test_wraps_into_negative_ids() {
        let ids = CorrelationIdGenerator::starting_at(i32::MAX - 1);
        assert_eq!(ids.next_id(), i32::MAX - 1);
        assert_eq!(ids.next_id(), i32::MAX);
        assert_eq!(ids.next_id(), i32::MIN);
        assert_eq!(ids.next_id(), i32::MIN + 1);
    }

    #[test]
    fn test_concurrent_ids_are_distinct() {
        let ids = Arc::new(CorrelationIdGenerator::new());
        let handles: Vec<_> = (0..8)
            .map(|_| {
                let ids = Arc::clone(&ids);
                thread::spawn(move || (0..500).map(|_| ids.next_id()).collect::<Vec<_>>())
            })
            .collect();

        let mut seen = HashSet::new();
        for handle in handles {
            for id in handle.join().unwrap_or_else(|_| panic!("id thread panicked")) {
                assert!(seen.insert(id), "duplicate correlation id {id}");
            }
        }
        assert_eq!(seen.len(), 4000);
    }
}
