use std::sync::Arc;

use parking_lot::RwLock;

use super::{StatusValidator, TransitionTable};

/// Hot-reloadable slot for the active [`TransitionTable`].
///
/// Readers take a snapshot and validate against it without holding the lock.
/// [`SharedTransitionTable::publish`] swaps a single `Arc`, so a reader sees
/// either the old table or the new one in full.
#[derive(Clone, Debug, Default)]
pub struct SharedTransitionTable {
    current: Arc<RwLock<Arc<TransitionTable>>>,
}

impl SharedTransitionTable {
    pub fn new(table: TransitionTable) -> Self {
        Self {
            current: Arc::new(RwLock::new(Arc::new(table))),
        }
    }

    /// Snapshot of the table active right now.
    pub fn load(&self) -> Arc<TransitionTable> {
        self.current.read().clone()
    }

    pub fn validator(&self) -> StatusValidator {
        StatusValidator::new(self.load())
    }

    /// Makes `table` active for every later snapshot and returns the one it replaced.
    pub fn publish(&self, table: TransitionTable) -> Arc<TransitionTable> {
        let next = Arc::new(table);
        let transitions = next.len();
        let previous = std::mem::replace(&mut *self.current.write(), next);

        tracing::info!(transitions, "published order transition table");
        previous
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::orders::OrderStatus::*;

    #[test]
    fn snapshots_keep_the_table_they_were_taken_from() {
        let shared = SharedTransitionTable::default();
        let before = shared.validator();

        let previous = shared.publish(
            TransitionTable::builder()
                .allow(Delivered, Created)
                .build()
                .unwrap(),
        );
        let after = shared.validator();

        assert_eq!(*previous, TransitionTable::default());
        assert!(before.validate_transition(Delivered, Created).is_err());
        assert!(after.validate_transition(Delivered, Created).is_ok());
        assert!(after.validate_transition(Created, Confirmed).is_err());
    }

    #[test]
    fn clones_share_the_slot() {
        let shared = SharedTransitionTable::default();
        let handle = shared.clone();

        handle.publish(TransitionTable::builder().build().unwrap());

        assert!(shared.load().is_empty());
    }
}
