use std::sync::Arc;

use crate::errors::TransitionError;

use super::{OrderStatus, TransitionTable};

/// Guards order status changes against a [`TransitionTable`].
///
/// Stateless apart from the injected table: the caller owns the order and
/// applies the new status only after [`StatusValidator::validate_transition`]
/// succeeds.
#[derive(Clone, Debug, Default)]
pub struct StatusValidator {
    table: Arc<TransitionTable>,
}

impl StatusValidator {
    pub fn new(table: impl Into<Arc<TransitionTable>>) -> Self {
        Self {
            table: table.into(),
        }
    }

    /// Accepts `current -> requested` if it is a table edge, or a no-op the
    /// table permits. Anything else is a [`TransitionError`].
    pub fn validate_transition(
        &self,
        current: OrderStatus,
        requested: OrderStatus,
    ) -> Result<(), TransitionError> {
        if current == requested && self.table.allows_noop() {
            return Ok(());
        }

        if self.table.is_allowed(current, requested) {
            return Ok(());
        }

        tracing::debug!(from = %current, to = %requested, "rejected order status transition");
        Err(TransitionError::new(current, requested))
    }

    pub fn allowed_targets(&self, current: OrderStatus) -> Vec<OrderStatus> {
        self.table.targets(current).collect()
    }

    pub fn is_terminal(&self, status: OrderStatus) -> bool {
        self.table.is_terminal(status)
    }

    pub fn table(&self) -> &TransitionTable {
        &self.table
    }
}
