use std::{
    collections::{BTreeMap, BTreeSet},
    fmt,
};

use derive_new::new;
use serde::{Deserialize, Serialize};

use crate::errors::Error;

use super::OrderStatus;

/// A proposed change from one status to another.
#[derive(Clone, Copy, Debug, Serialize, Deserialize, Eq, PartialEq, Hash, PartialOrd, Ord, new)]
pub struct Transition {
    pub from: OrderStatus,
    pub to: OrderStatus,
}

impl fmt::Display for Transition {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} -> {}", self.from, self.to)
    }
}

/// Immutable directed graph of legal status changes.
///
/// Built once, then shared read-only. To change the policy, build a new
/// table and publish it through [`super::SharedTransitionTable`].
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct TransitionTable {
    edges: BTreeMap<OrderStatus, BTreeSet<OrderStatus>>,
    allow_noop: bool,
}

impl TransitionTable {
    pub fn builder() -> TransitionTableBuilder {
        TransitionTableBuilder::default()
    }

    /// True only if `from -> to` is an edge of the table. No-ops are not edges.
    pub fn is_allowed(&self, from: OrderStatus, to: OrderStatus) -> bool {
        self.edges
            .get(&from)
            .is_some_and(|targets| targets.contains(&to))
    }

    /// Whether `a -> a` is accepted as an idempotent no-op.
    pub fn allows_noop(&self) -> bool {
        self.allow_noop
    }

    pub fn targets(&self, from: OrderStatus) -> impl Iterator<Item = OrderStatus> + '_ {
        self.edges.get(&from).into_iter().flatten().copied()
    }

    pub fn is_terminal(&self, status: OrderStatus) -> bool {
        self.targets(status).next().is_none()
    }

    pub fn transitions(&self) -> impl Iterator<Item = Transition> + '_ {
        self.edges
            .iter()
            .flat_map(|(from, targets)| targets.iter().map(|to| Transition::new(*from, *to)))
    }

    pub fn len(&self) -> usize {
        self.edges.values().map(BTreeSet::len).sum()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl Default for TransitionTable {
    fn default() -> Self {
        use OrderStatus::*;

        let mut edges: BTreeMap<OrderStatus, BTreeSet<OrderStatus>> = BTreeMap::new();
        for (from, to) in [
            (Created, Confirmed),
            (Created, Cancelled),
            (Confirmed, Preparing),
            (Confirmed, Cancelled),
            (Preparing, OutForDelivery),
            (OutForDelivery, Delivered),
        ] {
            edges.entry(from).or_default().insert(to);
        }

        Self {
            edges,
            allow_noop: true,
        }
    }
}

#[derive(Clone, Debug)]
pub struct TransitionTableBuilder {
    edges: BTreeMap<OrderStatus, BTreeSet<OrderStatus>>,
    allow_noop: bool,
}

impl Default for TransitionTableBuilder {
    fn default() -> Self {
        Self {
            edges: BTreeMap::new(),
            allow_noop: true,
        }
    }
}

impl TransitionTableBuilder {
    pub fn allow(mut self, from: OrderStatus, to: OrderStatus) -> Self {
        self.edges.entry(from).or_default().insert(to);
        self
    }

    pub fn allow_noop(mut self, allow_noop: bool) -> Self {
        self.allow_noop = allow_noop;
        self
    }

    pub fn build(self) -> Result<TransitionTable, Error> {
        if let Some(status) = self
            .edges
            .iter()
            .find_map(|(from, targets)| targets.contains(from).then_some(*from))
        {
            return Err(Error::Configuration {
                message: format!(
                    "{status} -> {status} is a no-op; use allow_noop instead of an edge"
                ),
            });
        }

        Ok(TransitionTable {
            edges: self.edges,
            allow_noop: self.allow_noop,
        })
    }
}
