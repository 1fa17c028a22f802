use std::path::PathBuf;

use derive_new::new;
use thiserror::Error;

use crate::orders::OrderStatus;

/// Rejected status change: `(from, to)` is not in the allowed-transition table.
#[derive(Error, Debug, Clone, Copy, Eq, PartialEq, new)]
#[error("Cannot transition order from {from} to {to}")]
pub struct TransitionError {
    pub from: OrderStatus,
    pub to: OrderStatus,
}

#[derive(Error, Debug)]
pub enum Error {
    #[error(transparent)]
    InvalidTransition(#[from] TransitionError),

    #[error("Unknown order status: {value}")]
    UnknownStatus { value: String },

    #[error("Invalid transition table: {message}")]
    Configuration { message: String },

    #[error("Failed to read transition table {path}: {source}")]
    ConfigRead {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Failed to parse transition table: {source}")]
    ConfigParse {
        #[from]
        source: serde_json::Error,
    },
}

impl Error {
    /// True for the client-facing rejection; everything else is a
    /// configuration or programming error.
    pub fn is_invalid_transition(&self) -> bool {
        matches!(self, Self::InvalidTransition(_))
    }
}
