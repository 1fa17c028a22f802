//! Order Status Domain

/// Order status state machine
pub mod orders;

/// Domain errors
pub mod errors;

pub use errors::{Error, TransitionError};
pub use orders::{OrderStatus, StatusValidator, TransitionTable};
