/// Order status set
pub mod status;

/// Allowed-transition table
pub mod transitions;

/// Transition guard
pub mod validator;

/// Hot-reloadable table slot
pub mod shared;

/// Table configuration
pub mod config;

pub use config::{load_from_env, TransitionTableConfig, TRANSITIONS_FILE_ENV};
pub use shared::SharedTransitionTable;
pub use status::OrderStatus;
pub use transitions::{Transition, TransitionTable, TransitionTableBuilder};
pub use validator::StatusValidator;
