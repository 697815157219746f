//! Background refresh and its bookkeeping.

pub(crate) mod scheduler;
mod state;

pub(crate) use scheduler::RefreshScheduler;
pub use state::RefreshState;
