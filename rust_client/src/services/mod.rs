//! Workflows built from client calls and store actions.
//!
//! Each service function takes a [`SchedulerClient`](crate::api::SchedulerClient)
//! and works against the store the client was built with.

pub mod account;
pub mod coursebin;
pub mod tasks;

pub use coursebin::RefreshReport;
pub use tasks::{PollConfig, PollOutcome, POLL_EXHAUSTED_MESSAGE};
