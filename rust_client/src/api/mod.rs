//! REST client for the scheduler backend.

pub mod auth;
pub mod client;
pub mod format;
pub mod jwt;
pub mod payloads;
pub mod request;

pub use auth::{AuthInterceptor, TokenEndpoints, Unauthorized};
pub use client::SchedulerClient;
pub use format::{default_formatter, ErrorFormatter};
pub use payloads::{ItemUpdate, NewTask, ProfileUpdate, ScheduleFilter, TaskDataUpdate};
pub use request::{ApiRequest, AuthMode};
