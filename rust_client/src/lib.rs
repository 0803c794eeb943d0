//! # Trojan Scheduler Client
//!
//! Client library for the Trojan Scheduler course-schedule generator.
//!
//! Courses fetched from the backend are turned into a hierarchical
//! *coursebin* the user can prune, group and penalize. The coursebin and the
//! user's time preferences are submitted as a generation task, and the
//! client polls the task until the backend has ranked candidate schedules.
//!
//! ## Architecture
//!
//! - [`models`]: wire and state types (course nodes, preferences, tasks, users)
//! - [`coursebin`]: course tree construction and section selectors
//! - [`store`]: the action-driven local state store and its disk snapshot
//! - [`transport`]: the HTTP seam, with a reqwest and an in-memory implementation
//! - [`api`]: typed endpoints, token refresh and error formatting
//! - [`services`]: account, coursebin and task workflows
//! - [`config`]: TOML and environment configuration
//!
//! ## Example
//!
//! ```no_run
//! use std::sync::Arc;
//! use trojan_scheduler::{services, ClientConfig, ReqwestTransport, SchedulerClient, StoreHandle};
//!
//! # async fn run() -> trojan_scheduler::ClientResult<()> {
//! let config = ClientConfig::load()?;
//! let store = StoreHandle::open(&config.storage.state_path);
//! let transport = Arc::new(ReqwestTransport::new()?);
//! let client = SchedulerClient::new(&config, transport, store);
//!
//! services::account::login(&client, "tommy", "fight-on").await?;
//! services::coursebin::fetch_course(&client, &config.coursebin.default_term, "csci-356").await?;
//! let outcome = services::tasks::submit(&client, Some("Fall plan")).await?;
//! println!("{}", outcome.message());
//! # Ok(())
//! # }
//! ```

pub mod api;
pub mod config;
pub mod coursebin;
pub mod error;
pub mod models;
pub mod naming;
pub mod services;
pub mod store;
pub mod transport;

pub use api::SchedulerClient;
pub use config::ClientConfig;
pub use error::{ApiError, ClientError, ClientResult};
pub use store::{Action, Store, StoreHandle};
pub use transport::{LocalTransport, ReqwestTransport, Transport};
