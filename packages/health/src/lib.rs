//! Connection-health supervision for restbind clients.
//!
//! A [`Supervisor`] wraps a client implementing [`Supervised`] and
//! observes every call made through it. Outages (as decided by a
//! [`FailureClassifier`]) mark the connection unavailable and start a
//! single background recovery loop that probes the server every
//! heartbeat until it answers again.
//!
//! # Example
//!
//! ```rust,ignore
//! let supervisor = Supervisor::new(BaiduClient::new()?, SupervisorConfig::default());
//! supervisor.init().await;
//!
//! let suggestions = supervisor.call(|c| c.sugrec("rust", "pc")).await?;
//! assert!(supervisor.status().available);
//! ```

mod config;
mod failure;
mod status;
mod supervisor;

pub use config::{SupervisorConfig, DEFAULT_HEARTBEAT_INTERVAL_MS};
pub use failure::{FailureClassifier, TransportFailureClassifier};
pub use status::{ConnStatus, HEALTHY_MESSAGE, NOT_INIT_MESSAGE};
pub use supervisor::{Supervised, Supervisor};
