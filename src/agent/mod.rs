//! Provider agents.
//!
//! Each agent wraps one internet-scan data provider behind the [`Agent`]
//! trait: given a [`Session`] and a shared [`Query`](crate::core::Query) it
//! returns a lazy stream of [`HostResult`](crate::core::HostResult)s.
//!
//! # Architecture
//!
//! ```text
//! provider name → AgentRegistry → Arc<dyn Agent>
//! KeySet + timeout → SessionFactory → Session (one per task)
//! Agent::query(session, query)
//!   └── producer task → bounded channel → ResultStream
//! ```

pub mod provider;
pub mod providers;
pub mod registry;
pub mod session;

pub use provider::{Agent, ResultStream};
pub use providers::{CensysAgent, FofaAgent, ShodanAgent};
pub use registry::AgentRegistry;
pub use session::{HttpSessionFactory, Session, SessionFactory};
