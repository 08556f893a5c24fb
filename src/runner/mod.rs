//! Fan-out/fan-in execution core.
//!
//! # Architecture
//!
//! ```text
//! queries × providers → Runner::run
//!   ├── per task: CredentialPool → SessionFactory → Agent::query
//!   │   └── drain: stamp → classify → render/filter → OutputWriter
//!   └── join every task → RunSummary
//! ```

pub mod config;
pub mod outcome;
pub mod output;
pub mod pipeline;
pub mod scheduler;

pub use config::RunConfig;
pub use outcome::{RunSummary, TaskOutcome};
pub use output::{OutputWriter, WriteReport};
pub use pipeline::{DrainStats, OutputMode};
pub use scheduler::Runner;
