//! Core data types shared by agents, the runner, and the CLI.

pub mod host_result;
pub mod query;

pub use host_result::HostResult;
pub use query::Query;
