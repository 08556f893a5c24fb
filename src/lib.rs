//! # fanscan
//!
//! Fans search queries out to several internet-scan data providers
//! (Shodan, Censys, Fofa) at once, streams back host results, and writes
//! them as JSON lines or templated text to stdout and an optional file.
//!
//! ## Example
//!
//! ```no_run
//! use std::sync::Arc;
//!
//! use fanscan::credentials::{Credential, KeyStore};
//! use fanscan::runner::{OutputWriter, RunConfig, Runner};
//! use tokio_util::sync::CancellationToken;
//!
//! # async fn demo() -> fanscan::Result<()> {
//! let mut keys = KeyStore::with_seed(7);
//! keys.add("shodan", Credential::token("SHODAN_KEY"));
//!
//! let config = RunConfig::builder().providers(["shodan"]).limit(10).build()?;
//! let output = Arc::new(OutputWriter::builder().stdout().build());
//! let summary = Runner::new(config, Arc::new(keys))
//!     .run(&["product:nginx".to_string()], output, CancellationToken::new())
//!     .await?;
//! assert_eq!(summary.tasks_spawned, 1);
//! # Ok(())
//! # }
//! ```

pub mod agent;
pub mod cli;
pub mod core;
pub mod credentials;
pub mod error;
pub mod runner;

pub use error::{Error, Result};
