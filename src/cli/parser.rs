//! Command-line argument parsing.
//!
//! Defines the CLI structure using clap derive macros.

use clap::Parser;
use std::path::PathBuf;

use crate::runner::config::{DEFAULT_LIMIT, DEFAULT_PROVIDER, DEFAULT_TIMEOUT_SECS};
use crate::runner::pipeline::DEFAULT_TEMPLATE;

/// fanscan: query Shodan, Censys, and Fofa concurrently.
///
/// Every query is sent to every selected engine at once; results are
/// streamed to stdout (and optionally a file) as they arrive.
#[derive(Parser, Debug)]
#[command(name = "fanscan")]
#[command(version, about, long_about = None)]
#[command(after_help = r#"Examples:
  fanscan -q 'ssl:"example.com"'                   # Shodan (default engine)
  fanscan -q nginx -e shodan,censys,fofa -l 50     # All engines, 50 results each
  fanscan -q nginx -f 'https://ip:port'            # Templated output
  fanscan --list queries.txt --json -o out.jsonl   # JSON lines to stdout and a file
  echo 'port:22' | fanscan                         # Queries from stdin
"#)]
pub struct Cli {
    /// Search query (repeatable).
    #[arg(short, long = "query", value_name = "QUERY")]
    pub queries: Vec<String>,

    /// File with one query per line.
    #[arg(long, value_name = "FILE")]
    pub list: Option<PathBuf>,

    /// Engines to query (shodan, censys, fofa), comma-separated.
    #[arg(
        short,
        long = "engine",
        value_delimiter = ',',
        default_value = DEFAULT_PROVIDER,
        env = "FANSCAN_ENGINES"
    )]
    pub engines: Vec<String>,

    /// Maximum results per query and engine.
    #[arg(short, long, default_value_t = DEFAULT_LIMIT)]
    pub limit: usize,

    /// Request timeout in seconds.
    #[arg(long, default_value_t = DEFAULT_TIMEOUT_SECS)]
    pub timeout: u64,

    /// Write results as JSON lines.
    #[arg(short, long, conflicts_with = "field")]
    pub json: bool,

    /// Output template; `ip`, `host`, and `port` are replaced per result.
    #[arg(short, long, default_value = DEFAULT_TEMPLATE)]
    pub field: String,

    /// Also write results to this file (truncated first).
    #[arg(short, long, value_name = "FILE")]
    pub output: Option<PathBuf>,

    /// Provider credentials file (TOML).
    ///
    /// Defaults to `<config dir>/fanscan/provider-config.toml` when present.
    #[arg(long, value_name = "FILE", env = "FANSCAN_PROVIDER_CONFIG")]
    pub provider_config: Option<PathBuf>,

    /// Maximum number of engine queries running at once (default: unbounded).
    #[arg(long, value_name = "N")]
    pub max_concurrency: Option<usize>,

    /// Seed for credential rotation, for reproducible runs.
    #[arg(long)]
    pub seed: Option<u64>,

    /// Show every emitted result in the log.
    #[arg(short, long, conflicts_with = "silent")]
    pub verbose: bool,

    /// Only log errors.
    #[arg(long)]
    pub silent: bool,
}

impl Cli {
    /// Log filter implied by `--verbose` / `--silent`.
    #[must_use]
    pub const fn log_directive(&self) -> &'static str {
        if self.verbose {
            "fanscan=debug"
        } else if self.silent {
            "fanscan=error"
        } else {
            "fanscan=info"
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;

    #[test]
    fn test_cli_parse() {
        Cli::command().debug_assert();
    }

    #[test]
    fn test_defaults() {
        let cli = Cli::try_parse_from(["fanscan", "-q", "nginx"])
            .unwrap_or_else(|e| unreachable!("{e}"));
        assert_eq!(cli.queries, vec!["nginx"]);
        assert_eq!(cli.limit, DEFAULT_LIMIT);
        assert_eq!(cli.timeout, DEFAULT_TIMEOUT_SECS);
        assert_eq!(cli.field, "ip:port");
        assert!(!cli.json);
        assert_eq!(cli.log_directive(), "fanscan=info");
    }

    #[test]
    fn test_engine_list_and_repeated_queries() {
        let cli = Cli::try_parse_from([
            "fanscan", "-q", "a", "-q", "b", "-e", "shodan,fofa", "--json", "-v",
        ])
        .unwrap_or_else(|e| unreachable!("{e}"));
        assert_eq!(cli.queries, vec!["a", "b"]);
        assert_eq!(cli.engines, vec!["shodan", "fofa"]);
        assert!(cli.json);
        assert_eq!(cli.log_directive(), "fanscan=debug");
    }

    #[test]
    fn test_json_conflicts_with_field() {
        let result = Cli::try_parse_from(["fanscan", "-q", "a", "--json", "-f", "ip"]);
        assert!(result.is_err());
    }
}
