//! CLI command implementation.
//!
//! Turns parsed arguments into a credential pool, run configuration, and
//! output writer, then hands them to the [`Runner`].

use std::path::Path;
use std::sync::Arc;
use std::time::Duration;

use rand::SeedableRng;
use rand::rngs::StdRng;
use tokio::io::{AsyncBufRead, AsyncBufReadExt, BufReader};
use tokio_util::sync::CancellationToken;
use tracing::debug;

use crate::cli::parser::Cli;
use crate::credentials::KeyStore;
use crate::error::{ConfigError, Result};
use crate::runner::{OutputMode, OutputWriter, RunConfig, RunSummary, Runner};

/// Executes a run described by the CLI arguments.
///
/// # Errors
///
/// Returns configuration errors (bad credentials file, no queries, invalid
/// settings), output file creation errors, and run-fatal errors.
pub async fn execute(cli: &Cli, cancel: CancellationToken) -> Result<RunSummary> {
    let queries = collect_queries(cli).await?;
    let pool = load_credentials(cli)?;
    let config = build_config(cli)?;

    let mut output = OutputWriter::builder().stdout();
    if let Some(path) = &cli.output {
        output = output.file(path)?;
    }

    let runner = Runner::new(config, Arc::new(pool));
    let summary = runner
        .run(&queries, Arc::new(output.build()), cancel)
        .await?;
    Ok(summary)
}

/// Builds the run configuration from CLI flags.
///
/// # Errors
///
/// Returns [`ConfigError::InvalidSetting`] for out-of-range values.
pub fn build_config(cli: &Cli) -> std::result::Result<RunConfig, ConfigError> {
    let mode = if cli.json {
        OutputMode::Json
    } else {
        OutputMode::Template(cli.field.clone())
    };

    let mut builder = RunConfig::builder()
        .providers(cli.engines.iter().cloned())
        .limit(cli.limit)
        .timeout(Duration::from_secs(cli.timeout))
        .output_mode(mode);
    if let Some(n) = cli.max_concurrency {
        builder = builder.max_concurrency(n);
    }
    builder.build()
}

/// Loads provider credentials from the config file and environment.
///
/// An explicitly named file must exist; the default location is optional.
///
/// # Errors
///
/// Returns [`ConfigError`] if a credentials file cannot be read or parsed.
pub fn load_credentials(cli: &Cli) -> std::result::Result<KeyStore, ConfigError> {
    let rng = cli
        .seed
        .map_or_else(StdRng::from_entropy, StdRng::seed_from_u64);
    let mut store = KeyStore::new(rng);

    match &cli.provider_config {
        Some(path) => store.load_file(path)?,
        None => {
            if let Some(path) = KeyStore::default_config_path().filter(|p| p.is_file()) {
                debug!(path = %path.display(), "loading provider config");
                store.load_file(&path)?;
            }
        }
    }
    store.load_env();
    Ok(store)
}

/// Gathers queries from `--query`, `--list`, and (when neither is given and
/// stdin is not a terminal) standard input.
async fn collect_queries(cli: &Cli) -> std::result::Result<Vec<String>, ConfigError> {
    let mut queries: Vec<String> = cli
        .queries
        .iter()
        .map(|q| q.trim().to_string())
        .filter(|q| !q.is_empty())
        .collect();

    if let Some(path) = &cli.list {
        queries.extend(read_query_file(path).await?);
    }

    if cli.queries.is_empty() && cli.list.is_none() && !stdin_is_terminal() {
        let stdin = BufReader::new(tokio::io::stdin());
        queries.extend(read_lines(stdin).await.map_err(|source| ConfigError::Read {
            path: "<stdin>".into(),
            source,
        })?);
    }

    if queries.is_empty() {
        return Err(ConfigError::NoQueries);
    }
    Ok(queries)
}

async fn read_query_file(path: &Path) -> std::result::Result<Vec<String>, ConfigError> {
    let read_err = |source| ConfigError::Read {
        path: path.to_path_buf(),
        source,
    };
    let file = tokio::fs::File::open(path).await.map_err(read_err)?;
    read_lines(BufReader::new(file)).await.map_err(read_err)
}

/// Reads non-blank, trimmed lines.
async fn read_lines<R: AsyncBufRead + Unpin>(reader: R) -> std::io::Result<Vec<String>> {
    let mut lines = reader.lines();
    let mut out = Vec::new();
    while let Some(line) = lines.next_line().await? {
        let line = line.trim();
        if !line.is_empty() {
            out.push(line.to_string());
        }
    }
    Ok(out)
}

fn stdin_is_terminal() -> bool {
    use std::io::IsTerminal;
    std::io::stdin().is_terminal()
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::Parser;
    use std::io::Write;

    fn parse(args: &[&str]) -> Cli {
        let mut argv = vec!["fanscan"];
        argv.extend_from_slice(args);
        Cli::try_parse_from(argv).unwrap_or_else(|e| unreachable!("{e}"))
    }

    #[test]
    fn test_build_config_template_mode() {
        let cli = parse(&["-q", "x", "-e", "shodan,censys", "-l", "5", "-f", "ip|host"]);
        let config = build_config(&cli).unwrap_or_else(|e| unreachable!("{e}"));
        assert_eq!(config.providers, vec!["shodan", "censys"]);
        assert_eq!(config.limit, 5);
        assert_eq!(config.output_mode, OutputMode::Template("ip|host".to_string()));
    }

    #[test]
    fn test_build_config_json_mode() {
        let cli = parse(&["-q", "x", "--json", "--max-concurrency", "3"]);
        let config = build_config(&cli).unwrap_or_else(|e| unreachable!("{e}"));
        assert_eq!(config.output_mode, OutputMode::Json);
        assert_eq!(config.max_concurrency, Some(3));
    }

    #[test]
    fn test_build_config_rejects_zero_limit() {
        let cli = parse(&["-q", "x", "-l", "0"]);
        assert!(build_config(&cli).is_err());
    }

    #[test]
    fn test_load_credentials_explicit_file_must_exist() {
        let cli = parse(&["-q", "x", "--provider-config", "/nonexistent/keys.toml"]);
        assert!(matches!(
            load_credentials(&cli),
            Err(ConfigError::Read { .. })
        ));
    }

    #[test]
    fn test_load_credentials_from_file() {
        let mut file = tempfile::NamedTempFile::new().unwrap_or_else(|e| unreachable!("{e}"));
        writeln!(file, r#"fofa = ["me@example.com:key"]"#).unwrap_or_else(|e| unreachable!("{e}"));
        let path = file.path().to_string_lossy().to_string();

        let cli = parse(&["-q", "x", "--provider-config", &path, "--seed", "1"]);
        let store = load_credentials(&cli).unwrap_or_else(|e| unreachable!("{e}"));
        assert_eq!(store.count("fofa"), 1);
    }

    #[tokio::test]
    async fn test_collect_queries_merges_flags_and_list() {
        let mut file = tempfile::NamedTempFile::new().unwrap_or_else(|e| unreachable!("{e}"));
        writeln!(file, "port:22\n\n  product:nginx  ").unwrap_or_else(|e| unreachable!("{e}"));
        let path = file.path().to_string_lossy().to_string();

        let cli = parse(&["-q", "ssl:example.com", "--list", &path]);
        let queries = collect_queries(&cli)
            .await
            .unwrap_or_else(|e| unreachable!("{e}"));
        assert_eq!(queries, vec!["ssl:example.com", "port:22", "product:nginx"]);
    }

    #[tokio::test]
    async fn test_read_lines_skips_blanks() {
        let input: &[u8] = b"a\n\n b \n";
        let lines = read_lines(BufReader::new(input))
            .await
            .unwrap_or_else(|e| unreachable!("{e}"));
        assert_eq!(lines, vec!["a", "b"]);
    }
}
