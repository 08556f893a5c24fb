//! Per-record result pipeline.
//!
//! Every record pulled from an agent stream is timestamped, classified,
//! rendered in the run's [`OutputMode`], filtered, and handed to the
//! [`OutputWriter`]. Records are consumed strictly one at a time, in the
//! order the provider produced them.

use futures_util::StreamExt;
use tracing::{debug, warn};

use super::output::OutputWriter;
use crate::agent::ResultStream;
use crate::core::HostResult;

/// Template used when none is configured.
pub const DEFAULT_TEMPLATE: &str = "ip:port";

/// Placeholder tokens substituted in templated output, in match priority.
const TOKENS: [&str; 3] = ["ip", "host", "port"];

/// Output encoding, chosen once per run.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum OutputMode {
    /// One JSON object per line with `ip`, `host`, `port`, `timestamp`.
    Json,
    /// Caller-supplied template with `ip`, `host`, and `port` placeholders.
    Template(String),
}

impl OutputMode {
    /// Renders a record, or returns `Ok(None)` if templated output would
    /// not mention any of the record's field values.
    ///
    /// # Errors
    ///
    /// Returns the serializer error when JSON encoding fails.
    pub fn render(&self, result: &HostResult) -> Result<Option<String>, serde_json::Error> {
        match self {
            Self::Json => serde_json::to_string(result).map(Some),
            Self::Template(template) => {
                let line = render_template(template, result);
                Ok(mentions_field(&line, result).then_some(line))
            }
        }
    }
}

/// Substitutes `ip`, `host`, and `port` tokens in `template`.
///
/// Scans left to right; at each position the first matching token is
/// replaced and scanning resumes after it. Substituted values are never
/// rescanned, so a hostname containing `"ip"` is emitted verbatim.
#[must_use]
pub fn render_template(template: &str, result: &HostResult) -> String {
    let port = result.port.to_string();
    let values: [&str; 3] = [&result.ip, &result.host, &port];

    let mut out = String::with_capacity(template.len() + result.ip.len() + result.host.len());
    let mut rest = template;
    'scan: while !rest.is_empty() {
        for (token, value) in TOKENS.into_iter().zip(values) {
            if let Some(tail) = rest.strip_prefix(token) {
                out.push_str(value);
                rest = tail;
                continue 'scan;
            }
        }
        let mut chars = rest.chars();
        if let Some(c) = chars.next() {
            out.push(c);
        }
        rest = chars.as_str();
    }
    out
}

/// Returns `true` if `line` contains the record's ip, port, or non-empty
/// host as a literal substring.
///
/// This is plain substring containment on the rendered text: an empty ip
/// matches every line, and a constant template passes whenever it happens
/// to contain one of the values.
#[must_use]
pub fn mentions_field(line: &str, result: &HostResult) -> bool {
    let port = result.port.to_string();
    let mut needles = vec![result.ip.as_str(), port.as_str()];
    if !result.host.is_empty() {
        needles.push(&result.host);
    }
    needles.iter().any(|needle| line.contains(needle))
}

/// Sets the consumption timestamp (Unix seconds).
pub fn stamp(result: &mut HostResult) {
    result.timestamp = chrono::Utc::now().timestamp();
}

/// Counters for one drained stream.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct DrainStats {
    /// Records written to the output.
    pub emitted: usize,
    /// Records suppressed by the template relevance filter.
    pub filtered: usize,
    /// Records carrying a provider error.
    pub provider_errors: usize,
    /// Records that failed to serialize.
    pub serialization_failures: usize,
}

/// Consumes `stream` to completion, writing rendered records to `output`.
///
/// `provider` labels log events only; it is not part of the output.
pub async fn drain(
    mut stream: ResultStream,
    mode: &OutputMode,
    output: &OutputWriter,
    provider: &str,
) -> DrainStats {
    let mut stats = DrainStats::default();

    while let Some(mut result) = stream.next().await {
        stamp(&mut result);

        if let Some(error) = &result.error {
            stats.provider_errors += 1;
            warn!(provider, %error, "provider returned an error");
            continue;
        }

        match mode.render(&result) {
            Ok(Some(line)) => {
                debug!(provider, "{line}");
                output.write_line(&line);
                stats.emitted += 1;
            }
            Ok(None) => stats.filtered += 1,
            Err(e) => {
                stats.serialization_failures += 1;
                debug!(provider, error = %e, "skipping unserializable result");
            }
        }
    }

    stats
}
