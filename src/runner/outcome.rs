//! Task outcomes and run summary.

use serde::Serialize;

use super::pipeline::DrainStats;

/// How a single (query, provider) task ended.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TaskOutcome {
    /// The credential pool returned an empty key set.
    EmptyKeys,
    /// The session could not be created.
    SessionFailed,
    /// The agent rejected the query before streaming.
    QueryFailed,
    /// The result stream was drained to completion.
    Drained(DrainStats),
    /// The task panicked.
    Panicked,
}

impl TaskOutcome {
    /// Returns `true` if the task drained its stream.
    #[must_use]
    pub const fn is_drained(&self) -> bool {
        matches!(self, Self::Drained(_))
    }
}

/// Aggregate counters for one run.
///
/// Per-task failures show up here, never as the run's error.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize)]
pub struct RunSummary {
    /// Tasks launched (`queries × providers`).
    pub tasks_spawned: usize,
    /// Tasks that drained their stream.
    pub tasks_completed: usize,
    /// Tasks that ended before streaming (keys, session, query, or panic).
    pub tasks_failed: usize,
    /// Records written to the output.
    pub records_emitted: usize,
    /// Records suppressed by the template relevance filter.
    pub records_filtered: usize,
    /// Records that carried a provider error.
    pub provider_errors: usize,
    /// Records that failed to serialize.
    pub serialization_failures: usize,
}

impl RunSummary {
    /// Folds one task outcome into the summary.
    pub fn record(&mut self, outcome: &TaskOutcome) {
        match outcome {
            TaskOutcome::Drained(stats) => {
                self.tasks_completed += 1;
                self.records_emitted += stats.emitted;
                self.records_filtered += stats.filtered;
                self.provider_errors += stats.provider_errors;
                self.serialization_failures += stats.serialization_failures;
            }
            TaskOutcome::EmptyKeys
            | TaskOutcome::SessionFailed
            | TaskOutcome::QueryFailed
            | TaskOutcome::Panicked => self.tasks_failed += 1,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_summary_record() {
        let mut summary = RunSummary::default();
        summary.record(&TaskOutcome::Drained(DrainStats {
            emitted: 3,
            filtered: 1,
            provider_errors: 2,
            serialization_failures: 0,
        }));
        summary.record(&TaskOutcome::EmptyKeys);
        summary.record(&TaskOutcome::QueryFailed);

        assert_eq!(summary.tasks_completed, 1);
        assert_eq!(summary.tasks_failed, 2);
        assert_eq!(summary.records_emitted, 3);
        assert_eq!(summary.records_filtered, 1);
        assert_eq!(summary.provider_errors, 2);
    }

    #[test]
    fn test_is_drained() {
        assert!(TaskOutcome::Drained(DrainStats::default()).is_drained());
        assert!(!TaskOutcome::SessionFailed.is_drained());
    }
}
