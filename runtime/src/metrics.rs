//! Metric names and descriptions.
//!
//! The runtime records counters through the [`metrics`] facade:
//! - Work scheduled and executed, labelled by scheduler policy
//! - Combined pipeline emissions, labelled by arity
//!
//! No recorder is installed here. An application that wants the numbers
//! installs its own exporter and calls [`describe_metrics`] once.
//!
//! # Example
//!
//! ```
//! viewstore_runtime::metrics::describe_metrics();
//! ```

use metrics::describe_counter;

// Re-export metrics macros for use in other modules
pub use metrics::counter;

/// Work items handed to a scheduler. Label: `policy`.
pub const SCHEDULER_WORK_SCHEDULED: &str = "scheduler.work.scheduled";

/// Work items a scheduler ran. Label: `policy`.
pub const SCHEDULER_WORK_EXECUTED: &str = "scheduler.work.executed";

/// Values emitted by `combine_latest`. Label: `arity`.
pub const PIPELINE_COMBINED_EMITTED: &str = "pipeline.combined.emitted";

/// Register descriptions for every runtime metric.
///
/// Safe to call more than once; recorders ignore repeated descriptions.
pub fn describe_metrics() {
    describe_counter!(
        SCHEDULER_WORK_SCHEDULED,
        "Total number of work items handed to a scheduler"
    );
    describe_counter!(
        SCHEDULER_WORK_EXECUTED,
        "Total number of work items a scheduler ran"
    );
    describe_counter!(
        PIPELINE_COMBINED_EMITTED,
        "Total number of values emitted by combine-latest pipelines"
    );

    tracing::debug!("Registered runtime metric descriptions");
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_describe_without_recorder_is_noop() {
        describe_metrics();
        describe_metrics();
    }

    #[test]
    fn test_metric_names_are_distinct() {
        let names = [
            SCHEDULER_WORK_SCHEDULED,
            SCHEDULER_WORK_EXECUTED,
            PIPELINE_COMBINED_EMITTED,
        ];
        for (index, name) in names.iter().enumerate() {
            assert!(!names[index + 1..].contains(name));
        }
    }
}
