//! Observation hooks for optimization runs.
//!
//! A [`Monitor`] is told when a run starts, after every iteration and when
//! the run stops. It cannot influence the run. [`TracingMonitor`] forwards
//! everything to `tracing`; `()` discards everything.

use crate::execution::Progress;
use std::fmt;
use std::time::Instant;
use tracing::{debug, error, info, warn};

/// Severity of a monitor message.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Default)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum LogLevel {
    Debug,
    #[default]
    Info,
    Warn,
    Error,
}

impl fmt::Display for LogLevel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            LogLevel::Debug => "debug",
            LogLevel::Info => "info",
            LogLevel::Warn => "warn",
            LogLevel::Error => "error",
        };
        f.write_str(name)
    }
}

fn best_fitness(progress: &Progress) -> String {
    match &progress.best {
        Some(best) => best.fitness().to_string(),
        None => "none".to_string(),
    }
}

/// Lifecycle observer of an [`Execution`](crate::execution::Execution).
///
/// Only [`log`](Self::log) is required; the hooks format a message and
/// route it there.
pub trait Monitor {
    /// Receives a message emitted by `execution`.
    fn log(&mut self, level: LogLevel, execution: &str, message: &str);

    /// Called once before the first evaluation.
    fn on_start(&mut self, execution: &str, _progress: &Progress) {
        self.log(LogLevel::Info, execution, "Optimization started");
    }

    /// Called after every completed iteration.
    fn on_iteration(&mut self, execution: &str, progress: &Progress) {
        let message = format!(
            "Iteration [{}] finished. Best fitness: [{}]",
            progress.iterations,
            best_fitness(progress)
        );
        self.log(LogLevel::Debug, execution, &message);
    }

    /// Called once when the stop condition holds.
    fn on_terminate(&mut self, execution: &str, progress: &Progress) {
        let message = format!(
            "Optimization terminated after {} iterations and {} evaluations with best fitness {}",
            progress.iterations,
            progress.evaluations,
            best_fitness(progress)
        );
        self.log(LogLevel::Info, execution, &message);
    }
}

/// Silent monitor.
impl Monitor for () {
    fn log(&mut self, _level: LogLevel, _execution: &str, _message: &str) {}
}

/// Monitor that emits `tracing` events at or above a minimum level.
///
/// # Examples
///
/// ```
/// use u_metaopt::monitor::{LogLevel, Monitor, TracingMonitor};
///
/// let mut monitor = TracingMonitor::new(LogLevel::Warn);
/// // Below the threshold: dropped
/// monitor.log(LogLevel::Info, "de", "ignored");
/// ```
#[derive(Debug, Clone, Default)]
pub struct TracingMonitor {
    /// Minimum level forwarded to `tracing`.
    pub level: LogLevel,
    started: Option<Instant>,
}

impl TracingMonitor {
    /// Creates a monitor forwarding messages at or above `level`.
    pub fn new(level: LogLevel) -> Self {
        Self {
            level,
            started: None,
        }
    }
}

impl Monitor for TracingMonitor {
    fn log(&mut self, level: LogLevel, execution: &str, message: &str) {
        if level < self.level {
            return;
        }
        match level {
            LogLevel::Debug => debug!(execution, "{message}"),
            LogLevel::Info => info!(execution, "{message}"),
            LogLevel::Warn => warn!(execution, "{message}"),
            LogLevel::Error => error!(execution, "{message}"),
        }
    }

    fn on_start(&mut self, execution: &str, _progress: &Progress) {
        self.started = Some(Instant::now());
        self.log(LogLevel::Info, execution, "Optimization started");
    }

    fn on_terminate(&mut self, execution: &str, progress: &Progress) {
        let elapsed = self
            .started
            .map(|t| t.elapsed().as_millis())
            .unwrap_or_default();
        let message = format!(
            "Optimization terminated after {}ms ({} iterations, {} evaluations) with best fitness {}",
            elapsed,
            progress.iterations,
            progress.evaluations,
            best_fitness(progress)
        );
        self.log(LogLevel::Info, execution, &message);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::genotype::EvaluatedIndividual;

    #[derive(Default)]
    struct Recorder {
        messages: Vec<(LogLevel, String, String)>,
    }

    impl Monitor for Recorder {
        fn log(&mut self, level: LogLevel, execution: &str, message: &str) {
            self.messages
                .push((level, execution.to_string(), message.to_string()));
        }
    }

    fn progress() -> Progress {
        Progress {
            iterations: 3,
            evaluations: 120,
            best: Some(EvaluatedIndividual::new(vec![0.5], 0.25)),
        }
    }

    #[test]
    fn test_default_hooks_route_to_log() {
        let mut recorder = Recorder::default();
        recorder.on_start("de", &progress());
        recorder.on_iteration("de", &progress());
        recorder.on_terminate("de", &progress());

        assert_eq!(recorder.messages.len(), 3);
        assert_eq!(recorder.messages[0].0, LogLevel::Info);
        assert_eq!(recorder.messages[0].2, "Optimization started");
        assert_eq!(recorder.messages[1].0, LogLevel::Debug);
        assert_eq!(
            recorder.messages[1].2,
            "Iteration [3] finished. Best fitness: [0.25]"
        );
        assert!(recorder.messages[2].2.contains("120 evaluations"));
        assert!(recorder.messages.iter().all(|(_, name, _)| name == "de"));
    }

    #[test]
    fn test_missing_best_is_reported() {
        let mut recorder = Recorder::default();
        recorder.on_iteration("ga", &Progress::default());
        assert!(recorder.messages[0].2.ends_with("[none]"));
    }

    #[test]
    fn test_level_ordering() {
        assert!(LogLevel::Debug < LogLevel::Info);
        assert!(LogLevel::Warn < LogLevel::Error);
        assert_eq!(LogLevel::default(), LogLevel::Info);
        assert_eq!(LogLevel::Warn.to_string(), "warn");
    }

    #[test]
    fn test_tracing_monitor_records_start() {
        let mut monitor = TracingMonitor::new(LogLevel::Error);
        assert!(monitor.started.is_none());
        monitor.on_start("pso", &progress());
        assert!(monitor.started.is_some());
        monitor.on_terminate("pso", &progress());
    }
}
