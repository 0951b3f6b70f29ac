use rayon::prelude::*;
use serde::Serialize;
use std::fmt;
use tracing::{info, warn};
use validator::Validate;

type Predicate<T> = Box<dyn Fn(&T) -> bool + Send + Sync>;

/// "For every row, this must hold", with the label reported next to the
/// violation count.
pub struct RowInvariant<T> {
    label: String,
    predicate: Predicate<T>,
}

impl<T> RowInvariant<T> {
    pub fn new<F>(label: impl Into<String>, predicate: F) -> Self
    where
        F: Fn(&T) -> bool + Send + Sync + 'static,
    {
        Self {
            label: label.into(),
            predicate: Box::new(predicate),
        }
    }

    pub fn label(&self) -> &str {
        &self.label
    }

    pub fn holds(&self, row: &T) -> bool {
        (self.predicate)(row)
    }
}

/// The `validator` rules declared on a record type, as one counted invariant.
pub fn field_rules<T: Validate + 'static>() -> RowInvariant<T> {
    RowInvariant::new("Data quality issues in field rules:", |row: &T| {
        row.validate().is_ok()
    })
}

impl<T> fmt::Debug for RowInvariant<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("RowInvariant")
            .field("label", &self.label)
            .finish_non_exhaustive()
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct InvariantOutcome {
    pub label: String,
    pub rows_checked: usize,
    pub violations: usize,
}

impl InvariantOutcome {
    pub fn passed(&self) -> bool {
        self.violations == 0
    }
}

/// A dataset-level structural check (non-empty, enough distinct keys, ...).
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct DatasetCheck {
    pub description: String,
    pub passed: bool,
}

/// Data-quality results of one processor run. Never fatal.
#[derive(Debug, Clone, Default, Serialize)]
pub struct QualityReport {
    pub dataset: String,
    pub invariants: Vec<InvariantOutcome>,
    pub checks: Vec<DatasetCheck>,
}

impl QualityReport {
    pub fn new(dataset: impl Into<String>) -> Self {
        Self {
            dataset: dataset.into(),
            ..Self::default()
        }
    }

    /// Record a structural check and log its verdict.
    pub fn record_check(&mut self, description: impl Into<String>, passed: bool) {
        let description = description.into();
        if passed {
            info!(dataset = %self.dataset, "Data Quality Check - passed: {}", description);
        } else {
            warn!(dataset = %self.dataset, "Data Quality Check - FAILED: {}", description);
        }
        self.checks.push(DatasetCheck {
            description,
            passed,
        });
    }

    pub fn total_violations(&self) -> usize {
        self.invariants.iter().map(|o| o.violations).sum()
    }

    pub fn all_passed(&self) -> bool {
        self.checks.iter().all(|c| c.passed) && self.invariants.iter().all(|o| o.passed())
    }
}

/// Evaluates row invariants over a materialised dataset.
///
/// Rows are only ever borrowed immutably; large datasets are scanned on the
/// rayon pool.
pub struct InvariantChecker {
    parallel_threshold: usize,
}

impl InvariantChecker {
    pub fn new() -> Self {
        Self {
            parallel_threshold: 10_000,
        }
    }

    pub fn with_parallel_threshold(mut self, threshold: usize) -> Self {
        self.parallel_threshold = threshold;
        self
    }

    /// Count the rows violating `invariant`. An empty dataset has none.
    pub fn check<T: Sync>(&self, rows: &[T], invariant: &RowInvariant<T>) -> InvariantOutcome {
        let violations = if rows.len() >= self.parallel_threshold {
            rows.par_iter().filter(|row| !invariant.holds(row)).count()
        } else {
            rows.iter().filter(|row| !invariant.holds(row)).count()
        };

        if violations == 0 {
            info!("{} {}", invariant.label(), violations);
        } else {
            warn!("{} {}", invariant.label(), violations);
        }

        InvariantOutcome {
            label: invariant.label().to_string(),
            rows_checked: rows.len(),
            violations,
        }
    }

    /// Run every invariant and append the outcomes to `report`.
    pub fn check_all<T: Sync>(
        &self,
        rows: &[T],
        invariants: &[RowInvariant<T>],
        report: &mut QualityReport,
    ) {
        for invariant in invariants {
            let outcome = self.check(rows, invariant);
            report.invariants.push(outcome);
        }
    }

    /// Generate a console summary of a quality report
    pub fn generate_summary(&self, report: &QualityReport) -> String {
        let mut summary = String::new();

        summary.push_str(&format!("=== Data Quality Report: {} ===\n", report.dataset));

        for check in &report.checks {
            let verdict = if check.passed { "passed" } else { "FAILED" };
            summary.push_str(&format!(
                "Data Quality Check - {}: {}\n",
                verdict, check.description
            ));
        }

        for outcome in &report.invariants {
            let share = if outcome.rows_checked == 0 {
                0.0
            } else {
                100.0 * outcome.violations as f64 / outcome.rows_checked as f64
            };
            summary.push_str(&format!(
                "{} {} ({:.1}% of {} rows)\n",
                outcome.label, outcome.violations, share, outcome.rows_checked
            ));
        }

        if report.checks.is_empty() && report.invariants.is_empty() {
            summary.push_str("No checks configured\n");
        }

        summary
    }
}

impl Default for InvariantChecker {
    fn default() -> Self {
        Self::new()
    }
}
