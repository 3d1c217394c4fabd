use std::collections::HashSet;

use chrono::NaiveDate;

use crate::models::MetricSnapshot;

/// Maximum number of daily points retained for the trend chart.
pub const WINDOW_CAPACITY: usize = 10;

/// What a merge did to the window.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MergeOutcome {
    /// Nothing new: empty response, or every date already held.
    Unchanged,
    /// First non-empty response seeded the window.
    Seeded { retained: usize },
    /// Steady-state merge brought in new dates.
    Merged { added: usize, evicted: usize },
}

/// Bounded, date-ordered, deduplicated buffer of metric snapshots.
///
/// Points are always strictly increasing by `calculation_date` and never
/// exceed [`WINDOW_CAPACITY`]. A date already held keeps its first-seen
/// snapshot; later responses for that date are ignored.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct MetricsWindow {
    points: Vec<MetricSnapshot>,
    initialized: bool,
}

impl MetricsWindow {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn points(&self) -> &[MetricSnapshot] {
        &self.points
    }

    pub fn is_initialized(&self) -> bool {
        self.initialized
    }

    pub fn len(&self) -> usize {
        self.points.len()
    }

    #[allow(dead_code)]
    pub fn is_empty(&self) -> bool {
        self.points.is_empty()
    }

    #[allow(dead_code)]
    pub fn latest_date(&self) -> Option<NaiveDate> {
        self.points.last().map(|p| p.calculation_date)
    }

    /// Back to the cold-start state.
    pub fn reset(&mut self) {
        self.points.clear();
        self.initialized = false;
    }

    /// Fold one fetch response into the window.
    pub fn merge(&mut self, response: Vec<MetricSnapshot>) -> MergeOutcome {
        if response.is_empty() {
            return MergeOutcome::Unchanged;
        }

        let mut seen: HashSet<NaiveDate> =
            self.points.iter().map(|p| p.calculation_date).collect();
        // `insert` is false for dates already held and for repeats inside the
        // response, so the first occurrence wins in both cases.
        let fresh: Vec<MetricSnapshot> = response
            .into_iter()
            .filter(|p| seen.insert(p.calculation_date))
            .collect();

        let seeding = !self.initialized;
        self.initialized = true;

        if fresh.is_empty() {
            return MergeOutcome::Unchanged;
        }

        let previous: HashSet<NaiveDate> =
            self.points.iter().map(|p| p.calculation_date).collect();

        self.points.extend(fresh);
        self.points.sort_by_key(|p| p.calculation_date);
        let overflow = self.points.len().saturating_sub(WINDOW_CAPACITY);
        self.points.drain(..overflow);

        if seeding {
            return MergeOutcome::Seeded {
                retained: self.points.len(),
            };
        }

        let kept_previous = self
            .points
            .iter()
            .filter(|p| previous.contains(&p.calculation_date))
            .count();
        let added = self.points.len() - kept_previous;
        let evicted = previous.len() - kept_previous;

        if added == 0 {
            // Only dates older than the whole window came in and fell straight off.
            return MergeOutcome::Unchanged;
        }

        MergeOutcome::Merged { added, evicted }
    }
}
