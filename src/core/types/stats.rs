use std::collections::BTreeMap;
use std::sync::Arc;
use std::time::Duration;

use chrono::{DateTime, Utc};

use crate::types::ExecutionOutcome;

fn duration_from_nanos(nanos: u128) -> Duration {
    let secs = (nanos / 1_000_000_000) as u64;
    let subsec = (nanos % 1_000_000_000) as u32;
    Duration::new(secs, subsec)
}

/// Smallest and largest samples seen so far, with the query that produced each
#[derive(Debug, Clone, Default, PartialEq, Eq)]
struct Extremes {
    min: Option<(Duration, Arc<str>)>,
    max: Option<(Duration, Arc<str>)>,
}

impl Extremes {
    fn observe(&mut self, duration: Duration, query: &Arc<str>) {
        if self.min.as_ref().is_none_or(|(min, _)| duration < *min) {
            self.min = Some((duration, Arc::clone(query)));
        }
        if self.max.as_ref().is_none_or(|(max, _)| duration > *max) {
            self.max = Some((duration, Arc::clone(query)));
        }
    }
}

/// Per-worker accumulator
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct WorkerStats {
    total_executions: u64,
    total_duration: Duration,
    extremes: Extremes,
}

impl WorkerStats {
    fn record(&mut self, outcome: &ExecutionOutcome) {
        self.total_executions += 1;
        self.total_duration += outcome.duration;
        self.extremes.observe(outcome.duration, &outcome.query);
    }

    pub fn total_executions(&self) -> u64 {
        self.total_executions
    }

    pub fn total_duration(&self) -> Duration {
        self.total_duration
    }

    /// Mean execution time, `None` until the first sample
    pub fn average(&self) -> Option<Duration> {
        if self.total_executions == 0 {
            return None;
        }
        Some(duration_from_nanos(
            self.total_duration.as_nanos() / self.total_executions as u128,
        ))
    }

    pub fn min_duration(&self) -> Option<Duration> {
        self.extremes.min.as_ref().map(|(d, _)| *d)
    }

    pub fn max_duration(&self) -> Option<Duration> {
        self.extremes.max.as_ref().map(|(d, _)| *d)
    }

    pub fn query_at_min(&self) -> Option<&str> {
        self.extremes.min.as_ref().map(|(_, q)| q.as_ref())
    }

    pub fn query_at_max(&self) -> Option<&str> {
        self.extremes.max.as_ref().map(|(_, q)| q.as_ref())
    }
}

/// Process-wide accumulator for one run.
///
/// The running average is kept as an integer nanosecond mean plus the
/// remainder of the division, so `average()` is always exactly
/// `floor(sum / n)` and the final value does not depend on the order in
/// which outcomes were recorded.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GlobalStats {
    total_executions: u64,
    success_count: u64,
    failure_count: u64,
    extremes: Extremes,
    average_nanos: u128,
    average_remainder: u128,
    per_worker: BTreeMap<u32, WorkerStats>,
    start_time: DateTime<Utc>,
}

impl GlobalStats {
    pub fn new(start_time: DateTime<Utc>) -> Self {
        Self {
            total_executions: 0,
            success_count: 0,
            failure_count: 0,
            extremes: Extremes::default(),
            average_nanos: 0,
            average_remainder: 0,
            per_worker: BTreeMap::new(),
            start_time,
        }
    }

    /// Fold one outcome into the totals. Callers must hold exclusive access.
    pub fn record(&mut self, outcome: &ExecutionOutcome) {
        self.total_executions += 1;
        if outcome.succeeded {
            self.success_count += 1;
        } else {
            self.failure_count += 1;
        }

        self.extremes.observe(outcome.duration, &outcome.query);
        self.update_average(outcome.duration);

        self.per_worker
            .entry(outcome.worker_id)
            .or_default()
            .record(outcome);
    }

    // avg += (d - avg) / n, carrying the remainder of the division
    fn update_average(&mut self, sample: Duration) {
        let n = self.total_executions as i128;
        let delta =
            self.average_remainder as i128 + sample.as_nanos() as i128 - self.average_nanos as i128;
        self.average_nanos = (self.average_nanos as i128 + delta.div_euclid(n)) as u128;
        self.average_remainder = delta.rem_euclid(n) as u128;
    }

    pub fn total_executions(&self) -> u64 {
        self.total_executions
    }

    pub fn success_count(&self) -> u64 {
        self.success_count
    }

    pub fn failure_count(&self) -> u64 {
        self.failure_count
    }

    pub fn min_duration(&self) -> Option<Duration> {
        self.extremes.min.as_ref().map(|(d, _)| *d)
    }

    pub fn max_duration(&self) -> Option<Duration> {
        self.extremes.max.as_ref().map(|(d, _)| *d)
    }

    /// Query text of the fastest execution across all workers
    pub fn query_at_min(&self) -> Option<&str> {
        self.extremes.min.as_ref().map(|(_, q)| q.as_ref())
    }

    /// Query text of the slowest execution across all workers
    pub fn query_at_max(&self) -> Option<&str> {
        self.extremes.max.as_ref().map(|(_, q)| q.as_ref())
    }

    /// Running mean across all workers, `None` until the first sample
    pub fn average(&self) -> Option<Duration> {
        (self.total_executions > 0).then(|| duration_from_nanos(self.average_nanos))
    }

    pub fn per_worker(&self) -> &BTreeMap<u32, WorkerStats> {
        &self.per_worker
    }

    pub fn worker(&self, worker_id: u32) -> Option<&WorkerStats> {
        self.per_worker.get(&worker_id)
    }

    pub fn start_time(&self) -> DateTime<Utc> {
        self.start_time
    }

    pub fn failure_percentage(&self) -> f64 {
        percentage(self.failure_count, self.total_executions)
    }

    pub fn success_percentage(&self) -> f64 {
        percentage(self.success_count, self.total_executions)
    }
}

/// `count` as a percentage of `total`; 0 when nothing was recorded
pub fn percentage(count: u64, total: u64) -> f64 {
    if total == 0 {
        return 0.0;
    }
    count as f64 / total as f64 * 100.0
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn outcome(worker_id: u32, millis: u64, succeeded: bool) -> ExecutionOutcome {
        ExecutionOutcome {
            worker_id,
            duration: Duration::from_millis(millis),
            succeeded,
            query: Arc::from("SELECT 1"),
        }
    }

    #[test]
    fn empty_stats_have_no_extremes() {
        let stats = GlobalStats::new(Utc::now());
        assert_eq!(stats.total_executions(), 0);
        assert_eq!(stats.min_duration(), None);
        assert_eq!(stats.max_duration(), None);
        assert_eq!(stats.average(), None);
        assert_eq!(stats.failure_percentage(), 0.0);
        assert_eq!(stats.success_percentage(), 0.0);
    }

    #[test]
    fn first_sample_sets_both_extremes() {
        let mut stats = GlobalStats::new(Utc::now());
        stats.record(&outcome(1, 7, true));

        assert_eq!(stats.min_duration(), Some(Duration::from_millis(7)));
        assert_eq!(stats.max_duration(), Some(Duration::from_millis(7)));
        assert_eq!(stats.average(), Some(Duration::from_millis(7)));

        let worker = stats.worker(1).unwrap();
        assert_eq!(worker.query_at_min(), Some("SELECT 1"));
        assert_eq!(worker.query_at_max(), Some("SELECT 1"));
    }

    #[test]
    fn counts_successes_and_failures() {
        let mut stats = GlobalStats::new(Utc::now());
        stats.record(&outcome(1, 3, true));
        stats.record(&outcome(2, 4, false));
        stats.record(&outcome(1, 5, true));

        assert_eq!(stats.total_executions(), 3);
        assert_eq!(stats.success_count(), 2);
        assert_eq!(stats.failure_count(), 1);
        assert_eq!(
            stats.success_count() + stats.failure_count(),
            stats.total_executions()
        );
        assert_eq!(format!("{:.2}", stats.failure_percentage()), "33.33");
    }

    #[test]
    fn running_average_is_floor_of_mean() {
        let mut stats = GlobalStats::new(Utc::now());
        for nanos in [1u64, 2, 2] {
            stats.record(&ExecutionOutcome::success(
                1,
                Duration::from_nanos(nanos),
                Arc::from("q"),
            ));
        }
        // 5 / 3 rounds down
        assert_eq!(stats.average(), Some(Duration::from_nanos(1)));
        stats.record(&ExecutionOutcome::success(
            1,
            Duration::from_nanos(7),
            Arc::from("q"),
        ));
        // 12 / 4
        assert_eq!(stats.average(), Some(Duration::from_nanos(3)));
    }

    #[test]
    fn average_stays_between_extremes() {
        let mut stats = GlobalStats::new(Utc::now());
        for (worker, millis) in [(1, 12), (2, 3), (1, 40), (3, 9), (2, 9)] {
            stats.record(&outcome(worker, millis, true));
        }

        let avg = stats.average().unwrap();
        assert!(stats.min_duration().unwrap() <= avg);
        assert!(avg <= stats.max_duration().unwrap());
        assert_eq!(avg, Duration::from_nanos(14_600_000));

        for worker in stats.per_worker().values() {
            let avg = worker.average().unwrap();
            assert!(worker.min_duration().unwrap() <= avg);
            assert!(avg <= worker.max_duration().unwrap());
        }
    }

    #[test]
    fn per_worker_extremes_track_their_own_samples() {
        let mut stats = GlobalStats::new(Utc::now());
        stats.record(&outcome(1, 10, true));
        stats.record(&outcome(2, 1, true));
        stats.record(&outcome(1, 30, false));

        let worker = stats.worker(1).unwrap();
        assert_eq!(worker.total_executions(), 2);
        assert_eq!(worker.total_duration(), Duration::from_millis(40));
        assert_eq!(worker.min_duration(), Some(Duration::from_millis(10)));
        assert_eq!(worker.max_duration(), Some(Duration::from_millis(30)));
        assert_eq!(worker.average(), Some(Duration::from_millis(20)));

        assert_eq!(stats.min_duration(), Some(Duration::from_millis(1)));
        assert_eq!(stats.max_duration(), Some(Duration::from_millis(30)));
    }

    #[test]
    fn global_extremes_remember_their_query() {
        let mut stats = GlobalStats::new(Utc::now());
        assert_eq!(stats.query_at_min(), None);
        assert_eq!(stats.query_at_max(), None);

        stats.record(&ExecutionOutcome::success(
            1,
            Duration::from_millis(4),
            Arc::from("SELECT 1"),
        ));
        stats.record(&ExecutionOutcome::success(
            2,
            Duration::from_millis(9),
            Arc::from("SELECT SLEEP(0.009)"),
        ));

        assert_eq!(stats.query_at_min(), Some("SELECT 1"));
        assert_eq!(stats.query_at_max(), Some("SELECT SLEEP(0.009)"));
    }

    #[test]
    fn percentage_guards_division_by_zero() {
        assert_eq!(percentage(0, 0), 0.0);
        assert_eq!(percentage(5, 0), 0.0);
        assert_eq!(percentage(1, 4), 25.0);
    }
}
