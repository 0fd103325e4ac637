use std::time::Duration;

use chrono::{DateTime, SecondsFormat, Utc};
use log::info;
use serde::Serialize;
use strum::{Display, EnumString};

use crate::types::{AppResult, GlobalStats, percentage};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Display, EnumString)]
#[strum(serialize_all = "lowercase", ascii_case_insensitive)]
pub enum ReportFormat {
    #[default]
    Table,
    Json,
}

/// Final statistics of a run together with its wall-clock bounds
#[derive(Debug, Clone)]
pub struct RunReport {
    stats: GlobalStats,
    end_time: DateTime<Utc>,
    interrupted: bool,
}

#[derive(Debug, Serialize)]
struct JsonWorker {
    worker: u32,
    total_queries: u64,
    average_ms: Option<f64>,
    fastest_ms: Option<f64>,
    slowest_ms: Option<f64>,
}

#[derive(Debug, Serialize)]
struct JsonReport {
    total_queries: u64,
    successful_queries: u64,
    failed_queries: u64,
    success_percent: f64,
    failure_percent: f64,
    average_ms: Option<f64>,
    longest_ms: Option<f64>,
    shortest_ms: Option<f64>,
    longest_query: Option<String>,
    shortest_query: Option<String>,
    queries_per_second: f64,
    workers: Vec<JsonWorker>,
    start_time: String,
    end_time: String,
    interrupted: bool,
}

fn millis(duration: Option<Duration>) -> Option<f64> {
    duration.map(|d| d.as_nanos() as f64 / 1_000_000.0)
}

fn format_duration(duration: Option<Duration>) -> String {
    match duration {
        Some(d) => format!("{d:?}"),
        None => "N/A".to_string(),
    }
}

fn format_time(time: DateTime<Utc>) -> String {
    time.to_rfc3339_opts(SecondsFormat::Secs, true)
}

impl RunReport {
    pub fn new(stats: GlobalStats, end_time: DateTime<Utc>, interrupted: bool) -> Self {
        Self {
            stats,
            end_time,
            interrupted,
        }
    }

    pub fn stats(&self) -> &GlobalStats {
        &self.stats
    }

    pub fn start_time(&self) -> DateTime<Utc> {
        self.stats.start_time()
    }

    pub fn end_time(&self) -> DateTime<Utc> {
        self.end_time
    }

    pub fn interrupted(&self) -> bool {
        self.interrupted
    }

    /// Executions per second over the wall-clock span of the run
    pub fn throughput(&self) -> f64 {
        let elapsed = (self.end_time - self.start_time())
            .to_std()
            .unwrap_or_default()
            .as_secs_f64();
        if elapsed > 0.0 {
            self.stats.total_executions() as f64 / elapsed
        } else {
            0.0
        }
    }

    pub fn render(&self, format: ReportFormat) -> AppResult<()> {
        match format {
            ReportFormat::Json => println!("{}", self.to_json()?),
            ReportFormat::Table => {
                for line in self.table_lines() {
                    info!("{line}");
                }
            }
        }
        Ok(())
    }

    pub fn to_json(&self) -> serde_json::Result<String> {
        let stats = &self.stats;
        let report = JsonReport {
            total_queries: stats.total_executions(),
            successful_queries: stats.success_count(),
            failed_queries: stats.failure_count(),
            success_percent: stats.success_percentage(),
            failure_percent: stats.failure_percentage(),
            average_ms: millis(stats.average()),
            longest_ms: millis(stats.max_duration()),
            shortest_ms: millis(stats.min_duration()),
            longest_query: stats.query_at_max().map(str::to_string),
            shortest_query: stats.query_at_min().map(str::to_string),
            queries_per_second: self.throughput(),
            workers: stats
                .per_worker()
                .iter()
                .map(|(id, w)| JsonWorker {
                    worker: *id,
                    total_queries: w.total_executions(),
                    average_ms: millis(w.average()),
                    fastest_ms: millis(w.min_duration()),
                    slowest_ms: millis(w.max_duration()),
                })
                .collect(),
            start_time: format_time(self.start_time()),
            end_time: format_time(self.end_time),
            interrupted: self.interrupted,
        };
        serde_json::to_string_pretty(&report)
    }

    pub fn table_lines(&self) -> Vec<String> {
        let stats = &self.stats;
        let mut lines = vec![
            "Results:".to_string(),
            format!("1. Total queries executed: {}", stats.total_executions()),
            "2. Queries per user:".to_string(),
            format!(
                "   {:>6} | {:>13} | {:>14} | {:>14} | {:>14}",
                "User", "Total Queries", "Average Time", "Fastest Time", "Slowest Time"
            ),
        ];
        for (id, worker) in stats.per_worker() {
            lines.push(format!(
                "   {:>6} | {:>13} | {:>14} | {:>14} | {:>14}",
                id,
                worker.total_executions(),
                format_duration(worker.average()),
                format_duration(worker.min_duration()),
                format_duration(worker.max_duration()),
            ));
        }
        lines.extend([
            format!(
                "3. Average query completion time: {}",
                format_duration(stats.average())
            ),
            format!(
                "4. Longest query execution time: {}",
                format_duration(stats.max_duration())
            ),
            format!(
                "5. Shortest query execution time: {}",
                format_duration(stats.min_duration())
            ),
            format!("6. Throughput: {:.2} queries/s", self.throughput()),
            format!(
                "7. Number of unsuccessful queries (in percentage): {:.2}%",
                percentage(stats.failure_count(), stats.total_executions())
            ),
            format!(
                "8. Number of successful queries (in percentage): {:.2}%",
                percentage(stats.success_count(), stats.total_executions())
            ),
            format!("9. CLI start time: {}", format_time(self.start_time())),
            format!("10. CLI end time: {}", format_time(self.end_time)),
        ]);
        if self.interrupted {
            lines.push("Run was interrupted; totals cover completed executions only".to_string());
        }
        lines
    }
}
