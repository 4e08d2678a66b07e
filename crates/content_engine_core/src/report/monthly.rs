//! Monthly report: month range, run aggregation and text rendering.
//!
//! # Responsibility
//! - Turn a `YYYY-MM` month into inclusive day and timestamp bounds.
//! - Count runs per strategy, source, channel, combination and topic.
//! - Render the report as a JSON-ready value and as plain text.
//!
//! # Invariants
//! - Missing or blank fields land in the `unknown` / `(no-topic)` buckets.
//! - Ranked lists sort by count descending; ties keep first-seen order.
//! - Aggregation is a pure function of the record slice.

use crate::model::run_record::RunRecord;
use crate::repo::run_repo::{RepoError, RunRepository};
use crate::time::iso_timestamp;
use chrono::{DateTime, Datelike, NaiveDate, Utc};
use log::{error, info};
use once_cell::sync::Lazy;
use regex::Regex;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::error::Error;
use std::fmt::{Display, Formatter, Write as _};
use std::path::PathBuf;
use std::time::Instant;

pub const UNKNOWN_BUCKET: &str = "unknown";
pub const NO_TOPIC_BUCKET: &str = "(no-topic)";
pub const COMBO_SEPARATOR: &str = " | ";
pub const REPORT_TOP_LIMIT: usize = 12;
pub const MAX_COMBO_SAMPLES: usize = 3;

static MONTH_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^(\d{4})-(\d{2})$").expect("valid month regex"));

pub type ReportResult<T> = Result<T, ReportError>;

/// Failure while building, reading or writing monthly artifacts.
#[derive(Debug)]
pub enum ReportError {
    InvalidMonth(String),
    Repo(RepoError),
    Io { path: PathBuf, source: std::io::Error },
    Json { path: PathBuf, source: serde_json::Error },
}

impl Display for ReportError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::InvalidMonth(month) => write!(f, "invalid month `{month}`; expected YYYY-MM"),
            Self::Repo(err) => write!(f, "{err}"),
            Self::Io { path, source } => write!(f, "{}: {source}", path.display()),
            Self::Json { path, source } => write!(f, "{}: invalid JSON: {source}", path.display()),
        }
    }
}

impl Error for ReportError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::InvalidMonth(_) => None,
            Self::Repo(err) => Some(err),
            Self::Io { source, .. } => Some(source),
            Self::Json { source, .. } => Some(source),
        }
    }
}

impl From<RepoError> for ReportError {
    fn from(value: RepoError) -> Self {
        Self::Repo(value)
    }
}

/// Inclusive first and last calendar day of a month.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MonthRange {
    pub start_ymd: String,
    pub end_ymd: String,
}

impl MonthRange {
    /// First instant of the range, e.g. `2024-02-01T00:00:00.000Z`.
    pub fn start_iso(&self) -> String {
        format!("{}T00:00:00.000Z", self.start_ymd)
    }

    /// Last millisecond of the range, e.g. `2024-02-29T23:59:59.999Z`.
    pub fn end_iso(&self) -> String {
        format!("{}T23:59:59.999Z", self.end_ymd)
    }
}

/// Computes the day range of `month` (`YYYY-MM`).
///
/// The last day is the day before the first day of the following month.
pub fn month_range(month: &str) -> ReportResult<MonthRange> {
    let invalid = || ReportError::InvalidMonth(month.to_string());
    let captures = MONTH_RE.captures(month).ok_or_else(invalid)?;
    let year: i32 = captures[1].parse().map_err(|_| invalid())?;
    let month_number: u32 = captures[2].parse().map_err(|_| invalid())?;

    let first = NaiveDate::from_ymd_opt(year, month_number, 1).ok_or_else(invalid)?;
    let next_first = if month_number == 12 {
        NaiveDate::from_ymd_opt(year + 1, 1, 1)
    } else {
        NaiveDate::from_ymd_opt(year, month_number + 1, 1)
    }
    .ok_or_else(invalid)?;
    let last = next_first.pred_opt().ok_or_else(invalid)?;

    Ok(MonthRange {
        start_ymd: first.format("%Y-%m-%d").to_string(),
        end_ymd: format!("{month}-{:02}", last.day()),
    })
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct IdCount {
    pub id: String,
    pub count: usize,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ComboCount {
    pub key: String,
    pub count: usize,
    /// Up to `MAX_COMBO_SAMPLES` distinct titles, first-seen order.
    pub samples: Vec<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TopicCount {
    pub topic: String,
    pub count: usize,
}

/// Ranked counts derived from one record collection.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RunAggregate {
    pub docs_count: usize,
    pub by_strategy: Vec<IdCount>,
    pub by_source: Vec<IdCount>,
    pub by_channel: Vec<IdCount>,
    pub top_combos: Vec<ComboCount>,
    pub top_topics: Vec<TopicCount>,
}

/// Report document written to `reports/<month>.json`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MonthlyReport {
    pub month: String,
    pub range: MonthRange,
    pub docs_count: usize,
    pub by_strategy: Vec<IdCount>,
    pub by_source: Vec<IdCount>,
    pub by_channel: Vec<IdCount>,
    pub top_combos: Vec<ComboCount>,
    pub top_topics: Vec<TopicCount>,
    pub generated_at: String,
}

impl MonthlyReport {
    pub fn new(month: &str, range: MonthRange, aggregate: RunAggregate, generated_at: String) -> Self {
        Self {
            month: month.to_string(),
            range,
            docs_count: aggregate.docs_count,
            by_strategy: aggregate.by_strategy,
            by_source: aggregate.by_source,
            by_channel: aggregate.by_channel,
            top_combos: aggregate.top_combos,
            top_topics: aggregate.top_topics,
            generated_at,
        }
    }
}

/// Insertion-ordered counter.
#[derive(Default)]
struct Tally {
    index: HashMap<String, usize>,
    entries: Vec<(String, usize)>,
}

impl Tally {
    fn bump(&mut self, key: &str) -> usize {
        let position = match self.index.get(key) {
            Some(position) => *position,
            None => {
                self.index.insert(key.to_string(), self.entries.len());
                self.entries.push((key.to_string(), 0));
                self.entries.len() - 1
            }
        };
        self.entries[position].1 += 1;
        position
    }

    fn ranked(self) -> Vec<(String, usize)> {
        let mut entries = self.entries;
        entries.sort_by(|left, right| right.1.cmp(&left.1));
        entries
    }
}

fn field_or<'a>(value: Option<&'a str>, fallback: &'a str) -> &'a str {
    value
        .filter(|value| !value.trim().is_empty())
        .unwrap_or(fallback)
}

/// Counts `records` in a single pass.
pub fn aggregate_runs(records: &[RunRecord]) -> RunAggregate {
    let mut strategies = Tally::default();
    let mut sources = Tally::default();
    let mut channels = Tally::default();
    let mut topics = Tally::default();
    let mut combos = Tally::default();
    let mut samples: Vec<Vec<String>> = Vec::new();

    for record in records {
        let strategy_id = field_or(record.strategy_id.as_deref(), UNKNOWN_BUCKET);
        let source_id = field_or(record.source_id.as_deref(), UNKNOWN_BUCKET);
        let channel_id = field_or(record.channel_id.as_deref(), UNKNOWN_BUCKET);

        strategies.bump(strategy_id);
        sources.bump(source_id);
        channels.bump(channel_id);
        topics.bump(field_or(record.topic.as_deref(), NO_TOPIC_BUCKET));

        let combo_key = [strategy_id, source_id, channel_id].join(COMBO_SEPARATOR);
        let position = combos.bump(&combo_key);
        if position == samples.len() {
            samples.push(Vec::new());
        }

        let title = record
            .title
            .as_deref()
            .filter(|title| !title.trim().is_empty());
        if let Some(title) = title {
            let combo_samples = &mut samples[position];
            if combo_samples.len() < MAX_COMBO_SAMPLES
                && !combo_samples.iter().any(|seen| seen == title)
            {
                combo_samples.push(title.to_string());
            }
        }
    }

    let mut combo_rows: Vec<ComboCount> = combos
        .entries
        .into_iter()
        .zip(samples)
        .map(|((key, count), samples)| ComboCount { key, count, samples })
        .collect();
    combo_rows.sort_by(|left, right| right.count.cmp(&left.count));
    combo_rows.truncate(REPORT_TOP_LIMIT);

    let to_ids = |tally: Tally| -> Vec<IdCount> {
        tally
            .ranked()
            .into_iter()
            .map(|(id, count)| IdCount { id, count })
            .collect()
    };

    RunAggregate {
        docs_count: records.len(),
        by_strategy: to_ids(strategies),
        by_source: to_ids(sources),
        by_channel: to_ids(channels),
        top_combos: combo_rows,
        top_topics: topics
            .ranked()
            .into_iter()
            .take(REPORT_TOP_LIMIT)
            .map(|(topic, count)| TopicCount { topic, count })
            .collect(),
    }
}

/// Loads the month's runs from `repo` and aggregates them.
pub fn build_monthly_report(
    repo: &dyn RunRepository,
    month: &str,
    now: DateTime<Utc>,
) -> ReportResult<MonthlyReport> {
    let started_at = Instant::now();
    let range = month_range(month)?;

    let records = match repo.list_runs_saved_between(&range.start_iso(), &range.end_iso()) {
        Ok(records) => records,
        Err(err) => {
            error!(
                "event=report_build module=report status=error month={} error_code=repo_read_failed error={}",
                month, err
            );
            return Err(err.into());
        }
    };

    let report = MonthlyReport::new(month, range, aggregate_runs(&records), iso_timestamp(now));
    info!(
        "event=report_build module=report status=ok month={} docs={} duration_ms={}",
        month,
        report.docs_count,
        started_at.elapsed().as_millis()
    );
    Ok(report)
}

/// Renders the console summary of `report`.
pub fn render_report_text(report: &MonthlyReport) -> String {
    let mut out = String::new();
    let _ = writeln!(out, "[content-engine] Monthly check: {}", report.month);
    let _ = writeln!(
        out,
        "Range (ymd): {} .. {}",
        report.range.start_ymd, report.range.end_ymd
    );
    out.push('\n');
    let _ = writeln!(out, "Docs: {}", report.docs_count);
    out.push('\n');

    for (title, rows) in [
        ("By Strategy", &report.by_strategy),
        ("By Source", &report.by_source),
        ("By Channel", &report.by_channel),
    ] {
        let _ = writeln!(out, "== {title} ==");
        for row in rows {
            let _ = writeln!(out, "- {}: {}", row.id, row.count);
        }
        out.push('\n');
    }

    let _ = writeln!(out, "== Top combos (strategy | source | channel) ==");
    for combo in &report.top_combos {
        let _ = writeln!(out, "- {}: {}", combo.key, combo.count);
        if !combo.samples.is_empty() {
            let _ = writeln!(out, "  samples: {}", combo.samples.join(" / "));
        }
    }
    out.push('\n');

    let _ = writeln!(out, "== Top topics ==");
    for topic in &report.top_topics {
        let _ = writeln!(out, "- {}: {}", topic.topic, topic.count);
    }
    out.push('\n');
    out
}
