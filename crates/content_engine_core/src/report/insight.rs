//! Monthly insight: draft from a report, file I/O and store upsert.
//!
//! # Responsibility
//! - Derive an editable insight draft from a `MonthlyReport`.
//! - Merge an edited insight file over the default document and persist it.
//!
//! # Invariants
//! - The persisted `month` and `decidedAt` are always set by this module,
//!   whatever the file contains.

use crate::report::monthly::{month_range, IdCount, MonthlyReport, ReportError, ReportResult};
use crate::repo::insight_repo::{InsightDocument, InsightRepository};
use crate::time::iso_timestamp;
use chrono::{DateTime, Utc};
use log::{error, info};
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::path::{Path, PathBuf};

pub const DEFAULT_FEELING: &str = "quiet";

const MISSING_MARK: &str = "-";
const DEFAULT_OBSERVATION: &str = "(write this month's observations here)";
const DECISION_PLACEHOLDER: &str = "(write just one thing to do next month)";
const EXPERIMENT_PLACEHOLDER: &str = "(one thing to try, if any)";
const STOP_DOING_PLACEHOLDER: &str = "(one thing to stop, if any)";
const INSIGHT_NOTES: &str = "Analysis is not for finding the right answer but for choosing \
what to try next. Not getting tired matters more than the numbers.";

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct InsightSummary {
    pub feeling: String,
}

/// Editable draft written to `insights/<month>.json`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct InsightDraft {
    pub summary: InsightSummary,
    pub observations: Vec<String>,
    pub decisions: Vec<String>,
    pub experiments: Vec<String>,
    pub stop_doing: Vec<String>,
    pub notes: String,
}

/// Stored insight document for one month.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MonthlyInsight {
    pub month: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub summary: Option<InsightSummary>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub observations: Option<Vec<String>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub decisions: Option<Vec<String>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub experiments: Option<Vec<String>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub stop_doing: Option<Vec<String>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub notes: Option<String>,
    pub decided_at: String,
}

impl MonthlyInsight {
    /// Placeholder insight used when no edited file is supplied.
    pub fn placeholder(month: &str, decided_at: &str) -> Self {
        Self {
            month: month.to_string(),
            summary: Some(InsightSummary {
                feeling: DEFAULT_FEELING.to_string(),
            }),
            observations: Some(vec![DEFAULT_OBSERVATION.to_string()]),
            decisions: Some(vec![DECISION_PLACEHOLDER.to_string()]),
            experiments: Some(vec![EXPERIMENT_PLACEHOLDER.to_string()]),
            stop_doing: Some(vec![STOP_DOING_PLACEHOLDER.to_string()]),
            notes: Some(INSIGHT_NOTES.to_string()),
            decided_at: decided_at.to_string(),
        }
    }
}

fn top_id(rows: &[IdCount]) -> String {
    rows.first()
        .map(|row| format!("{} ({})", row.id, row.count))
        .unwrap_or_else(|| MISSING_MARK.to_string())
}

/// Builds the editable insight draft for `report`.
pub fn build_insight_draft(report: &MonthlyReport) -> InsightDraft {
    let top_combo = report
        .top_combos
        .first()
        .map(|combo| format!("{} ({})", combo.key, combo.count))
        .unwrap_or_else(|| MISSING_MARK.to_string());
    let top_topic = report
        .top_topics
        .first()
        .map(|topic| format!("{} ({})", topic.topic, topic.count))
        .unwrap_or_else(|| MISSING_MARK.to_string());

    InsightDraft {
        summary: InsightSummary {
            feeling: DEFAULT_FEELING.to_string(),
        },
        observations: vec![
            format!("Main channel was {}.", top_id(&report.by_channel)),
            format!("Strongest material came from {}.", top_id(&report.by_source)),
            format!("The strategy that stuck was {}.", top_id(&report.by_strategy)),
            format!("The strongest combination was {top_combo}."),
            format!("Topics converged on {top_topic}."),
        ],
        decisions: vec![DECISION_PLACEHOLDER.to_string()],
        experiments: vec![EXPERIMENT_PLACEHOLDER.to_string()],
        stop_doing: vec![STOP_DOING_PLACEHOLDER.to_string()],
        notes: INSIGHT_NOTES.to_string(),
    }
}

/// Default document with `overlay` merged on top; `month`/`decidedAt` forced.
pub fn merge_insight(month: &str, overlay: Option<&InsightDocument>, decided_at: &str) -> InsightDocument {
    let mut document = match serde_json::to_value(MonthlyInsight::placeholder(month, decided_at)) {
        Ok(Value::Object(map)) => map,
        _ => InsightDocument::new(),
    };
    if let Some(overlay) = overlay {
        for (key, value) in overlay {
            document.insert(key.clone(), value.clone());
        }
    }
    document.insert("month".to_string(), Value::String(month.to_string()));
    document.insert("decidedAt".to_string(), Value::String(decided_at.to_string()));
    document
}

/// Persists the insight for `month`, optionally read from `file`.
///
/// # Errors
/// - `InvalidMonth` for a malformed month.
/// - `Io`/`Json` when `file` cannot be read or is not a JSON object.
/// - `Repo` when the upsert fails.
pub fn write_monthly_insight(
    repo: &dyn InsightRepository,
    month: &str,
    file: Option<&Path>,
    now: DateTime<Utc>,
) -> ReportResult<InsightDocument> {
    month_range(month)?;
    let overlay = file.map(read_json_file::<InsightDocument>).transpose()?;
    let document = merge_insight(month, overlay.as_ref(), &iso_timestamp(now));

    match repo.upsert_insight(month, &document) {
        Ok(stored) => {
            info!(
                "event=insight_write module=report status=ok month={} from_file={}",
                month,
                file.is_some()
            );
            Ok(stored)
        }
        Err(err) => {
            error!(
                "event=insight_write module=report status=error month={} error_code=repo_write_failed error={}",
                month, err
            );
            Err(err.into())
        }
    }
}

/// Writes `value` as pretty JSON, creating parent directories.
///
/// Relative paths resolve against the working directory; returns the
/// absolute path written.
pub fn write_json_file<T: Serialize>(path: &Path, value: &T) -> ReportResult<PathBuf> {
    let absolute = absolutize(path)?;
    if let Some(parent) = absolute.parent() {
        std::fs::create_dir_all(parent).map_err(|source| ReportError::Io {
            path: parent.to_path_buf(),
            source,
        })?;
    }

    let text = serde_json::to_string_pretty(value).map_err(|source| ReportError::Json {
        path: absolute.clone(),
        source,
    })?;
    std::fs::write(&absolute, text).map_err(|source| ReportError::Io {
        path: absolute.clone(),
        source,
    })?;
    Ok(absolute)
}

/// Reads and parses a JSON file.
pub fn read_json_file<T: DeserializeOwned>(path: &Path) -> ReportResult<T> {
    let text = std::fs::read_to_string(path).map_err(|source| ReportError::Io {
        path: path.to_path_buf(),
        source,
    })?;
    serde_json::from_str(&text).map_err(|source| ReportError::Json {
        path: path.to_path_buf(),
        source,
    })
}

fn absolutize(path: &Path) -> ReportResult<PathBuf> {
    if path.is_absolute() {
        return Ok(path.to_path_buf());
    }
    std::env::current_dir()
        .map(|cwd| cwd.join(path))
        .map_err(|source| ReportError::Io {
            path: path.to_path_buf(),
            source,
        })
}
