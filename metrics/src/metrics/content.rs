use chrono::NaiveDate;
use serde::{
    Deserialize,
    Serialize,
};

/// Authors shown on the leaderboard before it is expanded.
pub const DEFAULT_TOP_AUTHORS: usize = 5;

/// Assignee on the leaderboard. The display name doubles as identifier, the tracker exposes nothing more stable here.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct Author {
    pub id: String,
    pub name: String,
    pub content_count: usize,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct ContentItem {
    pub id: String,
    pub title: String,
    /// Display name of the workflow state.
    pub status: String,
    pub due_date: Option<NaiveDate>,
    pub assignee: Option<String>,
    pub project: Option<String>,
    /// Source workspace, only set in the aggregate view.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub workspace: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct MonthlyContent {
    /// Month start as ISO timestamp, e.g. `2024-03-01T00:00:00.000Z`.
    pub month: String,
    pub planned: usize,
    pub completed: usize,
}

/// Histogram bucket keyed by the raw workflow state name.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct WorkflowStateCount {
    pub name: String,
    pub count: usize,
}

/// Change between the last two monthly buckets, in percent.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct MonthOverMonth {
    pub planned_change_percent: Option<f64>,
    pub completed_change_percent: Option<f64>,
}

/// Content pipeline metrics for one workspace or the aggregate of several.
///
/// `completed + in_progress + backlog` can differ from `total`: canceled issues are counted as backlog.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct ContentMetrics {
    pub total: usize,
    pub completed: usize,
    pub in_progress: usize,
    pub backlog: usize,
    pub completion_rate: f64,
    pub authors: Vec<Author>,
    pub projects: Vec<String>,
    pub monthly_growth: Vec<MonthlyContent>,
    pub upcoming_content: Vec<ContentItem>,
    pub overdue_content: Vec<ContentItem>,
    pub workflow_states: Vec<WorkflowStateCount>,
}

/// `completed / total * 100`, or zero for an empty set.
pub fn completion_rate(completed: usize, total: usize) -> f64 {
    if total == 0 {
        return 0.0;
    }
    completed as f64 / total as f64 * 100.0
}

impl ContentMetrics {
    pub fn is_empty(&self) -> bool {
        self.total == 0
    }

    /// Percentage of `total` that `count` represents.
    pub fn share_of_total(&self, count: usize) -> f64 {
        completion_rate(count, self.total)
    }

    pub fn top_authors(&self, n: usize) -> &[Author] {
        &self.authors[..n.min(self.authors.len())]
    }

    pub fn month_over_month(&self) -> MonthOverMonth {
        let change = |previous: usize, current: usize| {
            (previous > 0).then(|| (current as f64 - previous as f64) / previous as f64 * 100.0)
        };

        match self.monthly_growth.as_slice() {
            [.., previous, current] => MonthOverMonth {
                planned_change_percent: change(previous.planned, current.planned),
                completed_change_percent: change(previous.completed, current.completed),
            },
            _ => MonthOverMonth {
                planned_change_percent: None,
                completed_change_percent: None,
            },
        }
    }
}
