use crate::{
    classify::classify,
    metrics::{
        completion_rate,
        Author,
        Category,
        ContentItem,
        ContentMetrics,
        MonthlyContent,
        WorkflowStateCount,
    },
    source::RawIssue,
};
use chrono::{
    DateTime,
    Datelike,
    NaiveDate,
    NaiveTime,
    TimeDelta,
    Utc,
};
use content_pipeline_config::Config;
use std::collections::{
    BTreeMap,
    HashMap,
    HashSet,
};

/// Status shown for issues without a workflow state.
pub const UNKNOWN_STATUS: &str = "Unknown";

/// State name counted as completed in the monthly buckets. Case-sensitive.
const PUBLISHED: &str = "Published";

/// State names that never show up as overdue. Matched exactly, independent of [`classify`].
pub const OVERDUE_EXEMPT_STATES: &[&str] = &["Published", "Final Review"];

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct MetricsOptions {
    /// How far ahead a due date counts as upcoming.
    pub upcoming_window: TimeDelta,
}

impl Default for MetricsOptions {
    fn default() -> Self {
        Self {
            upcoming_window: TimeDelta::days(30),
        }
    }
}

impl MetricsOptions {
    pub fn from_config(config: &Config) -> Self {
        Self {
            upcoming_window: TimeDelta::from_std(config.upcoming_window()).unwrap_or(TimeDelta::MAX),
        }
    }
}

/// Month bucket key, the first of the month at midnight UTC in ISO layout.
pub fn month_key(timestamp: DateTime<Utc>) -> String {
    format!("{:04}-{:02}-01T00:00:00.000Z", timestamp.year(), timestamp.month())
}

fn due_at(date: NaiveDate) -> DateTime<Utc> {
    date.and_time(NaiveTime::MIN).and_utc()
}

fn content_item(issue: &RawIssue) -> ContentItem {
    ContentItem {
        id: issue.id.clone(),
        title: issue.title.clone(),
        status: issue.state_name().unwrap_or(UNKNOWN_STATUS).to_string(),
        due_date: issue.due_date,
        assignee: issue.assignee_name().map(str::to_string),
        project: issue.project_name().map(str::to_string),
        workspace: None,
    }
}

/// Compute the dashboard metrics of one workspace.
///
/// Pure: `now` is passed in, issue order only matters for ties, which keep their encounter order.
pub fn compute_metrics(issues: &[RawIssue], now: DateTime<Utc>, options: &MetricsOptions) -> ContentMetrics {
    let categories = issues
        .iter()
        .map(|issue| classify(issue.state_name()))
        .collect::<Vec<_>>();
    let count = |wanted: &[Category]| categories.iter().filter(|c| wanted.contains(c)).count();

    let total = issues.len();
    let completed = count(&[Category::Completed]);
    let in_progress = count(&[Category::InProgress]);
    // canceled issues are reported as backlog
    let backlog = count(&[Category::Backlog, Category::Canceled]);

    let mut authors: Vec<Author> = Vec::new();
    let mut author_index: HashMap<&str, usize> = HashMap::new();
    for name in issues.iter().filter_map(RawIssue::assignee_name).filter(|n| !n.is_empty()) {
        match author_index.get(name) {
            Some(&idx) => authors[idx].content_count += 1,
            None => {
                author_index.insert(name, authors.len());
                authors.push(Author {
                    id: name.to_string(),
                    name: name.to_string(),
                    content_count: 1,
                });
            }
        }
    }
    authors.sort_by(|a, b| b.content_count.cmp(&a.content_count));

    let mut seen_projects = HashSet::new();
    let projects = issues
        .iter()
        .filter_map(RawIssue::project_name)
        .filter(|name| !name.is_empty() && seen_projects.insert(*name))
        .map(str::to_string)
        .collect();

    let mut months: BTreeMap<String, MonthlyContent> = BTreeMap::new();
    for issue in issues {
        let key = month_key(issue.created_at);
        let bucket = months.entry(key.clone()).or_insert_with(|| MonthlyContent {
            month: key,
            planned: 0,
            completed: 0,
        });
        bucket.planned += 1;
        if issue.state_name() == Some(PUBLISHED) {
            bucket.completed += 1;
        }
    }

    // a window reaching past the representable range is unbounded
    let window_end = now
        .checked_add_signed(options.upcoming_window)
        .unwrap_or(DateTime::<Utc>::MAX_UTC);
    let mut upcoming_content = issues
        .iter()
        .zip(&categories)
        .filter(|(issue, category)| {
            **category != Category::Completed
                && issue.due_date.map(due_at).is_some_and(|due| due > now && due < window_end)
        })
        .map(|(issue, _)| content_item(issue))
        .collect::<Vec<_>>();
    upcoming_content.sort_by_key(|item| item.due_date);

    let mut overdue_content = issues
        .iter()
        .filter(|issue| {
            issue.due_date.map(due_at).is_some_and(|due| due < now)
                && !issue.state_name().is_some_and(|name| OVERDUE_EXEMPT_STATES.contains(&name))
        })
        .map(content_item)
        .collect::<Vec<_>>();
    overdue_content.sort_by_key(|item| item.due_date);

    let mut workflow_states: Vec<WorkflowStateCount> = Vec::new();
    for name in issues.iter().map(|issue| issue.state_name().unwrap_or(UNKNOWN_STATUS)) {
        match workflow_states.iter_mut().find(|bucket| bucket.name == name) {
            Some(bucket) => bucket.count += 1,
            None => workflow_states.push(WorkflowStateCount {
                name: name.to_string(),
                count: 1,
            }),
        }
    }
    workflow_states.sort_by(|a, b| b.count.cmp(&a.count));

    ContentMetrics {
        total,
        completed,
        in_progress,
        backlog,
        completion_rate: completion_rate(completed, total),
        authors,
        projects,
        monthly_growth: months.into_values().collect(),
        upcoming_content,
        overdue_content,
        workflow_states,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::raw_issue;
    use chrono::TimeZone;
    use pretty_assertions::assert_eq;

    fn now() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2024, 3, 10, 12, 0, 0).unwrap()
    }

    fn in_days(days: i64) -> NaiveDate {
        now().date_naive() + TimeDelta::days(days)
    }

    fn ids(items: &[ContentItem]) -> Vec<&str> {
        items.iter().map(|item| item.id.as_str()).collect()
    }

    #[test]
    fn empty_input_gives_zero_metrics() {
        let metrics = compute_metrics(&[], now(), &MetricsOptions::default());
        assert_eq!(metrics, ContentMetrics::default());
        assert_eq!(metrics.completion_rate, 0.0);
        assert!(!metrics.completion_rate.is_nan());
    }

    #[test]
    fn counts_and_completion_rate() {
        let issues = vec![
            raw_issue("1").state("Published"),
            raw_issue("2").state("Editor Review"),
            raw_issue("3").state("In Progress"),
            raw_issue("4").state("Backlog"),
        ];
        let metrics = compute_metrics(&issues, now(), &MetricsOptions::default());
        assert_eq!(metrics.total, 4);
        assert_eq!(metrics.completed, 1);
        assert_eq!(metrics.in_progress, 2);
        assert_eq!(metrics.backlog, 1);
        assert_eq!(metrics.completion_rate, 25.0);
    }

    #[test]
    fn backlog_absorbs_canceled() {
        let issues = vec![
            raw_issue("1").state("Backlog"),
            raw_issue("2").state("Canceled"),
            raw_issue("3").state("Duplicate"),
            raw_issue("4").state("Something New"),
            raw_issue("5"),
        ];
        let metrics = compute_metrics(&issues, now(), &MetricsOptions::default());
        let raw_backlog = 3;
        let raw_canceled = 2;
        assert_eq!(metrics.backlog, raw_backlog + raw_canceled);
        assert_eq!(metrics.completed + metrics.in_progress + metrics.backlog, metrics.total);
    }

    #[test]
    fn authors_sorted_by_count_with_stable_ties() {
        let issues = vec![
            raw_issue("1").assignee("Bea"),
            raw_issue("2").assignee("Ada"),
            raw_issue("3").assignee("Cy"),
            raw_issue("4").assignee("Cy"),
            raw_issue("5"),
        ];
        let metrics = compute_metrics(&issues, now(), &MetricsOptions::default());
        let leaderboard = metrics
            .authors
            .iter()
            .map(|a| (a.name.as_str(), a.content_count))
            .collect::<Vec<_>>();
        assert_eq!(leaderboard, vec![("Cy", 2), ("Bea", 1), ("Ada", 1)]);
        assert_eq!(metrics.authors[0].id, metrics.authors[0].name);
    }

    #[test]
    fn projects_are_distinct_in_first_seen_order() {
        let issues = vec![
            raw_issue("1").project("Launch"),
            raw_issue("2"),
            raw_issue("3").project("Docs"),
            raw_issue("4").project("Launch"),
        ];
        let metrics = compute_metrics(&issues, now(), &MetricsOptions::default());
        assert_eq!(metrics.projects, vec!["Launch".to_string(), "Docs".to_string()]);
    }

    #[test]
    fn monthly_growth_buckets_by_creation_month() {
        let issues = vec![
            raw_issue("1").created(2024, 2, 20).state("Published"),
            raw_issue("2").created(2024, 1, 3).state("Backlog"),
            raw_issue("3").created(2024, 2, 1).state("published"),
            raw_issue("4").created(2024, 2, 29).due(in_days(100)),
        ];
        let metrics = compute_metrics(&issues, now(), &MetricsOptions::default());
        assert_eq!(
            metrics.monthly_growth,
            vec![
                MonthlyContent {
                    month: "2024-01-01T00:00:00.000Z".to_string(),
                    planned: 1,
                    completed: 0,
                },
                MonthlyContent {
                    month: "2024-02-01T00:00:00.000Z".to_string(),
                    planned: 3,
                    // only the exact spelling counts here
                    completed: 1,
                },
            ]
        );
        // classification itself is case-insensitive
        assert_eq!(metrics.completed, 2);
    }

    #[test]
    fn upcoming_respects_the_window() {
        let issues = vec![
            raw_issue("soon").state("In Progress").due(in_days(3)),
            raw_issue("later").state("Backlog").due(in_days(40)),
        ];
        let metrics = compute_metrics(&issues, now(), &MetricsOptions::default());
        assert_eq!(ids(&metrics.upcoming_content), vec!["soon"]);
        assert!(metrics.overdue_content.is_empty());
    }

    #[test]
    fn upcoming_sorted_by_due_date() {
        let issues = vec![
            raw_issue("b").due(in_days(9)),
            raw_issue("a").due(in_days(2)),
            raw_issue("c").due(in_days(29)),
            raw_issue("today").due(in_days(0)),
        ];
        let metrics = compute_metrics(&issues, now(), &MetricsOptions::default());
        assert_eq!(ids(&metrics.upcoming_content), vec!["a", "b", "c"]);
        // midnight of today is already in the past
        assert_eq!(ids(&metrics.overdue_content), vec!["today"]);
    }

    #[test]
    fn custom_window() {
        let issues = vec![raw_issue("1").due(in_days(3)), raw_issue("2").due(in_days(10))];
        let options = MetricsOptions {
            upcoming_window: TimeDelta::days(7),
        };
        let metrics = compute_metrics(&issues, now(), &options);
        assert_eq!(ids(&metrics.upcoming_content), vec!["1"]);
    }

    #[test]
    fn window_from_config() {
        let config = Config::from_yaml_str("upcoming_window_days: 7").unwrap();
        assert_eq!(MetricsOptions::from_config(&config).upcoming_window, TimeDelta::days(7));
    }

    #[test]
    fn window_beyond_the_calendar_is_unbounded() {
        let issues = vec![
            raw_issue("soon").due(in_days(3)),
            raw_issue("far").due(in_days(20_000)),
            raw_issue("late").due(in_days(-1)),
        ];

        let config = Config::from_yaml_str("upcoming_window_days: 4000000000").unwrap();
        let metrics = compute_metrics(&issues, now(), &MetricsOptions::from_config(&config));
        assert_eq!(ids(&metrics.upcoming_content), vec!["soon", "far"]);
        assert_eq!(ids(&metrics.overdue_content), vec!["late"]);

        let options = MetricsOptions {
            upcoming_window: TimeDelta::MAX,
        };
        let metrics = compute_metrics(&issues, now(), &options);
        assert_eq!(ids(&metrics.upcoming_content), vec!["soon", "far"]);
    }

    #[test]
    fn published_is_neither_upcoming_nor_overdue() {
        let issues = vec![
            raw_issue("past").state("Published").due(in_days(-5)),
            raw_issue("future").state("Published").due(in_days(5)),
        ];
        let metrics = compute_metrics(&issues, now(), &MetricsOptions::default());
        assert!(metrics.upcoming_content.is_empty());
        assert!(metrics.overdue_content.is_empty());
    }

    #[test]
    fn overdue_uses_exact_exemptions() {
        let issues = vec![
            raw_issue("final").state("Final Review").due(in_days(-1)),
            raw_issue("editor").state("Editor Review").due(in_days(-2)),
            raw_issue("lowercase").state("published").due(in_days(-10)),
            raw_issue("stateless").due(in_days(-3)),
        ];
        let metrics = compute_metrics(&issues, now(), &MetricsOptions::default());
        assert_eq!(ids(&metrics.overdue_content), vec!["lowercase", "stateless", "editor"]);
        assert_eq!(metrics.overdue_content[1].status, UNKNOWN_STATUS);
    }

    #[test]
    fn items_carry_display_names() {
        let issues = vec![raw_issue("1")
            .state("Editor Review")
            .assignee("Ada")
            .project("Launch")
            .due(in_days(1))];
        let metrics = compute_metrics(&issues, now(), &MetricsOptions::default());
        assert_eq!(
            metrics.upcoming_content,
            vec![ContentItem {
                id: "1".to_string(),
                title: "Issue 1".to_string(),
                status: "Editor Review".to_string(),
                due_date: Some(in_days(1)),
                assignee: Some("Ada".to_string()),
                project: Some("Launch".to_string()),
                workspace: None,
            }]
        );
    }

    #[test]
    fn workflow_histogram_uses_raw_names() {
        let issues = vec![
            raw_issue("1").state("Editor Review"),
            raw_issue("2").state("SEO Review"),
            raw_issue("3").state("SEO Review"),
            raw_issue("4"),
        ];
        let metrics = compute_metrics(&issues, now(), &MetricsOptions::default());
        let histogram = metrics
            .workflow_states
            .iter()
            .map(|s| (s.name.as_str(), s.count))
            .collect::<Vec<_>>();
        assert_eq!(histogram, vec![("SEO Review", 2), ("Editor Review", 1), ("Unknown", 1)]);
    }

    #[test]
    fn completion_rate_stays_in_range() {
        let issues = (0..7)
            .map(|i| raw_issue(&i.to_string()).state(if i % 3 == 0 { "Published" } else { "Backlog" }))
            .collect::<Vec<_>>();
        let metrics = compute_metrics(&issues, now(), &MetricsOptions::default());
        assert!((0.0..=100.0).contains(&metrics.completion_rate));
        assert_eq!(metrics.completed, 3);
    }

    #[test]
    fn month_key_layout() {
        let ts = Utc.with_ymd_and_hms(2023, 11, 30, 23, 59, 59).unwrap();
        assert_eq!(month_key(ts), "2023-11-01T00:00:00.000Z");
    }
}
