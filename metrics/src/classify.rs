use crate::metrics::Category;

const COMPLETED_STATES: &[&str] = &["published"];

const IN_PROGRESS_STATES: &[&str] = &[
    "editor review",
    "final review",
    "seo review",
    "grammar review",
    "author/peer review",
    "in progress",
    "approved",
    "approved for publishing",
];

const CANCELED_STATES: &[&str] = &["duplicate", "canceled"];

const BACKLOG_STATES: &[&str] = &["backlog"];

/// Map a workflow state name onto the semantic category. Total: unknown or missing names land in the backlog.
pub fn classify(state_name: Option<&str>) -> Category {
    let Some(name) = state_name else {
        return Category::Backlog;
    };

    let normalized = name.to_lowercase();
    let matches = |table: &[&str]| table.contains(&normalized.as_str());

    if matches(COMPLETED_STATES) {
        Category::Completed
    } else if matches(IN_PROGRESS_STATES) {
        Category::InProgress
    } else if matches(CANCELED_STATES) {
        Category::Canceled
    } else if matches(BACKLOG_STATES) {
        Category::Backlog
    } else {
        warn!(state = %name, "unmapped workflow state, counting it as backlog");
        Category::Backlog
    }
}
