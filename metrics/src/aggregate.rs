use crate::metrics::{
    completion_rate,
    ContentMetrics,
};

/// Mark every listed item with the workspace it came from.
pub fn tag_workspace(mut metrics: ContentMetrics, workspace: &str) -> ContentMetrics {
    for item in metrics.upcoming_content.iter_mut().chain(metrics.overdue_content.iter_mut()) {
        item.workspace = Some(workspace.to_string());
    }
    metrics
}

/// Merge per-workspace metrics into one cross-workspace snapshot.
///
/// Counts are summed and the completion rate recomputed from the sums. Authors, months and workflow states merge
/// by key, item lists are concatenated, and every list is re-sorted. Entries that tie keep their encounter order,
/// so reordering the input only changes the relative order of tied entries.
pub fn combine(all: impl IntoIterator<Item = ContentMetrics>) -> ContentMetrics {
    let mut acc = ContentMetrics::default();

    for metrics in all {
        acc.total += metrics.total;
        acc.completed += metrics.completed;
        acc.in_progress += metrics.in_progress;
        acc.backlog += metrics.backlog;

        for author in metrics.authors {
            match acc.authors.iter_mut().find(|existing| existing.id == author.id) {
                Some(existing) => existing.content_count += author.content_count,
                None => acc.authors.push(author),
            }
        }

        for project in metrics.projects {
            if !acc.projects.contains(&project) {
                acc.projects.push(project);
            }
        }

        for month in metrics.monthly_growth {
            match acc.monthly_growth.iter_mut().find(|existing| existing.month == month.month) {
                Some(existing) => {
                    existing.planned += month.planned;
                    existing.completed += month.completed;
                }
                None => acc.monthly_growth.push(month),
            }
        }

        acc.upcoming_content.extend(metrics.upcoming_content);
        acc.overdue_content.extend(metrics.overdue_content);

        for state in metrics.workflow_states {
            match acc.workflow_states.iter_mut().find(|existing| existing.name == state.name) {
                Some(existing) => existing.count += state.count,
                None => acc.workflow_states.push(state),
            }
        }
    }

    acc.completion_rate = completion_rate(acc.completed, acc.total);
    acc.authors.sort_by(|a, b| b.content_count.cmp(&a.content_count));
    acc.monthly_growth.sort_by(|a, b| a.month.cmp(&b.month));
    acc.upcoming_content.sort_by_key(|item| item.due_date);
    acc.overdue_content.sort_by_key(|item| item.due_date);
    acc.workflow_states.sort_by(|a, b| b.count.cmp(&a.count));

    acc
}
