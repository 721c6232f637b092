//! Terminal rendering of a dashboard snapshot.

use chrono::{
    DateTime,
    NaiveDate,
    Utc,
};
use comfy_table::{
    presets,
    Attribute,
    Cell,
    CellAlignment,
    Color,
    ContentArrangement,
    Table,
};
use content_pipeline_config::WorkspaceRegistry;
use content_pipeline_metrics::{
    ContentItem,
    ContentMetrics,
    DashboardView,
    DEFAULT_TOP_AUTHORS,
};

#[derive(Debug, Clone, Copy, Default)]
pub struct ReportOptions {
    pub all_authors: bool,
}

fn table(title: &str) -> Table {
    let mut table = Table::new();
    table
        .load_preset(presets::UTF8_FULL)
        .set_content_arrangement(ContentArrangement::Dynamic)
        .set_header(vec![Cell::new(title).add_attribute(Attribute::Bold).fg(Color::Cyan)]);
    table
}

fn label(text: &str) -> Cell {
    Cell::new(text).add_attribute(Attribute::Bold)
}

fn number(value: usize) -> Cell {
    Cell::new(value).set_alignment(CellAlignment::Right)
}

fn percent(value: f64) -> Cell {
    Cell::new(format!("{value:.1}%")).set_alignment(CellAlignment::Right)
}

fn change(value: Option<f64>) -> Cell {
    match value {
        Some(value) if value > 0.0 => Cell::new(format!("+{value:.1}%")).fg(Color::Green),
        Some(value) if value < 0.0 => Cell::new(format!("{value:.1}%")).fg(Color::Red),
        Some(_) => Cell::new("0.0%"),
        None => Cell::new("n/a").fg(Color::DarkGrey),
    }
}

fn completion_color(rate: f64) -> Color {
    if rate >= 75.0 {
        Color::Green
    } else if rate >= 40.0 {
        Color::Yellow
    } else {
        Color::Red
    }
}

/// `Mar 2024` for a month bucket key.
fn month_label(key: &str) -> String {
    DateTime::parse_from_rfc3339(key)
        .map(|month| month.format("%b %Y").to_string())
        .unwrap_or_else(|_| key.to_string())
}

fn format_date(date: Option<NaiveDate>) -> String {
    date.map(|date| date.format("%Y-%m-%d").to_string()).unwrap_or_else(|| "-".to_string())
}

pub fn workspaces(registry: &WorkspaceRegistry) -> String {
    let active = registry.active_workspaces();
    let mut table = Table::new();
    table
        .load_preset(presets::UTF8_FULL)
        .set_content_arrangement(ContentArrangement::Dynamic)
        .set_header(vec![label("ID"), label("Name"), label("API key")]);

    for workspace in registry.list_workspaces() {
        let status = if workspace.is_aggregate() {
            Cell::new(format!("{} active", active.len()))
        } else if active.contains(&workspace) {
            Cell::new("configured").fg(Color::Green)
        } else {
            Cell::new("missing").fg(Color::Red)
        };
        table.add_row(vec![Cell::new(&workspace.id), Cell::new(&workspace.name), status]);
    }
    format!("{table}\n")
}

fn summary(metrics: &ContentMetrics) -> Table {
    let mut table = table("CONTENT OVERVIEW");
    table.add_row(vec![label("Total Content"), number(metrics.total)]);
    table.add_row(vec![
        label("Published"),
        Cell::new(format!(
            "{} ({:.1}%)",
            metrics.completed,
            metrics.share_of_total(metrics.completed)
        )),
    ]);
    table.add_row(vec![label("In Progress"), number(metrics.in_progress)]);
    table.add_row(vec![label("Backlog"), number(metrics.backlog)]);
    table.add_row(vec![
        label("Completion Rate"),
        percent(metrics.completion_rate).fg(completion_color(metrics.completion_rate)),
    ]);

    let trend = metrics.month_over_month();
    table.add_row(vec![label("Planned vs last month"), change(trend.planned_change_percent)]);
    table.add_row(vec![label("Published vs last month"), change(trend.completed_change_percent)]);
    table
}

fn authors(metrics: &ContentMetrics, options: ReportOptions) -> Table {
    let shown = if options.all_authors {
        &metrics.authors[..]
    } else {
        metrics.top_authors(DEFAULT_TOP_AUTHORS)
    };

    let mut table = table("AUTHORS");
    table.add_row(vec![label("#"), label("Author"), label("Content"), label("Share")]);
    for (rank, author) in shown.iter().enumerate() {
        table.add_row(vec![
            number(rank + 1),
            Cell::new(&author.name),
            number(author.content_count),
            percent(metrics.share_of_total(author.content_count)),
        ]);
    }
    if shown.len() < metrics.authors.len() {
        table.add_row(vec![
            Cell::new(""),
            Cell::new(format!("… {} more", metrics.authors.len() - shown.len())).fg(Color::DarkGrey),
        ]);
    }
    table
}

fn workflow_states(metrics: &ContentMetrics) -> Table {
    let mut table = table("WORKFLOW STATES");
    table.add_row(vec![label("State"), label("Count"), label("Share")]);
    for state in &metrics.workflow_states {
        table.add_row(vec![
            Cell::new(&state.name),
            number(state.count),
            percent(metrics.share_of_total(state.count)),
        ]);
    }
    table
}

fn items(title: &str, items: &[ContentItem], color: Color) -> Table {
    let with_workspace = items.iter().any(|item| item.workspace.is_some());
    let mut table = table(title);

    let mut header = vec![label("Due"), label("Title"), label("Status"), label("Assignee"), label("Project")];
    if with_workspace {
        header.push(label("Workspace"));
    }
    table.add_row(header);

    for item in items {
        let mut row = vec![
            Cell::new(format_date(item.due_date)).fg(color),
            Cell::new(&item.title),
            Cell::new(&item.status),
            Cell::new(item.assignee.as_deref().unwrap_or("-")),
            Cell::new(item.project.as_deref().unwrap_or("-")),
        ];
        if with_workspace {
            row.push(Cell::new(item.workspace.as_deref().unwrap_or("-")));
        }
        table.add_row(row);
    }
    table
}

fn monthly_growth(metrics: &ContentMetrics) -> Table {
    let mut table = table("MONTHLY GROWTH");
    table.add_row(vec![label("Month"), label("Planned"), label("Published")]);
    for month in &metrics.monthly_growth {
        table.add_row(vec![
            Cell::new(month_label(&month.month)),
            number(month.planned),
            number(month.completed),
        ]);
    }
    table
}

/// Render the whole dashboard for `view`.
pub fn render(view: &DashboardView, workspace_name: &str, options: ReportOptions) -> String {
    let mut output = String::new();

    output.push_str(&format!("\n{}\n", "=".repeat(80)));
    output.push_str(&format!("{:^80}\n", format!("CONTENT PIPELINE: {}", workspace_name.to_uppercase())));
    output.push_str(&format!("{}\n", "=".repeat(80)));

    if let Some(error) = &view.error {
        output.push_str(&format!("\n⚠️  {error}\n"));
    }

    let Some(metrics) = &view.metrics else {
        output.push_str("\nNo metrics available yet.\n");
        return output;
    };

    if let Some(updated) = view.last_updated {
        output.push_str(&format!("\nLast updated: {}\n", updated.format("%Y-%m-%d %H:%M:%S UTC")));
    }

    output.push_str(&format!("\n{}\n", summary(metrics)));
    if metrics.is_empty() {
        output.push_str("\nNo content found.\n");
        return output;
    }

    output.push_str(&format!("\n{}\n", authors(metrics, options)));
    output.push_str(&format!("\n{}\n", workflow_states(metrics)));
    if !metrics.upcoming_content.is_empty() {
        output.push_str(&format!(
            "\n{}\n",
            items("UPCOMING CONTENT", &metrics.upcoming_content, Color::Yellow)
        ));
    }
    if !metrics.overdue_content.is_empty() {
        output.push_str(&format!(
            "\n{}\n",
            items("OVERDUE CONTENT", &metrics.overdue_content, Color::Red)
        ));
    }
    if !metrics.projects.is_empty() {
        output.push_str(&format!("\nProjects: {}\n", metrics.projects.join(", ")));
    }
    output.push_str(&format!("\n{}\n", monthly_growth(metrics)));

    output
}

/// The snapshot as pretty JSON, as written by `--output-file`.
pub fn to_json(view: &DashboardView, generated_at: DateTime<Utc>) -> serde_json::Result<String> {
    serde_json::to_string_pretty(&serde_json::json!({
        "generatedAt": generated_at,
        "dashboard": view,
    }))
}
