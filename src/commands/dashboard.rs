use chrono::{DateTime, Utc};
use colored::Colorize;
use serde_json::Value;
use tabled::Tabled;

use trackflow::analytics::{self, Dashboard, FeedEntry, OverdueIssue};
use trackflow::error::Result;
use trackflow::output::{format_date_only, table, truncate, Output, OutputFormat};
use trackflow::store::IssueStore;

use crate::cli::{DashboardArgs, DashboardSection};

const TREND_BAR_WIDTH: usize = 30;

#[derive(Tabled)]
struct MetricRow {
    #[tabled(rename = "Metric")]
    metric: &'static str,
    #[tabled(rename = "Value")]
    value: String,
    #[tabled(rename = "vs last week")]
    change: String,
}

#[derive(Tabled)]
struct CountRow {
    #[tabled(rename = "Group")]
    group: String,
    #[tabled(rename = "Issues")]
    count: usize,
}

#[derive(Tabled)]
struct OverdueRow {
    #[tabled(rename = "ID")]
    id: i64,
    #[tabled(rename = "Title")]
    title: String,
    #[tabled(rename = "Assignee")]
    assignee: String,
    #[tabled(rename = "Due")]
    due: String,
    #[tabled(rename = "Overdue")]
    overdue: String,
}

impl From<&OverdueIssue> for OverdueRow {
    fn from(overdue: &OverdueIssue) -> Self {
        Self {
            id: overdue.issue.id,
            title: truncate(&overdue.issue.title, 40),
            assignee: overdue.issue.assignee_label().to_string(),
            due: format_date_only(overdue.issue.due_date),
            overdue: format!("{}d", overdue.overdue_days).red().to_string(),
        }
    }
}

#[derive(Tabled)]
struct FeedRow {
    #[tabled(rename = "When")]
    when: String,
    #[tabled(rename = "Event")]
    description: String,
}

impl FeedRow {
    fn new(entry: &FeedEntry, now: DateTime<Utc>) -> Self {
        Self {
            when: entry.time_ago(now),
            description: entry.description.clone(),
        }
    }
}

/// "+12%" in red or "-3%" in green; `lower_is_better` flips the colours.
fn change_label(change: i64, suffix: &str, lower_is_better: bool) -> String {
    let label = format!("{change:+}{suffix}");
    let improved = if lower_is_better { change < 0 } else { change > 0 };
    match change {
        0 => label.bright_black().to_string(),
        _ if improved => label.green().to_string(),
        _ => label.red().to_string(),
    }
}

pub async fn show<S>(store: &S, args: DashboardArgs, out: Output) -> Result<()>
where
    S: IssueStore + ?Sized,
{
    let now = Utc::now();
    let dashboard = analytics::load_dashboard(store, now).await?;

    match out.format {
        OutputFormat::Json => out.print_json(&section_json(&dashboard, args.section, now)?),
        OutputFormat::Compact => print_compact(&dashboard, args.section, now),
        OutputFormat::Table => print_tables(&dashboard, &args, now),
    }

    Ok(())
}

/// Feed entries plus their `timeAgo` label, which depends on `now`.
fn feed_json(entries: &[FeedEntry], now: DateTime<Utc>) -> Result<Value> {
    let mut rows = Vec::with_capacity(entries.len());
    for entry in entries {
        let mut row = serde_json::to_value(entry)?;
        if let Value::Object(map) = &mut row {
            map.insert("timeAgo".to_string(), Value::String(entry.time_ago(now)));
        }
        rows.push(row);
    }
    Ok(Value::Array(rows))
}

fn section_json(
    dashboard: &Dashboard,
    section: DashboardSection,
    now: DateTime<Utc>,
) -> Result<Value> {
    let value = match section {
        DashboardSection::All => {
            let mut value = serde_json::to_value(dashboard)?;
            if let Value::Object(map) = &mut value {
                map.insert(
                    "recentActivity".to_string(),
                    feed_json(&dashboard.recent_activity, now)?,
                );
            }
            value
        }
        DashboardSection::Metrics => serde_json::to_value(&dashboard.metrics)?,
        DashboardSection::Status => serde_json::to_value(&dashboard.status_breakdown)?,
        DashboardSection::Priority => serde_json::to_value(&dashboard.priority_distribution)?,
        DashboardSection::Trends => serde_json::to_value(&dashboard.resolution_trends)?,
        DashboardSection::Workload => serde_json::to_value(&dashboard.assignee_workload)?,
        DashboardSection::Overdue => serde_json::to_value(&dashboard.overdue_issues)?,
        DashboardSection::Activity => feed_json(&dashboard.recent_activity, now)?,
    };
    Ok(value)
}

fn wants(selected: DashboardSection, section: DashboardSection) -> bool {
    selected == DashboardSection::All || selected == section
}

fn print_compact(dashboard: &Dashboard, section: DashboardSection, now: DateTime<Utc>) {
    let m = &dashboard.metrics;
    if wants(section, DashboardSection::Metrics) {
        println!(
            "total={} open={} ({:+}) resolved_week={} ({:+}%) avg_days={} ({:+}%)",
            m.total_issues,
            m.open_issues,
            m.open_change,
            m.resolved_this_week,
            m.resolved_change,
            m.avg_resolution_time,
            m.resolution_time_change
        );
    }
    if wants(section, DashboardSection::Status) {
        for row in &dashboard.status_breakdown {
            println!("status {} {}", row.status, row.count);
        }
    }
    if wants(section, DashboardSection::Priority) {
        for row in &dashboard.priority_distribution {
            println!("priority {} {}", row.priority, row.count);
        }
    }
    if wants(section, DashboardSection::Trends) {
        for point in &dashboard.resolution_trends {
            println!("resolved {} {}", point.day, point.count);
        }
    }
    if wants(section, DashboardSection::Workload) {
        for entry in &dashboard.assignee_workload {
            println!("workload {} {}", entry.count, entry.assignee);
        }
    }
    if wants(section, DashboardSection::Overdue) {
        for overdue in &dashboard.overdue_issues {
            println!(
                "overdue #{} {}d {}",
                overdue.issue.id, overdue.overdue_days, overdue.issue.title
            );
        }
    }
    if wants(section, DashboardSection::Activity) {
        for entry in &dashboard.recent_activity {
            println!("{} {}", entry.time_ago(now), entry.description);
        }
    }
}

fn heading(title: &str) {
    println!("\n{}", title.bold());
}

fn print_tables(dashboard: &Dashboard, args: &DashboardArgs, now: DateTime<Utc>) {
    let section = args.section;
    let m = &dashboard.metrics;

    if wants(section, DashboardSection::Metrics) {
        heading("Overview");
        let rows = [
            MetricRow {
                metric: "Total issues",
                value: m.total_issues.to_string(),
                change: String::new(),
            },
            MetricRow {
                metric: "Open issues",
                value: m.open_issues.to_string(),
                change: change_label(m.open_change, "", true),
            },
            MetricRow {
                metric: "Resolved this week",
                value: m.resolved_this_week.to_string(),
                change: change_label(m.resolved_change, "%", false),
            },
            MetricRow {
                metric: "Avg resolution time",
                value: format!("{} days", m.avg_resolution_time),
                change: change_label(m.resolution_time_change, "%", true),
            },
        ];
        println!("{}", table(rows));
    }

    if wants(section, DashboardSection::Status) {
        heading("Issues by status");
        let rows = dashboard.status_breakdown.iter().map(|row| CountRow {
            group: row.status.colored(),
            count: row.count,
        });
        println!("{}", table(rows));
    }

    if wants(section, DashboardSection::Priority) {
        heading("Issues by priority");
        let rows = dashboard.priority_distribution.iter().map(|row| CountRow {
            group: row.priority.colored(),
            count: row.count,
        });
        println!("{}", table(rows));
    }

    if wants(section, DashboardSection::Trends) {
        heading("Resolved per day (last 30 days)");
        let peak = dashboard
            .resolution_trends
            .iter()
            .map(|p| p.count)
            .max()
            .unwrap_or(0)
            .max(1);
        for point in &dashboard.resolution_trends {
            let width = point.count * TREND_BAR_WIDTH / peak;
            println!(
                "{:>6} {} {}",
                point.date,
                "█".repeat(width).green(),
                point.count
            );
        }
    }

    if wants(section, DashboardSection::Workload) {
        heading("Open work by assignee");
        if dashboard.assignee_workload.is_empty() {
            println!("No open issues.");
        } else {
            let rows = dashboard.assignee_workload.iter().map(|entry| CountRow {
                group: entry.assignee.clone(),
                count: entry.count,
            });
            println!("{}", table(rows));
        }
    }

    if wants(section, DashboardSection::Overdue) {
        heading("Overdue");
        if dashboard.overdue_issues.is_empty() {
            println!("Nothing overdue.");
        } else {
            let shown = dashboard.overdue_issues.len().min(args.overdue_limit);
            let rows = dashboard.overdue_issues[..shown].iter().map(OverdueRow::from);
            println!("{}", table(rows));
            if shown < dashboard.overdue_issues.len() {
                println!(
                    "{}",
                    format!("… and {} more", dashboard.overdue_issues.len() - shown).bright_black()
                );
            }
        }
    }

    if wants(section, DashboardSection::Activity) {
        heading("Recent activity");
        if dashboard.recent_activity.is_empty() {
            println!("No activity in the last 3 days.");
        } else {
            let rows = dashboard
                .recent_activity
                .iter()
                .map(|entry| FeedRow::new(entry, now));
            println!("{}", table(rows));
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{Duration, TimeZone};
    use trackflow::types::NewIssue;

    #[test]
    fn change_labels_are_signed() {
        colored::control::set_override(false);
        assert_eq!(change_label(12, "%", false), "+12%");
        assert_eq!(change_label(-3, "", true), "-3");
        assert_eq!(change_label(0, "%", true), "+0%");
    }

    #[test]
    fn feed_json_carries_relative_time() {
        let now = Utc.with_ymd_and_hms(2024, 6, 12, 15, 0, 0).unwrap();
        let issue = NewIssue {
            title: "Broken export".to_string(),
            ..Default::default()
        }
        .into_issue(7, now - Duration::hours(2));
        let dashboard = Dashboard::compute(&[issue], now);

        let section = section_json(&dashboard, DashboardSection::Activity, now).unwrap();
        assert_eq!(section[0]["issueId"], 7);
        assert_eq!(section[0]["timeAgo"], "2h ago");

        let all = section_json(&dashboard, DashboardSection::All, now).unwrap();
        assert_eq!(all["recentActivity"], section);
        assert_eq!(all["metrics"]["totalIssues"], 1);
    }
}
