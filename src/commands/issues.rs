use colored::Colorize;
use serde::Serialize;
use tabled::Tabled;

use trackflow::error::Result;
use trackflow::markup::render_terminal;
use trackflow::output::{format_date, format_date_only, format_relative, truncate, Output};
use trackflow::store::IssueStore;
use trackflow::timeline::{load_timeline, CommentThread, IssueTimeline, TimelineEntry};
use trackflow::tracking::apply_update;
use trackflow::types::{Activity, Issue, IssueUpdate, NewIssue};

use crate::cli::{IssueCreateArgs, IssueListArgs, IssueUpdateArgs};

#[derive(Tabled)]
struct IssueRow {
    #[tabled(rename = "ID")]
    id: i64,
    #[tabled(rename = "Title")]
    title: String,
    #[tabled(rename = "Status")]
    status: String,
    #[tabled(rename = "Priority")]
    priority: String,
    #[tabled(rename = "Assignee")]
    assignee: String,
    #[tabled(rename = "Project")]
    project: String,
    #[tabled(rename = "Due")]
    due: String,
}

impl From<&Issue> for IssueRow {
    fn from(issue: &Issue) -> Self {
        Self {
            id: issue.id,
            title: truncate(&issue.title, 50),
            status: issue.status.colored(),
            priority: issue.priority.colored(),
            assignee: issue.assignee_label().to_string(),
            project: truncate(&issue.project, 24),
            due: format_date_only(issue.due_date),
        }
    }
}

fn compact_line(issue: &Issue) -> String {
    format!(
        "#{} [{}] [{}] {} ({})",
        issue.id,
        issue.status.as_str(),
        issue.priority.as_str(),
        issue.title,
        issue.assignee_label()
    )
}

fn matches_filters(issue: &Issue, args: &IssueListArgs) -> bool {
    args.status.as_ref().map_or(true, |s| issue.status == *s)
        && args.priority.as_ref().map_or(true, |p| issue.priority == *p)
        && args
            .assignee
            .as_deref()
            .map_or(true, |a| issue.assignee.eq_ignore_ascii_case(a.trim()))
        && args
            .project
            .as_deref()
            .map_or(true, |p| issue.project.eq_ignore_ascii_case(p.trim()))
        && args
            .search
            .as_deref()
            .map_or(true, |term| issue.matches_search(term))
}

pub async fn list<S>(store: &S, args: IssueListArgs, out: Output) -> Result<()>
where
    S: IssueStore + ?Sized,
{
    let issues: Vec<Issue> = store
        .fetch_all_issues()
        .await?
        .into_iter()
        .filter(|issue| matches_filters(issue, &args))
        .take(args.limit)
        .collect();

    out.print_table(&issues, |i| IssueRow::from(i), compact_line);

    Ok(())
}

#[derive(Serialize)]
struct IssueDetail<'a> {
    issue: &'a Issue,
    timeline: &'a IssueTimeline,
}

pub async fn view<S>(store: &S, id: i64, out: Output) -> Result<()>
where
    S: IssueStore + ?Sized,
{
    let issue = store.fetch_issue(id).await?;
    let timeline = load_timeline(store, id).await?;

    out.print_item(
        &IssueDetail {
            issue: &issue,
            timeline: &timeline,
        },
        |detail| print_detail(detail.issue, detail.timeline),
    );

    Ok(())
}

fn print_detail(issue: &Issue, timeline: &IssueTimeline) {
    println!("{} {}", format!("#{}", issue.id).bright_black(), issue.title.bold());
    println!();

    if !issue.description.trim().is_empty() {
        println!("{}", render_terminal(&issue.description));
        println!();
    }

    println!("Type:     {}", issue.issue_type);
    println!("Status:   {}", issue.status.colored());
    println!("Priority: {}", issue.priority.colored());
    println!("Assignee: {}", issue.assignee_label());
    if !issue.project.is_empty() {
        println!("Project:  {}", issue.project);
    }
    if !issue.labels.is_empty() {
        println!("Labels:   {}", issue.labels.join(", "));
    }
    println!("Due:      {}", format_date_only(issue.due_date));
    println!("Created:  {}", format_date(issue.created_date));
    println!("Updated:  {}", format_date(issue.updated_date));

    if timeline.entries.is_empty() {
        return;
    }

    println!();
    println!(
        "{}",
        format!("Activity ({} comments)", timeline.comment_count).bold()
    );
    for entry in &timeline.entries {
        match entry {
            TimelineEntry::Comment(comment) => match timeline.thread_for(comment.id) {
                Some(thread) => print_thread(thread),
                None => print_comment_line(
                    &comment.author_name,
                    comment.created_date,
                    &comment.content,
                    1,
                ),
            },
            TimelineEntry::Activity(activity) => print_activity(activity),
        }
    }
}

fn print_thread(thread: &CommentThread) {
    let comment = &thread.comment;
    print_comment_line(
        &comment.author_name,
        comment.created_date,
        &comment.content,
        thread.depth,
    );
    if comment.is_edited() {
        println!(
            "{}   {}",
            indent(thread.depth.saturating_sub(1)),
            "(edited)".bright_black()
        );
    }
    for reply in &thread.replies {
        print_thread(reply);
    }
}

fn indent(depth: usize) -> String {
    "    ".repeat(depth)
}

fn print_comment_line(
    author: &str,
    at: chrono::DateTime<chrono::Utc>,
    content: &str,
    depth: usize,
) {
    let pad = indent(depth.saturating_sub(1));
    println!(
        "{pad}{} {} {}",
        "💬".cyan(),
        author.bold(),
        format_relative(at).bright_black()
    );
    for line in render_terminal(content).lines() {
        println!("{pad}   {line}");
    }
}

fn print_activity(activity: &Activity) {
    println!(
        "{} {} {} {}",
        activity.activity_type.symbol(),
        activity.author_name.bold(),
        render_terminal(&activity.content),
        format_relative(activity.created_date).bright_black()
    );
}

pub async fn create<S>(store: &S, args: IssueCreateArgs, out: Output) -> Result<()>
where
    S: IssueStore + ?Sized,
{
    let input = NewIssue {
        title: args.title,
        description: args.description,
        issue_type: args.issue_type,
        status: args.status,
        priority: args.priority,
        assignee: args.assignee,
        project: args.project,
        project_id: args.project_id,
        labels: args.labels,
        due_date: args.due,
    };

    let issue = store.create_issue(input).await?;
    if out.is_json() {
        out.print_json(&issue);
    } else {
        out.print_message(&format!("Created #{} - {}", issue.id, issue.title));
    }

    Ok(())
}

pub async fn update<S>(
    store: &S,
    args: IssueUpdateArgs,
    author: Option<String>,
    out: Output,
) -> Result<()>
where
    S: IssueStore + ?Sized,
{
    let due_date = if args.clear_due {
        Some(None)
    } else {
        args.due.map(Some)
    };
    let update = IssueUpdate {
        title: args.title,
        description: args.description,
        issue_type: args.issue_type,
        status: args.status,
        priority: args.priority,
        assignee: args.assignee,
        project: args.project,
        project_id: None,
        labels: args.labels,
        due_date,
    };

    if update.is_empty() {
        out.print_message("No updates specified");
        return Ok(());
    }

    let tracked = apply_update(store, args.id, update, author.as_deref()).await?;
    if out.is_json() {
        out.print_json(&serde_json::json!({
            "issue": tracked.issue,
            "activities": tracked.activities,
        }));
    } else {
        out.print_message(&format!(
            "Updated #{} - {} ({} change{} recorded)",
            tracked.issue.id,
            tracked.issue.title,
            tracked.activities.len(),
            if tracked.activities.len() == 1 { "" } else { "s" }
        ));
    }

    Ok(())
}

pub async fn delete<S>(store: &S, id: i64, out: Output) -> Result<()>
where
    S: IssueStore + ?Sized,
{
    store.delete_issue(id).await?;
    out.print_message(&format!("Deleted issue #{id}"));
    Ok(())
}
