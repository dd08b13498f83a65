use std::path::PathBuf;

use chrono::{DateTime, NaiveDate, Utc};
use clap::{Args, Parser, Subcommand, ValueEnum};
use clap_complete::Shell;

use trackflow::output::OutputFormat;
use trackflow::types::{IssueStatus, IssueType, Priority, ProjectStatus};

#[derive(Parser)]
#[command(name = "trackflow")]
#[command(about = "Issue and project tracking with a terminal dashboard", version)]
#[command(after_help = "EXAMPLES:
    trackflow dashboard                      Show the analytics dashboard
    trackflow issues --status open           List open issues
    trackflow issue view 12                  Issue details with its timeline
    trackflow issue comment 12 \"On it\"       Add a comment
    trackflow --data demo.json dashboard     Use a local data file")]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,

    /// Output format (table, json, compact)
    #[arg(long, short = 'o', global = true, value_enum, default_value = "table")]
    pub format: OutputFormat,

    /// Output as JSON (alias for --format json)
    #[arg(long, global = true, hide = true)]
    pub json: bool,

    /// Suppress success messages
    #[arg(long, short, global = true)]
    pub quiet: bool,

    /// Debug logging and detailed error information
    #[arg(long, short, global = true)]
    pub verbose: bool,

    /// Read and write a local JSON data file instead of the backend
    #[arg(long, global = true, value_name = "FILE")]
    pub data: Option<PathBuf>,
}

impl Cli {
    /// Get the effective output format, considering --json flag
    pub fn output_format(&self) -> OutputFormat {
        if self.json {
            OutputFormat::Json
        } else {
            self.format
        }
    }
}

#[derive(Subcommand)]
pub enum Commands {
    /// Show dashboard analytics
    #[command(after_help = "EXAMPLES:
    trackflow dashboard
    trackflow dashboard --section overdue --overdue-limit 20
    trackflow dashboard --format json")]
    Dashboard(DashboardArgs),
    /// Manage issues
    #[command(after_help = "EXAMPLES:
    trackflow issue list --assignee \"Sarah Johnson\"
    trackflow issue view 12
    trackflow issue create -t \"Login fails\" -d \"500 on submit\" --assignee \"Mike Chen\" --project Auth
    trackflow issue update 12 --status resolved
    trackflow issue comment 12 \"Fixed in #40\" --reply-to 3")]
    Issue {
        #[command(subcommand)]
        action: IssueCommands,
    },
    /// List issues (alias for 'issue list')
    Issues(IssueListArgs),
    /// List projects (alias for 'project list')
    Projects,
    /// Manage projects and their team members
    #[command(after_help = "EXAMPLES:
    trackflow project create -n \"Mobile App\" -d \"iOS and Android\" --member \"Lisa Park\"
    trackflow project add-member 2 \"Tom Wilson\"
    trackflow project update 2 --status on-hold")]
    Project {
        #[command(subcommand)]
        action: ProjectCommands,
    },
    /// Generate shell completions
    #[command(after_help = "EXAMPLES:
    trackflow completions bash > ~/.bash_completion.d/trackflow
    trackflow completions zsh > ~/.zfunc/_trackflow")]
    Completions {
        /// Shell to generate completions for
        shell: Shell,
    },
    /// Initialize configuration file interactively
    Init,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, ValueEnum)]
pub enum DashboardSection {
    #[default]
    All,
    Metrics,
    Status,
    Priority,
    Trends,
    Workload,
    Overdue,
    Activity,
}

#[derive(Args)]
pub struct DashboardArgs {
    /// Only show one section
    #[arg(long, short, value_enum, default_value = "all")]
    pub section: DashboardSection,

    /// Overdue issues to list in the table view
    #[arg(long, default_value = "5")]
    pub overdue_limit: usize,
}

#[derive(Subcommand)]
pub enum IssueCommands {
    /// List issues
    List(IssueListArgs),
    /// Show issue details, comments and activity
    View {
        /// Issue ID
        id: i64,
    },
    /// Create a new issue
    Create(IssueCreateArgs),
    /// Update an existing issue (changes are recorded in its activity log)
    Update(IssueUpdateArgs),
    /// Delete an issue
    Delete {
        /// Issue ID
        id: i64,
    },
    /// Add a comment or reply to an issue
    Comment(CommentArgs),
    /// Edit a comment
    CommentEdit {
        /// Comment ID
        id: i64,
        /// New comment body
        body: String,
    },
    /// Delete a comment and its replies
    CommentDelete {
        /// Comment ID
        id: i64,
    },
}

#[derive(Args, Clone)]
pub struct IssueListArgs {
    /// Filter by status (open, in-progress, resolved, closed)
    #[arg(long, value_parser = IssueStatus::parse_known)]
    pub status: Option<IssueStatus>,

    /// Filter by priority (critical, high, medium, low)
    #[arg(long, value_parser = Priority::parse_known)]
    pub priority: Option<Priority>,

    /// Filter by assignee name
    #[arg(long)]
    pub assignee: Option<String>,

    /// Filter by project name
    #[arg(long)]
    pub project: Option<String>,

    /// Search title, assignee and project
    #[arg(long, short)]
    pub search: Option<String>,

    /// Maximum number of issues to show
    #[arg(long, short, default_value = "25")]
    pub limit: usize,
}

#[derive(Args)]
pub struct IssueCreateArgs {
    /// Issue title
    #[arg(long, short)]
    pub title: String,

    /// Issue description
    #[arg(long, short)]
    pub description: String,

    /// Person responsible
    #[arg(long)]
    pub assignee: String,

    /// Project name
    #[arg(long)]
    pub project: String,

    /// Project ID
    #[arg(long)]
    pub project_id: Option<i64>,

    #[arg(long = "type", value_enum, default_value = "bug")]
    pub issue_type: IssueType,

    #[arg(long, value_parser = IssueStatus::parse_known, default_value = "open")]
    pub status: IssueStatus,

    #[arg(long, value_parser = Priority::parse_known, default_value = "medium")]
    pub priority: Priority,

    /// Comma-separated labels
    #[arg(long, value_delimiter = ',')]
    pub labels: Vec<String>,

    /// Due date (YYYY-MM-DD)
    #[arg(long, value_parser = parse_due_date)]
    pub due: Option<DateTime<Utc>>,
}

#[derive(Args)]
pub struct IssueUpdateArgs {
    /// Issue ID
    pub id: i64,

    #[arg(long)]
    pub title: Option<String>,

    #[arg(long)]
    pub description: Option<String>,

    #[arg(long = "type", value_enum)]
    pub issue_type: Option<IssueType>,

    #[arg(long, value_parser = IssueStatus::parse_known)]
    pub status: Option<IssueStatus>,

    #[arg(long, value_parser = Priority::parse_known)]
    pub priority: Option<Priority>,

    /// New assignee (empty string to unassign)
    #[arg(long)]
    pub assignee: Option<String>,

    #[arg(long)]
    pub project: Option<String>,

    /// Replace labels (comma-separated)
    #[arg(long, value_delimiter = ',')]
    pub labels: Option<Vec<String>>,

    /// New due date (YYYY-MM-DD)
    #[arg(long, value_parser = parse_due_date, conflicts_with = "clear_due")]
    pub due: Option<DateTime<Utc>>,

    /// Remove the due date
    #[arg(long)]
    pub clear_due: bool,

    /// Name recorded on the activity log
    #[arg(long)]
    pub author: Option<String>,
}

#[derive(Args)]
pub struct CommentArgs {
    /// Issue ID
    pub id: i64,

    /// Comment body (**bold**, *italic*, `code`, @mentions)
    pub body: String,

    /// Reply to this comment ID
    #[arg(long)]
    pub reply_to: Option<i64>,

    /// Comment author (defaults to config author_name)
    #[arg(long)]
    pub author: Option<String>,
}

#[derive(Subcommand)]
pub enum ProjectCommands {
    /// List projects
    List,
    /// Show project details
    View {
        /// Project ID
        id: i64,
    },
    /// Create a project
    Create(ProjectCreateArgs),
    /// Update a project
    Update(ProjectUpdateArgs),
    /// Delete a project
    Delete {
        /// Project ID
        id: i64,
    },
    /// Add a team member
    AddMember {
        /// Project ID
        id: i64,
        /// Member name
        name: String,
    },
    /// Remove a team member
    RemoveMember {
        /// Project ID
        id: i64,
        /// Member name (exact)
        name: String,
    },
}

#[derive(Args)]
pub struct ProjectCreateArgs {
    /// Project name
    #[arg(long, short)]
    pub name: String,

    /// Project description
    #[arg(long, short)]
    pub description: String,

    #[arg(long, value_enum, default_value = "active")]
    pub status: ProjectStatus,

    /// Team member (repeatable)
    #[arg(long = "member")]
    pub members: Vec<String>,
}

#[derive(Args)]
pub struct ProjectUpdateArgs {
    /// Project ID
    pub id: i64,

    #[arg(long, short)]
    pub name: Option<String>,

    #[arg(long, short)]
    pub description: Option<String>,

    #[arg(long, value_enum)]
    pub status: Option<ProjectStatus>,
}

fn parse_due_date(raw: &str) -> Result<DateTime<Utc>, String> {
    NaiveDate::parse_from_str(raw.trim(), "%Y-%m-%d")
        .ok()
        .and_then(|date| date.and_hms_opt(0, 0, 0))
        .map(|naive| naive.and_utc())
        .ok_or_else(|| format!("invalid date '{raw}', expected YYYY-MM-DD"))
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;

    #[test]
    fn cli_definition_is_valid() {
        Cli::command().debug_assert();
    }

    #[test]
    fn json_alias_overrides_format() {
        let cli = Cli::parse_from(["trackflow", "--json", "projects"]);
        assert_eq!(cli.output_format(), OutputFormat::Json);
    }

    #[test]
    fn update_parses_labels_and_due_date() {
        let cli = Cli::parse_from([
            "trackflow",
            "issue",
            "update",
            "7",
            "--status",
            "in progress",
            "--labels",
            "ui,auth",
            "--due",
            "2024-11-01",
        ]);
        let Commands::Issue {
            action: IssueCommands::Update(args),
        } = cli.command
        else {
            panic!("expected issue update");
        };
        assert_eq!(args.status, Some(IssueStatus::InProgress));
        assert_eq!(
            args.labels,
            Some(vec!["ui".to_string(), "auth".to_string()])
        );
        assert_eq!(args.due, parse_due_date("2024-11-01").ok());
    }

    #[test]
    fn bad_due_date_is_rejected() {
        assert!(parse_due_date("next week").is_err());
    }
}
