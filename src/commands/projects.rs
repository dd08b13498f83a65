use colored::Colorize;
use tabled::Tabled;

use trackflow::error::{Result, TrackFlowError};
use trackflow::output::{format_date, truncate, Output};
use trackflow::store::{IssueStore, ProjectStore};
use trackflow::types::{
    add_member, dedup_members, remove_member, Issue, NewProject, Project, ProjectUpdate,
};

use crate::cli::{ProjectCreateArgs, ProjectUpdateArgs};

#[derive(Tabled)]
struct ProjectRow {
    #[tabled(rename = "ID")]
    id: i64,
    #[tabled(rename = "Name")]
    name: String,
    #[tabled(rename = "Status")]
    status: String,
    #[tabled(rename = "Members")]
    members: u32,
    #[tabled(rename = "Issues")]
    issues: u32,
}

impl From<&Project> for ProjectRow {
    fn from(project: &Project) -> Self {
        Self {
            id: project.id,
            name: truncate(&project.name, 40),
            status: project.status.to_string(),
            members: project.member_count,
            issues: project.issue_count,
        }
    }
}

fn compact_line(project: &Project) -> String {
    format!(
        "#{} [{}] {} ({} members)",
        project.id, project.status, project.name, project.member_count
    )
}

fn belongs_to(issue: &Issue, project: &Project) -> bool {
    issue.project_id == Some(project.id) || issue.project.eq_ignore_ascii_case(&project.name)
}

pub async fn list<S>(store: &S, out: Output) -> Result<()>
where
    S: ProjectStore + ?Sized,
{
    let projects = store.fetch_projects().await?;
    out.print_table(&projects, |p| ProjectRow::from(p), compact_line);
    Ok(())
}

pub async fn view<S>(store: &S, id: i64, out: Output) -> Result<()>
where
    S: IssueStore + ProjectStore + ?Sized,
{
    let (mut project, issues) = tokio::try_join!(store.fetch_project(id), store.fetch_all_issues())?;
    let related: Vec<&Issue> = issues.iter().filter(|i| belongs_to(i, &project)).collect();
    project.issue_count = related.len() as u32;
    let open = related.iter().filter(|i| i.status.is_active()).count();

    out.print_item(&project, |project| {
        println!("{} {}", format!("#{}", project.id).bright_black(), project.name.bold());
        println!();
        if !project.description.trim().is_empty() {
            println!("{}", project.description);
            println!();
        }
        println!("Status:  {}", project.status);
        println!("Issues:  {} ({open} open)", project.issue_count);
        println!("Created: {}", format_date(project.created_date));
        println!("Updated: {}", format_date(project.updated_date));
        if project.team_members.is_empty() {
            println!("Team:    -");
        } else {
            println!("Team:");
            for member in &project.team_members {
                println!("  - {member}");
            }
        }
    });

    Ok(())
}

pub async fn create<S>(store: &S, args: ProjectCreateArgs, out: Output) -> Result<()>
where
    S: ProjectStore + ?Sized,
{
    let project = store
        .create_project(NewProject {
            name: args.name,
            description: args.description,
            status: args.status,
            team_members: dedup_members(&args.members),
        })
        .await?;

    if out.is_json() {
        out.print_json(&project);
    } else {
        out.print_message(&format!("Created project #{} - {}", project.id, project.name));
    }
    Ok(())
}

pub async fn update<S>(store: &S, args: ProjectUpdateArgs, out: Output) -> Result<()>
where
    S: ProjectStore + ?Sized,
{
    if let Some(name) = &args.name {
        if name.trim().is_empty() {
            return Err(TrackFlowError::validation("name", "Project name is required"));
        }
    }
    let update = ProjectUpdate {
        name: args.name,
        description: args.description,
        status: args.status,
        ..Default::default()
    };
    if update == ProjectUpdate::default() {
        out.print_message("No updates specified");
        return Ok(());
    }

    let project = store.update_project(args.id, update).await?;
    if out.is_json() {
        out.print_json(&project);
    } else {
        out.print_message(&format!("Updated project #{} - {}", project.id, project.name));
    }
    Ok(())
}

pub async fn delete<S>(store: &S, id: i64, out: Output) -> Result<()>
where
    S: ProjectStore + ?Sized,
{
    store.delete_project(id).await?;
    out.print_message(&format!("Deleted project #{id}"));
    Ok(())
}

async fn set_members<S>(store: &S, id: i64, members: Vec<String>) -> Result<Project>
where
    S: ProjectStore + ?Sized,
{
    store
        .update_project(
            id,
            ProjectUpdate {
                team_members: Some(members),
                ..Default::default()
            },
        )
        .await
}

pub async fn add_team_member<S>(store: &S, id: i64, name: &str, out: Output) -> Result<()>
where
    S: ProjectStore + ?Sized,
{
    let mut members = store.fetch_project(id).await?.team_members;
    add_member(&mut members, name)?;
    let project = set_members(store, id, members).await?;

    if out.is_json() {
        out.print_json(&project);
    } else {
        out.print_message(&format!(
            "Added {} to {} ({} members)",
            name.trim(),
            project.name,
            project.member_count
        ));
    }
    Ok(())
}

pub async fn remove_team_member<S>(store: &S, id: i64, name: &str, out: Output) -> Result<()>
where
    S: ProjectStore + ?Sized,
{
    let mut members = store.fetch_project(id).await?.team_members;
    if !remove_member(&mut members, name) {
        out.print_message(&format!("{name} is not a member of project #{id}"));
        return Ok(());
    }
    let project = set_members(store, id, members).await?;

    if out.is_json() {
        out.print_json(&project);
    } else {
        out.print_message(&format!("Removed {name} from {}", project.name));
    }
    Ok(())
}
