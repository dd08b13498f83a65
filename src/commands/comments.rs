use trackflow::error::Result;
use trackflow::markup::extract_mentions;
use trackflow::output::Output;
use trackflow::store::{IssueStore, ProjectStore};
use trackflow::types::{CommentUpdate, NewComment};

use crate::cli::CommentArgs;

/// Everyone who can be @mentioned: assignees and project team members.
async fn known_people<S>(store: &S) -> Result<Vec<String>>
where
    S: IssueStore + ProjectStore + ?Sized,
{
    let (issues, projects) = tokio::try_join!(store.fetch_all_issues(), store.fetch_projects())?;

    let mut people: Vec<String> = Vec::new();
    let names = issues
        .iter()
        .map(|i| i.assignee.trim())
        .chain(projects.iter().flat_map(|p| p.team_members.iter().map(|m| m.trim())));
    for name in names {
        if !name.is_empty() && !people.iter().any(|p| p.eq_ignore_ascii_case(name)) {
            people.push(name.to_string());
        }
    }
    Ok(people)
}

pub async fn add<S>(store: &S, args: CommentArgs, author: Option<String>, out: Output) -> Result<()>
where
    S: IssueStore + ProjectStore + ?Sized,
{
    let people = known_people(store).await?;
    let mentions = extract_mentions(&args.body, &people);

    let comment = store
        .create_comment(NewComment {
            issue_id: args.id,
            content: args.body,
            author_name: author,
            parent_id: args.reply_to,
            mentions,
        })
        .await?;

    if out.is_json() {
        out.print_json(&comment);
    } else {
        let kind = if comment.is_reply() { "reply" } else { "comment" };
        let mut message = format!("Added {kind} #{} to issue #{}", comment.id, comment.issue_id);
        if !comment.mentions.is_empty() {
            message.push_str(&format!(" (mentioned {})", comment.mentions.join(", ")));
        }
        out.print_message(&message);
    }

    Ok(())
}

pub async fn edit<S>(store: &S, id: i64, body: String, out: Output) -> Result<()>
where
    S: IssueStore + ProjectStore + ?Sized,
{
    let people = known_people(store).await?;
    let mentions = extract_mentions(&body, &people);

    let comment = store
        .update_comment(
            id,
            CommentUpdate {
                content: Some(body),
                mentions: Some(mentions),
            },
        )
        .await?;

    if out.is_json() {
        out.print_json(&comment);
    } else {
        out.print_message(&format!("Updated comment #{}", comment.id));
    }

    Ok(())
}

pub async fn delete<S>(store: &S, id: i64, out: Output) -> Result<()>
where
    S: IssueStore + ?Sized,
{
    store.delete_comment(id).await?;
    out.print_message(&format!("Deleted comment #{id}"));
    Ok(())
}
