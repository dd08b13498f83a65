//! Chronological comment and activity history for a single issue.

use std::collections::HashSet;

use chrono::{DateTime, Utc};
use serde::Serialize;
use tracing::debug;

use crate::error::Result;
use crate::store::IssueStore;
use crate::types::{Activity, Comment};

/// Deepest nesting level rendered for replies; top-level comments are level 1.
pub const MAX_THREAD_DEPTH: usize = 3;

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "kind", rename_all = "lowercase")]
pub enum TimelineEntry {
    Comment(Comment),
    Activity(Activity),
}

impl TimelineEntry {
    pub fn created_date(&self) -> DateTime<Utc> {
        match self {
            TimelineEntry::Comment(c) => c.created_date,
            TimelineEntry::Activity(a) => a.created_date,
        }
    }
}

/// Top-level comments and all activities, oldest first. Ties keep comments
/// ahead of activities and otherwise preserve input order. Replies are left
/// out here; `build_threads` attaches them.
pub fn merge_timeline(comments: &[Comment], activities: &[Activity]) -> Vec<TimelineEntry> {
    let mut entries: Vec<TimelineEntry> = comments
        .iter()
        .filter(|c| !c.is_reply())
        .cloned()
        .map(TimelineEntry::Comment)
        .chain(activities.iter().cloned().map(TimelineEntry::Activity))
        .collect();

    entries.sort_by_key(TimelineEntry::created_date);
    entries
}

/// Direct replies to `parent_id`, oldest first.
pub fn replies_to(comments: &[Comment], parent_id: i64) -> Vec<&Comment> {
    let mut replies: Vec<&Comment> = comments
        .iter()
        .filter(|c| c.parent_id == Some(parent_id))
        .collect();
    replies.sort_by_key(|c| c.created_date);
    replies
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CommentThread {
    pub comment: Comment,
    pub depth: usize,
    pub replies: Vec<CommentThread>,
}

impl CommentThread {
    /// Number of replies at any depth.
    pub fn reply_count(&self) -> usize {
        self.replies.iter().map(|r| 1 + r.reply_count()).sum()
    }
}

/// Nest replies under their top-level comments. Anything below
/// `MAX_THREAD_DEPTH` is lifted to that level in time order, so no reply is
/// dropped.
pub fn build_threads(comments: &[Comment]) -> Vec<CommentThread> {
    let mut roots: Vec<&Comment> = comments.iter().filter(|c| !c.is_reply()).collect();
    roots.sort_by_key(|c| c.created_date);
    roots
        .into_iter()
        .map(|root| thread(comments, root, 1))
        .collect()
}

fn thread(comments: &[Comment], comment: &Comment, depth: usize) -> CommentThread {
    let replies = if depth + 1 < MAX_THREAD_DEPTH {
        replies_to(comments, comment.id)
            .into_iter()
            .map(|reply| thread(comments, reply, depth + 1))
            .collect()
    } else {
        descendants(comments, comment.id)
            .into_iter()
            .map(|reply| CommentThread {
                comment: reply.clone(),
                depth: depth + 1,
                replies: Vec::new(),
            })
            .collect()
    };

    CommentThread {
        comment: comment.clone(),
        depth,
        replies,
    }
}

/// Every reply beneath `root`, oldest first. Tolerates cyclic parent links.
fn descendants(comments: &[Comment], root: i64) -> Vec<&Comment> {
    let mut seen = HashSet::from([root]);
    let mut frontier = vec![root];
    let mut found = Vec::new();

    while let Some(parent) = frontier.pop() {
        for reply in comments.iter().filter(|c| c.parent_id == Some(parent)) {
            if seen.insert(reply.id) {
                frontier.push(reply.id);
                found.push(reply);
            }
        }
    }

    found.sort_by_key(|c| c.created_date);
    found
}

/// Everything the issue view renders below the issue itself.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct IssueTimeline {
    pub issue_id: i64,
    pub entries: Vec<TimelineEntry>,
    pub threads: Vec<CommentThread>,
    pub comment_count: usize,
}

impl IssueTimeline {
    pub fn from_parts(issue_id: i64, comments: &[Comment], activities: &[Activity]) -> Self {
        Self {
            issue_id,
            entries: merge_timeline(comments, activities),
            threads: build_threads(comments),
            comment_count: comments.len(),
        }
    }

    pub fn thread_for(&self, comment_id: i64) -> Option<&CommentThread> {
        self.threads.iter().find(|t| t.comment.id == comment_id)
    }
}

/// Fetch comments and activities concurrently and merge them. Either fetch
/// failing fails the whole load.
pub async fn load_timeline<S>(store: &S, issue_id: i64) -> Result<IssueTimeline>
where
    S: IssueStore + ?Sized,
{
    let (comments, activities) = tokio::try_join!(
        store.fetch_comments(issue_id),
        store.fetch_activities(issue_id)
    )?;
    debug!(
        issue_id,
        comments = comments.len(),
        activities = activities.len(),
        "Merging timeline"
    );
    Ok(IssueTimeline::from_parts(issue_id, &comments, &activities))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::ActivityType;
    use chrono::{Duration, TimeZone};

    fn t(minutes: i64) -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2024, 6, 1, 9, 0, 0).unwrap() + Duration::minutes(minutes)
    }

    fn comment(id: i64, parent_id: Option<i64>, at: DateTime<Utc>) -> Comment {
        Comment {
            id,
            issue_id: 1,
            content: format!("comment {id}"),
            author_name: "Sarah Johnson".to_string(),
            author_avatar: "SJ".to_string(),
            created_date: at,
            updated_date: None,
            parent_id,
            mentions: Vec::new(),
        }
    }

    fn activity(id: i64, at: DateTime<Utc>) -> Activity {
        Activity {
            id,
            issue_id: 1,
            activity_type: ActivityType::StatusChange,
            content: "changed **status** from **open** to **resolved**".to_string(),
            author_name: "System".to_string(),
            author_avatar: "SY".to_string(),
            created_date: at,
            field_changed: "status".to_string(),
            old_value: "open".to_string(),
            new_value: "resolved".to_string(),
        }
    }

    fn ids(entries: &[TimelineEntry]) -> Vec<String> {
        entries
            .iter()
            .map(|e| match e {
                TimelineEntry::Comment(c) => format!("c{}", c.id),
                TimelineEntry::Activity(a) => format!("a{}", a.id),
            })
            .collect()
    }

    #[test]
    fn earlier_activity_precedes_later_comment() {
        let merged = merge_timeline(&[comment(1, None, t(10))], &[activity(1, t(5))]);
        assert_eq!(ids(&merged), vec!["a1", "c1"]);
    }

    #[test]
    fn replies_are_excluded_and_order_is_ascending() {
        let comments = vec![
            comment(1, None, t(30)),
            comment(2, Some(1), t(31)),
            comment(3, None, t(0)),
        ];
        let activities = vec![activity(1, t(40)), activity(2, t(20))];

        let merged = merge_timeline(&comments, &activities);
        assert_eq!(ids(&merged), vec!["c3", "a2", "c1", "a1"]);
        assert!(merged
            .windows(2)
            .all(|w| w[0].created_date() <= w[1].created_date()));
    }

    #[test]
    fn equal_timestamps_keep_comments_first() {
        let merged = merge_timeline(&[comment(1, None, t(0))], &[activity(1, t(0))]);
        assert_eq!(ids(&merged), vec!["c1", "a1"]);
    }

    #[test]
    fn empty_inputs_merge_to_nothing() {
        assert!(merge_timeline(&[], &[]).is_empty());
    }

    #[test]
    fn threads_nest_to_three_levels_and_flatten_the_rest() {
        let comments = vec![
            comment(1, None, t(0)),
            comment(2, Some(1), t(1)),
            comment(3, Some(2), t(2)),
            comment(4, Some(3), t(3)),
            comment(5, Some(4), t(4)),
            comment(6, Some(1), t(5)),
        ];

        let threads = build_threads(&comments);
        assert_eq!(threads.len(), 1);
        let root = &threads[0];
        assert_eq!(root.depth, 1);
        assert_eq!(root.reply_count(), 5);

        let level2: Vec<i64> = root.replies.iter().map(|r| r.comment.id).collect();
        assert_eq!(level2, vec![2, 6]);

        let level3: Vec<(i64, usize)> = root.replies[0]
            .replies
            .iter()
            .map(|r| (r.comment.id, r.depth))
            .collect();
        assert_eq!(level3, vec![(3, 3), (4, 3), (5, 3)]);
        assert!(root.replies[0].replies.iter().all(|r| r.replies.is_empty()));
    }

    #[test]
    fn cyclic_parents_do_not_hang() {
        let comments = vec![
            comment(1, None, t(0)),
            comment(2, Some(1), t(1)),
            comment(3, Some(4), t(2)),
            comment(4, Some(3), t(3)),
        ];
        let threads = build_threads(&comments);
        assert_eq!(threads.len(), 1);
        assert_eq!(threads[0].reply_count(), 1);
        assert!(descendants(&comments, 3).len() == 1);
    }

    #[test]
    fn replies_to_is_oldest_first() {
        let comments = vec![
            comment(1, None, t(0)),
            comment(2, Some(1), t(9)),
            comment(3, Some(1), t(4)),
        ];
        let ids: Vec<i64> = replies_to(&comments, 1).iter().map(|c| c.id).collect();
        assert_eq!(ids, vec![3, 2]);
    }

    #[test]
    fn entries_serialise_with_kind_tag() {
        let value = serde_json::to_value(TimelineEntry::Activity(activity(1, t(0)))).unwrap();
        assert_eq!(value["kind"], serde_json::json!("activity"));
        assert_eq!(value["type"], serde_json::json!("status_change"));
    }
}
