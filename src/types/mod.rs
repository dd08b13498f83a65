mod activity;
mod comment;
mod issue;
mod priority;
mod project;
mod status;
pub mod wire;

pub use activity::{Activity, ActivityType, NewActivity, SYSTEM_AUTHOR};
pub use comment::{initials, Comment, CommentUpdate, NewComment};
pub use issue::{Issue, IssueType, IssueUpdate, NewIssue, UNASSIGNED};
pub use priority::Priority;
pub use project::{
    add_member, dedup_members, remove_member, NewProject, Project, ProjectStatus, ProjectUpdate,
};
pub use status::IssueStatus;
