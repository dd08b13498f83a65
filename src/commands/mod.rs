pub mod comments;
pub mod dashboard;
pub mod init;
pub mod issues;
pub mod projects;
