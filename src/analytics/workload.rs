//! Open work per assignee.

use std::collections::HashMap;

use serde::Serialize;

use crate::types::Issue;

pub const WORKLOAD_LIMIT: usize = 10;

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct WorkloadEntry {
    pub assignee: String,
    pub count: usize,
}

/// Top assignees by open/in-progress issue count. Ties keep the order in
/// which assignees were first seen.
pub fn assignee_workload(issues: &[Issue]) -> Vec<WorkloadEntry> {
    let mut entries: Vec<WorkloadEntry> = Vec::new();
    let mut index: HashMap<&str, usize> = HashMap::new();

    for issue in issues.iter().filter(|i| i.status.is_active()) {
        let assignee = issue.assignee_label();
        match index.get(assignee) {
            Some(&pos) => entries[pos].count += 1,
            None => {
                index.insert(assignee, entries.len());
                entries.push(WorkloadEntry {
                    assignee: assignee.to_string(),
                    count: 1,
                });
            }
        }
    }

    // sort_by is stable
    entries.sort_by(|a, b| b.count.cmp(&a.count));
    entries.truncate(WORKLOAD_LIMIT);
    entries
}
