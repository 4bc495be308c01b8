use std::fmt;
use std::str::FromStr;

use crate::error::StoreError;

/// Authority used in the optional `content://` prefix and in content types.
pub const AUTHORITY: &str = "todoer";

/// Name of the task collection, both as a path segment and as a table name.
pub const TASK_RESOURCE: &str = "tasks";

/// The two addressable shapes of the task store.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Resource {
    /// Every task: `tasks`.
    Collection,
    /// One task by id: `tasks/<id>`.
    Item(i64),
}

impl Resource {
    /// Whether a change announced for `other` concerns an observer of `self`.
    /// The collection overlaps with everything, items only with themselves.
    pub fn overlaps(&self, other: &Resource) -> bool {
        match (self, other) {
            (Resource::Collection, _) | (_, Resource::Collection) => true,
            (Resource::Item(a), Resource::Item(b)) => a == b,
        }
    }

    /// Type tag distinguishing "list of tasks" from "single task".
    pub fn content_type(&self) -> &'static str {
        match self {
            Resource::Collection => "vnd.todoer.cursor.dir/todoer.tasks",
            Resource::Item(_) => "vnd.todoer.cursor.item/todoer.tasks",
        }
    }
}

impl fmt::Display for Resource {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Resource::Collection => write!(f, "{}", TASK_RESOURCE),
            Resource::Item(id) => write!(f, "{}/{}", TASK_RESOURCE, id),
        }
    }
}

impl FromStr for Resource {
    type Err = StoreError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let invalid = || StoreError::InvalidResource(s.to_string());
        let path = match s.strip_prefix("content://") {
            Some(rest) => rest
                .strip_prefix(AUTHORITY)
                .and_then(|rest| rest.strip_prefix('/'))
                .ok_or_else(invalid)?,
            None => s,
        }
        .trim_matches('/');

        let mut segments = path.split('/');
        match (segments.next(), segments.next(), segments.next()) {
            (Some(TASK_RESOURCE), None, None) => Ok(Resource::Collection),
            (Some(TASK_RESOURCE), Some(id), None)
                if !id.is_empty() && id.bytes().all(|b| b.is_ascii_digit()) =>
            {
                id.parse::<i64>().map(Resource::Item).map_err(|_| invalid())
            }
            _ => Err(invalid()),
        }
    }
}
