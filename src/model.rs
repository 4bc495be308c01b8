use std::fmt;
use std::str::FromStr;

use anyhow::anyhow;
use rusqlite::types::Value;
use rusqlite::Row;

/// A single task, saved as an entry in the tasks table.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Task {
    pub id: i64,
    pub title: String,
    pub details: String,
    pub deadline: i64,     // epoch milliseconds
    pub completed: bool,
    pub time_created: i64, // epoch milliseconds
}

/// The columns of the tasks table.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Column {
    Id,
    Title,
    Details,
    Deadline,
    Completed,
    TimeCreated,
}

impl Column {
    pub const ALL: [Column; 6] = [
        Column::Id,
        Column::Title,
        Column::Details,
        Column::Deadline,
        Column::Completed,
        Column::TimeCreated,
    ];

    pub fn name(&self) -> &'static str {
        match self {
            Column::Id => "id",
            Column::Title => "title",
            Column::Details => "details",
            Column::Deadline => "deadline",
            Column::Completed => "completed",
            Column::TimeCreated => "time_created",
        }
    }
}

impl fmt::Display for Column {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for Column {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "id" => Ok(Column::Id),
            "title" => Ok(Column::Title),
            "details" => Ok(Column::Details),
            "deadline" => Ok(Column::Deadline),
            "completed" => Ok(Column::Completed),
            "time_created" | "created" => Ok(Column::TimeCreated),
            _ => Err(anyhow!("Unknown column '{}'.", s)),
        }
    }
}

/// Ordering applied to a query.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SortOrder {
    pub column: Column,
    pub descending: bool,
}

impl SortOrder {
    pub fn asc(column: Column) -> Self {
        SortOrder { column, descending: false }
    }

    pub fn desc(column: Column) -> Self {
        SortOrder { column, descending: true }
    }
}

impl fmt::Display for SortOrder {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let direction = if self.descending { "DESC" } else { "ASC" };
        write!(f, "{} {}", self.column, direction)
    }
}

/// `deadline` sorts ascending, `-deadline` descending.
impl FromStr for SortOrder {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.strip_prefix('-') {
            Some(column) => Ok(SortOrder::desc(column.parse()?)),
            None => Ok(SortOrder::asc(s.parse()?)),
        }
    }
}

/// A SQL condition with anonymous `?` placeholders and the values bound
/// to them, in order.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Filter {
    pub clause: String,
    pub args: Vec<Value>,
}

impl Filter {
    pub fn new<S: Into<String>>(clause: S) -> Self {
        Filter {
            clause: clause.into(),
            args: Vec::new(),
        }
    }

    pub fn arg<V: Into<Value>>(mut self, value: V) -> Self {
        self.args.push(value.into());
        self
    }

    /// Tasks whose completion flag equals `completed`.
    pub fn completed(completed: bool) -> Self {
        Filter::new("completed = ?").arg(completed)
    }

    pub fn is_empty(&self) -> bool {
        self.clause.trim().is_empty()
    }
}

/// The values carried by an insert or update. Unset fields are left to
/// the store: defaults on insert, untouched on update.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct TaskValues {
    pub title: Option<String>,
    pub details: Option<String>,
    pub deadline: Option<i64>,
    pub completed: Option<bool>,
    /// Never persisted as given; the store stamps its own creation time.
    pub time_created: Option<i64>,
}

impl TaskValues {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn title<S: Into<String>>(mut self, title: S) -> Self {
        self.title = Some(title.into());
        self
    }

    pub fn details<S: Into<String>>(mut self, details: S) -> Self {
        self.details = Some(details.into());
        self
    }

    pub fn deadline(mut self, deadline: i64) -> Self {
        self.deadline = Some(deadline);
        self
    }

    pub fn completed(mut self, completed: bool) -> Self {
        self.completed = Some(completed);
        self
    }

    pub fn time_created(mut self, time_created: i64) -> Self {
        self.time_created = Some(time_created);
        self
    }

    /// The mutable columns that are set, with their values.
    pub fn updatable(&self) -> Vec<(Column, Value)> {
        let mut set = Vec::new();
        if let Some(title) = &self.title {
            set.push((Column::Title, Value::from(title.clone())));
        }
        if let Some(details) = &self.details {
            set.push((Column::Details, Value::from(details.clone())));
        }
        if let Some(deadline) = self.deadline {
            set.push((Column::Deadline, Value::from(deadline)));
        }
        if let Some(completed) = self.completed {
            set.push((Column::Completed, Value::from(completed)));
        }
        set
    }
}

/// A row returned by a query. Only the projected columns are filled in.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TaskRow {
    pub id: Option<i64>,
    pub title: Option<String>,
    pub details: Option<String>,
    pub deadline: Option<i64>,
    pub completed: Option<bool>,
    pub time_created: Option<i64>,
}

impl TaskRow {
    /// The full task, if every column was projected.
    pub fn into_task(self) -> Option<Task> {
        Some(Task {
            id: self.id?,
            title: self.title?,
            details: self.details?,
            deadline: self.deadline?,
            completed: self.completed?,
            time_created: self.time_created?,
        })
    }
}

/// Build a row from a result row whose columns are `projection`, in order.
pub fn task_row_from_row(row: &Row, projection: &[Column]) -> rusqlite::Result<TaskRow> {
    let mut task = TaskRow::default();
    for (index, column) in projection.iter().enumerate() {
        match column {
            Column::Id => task.id = Some(row.get(index)?),
            Column::Title => task.title = Some(row.get(index)?),
            Column::Details => task.details = Some(row.get(index)?),
            Column::Deadline => task.deadline = Some(row.get(index)?),
            Column::Completed => task.completed = Some(row.get(index)?),
            Column::TimeCreated => task.time_created = Some(row.get(index)?),
        }
    }
    Ok(task)
}
