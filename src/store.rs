use std::path::Path;
use std::rc::Rc;

use log::{debug, info, warn};
use rusqlite::types::Value;
use rusqlite::{params, params_from_iter, Connection, Rows, Statement};

use crate::dates::now_millis;
use crate::error::{Result, StoreError};
use crate::model::{task_row_from_row, Column, Filter, SortOrder, TaskRow, TaskValues};
use crate::observer::{ChangeFlag, Observer, ObserverRegistry};
use crate::resource::{Resource, TASK_RESOURCE};

/// File name of the task database inside the data directory.
pub const DATABASE_NAME: &str = "todolist.db";

/// Schema version. Raising it drops every stored task on the next open.
pub const DATABASE_VERSION: i32 = 1;

const DEFAULT_TITLE: &str = "Untitled";
const DEFAULT_DETAILS: &str = "";

/// Resource-addressed access to the tasks table.
pub struct TaskStore {
    db: Connection,
    observers: ObserverRegistry,
}

impl TaskStore {
    /// Open the task database at `path`, creating or resetting its schema
    /// as needed.
    pub fn open<P: AsRef<Path>>(path: P) -> Result<Self> {
        Self::with_connection(Connection::open(path)?, DATABASE_VERSION)
    }

    #[cfg(test)]
    pub fn open_in_memory() -> Result<Self> {
        Self::with_connection(Connection::open_in_memory()?, DATABASE_VERSION)
    }

    fn with_connection(db: Connection, version: i32) -> Result<Self> {
        prepare_schema(&db, version)?;
        Ok(TaskStore {
            db,
            observers: ObserverRegistry::new(),
        })
    }

    /// Subscribe `observer` to changes of `resource`.
    pub fn register_observer(&self, resource: Resource, observer: Rc<dyn Observer>) {
        self.observers.register(resource, observer);
    }

    pub fn content_type(&self, resource: &Resource) -> &'static str {
        resource.content_type()
    }

    /// Prepare a cursor over the tasks addressed by `resource`. For a single
    /// item the caller filter is narrowed by `id`. Nothing is read until
    /// `Cursor::rows` is called.
    pub fn query(
        &self,
        resource: &Resource,
        projection: Option<&[Column]>,
        filter: Option<&Filter>,
        sort_order: Option<SortOrder>,
    ) -> Result<Cursor<'_>> {
        let projection = projection
            .filter(|columns| !columns.is_empty())
            .map(|columns| columns.to_vec())
            .unwrap_or_else(|| Column::ALL.to_vec());

        let names: Vec<&str> = projection.iter().map(|column| column.name()).collect();
        let mut sql = format!("SELECT {} FROM {}", names.join(", "), TASK_RESOURCE);
        if let Some(clause) = where_clause(resource, filter) {
            sql.push_str(" WHERE ");
            sql.push_str(&clause);
        }
        if let Some(order) = sort_order {
            sql.push_str(&format!(" ORDER BY {}", order));
        }
        debug!("query {}: {}", resource, sql);

        let stmt = self.db.prepare(&sql)?;
        let stale = Rc::new(ChangeFlag::default());
        self.observers.register(*resource, stale.clone());

        Ok(Cursor {
            stmt,
            args: filter_args(filter),
            projection,
            stale,
        })
    }

    /// Insert a task into the collection and return its item resource.
    /// Omitted fields get their defaults and the creation time is always
    /// stamped here.
    pub fn insert(&self, resource: &Resource, values: &TaskValues) -> Result<Resource> {
        if *resource != Resource::Collection {
            return Err(StoreError::InvalidResource(resource.to_string()));
        }

        let now = now_millis();
        if values.time_created.is_some() {
            debug!("ignoring caller supplied creation time");
        }

        self.db
            .execute(
                "INSERT INTO tasks (title, details, deadline, completed, time_created) VALUES (?1, ?2, ?3, ?4, ?5)",
                params![
                    values.title.as_deref().unwrap_or(DEFAULT_TITLE),
                    values.details.as_deref().unwrap_or(DEFAULT_DETAILS),
                    values.deadline.unwrap_or(now),
                    values.completed.unwrap_or(false),
                    now,
                ],
            )
            .map_err(StoreError::WriteFailure)?;

        let item = Resource::Item(self.db.last_insert_rowid());
        debug!("inserted {}", item);
        self.observers.notify(&item);
        Ok(item)
    }

    /// Merge `values` into every addressed row and return how many rows
    /// matched. Observers of `resource` are notified even if none did.
    pub fn update(
        &self,
        resource: &Resource,
        values: &TaskValues,
        filter: Option<&Filter>,
    ) -> Result<usize> {
        let set = values.updatable();
        let count = if set.is_empty() {
            debug!("update of {} carries no updatable values", resource);
            0
        } else {
            let assignments: Vec<String> = set
                .iter()
                .map(|(column, _)| format!("{} = ?", column))
                .collect();
            let mut sql = format!("UPDATE {} SET {}", TASK_RESOURCE, assignments.join(", "));
            if let Some(clause) = where_clause(resource, filter) {
                sql.push_str(" WHERE ");
                sql.push_str(&clause);
            }
            debug!("update {}: {}", resource, sql);

            let args = set
                .into_iter()
                .map(|(_, value)| value)
                .chain(filter_args(filter));
            self.db
                .execute(&sql, params_from_iter(args))
                .map_err(StoreError::WriteFailure)?
        };

        self.observers.notify(resource);
        Ok(count)
    }

    /// Remove the addressed rows and return how many were removed.
    pub fn delete(&self, resource: &Resource, filter: Option<&Filter>) -> Result<usize> {
        let mut sql = format!("DELETE FROM {}", TASK_RESOURCE);
        if let Some(clause) = where_clause(resource, filter) {
            sql.push_str(" WHERE ");
            sql.push_str(&clause);
        }
        debug!("delete {}: {}", resource, sql);

        let count = self
            .db
            .execute(&sql, params_from_iter(filter_args(filter)))
            .map_err(StoreError::WriteFailure)?;

        self.observers.notify(resource);
        Ok(count)
    }
}

/// A prepared query over the tasks table. Rows are read lazily and the
/// query can be run again; it is marked stale when its resource changes.
pub struct Cursor<'conn> {
    stmt: Statement<'conn>,
    args: Vec<Value>,
    projection: Vec<Column>,
    stale: Rc<ChangeFlag>,
}

impl<'conn> Cursor<'conn> {
    /// Run the query from the start, clearing the stale mark.
    pub fn rows(&mut self) -> Result<CursorRows<'_>> {
        self.stale.clear();
        let rows = self.stmt.query(params_from_iter(self.args.iter()))?;
        Ok(CursorRows {
            rows,
            projection: &self.projection,
        })
    }

    /// Run the query and read every row.
    pub fn collect_rows(&mut self) -> Result<Vec<TaskRow>> {
        self.rows()?.collect()
    }

    /// Whether the resource was changed since rows were last requested.
    pub fn is_stale(&self) -> bool {
        self.stale.is_set()
    }
}

/// Rows of one run of a `Cursor`, read one at a time.
pub struct CursorRows<'a> {
    rows: Rows<'a>,
    projection: &'a [Column],
}

impl Iterator for CursorRows<'_> {
    type Item = Result<TaskRow>;

    fn next(&mut self) -> Option<Self::Item> {
        match self.rows.next() {
            Ok(Some(row)) => Some(task_row_from_row(row, self.projection).map_err(StoreError::from)),
            Ok(None) => None,
            Err(e) => Some(Err(e.into())),
        }
    }
}

/// The WHERE condition for `resource`, AND-ing the id of an item with the
/// caller filter. The id is numeric and inlined.
fn where_clause(resource: &Resource, filter: Option<&Filter>) -> Option<String> {
    let caller = filter.filter(|f| !f.is_empty()).map(|f| f.clause.as_str());
    match (resource, caller) {
        (Resource::Collection, None) => None,
        (Resource::Collection, Some(clause)) => Some(clause.to_string()),
        (Resource::Item(id), None) => Some(format!("{} = {}", Column::Id, id)),
        (Resource::Item(id), Some(clause)) => Some(format!("{} = {} AND ({})", Column::Id, id, clause)),
    }
}

fn filter_args(filter: Option<&Filter>) -> Vec<Value> {
    filter
        .filter(|f| !f.is_empty())
        .map(|f| f.args.clone())
        .unwrap_or_default()
}

/// Create the tasks table on a fresh database. A database from an older
/// schema version loses all of its tasks: the table is dropped and created
/// again. Newer versions are refused.
fn prepare_schema(db: &Connection, version: i32) -> Result<()> {
    let found: i32 = db.query_row("PRAGMA user_version", [], |row| row.get(0))?;

    if found > version {
        return Err(StoreError::UnsupportedVersion {
            found,
            expected: version,
        });
    }
    if found == version {
        return Ok(());
    }

    if found == 0 {
        info!("creating tasks table");
    } else {
        warn!(
            "upgrading task database from version {} to {}, existing tasks are discarded",
            found, version
        );
        db.execute("DROP TABLE IF EXISTS tasks", [])?;
    }

    db.execute(
        "CREATE TABLE IF NOT EXISTS tasks (
                  id              INTEGER PRIMARY KEY AUTOINCREMENT,
                  time_created    INTEGER NOT NULL,
                  title           TEXT NOT NULL,
                  details         TEXT NOT NULL,
                  deadline        INTEGER NOT NULL,
                  completed       INTEGER NOT NULL CHECK (completed IN (0, 1))
                  )",
        [],
    )?;
    db.execute_batch(&format!("PRAGMA user_version = {}", version))?;
    Ok(())
}
