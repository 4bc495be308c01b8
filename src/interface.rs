use anyhow::{bail, Context, Result};
use log::{debug, info};
use prettytable::Table;

use crate::dates::format_millis;
use crate::model::{Column, Filter, SortOrder, Task, TaskRow, TaskValues};
use crate::observer::Observer;
use crate::resource::Resource;
use crate::store::TaskStore;

const DETAILS_WIDTH: usize = 72;

/// Reports every change notification in the log.
pub struct ChangeLogger;

impl Observer for ChangeLogger {
    fn on_changed(&self, resource: &Resource) {
        info!("{} changed", resource);
    }
}

/// Add a task. Without a deadline the store uses the creation time.
pub fn add_task(
    store: &TaskStore,
    title: String,
    details: Option<String>,
    deadline: Option<i64>,
) -> Result<Resource> {
    let mut values = TaskValues::new().title(title);
    values.details = details;
    values.deadline = deadline;

    let item = store
        .insert(&Resource::Collection, &values)
        .context("Failed to add task.")?;
    println!("New task added! ({})", item);
    Ok(item)
}

/// Print the to-do list, or the completed list.
pub fn list(store: &TaskStore, completed: bool, order: SortOrder) -> Result<()> {
    let table = list_table(store, completed, order)?;
    if table.len() <= 1 {
        if completed {
            println!("No completed tasks.");
        } else {
            println!("Nothing to do! Use 'todoer add' to add new tasks to your list.");
        }
        return Ok(());
    }
    table.printstd();
    Ok(())
}

/// The rows shown by `list`. The completed list is always in creation order.
pub fn list_rows(store: &TaskStore, completed: bool, order: SortOrder) -> Result<Vec<TaskRow>> {
    let sort = if completed {
        SortOrder::asc(Column::TimeCreated)
    } else {
        order
    };
    let projection = [Column::Id, Column::Title, Column::Deadline];

    let mut cursor = store
        .query(
            &Resource::Collection,
            Some(&projection[..]),
            Some(&Filter::completed(completed)),
            Some(sort),
        )
        .context("Failed to query tasks.")?;
    let rows = cursor.collect_rows().context("Failed to read tasks.")?;
    Ok(rows)
}

fn list_table(store: &TaskStore, completed: bool, order: SortOrder) -> Result<Table> {
    let mut table = Table::new();
    table.add_row(row!["id", "task", "deadline"]);
    for task in list_rows(store, completed, order)? {
        table.add_row(row![
            task.id.map(|id| id.to_string()).unwrap_or_default(),
            task.title.unwrap_or_default(),
            task.deadline.map(format_millis).unwrap_or_default()
        ]);
    }
    Ok(table)
}

/// Fetch a whole task by id.
pub fn find_task(store: &TaskStore, id: i64) -> Result<Option<Task>> {
    let resource = Resource::Item(id);
    debug!("reading {} as {}", resource, store.content_type(&resource));
    let mut cursor = store
        .query(&resource, None, None, None)
        .with_context(|| format!("Failed to query task {}.", id))?;
    let task = cursor
        .collect_rows()
        .with_context(|| format!("Failed to read task {}.", id))?
        .into_iter()
        .next()
        .and_then(TaskRow::into_task);
    Ok(task)
}

/// Print the detail view of a task.
pub fn show(store: &TaskStore, id: i64) -> Result<()> {
    let task = match find_task(store, id)? {
        Some(task) => task,
        None => bail!("No task with id {}.", id),
    };

    println!("{}", task.title);
    if !task.details.is_empty() {
        println!();
        println!("{}", textwrap::fill(&task.details, DETAILS_WIDTH));
    }
    println!();
    println!("deadline:  {}", format_millis(task.deadline));
    println!("created:   {}", format_millis(task.time_created));
    println!("completed: {}", if task.completed { "yes" } else { "no" });
    Ok(())
}

/// Mark a task as completed or not.
pub fn set_completed(store: &TaskStore, id: i64, completed: bool) -> Result<()> {
    let count = store
        .update(
            &Resource::Item(id),
            &TaskValues::new().completed(completed),
            None,
        )
        .with_context(|| format!("Failed to update task {}.", id))?;
    if count == 0 {
        bail!("No task with id {}.", id);
    }
    Ok(())
}

pub fn remove_task(store: &TaskStore, id: i64) -> Result<()> {
    let count = store
        .delete(&Resource::Item(id), None)
        .with_context(|| format!("Failed to remove task {}.", id))?;
    if count == 0 {
        bail!("No task with id {}.", id);
    }
    Ok(())
}

/// Remove every completed task, returning how many went.
pub fn clear_completed(store: &TaskStore) -> Result<usize> {
    let count = store
        .delete(&Resource::Collection, Some(&Filter::completed(true)))
        .context("Failed to remove completed tasks.")?;
    println!("Removed {} completed task(s).", count);
    Ok(count)
}
