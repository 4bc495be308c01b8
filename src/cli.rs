use humantime::parse_duration;
use std::path::PathBuf;
use std::time::Duration;
use structopt::StructOpt;

use crate::error::StoreError;
use crate::model::SortOrder;
use crate::resource::Resource;

/// Read a task reference, either a bare id or a `tasks/<id>` resource.
fn parse_task(s: &str) -> Result<i64, StoreError> {
    let resource = if s.bytes().all(|b| b.is_ascii_digit()) && !s.is_empty() {
        format!("tasks/{}", s).parse::<Resource>()?
    } else {
        s.parse::<Resource>()?
    };
    match resource {
        Resource::Item(id) => Ok(id),
        Resource::Collection => Err(StoreError::InvalidResource(s.to_string())),
    }
}

#[derive(Debug, StructOpt)]
pub enum Command {
    /// Add a new task.
    Add {
        /// The task title.
        #[structopt()]
        title: String,

        /// Longer description of the task.
        #[structopt(short, long)]
        details: Option<String>,

        /// Deadline date, as M-d-yyyy.
        #[structopt(long, requires = "time", conflicts_with = "due_in")]
        date: Option<String>,

        /// Deadline time, as H:mm.
        #[structopt(long, requires = "date")]
        time: Option<String>,

        /// Deadline relative to now (parse_duration), e.g. "2h 30m".
        #[structopt(long = "in", parse(try_from_str = parse_duration))]
        due_in: Option<Duration>,
    },
    /// List tasks still to do, or the completed ones.
    List {
        /// Show completed tasks instead.
        #[structopt(short, long)]
        completed: bool,

        /// Order of the to-do list: a column such as created or deadline,
        /// prefixed with '-' for descending.
        #[structopt(short, long, default_value = "created")]
        sort: SortOrder,
    },
    /// Show every detail of a task.
    Show {
        /// Task id, or tasks/<id>.
        #[structopt(parse(try_from_str = parse_task))]
        id: i64,
    },
    /// Mark a task as completed.
    Done {
        /// Task id, or tasks/<id>.
        #[structopt(parse(try_from_str = parse_task))]
        id: i64,
    },
    /// Mark a task as not completed.
    Undo {
        /// Task id, or tasks/<id>.
        #[structopt(parse(try_from_str = parse_task))]
        id: i64,
    },
    /// Remove a task.
    Rm {
        /// Task id, or tasks/<id>.
        #[structopt(parse(try_from_str = parse_task))]
        id: i64,
    },
    /// Remove every completed task.
    Clear,
}

#[derive(Debug, StructOpt)]
#[structopt(name = "todoer", about = "A small to-do list.")]
pub struct CommandLineArgs {
    #[structopt(subcommand)]
    pub action: Command,

    /// Use a different task database file.
    #[structopt(parse(from_os_str), long)]
    pub db_file: Option<PathBuf>,

    /// Log every statement and change notification.
    #[structopt(short, long)]
    pub verbose: bool,
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::Column;

    #[test]
    fn parses_add_with_date_and_time() {
        let args = CommandLineArgs::from_iter_safe(&[
            "todoer", "add", "Buy milk", "--date", "4-15-2016", "--time", "9:05",
        ])
        .unwrap();
        match args.action {
            Command::Add { title, date, time, due_in, details } => {
                assert_eq!(title, "Buy milk");
                assert_eq!(date.as_deref(), Some("4-15-2016"));
                assert_eq!(time.as_deref(), Some("9:05"));
                assert_eq!(due_in, None);
                assert_eq!(details, None);
            }
            other => panic!("unexpected command {:?}", other),
        }
    }

    #[test]
    fn parses_relative_deadline() {
        let args = CommandLineArgs::from_iter_safe(&["todoer", "add", "Call", "--in", "2h"]).unwrap();
        match args.action {
            Command::Add { due_in, .. } => assert_eq!(due_in, Some(Duration::from_secs(7200))),
            other => panic!("unexpected command {:?}", other),
        }
    }

    #[test]
    fn date_requires_time() {
        assert!(CommandLineArgs::from_iter_safe(&["todoer", "add", "x", "--date", "1-1-2020"]).is_err());
    }

    #[test]
    fn list_defaults_to_creation_order() {
        let args = CommandLineArgs::from_iter_safe(&["todoer", "--db-file", "/tmp/t.db", "list"]).unwrap();
        assert_eq!(args.db_file, Some(PathBuf::from("/tmp/t.db")));
        match args.action {
            Command::List { completed, sort } => {
                assert!(!completed);
                assert_eq!(sort, SortOrder::asc(Column::TimeCreated));
            }
            other => panic!("unexpected command {:?}", other),
        }
    }

    #[test]
    fn parses_descending_sort() {
        let args = CommandLineArgs::from_iter_safe(&["todoer", "list", "--sort", "-deadline"]).unwrap();
        match args.action {
            Command::List { sort, .. } => assert_eq!(sort, SortOrder::desc(Column::Deadline)),
            other => panic!("unexpected command {:?}", other),
        }
        assert!(CommandLineArgs::from_iter_safe(&["todoer", "list", "--sort", "priority"]).is_err());
    }

    #[test]
    fn task_references() {
        assert_eq!(parse_task("12").unwrap(), 12);
        assert_eq!(parse_task("tasks/7").unwrap(), 7);
        assert_eq!(parse_task("content://todoer/tasks/3").unwrap(), 3);
        for bad in &["tasks", "-3", "+5", "tasks/x", ""] {
            assert!(matches!(parse_task(bad), Err(StoreError::InvalidResource(_))));
        }
    }

    #[test]
    fn commands_take_task_references() {
        let args = CommandLineArgs::from_iter_safe(&["todoer", "done", "tasks/4"]).unwrap();
        assert!(matches!(args.action, Command::Done { id: 4 }));
        assert!(CommandLineArgs::from_iter_safe(&["todoer", "rm", "tasks"]).is_err());
    }
}
