#[macro_use] extern crate prettytable;

use anyhow::{anyhow, Context};
use chrono::Duration;
use directories::ProjectDirs;
use log::LevelFilter;
use std::path::PathBuf;
use std::rc::Rc;
use structopt::StructOpt;

mod cli;
mod dates;
mod error;
mod interface;
mod model;
mod observer;
mod resource;
mod store;

use crate::observer::Observer;
use crate::resource::Resource;
use crate::store::{TaskStore, DATABASE_NAME};

use cli::{Command::*, CommandLineArgs};

fn find_default_db_file() -> anyhow::Result<PathBuf> {
    let base_dirs = ProjectDirs::from("edu", "uw", "todoer")
        .ok_or_else(|| anyhow!("Failed to find a data directory."))?;
    let root_dir = base_dirs.data_dir();
    if !root_dir.exists() {
        std::fs::create_dir_all(root_dir)
            .with_context(|| format!("Failed to create {}.", root_dir.display()))?;
    }
    Ok(root_dir.join(DATABASE_NAME))
}

/// Turn the deadline options of `add` into epoch milliseconds.
fn deadline(
    date: Option<String>,
    time: Option<String>,
    due_in: Option<std::time::Duration>,
) -> anyhow::Result<Option<i64>> {
    if let (Some(date), Some(time)) = (&date, &time) {
        return Ok(Some(dates::parse_deadline(date, time)?));
    }
    match due_in {
        Some(due_in) => {
            let due_in = Duration::from_std(due_in).context("Deadline is too far away.")?;
            let deadline = dates::now_millis()
                .checked_add(due_in.num_milliseconds())
                .ok_or_else(|| anyhow!("Deadline is too far away."))?;
            Ok(Some(deadline))
        }
        None => Ok(None),
    }
}

fn main() -> anyhow::Result<()> {
    // Get the command-line arguments.
    let CommandLineArgs {
        action,
        db_file,
        verbose,
    } = CommandLineArgs::from_args();

    env_logger::Builder::default()
        .filter_level(if verbose {
            LevelFilter::Debug
        } else {
            LevelFilter::Warn
        })
        .parse_default_env()
        .init();

    // Unpack the database file.
    let db_file = match db_file {
        Some(path) => path,
        None => find_default_db_file()?,
    };

    let store = TaskStore::open(&db_file)
        .with_context(|| format!("Failed to open {}.", db_file.display()))?;
    let change_logger: Rc<dyn Observer> = Rc::new(interface::ChangeLogger);
    store.register_observer(Resource::Collection, change_logger.clone());

    // Perform the action.
    match action {
        Add {
            title,
            details,
            date,
            time,
            due_in,
        } => {
            let deadline = deadline(date, time, due_in)?;
            interface::add_task(&store, title, details, deadline).map(|_| ())
        }
        List { completed, sort } => interface::list(&store, completed, sort),
        Show { id } => interface::show(&store, id),
        Done { id } => interface::set_completed(&store, id, true),
        Undo { id } => interface::set_completed(&store, id, false),
        Rm { id } => interface::remove_task(&store, id),
        Clear => interface::clear_completed(&store).map(|_| ()),
    }?;
    Ok(())
}
