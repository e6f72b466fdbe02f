use std::{
    fs,
    io::{self, Read},
    path::{Path, PathBuf},
};

use serde::de::DeserializeOwned;
use thiserror::Error;

use billbook_core::{StorageError, StoredRecord};

use crate::{
    billbook::Billbook,
    config::{Command, RecordCommand},
    store::RecordStore,
    table::{self, TableRow},
};

#[derive(Debug, Error)]
pub enum CommandError {
    #[error("failed to read {}: {source}", .path.display())]
    Input {
        path: PathBuf,
        #[source]
        source: io::Error,
    },
    #[error("invalid JSON in {}: {source}", .path.display())]
    Json {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },
    #[error("record not found: {0}")]
    Missing(String),
    #[error(transparent)]
    Storage(#[from] StorageError),
}

/// Executes one command and returns the text to print.
pub fn run(book: &Billbook, command: &Command) -> Result<String, CommandError> {
    match command {
        Command::Bills { action } => run_on(&book.bills, action),
        Command::Summaries { action } => run_on(&book.summaries, action),
    }
}

fn run_on<R>(store: &RecordStore<R>, action: &RecordCommand) -> Result<String, CommandError>
where
    R: StoredRecord + TableRow,
{
    match action {
        RecordCommand::Save { file } => {
            let draft: R::Draft = read_json(file)?;
            to_json(&store.save(draft)?)
        }
        RecordCommand::List => Ok(table::render(&store.get_all()?)),
        RecordCommand::Get { id } => match store.get_by_id(id)? {
            Some(record) => to_json(&record),
            None => Err(CommandError::Missing(id.clone())),
        },
        RecordCommand::Update { id, file } => {
            let patch: serde_json::Value = read_json(file)?;
            to_json(&store.update(id, &patch)?)
        }
        RecordCommand::Status { id, status } => {
            store.update_status(id, *status)?;
            Ok(String::new())
        }
        RecordCommand::Delete { id } => Ok(store.delete(id)?.to_string()),
        RecordCommand::Export => Ok(store.export_json()?),
        RecordCommand::Import { file } => {
            let count = store.import_json(&read_input(file)?)?;
            Ok(format!("imported {} records into {}", count, store.slot()))
        }
    }
}

fn read_input(path: &Path) -> Result<String, CommandError> {
    let result = if path == Path::new("-") {
        let mut text = String::new();
        io::stdin().read_to_string(&mut text).map(|_| text)
    } else {
        fs::read_to_string(path)
    };
    result.map_err(|source| CommandError::Input {
        path: path.to_path_buf(),
        source,
    })
}

fn read_json<T: DeserializeOwned>(path: &Path) -> Result<T, CommandError> {
    serde_json::from_str(&read_input(path)?).map_err(|source| CommandError::Json {
        path: path.to_path_buf(),
        source,
    })
}

fn to_json<T: serde::Serialize>(value: &T) -> Result<String, CommandError> {
    Ok(serde_json::to_string_pretty(value).map_err(StorageError::from)?)
}
