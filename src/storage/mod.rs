//!  Storage is organized through [json_storage::JsonFileStorage].
//!  The basic idea is:
//!   - All habits live in one json file, which is always read and written as a whole.
//!   - A missing file is the same as having no habits.
//!   - Saving replaces the file atomically, so a failed save keeps the previous data.

pub mod entities;
pub mod json_storage;

use std::{io, ops::Deref, path::PathBuf};

use thiserror::Error;

use entities::HabitCollection;

#[derive(Error, Debug)]
pub enum StorageError {
    #[error("failed to read {path:?}: {source}")]
    Read { path: PathBuf, source: io::Error },
    #[error("failed to decode {path:?}: {source}")]
    Decode {
        path: PathBuf,
        source: serde_json::Error,
    },
    #[error("failed to encode habits: {0}")]
    Encode(#[source] serde_json::Error),
    #[error("failed to write {path:?}: {source}")]
    Write { path: PathBuf, source: io::Error },
}

/// Interface for abstracting storage of the habit collection.
#[cfg_attr(test, mockall::automock)]
pub trait HabitStorage {
    /// Reads the whole collection. Absence of stored data is an empty collection, not an error.
    fn load(&self) -> Result<HabitCollection, StorageError>;

    /// Replaces stored data with `collection`.
    fn save(&self, collection: &HabitCollection) -> Result<(), StorageError>;
}

impl<T: Deref> HabitStorage for T
where
    T::Target: HabitStorage,
{
    fn load(&self) -> Result<HabitCollection, StorageError> {
        self.deref().load()
    }

    fn save(&self, collection: &HabitCollection) -> Result<(), StorageError> {
        self.deref().save(collection)
    }
}
