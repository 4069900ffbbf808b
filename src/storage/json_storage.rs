use std::{
    fs::{self, Permissions},
    io::{ErrorKind, Write},
    path::{Path, PathBuf},
};

use tempfile::NamedTempFile;
use tracing::{debug, info};

use super::{entities::HabitCollection, HabitStorage, StorageError};

/// Default location of the habit file, relative to the working directory.
pub const DEFAULT_DATA_FILE: &str = "data/habits.json";

/// The main realization of [HabitStorage]. Keeps everything inside a single pretty printed json
/// file.
pub struct JsonFileStorage {
    path: PathBuf,
}

impl JsonFileStorage {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Where the bytes really go. A symlinked habit file keeps being a symlink.
    fn resolve_target(&self) -> Result<PathBuf, std::io::Error> {
        match fs::canonicalize(&self.path) {
            Ok(target) => Ok(target),
            Err(e) if e.kind() == ErrorKind::NotFound => Ok(self.path.clone()),
            Err(e) => Err(e),
        }
    }

    fn write_atomically(&self, bytes: &[u8]) -> Result<(), std::io::Error> {
        let target = self.resolve_target()?;
        let dir = match target.parent() {
            Some(dir) if !dir.as_os_str().is_empty() => dir,
            _ => Path::new("."),
        };
        fs::create_dir_all(dir)?;

        // Temp file has to be on the same file system for the rename to be atomic.
        let mut file = NamedTempFile::new_in(dir)?;
        file.write_all(bytes)?;
        if let Some(permissions) = target_permissions(&target)? {
            file.as_file().set_permissions(permissions)?;
        }
        file.as_file().sync_all()?;
        file.persist(&target).map_err(|e| e.error)?;
        Ok(())
    }
}

/// Temp files are private, so the replaced file gets the permissions of the previous one, or
/// the usual 0644 for a new file.
fn target_permissions(target: &Path) -> Result<Option<Permissions>, std::io::Error> {
    match fs::metadata(target) {
        Ok(metadata) if metadata.is_file() => Ok(Some(metadata.permissions())),
        Ok(_) => Ok(None),
        Err(e) if e.kind() == ErrorKind::NotFound => Ok(default_permissions()),
        Err(e) => Err(e),
    }
}

#[cfg(unix)]
fn default_permissions() -> Option<Permissions> {
    use std::os::unix::fs::PermissionsExt;
    Some(Permissions::from_mode(0o644))
}

#[cfg(not(unix))]
fn default_permissions() -> Option<Permissions> {
    None
}

impl HabitStorage for JsonFileStorage {
    fn load(&self) -> Result<HabitCollection, StorageError> {
        debug!("Loading habits from {:?}", self.path);
        let content = match fs::read(&self.path) {
            Ok(content) => content,
            Err(e) if e.kind() == ErrorKind::NotFound => {
                debug!("{:?} doesn't exist yet", self.path);
                return Ok(HabitCollection::default());
            }
            Err(source) => {
                return Err(StorageError::Read {
                    path: self.path.clone(),
                    source,
                })
            }
        };

        serde_json::from_slice(&content).map_err(|source| StorageError::Decode {
            path: self.path.clone(),
            source,
        })
    }

    fn save(&self, collection: &HabitCollection) -> Result<(), StorageError> {
        let mut buffer = serde_json::to_vec_pretty(collection).map_err(StorageError::Encode)?;
        buffer.push(b'\n');

        self.write_atomically(&buffer)
            .map_err(|source| StorageError::Write {
                path: self.path.clone(),
                source,
            })?;
        info!(
            "Saved {} habits into {:?}",
            collection.habits.len(),
            self.path
        );
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use anyhow::Result;
    use chrono::NaiveDate;
    use tempfile::tempdir;

    use crate::storage::{
        entities::{Habit, HabitCollection},
        HabitStorage, StorageError,
    };

    use super::JsonFileStorage;

    const TEST_DATE: NaiveDate = NaiveDate::from_ymd_opt(2024, 1, 1).unwrap();

    #[test]
    fn test_load_missing_file() -> Result<()> {
        let dir = tempdir()?;
        let storage = JsonFileStorage::new(dir.path().join("habits.json"));

        assert_eq!(storage.load()?, HabitCollection::default());
        assert!(!storage.path().exists());
        Ok(())
    }

    #[test]
    fn test_save_and_load_preserve_order() -> Result<()> {
        let dir = tempdir()?;
        let storage = JsonFileStorage::new(dir.path().join("habits.json"));
        let collection = HabitCollection {
            habits: vec![
                Habit::new("Read").with_completed(vec![
                    TEST_DATE.succ_opt().unwrap(),
                    TEST_DATE,
                ]),
                Habit::new("Exercise"),
                Habit::new(""),
            ],
        };

        storage.save(&collection)?;

        assert_eq!(storage.load()?, collection);
        Ok(())
    }

    #[test]
    fn test_save_uses_two_space_indent() -> Result<()> {
        let dir = tempdir()?;
        let storage = JsonFileStorage::new(dir.path().join("habits.json"));
        let collection = HabitCollection {
            habits: vec![Habit::new("Exercise").with_completed(vec![TEST_DATE])],
        };

        storage.save(&collection)?;

        let content = std::fs::read_to_string(storage.path())?;
        assert_eq!(
            content,
            "{\n  \"habits\": [\n    {\n      \"name\": \"Exercise\",\n      \"completed\": [\n        \"2024-01-01\"\n      ]\n    }\n  ]\n}\n"
        );
        Ok(())
    }

    #[test]
    fn test_save_creates_parent_directory() -> Result<()> {
        let dir = tempdir()?;
        let storage = JsonFileStorage::new(dir.path().join("data").join("habits.json"));

        storage.save(&HabitCollection::default())?;

        assert!(storage.path().exists());
        Ok(())
    }

    #[test]
    fn test_load_corrupted_file() -> Result<()> {
        let dir = tempdir()?;
        let path = dir.path().join("habits.json");
        std::fs::write(&path, "{\"habits\": [ {\"name\": ")?;

        let storage = JsonFileStorage::new(&path);

        assert!(matches!(storage.load(), Err(StorageError::Decode { .. })));
        Ok(())
    }

    #[test]
    fn test_load_unreadable_path() -> Result<()> {
        let dir = tempdir()?;
        // A directory can't be read as a file.
        let storage = JsonFileStorage::new(dir.path());

        assert!(matches!(storage.load(), Err(StorageError::Read { .. })));
        Ok(())
    }

    #[test]
    fn test_failed_replace_keeps_previous_data() -> Result<()> {
        let dir = tempdir()?;
        let path = dir.path().join("habits.json");
        // The target can't be replaced by a file, so only the final rename fails.
        std::fs::create_dir(&path)?;
        std::fs::write(path.join("keep.txt"), "previous")?;
        let storage = JsonFileStorage::new(&path);

        let result = storage.save(&HabitCollection {
            habits: vec![Habit::new("Exercise")],
        });

        assert!(matches!(result, Err(StorageError::Write { .. })));
        assert_eq!(std::fs::read_to_string(path.join("keep.txt"))?, "previous");
        let leftovers: Vec<_> = std::fs::read_dir(dir.path())?
            .map(|entry| entry.map(|e| e.file_name()))
            .collect::<Result<_, _>>()?;
        assert_eq!(leftovers, vec![std::ffi::OsString::from("habits.json")]);
        Ok(())
    }

    #[cfg(unix)]
    #[test]
    fn test_save_permissions() -> Result<()> {
        use std::os::unix::fs::PermissionsExt;

        let dir = tempdir()?;
        let storage = JsonFileStorage::new(dir.path().join("habits.json"));
        let mode = || -> Result<u32> {
            Ok(std::fs::metadata(storage.path())?.permissions().mode() & 0o777)
        };

        storage.save(&HabitCollection::default())?;
        assert_eq!(mode()?, 0o644);

        std::fs::set_permissions(storage.path(), std::fs::Permissions::from_mode(0o640))?;
        storage.save(&HabitCollection {
            habits: vec![Habit::new("Read")],
        })?;
        assert_eq!(mode()?, 0o640);
        Ok(())
    }

    #[cfg(unix)]
    #[test]
    fn test_save_through_symlink() -> Result<()> {
        let dir = tempdir()?;
        let real_dir = dir.path().join("real");
        std::fs::create_dir(&real_dir)?;
        let real = real_dir.join("habits.json");
        std::fs::write(&real, "{\"habits\": []}")?;
        let link = dir.path().join("habits.json");
        std::os::unix::fs::symlink(&real, &link)?;
        let storage = JsonFileStorage::new(&link);
        let collection = HabitCollection {
            habits: vec![Habit::new("Read")],
        };

        storage.save(&collection)?;

        assert!(std::fs::symlink_metadata(&link)?.file_type().is_symlink());
        assert_eq!(JsonFileStorage::new(&real).load()?, collection);
        Ok(())
    }
}
