use std::fs::{self, OpenOptions};
use std::io::{Read, Write};
use std::path::{Path, PathBuf};

use serde::de::DeserializeOwned;
use serde::Serialize;

use crate::error::StorageError;
use crate::models::{Session, Todo};

const TODOS_FILE: &str = "todos.json";
const SESSION_FILE: &str = "session.json";

/// Returns the directory holding the local cache.
///
/// The path is determined in the following order:
/// 1. `TODODECK_DIR` environment variable.
/// 2. `~/.local/share/tododeck` (on Linux).
/// 3. `./tododeck` (fallback).
pub fn default_dir() -> PathBuf {
    std::env::var("TODODECK_DIR").map(PathBuf::from).unwrap_or_else(|_| {
        let mut p = dirs::data_local_dir().unwrap_or_else(|| PathBuf::from("."));
        p.push("tododeck");
        p
    })
}

/// On-disk mirror of the todo list and the login session.
///
/// This is a cache: whatever the server returns on the next pull wins.
#[derive(Debug, Clone)]
pub struct Storage {
    dir: PathBuf,
}

impl Storage {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Storage { dir: dir.into() }
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    fn path(&self, file: &str) -> PathBuf {
        self.dir.join(file)
    }

    /// Reads and parses a JSON file. Missing, unreadable or malformed files
    /// yield `None`; malformed ones are logged and left in place.
    fn read_json<T: DeserializeOwned>(&self, file: &str) -> Option<T> {
        let path = self.path(file);
        if !path.exists() {
            return None;
        }
        let mut f = match OpenOptions::new().read(true).open(&path) {
            Ok(f) => f,
            Err(e) => {
                tracing::warn!(path = %path.display(), error = %e, "cannot open cache file");
                return None;
            }
        };
        let mut s = String::new();
        if let Err(e) = f.read_to_string(&mut s) {
            tracing::warn!(path = %path.display(), error = %e, "cannot read cache file");
            return None;
        }
        match serde_json::from_str(&s) {
            Ok(value) => Some(value),
            Err(e) => {
                tracing::warn!(path = %path.display(), error = %e, "discarding malformed cache file");
                None
            }
        }
    }

    fn write_json<T: Serialize + ?Sized>(&self, file: &str, value: &T) -> Result<(), StorageError> {
        fs::create_dir_all(&self.dir)?;
        let s = serde_json::to_string_pretty(value)?;
        let mut f = OpenOptions::new()
            .create(true)
            .write(true)
            .truncate(true)
            .open(self.path(file))?;
        f.write_all(s.as_bytes())?;
        Ok(())
    }

    /// Loads the cached todo list, or an empty one if there is none usable.
    pub fn load_todos(&self) -> Vec<Todo> {
        self.read_json(TODOS_FILE).unwrap_or_default()
    }

    /// Overwrites the cached todo list.
    pub fn save_todos(&self, todos: &[Todo]) -> Result<(), StorageError> {
        self.write_json(TODOS_FILE, todos)
    }

    pub fn load_session(&self) -> Option<Session> {
        self.read_json(SESSION_FILE)
    }

    pub fn save_session(&self, session: &Session) -> Result<(), StorageError> {
        self.write_json(SESSION_FILE, session)
    }

    /// Forgets the stored session. Missing files are not an error.
    pub fn clear_session(&self) -> Result<(), StorageError> {
        let path = self.path(SESSION_FILE);
        if path.exists() {
            fs::remove_file(path)?;
        }
        Ok(())
    }

    /// Deletes both cache files.
    pub fn delete_database(&self) -> Result<(), StorageError> {
        for file in [TODOS_FILE, SESSION_FILE] {
            let path = self.path(file);
            if path.exists() {
                fs::remove_file(path)?;
            }
        }
        Ok(())
    }
}
