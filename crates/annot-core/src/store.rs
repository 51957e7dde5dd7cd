//! Read-only SQLite lookup store of a module.

use std::path::{Path, PathBuf};

use rusqlite::{Connection, OpenFlags};

use crate::error::{Result, RunError};

/// Shared resource directory searched after the module's own data directory.
pub const SHARED_RESOURCE_DIR: &str = "/ext/resource/newarch";

/// Directories searched for `<module>.sqlite`, highest priority first.
pub fn default_search_dirs(module_dir: &Path) -> Vec<PathBuf> {
    vec![module_dir.join("data"), PathBuf::from(SHARED_RESOURCE_DIR)]
}

/// First `<module>.sqlite` found in `search_dirs`.
pub fn locate(module: &str, search_dirs: &[PathBuf]) -> Option<PathBuf> {
    let file_name = format!("{module}.sqlite");
    search_dirs
        .iter()
        .map(|dir| dir.join(&file_name))
        .find(|path| path.is_file())
}

pub struct LookupStore {
    path: PathBuf,
    conn: Connection,
}

impl LookupStore {
    pub fn open(path: &Path) -> Result<Self> {
        let conn = Connection::open_with_flags(
            path,
            OpenFlags::SQLITE_OPEN_READ_ONLY | OpenFlags::SQLITE_OPEN_NO_MUTEX,
        )
        .map_err(|source| RunError::Store {
            path: path.to_path_buf(),
            source,
        })?;
        Ok(Self {
            path: path.to_path_buf(),
            conn,
        })
    }

    /// Locate and open the store of `module`. A missing store is not an error.
    pub fn open_for_module(module: &str, search_dirs: &[PathBuf]) -> Result<Option<Self>> {
        locate(module, search_dirs)
            .map(|path| Self::open(&path))
            .transpose()
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn connection(&self) -> &Connection {
        &self.conn
    }

    pub fn close(self) -> Result<()> {
        let path = self.path;
        self.conn
            .close()
            .map_err(|(_, source)| RunError::Store { path, source })
    }
}

impl std::fmt::Debug for LookupStore {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("LookupStore")
            .field("path", &self.path)
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use tempfile::TempDir;

    use super::*;

    #[test]
    fn first_directory_with_store_wins() {
        let first = TempDir::new().unwrap();
        let second = TempDir::new().unwrap();
        std::fs::write(second.path().join("clinvar.sqlite"), b"").unwrap();
        let dirs = vec![first.path().to_path_buf(), second.path().to_path_buf()];
        assert_eq!(
            locate("clinvar", &dirs),
            Some(second.path().join("clinvar.sqlite"))
        );

        std::fs::write(first.path().join("clinvar.sqlite"), b"").unwrap();
        assert_eq!(
            locate("clinvar", &dirs),
            Some(first.path().join("clinvar.sqlite"))
        );
    }

    #[test]
    fn missing_store_is_none() {
        let dir = TempDir::new().unwrap();
        let store = LookupStore::open_for_module("nothing", &[dir.path().to_path_buf()]).unwrap();
        assert!(store.is_none());
    }

    #[test]
    fn opened_store_is_queryable_and_read_only() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("demo.sqlite");
        {
            let conn = Connection::open(&path).unwrap();
            conn.execute_batch(
                "CREATE TABLE nucleotide_names (base TEXT, name TEXT);
                 INSERT INTO nucleotide_names VALUES ('A', 'adenine');",
            )
            .unwrap();
        }
        let store = LookupStore::open(&path).unwrap();
        let name: String = store
            .connection()
            .query_row(
                "SELECT name FROM nucleotide_names WHERE base = ?1",
                ["A"],
                |row| row.get(0),
            )
            .unwrap();
        assert_eq!(name, "adenine");
        assert!(
            store
                .connection()
                .execute("DELETE FROM nucleotide_names", [])
                .is_err()
        );
        store.close().unwrap();
    }
}
