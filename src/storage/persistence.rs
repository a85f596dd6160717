//! JSON file persistence: one metadata file plus one file per table.

use super::{Catalog, Table};
use crate::core::{DbError, Result, TableSchema};
use serde::Serialize;
use serde::de::DeserializeOwned;
use std::fs::{self, File};
use std::io::{BufReader, BufWriter, Write};
use std::path::{Path, PathBuf};
use tempfile::NamedTempFile;
use tracing::debug;

pub const DEFAULT_METADATA_FILE: &str = "db_meta.json";

/// Loads and saves catalog and table snapshots under a data directory.
///
/// Writes go to a temporary file in the same directory which is then renamed
/// over the target, so a crash leaves either the old or the new content.
#[derive(Debug, Clone)]
pub struct JsonStore {
    data_dir: PathBuf,
    metadata_file: String,
}

impl JsonStore {
    pub fn new<P: AsRef<Path>>(data_dir: P, metadata_file: impl Into<String>) -> Self {
        Self {
            data_dir: data_dir.as_ref().to_path_buf(),
            metadata_file: metadata_file.into(),
        }
    }

    pub fn metadata_path(&self) -> PathBuf {
        self.data_dir.join(&self.metadata_file)
    }

    pub fn table_path(&self, name: &str) -> PathBuf {
        self.data_dir.join(format!("{}.json", name))
    }

    /// Reject a table name whose file would be the metadata file.
    pub fn check_table_name(&self, name: &str) -> Result<()> {
        if self.table_path(name) == self.metadata_path() {
            return Err(DbError::InvalidTableName {
                name: name.to_string(),
                reason: format!("'{}' is the metadata file", self.metadata_file),
            });
        }
        Ok(())
    }

    /// A missing metadata file is an empty catalog.
    pub fn load_catalog(&self) -> Result<Catalog> {
        let path = self.metadata_path();
        match read_json(&path)? {
            Some(catalog) => Ok(catalog),
            None => {
                debug!(path = %path.display(), "metadata file not found, starting empty");
                Ok(Catalog::new())
            }
        }
    }

    pub fn save_catalog(&self, catalog: &Catalog) -> Result<()> {
        write_json_atomic(&self.data_dir, &self.metadata_path(), catalog)
    }

    /// Load a table file and check it against the schema. A missing file is an
    /// empty table with the cataloged schema.
    pub fn load_table(&self, name: &str, schema: &TableSchema) -> Result<Table> {
        let path = self.table_path(name);
        let Some(table) = read_json::<Table>(&path)? else {
            debug!(table = name, "table file not found, using empty table");
            return Ok(Table::new(schema.clone()));
        };

        if table.schema() != schema {
            return Err(DbError::StoredDataTypeMismatch(format!(
                "table file for '{}' does not match its metadata",
                name
            )));
        }
        table.validate()?;
        Ok(table)
    }

    pub fn save_table(&self, name: &str, table: &Table) -> Result<()> {
        write_json_atomic(&self.data_dir, &self.table_path(name), table)
    }

    pub fn remove_table(&self, name: &str) -> Result<()> {
        let path = self.table_path(name);
        if path.exists() {
            fs::remove_file(&path)?;
        }
        Ok(())
    }
}

fn read_json<T: DeserializeOwned>(path: &Path) -> Result<Option<T>> {
    if !path.exists() {
        return Ok(None);
    }
    let file = File::open(path)?;
    let value = serde_json::from_reader(BufReader::new(file)).map_err(|e| {
        DbError::SerializationError(format!("Failed to read '{}': {}", path.display(), e))
    })?;
    Ok(Some(value))
}

fn write_json_atomic<T: Serialize>(dir: &Path, path: &Path, value: &T) -> Result<()> {
    fs::create_dir_all(dir)?;
    let temp = NamedTempFile::new_in(dir)?;
    {
        let mut writer = BufWriter::new(temp.as_file());
        serde_json::to_writer_pretty(&mut writer, value)?;
        writer.flush()?;
    }
    temp.as_file().sync_all()?;
    temp.persist(path)
        .map_err(|e| DbError::IoError(format!("Failed to replace '{}': {}", path.display(), e)))?;
    Ok(())
}
