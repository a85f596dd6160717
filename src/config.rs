use crate::core::IdentifierPolicy;
use crate::storage::DEFAULT_METADATA_FILE;
use std::path::{Path, PathBuf};

/// Session configuration
#[derive(Debug, Clone)]
pub struct Config {
    /// Directory holding the metadata file and one JSON file per table
    pub data_dir: PathBuf,

    /// Metadata file name inside `data_dir`
    pub metadata_file: String,

    /// Query cache capacity, `None` for unbounded
    pub cache_capacity: Option<usize>,

    /// Column name normalization applied by create_table
    pub id_policy: IdentifierPolicy,

    /// Ask before deleting rows in the interactive shell
    pub confirm_deletes: bool,

    /// Print elapsed time after each command in the interactive shell
    pub show_timing: bool,
}

impl Config {
    pub fn new<P: AsRef<Path>>(data_dir: P) -> Self {
        Self {
            data_dir: data_dir.as_ref().to_path_buf(),
            metadata_file: DEFAULT_METADATA_FILE.to_string(),
            cache_capacity: None,
            id_policy: IdentifierPolicy::default(),
            confirm_deletes: true,
            show_timing: true,
        }
    }

    /// Set the metadata file name
    pub fn metadata_file(mut self, name: &str) -> Self {
        self.metadata_file = name.to_string();
        self
    }

    /// Bound the query cache
    pub fn cache_capacity(mut self, capacity: usize) -> Self {
        self.cache_capacity = Some(capacity);
        self
    }

    pub fn id_policy(mut self, policy: IdentifierPolicy) -> Self {
        self.id_policy = policy;
        self
    }

    pub fn confirm_deletes(mut self, confirm: bool) -> Self {
        self.confirm_deletes = confirm;
        self
    }

    pub fn show_timing(mut self, show: bool) -> Self {
        self.show_timing = show;
        self
    }

    /// Validate configuration
    pub fn validate(&self) -> Result<(), String> {
        if self.metadata_file.trim().is_empty() {
            return Err("Metadata file name cannot be empty".to_string());
        }

        if self.metadata_file.contains(['/', '\\']) {
            return Err("Metadata file name must not contain a path".to_string());
        }

        if self.cache_capacity == Some(0) {
            return Err("cache_capacity must be > 0".to_string());
        }

        Ok(())
    }
}

impl Default for Config {
    fn default() -> Self {
        Self::new(".")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let config = Config::default();
        assert_eq!(config.metadata_file, "db_meta.json");
        assert_eq!(config.cache_capacity, None);
        assert_eq!(config.id_policy, IdentifierPolicy::Legacy);
        assert!(config.confirm_deletes);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_validate_rejects_bad_values() {
        assert!(Config::default().metadata_file("").validate().is_err());
        assert!(Config::default().metadata_file("a/b.json").validate().is_err());
        assert!(Config::default().cache_capacity(0).validate().is_err());
    }
}
