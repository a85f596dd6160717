use crate::config::Config;
use crate::core::{Clause, IdentifierPolicy, Result, TableSchema};
use crate::result::QueryResult;
use crate::storage::{Catalog, JsonStore, QueryCache, Table, TableInfo, UpdateOutcome};
use tracing::{debug, info};

/// One user session over a data directory.
///
/// Every operation runs a full command cycle: load the catalog and the target
/// table from disk, apply the change in memory, save what changed. All
/// operations take `&mut self` (or `&self` for pure reads), so a session has
/// exactly one writer. Wrap it in a mutex before sharing it between threads.
pub struct Database {
    store: JsonStore,
    cache: QueryCache,
    id_policy: IdentifierPolicy,
}

impl Database {
    pub fn new(config: &Config) -> Self {
        Self {
            store: JsonStore::new(&config.data_dir, config.metadata_file.clone()),
            cache: QueryCache::from_capacity(config.cache_capacity),
            id_policy: config.id_policy,
        }
    }

    pub fn store(&self) -> &JsonStore {
        &self.store
    }

    pub fn cache(&self) -> &QueryCache {
        &self.cache
    }

    pub fn create_table<S: AsRef<str>>(
        &mut self,
        name: &str,
        column_specs: &[S],
    ) -> Result<TableSchema> {
        self.store.check_table_name(name)?;
        let mut catalog = self.store.load_catalog()?;
        let schema = catalog
            .create_table(name, column_specs, self.id_policy)?
            .clone();

        self.store.save_table(name, &Table::new(schema.clone()))?;
        self.store.save_catalog(&catalog)?;

        info!(table = name, columns = schema.columns().len(), "table created");
        Ok(schema)
    }

    pub fn drop_table(&mut self, name: &str) -> Result<()> {
        self.store.check_table_name(name)?;
        let mut catalog = self.store.load_catalog()?;
        catalog.drop_table(name)?;

        self.store.save_catalog(&catalog)?;
        self.store.remove_table(name)?;

        info!(table = name, "table dropped");
        Ok(())
    }

    pub fn list_tables(&self) -> Result<Vec<String>> {
        let catalog = self.store.load_catalog()?;
        Ok(catalog
            .list_tables()
            .into_iter()
            .map(|s| s.to_string())
            .collect())
    }

    pub fn table_exists(&self, name: &str) -> Result<bool> {
        Ok(self.store.load_catalog()?.table_exists(name))
    }

    /// Current snapshot of a table.
    pub fn table(&self, name: &str) -> Result<Table> {
        let (_, table) = self.load(name)?;
        Ok(table)
    }

    /// Insert one row from raw tokens; returns its identifier.
    pub fn insert<S: AsRef<str>>(&mut self, name: &str, values: &[S]) -> Result<i64> {
        let (mut catalog, mut table) = self.load(name)?;
        let id = table.insert(values)?;
        self.save(&mut catalog, name, &table)?;

        debug!(table = name, id, "row inserted");
        Ok(id)
    }

    /// Read rows through the query cache.
    pub fn select(&mut self, name: &str, filter: Option<&Clause>) -> Result<QueryResult> {
        let (_, table) = self.load(name)?;
        self.cache.select(&table, filter)
    }

    pub fn update(&mut self, name: &str, set: &Clause, filter: &Clause) -> Result<UpdateOutcome> {
        let (mut catalog, mut table) = self.load(name)?;
        let outcome = table.update(set, filter)?;
        if let UpdateOutcome::Updated(rows) = outcome {
            self.save(&mut catalog, name, &table)?;
            debug!(table = name, rows, "rows updated");
        }
        Ok(outcome)
    }

    /// Delete matching rows; returns how many were removed.
    pub fn delete(&mut self, name: &str, filter: &Clause) -> Result<usize> {
        let (mut catalog, mut table) = self.load(name)?;
        let removed = table.delete(filter)?;
        if removed > 0 {
            self.save(&mut catalog, name, &table)?;
            debug!(table = name, removed, "rows deleted");
        }
        Ok(removed)
    }

    pub fn info(&self, name: &str) -> Result<TableInfo> {
        let (_, table) = self.load(name)?;
        Ok(table.info(name))
    }

    fn load(&self, name: &str) -> Result<(Catalog, Table)> {
        let catalog = self.store.load_catalog()?;
        let entry = catalog.get_table(name)?;
        let table = self.store.load_table(name, &entry.schema)?;
        Ok((catalog, table))
    }

    fn save(&self, catalog: &mut Catalog, name: &str, table: &Table) -> Result<()> {
        self.store.save_table(name, table)?;
        catalog.set_row_count(name, table.row_count())?;
        self.store.save_catalog(catalog)
    }
}
