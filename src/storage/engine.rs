//! Mapping engine - generic CRUD over storable entities
//!
//! `EntityStore` owns the connection and the identity caches. Entities are
//! created with `make`, read through `retrieve_all`/`get`, changed with
//! `update`/`modify` and removed with `delete_storable`. The cache for a type
//! mirrors its table and is the only copy callers see, so no other code
//! should issue SQL against an entity table directly.

use crate::storage::cache::CacheRegistry;
use crate::storage::connection::{Database, DatabaseConfig};
use crate::storage::data::{ColumnProperties, Data, Row};
use crate::storage::sql;
use crate::storage::storable::{id_column, table_name, Storable};
use crate::{Error, Result};

/// Engine over a single database connection
pub struct EntityStore {
    db: Database,
    caches: CacheRegistry,
}

impl EntityStore {
    pub fn new(db: Database) -> Self {
        Self {
            db,
            caches: CacheRegistry::new(),
        }
    }

    /// Store backed by the configured database (opened on first use)
    pub fn open(config: DatabaseConfig) -> Self {
        Self::new(Database::new(config))
    }

    /// Store backed by a private in-memory database (for testing)
    pub fn open_in_memory() -> Self {
        Self::new(Database::open_in_memory())
    }

    /// The underlying connection manager, for callers that need their own
    /// transaction boundary
    pub fn database(&mut self) -> &mut Database {
        &mut self.db
    }

    /// Forget every cached entity and table memo; the next access reloads
    pub fn clear_caches(&mut self) {
        self.caches.clear();
    }

    // ========== Table Lifecycle ==========

    /// Whether `T`'s table exists, memoized per type
    pub fn table_exists<T: Storable>(&mut self) -> Result<bool> {
        if let Some(exists) = self.caches.entry::<T>().table_exists {
            return Ok(exists);
        }

        let exists = self.db.table_exists(table_name::<T>())?;
        self.caches.entry::<T>().table_exists = Some(exists);
        Ok(exists)
    }

    /// Create `T`'s table if it is missing
    pub fn create_table<T: Storable>(&mut self, schema: &[ColumnProperties]) -> Result<()> {
        let table = table_name::<T>();
        self.db
            .execute("create table failed", &sql::create_table(table, schema))?;
        self.caches.entry::<T>().table_exists = Some(true);
        tracing::info!("Created table {} ({} columns)", table, schema.len());
        Ok(())
    }

    /// Drop `T`'s table and everything cached for it; absent tables are a no-op
    pub fn drop_table<T: Storable>(&mut self) -> Result<()> {
        if !self.table_exists::<T>()? {
            return Ok(());
        }

        let table = table_name::<T>();
        self.db.execute("drop table failed", &sql::drop_table(table))?;

        let cache = self.caches.entry::<T>();
        cache.reset();
        cache.table_exists = Some(false);
        tracing::info!("Dropped table {}", table);
        Ok(())
    }

    // ========== Retrieval ==========

    /// Number of rows in `T`'s table; 0 when the table does not exist
    pub fn count_rows<T: Storable>(&mut self) -> Result<usize> {
        if !self.table_exists::<T>()? {
            return Ok(0);
        }
        self.db.count(table_name::<T>())
    }

    /// Every entity of type `T`, sorted by ID.
    ///
    /// The first call scans the table; later calls return the cache.
    pub fn retrieve_all<T: Storable>(&mut self) -> Result<&[T]> {
        if !self.caches.entry::<T>().loaded {
            self.load::<T>()?;
        }
        Ok(self.caches.entry::<T>().items())
    }

    /// The entity with `id`, if any
    pub fn get<T: Storable>(&mut self, id: i64) -> Result<Option<&T>> {
        self.retrieve_all::<T>()?;
        Ok(self.caches.entry::<T>().get(id))
    }

    fn load<T: Storable>(&mut self) -> Result<()> {
        let count = self.count_rows::<T>()?;
        if count == 0 {
            self.caches.entry::<T>().fill(Vec::new());
            return Ok(());
        }

        let table = table_name::<T>();
        let (names, rows) = self.db.select_all(&sql::select_all(table), count)?;
        let schema = resolve_schema::<T>(&names)?;

        let entities = rows
            .iter()
            .map(|row| T::from_row(&schema, row))
            .collect::<Result<Vec<T>>>()?;

        tracing::debug!("Loaded {} rows from {}", entities.len(), table);
        self.caches.entry::<T>().fill(entities);
        Ok(())
    }

    // ========== ID Allocation ==========

    /// Smallest positive ID not used by a live `T`
    pub fn get_new_id<T: Storable>(&mut self) -> Result<i64> {
        self.retrieve_all::<T>()?;
        Ok(self.caches.entry::<T>().next_id())
    }

    // ========== CRUD ==========

    /// Write an already-cached entity's row to the database.
    ///
    /// Only entities created through `make` may be inserted; anything else is
    /// rejected before SQL is issued.
    pub fn insert<T: Storable>(&mut self, entity: &T) -> Result<()> {
        if self.caches.entry::<T>().position(entity.id()).is_err() {
            return Err(Error::Precondition(format!(
                "cannot insert {} with id {}: it was not created through make",
                table_name::<T>(),
                entity.id()
            )));
        }
        self.write_insert::<T>(&entity.get_data())
    }

    /// Create, cache, and persist a new entity.
    ///
    /// `build` receives the freshly allocated ID and must use it. Returns the
    /// cached entity.
    pub fn make<T, F>(&mut self, build: F) -> Result<&T>
    where
        T: Storable,
        F: FnOnce(i64) -> T,
    {
        let id = self.get_new_id::<T>()?;
        let entity = build(id);
        if entity.id() != id {
            return Err(Error::Precondition(format!(
                "{} built with id {} but was allocated {}",
                table_name::<T>(),
                entity.id(),
                id
            )));
        }

        let data = entity.get_data();
        let index = self.caches.entry::<T>().insert(entity);

        if let Err(err) = self.write_insert::<T>(&data) {
            self.caches.entry::<T>().remove_at(index);
            return Err(err);
        }

        let cache = self.caches.entry::<T>();
        Ok(&cache.items()[index])
    }

    /// Persist a new state for a cached entity and replace the cached copy
    pub fn update<T: Storable>(&mut self, entity: T) -> Result<&T> {
        let id = entity.id();
        let index = self.cached_index::<T>(id, "update")?;

        self.write_update::<T>(&entity.get_data(), id)?;

        let cache = self.caches.entry::<T>();
        cache.replace_at(index, entity);
        Ok(&cache.items()[index])
    }

    /// Change a cached entity in place and persist the result.
    ///
    /// If the change renumbers the entity or the write fails, the type's cache
    /// is dropped so the next read comes from disk instead of the unsaved change.
    pub fn modify<T, F>(&mut self, id: i64, change: F) -> Result<&T>
    where
        T: Storable,
        F: FnOnce(&mut T),
    {
        let index = self.cached_index::<T>(id, "modify")?;

        let entity = self.caches.entry::<T>().get_mut_at(index);
        change(entity);
        if entity.id() != id {
            let changed = entity.id();
            self.caches.entry::<T>().reset();
            return Err(Error::Precondition(format!(
                "{} {} changed its id to {}",
                table_name::<T>(),
                id,
                changed
            )));
        }
        let data = entity.get_data();

        if let Err(err) = self.write_update::<T>(&data, id) {
            self.caches.entry::<T>().reset();
            return Err(err);
        }

        let cache = self.caches.entry::<T>();
        Ok(&cache.items()[index])
    }

    /// Delete an entity by ID, first from the table and then from the cache
    pub fn delete_storable<T: Storable>(&mut self, id: i64) -> Result<()> {
        let index = self.cached_index::<T>(id, "delete")?;

        let table = table_name::<T>();
        self.db
            .execute("delete failed", &sql::delete(table, &id_column::<T>(), id))?;
        self.caches.entry::<T>().remove_at(index);
        Ok(())
    }

    fn cached_index<T: Storable>(&mut self, id: i64, action: &str) -> Result<usize> {
        self.retrieve_all::<T>()?;
        self.caches.entry::<T>().position(id).map_err(|_| {
            Error::Precondition(format!(
                "cannot {} {} with id {}: no such entity",
                action,
                table_name::<T>(),
                id
            ))
        })
    }

    fn write_insert<T: Storable>(&mut self, data: &Data) -> Result<()> {
        let row = first_row::<T>(data)?;
        let statement = sql::insert(&data.table_name, &data.schema, row)?;

        if !self.table_exists::<T>()? {
            self.create_table::<T>(&data.schema)?;
        }
        self.db.execute("insert failed", &statement)?;
        Ok(())
    }

    fn write_update<T: Storable>(&mut self, data: &Data, id: i64) -> Result<()> {
        let row = first_row::<T>(data)?;
        let statement = sql::update(&data.table_name, &id_column::<T>(), &data.schema, row, id)?;
        self.db.execute("update failed", &statement)?;
        Ok(())
    }
}

fn first_row<T: Storable>(data: &Data) -> Result<&Row> {
    data.rows.first().ok_or_else(|| Error::SchemaMismatch {
        table: table_name::<T>().to_string(),
        reason: "entity produced no row".to_string(),
    })
}

/// Match result-set column names against `T`'s declared schema
fn resolve_schema<T: Storable>(names: &[String]) -> Result<Vec<ColumnProperties>> {
    let declared = T::schema();
    names
        .iter()
        .map(|name| {
            declared
                .iter()
                .find(|column| &column.name == name)
                .cloned()
                .ok_or_else(|| Error::SchemaMismatch {
                    table: table_name::<T>().to_string(),
                    reason: format!("column {} is not declared by the entity", name),
                })
        })
        .collect()
}
