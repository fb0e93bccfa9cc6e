//! Identity caches - one ID-sorted collection per entity type

use crate::storage::storable::Storable;
use std::any::{Any, TypeId};
use std::collections::HashMap;

/// Cached state for one entity type.
///
/// `items` is always sorted ascending by `Storable::id`, which is what makes
/// binary-search lookup and gap detection work.
pub struct TypeCache<T> {
    /// Whether the full table scan has run
    pub loaded: bool,
    /// Memoized catalog lookup; `None` until first asked
    pub table_exists: Option<bool>,
    items: Vec<T>,
}

impl<T> Default for TypeCache<T> {
    fn default() -> Self {
        Self {
            loaded: false,
            table_exists: None,
            items: Vec::new(),
        }
    }
}

impl<T: Storable> TypeCache<T> {
    pub fn items(&self) -> &[T] {
        &self.items
    }

    pub fn len(&self) -> usize {
        self.items.len()
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    /// Binary search by ID: `Ok(index)` if present, `Err(insertion point)` if not
    pub fn position(&self, id: i64) -> Result<usize, usize> {
        self.items.binary_search_by_key(&id, T::id)
    }

    pub fn get(&self, id: i64) -> Option<&T> {
        self.position(id).ok().map(|index| &self.items[index])
    }

    pub(crate) fn get_mut_at(&mut self, index: usize) -> &mut T {
        &mut self.items[index]
    }

    /// Replace the contents with freshly loaded entities
    pub(crate) fn fill(&mut self, mut entities: Vec<T>) {
        // SELECT * gives no ordering guarantee
        entities.sort_by_key(T::id);
        self.items = entities;
        self.loaded = true;
    }

    /// Place an entity at its sorted position; returns the index.
    /// The caller guarantees the ID is not already cached.
    pub(crate) fn insert(&mut self, entity: T) -> usize {
        let index = match self.position(entity.id()) {
            Ok(index) | Err(index) => index,
        };
        self.items.insert(index, entity);
        index
    }

    pub(crate) fn replace_at(&mut self, index: usize, entity: T) {
        self.items[index] = entity;
    }

    pub(crate) fn remove_at(&mut self, index: usize) -> T {
        self.items.remove(index)
    }

    /// Forget everything, including the table-exists memo
    pub(crate) fn reset(&mut self) {
        self.items.clear();
        self.loaded = false;
        self.table_exists = None;
    }

    /// Smallest positive ID not held by a cached entity.
    ///
    /// Freed IDs are reused before the key space grows.
    pub fn next_id(&self) -> i64 {
        let first = match self.items.first() {
            Some(first) if first.id() == 1 => first,
            _ => return 1,
        };

        if self.items.len() == 1 {
            return first.id() + 1;
        }

        self.items
            .windows(2)
            .find(|pair| pair[1].id() - pair[0].id() > 1)
            .map(|pair| pair[0].id() + 1)
            .unwrap_or(self.items.len() as i64 + 1)
    }
}

/// Process-wide store of identity caches, keyed by entity type
#[derive(Default)]
pub struct CacheRegistry {
    caches: HashMap<TypeId, Box<dyn Any>>,
}

impl CacheRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// The cache for `T`, created empty on first access
    pub fn entry<T: Storable>(&mut self) -> &mut TypeCache<T> {
        self.caches
            .entry(TypeId::of::<T>())
            .or_insert_with(|| Box::new(TypeCache::<T>::default()))
            .downcast_mut::<TypeCache<T>>()
            .expect("cache registry entries are keyed by their own TypeId")
    }

    /// Drop every cache; each type reloads on next access
    pub fn clear(&mut self) {
        self.caches.clear();
    }

    pub fn len(&self) -> usize {
        self.caches.len()
    }

    pub fn is_empty(&self) -> bool {
        self.caches.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::storage::test_support::DummyStorable;

    fn cache_with(ids: &[i64]) -> TypeCache<DummyStorable> {
        let mut cache = TypeCache::default();
        cache.fill(ids.iter().map(|&id| DummyStorable::new(id, "dummy")).collect());
        cache
    }

    #[test]
    fn test_next_id_empty() {
        assert_eq!(cache_with(&[]).next_id(), 1);
    }

    #[test]
    fn test_next_id_first_not_one() {
        assert_eq!(cache_with(&[2, 3]).next_id(), 1);
        assert_eq!(cache_with(&[7]).next_id(), 1);
    }

    #[test]
    fn test_next_id_single() {
        assert_eq!(cache_with(&[1]).next_id(), 2);
    }

    #[test]
    fn test_next_id_fills_first_gap() {
        assert_eq!(cache_with(&[1, 2, 4, 5]).next_id(), 3);
        assert_eq!(cache_with(&[1, 3, 6]).next_id(), 2);
    }

    #[test]
    fn test_next_id_dense() {
        assert_eq!(cache_with(&[1, 2, 3, 4, 5]).next_id(), 6);
    }

    #[test]
    fn test_fill_sorts() {
        let cache = cache_with(&[3, 1, 2]);
        let ids: Vec<i64> = cache.items().iter().map(DummyStorable::id).collect();
        assert_eq!(ids, vec![1, 2, 3]);
        assert!(cache.loaded);
    }

    #[test]
    fn test_insert_keeps_order() {
        let mut cache = cache_with(&[1, 2, 5]);
        assert_eq!(cache.insert(DummyStorable::new(4, "four")), 2);
        assert_eq!(cache.insert(DummyStorable::new(3, "three")), 2);

        let ids: Vec<i64> = cache.items().iter().map(DummyStorable::id).collect();
        assert_eq!(ids, vec![1, 2, 3, 4, 5]);
        assert_eq!(cache.get(4).map(|d| d.name()), Some("four"));
        assert!(cache.get(6).is_none());
    }

    #[test]
    fn test_registry_keeps_types_apart() {
        #[derive(Debug)]
        struct Other(i64);

        impl std::fmt::Display for Other {
            fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
                write!(f, "{}", self.0)
            }
        }

        impl Storable for Other {
            fn schema() -> Vec<crate::storage::ColumnProperties> {
                vec![crate::storage::ColumnProperties::primary_key("Other_id")]
            }
            fn row(&self) -> crate::storage::Row {
                crate::storage::Row::new(vec![self.0.into()])
            }
            fn from_row(
                schema: &[crate::storage::ColumnProperties],
                row: &crate::storage::Row,
            ) -> crate::Result<Self> {
                let columns = crate::storage::Columns::zip(schema, row)?;
                Ok(Other(columns.integer("Other_id")?))
            }
            fn id(&self) -> i64 {
                self.0
            }
        }

        let mut registry = CacheRegistry::new();
        registry.entry::<DummyStorable>().insert(DummyStorable::new(1, "dummy"));
        registry.entry::<Other>().table_exists = Some(true);

        assert_eq!(registry.len(), 2);
        assert_eq!(registry.entry::<DummyStorable>().len(), 1);
        assert!(registry.entry::<Other>().is_empty());
        assert_eq!(registry.entry::<DummyStorable>().table_exists, None);

        registry.clear();
        assert!(registry.entry::<DummyStorable>().is_empty());
    }
}
