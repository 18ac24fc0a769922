//! In-memory [`ConfigStore`]. Not durable.

use std::collections::BTreeMap;
use std::sync::RwLock;

use super::{ConfigStore, StoreError};
use crate::model::ButtonConfig;

#[derive(Debug, Default)]
pub struct MemoryConfigStore {
    records: RwLock<BTreeMap<String, ButtonConfig>>,
}

impl MemoryConfigStore {
    pub fn new() -> Self {
        Self::default()
    }
}

impl ConfigStore for MemoryConfigStore {
    fn get(&self, id: &str) -> Result<Option<ButtonConfig>, StoreError> {
        let records = self
            .records
            .read()
            .map_err(|_| StoreError::Database("memory store lock poisoned".into()))?;
        Ok(records.get(id).cloned())
    }

    fn get_all(&self) -> Result<BTreeMap<String, ButtonConfig>, StoreError> {
        let records = self
            .records
            .read()
            .map_err(|_| StoreError::Database("memory store lock poisoned".into()))?;
        Ok(records.clone())
    }

    fn put(&self, config: &ButtonConfig) -> Result<(), StoreError> {
        let mut records = self
            .records
            .write()
            .map_err(|_| StoreError::Database("memory store lock poisoned".into()))?;
        records.insert(config.id.clone(), config.clone());
        Ok(())
    }

    fn count(&self) -> Result<usize, StoreError> {
        let records = self
            .records
            .read()
            .map_err(|_| StoreError::Database("memory store lock poisoned".into()))?;
        Ok(records.len())
    }

    fn is_durable(&self) -> bool {
        false
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::Vec3;

    #[test]
    fn test_put_get_replace() {
        let store = MemoryConfigStore::new();
        assert!(store.get("b1").unwrap().is_none());

        store
            .put(&ButtonConfig::new("b1").with_position(Vec3::new(1.0, 2.0, 3.0)))
            .unwrap();
        store.put(&ButtonConfig::new("b1").with_scale(4.0)).unwrap();

        let stored = store.get("b1").unwrap().unwrap();
        assert_eq!(stored.position, Vec3::ZERO);
        assert_eq!(stored.scale, 4.0);
        assert_eq!(store.count().unwrap(), 1);
        assert!(!store.is_durable());
    }
}
