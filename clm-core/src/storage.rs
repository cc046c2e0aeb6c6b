//! Key/value stores the app persists into, and the keys it uses.
//!
//! The session store holds per-level questionnaire state and is cleared when
//! the level is left. The local store holds the holiday-pay operation and
//! its last result.

use std::collections::BTreeMap;

use tracing::debug;

use crate::config::Level;
use crate::error::Result;

pub const LEVEL_KEY: &str = "level";
pub const OPERATION_TYPE_KEY: &str = "operationType";
pub const OPERATION_VALUE_KEY: &str = "operationValue";
pub const CALCULATED_VALUE_KEY: &str = "calculatedValue";

pub fn selected_types_key(level: Level) -> String {
    format!("selectedQuestionTypes_{}", level.suffix())
}

pub fn type_changed_key(level: Level) -> String {
    format!("typeChangedStates_{}", level.suffix())
}

pub fn question_order_key(level: Level) -> String {
    format!("questionOrder_{}", level.suffix())
}

pub trait KeyValueStore {
    fn get(&self, key: &str) -> Result<Option<String>>;
    fn set(&mut self, key: &str, value: &str) -> Result<()>;
    fn remove(&mut self, key: &str) -> Result<()>;
}

/// In-process store, used for the session and in tests.
#[derive(Debug, Clone, Default)]
pub struct MemoryStore {
    values: BTreeMap<String, String>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.values.len()
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }
}

impl KeyValueStore for MemoryStore {
    fn get(&self, key: &str) -> Result<Option<String>> {
        Ok(self.values.get(key).cloned())
    }

    fn set(&mut self, key: &str, value: &str) -> Result<()> {
        self.values.insert(key.to_string(), value.to_string());
        Ok(())
    }

    fn remove(&mut self, key: &str) -> Result<()> {
        self.values.remove(key);
        Ok(())
    }
}

/// Record that `level` is in progress.
pub fn enter_level(store: &mut dyn KeyValueStore, level: Level) -> Result<()> {
    debug!(level = level.suffix(), "entering level");
    store.set(LEVEL_KEY, level.path())
}

/// Forget everything the level stored.
pub fn exit_level(store: &mut dyn KeyValueStore, level: Level) -> Result<()> {
    debug!(level = level.suffix(), "leaving level");
    store.remove(&selected_types_key(level))?;
    store.remove(&type_changed_key(level))?;
    store.remove(&question_order_key(level))?;
    store.remove(LEVEL_KEY)
}

/// Read a JSON value, treating a missing or unreadable entry as absent.
pub fn get_json<T: serde::de::DeserializeOwned>(
    store: &dyn KeyValueStore,
    key: &str,
) -> Result<Option<T>> {
    match store.get(key)? {
        Some(raw) => Ok(serde_json::from_str(&raw).ok()),
        None => Ok(None),
    }
}

pub fn set_json<T: serde::Serialize>(store: &mut dyn KeyValueStore, key: &str, value: &T) -> Result<()> {
    let raw = serde_json::to_string(value)?;
    store.set(key, &raw)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_level_lifecycle() {
        let mut store = MemoryStore::new();
        enter_level(&mut store, Level::Three).unwrap();
        assert_eq!(store.get(LEVEL_KEY).unwrap().as_deref(), Some("/Level-Three-Quiz"));

        set_json(&mut store, &question_order_key(Level::Three), &vec![1, 0]).unwrap();
        set_json(&mut store, &selected_types_key(Level::Three), &vec!["Text"]).unwrap();
        store.set(OPERATION_TYPE_KEY, "add").unwrap();
        assert_eq!(
            get_json::<Vec<usize>>(&store, "questionOrder_3").unwrap(),
            Some(vec![1, 0])
        );

        exit_level(&mut store, Level::Three).unwrap();
        assert_eq!(store.get("questionOrder_3").unwrap(), None);
        assert_eq!(store.get(LEVEL_KEY).unwrap(), None);
        assert_eq!(store.len(), 1);
    }

    #[test]
    fn test_unreadable_json_is_absent() {
        let mut store = MemoryStore::new();
        store.set("questionOrder_2", "not json").unwrap();
        assert_eq!(get_json::<Vec<usize>>(&store, "questionOrder_2").unwrap(), None);
    }
}
