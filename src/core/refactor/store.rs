//! The key store collaborator the executor renames keys in.

use std::collections::BTreeMap;

use serde::Serialize;

use crate::core::{
    error::StoreError,
    key_path::{FlatMessages, is_namespaced, namespace_of},
};

/// A key as the store holds it after a rename.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct KeyRecord {
    pub key: String,
    pub value: Option<String>,
    pub namespace: Option<String>,
    pub nested: bool,
}

impl KeyRecord {
    pub fn new(key: impl Into<String>, value: Option<String>) -> Self {
        let key = key.into();
        Self {
            namespace: namespace_of(&key).map(str::to_string),
            nested: is_namespaced(&key),
            key,
            value,
        }
    }
}

/// Storage of known keys. Renames must be all-or-nothing.
pub trait KeyStore {
    /// Rename `old_key` to `new_key`, returning the updated record.
    fn rename(&mut self, old_key: &str, new_key: &str) -> Result<KeyRecord, StoreError>;

    fn lookup_value(&self, key: &str) -> Option<String>;
}

/// In-memory store, seeded from the primary locale's messages.
#[derive(Debug, Clone, Default)]
pub struct MemoryKeyStore {
    records: BTreeMap<String, KeyRecord>,
}

impl MemoryKeyStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn from_messages(messages: &FlatMessages) -> Self {
        let mut store = Self::new();
        for (key, value) in messages {
            store.insert(key, Some(value.clone()));
        }
        store
    }

    pub fn insert(&mut self, key: &str, value: Option<String>) {
        self.records
            .insert(key.to_string(), KeyRecord::new(key, value));
    }

    pub fn get(&self, key: &str) -> Option<&KeyRecord> {
        self.records.get(key)
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }
}

impl KeyStore for MemoryKeyStore {
    fn rename(&mut self, old_key: &str, new_key: &str) -> Result<KeyRecord, StoreError> {
        if !self.records.contains_key(old_key) {
            return Err(StoreError::UnknownKey(old_key.to_string()));
        }
        if self.records.contains_key(new_key) {
            return Err(StoreError::KeyExists(new_key.to_string()));
        }
        let value = self
            .records
            .remove(old_key)
            .and_then(|record| record.value);
        let record = KeyRecord::new(new_key, value);
        self.records.insert(new_key.to_string(), record.clone());
        Ok(record)
    }

    fn lookup_value(&self, key: &str) -> Option<String> {
        self.records.get(key).and_then(|record| record.value.clone())
    }
}
