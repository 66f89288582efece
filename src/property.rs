//! Named string properties, the persistence contract for collector configs
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

use crate::error::Result;

/// A store of named string and string-list properties
pub trait PropertyStore {
    /// Get a string property, or `default` when it is not set
    fn get_string(&self, key: &str, default: &str) -> String;

    /// Set a string property
    fn set_string(&mut self, key: &str, value: &str);

    /// Get a list property, empty when it is not set
    fn get_string_list(&self, key: &str) -> Vec<String>;

    /// Set a list property
    fn set_string_list(&mut self, key: &str, values: &[String]);
}

/// A single stored property value
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum PropertyValue {
    Text(String),
    List(Vec<String>),
}

/// In-memory property store, serializable as a flat JSON object
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct PropertyMap {
    properties: BTreeMap<String, PropertyValue>,
}

impl PropertyMap {
    /// Create an empty property map
    pub fn new() -> Self {
        Self::default()
    }

    /// Get the raw value stored under a key
    pub fn get(&self, key: &str) -> Option<&PropertyValue> {
        self.properties.get(key)
    }

    /// Remove a property
    pub fn remove(&mut self, key: &str) -> Option<PropertyValue> {
        self.properties.remove(key)
    }

    /// All keys, in sorted order
    pub fn keys(&self) -> impl Iterator<Item = &str> {
        self.properties.keys().map(String::as_str)
    }

    pub fn len(&self) -> usize {
        self.properties.len()
    }

    pub fn is_empty(&self) -> bool {
        self.properties.is_empty()
    }

    /// Serialize the properties to JSON
    pub fn to_json(&self) -> Result<String> {
        Ok(serde_json::to_string_pretty(self)?)
    }

    /// Deserialize properties from JSON
    pub fn from_json(json: &str) -> Result<Self> {
        Ok(serde_json::from_str(json)?)
    }
}

impl PropertyStore for PropertyMap {
    fn get_string(&self, key: &str, default: &str) -> String {
        match self.properties.get(key) {
            Some(PropertyValue::Text(value)) => value.clone(),
            Some(PropertyValue::List(values)) => values.join(","),
            None => default.to_string(),
        }
    }

    fn set_string(&mut self, key: &str, value: &str) {
        self.properties
            .insert(key.to_string(), PropertyValue::Text(value.to_string()));
    }

    fn get_string_list(&self, key: &str) -> Vec<String> {
        match self.properties.get(key) {
            Some(PropertyValue::List(values)) => values.clone(),
            Some(PropertyValue::Text(value)) => value
                .split(',')
                .filter(|s| !s.is_empty())
                .map(str::to_string)
                .collect(),
            None => Vec::new(),
        }
    }

    fn set_string_list(&mut self, key: &str, values: &[String]) {
        self.properties
            .insert(key.to_string(), PropertyValue::List(values.to_vec()));
    }
}
