//! Lazy strings, arrays and objects.

use super::lazy::Lazy;
use super::Value;
use crate::channel::{ChannelResult, Queue};
use std::collections::BTreeMap;

/// A string materialized one code point at a time.
#[derive(Clone)]
pub struct JqString(Lazy<char>);

impl JqString {
    pub fn from_queue(queue: Queue<char>) -> Self {
        Self(Lazy::from_queue(queue))
    }

    /// Code point at `index`.
    pub fn char_at(&self, index: usize) -> ChannelResult<Option<char>> {
        self.0.get(index)
    }

    /// Length in code points. Blocks until the string is complete.
    pub fn len(&self) -> ChannelResult<usize> {
        self.0.len()
    }

    pub fn is_empty(&self) -> ChannelResult<bool> {
        self.0.is_empty()
    }

    pub fn chars(&self) -> Vec<char> {
        self.0.items()
    }

    /// The complete text.
    pub fn text(&self) -> String {
        self.chars().into_iter().collect()
    }
}

impl From<&str> for JqString {
    fn from(text: &str) -> Self {
        Self(Lazy::from_vec(text.chars().collect()))
    }
}

impl From<String> for JqString {
    fn from(text: String) -> Self {
        Self::from(text.as_str())
    }
}

/// An array whose elements may still be arriving.
#[derive(Clone)]
pub struct JqArray(Lazy<Value>);

impl JqArray {
    pub fn from_queue(queue: Queue<Value>) -> Self {
        Self(Lazy::from_queue(queue))
    }

    /// Element at `index`; pops only as far as needed.
    pub fn get(&self, index: usize) -> ChannelResult<Option<Value>> {
        self.0.get(index)
    }

    pub fn len(&self) -> ChannelResult<usize> {
        self.0.len()
    }

    pub fn is_empty(&self) -> ChannelResult<bool> {
        self.0.is_empty()
    }

    /// Elements already available, without blocking.
    pub fn available(&self) -> usize {
        self.0.available()
    }

    pub fn items(&self) -> Vec<Value> {
        self.0.items()
    }
}

impl From<Vec<Value>> for JqArray {
    fn from(items: Vec<Value>) -> Self {
        Self(Lazy::from_vec(items))
    }
}

/// An object built from a stream of key/value entries. A later entry for the
/// same key replaces the earlier one.
#[derive(Clone)]
pub struct JqObject(Lazy<(String, Value)>);

impl JqObject {
    pub fn from_queue(queue: Queue<(String, Value)>) -> Self {
        Self(Lazy::from_queue(queue))
    }

    /// Value under `key`. Blocks until the object is complete, since a later
    /// entry may still override an earlier one.
    pub fn get(&self, key: &str) -> ChannelResult<Option<Value>> {
        let mut index = 0;
        let mut found = None;
        while let Some((k, v)) = self.0.get(index)? {
            if k == key {
                found = Some(v);
            }
            index += 1;
        }
        Ok(found)
    }

    /// Number of distinct keys.
    pub fn len(&self) -> ChannelResult<usize> {
        self.0.materialize()?;
        Ok(self.entries().len())
    }

    pub fn is_empty(&self) -> ChannelResult<bool> {
        self.0.is_empty()
    }

    /// Final key/value map, sorted by key.
    pub fn entries(&self) -> BTreeMap<String, Value> {
        self.0.items().into_iter().collect()
    }
}

impl From<BTreeMap<String, Value>> for JqObject {
    fn from(map: BTreeMap<String, Value>) -> Self {
        Self(Lazy::from_vec(map.into_iter().collect()))
    }
}

impl FromIterator<(String, Value)> for JqObject {
    fn from_iter<I: IntoIterator<Item = (String, Value)>>(iter: I) -> Self {
        Self(Lazy::from_vec(iter.into_iter().collect()))
    }
}
