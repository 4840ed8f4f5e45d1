//! Loosely typed resource attributes attached to a node

use std::collections::{BTreeMap, HashMap};
use std::fmt::Write;

use serde::{Deserialize, Serialize};

/// Keys whose list values carry no meaningful order.
///
/// Two lists under one of these keys are equal when they hold the same
/// elements with the same multiplicities. Every other key compares lists
/// element by element.
pub const ORDER_INSENSITIVE_KEYS: &[&str] = &[
    "key_names",
    "conditions",
    "external_ips",
    "image_pull_secrets",
    "volumes",
    "containers",
    "ports",
    "rules",
    "hosts",
    "secrets",
];

/// A single resource attribute value
///
/// Numbers compare by value as `f64`, so `3` and `3.0` are equal. Integers
/// beyond 2^53 lose precision in that comparison.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(untagged)]
pub enum InfoValue {
    Null,
    Bool(bool),
    Number(serde_json::Number),
    String(String),
    List(Vec<InfoValue>),
    Map(BTreeMap<String, InfoValue>),
}

impl InfoValue {
    /// Canonical text, identical for equal values
    fn canonical(&self) -> String {
        let mut out = String::new();
        self.write_canonical(&mut out);
        out
    }

    fn write_canonical(&self, out: &mut String) {
        match self {
            InfoValue::Null => out.push_str("null"),
            InfoValue::Bool(b) => out.push_str(if *b { "true" } else { "false" }),
            InfoValue::Number(n) => match n.as_f64() {
                Some(f) => {
                    let _ = write!(out, "{:?}", f);
                }
                None => out.push_str(&n.to_string()),
            },
            InfoValue::String(s) => {
                let _ = write!(out, "{:?}", s);
            }
            InfoValue::List(items) => {
                out.push('[');
                for (i, item) in items.iter().enumerate() {
                    if i > 0 {
                        out.push(',');
                    }
                    item.write_canonical(out);
                }
                out.push(']');
            }
            InfoValue::Map(map) => {
                out.push('{');
                for (i, (key, value)) in map.iter().enumerate() {
                    if i > 0 {
                        out.push(',');
                    }
                    let _ = write!(out, "{:?}:", key);
                    value.write_canonical(out);
                }
                out.push('}');
            }
        }
    }

    pub fn as_list(&self) -> Option<&[InfoValue]> {
        match self {
            InfoValue::List(items) => Some(items),
            _ => None,
        }
    }
}

impl PartialEq for InfoValue {
    fn eq(&self, other: &Self) -> bool {
        match (self, other) {
            (InfoValue::Null, InfoValue::Null) => true,
            (InfoValue::Bool(a), InfoValue::Bool(b)) => a == b,
            (InfoValue::Number(a), InfoValue::Number(b)) => match (a.as_f64(), b.as_f64()) {
                (Some(x), Some(y)) => x == y,
                _ => a == b,
            },
            (InfoValue::String(a), InfoValue::String(b)) => a == b,
            (InfoValue::List(a), InfoValue::List(b)) => a == b,
            (InfoValue::Map(a), InfoValue::Map(b)) => a == b,
            _ => false,
        }
    }
}

impl From<&str> for InfoValue {
    fn from(s: &str) -> Self {
        InfoValue::String(s.to_string())
    }
}

impl From<String> for InfoValue {
    fn from(s: String) -> Self {
        InfoValue::String(s)
    }
}

impl From<bool> for InfoValue {
    fn from(b: bool) -> Self {
        InfoValue::Bool(b)
    }
}

impl From<i64> for InfoValue {
    fn from(n: i64) -> Self {
        InfoValue::Number(n.into())
    }
}

impl<T: Into<InfoValue>> From<Vec<T>> for InfoValue {
    fn from(items: Vec<T>) -> Self {
        InfoValue::List(items.into_iter().map(Into::into).collect())
    }
}

/// Resource attribute bag keyed by attribute name
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ResourceInfo(BTreeMap<String, InfoValue>);

impl ResourceInfo {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&mut self, key: impl Into<String>, value: impl Into<InfoValue>) -> &mut Self {
        self.0.insert(key.into(), value.into());
        self
    }

    pub fn get(&self, key: &str) -> Option<&InfoValue> {
        self.0.get(key)
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&String, &InfoValue)> {
        self.0.iter()
    }
}

impl From<BTreeMap<String, InfoValue>> for ResourceInfo {
    fn from(map: BTreeMap<String, InfoValue>) -> Self {
        Self(map)
    }
}

impl PartialEq for ResourceInfo {
    fn eq(&self, other: &Self) -> bool {
        if self.0.len() != other.0.len() {
            return false;
        }

        self.0.iter().all(|(key, a)| match other.0.get(key) {
            None => false,
            Some(b) if ORDER_INSENSITIVE_KEYS.contains(&key.as_str()) => {
                match (a.as_list(), b.as_list()) {
                    (Some(a), Some(b)) => multiset_eq(a, b),
                    _ => a == b,
                }
            }
            Some(b) => a == b,
        })
    }
}

/// Compare two lists as multisets (order-insensitive, count-sensitive)
fn multiset_eq(a: &[InfoValue], b: &[InfoValue]) -> bool {
    if a.len() != b.len() {
        return false;
    }

    let mut counts: HashMap<String, isize> = HashMap::with_capacity(a.len());
    for item in a {
        *counts.entry(item.canonical()).or_insert(0) += 1;
    }
    for item in b {
        match counts.get_mut(&item.canonical()) {
            Some(count) if *count > 0 => *count -= 1,
            _ => return false,
        }
    }

    true
}
