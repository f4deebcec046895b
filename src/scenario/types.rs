//! Scenario definition types (the JSON input shape)

use std::collections::{BTreeMap, BTreeSet};
use std::fmt;

use serde::de::{MapAccess, Visitor};
use serde::ser::SerializeMap;
use serde::{Deserialize, Deserializer, Serialize, Serializer};

use super::OperationKind;
use crate::engine::IsolationMode;
use crate::mvcc::Value;

/// A complete scenario as supplied by the presentation layer.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ScenarioDefinition {
    pub name: String,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,

    /// The mode the scenario is meant to be watched under
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub suggested_mode: Option<IsolationMode>,

    /// Seed value of every data item
    pub items: SeedItems,

    pub transactions: Vec<TransactionDefinition>,

    #[serde(default)]
    pub key_moments: Vec<KeyMoment>,
}

/// Seed values in declaration order.
///
/// Repeated names are kept so validation can reject them.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SeedItems(Vec<(String, Value)>);

impl SeedItems {
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    /// Seed value of the first declaration of `name`.
    pub fn get(&self, name: &str) -> Option<Value> {
        self.0.iter().find(|(n, _)| n == name).map(|(_, v)| *v)
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, Value)> {
        self.0.iter().map(|(n, v)| (n.as_str(), *v))
    }

    /// The first name declared more than once.
    pub fn first_duplicate(&self) -> Option<&str> {
        let mut seen = BTreeSet::new();
        self.0
            .iter()
            .map(|(n, _)| n.as_str())
            .find(|n| !seen.insert(*n))
    }

    pub fn to_map(&self) -> BTreeMap<String, Value> {
        self.0.iter().cloned().collect()
    }
}

impl FromIterator<(String, Value)> for SeedItems {
    fn from_iter<I: IntoIterator<Item = (String, Value)>>(iter: I) -> Self {
        Self(iter.into_iter().collect())
    }
}

impl Serialize for SeedItems {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut map = serializer.serialize_map(Some(self.0.len()))?;
        for (name, value) in &self.0 {
            map.serialize_entry(name, value)?;
        }
        map.end()
    }
}

impl<'de> Deserialize<'de> for SeedItems {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        struct SeedItemsVisitor;

        impl<'de> Visitor<'de> for SeedItemsVisitor {
            type Value = SeedItems;

            fn expecting(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                f.write_str("a map of item names to integer seed values")
            }

            fn visit_map<A: MapAccess<'de>>(self, mut access: A) -> Result<SeedItems, A::Error> {
                let mut items = Vec::with_capacity(access.size_hint().unwrap_or(0));
                while let Some(entry) = access.next_entry::<String, Value>()? {
                    items.push(entry);
                }
                Ok(SeedItems(items))
            }
        }

        deserializer.deserialize_map(SeedItemsVisitor)
    }
}

/// One transaction's declared operations.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TransactionDefinition {
    pub name: String,

    /// Display tag, passed through untouched
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub color: Option<String>,

    pub operations: Vec<OperationDefinition>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct OperationDefinition {
    #[serde(rename = "type")]
    pub kind: OperationKind,

    pub time: u64,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub target: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub value: Option<Value>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub comment: Option<String>,
}

/// An annotated step. `highlight_refs` is opaque to the engine.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct KeyMoment {
    pub step: usize,

    pub text: String,

    #[serde(default = "default_auto_pause")]
    pub auto_pause: bool,

    #[serde(default)]
    pub highlight_refs: Vec<serde_json::Value>,
}

fn default_auto_pause() -> bool {
    true
}

impl KeyMoment {
    pub fn new(step: usize, text: impl Into<String>) -> Self {
        Self {
            step,
            text: text.into(),
            auto_pause: true,
            highlight_refs: Vec::new(),
        }
    }
}
