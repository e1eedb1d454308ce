//! Symbols: named, located code elements.
//!
//! Fossil symbols are immutable rows owned by exactly one fossil. A symbol that
//! changes between revisions is a new row in the newer fossil.

use std::{collections::BTreeSet, fmt};

use serde::{Deserialize, Deserializer, Serialize, Serializer};
use uuid::Uuid;

// ─── SymbolType ──────────────────────────────────────────────────────────────

/// The kind of a symbol.
///
/// Live extraction assigns these from per-grammar node tables and then refines
/// them with naming heuristics, so the classification is approximate.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum SymbolType {
  Function,
  Class,
  Component,
  Hook,
  Store,
  Route,
  Type,
  Interface,
  Enum,
  Constant,
  /// Any other label, kept verbatim.
  Other(String),
}

impl SymbolType {
  pub fn as_str(&self) -> &str {
    match self {
      Self::Function => "function",
      Self::Class => "class",
      Self::Component => "component",
      Self::Hook => "hook",
      Self::Store => "store",
      Self::Route => "route",
      Self::Type => "type",
      Self::Interface => "interface",
      Self::Enum => "enum",
      Self::Constant => "constant",
      Self::Other(s) => s,
    }
  }

  /// Parse a stored or synthesised label. Unknown labels become
  /// [`SymbolType::Other`]; an empty label falls back to `function`.
  pub fn from_label(label: &str) -> Self {
    match label.trim() {
      "" | "function" => Self::Function,
      "class" => Self::Class,
      "component" => Self::Component,
      "hook" => Self::Hook,
      "store" => Self::Store,
      "route" => Self::Route,
      "type" => Self::Type,
      "interface" => Self::Interface,
      "enum" => Self::Enum,
      "constant" => Self::Constant,
      other => Self::Other(other.to_owned()),
    }
  }
}

impl fmt::Display for SymbolType {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    f.write_str(self.as_str())
  }
}

impl Serialize for SymbolType {
  fn serialize<S: Serializer>(&self, s: S) -> Result<S::Ok, S::Error> {
    s.serialize_str(self.as_str())
  }
}

impl<'de> Deserialize<'de> for SymbolType {
  fn deserialize<D: Deserializer<'de>>(d: D) -> Result<Self, D::Error> {
    let label = String::deserialize(d)?;
    Ok(Self::from_label(&label))
  }
}

// ─── Relationships ───────────────────────────────────────────────────────────

/// The three edge lists a fossil symbol may carry, by referenced name.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Relationships {
  #[serde(default)]
  pub calls:      Vec<String>,
  #[serde(default)]
  pub called_by:  Vec<String>,
  #[serde(default)]
  pub depends_on: Vec<String>,
}

impl Relationships {
  /// Read edges out of a stored relationships value.
  ///
  /// Accepts an object, or a string holding a JSON object. Anything else, and
  /// any non-string edge entry, is ignored rather than reported.
  pub fn from_value(value: &serde_json::Value) -> Self {
    let object = match value {
      serde_json::Value::Object(map) => map.clone(),
      serde_json::Value::String(s) => match serde_json::from_str(s) {
        Ok(serde_json::Value::Object(map)) => map,
        _ => return Self::default(),
      },
      _ => return Self::default(),
    };

    let edges = |key: &str| -> Vec<String> {
      object
        .get(key)
        .and_then(|v| v.as_array())
        .map(|items| {
          items
            .iter()
            .filter_map(|i| i.as_str())
            .filter(|s| !s.is_empty())
            .map(str::to_owned)
            .collect()
        })
        .unwrap_or_default()
    };

    Self {
      calls:      edges("calls"),
      called_by:  edges("called_by"),
      depends_on: edges("depends_on"),
    }
  }

  /// Every referenced name across all three edge kinds, deduplicated and
  /// sorted.
  pub fn referenced_names(&self) -> BTreeSet<&str> {
    self
      .calls
      .iter()
      .chain(&self.called_by)
      .chain(&self.depends_on)
      .map(String::as_str)
      .collect()
  }
}

// ─── Symbol ──────────────────────────────────────────────────────────────────

/// A fossil-sourced symbol row.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Symbol {
  pub symbol_id:     Uuid,
  pub fossil_id:     Uuid,
  pub project_id:    Uuid,
  /// Version of the owning fossil; denormalised for recency ordering.
  pub version:       i64,
  /// Project-relative path.
  pub file_path:     String,
  pub line_number:   Option<i64>,
  #[serde(rename = "type")]
  pub kind:          SymbolType,
  pub name:          String,
  pub signature:     Option<String>,
  pub description:   Option<String>,
  /// The relationships value exactly as ingested.
  pub relationships: Option<serde_json::Value>,
}

impl Symbol {
  pub fn edges(&self) -> Relationships {
    self
      .relationships
      .as_ref()
      .map(Relationships::from_value)
      .unwrap_or_default()
  }
}

/// Which fossils a symbol query ranges over.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SymbolScope {
  /// Only the latest fossil of the project.
  Latest,
  /// Every fossil, newest first.
  AllFossils,
}

/// How a symbol query matches names.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum NameMatch {
  /// Case-insensitive substring.
  Contains(String),
  Exact(String),
}

#[cfg(test)]
mod tests {
  use serde_json::json;

  use super::*;

  #[test]
  fn unknown_labels_are_kept() {
    assert_eq!(SymbolType::from_label("hook"), SymbolType::Hook);
    assert_eq!(SymbolType::from_label(""), SymbolType::Function);
    let other = SymbolType::from_label("macro");
    assert_eq!(other, SymbolType::Other("macro".into()));
    assert_eq!(other.to_string(), "macro");
  }

  #[test]
  fn edges_from_object() {
    let rels = Relationships::from_value(&json!({
      "calls": ["b", "c"],
      "called_by": ["a"],
      "depends_on": [],
    }));
    assert_eq!(rels.calls, ["b", "c"]);
    assert_eq!(rels.called_by, ["a"]);
    assert_eq!(
      rels.referenced_names().into_iter().collect::<Vec<_>>(),
      ["a", "b", "c"]
    );
  }

  #[test]
  fn edges_from_encoded_string() {
    let rels = Relationships::from_value(&json!("{\"depends_on\":[\"db\"]}"));
    assert_eq!(rels.depends_on, ["db"]);
  }

  #[test]
  fn corrupt_edges_are_ignored() {
    assert_eq!(Relationships::from_value(&json!(42)), Relationships::default());
    assert_eq!(
      Relationships::from_value(&json!("not json")),
      Relationships::default()
    );
    let rels = Relationships::from_value(&json!({ "calls": [1, "ok", null] }));
    assert_eq!(rels.calls, ["ok"]);
  }
}
