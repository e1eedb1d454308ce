//! Parsing of raw synthesis output into a fossil payload.
//!
//! The synthesis step is an external collaborator whose output is untrusted
//! text, often wrapped in a Markdown code fence. Parsing happens entirely
//! before the store is touched, so a malformed payload can never leave a
//! partial revision behind.

use serde_json::{Map, Value};

use crate::{
  Error, Result,
  fossil::{Dependency, FileTreeEntry},
  symbol::SymbolType,
};

const FENCE: &str = "```";
const RELATIONSHIP_KEYS: [&str; 3] = ["calls", "called_by", "depends_on"];

/// A validated fossil payload, ready to be stored.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct FossilPayload {
  pub summary:        String,
  pub architecture:   String,
  pub recent_changes: String,
  pub known_issues:   String,
  pub dependencies:   Vec<Dependency>,
  pub file_tree:      Vec<FileTreeEntry>,
  /// Entries with a missing or empty name are already dropped.
  pub symbols:        Vec<PayloadSymbol>,
}

/// One symbol entry of a payload.
#[derive(Debug, Clone, PartialEq)]
pub struct PayloadSymbol {
  pub file_path:     String,
  pub line_number:   Option<i64>,
  pub kind:          SymbolType,
  pub name:          String,
  pub signature:     Option<String>,
  pub description:   Option<String>,
  /// Stored exactly as received.
  pub relationships: Option<Value>,
}

/// Remove a leading code fence line (with optional info string) and a
/// matching trailing fence line. Unfenced text is only trimmed.
pub fn strip_fences(raw: &str) -> &str {
  let text = raw.trim();
  let Some(rest) = text.strip_prefix(FENCE) else {
    return text;
  };
  let body = match rest.find('\n') {
    Some(i) => &rest[i + 1..],
    None => "",
  };
  let body = body.trim_end();
  match body.strip_suffix(FENCE) {
    Some(inner) if inner.is_empty() || inner.ends_with('\n') => inner.trim(),
    _ => body.trim(),
  }
}

impl FossilPayload {
  /// Parse raw synthesis output.
  ///
  /// Returns [`Error::MalformedPayload`] if the text is not a JSON object or
  /// any structured field has an unusable shape.
  pub fn parse(raw: &str) -> Result<Self> {
    let text = strip_fences(raw);
    let value: Value = serde_json::from_str(text)
      .map_err(|e| Error::MalformedPayload(format!("invalid JSON: {e}")))?;
    let Value::Object(root) = value else {
      return Err(malformed("top-level value is not an object"));
    };

    let symbols = array_field(&root, "symbols")?
      .iter()
      .enumerate()
      .map(|(i, v)| parse_symbol(i, v))
      .filter_map(Result::transpose)
      .collect::<Result<Vec<_>>>()?;

    Ok(Self {
      summary:        text_field(&root, "summary")?,
      architecture:   text_field(&root, "architecture")?,
      recent_changes: text_field(&root, "recent_changes")?,
      known_issues:   text_field(&root, "known_issues")?,
      dependencies:   array_field(&root, "dependencies")?
        .iter()
        .map(parse_dependency)
        .collect::<Result<_>>()?,
      file_tree:      array_field(&root, "file_tree")?
        .iter()
        .map(parse_file_entry)
        .collect::<Result<_>>()?,
      symbols,
    })
  }
}

fn malformed(reason: impl Into<String>) -> Error {
  Error::MalformedPayload(reason.into())
}

/// Text fields accept strings or any structured value; structure is kept as
/// pretty-printed JSON.
fn text_field(root: &Map<String, Value>, key: &str) -> Result<String> {
  Ok(match root.get(key) {
    None | Some(Value::Null) => String::new(),
    Some(Value::String(s)) => s.clone(),
    Some(other) => serde_json::to_string_pretty(other)?,
  })
}

fn array_field<'a>(root: &'a Map<String, Value>, key: &str) -> Result<&'a [Value]> {
  match root.get(key) {
    None | Some(Value::Null) => Ok(&[]),
    Some(Value::Array(items)) => Ok(items),
    Some(_) => Err(malformed(format!("`{key}` is not an array"))),
  }
}

fn opt_string(value: Option<&Value>) -> Option<String> {
  match value? {
    Value::Null => None,
    Value::String(s) if s.is_empty() => None,
    Value::String(s) => Some(s.clone()),
    other => Some(other.to_string()),
  }
}

fn opt_integer(value: Option<&Value>) -> Option<i64> {
  match value? {
    Value::Number(n) => n
      .as_i64()
      .or_else(|| n.as_f64().filter(|f| f.fract() == 0.0).map(|f| f as i64)),
    Value::String(s) => s.trim().parse().ok(),
    _ => None,
  }
}

fn parse_dependency(value: &Value) -> Result<Dependency> {
  match value {
    Value::String(name) => Ok(Dependency { name: name.clone(), ..Default::default() }),
    Value::Object(obj) => Ok(Dependency {
      name:    opt_string(obj.get("name")).unwrap_or_default(),
      version: opt_string(obj.get("version")),
      purpose: opt_string(obj.get("purpose")),
    }),
    _ => Err(malformed("dependency entry is neither an object nor a string")),
  }
}

fn parse_file_entry(value: &Value) -> Result<FileTreeEntry> {
  match value {
    Value::String(path) => Ok(FileTreeEntry { path: path.clone(), ..Default::default() }),
    Value::Object(obj) => Ok(FileTreeEntry {
      path:        opt_string(obj.get("path")).unwrap_or_default(),
      description: opt_string(obj.get("description")),
      line_count:  opt_integer(obj.get("line_count").or_else(|| obj.get("lines")))
        .and_then(|n| u64::try_from(n).ok()),
    }),
    _ => Err(malformed("file_tree entry is neither an object nor a string")),
  }
}

/// Returns `Ok(None)` for entries without a usable name.
fn parse_symbol(index: usize, value: &Value) -> Result<Option<PayloadSymbol>> {
  let Value::Object(obj) = value else {
    return Err(malformed(format!("symbol #{index} is not an object")));
  };

  let name = match obj.get("name") {
    Some(Value::String(s)) if !s.trim().is_empty() => s.clone(),
    _ => return Ok(None),
  };

  let relationships = match obj.get("relationships") {
    None | Some(Value::Null) => None,
    Some(rels) => {
      validate_relationships(rels)
        .map_err(|reason| malformed(format!("symbol `{name}`: {reason}")))?;
      Some(rels.clone())
    }
  };

  Ok(Some(PayloadSymbol {
    file_path: opt_string(obj.get("file_path").or_else(|| obj.get("file")))
      .unwrap_or_default(),
    line_number: opt_integer(obj.get("line_number").or_else(|| obj.get("line"))),
    kind: obj
      .get("type")
      .and_then(Value::as_str)
      .map(SymbolType::from_label)
      .unwrap_or(SymbolType::Function),
    name,
    signature: opt_string(obj.get("signature")),
    description: opt_string(obj.get("description")),
    relationships,
  }))
}

/// Relationships must be an object of name lists, or a string holding one.
fn validate_relationships(rels: &Value) -> std::result::Result<(), String> {
  let decoded;
  let obj = match rels {
    Value::Object(obj) => obj,
    Value::String(s) => match serde_json::from_str(s) {
      Ok(Value::Object(obj)) => {
        decoded = obj;
        &decoded
      }
      _ => return Err("relationships string does not hold an object".into()),
    },
    _ => return Err("relationships is not an object".into()),
  };
  for key in RELATIONSHIP_KEYS {
    match obj.get(key) {
      None | Some(Value::Null) => {}
      Some(Value::Array(items)) if items.iter().all(Value::is_string) => {}
      Some(_) => return Err(format!("`relationships.{key}` is not a list of names")),
    }
  }
  Ok(())
}

#[cfg(test)]
mod tests {
  use serde_json::json;

  use super::*;

  #[test]
  fn strips_fenced_block() {
    assert_eq!(strip_fences("```json\n{\"a\":1}\n```"), "{\"a\":1}");
    assert_eq!(strip_fences("  ```\n{}\n```  \n"), "{}");
    assert_eq!(strip_fences("{\"a\":1}"), "{\"a\":1}");
  }

  #[test]
  fn strips_unterminated_fence() {
    assert_eq!(strip_fences("```json\n{\"a\":1}"), "{\"a\":1}");
  }

  #[test]
  fn fenced_and_bare_payloads_parse_identically() {
    let bare = r#"{"summary":"s","symbols":[{"name":"foo","file_path":"a.py","line_number":3}]}"#;
    let fenced = format!("```json\n{bare}\n```");
    assert_eq!(
      FossilPayload::parse(bare).unwrap(),
      FossilPayload::parse(&fenced).unwrap()
    );
  }

  #[test]
  fn non_json_is_malformed() {
    let err = FossilPayload::parse("the model refused").unwrap_err();
    assert!(matches!(err, Error::MalformedPayload(_)));
  }

  #[test]
  fn non_object_is_malformed() {
    assert!(matches!(
      FossilPayload::parse("[1, 2]"),
      Err(Error::MalformedPayload(_))
    ));
  }

  #[test]
  fn structured_text_fields_are_serialised() {
    let p = FossilPayload::parse(r#"{"known_issues":["a","b"]}"#).unwrap();
    assert!(p.known_issues.contains("\"a\""));
    assert_eq!(p.summary, "");
  }

  #[test]
  fn symbol_aliases_and_defaults() {
    let p = FossilPayload::parse(
      &json!({
        "symbols": [
          { "name": "foo", "file": "a.py", "line": "7" },
          { "name": "bar", "file_path": "b.py", "file": "ignored.py", "line_number": 2, "type": "hook" },
          { "name": "" },
          { "type": "class" },
        ]
      })
      .to_string(),
    )
    .unwrap();

    assert_eq!(p.symbols.len(), 2);
    assert_eq!(p.symbols[0].file_path, "a.py");
    assert_eq!(p.symbols[0].line_number, Some(7));
    assert_eq!(p.symbols[0].kind, SymbolType::Function);
    assert_eq!(p.symbols[1].file_path, "b.py");
    assert_eq!(p.symbols[1].kind, SymbolType::Hook);
  }

  #[test]
  fn relationships_are_kept_verbatim() {
    let rels = json!({ "calls": ["b"], "called_by": [], "notes": { "hot": true } });
    let p = FossilPayload::parse(
      &json!({ "symbols": [{ "name": "a", "relationships": rels }] }).to_string(),
    )
    .unwrap();
    assert_eq!(p.symbols[0].relationships.as_ref(), Some(&rels));
  }

  #[test]
  fn encoded_relationships_string_is_accepted() {
    let rels = json!(r#"{"calls":["b"]}"#);
    let p = FossilPayload::parse(
      &json!({ "symbols": [{ "name": "a", "relationships": rels }] }).to_string(),
    )
    .unwrap();
    assert_eq!(p.symbols[0].relationships.as_ref(), Some(&rels));

    let corrupt = json!({ "symbols": [{ "name": "a", "relationships": r#"{"calls":"b"}"# }] });
    assert!(matches!(
      FossilPayload::parse(&corrupt.to_string()),
      Err(Error::MalformedPayload(_))
    ));
    let not_json = json!({ "symbols": [{ "name": "a", "relationships": "calls b" }] });
    assert!(matches!(
      FossilPayload::parse(&not_json.to_string()),
      Err(Error::MalformedPayload(_))
    ));
  }

  #[test]
  fn corrupt_relationships_are_malformed() {
    let raw = json!({ "symbols": [{ "name": "a", "relationships": { "calls": "b" } }] });
    assert!(matches!(
      FossilPayload::parse(&raw.to_string()),
      Err(Error::MalformedPayload(_))
    ));
  }

  #[test]
  fn dependencies_and_file_tree_shapes() {
    let p = FossilPayload::parse(
      &json!({
        "dependencies": ["serde", { "name": "tokio", "version": "1", "purpose": "runtime" }],
        "file_tree": [{ "path": "src/lib.rs", "lines": 120 }, { "path": "a.rs", "line_count": 3 }],
      })
      .to_string(),
    )
    .unwrap();
    assert_eq!(p.dependencies[0].name, "serde");
    assert_eq!(p.dependencies[1].purpose.as_deref(), Some("runtime"));
    assert_eq!(p.file_tree[0].line_count, Some(120));
    assert_eq!(p.file_tree[1].line_count, Some(3));
  }

  #[test]
  fn wrongly_shaped_arrays_are_malformed() {
    assert!(FossilPayload::parse(r#"{"symbols": "none"}"#).is_err());
    assert!(FossilPayload::parse(r#"{"dependencies": [1]}"#).is_err());
    assert!(FossilPayload::parse(r#"{"symbols": ["foo"]}"#).is_err());
  }
}
