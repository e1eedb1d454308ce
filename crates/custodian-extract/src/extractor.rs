//! Symbol Extractor: one source file in, an ordered list of symbols out.
//!
//! The syntax tree is walked depth-first, in source order, down to
//! [`MAX_DEPTH`]. Nodes listed in the grammar's symbol-node table become
//! symbols once they yield a usable name.

use std::{collections::HashMap, fs, path::Path};

use custodian_core::symbol::SymbolType;
use serde::{Deserialize, Serialize};
use tracing::debug;
use tree_sitter::{Node, Parser};

use crate::{
  classify::classify,
  grammar::{Grammar, GrammarMatch, grammar_for_path},
  languages::{NodeRole, SymbolGrammar, symbol_grammar},
};

/// Depth ceiling for the tree walk; bounds cost on pathological trees.
pub const MAX_DEPTH: usize = 20;

/// Children whose own children carry the name (`const x = ...`, Go type specs).
const DECLARATOR_KINDS: &[&str] = &["variable_declarator", "type_spec"];
/// Parameter-list node kinds across the supported grammars.
const PARAM_KINDS: &[&str] = &["formal_parameters", "parameters", "parameter_list"];
/// Values of a declarator that carry a function signature.
const FUNCTION_VALUE_KINDS: &[&str] = &["arrow_function", "function_expression", "function"];

/// A live-extracted symbol.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LiveSymbol {
  /// Scan-relative path with `/` separators (or the label passed to
  /// [`SymbolExtractor::extract_source`]).
  pub file:      String,
  /// 1-indexed.
  pub line:      usize,
  #[serde(rename = "type")]
  pub kind:      SymbolType,
  pub name:      String,
  pub signature: Option<String>,
}

/// Tree-sitter based extractor. Parsers are created lazily per grammar and
/// reused across files.
#[derive(Default)]
pub struct SymbolExtractor {
  parsers: HashMap<Grammar, Parser>,
}

impl SymbolExtractor {
  pub fn new() -> Self { Self::default() }

  /// Read and extract one file. Unsupported or unreadable files yield an
  /// empty list.
  pub fn extract_file(&mut self, path: &Path, label: &str) -> Vec<LiveSymbol> {
    let Some(matched) = grammar_for_path(path) else {
      return Vec::new();
    };
    match fs::read(path) {
      Ok(source) => self.extract_source(&source, label, matched),
      Err(e) => {
        debug!("skipping unreadable {}: {e}", path.display());
        Vec::new()
      }
    }
  }

  /// Extract symbols from source bytes. Parse failures yield an empty list.
  pub fn extract_source(
    &mut self,
    source: &[u8],
    label: &str,
    matched: GrammarMatch,
  ) -> Vec<LiveSymbol> {
    let grammar = symbol_grammar(matched.grammar);
    let Some(parser) = self.parser_for(grammar) else {
      return Vec::new();
    };
    let Some(tree) = parser.parse(source, None) else {
      debug!("tree-sitter gave up on {label}");
      return Vec::new();
    };

    let walk = Walk { grammar, source, label, matched };
    let mut out = Vec::new();
    walk.visit(tree.root_node(), 0, None, &mut out);
    out
  }

  fn parser_for(&mut self, grammar: &dyn SymbolGrammar) -> Option<&mut Parser> {
    let key = grammar.grammar();
    if !self.parsers.contains_key(&key) {
      let mut parser = Parser::new();
      if let Err(e) = parser.set_language(&grammar.language()) {
        debug!("cannot load {key} grammar: {e}");
        return None;
      }
      self.parsers.insert(key, parser);
    }
    self.parsers.get_mut(&key)
  }
}

struct Walk<'a> {
  grammar: &'a dyn SymbolGrammar,
  source:  &'a [u8],
  label:   &'a str,
  matched: GrammarMatch,
}

impl Walk<'_> {
  /// `skip` is the id of a child already reported through its wrapper.
  fn visit(&self, node: Node<'_>, depth: usize, skip: Option<usize>, out: &mut Vec<LiveSymbol>) {
    if depth > MAX_DEPTH {
      return;
    }

    let mut wrapped = None;
    if skip != Some(node.id()) {
      match self.grammar.node_role(node.kind()) {
        Some(NodeRole::Declares(base)) => self.emit(node, node, base, out),
        Some(NodeRole::Wraps) => {
          if let Some((inner, base)) = self.wrapped_declaration(node) {
            self.emit(node, inner, base, out);
            wrapped = Some(inner.id());
          }
        }
        None => {}
      }
    }

    for child in node.children(&mut node.walk()) {
      self.visit(child, depth + 1, wrapped, out);
    }
  }

  fn wrapped_declaration<'t>(&self, node: Node<'t>) -> Option<(Node<'t>, SymbolType)> {
    node.children(&mut node.walk()).find_map(|child| {
      match self.grammar.node_role(child.kind()) {
        Some(NodeRole::Declares(base)) => Some((child, base)),
        _ => None,
      }
    })
  }

  /// Report `decl` at the line of `anchor`.
  fn emit(&self, anchor: Node<'_>, decl: Node<'_>, base: SymbolType, out: &mut Vec<LiveSymbol>) {
    let Some(name) = self.name_of(decl) else {
      return;
    };
    if name.chars().count() <= 1 || name.starts_with('_') {
      return;
    }

    let kind = classify(&name, base, self.matched);
    out.push(LiveSymbol {
      file: self.label.to_owned(),
      line: anchor.start_position().row + 1,
      kind,
      name,
      signature: self.signature_of(decl),
    });
  }

  fn text(&self, node: Node<'_>) -> String {
    String::from_utf8_lossy(&self.source[node.byte_range()]).into_owned()
  }

  fn name_of(&self, node: Node<'_>) -> Option<String> {
    if let Some(n) = self.grammar.name_node(node) {
      return Some(self.text(n));
    }

    let name_kinds = self.grammar.name_kinds();
    let direct = node
      .children(&mut node.walk())
      .find(|c| name_kinds.contains(&c.kind()));
    if let Some(n) = direct {
      return Some(self.text(n));
    }

    node
      .children(&mut node.walk())
      .filter(|c| DECLARATOR_KINDS.contains(&c.kind()))
      .find_map(|decl| {
        decl
          .children(&mut decl.walk())
          .find(|c| name_kinds.contains(&c.kind()))
      })
      .map(|n| self.text(n))
  }

  fn signature_of(&self, node: Node<'_>) -> Option<String> {
    // Go methods list the receiver first; prefer the list after the name.
    let name_end = self.name_end(node);
    let params = node
      .children(&mut node.walk())
      .filter(|c| PARAM_KINDS.contains(&c.kind()))
      .find(|c| name_end.is_none_or(|end| c.start_byte() >= end))
      .or_else(|| {
        node
          .children(&mut node.walk())
          .find(|c| PARAM_KINDS.contains(&c.kind()))
      });

    if let Some(params) = params {
      let mut sig = self.text(params);
      if let Some(ret) = node
        .child_by_field_name("return_type")
        .or_else(|| node.child_by_field_name("result"))
      {
        match ret.kind() {
          "type_annotation" => sig.push_str(&self.text(ret)),
          _ if node.child_by_field_name("result").is_some() => {
            sig.push(' ');
            sig.push_str(&self.text(ret));
          }
          _ => {
            sig.push_str(" -> ");
            sig.push_str(&self.text(ret));
          }
        }
      }
      return Some(collapse_whitespace(&sig));
    }

    // `const handler = (req) => ...`
    node
      .children(&mut node.walk())
      .filter(|c| c.kind() == "variable_declarator")
      .find_map(|decl| decl.child_by_field_name("value"))
      .filter(|value| FUNCTION_VALUE_KINDS.contains(&value.kind()))
      .and_then(|value| self.signature_of(value))
  }

  fn name_end(&self, node: Node<'_>) -> Option<usize> {
    let name_kinds = self.grammar.name_kinds();
    node
      .children(&mut node.walk())
      .find(|c| name_kinds.contains(&c.kind()))
      .map(|c| c.end_byte())
  }
}

fn collapse_whitespace(s: &str) -> String {
  s.split_whitespace().collect::<Vec<_>>().join(" ")
}

#[cfg(test)]
mod tests {
  use std::path::Path;

  use super::*;

  fn extract(path: &str, source: &str) -> Vec<LiveSymbol> {
    let matched = grammar_for_path(Path::new(path)).unwrap();
    SymbolExtractor::new().extract_source(source.as_bytes(), path, matched)
  }

  fn names(symbols: &[LiveSymbol]) -> Vec<&str> {
    symbols.iter().map(|s| s.name.as_str()).collect()
  }

  #[test]
  fn python_functions_and_classes() {
    let source = "\
import os

class Indexer:
    def scan(self, root):
        pass

    def _private(self):
        pass

@cached
def build_index(path):
    return path
";
    let symbols = extract("indexer.py", source);
    assert_eq!(names(&symbols), ["Indexer", "scan", "build_index"]);

    assert_eq!(symbols[0].kind, SymbolType::Class);
    assert_eq!(symbols[0].line, 3);
    assert_eq!(symbols[1].signature.as_deref(), Some("(self, root)"));
    // Decorated definitions are reported at the decorator line, once.
    assert_eq!(symbols[2].line, 10);
    assert_eq!(symbols[2].kind, SymbolType::Function);
  }

  #[test]
  fn rejects_short_and_private_names() {
    let symbols = extract("a.py", "def f():\n    pass\n\ndef _hidden():\n    pass\n");
    assert!(symbols.is_empty());
  }

  #[test]
  fn typescript_declarations() {
    let source = "\
export interface User { id: string }
export type Id = string;
enum Color { Red }
export function loadUser(id: string): Promise<User> { return fetch(id); }
const useFetchData = (url: string) => url;
export const createUserStore = () => ({});
";
    let symbols = extract("api.ts", source);
    assert_eq!(
      names(&symbols),
      ["User", "Id", "Color", "loadUser", "useFetchData", "createUserStore"]
    );
    assert_eq!(symbols[0].kind, SymbolType::Interface);
    assert_eq!(symbols[1].kind, SymbolType::Type);
    assert_eq!(symbols[2].kind, SymbolType::Enum);
    assert_eq!(symbols[3].kind, SymbolType::Function);
    assert_eq!(
      symbols[3].signature.as_deref(),
      Some("(id: string): Promise<User>")
    );
    assert_eq!(symbols[4].kind, SymbolType::Hook);
    assert_eq!(symbols[4].signature.as_deref(), Some("(url: string)"));
    assert_eq!(symbols[5].kind, SymbolType::Store);
  }

  #[test]
  fn tsx_components() {
    let source = "export function Button(props: Props) { return <button />; }\n";
    let symbols = extract("Button.tsx", source);
    assert_eq!(names(&symbols), ["Button"]);
    assert_eq!(symbols[0].kind, SymbolType::Component);
  }

  #[test]
  fn jsx_is_markup_flavored() {
    let symbols = extract("Card.jsx", "const Card = () => null;\n");
    assert_eq!(symbols[0].kind, SymbolType::Component);
  }

  #[test]
  fn rust_items() {
    let source = "\
pub struct Store;
pub trait Indexer {}
impl Indexer for Store {}
pub fn open(path: &str) -> Result<Store, Error> { todo!() }
";
    let symbols = extract("lib.rs", source);
    assert_eq!(names(&symbols), ["Store", "Indexer", "Store", "open"]);
    assert_eq!(symbols[1].kind, SymbolType::Interface);
    assert_eq!(symbols[2].kind, SymbolType::Class);
    assert_eq!(
      symbols[3].signature.as_deref(),
      Some("(path: &str) -> Result<Store, Error>")
    );
  }

  #[test]
  fn go_methods_use_their_own_parameters() {
    let source = "\
package main

type Server struct{}

func (s *Server) Listen(addr string) error { return nil }

func main() {}
";
    let symbols = extract("main.go", source);
    assert_eq!(names(&symbols), ["Server", "Listen", "main"]);
    assert_eq!(symbols[0].kind, SymbolType::Type);
    assert_eq!(symbols[1].signature.as_deref(), Some("(addr string) error"));
  }

  #[test]
  fn bash_functions() {
    let symbols = extract("deploy.sh", "deploy_app() {\n  echo hi\n}\n");
    assert_eq!(names(&symbols), ["deploy_app"]);
    assert_eq!(symbols[0].kind, SymbolType::Function);
  }

  #[test]
  fn malformed_source_does_not_panic() {
    let symbols = extract("broken.ts", "export function (((( {{{{ ");
    assert!(symbols.iter().all(|s| s.name.len() > 1));
  }

  #[test]
  fn extraction_is_idempotent() {
    let source = "def alpha():\n    pass\n\nclass Beta:\n    pass\n";
    let mut extractor = SymbolExtractor::new();
    let matched = grammar_for_path(Path::new("m.py")).unwrap();
    let first = extractor.extract_source(source.as_bytes(), "m.py", matched);
    let second = extractor.extract_source(source.as_bytes(), "m.py", matched);
    assert_eq!(first, second);
  }

  #[test]
  fn depth_ceiling_stops_the_walk() {
    // Each nested class adds several tree levels; the innermost are skipped.
    let mut source = String::new();
    for depth in 0..15 {
      source.push_str(&"    ".repeat(depth));
      source.push_str(&format!("class Level{depth}:\n"));
    }
    source.push_str(&"    ".repeat(15));
    source.push_str("pass\n");

    let symbols = extract("deep.py", &source);
    assert!(!symbols.is_empty());
    assert!(symbols.len() < 15);
    assert_eq!(symbols[0].name, "Level0");
  }
}
