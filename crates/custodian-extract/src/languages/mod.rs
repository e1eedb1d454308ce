//! Per-grammar symbol-node tables.
//!
//! Each grammar implements [`SymbolGrammar`]; extraction logic never branches
//! on the language itself. Adding a language means adding a module here and
//! an extension in [`crate::grammar`].

mod bash;
mod go;
mod javascript;
mod python;
mod rust;
mod typescript;

use custodian_core::symbol::SymbolType;
use tree_sitter::{Language, Node};

use crate::grammar::Grammar;

/// What a syntax node contributes to extraction.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum NodeRole {
  /// The node declares a symbol of the given base type.
  Declares(SymbolType),
  /// The node wraps a declaration (export, decorator). The symbol is taken
  /// from the wrapped declaration and reported at the wrapper's line.
  Wraps,
}

/// Child node kinds that carry a symbol name in most grammars.
pub const DEFAULT_NAME_KINDS: &[&str] =
  &["identifier", "type_identifier", "property_identifier", "name"];

pub trait SymbolGrammar: Send + Sync {
  fn grammar(&self) -> Grammar;

  fn language(&self) -> Language;

  /// Look a node kind up in the grammar's symbol-node table.
  fn node_role(&self, kind: &str) -> Option<NodeRole>;

  /// Child node kinds accepted as a name.
  fn name_kinds(&self) -> &'static [&'static str] { DEFAULT_NAME_KINDS }

  /// Grammar-specific name node, consulted before the generic child search.
  fn name_node<'t>(&self, _node: Node<'t>) -> Option<Node<'t>> { None }
}

static TYPESCRIPT: typescript::TypeScript = typescript::TypeScript { tsx: false };
static TSX: typescript::TypeScript = typescript::TypeScript { tsx: true };
static JAVASCRIPT: javascript::JavaScript = javascript::JavaScript;
static PYTHON: python::Python = python::Python;
static BASH: bash::Bash = bash::Bash;
static RUST: rust::Rust = rust::Rust;
static GO: go::Go = go::Go;

/// The implementation for `grammar`.
pub fn symbol_grammar(grammar: Grammar) -> &'static dyn SymbolGrammar {
  match grammar {
    Grammar::TypeScript => &TYPESCRIPT,
    Grammar::Tsx => &TSX,
    Grammar::JavaScript => &JAVASCRIPT,
    Grammar::Python => &PYTHON,
    Grammar::Bash => &BASH,
    Grammar::Rust => &RUST,
    Grammar::Go => &GO,
  }
}

#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn every_grammar_loads_into_a_parser() {
    for grammar in [
      Grammar::TypeScript,
      Grammar::Tsx,
      Grammar::JavaScript,
      Grammar::Python,
      Grammar::Bash,
      Grammar::Rust,
      Grammar::Go,
    ] {
      let g = symbol_grammar(grammar);
      assert_eq!(g.grammar(), grammar);
      let mut parser = tree_sitter::Parser::new();
      assert!(parser.set_language(&g.language()).is_ok(), "{grammar}");
    }
  }

  #[test]
  fn tables_distinguish_wrappers() {
    let ts = symbol_grammar(Grammar::TypeScript);
    assert_eq!(ts.node_role("export_statement"), Some(NodeRole::Wraps));
    assert_eq!(
      ts.node_role("interface_declaration"),
      Some(NodeRole::Declares(SymbolType::Interface))
    );
    assert_eq!(ts.node_role("call_expression"), None);
  }
}
