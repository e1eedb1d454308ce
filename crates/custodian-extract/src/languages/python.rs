use custodian_core::symbol::SymbolType;
use tree_sitter::Language;

use super::{NodeRole, SymbolGrammar};
use crate::grammar::Grammar;

pub struct Python;

impl SymbolGrammar for Python {
  fn grammar(&self) -> Grammar { Grammar::Python }

  fn language(&self) -> Language { tree_sitter_python::LANGUAGE.into() }

  fn node_role(&self, kind: &str) -> Option<NodeRole> {
    match kind {
      "function_definition" => Some(NodeRole::Declares(SymbolType::Function)),
      "class_definition" => Some(NodeRole::Declares(SymbolType::Class)),
      "decorated_definition" => Some(NodeRole::Wraps),
      _ => None,
    }
  }
}
