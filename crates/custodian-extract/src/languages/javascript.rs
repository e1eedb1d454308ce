use custodian_core::symbol::SymbolType;
use tree_sitter::Language;

use super::{NodeRole, SymbolGrammar};
use crate::grammar::Grammar;

pub struct JavaScript;

impl SymbolGrammar for JavaScript {
  fn grammar(&self) -> Grammar { Grammar::JavaScript }

  fn language(&self) -> Language { tree_sitter_javascript::LANGUAGE.into() }

  fn node_role(&self, kind: &str) -> Option<NodeRole> {
    let declared = match kind {
      "function_declaration" | "generator_function_declaration" | "method_definition" => {
        SymbolType::Function
      }
      "class_declaration" => SymbolType::Class,
      "lexical_declaration" => SymbolType::Constant,
      "export_statement" => return Some(NodeRole::Wraps),
      _ => return None,
    };
    Some(NodeRole::Declares(declared))
  }
}
