use custodian_core::symbol::SymbolType;
use tree_sitter::Language;

use super::{NodeRole, SymbolGrammar};
use crate::grammar::Grammar;

pub struct Go;

impl SymbolGrammar for Go {
  fn grammar(&self) -> Grammar { Grammar::Go }

  fn language(&self) -> Language { tree_sitter_go::LANGUAGE.into() }

  fn node_role(&self, kind: &str) -> Option<NodeRole> {
    match kind {
      "function_declaration" | "method_declaration" => {
        Some(NodeRole::Declares(SymbolType::Function))
      }
      "type_declaration" => Some(NodeRole::Declares(SymbolType::Type)),
      _ => None,
    }
  }

  // Method names are `field_identifier` nodes.
  fn name_kinds(&self) -> &'static [&'static str] {
    &["identifier", "type_identifier", "field_identifier"]
  }
}
