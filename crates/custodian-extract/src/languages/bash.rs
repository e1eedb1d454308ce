use custodian_core::symbol::SymbolType;
use tree_sitter::Language;

use super::{NodeRole, SymbolGrammar};
use crate::grammar::Grammar;

pub struct Bash;

impl SymbolGrammar for Bash {
  fn grammar(&self) -> Grammar { Grammar::Bash }

  fn language(&self) -> Language { tree_sitter_bash::LANGUAGE.into() }

  fn node_role(&self, kind: &str) -> Option<NodeRole> {
    (kind == "function_definition").then_some(NodeRole::Declares(SymbolType::Function))
  }

  // Function names are plain `word` nodes.
  fn name_kinds(&self) -> &'static [&'static str] { &["word"] }
}
