use custodian_core::symbol::SymbolType;
use tree_sitter::Language;

use super::{NodeRole, SymbolGrammar};
use crate::grammar::Grammar;

/// TypeScript, with or without JSX.
pub struct TypeScript {
  pub tsx: bool,
}

impl SymbolGrammar for TypeScript {
  fn grammar(&self) -> Grammar {
    if self.tsx { Grammar::Tsx } else { Grammar::TypeScript }
  }

  fn language(&self) -> Language {
    if self.tsx {
      tree_sitter_typescript::LANGUAGE_TSX.into()
    } else {
      tree_sitter_typescript::LANGUAGE_TYPESCRIPT.into()
    }
  }

  fn node_role(&self, kind: &str) -> Option<NodeRole> {
    let declared = match kind {
      "function_declaration" | "generator_function_declaration" | "method_definition" => {
        SymbolType::Function
      }
      "class_declaration" | "abstract_class_declaration" => SymbolType::Class,
      "interface_declaration" => SymbolType::Interface,
      "type_alias_declaration" => SymbolType::Type,
      "enum_declaration" => SymbolType::Enum,
      "lexical_declaration" => SymbolType::Constant,
      "export_statement" => return Some(NodeRole::Wraps),
      _ => return None,
    };
    Some(NodeRole::Declares(declared))
  }
}
