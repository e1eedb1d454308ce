use custodian_core::symbol::SymbolType;
use tree_sitter::{Language, Node};

use super::{NodeRole, SymbolGrammar};
use crate::grammar::Grammar;

pub struct Rust;

impl SymbolGrammar for Rust {
  fn grammar(&self) -> Grammar { Grammar::Rust }

  fn language(&self) -> Language { tree_sitter_rust::LANGUAGE.into() }

  fn node_role(&self, kind: &str) -> Option<NodeRole> {
    let declared = match kind {
      "function_item" => SymbolType::Function,
      "struct_item" | "impl_item" => SymbolType::Class,
      "enum_item" => SymbolType::Enum,
      "trait_item" => SymbolType::Interface,
      "type_item" => SymbolType::Type,
      "const_item" | "static_item" => SymbolType::Constant,
      _ => return None,
    };
    Some(NodeRole::Declares(declared))
  }

  /// `impl Trait for Foo` is named after `Foo`, not `Trait`.
  fn name_node<'t>(&self, node: Node<'t>) -> Option<Node<'t>> {
    if node.kind() != "impl_item" {
      return None;
    }
    let ty = node.child_by_field_name("type")?;
    match ty.kind() {
      "generic_type" => ty.child_by_field_name("type"),
      _ => Some(ty),
    }
  }
}
