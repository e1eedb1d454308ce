//! Naming-convention refinement of base symbol types.
//!
//! These rules are approximate. Two unrelated symbols can collide (a
//! capitalised constant in a `.tsx` file becomes a `component`); callers must
//! treat the result as a hint, not as the symbol's true kind.

use custodian_core::symbol::SymbolType;

use crate::grammar::GrammarMatch;

/// Refine `base`. Rules apply in order and the first match wins:
///
/// 1. capitalised name in a markup file → `component`
/// 2. `use` followed by an uppercase letter → `hook`
/// 3. contains `Store` or starts with `create`, in a script file → `store`
pub fn classify(name: &str, base: SymbolType, file: GrammarMatch) -> SymbolType {
  if file.markup && name.starts_with(|c: char| c.is_uppercase()) {
    return SymbolType::Component;
  }
  if is_hook_name(name) {
    return SymbolType::Hook;
  }
  if file.script && (name.contains("Store") || name.starts_with("create")) {
    return SymbolType::Store;
  }
  base
}

fn is_hook_name(name: &str) -> bool {
  name
    .strip_prefix("use")
    .and_then(|rest| rest.chars().next())
    .is_some_and(char::is_uppercase)
}

#[cfg(test)]
mod tests {
  use std::path::Path;

  use super::*;
  use crate::grammar::grammar_for_path;

  fn file(path: &str) -> GrammarMatch { grammar_for_path(Path::new(path)).unwrap() }

  #[test]
  fn hook_in_script_file() {
    assert_eq!(
      classify("useFetchData", SymbolType::Function, file("hooks.ts")),
      SymbolType::Hook
    );
  }

  #[test]
  fn capitalised_name_in_markup_file() {
    assert_eq!(
      classify("Button", SymbolType::Function, file("Button.tsx")),
      SymbolType::Component
    );
    assert_eq!(
      classify("Button", SymbolType::Function, file("Button.ts")),
      SymbolType::Function
    );
  }

  #[test]
  fn store_names_in_script_file() {
    assert_eq!(
      classify("createUserStore", SymbolType::Constant, file("store.ts")),
      SymbolType::Store
    );
    assert_eq!(
      classify("sessionStore", SymbolType::Constant, file("session.js")),
      SymbolType::Store
    );
    assert_eq!(
      classify("create_app", SymbolType::Function, file("app.py")),
      SymbolType::Function
    );
  }

  #[test]
  fn hook_rule_precedes_store_rule() {
    assert_eq!(
      classify("useCartStore", SymbolType::Constant, file("cart.ts")),
      SymbolType::Hook
    );
  }

  #[test]
  fn lowercase_after_use_is_not_a_hook() {
    assert_eq!(
      classify("user", SymbolType::Function, file("a.py")),
      SymbolType::Function
    );
    assert_eq!(
      classify("useless", SymbolType::Function, file("a.ts")),
      SymbolType::Function
    );
  }
}
