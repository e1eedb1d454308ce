//! Grammar Registry: maps a file extension to a grammar.

use std::{fmt, path::Path};

/// A supported tree-sitter grammar.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum Grammar {
  TypeScript,
  Tsx,
  JavaScript,
  Python,
  Bash,
  Rust,
  Go,
}

impl Grammar {
  pub fn as_str(self) -> &'static str {
    match self {
      Self::TypeScript => "typescript",
      Self::Tsx => "tsx",
      Self::JavaScript => "javascript",
      Self::Python => "python",
      Self::Bash => "bash",
      Self::Rust => "rust",
      Self::Go => "go",
    }
  }
}

impl fmt::Display for Grammar {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    f.write_str(self.as_str())
  }
}

/// A grammar plus the file-flavor facts the classifier needs.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct GrammarMatch {
  pub grammar: Grammar,
  /// JSX-style markup file (`.tsx`, `.jsx`).
  pub markup:  bool,
  /// JavaScript-family script file (`.ts`, `.tsx`, `.js`, `.jsx`).
  pub script:  bool,
}

const EXTENSIONS: &[(&str, Grammar)] = &[
  ("ts", Grammar::TypeScript),
  ("tsx", Grammar::Tsx),
  ("js", Grammar::JavaScript),
  ("jsx", Grammar::JavaScript),
  ("py", Grammar::Python),
  ("sh", Grammar::Bash),
  ("rs", Grammar::Rust),
  ("go", Grammar::Go),
];

/// Every extension with a registered grammar, without the leading dot.
pub fn supported_extensions() -> impl Iterator<Item = &'static str> {
  EXTENSIONS.iter().map(|(ext, _)| *ext)
}

pub fn grammar_for_extension(ext: &str) -> Option<GrammarMatch> {
  let ext = ext.strip_prefix('.').unwrap_or(ext);
  let (_, grammar) = EXTENSIONS.iter().find(|(e, _)| *e == ext)?;
  Some(GrammarMatch {
    grammar: *grammar,
    markup:  matches!(ext, "tsx" | "jsx"),
    script:  matches!(ext, "ts" | "tsx" | "js" | "jsx"),
  })
}

pub fn grammar_for_path(path: &Path) -> Option<GrammarMatch> {
  grammar_for_extension(path.extension()?.to_str()?)
}

#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn maps_known_extensions() {
    let m = grammar_for_path(Path::new("src/App.tsx")).unwrap();
    assert_eq!(m.grammar, Grammar::Tsx);
    assert!(m.markup && m.script);

    let m = grammar_for_extension(".jsx").unwrap();
    assert_eq!(m.grammar, Grammar::JavaScript);
    assert!(m.markup);

    let m = grammar_for_path(Path::new("lib.rs")).unwrap();
    assert_eq!(m.grammar, Grammar::Rust);
    assert!(!m.markup && !m.script);
  }

  #[test]
  fn unknown_extensions_have_no_grammar() {
    assert!(grammar_for_path(Path::new("README.md")).is_none());
    assert!(grammar_for_path(Path::new("Makefile")).is_none());
  }

  #[test]
  fn lists_every_extension() {
    let exts: Vec<_> = supported_extensions().collect();
    assert_eq!(exts, ["ts", "tsx", "js", "jsx", "py", "sh", "rs", "go"]);
  }
}
