//! Live Symbol Finder: re-scans on every call, so results always reflect
//! the current state of disk.

use std::path::Path;

use crate::{Result, extractor::LiveSymbol, scanner::scan_directory};

/// Find symbols under `root` named `query`: exactly when `exact`, otherwise
/// by case-insensitive substring.
pub fn find_symbol(root: &Path, query: &str, exact: bool) -> Result<Vec<LiveSymbol>> {
  let needle = query.to_lowercase();
  let mut symbols = scan_directory(root)?;
  symbols.retain(|s| {
    if exact {
      s.name == query
    } else {
      s.name.to_lowercase().contains(&needle)
    }
  });
  Ok(symbols)
}
