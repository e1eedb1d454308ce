//! Project Scanner: walks a tree and flattens per-file extraction results.
//!
//! Output is ordered by relative path, then by appearance within the file, so
//! repeated scans of unchanged source are identical.

use std::path::{Path, PathBuf};

use tracing::debug;
use walkdir::WalkDir;

use crate::{
  Error, Result,
  extractor::{LiveSymbol, SymbolExtractor},
  grammar::{grammar_for_path, supported_extensions},
};

/// Directory names never descended into.
pub const SKIP_DIRS: &[&str] = &[
  "node_modules",
  ".git",
  "dist",
  "build",
  ".next",
  "__pycache__",
  ".venv",
  "venv",
  ".tox",
  ".mypy_cache",
  ".pytest_cache",
  "target",
  "vendor",
  ".turbo",
  "coverage",
  ".nyc_output",
];

/// Scan every supported file under `root`.
pub fn scan_directory(root: &Path) -> Result<Vec<LiveSymbol>> {
  scan_directory_with(root, None)
}

/// Scan files under `root` whose extension (without the dot) is in
/// `extensions`, or every supported file when `None`.
pub fn scan_directory_with(root: &Path, extensions: Option<&[&str]>) -> Result<Vec<LiveSymbol>> {
  let mut extractor = SymbolExtractor::new();
  let mut out = Vec::new();
  for (relative, path) in source_files(root, extensions)? {
    out.extend(extractor.extract_file(&path, &relative));
  }
  Ok(out)
}

/// Supported files under `root` as `(relative, absolute)` pairs, sorted by
/// the relative path.
pub(crate) fn source_files(
  root: &Path,
  extensions: Option<&[&str]>,
) -> Result<Vec<(String, PathBuf)>> {
  if !root.is_dir() {
    return Err(Error::NotADirectory(root.to_path_buf()));
  }

  let wanted = |ext: &str| match extensions {
    Some(list) => list.iter().any(|e| e.trim_start_matches('.') == ext),
    None => supported_extensions().any(|e| e == ext),
  };

  let mut files = Vec::new();
  let walker = WalkDir::new(root).into_iter().filter_entry(|entry| {
    entry.depth() == 0
      || !entry.file_type().is_dir()
      || !entry
        .file_name()
        .to_str()
        .is_some_and(|name| SKIP_DIRS.contains(&name))
  });

  for entry in walker {
    let entry = match entry {
      Ok(entry) => entry,
      Err(e) => {
        debug!("skipping unreadable entry: {e}");
        continue;
      }
    };
    if !entry.file_type().is_file() {
      continue;
    }
    let path = entry.path();
    let Some(ext) = path.extension().and_then(|e| e.to_str()) else {
      continue;
    };
    if !wanted(ext) || grammar_for_path(path).is_none() {
      continue;
    }
    let Ok(relative) = path.strip_prefix(root) else {
      continue;
    };
    files.push((to_slash(relative), path.to_path_buf()));
  }

  files.sort_by(|a, b| a.0.cmp(&b.0));
  Ok(files)
}

/// Join path components with `/` regardless of platform.
fn to_slash(path: &Path) -> String {
  path
    .components()
    .map(|c| c.as_os_str().to_string_lossy())
    .collect::<Vec<_>>()
    .join("/")
}
