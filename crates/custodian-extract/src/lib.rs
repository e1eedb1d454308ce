//! Live symbol extraction for the Custodian knowledge store.
//!
//! Parses current source with tree-sitter grammars and reports symbols in one
//! uniform shape. Results are always accurate with respect to disk but
//! semantically shallow: names, kinds, lines and signatures only.
//!
//! Extraction is best-effort. Unsupported files and unparsable sources yield
//! no symbols and never abort a scan.

mod classify;
pub mod error;
pub mod extractor;
pub mod finder;
pub mod grammar;
pub mod languages;
pub mod scanner;

pub use classify::classify;
pub use error::{Error, Result};
pub use extractor::{LiveSymbol, SymbolExtractor};
pub use finder::find_symbol;
pub use grammar::{Grammar, GrammarMatch};
pub use scanner::{SKIP_DIRS, scan_directory, scan_directory_with};
