//! Relationship resolution: which files a change to a symbol would touch.
//!
//! Expansion is exactly one hop: the edges of the directly matched symbols
//! are followed, the edges of the symbols they reach are not. This bounds the
//! result size and keeps cyclic relationship data harmless.

use std::collections::{BTreeMap, BTreeSet};

use serde::Serialize;

use crate::{
  Lookup,
  store::FossilStore,
  symbol::{NameMatch, Symbol, SymbolScope},
};

/// Files related to a symbol-name fragment.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct RelatedFiles {
  /// Files defining a matching symbol.
  pub direct:  BTreeSet<String>,
  /// Files defining a symbol referenced by a direct match, minus `direct`.
  pub related: BTreeSet<String>,
  /// `direct ∪ related`.
  pub all:     BTreeSet<String>,
}

/// Keep, for every distinct symbol name, only the rows from the newest fossil
/// that contains that name.
///
/// `symbols` must be ordered newest fossil first.
pub fn most_recent_per_name(symbols: Vec<Symbol>) -> Vec<Symbol> {
  let mut newest: BTreeMap<String, i64> = BTreeMap::new();
  for s in &symbols {
    newest.entry(s.name.clone()).or_insert(s.version);
  }
  symbols
    .into_iter()
    .filter(|s| newest.get(&s.name) == Some(&s.version))
    .collect()
}

/// Expand `fragment` into direct and one-hop related files.
///
/// Matching spans every fossil, keeping the most recent occurrence of each
/// symbol. Edge names that resolve to no known symbol are dropped.
pub async fn resolve_related<S: FossilStore>(
  store: &S,
  project_name: &str,
  fragment: &str,
) -> Result<Lookup<RelatedFiles>, S::Error> {
  let matches = match store
    .find_symbols(
      project_name,
      NameMatch::Contains(fragment.to_owned()),
      SymbolScope::AllFossils,
    )
    .await?
  {
    Lookup::Found(symbols) => most_recent_per_name(symbols),
    Lookup::ProjectNotFound(n) => return Ok(Lookup::ProjectNotFound(n)),
    Lookup::NoFossil(n) => return Ok(Lookup::NoFossil(n)),
  };

  let direct: BTreeSet<String> = matches.iter().map(|s| s.file_path.clone()).collect();

  let referenced: BTreeSet<String> = matches
    .iter()
    .flat_map(|s| {
      s.edges()
        .referenced_names()
        .into_iter()
        .map(str::to_owned)
        .collect::<Vec<_>>()
    })
    .collect();

  let mut reached = BTreeSet::new();
  for name in referenced {
    let rows = store
      .find_symbols(project_name, NameMatch::Exact(name.clone()), SymbolScope::AllFossils)
      .await?
      .found()
      .unwrap_or_default();
    if rows.is_empty() {
      tracing::debug!(symbol = %name, "relationship edge resolves to no symbol");
    }
    reached.extend(most_recent_per_name(rows).into_iter().map(|s| s.file_path));
  }

  let related: BTreeSet<String> = reached.difference(&direct).cloned().collect();
  let all: BTreeSet<String> = direct.union(&related).cloned().collect();

  Ok(Lookup::Found(RelatedFiles { direct, related, all }))
}
