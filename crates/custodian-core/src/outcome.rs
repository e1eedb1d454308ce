//! Discriminated query outcomes.
//!
//! Missing projects and projects without any fossil are ordinary answers, not
//! failures. Store methods return them as [`Lookup`] values and reserve `Err`
//! for infrastructure problems.

use serde::Serialize;

/// The result of a query scoped to one project.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "outcome", content = "value", rename_all = "snake_case")]
pub enum Lookup<T> {
  Found(T),
  /// No project matched the requested name.
  ProjectNotFound(String),
  /// The project exists but has never been ingested.
  NoFossil(String),
}

impl<T> Lookup<T> {
  pub fn is_found(&self) -> bool { matches!(self, Self::Found(_)) }

  pub fn found(self) -> Option<T> {
    match self {
      Self::Found(v) => Some(v),
      _ => None,
    }
  }

  pub fn map<U>(self, f: impl FnOnce(T) -> U) -> Lookup<U> {
    match self {
      Self::Found(v) => Lookup::Found(f(v)),
      Self::ProjectNotFound(n) => Lookup::ProjectNotFound(n),
      Self::NoFossil(n) => Lookup::NoFossil(n),
    }
  }

  /// A human-readable explanation for the two not-found variants.
  pub fn describe_missing(&self) -> Option<String> {
    match self {
      Self::Found(_) => None,
      Self::ProjectNotFound(n) => Some(format!("project '{n}' not found")),
      Self::NoFossil(n) => Some(format!("no fossil found for '{n}'")),
    }
  }
}

#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn map_preserves_missing_variants() {
    let l: Lookup<u32> = Lookup::NoFossil("demo".into());
    assert_eq!(l.map(|v| v + 1), Lookup::NoFossil("demo".into()));

    let l: Lookup<u32> = Lookup::Found(1);
    assert_eq!(l.map(|v| v + 1), Lookup::Found(2));
  }

  #[test]
  fn describe_missing_names_the_project() {
    let l: Lookup<()> = Lookup::ProjectNotFound("ghost".into());
    assert_eq!(l.describe_missing().as_deref(), Some("project 'ghost' not found"));
    assert!(Lookup::Found(()).describe_missing().is_none());
  }
}
