//! Introspected symbol tables and alternate (logical) names.
//!
//! Resolving a name is a two-level lookup: the name is first matched against the canonical
//! names the backend reported as active; if that fails, it is treated as a logical name and
//! mapped to a canonical name through the program’s alternate-name table, which is then looked
//! up again. Both tables are kept separate so that an exact match always wins.

use std::collections::{BTreeMap, HashMap};
use std::fmt;

use crate::shader::types::GlslType;
use crate::shader::ProgramError;

/// An active symbol record, as reported by program introspection.
#[derive(Clone, Debug, Eq, Hash, PartialEq)]
pub struct ActiveSymbol {
  /// Canonical GLSL name. Array uniforms are reported without their `[0]` suffix.
  pub name: String,
  /// Number of elements; `1` for anything that is not an array.
  pub elements: usize,
  /// Reflected type.
  pub ty: GlslType,
  /// Driver-assigned location.
  pub location: i32,
}

/// Kind of symbol a name refers to.
#[derive(Clone, Copy, Debug, Eq, Hash, PartialEq)]
pub enum SymbolKind {
  Uniform,
  Attribute,
}

impl fmt::Display for SymbolKind {
  fn fmt(&self, f: &mut fmt::Formatter) -> Result<(), fmt::Error> {
    match *self {
      SymbolKind::Uniform => f.write_str("uniform"),
      SymbolKind::Attribute => f.write_str("attribute"),
    }
  }
}

/// Active symbols of a program, indexed by canonical name and by location.
#[derive(Clone, Debug, Default)]
pub struct SymbolTable {
  by_name: HashMap<String, ActiveSymbol>,
  by_location: HashMap<i32, String>,
}

impl SymbolTable {
  pub fn new() -> Self {
    Self::default()
  }

  pub fn insert(&mut self, record: ActiveSymbol) {
    if let Some(previous) = self.by_name.get(&record.name) {
      self.by_location.remove(&previous.location);
    }

    self.by_location.insert(record.location, record.name.clone());
    self.by_name.insert(record.name.clone(), record);
  }

  pub fn get(&self, name: &str) -> Option<&ActiveSymbol> {
    self.by_name.get(name)
  }

  pub fn at(&self, location: i32) -> Option<&ActiveSymbol> {
    self
      .by_location
      .get(&location)
      .and_then(|name| self.by_name.get(name))
  }

  pub fn iter(&self) -> impl Iterator<Item = &ActiveSymbol> {
    self.by_name.values()
  }

  pub fn len(&self) -> usize {
    self.by_name.len()
  }

  pub fn is_empty(&self) -> bool {
    self.by_name.is_empty()
  }

  pub fn clear(&mut self) {
    self.by_name.clear();
    self.by_location.clear();
  }
}

impl FromIterator<ActiveSymbol> for SymbolTable {
  fn from_iter<I>(iter: I) -> Self
  where
    I: IntoIterator<Item = ActiveSymbol>,
  {
    let mut table = SymbolTable::new();

    for record in iter {
      table.insert(record);
    }

    table
  }
}

/// Logical name → canonical name mapping.
///
/// A logical name can be mapped only once per table.
#[derive(Clone, Debug)]
pub struct AlternateNames {
  kind: SymbolKind,
  map: BTreeMap<String, String>,
}

impl AlternateNames {
  pub fn new(kind: SymbolKind) -> Self {
    AlternateNames {
      kind,
      map: BTreeMap::new(),
    }
  }

  pub fn kind(&self) -> SymbolKind {
    self.kind
  }

  /// Map `logical` to `canonical`.
  ///
  /// Fails if `logical` is already mapped, leaving the first mapping in place.
  pub fn insert(
    &mut self,
    canonical: impl Into<String>,
    logical: impl Into<String>,
  ) -> Result<(), ProgramError> {
    let canonical = canonical.into();
    let logical = logical.into();

    if let Some(existing) = self.map.get(&logical) {
      return Err(ProgramError::AlternateNameTaken {
        kind: self.kind,
        logical,
        existing: existing.clone(),
        rejected: canonical,
      });
    }

    self.map.insert(logical, canonical);
    Ok(())
  }

  /// Canonical name a logical name maps to.
  pub fn canonical(&self, logical: &str) -> Option<&str> {
    self.map.get(logical).map(String::as_str)
  }

  /// Iterate over `(logical, canonical)` pairs, ordered by logical name.
  pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
    self.map.iter().map(|(l, c)| (l.as_str(), c.as_str()))
  }

  pub fn len(&self) -> usize {
    self.map.len()
  }

  pub fn is_empty(&self) -> bool {
    self.map.is_empty()
  }

  /// Resolve a name against a symbol table: exact canonical match first, alternate name second.
  pub fn resolve<'t>(&self, table: &'t SymbolTable, name: &str) -> Option<&'t ActiveSymbol> {
    table
      .get(name)
      .or_else(|| self.canonical(name).and_then(|canonical| table.get(canonical)))
  }
}

#[cfg(test)]
mod tests {
  use super::*;

  fn symbol(name: &str, location: i32) -> ActiveSymbol {
    ActiveSymbol {
      name: name.to_owned(),
      elements: 1,
      ty: GlslType::Vec4,
      location,
    }
  }

  #[test]
  fn table_indexes_both_ways() {
    let table: SymbolTable = vec![symbol("u_color", 3), symbol("u_mvp_matrix", 0)]
      .into_iter()
      .collect();

    assert_eq!(table.len(), 2);
    assert_eq!(table.get("u_color").map(|s| s.location), Some(3));
    assert_eq!(table.at(0).map(|s| s.name.as_str()), Some("u_mvp_matrix"));
    assert!(table.at(7).is_none());
  }

  #[test]
  fn reinserting_a_name_moves_its_location() {
    let mut table = SymbolTable::new();
    table.insert(symbol("u_color", 3));
    table.insert(symbol("u_color", 5));

    assert_eq!(table.len(), 1);
    assert!(table.at(3).is_none());
    assert_eq!(table.at(5).map(|s| s.name.as_str()), Some("u_color"));
  }

  #[test]
  fn exact_name_wins_over_alternate() {
    let table: SymbolTable = vec![symbol("color", 1), symbol("u_color", 2)]
      .into_iter()
      .collect();
    let mut alts = AlternateNames::new(SymbolKind::Uniform);
    alts.insert("u_color", "color").unwrap();

    assert_eq!(alts.resolve(&table, "color").map(|s| s.location), Some(1));
  }

  #[test]
  fn alternate_resolves_to_canonical() {
    let table: SymbolTable = vec![symbol("u_color", 2)].into_iter().collect();
    let mut alts = AlternateNames::new(SymbolKind::Uniform);
    alts.insert("u_color", "color").unwrap();

    assert_eq!(
      alts.resolve(&table, "color"),
      alts.resolve(&table, "u_color")
    );
    assert!(alts.resolve(&table, "colour").is_none());
  }

  #[test]
  fn alternate_mapping_to_inactive_symbol_resolves_to_nothing() {
    let table = SymbolTable::new();
    let mut alts = AlternateNames::new(SymbolKind::Attribute);
    alts.insert("a_normal", "normal").unwrap();

    assert!(alts.resolve(&table, "normal").is_none());
  }

  #[test]
  fn logical_names_are_mapped_once() {
    let mut alts = AlternateNames::new(SymbolKind::Attribute);
    alts.insert("a_position", "position").unwrap();

    let err = alts.insert("a_vertex", "position").unwrap_err();
    assert_eq!(
      err,
      ProgramError::AlternateNameTaken {
        kind: SymbolKind::Attribute,
        logical: "position".to_owned(),
        existing: "a_position".to_owned(),
        rejected: "a_vertex".to_owned(),
      }
    );

    assert_eq!(alts.canonical("position"), Some("a_position"));
    assert_eq!(alts.len(), 1);
  }
}
