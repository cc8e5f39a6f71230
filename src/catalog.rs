//! Name-keyed catalogs of move and item definitions.
//!
//! A catalog is loaded once from record text and then passed by reference
//! into the engine. Appending needs `&mut`, so a catalog shared with a
//! running battle cannot change underneath it.

use crate::errors::{CatalogLineError, EngineError, EngineResult, RecordResult};
use crate::item_data::ItemDefinition;
use crate::move_data::MoveDefinition;
use schema::{NameKind, UnknownNameError};
use std::collections::BTreeMap;
use std::path::Path;
use tracing::{info, warn};

/// A definition that can be stored in a [`Catalog`].
pub trait CatalogRecord: Sized {
    const KIND: NameKind;

    fn name(&self) -> &str;
    fn from_record(record: &str) -> RecordResult<Self>;
    fn to_record(&self) -> String;
}

impl CatalogRecord for MoveDefinition {
    const KIND: NameKind = NameKind::Move;

    fn name(&self) -> &str {
        &self.name
    }

    fn from_record(record: &str) -> RecordResult<Self> {
        MoveDefinition::from_record(record)
    }

    fn to_record(&self) -> String {
        MoveDefinition::to_record(self)
    }
}

impl CatalogRecord for ItemDefinition {
    const KIND: NameKind = NameKind::Item;

    fn name(&self) -> &str {
        &self.name
    }

    fn from_record(record: &str) -> RecordResult<Self> {
        ItemDefinition::from_record(record)
    }

    fn to_record(&self) -> String {
        ItemDefinition::to_record(self)
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct Catalog<T> {
    entries: BTreeMap<String, T>,
}

pub type MoveCatalog = Catalog<MoveDefinition>;
pub type ItemCatalog = Catalog<ItemDefinition>;

/// A loaded catalog plus every record that was skipped.
#[derive(Debug, Clone)]
pub struct CatalogLoad<T> {
    pub catalog: Catalog<T>,
    pub errors: Vec<CatalogLineError>,
}

impl<T> Default for Catalog<T> {
    fn default() -> Self {
        Self {
            entries: BTreeMap::new(),
        }
    }
}

impl<T: CatalogRecord> Catalog<T> {
    pub fn new() -> Self {
        Self::default()
    }

    /// Parse one record per line. Blank lines and `#` comments are skipped.
    /// A bad record is reported and skipped; it never aborts the load.
    pub fn load_from_str(text: &str) -> CatalogLoad<T> {
        let mut catalog = Self::new();
        let mut errors = Vec::new();

        for (number, line) in text.lines().enumerate() {
            let line = line.trim_end();
            if line.trim().is_empty() || line.trim_start().starts_with('#') {
                continue;
            }
            match T::from_record(line) {
                Ok(definition) => {
                    if !catalog.append_if_absent(definition) {
                        warn!(line = number + 1, kind = %T::KIND, "duplicate record ignored");
                    }
                }
                Err(error) => {
                    warn!(line = number + 1, kind = %T::KIND, %error, "skipping record");
                    errors.push(CatalogLineError {
                        line: number + 1,
                        error,
                    });
                }
            }
        }

        info!(
            kind = %T::KIND,
            loaded = catalog.len(),
            skipped = errors.len(),
            "catalog loaded"
        );
        CatalogLoad { catalog, errors }
    }

    pub fn load_from_path(path: impl AsRef<Path>) -> EngineResult<CatalogLoad<T>> {
        let path = path.as_ref();
        let text = std::fs::read_to_string(path).map_err(|err| EngineError::io(path, err))?;
        Ok(Self::load_from_str(&text))
    }

    /// Case-insensitive lookup.
    pub fn get(&self, name: &str) -> Result<&T, UnknownNameError> {
        self.entries
            .get(&normalize(name))
            .ok_or_else(|| UnknownNameError::new(T::KIND, name.trim()))
    }

    pub fn contains(&self, name: &str) -> bool {
        self.entries.contains_key(&normalize(name))
    }

    /// Insert a definition unless its name is already present. Returns true
    /// if it was added.
    pub fn append_if_absent(&mut self, definition: T) -> bool {
        let key = normalize(definition.name());
        if self.entries.contains_key(&key) {
            return false;
        }
        self.entries.insert(key, definition);
        true
    }

    /// Canonical record text, one line per definition in name order.
    pub fn to_records(&self) -> String {
        self.entries
            .values()
            .map(|definition| definition.to_record() + "\n")
            .collect()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &T> {
        self.entries.values()
    }

    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.entries.keys().map(String::as_str)
    }
}

impl<T: CatalogRecord> FromIterator<T> for Catalog<T> {
    fn from_iter<I: IntoIterator<Item = T>>(iter: I) -> Self {
        let mut catalog = Self::new();
        for definition in iter {
            catalog.append_if_absent(definition);
        }
        catalog
    }
}

fn normalize(name: &str) -> String {
    name.trim().to_uppercase()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::errors::{RecordError, SchemaError};
    use pretty_assertions::assert_eq;
    use schema::{MoveCategory, PokemonType};

    const MOVES: &str = "\
# name@type@category@power@accuracy@pp@description
TACKLE@NORMAL@PHYSICAL@40@100@35@A full-body charge.

EMBER@FIRE@SPECIAL@40@100@25@A small flame.@2:PC:10@18:BRN:
BROKEN@FIRE@SPECIAL
tackle@NORMAL@PHYSICAL@99@100@35@Shadowed by the first TACKLE.
";

    #[test]
    fn test_load_skips_and_reports_bad_lines() {
        let load = MoveCatalog::load_from_str(MOVES);
        assert_eq!(load.catalog.len(), 2);
        assert_eq!(load.errors.len(), 1);
        assert_eq!(load.errors[0].line, 5);
        assert_eq!(
            load.errors[0].error,
            RecordError::Schema(SchemaError::FieldCount {
                expected: "at least 7",
                found: 3
            })
        );
    }

    #[test]
    fn test_first_duplicate_wins() {
        let load = MoveCatalog::load_from_str(MOVES);
        assert_eq!(load.catalog.get("Tackle").unwrap().power, 40);
    }

    #[test]
    fn test_unknown_name() {
        let load = MoveCatalog::load_from_str(MOVES);
        let err = load.catalog.get("surf").unwrap_err();
        assert_eq!(err, UnknownNameError::new(NameKind::Move, "surf"));
    }

    #[test]
    fn test_append_if_absent() {
        let mut catalog = MoveCatalog::load_from_str(MOVES).catalog;
        let surf = MoveDefinition::new("Surf", PokemonType::Water, MoveCategory::Special, 90, 100, 15);
        assert!(catalog.append_if_absent(surf.clone()));
        assert!(!catalog.append_if_absent(surf));
        assert_eq!(catalog.names().collect::<Vec<_>>(), vec!["EMBER", "SURF", "TACKLE"]);
    }

    #[test]
    fn test_records_reload_to_same_catalog() {
        let catalog = MoveCatalog::load_from_str(MOVES).catalog;
        let reloaded = MoveCatalog::load_from_str(&catalog.to_records());
        assert!(reloaded.errors.is_empty());
        assert_eq!(reloaded.catalog, catalog);
    }

    #[test]
    fn test_item_catalog() {
        let text = "POTION@potion.png@Restores 20 HP.@hp:20@T@T@T@F@NA@T@NA@NA@F@F@F@F@F@NA@F@F@F\n";
        let load = ItemCatalog::load_from_str(text);
        assert!(load.errors.is_empty());
        assert!(load.catalog.contains("potion"));
        let err = load.catalog.get("ETHER").unwrap_err();
        assert_eq!(err.kind, NameKind::Item);
    }
}
