use schema::{CombatStat, ItemProperty, PokemonType, UnknownNameError};
use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use thiserror::Error;

/// Main error type for the battle engine
#[derive(Debug, Error)]
pub enum EngineError {
    /// A catalog record could not be turned into a definition
    #[error("record error: {0}")]
    Record(#[from] RecordError),
    /// A name that is neither in a closed enumeration nor a loaded catalog
    #[error(transparent)]
    UnknownName(#[from] UnknownNameError),
    /// A combatant could not be built
    #[error("combatant error: {0}")]
    Combatant(#[from] CombatantError),
    /// An action was rejected by the battle
    #[error("battle error: {0}")]
    Battle(#[from] BattleError),
    #[error("could not read {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("configuration error: {0}")]
    Config(#[from] ron::error::SpannedError),
    #[error("snapshot error: {0}")]
    Snapshot(#[from] postcard::Error),
}

impl EngineError {
    pub fn io(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        EngineError::Io {
            path: path.into(),
            source,
        }
    }
}

/// Structural problems in a single catalog record
#[derive(Debug, Clone, PartialEq, Error)]
pub enum SchemaError {
    #[error("expected {expected} fields, found {found}")]
    FieldCount { expected: &'static str, found: usize },
    #[error("invalid {field}: {value:?}")]
    InvalidField { field: &'static str, value: String },
    #[error("effect {index} is written {expected}, record says {found:?}")]
    AcronymMismatch {
        index: usize,
        expected: &'static str,
        found: String,
    },
    #[error("effect {index} appears more than once")]
    DuplicateEffect { index: usize },
    #[error("property {property} appears more than once")]
    DuplicateProperty { property: ItemProperty },
    #[error("{item} affects all stats but declares {property}, which is not a battle stat")]
    InconsistentScope {
        item: String,
        property: ItemProperty,
    },
    #[error("{item} affects all stats, so it takes a single stat property, not also {property}")]
    StackedAllStats {
        item: String,
        property: ItemProperty,
    },
}

impl SchemaError {
    pub fn invalid(field: &'static str, value: impl Into<String>) -> Self {
        SchemaError::InvalidField {
            field,
            value: value.into(),
        }
    }
}

/// Why one record was refused
#[derive(Debug, Clone, PartialEq, Error)]
pub enum RecordError {
    #[error(transparent)]
    Schema(#[from] SchemaError),
    #[error(transparent)]
    UnknownName(#[from] UnknownNameError),
}

/// A skipped catalog line and why it was skipped
#[derive(Debug, Clone, PartialEq, Error)]
#[error("line {line}: {error}")]
pub struct CatalogLineError {
    /// 1-based line number in the source text
    pub line: usize,
    pub error: RecordError,
}

/// Construction-time failures; no partially built combatant is ever returned
#[derive(Debug, Clone, PartialEq, Error)]
pub enum CombatantError {
    #[error("creation costs {spent} points but the budget is {budget}")]
    BudgetExceeded { spent: u32, budget: u32 },
    #[error("{stat} of {value} is below the minimum of {minimum}")]
    BelowMinimum {
        stat: CombatStat,
        value: i32,
        minimum: i32,
    },
    #[error("a combatant knows 1 to 4 moves, not {0}")]
    InvalidMoveCount(usize),
    #[error("a combatant has 1 or 2 types, not {0}")]
    InvalidTypeCount(usize),
    #[error("type {0} is listed twice")]
    DuplicateType(PokemonType),
    #[error("level {level} is outside 1..={max_level}")]
    InvalidLevel { level: u32, max_level: u32 },
}

/// Errors related to player actions against a running battle
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum BattleError {
    #[error("the battle is already over")]
    BattleOver,
    #[error("move slot {slot} is empty; {known} moves are known")]
    InvalidMoveSlot { slot: usize, known: usize },
    #[error("{0} is not held")]
    ItemNotHeld(String),
}

/// A gated item use. Not an engine error: nothing is mutated and the item is
/// kept, and the presentation layer shows the reason as "cannot be used".
#[derive(Debug, Clone, PartialEq, Eq, Error, Serialize, Deserialize)]
pub enum ItemRejection {
    #[error("the selected move is not {required}-type")]
    WrongMoveType { required: PokemonType },
    #[error("the selected move is not a {required} move")]
    WrongMoveCategory { required: schema::MoveCategory },
    #[error("HP is not in the required range")]
    HpBandNotMet,
    #[error("a move must be selected first")]
    NoMoveSelected,
    #[error("the target has fainted")]
    TargetFainted,
    #[error("it only works on level up")]
    LevelUpOnly,
}

/// Type alias for Results using EngineError
pub type EngineResult<T> = Result<T, EngineError>;

/// Type alias for single-record parsing
pub type RecordResult<T> = Result<T, RecordError>;

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use schema::NameKind;

    #[test]
    fn test_conversions_into_engine_error() {
        let err: EngineError = CombatantError::InvalidMoveCount(5).into();
        assert!(matches!(err, EngineError::Combatant(CombatantError::InvalidMoveCount(5))));

        let record: RecordError = UnknownNameError::new(NameKind::Move, "SPLASHY").into();
        let err: EngineError = record.into();
        assert_eq!(err.to_string(), "record error: unknown move: \"SPLASHY\"");
    }

    #[test]
    fn test_catalog_line_error_display() {
        let err = CatalogLineError {
            line: 3,
            error: SchemaError::FieldCount {
                expected: "at least 7",
                found: 4,
            }
            .into(),
        };
        assert_eq!(err.to_string(), "line 3: expected at least 7 fields, found 4");
    }
}
