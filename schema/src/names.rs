use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use thiserror::Error;

/// What kind of name failed to resolve.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum NameKind {
    Type,
    Category,
    Status,
    Move,
    Item,
    Property,
    EffectIndex,
    Combatant,
}

impl fmt::Display for NameKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let label = match self {
            NameKind::Type => "type",
            NameKind::Category => "move category",
            NameKind::Status => "status",
            NameKind::Move => "move",
            NameKind::Item => "item",
            NameKind::Property => "item property",
            NameKind::EffectIndex => "effect index",
            NameKind::Combatant => "roster entry",
        };
        write!(f, "{}", label)
    }
}

/// A move, item, type, status or property name that is not part of the
/// closed enumerations or the loaded catalogs.
#[derive(Debug, Clone, PartialEq, Eq, Error, Serialize, Deserialize)]
#[error("unknown {kind}: {name:?}")]
pub struct UnknownNameError {
    pub kind: NameKind,
    pub name: String,
}

impl UnknownNameError {
    pub fn new(kind: NameKind, name: impl Into<String>) -> Self {
        Self {
            kind,
            name: name.into(),
        }
    }
}

/// Parse a strum-backed enum name, trimming whitespace first.
pub fn parse_name<T: FromStr>(kind: NameKind, name: &str) -> Result<T, UnknownNameError> {
    name.trim()
        .parse::<T>()
        .map_err(|_| UnknownNameError::new(kind, name.trim()))
}
