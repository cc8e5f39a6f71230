use crate::names::{parse_name, NameKind, UnknownNameError};
use serde::{Deserialize, Serialize};
use std::fmt;
use strum::{Display, EnumIter, EnumString};

#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Display, EnumString, EnumIter,
)]
#[strum(serialize_all = "UPPERCASE", ascii_case_insensitive)]
pub enum MoveCategory {
    Physical,
    Status,
    Special,
}

impl MoveCategory {
    pub fn parse(name: &str) -> Result<Self, UnknownNameError> {
        parse_name(NameKind::Category, name)
    }

    /// Numeric code used by the "requires hit by category" effect payload.
    pub fn code(self) -> u32 {
        match self {
            MoveCategory::Physical => 0,
            MoveCategory::Status => 1,
            MoveCategory::Special => 2,
        }
    }

    pub fn from_code(code: u32) -> Option<Self> {
        match code {
            0 => Some(MoveCategory::Physical),
            1 => Some(MoveCategory::Status),
            2 => Some(MoveCategory::Special),
            _ => None,
        }
    }

    /// STATUS and PHYSICAL moves both fight with attack/defense.
    pub fn uses_special_stats(self) -> bool {
        matches!(self, MoveCategory::Special)
    }
}

/// Major status. Exactly one holds at any time; `Normal` is healthy.
#[derive(
    Debug,
    Clone,
    Copy,
    PartialEq,
    Eq,
    Hash,
    Default,
    Serialize,
    Deserialize,
    Display,
    EnumString,
    EnumIter,
)]
#[strum(serialize_all = "UPPERCASE", ascii_case_insensitive)]
pub enum Status {
    #[default]
    Normal,
    Burn,
    Freeze,
    Paralysis,
    Poison,
    Sleep,
    Bound,
    Confusion,
    Fainted,
}

impl Status {
    pub fn parse(name: &str) -> Result<Self, UnknownNameError> {
        parse_name(NameKind::Status, name)
    }

    /// A status worth announcing: anything but healthy or fainted.
    pub fn is_afflicted(self) -> bool {
        !matches!(self, Status::Normal | Status::Fainted)
    }
}

/// The integer battle stats every combatant carries in both base and
/// current form. The critical-hit ratio is a separate scalar.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize, EnumIter,
)]
pub enum CombatStat {
    Hp,
    Attack,
    Defense,
    SpecialAttack,
    SpecialDefense,
    Speed,
    Evasion,
    Accuracy,
}

impl fmt::Display for CombatStat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            CombatStat::Hp => write!(f, "HP"),
            CombatStat::Attack => write!(f, "Attack"),
            CombatStat::Defense => write!(f, "Defense"),
            CombatStat::SpecialAttack => write!(f, "Special Attack"),
            CombatStat::SpecialDefense => write!(f, "Special Defense"),
            CombatStat::Speed => write!(f, "Speed"),
            CombatStat::Evasion => write!(f, "evasiveness"),
            CombatStat::Accuracy => write!(f, "accuracy"),
        }
    }
}

/// Per-move values that have a permanent and a current form.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize, EnumIter,
)]
pub enum MoveStat {
    Power,
    Accuracy,
    Pp,
}

impl fmt::Display for MoveStat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            MoveStat::Power => write!(f, "power"),
            MoveStat::Accuracy => write!(f, "accuracy"),
            MoveStat::Pp => write!(f, "PP"),
        }
    }
}

/// Anything a stat-modifying effect can target.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ModifiedStat {
    Combat(CombatStat),
    Move(MoveStat),
}

impl fmt::Display for ModifiedStat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ModifiedStat::Combat(stat) => write!(f, "{}", stat),
            ModifiedStat::Move(stat) => write!(f, "move {}", stat),
        }
    }
}
