use crate::move_types::{CombatStat, MoveStat};
use crate::names::{parse_name, NameKind, UnknownNameError};
use serde::{Deserialize, Serialize};
use strum::{Display, EnumIter, EnumString};

/// The fourteen properties an item can touch, in record order.
#[derive(
    Debug,
    Clone,
    Copy,
    PartialEq,
    Eq,
    Hash,
    PartialOrd,
    Ord,
    Serialize,
    Deserialize,
    Display,
    EnumString,
    EnumIter,
)]
#[strum(serialize_all = "camelCase", ascii_case_insensitive)]
pub enum ItemProperty {
    Hp,
    Attack,
    Defense,
    SpecialAttack,
    SpecialDefense,
    Speed,
    Evasion,
    Accuracy,
    Points,
    Exp,
    MovePower,
    MoveAccuracy,
    #[strum(to_string = "movePP")]
    MovePp,
    CriticalHitRatio,
}

impl ItemProperty {
    pub const COUNT: usize = 14;

    pub fn parse(name: &str) -> Result<Self, UnknownNameError> {
        parse_name(NameKind::Property, name)
    }

    /// The eight battle stats (hp through accuracy).
    pub fn combat_stat(self) -> Option<CombatStat> {
        match self {
            ItemProperty::Hp => Some(CombatStat::Hp),
            ItemProperty::Attack => Some(CombatStat::Attack),
            ItemProperty::Defense => Some(CombatStat::Defense),
            ItemProperty::SpecialAttack => Some(CombatStat::SpecialAttack),
            ItemProperty::SpecialDefense => Some(CombatStat::SpecialDefense),
            ItemProperty::Speed => Some(CombatStat::Speed),
            ItemProperty::Evasion => Some(CombatStat::Evasion),
            ItemProperty::Accuracy => Some(CombatStat::Accuracy),
            _ => None,
        }
    }

    pub fn move_stat(self) -> Option<MoveStat> {
        match self {
            ItemProperty::MovePower => Some(MoveStat::Power),
            ItemProperty::MoveAccuracy => Some(MoveStat::Accuracy),
            ItemProperty::MovePp => Some(MoveStat::Pp),
            _ => None,
        }
    }

    pub fn is_move_scoped(self) -> bool {
        self.move_stat().is_some()
    }

    pub fn from_combat_stat(stat: CombatStat) -> Self {
        match stat {
            CombatStat::Hp => ItemProperty::Hp,
            CombatStat::Attack => ItemProperty::Attack,
            CombatStat::Defense => ItemProperty::Defense,
            CombatStat::SpecialAttack => ItemProperty::SpecialAttack,
            CombatStat::SpecialDefense => ItemProperty::SpecialDefense,
            CombatStat::Speed => ItemProperty::Speed,
            CombatStat::Evasion => ItemProperty::Evasion,
            CombatStat::Accuracy => ItemProperty::Accuracy,
        }
    }

    pub fn from_move_stat(stat: MoveStat) -> Self {
        match stat {
            MoveStat::Power => ItemProperty::MovePower,
            MoveStat::Accuracy => ItemProperty::MoveAccuracy,
            MoveStat::Pp => ItemProperty::MovePp,
        }
    }
}

/// An item property amount. A zero in the record means "maximize".
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub enum Delta {
    Maximize,
    By(f64),
}

impl Delta {
    pub fn from_raw(value: f64) -> Self {
        if value == 0.0 {
            Delta::Maximize
        } else {
            Delta::By(value)
        }
    }

    /// Record text. `additive` deltas are written as integers.
    pub fn to_field(self, additive: bool) -> String {
        match self {
            Delta::Maximize => "0".to_string(),
            Delta::By(value) if additive => format!("{}", value.trunc() as i64),
            Delta::By(value) => {
                if value.fract() == 0.0 {
                    format!("{:.1}", value)
                } else {
                    value.to_string()
                }
            }
        }
    }

    pub fn is_maximize(self) -> bool {
        matches!(self, Delta::Maximize)
    }
}

/// Current/max HP band an item may require before it can be used.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize, Display, EnumString,
)]
#[strum(ascii_case_insensitive)]
pub enum HpRequirement {
    #[default]
    #[strum(serialize = "NA")]
    None,
    #[strum(serialize = "LT33")]
    Below33,
    #[strum(serialize = "GE50")]
    AtLeast50,
    #[strum(serialize = "LE50")]
    AtMost50,
    #[strum(serialize = "LT66")]
    Below66,
    #[strum(serialize = "EQ100")]
    Full,
}

impl HpRequirement {
    /// `ratio` is current HP over max HP.
    pub fn is_met(self, ratio: f64) -> bool {
        match self {
            HpRequirement::None => true,
            HpRequirement::Below33 => ratio < 0.33,
            HpRequirement::AtLeast50 => ratio >= 0.5,
            HpRequirement::AtMost50 => ratio <= 0.5,
            HpRequirement::Below66 => ratio < 0.66,
            HpRequirement::Full => ratio >= 1.0,
        }
    }
}
