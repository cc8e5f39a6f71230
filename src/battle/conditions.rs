use serde::{Deserialize, Serialize};
use std::fmt;

/// Battle-scoped conditions held by one side. They are cleared when the
/// battle ends and never touch the combatant's persistent status.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
pub enum BattleCondition {
    Flinched,
    /// Must skip this many more actions.
    Recharging { turns_remaining: u32 },
    /// Gathering power; the stored move fires next action.
    Charging,
    Underground,
    InAir,
    /// Loses 1/16 max HP at the end of each of its actions.
    Lingering { turns_remaining: u32 },
    Disabled { move_name: String, turns_remaining: u32 },
    /// Cannot escape or be phased out.
    Trapped { turns_remaining: u32 },
    /// Stat lowers from the opponent are blocked.
    StatsLocked { turns_remaining: u32 },
    Decoy { hp: i32 },
}

/// Condition type without data payload, used as the map key and for removal.
#[derive(Serialize, Deserialize, Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ConditionType {
    Flinched,
    Recharging,
    Charging,
    Underground,
    InAir,
    Lingering,
    Disabled,
    Trapped,
    StatsLocked,
    Decoy,
}

impl BattleCondition {
    pub fn get_type(&self) -> ConditionType {
        match self {
            BattleCondition::Flinched => ConditionType::Flinched,
            BattleCondition::Recharging { .. } => ConditionType::Recharging,
            BattleCondition::Charging => ConditionType::Charging,
            BattleCondition::Underground => ConditionType::Underground,
            BattleCondition::InAir => ConditionType::InAir,
            BattleCondition::Lingering { .. } => ConditionType::Lingering,
            BattleCondition::Disabled { .. } => ConditionType::Disabled,
            BattleCondition::Trapped { .. } => ConditionType::Trapped,
            BattleCondition::StatsLocked { .. } => ConditionType::StatsLocked,
            BattleCondition::Decoy { .. } => ConditionType::Decoy,
        }
    }

    /// Count down a timed condition. Returns true once it has run out.
    pub fn tick(&mut self) -> bool {
        match self {
            BattleCondition::Lingering { turns_remaining }
            | BattleCondition::Disabled {
                turns_remaining, ..
            }
            | BattleCondition::Trapped { turns_remaining }
            | BattleCondition::StatsLocked { turns_remaining } => {
                *turns_remaining = turns_remaining.saturating_sub(1);
                *turns_remaining == 0
            }
            _ => false,
        }
    }
}

impl fmt::Display for ConditionType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let label = match self {
            ConditionType::Flinched => "flinching",
            ConditionType::Recharging => "recharging",
            ConditionType::Charging => "charging",
            ConditionType::Underground => "underground",
            ConditionType::InAir => "in the air",
            ConditionType::Lingering => "lingering damage",
            ConditionType::Disabled => "disable",
            ConditionType::Trapped => "trapping",
            ConditionType::StatsLocked => "stat lock",
            ConditionType::Decoy => "decoy",
        };
        write!(f, "{}", label)
    }
}
