use crate::battle::conditions::{BattleCondition, ConditionType};
use crate::combatant::Combatant;
use crate::move_data::MoveDefinition;
use schema::MoveCategory;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

/// The most recent damage a side took from an attack.
#[derive(Serialize, Deserialize, Debug, Clone, Copy, PartialEq, Eq)]
pub struct DamageTaken {
    pub amount: i32,
    pub category: MoveCategory,
}

/// One combatant plus everything the battle tracks about it.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
pub struct BattleSide {
    pub combatant: Combatant,
    pub conditions: HashMap<ConditionType, BattleCondition>,
    /// Counter for sleep, bind and confusion.
    pub status_turns: u32,
    pub last_move: Option<String>,
    pub last_damage_taken: Option<DamageTaken>,
    /// Move the side must use on its next action (charge and semi-invulnerable moves).
    pub forced_move: Option<MoveDefinition>,
    pub winnings: u32,
}

impl BattleSide {
    pub fn new(combatant: Combatant) -> Self {
        Self {
            combatant,
            conditions: HashMap::new(),
            status_turns: 0,
            last_move: None,
            last_damage_taken: None,
            forced_move: None,
            winnings: 0,
        }
    }

    pub fn has_condition(&self, condition_type: ConditionType) -> bool {
        self.conditions.contains_key(&condition_type)
    }

    pub fn add_condition(&mut self, condition: BattleCondition) {
        self.conditions.insert(condition.get_type(), condition);
    }

    pub fn remove_condition(&mut self, condition_type: ConditionType) -> Option<BattleCondition> {
        self.conditions.remove(&condition_type)
    }

    pub fn get_condition(&self, condition_type: ConditionType) -> Option<&BattleCondition> {
        self.conditions.get(&condition_type)
    }

    pub fn is_disabled(&self, move_name: &str) -> bool {
        matches!(
            self.get_condition(ConditionType::Disabled),
            Some(BattleCondition::Disabled { move_name: disabled, turns_remaining })
                if *turns_remaining > 0 && disabled.eq_ignore_ascii_case(move_name)
        )
    }

    pub fn decoy_hp(&self) -> i32 {
        match self.get_condition(ConditionType::Decoy) {
            Some(BattleCondition::Decoy { hp }) => *hp,
            _ => 0,
        }
    }

    /// Count down every timed condition and return the ones that ran out.
    pub fn tick_conditions(&mut self) -> Vec<ConditionType> {
        let mut expired = Vec::new();
        for (condition_type, condition) in self.conditions.iter_mut() {
            if condition.tick() {
                expired.push(*condition_type);
            }
        }
        for condition_type in &expired {
            self.conditions.remove(condition_type);
        }
        expired.sort_by_key(|condition_type| format!("{:?}", condition_type));
        expired
    }

    /// Drop battle-scoped state once the battle ends.
    pub fn clear_battle_state(&mut self) {
        self.conditions.clear();
        self.status_turns = 0;
        self.forced_move = None;
        self.last_damage_taken = None;
    }
}
