use crate::config::BattleConfig;
use crate::errors::{BattleError, CombatantError, EngineResult};
use crate::move_data::MoveDefinition;
use crate::progression::exp_for_level;
use schema::{CombatStat, MoveStat, PokemonType, Status};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use strum::IntoEnumIterator;

/// The eight integer battle stats plus the critical-hit ratio.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct StatBlock {
    pub hp: i32,
    pub attack: i32,
    pub defense: i32,
    pub special_attack: i32,
    pub special_defense: i32,
    pub speed: i32,
    pub evasion: i32,
    pub accuracy: i32,
    pub critical_hit_ratio: f64,
}

impl StatBlock {
    pub fn get(&self, stat: CombatStat) -> i32 {
        match stat {
            CombatStat::Hp => self.hp,
            CombatStat::Attack => self.attack,
            CombatStat::Defense => self.defense,
            CombatStat::SpecialAttack => self.special_attack,
            CombatStat::SpecialDefense => self.special_defense,
            CombatStat::Speed => self.speed,
            CombatStat::Evasion => self.evasion,
            CombatStat::Accuracy => self.accuracy,
        }
    }

    pub fn set(&mut self, stat: CombatStat, value: i32) {
        match stat {
            CombatStat::Hp => self.hp = value,
            CombatStat::Attack => self.attack = value,
            CombatStat::Defense => self.defense = value,
            CombatStat::SpecialAttack => self.special_attack = value,
            CombatStat::SpecialDefense => self.special_defense = value,
            CombatStat::Speed => self.speed = value,
            CombatStat::Evasion => self.evasion = value,
            CombatStat::Accuracy => self.accuracy = value,
        }
    }
}

/// Creation-time point allocation. Each point buys one point of a stat.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct StatAllocation {
    pub hp: i32,
    pub attack: i32,
    pub defense: i32,
    pub special_attack: i32,
    pub special_defense: i32,
    pub speed: i32,
    pub evasion: i32,
    pub accuracy: i32,
}

impl StatAllocation {
    pub fn get(&self, stat: CombatStat) -> i32 {
        match stat {
            CombatStat::Hp => self.hp,
            CombatStat::Attack => self.attack,
            CombatStat::Defense => self.defense,
            CombatStat::SpecialAttack => self.special_attack,
            CombatStat::SpecialDefense => self.special_defense,
            CombatStat::Speed => self.speed,
            CombatStat::Evasion => self.evasion,
            CombatStat::Accuracy => self.accuracy,
        }
    }

    pub fn total(&self) -> u32 {
        CombatStat::iter()
            .map(|stat| self.get(stat).max(0) as u32)
            .sum()
    }

    pub fn to_stat_block(&self) -> StatBlock {
        StatBlock {
            hp: self.hp,
            attack: self.attack,
            defense: self.defense,
            special_attack: self.special_attack,
            special_defense: self.special_defense,
            speed: self.speed,
            evasion: self.evasion,
            accuracy: self.accuracy,
            critical_hit_ratio: critical_ratio_for_speed(self.speed),
        }
    }
}

/// Base critical-hit chance: half the speed (integer halving) over 256.
pub fn critical_ratio_for_speed(speed: i32) -> f64 {
    (speed / 2) as f64 / 256.0
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct MoveStats {
    pub power: i32,
    pub accuracy: i32,
    pub pp: i32,
}

impl MoveStats {
    pub fn get(&self, stat: MoveStat) -> i32 {
        match stat {
            MoveStat::Power => self.power,
            MoveStat::Accuracy => self.accuracy,
            MoveStat::Pp => self.pp,
        }
    }

    pub fn set(&mut self, stat: MoveStat, value: i32) {
        match stat {
            MoveStat::Power => self.power = value,
            MoveStat::Accuracy => self.accuracy = value,
            MoveStat::Pp => self.pp = value,
        }
    }
}

/// A known move with its own permanent (`max`) and depletable (`current`) values.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MoveInstance {
    pub definition: MoveDefinition,
    pub max: MoveStats,
    pub current: MoveStats,
}

impl MoveInstance {
    pub fn new(definition: MoveDefinition) -> Self {
        let stats = MoveStats {
            power: definition.power,
            accuracy: definition.accuracy,
            pp: definition.pp,
        };
        Self {
            definition,
            max: stats,
            current: stats,
        }
    }

    pub fn name(&self) -> &str {
        &self.definition.name
    }

    pub fn has_pp(&self) -> bool {
        self.current.pp > 0
    }

    /// Spend one PP. Returns false if none was left.
    pub fn use_pp(&mut self) -> bool {
        if self.current.pp > 0 {
            self.current.pp -= 1;
            true
        } else {
            false
        }
    }

    pub fn restore(&mut self, stat: MoveStat) {
        self.current.set(stat, self.max.get(stat));
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Combatant {
    pub name: String,
    pub types: Vec<PokemonType>,
    pub base: StatBlock,
    pub current: StatBlock,
    pub status: Status,
    pub experience: u32,
    /// Experience gained during the current battle series.
    pub series_experience: u32,
    pub level: u32,
    /// Unspent creation points.
    pub points: u32,
    pub moves: Vec<MoveInstance>,
    pub inventory: BTreeMap<String, u32>,
    pub selected_move: Option<usize>,
    pub selected_item: Option<String>,
    /// Sprite footprint, one input to the defeat reward.
    pub footprint: u32,
    pub evolutions: u32,
}

impl Combatant {
    pub fn max_hp(&self) -> i32 {
        self.base.hp
    }

    pub fn current_hp(&self) -> i32 {
        self.current.hp
    }

    pub fn is_fainted(&self) -> bool {
        self.status == Status::Fainted || self.current.hp <= 0
    }

    pub fn hp_ratio(&self) -> f64 {
        if self.base.hp <= 0 {
            return 0.0;
        }
        self.current.hp as f64 / self.base.hp as f64
    }

    /// Returns true if this damage caused the combatant to faint.
    pub fn take_damage(&mut self, amount: i32) -> bool {
        if self.is_fainted() {
            return false;
        }
        self.current.hp = (self.current.hp - amount.max(0)).max(0);
        self.check_faint()
    }

    /// Heals up to max HP, never revives. Returns the amount restored.
    pub fn heal(&mut self, amount: i32) -> i32 {
        if self.is_fainted() || amount <= 0 {
            return 0;
        }
        let before = self.current.hp;
        self.current.hp = (self.current.hp + amount).min(self.base.hp);
        self.current.hp - before
    }

    pub fn set_status(&mut self, status: Status) {
        self.status = status;
    }

    pub fn has_type(&self, pokemon_type: PokemonType) -> bool {
        self.types.contains(&pokemon_type)
    }

    pub fn stat(&self, stat: CombatStat) -> i32 {
        self.base.get(stat)
    }

    pub fn current_stat(&self, stat: CombatStat) -> i32 {
        self.current.get(stat)
    }

    /// HP is clamped to `[0, max]` and reaching 0 faints the combatant.
    /// Other stats are stored as given.
    pub fn set_current_stat(&mut self, stat: CombatStat, value: i32) {
        if stat == CombatStat::Hp {
            self.current.hp = value.clamp(0, self.base.hp);
            self.check_faint();
        } else {
            self.current.set(stat, value);
        }
    }

    /// Changing a maximum also resets the current value to it.
    pub fn set_base_stat(&mut self, stat: CombatStat, value: i32) {
        self.base.set(stat, value);
        self.current.set(stat, value);
        if stat == CombatStat::Hp {
            self.check_faint();
        }
    }

    /// Restore every battle stat except HP to its base value.
    pub fn reset_battle_stats(&mut self) {
        for stat in CombatStat::iter().filter(|stat| *stat != CombatStat::Hp) {
            self.current.set(stat, self.base.get(stat));
        }
        self.current.critical_hit_ratio = self.base.critical_hit_ratio;
        for move_instance in &mut self.moves {
            move_instance.current.power = move_instance.max.power;
            move_instance.current.accuracy = move_instance.max.accuracy;
        }
    }

    pub fn select_move(&mut self, index: usize) -> Result<(), BattleError> {
        if index >= self.moves.len() {
            return Err(BattleError::InvalidMoveSlot {
                slot: index,
                known: self.moves.len(),
            });
        }
        self.selected_move = Some(index);
        Ok(())
    }

    pub fn selected_move_instance(&self) -> Option<&MoveInstance> {
        self.selected_move.and_then(|index| self.moves.get(index))
    }

    pub fn move_index(&self, name: &str) -> Option<usize> {
        self.moves
            .iter()
            .position(|instance| instance.name().eq_ignore_ascii_case(name))
    }

    pub fn item_quantity(&self, name: &str) -> u32 {
        self.inventory
            .get(&name.to_uppercase())
            .copied()
            .unwrap_or(0)
    }

    pub fn add_item(&mut self, name: &str, quantity: u32) {
        *self.inventory.entry(name.to_uppercase()).or_insert(0) += quantity;
    }

    /// Decrement a held item, removing it at zero. Returns the quantity
    /// left, or `None` if the item was not held.
    pub fn consume_item(&mut self, name: &str) -> Option<u32> {
        let key = name.to_uppercase();
        let quantity = self.inventory.get_mut(&key)?;
        *quantity = quantity.saturating_sub(1);
        let remaining = *quantity;
        if remaining == 0 {
            self.inventory.remove(&key);
        }
        Some(remaining)
    }

    pub fn to_snapshot_bytes(&self) -> EngineResult<Vec<u8>> {
        Ok(postcard::to_allocvec(self)?)
    }

    pub fn from_snapshot_bytes(bytes: &[u8]) -> EngineResult<Self> {
        Ok(postcard::from_bytes(bytes)?)
    }

    fn check_faint(&mut self) -> bool {
        if self.current.hp <= 0 && self.status != Status::Fainted {
            self.current.hp = 0;
            self.status = Status::Fainted;
            true
        } else {
            false
        }
    }
}

/// Validating builder for combatants. Construction either succeeds whole or
/// returns the first rule it breaks.
#[derive(Debug, Clone)]
pub struct CombatantBuilder {
    name: String,
    types: Vec<PokemonType>,
    allocation: StatAllocation,
    level: u32,
    moves: Vec<MoveDefinition>,
    inventory: BTreeMap<String, u32>,
    footprint: u32,
    evolutions: u32,
}

impl CombatantBuilder {
    pub fn new(name: &str) -> Self {
        Self {
            name: name.to_string(),
            types: Vec::new(),
            allocation: StatAllocation::default(),
            level: 1,
            moves: Vec::new(),
            inventory: BTreeMap::new(),
            footprint: 0,
            evolutions: 0,
        }
    }

    pub fn with_types(mut self, types: Vec<PokemonType>) -> Self {
        self.types = types;
        self
    }

    pub fn with_stats(mut self, allocation: StatAllocation) -> Self {
        self.allocation = allocation;
        self
    }

    pub fn with_level(mut self, level: u32) -> Self {
        self.level = level;
        self
    }

    pub fn with_move(mut self, definition: MoveDefinition) -> Self {
        self.moves.push(definition);
        self
    }

    pub fn with_moves(mut self, definitions: Vec<MoveDefinition>) -> Self {
        self.moves = definitions;
        self
    }

    pub fn with_item(mut self, name: &str, quantity: u32) -> Self {
        *self.inventory.entry(name.to_uppercase()).or_insert(0) += quantity;
        self
    }

    pub fn with_footprint(mut self, footprint: u32) -> Self {
        self.footprint = footprint;
        self
    }

    pub fn with_evolutions(mut self, evolutions: u32) -> Self {
        self.evolutions = evolutions;
        self
    }

    /// Total creation cost: stat points, move costs and levels above 1.
    pub fn creation_cost(&self, config: &BattleConfig) -> u32 {
        let moves: u32 = self.moves.iter().map(MoveDefinition::creation_cost).sum();
        self.allocation.total()
            + moves
            + self.level.saturating_sub(1) * config.creation.level_cost
    }

    pub fn build(self, config: &BattleConfig) -> Result<Combatant, CombatantError> {
        let rules = &config.creation;

        if self.types.is_empty() || self.types.len() > 2 {
            return Err(CombatantError::InvalidTypeCount(self.types.len()));
        }
        if self.types.len() == 2 && self.types[0] == self.types[1] {
            return Err(CombatantError::DuplicateType(self.types[0]));
        }
        if self.moves.is_empty() || self.moves.len() > 4 {
            return Err(CombatantError::InvalidMoveCount(self.moves.len()));
        }
        if self.level == 0 || self.level > config.max_level {
            return Err(CombatantError::InvalidLevel {
                level: self.level,
                max_level: config.max_level,
            });
        }

        for stat in CombatStat::iter() {
            let minimum = if stat == CombatStat::Hp {
                rules.minimum_hp
            } else {
                rules.minimum_stat
            };
            let value = self.allocation.get(stat);
            if value < minimum {
                return Err(CombatantError::BelowMinimum {
                    stat,
                    value,
                    minimum,
                });
            }
        }

        let spent = self.creation_cost(config);
        if spent > rules.starting_budget {
            return Err(CombatantError::BudgetExceeded {
                spent,
                budget: rules.starting_budget,
            });
        }

        let stats = self.allocation.to_stat_block();
        Ok(Combatant {
            name: self.name.trim().to_string(),
            types: self.types,
            base: stats,
            current: stats,
            status: Status::Normal,
            experience: exp_for_level(self.level),
            series_experience: 0,
            level: self.level,
            points: rules.starting_budget - spent,
            moves: self.moves.into_iter().map(MoveInstance::new).collect(),
            inventory: self.inventory,
            selected_move: None,
            selected_item: None,
            footprint: self.footprint,
            evolutions: self.evolutions,
        })
    }
}

/// The parts of a combatant an item can change, captured before and after a
/// resolution so the outcome can be reported as a diff.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CombatantSnapshot {
    pub base: StatBlock,
    pub current: StatBlock,
    pub status: Status,
    pub experience: u32,
    pub level: u32,
    pub points: u32,
    pub moves: Vec<(String, MoveStats, MoveStats)>,
}

impl CombatantSnapshot {
    pub fn capture(combatant: &Combatant) -> Self {
        Self {
            base: combatant.base,
            current: combatant.current,
            status: combatant.status,
            experience: combatant.experience,
            level: combatant.level,
            points: combatant.points,
            moves: combatant
                .moves
                .iter()
                .map(|instance| (instance.name().to_string(), instance.max, instance.current))
                .collect(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use schema::MoveCategory;

    fn tackle() -> MoveDefinition {
        MoveDefinition::new("TACKLE", PokemonType::Normal, MoveCategory::Physical, 40, 100, 35)
    }

    fn allocation(each: i32, hp: i32) -> StatAllocation {
        StatAllocation {
            hp,
            attack: each,
            defense: each,
            special_attack: each,
            special_defense: each,
            speed: each,
            evasion: each,
            accuracy: each,
        }
    }

    #[test]
    fn test_exactly_at_budget_succeeds() {
        let config = BattleConfig::default();
        // 7 * 70 + 95 = 585, tackle costs 5, level 2 costs 10 => 600.
        let combatant = CombatantBuilder::new("Sparky")
            .with_types(vec![PokemonType::Electric])
            .with_stats(allocation(70, 95))
            .with_level(2)
            .with_move(tackle())
            .build(&config)
            .unwrap();
        assert_eq!(combatant.points, 0);
        assert_eq!(combatant.experience, 10);
        assert_eq!(combatant.current, combatant.base);
    }

    #[test]
    fn test_one_over_budget_fails() {
        let config = BattleConfig::default();
        let err = CombatantBuilder::new("Sparky")
            .with_types(vec![PokemonType::Electric])
            .with_stats(allocation(70, 96))
            .with_level(2)
            .with_move(tackle())
            .build(&config)
            .unwrap_err();
        assert_eq!(err, CombatantError::BudgetExceeded { spent: 601, budget: 600 });
    }

    #[test]
    fn test_move_and_type_counts() {
        let config = BattleConfig::default();
        let err = CombatantBuilder::new("Empty")
            .with_types(vec![PokemonType::Normal])
            .with_stats(allocation(10, 20))
            .build(&config)
            .unwrap_err();
        assert_eq!(err, CombatantError::InvalidMoveCount(0));

        let err = CombatantBuilder::new("Crowded")
            .with_types(vec![PokemonType::Normal])
            .with_stats(allocation(10, 20))
            .with_moves(vec![tackle(); 5])
            .build(&config)
            .unwrap_err();
        assert_eq!(err, CombatantError::InvalidMoveCount(5));

        let err = CombatantBuilder::new("Typeless")
            .with_stats(allocation(10, 20))
            .with_move(tackle())
            .build(&config)
            .unwrap_err();
        assert_eq!(err, CombatantError::InvalidTypeCount(0));
    }

    #[test]
    fn test_below_minimum_hp() {
        let config = BattleConfig::default();
        let err = CombatantBuilder::new("Frail")
            .with_types(vec![PokemonType::Bug])
            .with_stats(allocation(10, 9))
            .with_move(tackle())
            .build(&config)
            .unwrap_err();
        assert_eq!(
            err,
            CombatantError::BelowMinimum {
                stat: CombatStat::Hp,
                value: 9,
                minimum: 10
            }
        );
    }

    #[test]
    fn test_crit_ratio_uses_integer_halving() {
        assert_eq!(critical_ratio_for_speed(51), 25.0 / 256.0);
        assert_eq!(critical_ratio_for_speed(1), 0.0);
    }

    #[test]
    fn test_damage_faints_and_clamps() {
        let mut combatant = CombatantBuilder::new("Target")
            .with_types(vec![PokemonType::Normal])
            .with_stats(allocation(10, 30))
            .with_move(tackle())
            .build(&BattleConfig::default())
            .unwrap();

        assert!(!combatant.take_damage(10));
        assert_eq!(combatant.current_hp(), 20);
        assert!(combatant.take_damage(50));
        assert_eq!(combatant.current_hp(), 0);
        assert_eq!(combatant.status, Status::Fainted);
        assert_eq!(combatant.heal(10), 0);
    }

    #[test]
    fn test_inventory_consumption() {
        let mut combatant = CombatantBuilder::new("Holder")
            .with_types(vec![PokemonType::Normal])
            .with_stats(allocation(10, 30))
            .with_move(tackle())
            .with_item("potion", 1)
            .build(&BattleConfig::default())
            .unwrap();

        assert_eq!(combatant.item_quantity("POTION"), 1);
        assert_eq!(combatant.consume_item("Potion"), Some(0));
        assert!(combatant.inventory.is_empty());
        assert_eq!(combatant.consume_item("POTION"), None);
    }

    #[test]
    fn test_snapshot_bytes_restore_the_same_combatant() {
        let mut combatant = CombatantBuilder::new("Saved")
            .with_types(vec![PokemonType::Water, PokemonType::Ice])
            .with_stats(allocation(20, 40))
            .with_move(tackle())
            .build(&BattleConfig::default())
            .unwrap();
        combatant.take_damage(7);

        let bytes = combatant.to_snapshot_bytes().unwrap();
        assert_eq!(Combatant::from_snapshot_bytes(&bytes).unwrap(), combatant);
    }
}
