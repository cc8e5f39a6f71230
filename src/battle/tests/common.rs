use crate::battle::state::{BattleState, TurnRng};
use crate::catalog::{ItemCatalog, MoveCatalog};
use crate::combatant::{Combatant, CombatantBuilder, StatAllocation};
use crate::config::{BattleConfig, CreationRules};
use crate::errors::EngineResult;
use crate::item_data::{ItemDefinition, ItemFlags};
use crate::move_data::MoveDefinition;
use schema::{CombatStat, Delta, ItemProperty, MoveCategory, PokemonType, Status};
use std::collections::BTreeMap;

/// A builder for test combatants with predictable defaults: Normal type,
/// level 5, 50 in every stat except evasion and accuracy (10 each), no
/// critical hits and a single TACKLE.
///
/// # Example
/// ```ignore
/// let combatant = TestCombatantBuilder::new("PIKACHU")
///     .with_types(vec![PokemonType::Electric])
///     .with_status(Status::Paralysis)
///     .build();
/// ```
pub struct TestCombatantBuilder {
    name: String,
    types: Vec<PokemonType>,
    level: u32,
    stats: BTreeMap<CombatStat, i32>,
    moves: Vec<MoveDefinition>,
    status: Status,
    current_hp: Option<i32>,
    crit_ratio: f64,
    items: Vec<(String, u32)>,
}

impl TestCombatantBuilder {
    pub fn new(name: &str) -> Self {
        let stats = [
            (CombatStat::Hp, 50),
            (CombatStat::Attack, 50),
            (CombatStat::Defense, 50),
            (CombatStat::SpecialAttack, 50),
            (CombatStat::SpecialDefense, 50),
            (CombatStat::Speed, 50),
            (CombatStat::Evasion, 10),
            (CombatStat::Accuracy, 10),
        ]
        .into_iter()
        .collect();
        Self {
            name: name.to_string(),
            types: vec![PokemonType::Normal],
            level: 5,
            stats,
            moves: vec![tackle()],
            status: Status::Normal,
            current_hp: None,
            crit_ratio: 0.0,
            items: Vec::new(),
        }
    }

    pub fn with_types(mut self, types: Vec<PokemonType>) -> Self {
        self.types = types;
        self
    }

    pub fn with_level(mut self, level: u32) -> Self {
        self.level = level;
        self
    }

    /// Sets max HP; current HP starts full.
    pub fn with_hp(mut self, hp: i32) -> Self {
        self.stats.insert(CombatStat::Hp, hp);
        self
    }

    /// Sets current HP below the maximum.
    pub fn with_current_hp(mut self, hp: i32) -> Self {
        self.current_hp = Some(hp);
        self
    }

    pub fn with_stat(mut self, stat: CombatStat, value: i32) -> Self {
        self.stats.insert(stat, value);
        self
    }

    pub fn with_move(mut self, definition: MoveDefinition) -> Self {
        self.moves = vec![definition];
        self
    }

    pub fn with_moves(mut self, definitions: Vec<MoveDefinition>) -> Self {
        self.moves = definitions;
        self
    }

    pub fn with_status(mut self, status: Status) -> Self {
        self.status = status;
        self
    }

    pub fn with_crit_ratio(mut self, ratio: f64) -> Self {
        self.crit_ratio = ratio;
        self
    }

    pub fn with_item(mut self, name: &str, quantity: u32) -> Self {
        self.items.push((name.to_string(), quantity));
        self
    }

    pub fn build(self) -> Combatant {
        let stat = |stat: CombatStat| self.stats.get(&stat).copied().unwrap_or(50);
        let allocation = StatAllocation {
            hp: stat(CombatStat::Hp),
            attack: stat(CombatStat::Attack),
            defense: stat(CombatStat::Defense),
            special_attack: stat(CombatStat::SpecialAttack),
            special_defense: stat(CombatStat::SpecialDefense),
            speed: stat(CombatStat::Speed),
            evasion: stat(CombatStat::Evasion),
            accuracy: stat(CombatStat::Accuracy),
        };
        let mut builder = CombatantBuilder::new(&self.name)
            .with_types(self.types.clone())
            .with_stats(allocation)
            .with_level(self.level)
            .with_moves(self.moves.clone());
        for (name, quantity) in &self.items {
            builder = builder.with_item(name, *quantity);
        }

        let mut combatant = match builder.build(&roomy_config()) {
            Ok(combatant) => combatant,
            Err(err) => panic!("Failed to build test combatant {}: {}", self.name, err),
        };
        combatant.base.critical_hit_ratio = self.crit_ratio;
        combatant.current.critical_hit_ratio = self.crit_ratio;
        if let Some(hp) = self.current_hp {
            combatant.current.hp = hp;
        }
        combatant.status = if combatant.current.hp <= 0 {
            Status::Fainted
        } else {
            self.status
        };
        combatant
    }
}

/// A config whose budget never gets in a test's way.
fn roomy_config() -> BattleConfig {
    BattleConfig {
        creation: CreationRules {
            starting_budget: 100_000,
            ..CreationRules::default()
        },
        ..BattleConfig::default()
    }
}

pub fn test_config() -> BattleConfig {
    BattleConfig::default()
}

pub fn tackle() -> MoveDefinition {
    MoveDefinition::new("TACKLE", PokemonType::Normal, MoveCategory::Physical, 40, 100, 35)
}

/// A move with no damage, used to carry effects under test.
pub fn status_move(name: &str) -> MoveDefinition {
    MoveDefinition::new(name, PokemonType::Normal, MoveCategory::Status, 0, 100, 20)
}

/// Creates a standard 1v1 battle state for testing.
pub fn create_test_battle(player1: Combatant, player2: Combatant) -> BattleState {
    BattleState::new(player1, player2)
}

/// Draws that always land mid-range: every 100-accuracy hit check passes,
/// no low-probability roll (crit, thaw, paralysis) fires.
pub fn predictable_rng() -> TurnRng {
    TurnRng::new_for_test(vec![0.5; 100])
}

pub fn move_catalog(definitions: Vec<MoveDefinition>) -> MoveCatalog {
    definitions.into_iter().collect()
}

pub fn item_catalog(definitions: Vec<ItemDefinition>) -> ItemCatalog {
    definitions.into_iter().collect()
}

/// An item built from property pairs, panicking on an invalid combination.
pub fn test_item(name: &str, properties: &[(ItemProperty, Delta)], flags: ItemFlags) -> ItemDefinition {
    match ItemDefinition::new(name, properties.iter().copied().collect(), flags) {
        Ok(item) => item,
        Err(err) => panic!("Invalid test item {}: {}", name, err),
    }
}

/// Helper function to assert that a Result is Ok and return the value.
/// Provides clear error messages in tests when functions unexpectedly fail.
pub fn assert_ok<T>(result: EngineResult<T>) -> T {
    match result {
        Ok(value) => value,
        Err(err) => panic!("Expected Ok but got error: {}", err),
    }
}
