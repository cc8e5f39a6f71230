//! Turn-based two-combatant battle engine.
//!
//! Moves and items are loaded from flat-text catalogs, combatants are built
//! under a point-buy budget, and a [`Battle`] steps one side's action at a
//! time through its phase machine, reporting everything as [`BattleEvent`]s.

// --- MODULE DECLARATIONS ---
pub mod battle;
pub mod catalog;
pub mod combatant;
pub mod config;
pub mod errors;
pub mod item_data;
pub mod move_data;
pub mod progression;
pub mod roster;

// --- PUBLIC API RE-EXPORTS ---

// --- From the `schema` crate ---
pub use schema::{
    CombatStat, Delta, EffectPayload, HpRequirement, ItemProperty, MoveCategory, MoveEffect,
    MoveStat, PokemonType, Status,
};

// --- From this crate's modules (`src/`) ---

// The battle state machine and what it reports.
pub use battle::commands::PlayerTarget;
pub use battle::engine::{Battle, TurnReport};
pub use battle::state::{BattleEvent, BattleOutcome, PlayerAction, TurnPhase, TurnRng};

// Definitions, catalogs and combatants.
pub use catalog::{Catalog, ItemCatalog, MoveCatalog};
pub use combatant::{Combatant, CombatantBuilder, StatAllocation};
pub use config::{BattleConfig, FailedItemPolicy};
pub use item_data::{ItemDefinition, ItemFlags};
pub use move_data::MoveDefinition;
pub use roster::{Roster, RosterEntry};

pub use errors::{BattleError, EngineError, EngineResult, ItemRejection};
