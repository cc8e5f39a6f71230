//! Named combatant blueprints, loaded from RON.
//!
//! A roster entry names its moves and items; building it resolves them
//! against the loaded catalogs and runs the usual creation checks.
//!
//! ```ron
//! (
//!     entries: [
//!         (
//!             name: "Sparky",
//!             types: [Electric],
//!             level: 5,
//!             stats: (hp: 40, attack: 30, defense: 25, special_attack: 35,
//!                     special_defense: 25, speed: 45, evasion: 10, accuracy: 10),
//!             moves: ["THUNDERSHOCK", "TACKLE"],
//!             items: {"POTION": 2},
//!         ),
//!     ],
//! )
//! ```

use crate::catalog::{ItemCatalog, MoveCatalog};
use crate::combatant::{Combatant, CombatantBuilder, StatAllocation};
use crate::config::BattleConfig;
use crate::errors::{EngineError, EngineResult};
use crate::move_data::MoveDefinition;
use schema::{NameKind, PokemonType, UnknownNameError};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::path::Path;
use tracing::{debug, info};

fn default_level() -> u32 {
    1
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RosterEntry {
    pub name: String,
    pub types: Vec<PokemonType>,
    #[serde(default = "default_level")]
    pub level: u32,
    pub stats: StatAllocation,
    /// Move names, looked up in the move catalog.
    pub moves: Vec<String>,
    #[serde(default)]
    pub items: BTreeMap<String, u32>,
    #[serde(default)]
    pub footprint: u32,
    #[serde(default)]
    pub evolutions: u32,
}

impl RosterEntry {
    /// Build a fresh combatant from this entry. Unknown move or item names
    /// and creation-rule violations are errors.
    pub fn build(
        &self,
        moves: &MoveCatalog,
        items: &ItemCatalog,
        config: &BattleConfig,
    ) -> EngineResult<Combatant> {
        let definitions = self
            .moves
            .iter()
            .map(|name| moves.get(name).cloned())
            .collect::<Result<Vec<MoveDefinition>, UnknownNameError>>()?;

        let mut builder = CombatantBuilder::new(&self.name)
            .with_types(self.types.clone())
            .with_stats(self.stats)
            .with_level(self.level)
            .with_moves(definitions)
            .with_footprint(self.footprint)
            .with_evolutions(self.evolutions);
        for (name, quantity) in &self.items {
            let item = items.get(name)?;
            builder = builder.with_item(&item.name, *quantity);
        }

        let combatant = builder.build(config)?;
        debug!(
            name = %combatant.name,
            level = combatant.level,
            points = combatant.points,
            "built roster combatant"
        );
        Ok(combatant)
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Roster {
    pub entries: Vec<RosterEntry>,
}

impl Roster {
    pub fn from_ron_str(text: &str) -> EngineResult<Self> {
        Ok(ron::from_str(text)?)
    }

    pub fn load(path: impl AsRef<Path>) -> EngineResult<Self> {
        let path = path.as_ref();
        let content =
            std::fs::read_to_string(path).map_err(|err| EngineError::io(path, err))?;
        let roster = Self::from_ron_str(&content)?;
        info!(path = %path.display(), entries = roster.entries.len(), "loaded roster");
        Ok(roster)
    }

    /// Case-insensitive lookup by entry name.
    pub fn get(&self, name: &str) -> Result<&RosterEntry, UnknownNameError> {
        let name = name.trim();
        self.entries
            .iter()
            .find(|entry| entry.name.eq_ignore_ascii_case(name))
            .ok_or_else(|| UnknownNameError::new(NameKind::Combatant, name))
    }

    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.entries.iter().map(|entry| entry.name.as_str())
    }
}
