//! Engine configuration, loaded from RON.
//!
//! Every field has a default, so a config file only needs to name the values
//! it changes:
//!
//! ```ron
//! (
//!     max_level: 50,
//!     failed_item_policy: PassTurn,
//! )
//! ```

use crate::errors::{EngineError, EngineResult};
use serde::{Deserialize, Serialize};
use std::path::Path;
use tracing::debug;

/// Point-buy rules applied when a combatant is created.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct CreationRules {
    pub starting_budget: u32,
    /// Creation points granted per level gained.
    pub points_per_level: u32,
    /// Budget spent on every level above 1 at creation time.
    pub level_cost: u32,
    pub minimum_stat: i32,
    pub minimum_hp: i32,
}

impl Default for CreationRules {
    fn default() -> Self {
        Self {
            starting_budget: 600,
            points_per_level: 5,
            level_cost: 10,
            minimum_stat: 1,
            minimum_hp: 10,
        }
    }
}

/// What happens to the turn when an item fails its usage gate.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum FailedItemPolicy {
    /// The same side chooses again.
    #[default]
    KeepTurn,
    /// The failed attempt costs the turn.
    PassTurn,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct BattleConfig {
    pub creation: CreationRules,
    pub max_level: u32,
    pub failed_item_policy: FailedItemPolicy,
    /// Recoil taken by the fallback move, as a percentage of damage dealt.
    pub struggle_recoil_percent: f64,
}

impl Default for BattleConfig {
    fn default() -> Self {
        Self {
            creation: CreationRules::default(),
            max_level: 100,
            failed_item_policy: FailedItemPolicy::default(),
            struggle_recoil_percent: 25.0,
        }
    }
}

impl BattleConfig {
    pub fn from_ron_str(text: &str) -> EngineResult<Self> {
        Ok(ron::from_str(text)?)
    }

    pub fn load(path: impl AsRef<Path>) -> EngineResult<Self> {
        let path = path.as_ref();
        let content =
            std::fs::read_to_string(path).map_err(|err| EngineError::io(path, err))?;
        let config = Self::from_ron_str(&content)?;
        debug!(path = %path.display(), ?config, "loaded battle config");
        Ok(config)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_empty_config_is_default() {
        assert_eq!(BattleConfig::from_ron_str("()").unwrap(), BattleConfig::default());
    }

    #[test]
    fn test_partial_override() {
        let config = BattleConfig::from_ron_str(
            "(max_level: 50, failed_item_policy: PassTurn, creation: (starting_budget: 400))",
        )
        .unwrap();
        assert_eq!(config.max_level, 50);
        assert_eq!(config.failed_item_policy, FailedItemPolicy::PassTurn);
        assert_eq!(config.creation.starting_budget, 400);
        assert_eq!(config.creation.points_per_level, 5);
        assert_eq!(config.struggle_recoil_percent, 25.0);
    }

    #[test]
    fn test_malformed_config_is_an_error() {
        let err = BattleConfig::from_ron_str("(max_level: \"lots\")").unwrap_err();
        assert!(matches!(err, EngineError::Config(_)));
    }

    #[test]
    fn test_missing_file_reports_path() {
        let err = BattleConfig::load("does/not/exist.ron").unwrap_err();
        assert!(err.to_string().contains("does/not/exist.ron"));
    }
}
