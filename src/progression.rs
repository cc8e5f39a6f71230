use crate::combatant::Combatant;
use crate::config::BattleConfig;
use serde::{Deserialize, Serialize};
use tracing::info;

// Experience curve: reaching level L from L-1 costs (L-1) * EXP_STEP.
const EXP_STEP: u32 = 10;

// Defeat reward constants
const REWARD_LEVEL_DIVISOR: f64 = 5.0;
const REWARD_LEVEL_OFFSET: f64 = 10.0;
const REWARD_EXPONENT: f64 = 2.5;

/// Cumulative experience needed to stand at `level`. Level 1 needs none.
/// Saturates at `u32::MAX` for levels past the representable curve.
pub fn exp_for_level(level: u32) -> u32 {
    let steps = u128::from(level.saturating_sub(1));
    let total = u128::from(EXP_STEP) * steps * (steps + 1) / 2;
    u32::try_from(total).unwrap_or(u32::MAX)
}

/// Largest level whose threshold is at or below `exp`, never below 1.
pub fn level_from_exp(exp: u32, max_level: u32) -> u32 {
    let mut level = 1;
    while level < max_level && exp_for_level(level + 1) <= exp {
        level += 1;
    }
    level
}

/// Experience still missing before the next level.
pub fn exp_to_next_level(combatant: &Combatant) -> u32 {
    exp_for_level(combatant.level + 1).saturating_sub(combatant.experience)
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct LevelUp {
    pub levels_gained: u32,
    pub points_awarded: u32,
    pub new_level: u32,
}

impl LevelUp {
    pub fn leveled_up(&self) -> bool {
        self.levels_gained > 0
    }
}

/// Add experience to the total and the series subtotal, then advance the
/// level and grant creation points for every threshold crossed.
pub fn award_experience(combatant: &mut Combatant, amount: u32, config: &BattleConfig) -> LevelUp {
    combatant.experience = combatant.experience.saturating_add(amount);
    combatant.series_experience = combatant.series_experience.saturating_add(amount);

    let reached = level_from_exp(combatant.experience, config.max_level);
    if reached <= combatant.level {
        return LevelUp {
            levels_gained: 0,
            points_awarded: 0,
            new_level: combatant.level,
        };
    }

    let levels_gained = reached - combatant.level;
    let points_awarded = levels_gained * config.creation.points_per_level;
    combatant.level = reached;
    combatant.points += points_awarded;
    info!(
        combatant = %combatant.name,
        level = reached,
        points_awarded,
        "level up"
    );

    LevelUp {
        levels_gained,
        points_awarded,
        new_level: reached,
    }
}

/// Experience earned by a winner at `winner_level` for defeating `defeated`.
pub fn battle_reward(defeated: &Combatant, winner_level: u32) -> u32 {
    let level = defeated.level as f64;
    let winner_level = winner_level as f64;
    let worth = defeated.footprint as f64 + level * (defeated.evolutions as f64 + 1.0);
    let scaling = ((2.0 * level + REWARD_LEVEL_OFFSET) / (level + winner_level + REWARD_LEVEL_OFFSET))
        .powf(REWARD_EXPONENT);
    (worth * level / REWARD_LEVEL_DIVISOR * scaling).floor().max(0.0) as u32
}

/// Start a new battle series: the in-series subtotal goes back to zero.
pub fn reset_series(combatant: &mut Combatant) {
    combatant.series_experience = 0;
}
