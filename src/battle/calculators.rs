use crate::battle::state::TurnRng;
use schema::{CombatStat, MoveCategory};
use serde::{Deserialize, Serialize};

/// Power of the typeless hit a confused combatant deals itself.
pub const CONFUSION_POWER: i32 = 40;

/// Everything the damage formula reads, gathered from both combatants.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct DamageInput {
    pub level: u32,
    pub attack: i32,
    pub defense: i32,
    pub power: i32,
    pub move_accuracy: i32,
    pub attacker_accuracy: i32,
    pub defender_evasion: i32,
    pub effectiveness: f64,
    pub crit_ratio: f64,
}

#[derive(Serialize, Deserialize, Debug, Clone, Copy, PartialEq)]
pub struct DamageOutcome {
    pub hit: bool,
    pub damage: i32,
    pub critical: bool,
    pub effectiveness: f64,
}

impl DamageOutcome {
    pub fn miss() -> Self {
        Self {
            hit: false,
            damage: 0,
            critical: false,
            effectiveness: 1.0,
        }
    }
}

/// Attacking and defending stat for a move category. Status moves use the
/// physical pair.
pub fn attack_stats(category: MoveCategory) -> (CombatStat, CombatStat) {
    if category.uses_special_stats() {
        (CombatStat::SpecialAttack, CombatStat::SpecialDefense)
    } else {
        (CombatStat::Attack, CombatStat::Defense)
    }
}

pub fn hit_chance(input: &DamageInput) -> f64 {
    let evasion = input.defender_evasion.max(1) as f64;
    input.move_accuracy as f64 * (input.attacker_accuracy as f64 / evasion) / 100.0
}

/// A chance of 1.0 or more hits without drawing.
pub fn roll_hit(input: &DamageInput, rng: &mut TurnRng) -> bool {
    let chance = hit_chance(input);
    if chance >= 1.0 {
        return true;
    }
    chance >= rng.next_unit("hit check")
}

/// Damage before the critical multiplier and effectiveness.
pub fn base_damage(input: &DamageInput) -> f64 {
    let level_term = (2 * input.level / 5 + 2) as f64;
    let ratio = input.attack as f64 / input.defense.max(1) as f64;
    level_term * input.power as f64 * ratio / 50.0 + 2.0
}

pub fn critical_multiplier(level: u32) -> f64 {
    (2.0 * level as f64 + 5.0) / (level as f64 + 5.0)
}

/// One strike that is already known to hit: critical draw, then damage.
pub fn strike(input: &DamageInput, rng: &mut TurnRng) -> DamageOutcome {
    if input.effectiveness == 0.0 {
        return DamageOutcome {
            hit: true,
            damage: 0,
            critical: false,
            effectiveness: 0.0,
        };
    }

    let critical = input.crit_ratio > 0.0 && rng.chance(input.crit_ratio, "critical hit");
    let mut damage = base_damage(input);
    if critical {
        damage *= critical_multiplier(input.level);
    }
    DamageOutcome {
        hit: true,
        damage: (damage * input.effectiveness).floor() as i32,
        critical,
        effectiveness: input.effectiveness,
    }
}

/// Hit check followed by a strike. A miss consumes no critical draw.
pub fn calculate_damage(input: &DamageInput, rng: &mut TurnRng) -> DamageOutcome {
    if !roll_hit(input, rng) {
        return DamageOutcome::miss();
    }
    strike(input, rng)
}

/// Self-inflicted confusion damage: a typeless power-40 hit of the
/// combatant's own attack against its own defense.
pub fn confusion_damage(level: u32, attack: i32, defense: i32) -> i32 {
    let input = DamageInput {
        level,
        attack,
        defense,
        power: CONFUSION_POWER,
        move_accuracy: 100,
        attacker_accuracy: 1,
        defender_evasion: 1,
        effectiveness: 1.0,
        crit_ratio: 0.0,
    };
    base_damage(&input).floor() as i32
}
