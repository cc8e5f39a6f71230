use super::EffectContext;
use crate::battle::calculators::{attack_stats, roll_hit, strike, DamageInput, DamageOutcome};
use crate::battle::commands::{execute_command_batch, BattleCommand};
use crate::battle::conditions::{BattleCondition, ConditionType};
use crate::battle::state::{BattleEvent, BattleState, EventBus, TurnRng};
use crate::errors::EngineResult;
use schema::{CombatStat, MoveCategory, MoveEffect};

/// Where a damaging move's damage comes from. The first match wins.
#[derive(Debug, Clone, Copy, PartialEq)]
enum DamageSource {
    Fixed(i32),
    Formula,
}

fn damage_input(context: &EffectContext, state: &BattleState, effectiveness: f64) -> DamageInput {
    let attacker = state.combatant(context.attacker);
    let defender = state.combatant(context.defender);
    let (attack_stat, defense_stat) = attack_stats(context.move_used.category);
    DamageInput {
        level: attacker.level,
        attack: attacker.current_stat(attack_stat),
        defense: defender.current_stat(defense_stat),
        power: context.power,
        move_accuracy: context.accuracy,
        attacker_accuracy: attacker.current_stat(CombatStat::Accuracy),
        defender_evasion: defender.current_stat(CombatStat::Evasion),
        effectiveness,
        crit_ratio: attacker.current.critical_hit_ratio + context.value(MoveEffect::CritBoost),
    }
}

/// Hit check. A hidden defender can only be reached by a move carrying the
/// matching Requires flag, and such a move skips the accuracy roll.
pub(super) fn check_hit(
    context: &EffectContext,
    state: &BattleState,
    rng: &mut TurnRng,
    effectiveness: f64,
) -> bool {
    let defender_side = state.side(context.defender);
    if defender_side.has_condition(ConditionType::Underground) {
        return context.has(MoveEffect::RequiresTargetUnderground);
    }
    if defender_side.has_condition(ConditionType::InAir) {
        return context.has(MoveEffect::RequiresTargetFlying);
    }
    if context.has(MoveEffect::NeverMiss) {
        return true;
    }
    roll_hit(&damage_input(context, state, effectiveness), rng)
}

pub(super) fn deals_damage(context: &EffectContext) -> bool {
    context.power > 0
        || [
            MoveEffect::FaintTarget,
            MoveEffect::FixedDamage,
            MoveEffect::PercentLevelDamage,
            MoveEffect::PercentMaxHpDamage,
            MoveEffect::HalveTargetHp,
            MoveEffect::OnPhysicalHit,
            MoveEffect::OnSpecialHit,
        ]
        .into_iter()
        .any(|effect| context.has(effect))
}

/// `None` when a counter-style move has nothing to return.
fn damage_source(context: &EffectContext, state: &BattleState) -> Option<DamageSource> {
    let attacker = state.side(context.attacker);
    let defender = state.combatant(context.defender);
    let percent_of = |base: f64, effect: MoveEffect| (base * context.value(effect) / 100.0) as i32;

    let source = if context.has(MoveEffect::FaintTarget) {
        DamageSource::Fixed(defender.current_hp())
    } else if context.has(MoveEffect::FixedDamage) {
        DamageSource::Fixed(context.value(MoveEffect::FixedDamage) as i32)
    } else if context.has(MoveEffect::PercentLevelDamage) {
        DamageSource::Fixed(percent_of(
            state.combatant(context.attacker).level as f64,
            MoveEffect::PercentLevelDamage,
        ))
    } else if context.has(MoveEffect::PercentMaxHpDamage) {
        DamageSource::Fixed(percent_of(defender.max_hp() as f64, MoveEffect::PercentMaxHpDamage))
    } else if context.has(MoveEffect::HalveTargetHp) {
        DamageSource::Fixed((defender.current_hp() / 2).max(1))
    } else if context.has(MoveEffect::OnPhysicalHit) || context.has(MoveEffect::OnSpecialHit) {
        let (effect, category) = if context.has(MoveEffect::OnPhysicalHit) {
            (MoveEffect::OnPhysicalHit, MoveCategory::Physical)
        } else {
            (MoveEffect::OnSpecialHit, MoveCategory::Special)
        };
        let taken = attacker
            .last_damage_taken
            .filter(|taken| taken.category == category && taken.amount > 0)?;
        DamageSource::Fixed(percent_of(taken.amount as f64, effect))
    } else {
        DamageSource::Formula
    };
    Some(source)
}

fn strike_count(context: &EffectContext, rng: &mut TurnRng) -> u32 {
    let max_hits = context.count(MoveEffect::MultiHit);
    if max_hits < 2 {
        return 1;
    }
    2 + rng.next_index((max_hits - 1) as usize, "multi-hit count") as u32
}

/// One strike's commands: the decoy soaks what it can, the rest reaches
/// the defender.
fn strike_commands(context: &EffectContext, state: &BattleState, amount: i32) -> Vec<BattleCommand> {
    let mut commands = Vec::new();
    let decoy_hp = state.side(context.defender).decoy_hp();
    let mut remaining = amount;
    if decoy_hp > 0 {
        let absorbed = remaining.min(decoy_hp);
        commands.push(BattleCommand::DamageDecoy {
            target: context.defender,
            amount: absorbed,
        });
        remaining -= absorbed;
    }
    if remaining > 0 {
        commands.push(BattleCommand::DealDamage {
            target: context.defender,
            amount: remaining,
        });
    }
    commands.push(BattleCommand::RecordDamageTaken {
        target: context.defender,
        amount,
        category: context.move_used.category,
    });
    commands
}

/// Deal the move's damage, one strike at a time. Returns `None` when the
/// move fails for lack of a damage source.
pub(super) fn resolve_damage(
    context: &EffectContext,
    state: &mut BattleState,
    bus: &mut EventBus,
    rng: &mut TurnRng,
    effectiveness: f64,
) -> EngineResult<Option<DamageOutcome>> {
    let Some(source) = damage_source(context, state) else {
        return Ok(None);
    };

    let hits = strike_count(context, rng);
    let mut total = DamageOutcome {
        hit: true,
        damage: 0,
        critical: false,
        effectiveness,
    };
    let mut landed = 0;

    for _ in 0..hits {
        if state.combatant(context.defender).is_fainted() {
            break;
        }
        let damage = match source {
            DamageSource::Fixed(amount) => amount.max(0),
            DamageSource::Formula => {
                let outcome = strike(&damage_input(context, state, effectiveness), rng);
                if outcome.critical {
                    total.critical = true;
                    bus.push(BattleEvent::CriticalHit);
                }
                outcome.damage
            }
        };
        landed += 1;
        total.damage += damage;
        execute_command_batch(strike_commands(context, state, damage), state, bus)?;
    }

    if hits > 1 {
        bus.push(BattleEvent::HitCount { hits: landed });
    }
    if source == DamageSource::Formula {
        bus.push(BattleEvent::AttackTypeEffectiveness {
            multiplier: effectiveness,
        });
    }
    Ok(Some(total))
}

/// Recoil and drain scale with the damage dealt; a lingering drain is left
/// on a defender that is still standing.
pub(super) fn apply_damage_based_effects(
    context: &EffectContext,
    state: &BattleState,
    damage: i32,
) -> Vec<BattleCommand> {
    let mut commands = Vec::new();
    let share = |effect: MoveEffect| (damage as f64 * context.value(effect) / 100.0) as i32;

    if context.has(MoveEffect::Recoil) && damage > 0 {
        commands.push(BattleCommand::DealDamage {
            target: context.attacker,
            amount: share(MoveEffect::Recoil).max(1),
        });
    }
    if context.has(MoveEffect::Drain) && damage > 0 {
        commands.push(BattleCommand::Heal {
            target: context.attacker,
            amount: share(MoveEffect::Drain).max(1),
        });
    }
    if context.has(MoveEffect::MultiTurnDamage) && !state.combatant(context.defender).is_fainted() {
        let condition = BattleCondition::Lingering {
            turns_remaining: context.count(MoveEffect::MultiTurnDamage).max(1),
        };
        commands.push(BattleCommand::EmitEvent(BattleEvent::ConditionApplied {
            target: context.defender,
            condition: condition.get_type(),
        }));
        commands.push(BattleCommand::AddCondition {
            target: context.defender,
            condition,
        });
    }
    commands
}

/// OnMiss costs the user a share of its max HP.
pub(super) fn apply_miss_effects(context: &EffectContext, state: &BattleState) -> Vec<BattleCommand> {
    if !context.has(MoveEffect::OnMiss) {
        return Vec::new();
    }
    let max_hp = state.combatant(context.attacker).max_hp() as f64;
    let amount = (max_hp * context.value(MoveEffect::OnMiss) / 100.0) as i32;
    vec![BattleCommand::DealDamage {
        target: context.attacker,
        amount: amount.max(1),
    }]
}
