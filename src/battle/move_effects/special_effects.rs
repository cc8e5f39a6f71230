use super::EffectContext;
use crate::battle::commands::{BattleCommand, PlayerTarget};
use crate::battle::conditions::{BattleCondition, ConditionType};
use crate::battle::state::{ActionFailureReason, BattleEvent, BattleOutcome, BattleState, TurnRng};
use crate::catalog::MoveCatalog;
use crate::config::BattleConfig;
use crate::errors::{BattleError, EngineResult};
use crate::move_data::MoveDefinition;
use schema::{MoveCategory, MoveEffect, Status};

/// Turns a stat lock protects its holder.
pub(super) const STATS_LOCK_TURNS: u32 = 5;

pub(super) struct MoveChoice {
    pub context: Option<EffectContext>,
    /// The move was stored by a charge or semi-invulnerable move.
    pub forced: bool,
    pub commands: Vec<BattleCommand>,
}

/// Pick the move to execute: a pending forced move, Struggle when the slot
/// is out of PP, or the slot's own move (spending one PP).
pub(super) fn choose_move(
    state: &BattleState,
    attacker: PlayerTarget,
    move_index: usize,
    config: &BattleConfig,
) -> EngineResult<MoveChoice> {
    let side = state.side(attacker);
    let mut commands = Vec::new();

    if let Some(forced) = &side.forced_move {
        commands.push(BattleCommand::EmitEvent(BattleEvent::MoveUsed {
            user: attacker,
            move_name: forced.name.clone(),
        }));
        return Ok(MoveChoice {
            context: Some(EffectContext::from_definition(attacker, forced.clone())),
            forced: true,
            commands,
        });
    }

    let combatant = &side.combatant;
    let instance = combatant
        .moves
        .get(move_index)
        .ok_or(BattleError::InvalidMoveSlot {
            slot: move_index,
            known: combatant.moves.len(),
        })?;

    if side.is_disabled(instance.name()) {
        commands.push(BattleCommand::EmitEvent(BattleEvent::ActionFailed {
            user: attacker,
            reason: ActionFailureReason::MoveDisabled,
        }));
        return Ok(MoveChoice {
            context: None,
            forced: false,
            commands,
        });
    }

    let context = if instance.has_pp() {
        commands.push(BattleCommand::UsePp {
            target: attacker,
            move_index,
        });
        EffectContext::new(
            attacker,
            instance.definition.clone(),
            Some(move_index),
            instance.current.power,
            instance.current.accuracy,
        )
    } else {
        commands.push(BattleCommand::EmitEvent(BattleEvent::NoPpLeft { user: attacker }));
        EffectContext::from_definition(
            attacker,
            MoveDefinition::struggle(config.struggle_recoil_percent),
        )
    };

    commands.push(BattleCommand::EmitEvent(BattleEvent::MoveUsed {
        user: attacker,
        move_name: context.move_used.name.clone(),
    }));
    Ok(MoveChoice {
        context: Some(context),
        forced: false,
        commands,
    })
}

/// RandomMove draws any catalog move that does not itself substitute;
/// CopyLastMove takes the opponent's last move. `None` means the move fails.
pub(super) fn substitute_move(
    context: &EffectContext,
    state: &BattleState,
    rng: &mut TurnRng,
    moves: &MoveCatalog,
) -> Option<EffectContext> {
    let definition = if context.has(MoveEffect::RandomMove) {
        let candidates: Vec<&MoveDefinition> = moves
            .iter()
            .filter(|definition| {
                !definition.effects.has(MoveEffect::RandomMove)
                    && !definition.effects.has(MoveEffect::CopyLastMove)
                    && !definition.is_struggle()
            })
            .collect();
        if candidates.is_empty() {
            return None;
        }
        candidates[rng.next_index(candidates.len(), "random move")].clone()
    } else {
        let last = state.side(context.defender).last_move.as_ref()?;
        let copied = moves.get(last).ok()?;
        if copied.effects.has(MoveEffect::CopyLastMove) {
            return None;
        }
        copied.clone()
    };
    Some(EffectContext::from_definition(context.attacker, definition))
}

pub(super) fn is_charge_move(context: &EffectContext) -> bool {
    context.has(MoveEffect::ChargeThenAttack)
        || context.has(MoveEffect::Underground)
        || context.has(MoveEffect::Flying)
}

fn charge_conditions(context: &EffectContext) -> Vec<BattleCondition> {
    let mut conditions = Vec::new();
    if context.has(MoveEffect::ChargeThenAttack) {
        conditions.push(BattleCondition::Charging);
    }
    if context.has(MoveEffect::Underground) {
        conditions.push(BattleCondition::Underground);
    }
    if context.has(MoveEffect::Flying) {
        conditions.push(BattleCondition::InAir);
    }
    conditions
}

/// First use: store the move and take position. The action ends here.
pub(super) fn begin_charge(context: &EffectContext) -> Vec<BattleCommand> {
    let mut commands = vec![BattleCommand::SetForcedMove {
        target: context.attacker,
        definition: Some(context.move_used.clone()),
    }];
    for condition in charge_conditions(context) {
        commands.push(BattleCommand::EmitEvent(BattleEvent::ConditionApplied {
            target: context.attacker,
            condition: condition.get_type(),
        }));
        commands.push(BattleCommand::AddCondition {
            target: context.attacker,
            condition,
        });
    }
    commands
}

/// Second use: clear the stored move and come out of hiding.
pub(super) fn finish_charge(context: &EffectContext) -> Vec<BattleCommand> {
    let mut commands = vec![BattleCommand::SetForcedMove {
        target: context.attacker,
        definition: None,
    }];
    for condition in charge_conditions(context) {
        commands.push(BattleCommand::RemoveCondition {
            target: context.attacker,
            condition_type: condition.get_type(),
        });
    }
    commands
}

/// Usage preconditions. Every declared one must hold.
pub(super) fn preconditions_met(context: &EffectContext, state: &BattleState) -> bool {
    let attacker_side = state.side(context.attacker);
    let defender_side = state.side(context.defender);

    if context.has(MoveEffect::RequiresHitByAttack)
        && attacker_side
            .last_damage_taken
            .map_or(true, |taken| taken.amount <= 0)
    {
        return false;
    }
    if context.has(MoveEffect::RequiresHitByCategory) {
        let required = MoveCategory::from_code(context.count(MoveEffect::RequiresHitByCategory));
        let matches = matches!(
            (attacker_side.last_damage_taken, required),
            (Some(taken), Some(required)) if taken.amount > 0 && taken.category == required
        );
        if !matches {
            return false;
        }
    }
    if context.has(MoveEffect::RequiresTargetAsleep)
        && defender_side.combatant.status != Status::Sleep
    {
        return false;
    }
    if context.has(MoveEffect::RequiresTargetUnderground)
        && !defender_side.has_condition(ConditionType::Underground)
    {
        return false;
    }
    if context.has(MoveEffect::RequiresTargetFlying)
        && !defender_side.has_condition(ConditionType::InAir)
    {
        return false;
    }
    true
}

/// Effects that apply whenever the move lands, independent of the
/// secondary-effect chance.
pub(super) fn apply_special_effects(context: &EffectContext, state: &BattleState) -> Vec<BattleCommand> {
    let mut commands = Vec::new();
    let attacker = context.attacker;
    let defender = context.defender;
    let user = state.combatant(attacker);
    let target = state.combatant(defender);

    if context.has(MoveEffect::TemporaryCritRatio) {
        commands.push(BattleCommand::SetCritRatio {
            target: attacker,
            value: user.current.critical_hit_ratio + context.value(MoveEffect::TemporaryCritRatio),
            permanent: false,
        });
    }
    if context.has(MoveEffect::PermanentCritRatio) {
        commands.push(BattleCommand::SetCritRatio {
            target: attacker,
            value: user.base.critical_hit_ratio + context.value(MoveEffect::PermanentCritRatio),
            permanent: true,
        });
    }
    if context.has(MoveEffect::ResetAllChanges) {
        for side in PlayerTarget::both() {
            commands.push(BattleCommand::ResetStats { target: side });
        }
        commands.push(BattleCommand::EmitEvent(BattleEvent::StatsReset));
    }
    if context.has(MoveEffect::LockStats) {
        commands.extend(add_condition(
            attacker,
            BattleCondition::StatsLocked {
                turns_remaining: STATS_LOCK_TURNS,
            },
        ));
    }
    if context.has(MoveEffect::TypeChange) && !target.is_fainted() {
        commands.push(BattleCommand::SetTypes {
            target: attacker,
            types: target.types.clone(),
        });
    }
    if context.has(MoveEffect::AttackDenial) {
        if let Some(last_move) = &state.side(defender).last_move {
            commands.extend(add_condition(
                defender,
                BattleCondition::Disabled {
                    move_name: last_move.clone(),
                    turns_remaining: context.count(MoveEffect::AttackDenial).max(1),
                },
            ));
        }
    }
    if context.has(MoveEffect::Trap) && !target.is_fainted() {
        commands.extend(add_condition(
            defender,
            BattleCondition::Trapped {
                turns_remaining: context.count(MoveEffect::Trap).max(1),
            },
        ));
    }
    if context.has(MoveEffect::MoneyGain) {
        let amount = (context.value(MoveEffect::MoneyGain) * user.level as f64).max(0.0) as u32;
        if amount > 0 {
            commands.push(BattleCommand::AddWinnings {
                target: attacker,
                amount,
            });
        }
    }
    if context.has(MoveEffect::HealPercent) {
        let amount = (user.max_hp() as f64 * context.value(MoveEffect::HealPercent) / 100.0) as i32;
        commands.push(BattleCommand::Heal {
            target: attacker,
            amount,
        });
    }
    if context.has(MoveEffect::Decoy) {
        commands.extend(apply_decoy_effect(context, state));
    }
    if context.has(MoveEffect::Transform) {
        commands.push(BattleCommand::CopyOpponent { target: attacker });
    }
    if context.has(MoveEffect::SleepSelf) && !user.is_fainted() {
        commands.push(BattleCommand::Heal {
            target: attacker,
            amount: user.max_hp(),
        });
        commands.push(BattleCommand::SetStatus {
            target: attacker,
            status: Status::Sleep,
            turns: context.count(MoveEffect::SleepSelf).max(1),
        });
    }
    if context.has(MoveEffect::LoseNextTurns) {
        commands.push(BattleCommand::AddCondition {
            target: attacker,
            condition: BattleCondition::Recharging {
                turns_remaining: context.count(MoveEffect::LoseNextTurns).max(1),
            },
        });
    }
    if context.has(MoveEffect::PhaseOut) {
        commands.extend(apply_phase_out_effect(context, state));
    }
    if context.has(MoveEffect::FaintSelf) {
        commands.push(BattleCommand::DealDamage {
            target: attacker,
            amount: user.current_hp(),
        });
    }
    commands
}

fn add_condition(target: PlayerTarget, condition: BattleCondition) -> Vec<BattleCommand> {
    vec![
        BattleCommand::EmitEvent(BattleEvent::ConditionApplied {
            target,
            condition: condition.get_type(),
        }),
        BattleCommand::AddCondition { target, condition },
    ]
}

/// Spend a share of max HP on a decoy with that much HP. Fails if the user
/// cannot afford it or already has one.
fn apply_decoy_effect(context: &EffectContext, state: &BattleState) -> Vec<BattleCommand> {
    let side = state.side(context.attacker);
    let cost = (side.combatant.max_hp() as f64 * context.value(MoveEffect::Decoy) / 100.0) as i32;
    if cost <= 0 || side.combatant.current_hp() <= cost || side.decoy_hp() > 0 {
        return vec![BattleCommand::EmitEvent(BattleEvent::ActionFailed {
            user: context.attacker,
            reason: ActionFailureReason::MoveFailed,
        })];
    }
    let mut commands = vec![BattleCommand::DealDamage {
        target: context.attacker,
        amount: cost,
    }];
    commands.extend(add_condition(
        context.attacker,
        BattleCondition::Decoy { hp: cost },
    ));
    commands
}

/// Send the affected side away, ending the battle. A trapped side stays.
fn apply_phase_out_effect(context: &EffectContext, state: &BattleState) -> Vec<BattleCommand> {
    let leaving = context.affected();
    if state.side(leaving).has_condition(ConditionType::Trapped) {
        return vec![BattleCommand::EmitEvent(BattleEvent::ActionFailed {
            user: context.attacker,
            reason: ActionFailureReason::MoveFailed,
        })];
    }
    let location = context.move_used.effects.location().to_string();
    vec![
        BattleCommand::EmitEvent(BattleEvent::Escaped {
            user: leaving,
            location: location.clone(),
        }),
        BattleCommand::EndBattle(BattleOutcome::Escaped {
            side: leaving,
            location,
        }),
    ]
}
