// Move effect resolution for the Attack step.
//
// Each helper reads the current `BattleState` and returns the commands it
// wants executed. `resolve_attack` runs them step by step so later steps
// see the state earlier steps produced.

mod damage_effects;
mod special_effects;
mod stat_effects;
mod status_effects;

use self::{damage_effects::*, special_effects::*, stat_effects::*, status_effects::*};
use crate::battle::commands::{execute_command_batch, BattleCommand, PlayerTarget};
use crate::battle::state::{ActionFailureReason, BattleEvent, BattleState, EventBus, TurnRng};
use crate::catalog::MoveCatalog;
use crate::config::BattleConfig;
use crate::errors::EngineResult;
use crate::move_data::MoveDefinition;
use schema::{MoveEffect, PokemonType};

#[derive(Debug, Clone)]
pub struct EffectContext {
    pub attacker: PlayerTarget,
    pub defender: PlayerTarget,
    pub move_used: MoveDefinition,
    /// Slot in the attacker's move list. `None` for Struggle, forced and
    /// substituted moves.
    pub move_index: Option<usize>,
    pub power: i32,
    pub accuracy: i32,
}

impl EffectContext {
    pub fn new(
        attacker: PlayerTarget,
        move_used: MoveDefinition,
        move_index: Option<usize>,
        power: i32,
        accuracy: i32,
    ) -> Self {
        Self {
            attacker,
            defender: attacker.opponent(),
            move_used,
            move_index,
            power,
            accuracy,
        }
    }

    /// Context for a move taken straight from its definition.
    pub fn from_definition(attacker: PlayerTarget, move_used: MoveDefinition) -> Self {
        let (power, accuracy) = (move_used.power, move_used.accuracy);
        Self::new(attacker, move_used, None, power, accuracy)
    }

    pub fn has(&self, effect: MoveEffect) -> bool {
        self.move_used.effects.has(effect)
    }

    pub fn value(&self, effect: MoveEffect) -> f64 {
        self.move_used.effects.value(effect)
    }

    pub fn count(&self, effect: MoveEffect) -> u32 {
        self.move_used.effects.count(effect)
    }

    pub fn is_self_only(&self) -> bool {
        self.has(MoveEffect::SelfOnly)
    }

    /// The side status and stat effects land on.
    pub fn affected(&self) -> PlayerTarget {
        if self.has(MoveEffect::AffectsSelf) || self.is_self_only() {
            self.attacker
        } else {
            self.defender
        }
    }
}

/// What the Attack step produced, used to pick the next phase.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct AttackSummary {
    pub executed: bool,
    pub hit: bool,
    pub damage: i32,
    pub critical: bool,
    pub effectiveness: f64,
    pub secondary_changed: bool,
    /// Self-only moves never roll to hit.
    pub self_only: bool,
}

impl Default for AttackSummary {
    fn default() -> Self {
        Self {
            executed: false,
            hit: false,
            damage: 0,
            critical: false,
            effectiveness: 1.0,
            secondary_changed: false,
            self_only: false,
        }
    }
}

fn run(commands: Vec<BattleCommand>, state: &mut BattleState, bus: &mut EventBus) -> EngineResult<()> {
    execute_command_batch(commands, state, bus)
}

fn fail(user: PlayerTarget, reason: ActionFailureReason) -> Vec<BattleCommand> {
    vec![BattleCommand::EmitEvent(BattleEvent::ActionFailed { user, reason })]
}

/// Resolve one attack by `attacker` with the move in `move_index`.
pub fn resolve_attack(
    state: &mut BattleState,
    bus: &mut EventBus,
    rng: &mut TurnRng,
    attacker: PlayerTarget,
    move_index: usize,
    moves: &MoveCatalog,
    config: &BattleConfig,
) -> EngineResult<AttackSummary> {
    let mut summary = AttackSummary::default();

    // 1. Move choice, PP and substitution.
    let choice = choose_move(state, attacker, move_index, config)?;
    run(choice.commands, state, bus)?;
    let Some(mut context) = choice.context else {
        return Ok(summary);
    };
    if context.has(MoveEffect::RandomMove) || context.has(MoveEffect::CopyLastMove) {
        match substitute_move(&context, state, rng, moves) {
            Some(substitute) => {
                run(
                    vec![BattleCommand::EmitEvent(BattleEvent::MoveUsed {
                        user: attacker,
                        move_name: substitute.move_used.name.clone(),
                    })],
                    state,
                    bus,
                )?;
                context = substitute;
            }
            None => {
                run(fail(attacker, ActionFailureReason::MoveFailed), state, bus)?;
                return Ok(summary);
            }
        }
    }
    run(
        vec![BattleCommand::SetLastMove {
            target: attacker,
            move_name: context.move_used.name.clone(),
        }],
        state,
        bus,
    )?;
    summary.executed = true;
    summary.self_only = context.is_self_only();

    // 2. Charge and semi-invulnerable moves.
    if is_charge_move(&context) {
        if choice.forced {
            run(finish_charge(&context), state, bus)?;
        } else {
            run(begin_charge(&context), state, bus)?;
            return Ok(summary);
        }
    }

    // 3. Preconditions.
    if !preconditions_met(&context, state) {
        run(fail(attacker, ActionFailureReason::MoveFailed), state, bus)?;
        return Ok(summary);
    }

    // 4. Self-only moves skip the hit check and damage.
    if !context.is_self_only() {
        // 5. Hit check.
        let defender_types = state.combatant(context.defender).types.clone();
        let effectiveness =
            PokemonType::effectiveness_against(context.move_used.move_type, &defender_types);
        if !check_hit(&context, state, rng, effectiveness) {
            let mut commands = vec![BattleCommand::EmitEvent(BattleEvent::MoveMissed {
                user: attacker,
            })];
            commands.extend(apply_miss_effects(&context, state));
            run(commands, state, bus)?;
            return Ok(summary);
        }
        summary.hit = true;

        // 6. Damage.
        if deals_damage(&context) {
            if effectiveness == 0.0 {
                summary.effectiveness = 0.0;
                run(
                    vec![BattleCommand::EmitEvent(BattleEvent::AttackTypeEffectiveness {
                        multiplier: 0.0,
                    })],
                    state,
                    bus,
                )?;
                return Ok(summary);
            }
            let Some(outcome) = resolve_damage(&context, state, bus, rng, effectiveness)? else {
                run(fail(attacker, ActionFailureReason::MoveFailed), state, bus)?;
                return Ok(summary);
            };
            summary.damage = outcome.damage;
            summary.critical = outcome.critical;
            summary.effectiveness = outcome.effectiveness;

            // 7. Damage-linked effects.
            run(apply_damage_based_effects(&context, state, outcome.damage), state, bus)?;
        }
    }

    // 8. Secondary effects.
    let events_before = bus.len();
    let has_gated = context
        .move_used
        .effects
        .iter()
        .any(|(effect, _)| effect.is_secondary());
    if has_gated && secondary_chance_passes(&context, rng) {
        run(apply_status_effects(&context, state), state, bus)?;
        run(apply_stat_modifiers(&context, state), state, bus)?;
    }
    run(apply_special_effects(&context, state), state, bus)?;
    summary.secondary_changed = bus.len() > events_before;

    Ok(summary)
}

fn secondary_chance_passes(context: &EffectContext, rng: &mut TurnRng) -> bool {
    if !context.has(MoveEffect::PercentChance) {
        return true;
    }
    rng.chance(
        context.value(MoveEffect::PercentChance) / 100.0,
        "secondary effect chance",
    )
}
