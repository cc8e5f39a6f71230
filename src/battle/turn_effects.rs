//! Status and condition handling around an action: whether the actor may
//! act at all, and what its statuses cost it afterwards.

use crate::battle::calculators::confusion_damage;
use crate::battle::commands::{execute_command_batch, BattleCommand, PlayerTarget};
use crate::battle::conditions::{BattleCondition, ConditionType};
use crate::battle::state::{ActionFailureReason, BattleEvent, BattleState, EventBus, TurnRng};
use crate::errors::EngineResult;
use schema::{CombatStat, Status};

pub const THAW_CHANCE: f64 = 0.2;
pub const FULL_PARALYSIS_CHANCE: f64 = 0.25;
pub const CONFUSION_SELF_HIT_CHANCE: f64 = 1.0 / 3.0;

fn prevented(actor: PlayerTarget, reason: ActionFailureReason) -> BattleCommand {
    BattleCommand::EmitEvent(BattleEvent::ActionFailed {
        user: actor,
        reason,
    })
}

fn fraction_of_max_hp(state: &BattleState, target: PlayerTarget, divisor: i32) -> i32 {
    (state.combatant(target).max_hp() / divisor).max(1)
}

/// Runs the start-of-action checks for `actor`. Returns false when the
/// action is lost.
pub fn check_action_prevention(
    state: &mut BattleState,
    bus: &mut EventBus,
    rng: &mut TurnRng,
    actor: PlayerTarget,
) -> EngineResult<bool> {
    let (commands, can_act) = prevention_commands(state, rng, actor);
    execute_command_batch(commands, state, bus)?;
    Ok(can_act)
}

fn prevention_commands(
    state: &BattleState,
    rng: &mut TurnRng,
    actor: PlayerTarget,
) -> (Vec<BattleCommand>, bool) {
    let side = state.side(actor);
    let mut commands = Vec::new();

    if let Some(BattleCondition::Recharging { turns_remaining }) =
        side.get_condition(ConditionType::Recharging)
    {
        if *turns_remaining <= 1 {
            commands.push(BattleCommand::RemoveCondition {
                target: actor,
                condition_type: ConditionType::Recharging,
            });
        } else {
            commands.push(BattleCommand::AddCondition {
                target: actor,
                condition: BattleCondition::Recharging {
                    turns_remaining: turns_remaining - 1,
                },
            });
        }
        commands.push(prevented(actor, ActionFailureReason::IsRecharging));
        return (commands, false);
    }

    if side.has_condition(ConditionType::Flinched) {
        commands.push(BattleCommand::RemoveCondition {
            target: actor,
            condition_type: ConditionType::Flinched,
        });
        commands.push(prevented(actor, ActionFailureReason::IsFlinching));
        return (commands, false);
    }

    let turns = side.status_turns;
    match side.combatant.status {
        Status::Sleep => {
            if turns == 0 {
                commands.push(BattleCommand::SetStatus {
                    target: actor,
                    status: Status::Normal,
                    turns: 0,
                });
                return (commands, true);
            }
            commands.push(BattleCommand::SetStatusTurns {
                target: actor,
                turns: turns - 1,
            });
            commands.push(prevented(actor, ActionFailureReason::IsAsleep));
            (commands, false)
        }
        Status::Freeze => {
            if rng.chance(THAW_CHANCE, "thaw") {
                commands.push(BattleCommand::SetStatus {
                    target: actor,
                    status: Status::Normal,
                    turns: 0,
                });
                return (commands, true);
            }
            commands.push(prevented(actor, ActionFailureReason::IsFrozen));
            (commands, false)
        }
        Status::Paralysis => {
            if rng.chance(FULL_PARALYSIS_CHANCE, "full paralysis") {
                commands.push(prevented(actor, ActionFailureReason::IsParalyzed));
                return (commands, false);
            }
            (commands, true)
        }
        Status::Bound => {
            if turns == 0 {
                commands.push(BattleCommand::SetStatus {
                    target: actor,
                    status: Status::Normal,
                    turns: 0,
                });
                return (commands, true);
            }
            let damage = fraction_of_max_hp(state, actor, 16);
            commands.push(BattleCommand::SetStatusTurns {
                target: actor,
                turns: turns - 1,
            });
            commands.push(prevented(actor, ActionFailureReason::IsBound));
            commands.push(BattleCommand::EmitEvent(BattleEvent::StatusDamage {
                target: actor,
                status: Status::Bound,
                damage,
            }));
            commands.push(BattleCommand::DealDamage {
                target: actor,
                amount: damage,
            });
            (commands, false)
        }
        Status::Confusion => {
            if turns == 0 {
                commands.push(BattleCommand::SetStatus {
                    target: actor,
                    status: Status::Normal,
                    turns: 0,
                });
                return (commands, true);
            }
            commands.push(BattleCommand::SetStatusTurns {
                target: actor,
                turns: turns - 1,
            });
            if rng.chance(CONFUSION_SELF_HIT_CHANCE, "confusion self-hit") {
                let combatant = &side.combatant;
                let damage = confusion_damage(
                    combatant.level,
                    combatant.current_stat(CombatStat::Attack),
                    combatant.current_stat(CombatStat::Defense),
                );
                commands.push(BattleCommand::EmitEvent(BattleEvent::HurtInConfusion {
                    user: actor,
                    damage,
                }));
                commands.push(BattleCommand::DealDamage {
                    target: actor,
                    amount: damage,
                });
                return (commands, false);
            }
            (commands, true)
        }
        _ => (commands, true),
    }
}

/// Residual damage and condition countdowns after `actor`'s action.
pub fn end_of_action(
    state: &mut BattleState,
    bus: &mut EventBus,
    actor: PlayerTarget,
) -> EngineResult<()> {
    let commands = end_of_action_commands(state, actor);
    execute_command_batch(commands, state, bus)
}

fn end_of_action_commands(state: &BattleState, actor: PlayerTarget) -> Vec<BattleCommand> {
    let side = state.side(actor);
    let mut commands = Vec::new();

    if !side.combatant.is_fainted() {
        let status = side.combatant.status;
        if matches!(status, Status::Poison | Status::Burn) {
            let damage = fraction_of_max_hp(state, actor, 8);
            commands.push(BattleCommand::EmitEvent(BattleEvent::StatusDamage {
                target: actor,
                status,
                damage,
            }));
            commands.push(BattleCommand::DealDamage {
                target: actor,
                amount: damage,
            });
        }
        if side.has_condition(ConditionType::Lingering) {
            commands.push(BattleCommand::DealDamage {
                target: actor,
                amount: fraction_of_max_hp(state, actor, 16),
            });
        }
    }

    commands.push(BattleCommand::TickConditions { target: actor });
    commands
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::battle::tests::common::{create_test_battle, TestCombatantBuilder};
    use pretty_assertions::assert_eq;

    fn battle_with_status(status: Status, turns: u32) -> BattleState {
        let p1 = TestCombatantBuilder::new("SNORLAX")
            .with_hp(80)
            .with_status(status)
            .build();
        let p2 = TestCombatantBuilder::new("GENGAR").build();
        let mut state = create_test_battle(p1, p2);
        state.side_mut(PlayerTarget::Player1).status_turns = turns;
        state
    }

    #[test]
    fn test_sleeping_side_counts_down_then_wakes() {
        let mut state = battle_with_status(Status::Sleep, 1);
        let mut bus = EventBus::new();
        let mut rng = TurnRng::new_for_test(vec![]);

        let acted = check_action_prevention(&mut state, &mut bus, &mut rng, PlayerTarget::Player1).unwrap();
        assert!(!acted);
        assert_eq!(state.side(PlayerTarget::Player1).status_turns, 0);

        let acted = check_action_prevention(&mut state, &mut bus, &mut rng, PlayerTarget::Player1).unwrap();
        assert!(acted);
        assert_eq!(state.combatant(PlayerTarget::Player1).status, Status::Normal);
        assert!(bus.events().contains(&BattleEvent::StatusCured {
            target: PlayerTarget::Player1,
            status: Status::Sleep,
        }));
    }

    #[test]
    fn test_freeze_thaws_on_low_draw() {
        let mut state = battle_with_status(Status::Freeze, 0);
        let mut bus = EventBus::new();

        let mut stays = TurnRng::new_for_test(vec![0.5]);
        assert!(!check_action_prevention(&mut state, &mut bus, &mut stays, PlayerTarget::Player1).unwrap());

        let mut thaws = TurnRng::new_for_test(vec![0.1]);
        assert!(check_action_prevention(&mut state, &mut bus, &mut thaws, PlayerTarget::Player1).unwrap());
        assert_eq!(state.combatant(PlayerTarget::Player1).status, Status::Normal);
    }

    #[test]
    fn test_bound_side_takes_sixteenth_and_skips() {
        let mut state = battle_with_status(Status::Bound, 2);
        let mut bus = EventBus::new();
        let mut rng = TurnRng::new_for_test(vec![]);

        let acted = check_action_prevention(&mut state, &mut bus, &mut rng, PlayerTarget::Player1).unwrap();
        assert!(!acted);
        assert_eq!(state.combatant(PlayerTarget::Player1).current_hp(), 75);
        assert_eq!(state.side(PlayerTarget::Player1).status_turns, 1);
    }

    #[test]
    fn test_confused_side_hurts_itself() {
        let mut state = battle_with_status(Status::Confusion, 3);
        let mut bus = EventBus::new();
        let mut rng = TurnRng::new_for_test(vec![0.1]);

        let acted = check_action_prevention(&mut state, &mut bus, &mut rng, PlayerTarget::Player1).unwrap();
        assert!(!acted);
        assert!(state.combatant(PlayerTarget::Player1).current_hp() < 80);
        assert!(matches!(
            bus.events().first(),
            Some(BattleEvent::HurtInConfusion { user: PlayerTarget::Player1, .. })
        ));
    }

    #[test]
    fn test_recharging_skips_once() {
        let mut state = battle_with_status(Status::Normal, 0);
        state
            .side_mut(PlayerTarget::Player1)
            .add_condition(BattleCondition::Recharging { turns_remaining: 1 });
        let mut bus = EventBus::new();
        let mut rng = TurnRng::new_for_test(vec![]);

        assert!(!check_action_prevention(&mut state, &mut bus, &mut rng, PlayerTarget::Player1).unwrap());
        assert!(check_action_prevention(&mut state, &mut bus, &mut rng, PlayerTarget::Player1).unwrap());
    }

    #[test]
    fn test_poison_deals_eighth_after_action() {
        let mut state = battle_with_status(Status::Poison, 0);
        let mut bus = EventBus::new();

        end_of_action(&mut state, &mut bus, PlayerTarget::Player1).unwrap();
        assert_eq!(state.combatant(PlayerTarget::Player1).current_hp(), 70);
    }

    #[test]
    fn test_conditions_tick_after_action() {
        let mut state = battle_with_status(Status::Normal, 0);
        state
            .side_mut(PlayerTarget::Player1)
            .add_condition(BattleCondition::Trapped { turns_remaining: 1 });
        let mut bus = EventBus::new();

        end_of_action(&mut state, &mut bus, PlayerTarget::Player1).unwrap();
        assert!(!state
            .side(PlayerTarget::Player1)
            .has_condition(ConditionType::Trapped));
        assert_eq!(
            bus.events(),
            &[BattleEvent::ConditionExpired {
                target: PlayerTarget::Player1,
                condition: ConditionType::Trapped,
            }]
        );
    }
}
