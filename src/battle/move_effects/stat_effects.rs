use super::EffectContext;
use crate::battle::commands::{BattleCommand, PlayerTarget};
use crate::battle::conditions::ConditionType;
use crate::battle::state::{BattleEvent, BattleState};
use crate::combatant::Combatant;
use schema::{CombatStat, ModifiedStat, MoveStat};

/// Raises and lowers carried by the move, applied to the affected side.
pub(super) fn apply_stat_modifiers(context: &EffectContext, state: &BattleState) -> Vec<BattleCommand> {
    let mut commands = Vec::new();
    let target = context.affected();
    let side = state.side(target);
    if side.combatant.is_fainted() {
        return commands;
    }
    let self_inflicted = target == context.attacker;
    let locked = side.has_condition(ConditionType::StatsLocked);

    for (effect, _) in context.move_used.effects.iter() {
        let Some((stat, sign)) = effect.stat_modifier() else {
            continue;
        };
        let amount = context.value(effect).abs().trunc() as i32;
        if amount == 0 {
            continue;
        }
        if sign < 0 && locked && !self_inflicted {
            commands.push(BattleCommand::EmitEvent(BattleEvent::StatChangeBlocked {
                target,
                stat,
            }));
            continue;
        }
        let change = amount * sign;
        match stat {
            ModifiedStat::Combat(stat) => {
                commands.extend(modify_combat_stat(&side.combatant, target, stat, change));
            }
            ModifiedStat::Move(stat) => {
                let move_index = if self_inflicted {
                    context.move_index
                } else {
                    side.combatant.selected_move
                };
                if let Some(move_index) = move_index {
                    commands.extend(modify_move_stat(&side.combatant, target, move_index, stat, change));
                }
            }
        }
    }
    commands
}

fn modify_combat_stat(
    combatant: &Combatant,
    target: PlayerTarget,
    stat: CombatStat,
    change: i32,
) -> Option<BattleCommand> {
    let present = combatant.current_stat(stat);
    let value = if change > 0 {
        // HP never exceeds its maximum.
        let cap = if stat == CombatStat::Hp {
            combatant.stat(stat)
        } else {
            combatant.stat(stat) * 2
        };
        (present + change).min(cap).max(present)
    } else {
        (present + change).max(1).min(present)
    };
    (value != present).then_some(BattleCommand::SetCurrentStat {
        target,
        stat,
        value,
    })
}

fn modify_move_stat(
    combatant: &Combatant,
    target: PlayerTarget,
    move_index: usize,
    stat: MoveStat,
    change: i32,
) -> Option<BattleCommand> {
    let instance = combatant.moves.get(move_index)?;
    let present = instance.current.get(stat);
    let max = instance.max.get(stat);
    let value = if change > 0 {
        let cap = if stat == MoveStat::Pp { max } else { max * 2 };
        (present + change).min(cap).max(present)
    } else {
        let floor = if stat == MoveStat::Pp { 0 } else { 1 };
        (present + change).max(floor).min(present)
    };
    (value != present).then_some(BattleCommand::SetMoveStat {
        target,
        move_index,
        stat,
        value,
    })
}
