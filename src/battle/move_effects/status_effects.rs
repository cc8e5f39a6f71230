use super::EffectContext;
use crate::battle::commands::BattleCommand;
use crate::battle::conditions::BattleCondition;
use crate::battle::state::{BattleEvent, BattleState};
use schema::{MoveEffect, Status};

/// Status infliction in effect-index order; the first listed status wins.
const INFLICTIONS: [(MoveEffect, Status); 7] = [
    (MoveEffect::Burn, Status::Burn),
    (MoveEffect::Freeze, Status::Freeze),
    (MoveEffect::Paralyze, Status::Paralysis),
    (MoveEffect::Poison, Status::Poison),
    (MoveEffect::Sleep, Status::Sleep),
    (MoveEffect::Bind, Status::Bound),
    (MoveEffect::Confuse, Status::Confusion),
];

pub(super) fn apply_status_effects(context: &EffectContext, state: &BattleState) -> Vec<BattleCommand> {
    let mut commands = Vec::new();
    let target = context.affected();
    let combatant = state.combatant(target);
    if combatant.is_fainted() {
        return commands;
    }

    if combatant.status == Status::Normal {
        if let Some((effect, status)) = INFLICTIONS
            .iter()
            .find(|(effect, _)| context.has(*effect))
        {
            // Counted statuses carry their duration; the rest ignore it.
            let turns = match status {
                Status::Sleep | Status::Bound | Status::Confusion => context.count(*effect).max(1),
                _ => 0,
            };
            commands.push(BattleCommand::SetStatus {
                target,
                status: *status,
                turns,
            });
        }
    }

    if context.has(MoveEffect::Flinch) && target != context.attacker {
        commands.push(BattleCommand::EmitEvent(BattleEvent::ConditionApplied {
            target,
            condition: BattleCondition::Flinched.get_type(),
        }));
        commands.push(BattleCommand::AddCondition {
            target,
            condition: BattleCondition::Flinched,
        });
    }
    commands
}
