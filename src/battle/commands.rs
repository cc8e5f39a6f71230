use crate::battle::conditions::{BattleCondition, ConditionType};
use crate::battle::side::DamageTaken;
use crate::battle::state::{BattleEvent, BattleOutcome, BattleState, EventBus};
use crate::errors::{BattleError, EngineResult};
use crate::move_data::MoveDefinition;
use schema::{CombatStat, ModifiedStat, MoveCategory, MoveStat, PokemonType, Status};
use serde::{Deserialize, Serialize};
use std::fmt;

/// Player target for commands - provides type safety over raw indices
#[derive(Serialize, Deserialize, Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum PlayerTarget {
    Player1,
    Player2,
}

impl PlayerTarget {
    pub fn to_index(self) -> usize {
        match self {
            PlayerTarget::Player1 => 0,
            PlayerTarget::Player2 => 1,
        }
    }

    pub fn opponent(self) -> PlayerTarget {
        match self {
            PlayerTarget::Player1 => PlayerTarget::Player2,
            PlayerTarget::Player2 => PlayerTarget::Player1,
        }
    }

    pub fn both() -> [PlayerTarget; 2] {
        [PlayerTarget::Player1, PlayerTarget::Player2]
    }
}

impl fmt::Display for PlayerTarget {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            PlayerTarget::Player1 => write!(f, "Player 1"),
            PlayerTarget::Player2 => write!(f, "Player 2"),
        }
    }
}

/// Atomic commands representing final state changes
#[derive(Debug, Clone, PartialEq)]
pub enum BattleCommand {
    // Combatant modifications
    DealDamage {
        target: PlayerTarget,
        amount: i32,
    },
    Heal {
        target: PlayerTarget,
        amount: i32,
    },
    SetStatus {
        target: PlayerTarget,
        status: Status,
        turns: u32,
    },
    SetStatusTurns {
        target: PlayerTarget,
        turns: u32,
    },
    SetCurrentStat {
        target: PlayerTarget,
        stat: CombatStat,
        value: i32,
    },
    SetMoveStat {
        target: PlayerTarget,
        move_index: usize,
        stat: MoveStat,
        value: i32,
    },
    SetCritRatio {
        target: PlayerTarget,
        value: f64,
        permanent: bool,
    },
    SetTypes {
        target: PlayerTarget,
        types: Vec<PokemonType>,
    },
    /// Copy the opponent's non-HP current stats and types.
    CopyOpponent {
        target: PlayerTarget,
    },
    ResetStats {
        target: PlayerTarget,
    },
    UsePp {
        target: PlayerTarget,
        move_index: usize,
    },

    // Side state changes
    AddCondition {
        target: PlayerTarget,
        condition: BattleCondition,
    },
    RemoveCondition {
        target: PlayerTarget,
        condition_type: ConditionType,
    },
    /// Reduce the decoy's HP, removing it once it reaches 0.
    DamageDecoy {
        target: PlayerTarget,
        amount: i32,
    },
    /// Count down timed conditions and report the ones that ran out.
    TickConditions {
        target: PlayerTarget,
    },
    SetForcedMove {
        target: PlayerTarget,
        definition: Option<MoveDefinition>,
    },
    SetLastMove {
        target: PlayerTarget,
        move_name: String,
    },
    RecordDamageTaken {
        target: PlayerTarget,
        amount: i32,
        category: MoveCategory,
    },
    AddWinnings {
        target: PlayerTarget,
        amount: u32,
    },

    // Battle flow
    EndBattle(BattleOutcome),
    EmitEvent(BattleEvent),
}

pub fn execute_command_batch(
    commands: Vec<BattleCommand>,
    state: &mut BattleState,
    bus: &mut EventBus,
) -> EngineResult<()> {
    for command in commands {
        execute_command(command, state, bus)?;
    }
    Ok(())
}

fn execute_deal_damage_command(
    target: PlayerTarget,
    amount: i32,
    state: &mut BattleState,
    bus: &mut EventBus,
) {
    let combatant = state.combatant_mut(target);
    if combatant.is_fainted() || amount <= 0 {
        return;
    }
    let fainted = combatant.take_damage(amount);
    bus.push(BattleEvent::DamageDealt {
        target,
        damage: amount,
        remaining_hp: combatant.current_hp(),
    });
    if fainted {
        bus.push(BattleEvent::Fainted { target });
    }
}

fn execute_command(
    command: BattleCommand,
    state: &mut BattleState,
    bus: &mut EventBus,
) -> EngineResult<()> {
    match command {
        BattleCommand::EmitEvent(event) => {
            bus.push(event);
        }
        BattleCommand::DealDamage { target, amount } => {
            execute_deal_damage_command(target, amount, state, bus);
        }
        BattleCommand::Heal { target, amount } => {
            let combatant = state.combatant_mut(target);
            let healed = combatant.heal(amount);
            if healed > 0 {
                bus.push(BattleEvent::Healed {
                    target,
                    amount: healed,
                    new_hp: combatant.current_hp(),
                });
            }
        }
        BattleCommand::SetStatus {
            target,
            status,
            turns,
        } => {
            let side = state.side_mut(target);
            let previous = side.combatant.status;
            side.combatant.set_status(status);
            side.status_turns = turns;
            if status == Status::Normal {
                if previous != Status::Normal {
                    bus.push(BattleEvent::StatusCured {
                        target,
                        status: previous,
                    });
                }
            } else {
                bus.push(BattleEvent::StatusApplied { target, status });
            }
        }
        BattleCommand::SetStatusTurns { target, turns } => {
            state.side_mut(target).status_turns = turns;
        }
        BattleCommand::SetCurrentStat {
            target,
            stat,
            value,
        } => {
            let combatant = state.combatant_mut(target);
            let old_value = combatant.current_stat(stat);
            combatant.set_current_stat(stat, value);
            let new_value = combatant.current_stat(stat);
            if new_value != old_value {
                bus.push(BattleEvent::StatChanged {
                    target,
                    stat: ModifiedStat::Combat(stat),
                    old_value,
                    new_value,
                });
            }
            if stat == CombatStat::Hp && old_value > 0 && new_value == 0 {
                bus.push(BattleEvent::Fainted { target });
            }
        }
        BattleCommand::SetMoveStat {
            target,
            move_index,
            stat,
            value,
        } => {
            let combatant = state.combatant_mut(target);
            let known = combatant.moves.len();
            let instance = combatant
                .moves
                .get_mut(move_index)
                .ok_or(BattleError::InvalidMoveSlot {
                    slot: move_index,
                    known,
                })?;
            let old_value = instance.current.get(stat);
            instance.current.set(stat, value);
            if value != old_value {
                bus.push(BattleEvent::StatChanged {
                    target,
                    stat: ModifiedStat::Move(stat),
                    old_value,
                    new_value: value,
                });
            }
        }
        BattleCommand::SetCritRatio {
            target,
            value,
            permanent,
        } => {
            let combatant = state.combatant_mut(target);
            combatant.current.critical_hit_ratio = value;
            if permanent {
                combatant.base.critical_hit_ratio = value;
            }
            bus.push(BattleEvent::CritRatioChanged {
                target,
                new_ratio: value,
            });
        }
        BattleCommand::SetTypes { target, types } => {
            state.combatant_mut(target).types = types.clone();
            bus.push(BattleEvent::TypesChanged { target, types });
        }
        BattleCommand::CopyOpponent { target } => {
            let (user, opponent) = state.pair_mut(target);
            let hp = user.current.hp;
            user.current = opponent.current;
            user.current.hp = hp;
            user.types = opponent.types.clone();
            bus.push(BattleEvent::Transformed { user: target });
        }
        BattleCommand::ResetStats { target } => {
            state.combatant_mut(target).reset_battle_stats();
        }
        BattleCommand::UsePp { target, move_index } => {
            let combatant = state.combatant_mut(target);
            let known = combatant.moves.len();
            let instance = combatant
                .moves
                .get_mut(move_index)
                .ok_or(BattleError::InvalidMoveSlot {
                    slot: move_index,
                    known,
                })?;
            instance.use_pp();
        }
        BattleCommand::AddCondition { target, condition } => {
            state.side_mut(target).add_condition(condition);
        }
        BattleCommand::DamageDecoy { target, amount } => {
            let side = state.side_mut(target);
            let remaining = side.decoy_hp() - amount;
            bus.push(BattleEvent::DecoyAbsorbed {
                target,
                damage: amount,
            });
            if remaining > 0 {
                side.add_condition(BattleCondition::Decoy { hp: remaining });
            } else {
                side.remove_condition(ConditionType::Decoy);
                bus.push(BattleEvent::ConditionExpired {
                    target,
                    condition: ConditionType::Decoy,
                });
            }
        }
        BattleCommand::TickConditions { target } => {
            for condition in state.side_mut(target).tick_conditions() {
                bus.push(BattleEvent::ConditionExpired { target, condition });
            }
        }
        BattleCommand::RemoveCondition {
            target,
            condition_type,
        } => {
            state.side_mut(target).remove_condition(condition_type);
        }
        BattleCommand::SetForcedMove { target, definition } => {
            state.side_mut(target).forced_move = definition;
        }
        BattleCommand::SetLastMove { target, move_name } => {
            state.side_mut(target).last_move = Some(move_name);
        }
        BattleCommand::RecordDamageTaken {
            target,
            amount,
            category,
        } => {
            state.side_mut(target).last_damage_taken = Some(DamageTaken { amount, category });
        }
        BattleCommand::AddWinnings { target, amount } => {
            state.side_mut(target).winnings += amount;
            bus.push(BattleEvent::WinningsGained {
                user: target,
                amount,
            });
        }
        BattleCommand::EndBattle(outcome) => {
            if state.outcome.is_none() {
                state.outcome = Some(outcome);
            }
        }
    }
    Ok(())
}
