//! The per-action state machine.
//!
//! `Battle::submit` takes the active side through
//! `ChooseAction -> {Attack | UseItem} -> ApplyEffect? -> ShowResult ->
//! (AwardExperience -> End)?` in one synchronous call and returns everything
//! that happened along the way.

use crate::battle::commands::{execute_command_batch, BattleCommand, PlayerTarget};
use crate::battle::item_effects::{resolve_item, ItemOutcome, ItemUse, ResolveContext};
use crate::battle::move_effects::{resolve_attack, AttackSummary};
use crate::battle::side::BattleSide;
use crate::battle::state::{
    BattleEvent, BattleOutcome, BattleState, EventBus, PlayerAction, TurnPhase, TurnRng,
};
use crate::battle::turn_effects::{check_action_prevention, end_of_action};
use crate::catalog::{ItemCatalog, MoveCatalog};
use crate::combatant::Combatant;
use crate::config::{BattleConfig, FailedItemPolicy};
use crate::errors::{BattleError, EngineResult};
use crate::item_data::ItemDefinition;
use crate::progression::{award_experience, battle_reward};
use serde::{Deserialize, Serialize};
use tracing::{debug, info};

/// Everything one `submit` call produced.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
pub struct TurnReport {
    pub actor: PlayerTarget,
    pub phases: Vec<TurnPhase>,
    pub events: Vec<BattleEvent>,
    /// False when a rejected item left the same side to choose again.
    pub turn_passed: bool,
    pub outcome: Option<BattleOutcome>,
}

pub struct Battle<'a> {
    config: &'a BattleConfig,
    moves: &'a MoveCatalog,
    items: &'a ItemCatalog,
    state: BattleState,
    rng: TurnRng,
}

impl<'a> Battle<'a> {
    pub fn new(
        config: &'a BattleConfig,
        moves: &'a MoveCatalog,
        items: &'a ItemCatalog,
        player1: Combatant,
        player2: Combatant,
        rng: TurnRng,
    ) -> Self {
        let state = BattleState::new(player1, player2);
        info!(
            player1 = %state.combatant(PlayerTarget::Player1).name,
            player2 = %state.combatant(PlayerTarget::Player2).name,
            first = %state.active,
            "battle started"
        );
        Self {
            config,
            moves,
            items,
            state,
            rng,
        }
    }

    pub fn phase(&self) -> TurnPhase {
        self.state.phase
    }

    /// The side whose action is next.
    pub fn active(&self) -> PlayerTarget {
        self.state.active
    }

    pub fn turn_number(&self) -> u32 {
        self.state.turn_number
    }

    pub fn side(&self, target: PlayerTarget) -> &BattleSide {
        self.state.side(target)
    }

    pub fn outcome(&self) -> Option<&BattleOutcome> {
        self.state.outcome.as_ref()
    }

    pub fn is_over(&self) -> bool {
        self.state.outcome.is_some()
    }

    pub fn state(&self) -> &BattleState {
        &self.state
    }

    /// User-visible lines for a report's events.
    pub fn format_events(&self, report: &TurnReport) -> Vec<String> {
        report
            .events
            .iter()
            .filter_map(|event| event.format(&self.state))
            .collect()
    }

    /// Hand the combatants back, for persisting after the battle.
    pub fn into_combatants(self) -> (Combatant, Combatant) {
        let [one, two] = self.state.sides;
        (one.combatant, two.combatant)
    }

    /// Resolve one action for the active side.
    pub fn submit(&mut self, action: PlayerAction) -> EngineResult<TurnReport> {
        if self.is_over() {
            return Err(BattleError::BattleOver.into());
        }
        let actor = self.state.active;
        let item = self.validate(actor, &action)?;

        let mut bus = EventBus::new();
        let mut phases = Vec::new();
        bus.push(BattleEvent::TurnStarted {
            turn_number: self.state.turn_number,
            actor,
        });
        self.enter(TurnPhase::ChooseAction, &mut phases, &mut bus);

        let turn_passed = match (&action, item) {
            (PlayerAction::Attack { move_index }, _) => {
                self.run_attack(actor, *move_index, &mut phases, &mut bus)?;
                true
            }
            (PlayerAction::UseItem { move_index, .. }, Some(item)) => {
                self.run_item(actor, item, *move_index, &mut phases, &mut bus)?
            }
            (PlayerAction::UseItem { item, .. }, None) => {
                return Err(BattleError::ItemNotHeld(item.clone()).into());
            }
        };

        self.enter(TurnPhase::ShowResult, &mut phases, &mut bus);
        if turn_passed && !self.is_over() {
            end_of_action(&mut self.state, &mut bus, actor)?;
        }
        self.resolve_fainting(&mut phases, &mut bus)?;

        if self.is_over() {
            self.finish(&mut phases, &mut bus);
        } else {
            if turn_passed {
                self.state.active = actor.opponent();
                self.state.turn_number += 1;
            }
            self.state.phase = TurnPhase::ChooseAction;
        }

        Ok(TurnReport {
            actor,
            phases,
            events: bus.into_events(),
            turn_passed,
            outcome: self.state.outcome.clone(),
        })
    }

    /// Reject malformed actions before anything is mutated.
    fn validate(&self, actor: PlayerTarget, action: &PlayerAction) -> EngineResult<Option<&'a ItemDefinition>> {
        let combatant = self.state.combatant(actor);
        match action {
            PlayerAction::Attack { move_index } => {
                if self.state.side(actor).forced_move.is_none() && *move_index >= combatant.moves.len() {
                    return Err(BattleError::InvalidMoveSlot {
                        slot: *move_index,
                        known: combatant.moves.len(),
                    }
                    .into());
                }
                Ok(None)
            }
            PlayerAction::UseItem { item, move_index } => {
                let definition = self.items.get(item)?;
                if combatant.item_quantity(&definition.name) == 0 {
                    return Err(BattleError::ItemNotHeld(definition.name.clone()).into());
                }
                let target = if definition.flags.affects_self {
                    combatant
                } else {
                    self.state.combatant(actor.opponent())
                };
                if let Some(index) = move_index {
                    if *index >= target.moves.len() {
                        return Err(BattleError::InvalidMoveSlot {
                            slot: *index,
                            known: target.moves.len(),
                        }
                        .into());
                    }
                }
                Ok(Some(definition))
            }
        }
    }

    fn enter(&mut self, phase: TurnPhase, phases: &mut Vec<TurnPhase>, bus: &mut EventBus) {
        debug!(turn = self.state.turn_number, ?phase, "phase entered");
        self.state.phase = phase;
        phases.push(phase);
        bus.push(BattleEvent::PhaseEntered { phase });
    }

    fn run_attack(
        &mut self,
        actor: PlayerTarget,
        move_index: usize,
        phases: &mut Vec<TurnPhase>,
        bus: &mut EventBus,
    ) -> EngineResult<()> {
        if self.state.side(actor).forced_move.is_none() {
            self.state.combatant_mut(actor).select_move(move_index)?;
        }
        self.enter(TurnPhase::Attack, phases, bus);

        let summary = if check_action_prevention(&mut self.state, bus, &mut self.rng, actor)? {
            resolve_attack(
                &mut self.state,
                bus,
                &mut self.rng,
                actor,
                move_index,
                self.moves,
                self.config,
            )?
        } else {
            AttackSummary::default()
        };

        if self.needs_effect_phase(actor, &summary) {
            self.enter(TurnPhase::ApplyEffect, phases, bus);
        }
        Ok(())
    }

    fn needs_effect_phase(&self, actor: PlayerTarget, summary: &AttackSummary) -> bool {
        // A miss goes straight to the result.
        if !summary.executed || !(summary.hit || summary.self_only) {
            return false;
        }
        summary.effectiveness != 1.0
            || summary.critical
            || summary.secondary_changed
            || self.state.combatant(actor.opponent()).status.is_afflicted()
    }

    /// Returns whether the turn passes to the other side.
    fn run_item(
        &mut self,
        actor: PlayerTarget,
        item: &ItemDefinition,
        move_index: Option<usize>,
        phases: &mut Vec<TurnPhase>,
        bus: &mut EventBus,
    ) -> EngineResult<bool> {
        self.enter(TurnPhase::UseItem, phases, bus);
        let target = if item.flags.affects_self {
            actor
        } else {
            actor.opponent()
        };
        let previous_item = self.state.combatant(actor).selected_item.clone();
        let previous_move = self.state.combatant(target).selected_move;
        self.state.combatant_mut(actor).selected_item = Some(item.name.clone());
        if let Some(index) = move_index {
            self.state.combatant_mut(target).select_move(index)?;
        }

        let was_fainted = self.state.combatant(target).is_fainted();
        let (user, opponent) = self.state.pair_mut(actor);
        let resolution = resolve_item(
            item,
            user,
            opponent,
            &mut self.rng,
            ResolveContext::new(self.config),
        );
        // Only an applied item keeps the selection it was used with.
        if !matches!(resolution, Ok(ItemUse::Applied(_))) {
            self.state.combatant_mut(actor).selected_item = previous_item;
            self.state.combatant_mut(target).selected_move = previous_move;
        }

        match resolution? {
            ItemUse::Applied(outcome) => {
                bus.push(BattleEvent::ItemUsed {
                    user: actor,
                    item: item.name.clone(),
                });
                self.push_item_outcome(actor, &outcome, was_fainted, bus);
                Ok(true)
            }
            ItemUse::Rejected(reason) => {
                bus.push(BattleEvent::ItemRejected {
                    user: actor,
                    item: item.name.clone(),
                    reason,
                });
                Ok(self.config.failed_item_policy == FailedItemPolicy::PassTurn)
            }
        }
    }

    fn push_item_outcome(
        &self,
        user: PlayerTarget,
        outcome: &ItemOutcome,
        was_fainted: bool,
        bus: &mut EventBus,
    ) {
        let target = if outcome.target_is_user {
            user
        } else {
            user.opponent()
        };
        if outcome.revived {
            bus.push(BattleEvent::StatusCured {
                target,
                status: schema::Status::Fainted,
            });
        }
        for change in &outcome.changes {
            bus.push(BattleEvent::ItemPropertyChanged {
                target,
                change: change.clone(),
            });
        }
        if let Some(status) = outcome.cured {
            bus.push(BattleEvent::StatusCured { target, status });
        }
        if let Some(level_up) = outcome.level_up.filter(|level_up| level_up.leveled_up()) {
            bus.push(BattleEvent::LeveledUp {
                target,
                new_level: level_up.new_level,
                points_awarded: level_up.points_awarded,
            });
        }
        if outcome.consumed {
            bus.push(BattleEvent::ItemConsumed {
                user,
                item: outcome.item.clone(),
                remaining: outcome.remaining,
            });
        }
        if !was_fainted && self.state.combatant(target).is_fainted() {
            bus.push(BattleEvent::Fainted { target });
        }
    }

    /// A fainted combatant ends the battle: a double knock-out is a draw,
    /// otherwise the survivor is rewarded and wins.
    fn resolve_fainting(&mut self, phases: &mut Vec<TurnPhase>, bus: &mut EventBus) -> EngineResult<()> {
        if self.is_over() {
            return Ok(());
        }
        let fainted = |target: PlayerTarget| self.state.combatant(target).is_fainted();
        let outcome = match (fainted(PlayerTarget::Player1), fainted(PlayerTarget::Player2)) {
            (true, true) => BattleOutcome::Draw,
            (true, false) => BattleOutcome::Winner(PlayerTarget::Player2),
            (false, true) => BattleOutcome::Winner(PlayerTarget::Player1),
            (false, false) => return Ok(()),
        };

        if let BattleOutcome::Winner(winner) = outcome {
            self.enter(TurnPhase::AwardExperience, phases, bus);
            self.award_victory(winner, bus)?;
        }
        execute_command_batch(vec![BattleCommand::EndBattle(outcome)], &mut self.state, bus)
    }

    fn award_victory(&mut self, winner: PlayerTarget, bus: &mut EventBus) -> EngineResult<()> {
        let amount = {
            let defeated = self.state.combatant(winner.opponent());
            battle_reward(defeated, self.state.combatant(winner).level)
        };
        let level_up = award_experience(self.state.combatant_mut(winner), amount, self.config);
        bus.push(BattleEvent::ExperienceGained {
            target: winner,
            amount,
        });
        if !level_up.leveled_up() {
            return Ok(());
        }
        bus.push(BattleEvent::LeveledUp {
            target: winner,
            new_level: level_up.new_level,
            points_awarded: level_up.points_awarded,
        });
        self.apply_level_up_items(winner, bus)
    }

    /// Held items that only work on level-up fire once per level-up event.
    fn apply_level_up_items(&mut self, holder: PlayerTarget, bus: &mut EventBus) -> EngineResult<()> {
        let held: Vec<&'a ItemDefinition> = self
            .state
            .combatant(holder)
            .inventory
            .keys()
            .filter_map(|name| self.items.get(name).ok())
            .filter(|item| item.flags.level_up_only)
            .collect();

        for item in held {
            let target = if item.flags.affects_self {
                holder
            } else {
                holder.opponent()
            };
            let was_fainted = self.state.combatant(target).is_fainted();
            let (user, opponent) = self.state.pair_mut(holder);
            let resolution = resolve_item(
                item,
                user,
                opponent,
                &mut self.rng,
                ResolveContext::level_up(self.config),
            )?;
            if let ItemUse::Applied(outcome) = resolution {
                bus.push(BattleEvent::ItemUsed {
                    user: holder,
                    item: item.name.clone(),
                });
                self.push_item_outcome(holder, &outcome, was_fainted, bus);
            }
        }
        Ok(())
    }

    fn finish(&mut self, phases: &mut Vec<TurnPhase>, bus: &mut EventBus) {
        self.enter(TurnPhase::End, phases, bus);
        if let Some(outcome) = self.state.outcome.clone() {
            info!(?outcome, turns = self.state.turn_number, "battle ended");
            bus.push(BattleEvent::BattleEnded { outcome });
        }
        for side in &mut self.state.sides {
            side.clear_battle_state();
        }
    }
}
