use crate::battle::commands::PlayerTarget;
use crate::battle::conditions::ConditionType;
use crate::battle::item_effects::{ChangeDirection, PropertyChange};
use crate::battle::side::BattleSide;
use crate::combatant::Combatant;
use crate::errors::ItemRejection;
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use schema::{ModifiedStat, PokemonType, Status};
use serde::{Deserialize, Serialize};
use std::fmt;
use tracing::trace;

/// Where the per-action cycle currently stands.
#[derive(Serialize, Deserialize, Debug, Clone, Copy, PartialEq, Eq)]
pub enum TurnPhase {
    ChooseAction,
    Attack,
    UseItem,
    ApplyEffect,
    ShowResult,
    AwardExperience,
    End,
}

#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, Eq)]
pub enum BattleOutcome {
    Winner(PlayerTarget),
    Draw,
    Escaped { side: PlayerTarget, location: String },
}

/// One side's choice for its action, made outside the engine.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, Eq)]
pub enum PlayerAction {
    Attack { move_index: usize },
    UseItem { item: String, move_index: Option<usize> },
}

#[derive(Serialize, Deserialize, Debug, Clone, Copy, PartialEq, Eq)]
pub enum ActionFailureReason {
    IsAsleep,
    IsFrozen,
    IsRecharging,
    IsParalyzed,
    IsFlinching,
    IsBound,
    MoveDisabled,
    MoveFailed,
}

#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
pub enum BattleEvent {
    // Turn Management
    TurnStarted {
        turn_number: u32,
        actor: PlayerTarget,
    },
    PhaseEntered {
        phase: TurnPhase,
    },

    // Attacks
    MoveUsed {
        user: PlayerTarget,
        move_name: String,
    },
    NoPpLeft {
        user: PlayerTarget,
    },
    MoveMissed {
        user: PlayerTarget,
    },
    ActionFailed {
        user: PlayerTarget,
        reason: ActionFailureReason,
    },
    CriticalHit,
    AttackTypeEffectiveness {
        multiplier: f64,
    },
    HitCount {
        hits: u32,
    },
    DamageDealt {
        target: PlayerTarget,
        damage: i32,
        remaining_hp: i32,
    },
    Healed {
        target: PlayerTarget,
        amount: i32,
        new_hp: i32,
    },
    HurtInConfusion {
        user: PlayerTarget,
        damage: i32,
    },
    Fainted {
        target: PlayerTarget,
    },

    // Statuses
    StatusApplied {
        target: PlayerTarget,
        status: Status,
    },
    StatusCured {
        target: PlayerTarget,
        status: Status,
    },
    StatusDamage {
        target: PlayerTarget,
        status: Status,
        damage: i32,
    },

    // Battle conditions
    ConditionApplied {
        target: PlayerTarget,
        condition: ConditionType,
    },
    ConditionExpired {
        target: PlayerTarget,
        condition: ConditionType,
    },
    DecoyAbsorbed {
        target: PlayerTarget,
        damage: i32,
    },

    // Stat changes
    StatChanged {
        target: PlayerTarget,
        stat: ModifiedStat,
        old_value: i32,
        new_value: i32,
    },
    StatChangeBlocked {
        target: PlayerTarget,
        stat: ModifiedStat,
    },
    CritRatioChanged {
        target: PlayerTarget,
        new_ratio: f64,
    },
    StatsReset,
    TypesChanged {
        target: PlayerTarget,
        types: Vec<PokemonType>,
    },
    Transformed {
        user: PlayerTarget,
    },
    WinningsGained {
        user: PlayerTarget,
        amount: u32,
    },

    // Items
    ItemUsed {
        user: PlayerTarget,
        item: String,
    },
    ItemRejected {
        user: PlayerTarget,
        item: String,
        reason: ItemRejection,
    },
    ItemPropertyChanged {
        target: PlayerTarget,
        change: PropertyChange,
    },
    ItemConsumed {
        user: PlayerTarget,
        item: String,
        remaining: u32,
    },

    // Experience
    ExperienceGained {
        target: PlayerTarget,
        amount: u32,
    },
    LeveledUp {
        target: PlayerTarget,
        new_level: u32,
        points_awarded: u32,
    },

    // Battle End
    Escaped {
        user: PlayerTarget,
        location: String,
    },
    BattleEnded {
        outcome: BattleOutcome,
    },
}

impl BattleEvent {
    /// Formats the event into a human-readable string using battle context.
    /// Returns None for silent events that should not produce user-visible text.
    pub fn format(&self, state: &BattleState) -> Option<String> {
        let name = |target: &PlayerTarget| state.side(*target).combatant.name.clone();
        match self {
            BattleEvent::TurnStarted { turn_number, actor } => {
                Some(format!("=== Turn {} ({}) ===", turn_number, name(actor)))
            }
            BattleEvent::PhaseEntered { .. } => None,

            BattleEvent::MoveUsed { user, move_name } => {
                Some(format!("{} used {}!", name(user), format_move_name(move_name)))
            }
            BattleEvent::NoPpLeft { user } => {
                Some(format!("{} has no PP left for that move!", name(user)))
            }
            BattleEvent::MoveMissed { user } => Some(format!("{}'s attack missed!", name(user))),
            BattleEvent::ActionFailed { user, reason } => Some(match reason {
                ActionFailureReason::MoveFailed => "But it failed!".to_string(),
                other => format!("{} {}", name(user), Self::format_action_failure_reason(other)),
            }),
            BattleEvent::CriticalHit => Some("A critical hit!".to_string()),
            BattleEvent::AttackTypeEffectiveness { multiplier } => match *multiplier {
                m if m > 1.0 => Some("It's super effective!".to_string()),
                m if m < 1.0 && m > 0.0 => Some("It's not very effective...".to_string()),
                m if m == 0.0 => Some("It had no effect!".to_string()),
                _ => None,
            },
            BattleEvent::HitCount { hits } => Some(format!("Hit {} time(s)!", hits)),
            BattleEvent::DamageDealt { target, damage, .. } => {
                Some(format!("{} took {} damage!", name(target), damage))
            }
            BattleEvent::Healed { target, amount, .. } => {
                Some(format!("{} recovered {} HP!", name(target), amount))
            }
            BattleEvent::HurtInConfusion { user, .. } => {
                Some(format!("{} hurt itself in its confusion!", name(user)))
            }
            BattleEvent::Fainted { target } => Some(format!("{} fainted!", name(target))),

            BattleEvent::StatusApplied { target, status } => Some(format!(
                "{} {}",
                name(target),
                Self::format_status_applied(*status)
            )),
            BattleEvent::StatusCured { target, status } => Some(format!(
                "{} {}",
                name(target),
                Self::format_status_removed(*status)
            )),
            BattleEvent::StatusDamage { target, status, .. } => Some(format!(
                "{} is hurt by its {}!",
                name(target),
                status.to_string().to_lowercase()
            )),

            BattleEvent::ConditionApplied { target, condition } => {
                Some(Self::format_condition_applied(&name(target), *condition))
            }
            BattleEvent::ConditionExpired { target, condition } => {
                Some(format!("{}'s {} wore off.", name(target), condition))
            }
            BattleEvent::DecoyAbsorbed { target, .. } => {
                Some(format!("The decoy took the hit for {}!", name(target)))
            }

            BattleEvent::StatChanged {
                target,
                stat,
                old_value,
                new_value,
            } => {
                if new_value > old_value {
                    Some(format!("{}'s {} rose!", name(target), stat))
                } else {
                    Some(format!("{}'s {} fell!", name(target), stat))
                }
            }
            BattleEvent::StatChangeBlocked { target, stat } => {
                Some(format!("{}'s {} won't change!", name(target), stat))
            }
            BattleEvent::CritRatioChanged { target, .. } => {
                Some(format!("{} is getting pumped!", name(target)))
            }
            BattleEvent::StatsReset => Some("All stat changes were eliminated!".to_string()),
            BattleEvent::TypesChanged { target, types } => {
                let names: Vec<String> = types.iter().map(|t| t.to_string()).collect();
                Some(format!("{} became {}-type!", name(target), names.join("/")))
            }
            BattleEvent::Transformed { user } => Some(format!(
                "{} transformed into {}!",
                name(user),
                name(&user.opponent())
            )),
            BattleEvent::WinningsGained { amount, .. } => {
                Some(format!("Coins scattered everywhere! (+{})", amount))
            }

            BattleEvent::ItemUsed { user, item } => {
                Some(format!("{} used {}!", name(user), format_move_name(item)))
            }
            BattleEvent::ItemRejected { item, reason, .. } => Some(format!(
                "{} cannot be used: {}.",
                format_move_name(item),
                reason
            )),
            BattleEvent::ItemPropertyChanged { target, change } => {
                Some(Self::format_property_change(&name(target), change))
            }
            BattleEvent::ItemConsumed { .. } => None,

            BattleEvent::ExperienceGained { target, amount } => {
                Some(format!("{} gained {} experience!", name(target), amount))
            }
            BattleEvent::LeveledUp {
                target, new_level, ..
            } => Some(format!("{} grew to level {}!", name(target), new_level)),

            BattleEvent::Escaped { user, location } => {
                if location.is_empty() {
                    Some(format!("{} fled the battle!", name(user)))
                } else {
                    Some(format!("{} was sent to {}!", name(user), location))
                }
            }
            BattleEvent::BattleEnded { outcome } => match outcome {
                BattleOutcome::Winner(target) => Some(format!("{} has won the battle!", name(target))),
                BattleOutcome::Draw => Some("The battle ended in a draw!".to_string()),
                BattleOutcome::Escaped { .. } => Some("The battle is over.".to_string()),
            },
        }
    }

    // --- Private Helper Functions ---

    fn format_status_applied(status: Status) -> &'static str {
        match status {
            Status::Sleep => "fell asleep!",
            Status::Poison => "was poisoned!",
            Status::Burn => "was burned!",
            Status::Freeze => "was frozen solid!",
            Status::Paralysis => "is paralyzed! It may be unable to move!",
            Status::Bound => "was squeezed by a bind!",
            Status::Confusion => "became confused!",
            Status::Fainted => "fainted!",
            Status::Normal => "is back to normal.",
        }
    }

    fn format_status_removed(status: Status) -> String {
        match status {
            Status::Sleep => "woke up!".to_string(),
            Status::Freeze => "thawed out!".to_string(),
            Status::Confusion => "snapped out of its confusion!".to_string(),
            Status::Bound => "was freed from the bind!".to_string(),
            Status::Fainted => "was revived!".to_string(),
            other => format!("was cured of its {}!", other.to_string().to_lowercase()),
        }
    }

    fn format_condition_applied(name: &str, condition: ConditionType) -> String {
        match condition {
            ConditionType::Charging => format!("{} is gathering power!", name),
            ConditionType::Underground => format!("{} dug a hole!", name),
            ConditionType::InAir => format!("{} flew up high!", name),
            ConditionType::Decoy => format!("{} put up a decoy!", name),
            ConditionType::Trapped => format!("{} can no longer escape!", name),
            ConditionType::StatsLocked => format!("{}'s stats are protected!", name),
            ConditionType::Disabled => format!("{}'s move was disabled!", name),
            ConditionType::Recharging => format!("{} must rest!", name),
            ConditionType::Lingering => format!("{} is caught in a lingering attack!", name),
            ConditionType::Flinched => format!("{} flinched!", name),
        }
    }

    fn format_action_failure_reason(reason: &ActionFailureReason) -> &'static str {
        match reason {
            ActionFailureReason::IsAsleep => "is fast asleep.",
            ActionFailureReason::IsFrozen => "is frozen solid!",
            ActionFailureReason::IsRecharging => "must recharge!",
            ActionFailureReason::IsParalyzed => "is fully paralyzed!",
            ActionFailureReason::IsFlinching => "flinched and couldn't move!",
            ActionFailureReason::IsBound => "is squeezed and can't move!",
            ActionFailureReason::MoveDisabled => "can't use a disabled move!",
            ActionFailureReason::MoveFailed => "failed!",
        }
    }

    fn format_property_change(name: &str, change: &PropertyChange) -> String {
        let subject = match &change.move_name {
            Some(move_name) => format!("{}'s {} {}", name, format_move_name(move_name), change.property),
            None => format!("{}'s {}", name, change.property),
        };
        let verb = match change.direction {
            ChangeDirection::Gain => "rose",
            ChangeDirection::Loss => "fell",
        };
        format!("{} {} by {}!", subject, verb, format_amount(change.delta.abs()))
    }
}

/// Record names are uppercase; show them in title case.
pub fn format_move_name(name: &str) -> String {
    name.split(' ')
        .map(|word| {
            let mut chars = word.chars();
            match chars.next() {
                Some(first) => first.to_uppercase().chain(chars.flat_map(char::to_lowercase)).collect(),
                None => String::new(),
            }
        })
        .collect::<Vec<String>>()
        .join(" ")
}

fn format_amount(amount: f64) -> String {
    if amount.fract() == 0.0 {
        format!("{}", amount as i64)
    } else {
        format!("{:.2}", amount)
    }
}

/// Event bus for collecting and managing battle events.
#[derive(Debug, Clone, Default)]
pub struct EventBus {
    events: Vec<BattleEvent>,
}

impl EventBus {
    pub fn new() -> Self {
        Self { events: Vec::new() }
    }

    pub fn push(&mut self, event: BattleEvent) {
        self.events.push(event);
    }

    pub fn events(&self) -> &[BattleEvent] {
        &self.events
    }

    pub fn into_events(self) -> Vec<BattleEvent> {
        self.events
    }

    /// Formatted text for every event that has any.
    pub fn formatted(&self, state: &BattleState) -> Vec<String> {
        self.events
            .iter()
            .filter_map(|event| event.format(state))
            .collect()
    }

    /// Return true if the event bus contains no events.
    pub fn is_empty(&self) -> bool {
        self.events.is_empty()
    }

    /// Return the number of events in the bus.
    pub fn len(&self) -> usize {
        self.events.len()
    }
}

impl fmt::Display for EventBus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for event in &self.events {
            writeln!(f, "  {:?}", event)?;
        }
        Ok(())
    }
}

#[derive(Debug, Clone)]
enum RngSource {
    Scripted { outcomes: Vec<f64>, index: usize },
    Seeded(StdRng),
}

/// Source of every random draw the engine makes. Draws are uniform in [0, 1).
#[derive(Debug, Clone)]
pub struct TurnRng {
    source: RngSource,
}

impl TurnRng {
    /// Replays `outcomes` in order, starting over when they run out.
    pub fn new_for_test(outcomes: Vec<f64>) -> Self {
        Self {
            source: RngSource::Scripted { outcomes, index: 0 },
        }
    }

    pub fn seeded(seed: u64) -> Self {
        Self {
            source: RngSource::Seeded(StdRng::seed_from_u64(seed)),
        }
    }

    pub fn new_random() -> Self {
        Self {
            source: RngSource::Seeded(StdRng::from_os_rng()),
        }
    }

    pub fn next_unit(&mut self, reason: &str) -> f64 {
        let value = match &mut self.source {
            RngSource::Scripted { outcomes, index } => {
                if outcomes.is_empty() {
                    0.0
                } else {
                    let value = outcomes[*index % outcomes.len()];
                    *index += 1;
                    value
                }
            }
            RngSource::Seeded(rng) => rng.random::<f64>(),
        };
        trace!(value, reason, "rng draw");
        value
    }

    /// Uniform index in `0..len`. Returns 0 for an empty range.
    pub fn next_index(&mut self, len: usize, reason: &str) -> usize {
        if len == 0 {
            return 0;
        }
        let unit = self.next_unit(reason);
        ((unit * len as f64) as usize).min(len - 1)
    }

    /// True with the given probability.
    pub fn chance(&mut self, probability: f64, reason: &str) -> bool {
        self.next_unit(reason) < probability
    }
}

#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
pub struct BattleState {
    pub sides: [BattleSide; 2],
    pub turn_number: u32,
    pub active: PlayerTarget,
    pub phase: TurnPhase,
    pub outcome: Option<BattleOutcome>,
}

impl BattleState {
    /// The faster combatant acts first; ties go to Player 1.
    pub fn new(player1: Combatant, player2: Combatant) -> Self {
        let active = if player2.current.speed > player1.current.speed {
            PlayerTarget::Player2
        } else {
            PlayerTarget::Player1
        };
        Self {
            sides: [BattleSide::new(player1), BattleSide::new(player2)],
            turn_number: 1,
            active,
            phase: TurnPhase::ChooseAction,
            outcome: None,
        }
    }

    pub fn side(&self, target: PlayerTarget) -> &BattleSide {
        &self.sides[target.to_index()]
    }

    pub fn side_mut(&mut self, target: PlayerTarget) -> &mut BattleSide {
        &mut self.sides[target.to_index()]
    }

    pub fn combatant(&self, target: PlayerTarget) -> &Combatant {
        &self.side(target).combatant
    }

    pub fn combatant_mut(&mut self, target: PlayerTarget) -> &mut Combatant {
        &mut self.side_mut(target).combatant
    }

    /// Both combatants, the first one mutable and the second one its opponent.
    pub fn pair_mut(&mut self, first: PlayerTarget) -> (&mut Combatant, &mut Combatant) {
        let [one, two] = &mut self.sides;
        match first {
            PlayerTarget::Player1 => (&mut one.combatant, &mut two.combatant),
            PlayerTarget::Player2 => (&mut two.combatant, &mut one.combatant),
        }
    }
}

#[cfg(test)]
mod event_formatting_tests {
    use super::*;
    use crate::battle::tests::common::{create_test_battle, TestCombatantBuilder};
    use pretty_assertions::assert_eq;
    use schema::CombatStat;

    fn create_test_battle_state() -> BattleState {
        let pikachu = TestCombatantBuilder::new("PIKACHU").build();
        let charmander = TestCombatantBuilder::new("CHARMANDER").build();
        create_test_battle(pikachu, charmander)
    }

    #[test]
    fn test_silent_events_return_none() {
        let state = create_test_battle_state();
        let silent_events = vec![
            BattleEvent::PhaseEntered {
                phase: TurnPhase::Attack,
            },
            BattleEvent::AttackTypeEffectiveness { multiplier: 1.0 },
            BattleEvent::ItemConsumed {
                user: PlayerTarget::Player1,
                item: "POTION".to_string(),
                remaining: 0,
            },
        ];
        for event in silent_events {
            assert!(
                event.format(&state).is_none(),
                "Event {:?} should be silent but returned text",
                event
            );
        }
    }

    #[test]
    fn test_event_text_samples() {
        let state = create_test_battle_state();

        let used = BattleEvent::MoveUsed {
            user: PlayerTarget::Player1,
            move_name: "THUNDER SHOCK".to_string(),
        };
        assert_eq!(used.format(&state), Some("PIKACHU used Thunder Shock!".to_string()));

        let effectiveness = BattleEvent::AttackTypeEffectiveness { multiplier: 0.5 };
        assert_eq!(
            effectiveness.format(&state),
            Some("It's not very effective...".to_string())
        );
        let immune = BattleEvent::AttackTypeEffectiveness { multiplier: 0.0 };
        assert_eq!(immune.format(&state), Some("It had no effect!".to_string()));

        let failed = BattleEvent::ActionFailed {
            user: PlayerTarget::Player2,
            reason: ActionFailureReason::MoveFailed,
        };
        assert_eq!(failed.format(&state), Some("But it failed!".to_string()));

        let fell = BattleEvent::StatChanged {
            target: PlayerTarget::Player2,
            stat: ModifiedStat::Combat(CombatStat::Defense),
            old_value: 50,
            new_value: 40,
        };
        assert_eq!(fell.format(&state), Some("CHARMANDER's Defense fell!".to_string()));
    }

    #[test]
    fn test_event_bus_collects_in_order() {
        let state = create_test_battle_state();
        let mut bus = EventBus::new();
        bus.push(BattleEvent::TurnStarted {
            turn_number: 1,
            actor: PlayerTarget::Player1,
        });
        bus.push(BattleEvent::PhaseEntered {
            phase: TurnPhase::Attack,
        });
        bus.push(BattleEvent::CriticalHit);

        assert!(!bus.is_empty());
        assert_eq!(bus.len(), 3);
        assert_eq!(
            bus.formatted(&state),
            vec!["=== Turn 1 (PIKACHU) ===".to_string(), "A critical hit!".to_string()]
        );
        let display_output = format!("{}", bus);
        assert!(display_output.contains("PhaseEntered"));
    }

    #[test]
    fn test_scripted_rng_cycles() {
        let mut rng = TurnRng::new_for_test(vec![0.1, 0.9]);
        assert_eq!(rng.next_unit("first"), 0.1);
        assert_eq!(rng.next_unit("second"), 0.9);
        assert_eq!(rng.next_unit("wraps"), 0.1);
        assert_eq!(rng.next_index(4, "index"), 3);
        assert!(!TurnRng::new_for_test(vec![0.5]).chance(0.5, "boundary"));
    }

    #[test]
    fn test_seeded_rng_is_reproducible() {
        let mut a = TurnRng::seeded(7);
        let mut b = TurnRng::seeded(7);
        for _ in 0..5 {
            let value = a.next_unit("a");
            assert_eq!(value, b.next_unit("b"));
            assert!((0.0..1.0).contains(&value));
        }
    }
}
