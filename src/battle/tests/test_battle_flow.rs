use crate::battle::commands::PlayerTarget;
use crate::battle::conditions::ConditionType;
use crate::battle::engine::{Battle, TurnReport};
use crate::battle::state::{BattleEvent, BattleOutcome, PlayerAction, TurnPhase, TurnRng};
use crate::battle::tests::common::{
    assert_ok, item_catalog, move_catalog, predictable_rng, status_move, tackle, test_config,
    test_item, TestCombatantBuilder,
};
use crate::catalog::{ItemCatalog, MoveCatalog};
use crate::combatant::Combatant;
use crate::config::{BattleConfig, FailedItemPolicy};
use crate::errors::{BattleError, EngineError};
use crate::item_data::ItemFlags;
use crate::move_data::MoveDefinition;
use crate::progression::battle_reward;
use pretty_assertions::assert_eq;
use schema::{Delta, EffectPayload, HpRequirement, ItemProperty, MoveCategory, MoveEffect, PokemonType, Status};

fn catalogs() -> (MoveCatalog, ItemCatalog) {
    let self_use = ItemFlags {
        affects_self: true,
        additive: true,
        current: true,
        ..ItemFlags::default()
    };
    let items = item_catalog(vec![
        test_item(
            "POTION",
            &[(ItemProperty::Hp, Delta::By(20.0))],
            ItemFlags {
                one_time: true,
                ..self_use.clone()
            },
        ),
        test_item(
            "FULL BERRY",
            &[(ItemProperty::Hp, Delta::By(10.0))],
            ItemFlags {
                hp_requirement: HpRequirement::Full,
                ..self_use.clone()
            },
        ),
        test_item(
            "FIRE GEM",
            &[(ItemProperty::MovePower, Delta::By(10.0))],
            ItemFlags {
                required_move_type: Some(PokemonType::Fire),
                current: false,
                ..self_use.clone()
            },
        ),
        test_item(
            "LUCKY CHARM",
            &[(ItemProperty::Points, Delta::By(3.0))],
            ItemFlags {
                level_up_only: true,
                ..self_use
            },
        ),
    ]);
    (move_catalog(vec![tackle()]), items)
}

fn attack(battle: &mut Battle<'_>, move_index: usize) -> TurnReport {
    assert_ok(battle.submit(PlayerAction::Attack { move_index }))
}

fn use_item(battle: &mut Battle<'_>, item: &str) -> TurnReport {
    assert_ok(battle.submit(PlayerAction::UseItem {
        item: item.to_string(),
        move_index: None,
    }))
}

fn start<'a>(
    config: &'a BattleConfig,
    catalogs: &'a (MoveCatalog, ItemCatalog),
    player1: Combatant,
    player2: Combatant,
) -> Battle<'a> {
    Battle::new(config, &catalogs.0, &catalogs.1, player1, player2, predictable_rng())
}

fn pair() -> (Combatant, Combatant) {
    (
        TestCombatantBuilder::new("EEVEE").build(),
        TestCombatantBuilder::new("MEOWTH").build(),
    )
}

#[test]
fn test_plain_attack_walks_the_short_path() {
    let config = test_config();
    let catalogs = catalogs();
    let (p1, p2) = pair();
    let mut battle = start(&config, &catalogs, p1, p2);

    let report = attack(&mut battle, 0);
    assert_eq!(
        report.phases,
        vec![TurnPhase::ChooseAction, TurnPhase::Attack, TurnPhase::ShowResult]
    );
    assert_eq!(
        report.events[0],
        BattleEvent::TurnStarted {
            turn_number: 1,
            actor: PlayerTarget::Player1,
        }
    );
    assert!(report.turn_passed);
    assert_eq!(report.outcome, None);
    assert_eq!(battle.phase(), TurnPhase::ChooseAction);
}

#[test]
fn test_sides_alternate_and_turns_count() {
    let config = test_config();
    let catalogs = catalogs();
    let (p1, p2) = pair();
    let mut battle = start(&config, &catalogs, p1, p2);

    assert_eq!(battle.active(), PlayerTarget::Player1);
    attack(&mut battle, 0);
    assert_eq!(battle.active(), PlayerTarget::Player2);
    assert_eq!(battle.turn_number(), 2);

    let report = attack(&mut battle, 0);
    assert_eq!(report.actor, PlayerTarget::Player2);
    assert_eq!(battle.active(), PlayerTarget::Player1);
    assert_eq!(battle.turn_number(), 3);
    assert_eq!(battle.state().combatant(PlayerTarget::Player1).current_hp(), 45);
    assert_eq!(battle.state().combatant(PlayerTarget::Player2).current_hp(), 45);
}

#[test]
fn test_faster_side_acts_first() {
    let config = test_config();
    let catalogs = catalogs();
    let p1 = TestCombatantBuilder::new("SLOWPOKE").build();
    let p2 = TestCombatantBuilder::new("JOLTEON")
        .with_stat(schema::CombatStat::Speed, 90)
        .build();
    let battle = start(&config, &catalogs, p1, p2);

    assert_eq!(battle.active(), PlayerTarget::Player2);
}

#[test]
fn test_super_effective_hit_enters_apply_effect() {
    let config = test_config();
    let catalogs = catalogs();
    let ember = MoveDefinition::new("EMBER", PokemonType::Fire, MoveCategory::Special, 40, 100, 25);
    let p1 = TestCombatantBuilder::new("VULPIX").with_move(ember).build();
    let p2 = TestCombatantBuilder::new("ODDISH")
        .with_types(vec![PokemonType::Grass])
        .build();
    let mut battle = start(&config, &catalogs, p1, p2);

    let report = attack(&mut battle, 0);
    assert_eq!(
        report.phases,
        vec![
            TurnPhase::ChooseAction,
            TurnPhase::Attack,
            TurnPhase::ApplyEffect,
            TurnPhase::ShowResult
        ]
    );
}

#[test]
fn test_knockout_awards_experience_and_ends() {
    let config = test_config();
    let catalogs = catalogs();
    let p1 = TestCombatantBuilder::new("EEVEE").build();
    let p2 = TestCombatantBuilder::new("MEOWTH").with_current_hp(3).build();
    let expected_reward = battle_reward(&p2, p1.level);
    let mut battle = start(&config, &catalogs, p1, p2);

    let report = attack(&mut battle, 0);
    assert_eq!(
        report.phases,
        vec![
            TurnPhase::ChooseAction,
            TurnPhase::Attack,
            TurnPhase::ShowResult,
            TurnPhase::AwardExperience,
            TurnPhase::End
        ]
    );
    assert_eq!(report.outcome, Some(BattleOutcome::Winner(PlayerTarget::Player1)));
    assert!(report.events.contains(&BattleEvent::Fainted {
        target: PlayerTarget::Player2
    }));
    assert!(report.events.contains(&BattleEvent::ExperienceGained {
        target: PlayerTarget::Player1,
        amount: expected_reward,
    }));
    assert_eq!(
        report.events.last(),
        Some(&BattleEvent::BattleEnded {
            outcome: BattleOutcome::Winner(PlayerTarget::Player1)
        })
    );
    assert!(battle.is_over());
    assert_eq!(battle.phase(), TurnPhase::End);
}

#[test]
fn test_end_of_battle_clears_side_state() {
    let config = test_config();
    let catalogs = catalogs();
    let p1 = TestCombatantBuilder::new("EEVEE").build();
    let p2 = TestCombatantBuilder::new("MEOWTH").with_current_hp(3).build();
    let mut battle = start(&config, &catalogs, p1, p2);

    // The knockout records damage taken on the loser's side first.
    let report = attack(&mut battle, 0);
    assert!(report.outcome.is_some());
    for target in [PlayerTarget::Player1, PlayerTarget::Player2] {
        let side = battle.side(target);
        assert!(side.conditions.is_empty());
        assert_eq!(side.forced_move, None);
        assert_eq!(side.last_damage_taken, None);
    }
}

#[test]
fn test_submit_after_end_is_rejected() {
    let config = test_config();
    let catalogs = catalogs();
    let p1 = TestCombatantBuilder::new("EEVEE").build();
    let p2 = TestCombatantBuilder::new("MEOWTH").with_current_hp(3).build();
    let mut battle = start(&config, &catalogs, p1, p2);
    attack(&mut battle, 0);

    let result = battle.submit(PlayerAction::Attack { move_index: 0 });
    assert!(matches!(result, Err(EngineError::Battle(BattleError::BattleOver))));
}

#[test]
fn test_invalid_slot_changes_nothing() {
    let config = test_config();
    let catalogs = catalogs();
    let (p1, p2) = pair();
    let mut battle = start(&config, &catalogs, p1, p2);
    let before = battle.state().combatant(PlayerTarget::Player1).clone();

    let result = battle.submit(PlayerAction::Attack { move_index: 3 });
    assert!(matches!(
        result,
        Err(EngineError::Battle(BattleError::InvalidMoveSlot { slot: 3, known: 1 }))
    ));
    assert_eq!(battle.state().combatant(PlayerTarget::Player1), &before);
    assert_eq!(battle.active(), PlayerTarget::Player1);
    assert_eq!(battle.turn_number(), 1);
}

#[test]
fn test_unheld_item_is_an_error() {
    let config = test_config();
    let catalogs = catalogs();
    let (p1, p2) = pair();
    let mut battle = start(&config, &catalogs, p1, p2);

    let result = battle.submit(PlayerAction::UseItem {
        item: "potion".to_string(),
        move_index: None,
    });
    assert!(matches!(
        result,
        Err(EngineError::Battle(BattleError::ItemNotHeld(name))) if name == "POTION"
    ));
    assert_eq!(battle.active(), PlayerTarget::Player1);
}

#[test]
fn test_unknown_item_is_an_error() {
    let config = test_config();
    let catalogs = catalogs();
    let (p1, p2) = pair();
    let mut battle = start(&config, &catalogs, p1, p2);

    let result = battle.submit(PlayerAction::UseItem {
        item: "MASTER BALL".to_string(),
        move_index: None,
    });
    assert!(matches!(result, Err(EngineError::UnknownName(_))));
}

#[test]
fn test_item_use_reports_changes_and_consumption() {
    let config = test_config();
    let catalogs = catalogs();
    let p1 = TestCombatantBuilder::new("EEVEE")
        .with_current_hp(20)
        .with_item("POTION", 2)
        .build();
    let p2 = TestCombatantBuilder::new("MEOWTH").build();
    let mut battle = start(&config, &catalogs, p1, p2);

    let report = use_item(&mut battle, "POTION");
    assert_eq!(
        report.phases,
        vec![TurnPhase::ChooseAction, TurnPhase::UseItem, TurnPhase::ShowResult]
    );
    assert!(report.events.contains(&BattleEvent::ItemUsed {
        user: PlayerTarget::Player1,
        item: "POTION".to_string(),
    }));
    assert!(report.events.contains(&BattleEvent::ItemConsumed {
        user: PlayerTarget::Player1,
        item: "POTION".to_string(),
        remaining: 1,
    }));
    let user = battle.state().combatant(PlayerTarget::Player1);
    assert_eq!(user.current_hp(), 40);
    assert_eq!(user.selected_item.as_deref(), Some("POTION"));
    assert_eq!(battle.active(), PlayerTarget::Player2);
}

#[test]
fn test_rejected_item_keeps_the_turn_by_default() {
    let config = test_config();
    let catalogs = catalogs();
    let p1 = TestCombatantBuilder::new("EEVEE")
        .with_current_hp(30)
        .with_item("FULL BERRY", 1)
        .build();
    let p2 = TestCombatantBuilder::new("MEOWTH").build();
    let mut battle = start(&config, &catalogs, p1, p2);

    let report = use_item(&mut battle, "FULL BERRY");
    assert!(!report.turn_passed);
    assert!(report
        .events
        .iter()
        .any(|event| matches!(event, BattleEvent::ItemRejected { .. })));
    assert_eq!(battle.active(), PlayerTarget::Player1);
    assert_eq!(battle.turn_number(), 1);
    let user = battle.state().combatant(PlayerTarget::Player1);
    assert_eq!(user.item_quantity("FULL BERRY"), 1);
    assert_eq!(user.selected_item, None);
    assert_eq!(user.selected_move, None);
}

#[test]
fn test_rejected_item_leaves_the_selection_alone() {
    let config = test_config();
    let catalogs = catalogs();
    let ember = MoveDefinition::new("EMBER", PokemonType::Fire, MoveCategory::Special, 40, 100, 25);
    let p1 = TestCombatantBuilder::new("VULPIX")
        .with_moves(vec![ember, tackle()])
        .with_item("FIRE GEM", 1)
        .build();
    let p2 = TestCombatantBuilder::new("MEOWTH").build();
    let mut battle = start(&config, &catalogs, p1, p2);
    let before = battle.state().combatant(PlayerTarget::Player1).clone();

    let report = assert_ok(battle.submit(PlayerAction::UseItem {
        item: "FIRE GEM".to_string(),
        move_index: Some(1),
    }));
    assert!(!report.turn_passed);
    assert!(report
        .events
        .iter()
        .any(|event| matches!(event, BattleEvent::ItemRejected { .. })));
    assert_eq!(battle.state().combatant(PlayerTarget::Player1), &before);

    // The same item on the Fire move goes through and keeps the selection.
    let report = assert_ok(battle.submit(PlayerAction::UseItem {
        item: "FIRE GEM".to_string(),
        move_index: Some(0),
    }));
    assert!(report.turn_passed);
    let user = battle.state().combatant(PlayerTarget::Player1);
    assert_eq!(user.selected_move, Some(0));
    assert_eq!(user.selected_item.as_deref(), Some("FIRE GEM"));
    assert_eq!(user.moves[0].current.power, 50);
}

#[test]
fn test_missed_attack_skips_apply_effect() {
    let config = test_config();
    let catalogs = catalogs();
    let wild = MoveDefinition::new("WILD SWING", PokemonType::Normal, MoveCategory::Physical, 40, 1, 20);
    let p1 = TestCombatantBuilder::new("ZUBAT").with_move(wild).build();
    let p2 = TestCombatantBuilder::new("MEOWTH").with_status(Status::Burn).build();
    let mut battle = Battle::new(
        &config,
        &catalogs.0,
        &catalogs.1,
        p1,
        p2,
        TurnRng::new_for_test(vec![0.99]),
    );

    let report = attack(&mut battle, 0);
    assert!(report.events.contains(&BattleEvent::MoveMissed {
        user: PlayerTarget::Player1,
    }));
    assert_eq!(
        report.phases,
        vec![TurnPhase::ChooseAction, TurnPhase::Attack, TurnPhase::ShowResult]
    );
}

#[test]
fn test_self_only_move_still_reaches_apply_effect() {
    let config = test_config();
    let catalogs = catalogs();
    let focus = status_move("FOCUS").with_effect(MoveEffect::SelfOnly, EffectPayload::Flag);
    let p1 = TestCombatantBuilder::new("ZUBAT").with_move(focus).build();
    let p2 = TestCombatantBuilder::new("MEOWTH").with_status(Status::Burn).build();
    let mut battle = start(&config, &catalogs, p1, p2);

    let report = attack(&mut battle, 0);
    assert_eq!(
        report.phases,
        vec![
            TurnPhase::ChooseAction,
            TurnPhase::Attack,
            TurnPhase::ApplyEffect,
            TurnPhase::ShowResult
        ]
    );
}

#[test]
fn test_rejected_item_can_cost_the_turn() {
    let config = BattleConfig {
        failed_item_policy: FailedItemPolicy::PassTurn,
        ..test_config()
    };
    let catalogs = catalogs();
    let p1 = TestCombatantBuilder::new("EEVEE")
        .with_current_hp(30)
        .with_item("FULL BERRY", 1)
        .build();
    let p2 = TestCombatantBuilder::new("MEOWTH").build();
    let mut battle = start(&config, &catalogs, p1, p2);

    let report = use_item(&mut battle, "FULL BERRY");
    assert!(report.turn_passed);
    assert_eq!(battle.active(), PlayerTarget::Player2);
}

#[test]
fn test_double_knockout_is_a_draw() {
    let config = test_config();
    let catalogs = catalogs();
    let reckless = tackle().with_effect(MoveEffect::Recoil, EffectPayload::Value(25.0));
    let p1 = TestCombatantBuilder::new("MANKEY")
        .with_move(reckless)
        .with_current_hp(1)
        .build();
    let p2 = TestCombatantBuilder::new("MEOWTH").with_current_hp(3).build();
    let mut battle = start(&config, &catalogs, p1, p2);

    let report = attack(&mut battle, 0);
    assert_eq!(report.outcome, Some(BattleOutcome::Draw));
    assert!(!report.phases.contains(&TurnPhase::AwardExperience));
    assert!(!report
        .events
        .iter()
        .any(|event| matches!(event, BattleEvent::ExperienceGained { .. })));
}

#[test]
fn test_level_up_fires_held_level_up_items() {
    let config = test_config();
    let catalogs = catalogs();
    let p1 = TestCombatantBuilder::new("EEVEE")
        .with_level(1)
        .with_item("LUCKY CHARM", 1)
        .build();
    let p2 = TestCombatantBuilder::new("MEOWTH")
        .with_level(10)
        .with_current_hp(3)
        .build();
    let points_before = p1.points;
    let mut battle = start(&config, &catalogs, p1, p2);

    let report = attack(&mut battle, 0);
    let leveled = report
        .events
        .iter()
        .position(|event| matches!(event, BattleEvent::LeveledUp { .. }));
    let charm = report.events.iter().position(|event| {
        event
            == &BattleEvent::ItemUsed {
                user: PlayerTarget::Player1,
                item: "LUCKY CHARM".to_string(),
            }
    });
    assert!(leveled.is_some());
    assert!(charm > leveled);

    let (winner, _) = battle.into_combatants();
    // Reward 48 puts the winner at level 3: two levels of points plus the charm.
    assert_eq!(winner.level, 3);
    assert_eq!(winner.points, points_before + 10 + 3);
    assert_eq!(winner.item_quantity("LUCKY CHARM"), 1);
}

#[test]
fn test_poison_ticks_after_the_action() {
    let config = test_config();
    let catalogs = catalogs();
    let p1 = TestCombatantBuilder::new("EEVEE").with_status(Status::Poison).build();
    let p2 = TestCombatantBuilder::new("MEOWTH").build();
    let mut battle = start(&config, &catalogs, p1, p2);

    let report = attack(&mut battle, 0);
    assert!(report.events.contains(&BattleEvent::StatusDamage {
        target: PlayerTarget::Player1,
        status: Status::Poison,
        damage: 6,
    }));
    assert_eq!(battle.state().combatant(PlayerTarget::Player1).current_hp(), 44);
}

#[test]
fn test_forced_move_ignores_the_chosen_slot() {
    let config = test_config();
    let solar_beam = MoveDefinition::new("SOLAR BEAM", PokemonType::Grass, MoveCategory::Special, 120, 100, 10)
        .with_effect(MoveEffect::ChargeThenAttack, EffectPayload::Flag);
    let catalogs = (move_catalog(vec![tackle(), solar_beam.clone()]), catalogs().1);
    let p1 = TestCombatantBuilder::new("BULBASAUR")
        .with_moves(vec![tackle(), solar_beam])
        .build();
    let p2 = TestCombatantBuilder::new("MEOWTH").build();
    let mut battle = start(&config, &catalogs, p1, p2);

    attack(&mut battle, 1);
    assert!(battle
        .side(PlayerTarget::Player1)
        .has_condition(ConditionType::Charging));
    attack(&mut battle, 0);

    // Slot 7 does not exist, but the charged move is forced.
    let report = attack(&mut battle, 7);
    assert!(report.events.contains(&BattleEvent::MoveUsed {
        user: PlayerTarget::Player1,
        move_name: "SOLAR BEAM".to_string(),
    }));
    assert!(!battle
        .side(PlayerTarget::Player1)
        .has_condition(ConditionType::Charging));
    assert_eq!(battle.side(PlayerTarget::Player1).forced_move, None);
}
