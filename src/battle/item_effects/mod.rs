//! Item effect resolution.
//!
//! An item is checked against its gates, then each declared property is
//! applied to the target with the item's additive/multiplicative and
//! current/maximum modes. The reported changes are a diff of the target
//! before and after, so reporting never interleaves with mutation.

mod apply;
mod outcome;

pub use self::outcome::{diff_snapshots, ChangeDirection, ChangeDuration, PropertyChange};

use self::apply::{apply_property, restore_lowered_stats};
use crate::battle::state::TurnRng;
use crate::combatant::{Combatant, CombatantSnapshot};
use crate::config::BattleConfig;
use crate::errors::{BattleError, EngineResult, ItemRejection};
use crate::item_data::ItemDefinition;
use crate::progression::LevelUp;
use schema::{ItemProperty, Status};
use serde::{Deserialize, Serialize};
use strum::IntoEnumIterator;
use tracing::debug;

/// Situation an item is used in.
#[derive(Debug, Clone, Copy)]
pub struct ResolveContext<'a> {
    /// True while a level-up is being processed.
    pub on_level_up: bool,
    pub config: &'a BattleConfig,
}

impl<'a> ResolveContext<'a> {
    pub fn new(config: &'a BattleConfig) -> Self {
        Self {
            on_level_up: false,
            config,
        }
    }

    pub fn level_up(config: &'a BattleConfig) -> Self {
        Self {
            on_level_up: true,
            config,
        }
    }
}

#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
pub struct ItemOutcome {
    pub item: String,
    pub target_is_user: bool,
    pub changes: Vec<PropertyChange>,
    pub cured: Option<Status>,
    pub revived: bool,
    pub level_up: Option<LevelUp>,
    pub consumed: bool,
    /// Quantity the user still holds.
    pub remaining: u32,
}

#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
pub enum ItemUse {
    Applied(ItemOutcome),
    Rejected(ItemRejection),
}

impl ItemUse {
    pub fn is_applied(&self) -> bool {
        matches!(self, ItemUse::Applied(_))
    }
}

/// Resolve `item` held by `user`. The target is `user` or `opponent`
/// depending on the item's `affects_self` flag. A rejected use leaves both
/// combatants untouched.
pub fn resolve_item(
    item: &ItemDefinition,
    user: &mut Combatant,
    opponent: &mut Combatant,
    rng: &mut TurnRng,
    context: ResolveContext<'_>,
) -> EngineResult<ItemUse> {
    if user.item_quantity(&item.name) == 0 {
        return Err(BattleError::ItemNotHeld(item.name.clone()).into());
    }

    let target_is_user = item.flags.affects_self;
    let target: &mut Combatant = if target_is_user {
        &mut *user
    } else {
        &mut *opponent
    };

    if let Err(rejection) = check_gates(item, target, &context) {
        debug!(item = %item.name, %rejection, "item rejected");
        return Ok(ItemUse::Rejected(rejection));
    }

    let before = CombatantSnapshot::capture(target);

    let revived = item.flags.revives && target.status == Status::Fainted;
    if revived {
        target.set_status(Status::Normal);
    }

    let mut level_up: Option<LevelUp> = None;
    for (property, delta) in &item.properties {
        let property = if item.flags.affects_random_stat {
            let properties: Vec<ItemProperty> = ItemProperty::iter().collect();
            properties[rng.next_index(properties.len(), "random item property")]
        } else {
            *property
        };

        if let Some(gained) = apply_property(target, item, property, *delta, context.config) {
            level_up = Some(merge_level_ups(level_up, gained));
        }
    }

    if item.flags.restores_lowered_stats {
        restore_lowered_stats(target);
    }

    if target.current.hp > 0 {
        if item.flags.heals_all_status && target.status != Status::Normal {
            target.set_status(Status::Normal);
        }
        if let Some(status) = item.flags.heals_status {
            if target.status == status {
                target.set_status(Status::Normal);
            }
        }
    } else if revived {
        // Nothing restored any HP, so the revive does not stick.
        target.set_status(Status::Fainted);
    }

    let after = CombatantSnapshot::capture(target);
    let cured = match (before.status, after.status) {
        (previous, Status::Normal) if previous != Status::Normal && previous != Status::Fainted => {
            Some(previous)
        }
        _ => None,
    };
    let revived = revived && after.status != Status::Fainted;
    let changes = diff_snapshots(&before, &after);

    let (consumed, remaining) = if item.flags.one_time {
        (true, user.consume_item(&item.name).unwrap_or(0))
    } else {
        (false, user.item_quantity(&item.name))
    };

    debug!(
        item = %item.name,
        target_is_user,
        changes = changes.len(),
        consumed,
        remaining,
        "item resolved"
    );

    Ok(ItemUse::Applied(ItemOutcome {
        item: item.name.clone(),
        target_is_user,
        changes,
        cured,
        revived,
        level_up,
        consumed,
        remaining,
    }))
}

/// Gates in order: fainted target, level-up-only, move selection, move
/// type and category, then HP band.
fn check_gates(
    item: &ItemDefinition,
    target: &Combatant,
    context: &ResolveContext<'_>,
) -> Result<(), ItemRejection> {
    let flags = &item.flags;

    if target.is_fainted() && !flags.revives {
        return Err(ItemRejection::TargetFainted);
    }
    if flags.level_up_only && !context.on_level_up {
        return Err(ItemRejection::LevelUpOnly);
    }

    let selected = target.selected_move_instance();
    if flags.requires_move_selection && selected.is_none() {
        return Err(ItemRejection::NoMoveSelected);
    }

    if !flags.affects_all_moves {
        if let Some(required) = flags.required_move_type {
            match selected {
                None => return Err(ItemRejection::NoMoveSelected),
                Some(instance) if instance.definition.move_type != required => {
                    return Err(ItemRejection::WrongMoveType { required });
                }
                Some(_) => {}
            }
        }
        if let Some(required) = flags.required_move_category {
            match selected {
                None => return Err(ItemRejection::NoMoveSelected),
                Some(instance) if instance.definition.category != required => {
                    return Err(ItemRejection::WrongMoveCategory { required });
                }
                Some(_) => {}
            }
        }
        if item.has_move_properties() && !flags.affects_random_stat && selected.is_none() {
            return Err(ItemRejection::NoMoveSelected);
        }
    }

    if !flags.hp_requirement.is_met(target.hp_ratio()) {
        return Err(ItemRejection::HpBandNotMet);
    }
    Ok(())
}

fn merge_level_ups(previous: Option<LevelUp>, next: LevelUp) -> LevelUp {
    match previous {
        None => next,
        Some(previous) => LevelUp {
            levels_gained: previous.levels_gained + next.levels_gained,
            points_awarded: previous.points_awarded + next.points_awarded,
            new_level: next.new_level.max(previous.new_level),
        },
    }
}

