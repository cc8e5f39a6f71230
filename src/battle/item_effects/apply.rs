use crate::combatant::Combatant;
use crate::config::BattleConfig;
use crate::item_data::{ItemDefinition, ItemFlags};
use crate::progression::{award_experience, exp_to_next_level, LevelUp};
use schema::{CombatStat, Delta, ItemProperty, MoveStat};
use strum::IntoEnumIterator;

/// Apply one property to the target. Returns the level-up caused by an
/// experience property, if any.
pub(super) fn apply_property(
    target: &mut Combatant,
    item: &ItemDefinition,
    property: ItemProperty,
    delta: Delta,
    config: &BattleConfig,
) -> Option<LevelUp> {
    let restores = restores_to_max(item);

    match property {
        ItemProperty::Exp => return apply_experience(target, &item.flags, delta, config),
        ItemProperty::Points => apply_points(target, &item.flags, delta),
        ItemProperty::CriticalHitRatio => apply_crit_ratio(target, &item.flags, delta, restores),
        _ => {}
    }

    if let Some(stat) = property.combat_stat() {
        if item.flags.affects_all_stats {
            for stat in CombatStat::iter() {
                apply_combat_stat(target, &item.flags, stat, delta, restores);
            }
        } else {
            apply_combat_stat(target, &item.flags, stat, delta, restores);
        }
    } else if let Some(stat) = property.move_stat() {
        for index in move_scope(item, target) {
            apply_move_stat(target, &item.flags, index, stat, delta, restores);
        }
    }
    None
}

/// Moves a move-scoped property applies to: every matching move for
/// all-moves items, otherwise the selected move.
pub(super) fn move_scope(item: &ItemDefinition, target: &Combatant) -> Vec<usize> {
    let flags = &item.flags;
    if !flags.affects_all_moves {
        return target
            .selected_move
            .filter(|index| *index < target.moves.len())
            .into_iter()
            .collect();
    }
    target
        .moves
        .iter()
        .enumerate()
        .filter(|(_, instance)| {
            flags
                .required_move_type
                .map_or(true, |required| instance.definition.move_type == required)
                && flags
                    .required_move_category
                    .map_or(true, |required| instance.definition.category == required)
        })
        .map(|(index, _)| index)
        .collect()
}

/// Snap every battle stat other than HP, and the crit ratio, back up to its
/// maximum.
pub(super) fn restore_lowered_stats(target: &mut Combatant) {
    for stat in CombatStat::iter().filter(|stat| *stat != CombatStat::Hp) {
        if target.current_stat(stat) < target.stat(stat) {
            target.set_current_stat(stat, target.stat(stat));
        }
    }
    if target.current.critical_hit_ratio < target.base.critical_hit_ratio {
        target.current.critical_hit_ratio = target.base.critical_hit_ratio;
    }
}

fn restores_to_max(item: &ItemDefinition) -> bool {
    item.flags.restore_current_to_full || item.maximize_values() || item.flags.restores_lowered_stats
}

/// Additive deltas add as given; multiplicative deltas scale the present value.
fn change_for(present: f64, delta: f64, additive: bool) -> f64 {
    if additive {
        delta
    } else {
        present * delta
    }
}

fn apply_combat_stat(
    target: &mut Combatant,
    flags: &ItemFlags,
    stat: CombatStat,
    delta: Delta,
    restores: bool,
) {
    let max = target.stat(stat);
    let present = target.current_stat(stat);
    match delta {
        Delta::Maximize => target.set_current_stat(stat, max),
        Delta::By(value) if flags.current => {
            let change = change_for(present as f64, value, flags.additive).trunc() as i32;
            target.set_current_stat(stat, (present + change).clamp(0, max));
        }
        Delta::By(value) => {
            let change = change_for(present as f64, value, flags.additive).trunc() as i32;
            target.set_base_stat(stat, (max + change).max(1));
        }
    }
    try_restore_current(target, stat, restores);
}

fn try_restore_current(target: &mut Combatant, stat: CombatStat, restores: bool) {
    if restores && target.current_stat(stat) < target.stat(stat) {
        target.set_current_stat(stat, target.stat(stat));
    }
}

fn apply_crit_ratio(target: &mut Combatant, flags: &ItemFlags, delta: Delta, restores: bool) {
    let present = target.current.critical_hit_ratio;
    match delta {
        Delta::Maximize => target.current.critical_hit_ratio = target.base.critical_hit_ratio,
        Delta::By(value) if flags.current => {
            target.current.critical_hit_ratio =
                (present + change_for(present, value, flags.additive)).max(0.0);
        }
        Delta::By(value) => {
            let raised = target.base.critical_hit_ratio + change_for(present, value, flags.additive);
            target.base.critical_hit_ratio = raised.max(0.0);
            target.current.critical_hit_ratio = target.base.critical_hit_ratio;
        }
    }
    if restores && target.current.critical_hit_ratio < target.base.critical_hit_ratio {
        target.current.critical_hit_ratio = target.base.critical_hit_ratio;
    }
}

fn apply_experience(
    target: &mut Combatant,
    flags: &ItemFlags,
    delta: Delta,
    config: &BattleConfig,
) -> Option<LevelUp> {
    let amount = match delta {
        Delta::Maximize => exp_to_next_level(target),
        Delta::By(value) => {
            let change = change_for(target.experience as f64, value, flags.additive);
            if change <= 0.0 {
                return None;
            }
            change.trunc() as u32
        }
    };
    if amount == 0 {
        return None;
    }
    Some(award_experience(target, amount, config))
}

fn apply_points(target: &mut Combatant, flags: &ItemFlags, delta: Delta) {
    if let Delta::By(value) = delta {
        let present = target.points as f64;
        target.points = (present + change_for(present, value, flags.additive))
            .max(0.0)
            .trunc() as u32;
    }
}

fn apply_move_stat(
    target: &mut Combatant,
    flags: &ItemFlags,
    index: usize,
    stat: MoveStat,
    delta: Delta,
    restores: bool,
) {
    let Some(instance) = target.moves.get_mut(index) else {
        return;
    };
    let max = instance.max.get(stat);
    let present = instance.current.get(stat);
    match delta {
        Delta::Maximize => instance.restore(stat),
        Delta::By(value) if flags.current => {
            let change = change_for(present as f64, value, flags.additive).trunc() as i32;
            instance.current.set(stat, (present + change).clamp(0, max));
        }
        Delta::By(value) => {
            let change = change_for(present as f64, value, flags.additive).trunc() as i32;
            instance.max.set(stat, (max + change).max(0));
            instance.restore(stat);
        }
    }
    if restores && instance.current.get(stat) < instance.max.get(stat) {
        instance.restore(stat);
    }
}
