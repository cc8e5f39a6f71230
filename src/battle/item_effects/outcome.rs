use crate::combatant::{CombatantSnapshot, MoveStats};
use schema::{CombatStat, ItemProperty, MoveStat};
use serde::{Deserialize, Serialize};
use strum::IntoEnumIterator;

#[derive(Serialize, Deserialize, Debug, Clone, Copy, PartialEq, Eq)]
pub enum ChangeDirection {
    Gain,
    Loss,
}

/// Temporary changes touch a current value; permanent ones touch a maximum
/// or a persistent total.
#[derive(Serialize, Deserialize, Debug, Clone, Copy, PartialEq, Eq)]
pub enum ChangeDuration {
    Temporary,
    Permanent,
}

/// One reported property change, signed against the pre-use snapshot.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
pub struct PropertyChange {
    pub property: ItemProperty,
    /// Set for move-scoped properties.
    pub move_name: Option<String>,
    pub delta: f64,
    pub direction: ChangeDirection,
    pub duration: ChangeDuration,
}

impl PropertyChange {
    fn new(property: ItemProperty, move_name: Option<String>, delta: f64, duration: ChangeDuration) -> Self {
        let direction = if delta >= 0.0 {
            ChangeDirection::Gain
        } else {
            ChangeDirection::Loss
        };
        Self {
            property,
            move_name,
            delta,
            direction,
            duration,
        }
    }
}

/// Every property that differs between `before` and `after`. A changed
/// maximum is reported once as permanent, even though it also moves the
/// current value.
pub fn diff_snapshots(before: &CombatantSnapshot, after: &CombatantSnapshot) -> Vec<PropertyChange> {
    let mut changes = Vec::new();

    for stat in CombatStat::iter() {
        let property = ItemProperty::from_combat_stat(stat);
        push_pair(
            &mut changes,
            property,
            None,
            (before.base.get(stat) as f64, after.base.get(stat) as f64),
            (before.current.get(stat) as f64, after.current.get(stat) as f64),
        );
    }

    if after.points != before.points {
        changes.push(PropertyChange::new(
            ItemProperty::Points,
            None,
            after.points as f64 - before.points as f64,
            ChangeDuration::Permanent,
        ));
    }
    if after.experience != before.experience {
        changes.push(PropertyChange::new(
            ItemProperty::Exp,
            None,
            after.experience as f64 - before.experience as f64,
            ChangeDuration::Permanent,
        ));
    }

    for ((name, max_before, current_before), (_, max_after, current_after)) in
        before.moves.iter().zip(&after.moves)
    {
        diff_move(&mut changes, name, (max_before, max_after), (current_before, current_after));
    }

    push_pair(
        &mut changes,
        ItemProperty::CriticalHitRatio,
        None,
        (before.base.critical_hit_ratio, after.base.critical_hit_ratio),
        (before.current.critical_hit_ratio, after.current.critical_hit_ratio),
    );

    changes
}

fn diff_move(
    changes: &mut Vec<PropertyChange>,
    name: &str,
    max: (&MoveStats, &MoveStats),
    current: (&MoveStats, &MoveStats),
) {
    for stat in MoveStat::iter() {
        push_pair(
            changes,
            ItemProperty::from_move_stat(stat),
            Some(name.to_string()),
            (max.0.get(stat) as f64, max.1.get(stat) as f64),
            (current.0.get(stat) as f64, current.1.get(stat) as f64),
        );
    }
}

fn push_pair(
    changes: &mut Vec<PropertyChange>,
    property: ItemProperty,
    move_name: Option<String>,
    max: (f64, f64),
    current: (f64, f64),
) {
    if max.1 != max.0 {
        changes.push(PropertyChange::new(
            property,
            move_name,
            max.1 - max.0,
            ChangeDuration::Permanent,
        ));
    } else if current.1 != current.0 {
        changes.push(PropertyChange::new(
            property,
            move_name,
            current.1 - current.0,
            ChangeDuration::Temporary,
        ));
    }
}
