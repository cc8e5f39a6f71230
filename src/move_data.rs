//! Move definitions and the `@`-delimited move record format.
//!
//! ```text
//! NAME@TYPE@CATEGORY@POWER@ACCURACY@PP@DESCRIPTION[@index:acronym:payload]*
//! ```
//!
//! Only active effects are written. Flags carry an empty payload, index 30
//! carries a location string, and every other effect carries a number.

use crate::errors::{RecordResult, SchemaError};
use schema::{
    EffectPayload, MoveCategory, MoveEffect, NameKind, PayloadKind, PokemonType,
    UnknownNameError,
};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

pub const MOVE_LEADING_FIELDS: usize = 7;
pub const STRUGGLE: &str = "STRUGGLE";

/// The active effects of a move. An effect that is not present is inactive
/// and reads as a neutral default.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct MoveEffects(BTreeMap<MoveEffect, EffectPayload>);

impl MoveEffects {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn has(&self, effect: MoveEffect) -> bool {
        self.0.contains_key(&effect)
    }

    pub fn get(&self, effect: MoveEffect) -> Option<&EffectPayload> {
        self.0.get(&effect)
    }

    /// Numeric payload, 0.0 when inactive.
    pub fn value(&self, effect: MoveEffect) -> f64 {
        match self.0.get(&effect) {
            Some(EffectPayload::Value(value)) => *value,
            Some(EffectPayload::Count(count)) => *count as f64,
            _ => 0.0,
        }
    }

    /// Count payload, 0 when inactive.
    pub fn count(&self, effect: MoveEffect) -> u32 {
        match self.0.get(&effect) {
            Some(EffectPayload::Count(count)) => *count,
            Some(EffectPayload::Value(value)) if *value > 0.0 => *value as u32,
            _ => 0,
        }
    }

    /// The phase-out location, empty when inactive.
    pub fn location(&self) -> &str {
        match self.0.get(&MoveEffect::PhaseOutLocation) {
            Some(EffectPayload::Location(location)) => location,
            _ => "",
        }
    }

    pub fn insert(&mut self, effect: MoveEffect, payload: EffectPayload) -> Option<EffectPayload> {
        self.0.insert(effect, payload)
    }

    /// Active effects in index order.
    pub fn iter(&self) -> impl Iterator<Item = (MoveEffect, &EffectPayload)> {
        self.0.iter().map(|(effect, payload)| (*effect, payload))
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    fn parse_field(&mut self, field: &str) -> RecordResult<()> {
        let mut parts = field.splitn(3, ':');
        let index_text = parts.next().unwrap_or_default().trim();
        let acronym = parts.next().map(str::trim).unwrap_or_default();
        let payload_text = parts.next().unwrap_or_default().trim();

        let index: usize = index_text
            .parse()
            .map_err(|_| SchemaError::invalid("effect index", index_text))?;
        let effect = MoveEffect::from_index(index)
            .ok_or_else(|| UnknownNameError::new(NameKind::EffectIndex, index_text))?;

        if !acronym.eq_ignore_ascii_case(effect.acronym()) {
            return Err(SchemaError::AcronymMismatch {
                index,
                expected: effect.acronym(),
                found: acronym.to_string(),
            }
            .into());
        }

        let payload = match effect.payload_kind() {
            PayloadKind::Flag => EffectPayload::Flag,
            PayloadKind::Value => EffectPayload::Value(
                payload_text
                    .parse()
                    .map_err(|_| SchemaError::invalid("effect value", field))?,
            ),
            PayloadKind::Count => EffectPayload::Count(
                payload_text
                    .parse()
                    .map_err(|_| SchemaError::invalid("effect count", field))?,
            ),
            PayloadKind::Location => EffectPayload::Location(payload_text.to_string()),
        };

        if self.0.insert(effect, payload).is_some() {
            return Err(SchemaError::DuplicateEffect { index }.into());
        }
        Ok(())
    }
}

impl FromIterator<(MoveEffect, EffectPayload)> for MoveEffects {
    fn from_iter<I: IntoIterator<Item = (MoveEffect, EffectPayload)>>(iter: I) -> Self {
        Self(iter.into_iter().collect())
    }
}

/// An immutable catalog entry. Per-combatant mutable values live in
/// [`crate::combatant::MoveInstance`].
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MoveDefinition {
    pub name: String,
    pub move_type: PokemonType,
    pub category: MoveCategory,
    pub power: i32,
    pub accuracy: i32,
    pub pp: i32,
    pub description: String,
    pub effects: MoveEffects,
}

impl MoveDefinition {
    pub fn new(
        name: &str,
        move_type: PokemonType,
        category: MoveCategory,
        power: i32,
        accuracy: i32,
        pp: i32,
    ) -> Self {
        Self {
            name: name.trim().to_uppercase(),
            move_type,
            category,
            power,
            accuracy,
            pp,
            description: String::new(),
            effects: MoveEffects::new(),
        }
    }

    pub fn with_description(mut self, description: &str) -> Self {
        self.description = description.to_string();
        self
    }

    pub fn with_effect(mut self, effect: MoveEffect, payload: EffectPayload) -> Self {
        self.effects.insert(effect, payload);
        self
    }

    /// The fallback used when the chosen move has no PP left.
    pub fn struggle(recoil_percent: f64) -> Self {
        Self::new(STRUGGLE, PokemonType::Normal, MoveCategory::Physical, 50, 100, 1)
            .with_description("Used only when no PP remains. Hurts the user.")
            .with_effect(MoveEffect::Recoil, EffectPayload::Value(recoil_percent))
    }

    pub fn is_struggle(&self) -> bool {
        self.name == STRUGGLE
    }

    /// Points this move costs at combatant creation.
    pub fn creation_cost(&self) -> u32 {
        (self.power.max(0) / 10 + 1) as u32
    }

    pub fn from_record(record: &str) -> RecordResult<Self> {
        let fields: Vec<&str> = record.trim_end_matches(['\r', '\n']).split('@').collect();
        if fields.len() < MOVE_LEADING_FIELDS {
            return Err(SchemaError::FieldCount {
                expected: "at least 7",
                found: fields.len(),
            }
            .into());
        }

        let name = fields[0].trim();
        if name.is_empty() {
            return Err(SchemaError::invalid("move name", name).into());
        }

        let mut definition = Self::new(
            name,
            PokemonType::parse(fields[1])?,
            MoveCategory::parse(fields[2])?,
            parse_move_stat("power", fields[3])?,
            parse_move_stat("accuracy", fields[4])?,
            parse_move_stat("pp", fields[5])?,
        )
        .with_description(fields[6].trim());

        for field in fields[MOVE_LEADING_FIELDS..]
            .iter()
            .filter(|field| !field.trim().is_empty())
        {
            definition.effects.parse_field(field)?;
        }

        Ok(definition)
    }

    pub fn to_record(&self) -> String {
        let mut record = format!(
            "{}@{}@{}@{}@{}@{}@{}",
            self.name,
            self.move_type,
            self.category,
            self.power,
            self.accuracy,
            self.pp,
            self.description
        );
        for (effect, payload) in self.effects.iter() {
            record.push_str(&format!(
                "@{}:{}:{}",
                effect.index(),
                effect.acronym(),
                payload.to_field()
            ));
        }
        record
    }
}

fn parse_move_stat(field: &'static str, text: &str) -> RecordResult<i32> {
    let text = text.trim();
    match text.parse::<i32>() {
        Ok(value) if value >= 0 => Ok(value),
        _ => Err(SchemaError::invalid(field, text).into()),
    }
}
