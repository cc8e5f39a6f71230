//! Item definitions and the `@`-delimited item record format.
//!
//! ```text
//! NAME@IMAGE@DESCRIPTION[@name:value,...]@F1..F13@HPCODE@G1..G3
//! ```
//!
//! A record has exactly 20 tokens without the property list and 21 with it.

use crate::errors::{RecordResult, SchemaError};
use schema::{Delta, HpRequirement, ItemProperty, MoveCategory, PokemonType, Status};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

pub const ITEM_TOKENS_WITHOUT_PROPERTIES: usize = 20;
pub const ITEM_TOKENS_WITH_PROPERTIES: usize = 21;

/// How, when and to whom an item's properties apply.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct ItemFlags {
    pub affects_self: bool,
    /// Additive when set, multiplicative otherwise.
    pub additive: bool,
    /// Targets current values when set, maximum values otherwise.
    pub current: bool,
    pub heals_all_status: bool,
    pub heals_status: Option<Status>,
    pub one_time: bool,
    pub required_move_type: Option<PokemonType>,
    pub required_move_category: Option<MoveCategory>,
    pub affects_all_stats: bool,
    pub affects_all_moves: bool,
    pub requires_move_selection: bool,
    pub restore_current_to_full: bool,
    pub affects_random_stat: bool,
    pub hp_requirement: HpRequirement,
    pub restores_lowered_stats: bool,
    pub level_up_only: bool,
    pub revives: bool,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ItemDefinition {
    pub name: String,
    pub image: String,
    pub description: String,
    pub quantity: u32,
    pub properties: BTreeMap<ItemProperty, Delta>,
    pub flags: ItemFlags,
}

impl ItemDefinition {
    /// Build and validate an item. Fails if `affects_all_stats` is combined
    /// with anything other than exactly one of the eight battle stats.
    pub fn new(
        name: &str,
        properties: BTreeMap<ItemProperty, Delta>,
        flags: ItemFlags,
    ) -> Result<Self, SchemaError> {
        let name = name.trim().to_uppercase();
        if name.is_empty() {
            return Err(SchemaError::invalid("item name", name));
        }
        if flags.affects_all_stats {
            if let Some(property) = properties
                .keys()
                .find(|property| property.combat_stat().is_none())
            {
                return Err(SchemaError::InconsistentScope {
                    item: name,
                    property: *property,
                });
            }
            // Each property fans out over every stat, so a second one would stack.
            if let Some(property) = properties.keys().nth(1) {
                return Err(SchemaError::StackedAllStats {
                    item: name,
                    property: *property,
                });
            }
        }
        Ok(Self {
            name,
            image: String::new(),
            description: String::new(),
            quantity: 1,
            properties,
            flags,
        })
    }

    pub fn with_text(mut self, image: &str, description: &str) -> Self {
        self.image = image.to_string();
        self.description = description.to_string();
        self
    }

    /// Every declared property is the maximize marker.
    pub fn maximize_values(&self) -> bool {
        !self.properties.is_empty() && self.properties.values().all(|delta| delta.is_maximize())
    }

    pub fn has_move_properties(&self) -> bool {
        self.properties.keys().any(|property| property.is_move_scoped())
    }

    pub fn from_record(record: &str) -> RecordResult<Self> {
        let tokens: Vec<&str> = record.trim_end_matches(['\r', '\n']).split('@').collect();
        let has_properties = match tokens.len() {
            ITEM_TOKENS_WITHOUT_PROPERTIES => false,
            ITEM_TOKENS_WITH_PROPERTIES => true,
            found => {
                return Err(SchemaError::FieldCount {
                    expected: "20 or 21",
                    found,
                }
                .into())
            }
        };

        let properties = if has_properties {
            parse_properties(tokens[3])?
        } else {
            BTreeMap::new()
        };
        let additive = parse_flag("additive", tokens_after(&tokens, has_properties, 1))?;
        if additive {
            if let Some((property, _)) = properties
                .iter()
                .find(|(_, delta)| matches!(delta, Delta::By(value) if value.fract() != 0.0))
            {
                return Err(SchemaError::invalid("additive property value", property.to_string()).into());
            }
        }

        let flag = |position: usize, field: &'static str| {
            parse_flag(field, tokens_after(&tokens, has_properties, position))
        };
        let flags = ItemFlags {
            affects_self: flag(0, "affectsSelf")?,
            additive,
            current: flag(2, "current")?,
            heals_all_status: flag(3, "healsAllStatus")?,
            heals_status: parse_optional(tokens_after(&tokens, has_properties, 4), Status::parse)?,
            one_time: flag(5, "oneTime")?,
            required_move_type: parse_optional(
                tokens_after(&tokens, has_properties, 6),
                PokemonType::parse,
            )?,
            required_move_category: parse_optional(
                tokens_after(&tokens, has_properties, 7),
                MoveCategory::parse,
            )?,
            affects_all_stats: flag(8, "affectsAllStats")?,
            affects_all_moves: flag(9, "affectsAllMoves")?,
            requires_move_selection: flag(10, "requiresMoveSelection")?,
            restore_current_to_full: flag(11, "restoreCurrentToFull")?,
            affects_random_stat: flag(12, "affectsRandomStat")?,
            hp_requirement: {
                let text = tokens_after(&tokens, has_properties, 13).trim();
                text.parse()
                    .map_err(|_| SchemaError::invalid("hp requirement", text))?
            },
            restores_lowered_stats: flag(14, "restoresLoweredStats")?,
            level_up_only: flag(15, "levelUpOnly")?,
            revives: flag(16, "revives")?,
        };

        Ok(Self::new(tokens[0], properties, flags)?.with_text(tokens[1].trim(), tokens[2].trim()))
    }

    pub fn to_record(&self) -> String {
        let flags = &self.flags;
        let mut tokens: Vec<String> = vec![
            self.name.clone(),
            self.image.clone(),
            self.description.clone(),
        ];
        if !self.properties.is_empty() {
            let list: Vec<String> = self
                .properties
                .iter()
                .map(|(property, delta)| format!("{}:{}", property, delta.to_field(flags.additive)))
                .collect();
            tokens.push(list.join(","));
        }
        let optional = |value: Option<String>| value.unwrap_or_else(|| "NA".to_string());
        tokens.extend([
            bool_token(flags.affects_self),
            bool_token(flags.additive),
            bool_token(flags.current),
            bool_token(flags.heals_all_status),
            optional(flags.heals_status.map(|status| status.to_string())),
            bool_token(flags.one_time),
            optional(flags.required_move_type.map(|t| t.to_string())),
            optional(flags.required_move_category.map(|c| c.to_string())),
            bool_token(flags.affects_all_stats),
            bool_token(flags.affects_all_moves),
            bool_token(flags.requires_move_selection),
            bool_token(flags.restore_current_to_full),
            bool_token(flags.affects_random_stat),
            flags.hp_requirement.to_string(),
            bool_token(flags.restores_lowered_stats),
            bool_token(flags.level_up_only),
            bool_token(flags.revives),
        ]);
        tokens.join("@")
    }
}

/// Flag tokens start right after the optional property list.
fn tokens_after<'a>(tokens: &[&'a str], has_properties: bool, position: usize) -> &'a str {
    let start = if has_properties { 4 } else { 3 };
    tokens[start + position]
}

fn bool_token(value: bool) -> String {
    let token = if value { "T" } else { "F" };
    token.to_string()
}

fn parse_flag(field: &'static str, text: &str) -> Result<bool, SchemaError> {
    match text.trim() {
        "T" | "t" => Ok(true),
        "F" | "f" => Ok(false),
        other => Err(SchemaError::invalid(field, other)),
    }
}

fn parse_optional<T, E>(text: &str, parse: impl Fn(&str) -> Result<T, E>) -> Result<Option<T>, E> {
    let text = text.trim();
    if text.eq_ignore_ascii_case("NA") {
        Ok(None)
    } else {
        parse(text).map(Some)
    }
}

fn parse_properties(text: &str) -> RecordResult<BTreeMap<ItemProperty, Delta>> {
    let mut properties = BTreeMap::new();
    for entry in text.split(',').map(str::trim).filter(|entry| !entry.is_empty()) {
        let (name, value) = entry
            .split_once(':')
            .ok_or_else(|| SchemaError::invalid("item property", entry))?;
        let property = ItemProperty::parse(name)?;
        let value: f64 = value
            .trim()
            .parse()
            .map_err(|_| SchemaError::invalid("item property value", entry))?;
        if properties.insert(property, Delta::from_raw(value)).is_some() {
            return Err(SchemaError::DuplicateProperty { property }.into());
        }
    }
    Ok(properties)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::errors::RecordError;
    use pretty_assertions::assert_eq;
    use schema::{NameKind, UnknownNameError};

    const POTION: &str = "POTION@potion.png@Restores 20 HP.@hp:20@T@T@T@F@NA@T@NA@NA@F@F@F@F@F@NA@F@F@F";
    const FULL_HEAL: &str = "FULL HEAL@fullheal.png@Cures any status.@T@T@T@T@NA@T@NA@NA@F@F@F@F@F@NA@F@F@F";

    #[test]
    fn test_parse_potion() {
        let potion = ItemDefinition::from_record(POTION).unwrap();
        assert_eq!(potion.name, "POTION");
        assert_eq!(potion.properties.get(&ItemProperty::Hp), Some(&Delta::By(20.0)));
        assert!(potion.flags.affects_self && potion.flags.additive && potion.flags.current);
        assert!(potion.flags.one_time);
        assert_eq!(potion.flags.hp_requirement, HpRequirement::None);
        assert_eq!(potion.quantity, 1);
        assert_eq!(potion.to_record(), POTION);
    }

    #[test]
    fn test_twenty_token_record_has_no_properties() {
        let full_heal = ItemDefinition::from_record(FULL_HEAL).unwrap();
        assert!(full_heal.properties.is_empty());
        assert!(full_heal.flags.heals_all_status);
        assert!(!full_heal.maximize_values());
        assert_eq!(full_heal.to_record(), FULL_HEAL);
    }

    #[test]
    fn test_zero_loads_as_maximize() {
        let record = "MAX ELIXIR@elixir.png@Restores all PP.@movePP:0@T@T@T@F@NA@T@NA@NA@F@T@F@F@F@NA@F@F@F";
        let elixir = ItemDefinition::from_record(record).unwrap();
        assert_eq!(elixir.properties.get(&ItemProperty::MovePp), Some(&Delta::Maximize));
        assert!(elixir.maximize_values());
        assert!(elixir.has_move_properties());
    }

    #[test]
    fn test_gates_and_bands() {
        let record = "FLAME ORB@orb.png@Boosts fire moves.@movePower:1.5@T@F@T@F@NA@F@FIRE@SPECIAL@F@F@T@F@F@LT66@F@F@F";
        let orb = ItemDefinition::from_record(record).unwrap();
        assert_eq!(orb.flags.required_move_type, Some(PokemonType::Fire));
        assert_eq!(orb.flags.required_move_category, Some(MoveCategory::Special));
        assert_eq!(orb.flags.hp_requirement, HpRequirement::Below66);
        assert_eq!(orb.properties.get(&ItemProperty::MovePower), Some(&Delta::By(1.5)));
        assert_eq!(orb.to_record(), record);
    }

    #[test]
    fn test_token_count_outside_allowed_lengths() {
        let err = ItemDefinition::from_record("POTION@potion.png@Restores 20 HP.@T@T").unwrap_err();
        assert_eq!(
            err,
            RecordError::Schema(SchemaError::FieldCount {
                expected: "20 or 21",
                found: 5
            })
        );
    }

    #[test]
    fn test_unknown_property_name() {
        let record = "ODD@odd.png@Odd.@luck:5@T@T@T@F@NA@T@NA@NA@F@F@F@F@F@NA@F@F@F";
        let err = ItemDefinition::from_record(record).unwrap_err();
        assert!(matches!(
            err,
            RecordError::UnknownName(UnknownNameError { kind: NameKind::Property, .. })
        ));
    }

    #[test]
    fn test_all_stats_with_move_property_is_inconsistent() {
        let record = "ODD@odd.png@Odd.@movePower:5@T@T@T@F@NA@T@NA@NA@T@F@F@F@F@NA@F@F@F";
        let err = ItemDefinition::from_record(record).unwrap_err();
        assert_eq!(
            err,
            RecordError::Schema(SchemaError::InconsistentScope {
                item: "ODD".to_string(),
                property: ItemProperty::MovePower
            })
        );
    }

    #[test]
    fn test_all_stats_with_two_stats_is_rejected() {
        let record = "ODD@odd.png@Odd.@attack:2,defense:2@T@T@F@F@NA@T@NA@NA@T@F@F@F@F@NA@F@F@F";
        let err = ItemDefinition::from_record(record).unwrap_err();
        assert_eq!(
            err,
            RecordError::Schema(SchemaError::StackedAllStats {
                item: "ODD".to_string(),
                property: ItemProperty::Defense
            })
        );
    }

    #[test]
    fn test_bad_flag_token() {
        let record = "POTION@potion.png@Restores 20 HP.@hp:20@Y@T@T@F@NA@T@NA@NA@F@F@F@F@F@NA@F@F@F";
        let err = ItemDefinition::from_record(record).unwrap_err();
        assert!(matches!(err, RecordError::Schema(SchemaError::InvalidField { field: "affectsSelf", .. })));
    }
}
