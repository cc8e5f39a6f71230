use crate::names::{parse_name, NameKind, UnknownNameError};
use serde::{Deserialize, Serialize};
use strum::{Display, EnumCount, EnumIter, EnumString, IntoStaticStr};

/// The sixteen elemental types. The discriminant is the row/column index
/// into [`EFFECTIVENESS_TABLE`].
#[derive(
    Debug,
    Clone,
    Copy,
    PartialEq,
    Eq,
    Hash,
    PartialOrd,
    Ord,
    Serialize,
    Deserialize,
    Display,
    EnumString,
    EnumIter,
    EnumCount,
    IntoStaticStr,
)]
#[strum(serialize_all = "UPPERCASE", ascii_case_insensitive)]
pub enum PokemonType {
    Normal = 0,
    Fire,
    Water,
    Electric,
    Grass,
    Ice,
    Fighting,
    Poison,
    Ground,
    Flying,
    Psychic,
    Bug,
    Rock,
    Ghost,
    Dragon,
    Dark,
}

/// Matchup class stored in the effectiveness table.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Effectiveness {
    Regular,
    NotVery,
    Super,
    None,
}

impl Effectiveness {
    pub fn from_code(code: u8) -> Option<Self> {
        match code {
            0 => Some(Effectiveness::Regular),
            1 => Some(Effectiveness::NotVery),
            2 => Some(Effectiveness::Super),
            3 => Some(Effectiveness::None),
            _ => None,
        }
    }

    pub fn multiplier(self) -> f64 {
        match self {
            Effectiveness::Regular => 1.0,
            Effectiveness::NotVery => 0.5,
            Effectiveness::Super => 2.0,
            Effectiveness::None => 0.0,
        }
    }

    /// Classify a combined (possibly dual-type) multiplier.
    pub fn classify(multiplier: f64) -> Self {
        if multiplier == 0.0 {
            Effectiveness::None
        } else if multiplier > 1.0 {
            Effectiveness::Super
        } else if multiplier < 1.0 {
            Effectiveness::NotVery
        } else {
            Effectiveness::Regular
        }
    }
}

/// Attack type (row) x defend type (column).
/// 0 = regular, 1 = not very effective, 2 = super effective, 3 = no effect.
#[rustfmt::skip]
pub const EFFECTIVENESS_TABLE: [[u8; 16]; 16] = [
    //        NOR FIR WAT ELE GRA ICE FIG POI GRO FLY PSY BUG ROC GHO DRA DAR
    /* NOR */ [0,  0,  0,  0,  0,  0,  0,  0,  0,  0,  0,  0,  1,  3,  0,  0],
    /* FIR */ [0,  1,  1,  0,  2,  2,  0,  0,  0,  0,  0,  2,  1,  0,  1,  0],
    /* WAT */ [0,  2,  1,  0,  1,  0,  0,  0,  2,  0,  0,  0,  2,  0,  1,  0],
    /* ELE */ [0,  0,  2,  1,  1,  0,  0,  0,  3,  2,  0,  0,  0,  0,  1,  0],
    /* GRA */ [0,  1,  2,  0,  1,  0,  0,  1,  2,  1,  0,  1,  2,  0,  1,  0],
    /* ICE */ [0,  1,  1,  0,  2,  1,  0,  0,  2,  2,  0,  0,  0,  0,  2,  0],
    /* FIG */ [2,  0,  0,  0,  0,  2,  0,  1,  0,  1,  1,  1,  2,  3,  0,  2],
    /* POI */ [0,  0,  0,  0,  2,  0,  0,  1,  1,  0,  0,  0,  1,  1,  0,  0],
    /* GRO */ [0,  2,  0,  2,  1,  0,  0,  2,  0,  3,  0,  1,  2,  0,  0,  0],
    /* FLY */ [0,  0,  0,  1,  2,  0,  2,  0,  0,  0,  0,  2,  1,  0,  0,  0],
    /* PSY */ [0,  0,  0,  0,  0,  0,  2,  2,  0,  0,  1,  0,  0,  0,  0,  3],
    /* BUG */ [0,  1,  0,  0,  2,  0,  1,  1,  0,  1,  2,  0,  0,  1,  0,  2],
    /* ROC */ [0,  2,  0,  0,  0,  2,  1,  0,  1,  2,  0,  2,  0,  0,  0,  0],
    /* GHO */ [3,  0,  0,  0,  0,  0,  0,  0,  0,  0,  2,  0,  0,  2,  0,  1],
    /* DRA */ [0,  0,  0,  0,  0,  0,  0,  0,  0,  0,  0,  0,  0,  0,  2,  0],
    /* DAR */ [0,  0,  0,  0,  0,  0,  1,  0,  0,  0,  2,  0,  0,  2,  0,  1],
];

impl PokemonType {
    pub fn index(self) -> usize {
        self as usize
    }

    pub fn parse(name: &str) -> Result<Self, UnknownNameError> {
        parse_name(NameKind::Type, name)
    }

    /// Matchup class for attacking type vs defending type
    pub fn matchup(attacking: PokemonType, defending: PokemonType) -> Effectiveness {
        let code = EFFECTIVENESS_TABLE[attacking.index()][defending.index()];
        // Table codes are always 0..=3.
        Effectiveness::from_code(code).unwrap_or(Effectiveness::Regular)
    }

    /// Calculate type effectiveness multiplier for attacking type vs defending type
    /// Returns: 2.0 = Super Effective, 1.0 = Normal, 0.5 = Not Very Effective, 0.0 = No Effect
    pub fn type_effectiveness(attacking: PokemonType, defending: PokemonType) -> f64 {
        Self::matchup(attacking, defending).multiplier()
    }

    /// Combined multiplier against every type the defender has.
    pub fn effectiveness_against(attacking: PokemonType, defending: &[PokemonType]) -> f64 {
        defending
            .iter()
            .map(|&defend| Self::type_effectiveness(attacking, defend))
            .product()
    }
}

/// Name-based lookup used by catalog and collaborator code. Fails with an
/// unknown-type error instead of defaulting.
pub fn effectiveness_by_name(attacking: &str, defending: &str) -> Result<f64, UnknownNameError> {
    let attacking = PokemonType::parse(attacking)?;
    let defending = PokemonType::parse(defending)?;
    Ok(PokemonType::type_effectiveness(attacking, defending))
}
