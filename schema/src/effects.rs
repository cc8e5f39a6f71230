//! The closed enumeration of move effects.
//!
//! Each effect has a fixed index (0..=72) used by the catalog record format,
//! a short acronym written next to the index, and a payload kind describing
//! what the third `index:acronym:payload` field carries.

use crate::move_types::{CombatStat, ModifiedStat, MoveStat};
use serde::{Deserialize, Serialize};
use std::fmt;

pub const EFFECT_COUNT: usize = 73;

/// What an active effect carries alongside its flag.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum PayloadKind {
    Flag,
    Value,
    Count,
    Location,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum EffectPayload {
    Flag,
    Value(f64),
    Count(u32),
    Location(String),
}

impl EffectPayload {
    pub fn kind(&self) -> PayloadKind {
        match self {
            EffectPayload::Flag => PayloadKind::Flag,
            EffectPayload::Value(_) => PayloadKind::Value,
            EffectPayload::Count(_) => PayloadKind::Count,
            EffectPayload::Location(_) => PayloadKind::Location,
        }
    }

    /// Record text for this payload. Flags serialize as an empty field.
    pub fn to_field(&self) -> String {
        match self {
            EffectPayload::Flag => String::new(),
            EffectPayload::Value(value) => format_value(*value),
            EffectPayload::Count(count) => count.to_string(),
            EffectPayload::Location(location) => location.clone(),
        }
    }
}

fn format_value(value: f64) -> String {
    if value.fract() == 0.0 {
        format!("{}", value as i64)
    } else {
        value.to_string()
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum MoveEffect {
    // Application scope
    AffectsSelf = 0,
    SelfOnly,
    PercentChance,

    // Usage preconditions
    RequiresHitByAttack,
    RequiresHitByCategory,
    RequiresTargetAsleep,
    RequiresTargetUnderground,
    RequiresTargetFlying,

    // Damage modifiers
    MultiTurnDamage,
    MultiHit,
    FixedDamage,
    PercentLevelDamage,
    PercentMaxHpDamage,
    HalveTargetHp,
    Recoil,
    Drain,
    NeverMiss,

    // Status infliction
    Flinch,
    Burn,
    Freeze,
    Paralyze,
    Poison,
    Sleep,
    Bind,
    Confuse,
    FaintTarget,
    FaintSelf,
    Trap,
    SleepSelf,
    PhaseOut,
    PhaseOutLocation,

    // Stat raises
    RaiseHp,
    RaiseAttack,
    RaiseDefense,
    RaiseSpecialAttack,
    RaiseSpecialDefense,
    RaiseSpeed,
    RaiseEvasion,
    RaiseAccuracy,
    RaiseMovePower,
    RaiseMoveAccuracy,
    RaiseMovePp,

    // Stat lowers
    LowerHp,
    LowerAttack,
    LowerDefense,
    LowerSpecialAttack,
    LowerSpecialDefense,
    LowerSpeed,
    LowerEvasion,
    LowerAccuracy,
    LowerMovePower,
    LowerMoveAccuracy,
    LowerMovePp,

    // Critical ratio and stat bookkeeping
    TemporaryCritRatio,
    PermanentCritRatio,
    ResetAllChanges,
    LockStats,

    // Post-attack
    TypeChange,
    AttackDenial,
    OnMiss,
    OnSpecialHit,
    OnPhysicalHit,
    Decoy,
    MoneyGain,

    // Multi-turn
    ChargeThenAttack,
    LoseNextTurns,
    Underground,
    Flying,

    // Move substitution
    RandomMove,
    CopyLastMove,

    // Utility
    HealPercent,
    Transform,
    CritBoost,
}

use MoveEffect::*;
use PayloadKind::{Count, Flag, Location, Value};

/// Index-ordered table of (effect, acronym, payload kind).
#[rustfmt::skip]
const EFFECT_TABLE: [(MoveEffect, &str, PayloadKind); EFFECT_COUNT] = [
    (AffectsSelf, "AS", Flag),
    (SelfOnly, "SO", Flag),
    (PercentChance, "PC", Value),
    (RequiresHitByAttack, "RHA", Flag),
    (RequiresHitByCategory, "RHC", Count),
    (RequiresTargetAsleep, "RTA", Flag),
    (RequiresTargetUnderground, "RTU", Flag),
    (RequiresTargetFlying, "RTF", Flag),
    (MultiTurnDamage, "MTD", Count),
    (MultiHit, "MH", Count),
    (FixedDamage, "FD", Value),
    (PercentLevelDamage, "PLD", Value),
    (PercentMaxHpDamage, "PMD", Value),
    (HalveTargetHp, "HTH", Flag),
    (Recoil, "RC", Value),
    (Drain, "DR", Value),
    (NeverMiss, "NM", Flag),
    (Flinch, "FL", Flag),
    (Burn, "BRN", Flag),
    (Freeze, "FRZ", Flag),
    (Paralyze, "PAR", Flag),
    (Poison, "PSN", Flag),
    (Sleep, "SLP", Count),
    (Bind, "BND", Count),
    (Confuse, "CNF", Count),
    (FaintTarget, "FT", Flag),
    (FaintSelf, "FS", Flag),
    (Trap, "TR", Count),
    (SleepSelf, "SS", Count),
    (PhaseOut, "PO", Flag),
    (PhaseOutLocation, "POL", Location),
    (RaiseHp, "RHP", Value),
    (RaiseAttack, "RATK", Value),
    (RaiseDefense, "RDEF", Value),
    (RaiseSpecialAttack, "RSPA", Value),
    (RaiseSpecialDefense, "RSPD", Value),
    (RaiseSpeed, "RSPE", Value),
    (RaiseEvasion, "REVA", Value),
    (RaiseAccuracy, "RACC", Value),
    (RaiseMovePower, "RMPW", Value),
    (RaiseMoveAccuracy, "RMAC", Value),
    (RaiseMovePp, "RMPP", Value),
    (LowerHp, "LHP", Value),
    (LowerAttack, "LATK", Value),
    (LowerDefense, "LDEF", Value),
    (LowerSpecialAttack, "LSPA", Value),
    (LowerSpecialDefense, "LSPD", Value),
    (LowerSpeed, "LSPE", Value),
    (LowerEvasion, "LEVA", Value),
    (LowerAccuracy, "LACC", Value),
    (LowerMovePower, "LMPW", Value),
    (LowerMoveAccuracy, "LMAC", Value),
    (LowerMovePp, "LMPP", Value),
    (TemporaryCritRatio, "TCR", Value),
    (PermanentCritRatio, "PCR", Value),
    (ResetAllChanges, "RAC", Flag),
    (LockStats, "LS", Flag),
    (TypeChange, "TC", Flag),
    (AttackDenial, "AD", Count),
    (OnMiss, "OM", Value),
    (OnSpecialHit, "OSH", Value),
    (OnPhysicalHit, "OPH", Value),
    (Decoy, "DCY", Value),
    (MoneyGain, "MG", Value),
    (ChargeThenAttack, "CTA", Flag),
    (LoseNextTurns, "LNT", Count),
    (Underground, "UG", Flag),
    (Flying, "FLY", Flag),
    (RandomMove, "RM", Flag),
    (CopyLastMove, "CLM", Flag),
    (HealPercent, "HL", Value),
    (Transform, "TF", Flag),
    (CritBoost, "CB", Value),
];

impl MoveEffect {
    pub fn index(self) -> usize {
        self as usize
    }

    pub fn from_index(index: usize) -> Option<Self> {
        EFFECT_TABLE.get(index).map(|(effect, _, _)| *effect)
    }

    pub fn acronym(self) -> &'static str {
        EFFECT_TABLE[self.index()].1
    }

    pub fn payload_kind(self) -> PayloadKind {
        EFFECT_TABLE[self.index()].2
    }

    pub fn all() -> impl Iterator<Item = MoveEffect> {
        EFFECT_TABLE.iter().map(|(effect, _, _)| *effect)
    }

    /// For the 22 raise/lower effects: the stat touched and the sign.
    pub fn stat_modifier(self) -> Option<(ModifiedStat, i32)> {
        let (stat, sign) = match self {
            RaiseHp => (ModifiedStat::Combat(CombatStat::Hp), 1),
            RaiseAttack => (ModifiedStat::Combat(CombatStat::Attack), 1),
            RaiseDefense => (ModifiedStat::Combat(CombatStat::Defense), 1),
            RaiseSpecialAttack => (ModifiedStat::Combat(CombatStat::SpecialAttack), 1),
            RaiseSpecialDefense => (ModifiedStat::Combat(CombatStat::SpecialDefense), 1),
            RaiseSpeed => (ModifiedStat::Combat(CombatStat::Speed), 1),
            RaiseEvasion => (ModifiedStat::Combat(CombatStat::Evasion), 1),
            RaiseAccuracy => (ModifiedStat::Combat(CombatStat::Accuracy), 1),
            RaiseMovePower => (ModifiedStat::Move(MoveStat::Power), 1),
            RaiseMoveAccuracy => (ModifiedStat::Move(MoveStat::Accuracy), 1),
            RaiseMovePp => (ModifiedStat::Move(MoveStat::Pp), 1),
            LowerHp => (ModifiedStat::Combat(CombatStat::Hp), -1),
            LowerAttack => (ModifiedStat::Combat(CombatStat::Attack), -1),
            LowerDefense => (ModifiedStat::Combat(CombatStat::Defense), -1),
            LowerSpecialAttack => (ModifiedStat::Combat(CombatStat::SpecialAttack), -1),
            LowerSpecialDefense => (ModifiedStat::Combat(CombatStat::SpecialDefense), -1),
            LowerSpeed => (ModifiedStat::Combat(CombatStat::Speed), -1),
            LowerEvasion => (ModifiedStat::Combat(CombatStat::Evasion), -1),
            LowerAccuracy => (ModifiedStat::Combat(CombatStat::Accuracy), -1),
            LowerMovePower => (ModifiedStat::Move(MoveStat::Power), -1),
            LowerMoveAccuracy => (ModifiedStat::Move(MoveStat::Accuracy), -1),
            LowerMovePp => (ModifiedStat::Move(MoveStat::Pp), -1),
            _ => return None,
        };
        Some((stat, sign))
    }

    /// Status-inflicting and stat-modifying effects, which are the ones the
    /// percent-chance gate applies to.
    pub fn is_secondary(self) -> bool {
        self.stat_modifier().is_some()
            || matches!(
                self,
                Flinch | Burn | Freeze | Paralyze | Poison | Sleep | Bind | Confuse
            )
    }
}

impl fmt::Display for MoveEffect {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}", self.index(), self.acronym())
    }
}
