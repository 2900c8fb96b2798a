use chrono::NaiveDateTime;
use serde::Serialize;
use std::collections::{BTreeMap, BTreeSet};
use std::fmt;

pub const DIGITS_PER_DRAW: usize = 5;

/// Five ordered digits, each 0-9. Used for both draw results and single bets.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(transparent)]
pub struct Digits([u8; DIGITS_PER_DRAW]);

impl Digits {
    pub fn new(values: [u8; DIGITS_PER_DRAW]) -> Option<Self> {
        values
            .iter()
            .all(|digit| *digit <= 9)
            .then_some(Self(values))
    }

    pub fn from_slice(values: &[u8]) -> Option<Self> {
        let array: [u8; DIGITS_PER_DRAW] = values.try_into().ok()?;
        Self::new(array)
    }

    pub const fn as_array(&self) -> &[u8; DIGITS_PER_DRAW] {
        &self.0
    }
}

impl AsRef<[u8]> for Digits {
    fn as_ref(&self) -> &[u8] {
        &self.0
    }
}

impl fmt::Display for Digits {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for digit in self.0 {
            write!(f, "{digit}")?;
        }
        Ok(())
    }
}

/// One row of the draw history.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct DrawRecord {
    pub period: String,
    pub numbers: Digits,
}

/// A fully specified bet as printed in a report, keeping the report's own
/// bet number.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct SingleBet {
    pub index: usize,
    pub numbers: Digits,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum DuplexPosition {
    First,
    Second,
    Third,
    Fourth,
    Fifth,
}

impl DuplexPosition {
    pub const fn ordered() -> [Self; DIGITS_PER_DRAW] {
        [
            Self::First,
            Self::Second,
            Self::Third,
            Self::Fourth,
            Self::Fifth,
        ]
    }

    /// 1-based position within the draw.
    pub const fn number(self) -> usize {
        match self {
            Self::First => 1,
            Self::Second => 2,
            Self::Third => 3,
            Self::Fourth => 4,
            Self::Fifth => 5,
        }
    }

    pub const fn label(self) -> &'static str {
        match self {
            Self::First => "第一位",
            Self::Second => "第二位",
            Self::Third => "第三位",
            Self::Fourth => "第四位",
            Self::Fifth => "第五位",
        }
    }
}

/// Everything extracted from one prediction report.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct RecommendationSet {
    pub target_period: Option<String>,
    pub singles: Vec<SingleBet>,
    pub duplex: BTreeMap<DuplexPosition, BTreeSet<u8>>,
}

impl RecommendationSet {
    pub fn single_numbers(&self) -> Vec<Digits> {
        self.singles.iter().map(|bet| bet.numbers).collect()
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum PrizeTier {
    /// All five digits match in order.
    DirectSelection,
}

impl PrizeTier {
    pub const fn ordered() -> [Self; 1] {
        [Self::DirectSelection]
    }

    pub const fn label(self) -> &'static str {
        match self {
            Self::DirectSelection => "直选",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct WinRecord {
    pub bet_index: usize,
    pub numbers: Digits,
    pub tier: PrizeTier,
    pub prize_amount: u64,
}

/// The persisted outcome of one verification cycle.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct EvaluationEntry {
    pub timestamp: NaiveDateTime,
    pub period: String,
    pub numbers: Digits,
    pub recommendation_count: usize,
    pub winning_count: usize,
    pub total_prize: u64,
    pub winning_details: Vec<WinRecord>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ErrorEntry {
    pub timestamp: NaiveDateTime,
    pub message: String,
}

/// `1234567` -> `1,234,567`.
pub fn group_thousands(value: u64) -> String {
    let raw = value.to_string();
    let mut grouped = String::with_capacity(raw.len() + raw.len() / 3);
    for (position, ch) in raw.chars().enumerate() {
        if position > 0 && (raw.len() - position) % 3 == 0 {
            grouped.push(',');
        }
        grouped.push(ch);
    }
    grouped
}
