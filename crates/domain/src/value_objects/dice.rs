//! Dice formulas and client-reported roll results
//!
//! The server never rolls dice itself. It validates formulas a master asks a
//! player to roll and carries the results clients report.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use thiserror::Error;

/// Error when parsing a dice formula
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum DiceParseError {
    #[error("Empty dice formula")]
    Empty,
    /// Expected XdY, XdY+Z, XdY-Z or dY
    #[error("Invalid dice format: {0}")]
    InvalidFormat(String),
    #[error("Dice count must be between 1 and {max}")]
    InvalidDiceCount { max: u16 },
    #[error("Die size must be at least 2")]
    InvalidDieSize,
}

/// Upper bound on dice per formula
const MAX_DICE: u16 = 100;

/// A parsed dice formula like "2d6+3"
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DiceFormula {
    pub dice_count: u16,
    pub die_size: u16,
    pub modifier: i32,
}

impl DiceFormula {
    /// Parse "XdY", "XdY+Z", "XdY-Z" or "dY" (case-insensitive, whitespace ignored).
    pub fn parse(input: &str) -> Result<Self, DiceParseError> {
        let compact: String = input
            .chars()
            .filter(|c| !c.is_whitespace())
            .collect::<String>()
            .to_ascii_lowercase();
        if compact.is_empty() {
            return Err(DiceParseError::Empty);
        }

        let (count_part, rest) = compact.split_once('d').ok_or_else(|| {
            DiceParseError::InvalidFormat(format!("Missing 'd' separator in '{}'", compact))
        })?;

        let dice_count = if count_part.is_empty() {
            1
        } else {
            count_part.parse::<u16>().map_err(|_| {
                DiceParseError::InvalidFormat(format!("Invalid dice count: '{}'", count_part))
            })?
        };
        if dice_count == 0 || dice_count > MAX_DICE {
            return Err(DiceParseError::InvalidDiceCount { max: MAX_DICE });
        }

        let (size_part, modifier) = match rest.find(['+', '-']) {
            Some(pos) => {
                let (size, signed) = rest.split_at(pos);
                let digits = &signed[1..];
                let invalid =
                    || DiceParseError::InvalidFormat(format!("Invalid modifier: '{}'", signed));
                // i32::from_str would take a second sign
                if digits.is_empty() || !digits.bytes().all(|b| b.is_ascii_digit()) {
                    return Err(invalid());
                }
                let value: i32 = digits.parse().map_err(|_| invalid())?;
                let modifier = if signed.starts_with('-') { -value } else { value };
                (size, modifier)
            }
            None => (rest, 0),
        };

        let die_size = size_part.parse::<u16>().map_err(|_| {
            DiceParseError::InvalidFormat(format!("Invalid die size: '{}'", size_part))
        })?;
        if die_size < 2 {
            return Err(DiceParseError::InvalidDieSize);
        }

        Ok(Self {
            dice_count,
            die_size,
            modifier,
        })
    }
}

impl FromStr for DiceFormula {
    type Err = DiceParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s)
    }
}

impl fmt::Display for DiceFormula {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}d{}", self.dice_count, self.die_size)?;
        match self.modifier {
            0 => Ok(()),
            m if m > 0 => write!(f, "+{}", m),
            m => write!(f, "{}", m),
        }
    }
}

/// A roll result reported by a client, either attached to an action or
/// completing a mediated roll request.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DiceRollResult {
    /// Final total including modifiers
    pub roll: i32,
    pub formula: String,
    /// Face value of the die before modifiers, when a single die was rolled
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub natural: Option<i32>,
    /// Target number / DC the roll was made against
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub target: Option<i32>,
}

impl DiceRollResult {
    pub fn is_natural_twenty(&self) -> bool {
        self.natural == Some(20)
    }

    pub fn is_natural_one(&self) -> bool {
        self.natural == Some(1)
    }
}
