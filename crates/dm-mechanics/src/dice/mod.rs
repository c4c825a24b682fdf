//! Dice notation, parsing, and rolling.
//!
//! Parses notation like `2d6+3`, `1d20`, `d8-1` into a [`DiceExpr`] and rolls
//! it against an injected [`RandomSource`]. Standard polyhedral dice (d4
//! through d100) have named variants; any other size is [`Die::Custom`].

pub mod roll;

pub use roll::{DieResult, RollResult};

use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::{MechError, MechResult};
use crate::random::RandomSource;

/// Upper bound on the number of dice in one expression.
pub const MAX_DICE: u32 = 100;

/// A polyhedral die type.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Die {
    /// Four-sided die.
    D4,
    /// Six-sided die.
    D6,
    /// Eight-sided die.
    D8,
    /// Ten-sided die.
    D10,
    /// Twelve-sided die.
    D12,
    /// Twenty-sided die.
    D20,
    /// Percentile die (1-100).
    D100,
    /// A die with a non-standard number of sides.
    Custom(u32),
}

impl Die {
    /// Returns the number of sides on this die.
    pub fn sides(self) -> u32 {
        match self {
            Self::D4 => 4,
            Self::D6 => 6,
            Self::D8 => 8,
            Self::D10 => 10,
            Self::D12 => 12,
            Self::D20 => 20,
            Self::D100 => 100,
            Self::Custom(n) => n,
        }
    }

    /// Map a side count to its die, using a named variant where one exists.
    pub fn from_sides(sides: u32) -> Self {
        match sides {
            4 => Self::D4,
            6 => Self::D6,
            8 => Self::D8,
            10 => Self::D10,
            12 => Self::D12,
            20 => Self::D20,
            100 => Self::D100,
            n => Self::Custom(n),
        }
    }

    /// Roll this die once.
    pub fn roll<R: RandomSource + ?Sized>(self, rng: &mut R) -> DieResult {
        DieResult {
            die: self,
            value: rng.roll_die(self.sides()),
        }
    }
}

impl std::fmt::Display for Die {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "d{}", self.sides())
    }
}

/// How many times a roll is made and which result is kept.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RollMode {
    /// Roll once.
    #[default]
    Normal,
    /// Roll twice, keep the higher total.
    Advantage,
    /// Roll twice, keep the lower total.
    Disadvantage,
}

impl RollMode {
    /// Combine advantage and disadvantage sources; having both cancels out.
    pub fn from_flags(advantage: bool, disadvantage: bool) -> Self {
        match (advantage, disadvantage) {
            (true, false) => Self::Advantage,
            (false, true) => Self::Disadvantage,
            _ => Self::Normal,
        }
    }

    /// Whether this is a plain single roll.
    pub fn is_normal(&self) -> bool {
        *self == Self::Normal
    }
}

impl std::fmt::Display for RollMode {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Normal => write!(f, "normal"),
            Self::Advantage => write!(f, "advantage"),
            Self::Disadvantage => write!(f, "disadvantage"),
        }
    }
}

/// A parsed dice expression: `count` dice of one type plus a flat modifier.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct DiceExpr {
    /// Number of dice to roll (1 to [`MAX_DICE`]).
    pub count: u32,
    /// The die type.
    pub die: Die,
    /// Flat modifier added to the sum.
    pub modifier: i32,
}

impl DiceExpr {
    /// Create an expression, validating count and die size.
    pub fn new(count: u32, die: Die, modifier: i32) -> MechResult<Self> {
        let expr = Self {
            count,
            die,
            modifier,
        };
        if count == 0 {
            return Err(MechError::parse(&expr.to_string(), "dice count must be at least 1"));
        }
        if count > MAX_DICE {
            return Err(MechError::parse(
                &expr.to_string(),
                format!("at most {MAX_DICE} dice per roll"),
            ));
        }
        if die.sides() == 0 {
            return Err(MechError::parse(&expr.to_string(), "die size must be at least 1"));
        }
        Ok(expr)
    }

    /// A single d20 with the given modifier, as used for attack and
    /// initiative rolls.
    pub fn d20(modifier: i32) -> Self {
        Self {
            count: 1,
            die: Die::D20,
            modifier,
        }
    }

    /// The same expression with the dice count doubled (critical damage).
    pub fn doubled(&self) -> Self {
        Self {
            count: self.count * 2,
            ..*self
        }
    }

    /// Smallest possible total.
    pub fn min(&self) -> i64 {
        i64::from(self.count) + i64::from(self.modifier)
    }

    /// Largest possible total.
    pub fn max(&self) -> i64 {
        i64::from(self.count) * i64::from(self.die.sides()) + i64::from(self.modifier)
    }

    /// Expected total.
    pub fn average(&self) -> f64 {
        let per_die = (1.0 + f64::from(self.die.sides())) / 2.0;
        f64::from(self.count) * per_die + f64::from(self.modifier)
    }

    /// Roll every die and keep the individual faces.
    pub fn roll<R: RandomSource + ?Sized>(&self, rng: &mut R) -> RollResult {
        let dice = (0..self.count).map(|_| self.die.roll(rng)).collect();
        RollResult {
            dice,
            modifier: self.modifier,
        }
    }

    /// Roll once, or twice keeping the higher or lower total. On equal
    /// totals the first roll is kept.
    pub fn roll_with<R: RandomSource + ?Sized>(&self, mode: RollMode, rng: &mut R) -> RollResult {
        let first = self.roll(rng);
        if mode.is_normal() {
            return first;
        }
        let second = self.roll(rng);
        let keep_second = match mode {
            RollMode::Advantage => second.total() > first.total(),
            RollMode::Disadvantage => second.total() < first.total(),
            RollMode::Normal => false,
        };
        if keep_second { second } else { first }
    }
}

impl FromStr for DiceExpr {
    type Err = MechError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        parse_dice(s)
    }
}

impl TryFrom<String> for DiceExpr {
    type Error = MechError;

    fn try_from(s: String) -> Result<Self, Self::Error> {
        parse_dice(&s)
    }
}

impl From<DiceExpr> for String {
    fn from(expr: DiceExpr) -> Self {
        expr.to_string()
    }
}

impl std::fmt::Display for DiceExpr {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}{}", self.count, self.die)?;
        match self.modifier {
            0 => Ok(()),
            m if m > 0 => write!(f, "+{m}"),
            m => write!(f, "{m}"),
        }
    }
}

/// Parse notation of the form `NdS`, `NdS+M` or `NdS-M`.
///
/// `N` defaults to 1 when omitted. Surrounding whitespace and an upper-case
/// `D` are accepted; anything else malformed is a [`MechError::Parse`].
pub fn parse_dice(notation: &str) -> MechResult<DiceExpr> {
    let text = notation.trim().to_lowercase();
    let d_pos = text
        .find('d')
        .ok_or_else(|| MechError::parse(notation, "missing 'd'"))?;

    let count_str = &text[..d_pos];
    let count = if count_str.is_empty() {
        1
    } else {
        parse_digits(count_str).ok_or_else(|| {
            MechError::parse(notation, format!("invalid dice count '{count_str}'"))
        })?
    };

    let rest = &text[d_pos + 1..];
    let (sides_str, modifier) = match rest.find(['+', '-']) {
        Some(pos) => {
            let (sides, sign_and_mod) = rest.split_at(pos);
            let digits = &sign_and_mod[1..];
            let value = parse_digits(digits)
                .and_then(|v| i32::try_from(v).ok())
                .ok_or_else(|| {
                    MechError::parse(notation, format!("invalid modifier '{sign_and_mod}'"))
                })?;
            let modifier = if sign_and_mod.starts_with('-') {
                -value
            } else {
                value
            };
            (sides, modifier)
        }
        None => (rest, 0),
    };

    if sides_str.is_empty() {
        return Err(MechError::parse(notation, "missing die size"));
    }
    let sides = parse_digits(sides_str)
        .ok_or_else(|| MechError::parse(notation, format!("invalid die size '{sides_str}'")))?;

    if count == 0 {
        return Err(MechError::parse(notation, "dice count must be at least 1"));
    }
    if count > MAX_DICE {
        return Err(MechError::parse(
            notation,
            format!("at most {MAX_DICE} dice per roll"),
        ));
    }
    if sides == 0 {
        return Err(MechError::parse(notation, "die size must be at least 1"));
    }

    Ok(DiceExpr {
        count,
        die: Die::from_sides(sides),
        modifier,
    })
}

/// Parse and roll notation in one step.
pub fn roll_notation<R: RandomSource + ?Sized>(
    notation: &str,
    rng: &mut R,
) -> MechResult<RollResult> {
    let expr = parse_dice(notation)?;
    Ok(expr.roll(rng))
}

/// Parse a run of ASCII digits. Signs and other characters are rejected.
fn parse_digits(s: &str) -> Option<u32> {
    if s.is_empty() || !s.bytes().all(|b| b.is_ascii_digit()) {
        return None;
    }
    s.parse().ok()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::random::ScriptedRandom;
    use proptest::prelude::*;
    use rand::SeedableRng;
    use rand::rngs::StdRng;

    #[test]
    fn advantage_keeps_higher_roll() {
        let d20 = DiceExpr::d20(3);
        let mut rng = ScriptedRandom::new(0).with_rolls([4, 17]);
        let roll = d20.roll_with(RollMode::Advantage, &mut rng);
        assert_eq!(roll.natural(), 17);
        assert_eq!(roll.total(), 20);
        assert_eq!(rng.remaining(), 0);
    }

    #[test]
    fn disadvantage_keeps_lower_roll() {
        let d20 = DiceExpr::d20(0);
        let mut rng = ScriptedRandom::new(0).with_rolls([12, 5]);
        assert_eq!(d20.roll_with(RollMode::Disadvantage, &mut rng).natural(), 5);
    }

    #[test]
    fn normal_mode_rolls_once() {
        let mut rng = ScriptedRandom::new(0).with_rolls([9, 2]);
        let roll = DiceExpr::d20(0).roll_with(RollMode::Normal, &mut rng);
        assert_eq!(roll.natural(), 9);
        assert_eq!(rng.remaining(), 1);
    }

    #[test]
    fn advantage_and_disadvantage_cancel() {
        assert_eq!(RollMode::from_flags(true, true), RollMode::Normal);
        assert_eq!(RollMode::from_flags(true, false), RollMode::Advantage);
        assert_eq!(RollMode::from_flags(false, true), RollMode::Disadvantage);
        assert_eq!(RollMode::from_flags(false, false), RollMode::Normal);
    }

    #[test]
    fn die_sides() {
        assert_eq!(Die::D4.sides(), 4);
        assert_eq!(Die::D20.sides(), 20);
        assert_eq!(Die::D100.sides(), 100);
        assert_eq!(Die::Custom(3).sides(), 3);
    }

    #[test]
    fn die_from_sides() {
        assert_eq!(Die::from_sides(6), Die::D6);
        assert_eq!(Die::from_sides(12), Die::D12);
        assert_eq!(Die::from_sides(7), Die::Custom(7));
        assert_eq!(Die::from_sides(1), Die::Custom(1));
    }

    #[test]
    fn parse_simple() {
        let expr: DiceExpr = "2d6+3".parse().unwrap();
        assert_eq!(expr.count, 2);
        assert_eq!(expr.die, Die::D6);
        assert_eq!(expr.modifier, 3);
    }

    #[test]
    fn parse_defaults() {
        let expr = parse_dice("d8").unwrap();
        assert_eq!(expr.count, 1);
        assert_eq!(expr.die, Die::D8);
        assert_eq!(expr.modifier, 0);
    }

    #[test]
    fn parse_negative_modifier() {
        let expr = parse_dice("1d8-1").unwrap();
        assert_eq!(expr.modifier, -1);
    }

    #[test]
    fn parse_uppercase_and_whitespace() {
        let expr = parse_dice("  3D10+2 ").unwrap();
        assert_eq!(expr.count, 3);
        assert_eq!(expr.die, Die::D10);
        assert_eq!(expr.modifier, 2);
    }

    #[test]
    fn parse_custom_size() {
        assert_eq!(parse_dice("1d3").unwrap().die, Die::Custom(3));
        assert_eq!(parse_dice("2d1").unwrap().die, Die::Custom(1));
    }

    #[test]
    fn parse_rejects_malformed() {
        for bad in [
            "2x6", "d", "0d6", "", "2d", "2d0", "ad6", "2dx", "2d6+", "2d6+x", "+2d6", "2d6+3+1",
            "101d6",
        ] {
            let err = parse_dice(bad).unwrap_err();
            assert!(
                matches!(err, MechError::Parse { .. }),
                "expected parse error for {bad:?}"
            );
        }
    }

    #[test]
    fn parse_error_reasons() {
        assert!(parse_dice("2x6").unwrap_err().to_string().contains("missing 'd'"));
        assert!(parse_dice("0d6").unwrap_err().to_string().contains("at least 1"));
        assert!(parse_dice("d").unwrap_err().to_string().contains("missing die size"));
    }

    #[test]
    fn display_canonical() {
        assert_eq!(parse_dice("2D6+3").unwrap().to_string(), "2d6+3");
        assert_eq!(parse_dice("d20").unwrap().to_string(), "1d20");
        assert_eq!(parse_dice("1d8-1").unwrap().to_string(), "1d8-1");
        assert_eq!(parse_dice("4d6+0").unwrap().to_string(), "4d6");
    }

    #[test]
    fn min_max_average() {
        let expr = parse_dice("2d6+3").unwrap();
        assert_eq!(expr.min(), 5);
        assert_eq!(expr.max(), 15);
        assert!((expr.average() - 10.0).abs() < f64::EPSILON);
    }

    #[test]
    fn doubled_keeps_modifier() {
        let expr = parse_dice("2d6+3").unwrap().doubled();
        assert_eq!(expr.count, 4);
        assert_eq!(expr.modifier, 3);
    }

    #[test]
    fn new_validates() {
        assert!(DiceExpr::new(2, Die::D6, 1).is_ok());
        assert!(DiceExpr::new(0, Die::D6, 0).is_err());
        assert!(DiceExpr::new(101, Die::D6, 0).is_err());
        assert!(DiceExpr::new(1, Die::Custom(0), 0).is_err());
    }

    #[test]
    fn roll_with_scripted_faces() {
        let mut rng = ScriptedRandom::new(0).with_rolls([3, 5]);
        let result = parse_dice("2d6+2").unwrap().roll(&mut rng);
        assert_eq!(result.total(), 10);
        assert_eq!(result.to_string(), "[3, 5] + 2 = 10");
    }

    #[test]
    fn roll_notation_parses_and_rolls() {
        let mut rng = StdRng::seed_from_u64(42);
        let result = roll_notation("3d4", &mut rng).unwrap();
        assert_eq!(result.dice.len(), 3);
        assert!(roll_notation("nope", &mut rng).is_err());
    }

    #[test]
    fn roll_is_reproducible() {
        let expr = parse_dice("4d6").unwrap();
        let mut a = StdRng::seed_from_u64(9);
        let mut b = StdRng::seed_from_u64(9);
        assert_eq!(expr.roll(&mut a).total(), expr.roll(&mut b).total());
    }

    #[test]
    fn serde_as_notation() {
        let expr = parse_dice("1d8+2").unwrap();
        let json = serde_json::to_string(&expr).unwrap();
        assert_eq!(json, "\"1d8+2\"");
        let back: DiceExpr = serde_json::from_str("\"2d6\"").unwrap();
        assert_eq!(back.count, 2);
        assert!(serde_json::from_str::<DiceExpr>("\"2x6\"").is_err());
    }

    proptest! {
        #[test]
        fn roll_stays_in_range(
            count in 1u32..=20,
            sides in 1u32..=100,
            modifier in -20i32..=20,
            seed in any::<u64>(),
        ) {
            let expr = DiceExpr::new(count, Die::from_sides(sides), modifier).unwrap();
            let mut rng = StdRng::seed_from_u64(seed);
            let total = expr.roll(&mut rng).total();
            let low = i64::from(count) + i64::from(modifier);
            let high = i64::from(count) * i64::from(sides) + i64::from(modifier);
            prop_assert!(total >= low && total <= high);
        }

        #[test]
        fn notation_reparses(count in 1u32..=100, sides in 1u32..=1000, modifier in -50i32..=50) {
            let expr = DiceExpr::new(count, Die::from_sides(sides), modifier).unwrap();
            let back = parse_dice(&expr.to_string()).unwrap();
            prop_assert_eq!(back, expr);
        }
    }
}
