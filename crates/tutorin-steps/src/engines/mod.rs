//! Per-topic step engines and the static registry that maps a [`Topic`] to
//! its engine.
//!
//! Engines never hold state. Each call re-reads the statement, rebuilds the
//! whole sub-step sequence and renders the one at `step`. A step past the
//! end returns the same terminal payload every time.

mod addition;
mod decimals;
mod division;
mod fractions;
mod geometry;
mod measures;
mod multiplication;
mod percentages;
mod problems;
mod statistics;
mod subtraction;

pub use addition::AdditionEngine;
pub use decimals::DecimalsEngine;
pub use division::DivisionEngine;
pub use fractions::{read_fractions, FractionsEngine};
pub use geometry::GeometryEngine;
pub use measures::MeasuresEngine;
pub use multiplication::MultiplicationEngine;
pub use percentages::PercentagesEngine;
pub use problems::ProblemSolvingEngine;
pub use statistics::StatisticsEngine;
pub use subtraction::SubtractionEngine;

use num_bigint::BigUint;
use once_cell::sync::Lazy;
use regex::{Captures, Regex};

use crate::arithmetic::pow10;
use crate::{Cycle, Result, StepResult, Topic};

// ============================================================================
// Engine Trait
// ============================================================================

/// Renders the sub-steps of one kind of exercise.
pub trait ExerciseEngine: Send + Sync {
    /// Topic this engine handles.
    fn topic(&self) -> Topic;

    /// Renders the sub-step at `step` for the statement `expression`.
    ///
    /// Returns [`crate::StepError`] when the statement cannot be read as an
    /// exercise of this topic.
    fn compute_step(&self, expression: &str, step: usize, cycle: Cycle) -> Result<StepResult>;

    /// Compact form of the operands this engine reads from `expression`,
    /// itself accepted by [`ExerciseEngine::compute_step`]. `None` when the
    /// statement does not parse.
    fn canonical_expression(&self, expression: &str) -> Option<String>;
}

/// Returns the engine registered for `topic`.
#[must_use]
pub fn engine_for(topic: Topic) -> &'static dyn ExerciseEngine {
    match topic {
        Topic::Suma => &AdditionEngine,
        Topic::Resta => &SubtractionEngine,
        Topic::Multiplicacion => &MultiplicationEngine,
        Topic::Division => &DivisionEngine,
        Topic::Fracciones => &FractionsEngine,
        Topic::Decimales => &DecimalsEngine,
        Topic::Geometria => &GeometryEngine,
        Topic::Medidas => &MeasuresEngine,
        Topic::Porcentajes => &PercentagesEngine,
        Topic::Estadistica => &StatisticsEngine,
        Topic::Problemas => &ProblemSolvingEngine,
    }
}

// ============================================================================
// Shared Parsing Helpers
// ============================================================================

/// A compiled pattern. Compilation of the fixed patterns below cannot fail,
/// but a failure degrades to "no match" instead of a panic.
pub(crate) type Pattern = Lazy<Option<Regex>>;

/// Runs `pattern` against `text`.
pub(crate) fn captures<'t>(pattern: &Pattern, text: &'t str) -> Option<Captures<'t>> {
    pattern.as_ref().and_then(|re| re.captures(text))
}

/// Whether `pattern` matches anywhere in `text`.
pub(crate) fn is_match(pattern: &Pattern, text: &str) -> bool {
    pattern.as_ref().is_some_and(|re| re.is_match(text))
}

/// Lowercases and unifies the symbol variants pupils type.
pub(crate) fn normalize(text: &str) -> String {
    text.trim()
        .to_lowercase()
        .replace(['−', '–', '—'], "-")
        .replace(['＋', '﹢'], "+")
        .replace('\u{a0}', " ")
}

/// Group `index` of `caps` parsed as a big integer.
pub(crate) fn big_group(caps: &Captures<'_>, index: usize) -> Option<BigUint> {
    caps.get(index)?.as_str().parse().ok()
}

static TWO_INTEGERS: Pattern = Lazy::new(|| Regex::new(r"^\s*(\d+)\s*(\S)\s*(\d+)\s*$").ok());

/// Reads `a <op> b` where `op` is one of `symbols`.
///
/// Falls back to a search anywhere in the text so `"¿Cuánto es 12 + 5?"`
/// also parses.
pub(crate) fn integer_pair(text: &str, symbols: &[char]) -> Option<(BigUint, BigUint)> {
    let text = normalize(text);
    if let Some(caps) = captures(&TWO_INTEGERS, &text) {
        let op = caps.get(2)?.as_str().chars().next()?;
        if symbols.contains(&op) {
            return Some((big_group(&caps, 1)?, big_group(&caps, 3)?));
        }
    }

    let chars: Vec<char> = text.chars().collect();
    chars
        .iter()
        .enumerate()
        .filter(|(_, c)| symbols.contains(c))
        .find_map(|(index, _)| pair_around(&chars, index))
}

/// Reads the integers immediately left and right of `chars[index]`,
/// rejecting operands that are part of a decimal or a fraction.
fn pair_around(chars: &[char], index: usize) -> Option<(BigUint, BigUint)> {
    let is_separator = |c: Option<&char>| c.is_some_and(|c| matches!(*c, ',' | '.' | '/'));

    let mut before = chars[..index].iter().rev().skip_while(|c| c.is_whitespace()).peekable();
    let mut left: Vec<char> = Vec::new();
    while let Some(c) = before.next_if(|c| c.is_ascii_digit()) {
        left.push(*c);
    }
    if is_separator(before.peek().copied()) {
        return None;
    }
    left.reverse();

    let mut after = chars[index + 1..].iter().skip_while(|c| c.is_whitespace()).peekable();
    let mut right: Vec<char> = Vec::new();
    while let Some(c) = after.next_if(|c| c.is_ascii_digit()) {
        right.push(*c);
    }
    if is_separator(after.peek().copied()) {
        return None;
    }

    let left: String = left.into_iter().collect();
    let right: String = right.into_iter().collect();
    Some((left.parse().ok()?, right.parse().ok()?))
}

// ============================================================================
// Shared Wording Helpers
// ============================================================================

const PLACE_NAMES: [&str; 9] = [
    "unidades",
    "decenas",
    "centenas",
    "millares",
    "decenas de millar",
    "centenas de millar",
    "millones",
    "decenas de millón",
    "centenas de millón",
];

/// Spanish name of the digit position `k` (0 = units).
#[must_use]
pub fn place_name(k: usize) -> String {
    PLACE_NAMES
        .get(k)
        .map_or_else(|| format!("posición {}", k + 1), |name| (*name).to_string())
}

/// Uppercases the first character.
pub(crate) fn capitalize(text: &str) -> String {
    let mut chars = text.chars();
    chars.next().map_or_else(String::new, |first| {
        first.to_uppercase().chain(chars).collect()
    })
}

/// Rounds to one significant figure, for the third-cycle estimates.
pub(crate) fn estimate(n: &BigUint) -> BigUint {
    let digits = n.to_str_radix(10).len();
    if digits <= 1 {
        return n.clone();
    }
    let unit = pow10(digits - 1);
    (n + &unit / 2u8) / &unit * unit
}

/// Prompt followed by the board.
pub(crate) fn with_board(prompt: &str, board: &str) -> String {
    format!("{prompt}\n{board}")
}

/// Picks the wording for the pupil's cycle.
pub(crate) fn by_cycle(cycle: Cycle, c1: String, c2: String, c3: String) -> String {
    match cycle {
        Cycle::C1 => c1,
        Cycle::C2 => c2,
        Cycle::C3 => c3,
    }
}
