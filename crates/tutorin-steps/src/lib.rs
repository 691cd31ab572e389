//! Tutorín step engines
//!
//! This crate turns a free-text arithmetic statement into the ordered list of
//! sub-steps a pupil works through on paper, and renders one sub-step at a
//! time. Everything here is pure: the same `(expression, step)` pair always
//! produces the same [`StepResult`].
//!
//! # Layers
//!
//! - [`arithmetic`] - column addition/subtraction, partial products, long
//!   division blocks, fraction and decimal pipelines on big integers
//! - [`board`] - monospaced "written algorithm" boards
//! - [`engines`] - one [`ExerciseEngine`] per [`Topic`], looked up through
//!   [`engine_for`]
//!
//! # Example
//!
//! ```rust
//! use tutorin_steps::{engine_for, Cycle, StepStatus, Topic};
//!
//! let engine = engine_for(Topic::Suma);
//! let step = engine.compute_step("32458 + 6541", 0, Cycle::C2).unwrap();
//!
//! assert_eq!(step.status, StepStatus::Ask);
//! assert_eq!(step.expected_answer.as_deref(), Some("9"));
//! assert_eq!(step.next_step, 1);
//! ```

pub mod arithmetic;
pub mod board;
pub mod engines;

pub use engines::{engine_for, read_fractions, ExerciseEngine};

use std::fmt;

use serde::{Deserialize, Serialize};
use thiserror::Error;

// ============================================================================
// Error Types
// ============================================================================

/// Errors raised while reading an exercise statement.
///
/// None of these are faults of the server: they mean the statement does not
/// describe an operation the engine for that topic can walk through.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum StepError {
    /// The statement does not contain operands for this topic.
    #[error("could not read a '{topic}' exercise from '{expression}'")]
    ParseFailure {
        /// Topic whose engine was asked.
        topic: Topic,
        /// The statement as received.
        expression: String,
    },

    /// A division (integer or decimal) by zero.
    #[error("division by zero in '{expression}'")]
    DivisionByZero {
        /// The statement as received.
        expression: String,
    },

    /// A fraction with a zero denominator.
    #[error("zero denominator in '{expression}'")]
    ZeroDenominator {
        /// The statement as received.
        expression: String,
    },
}

impl StepError {
    /// Creates a new `ParseFailure` for the given topic.
    #[must_use]
    pub fn parse_failure(topic: Topic, expression: impl Into<String>) -> Self {
        Self::ParseFailure {
            topic,
            expression: expression.into(),
        }
    }

    /// Creates a new `DivisionByZero` error.
    #[must_use]
    pub fn division_by_zero(expression: impl Into<String>) -> Self {
        Self::DivisionByZero {
            expression: expression.into(),
        }
    }

    /// Creates a new `ZeroDenominator` error.
    #[must_use]
    pub fn zero_denominator(expression: impl Into<String>) -> Self {
        Self::ZeroDenominator {
            expression: expression.into(),
        }
    }
}

/// Result type for step computations.
pub type Result<T> = std::result::Result<T, StepError>;

// ============================================================================
// Topic
// ============================================================================

/// Subject-matter classification of an exercise.
///
/// Serialized with the Spanish names used across the API (`"suma"`,
/// `"fracciones"`, ...).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Topic {
    /// Column addition.
    Suma,
    /// Column subtraction with borrowing.
    Resta,
    /// Long multiplication.
    Multiplicacion,
    /// Long division.
    Division,
    /// Addition/subtraction of two fractions.
    Fracciones,
    /// Operations with decimal numbers.
    Decimales,
    /// Areas and perimeters.
    Geometria,
    /// Unit conversions.
    Medidas,
    /// Percentages of a quantity.
    Porcentajes,
    /// Probability and relative frequency.
    Estadistica,
    /// Word problems dispatched to another topic.
    Problemas,
}

impl Topic {
    /// Every topic, in registry order.
    pub const ALL: [Self; 11] = [
        Self::Suma,
        Self::Resta,
        Self::Multiplicacion,
        Self::Division,
        Self::Fracciones,
        Self::Decimales,
        Self::Geometria,
        Self::Medidas,
        Self::Porcentajes,
        Self::Estadistica,
        Self::Problemas,
    ];

    /// Returns the wire name of the topic.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Suma => "suma",
            Self::Resta => "resta",
            Self::Multiplicacion => "multiplicacion",
            Self::Division => "division",
            Self::Fracciones => "fracciones",
            Self::Decimales => "decimales",
            Self::Geometria => "geometria",
            Self::Medidas => "medidas",
            Self::Porcentajes => "porcentajes",
            Self::Estadistica => "estadistica",
            Self::Problemas => "problemas",
        }
    }

    /// Returns the engine name reported by the classifier.
    #[must_use]
    pub const fn engine_name(self) -> &'static str {
        match self {
            Self::Suma => "addition_engine",
            Self::Resta => "subtraction_engine",
            Self::Multiplicacion => "multiplication_engine",
            Self::Division => "division_engine",
            Self::Fracciones => "fractions_engine",
            Self::Decimales => "decimals_engine",
            Self::Geometria => "geometry_engine",
            Self::Medidas => "measures_engine",
            Self::Porcentajes => "percentages_engine",
            Self::Estadistica => "statistics_engine",
            Self::Problemas => "problem_solving_engine",
        }
    }

    /// Looks a topic up by wire name or engine name.
    #[must_use]
    pub fn from_name(name: &str) -> Option<Self> {
        let name = name.trim().to_lowercase();
        Self::ALL
            .into_iter()
            .find(|t| t.as_str() == name || t.engine_name() == name)
    }
}

impl fmt::Display for Topic {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

// ============================================================================
// Step Tags
// ============================================================================

/// Identifies which kind of sub-step is being asked.
///
/// The tag is what hint selection keys on, so every engine reports one even
/// for its terminal step.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum StepTag {
    /// One addition column.
    AddCol,
    /// Final carry of an addition.
    AddCarry,
    /// Addition finished.
    AddResultado,
    /// One subtraction column.
    SubCol,
    /// Subtraction finished.
    SubResultado,
    /// One partial product line.
    MultParcial,
    /// Vertical sum of the partial lines.
    MultSuma,
    /// Multiplication finished.
    MultResultado,
    /// First group of the dividend.
    DivGrupo,
    /// Quotient digit of a block.
    DivQdigit,
    /// Remainder of a block.
    DivResta,
    /// Bring down the next digit.
    DivBajar,
    /// Division finished.
    DivResultado,
    /// Do the denominators match?
    FracInicio,
    /// Least common multiple of the denominators.
    FracMcm,
    /// Scaled numerators.
    FracEquiv,
    /// Combined unsimplified fraction.
    FracOperacion,
    /// Fraction in lowest terms.
    FracSimplificar,
    /// Fraction exercise finished.
    FracResultado,
    /// Name the operator.
    DecimalIdentificar,
    /// Align the decimal points.
    DecimalAlinear,
    /// Integer operation without points.
    DecimalOperar,
    /// Put the point back.
    DecimalResultado,
    /// Decimal exercise finished.
    DecimalFinal,
    /// Recall the formula.
    GeoFormula,
    /// Substitute the values.
    GeoSubstitute,
    /// Compute the value.
    GeoCalc,
    /// Geometry exercise finished.
    GeoResult,
    /// The statement names a figure but not enough values.
    GeoMissing,
    /// Bigger or smaller after converting?
    MeasEstimate,
    /// Power of ten between the units.
    MeasFactor,
    /// Converted value.
    MeasCalc,
    /// Conversion finished.
    MeasResult,
    /// Unsupported unit pair.
    MeasUnknown,
    /// Percentage as a fraction over 100.
    PercFrac,
    /// Multiply by the base quantity.
    PercMult,
    /// Divide by 100.
    PercSimplify,
    /// Percentage exercise finished.
    PercResult,
    /// Favourable over total.
    StatIntro,
    /// The fraction with the data.
    StatFrac,
    /// Decimal value.
    StatDecimal,
    /// Value as a percentage.
    StatPercent,
    /// Statistics exercise finished.
    StatResult,
    /// A word problem with no recognizable operation.
    ProblemUnknown,
}

impl StepTag {
    /// Returns the wire name of the tag.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::AddCol => "add_col",
            Self::AddCarry => "add_carry",
            Self::AddResultado => "add_resultado",
            Self::SubCol => "sub_col",
            Self::SubResultado => "sub_resultado",
            Self::MultParcial => "mult_parcial",
            Self::MultSuma => "mult_suma",
            Self::MultResultado => "mult_resultado",
            Self::DivGrupo => "div_grupo",
            Self::DivQdigit => "div_qdigit",
            Self::DivResta => "div_resta",
            Self::DivBajar => "div_bajar",
            Self::DivResultado => "div_resultado",
            Self::FracInicio => "frac_inicio",
            Self::FracMcm => "frac_mcm",
            Self::FracEquiv => "frac_equiv",
            Self::FracOperacion => "frac_operacion",
            Self::FracSimplificar => "frac_simplificar",
            Self::FracResultado => "frac_resultado",
            Self::DecimalIdentificar => "decimal_identificar",
            Self::DecimalAlinear => "decimal_alinear",
            Self::DecimalOperar => "decimal_operar",
            Self::DecimalResultado => "decimal_resultado",
            Self::DecimalFinal => "decimal_final",
            Self::GeoFormula => "geo_formula",
            Self::GeoSubstitute => "geo_substitute",
            Self::GeoCalc => "geo_calc",
            Self::GeoResult => "geo_result",
            Self::GeoMissing => "geo_missing",
            Self::MeasEstimate => "meas_estimate",
            Self::MeasFactor => "meas_factor",
            Self::MeasCalc => "meas_calc",
            Self::MeasResult => "meas_result",
            Self::MeasUnknown => "meas_unknown",
            Self::PercFrac => "perc_frac",
            Self::PercMult => "perc_mult",
            Self::PercSimplify => "perc_simplify",
            Self::PercResult => "perc_result",
            Self::StatIntro => "stat_intro",
            Self::StatFrac => "stat_frac",
            Self::StatDecimal => "stat_decimal",
            Self::StatPercent => "stat_percent",
            Self::StatResult => "stat_result",
            Self::ProblemUnknown => "problem_unknown",
        }
    }

    /// Returns the topic whose engine emits this tag.
    #[must_use]
    pub const fn topic(self) -> Topic {
        match self {
            Self::AddCol | Self::AddCarry | Self::AddResultado => Topic::Suma,
            Self::SubCol | Self::SubResultado => Topic::Resta,
            Self::MultParcial | Self::MultSuma | Self::MultResultado => Topic::Multiplicacion,
            Self::DivGrupo
            | Self::DivQdigit
            | Self::DivResta
            | Self::DivBajar
            | Self::DivResultado => Topic::Division,
            Self::FracInicio
            | Self::FracMcm
            | Self::FracEquiv
            | Self::FracOperacion
            | Self::FracSimplificar
            | Self::FracResultado => Topic::Fracciones,
            Self::DecimalIdentificar
            | Self::DecimalAlinear
            | Self::DecimalOperar
            | Self::DecimalResultado
            | Self::DecimalFinal => Topic::Decimales,
            Self::GeoFormula
            | Self::GeoSubstitute
            | Self::GeoCalc
            | Self::GeoResult
            | Self::GeoMissing => Topic::Geometria,
            Self::MeasEstimate
            | Self::MeasFactor
            | Self::MeasCalc
            | Self::MeasResult
            | Self::MeasUnknown => Topic::Medidas,
            Self::PercFrac | Self::PercMult | Self::PercSimplify | Self::PercResult => {
                Topic::Porcentajes
            }
            Self::StatIntro
            | Self::StatFrac
            | Self::StatDecimal
            | Self::StatPercent
            | Self::StatResult => Topic::Estadistica,
            Self::ProblemUnknown => Topic::Problemas,
        }
    }
}

impl fmt::Display for StepTag {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

// ============================================================================
// School Cycle
// ============================================================================

/// Primary-school cycle the prompts are worded for.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash)]
pub enum Cycle {
    /// First cycle: operations spelled out.
    C1,
    /// Second cycle (default): terse prompts.
    #[default]
    C2,
    /// Third cycle: prompts add an estimate.
    C3,
}

impl Cycle {
    /// Parses a cycle leniently; anything unrecognized is `C2`.
    #[must_use]
    pub fn parse_lenient(s: &str) -> Self {
        match s.trim().to_lowercase().as_str() {
            "1" | "c1" => Self::C1,
            "3" | "c3" => Self::C3,
            _ => Self::C2,
        }
    }

    /// Returns the wire name of the cycle.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::C1 => "c1",
            Self::C2 => "c2",
            Self::C3 => "c3",
        }
    }
}

impl<'de> Deserialize<'de> for Cycle {
    fn deserialize<D>(deserializer: D) -> std::result::Result<Self, D::Error>
    where
        D: serde::Deserializer<'de>,
    {
        let s = String::deserialize(deserializer)?;
        Ok(Self::parse_lenient(&s))
    }
}

impl Serialize for Cycle {
    fn serialize<S>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error>
    where
        S: serde::Serializer,
    {
        serializer.serialize_str(self.as_str())
    }
}

impl fmt::Display for Cycle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

// ============================================================================
// Step Result
// ============================================================================

/// Status of a computed sub-step.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum StepStatus {
    /// A sub-step is waiting for an answer.
    Ask,
    /// The exercise is finished; repeated calls return the same payload.
    Done,
    /// The statement parsed but describes an unsupported scenario.
    Error,
}

impl StepStatus {
    /// Returns `true` if no further answer will be compared.
    #[must_use]
    pub const fn is_terminal(self) -> bool {
        matches!(self, Self::Done | Self::Error)
    }
}

impl fmt::Display for StepStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            Self::Ask => "ask",
            Self::Done => "done",
            Self::Error => "error",
        };
        f.write_str(s)
    }
}

/// One rendered sub-step.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StepResult {
    /// Whether an answer is expected.
    pub status: StepStatus,
    /// Board plus prompt, as light HTML.
    pub message: String,
    /// Value the answer must match after canonicalization.
    pub expected_answer: Option<String>,
    /// Topic of the engine that produced this step.
    pub topic: Topic,
    /// Kind of sub-step, used for hint selection.
    pub hint_type: StepTag,
    /// Always the requested step plus one.
    pub next_step: usize,
}

impl StepResult {
    /// Creates an `ask` step.
    #[must_use]
    pub fn ask(
        tag: StepTag,
        step: usize,
        message: impl Into<String>,
        expected: impl Into<String>,
    ) -> Self {
        Self {
            status: StepStatus::Ask,
            message: message.into(),
            expected_answer: Some(expected.into()),
            topic: tag.topic(),
            hint_type: tag,
            next_step: step + 1,
        }
    }

    /// Creates a `done` step with the `"ok"` sentinel as expected answer.
    #[must_use]
    pub fn done(tag: StepTag, step: usize, message: impl Into<String>) -> Self {
        Self {
            status: StepStatus::Done,
            message: message.into(),
            expected_answer: Some("ok".to_string()),
            topic: tag.topic(),
            hint_type: tag,
            next_step: step + 1,
        }
    }

    /// Creates an `error` step for a statement the engine cannot walk through.
    #[must_use]
    pub fn error(tag: StepTag, step: usize, message: impl Into<String>) -> Self {
        Self {
            status: StepStatus::Error,
            message: message.into(),
            expected_answer: None,
            topic: tag.topic(),
            hint_type: tag,
            next_step: step + 1,
        }
    }

    /// Replaces the expected answer.
    #[must_use]
    pub fn with_expected(mut self, expected: impl Into<String>) -> Self {
        self.expected_answer = Some(expected.into());
        self
    }
}
