//! Probability, percentage-of-sample and relative frequency.

use num_bigint::BigInt;
use num_rational::BigRational;
use num_traits::Zero;
use once_cell::sync::Lazy;
use regex::Regex;

use super::{normalize, ExerciseEngine, Pattern};
use crate::arithmetic::{format_decimal, INTERMEDIATE_PLACES};
use crate::{Cycle, Result, StepError, StepResult, StepTag, Topic};

static INTEGER: Pattern = Lazy::new(|| Regex::new(r"\d+").ok());

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Kind {
    Probability,
    Percentage,
    Frequency,
}

impl Kind {
    fn detect(text: &str) -> Self {
        let any = |words: &[&str]| words.iter().any(|w| text.contains(w));
        if any(&["probabilidad", "azar", "moneda", "dado", "bola", "urna"]) {
            Self::Probability
        } else if any(&["porcentaje", "%", "gráfico", "grafico"]) {
            Self::Percentage
        } else {
            Self::Frequency
        }
    }

    const fn name(self) -> &'static str {
        match self {
            Self::Probability => "probabilidad",
            Self::Percentage => "porcentaje",
            Self::Frequency => "frecuencia",
        }
    }
}

fn read(expression: &str) -> Option<(Kind, BigInt, BigInt)> {
    let text = normalize(expression);
    let numbers: Vec<BigInt> = INTEGER
        .as_ref()?
        .find_iter(&text)
        .filter_map(|m| m.as_str().parse().ok())
        .collect();
    let favourable = numbers.first()?.clone();
    let total = numbers.get(1).cloned().unwrap_or_else(|| BigInt::from(1));
    Some((Kind::detect(&text), favourable, total))
}

/// Walks favourable/total → fraction → decimal → percentage.
#[derive(Debug, Clone, Copy, Default)]
pub struct StatisticsEngine;

impl ExerciseEngine for StatisticsEngine {
    fn topic(&self) -> Topic {
        Topic::Estadistica
    }

    fn compute_step(&self, expression: &str, step: usize, cycle: Cycle) -> Result<StepResult> {
        let (kind, f, t) = read(expression)
            .ok_or_else(|| StepError::parse_failure(Topic::Estadistica, expression))?;
        if t.is_zero() {
            return Err(StepError::division_by_zero(expression));
        }
        let ratio = BigRational::new(f.clone(), t.clone());
        let decimal = format_decimal(&ratio, INTERMEDIATE_PLACES);
        let percent = format!(
            "{}%",
            format_decimal(&(&ratio * BigRational::from_integer(BigInt::from(100))), 1)
        );

        let (tag, prompt, expected) = match step {
            0 => {
                let rule = match kind {
                    Kind::Probability => "La probabilidad es casos favorables entre casos posibles.",
                    Kind::Percentage => "El porcentaje sale de la parte entre el total.",
                    Kind::Frequency => "La frecuencia relativa es las veces que ocurre entre el total.",
                };
                let prompt = match cycle {
                    Cycle::C1 => format!(
                        "👉 {rule} ¿Qué va arriba y qué va abajo? Escríbelo como favorables/total."
                    ),
                    Cycle::C2 | Cycle::C3 => {
                        format!("👉 {rule} ¿Cómo lo escribes? (favorables/total)")
                    }
                };
                (StepTag::StatIntro, prompt, "favorables/total".to_string())
            }
            1 => (
                StepTag::StatFrac,
                "👉 Sustituye con los datos del enunciado. ¿Qué fracción queda?".to_string(),
                format!("{f}/{t}"),
            ),
            2 => (
                StepTag::StatDecimal,
                format!("👉 Divide {f} entre {t}. Usa 3 decimales."),
                decimal,
            ),
            3 => (
                StepTag::StatPercent,
                "👉 Multiplica por 100 para expresarlo en porcentaje (1 decimal).".to_string(),
                percent,
            ),
            _ => {
                return Ok(StepResult::done(
                    StepTag::StatResult,
                    step,
                    format!(
                        "✅ La {} es {f}/{t} = {} = <b>{}</b>.",
                        kind.name(),
                        decimal.replace('.', ","),
                        percent.replace('.', ",")
                    ),
                ));
            }
        };
        Ok(StepResult::ask(tag, step, prompt, expected))
    }

    fn canonical_expression(&self, expression: &str) -> Option<String> {
        read(expression).map(|(kind, f, t)| format!("{} {f} de {t}", kind.name()))
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use crate::StepStatus;

    fn expected(expression: &str, step: usize) -> String {
        StatisticsEngine
            .compute_step(expression, step, Cycle::C2)
            .unwrap()
            .expected_answer
            .unwrap()
    }

    #[test]
    fn test_probability_pipeline() {
        let e = "Probabilidad de sacar 2 caras favorables entre 3 casos";
        assert_eq!(expected(e, 0), "favorables/total");
        assert_eq!(expected(e, 1), "2/3");
        assert_eq!(expected(e, 2), "0.667");
        assert_eq!(expected(e, 3), "66.7%");
        let done = StatisticsEngine.compute_step(e, 4, Cycle::C2).unwrap();
        assert_eq!(done.status, StepStatus::Done);
        assert!(done.message.starts_with("✅ La probabilidad"));
    }

    #[test]
    fn test_frequency_default_kind() {
        let canonical = StatisticsEngine
            .canonical_expression("En una encuesta, 12 de 48 alumnos prefieren el fútbol")
            .unwrap();
        assert_eq!(canonical, "frecuencia 12 de 48");
        assert_eq!(expected(&canonical, 3), "25%");
    }

    #[test]
    fn test_zero_total() {
        let err = StatisticsEngine
            .compute_step("probabilidad 1 de 0", 0, Cycle::C2)
            .unwrap_err();
        assert!(matches!(err, StepError::DivisionByZero { .. }));
    }
}
