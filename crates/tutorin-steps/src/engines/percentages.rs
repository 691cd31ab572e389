//! Percentages of a quantity.

use num_bigint::BigInt;
use num_rational::BigRational;
use once_cell::sync::Lazy;
use regex::Regex;

use super::{captures, normalize, ExerciseEngine, Pattern};
use crate::arithmetic::{format_decimal, DecimalNumber, DISPLAY_PLACES};
use crate::{Cycle, Result, StepError, StepResult, StepTag, Topic};

static PERCENT_OF: Pattern = Lazy::new(|| {
    Regex::new(r"(\d+(?:[.,]\d+)?)\s*%\s*(?:de|of)?\s*(\d+(?:[.,]\d+)?)").ok()
});

/// Places kept in the `p·b/100` numerator.
const PRODUCT_PLACES: usize = 4;

fn read(expression: &str) -> Option<(String, DecimalNumber, String, DecimalNumber)> {
    let text = normalize(expression).replace("por ciento", "%");
    let caps = captures(&PERCENT_OF, &text)?;
    let percent = caps.get(1)?.as_str().replace(',', ".");
    let base = caps.get(2)?.as_str().replace(',', ".");
    Some((
        percent.clone(),
        DecimalNumber::parse(&percent)?,
        base.clone(),
        DecimalNumber::parse(&base)?,
    ))
}

/// Walks `p% de b`: fraction over 100 → product → division by 100.
#[derive(Debug, Clone, Copy, Default)]
pub struct PercentagesEngine;

impl ExerciseEngine for PercentagesEngine {
    fn topic(&self) -> Topic {
        Topic::Porcentajes
    }

    fn compute_step(&self, expression: &str, step: usize, cycle: Cycle) -> Result<StepResult> {
        let (p_text, p, b_text, b) = read(expression)
            .ok_or_else(|| StepError::parse_failure(Topic::Porcentajes, expression))?;
        let hundred = BigRational::from_integer(BigInt::from(100));
        let product = p.value() * b.value();
        let result = &product / &hundred;
        let (p_shown, b_shown) = (p_text.replace('.', ","), b_text.replace('.', ","));

        let (tag, prompt, expected) = match step {
            0 => (
                StepTag::PercFrac,
                match cycle {
                    Cycle::C1 => format!(
                        "👉 {p_shown}% quiere decir {p_shown} de cada 100. \
                         Escríbelo como fracción (N/100)."
                    ),
                    Cycle::C2 | Cycle::C3 => {
                        format!("👉 Escribe {p_shown}% como fracción sobre 100.")
                    }
                },
                format!("{p_text}/100"),
            ),
            1 => (
                StepTag::PercMult,
                format!(
                    "👉 Multiplica esa fracción por {b_shown}: ¿cuánto es {p_shown} × {b_shown}? \
                     Escribe el resultado sobre 100 (N/100)."
                ),
                format!("{}/100", format_decimal(&product, PRODUCT_PLACES)),
            ),
            2 => (
                StepTag::PercSimplify,
                "👉 Ahora divide entre 100. ¿Cuál es el resultado?".to_string(),
                format_decimal(&result, DISPLAY_PLACES),
            ),
            _ => {
                return Ok(StepResult::done(
                    StepTag::PercResult,
                    step,
                    format!(
                        "✅ El {p_shown}% de {b_shown} es <b>{}</b>.",
                        format_decimal(&result, DISPLAY_PLACES).replace('.', ",")
                    ),
                ));
            }
        };
        Ok(StepResult::ask(tag, step, prompt, expected))
    }

    fn canonical_expression(&self, expression: &str) -> Option<String> {
        read(expression).map(|(p, _, b, _)| format!("{p}% de {b}"))
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use crate::StepStatus;

    fn expected(expression: &str, step: usize) -> String {
        PercentagesEngine
            .compute_step(expression, step, Cycle::C2)
            .unwrap()
            .expected_answer
            .unwrap()
    }

    #[test]
    fn test_percent_of_quantity() {
        let e = "¿Cuánto es el 20% de 50?";
        assert_eq!(expected(e, 0), "20/100");
        assert_eq!(expected(e, 1), "1000/100");
        assert_eq!(expected(e, 2), "10");
    }

    #[test]
    fn test_por_ciento_wording() {
        assert_eq!(expected("15 por ciento de 80", 2), "12");
    }

    #[test]
    fn test_rounded_result() {
        let e = "12,5% de 7";
        assert_eq!(expected(e, 1), "87.5/100");
        assert_eq!(expected(e, 2), "0.88");
        let done = PercentagesEngine.compute_step(e, 3, Cycle::C2).unwrap();
        assert_eq!(done.status, StepStatus::Done);
        assert!(done.message.contains("<b>0,88</b>"));
    }

    #[test]
    fn test_missing_percent_sign() {
        assert!(PercentagesEngine.compute_step("20 de 50", 0, Cycle::C2).is_err());
    }
}
