//! Column subtraction with borrowing.

use num_bigint::BigUint;

use super::{by_cycle, capitalize, estimate, integer_pair, place_name, with_board, ExerciseEngine};
use crate::arithmetic::{column_subtraction, order_for_subtraction};
use crate::{board, Cycle, Result, StepError, StepResult, StepTag, Topic};

/// Walks `a - b` one column at a time. The larger operand always goes on top.
#[derive(Debug, Clone, Copy, Default)]
pub struct SubtractionEngine;

impl SubtractionEngine {
    fn operands(expression: &str) -> Option<(BigUint, BigUint)> {
        integer_pair(expression, &['-']).map(|(a, b)| order_for_subtraction(a, b))
    }
}

impl ExerciseEngine for SubtractionEngine {
    fn topic(&self) -> Topic {
        Topic::Resta
    }

    fn compute_step(&self, expression: &str, step: usize, cycle: Cycle) -> Result<StepResult> {
        let (a, b) = Self::operands(expression)
            .ok_or_else(|| StepError::parse_failure(Topic::Resta, expression))?;
        let sub = column_subtraction(&a, &b);

        if let Some(col) = sub.columns.get(step) {
            let place = place_name(step);
            let top = if col.borrow_in > 0 {
                format!("({} − 1)", col.top)
            } else {
                col.top.to_string()
            };
            let bottom = col.bottom;
            let prompt = by_cycle(
                cycle,
                format!(
                    "👉 Columna de las <b>{place}</b>: a {top} quítale {bottom}. \
                     Si arriba hay menos que abajo, pide prestada una decena a la columna \
                     de la izquierda. ¿Qué cifra escribes?"
                ),
                format!(
                    "👉 {}: {top} − {bottom}. Si no alcanza, pide 10 prestado. ¿Qué cifra escribes?",
                    capitalize(&place)
                ),
                format!(
                    "👉 Estima ≈ {}. {}: {top} − {bottom}. ¿Qué cifra escribes?",
                    estimate(&a) - estimate(&b).min(estimate(&a)),
                    capitalize(&place)
                ),
            );
            let html = board::subtraction(&a, &b, &sub, step, false);
            return Ok(StepResult::ask(
                StepTag::SubCol,
                step,
                with_board(&prompt, &html),
                col.digit.to_string(),
            ));
        }

        let difference = sub.result();
        let html = board::subtraction(&a, &b, &sub, sub.columns.len(), true);
        let message =
            format!("✅ ¡Muy bien! Has terminado la resta: {a} − {b} = <b>{difference}</b>.");
        Ok(
            StepResult::done(StepTag::SubResultado, step, with_board(&message, &html))
                .with_expected(difference.to_string()),
        )
    }

    fn canonical_expression(&self, expression: &str) -> Option<String> {
        Self::operands(expression).map(|(a, b)| format!("{a}-{b}"))
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use crate::StepStatus;

    #[test]
    fn test_borrowing_columns() {
        let digits: Vec<String> = (0..3)
            .map(|s| {
                SubtractionEngine
                    .compute_step("503 - 178", s, Cycle::C2)
                    .unwrap()
                    .expected_answer
                    .unwrap()
            })
            .collect();
        assert_eq!(digits, ["5", "2", "3"]);

        let tens = SubtractionEngine
            .compute_step("503 - 178", 1, Cycle::C2)
            .unwrap();
        assert!(tens.message.contains("(0 − 1) − 7"));
    }

    #[test]
    fn test_operands_swapped_when_needed() {
        let done = SubtractionEngine.compute_step("12 - 40", 2, Cycle::C2).unwrap();
        assert_eq!(done.status, StepStatus::Done);
        assert_eq!(done.expected_answer.as_deref(), Some("28"));
        assert_eq!(
            SubtractionEngine.canonical_expression("12 - 40"),
            Some("40-12".to_string())
        );
    }

    #[test]
    fn test_leading_zero_column_still_asked() {
        let step = SubtractionEngine.compute_step("105 - 98", 2, Cycle::C2).unwrap();
        assert_eq!(step.status, StepStatus::Ask);
        assert_eq!(step.expected_answer.as_deref(), Some("0"));
    }

    #[test]
    fn test_unicode_minus_accepted() {
        let step = SubtractionEngine.compute_step("50 − 8", 0, Cycle::C2).unwrap();
        assert_eq!(step.expected_answer.as_deref(), Some("2"));
    }
}
