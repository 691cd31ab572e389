//! Column addition.

use num_bigint::BigUint;

use super::{by_cycle, capitalize, estimate, integer_pair, place_name, with_board, ExerciseEngine};
use crate::arithmetic::column_addition;
use crate::{board, Cycle, Result, StepError, StepResult, StepTag, Topic};

/// Walks `a + b` one column at a time, units first.
#[derive(Debug, Clone, Copy, Default)]
pub struct AdditionEngine;

impl AdditionEngine {
    fn operands(expression: &str) -> Option<(BigUint, BigUint)> {
        integer_pair(expression, &['+'])
    }
}

impl ExerciseEngine for AdditionEngine {
    fn topic(&self) -> Topic {
        Topic::Suma
    }

    fn compute_step(&self, expression: &str, step: usize, cycle: Cycle) -> Result<StepResult> {
        let (a, b) = Self::operands(expression)
            .ok_or_else(|| StepError::parse_failure(Topic::Suma, expression))?;
        let add = column_addition(&a, &b);

        if let Some(col) = add.columns.get(step) {
            let place = place_name(step);
            let (top, bottom) = (col.top, col.bottom);
            let carry = if col.carry_in > 0 {
                format!(" + {}", col.carry_in)
            } else {
                String::new()
            };
            let prompt = by_cycle(
                cycle,
                format!(
                    "👉 Columna de las <b>{place}</b>: suma {top} + {bottom}{carry}. \
                     Si te sale 10 o más, escribe solo la última cifra y lleva 1 a la \
                     columna siguiente. ¿Qué cifra escribes?"
                ),
                format!(
                    "👉 {}: {top} + {bottom}{carry}. Si es ≥ 10, lleva 1. ¿Qué cifra escribes?",
                    capitalize(&place)
                ),
                format!(
                    "👉 Estima ≈ {}. {}: {top} + {bottom}{carry}. ¿Qué cifra escribes?",
                    estimate(&a) + estimate(&b),
                    capitalize(&place)
                ),
            );
            let html = board::addition(&a, &b, &add, step, false);
            return Ok(StepResult::ask(
                StepTag::AddCol,
                step,
                with_board(&prompt, &html),
                col.digit.to_string(),
            ));
        }

        if step == add.columns.len() && add.final_carry > 0 {
            let prompt = format!(
                "👉 Después de la última columna te queda una llevada de {}. \
                 ¿Qué cifra escribes a la izquierda del todo?",
                add.final_carry
            );
            let html = board::addition(&a, &b, &add, step, false);
            return Ok(StepResult::ask(
                StepTag::AddCarry,
                step,
                with_board(&prompt, &html),
                add.final_carry.to_string(),
            ));
        }

        let sum = add.result();
        let html = board::addition(&a, &b, &add, add.step_count(), true);
        let message = format!("✅ ¡Buen trabajo! Has terminado la suma: {a} + {b} = <b>{sum}</b>.");
        Ok(StepResult::done(StepTag::AddResultado, step, with_board(&message, &html))
            .with_expected(sum.to_string()))
    }

    fn canonical_expression(&self, expression: &str) -> Option<String> {
        Self::operands(expression).map(|(a, b)| format!("{a}+{b}"))
    }
}
