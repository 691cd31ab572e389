//! Long multiplication: one partial line per multiplier digit, then the sum.

use num_bigint::BigUint;

use super::{by_cycle, estimate, integer_pair, place_name, with_board, ExerciseEngine};
use crate::arithmetic::partial_products;
use crate::{board, Cycle, Result, StepError, StepResult, StepTag, Topic};

const SYMBOLS: [char; 4] = ['×', '*', 'x', '·'];

/// Walks `a × b` partial line by partial line.
#[derive(Debug, Clone, Copy, Default)]
pub struct MultiplicationEngine;

impl MultiplicationEngine {
    fn operands(expression: &str) -> Option<(BigUint, BigUint)> {
        integer_pair(expression, &SYMBOLS)
    }
}

impl ExerciseEngine for MultiplicationEngine {
    fn topic(&self) -> Topic {
        Topic::Multiplicacion
    }

    fn compute_step(&self, expression: &str, step: usize, cycle: Cycle) -> Result<StepResult> {
        let (a, b) = Self::operands(expression)
            .ok_or_else(|| StepError::parse_failure(Topic::Multiplicacion, expression))?;
        let partials = partial_products(&a, &b);
        let product = &a * &b;

        if let Some(partial) = partials.get(step) {
            let place = place_name(partial.position);
            let digit = partial.digit;
            let zeros = match partial.position {
                0 => String::new(),
                1 => " Como es la cifra de las decenas, añade un 0 a la derecha.".to_string(),
                n => format!(" Añade {n} ceros a la derecha por su posición."),
            };
            let prompt = by_cycle(
                cycle,
                format!(
                    "👉 Multiplica {a} por {digit}, la cifra de las <b>{place}</b> de {b}, \
                     de derecha a izquierda y llevando cuando haga falta.{zeros} \
                     ¿Cuál es la línea parcial?"
                ),
                format!("👉 {a} × {digit} ({place}).{zeros} ¿Cuál es la línea parcial?"),
                format!(
                    "👉 Estima ≈ {}. {a} × {digit} ({place}).{zeros} ¿Cuál es la línea parcial?",
                    estimate(&a) * estimate(&b)
                ),
            );
            let html = board::multiplication(&a, &b, &partials, step, None);
            return Ok(StepResult::ask(
                StepTag::MultParcial,
                step,
                with_board(&prompt, &html),
                partial.value.to_string(),
            ));
        }

        if step == partials.len() {
            let prompt = "👉 Ahora suma todas las líneas parciales. ¿Cuál es el resultado final?";
            let html = board::multiplication(&a, &b, &partials, partials.len(), None);
            return Ok(StepResult::ask(
                StepTag::MultSuma,
                step,
                with_board(prompt, &html),
                product.to_string(),
            ));
        }

        let html = board::multiplication(&a, &b, &partials, partials.len(), Some(&product));
        let message = format!("✅ ¡Genial! {a} × {b} = <b>{product}</b>.");
        Ok(
            StepResult::done(StepTag::MultResultado, step, with_board(&message, &html))
                .with_expected(product.to_string()),
        )
    }

    fn canonical_expression(&self, expression: &str) -> Option<String> {
        Self::operands(expression).map(|(a, b)| format!("{a}×{b}"))
    }
}
