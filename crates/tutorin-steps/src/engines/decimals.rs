//! Operations with decimal numbers: remove the point, operate, put it back.

use num_bigint::BigInt;
use num_traits::Signed;
use once_cell::sync::Lazy;
use regex::Regex;

use super::{by_cycle, captures, normalize, with_board, ExerciseEngine, Pattern};
use crate::arithmetic::{decimal_pipeline, DecimalNumber, DecimalOp, DISPLAY_PLACES};
use crate::board::Board;
use crate::{Cycle, Result, StepError, StepResult, StepTag, Topic};

static DECIMAL_PAIR: Pattern = Lazy::new(|| {
    Regex::new(r"(\d+(?:[.,]\d+)?)\s*([+\-×x*·/:÷])\s*(\d+(?:[.,]\d+)?)").ok()
});

struct Operands {
    left_text: String,
    left: DecimalNumber,
    op: DecimalOp,
    right_text: String,
    right: DecimalNumber,
}

fn read(expression: &str) -> Option<Operands> {
    let text = normalize(expression);
    let caps = captures(&DECIMAL_PAIR, &text)?;
    let left_text = caps.get(1)?.as_str().replace(',', ".");
    let right_text = caps.get(3)?.as_str().replace(',', ".");
    Some(Operands {
        left: DecimalNumber::parse(&left_text)?,
        op: DecimalOp::from_symbol(caps.get(2)?.as_str())?,
        right: DecimalNumber::parse(&right_text)?,
        left_text,
        right_text,
    })
}

/// `n` with `places` fixed decimals and a Spanish comma (`1250, 2` → `12,50`).
fn fixed(n: &BigInt, places: usize) -> String {
    let digits = n.abs().to_string();
    let sign = if n.is_negative() { "-" } else { "" };
    if places == 0 {
        return format!("{sign}{digits}");
    }
    let padded = format!("{digits:0>width$}", width = places + 1);
    let (int_part, frac_part) = padded.split_at(padded.len() - places);
    format!("{sign}{int_part},{frac_part}")
}

fn comma(text: &str) -> String {
    text.replace('.', ",")
}

/// Walks `x op y` with decimals: operator → alignment → integer operation →
/// decimal point.
#[derive(Debug, Clone, Copy, Default)]
pub struct DecimalsEngine;

impl ExerciseEngine for DecimalsEngine {
    fn topic(&self) -> Topic {
        Topic::Decimales
    }

    fn compute_step(&self, expression: &str, step: usize, cycle: Cycle) -> Result<StepResult> {
        let o = read(expression)
            .ok_or_else(|| StepError::parse_failure(Topic::Decimales, expression))?;
        let p = decimal_pipeline(&o.left, o.op, &o.right)
            .ok_or_else(|| StepError::division_by_zero(expression))?;
        let symbol = o.op.symbol();
        let (a, b) = (comma(&o.left_text), comma(&o.right_text));
        let aligned = o.left.places.max(o.right.places);

        let mut board = Board::new(0);
        if step >= 1 && o.op != DecimalOp::Mul {
            let top = fixed(&o.left.rescaled(aligned), aligned);
            let bottom = format!("{symbol} {}", fixed(&o.right.rescaled(aligned), aligned));
            let width = top.chars().count().max(bottom.chars().count()) + 2;
            board = Board::new(width);
            board.right(top).right(bottom).right("-".repeat(width - 2));
        }
        let html = if board.lines().is_empty() {
            String::new()
        } else {
            board.render()
        };
        let render = |prompt: &str| {
            if html.is_empty() {
                prompt.to_string()
            } else {
                with_board(prompt, &html)
            }
        };

        let (tag, prompt, expected) = match step {
            0 => (
                StepTag::DecimalIdentificar,
                by_cycle(
                    cycle,
                    format!(
                        "👉 Mira bien {a} {symbol} {b}. ¿Es una suma (+), una resta (-), \
                         una multiplicación (×) o una división (÷)? Escribe el signo."
                    ),
                    format!("👉 {a} {symbol} {b}: ¿qué operación es? Escribe el signo."),
                    format!(
                        "👉 {a} {symbol} {b}: escribe el signo de la operación y piensa \
                         cuántos decimales tendrá el resultado."
                    ),
                ),
                symbol.to_string(),
            ),
            1 => {
                let prompt = match o.op {
                    DecimalOp::Mul => format!(
                        "👉 En la multiplicación no hace falta alinear las comas: cuenta los \
                         decimales ({} + {} = {}). ¿Preparado? (sí)",
                        o.left.places,
                        o.right.places,
                        o.left.places + o.right.places
                    ),
                    DecimalOp::Div => format!(
                        "👉 Iguala los decimales de los dos números añadiendo ceros ({aligned} \
                         decimales cada uno). ¿Preparado? (sí)"
                    ),
                    DecimalOp::Add | DecimalOp::Sub => format!(
                        "👉 Coloca los números uno debajo del otro con las comas en la misma \
                         columna, completando con ceros hasta {aligned} decimales. ¿Preparado? (sí)"
                    ),
                };
                (StepTag::DecimalAlinear, prompt, "sí".to_string())
            }
            2 => {
                let mut prompt = format!(
                    "👉 Quita las comas y calcula {} {symbol} {}.",
                    p.integer_left, p.integer_right
                );
                if o.op == DecimalOp::Div {
                    prompt.push_str(" Usa 3 decimales en el cociente.");
                }
                (StepTag::DecimalOperar, prompt, p.integer_result_text())
            }
            3 => {
                let prompt = if o.op == DecimalOp::Div {
                    format!(
                        "👉 Al igualar los decimales el cociente no cambia. Redondea a \
                         {DISPLAY_PLACES} decimales: ¿cuál es el resultado de {a} ÷ {b}?"
                    )
                } else {
                    format!(
                        "👉 Ahora vuelve a poner la coma: el resultado lleva {} decimales. \
                         ¿Cuál es?",
                        p.result_places
                    )
                };
                (StepTag::DecimalResultado, prompt, p.result_text())
            }
            _ => {
                let message = format!(
                    "✅ ¡Perfecto! {a} {symbol} {b} = <b>{}</b>.",
                    comma(&p.result_text())
                );
                return Ok(StepResult::done(StepTag::DecimalFinal, step, render(&message)));
            }
        };
        Ok(StepResult::ask(tag, step, render(&prompt), expected))
    }

    fn canonical_expression(&self, expression: &str) -> Option<String> {
        read(expression).map(|o| format!("{}{}{}", o.left_text, o.op.symbol(), o.right_text))
    }
}
