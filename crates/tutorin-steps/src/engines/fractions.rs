//! Addition and subtraction of two fractions through a common denominator.

use num_bigint::BigInt;
use num_traits::Zero;
use once_cell::sync::Lazy;
use regex::Regex;

use super::{by_cycle, captures, normalize, with_board, ExerciseEngine, Pattern};
use crate::arithmetic::{format_fraction, fraction_pipeline, FractionExpr, FractionOp, FractionPipeline};
use crate::board::Board;
use crate::{Cycle, Result, StepError, StepResult, StepTag, Topic};

static TWO_FRACTIONS: Pattern = Lazy::new(|| {
    Regex::new(r"(\d+)\s*/\s*(\d+)\s*(\+|-|más|mas|menos)\s*(\d+)\s*/\s*(\d+)").ok()
});

/// Reads `a/b op c/d` anywhere in `text`. Zero denominators are returned
/// as written; [`FractionsEngine`] rejects them.
#[must_use]
pub fn read_fractions(text: &str) -> Option<FractionExpr> {
    let text = normalize(text);
    let caps = captures(&TWO_FRACTIONS, &text)?;
    let int = |i: usize| caps.get(i)?.as_str().parse::<BigInt>().ok();
    let op = match caps.get(3)?.as_str() {
        "-" | "menos" => FractionOp::Sub,
        _ => FractionOp::Add,
    };
    Some(FractionExpr {
        left_num: int(1)?,
        left_den: int(2)?,
        op,
        right_num: int(4)?,
        right_den: int(5)?,
    })
}

/// Human form with spaces, `2/3 + 1/4`.
fn spaced(expr: &FractionExpr) -> String {
    format!(
        "{}/{} {} {}/{}",
        expr.left_num,
        expr.left_den,
        expr.op.symbol(),
        expr.right_num,
        expr.right_den
    )
}

const fn verb(op: FractionOp) -> &'static str {
    match op {
        FractionOp::Add => "sumar",
        FractionOp::Sub => "restar",
    }
}

/// Working shown so far: the statement, then each rewritten line.
fn working(expr: &FractionExpr, p: &FractionPipeline, stage: usize) -> String {
    let mut board = Board::new(0);
    board.raw(format!("  {}", spaced(expr)));
    if stage > 2 {
        board.raw(format!(
            "= {}/{} {} {}/{}",
            p.left_scaled,
            p.lcm,
            expr.op.symbol(),
            p.right_scaled,
            p.lcm
        ));
    }
    if stage > 3 {
        board.raw(format!("= {}/{}", p.combined, p.lcm));
    }
    if stage > 4 {
        board.raw(format!("= {}", format_fraction(&p.simplified)));
    }
    board.render()
}

/// Walks `a/b ± c/d`: same denominator? → LCM → equivalent numerators →
/// combined fraction → lowest terms.
#[derive(Debug, Clone, Copy, Default)]
pub struct FractionsEngine;

impl ExerciseEngine for FractionsEngine {
    fn topic(&self) -> Topic {
        Topic::Fracciones
    }

    fn compute_step(&self, expression: &str, step: usize, cycle: Cycle) -> Result<StepResult> {
        let expr = read_fractions(expression)
            .ok_or_else(|| StepError::parse_failure(Topic::Fracciones, expression))?;
        if expr.left_den.is_zero() || expr.right_den.is_zero() {
            return Err(StepError::zero_denominator(expression));
        }
        let p = fraction_pipeline(&expr);
        let (b, d) = (&expr.left_den, &expr.right_den);
        let symbol = expr.op.symbol();
        let html = working(&expr, &p, step);

        let (tag, prompt, expected) = match step {
            0 => (
                StepTag::FracInicio,
                by_cycle(
                    cycle,
                    format!(
                        "👉 Vamos a {} {}. Mira el número de abajo de cada fracción: \
                         ¿tienen el mismo denominador? (sí/no)",
                        verb(expr.op),
                        spaced(&expr)
                    ),
                    format!(
                        "👉 Vamos a {} {}. ¿Tienen el mismo denominador? (sí/no)",
                        verb(expr.op),
                        spaced(&expr)
                    ),
                    format!(
                        "👉 {}: antes de operar, ¿tienen el mismo denominador? (sí/no)",
                        spaced(&expr)
                    ),
                ),
                if p.same_denominator { "sí" } else { "no" }.to_string(),
            ),
            1 => (
                StepTag::FracMcm,
                if p.same_denominator {
                    "👉 Los denominadores ya son iguales. ¿Cuál es el denominador común?"
                        .to_string()
                } else {
                    by_cycle(
                        cycle,
                        format!(
                            "👉 Busca el número más pequeño que esté en la tabla del {b} y en \
                             la del {d}. ¿Cuál es?"
                        ),
                        format!("👉 ¿Cuál es el mínimo común múltiplo de {b} y {d}?"),
                        format!("👉 Calcula el m.c.m.({b}, {d})."),
                    )
                },
                p.lcm.to_string(),
            ),
            2 => (
                StepTag::FracEquiv,
                format!(
                    "👉 Escribe las dos fracciones con denominador {}. \
                     ¿Cuáles son los nuevos numeradores? Escríbelos así: A y C",
                    p.lcm
                ),
                format!("{} y {}", p.left_scaled, p.right_scaled),
            ),
            3 => (
                StepTag::FracOperacion,
                format!(
                    "👉 Ahora opera los numeradores: {} {symbol} {}. \
                     Escribe la fracción que resulta (N/{}).",
                    p.left_scaled, p.right_scaled, p.lcm
                ),
                format!("{}/{}", p.combined, p.lcm),
            ),
            4 => (
                StepTag::FracSimplificar,
                format!(
                    "👉 Simplifica {}/{} todo lo que puedas. Si ya no se puede, escríbela igual.",
                    p.combined, p.lcm
                ),
                format_fraction(&p.simplified),
            ),
            _ => {
                let message = format!(
                    "✅ ¡Fracción terminada! {} = <b>{}</b>.",
                    spaced(&expr),
                    format_fraction(&p.simplified)
                );
                return Ok(StepResult::done(
                    StepTag::FracResultado,
                    step,
                    with_board(&message, &html),
                ));
            }
        };
        Ok(StepResult::ask(tag, step, with_board(&prompt, &html), expected))
    }

    fn canonical_expression(&self, expression: &str) -> Option<String> {
        read_fractions(expression)
            .filter(|e| !e.left_den.is_zero() && !e.right_den.is_zero())
            .map(|e| e.to_string())
    }
}
