//! Long division, Spanish layout.

use num_bigint::BigUint;
use num_traits::Zero;

use super::{by_cycle, integer_pair, with_board, ExerciseEngine};
use crate::arithmetic::{long_division, DivisionPosition};
use crate::board::{self, DivisionCursor};
use crate::{Cycle, Result, StepError, StepResult, StepTag, Topic};

const SYMBOLS: [char; 3] = ['/', ':', '÷'];

/// Walks `dividend ÷ divisor` block by block.
#[derive(Debug, Clone, Copy, Default)]
pub struct DivisionEngine;

impl DivisionEngine {
    fn operands(expression: &str) -> Option<(BigUint, BigUint)> {
        integer_pair(expression, &SYMBOLS)
    }
}

impl ExerciseEngine for DivisionEngine {
    fn topic(&self) -> Topic {
        Topic::Division
    }

    fn compute_step(&self, expression: &str, step: usize, cycle: Cycle) -> Result<StepResult> {
        let (dividend, divisor) = Self::operands(expression)
            .ok_or_else(|| StepError::parse_failure(Topic::Division, expression))?;
        if divisor.is_zero() {
            return Err(StepError::division_by_zero(expression));
        }
        let div = long_division(&dividend, &divisor)
            .ok_or_else(|| StepError::division_by_zero(expression))?;

        match div.locate(step) {
            DivisionPosition::FirstGroup => {
                let prompt = by_cycle(
                    cycle,
                    format!(
                        "👉 Empezamos por la izquierda. Coge cifras de {dividend} hasta formar \
                         un número que sea igual o mayor que {divisor}. ¿Qué número es?"
                    ),
                    format!(
                        "👉 ¿Cuál es el primer grupo de {dividend} que es ≥ {divisor}?"
                    ),
                    format!(
                        "👉 ¿Cuál es el primer grupo de {dividend} que es ≥ {divisor}? \
                         Piensa cuántas cifras tendrá el cociente."
                    ),
                );
                let html = board::division(
                    &div,
                    DivisionCursor {
                        block: 0,
                        sub: 0,
                        finished: false,
                    },
                );
                Ok(StepResult::ask(
                    StepTag::DivGrupo,
                    step,
                    with_board(&prompt, &html),
                    div.first_group().to_string(),
                ))
            }
            DivisionPosition::Block { block, sub } => {
                let current = &div.blocks[block];
                let group = &current.group;
                let html = board::division(
                    &div,
                    DivisionCursor {
                        block,
                        sub,
                        finished: false,
                    },
                );
                let (tag, prompt, expected) = match sub {
                    0 => (
                        StepTag::DivQdigit,
                        by_cycle(
                            cycle,
                            format!(
                                "👉 ¿Cuántas veces cabe <b>{divisor}</b> en <b>{group}</b> sin \
                                 pasarte? Repasa la tabla del {divisor}."
                            ),
                            format!(
                                "👉 ¿Cuántas veces cabe <b>{divisor}</b> en <b>{group}</b> sin pasarte?"
                            ),
                            format!(
                                "👉 ¿Cuántas veces cabe <b>{divisor}</b> en <b>{group}</b>? \
                                 Comprueba que {divisor} × tu cifra no pasa de {group}."
                            ),
                        ),
                        current.quotient_digit.to_string(),
                    ),
                    1 => (
                        StepTag::DivResta,
                        format!(
                            "👉 Multiplica {divisor} × {} y réstalo de {group}. ¿Cuánto queda?",
                            current.quotient_digit
                        ),
                        current.remainder.to_string(),
                    ),
                    _ => {
                        let (digit, new_group) = current
                            .bring_down
                            .as_ref()
                            .map(|b| (b.digit, b.new_group.to_string()))
                            .unwrap_or_default();
                        (
                            StepTag::DivBajar,
                            format!(
                                "👉 Baja la siguiente cifra ({digit}) junto al resto. \
                                 ¿Qué número te queda ahora?"
                            ),
                            new_group,
                        )
                    }
                };
                Ok(StepResult::ask(tag, step, with_board(&prompt, &html), expected))
            }
            DivisionPosition::Finished => {
                let quotient = div.quotient();
                let remainder = div.remainder();
                let html = board::division(
                    &div,
                    DivisionCursor {
                        block: div.blocks.len() - 1,
                        sub: 2,
                        finished: true,
                    },
                );
                let message = format!(
                    "✅ ¡División terminada! {dividend} ÷ {divisor} = <b>{quotient}</b> \
                     y resto <b>{remainder}</b>."
                );
                Ok(
                    StepResult::done(StepTag::DivResultado, step, with_board(&message, &html))
                        .with_expected(quotient.to_string()),
                )
            }
        }
    }

    fn canonical_expression(&self, expression: &str) -> Option<String> {
        Self::operands(expression)
            .filter(|(_, divisor)| !divisor.is_zero())
            .map(|(a, b)| format!("{a}÷{b}"))
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use crate::StepStatus;

    fn walk(expression: &str) -> Vec<(StepTag, String)> {
        let mut out = Vec::new();
        for step in 0.. {
            let result = DivisionEngine
                .compute_step(expression, step, Cycle::C2)
                .unwrap();
            if result.status == StepStatus::Done {
                break;
            }
            out.push((result.hint_type, result.expected_answer.unwrap()));
        }
        out
    }

    #[test]
    fn test_first_group_and_digit() {
        let steps = walk("3457/3");
        assert_eq!(steps[0], (StepTag::DivGrupo, "3".to_string()));
        assert_eq!(steps[1], (StepTag::DivQdigit, "1".to_string()));
        assert_eq!(steps[2], (StepTag::DivResta, "0".to_string()));
        assert_eq!(steps[3], (StepTag::DivBajar, "4".to_string()));
        assert_eq!(steps.len(), 12);
    }

    #[test]
    fn test_last_block_skips_bring_down() {
        let steps = walk("1234 : 56");
        let tags: Vec<StepTag> = steps.iter().map(|(t, _)| *t).collect();
        assert_eq!(
            tags,
            [
                StepTag::DivGrupo,
                StepTag::DivQdigit,
                StepTag::DivResta,
                StepTag::DivBajar,
                StepTag::DivQdigit,
                StepTag::DivResta,
            ]
        );
        assert_eq!(steps[0].1, "123");
        assert_eq!(steps[3].1, "114");
        assert_eq!(steps[5].1, "2");
    }

    #[test]
    fn test_done_reports_quotient_and_remainder() {
        let done = DivisionEngine.compute_step("1234 ÷ 56", 6, Cycle::C2).unwrap();
        assert_eq!(done.status, StepStatus::Done);
        assert!(done.message.contains("<b>22</b> y resto <b>2</b>"));
    }

    #[test]
    fn test_zero_divisor() {
        let err = DivisionEngine.compute_step("10 / 0", 0, Cycle::C2).unwrap_err();
        assert!(matches!(err, StepError::DivisionByZero { .. }));
        assert_eq!(DivisionEngine.canonical_expression("10 / 0"), None);
    }
}
