//! Word problems: find the operation, then hand over to that topic's engine.

use num_bigint::BigUint;
use once_cell::sync::Lazy;
use regex::Regex;

use super::fractions::read_fractions;
use super::{captures, engine_for, is_match, normalize, ExerciseEngine, Pattern};
use crate::{Cycle, Result, StepError, StepResult, StepStatus, StepTag, Topic};

static INTEGER: Pattern = Lazy::new(|| Regex::new(r"\d+").ok());

static FRACTION: Pattern = Lazy::new(|| Regex::new(r"(\d+)\s*/\s*(\d+)").ok());

static BARE_DECIMAL: Pattern = Lazy::new(|| {
    Regex::new(
        r"\d+[.,]\d+\s*[+\-×x*·/:÷]\s*\d+(?:[.,]\d+)?|\d+(?:[.,]\d+)?\s*[+\-×x*·/:÷]\s*\d+[.,]\d+",
    )
    .ok()
});

static BARE_PERCENT: Pattern = Lazy::new(|| Regex::new(r"\d+(?:[.,]\d+)?\s*%").ok());

static SUBTRACTIVE: Pattern =
    Lazy::new(|| Regex::new(r"\b(?:menos|resta|quedan|quita|quitan|diferencia)\b|-").ok());

/// Keyword cues per operation, checked in this order. Words match on word
/// boundaries, symbols anywhere.
const CUES: [(Topic, &[&str], &[&str]); 9] = [
    (Topic::Suma, &["más", "suma", "añadir", "añade", "total", "en conjunto"], &["+"]),
    (Topic::Resta, &["menos", "resta", "quedan", "diferencia"], &["-"]),
    (Topic::Multiplicacion, &["multiplica", "producto", "veces", "por cada"], &["×"]),
    (Topic::Division, &["divide", "reparte", "entre"], &["÷"]),
    (Topic::Fracciones, &["fracción", "fraccion", "partes iguales"], &["/"]),
    (Topic::Porcentajes, &["porcentaje", "por ciento"], &["%"]),
    (
        Topic::Medidas,
        &["km", "cm", "mm", "kg", "g", "ml", "l", "litros", "metros", "gramos"],
        &[],
    ),
    (
        Topic::Geometria,
        &["área", "perímetro", "figura", "triángulo", "cuadrado", "círculo", "rectángulo"],
        &[],
    ),
    (
        Topic::Estadistica,
        &["gráfico", "probabilidad", "frecuencia", "encuesta", "dado", "moneda"],
        &[],
    ),
];

static CUE_PATTERNS: Lazy<Vec<(Topic, Option<Regex>, &'static [&'static str])>> =
    Lazy::new(|| {
        CUES.iter()
            .map(|(topic, words, symbols)| {
                let alternation = words
                    .iter()
                    .map(|w| regex::escape(w))
                    .collect::<Vec<_>>()
                    .join("|");
                (*topic, Regex::new(&format!(r"\b(?:{alternation})\b")).ok(), *symbols)
            })
            .collect()
    });

/// Operation suggested by the wording, if any.
fn detect_operation(text: &str) -> Option<Topic> {
    CUE_PATTERNS.iter().find_map(|(topic, words, symbols)| {
        let by_word = words.as_ref().is_some_and(|re| re.is_match(text));
        let by_symbol = symbols.iter().any(|s| text.contains(s));
        (by_word || by_symbol).then_some(*topic)
    })
}

fn integers(text: &str) -> Vec<BigUint> {
    INTEGER
        .as_ref()
        .map(|re| {
            re.find_iter(text)
                .filter_map(|m| m.as_str().parse().ok())
                .collect()
        })
        .unwrap_or_default()
}

/// Builds a bare expression for `topic` from the numbers in `text`.
fn synthesize(topic: Topic, text: &str) -> Option<String> {
    let pair = || {
        let numbers = integers(text);
        Some((numbers.first()?.clone(), numbers.get(1)?.clone()))
    };
    match topic {
        Topic::Suma => pair().map(|(a, b)| format!("{a}+{b}")),
        Topic::Multiplicacion => pair().map(|(a, b)| format!("{a}×{b}")),
        Topic::Resta => pair().map(|(a, b)| format!("{}-{}", a.clone().max(b.clone()), a.min(b))),
        Topic::Division => pair().map(|(a, b)| format!("{}÷{}", a.clone().max(b.clone()), a.min(b))),
        Topic::Fracciones => {
            if let Some(expr) = read_fractions(text) {
                return Some(expr.to_string());
            }
            let re = FRACTION.as_ref()?;
            let found: Vec<(&str, &str)> = re
                .captures_iter(text)
                .filter_map(|c| Some((c.get(1)?.as_str(), c.get(2)?.as_str())))
                .take(2)
                .collect();
            let [(a, b), (c, d)] = found.as_slice() else {
                return None;
            };
            let op = if is_match(&SUBTRACTIVE, text) { '-' } else { '+' };
            Some(format!("{a}/{b}{op}{c}/{d}"))
        }
        Topic::Porcentajes | Topic::Medidas | Topic::Geometria | Topic::Estadistica => {
            Some(text.to_string())
        }
        Topic::Decimales | Topic::Problemas => None,
    }
}

/// Decides which engine handles `text` and with which statement.
///
/// Bare expressions are recognized before keyword cues so `2/3 + 1/4` is
/// not taken for a sum of integers.
fn route(text: &str) -> Option<(Topic, String)> {
    let text = normalize(text);
    if let Some(expr) = read_fractions(&text) {
        return Some((Topic::Fracciones, expr.to_string()));
    }
    if let Some(m) = BARE_DECIMAL.as_ref().and_then(|re| re.find(&text)) {
        return Some((Topic::Decimales, m.as_str().to_string()));
    }
    if captures(&BARE_PERCENT, &text).is_some() {
        if let Some(expr) = engine_for(Topic::Porcentajes).canonical_expression(&text) {
            return Some((Topic::Porcentajes, expr));
        }
    }
    let topic = detect_operation(&text)?;
    synthesize(topic, &text).map(|expr| (topic, expr))
}

/// Routes a word problem to the engine of the operation it describes.
#[derive(Debug, Clone, Copy, Default)]
pub struct ProblemSolvingEngine;

impl ExerciseEngine for ProblemSolvingEngine {
    fn topic(&self) -> Topic {
        Topic::Problemas
    }

    fn compute_step(&self, expression: &str, step: usize, cycle: Cycle) -> Result<StepResult> {
        let Some((topic, statement)) = route(expression) else {
            if integers(expression).is_empty() {
                return Err(StepError::parse_failure(Topic::Problemas, expression));
            }
            return Ok(StepResult::error(
                StepTag::ProblemUnknown,
                step,
                "🤔 No encuentro la operación de este problema. ¿Hay que sumar, restar, \
                 multiplicar o repartir?",
            ));
        };

        let mut result = engine_for(topic).compute_step(&statement, step, cycle)?;
        if step == 0 && result.status == StepStatus::Ask {
            result.message = format!(
                "🧩 Lo resolvemos como un ejercicio de {topic}: <b>{statement}</b>\n{}",
                result.message
            );
        }
        Ok(result)
    }

    fn canonical_expression(&self, expression: &str) -> Option<String> {
        route(expression).map(|(_, statement)| statement)
    }
}
