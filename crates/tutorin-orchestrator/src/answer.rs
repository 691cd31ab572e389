//! Answer canonicalization.
//!
//! Pupils type answers in many ways: `12,5`, `12.5 `, `3 / 4`, `si`, `por`.
//! Both the submitted and the expected answer go through [`canonicalize`]
//! and are compared as plain strings.

use once_cell::sync::Lazy;
use regex::{Captures, Regex};

static DIGIT_X_DIGIT: Lazy<Option<Regex>> = Lazy::new(|| Regex::new(r"(\d)x(\d)").ok());

static NUMBER: Lazy<Option<Regex>> = Lazy::new(|| Regex::new(r"\d+(?:\.\d+)?").ok());

static UNKNOWN_PATTERN: Lazy<Option<Regex>> = Lazy::new(|| Regex::new(r"^no\b.*\b(se|sé)$").ok());

const UNKNOWN_PHRASES: [&str; 8] = [
    "no se",
    "nose",
    "no lo se",
    "no lo sé",
    "ni idea",
    "no sé",
    "no entiendo",
    "no lo entiendo",
];

fn fold_accents(text: &str) -> String {
    text.chars()
        .map(|c| match c {
            'á' | 'à' => 'a',
            'é' | 'è' => 'e',
            'í' | 'ì' => 'i',
            'ó' | 'ò' => 'o',
            'ú' | 'ù' | 'ü' => 'u',
            other => other,
        })
        .collect()
}

/// Operator names a pupil may write instead of the symbol.
fn operator_word(word: &str) -> Option<&'static str> {
    match word {
        "suma" | "sumar" | "mas" => Some("+"),
        "resta" | "restar" | "menos" => Some("-"),
        "multiplicacion" | "multiplicar" | "por" | "x" | "*" => Some("×"),
        "division" | "dividir" | "entre" | "/" | ":" => Some("÷"),
        _ => None,
    }
}

/// `007` → `7`, `2.50` → `2.5`, `3.0` → `3`.
fn tidy_number(caps: &Captures<'_>) -> String {
    let raw = &caps[0];
    let (int, frac) = raw.split_once('.').unwrap_or((raw, ""));
    let int = int.trim_start_matches('0');
    let int = if int.is_empty() { "0" } else { int };
    let frac = frac.trim_end_matches('0');
    if frac.is_empty() {
        int.to_string()
    } else {
        format!("{int}.{frac}")
    }
}

/// Normalizes an answer for comparison.
#[must_use]
pub fn canonicalize(answer: &str) -> String {
    let lowered = fold_accents(&answer.trim().to_lowercase());
    let trimmed = lowered
        .trim_start_matches(['¿', '¡'])
        .trim_end_matches(['.', '!', '?'])
        .trim();
    if let Some(symbol) = operator_word(trimmed) {
        return symbol.to_string();
    }

    let joined = trimmed
        .split_whitespace()
        .map(|token| if token == "x" { "×" } else { token })
        .collect::<String>()
        .replace(['*', '·'], "×")
        .replace(['−', '–'], "-")
        .replace('π', "pi")
        .replace('²', "^2")
        .replace(',', ".");

    let mut text = joined;
    if let Some(re) = DIGIT_X_DIGIT.as_ref() {
        // Twice, so `2x3x4` has both signs replaced.
        for _ in 0..2 {
            text = re.replace_all(&text, "${1}×${2}").into_owned();
        }
    }
    let text = text.trim_end_matches('.').to_string();

    match NUMBER.as_ref() {
        Some(re) => re.replace_all(&text, tidy_number).into_owned(),
        None => text,
    }
}

/// Whether `answer` matches `expected` after canonicalization.
#[must_use]
pub fn answers_match(answer: &str, expected: &str) -> bool {
    let answer = canonicalize(answer);
    !answer.is_empty() && answer == canonicalize(expected)
}

/// Whether the pupil said they don't know.
#[must_use]
pub fn is_unknown_answer(answer: &str) -> bool {
    let text = answer.trim().to_lowercase();
    let text = text.trim_end_matches(['.', '!', '?']).trim();
    if text.is_empty() {
        return false;
    }
    UNKNOWN_PHRASES.contains(&text) || UNKNOWN_PATTERN.as_ref().is_some_and(|re| re.is_match(text))
}
