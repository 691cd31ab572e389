//! Unit conversions within the metric families of length, mass and capacity.

use std::cmp::Ordering;

use num_bigint::BigInt;
use num_rational::BigRational;
use once_cell::sync::Lazy;
use regex::Regex;

use super::{captures, normalize, ExerciseEngine, Pattern};
use crate::arithmetic::{format_decimal, pow10, DecimalNumber, DISPLAY_PLACES};
use crate::{Cycle, Result, StepError, StepResult, StepTag, Topic};

/// Places kept for the converted value before the final rounding.
const CALC_PLACES: usize = 4;

static CONVERT_TO: Pattern = Lazy::new(|| {
    Regex::new(r"(\d+(?:[.,]\d+)?)\s*([a-záéíóú]+)\s+(?:a|en|to)\s+([a-záéíóú]+)").ok()
});

static HOW_MANY: Pattern = Lazy::new(|| {
    Regex::new(r"cu[aá]nt[oa]s\s+([a-záéíóú]+)\s+(?:son|hay en|hay|tiene[n]?)\s+(\d+(?:[.,]\d+)?)\s*([a-záéíóú]+)")
        .ok()
});

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Family {
    Length,
    Mass,
    Capacity,
}

/// A unit with its family and power-of-ten exponent relative to the base unit.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
struct Unit {
    symbol: &'static str,
    family: Family,
    exponent: i32,
}

#[rustfmt::skip]
const UNITS: [(&[&str], Unit); 11] = [
    (&["km", "kilómetro", "kilómetros", "kilometro", "kilometros"], Unit { symbol: "km", family: Family::Length, exponent: 3 }),
    (&["m", "metro", "metros"], Unit { symbol: "m", family: Family::Length, exponent: 0 }),
    (&["cm", "centímetro", "centímetros", "centimetro", "centimetros"], Unit { symbol: "cm", family: Family::Length, exponent: -2 }),
    (&["mm", "milímetro", "milímetros", "milimetro", "milimetros"], Unit { symbol: "mm", family: Family::Length, exponent: -3 }),
    (&["kg", "kilo", "kilos", "kilogramo", "kilogramos"], Unit { symbol: "kg", family: Family::Mass, exponent: 3 }),
    (&["g", "gramo", "gramos"], Unit { symbol: "g", family: Family::Mass, exponent: 0 }),
    (&["mg", "miligramo", "miligramos"], Unit { symbol: "mg", family: Family::Mass, exponent: -3 }),
    (&["l", "litro", "litros"], Unit { symbol: "l", family: Family::Capacity, exponent: 0 }),
    (&["dl", "decilitro", "decilitros"], Unit { symbol: "dl", family: Family::Capacity, exponent: -1 }),
    (&["cl", "centilitro", "centilitros"], Unit { symbol: "cl", family: Family::Capacity, exponent: -2 }),
    (&["ml", "mililitro", "mililitros"], Unit { symbol: "ml", family: Family::Capacity, exponent: -3 }),
];

fn unit(word: &str) -> Option<Unit> {
    UNITS
        .iter()
        .find(|(names, _)| names.contains(&word))
        .map(|(_, unit)| *unit)
}

/// The raw conversion request as written.
struct Request {
    amount_text: String,
    amount: DecimalNumber,
    from: String,
    to: String,
}

fn read(expression: &str) -> Option<Request> {
    let text = normalize(expression);
    let (amount, from, to) = if let Some(caps) = captures(&CONVERT_TO, &text) {
        (caps.get(1)?, caps.get(2)?, caps.get(3)?)
    } else {
        let caps = captures(&HOW_MANY, &text)?;
        (caps.get(2)?, caps.get(3)?, caps.get(1)?)
    };
    let amount_text = amount.as_str().replace(',', ".");
    Some(Request {
        amount: DecimalNumber::parse(&amount_text)?,
        amount_text,
        from: from.as_str().to_string(),
        to: to.as_str().to_string(),
    })
}

/// Walks a conversion: bigger or smaller → factor → value.
#[derive(Debug, Clone, Copy, Default)]
pub struct MeasuresEngine;

impl ExerciseEngine for MeasuresEngine {
    fn topic(&self) -> Topic {
        Topic::Medidas
    }

    fn compute_step(&self, expression: &str, step: usize, cycle: Cycle) -> Result<StepResult> {
        let request =
            read(expression).ok_or_else(|| StepError::parse_failure(Topic::Medidas, expression))?;
        let (Some(from), Some(to)) = (unit(&request.from), unit(&request.to)) else {
            return Ok(unknown_pair(&request, step));
        };
        if from.family != to.family {
            return Ok(unknown_pair(&request, step));
        }

        let shift = from.exponent - to.exponent;
        let factor = pow10(usize::try_from(shift.unsigned_abs()).unwrap_or(0));
        let factor_rational = BigRational::from_integer(BigInt::from(factor.clone()));
        let amount = request.amount.value();
        let (direction, verb, converted) = match shift.cmp(&0) {
            Ordering::Greater => ("mayor", "multiplicar", amount * factor_rational),
            Ordering::Less => ("menor", "dividir", amount / factor_rational),
            Ordering::Equal => ("igual", "multiplicar", amount),
        };
        let value = request.amount_text.replace('.', ",");
        let (f, t) = (from.symbol, to.symbol);

        let (tag, prompt, expected) = match step {
            0 => (
                StepTag::MeasEstimate,
                match cycle {
                    Cycle::C1 => format!(
                        "👉 Vamos a pasar {value} {f} a {t}. Piensa: ¿la unidad {t} es más \
                         grande o más pequeña que {f}? Entonces, ¿el número saldrá mayor o menor?"
                    ),
                    Cycle::C2 | Cycle::C3 => format!(
                        "👉 Al pasar {value} {f} a {t}, ¿el número será mayor o menor?"
                    ),
                },
                direction.to_string(),
            ),
            1 => (
                StepTag::MeasFactor,
                format!("👉 ¿Por qué número hay que {verb} para pasar de {f} a {t}?"),
                factor.to_string(),
            ),
            2 => (
                StepTag::MeasCalc,
                format!("👉 Calcula el valor en {t}. ¿Cuánto es?"),
                format_decimal(&converted, CALC_PLACES),
            ),
            _ => {
                let shown = format_decimal(&converted, DISPLAY_PLACES).replace('.', ",");
                return Ok(StepResult::done(
                    StepTag::MeasResult,
                    step,
                    format!("✅ {value} {f} = <b>{shown}</b> {t}."),
                ));
            }
        };
        Ok(StepResult::ask(tag, step, prompt, expected))
    }

    fn canonical_expression(&self, expression: &str) -> Option<String> {
        read(expression).map(|r| format!("{} {} a {}", r.amount_text, r.from, r.to))
    }
}

fn unknown_pair(request: &Request, step: usize) -> StepResult {
    StepResult::error(
        StepTag::MeasUnknown,
        step,
        format!(
            "📏 No sé convertir de {} a {}. Prueba con km, m, cm, mm, kg, g, mg, l, dl, cl o ml \
             de la misma magnitud.",
            request.from, request.to
        ),
    )
}
