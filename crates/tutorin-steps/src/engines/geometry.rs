//! Areas and perimeters of the four school figures.

use num_bigint::BigInt;
use num_rational::BigRational;
use num_traits::Zero;
use once_cell::sync::Lazy;
use regex::Regex;

use super::{normalize, ExerciseEngine, Pattern};
use crate::arithmetic::{format_decimal, DecimalNumber, DISPLAY_PLACES};
use crate::{Cycle, Result, StepError, StepResult, StepTag, Topic};

static NUMBER: Pattern = Lazy::new(|| Regex::new(r"\d+(?:[.,]\d+)?").ok());

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Figure {
    Square,
    Rectangle,
    Triangle,
    Circle,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Measure {
    Area,
    Perimeter,
}

impl Figure {
    /// "cuadrado" is checked last so "metros cuadrados" does not win.
    fn detect(text: &str) -> Option<Self> {
        if text.contains("triángulo") || text.contains("triangulo") {
            Some(Self::Triangle)
        } else if text.contains("rectángulo") || text.contains("rectangulo") {
            Some(Self::Rectangle)
        } else if ["círculo", "circulo", "circunferencia"]
            .iter()
            .any(|w| text.contains(w))
        {
            Some(Self::Circle)
        } else if text.contains("cuadrado") {
            Some(Self::Square)
        } else {
            None
        }
    }

    const fn name(self) -> &'static str {
        match self {
            Self::Square => "cuadrado",
            Self::Rectangle => "rectángulo",
            Self::Triangle => "triángulo",
            Self::Circle => "círculo",
        }
    }

    const fn formula(self, measure: Measure) -> &'static str {
        match (self, measure) {
            (Self::Square, Measure::Area) => "lado × lado",
            (Self::Square, Measure::Perimeter) => "4 × lado",
            (Self::Rectangle, Measure::Area) => "base × altura",
            (Self::Rectangle, Measure::Perimeter) => "2 × (base + altura)",
            (Self::Triangle, Measure::Area) => "base × altura / 2",
            (Self::Triangle, Measure::Perimeter) => "lado + lado + lado",
            (Self::Circle, Measure::Area) => "π × radio²",
            (Self::Circle, Measure::Perimeter) => "2 × π × radio",
        }
    }

    const fn values_needed(self, measure: Measure) -> usize {
        match (self, measure) {
            (Self::Square | Self::Circle, _) => 1,
            (Self::Triangle, Measure::Perimeter) => 3,
            (Self::Rectangle | Self::Triangle, _) => 2,
        }
    }

    const fn data_names(self, measure: Measure) -> &'static str {
        match (self, measure) {
            (Self::Square, _) => "el lado",
            (Self::Rectangle, _) | (Self::Triangle, Measure::Area) => "la base y la altura",
            (Self::Triangle, Measure::Perimeter) => "los tres lados",
            (Self::Circle, _) => "el radio (o el diámetro)",
        }
    }
}

impl Measure {
    fn detect(text: &str) -> Self {
        if ["perímetro", "perimetro", "longitud", "contorno"]
            .iter()
            .any(|w| text.contains(w))
        {
            Self::Perimeter
        } else {
            Self::Area
        }
    }

    const fn name(self) -> &'static str {
        match self {
            Self::Area => "área",
            Self::Perimeter => "perímetro",
        }
    }
}

/// A geometry statement: figure, measure and the values found in order.
struct Statement {
    figure: Figure,
    measure: Measure,
    values: Vec<(String, BigRational)>,
}

fn read(expression: &str) -> Option<Statement> {
    let text = normalize(expression);
    let figure = Figure::detect(&text)?;
    let measure = Measure::detect(&text);
    let mut values: Vec<(String, BigRational)> = NUMBER
        .as_ref()
        .map(|re| {
            re.find_iter(&text)
                .filter_map(|m| {
                    let written = m.as_str().replace('.', ",");
                    DecimalNumber::parse(m.as_str()).map(|n| (written, n.value()))
                })
                .collect()
        })
        .unwrap_or_default();
    if figure == Figure::Circle
        && (text.contains("diámetro") || text.contains("diametro"))
        && !text.contains("radio")
    {
        if let Some((_, diameter)) = values.first().cloned() {
            let radius = diameter / BigRational::from_integer(BigInt::from(2));
            values[0] = (format_decimal(&radius, 4).replace('.', ","), radius);
        }
    }
    Some(Statement {
        figure,
        measure,
        values,
    })
}

fn pi() -> BigRational {
    BigRational::from_float(std::f64::consts::PI)
        .unwrap_or_else(|| BigRational::new(BigInt::from(355), BigInt::from(113)))
}

fn substituted(s: &Statement) -> String {
    let v = |i: usize| s.values.get(i).map_or("?", |(w, _)| w.as_str());
    match (s.figure, s.measure) {
        (Figure::Square, Measure::Area) => format!("{} × {}", v(0), v(0)),
        (Figure::Square, Measure::Perimeter) => format!("4 × {}", v(0)),
        (Figure::Rectangle, Measure::Area) => format!("{} × {}", v(0), v(1)),
        (Figure::Rectangle, Measure::Perimeter) => format!("2 × ({} + {})", v(0), v(1)),
        (Figure::Triangle, Measure::Area) => format!("{} × {} / 2", v(0), v(1)),
        (Figure::Triangle, Measure::Perimeter) => format!("{} + {} + {}", v(0), v(1), v(2)),
        (Figure::Circle, Measure::Area) => format!("π × {}²", v(0)),
        (Figure::Circle, Measure::Perimeter) => format!("2 × π × {}", v(0)),
    }
}

fn value(s: &Statement) -> BigRational {
    let v = |i: usize| s.values.get(i).map_or_else(BigRational::zero, |(_, r)| r.clone());
    let int = |n: i64| BigRational::from_integer(BigInt::from(n));
    match (s.figure, s.measure) {
        (Figure::Square, Measure::Area) => v(0) * v(0),
        (Figure::Square, Measure::Perimeter) => int(4) * v(0),
        (Figure::Rectangle, Measure::Area) => v(0) * v(1),
        (Figure::Rectangle, Measure::Perimeter) => int(2) * (v(0) + v(1)),
        (Figure::Triangle, Measure::Area) => v(0) * v(1) / int(2),
        (Figure::Triangle, Measure::Perimeter) => v(0) + v(1) + v(2),
        (Figure::Circle, Measure::Area) => pi() * v(0) * v(0),
        (Figure::Circle, Measure::Perimeter) => int(2) * pi() * v(0),
    }
}

/// Walks an area or perimeter: formula → substitution → value.
#[derive(Debug, Clone, Copy, Default)]
pub struct GeometryEngine;

impl ExerciseEngine for GeometryEngine {
    fn topic(&self) -> Topic {
        Topic::Geometria
    }

    fn compute_step(&self, expression: &str, step: usize, cycle: Cycle) -> Result<StepResult> {
        let s = read(expression)
            .ok_or_else(|| StepError::parse_failure(Topic::Geometria, expression))?;
        let (figure, measure) = (s.figure.name(), s.measure.name());

        if s.values.len() < s.figure.values_needed(s.measure) {
            return Ok(StepResult::error(
                StepTag::GeoMissing,
                step,
                format!(
                    "📐 Para calcular el {measure} del {figure} necesito {}. \
                     ¿Me los dices?",
                    s.figure.data_names(s.measure)
                ),
            ));
        }

        let result = format_decimal(&value(&s), DISPLAY_PLACES);
        let (tag, prompt, expected) = match step {
            0 => (
                StepTag::GeoFormula,
                match cycle {
                    Cycle::C1 => format!(
                        "👉 Vamos a calcular el {measure} de un {figure}. \
                         ¿Con qué fórmula se calcula? Usa palabras como lado, base, altura o radio."
                    ),
                    Cycle::C2 | Cycle::C3 => {
                        format!("👉 ¿Cuál es la fórmula del {measure} del {figure}?")
                    }
                },
                s.figure.formula(s.measure).to_string(),
            ),
            1 => (
                StepTag::GeoSubstitute,
                format!(
                    "👉 Sustituye los datos en la fórmula {}. ¿Cómo queda?",
                    s.figure.formula(s.measure)
                ),
                substituted(&s),
            ),
            2 => (
                StepTag::GeoCalc,
                format!(
                    "👉 Calcula {}. Redondea a 2 decimales si hace falta.",
                    substituted(&s)
                ),
                result,
            ),
            _ => {
                let units = if s.measure == Measure::Area {
                    "unidades cuadradas"
                } else {
                    "unidades"
                };
                return Ok(StepResult::done(
                    StepTag::GeoResult,
                    step,
                    format!(
                        "✅ El {measure} del {figure} es <b>{}</b> {units}.",
                        result.replace('.', ",")
                    ),
                ));
            }
        };
        Ok(StepResult::ask(tag, step, prompt, expected))
    }

    fn canonical_expression(&self, expression: &str) -> Option<String> {
        read(expression).map(|s| {
            let values: Vec<&str> = s.values.iter().map(|(w, _)| w.as_str()).collect();
            format!("{} {} {}", s.measure.name(), s.figure.name(), values.join(" "))
        })
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use crate::StepStatus;

    fn expected(expression: &str, step: usize) -> String {
        GeometryEngine
            .compute_step(expression, step, Cycle::C2)
            .unwrap()
            .expected_answer
            .unwrap()
    }

    #[test]
    fn test_rectangle_area() {
        let e = "Calcula el área de un rectángulo de base 5 y altura 3";
        assert_eq!(expected(e, 0), "base × altura");
        assert_eq!(expected(e, 1), "5 × 3");
        assert_eq!(expected(e, 2), "15");
        let done = GeometryEngine.compute_step(e, 3, Cycle::C2).unwrap();
        assert_eq!(done.status, StepStatus::Done);
    }

    #[test]
    fn test_circle_area_from_diameter() {
        let e = "área de un círculo de diámetro 4";
        assert_eq!(expected(e, 1), "π × 2²");
        assert_eq!(expected(e, 2), "12.57");
    }

    #[test]
    fn test_triangle_perimeter_needs_three_sides() {
        let e = "perímetro de un triángulo de lados 3 y 4";
        let step = GeometryEngine.compute_step(e, 0, Cycle::C2).unwrap();
        assert_eq!(step.status, StepStatus::Error);
        assert_eq!(step.hint_type, StepTag::GeoMissing);
        assert_eq!(step.expected_answer, None);

        assert_eq!(expected("perímetro de un triángulo de lados 3, 4 y 5", 2), "12");
    }

    #[test]
    fn test_decimal_side() {
        let e = "área de un cuadrado de lado 2,5";
        assert_eq!(expected(e, 1), "2,5 × 2,5");
        assert_eq!(expected(e, 2), "6.25");
    }

    #[test]
    fn test_no_figure_is_parse_failure() {
        assert!(GeometryEngine.compute_step("área de 5", 0, Cycle::C2).is_err());
    }

    #[test]
    fn test_canonical_round_trips() {
        let canonical = GeometryEngine
            .canonical_expression("¿Perímetro de un cuadrado de lado 7 cm?")
            .unwrap();
        assert_eq!(canonical, "perímetro cuadrado 7");
        assert_eq!(expected(&canonical, 2), "28");
    }
}
