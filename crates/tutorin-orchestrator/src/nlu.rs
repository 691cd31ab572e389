//! Keyword/regex classifier that maps a statement to a topic engine.
//!
//! Direct regex rules win (confidence 0.95). When none match, keyword labels
//! are tried in a fixed order (confidence 0.75). Anything else is unknown.

use once_cell::sync::Lazy;
use regex::Regex;
use serde::{Deserialize, Serialize};
use tutorin_steps::Topic;

/// Subject reported for every recognized statement.
pub const SUBJECT: &str = "matematicas";

const RULE_CONFIDENCE: f64 = 0.95;
const KEYWORD_CONFIDENCE: f64 = 0.75;
const UNKNOWN_CONFIDENCE: f64 = 0.3;

/// Result of classifying a statement.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Nlu {
    /// Subject area, `"matematicas"` or `"general"`.
    pub subject: String,
    /// Topic wire name, `"vacío"` or `"desconocido"`.
    pub intent: String,
    /// Engine name, `None` when no engine applies.
    pub engine: Option<String>,
    /// How sure the classifier is.
    pub confidence: f64,
}

impl Nlu {
    fn recognized(topic: Topic, confidence: f64) -> Self {
        Self {
            subject: SUBJECT.to_string(),
            intent: topic.as_str().to_string(),
            engine: Some(topic.engine_name().to_string()),
            confidence,
        }
    }

    fn general(intent: &str, confidence: f64) -> Self {
        Self {
            subject: "general".to_string(),
            intent: intent.to_string(),
            engine: None,
            confidence,
        }
    }

    /// The topic whose engine should handle the statement.
    #[must_use]
    pub fn topic(&self) -> Option<Topic> {
        self.engine.as_deref().and_then(Topic::from_name)
    }
}

const OPERATORS: &str = r"[+\-×x*·/:÷]";

/// Ordered direct rules. Decimals come before the integer operations so
/// `2,5 + 1,25` is not read as a sum of integers.
static RULES: Lazy<Vec<(Option<Regex>, Topic)>> = Lazy::new(|| {
    let decimal = format!(
        r"\d+[.,]\d+\s*{OPERATORS}\s*\d+(?:[.,]\d+)?|\d+\s*{OPERATORS}\s*\d+[.,]\d+"
    );
    [
        (
            r"\d+\s*/\s*\d+\s*[+\-]\s*\d+(?:\s*/\s*\d+)?".to_string(),
            Topic::Fracciones,
        ),
        (decimal, Topic::Decimales),
        (r"\d+(?:[.,]\d+)?\s*%".to_string(), Topic::Porcentajes),
        (r"\d+\s*[÷:/]\s*\d+".to_string(), Topic::Division),
        (r"\d+\s*[×x*·]\s*\d+".to_string(), Topic::Multiplicacion),
        (r"\d+\s*\+\s*\d+".to_string(), Topic::Suma),
        (r"\d+\s*[-−]\s*\d+".to_string(), Topic::Resta),
    ]
    .into_iter()
    .map(|(pattern, topic)| (Regex::new(&pattern).ok(), topic))
    .collect()
});

/// Keyword labels in the order they are tried.
const LABELS: [(Topic, &[&str]); 6] = [
    (
        Topic::Geometria,
        &[
            "geometria", "geometría", "área", "area", "perímetro", "perimetro", "cuadrado",
            "rectángulo", "rectangulo", "triángulo", "triangulo", "círculo", "circulo", "radio",
        ],
    ),
    (
        Topic::Medidas,
        &[
            "medidas", "convierte", "convertir", "pasar", "km", "cm", "mm", "kg", "mg", "dl",
            "cl", "ml", "metro", "metros", "litro", "litros", "decilitros", "centilitros",
            "mililitros", "gramo", "gramos", "miligramos", "kilo", "kilos", "kilogramos",
            "kilómetros", "kilometros", "centímetros", "centimetros", "milímetros",
            "milimetros",
        ],
    ),
    (
        Topic::Estadistica,
        &[
            "estadistica", "estadística", "probabilidad", "frecuencia", "encuesta", "dado",
            "moneda",
        ],
    ),
    (Topic::Porcentajes, &["porcentajes", "porcentaje", "por ciento"]),
    (
        Topic::Fracciones,
        &["fracciones", "fracción", "fraccion", "numerador", "denominador"],
    ),
    (
        Topic::Problemas,
        &[
            "problemas", "problema", "cuántos", "cuantos", "cuántas", "cuantas", "más",
            "menos", "diferencia", "suma", "sumar", "resta", "restar", "quita", "multiplica",
            "multiplicar", "veces", "producto", "divide", "dividir", "entre", "reparte",
            "repartir", "tiene", "tenía", "le dan", "regala", "regalé", "quedan", "en total",
        ],
    ),
];

/// Unit symbols and names accepted in a `<amount> <unit> a <unit>` conversion.
const UNITS: &[&str] = &[
    "km", "m", "cm", "mm", "kg", "g", "mg", "l", "dl", "cl", "ml", "kilómetros", "kilometros",
    "metros", "centímetros", "centimetros", "milímetros", "milimetros", "kilos", "kilogramos",
    "gramos", "miligramos", "litros", "decilitros", "centilitros", "mililitros",
];

/// `4 l a dl`, `500 mg en g`: single-letter units only count next to an
/// amount and a target unit.
static CONVERSION: Lazy<Option<Regex>> = Lazy::new(|| {
    let units = UNITS
        .iter()
        .map(|u| regex::escape(u))
        .collect::<Vec<_>>()
        .join("|");
    Regex::new(&format!(
        r"\d+(?:[.,]\d+)?\s*(?:{units})\s+(?:a|en)\s+(?:{units})\b"
    ))
    .ok()
});

static LABEL_PATTERNS: Lazy<Vec<(Option<Regex>, Topic)>> = Lazy::new(|| {
    LABELS
        .iter()
        .map(|(topic, words)| {
            let alternation = words
                .iter()
                .map(|w| regex::escape(w))
                .collect::<Vec<_>>()
                .join("|");
            (Regex::new(&format!(r"\b(?:{alternation})\b")).ok(), *topic)
        })
        .collect()
});

fn first_match(patterns: &[(Option<Regex>, Topic)], text: &str) -> Option<Topic> {
    patterns
        .iter()
        .find(|(re, _)| re.as_ref().is_some_and(|re| re.is_match(text)))
        .map(|(_, topic)| *topic)
}

/// Classifies a free-text statement.
#[must_use]
pub fn classify(text: &str) -> Nlu {
    let text = text.trim().to_lowercase();
    if text.is_empty() {
        return Nlu::general("vacío", 0.0);
    }
    if let Some(topic) = first_match(&RULES, &text) {
        return Nlu::recognized(topic, RULE_CONFIDENCE);
    }
    if CONVERSION.as_ref().is_some_and(|re| re.is_match(&text)) {
        return Nlu::recognized(Topic::Medidas, KEYWORD_CONFIDENCE);
    }
    if let Some(topic) = first_match(&LABEL_PATTERNS, &text) {
        return Nlu::recognized(topic, KEYWORD_CONFIDENCE);
    }
    Nlu::general("desconocido", UNKNOWN_CONFIDENCE)
}
