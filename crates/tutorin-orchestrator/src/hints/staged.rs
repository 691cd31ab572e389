//! Table-driven hints for the staged topics: decimals, geometry, measures,
//! percentages, statistics and unroutable word problems.
//!
//! The first three tiers are fixed texts per step. The last one states the
//! expected answer when the caller knows it.

use tutorin_steps::{StepTag, Topic};

use super::Tier;

/// Nudge, rule and worked example for one step.
type Lines = [&'static str; 3];

const STAGED: &[(StepTag, Lines)] = &[
    (
        StepTag::DecimalIdentificar,
        [
            "👉 Mira el signo que une los dos números.",
            "🧮 + es suma, − es resta, × es multiplicación y ÷ es división.",
            "💡 Ejemplo: en 2,5 + 1,4 el signo es +, así que es una suma.",
        ],
    ),
    (
        StepTag::DecimalAlinear,
        [
            "👉 Escribe un número debajo del otro con las comas en la misma columna.",
            "🧮 Unidades con unidades y décimas con décimas: las comas quedan alineadas.",
            "💡 Ejemplo: 12,5 sobre 3,25 se escribe 12,50 sobre 03,25.",
        ],
    ),
    (
        StepTag::DecimalOperar,
        [
            "👉 Quita la coma un momento y opera como si fueran números enteros.",
            "🧮 Iguala las cifras decimales con ceros, quita la coma y haz la cuenta normal.",
            "💡 Ejemplo: 2,5 + 1,25 pasa a 250 + 125 = 375.",
        ],
    ),
    (
        StepTag::DecimalResultado,
        [
            "👉 Vuelve a poner la coma en el resultado.",
            "🧮 Cuenta las cifras decimales: el resultado lleva la coma en el mismo sitio (en \
             la multiplicación, la suma de las cifras decimales de los dos).",
            "💡 Ejemplo: 2,1 × 1,3: 21 × 13 = 273 y con dos decimales queda 2,73.",
        ],
    ),
    (
        StepTag::GeoFormula,
        [
            "👉 Piensa en qué figura es y qué te piden: área o perímetro.",
            "🧮 Cada figura tiene su fórmula: cuadrado lado × lado, triángulo base × altura ÷ 2, \
             círculo π × radio².",
            "💡 Ejemplo: el área de un rectángulo es base × altura.",
        ],
    ),
    (
        StepTag::GeoSubstitute,
        [
            "👉 Cambia cada palabra de la fórmula por su número del enunciado.",
            "🧮 Respeta el orden de la fórmula: base con base, altura con altura.",
            "💡 Ejemplo: si base = 8 y altura = 5, el área del triángulo es 8 × 5 ÷ 2.",
        ],
    ),
    (
        StepTag::GeoCalc,
        [
            "👉 Haz la cuenta paso a paso.",
            "🧮 Primero lo que va entre paréntesis, luego multiplicaciones y divisiones.",
            "💡 Ejemplo: 2 × (4 + 3) = 2 × 7 = 14.",
        ],
    ),
    (
        StepTag::GeoMissing,
        [
            "👉 Revisa que el enunciado diga la figura y todas sus medidas.",
            "🧮 Un rectángulo necesita base y altura; un círculo, el radio.",
            "💡 Ejemplo: «Calcula el área de un rectángulo de base 6 y altura 4».",
        ],
    ),
    (
        StepTag::MeasEstimate,
        [
            "👉 Piensa si la unidad nueva es más grande o más pequeña.",
            "🧮 Si pasas a una unidad más pequeña caben más, y el número sale mayor.",
            "💡 Ejemplo: de kilómetros a metros el número se hace mayor.",
        ],
    ),
    (
        StepTag::MeasFactor,
        [
            "👉 Cuenta cuántos saltos hay en la tabla de unidades.",
            "🧮 Cada salto multiplica o divide por 10.",
            "💡 Ejemplo: 1 km = 1000 m, 1 m = 100 cm, 1 l = 1000 ml.",
        ],
    ),
    (
        StepTag::MeasCalc,
        [
            "👉 Multiplica o divide por el factor según hacia dónde vas.",
            "🧮 A una unidad más pequeña se multiplica; a una más grande se divide.",
            "💡 Ejemplo: 3 km son 3 × 1000 = 3000 m.",
        ],
    ),
    (
        StepTag::MeasUnknown,
        [
            "👉 Escribe la cantidad con su unidad de origen y la unidad a la que quieres pasar.",
            "🧮 Solo se pueden convertir unidades de la misma magnitud: longitud, masa o capacidad.",
            "💡 Ejemplo: «Convierte 3 km a m».",
        ],
    ),
    (
        StepTag::PercFrac,
        [
            "👉 Por ciento significa «de cada 100».",
            "🧮 Un porcentaje se escribe como fracción con denominador 100.",
            "💡 Ejemplo: 25% = 25/100.",
        ],
    ),
    (
        StepTag::PercMult,
        [
            "👉 Multiplica la cantidad por el número de arriba de la fracción.",
            "🧮 El p% de N es p × N / 100.",
            "💡 Ejemplo: 25% de 80 = 25 × 80 / 100 = 2000/100.",
        ],
    ),
    (
        StepTag::PercSimplify,
        [
            "👉 Divide entre 100.",
            "🧮 Dividir entre 100 es mover la coma dos lugares a la izquierda.",
            "💡 Ejemplo: 2000/100 = 20 y 80/100 = 0,8.",
        ],
    ),
    (
        StepTag::StatIntro,
        [
            "👉 Busca cuántos casos son favorables y cuántos hay en total.",
            "🧮 La probabilidad compara los casos favorables con el total.",
            "💡 Ejemplo: si 5 de 20 alumnos prefieren azul, favorables = 5 y total = 20.",
        ],
    ),
    (
        StepTag::StatFrac,
        [
            "👉 Pon los favorables arriba y el total abajo.",
            "🧮 La fracción es favorables / total.",
            "💡 Ejemplo: 5 de 20 se escribe 5/20.",
        ],
    ),
    (
        StepTag::StatDecimal,
        [
            "👉 Divide los favorables entre el total.",
            "🧮 El número de arriba entre el de abajo da el decimal.",
            "💡 Ejemplo: 5 ÷ 20 = 0,25.",
        ],
    ),
    (
        StepTag::StatPercent,
        [
            "👉 Multiplica el decimal por 100.",
            "🧮 Un porcentaje dice cuántos de cada 100.",
            "💡 Ejemplo: 0,25 × 100 = 25%.",
        ],
    ),
    (
        StepTag::ProblemUnknown,
        [
            "👉 Lee despacio el enunciado y subraya los datos.",
            "🧮 Busca palabras clave: «más» suma, «quedan» resta, «cada» multiplica, «reparte» \
             divide.",
            "💡 Ejemplo: «Ana tiene 12 caramelos y le dan 5 más» es 12 + 5.",
        ],
    ),
];

pub(super) fn hint(tag: StepTag, tier: Tier, expected: Option<&str>) -> Option<String> {
    let (_, lines) = STAGED.iter().find(|(t, _)| *t == tag)?;
    let text = match tier {
        Tier::Nudge => lines[0].to_string(),
        Tier::Rule => lines[1].to_string(),
        Tier::Example => lines[2].to_string(),
        Tier::Solution => expected.map_or_else(
            || fallback(tag.topic()).to_string(),
            |value| format!("✅ La respuesta de este paso es <b>{value}</b>."),
        ),
    };
    Some(text)
}

fn fallback(topic: Topic) -> &'static str {
    match topic {
        Topic::Decimales => "✅ Alinea las comas, opera sin ellas y vuelve a colocarla al final.",
        Topic::Geometria => "✅ Identifica la figura, escribe su fórmula, sustituye y calcula.",
        Topic::Medidas => "✅ Usa la tabla de unidades: cada salto es ×10 o ÷10.",
        Topic::Porcentajes => "✅ Pasa el porcentaje a fracción de 100, multiplica y divide.",
        Topic::Estadistica => "✅ Compara favorables con el total: fracción, decimal y porcentaje.",
        _ => "✅ Decide la operación, hazla con cuidado y comprueba si el resultado tiene sentido.",
    }
}
