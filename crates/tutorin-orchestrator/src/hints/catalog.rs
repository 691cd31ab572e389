//! Closed catalog of the `(topic, hint_type)` pairs hints are expected for.
//!
//! The check is advisory: a miss is logged and the hint is still produced.

use tutorin_steps::{StepTag, Topic};

const CATALOG: [(Topic, &[StepTag]); 10] = [
    (Topic::Suma, &[StepTag::AddCol, StepTag::AddCarry, StepTag::AddResultado]),
    (Topic::Resta, &[StepTag::SubCol, StepTag::SubResultado]),
    (
        Topic::Multiplicacion,
        &[StepTag::MultParcial, StepTag::MultSuma, StepTag::MultResultado],
    ),
    (
        Topic::Division,
        &[
            StepTag::DivGrupo,
            StepTag::DivQdigit,
            StepTag::DivResta,
            StepTag::DivBajar,
            StepTag::DivResultado,
        ],
    ),
    (
        Topic::Fracciones,
        &[
            StepTag::FracInicio,
            StepTag::FracMcm,
            StepTag::FracEquiv,
            StepTag::FracOperacion,
            StepTag::FracSimplificar,
            StepTag::FracResultado,
        ],
    ),
    (
        Topic::Decimales,
        &[
            StepTag::DecimalIdentificar,
            StepTag::DecimalAlinear,
            StepTag::DecimalOperar,
            StepTag::DecimalResultado,
            StepTag::DecimalFinal,
        ],
    ),
    (
        Topic::Geometria,
        &[
            StepTag::GeoFormula,
            StepTag::GeoSubstitute,
            StepTag::GeoCalc,
            StepTag::GeoResult,
            StepTag::GeoMissing,
        ],
    ),
    (
        Topic::Medidas,
        &[
            StepTag::MeasEstimate,
            StepTag::MeasFactor,
            StepTag::MeasCalc,
            StepTag::MeasResult,
            StepTag::MeasUnknown,
        ],
    ),
    (
        Topic::Porcentajes,
        &[
            StepTag::PercFrac,
            StepTag::PercMult,
            StepTag::PercSimplify,
            StepTag::PercResult,
        ],
    ),
    (
        Topic::Estadistica,
        &[
            StepTag::StatIntro,
            StepTag::StatFrac,
            StepTag::StatDecimal,
            StepTag::StatPercent,
            StepTag::StatResult,
        ],
    ),
];

fn listed(topic: Topic, tag: StepTag) -> bool {
    CATALOG
        .iter()
        .any(|(t, tags)| *t == topic && tags.contains(&tag))
}

/// Whether hints are expected for `tag` under `topic`.
///
/// Word problems run on another topic's engine, so they accept that topic's
/// tags too.
#[must_use]
pub fn is_cataloged(topic: Topic, tag: StepTag) -> bool {
    match topic {
        Topic::Problemas => tag == StepTag::ProblemUnknown || listed(tag.topic(), tag),
        _ => listed(topic, tag),
    }
}
