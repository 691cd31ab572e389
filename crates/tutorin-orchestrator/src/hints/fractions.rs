//! Fraction hints.
//!
//! The two fractions are recovered from the cached operands, then from the
//! question, then from any rendered message in the transcript.

use num_traits::Zero;
use tutorin_steps::arithmetic::{
    format_fraction, fraction_pipeline, FractionExpr, FractionOp, FractionPipeline,
};
use tutorin_steps::{read_fractions, StepTag, Topic};

use super::{HintRequest, Tier};

pub(super) fn hint(tag: StepTag, tier: Tier, request: &HintRequest<'_>) -> Option<String> {
    let lines: fn(Tier, &FractionExpr, &FractionPipeline) -> String = match tag {
        StepTag::FracInicio => inicio,
        StepTag::FracMcm => mcm,
        StepTag::FracEquiv => equiv,
        StepTag::FracOperacion => operacion,
        StepTag::FracSimplificar => simplificar,
        _ => return None,
    };
    let text = recover(request)
        .filter(|expr| !expr.left_den.is_zero() && !expr.right_den.is_zero())
        .map_or_else(
            || generic(tier),
            |expr| lines(tier, &expr, &fraction_pipeline(&expr)),
        );
    Some(text)
}

fn recover(request: &HintRequest<'_>) -> Option<FractionExpr> {
    request
        .expression_for(Topic::Fracciones)
        .and_then(|expr| read_fractions(&expr))
        .or_else(|| read_fractions(request.context))
}

fn inicio(tier: Tier, e: &FractionExpr, p: &FractionPipeline) -> String {
    let (b, d) = (&e.left_den, &e.right_den);
    match tier {
        Tier::Nudge => format!("👉 Mira el número de abajo de cada fracción: {b} y {d}."),
        Tier::Rule => "🧮 Si los denominadores son iguales se opera directamente; si no, hay \
                       que buscar un denominador común."
            .to_string(),
        Tier::Example => {
            "💡 Ejemplo: en 1/5 + 2/5 los dos denominadores son 5, así que son iguales."
                .to_string()
        }
        Tier::Solution => {
            let answer = if p.same_denominator { "sí" } else { "no" };
            format!("✅ Los denominadores son {b} y {d}: la respuesta es <b>{answer}</b>.")
        }
    }
}

fn mcm(tier: Tier, e: &FractionExpr, p: &FractionPipeline) -> String {
    let (b, d) = (&e.left_den, &e.right_den);
    match tier {
        Tier::Nudge => {
            format!("👉 Busca el número más pequeño que esté en la tabla del {b} y en la del {d}.")
        }
        Tier::Rule => "🧮 El m.c.m. es el menor múltiplo común: escribe varios múltiplos de \
                       cada denominador y busca el primero que se repite."
            .to_string(),
        Tier::Example => "💡 Ejemplo: múltiplos de 4: 4, 8, 12, 16; múltiplos de 6: 6, 12, 18. \
                          El m.c.m.(4, 6) es 12."
            .to_string(),
        Tier::Solution => format!("✅ El m.c.m.({b}, {d}) es <b>{}</b>.", p.lcm),
    }
}

fn equiv(tier: Tier, e: &FractionExpr, p: &FractionPipeline) -> String {
    let (b, d, lcm) = (&e.left_den, &e.right_den, &p.lcm);
    match tier {
        Tier::Nudge => format!(
            "👉 ¿Por cuánto multiplicas {b} para llegar a {lcm}? Multiplica el numerador por lo \
             mismo. Haz igual con {d}."
        ),
        Tier::Rule => format!(
            "🧮 Para no cambiar el valor, multiplica arriba y abajo por el mismo número: ×{} en \
             la primera fracción y ×{} en la segunda.",
            p.left_factor, p.right_factor
        ),
        Tier::Example => {
            "💡 Ejemplo: 1/2 = 3/6 porque multiplicamos arriba y abajo por 3.".to_string()
        }
        Tier::Solution => format!(
            "✅ {} × {} = {} y {} × {} = {}: escribe <b>{} y {}</b>.",
            e.left_num,
            p.left_factor,
            p.left_scaled,
            e.right_num,
            p.right_factor,
            p.right_scaled,
            p.left_scaled,
            p.right_scaled
        ),
    }
}

fn operacion(tier: Tier, e: &FractionExpr, p: &FractionPipeline) -> String {
    let symbol = e.op.symbol();
    let verb = match e.op {
        FractionOp::Add => "suman",
        FractionOp::Sub => "restan",
    };
    match tier {
        Tier::Nudge => format!("👉 Con el mismo denominador, solo se {verb} los numeradores."),
        Tier::Rule => format!(
            "🧮 El denominador {} no cambia: calcula {} {symbol} {} y escríbelo encima.",
            p.lcm, p.left_scaled, p.right_scaled
        ),
        Tier::Example => "💡 Ejemplo: 3/6 + 2/6 = 5/6.".to_string(),
        Tier::Solution => format!(
            "✅ {} {symbol} {} = {}: la fracción es <b>{}/{}</b>.",
            p.left_scaled, p.right_scaled, p.combined, p.combined, p.lcm
        ),
    }
}

fn simplificar(tier: Tier, _e: &FractionExpr, p: &FractionPipeline) -> String {
    let (n, d) = (&p.combined, &p.lcm);
    match tier {
        Tier::Nudge => format!("👉 Busca un número que divida a la vez a {n} y a {d}."),
        Tier::Rule => "🧮 Divide numerador y denominador por su máximo común divisor. Si es 1, \
                       la fracción ya está simplificada."
            .to_string(),
        Tier::Example => "💡 Ejemplo: en 6/8 el m.c.d. es 2, así que queda 3/4.".to_string(),
        Tier::Solution => format!(
            "✅ m.c.d.({n}, {d}) = {}: la fracción simplificada es <b>{}</b>.",
            p.gcd,
            format_fraction(&p.simplified)
        ),
    }
}

fn generic(tier: Tier) -> String {
    match tier {
        Tier::Nudge => "👉 Fíjate primero en los denominadores de las dos fracciones.",
        Tier::Rule => "🧮 Para sumar o restar fracciones necesitas el mismo denominador.",
        Tier::Example => "💡 Ejemplo: 1/2 + 1/3 = 3/6 + 2/6 = 5/6.",
        Tier::Solution => "✅ Busca el m.c.m., pasa las dos fracciones a ese denominador, opera \
                           los numeradores y simplifica.",
    }
    .to_string()
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::super::tests::request;
    use super::super::HintKey;
    use super::*;

    fn at(tag: StepTag, errors: u8, question: &str) -> String {
        let req = request(Topic::Fracciones, HintKey::Tag(tag), 0, errors, question);
        hint(tag, Tier::from_errors(errors), &req).unwrap()
    }

    #[test]
    fn test_stage_solutions() {
        let q = "2/3 + 1/4";
        assert!(at(StepTag::FracInicio, 4, q).contains("<b>no</b>"));
        assert_eq!(at(StepTag::FracMcm, 4, q), "✅ El m.c.m.(3, 4) es <b>12</b>.");
        assert!(at(StepTag::FracEquiv, 4, q).contains("<b>8 y 3</b>"));
        assert!(at(StepTag::FracOperacion, 4, q).contains("<b>11/12</b>"));
        assert!(at(StepTag::FracSimplificar, 4, q).contains("<b>11/12</b>"));
    }

    #[test]
    fn test_operands_from_cached_state() {
        let req = HintRequest {
            operands: Some("2/3+1/4"),
            ..request(Topic::Fracciones, HintKey::Tag(StepTag::FracMcm), 1, 1, "sigue")
        };
        let text = hint(StepTag::FracMcm, Tier::Nudge, &req).unwrap();
        assert!(text.contains("tabla del 3") && text.contains("del 4"), "{text}");
    }

    #[test]
    fn test_operands_from_context() {
        let req = HintRequest {
            context: "👉 Vamos a sumar 1/2 + 1/6. ¿Tienen el mismo denominador? (sí/no)",
            ..request(Topic::Fracciones, HintKey::Tag(StepTag::FracMcm), 1, 4, "sigue")
        };
        let text = hint(StepTag::FracMcm, Tier::Solution, &req).unwrap();
        assert_eq!(text, "✅ El m.c.m.(2, 6) es <b>6</b>.");
    }

    #[test]
    fn test_generic_without_operands() {
        assert!(at(StepTag::FracMcm, 2, "no hay fracciones").starts_with("🧮"));
    }
}
