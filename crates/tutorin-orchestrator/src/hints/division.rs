//! Long division hints, aware of the current group and divisor.

use num_bigint::BigUint;
use tutorin_steps::arithmetic::{long_division, DivisionBlock, DivisionPosition, LongDivision};
use tutorin_steps::{StepTag, Topic};

use super::{HintRequest, Tier};

pub(super) fn hint(tag: StepTag, tier: Tier, request: &HintRequest<'_>) -> Option<String> {
    if !matches!(
        tag,
        StepTag::DivGrupo | StepTag::DivQdigit | StepTag::DivResta | StepTag::DivBajar
    ) {
        return None;
    }
    let Some(div) = operands(request).and_then(|(a, b)| long_division(&a, &b)) else {
        return Some(generic(tier));
    };
    let text = match div.locate(request.step) {
        DivisionPosition::FirstGroup => Some(first_group(tier, &div)),
        DivisionPosition::Block { block, sub } => div.blocks.get(block).and_then(|b| match sub {
            0 => Some(quotient_digit(tier, &div.divisor, b)),
            1 => Some(remainder(tier, &div.divisor, b)),
            _ => bring_down(tier, b),
        }),
        DivisionPosition::Finished => None,
    };
    Some(text.unwrap_or_else(|| generic(tier)))
}

fn operands(request: &HintRequest<'_>) -> Option<(BigUint, BigUint)> {
    let expression = request.expression_for(Topic::Division)?;
    let (a, b) = expression.split_once('÷')?;
    Some((a.parse().ok()?, b.parse().ok()?))
}

fn first_group(tier: Tier, div: &LongDivision) -> String {
    let (dividend, divisor) = (&div.dividend, &div.divisor);
    match tier {
        Tier::Nudge => format!(
            "👉 Toma cifras de {dividend} por la izquierda hasta formar un número mayor o \
             igual que {divisor}."
        ),
        Tier::Rule => format!(
            "🧮 El primer grupo es el número más pequeño, empezando por la izquierda, en el \
             que cabe {divisor} al menos una vez."
        ),
        Tier::Example => {
            "💡 Ejemplo: en 156 ÷ 7, el 1 es menor que 7, así que tomamos 15.".to_string()
        }
        Tier::Solution => format!("✅ El primer grupo es <b>{}</b>.", div.first_group()),
    }
}

fn quotient_digit(tier: Tier, divisor: &BigUint, block: &DivisionBlock) -> String {
    let group = &block.group;
    let q = block.quotient_digit;
    match tier {
        Tier::Nudge => format!("👉 ¿Cuántas veces cabe {divisor} en {group}?"),
        Tier::Rule => format!(
            "🧮 Repasa la tabla del {divisor}: busca el número más grande que, multiplicado \
             por {divisor}, no pase de {group}."
        ),
        Tier::Example => "💡 Ejemplo: en 15 ÷ 7, 7 × 2 = 14 cabe y 7 × 3 = 21 se pasa, así que \
                          la cifra es 2."
            .to_string(),
        Tier::Solution => {
            let next = divisor * BigUint::from(q + 1);
            format!(
                "✅ {divisor} × {q} = {} cabe en {group} y {divisor} × {} = {next} se pasa: \
                 la cifra del cociente es <b>{q}</b>.",
                block.product,
                q + 1
            )
        }
    }
}

fn remainder(tier: Tier, divisor: &BigUint, block: &DivisionBlock) -> String {
    let group = &block.group;
    match tier {
        Tier::Nudge => format!(
            "👉 Multiplica {} por {divisor} y réstalo de {group}.",
            block.quotient_digit
        ),
        Tier::Rule => format!(
            "🧮 El resto siempre tiene que ser menor que {divisor}. Si te sale mayor, revisa la \
             cifra del cociente."
        ),
        Tier::Example => "💡 Ejemplo: en 15 ÷ 7 con cociente 2: 15 − 14 = 1.".to_string(),
        Tier::Solution => format!(
            "✅ {group} − {} = <b>{}</b>.",
            block.product, block.remainder
        ),
    }
}

fn bring_down(tier: Tier, block: &DivisionBlock) -> Option<String> {
    let next = block.bring_down.as_ref()?;
    let rest = &block.remainder;
    Some(match tier {
        Tier::Nudge => format!(
            "👉 Baja la siguiente cifra del dividendo y ponla a la derecha del resto {rest}."
        ),
        Tier::Rule => "🧮 El nuevo grupo es el resto por 10 más la cifra que bajas.".to_string(),
        Tier::Example => {
            "💡 Ejemplo: si el resto es 1 y bajas un 6, el nuevo grupo es 16.".to_string()
        }
        Tier::Solution => format!(
            "✅ {rest} × 10 + {} = <b>{}</b>.",
            next.digit, next.new_group
        ),
    })
}

fn generic(tier: Tier) -> String {
    match tier {
        Tier::Nudge => "👉 Mira cuántas veces cabe el divisor en el grupo que tienes.",
        Tier::Rule => "🧮 En cada bloque: cifra del cociente, multiplicar, restar y bajar la \
                       siguiente cifra.",
        Tier::Example => "💡 Ejemplo: 84 ÷ 4: 8 ÷ 4 = 2, resto 0; bajas el 4, 4 ÷ 4 = 1. \
                          Cociente 21.",
        Tier::Solution => "✅ Revisa cada bloque: el resto siempre debe ser menor que el divisor.",
    }
    .to_string()
}
