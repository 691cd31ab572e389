//! Hints for column addition, subtraction and long multiplication.
//!
//! The operands are recovered from the cached expression or the question,
//! so the hint can name the exact column. Worked examples use the units
//! column, or fixed numbers when the units column is the one being asked.

use num_bigint::BigUint;
use tutorin_steps::arithmetic::{
    column_addition, column_subtraction, partial_products, AddColumn, PartialProduct, SubColumn,
};
use tutorin_steps::engines::place_name;
use tutorin_steps::StepTag;

use super::{HintRequest, Tier};

pub(super) fn hint(tag: StepTag, tier: Tier, request: &HintRequest<'_>) -> Option<String> {
    let text = match tag {
        StepTag::AddCol | StepTag::AddCarry => {
            let Some((a, b)) = operands(tag, request, '+') else {
                return Some(generic(tag, tier));
            };
            addition(tag, tier, request.step, &a, &b)
        }
        StepTag::SubCol => {
            let Some((a, b)) = operands(tag, request, '-') else {
                return Some(generic(tag, tier));
            };
            subtraction(tier, request.step, &a, &b)
        }
        StepTag::MultParcial | StepTag::MultSuma => {
            let Some((a, b)) = operands(tag, request, '×') else {
                return Some(generic(tag, tier));
            };
            multiplication(tag, tier, request.step, &a, &b)
        }
        _ => return None,
    };
    Some(text.unwrap_or_else(|| generic(tag, tier)))
}

fn operands(tag: StepTag, request: &HintRequest<'_>, symbol: char) -> Option<(BigUint, BigUint)> {
    let expression = request.expression_for(tag.topic())?;
    let (a, b) = expression.split_once(symbol)?;
    Some((a.trim().parse().ok()?, b.trim().parse().ok()?))
}

// ============================================================================
// Addition
// ============================================================================

fn addition(tag: StepTag, tier: Tier, step: usize, a: &BigUint, b: &BigUint) -> Option<String> {
    let add = column_addition(a, b);
    if tag == StepTag::AddCarry {
        return Some(match tier {
            Tier::Nudge => "👉 Ya no quedan columnas, pero te sobra una llevada. \
                            ¿Qué escribes a la izquierda del todo?"
                .to_string(),
            Tier::Rule => "🧮 La llevada de la última columna no se pierde: se escribe \
                           delante del resultado."
                .to_string(),
            Tier::Example => "💡 En 95 + 17 la última columna es 9 + 1 + 1 = 11: escribes 1 \
                              y la llevada 1 va delante, 112."
                .to_string(),
            Tier::Solution => format!(
                "✅ Escribe <b>{}</b> a la izquierda: {a} + {b} = <b>{}</b>.",
                add.final_carry,
                add.result()
            ),
        });
    }

    let col = add.columns.get(step)?;
    let place = place_name(step);
    let carry = if col.carry_in > 0 {
        " y la llevada"
    } else {
        ""
    };
    Some(match tier {
        Tier::Nudge => format!(
            "👉 Fíjate en la columna de las <b>{place}</b>: suma las dos cifras{carry}. \
             ¿Qué cifra escribes?"
        ),
        Tier::Rule => "🧮 Recuerda: si la suma de una columna es 10 o más, escribes solo la \
                       cifra de las unidades y llevas 1 a la columna de la izquierda."
            .to_string(),
        Tier::Example => match add.columns.first().filter(|_| step > 0) {
            Some(units) => format!(
                "💡 Mira cómo se hizo en las unidades: {}. Haz lo mismo en las {place}.",
                explain_add(units)
            ),
            None => "💡 Ejemplo: en 27 + 15, las unidades son 7 + 5 = 12: escribes 2 y \
                     llevas 1 a las decenas."
                .to_string(),
        },
        Tier::Solution => format!(
            "✅ En las {place}: {} = {}, así que escribes <b>{}</b>.",
            add_terms(col),
            col.total(),
            col.digit
        ),
    })
}

fn add_terms(col: &AddColumn) -> String {
    if col.carry_in > 0 {
        format!("{} + {} + {}", col.top, col.bottom, col.carry_in)
    } else {
        format!("{} + {}", col.top, col.bottom)
    }
}

fn explain_add(col: &AddColumn) -> String {
    let carry = if col.carry_out > 0 {
        format!(" y llevas {}", col.carry_out)
    } else {
        String::new()
    };
    format!("{} = {}, escribes {}{carry}", add_terms(col), col.total(), col.digit)
}

// ============================================================================
// Subtraction
// ============================================================================

fn subtraction(tier: Tier, step: usize, a: &BigUint, b: &BigUint) -> Option<String> {
    let sub = column_subtraction(a, b);
    let col = sub.columns.get(step)?;
    let place = place_name(step);
    let lent = if col.borrow_in > 0 {
        ", sin olvidar que esta columna prestó 1"
    } else {
        ""
    };
    Some(match tier {
        Tier::Nudge => format!(
            "👉 Columna de las <b>{place}</b>: a la cifra de arriba quítale la de abajo{lent}. \
             Si no alcanza, pide prestada una decena."
        ),
        Tier::Rule => "🧮 Pedir prestado: la cifra de arriba vale 10 más y la columna de la \
                       izquierda pierde 1."
            .to_string(),
        Tier::Example => match sub.columns.first().filter(|_| step > 0) {
            Some(units) => format!(
                "💡 Mira las unidades: {}. Haz lo mismo en las {place}.",
                explain_sub(units)
            ),
            None => "💡 Ejemplo: en 42 − 17, como 2 es menor que 7 pedimos prestado: \
                     12 − 7 = 5."
                .to_string(),
        },
        Tier::Solution => format!(
            "✅ En las {place}: {}, así que escribes <b>{}</b>.",
            explain_sub(col),
            col.digit
        ),
    })
}

fn explain_sub(col: &SubColumn) -> String {
    let top = i32::from(col.top) - i32::from(col.borrow_in);
    let shown = if col.borrow_in > 0 {
        format!("{} − 1 = {top}", col.top)
    } else {
        col.top.to_string()
    };
    if col.borrowed {
        format!(
            "{shown}, que es menor que {}: pedimos prestado, {} − {} = {}",
            col.bottom,
            top + 10,
            col.bottom,
            col.digit
        )
    } else if col.borrow_in > 0 {
        format!("{shown}; {top} − {} = {}", col.bottom, col.digit)
    } else {
        format!("{shown} − {} = {}", col.bottom, col.digit)
    }
}

// ============================================================================
// Multiplication
// ============================================================================

fn multiplication(
    tag: StepTag,
    tier: Tier,
    step: usize,
    a: &BigUint,
    b: &BigUint,
) -> Option<String> {
    let partials = partial_products(a, b);
    if tag == StepTag::MultSuma {
        let lines = partials
            .iter()
            .map(|p| p.value.to_string())
            .collect::<Vec<_>>()
            .join(" + ");
        return Some(match tier {
            Tier::Nudge => "👉 Ahora suma todas las líneas parciales, alineadas por la derecha."
                .to_string(),
            Tier::Rule => "🧮 Suma en vertical columna a columna, de derecha a izquierda, \
                           llevando cuando una columna pase de 9."
                .to_string(),
            Tier::Example => format!("💡 Tienes que sumar {lines}. Empieza por las unidades."),
            Tier::Solution => format!("✅ {lines} = <b>{}</b>.", a * b),
        });
    }

    let partial = partials.get(step)?;
    let place = place_name(partial.position);
    let digit = partial.digit;
    Some(match tier {
        Tier::Nudge => format!(
            "👉 Multiplica {a} por {digit}, la cifra de las <b>{place}</b> de {b}, \
             empezando por la derecha."
        ),
        Tier::Rule => format!(
            "🧮 Multiplica cifra a cifra de derecha a izquierda y suma lo que llevas. {}",
            shift_note(partial)
        ),
        Tier::Example => match partials.first().filter(|_| step > 0) {
            Some(first) => format!(
                "💡 Así se hizo la primera línea: {} Ahora haz lo mismo con el {digit}.",
                explain_mult(a, first.digit)
            ),
            None => "💡 Ejemplo: 23 × 4: 3 × 4 = 12, escribes 2 y llevas 1; \
                     2 × 4 + 1 = 9. Resultado: 92."
                .to_string(),
        },
        Tier::Solution => format!(
            "✅ {a} × {digit} = {}. {} La línea parcial es <b>{}</b>.",
            a * BigUint::from(digit),
            shift_note(partial),
            partial.value
        ),
    })
}

fn shift_note(partial: &PartialProduct) -> String {
    match partial.position {
        0 => "En la primera línea no hace falta añadir ceros.".to_string(),
        1 => "Como es la cifra de las decenas, añade un 0 al final.".to_string(),
        n => format!("Como es la cifra de las {}, añade {n} ceros al final.", place_name(n)),
    }
}

/// `a × digit` spelled out digit by digit with the carries.
fn explain_mult(a: &BigUint, digit: u8) -> String {
    let mut carry = 0u32;
    let mut steps = Vec::new();
    for ch in a.to_str_radix(10).chars().rev() {
        let d = ch.to_digit(10).unwrap_or(0);
        let subtotal = d * u32::from(digit) + carry;
        let plus = if carry > 0 {
            format!(" + {carry}")
        } else {
            String::new()
        };
        carry = subtotal / 10;
        let carried = if carry > 0 {
            format!(" y llevas {carry}")
        } else {
            String::new()
        };
        steps.push(format!(
            "{d} × {digit}{plus} = {subtotal}, escribes {}{carried}",
            subtotal % 10
        ));
    }
    let mut text = steps.join("; ");
    if carry > 0 {
        text.push_str(&format!("; al final escribes {carry} a la izquierda"));
    }
    text.push('.');
    text
}

// ============================================================================
// Without operands
// ============================================================================

fn generic(tag: StepTag, tier: Tier) -> String {
    let lines: [&str; 4] = match tag {
        StepTag::SubCol => [
            "👉 Resta la cifra de abajo de la de arriba. Si la de arriba es menor, pide \
             prestada 1 de la izquierda.",
            "🧮 Si pediste prestado, la cifra de arriba vale 10 más y la siguiente columna 1 menos.",
            "💡 Ejemplo: en 42 − 17, 12 − 7 = 5 en las unidades y 3 − 1 = 2 en las decenas.",
            "✅ Revisa cada columna de derecha a izquierda y escribe la diferencia.",
        ],
        StepTag::MultParcial | StepTag::MultSuma => [
            "👉 Multiplica el número de arriba por cada cifra del de abajo, empezando por las \
             unidades.",
            "🧮 Cada línea parcial se desplaza un lugar a la izquierda: añade un cero por posición.",
            "💡 Ejemplo: 23 × 14 = 92 + 230 = 322.",
            "✅ Escribe las líneas parciales y súmalas en vertical.",
        ],
        _ => [
            "👉 Empieza por la columna de las unidades y suma las dos cifras.",
            "🧮 Si una columna suma 10 o más, escribe la unidad y lleva 1.",
            "💡 Ejemplo: en 27 + 15, 7 + 5 = 12: escribes 2 y llevas 1.",
            "✅ Suma columna a columna de derecha a izquierda sin olvidar las llevadas.",
        ],
    };
    let index = match tier {
        Tier::Nudge => 0,
        Tier::Rule => 1,
        Tier::Example => 2,
        Tier::Solution => 3,
    };
    lines[index].to_string()
}
