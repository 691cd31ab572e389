//! Arithmetic and engine properties checked over a spread of operands.
//!
//! Operands come from a fixed pseudo-random sequence plus hand-picked edge
//! cases, so every run checks the same values.

use num_bigint::{BigInt, BigUint};
use num_rational::BigRational;
use tutorin_steps::arithmetic::{
    column_addition, column_subtraction, fraction_pipeline, long_division,
    order_for_subtraction, partial_products, FractionExpr, FractionOp,
};
use tutorin_steps::{engine_for, Cycle, StepStatus, Topic};

/// Edge cases plus a deterministic spread of magnitudes.
fn operands() -> Vec<u64> {
    let mut values = vec![0, 1, 9, 10, 99, 100, 101, 999, 1000, 9999, 32458, 6541, 999_999];
    let mut state: u64 = 0x2545_F491_4F6C_DD1D;
    for i in 0..40 {
        state ^= state << 13;
        state ^= state >> 7;
        state ^= state << 17;
        values.push(state % 10u64.pow(1 + i % 9));
    }
    values
}

fn big(n: u64) -> BigUint {
    BigUint::from(n)
}

// ============================================================================
// Column algorithms
// ============================================================================

#[test]
fn test_addition_columns_reconstruct_sum() {
    for &a in &operands() {
        for &b in &operands() {
            let add = column_addition(&big(a), &big(b));
            assert_eq!(add.result(), big(a) + big(b), "{a} + {b}");

            for pair in add.columns.windows(2) {
                assert_eq!(pair[0].carry_out, pair[1].carry_in);
            }
            for col in &add.columns {
                assert_eq!(col.total(), col.digit + 10 * col.carry_out);
            }
        }
    }
}

#[test]
fn test_subtraction_columns_reconstruct_difference() {
    for &a in &operands() {
        for &b in &operands() {
            let (minuend, subtrahend) = order_for_subtraction(big(a), big(b));
            assert!(minuend >= subtrahend);
            let sub = column_subtraction(&minuend, &subtrahend);
            assert_eq!(sub.result(), &minuend - &subtrahend, "{a} - {b}");
        }
    }
}

#[test]
fn test_partial_products_sum_to_product() {
    for &a in &operands() {
        for &b in &operands() {
            let total: BigUint = partial_products(&big(a), &big(b))
                .into_iter()
                .map(|line| line.value)
                .sum();
            assert_eq!(total, big(a) * big(b), "{a} × {b}");
        }
    }
}

#[test]
fn test_long_division_reconstructs_dividend() {
    for &dividend in &operands() {
        for &divisor in operands().iter().filter(|d| **d > 0) {
            let div = long_division(&big(dividend), &big(divisor)).unwrap();
            assert_eq!(
                div.quotient() * big(divisor) + div.remainder(),
                big(dividend),
                "{dividend} ÷ {divisor}"
            );
            for block in &div.blocks {
                assert!(block.remainder < big(divisor));
                assert!(block.quotient_digit <= 9);
            }
        }
        assert!(long_division(&big(dividend), &big(0)).is_none());
    }
}

#[test]
fn test_fraction_pipeline_matches_exact_value() {
    let small: Vec<i64> = vec![1, 2, 3, 4, 5, 6, 7, 8, 9, 10, 12, 15, 16, 24];
    for &a in &small {
        for &b in &small {
            for (c, d) in [(1, 4), (5, 6), (7, 12), (3, 9), (11, 15)] {
                for op in [FractionOp::Add, FractionOp::Sub] {
                    let expr = FractionExpr {
                        left_num: BigInt::from(a),
                        left_den: BigInt::from(b),
                        op,
                        right_num: BigInt::from(c),
                        right_den: BigInt::from(d),
                    };
                    let pipeline = fraction_pipeline(&expr);
                    assert_eq!(pipeline.simplified, expr.exact(), "{a}/{b} {op:?} {c}/{d}");

                    let cross_left = pipeline.simplified.numer() * &pipeline.lcm;
                    let cross_right = &pipeline.combined * pipeline.simplified.denom();
                    assert_eq!(cross_left, cross_right);
                    assert_eq!(
                        BigRational::new(pipeline.combined.clone(), pipeline.lcm.clone()),
                        pipeline.simplified
                    );
                }
            }
        }
    }
}

// ============================================================================
// Engines
// ============================================================================

const STATEMENTS: [(Topic, &str); 11] = [
    (Topic::Suma, "32458 + 6541"),
    (Topic::Resta, "503 - 278"),
    (Topic::Multiplicacion, "123 × 45"),
    (Topic::Division, "3457 / 3"),
    (Topic::Fracciones, "2/3 + 1/4"),
    (Topic::Decimales, "2,5 + 1,25"),
    (Topic::Geometria, "Calcula el área de un rectángulo de base 5 y altura 3"),
    (Topic::Medidas, "Convierte 3 km a m"),
    (Topic::Porcentajes, "25% de 80"),
    (Topic::Estadistica, "Probabilidad de sacar 2 caras favorables entre 3 casos"),
    (Topic::Problemas, "Ana tiene 12 caramelos y le dan 5 más"),
];

#[test]
fn test_engines_are_idempotent() {
    for (topic, statement) in STATEMENTS {
        let engine = engine_for(topic);
        for cycle in [Cycle::C1, Cycle::C2, Cycle::C3] {
            for step in 0..25 {
                let first = engine.compute_step(statement, step, cycle).unwrap();
                let second = engine.compute_step(statement, step, cycle).unwrap();
                assert_eq!(first, second, "{topic} step {step}");
                assert_eq!(first.next_step, step + 1);
            }
        }
    }
}

#[test]
fn test_done_is_absorbing() {
    for (topic, statement) in STATEMENTS {
        let engine = engine_for(topic);
        let done_at = (0..50)
            .find(|&step| {
                engine.compute_step(statement, step, Cycle::C2).unwrap().status == StepStatus::Done
            })
            .unwrap_or_else(|| panic!("{topic} never finishes"));

        let done = engine.compute_step(statement, done_at, Cycle::C2).unwrap();
        for later in done_at + 1..done_at + 5 {
            let again = engine.compute_step(statement, later, Cycle::C2).unwrap();
            assert_eq!(again.status, StepStatus::Done, "{topic}");
            assert_eq!(again.message, done.message, "{topic}");
            assert_eq!(again.hint_type, done.hint_type, "{topic}");
        }
        for earlier in 0..done_at {
            let step = engine.compute_step(statement, earlier, Cycle::C2).unwrap();
            assert_eq!(step.status, StepStatus::Ask, "{topic} step {earlier}");
            assert!(step.expected_answer.is_some());
        }
    }
}

#[test]
fn test_canonical_expression_is_accepted_by_engine() {
    for (topic, statement) in STATEMENTS {
        let engine = engine_for(topic);
        let canonical = engine.canonical_expression(statement).unwrap();
        assert_eq!(engine.canonical_expression(&canonical).as_deref(), Some(canonical.as_str()));
        for step in 0..6 {
            assert_eq!(
                engine.compute_step(statement, step, Cycle::C2).unwrap().expected_answer,
                engine.compute_step(&canonical, step, Cycle::C2).unwrap().expected_answer,
                "{topic} step {step}"
            );
        }
    }
}

#[test]
fn test_scenario_a_expected_digits() {
    let engine = engine_for(Topic::Suma);
    let digits: Vec<String> = (0..5)
        .map(|step| {
            engine
                .compute_step("32458 + 6541", step, Cycle::C2)
                .unwrap()
                .expected_answer
                .unwrap()
        })
        .collect();
    assert_eq!(digits, ["9", "9", "9", "8", "3"]);
}

#[test]
fn test_scenario_b_first_group_and_digit() {
    let engine = engine_for(Topic::Division);
    let expected = |step| {
        engine
            .compute_step("3457/3", step, Cycle::C2)
            .unwrap()
            .expected_answer
            .unwrap()
    };
    assert_eq!(expected(0), "3");
    assert_eq!(expected(1), "1");
}

#[test]
fn test_scenario_c_fraction_stages() {
    let engine = engine_for(Topic::Fracciones);
    let expected = |step| {
        engine
            .compute_step("2/3 + 1/4", step, Cycle::C2)
            .unwrap()
            .expected_answer
            .unwrap()
    };
    assert_eq!(expected(0), "no");
    assert_eq!(expected(1), "12");
}
