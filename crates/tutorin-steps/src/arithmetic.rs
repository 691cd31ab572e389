//! Pencil-and-paper decomposition of binary operations.
//!
//! Integer operations work on [`BigUint`] digit strings, least significant
//! digit first, exactly as a pupil writes them in columns. Fractions use
//! exact [`BigRational`] values; decimals are scaled to integers and only
//! rounded when a division is involved.

use std::fmt;

use num_bigint::{BigInt, BigUint};
use num_rational::BigRational;
use num_traits::{One, Signed, ToPrimitive, Zero};

// ============================================================================
// Digits
// ============================================================================

/// Returns the base-10 digits of `n`, least significant first.
#[must_use]
pub fn digits_lsb(n: &BigUint) -> Vec<u8> {
    n.to_str_radix(10).bytes().rev().map(|b| b - b'0').collect()
}

/// Rebuilds a number from base-10 digits, least significant first.
#[must_use]
pub fn from_digits_lsb(digits: &[u8]) -> BigUint {
    BigUint::from_radix_le(digits, 10).unwrap_or_default()
}

/// `10^exp` as a big unsigned integer.
#[must_use]
pub fn pow10(exp: usize) -> BigUint {
    num_traits::pow(BigUint::from(10u8), exp)
}

// ============================================================================
// Addition
// ============================================================================

/// One column of a written addition.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct AddColumn {
    /// Digit of the first operand (0 past its length).
    pub top: u8,
    /// Digit of the second operand (0 past its length).
    pub bottom: u8,
    /// Carry received from the column on the right.
    pub carry_in: u8,
    /// Digit written under the rule.
    pub digit: u8,
    /// Carry passed to the column on the left.
    pub carry_out: u8,
}

impl AddColumn {
    /// Sum of the column before splitting digit and carry.
    #[must_use]
    pub const fn total(&self) -> u8 {
        self.top + self.bottom + self.carry_in
    }
}

/// Column-by-column addition.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ColumnAddition {
    /// Columns from units upward.
    pub columns: Vec<AddColumn>,
    /// Carry left over after the last column.
    pub final_carry: u8,
}

impl ColumnAddition {
    /// Number of answerable sub-steps: one per column plus the final carry.
    #[must_use]
    pub fn step_count(&self) -> usize {
        self.columns.len() + usize::from(self.final_carry > 0)
    }

    /// Digits of the result, least significant first.
    #[must_use]
    pub fn result_digits(&self) -> Vec<u8> {
        let mut digits: Vec<u8> = self.columns.iter().map(|c| c.digit).collect();
        if self.final_carry > 0 {
            digits.push(self.final_carry);
        }
        digits
    }

    /// The sum reassembled from the column digits.
    #[must_use]
    pub fn result(&self) -> BigUint {
        from_digits_lsb(&self.result_digits())
    }
}

/// Splits `a + b` into columns with carries.
#[must_use]
pub fn column_addition(a: &BigUint, b: &BigUint) -> ColumnAddition {
    let top = digits_lsb(a);
    let bottom = digits_lsb(b);
    let width = top.len().max(bottom.len());

    let mut columns = Vec::with_capacity(width);
    let mut carry = 0u8;
    for k in 0..width {
        let t = top.get(k).copied().unwrap_or(0);
        let d = bottom.get(k).copied().unwrap_or(0);
        let total = t + d + carry;
        columns.push(AddColumn {
            top: t,
            bottom: d,
            carry_in: carry,
            digit: total % 10,
            carry_out: total / 10,
        });
        carry = total / 10;
    }

    ColumnAddition {
        columns,
        final_carry: carry,
    }
}

// ============================================================================
// Subtraction
// ============================================================================

/// One column of a written subtraction.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SubColumn {
    /// Digit of the minuend.
    pub top: u8,
    /// Digit of the subtrahend (0 past its length).
    pub bottom: u8,
    /// 1 when the column on the right borrowed from this one.
    pub borrow_in: u8,
    /// Whether this column had to borrow ten from the next one.
    pub borrowed: bool,
    /// Digit written under the rule.
    pub digit: u8,
}

/// Column-by-column subtraction of a smaller number from a larger one.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ColumnSubtraction {
    /// Columns from units upward, one per minuend digit.
    pub columns: Vec<SubColumn>,
}

impl ColumnSubtraction {
    /// The difference reassembled from the column digits.
    #[must_use]
    pub fn result(&self) -> BigUint {
        let digits: Vec<u8> = self.columns.iter().map(|c| c.digit).collect();
        from_digits_lsb(&digits)
    }
}

/// Orders two operands so the larger one is the minuend.
#[must_use]
pub fn order_for_subtraction(a: BigUint, b: BigUint) -> (BigUint, BigUint) {
    if a < b {
        (b, a)
    } else {
        (a, b)
    }
}

/// Splits `minuend - subtrahend` into columns with borrowing.
///
/// The caller guarantees `minuend >= subtrahend`; see
/// [`order_for_subtraction`].
#[must_use]
pub fn column_subtraction(minuend: &BigUint, subtrahend: &BigUint) -> ColumnSubtraction {
    let top = digits_lsb(minuend);
    let bottom = digits_lsb(subtrahend);

    let mut columns = Vec::with_capacity(top.len());
    let mut borrow = 0u8;
    for (k, &t) in top.iter().enumerate() {
        let d = bottom.get(k).copied().unwrap_or(0);
        let raw = i16::from(t) - i16::from(borrow) - i16::from(d);
        let (digit, borrowed) = if raw < 0 {
            (raw + 10, true)
        } else {
            (raw, false)
        };
        columns.push(SubColumn {
            top: t,
            bottom: d,
            borrow_in: borrow,
            borrowed,
            digit: u8::try_from(digit).unwrap_or(0),
        });
        borrow = u8::from(borrowed);
    }

    ColumnSubtraction { columns }
}

// ============================================================================
// Multiplication
// ============================================================================

/// One partial line of a long multiplication.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PartialProduct {
    /// Multiplier digit used for this line.
    pub digit: u8,
    /// Position of that digit (0 = units).
    pub position: usize,
    /// `multiplicand × digit × 10^position`.
    pub value: BigUint,
}

/// Computes the partial lines of `multiplicand × multiplier`, units first.
#[must_use]
pub fn partial_products(multiplicand: &BigUint, multiplier: &BigUint) -> Vec<PartialProduct> {
    digits_lsb(multiplier)
        .into_iter()
        .enumerate()
        .map(|(position, digit)| PartialProduct {
            digit,
            position,
            value: multiplicand * BigUint::from(digit) * pow10(position),
        })
        .collect()
}

// ============================================================================
// Long Division
// ============================================================================

/// Digit brought down after a block's subtraction.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BringDown {
    /// The dividend digit brought down.
    pub digit: u8,
    /// `remainder × 10 + digit`.
    pub new_group: BigUint,
}

/// One group/quotient-digit/subtract/bring-down cycle.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DivisionBlock {
    /// Number being divided in this block.
    pub group: BigUint,
    /// `group div divisor`, always a single digit.
    pub quotient_digit: u8,
    /// `divisor × quotient_digit`.
    pub product: BigUint,
    /// `group - product`, always below the divisor.
    pub remainder: BigUint,
    /// Quotient digits written so far, this block included.
    pub quotient_prefix: String,
    /// Present on every block except the last.
    pub bring_down: Option<BringDown>,
}

/// A complete long division laid out block by block.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LongDivision {
    /// The dividend.
    pub dividend: BigUint,
    /// The divisor (never zero).
    pub divisor: BigUint,
    /// Length of the shortest dividend prefix that is at least the divisor.
    pub first_group_len: usize,
    /// Blocks in order; never empty.
    pub blocks: Vec<DivisionBlock>,
}

impl LongDivision {
    /// The first group taken from the dividend.
    #[must_use]
    pub fn first_group(&self) -> &BigUint {
        &self.blocks[0].group
    }

    /// The full quotient.
    #[must_use]
    pub fn quotient(&self) -> BigUint {
        self.last_block()
            .quotient_prefix
            .parse::<BigUint>()
            .unwrap_or_default()
    }

    /// The final remainder.
    #[must_use]
    pub fn remainder(&self) -> &BigUint {
        &self.last_block().remainder
    }

    /// Total answerable sub-steps: the first group, then three per block
    /// except the last, which has nothing to bring down.
    #[must_use]
    pub fn step_count(&self) -> usize {
        1 + 3 * (self.blocks.len() - 1) + 2
    }

    /// The last block.
    #[must_use]
    pub fn last_block(&self) -> &DivisionBlock {
        &self.blocks[self.blocks.len() - 1]
    }

    /// Maps a step index to the part of the division it asks for.
    #[must_use]
    pub fn locate(&self, step: usize) -> DivisionPosition {
        let Some(mut remaining) = step.checked_sub(1) else {
            return DivisionPosition::FirstGroup;
        };
        let last = self.blocks.len() - 1;
        for block in 0..=last {
            let subs = if block == last { 2 } else { 3 };
            if remaining < subs {
                return DivisionPosition::Block {
                    block,
                    sub: remaining,
                };
            }
            remaining -= subs;
        }
        DivisionPosition::Finished
    }
}

/// Where a step falls inside a long division.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DivisionPosition {
    /// Choosing the first group.
    FirstGroup,
    /// Inside a block: `sub` is 0 (quotient digit), 1 (remainder) or 2 (bring down).
    Block {
        /// Block index.
        block: usize,
        /// Sub-step within the block.
        sub: usize,
    },
    /// Past the last sub-step.
    Finished,
}

/// Lays out `dividend ÷ divisor` as a long division.
///
/// Returns `None` for a zero divisor.
#[must_use]
#[allow(clippy::missing_panics_doc, clippy::indexing_slicing)]
pub fn long_division(dividend: &BigUint, divisor: &BigUint) -> Option<LongDivision> {
    if divisor.is_zero() {
        return None;
    }

    let digits = dividend.to_str_radix(10);
    let prefix = |len: usize| digits[..len].parse::<BigUint>().unwrap_or_default();

    let mut first_group_len = 1;
    while first_group_len < digits.len() && prefix(first_group_len) < *divisor {
        first_group_len += 1;
    }

    let mut blocks = Vec::new();
    let mut group = prefix(first_group_len);
    let mut quotient = String::new();
    let mut position = first_group_len;
    loop {
        let quotient_digit = (&group / divisor).to_u8().unwrap_or(0);
        let product = divisor * BigUint::from(quotient_digit);
        let remainder = &group - &product;
        quotient.push(char::from(b'0' + quotient_digit));

        let bring_down = digits.as_bytes().get(position).map(|&b| {
            let digit = b - b'0';
            BringDown {
                digit,
                new_group: &remainder * BigUint::from(10u8) + BigUint::from(digit),
            }
        });
        let next_group = bring_down.as_ref().map(|b| b.new_group.clone());

        blocks.push(DivisionBlock {
            group,
            quotient_digit,
            product,
            remainder,
            quotient_prefix: quotient.clone(),
            bring_down,
        });

        match next_group {
            Some(next) => {
                group = next;
                position += 1;
            }
            None => break,
        }
    }

    Some(LongDivision {
        dividend: dividend.clone(),
        divisor: divisor.clone(),
        first_group_len,
        blocks,
    })
}

// ============================================================================
// Fractions
// ============================================================================

/// Greatest common divisor (always non-negative).
#[must_use]
pub fn gcd(a: &BigInt, b: &BigInt) -> BigInt {
    let (mut x, mut y) = (a.abs(), b.abs());
    while !y.is_zero() {
        let r = &x % &y;
        x = y;
        y = r;
    }
    x
}

/// Least common multiple (zero if either side is zero).
#[must_use]
pub fn lcm(a: &BigInt, b: &BigInt) -> BigInt {
    if a.is_zero() || b.is_zero() {
        return BigInt::zero();
    }
    (a * b).abs() / gcd(a, b)
}

/// Operator joining two fractions.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FractionOp {
    /// `+`
    Add,
    /// `-`
    Sub,
}

impl FractionOp {
    /// ASCII symbol of the operator.
    #[must_use]
    pub const fn symbol(self) -> char {
        match self {
            Self::Add => '+',
            Self::Sub => '-',
        }
    }
}

/// Two fractions joined by `+` or `-`. Denominators are never zero.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FractionExpr {
    /// Numerator of the left fraction.
    pub left_num: BigInt,
    /// Denominator of the left fraction.
    pub left_den: BigInt,
    /// The operator.
    pub op: FractionOp,
    /// Numerator of the right fraction.
    pub right_num: BigInt,
    /// Denominator of the right fraction.
    pub right_den: BigInt,
}

impl FractionExpr {
    /// Exact value of the expression.
    #[must_use]
    pub fn exact(&self) -> BigRational {
        let left = BigRational::new(self.left_num.clone(), self.left_den.clone());
        let right = BigRational::new(self.right_num.clone(), self.right_den.clone());
        match self.op {
            FractionOp::Add => left + right,
            FractionOp::Sub => left - right,
        }
    }
}

impl fmt::Display for FractionExpr {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{}/{}{}{}/{}",
            self.left_num,
            self.left_den,
            self.op.symbol(),
            self.right_num,
            self.right_den
        )
    }
}

/// Every intermediate value of the five-stage fraction pipeline.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FractionPipeline {
    /// Stage 0: whether both denominators are already equal.
    pub same_denominator: bool,
    /// Stage 1: least common multiple of the denominators.
    pub lcm: BigInt,
    /// Factor applied to the left fraction.
    pub left_factor: BigInt,
    /// Factor applied to the right fraction.
    pub right_factor: BigInt,
    /// Stage 2: left numerator over the LCM.
    pub left_scaled: BigInt,
    /// Stage 2: right numerator over the LCM.
    pub right_scaled: BigInt,
    /// Stage 3: combined numerator over the LCM.
    pub combined: BigInt,
    /// GCD of the combined numerator and the LCM.
    pub gcd: BigInt,
    /// Stage 4: result in lowest terms.
    pub simplified: BigRational,
}

/// Runs the fraction pipeline for `expr`.
#[must_use]
pub fn fraction_pipeline(expr: &FractionExpr) -> FractionPipeline {
    let common = lcm(&expr.left_den, &expr.right_den);
    let left_factor = &common / &expr.left_den;
    let right_factor = &common / &expr.right_den;
    let left_scaled = &expr.left_num * &left_factor;
    let right_scaled = &expr.right_num * &right_factor;
    let combined = match expr.op {
        FractionOp::Add => &left_scaled + &right_scaled,
        FractionOp::Sub => &left_scaled - &right_scaled,
    };
    let divisor = gcd(&combined, &common);
    let simplified = BigRational::new(combined.clone(), common.clone());

    FractionPipeline {
        same_denominator: expr.left_den == expr.right_den,
        lcm: common,
        left_factor,
        right_factor,
        left_scaled,
        right_scaled,
        combined,
        gcd: divisor,
        simplified,
    }
}

/// Formats a rational as `n/d`, or just `n` when the denominator is one.
#[must_use]
pub fn format_fraction(r: &BigRational) -> String {
    if r.denom().is_one() {
        r.numer().to_string()
    } else {
        format!("{}/{}", r.numer(), r.denom())
    }
}

// ============================================================================
// Decimals
// ============================================================================

/// Places kept for intermediate decimal results.
pub const INTERMEDIATE_PLACES: usize = 3;

/// Places kept for displayed decimal results.
pub const DISPLAY_PLACES: usize = 2;

/// Rounds half away from zero to `places` decimal digits.
#[must_use]
pub fn round_to(value: &BigRational, places: usize) -> BigRational {
    let scale = BigRational::from_integer(BigInt::from(pow10(places)));
    (value * &scale).round() / scale
}

/// Formats a rational as a decimal rounded to `places` digits, with a `.`
/// separator and no trailing zeros.
#[must_use]
pub fn format_decimal(value: &BigRational, places: usize) -> String {
    let scale = BigRational::from_integer(BigInt::from(pow10(places)));
    let scaled = (value * scale).round().to_integer();
    let sign = if scaled.is_negative() { "-" } else { "" };
    let digits = scaled.abs().to_string();
    if places == 0 {
        return format!("{sign}{digits}");
    }

    let padded = format!("{digits:0>width$}", width = places + 1);
    let (int_part, frac_part) = padded.split_at(padded.len() - places);
    let frac_part = frac_part.trim_end_matches('0');
    if frac_part.is_empty() {
        format!("{sign}{int_part}")
    } else {
        format!("{sign}{int_part}.{frac_part}")
    }
}

/// A non-negative decimal written with a fixed number of places.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DecimalNumber {
    /// The digits with the point removed (`12.50` → 1250).
    pub scaled: BigInt,
    /// Digits after the point as written (`12.50` → 2).
    pub places: usize,
}

impl DecimalNumber {
    /// Parses `12`, `12.5` or `12,5`.
    #[must_use]
    pub fn parse(text: &str) -> Option<Self> {
        let text = text.trim().replace(',', ".");
        let (int_part, frac_part) = text.split_once('.').unwrap_or((text.as_str(), ""));
        if int_part.is_empty() || !int_part.bytes().all(|b| b.is_ascii_digit()) {
            return None;
        }
        if !frac_part.bytes().all(|b| b.is_ascii_digit()) {
            return None;
        }
        let scaled = format!("{int_part}{frac_part}").parse::<BigInt>().ok()?;
        Some(Self {
            scaled,
            places: frac_part.len(),
        })
    }

    /// Exact value.
    #[must_use]
    pub fn value(&self) -> BigRational {
        BigRational::new(self.scaled.clone(), BigInt::from(pow10(self.places)))
    }

    /// The digits rescaled to `places` decimal places (`places >= self.places`).
    #[must_use]
    pub fn rescaled(&self, places: usize) -> BigInt {
        &self.scaled * BigInt::from(pow10(places.saturating_sub(self.places)))
    }
}

impl fmt::Display for DecimalNumber {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&format_decimal(&self.value(), self.places))
    }
}

/// Operator of a decimal exercise.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DecimalOp {
    /// Addition.
    Add,
    /// Subtraction.
    Sub,
    /// Multiplication.
    Mul,
    /// Division.
    Div,
}

impl DecimalOp {
    /// Normalized symbol shown to the pupil and expected back.
    #[must_use]
    pub const fn symbol(self) -> &'static str {
        match self {
            Self::Add => "+",
            Self::Sub => "-",
            Self::Mul => "×",
            Self::Div => "÷",
        }
    }

    /// Reads an operator written as `+ - × x * · / : ÷`.
    #[must_use]
    pub fn from_symbol(symbol: &str) -> Option<Self> {
        match symbol.trim() {
            "+" => Some(Self::Add),
            "-" | "−" | "–" => Some(Self::Sub),
            "×" | "x" | "X" | "*" | "·" => Some(Self::Mul),
            "÷" | "/" | ":" => Some(Self::Div),
            _ => None,
        }
    }
}

/// The four stages of a decimal operation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DecimalPipeline {
    /// Stage 0: the operator.
    pub op: DecimalOp,
    /// Stage 2: left operand with the point removed.
    pub integer_left: BigInt,
    /// Stage 2: right operand with the point removed.
    pub integer_right: BigInt,
    /// Stage 2: result of the integer operation.
    pub integer_result: BigRational,
    /// Places shown for the integer result (non-zero only for division).
    pub integer_places: usize,
    /// Stage 3: decimal places of the final result.
    pub result_places: usize,
    /// Stage 3: the final result, rounded to `result_places`.
    pub result: BigRational,
}

impl DecimalPipeline {
    /// Integer result as shown to the pupil.
    #[must_use]
    pub fn integer_result_text(&self) -> String {
        format_decimal(&self.integer_result, self.integer_places)
    }

    /// Final result as shown to the pupil.
    #[must_use]
    pub fn result_text(&self) -> String {
        format_decimal(&self.result, self.result_places)
    }
}

/// Runs the decimal pipeline. Returns `None` when dividing by zero.
#[must_use]
pub fn decimal_pipeline(
    left: &DecimalNumber,
    op: DecimalOp,
    right: &DecimalNumber,
) -> Option<DecimalPipeline> {
    let aligned = left.places.max(right.places);
    let pipeline = match op {
        DecimalOp::Add | DecimalOp::Sub => {
            let a = left.rescaled(aligned);
            let b = right.rescaled(aligned);
            let integer = if op == DecimalOp::Add { &a + &b } else { &a - &b };
            let result = BigRational::new(integer.clone(), BigInt::from(pow10(aligned)));
            DecimalPipeline {
                op,
                integer_left: a,
                integer_right: b,
                integer_result: BigRational::from_integer(integer),
                integer_places: 0,
                result_places: aligned,
                result,
            }
        }
        DecimalOp::Mul => {
            let places = left.places + right.places;
            let integer = &left.scaled * &right.scaled;
            let result = BigRational::new(integer.clone(), BigInt::from(pow10(places)));
            DecimalPipeline {
                op,
                integer_left: left.scaled.clone(),
                integer_right: right.scaled.clone(),
                integer_result: BigRational::from_integer(integer),
                integer_places: 0,
                result_places: places,
                result,
            }
        }
        DecimalOp::Div => {
            if right.scaled.is_zero() {
                return None;
            }
            let a = left.rescaled(aligned);
            let b = right.rescaled(aligned);
            let quotient = BigRational::new(a.clone(), b.clone());
            DecimalPipeline {
                op,
                integer_left: a,
                integer_right: b,
                integer_result: round_to(&quotient, INTERMEDIATE_PLACES),
                integer_places: INTERMEDIATE_PLACES,
                result_places: DISPLAY_PLACES,
                result: round_to(&quotient, DISPLAY_PLACES),
            }
        }
    };
    Some(pipeline)
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    fn big(n: u64) -> BigUint {
        BigUint::from(n)
    }

    fn int(n: i64) -> BigInt {
        BigInt::from(n)
    }

    // ------------------------------------------------------------------------
    // Addition / subtraction
    // ------------------------------------------------------------------------

    #[test]
    fn test_column_addition_without_final_carry() {
        let add = column_addition(&big(32458), &big(6541));
        assert_eq!(add.columns.len(), 5);
        assert_eq!(add.final_carry, 0);
        assert_eq!(add.columns[0].digit, 9);
        assert_eq!(add.result(), big(38999));
        assert_eq!(add.step_count(), 5);
    }

    #[test]
    fn test_column_addition_with_final_carry() {
        let add = column_addition(&big(987), &big(45));
        assert_eq!(add.columns[0].total(), 12);
        assert_eq!(add.columns[1].carry_in, 1);
        assert_eq!(add.final_carry, 1);
        assert_eq!(add.result(), big(1032));
        assert_eq!(add.step_count(), 4);
    }

    #[test]
    fn test_column_subtraction_borrows() {
        let sub = column_subtraction(&big(503), &big(178));
        let digits: Vec<u8> = sub.columns.iter().map(|c| c.digit).collect();
        assert_eq!(digits, vec![5, 2, 3]);
        assert!(sub.columns[0].borrowed);
        assert!(sub.columns[1].borrowed);
        assert!(!sub.columns[2].borrowed);
        assert_eq!(sub.result(), big(325));
    }

    #[test]
    fn test_order_for_subtraction_swaps() {
        let (a, b) = order_for_subtraction(big(12), big(40));
        assert_eq!((a, b), (big(40), big(12)));
    }

    // ------------------------------------------------------------------------
    // Multiplication / division
    // ------------------------------------------------------------------------

    #[test]
    fn test_partial_products_embed_shift() {
        let partials = partial_products(&big(123), &big(45));
        let values: Vec<BigUint> = partials.iter().map(|p| p.value.clone()).collect();
        assert_eq!(values, vec![big(615), big(4920)]);
        assert_eq!(partials[1].position, 1);
    }

    #[test]
    fn test_long_division_first_group() {
        let div = long_division(&big(3457), &big(3)).unwrap();
        assert_eq!(div.first_group_len, 1);
        assert_eq!(div.first_group(), &big(3));
        assert_eq!(div.blocks[0].quotient_digit, 1);
        assert_eq!(div.quotient(), big(1152));
        assert_eq!(div.remainder(), &big(1));
        assert_eq!(div.step_count(), 12);
    }

    #[test]
    fn test_long_division_locate() {
        let div = long_division(&big(3457), &big(3)).unwrap();
        assert_eq!(div.locate(0), DivisionPosition::FirstGroup);
        assert_eq!(div.locate(1), DivisionPosition::Block { block: 0, sub: 0 });
        assert_eq!(div.locate(3), DivisionPosition::Block { block: 0, sub: 2 });
        assert_eq!(div.locate(4), DivisionPosition::Block { block: 1, sub: 0 });
        assert_eq!(div.locate(11), DivisionPosition::Block { block: 3, sub: 1 });
        assert_eq!(div.locate(12), DivisionPosition::Finished);
    }

    #[test]
    fn test_long_division_wide_first_group() {
        let div = long_division(&big(1234), &big(56)).unwrap();
        assert_eq!(div.first_group(), &big(123));
        assert_eq!(div.blocks.len(), 2);
        assert_eq!(div.blocks[0].bring_down.as_ref().unwrap().new_group, big(114));
        assert_eq!(div.quotient(), big(22));
        assert_eq!(div.remainder(), &big(2));
    }

    #[test]
    fn test_long_division_small_dividend() {
        let div = long_division(&big(7), &big(9)).unwrap();
        assert_eq!(div.blocks.len(), 1);
        assert_eq!(div.quotient(), big(0));
        assert_eq!(div.remainder(), &big(7));
    }

    #[test]
    fn test_long_division_by_zero() {
        assert!(long_division(&big(10), &big(0)).is_none());
    }

    // ------------------------------------------------------------------------
    // Fractions
    // ------------------------------------------------------------------------

    #[test]
    fn test_gcd_and_lcm() {
        assert_eq!(gcd(&int(12), &int(18)), int(6));
        assert_eq!(gcd(&int(-4), &int(6)), int(2));
        assert_eq!(lcm(&int(3), &int(4)), int(12));
        assert_eq!(lcm(&int(6), &int(4)), int(12));
    }

    #[test]
    fn test_fraction_pipeline_uses_lcm() {
        let expr = FractionExpr {
            left_num: int(5),
            left_den: int(6),
            op: FractionOp::Add,
            right_num: int(1),
            right_den: int(4),
        };
        let p = fraction_pipeline(&expr);
        assert!(!p.same_denominator);
        assert_eq!(p.lcm, int(12));
        assert_eq!((p.left_scaled.clone(), p.right_scaled.clone()), (int(10), int(3)));
        assert_eq!(p.combined, int(13));
        assert_eq!(format_fraction(&p.simplified), "13/12");
        assert_eq!(expr.to_string(), "5/6+1/4");
    }

    #[test]
    fn test_fraction_pipeline_negative_difference() {
        let expr = FractionExpr {
            left_num: int(1),
            left_den: int(4),
            op: FractionOp::Sub,
            right_num: int(3),
            right_den: int(4),
        };
        let p = fraction_pipeline(&expr);
        assert!(p.same_denominator);
        assert_eq!(p.combined, int(-2));
        assert_eq!(format_fraction(&p.simplified), "-1/2");
        assert_eq!(p.simplified, expr.exact());
    }

    // ------------------------------------------------------------------------
    // Decimals
    // ------------------------------------------------------------------------

    #[test]
    fn test_format_decimal_trims_and_rounds() {
        let r = BigRational::new(int(2), int(3));
        assert_eq!(format_decimal(&r, 3), "0.667");
        assert_eq!(format_decimal(&r, 2), "0.67");
        assert_eq!(format_decimal(&BigRational::from_integer(int(3)), 2), "3");
        assert_eq!(format_decimal(&BigRational::new(int(-5), int(4)), 2), "-1.25");
        assert_eq!(format_decimal(&BigRational::new(int(1), int(200)), 2), "0.01");
    }

    #[test]
    fn test_decimal_number_parse() {
        let n = DecimalNumber::parse("12,50").unwrap();
        assert_eq!(n.scaled, int(1250));
        assert_eq!(n.places, 2);
        assert_eq!(n.to_string(), "12.5");
        assert!(DecimalNumber::parse("1.2.3").is_none());
        assert!(DecimalNumber::parse(",5").is_none());
    }

    #[test]
    fn test_decimal_pipeline_addition_aligns() {
        let a = DecimalNumber::parse("2,5").unwrap();
        let b = DecimalNumber::parse("1,25").unwrap();
        let p = decimal_pipeline(&a, DecimalOp::Add, &b).unwrap();
        assert_eq!((p.integer_left.clone(), p.integer_right.clone()), (int(250), int(125)));
        assert_eq!(p.integer_result_text(), "375");
        assert_eq!(p.result_text(), "3.75");
    }

    #[test]
    fn test_decimal_pipeline_multiplication_adds_places() {
        let a = DecimalNumber::parse("2.1").unwrap();
        let b = DecimalNumber::parse("1.3").unwrap();
        let p = decimal_pipeline(&a, DecimalOp::Mul, &b).unwrap();
        assert_eq!(p.integer_result_text(), "273");
        assert_eq!(p.result_places, 2);
        assert_eq!(p.result_text(), "2.73");
    }

    #[test]
    fn test_decimal_pipeline_division_rounds() {
        let a = DecimalNumber::parse("1").unwrap();
        let b = DecimalNumber::parse("3").unwrap();
        let p = decimal_pipeline(&a, DecimalOp::Div, &b).unwrap();
        assert_eq!(p.integer_result_text(), "0.333");
        assert_eq!(p.result_text(), "0.33");

        let zero = DecimalNumber::parse("0.0").unwrap();
        assert!(decimal_pipeline(&a, DecimalOp::Div, &zero).is_none());
    }
}
