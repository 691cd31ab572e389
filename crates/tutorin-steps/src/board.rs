//! Monospaced boards reproducing the written layout of each operation.
//!
//! Boards are rebuilt from scratch on every call: the only input besides the
//! operands is how far the pupil has got.

use num_bigint::BigUint;

use crate::arithmetic::{ColumnAddition, ColumnSubtraction, LongDivision, PartialProduct};

/// Opening tag of every rendered board.
pub const PRE_OPEN: &str = "<pre style='font-family:monospace;line-height:1.25;margin:6px 0 0 0'>";

/// Closing tag of every rendered board.
pub const PRE_CLOSE: &str = "</pre>";

/// A block of text lines rendered inside a `<pre>` element.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Board {
    width: usize,
    lines: Vec<String>,
}

impl Board {
    /// Creates an empty board whose right-aligned lines are `width` wide.
    #[must_use]
    pub const fn new(width: usize) -> Self {
        Self {
            width,
            lines: Vec::new(),
        }
    }

    /// Appends a line right-aligned to the board width.
    pub fn right(&mut self, text: impl AsRef<str>) -> &mut Self {
        let line = format!("{:>width$}", text.as_ref(), width = self.width);
        self.lines.push(line);
        self
    }

    /// Appends a line as-is.
    pub fn raw(&mut self, text: impl Into<String>) -> &mut Self {
        self.lines.push(text.into());
        self
    }

    /// The lines added so far.
    #[must_use]
    pub fn lines(&self) -> &[String] {
        &self.lines
    }

    /// Renders the board as a `<pre>` block.
    #[must_use]
    pub fn render(&self) -> String {
        format!("{PRE_OPEN}{}{PRE_CLOSE}", self.lines.join("\n"))
    }
}

fn len(n: &BigUint) -> usize {
    n.to_str_radix(10).len()
}

fn rule(width: usize) -> String {
    "-".repeat(width)
}

/// Solved digits, most significant first, separated by spaces.
fn spaced(digits_lsb: &[u8], solved: usize) -> String {
    digits_lsb
        .iter()
        .take(solved)
        .rev()
        .map(u8::to_string)
        .collect::<Vec<_>>()
        .join(" ")
}

/// Column addition with the first `solved` result digits filled in.
#[must_use]
pub fn addition(
    a: &BigUint,
    b: &BigUint,
    add: &ColumnAddition,
    solved: usize,
    done: bool,
) -> String {
    let operand_rule = len(a).max(len(b) + 2);
    let mut board = Board::new(operand_rule.max(len(&add.result())) + 2);
    board
        .right(a.to_string())
        .right(format!("+ {b}"))
        .right(rule(operand_rule))
        .right(spaced(&add.result_digits(), solved));
    if done {
        board.right(rule(operand_rule));
    }
    board.render()
}

/// Column subtraction with the first `solved` result digits filled in.
#[must_use]
pub fn subtraction(
    minuend: &BigUint,
    subtrahend: &BigUint,
    sub: &ColumnSubtraction,
    solved: usize,
    done: bool,
) -> String {
    let operand_rule = len(minuend).max(len(subtrahend) + 2);
    let digits: Vec<u8> = sub.columns.iter().map(|c| c.digit).collect();
    let mut board = Board::new(operand_rule + 2);
    board
        .right(minuend.to_string())
        .right(format!("- {subtrahend}"))
        .right(rule(operand_rule))
        .right(spaced(&digits, solved));
    if done {
        board.right(rule(operand_rule));
    }
    board.render()
}

/// Long multiplication showing the first `shown` partial lines and, once
/// known, the final product under a second rule.
#[must_use]
pub fn multiplication(
    multiplicand: &BigUint,
    multiplier: &BigUint,
    partials: &[PartialProduct],
    shown: usize,
    product: Option<&BigUint>,
) -> String {
    let operand_rule = len(multiplicand).max(len(multiplier) + 2);
    let widest = partials.iter().map(|p| len(&p.value)).max().unwrap_or(0);
    let total = multiplicand * multiplier;
    let mut board = Board::new(operand_rule.max(widest).max(len(&total)) + 2);
    board
        .right(multiplicand.to_string())
        .right(format!("× {multiplier}"))
        .right(rule(operand_rule));
    for partial in partials.iter().take(shown) {
        board.right(partial.value.to_string());
    }
    if let Some(product) = product {
        board.right(rule(widest.max(len(product))));
        board.right(product.to_string());
    }
    board.render()
}

/// Where the pupil is inside a long division.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DivisionCursor {
    /// Block being worked on.
    pub block: usize,
    /// 0 = quotient digit, 1 = remainder, 2 = bring down.
    pub sub: usize,
    /// Whether the whole quotient is revealed.
    pub finished: bool,
}

/// Long division in the Spanish layout: dividend and divisor on the top
/// line, the quotient under the divisor, and the partial work under the
/// dividend.
#[must_use]
#[allow(clippy::indexing_slicing)]
pub fn division(div: &LongDivision, cursor: DivisionCursor) -> String {
    let dividend = div.dividend.to_string();
    let divisor = div.divisor.to_string();
    let block = cursor.block.min(div.blocks.len() - 1);

    let quotient: String = if cursor.finished {
        div.last_block().quotient_prefix.clone()
    } else {
        let confirmed = cursor.block + usize::from(cursor.sub >= 1);
        div.blocks[block].quotient_prefix.chars().take(confirmed).collect()
    };
    let column = divisor.len().max(quotient.len());

    let mut board = Board::new(0);
    board
        .raw(format!("{dividend} | {divisor:>column$}"))
        .raw(format!("{}   {quotient:>column$}", " ".repeat(dividend.len())));

    let mut write_block = |j: usize, show_product: bool, show_remainder: bool| {
        let end = div.first_group_len + j;
        let current = &div.blocks[j];
        if show_product {
            let product = current.product.to_string();
            let indent = " ".repeat(end.saturating_sub(product.len()));
            board.raw(format!("{indent}{product}"));
            board.raw(format!("{indent}{}", rule(product.len())));
        }
        if show_remainder {
            let remainder = format!(
                "{:0>width$}",
                current.remainder.to_string(),
                width = divisor.len()
            );
            let indent = " ".repeat(end.saturating_sub(remainder.len()));
            let arrow = current
                .bring_down
                .as_ref()
                .map(|b| format!("↓{}", b.digit))
                .unwrap_or_default();
            board.raw(format!("{indent}{remainder}{arrow}"));
        }
    };

    for j in 0..block {
        write_block(j, true, true);
    }
    if cursor.finished {
        write_block(block, true, true);
    } else {
        write_block(block, cursor.sub >= 1, cursor.sub >= 2);
    }

    board.render()
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use crate::arithmetic::{column_addition, column_subtraction, long_division, partial_products};

    /// Strips the `<pre>` wrapper and frames each line so leading spaces
    /// survive inline snapshots.
    fn framed(html: &str) -> String {
        html.trim_start_matches(PRE_OPEN)
            .trim_end_matches(PRE_CLOSE)
            .lines()
            .map(|l| format!("|{l}|"))
            .collect::<Vec<_>>()
            .join("\n")
    }

    fn big(n: u64) -> BigUint {
        BigUint::from(n)
    }

    #[test]
    fn test_board_render_wraps_in_pre() {
        let mut board = Board::new(4);
        board.right("12").raw("x");
        assert_eq!(board.lines(), ["  12", "x"]);
        assert!(board.render().starts_with(PRE_OPEN));
        assert!(board.render().ends_with(PRE_CLOSE));
    }

    #[test]
    fn test_addition_board_partial() {
        let (a, b) = (big(32458), big(6541));
        let add = column_addition(&a, &b);
        insta::assert_snapshot!(framed(&addition(&a, &b, &add, 2, false)), @r"
        |   32458|
        |  + 6541|
        |  ------|
        |     9 9|
        ");
    }

    #[test]
    fn test_addition_board_done_has_closing_rule() {
        let (a, b) = (big(987), big(45));
        let add = column_addition(&a, &b);
        let framed = framed(&addition(&a, &b, &add, add.step_count(), true));
        let lines: Vec<&str> = framed.lines().collect();
        assert_eq!(lines.len(), 5);
        assert_eq!(lines[3], "|1 0 3 2|");
        assert_eq!(lines[4], "|  ----|");
    }

    #[test]
    fn test_subtraction_board() {
        let (a, b) = (big(503), big(178));
        let sub = column_subtraction(&a, &b);
        insta::assert_snapshot!(framed(&subtraction(&a, &b, &sub, 1, false)), @r"
        |    503|
        |  - 178|
        |  -----|
        |      5|
        ");
    }

    #[test]
    fn test_multiplication_board_with_product() {
        let (a, b) = (big(123), big(45));
        let partials = partial_products(&a, &b);
        let product = &a * &b;
        insta::assert_snapshot!(framed(&multiplication(&a, &b, &partials, 2, Some(&product))), @r"
        |   123|
        |  × 45|
        |  ----|
        |   615|
        |  4920|
        |  ----|
        |  5535|
        ");
    }

    #[test]
    fn test_division_board_hides_current_product() {
        let div = long_division(&big(3457), &big(3)).unwrap();
        let cursor = DivisionCursor {
            block: 1,
            sub: 0,
            finished: false,
        };
        insta::assert_snapshot!(framed(&division(&div, cursor)), @r"
        |3457 | 3|
        |       1|
        |3|
        |-|
        |0↓4|
        ");
    }

    #[test]
    fn test_division_board_finished() {
        let div = long_division(&big(1234), &big(56)).unwrap();
        let cursor = DivisionCursor {
            block: 1,
            sub: 2,
            finished: true,
        };
        insta::assert_snapshot!(framed(&division(&div, cursor)), @r"
        |1234 | 56|
        |       22|
        |112|
        |---|
        | 11↓4|
        | 112|
        | ---|
        |  02|
        ");
    }
}
