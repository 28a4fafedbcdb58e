//! Written-out renminbi amounts, as printed next to figures in contracts.
//!
//! The integer part is grouped into four-digit sections (个, 万, 亿, 兆). Zero
//! digits collapse into a single `零` and never appear right before a section
//! suffix or at the end. A boundary between a non-empty higher section and a
//! lower section that is all zero or starts with zero gets exactly one `零`.

use rust_decimal::prelude::ToPrimitive;
use rust_decimal::{Decimal, RoundingStrategy};
use rust_decimal_macros::dec;
use thiserror::Error;

const DIGITS: [&str; 10] = ["零", "壹", "贰", "叁", "肆", "伍", "陆", "柒", "捌", "玖"];
const PLACES: [&str; 4] = ["", "拾", "佰", "仟"];
const SECTIONS: [&str; 4] = ["", "万", "亿", "兆"];
const ZERO: &str = "零";
const YUAN: &str = "元";
const JIAO: &str = "角";
const FEN: &str = "分";
const EXACT: &str = "整";

/// Label for an amount that rounds to zero.
pub const ZERO_LABEL: &str = "零元整";

const SECTION_BASE: u64 = 10_000;
/// First integer that needs a suffix beyond 兆.
const INTEGER_LIMIT: u64 = 10_000_000_000_000_000;

#[derive(Debug, Error, PartialEq, Eq)]
pub enum AmountLabelError {
    #[error("amount {0} is negative")]
    Negative(Decimal),
    #[error("amount {0} exceeds the largest supported section (兆)")]
    TooLarge(Decimal),
}

/// Renders `amount` as a written-out currency label.
pub fn label(amount: Decimal) -> Result<String, AmountLabelError> {
    if amount < Decimal::ZERO {
        return Err(AmountLabelError::Negative(amount));
    }

    let rounded = amount.round_dp_with_strategy(2, RoundingStrategy::MidpointAwayFromZero);
    if rounded.is_zero() {
        return Ok(ZERO_LABEL.to_string());
    }

    let whole = rounded.trunc();
    let integer = whole
        .to_u64()
        .filter(|value| *value < INTEGER_LIMIT)
        .ok_or(AmountLabelError::TooLarge(amount))?;
    let cents = ((rounded - whole) * dec!(100)).trunc().to_u32().unwrap_or(0);

    let mut out = render_integer(integer);
    if out.is_empty() {
        out.push_str(ZERO);
    }
    out.push_str(YUAN);

    if cents == 0 {
        out.push_str(EXACT);
        return Ok(out);
    }

    let jiao = (cents / 10) as usize;
    let fen = (cents % 10) as usize;
    if jiao > 0 {
        out.push_str(DIGITS[jiao]);
        out.push_str(JIAO);
    } else if integer > 0 {
        out.push_str(ZERO);
    }
    if fen > 0 {
        out.push_str(DIGITS[fen]);
        out.push_str(FEN);
    }

    Ok(out)
}

fn render_integer(value: u64) -> String {
    let mut sections = Vec::new();
    let mut rest = value;
    while rest > 0 {
        sections.push((rest % SECTION_BASE) as u16);
        rest /= SECTION_BASE;
    }

    let mut out = String::new();
    let mut pending_zero = false;
    for (magnitude, &section) in sections.iter().enumerate().rev() {
        if section == 0 {
            pending_zero = !out.is_empty();
            continue;
        }
        if !out.is_empty() && (pending_zero || section < 1000) {
            out.push_str(ZERO);
        }
        pending_zero = false;
        render_section(section, &mut out);
        out.push_str(SECTIONS[magnitude]);
    }

    match out.strip_prefix(ZERO) {
        Some(stripped) => stripped.to_string(),
        None => out,
    }
}

fn render_section(section: u16, out: &mut String) {
    let digits = [
        section / 1000,
        section / 100 % 10,
        section / 10 % 10,
        section % 10,
    ];

    let mut started = false;
    let mut zero_run = false;
    for (position, &digit) in digits.iter().enumerate() {
        if digit == 0 {
            zero_run = started;
            continue;
        }
        if zero_run {
            out.push_str(ZERO);
            zero_run = false;
        }
        out.push_str(DIGITS[digit as usize]);
        out.push_str(PLACES[3 - position]);
        started = true;
    }
}
