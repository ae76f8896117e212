use crate::error::ControllerError;
use crate::state::Amount;
use crate::DISPLAY_DECIMALS;

use primitive_types::U256;

/// Returns whether `input` looks like a non-negative decimal number: digits
/// with at most one decimal point and at least one digit.
pub fn is_valid_input(input: &str) -> bool {
    let mut digits = 0_usize;
    let mut points = 0_usize;
    for c in input.chars() {
        match c {
            '0'..='9' => digits += 1,
            '.' => points += 1,
            _ => return false,
        }
    }
    digits > 0 && points <= 1
}

/// Computes `a * b / c` over a 256-bit intermediate product. Returns `None`
/// if `c` is zero or the quotient does not fit an [`Amount`].
pub fn mul_div(a: Amount, b: Amount, c: Amount) -> Option<Amount> {
    if c == 0 {
        return None;
    }
    // the product of two u128 values always fits 256 bits
    let quotient = U256::from(a) * U256::from(b) / U256::from(c);
    if quotient > U256::from(Amount::MAX) {
        None
    } else {
        Some(quotient.low_u128())
    }
}

fn pow10(exponent: u32) -> Option<Amount> {
    10_u128.checked_pow(exponent)
}

/// Scales a decimal string into base units.
///
/// Inputs with more fraction digits than `decimals` are rejected instead of
/// being rounded.
pub fn parse_units(input: &str, decimals: u8) -> Result<Amount, ControllerError> {
    if !is_valid_input(input) {
        return Err(ControllerError::InvalidAmount);
    }
    let (whole, fraction) = input.split_once('.').unwrap_or((input, ""));
    if fraction.len() > decimals as usize {
        return Err(ControllerError::InvalidAmount);
    }
    let whole: Amount = if whole.is_empty() {
        0
    } else {
        whole.parse().map_err(|_| ControllerError::InvalidAmount)?
    };
    let padded_fraction: Amount = if fraction.is_empty() {
        0
    } else {
        let exponent = decimals as u32 - fraction.len() as u32;
        fraction
            .parse::<Amount>()
            .ok()
            .and_then(|f| pow10(exponent).and_then(|p| f.checked_mul(p)))
            .ok_or(ControllerError::InvalidAmount)?
    };
    pow10(decimals as u32)
        .and_then(|unit| whole.checked_mul(unit))
        .and_then(|scaled| scaled.checked_add(padded_fraction))
        .ok_or(ControllerError::InvalidAmount)
}

/// Formats base units as a plain decimal string without trailing zeros.
pub fn format_units(amount: Amount, decimals: u8) -> String {
    let decimals = decimals as usize;
    let mut digits = amount.to_string();
    if digits.len() <= decimals {
        digits = format!("{}{}", "0".repeat(decimals + 1 - digits.len()), digits);
    }
    let (whole, fraction) = digits.split_at(digits.len() - decimals);
    let fraction = fraction.trim_end_matches('0');
    if fraction.is_empty() {
        whole.to_owned()
    } else {
        format!("{}.{}", whole, fraction)
    }
}

/// Formats an optional amount for display: thousands separators and two
/// fraction digits, rounded half up. Unresolved values show as `0.00`.
pub fn format_currency(amount: Option<Amount>, decimals: Option<u8>) -> String {
    let (amount, decimals) = match (amount, decimals) {
        (Some(amount), Some(decimals)) => (amount, decimals as u32),
        _ => return format!("0.{}", "0".repeat(DISPLAY_DECIMALS as usize)),
    };
    let cents = if decimals <= DISPLAY_DECIMALS {
        pow10(DISPLAY_DECIMALS - decimals).and_then(|p| amount.checked_mul(p))
    } else {
        pow10(decimals - DISPLAY_DECIMALS).and_then(|p| {
            let rounded = amount.checked_add(p / 2).unwrap_or(amount);
            Some(rounded / p)
        })
    };
    let cents = match cents {
        Some(cents) => cents,
        None => return format_units(amount, decimals as u8),
    };
    let unit = 10_u128.pow(DISPLAY_DECIMALS);
    format!(
        "{}.{:0width$}",
        group_thousands(cents / unit),
        cents % unit,
        width = DISPLAY_DECIMALS as usize
    )
}

fn group_thousands(value: Amount) -> String {
    let digits = value.to_string();
    let mut grouped = String::with_capacity(digits.len() + digits.len() / 3);
    for (i, c) in digits.chars().enumerate() {
        if i > 0 && (digits.len() - i) % 3 == 0 {
            grouped.push(',');
        }
        grouped.push(c);
    }
    grouped
}

/// The raw amount typed by the user.
///
/// The string is kept verbatim and only parsed on demand, so an invalid
/// entry never reaches the allowance or transaction layers.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct InputAmount {
    raw: String,
}

impl InputAmount {
    pub fn new(raw: impl Into<String>) -> Self {
        Self { raw: raw.into() }
    }

    pub fn raw(&self) -> &str {
        &self.raw
    }

    pub fn set(&mut self, raw: impl Into<String>) {
        self.raw = raw.into();
    }

    /// "MAX" shortcut: replaces the input with the whole balance.
    pub fn use_balance(&mut self, balance: Amount, decimals: u8) {
        self.raw = format_units(balance, decimals);
    }

    /// Whether the input should be highlighted as erroneous. An empty input
    /// is not an error, merely nothing to submit.
    pub fn shows_error(&self) -> bool {
        !self.raw.is_empty() && !is_valid_input(&self.raw)
    }

    pub fn parse(&self, decimals: u8) -> Result<Amount, ControllerError> {
        parse_units(&self.raw, decimals)
    }

    /// The amount that may be submitted: a validly parsed, positive amount.
    pub fn spend_amount(&self, decimals: Option<u8>) -> Option<Amount> {
        let amount = self.parse(decimals?).ok()?;
        if amount == 0 {
            None
        } else {
            Some(amount)
        }
    }
}
