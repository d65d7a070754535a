use alloy::primitives::{Uint, U256};
use rust_decimal::Decimal;
use std::str::FromStr;

use crate::models::DEFAULT_DECIMALS;

/// Fractional digits shown for human-readable balances.
pub const DISPLAY_PRECISION: usize = 4;

/// Accumulator width for sums of `U256` amounts.
pub type U512 = Uint<512, 8>;

pub fn widen(value: U256) -> U512 {
    U512::from_limbs_slice(value.as_limbs())
}

fn pow10(exp: u32) -> U512 {
    U512::from(10u64).pow(U512::from(exp))
}

/// Render `value` (smallest units) with `decimals` implied fractional digits,
/// rounded half-up to `precision` digits.
pub fn format_units(value: U512, decimals: u8, precision: usize) -> String {
    let base = pow10(decimals as u32);
    let mut whole = value / base;
    let frac = value % base;

    let decimals = decimals as usize;
    let shown = if decimals <= precision {
        frac * pow10((precision - decimals) as u32)
    } else {
        let divisor = pow10((decimals - precision) as u32);
        let mut scaled = frac / divisor;
        if (frac % divisor) * U512::from(2u64) >= divisor {
            scaled += U512::from(1u64);
        }
        if scaled == pow10(precision as u32) {
            whole += U512::from(1u64);
            scaled = U512::ZERO;
        }
        scaled
    };

    if precision == 0 {
        return whole.to_string();
    }
    format!("{}.{:0>width$}", whole, shown.to_string(), width = precision)
}

/// Wei (decimal string) to a 4-digit ether string. Unparseable input renders as zero.
pub fn format_ether(wei: &str) -> String {
    let value = U512::from_str_radix(wei.trim(), 10).unwrap_or(U512::ZERO);
    format_units(value, DEFAULT_DECIMALS, DISPLAY_PRECISION)
}

/// Parse an ether amount (`"0.5"`, `"5e-1"`) into wei, truncating digits past 18.
///
/// Negative amounts clamp to zero. Numbers too large to represent exactly
/// come back as a value above every `U256`. Non-numeric input is `None`.
pub fn parse_ether(amount: &str) -> Option<U512> {
    let raw = amount.trim();
    let parsed = Decimal::from_str(raw).or_else(|_| Decimal::from_scientific(raw));
    let parsed = match parsed {
        Ok(parsed) => parsed,
        Err(_) => {
            let approx: f64 = raw.parse().ok()?;
            return if approx.is_nan() {
                None
            } else if approx <= 0.0 {
                Some(U512::ZERO)
            } else {
                Some(widen(U256::MAX) + U512::from(1u64))
            };
        }
    };

    if parsed.is_sign_negative() {
        return Some(U512::ZERO);
    }
    let mantissa = U512::from(parsed.mantissa().unsigned_abs());
    let scale = parsed.scale();
    let decimals = DEFAULT_DECIMALS as u32;
    Some(if scale <= decimals {
        mantissa * pow10(decimals - scale)
    } else {
        mantissa / pow10(scale - decimals)
    })
}

/// Day names indexed from Sunday.
pub fn day_name(day: u8) -> &'static str {
    const DAYS: [&str; 7] = [
        "Sunday",
        "Monday",
        "Tuesday",
        "Wednesday",
        "Thursday",
        "Friday",
        "Saturday",
    ];
    DAYS.get(day as usize).copied().unwrap_or("Unknown")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn one_ether_formats_with_four_digits() {
        assert_eq!(format_ether("1000000000000000000"), "1.0000");
        assert_eq!(format_ether("0"), "0.0000");
        assert_eq!(format_ether("garbage"), "0.0000");
    }

    #[test]
    fn rounds_half_up_and_carries() {
        assert_eq!(format_ether("123450000000000"), "0.0001");
        assert_eq!(format_ether("49999999999999"), "0.0000");
        assert_eq!(format_ether("999960000000000000"), "1.0000");
        assert_eq!(format_ether("2500000000000000000"), "2.5000");
    }

    #[test]
    fn small_decimals_pad_instead_of_round() {
        assert_eq!(format_units(U512::from(123456u64), 2, 4), "1234.5600");
        assert_eq!(format_units(U512::from(7u64), 0, 0), "7");
    }

    #[test]
    fn parses_ether_amounts_into_wei() {
        assert_eq!(
            parse_ether("0.5"),
            Some(U512::from(500_000_000_000_000_000u64))
        );
        assert_eq!(parse_ether("2"), Some(U512::from(2_000_000_000_000_000_000u128)));
        assert_eq!(parse_ether("0.0000000000000000019"), Some(U512::from(1u64)));
        assert_eq!(parse_ether("-3"), Some(U512::ZERO));
        assert_eq!(parse_ether("abc"), None);
        assert_eq!(parse_ether(""), None);
    }

    #[test]
    fn exponent_forms_parse() {
        assert_eq!(
            parse_ether("5e-1"),
            Some(U512::from(500_000_000_000_000_000u64))
        );
        assert_eq!(parse_ether("1E2"), Some(U512::from(100u64) * pow10(18)));
    }

    #[test]
    fn oversized_amounts_exceed_every_u256() {
        let beyond = widen(U256::MAX);
        for raw in ["100000000000000000000000000000", "1e29", "1e80", "inf"] {
            let parsed = parse_ether(raw).unwrap();
            assert!(parsed > beyond, "{raw} should exceed U256::MAX");
        }
        assert_eq!(parse_ether("-1e80"), Some(U512::ZERO));
        assert_eq!(parse_ether("NaN"), None);
    }

    #[test]
    fn widening_keeps_the_full_range() {
        assert_eq!(widen(U256::MAX).to_string(), U256::MAX.to_string());
        assert_eq!(format_units(widen(U256::from(15u64)), 1, 1), "1.5");
    }

    #[test]
    fn day_names_start_on_sunday() {
        assert_eq!(day_name(0), "Sunday");
        assert_eq!(day_name(6), "Saturday");
        assert_eq!(day_name(7), "Unknown");
    }
}
