use primitive_types::U256;

const UNITS_PER_DISPLAY_DIGIT: u128 = 100_000_000_000_000; // 10^14
const FRACTION_DIGITS_SCALE: u32 = 10_000;

pub const ZERO_BALANCE: &str = "0.0000";

/// Render a smallest-unit balance (wei) in whole units with 4 decimals.
///
/// Accepts `0x`-prefixed hex as returned by `eth_getBalance` as well as decimal strings,
/// up to the 256 bits of an EVM quantity. Rounds half away from zero. Anything
/// unparseable is shown as [`ZERO_BALANCE`].
pub fn format_native_balance(raw: &str) -> String {
    match parse_smallest_unit(raw) {
        Some(wei) => format_wei(wei),
        None => {
            log::warn!("cannot parse balance '{}', showing zero", raw);
            ZERO_BALANCE.to_owned()
        }
    }
}

fn parse_smallest_unit(raw: &str) -> Option<U256> {
    let raw = raw.trim();

    let (digits, radix) = match raw.strip_prefix("0x").or_else(|| raw.strip_prefix("0X")) {
        Some(hex) => (hex, 16),
        None => (raw, 10),
    };

    // from_str_radix tolerates a sign, a quantity never carries one
    if digits.is_empty() || !digits.chars().all(|c| c.is_digit(radix)) {
        return None;
    }

    U256::from_str_radix(digits, radix).ok()
}

fn format_wei(wei: U256) -> String {
    let unit = U256::from(UNITS_PER_DISPLAY_DIGIT);
    let (mut ten_thousandths, remainder) = wei.div_mod(unit);
    if remainder >= unit / 2 {
        ten_thousandths += U256::one();
    }

    let (whole, fraction) = ten_thousandths.div_mod(U256::from(FRACTION_DIGITS_SCALE));

    format!("{}.{:04}", whole, fraction.low_u32())
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;
    use rust_decimal::{Decimal, RoundingStrategy};

    #[test]
    fn one_ether_in_hex() {
        assert_eq!(format_native_balance("0xDE0B6B3A7640000"), "1.0000");
    }

    #[test]
    fn zero() {
        assert_eq!(format_native_balance("0"), "0.0000");
        assert_eq!(format_native_balance("0x0"), "0.0000");
    }

    #[test]
    fn rounds_half_away_from_zero() {
        assert_eq!(format_native_balance("49999999999999"), "0.0000");
        assert_eq!(format_native_balance("50000000000000"), "0.0001");
        assert_eq!(format_native_balance("1234549999999999999"), "1.2345");
        assert_eq!(format_native_balance("1234550000000000000"), "1.2346");
        assert_eq!(format_native_balance("9999950000000000000"), "10.0000");
    }

    #[test]
    fn malformed_input_is_zero() {
        let too_wide = format!("0x1{}", "0".repeat(64));
        for raw in &[
            "",
            "0x",
            "-1",
            "+1",
            "0x+1",
            "0x-1",
            "0x+DE0B6B3A7640000",
            "0xZZ",
            "1.5",
            "balance",
            too_wide.as_str(),
        ] {
            assert_eq!(format_native_balance(raw), ZERO_BALANCE, "input: {:?}", raw);
        }
    }

    #[test]
    fn balances_beyond_128_bits_are_formatted() {
        assert_eq!(
            format_native_balance("0x100000000000000000000000000000000"),
            "340282366920938463463.3746"
        );
        assert_eq!(
            format_native_balance(&format!("0x{}", "f".repeat(64))),
            "115792089237316195423570985008687907853269984665640564039457.5840"
        );
    }

    fn any_quantity() -> impl Strategy<Value = U256> {
        (any::<u128>(), any::<u128>())
            .prop_map(|(high, low)| (U256::from(high) << 128usize) | U256::from(low))
    }

    /// Splits off the whole units first, so only the fraction is rounded.
    fn expected_display(wei: U256) -> String {
        let (whole, fraction) = wei.div_mod(U256::from(10u128.pow(18)));
        let fraction = fraction.low_u128();

        let mut ten_thousandths = fraction / UNITS_PER_DISPLAY_DIGIT;
        if fraction % UNITS_PER_DISPLAY_DIGIT >= UNITS_PER_DISPLAY_DIGIT / 2 {
            ten_thousandths += 1;
        }

        if ten_thousandths == 10_000 {
            format!("{}.0000", whole + U256::one())
        } else {
            format!("{}.{:04}", whole, ten_thousandths)
        }
    }

    proptest! {
        #[test]
        fn always_renders_four_decimals(wei in any_quantity()) {
            let formatted = format_native_balance(&wei.to_string());

            let (whole, fraction) = formatted.split_once('.').unwrap();
            prop_assert!(!whole.is_empty() && whole.chars().all(|c| c.is_ascii_digit()));
            prop_assert!(fraction.len() == 4 && fraction.chars().all(|c| c.is_ascii_digit()));
        }

        // Decimal holds 96 bit mantissas, far more than any account balance.
        #[test]
        fn matches_decimal_division(wei in 0u128..(1u128 << 96)) {
            let exact = Decimal::from_i128_with_scale(wei as i128, 18);
            let expected = exact.round_dp_with_strategy(4, RoundingStrategy::MidpointAwayFromZero);

            prop_assert_eq!(format_native_balance(&wei.to_string()), format!("{:.4}", expected));
        }

        #[test]
        fn matches_whole_and_fraction_split(wei in any_quantity()) {
            prop_assert_eq!(format_native_balance(&wei.to_string()), expected_display(wei));
        }

        #[test]
        fn hex_and_decimal_agree(wei in any_quantity()) {
            prop_assert_eq!(
                format_native_balance(&format!("0x{:x}", wei)),
                format_native_balance(&wei.to_string())
            );
        }
    }
}
