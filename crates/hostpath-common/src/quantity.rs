//! Kubernetes resource quantities.
//!
//! A quantity is a signed decimal number followed by an optional suffix:
//! a binary SI unit (`Ki` .. `Ei`), a decimal SI unit (`n`, `u`, `m`, `k`,
//! `M` .. `E`), or a decimal exponent (`e3`, `E-2`). The written form is
//! kept verbatim so it round-trips into the provisioned volume unchanged.

use std::fmt;

use serde::{Deserialize, Deserializer, Serialize, Serializer};

use crate::error::{ProvisionerError, Result};

/// A resource quantity as written in a manifest, e.g. `"10Gi"`.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Quantity(String);

/// Scale applied by a quantity suffix.
enum Scale {
    /// Multiply by `1024^n`.
    Binary(u32),
    /// Multiply by `10^n`.
    Decimal(i32),
}

impl Quantity {
    /// Wraps a quantity string without validating it.
    #[must_use]
    pub fn new(raw: impl Into<String>) -> Self {
        Self(raw.into())
    }

    /// Returns the quantity as written.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Returns the quantity as a whole number, rounding fractions up.
    ///
    /// `"1Gi"` is `1_073_741_824`, `"1.5k"` is `1500`, `"100m"` is `1`.
    ///
    /// # Errors
    ///
    /// Returns [`ProvisionerError::InvalidQuantity`] if the string is not a
    /// well-formed quantity or its value does not fit in an `i64`.
    pub fn value(&self) -> Result<i64> {
        let raw = self.0.trim();
        let invalid = |reason| ProvisionerError::InvalidQuantity {
            quantity: self.0.clone(),
            reason,
        };

        let (negative, unsigned) = match raw.as_bytes().first() {
            Some(b'-') => (true, &raw[1..]),
            Some(b'+') => (false, &raw[1..]),
            Some(_) => (false, raw),
            None => return Err(invalid("empty quantity")),
        };

        let number_len = unsigned
            .find(|c: char| !c.is_ascii_digit() && c != '.')
            .unwrap_or(unsigned.len());
        let (number, suffix) = unsigned.split_at(number_len);

        let (whole, fraction) = number.split_once('.').unwrap_or((number, ""));
        if whole.is_empty() && fraction.is_empty() {
            return Err(invalid("missing digits"));
        }
        if fraction.contains('.') {
            return Err(invalid("more than one decimal point"));
        }
        // Trailing fraction zeros carry no value.
        let fraction = fraction.trim_end_matches('0');

        let scale = parse_suffix(suffix).ok_or_else(|| invalid("unknown suffix"))?;

        let mut mantissa: i128 = 0;
        for digit in whole.bytes().chain(fraction.bytes()) {
            mantissa = mantissa
                .checked_mul(10)
                .and_then(|m| m.checked_add(i128::from(digit - b'0')))
                .ok_or_else(|| invalid("value out of range"))?;
        }
        if negative {
            mantissa = -mantissa;
        }

        let fraction_digits =
            i32::try_from(fraction.len()).map_err(|_| invalid("value out of range"))?;
        let (multiplier, decimal_shift) = match scale {
            Scale::Binary(power) => (1024_i128.checked_pow(power), Some(-fraction_digits)),
            Scale::Decimal(exponent) => (Some(1), exponent.checked_sub(fraction_digits)),
        };
        let multiplier = multiplier.ok_or_else(|| invalid("value out of range"))?;
        let decimal_shift = decimal_shift.ok_or_else(|| invalid("value out of range"))?;

        let scaled = if decimal_shift >= 0 {
            10_i128
                .checked_pow(decimal_shift.unsigned_abs())
                .and_then(|p| p.checked_mul(multiplier))
                .and_then(|factor| mantissa.checked_mul(factor))
                .ok_or_else(|| invalid("value out of range"))?
        } else {
            let numerator = mantissa
                .checked_mul(multiplier)
                .ok_or_else(|| invalid("value out of range"))?;
            match 10_i128.checked_pow(decimal_shift.unsigned_abs()) {
                Some(denominator) => div_ceil(numerator, denominator),
                // Denominator exceeds any representable numerator.
                None => i128::from(numerator > 0),
            }
        };

        i64::try_from(scaled).map_err(|_| invalid("value out of range"))
    }
}

fn parse_suffix(suffix: &str) -> Option<Scale> {
    let scale = match suffix {
        "Ki" => Scale::Binary(1),
        "Mi" => Scale::Binary(2),
        "Gi" => Scale::Binary(3),
        "Ti" => Scale::Binary(4),
        "Pi" => Scale::Binary(5),
        "Ei" => Scale::Binary(6),
        "n" => Scale::Decimal(-9),
        "u" => Scale::Decimal(-6),
        "m" => Scale::Decimal(-3),
        "" => Scale::Decimal(0),
        "k" => Scale::Decimal(3),
        "M" => Scale::Decimal(6),
        "G" => Scale::Decimal(9),
        "T" => Scale::Decimal(12),
        "P" => Scale::Decimal(15),
        "E" => Scale::Decimal(18),
        _ => {
            let exponent = suffix.strip_prefix(['e', 'E'])?;
            let digits = exponent.strip_prefix(['+', '-']).unwrap_or(exponent);
            if digits.is_empty() || !digits.bytes().all(|b| b.is_ascii_digit()) {
                return None;
            }
            Scale::Decimal(exponent.parse().ok()?)
        }
    };
    Some(scale)
}

const fn div_ceil(numerator: i128, denominator: i128) -> i128 {
    let quotient = numerator / denominator;
    if numerator % denominator > 0 {
        quotient + 1
    } else {
        quotient
    }
}

impl fmt::Display for Quantity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for Quantity {
    fn from(raw: &str) -> Self {
        Self::new(raw)
    }
}

impl Serialize for Quantity {
    fn serialize<S: Serializer>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error> {
        serializer.serialize_str(&self.0)
    }
}

impl<'de> Deserialize<'de> for Quantity {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> std::result::Result<Self, D::Error> {
        // Manifests write bare byte counts as integers.
        #[derive(Deserialize)]
        #[serde(untagged)]
        enum Raw {
            Text(String),
            Signed(i64),
            Unsigned(u64),
        }

        Ok(match Raw::deserialize(deserializer)? {
            Raw::Text(text) => Self(text),
            Raw::Signed(n) => Self(n.to_string()),
            Raw::Unsigned(n) => Self(n.to_string()),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn value(raw: &str) -> i64 {
        Quantity::new(raw).value().expect("valid quantity")
    }

    #[test]
    fn binary_suffixes() {
        assert_eq!(value("1Ki"), 1024);
        assert_eq!(value("1Gi"), 1_073_741_824);
        assert_eq!(value("10Gi"), 10_737_418_240);
        assert_eq!(value("1.5Gi"), 1_610_612_736);
    }

    #[test]
    fn decimal_suffixes_and_plain_numbers() {
        assert_eq!(value("1G"), 1_000_000_000);
        assert_eq!(value("500M"), 500_000_000);
        assert_eq!(value("1.5k"), 1500);
        assert_eq!(value("1073741824"), 1_073_741_824);
        assert_eq!(value("+42"), 42);
    }

    #[test]
    fn exponents() {
        assert_eq!(value("2e3"), 2000);
        assert_eq!(value("1E6"), 1_000_000);
        assert_eq!(value("5e-1"), 1);
    }

    #[test]
    fn fractions_round_up() {
        assert_eq!(value("100m"), 1);
        assert_eq!(value("0.1"), 1);
        assert_eq!(value("1n"), 1);
        assert_eq!(value("0"), 0);
        assert_eq!(value("1e-60"), 1);
    }

    #[test]
    fn negative_values_parse() {
        assert_eq!(value("-1Gi"), -1_073_741_824);
        assert_eq!(value("-100m"), 0);
    }

    #[test]
    fn malformed_quantities_are_rejected() {
        for raw in ["", "Gi", "1.2.3", "1 Gi", "1GB", "1e", "1e+", "abc", "."] {
            let result = Quantity::new(raw).value();
            assert!(
                matches!(result, Err(ProvisionerError::InvalidQuantity { .. })),
                "{raw:?} should be rejected"
            );
        }
    }

    #[test]
    fn overflow_is_rejected() {
        let result = Quantity::new("16Ei").value();
        assert!(matches!(result, Err(ProvisionerError::InvalidQuantity { .. })));
    }

    #[test]
    fn extreme_negative_exponent_is_rejected() {
        let result = Quantity::new("1.5e-2147483648").value();
        assert!(matches!(result, Err(ProvisionerError::InvalidQuantity { .. })));
    }

    #[test]
    fn trailing_fraction_zeros_do_not_overflow() {
        let raw = format!("1.{}", "0".repeat(40));
        assert_eq!(value(&raw), 1);
        assert_eq!(value(&format!("2.5{}Gi", "0".repeat(40))), 2_684_354_560);
        assert_eq!(value("1.000k"), 1000);
    }

    #[test]
    fn deserializes_strings_and_integers() {
        let text: Quantity = serde_json::from_str("\"10Gi\"").expect("string");
        assert_eq!(text.as_str(), "10Gi");
        let number: Quantity = serde_json::from_str("2048").expect("integer");
        assert_eq!(number.as_str(), "2048");
        assert_eq!(serde_json::to_string(&text).expect("serialize"), "\"10Gi\"");
    }
}
