//! Serde adapters for integers that arrive either as JSON numbers or as strings.
//!
//! Off-chain packages come from JavaScript tooling where `bigint` values are stringified, so the
//! deserializers accept a JSON number, a decimal string or a `0x`-prefixed hex string.

use core::fmt;
use core::str::FromStr;

use alloy_primitives::U256;
use serde::de::{self, Visitor};

/// `U256` written as a decimal string.
pub mod u256_string {
    use super::*;
    use serde::{Deserializer, Serializer};

    pub fn serialize<S: Serializer>(value: &U256, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_str(value)
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(deserializer: D) -> Result<U256, D::Error> {
        deserializer.deserialize_any(U256Visitor)
    }

    struct U256Visitor;

    impl<'de> Visitor<'de> for U256Visitor {
        type Value = U256;

        fn expecting(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
            f.write_str("an unsigned integer or a decimal/hex string")
        }

        fn visit_u64<E: de::Error>(self, v: u64) -> Result<U256, E> {
            Ok(U256::from(v))
        }

        fn visit_i64<E: de::Error>(self, v: i64) -> Result<U256, E> {
            u64::try_from(v)
                .map(U256::from)
                .map_err(|_| E::custom(format!("negative integer {v}")))
        }

        fn visit_str<E: de::Error>(self, v: &str) -> Result<U256, E> {
            U256::from_str(v.trim()).map_err(|e| E::custom(format!("invalid u256 {v:?}: {e}")))
        }
    }
}

/// `u64` written as a JSON number.
pub mod u64_number {
    use super::*;
    use serde::{Deserializer, Serializer};

    pub fn serialize<S: Serializer>(value: &u64, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_u64(*value)
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(deserializer: D) -> Result<u64, D::Error> {
        deserializer.deserialize_any(U64Visitor)
    }

    struct U64Visitor;

    impl<'de> Visitor<'de> for U64Visitor {
        type Value = u64;

        fn expecting(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
            f.write_str("an unsigned 64-bit integer or a decimal/hex string")
        }

        fn visit_u64<E: de::Error>(self, v: u64) -> Result<u64, E> {
            Ok(v)
        }

        fn visit_i64<E: de::Error>(self, v: i64) -> Result<u64, E> {
            u64::try_from(v).map_err(|_| E::custom(format!("negative integer {v}")))
        }

        fn visit_f64<E: de::Error>(self, v: f64) -> Result<u64, E> {
            super::integral_f64_to_u64(v).ok_or_else(|| E::custom(format!("non-integral number {v}")))
        }

        fn visit_str<E: de::Error>(self, v: &str) -> Result<u64, E> {
            super::parse_u64(v).ok_or_else(|| E::custom(format!("invalid u64 {v:?}")))
        }
    }
}

/// Exact `u64` value of a finite, non-negative, integral double that is below 2^64.
pub fn integral_f64_to_u64(f: f64) -> Option<u64> {
    (f.is_finite() && f >= 0.0 && f.fract() == 0.0 && f < 18_446_744_073_709_551_616.0)
        .then(|| f as u64)
}

/// Parse a decimal or `0x`-prefixed hex string into a `u64`.
pub fn parse_u64(s: &str) -> Option<u64> {
    let s = s.trim();
    match s.strip_prefix("0x").or_else(|| s.strip_prefix("0X")) {
        Some(hex) => u64::from_str_radix(hex, 16).ok(),
        None => s.parse().ok(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde::{Deserialize, Serialize};

    #[derive(Debug, PartialEq, Serialize, Deserialize)]
    struct Sample {
        #[serde(with = "super::u256_string")]
        chain: U256,
        #[serde(with = "super::u64_number")]
        time: u64,
    }

    #[test]
    fn test_accepts_numbers_and_strings() {
        let from_numbers: Sample = serde_json::from_str(r#"{"chain":11155111,"time":1000}"#).unwrap();
        let from_strings: Sample =
            serde_json::from_str(r#"{"chain":"11155111","time":"0x3e8"}"#).unwrap();
        assert_eq!(from_numbers, from_strings);
        assert_eq!(from_numbers.chain, U256::from(11155111u64));
        assert_eq!(from_numbers.time, 1000);
    }

    #[test]
    fn test_u256_serializes_as_decimal_string() {
        let sample = Sample { chain: U256::from(10u64).pow(U256::from(30u64)), time: 7 };
        let json = serde_json::to_value(&sample).unwrap();
        assert_eq!(json["chain"], "1000000000000000000000000000000");
        assert_eq!(json["time"], 7);
    }

    #[test]
    fn test_rejects_negative_time() {
        assert!(serde_json::from_str::<Sample>(r#"{"chain":1,"time":-5}"#).is_err());
    }

    #[test]
    fn test_accepts_integral_doubles() {
        let sample: Sample = serde_json::from_str(r#"{"chain":1,"time":1e3}"#).unwrap();
        assert_eq!(sample.time, 1000);
        let sample: Sample = serde_json::from_str(r#"{"chain":1,"time":1e18}"#).unwrap();
        assert_eq!(sample.time, 1_000_000_000_000_000_000);

        assert!(serde_json::from_str::<Sample>(r#"{"chain":1,"time":1.5}"#).is_err());
        assert!(serde_json::from_str::<Sample>(r#"{"chain":1,"time":1e20}"#).is_err());
    }

    #[test]
    fn test_integral_f64_to_u64() {
        assert_eq!(integral_f64_to_u64(0.0), Some(0));
        assert_eq!(integral_f64_to_u64(9_007_199_254_740_992.0), Some(9_007_199_254_740_992));
        assert_eq!(integral_f64_to_u64(-1.0), None);
        assert_eq!(integral_f64_to_u64(f64::NAN), None);
        assert_eq!(integral_f64_to_u64(18_446_744_073_709_551_616.0), None);
    }

    #[test]
    fn test_parse_u64() {
        assert_eq!(parse_u64("42"), Some(42));
        assert_eq!(parse_u64("0x2a"), Some(42));
        assert_eq!(parse_u64("forty-two"), None);
        assert_eq!(parse_u64("18446744073709551616"), None);
    }
}
