//! Arbitrary precision token amounts
//!
//! Amounts travel as decimal strings on the wire (the explorer and the
//! signing-session peers both use them) and are accepted as JSON numbers too.

use num_bigint::BigUint;
use serde::{Deserialize, Deserializer, Serializer};

pub type Amount = BigUint;

/// Id of the native asset. Token amounts carrying this id count as native.
pub const NATIVE_ASSET_ID: &str = "0000000000000000000000000000000000000000000000000000000000000000";

pub fn zero() -> Amount {
    BigUint::default()
}

/// Parse a decimal amount.
pub fn parse(raw: &str) -> Option<Amount> {
    raw.trim().parse::<BigUint>().ok()
}

/// Parse a decimal amount, reading anything malformed as zero.
pub fn parse_or_zero(raw: &str) -> Amount {
    parse(raw).unwrap_or_else(|| {
        log::warn!("Malformed amount '{}', counting it as 0", raw);
        zero()
    })
}

/// `a - b`, clamped at zero.
pub fn saturating_sub(a: &Amount, b: &Amount) -> Amount {
    if a > b {
        a - b
    } else {
        zero()
    }
}

#[derive(Deserialize)]
#[serde(untagged)]
enum RawAmount {
    Str(String),
    Num(u64),
}

impl RawAmount {
    fn into_amount<E: serde::de::Error>(self) -> Result<Amount, E> {
        match self {
            RawAmount::Str(s) => {
                parse(&s).ok_or_else(|| E::custom(format!("invalid amount '{}'", s)))
            }
            RawAmount::Num(n) => Ok(BigUint::from(n)),
        }
    }
}

/// `#[serde(with = "crate::amount::string")]`
pub mod string {
    use super::*;

    pub fn serialize<S: Serializer>(amount: &Amount, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&amount.to_string())
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(deserializer: D) -> Result<Amount, D::Error> {
        RawAmount::deserialize(deserializer)?.into_amount()
    }
}

/// `#[serde(default, with = "crate::amount::option")]`
pub mod option {
    use super::*;

    pub fn serialize<S: Serializer>(
        amount: &Option<Amount>,
        serializer: S,
    ) -> Result<S::Ok, S::Error> {
        match amount {
            Some(a) => serializer.serialize_some(&a.to_string()),
            None => serializer.serialize_none(),
        }
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(
        deserializer: D,
    ) -> Result<Option<Amount>, D::Error> {
        match Option::<RawAmount>::deserialize(deserializer)? {
            Some(raw) => raw.into_amount().map(Some),
            None => Ok(None),
        }
    }
}
