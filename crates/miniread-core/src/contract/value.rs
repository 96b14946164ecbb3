//! Decoded contract return values.
//!
//! [`ReadValue`] has two JSON renderings:
//!
//! - its serde form, used for cache payloads, keeps every integer as a decimal string so
//!   values wider than 53 bits survive a round trip through JSON;
//! - [`ReadValue::to_json_safe`], used at the HTTP boundary, emits narrow integers (up to
//!   48 bits) as JSON numbers and wider ones as decimal strings.

use alloy_dyn_abi::DynSolValue;
use alloy_primitives::{hex, Address, Bytes, I256, U256};
use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::contract::ContractError;

/// Widest integer type rendered as a JSON number by [`ReadValue::to_json_safe`].
pub const MAX_SAFE_INT_BITS: usize = 48;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", content = "data", rename_all = "snake_case")]
pub enum ReadValue {
    Bool(bool),
    Uint {
        #[serde(with = "decimal_u256")]
        value: U256,
        bits: usize,
    },
    Int {
        #[serde(with = "decimal_i256")]
        value: I256,
        bits: usize,
    },
    Address(Address),
    FixedBytes(Bytes),
    Bytes(Bytes),
    String(String),
    Array(Vec<ReadValue>),
    Tuple(Vec<ReadValue>),
}

impl ReadValue {
    /// Shapes decoded outputs: one output is returned as is, anything else as a tuple.
    #[must_use]
    pub fn from_outputs(mut outputs: Vec<ReadValue>) -> Self {
        if outputs.len() == 1 {
            outputs.remove(0)
        } else {
            Self::Tuple(outputs)
        }
    }

    /// JSON rendering for HTTP responses.
    #[must_use]
    pub fn to_json_safe(&self) -> Value {
        match self {
            Self::Bool(b) => Value::Bool(*b),
            Self::Uint { value, bits } => {
                if *bits <= MAX_SAFE_INT_BITS {
                    if let Ok(n) = u64::try_from(*value) {
                        return Value::from(n);
                    }
                }
                Value::String(value.to_string())
            }
            Self::Int { value, bits } => {
                if *bits <= MAX_SAFE_INT_BITS {
                    if let Ok(n) = i64::try_from(*value) {
                        return Value::from(n);
                    }
                }
                Value::String(value.to_string())
            }
            Self::Address(address) => Value::String(address.to_checksum(None)),
            Self::FixedBytes(bytes) | Self::Bytes(bytes) => {
                Value::String(hex::encode_prefixed(bytes))
            }
            Self::String(s) => Value::String(s.clone()),
            Self::Array(items) | Self::Tuple(items) => {
                Value::Array(items.iter().map(Self::to_json_safe).collect())
            }
        }
    }

    #[must_use]
    pub fn as_str(&self) -> Option<&str> {
        match self {
            Self::String(s) => Some(s),
            _ => None,
        }
    }

    #[must_use]
    pub fn as_u256(&self) -> Option<U256> {
        match self {
            Self::Uint { value, .. } => Some(*value),
            _ => None,
        }
    }
}

impl TryFrom<DynSolValue> for ReadValue {
    type Error = ContractError;

    fn try_from(value: DynSolValue) -> Result<Self, Self::Error> {
        let collect = |items: Vec<DynSolValue>| {
            items.into_iter().map(Self::try_from).collect::<Result<Vec<_>, _>>()
        };

        Ok(match value {
            DynSolValue::Bool(b) => Self::Bool(b),
            DynSolValue::Uint(value, bits) => Self::Uint { value, bits },
            DynSolValue::Int(value, bits) => Self::Int { value, bits },
            DynSolValue::Address(address) => Self::Address(address),
            DynSolValue::FixedBytes(word, size) => {
                Self::FixedBytes(Bytes::from(word[..size.min(32)].to_vec()))
            }
            DynSolValue::Function(function) => {
                Self::FixedBytes(Bytes::from(function.to_vec()))
            }
            DynSolValue::Bytes(bytes) => Self::Bytes(Bytes::from(bytes)),
            DynSolValue::String(s) => Self::String(s),
            DynSolValue::Array(items) | DynSolValue::FixedArray(items) => {
                Self::Array(collect(items)?)
            }
            DynSolValue::Tuple(items) => Self::Tuple(collect(items)?),
            #[allow(unreachable_patterns)]
            other => {
                return Err(ContractError::Decode(format!(
                    "unsupported return value: {other:?}"
                )))
            }
        })
    }
}

mod decimal_u256 {
    use alloy_primitives::U256;
    use serde::{de::Error, Deserialize, Deserializer, Serializer};

    pub fn serialize<S: Serializer>(value: &U256, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&value.to_string())
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(deserializer: D) -> Result<U256, D::Error> {
        let s = String::deserialize(deserializer)?;
        U256::from_str_radix(&s, 10).map_err(D::Error::custom)
    }
}

mod decimal_i256 {
    use alloy_primitives::I256;
    use serde::{de::Error, Deserialize, Deserializer, Serializer};

    pub fn serialize<S: Serializer>(value: &I256, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&value.to_string())
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(deserializer: D) -> Result<I256, D::Error> {
        let s = String::deserialize(deserializer)?;
        I256::from_dec_str(&s).map_err(D::Error::custom)
    }
}
