//! Deterministic cache key construction.
//!
//! Every key has the shape `{prefix}:{namespace}:{part1}:{part2}:...` with the global
//! prefix [`CACHE_PREFIX`] and the delimiter [`KEY_DELIMITER`]. Parts are ordered, so
//! `(chain, address, function, args)` and `(address, chain, function, args)` produce
//! different keys.
//!
//! Parts are rendered with [`Display`] and are not escaped. A part that itself contains
//! `:` can make two logically different inputs share a key; callers pick parts that
//! cannot contain the delimiter (numbers, hex addresses, identifiers, [`hash_args`]
//! tokens).

use base64::{engine::general_purpose::URL_SAFE_NO_PAD, Engine};
use serde_json::Value;
use sha2::{Digest, Sha256};
use std::fmt::{self, Display, Write};

/// Global prefix shared by every key written by this crate.
pub const CACHE_PREFIX: &str = "cache";

/// Separator between the prefix, the namespace and each part.
pub const KEY_DELIMITER: char = ':';

/// Token used by [`hash_args`] for an empty argument list.
pub const NO_ARGS_TOKEN: &str = "noargs";

/// Length of the token produced by [`hash_args`] for non-empty argument lists.
pub const ARGS_TOKEN_LEN: usize = 20;

/// Namespaces in use. Changing one orphans every entry written under the old value.
pub mod namespaces {
    /// Contract reads: `cache:contract:read:{chainId}:{address}:{function}:{argsHash}`.
    pub const CONTRACT_READ: &str = "contract:read";

    /// Identity API users: `cache:neynar:user:{fid}`.
    pub const PROFILE_USER: &str = "neynar:user";
}

/// An opaque, fully-qualified cache key.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct CacheKey(String);

impl CacheKey {
    /// Starts a key in the given namespace.
    #[must_use]
    pub fn builder(namespace: &str) -> CacheKeyBuilder {
        let mut buf = String::with_capacity(CACHE_PREFIX.len() + namespace.len() + 64);
        buf.push_str(CACHE_PREFIX);
        buf.push(KEY_DELIMITER);
        buf.push_str(namespace);
        CacheKeyBuilder { buf }
    }

    /// Wraps an already-built key, e.g. one typed by an operator.
    #[must_use]
    pub fn from_raw(key: impl Into<String>) -> Self {
        Self(key.into())
    }

    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl Display for CacheKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl AsRef<str> for CacheKey {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

/// Appends ordered parts to a [`CacheKey`].
#[derive(Debug, Clone)]
pub struct CacheKeyBuilder {
    buf: String,
}

impl CacheKeyBuilder {
    #[must_use]
    pub fn part(mut self, part: impl Display) -> Self {
        self.buf.push(KEY_DELIMITER);
        // Writing into a String cannot fail.
        let _ = write!(self.buf, "{part}");
        self
    }

    #[must_use]
    pub fn build(self) -> CacheKey {
        CacheKey(self.buf)
    }
}

/// Rewrites integral numbers as decimal strings, recursively.
///
/// Two argument lists that carry the same integer in different representations (a JSON
/// number and its decimal string) canonicalize to the same value. Floats, booleans,
/// strings and nulls are left as they are. Object keys come out ordered because
/// `serde_json::Map` is ordered.
#[must_use]
pub fn canonicalize_args(args: &[Value]) -> Vec<Value> {
    args.iter().map(canonicalize_value).collect()
}

fn canonicalize_value(value: &Value) -> Value {
    match value {
        Value::Number(n) => {
            if let Some(u) = n.as_u64() {
                Value::String(u.to_string())
            } else if let Some(i) = n.as_i64() {
                Value::String(i.to_string())
            } else {
                value.clone()
            }
        }
        Value::Array(items) => Value::Array(items.iter().map(canonicalize_value).collect()),
        Value::Object(map) => Value::Object(
            map.iter().map(|(k, v)| (k.clone(), canonicalize_value(v))).collect(),
        ),
        Value::Null | Value::Bool(_) | Value::String(_) => value.clone(),
    }
}

/// Produces a short key-safe token for an ordered argument list.
///
/// An empty list maps to [`NO_ARGS_TOKEN`]. Anything else is canonicalized, serialized
/// to JSON, hashed with SHA-256, encoded with the URL-safe base64 alphabet and cut to
/// [`ARGS_TOKEN_LEN`] characters. The token never contains [`KEY_DELIMITER`].
#[must_use]
pub fn hash_args(args: &[Value]) -> String {
    if args.is_empty() {
        return NO_ARGS_TOKEN.to_string();
    }

    let canonical = Value::Array(canonicalize_args(args));
    // Display on a Value is its compact JSON serialization.
    let digest = Sha256::digest(canonical.to_string().as_bytes());
    let mut token = URL_SAFE_NO_PAD.encode(digest);
    token.truncate(ARGS_TOKEN_LEN);
    token
}
