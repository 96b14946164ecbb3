use alloy_primitives::Address;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use std::fmt;
use thiserror::Error;

use crate::{cache::MAX_TTL_SECONDS, contract::ReadRequest};

const ADDRESS_HEX_LEN: usize = 40;

/// One problem found in a request body.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ValidationIssue {
    /// Machine-readable category, e.g. `invalid_type`.
    pub code: String,
    /// Location of the offending field, outermost first.
    pub path: Vec<String>,
    pub message: String,
}

impl ValidationIssue {
    fn new(code: &str, path: &[&str], message: impl Into<String>) -> Self {
        Self {
            code: code.to_string(),
            path: path.iter().map(|p| (*p).to_string()).collect(),
            message: message.into(),
        }
    }

    fn invalid_type(path: &[&str], expected: &str, found: Option<&Value>) -> Self {
        let found = match found {
            None => "undefined",
            Some(Value::Null) => "null",
            Some(Value::Bool(_)) => "boolean",
            Some(Value::Number(_)) => "number",
            Some(Value::String(_)) => "string",
            Some(Value::Array(_)) => "array",
            Some(Value::Object(_)) => "object",
        };
        Self::new("invalid_type", path, format!("Expected {expected}, received {found}"))
    }
}

impl fmt::Display for ValidationIssue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.path.is_empty() {
            write!(f, "{}", self.message)
        } else {
            write!(f, "{}: {}", self.path.join("."), self.message)
        }
    }
}

/// Every issue found in a rejected request.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
#[error("invalid request: {}", summarize(.issues))]
pub struct ValidationError {
    pub issues: Vec<ValidationIssue>,
}

impl ValidationError {
    #[must_use]
    pub fn single(code: &str, path: &[&str], message: impl Into<String>) -> Self {
        Self { issues: vec![ValidationIssue::new(code, path, message)] }
    }

    /// The error for a body that is not JSON at all.
    #[must_use]
    pub fn invalid_json(reason: impl fmt::Display) -> Self {
        Self::single("invalid_json", &[], format!("Request body is not valid JSON: {reason}"))
    }

    #[must_use]
    pub fn mentions(&self, field: &str) -> bool {
        self.issues.iter().any(|i| i.path.first().is_some_and(|p| p == field))
    }
}

fn summarize(issues: &[ValidationIssue]) -> String {
    issues.iter().map(ToString::to_string).collect::<Vec<_>>().join("; ")
}

/// Checks `^0x[a-fA-F0-9]{40}$`.
#[must_use]
pub fn is_hex_address(value: &str) -> bool {
    value
        .strip_prefix("0x")
        .is_some_and(|hex| hex.len() == ADDRESS_HEX_LEN && hex.chars().all(|c| c.is_ascii_hexdigit()))
}

/// Validates a contract read body and turns it into a [`ReadRequest`].
///
/// All fields are checked and every problem is reported, not just the first.
///
/// # Errors
///
/// Returns [`ValidationError`] listing each offending field.
pub fn validate_read_request(body: &Value) -> Result<ReadRequest, ValidationError> {
    let Some(obj) = body.as_object() else {
        return Err(ValidationError {
            issues: vec![ValidationIssue::invalid_type(&[], "object", Some(body))],
        });
    };

    let mut issues = Vec::new();

    let chain_id = match obj.get("chainId") {
        Some(Value::Number(n)) => match n.as_u64() {
            Some(id) => Some(id),
            None => {
                issues.push(ValidationIssue::new(
                    "invalid_number",
                    &["chainId"],
                    "Expected a non-negative integer",
                ));
                None
            }
        },
        other => {
            issues.push(ValidationIssue::invalid_type(&["chainId"], "number", other));
            None
        }
    };

    let address = match obj.get("address") {
        Some(Value::String(s)) if is_hex_address(s) => s.parse::<Address>().ok(),
        Some(Value::String(_)) => {
            issues.push(ValidationIssue::new(
                "invalid_string",
                &["address"],
                "Invalid address: expected 0x followed by 40 hex characters",
            ));
            None
        }
        other => {
            issues.push(ValidationIssue::invalid_type(&["address"], "string", other));
            None
        }
    };

    let abi = match obj.get("abi") {
        Some(Value::Array(items)) => {
            let mut fragments = Vec::with_capacity(items.len());
            for (i, item) in items.iter().enumerate() {
                match item {
                    Value::Object(fragment) => fragments.push(fragment.clone()),
                    other => {
                        let index = i.to_string();
                        issues.push(ValidationIssue::invalid_type(
                            &["abi", &index],
                            "object",
                            Some(other),
                        ));
                    }
                }
            }
            Some(fragments)
        }
        other => {
            issues.push(ValidationIssue::invalid_type(&["abi"], "array", other));
            None
        }
    };

    let function_name = match obj.get("functionName") {
        Some(Value::String(s)) => Some(s.clone()),
        other => {
            issues.push(ValidationIssue::invalid_type(&["functionName"], "string", other));
            None
        }
    };

    let args = optional_field(obj, "args", &mut issues, |value| match value {
        Value::Array(items) => Ok(items.clone()),
        other => Err(ValidationIssue::invalid_type(&["args"], "array", Some(other))),
    });

    let ttl = optional_field(obj, "ttl", &mut issues, |value| match value {
        Value::Number(n) => match n.as_u64().filter(|t| *t > 0) {
            Some(ttl) if ttl > MAX_TTL_SECONDS => Err(ValidationIssue::new(
                "too_big",
                &["ttl"],
                format!("Expected at most {MAX_TTL_SECONDS} seconds"),
            )),
            Some(ttl) => Ok(ttl),
            None => Err(ValidationIssue::new("too_small", &["ttl"], "Expected a positive integer")),
        },
        other => Err(ValidationIssue::invalid_type(&["ttl"], "number", Some(other))),
    });

    match (chain_id, address, abi, function_name) {
        (Some(chain_id), Some(address), Some(abi), Some(function_name)) if issues.is_empty() => {
            let mut request =
                ReadRequest::new(chain_id, address, abi, function_name)
                    .with_args(args.unwrap_or_default());
            request.ttl = ttl;
            Ok(request)
        }
        _ => Err(ValidationError { issues }),
    }
}

/// Absent and `null` both mean "not provided".
fn optional_field<T>(
    obj: &Map<String, Value>,
    name: &str,
    issues: &mut Vec<ValidationIssue>,
    parse: impl FnOnce(&Value) -> Result<T, ValidationIssue>,
) -> Option<T> {
    match obj.get(name) {
        None | Some(Value::Null) => None,
        Some(value) => match parse(value) {
            Ok(parsed) => Some(parsed),
            Err(issue) => {
                issues.push(issue);
                None
            }
        },
    }
}
