//! Loosely typed ABI fragments to typed calls.
//!
//! Callers send ABI fragments as plain JSON objects. Only the fragments describing the
//! requested function are parsed; events, errors and unrelated functions are ignored.
//! A fragment without `type` is a function; missing `inputs`/`outputs` are empty and a
//! missing `stateMutability` is `view`.

use alloy_dyn_abi::{DynSolType, DynSolValue, Specifier};
use alloy_json_abi::{Function, Param, StateMutability};
use alloy_primitives::{hex, Address, B256};
use serde_json::{Map, Value};

use crate::contract::ContractError;

/// One ABI entry as received on the wire.
pub type AbiFragment = Map<String, Value>;

/// Picks the function called `name` that takes `arg_count` arguments.
///
/// # Errors
///
/// - [`ContractError::FunctionNotFound`] if no function fragment has that name
/// - [`ContractError::InvalidAbi`] if a matching fragment is malformed
/// - [`ContractError::InvalidArguments`] if no overload takes `arg_count` arguments
pub fn select_function(
    abi: &[AbiFragment],
    name: &str,
    arg_count: usize,
) -> Result<Function, ContractError> {
    let mut candidates = Vec::new();
    for (index, fragment) in abi.iter().enumerate() {
        let kind = fragment.get("type").and_then(Value::as_str).unwrap_or("function");
        if kind != "function" || fragment.get("name").and_then(Value::as_str) != Some(name) {
            continue;
        }
        candidates.push(parse_function(fragment, index)?);
    }

    if candidates.is_empty() {
        return Err(ContractError::FunctionNotFound(name.to_string()));
    }

    let expected: Vec<String> = candidates.iter().map(|f| f.inputs.len().to_string()).collect();
    candidates.into_iter().find(|f| f.inputs.len() == arg_count).ok_or_else(|| {
        ContractError::InvalidArguments(format!(
            "function `{name}` takes {} argument(s), got {arg_count}",
            expected.join(" or ")
        ))
    })
}

fn parse_function(fragment: &AbiFragment, index: usize) -> Result<Function, ContractError> {
    let path = format!("abi[{index}]");
    let name = fragment
        .get("name")
        .and_then(Value::as_str)
        .ok_or_else(|| ContractError::InvalidAbi(format!("{path}.name must be a string")))?;

    let inputs = parse_params(fragment.get("inputs"), &format!("{path}.inputs"))?;
    let outputs = parse_params(fragment.get("outputs"), &format!("{path}.outputs"))?;
    let state_mutability = parse_state_mutability(fragment, &path)?;

    Ok(Function { name: name.to_string(), inputs, outputs, state_mutability })
}

fn parse_state_mutability(
    fragment: &AbiFragment,
    path: &str,
) -> Result<StateMutability, ContractError> {
    match fragment.get("stateMutability") {
        None | Some(Value::Null) => {
            // Pre-0.5 ABIs describe mutability with `constant` / `payable` flags.
            if fragment.get("payable").and_then(Value::as_bool) == Some(true) {
                Ok(StateMutability::Payable)
            } else if fragment.get("constant").and_then(Value::as_bool) == Some(false) {
                Ok(StateMutability::NonPayable)
            } else {
                Ok(StateMutability::View)
            }
        }
        Some(Value::String(s)) => match s.as_str() {
            "pure" => Ok(StateMutability::Pure),
            "view" => Ok(StateMutability::View),
            "nonpayable" => Ok(StateMutability::NonPayable),
            "payable" => Ok(StateMutability::Payable),
            other => Err(ContractError::InvalidAbi(format!(
                "{path}.stateMutability `{other}` is not recognised"
            ))),
        },
        Some(_) => Err(ContractError::InvalidAbi(format!("{path}.stateMutability must be a string"))),
    }
}

fn parse_params(value: Option<&Value>, path: &str) -> Result<Vec<Param>, ContractError> {
    match value {
        None | Some(Value::Null) => Ok(Vec::new()),
        Some(Value::Array(items)) => items
            .iter()
            .enumerate()
            .map(|(i, item)| parse_param(item, &format!("{path}[{i}]")))
            .collect(),
        Some(_) => Err(ContractError::InvalidAbi(format!("{path} must be an array"))),
    }
}

fn parse_param(value: &Value, path: &str) -> Result<Param, ContractError> {
    let obj = value
        .as_object()
        .ok_or_else(|| ContractError::InvalidAbi(format!("{path} must be an object")))?;

    let ty = obj
        .get("type")
        .and_then(Value::as_str)
        .ok_or_else(|| ContractError::InvalidAbi(format!("{path}.type must be a string")))?;
    let name = obj.get("name").and_then(Value::as_str).unwrap_or_default();
    let components = parse_params(obj.get("components"), &format!("{path}.components"))?;

    let param = Param {
        ty: ty.to_string(),
        name: name.to_string(),
        components,
        internal_type: None,
    };

    param
        .resolve()
        .map_err(|e| ContractError::InvalidAbi(format!("{path}: type `{ty}` is invalid: {e}")))?;
    Ok(param)
}

/// Converts JSON arguments into values of the function's input types.
///
/// Integers may be JSON numbers or decimal/hex strings. Addresses and byte strings are
/// hex strings. Tuples accept either a positional array or an object keyed by component
/// name.
///
/// # Errors
///
/// Returns [`ContractError::InvalidArguments`] naming the offending argument path.
pub fn coerce_args(function: &Function, args: &[Value]) -> Result<Vec<DynSolValue>, ContractError> {
    if function.inputs.len() != args.len() {
        return Err(ContractError::InvalidArguments(format!(
            "function `{}` takes {} argument(s), got {}",
            function.name,
            function.inputs.len(),
            args.len()
        )));
    }

    function
        .inputs
        .iter()
        .zip(args)
        .enumerate()
        .map(|(i, (param, arg))| {
            let ty = param.resolve().map_err(|e| ContractError::InvalidAbi(e.to_string()))?;
            coerce_value(&ty, &param.components, arg, &format!("args[{i}]"))
        })
        .collect()
}

fn coerce_value(
    ty: &DynSolType,
    components: &[Param],
    value: &Value,
    path: &str,
) -> Result<DynSolValue, ContractError> {
    let invalid = |msg: String| ContractError::InvalidArguments(format!("{path}: {msg}"));
    let type_name = ty.sol_type_name();

    match ty {
        DynSolType::Bool => match value {
            Value::Bool(b) => Ok(DynSolValue::Bool(*b)),
            Value::String(s) if s == "true" => Ok(DynSolValue::Bool(true)),
            Value::String(s) if s == "false" => Ok(DynSolValue::Bool(false)),
            _ => Err(invalid("expected a boolean".to_string())),
        },
        DynSolType::Int(_) | DynSolType::Uint(_) => {
            let text = match value {
                Value::Number(n) if n.is_i64() || n.is_u64() => n.to_string(),
                Value::String(s) => s.trim().to_string(),
                _ => return Err(invalid(format!("expected an integer for {type_name}"))),
            };
            ty.coerce_str(&text).map_err(|e| invalid(format!("`{text}` is not a valid {type_name}: {e}")))
        }
        DynSolType::Address => {
            let s = value.as_str().ok_or_else(|| invalid("expected an address string".into()))?;
            s.parse::<Address>()
                .map(DynSolValue::Address)
                .map_err(|_| invalid(format!("`{s}` is not a valid address")))
        }
        DynSolType::Bytes => {
            let s = value.as_str().ok_or_else(|| invalid("expected a hex string".into()))?;
            hex::decode(s).map(DynSolValue::Bytes).map_err(|e| invalid(format!("invalid hex: {e}")))
        }
        DynSolType::FixedBytes(size) => {
            let s = value.as_str().ok_or_else(|| invalid("expected a hex string".into()))?;
            let bytes = hex::decode(s).map_err(|e| invalid(format!("invalid hex: {e}")))?;
            if bytes.len() != *size {
                return Err(invalid(format!("expected {size} bytes, got {}", bytes.len())));
            }
            Ok(DynSolValue::FixedBytes(B256::right_padding_from(&bytes), *size))
        }
        DynSolType::String => match value {
            Value::String(s) => Ok(DynSolValue::String(s.clone())),
            _ => Err(invalid("expected a string".to_string())),
        },
        DynSolType::Array(inner) => {
            let items = value.as_array().ok_or_else(|| invalid("expected an array".into()))?;
            coerce_items(inner, components, items, path).map(DynSolValue::Array)
        }
        DynSolType::FixedArray(inner, len) => {
            let items = value.as_array().ok_or_else(|| invalid("expected an array".into()))?;
            if items.len() != *len {
                return Err(invalid(format!("expected {len} elements, got {}", items.len())));
            }
            coerce_items(inner, components, items, path).map(DynSolValue::FixedArray)
        }
        DynSolType::Tuple(types) => coerce_tuple(types, components, value, path),
        DynSolType::Function => {
            let s = value.as_str().ok_or_else(|| invalid("expected a hex string".into()))?;
            ty.coerce_str(s).map_err(|e| invalid(e.to_string()))
        }
        #[allow(unreachable_patterns)]
        _ => Err(invalid(format!("unsupported parameter type {type_name}"))),
    }
}

fn coerce_items(
    inner: &DynSolType,
    components: &[Param],
    items: &[Value],
    path: &str,
) -> Result<Vec<DynSolValue>, ContractError> {
    items
        .iter()
        .enumerate()
        .map(|(i, item)| coerce_value(inner, components, item, &format!("{path}[{i}]")))
        .collect()
}

fn coerce_tuple(
    types: &[DynSolType],
    components: &[Param],
    value: &Value,
    path: &str,
) -> Result<DynSolValue, ContractError> {
    let nested = |i: usize| components.get(i).map_or(&[][..], |c| c.components.as_slice());

    let fields = match value {
        Value::Array(items) if items.len() == types.len() => types
            .iter()
            .zip(items)
            .enumerate()
            .map(|(i, (ty, item))| coerce_value(ty, nested(i), item, &format!("{path}[{i}]")))
            .collect::<Result<Vec<_>, _>>()?,
        Value::Object(map) if components.len() == types.len() => types
            .iter()
            .zip(components)
            .enumerate()
            .map(|(i, (ty, component))| {
                let field_path = format!("{path}.{}", component.name);
                let item = map.get(&component.name).ok_or_else(|| {
                    ContractError::InvalidArguments(format!("{field_path}: missing tuple field"))
                })?;
                coerce_value(ty, nested(i), item, &field_path)
            })
            .collect::<Result<Vec<_>, _>>()?,
        _ => {
            return Err(ContractError::InvalidArguments(format!(
                "{path}: expected a tuple of {} element(s)",
                types.len()
            )))
        }
    };

    Ok(DynSolValue::Tuple(fields))
}
