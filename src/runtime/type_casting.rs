use crate::error::Error;
use crate::reflect::{builtin, TypeRef};
use crate::types::Value;

/// Generic conversion used by conversion nodes and implicit-conversion setters.
///
/// Primitive targets accept any primitive or a parsable string; other targets
/// only accept values whose runtime type is assignable to them. Null converts
/// to any reference type and fails for value types.
pub fn change_type(v: Value, ty: &TypeRef) -> Result<Value, Error> {
    let runtime = match v.runtime_type() {
        Some(t) => t,
        None if ty.is_value_type() => return Err(Error::invalid_cast("null", ty.name())),
        None => return Ok(Value::Null),
    };
    if runtime.id() == ty.id() {
        return Ok(v);
    }
    let fail = || Error::invalid_cast(runtime.name(), ty.name());

    Ok(if ty.id() == builtin::BOOL.id() {
        match v {
            Value::Integer(i) => Value::Boolean(i != 0),
            Value::Number(n) => Value::Boolean(n != 0.0),
            Value::String(ref s) => match s.trim().to_ascii_lowercase().as_str() {
                "true" => Value::Boolean(true),
                "false" => Value::Boolean(false),
                _ => return Err(fail()),
            },
            _ => return Err(fail()),
        }
    } else if ty.id() == builtin::INT.id() {
        match v {
            Value::Boolean(b) => Value::Integer(i64::from(b)),
            Value::Number(n) => {
                let rounded = n.round_ties_even();
                if !rounded.is_finite() || rounded < i64::MIN as f64 || rounded >= i64::MAX as f64 {
                    return Err(fail());
                }
                Value::Integer(rounded as i64)
            }
            Value::String(ref s) => Value::Integer(s.trim().parse::<i64>().map_err(|_| fail())?),
            _ => return Err(fail()),
        }
    } else if ty.id() == builtin::FLOAT.id() {
        match v {
            Value::Boolean(b) => Value::Number(if b { 1.0 } else { 0.0 }),
            Value::Integer(i) => Value::Number(i as f64),
            Value::String(ref s) => Value::Number(s.trim().parse::<f64>().map_err(|_| fail())?),
            _ => return Err(fail()),
        }
    } else if ty.id() == builtin::STRING.id() {
        match v {
            Value::Boolean(_) | Value::Integer(_) | Value::Number(_) => Value::String(v.to_display_string()),
            _ => return Err(fail()),
        }
    } else if ty.is_assignable_from(&runtime) {
        v
    } else {
        return Err(fail());
    })
}

/// Reference conversion: null passes, anything else must be assignable to `ty`.
pub fn checked_cast(v: Value, ty: &TypeRef) -> Result<Value, Error> {
    match v.runtime_type() {
        Some(rt) if !ty.is_assignable_from(&rt) => Err(Error::invalid_cast(rt.name(), ty.name())),
        _ => Ok(v),
    }
}
