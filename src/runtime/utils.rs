use crate::ast::Expr;
use crate::error::Error;
use crate::types::Value;

/// String `+`. A null operand contributes no characters.
pub fn concat(a: &Value, b: &Value) -> Value {
    let mut s = a.to_display_string();
    s.push_str(&b.to_display_string());
    Value::String(s)
}

/// Null-aware `==` shared by compiled getters and the evaluator. Integers and
/// numbers compare by value; NaN equals NaN.
pub fn loosely_equal(a: &Value, b: &Value) -> bool {
    match (a, b) {
        (Value::Integer(i), Value::Number(n)) | (Value::Number(n), Value::Integer(i)) => *i as f64 == *n,
        _ => a == b,
    }
}

pub fn expect_bool(v: &Value, op: &str) -> Result<bool, Error> {
    v.as_bool()
        .ok_or_else(|| Error::TypeMismatch(format!("operator {op} expects Bool, got {}", v.type_name())))
}

pub fn null_reference(target: &Expr, whole: &Expr) -> Error {
    Error::NullReference {
        member: target.to_string(),
        expr: whole.to_string(),
    }
}
