//! Generic tree-walking evaluator.
//!
//! Handles every expression shape without caching anything. Bindings fall back
//! to it when the interpreter cannot build a getter or action for a side.

use super::type_casting::{change_type, checked_cast};
use super::utils::{concat, expect_bool, loosely_equal, null_reference};
use crate::ast::{BinaryOp, CallExpr, Expr, MemberExpr, UnaryOp};
use crate::error::Error;
use crate::reflect::{builtin, MemberRef, MethodBody, TypeRef};
use crate::types::Value;
use std::cmp::Ordering;

pub fn eval(expr: &Expr) -> Result<Value, Error> {
    match expr {
        Expr::Constant { value, .. } => Ok(value.clone()),
        Expr::Member(node) => eval_member(node, expr),
        Expr::Binary { op, left, right, ty } => eval_binary(*op, left, right, ty),
        Expr::Unary { op, operand, ty, method } => {
            let v = eval(operand)?;
            match op {
                UnaryOp::Not => Ok(Value::Boolean(!expect_bool(&v, "!")?)),
                UnaryOp::Negate => match v {
                    Value::Integer(i) => Ok(Value::Integer(i.wrapping_neg())),
                    Value::Number(n) => Ok(Value::Number(-n)),
                    Value::Null => Ok(Value::Null),
                    other => Err(Error::TypeMismatch(format!("cannot negate {}", other.type_name()))),
                },
                UnaryOp::Convert if !ty.is_value_type() => checked_cast(v, ty),
                UnaryOp::Convert => match method {
                    Some(m) => invoke(m.body(), None, &[v]),
                    None => change_type(v, ty),
                },
            }
        }
        Expr::Call(call) => eval_call(call, expr),
        Expr::Conditional { test, if_true, if_false, .. } => {
            if expect_bool(&eval(test)?, "?:")? {
                eval(if_true)
            } else {
                eval(if_false)
            }
        }
    }
}

fn eval_member(node: &MemberExpr, whole: &Expr) -> Result<Value, Error> {
    let member = node.member();
    let receiver = match node.target() {
        None => Value::Null,
        Some(target) => {
            let v = eval(target)?;
            if v.is_null() {
                return Err(null_reference(target, whole));
            }
            v
        }
    };
    resolve_member(member, &receiver).read(&receiver)
}

/// Member visible from the receiver's runtime type.
fn resolve_member(member: &MemberRef, receiver: &Value) -> MemberRef {
    if member.is_static() {
        return member.clone();
    }
    receiver
        .runtime_type()
        .and_then(|t| t.member(member.name()))
        .filter(|m| m.kind() == member.kind())
        .unwrap_or_else(|| member.clone())
}

fn eval_call(call: &CallExpr, whole: &Expr) -> Result<Value, Error> {
    let receiver = match call.target() {
        None => None,
        Some(target) => {
            let v = eval(target)?;
            if v.is_null() {
                return Err(null_reference(target, whole));
            }
            Some(v)
        }
    };
    let args = call.args().iter().map(eval).collect::<Result<Vec<_>, _>>()?;
    let method = match receiver.as_ref().and_then(Value::runtime_type) {
        Some(ty) => ty.find_override(call.method()),
        None => call.method().clone(),
    };
    invoke(method.body(), receiver, &args)
}

fn invoke(body: &MethodBody, receiver: Option<Value>, args: &[Value]) -> Result<Value, Error> {
    match (body, receiver) {
        (MethodBody::Static(f), _) => f(args),
        (MethodBody::Instance(f), Some(recv)) => f(&recv, args),
        (MethodBody::ValueInstance(f), Some(mut recv)) => f(&mut recv, args),
        (_, None) => Err(Error::NullReference {
            member: "receiver".to_string(),
            expr: "instance call".to_string(),
        }),
    }
}

fn eval_binary(op: BinaryOp, left: &Expr, right: &Expr, ty: &TypeRef) -> Result<Value, Error> {
    match op {
        BinaryOp::AndAlso => {
            if !expect_bool(&eval(left)?, "&&")? {
                return Ok(Value::Boolean(false));
            }
            Ok(Value::Boolean(expect_bool(&eval(right)?, "&&")?))
        }
        BinaryOp::OrElse => {
            if expect_bool(&eval(left)?, "||")? {
                return Ok(Value::Boolean(true));
            }
            Ok(Value::Boolean(expect_bool(&eval(right)?, "||")?))
        }
        BinaryOp::Coalesce => {
            let l = eval(left)?;
            if l.is_null() {
                eval(right)
            } else {
                Ok(l)
            }
        }
        _ => {
            let a = eval(left)?;
            let b = eval(right)?;
            // String-typed `+` treats null operands as empty.
            if op == BinaryOp::Add && ty.id() == builtin::STRING.id() {
                return Ok(concat(&a, &b));
            }
            apply(op, a, b)
        }
    }
}

fn numeric_pair(a: &Value, b: &Value) -> Option<(f64, f64)> {
    Some((a.as_number()?, b.as_number()?))
}

fn compare(a: &Value, b: &Value) -> Option<Ordering> {
    match (a, b) {
        (Value::Integer(x), Value::Integer(y)) => Some(x.cmp(y)),
        (Value::String(x), Value::String(y)) => Some(x.cmp(y)),
        _ => {
            let (x, y) = numeric_pair(a, b)?;
            x.partial_cmp(&y)
        }
    }
}

fn apply(op: BinaryOp, a: Value, b: Value) -> Result<Value, Error> {
    match op {
        BinaryOp::Equal => return Ok(Value::Boolean(loosely_equal(&a, &b))),
        BinaryOp::NotEqual => return Ok(Value::Boolean(!loosely_equal(&a, &b))),
        BinaryOp::LessThan | BinaryOp::LessThanOrEqual | BinaryOp::GreaterThan | BinaryOp::GreaterThanOrEqual => {
            let ord = match compare(&a, &b) {
                Some(o) => o,
                None => return Ok(Value::Boolean(false)),
            };
            return Ok(Value::Boolean(match op {
                BinaryOp::LessThan => ord == Ordering::Less,
                BinaryOp::LessThanOrEqual => ord != Ordering::Greater,
                BinaryOp::GreaterThan => ord == Ordering::Greater,
                _ => ord != Ordering::Less,
            }));
        }
        _ => {}
    }

    if op == BinaryOp::Add && (matches!(a, Value::String(_)) || matches!(b, Value::String(_))) {
        return Ok(concat(&a, &b));
    }
    if a.is_null() || b.is_null() {
        return Ok(Value::Null);
    }
    if let (Value::Integer(x), Value::Integer(y)) = (&a, &b) {
        let (x, y) = (*x, *y);
        let result = match op {
            BinaryOp::Add => x.checked_add(y),
            BinaryOp::Subtract => x.checked_sub(y),
            BinaryOp::Multiply => x.checked_mul(y),
            BinaryOp::Divide => x.checked_div(y),
            BinaryOp::Modulo => x.checked_rem(y),
            _ => None,
        };
        return result
            .map(Value::Integer)
            .ok_or_else(|| Error::host(format!("integer overflow or division by zero in {x} {} {y}", op.symbol())));
    }
    let (x, y) = numeric_pair(&a, &b).ok_or_else(|| {
        Error::TypeMismatch(format!(
            "operator {} cannot be applied to {} and {}",
            op.symbol(),
            a.type_name(),
            b.type_name()
        ))
    })?;
    Ok(Value::Number(match op {
        BinaryOp::Add => x + y,
        BinaryOp::Subtract => x - y,
        BinaryOp::Multiply => x * y,
        BinaryOp::Divide => x / y,
        BinaryOp::Modulo => x % y,
        _ => return Err(Error::TypeMismatch(format!("unexpected operator {}", op.symbol()))),
    }))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::reflect::{builtin, MethodDef, TypeInfo};

    fn c<V: Into<Value>>(v: V) -> Expr {
        Expr::constant(v)
    }

    #[test]
    fn arithmetic_promotes_integers_to_floats() {
        assert_eq!(eval(&Expr::arithmetic(BinaryOp::Add, c(1), c(2))).unwrap(), Value::Integer(3));
        assert_eq!(eval(&Expr::arithmetic(BinaryOp::Multiply, c(2), c(1.5))).unwrap(), Value::Number(3.0));
        assert_eq!(eval(&Expr::arithmetic(BinaryOp::Modulo, c(7), c(4))).unwrap(), Value::Integer(3));
        assert!(eval(&Expr::arithmetic(BinaryOp::Divide, c(1), c(0))).is_err());
    }

    #[test]
    fn comparisons_and_logic() {
        assert_eq!(eval(&Expr::arithmetic(BinaryOp::LessThan, c(1), c(2.5))).unwrap(), Value::Boolean(true));
        assert_eq!(eval(&Expr::not_equal(c("a"), c("b"))).unwrap(), Value::Boolean(true));
        assert_eq!(eval(&Expr::equal(c(2), c(2.0))).unwrap(), Value::Boolean(true));
        let short = Expr::and_also(c(false), Expr::arithmetic(BinaryOp::Divide, c(1), c(0)));
        assert_eq!(eval(&short).unwrap(), Value::Boolean(false));
        let cond = Expr::conditional(c(true), c("yes"), c("no"));
        assert_eq!(eval(&cond).unwrap(), Value::from("yes"));
    }

    #[test]
    fn string_concat_and_coalesce() {
        let e = Expr::add(c("n="), c(4));
        assert_eq!(eval(&e).unwrap(), Value::from("n=4"));
        let e = Expr::coalesce(Expr::null(&builtin::STRING), c("fallback"));
        assert_eq!(eval(&e).unwrap(), Value::from("fallback"));
    }

    #[test]
    fn calls_methods_without_delegate_limits() {
        let ty = TypeInfo::class("Numbers")
            .method(MethodDef::function("Zero", &builtin::INT, |_| Ok(Value::Integer(0))))
            .build();
        let call = Expr::static_call(&ty, "Zero", vec![]).unwrap();
        assert_eq!(eval(&call).unwrap(), Value::Integer(0));
        let negated = Expr::negate(Expr::arithmetic(BinaryOp::Subtract, call, c(4)));
        assert_eq!(eval(&negated).unwrap(), Value::Integer(4));
    }
}
