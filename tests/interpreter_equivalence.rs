//! Getters compiled by the interpreter agree with the generic evaluator.

mod common;

use common::*;
use exprbind::runtime::{eval, ExpressionInterpreter};
use exprbind::{builtin, Expr, MethodDef, TypeInfo, TypeRef, Value};
use proptest::prelude::*;
use std::rc::Rc;

lazy_static::lazy_static! {
    static ref CALC: TypeRef = TypeInfo::class("Calc")
        .method(
            MethodDef::function("Sum", &builtin::INT, |args: &[Value]| {
                let a = args[0].as_integer().unwrap_or(0);
                let b = args[1].as_integer().unwrap_or(0);
                Ok(Value::Integer(a.wrapping_add(b)))
            })
            .param("a", &builtin::INT)
            .param("b", &builtin::INT),
        )
        .method(
            MethodDef::function("FromBool", &builtin::INT, |args: &[Value]| {
                Ok(Value::Integer(if args[0].as_bool().unwrap_or(false) { 10 } else { -10 }))
            })
            .param("b", &builtin::BOOL),
        )
        .build();
}

fn compiled(expr: &Expr) -> Option<Value> {
    let mut interpreter = ExpressionInterpreter::new();
    let getter = interpreter.try_build_getter(expr).unwrap().expect("expression should compile");
    getter().ok()
}

/// Both paths yield the same value, or both fail.
fn assert_agrees(expr: &Expr) {
    assert_eq!(compiled(expr), eval(expr).ok(), "{expr}");
}

fn string_expr(s: Option<String>) -> Expr {
    match s {
        Some(s) => Expr::constant(s),
        None => Expr::null(&builtin::STRING),
    }
}

fn bool_tree() -> impl Strategy<Value = Expr> {
    any::<bool>().prop_map(Expr::constant).prop_recursive(4, 24, 2, |inner| {
        prop_oneof![
            (inner.clone(), inner.clone()).prop_map(|(l, r)| Expr::and_also(l, r)),
            (inner.clone(), inner.clone()).prop_map(|(l, r)| Expr::or_else(l, r)),
            (inner.clone(), inner.clone()).prop_map(|(l, r)| Expr::equal(l, r)),
            inner.prop_map(Expr::not),
        ]
    })
}

fn numeric_constant() -> impl Strategy<Value = Expr> {
    prop_oneof![
        (-3i64..3).prop_map(Expr::constant),
        (-3i64..3).prop_map(|i| Expr::constant(i as f64)),
        Just(Expr::constant(0.5)),
        Just(Expr::constant(f64::NAN)),
    ]
}

/// Source object state: int, float, bool and optional string.
fn source_state() -> impl Strategy<Value = (i64, f64, bool, Option<String>)> {
    (
        -1_000i64..1_000,
        prop_oneof![(-1_000i64..1_000).prop_map(|i| i as f64), -1.0e6f64..1.0e6],
        any::<bool>(),
        proptest::option::of("[a-z]{0,4}"),
    )
}

const MEMBER_SHAPES: usize = 12;

fn member_shape(source: &Rc<NotifyObject>, shape: usize) -> Expr {
    let m = |name: &str| source.member("s", name);
    match shape {
        0 => m("Int"),
        1 => Expr::equal(m("Int"), m("Float")),
        2 => Expr::equal(m("Float"), Expr::constant(0.0)),
        3 => Expr::convert(m("Int"), &builtin::FLOAT),
        4 => Expr::convert(m("Float"), &builtin::INT),
        5 => Expr::convert(m("Bool"), &builtin::INT),
        6 => Expr::convert(m("Int"), &builtin::BOOL),
        7 => Expr::convert_with(m("Bool"), &builtin::INT, &CALC.method("FromBool", 1).unwrap()),
        8 => Expr::static_call(&CALC, "Sum", vec![m("Int"), Expr::convert(m("Float"), &builtin::INT)]).unwrap(),
        9 => Expr::coalesce(m("String"), Expr::constant("none")),
        10 => Expr::add(m("String"), m("Int")),
        _ => Expr::and_also(m("Bool"), Expr::not(Expr::equal(m("Int"), Expr::constant(0)))),
    }
}

proptest! {
    #[test]
    fn string_concatenation(a in proptest::option::of("[a-z]{0,6}"), b in proptest::option::of("[a-z]{0,6}")) {
        assert_agrees(&Expr::add(string_expr(a), string_expr(b)));
    }

    #[test]
    fn coalesce_picks_first_non_null(a in proptest::option::of("[a-z]{0,6}"), b in proptest::option::of("[a-z]{0,6}")) {
        let expr = Expr::coalesce(string_expr(a.clone()), string_expr(b.clone()));
        assert_agrees(&expr);
        let expected: Value = a.or(b).into();
        prop_assert_eq!(compiled(&expr), Some(expected));
    }

    #[test]
    fn mixed_numeric_equality(a in numeric_constant(), b in numeric_constant()) {
        assert_agrees(&Expr::equal(a, b));
    }

    #[test]
    fn boolean_logic(expr in bool_tree()) {
        assert_agrees(&expr);
    }

    #[test]
    fn member_reads_conversions_and_calls(
        (int, float, boolean, string) in source_state(),
        shape in 0..MEMBER_SHAPES,
    ) {
        let source = NotifyObject::new();
        source.set_int(int).unwrap();
        source.set_float(float).unwrap();
        source.set_bool(boolean).unwrap();
        source.set_string(string).unwrap();
        assert_agrees(&member_shape(&source, shape));
    }
}

#[test]
fn integer_and_float_compare_by_value() {
    let expr = Expr::equal(Expr::constant(2), Expr::constant(2.0));
    assert_eq!(compiled(&expr), Some(Value::Boolean(true)));
    assert_agrees(&expr);
}

#[test]
fn reference_conversions_do_not_reformat() {
    let source = NotifyObject::new();
    let expr = Expr::convert(source.member("s", "Int"), &builtin::STRING);
    assert_eq!(compiled(&expr), None);
    assert!(eval(&expr).is_err());
}

#[test]
fn unsupported_shapes_do_not_compile() {
    let mut interpreter = ExpressionInterpreter::new();
    let sum = Expr::add(Expr::constant(1), Expr::constant(2));
    assert!(interpreter.try_build_getter(&sum).unwrap().is_none());
    let choice = Expr::conditional(Expr::constant(true), Expr::constant(1), Expr::constant(2));
    assert!(interpreter.try_build_getter(&choice).unwrap().is_none());
    assert_eq!(eval(&choice).unwrap(), Value::Integer(1));
}
