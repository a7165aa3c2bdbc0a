//! Builtin types for primitive values.

use super::{TypeBuilder, TypeKind, TypeRef};
use crate::types::Value;

lazy_static::lazy_static! {
    /// Root of every type hierarchy.
    pub static ref OBJECT: TypeRef = TypeBuilder::new("Object".into(), TypeKind::Reference, None).build();
    pub static ref BOOL: TypeRef = primitive("Bool", TypeKind::Value);
    pub static ref INT: TypeRef = primitive("Int", TypeKind::Value);
    pub static ref FLOAT: TypeRef = primitive("Float", TypeKind::Value);
    pub static ref STRING: TypeRef = TypeBuilder::new("String".into(), TypeKind::Reference, Some(OBJECT.clone()))
        .member(super::MemberDef::raw_getter("Length", &INT, |v: &Value| {
            Ok(v.as_str().map(|s| Value::Integer(s.chars().count() as i64)).unwrap_or(Value::Null))
        }))
        .build();
}

fn primitive(name: &str, kind: TypeKind) -> TypeRef {
    TypeBuilder::new(name.into(), kind, Some(OBJECT.clone())).build()
}

/// True for `Bool`, `Int` and `Float`.
pub fn is_primitive(ty: &TypeRef) -> bool {
    ty.id() == BOOL.id() || ty.id() == INT.id() || ty.id() == FLOAT.id()
}
