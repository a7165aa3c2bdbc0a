use crate::error::Error;
use crate::reflect::{builtin, next_id, MemberRef, MethodRef, Object, TypeRef};
use crate::types::Value;
use std::fmt;
use std::rc::Rc;

/// Identity of a member access node, stable across clones of the tree.
pub type NodeId = u64;

#[derive(Clone)]
pub enum Expr {
    Constant {
        value: Value,
        ty: TypeRef,
        /// Rendered instead of the literal, e.g. the variable a value was captured from.
        name: Option<String>,
    },
    Member(MemberExpr),
    Binary {
        op: BinaryOp,
        left: Box<Expr>,
        right: Box<Expr>,
        ty: TypeRef,
    },
    Unary {
        op: UnaryOp,
        operand: Box<Expr>,
        ty: TypeRef,
        /// User-defined conversion operator.
        method: Option<MethodRef>,
    },
    Call(CallExpr),
    Conditional {
        test: Box<Expr>,
        if_true: Box<Expr>,
        if_false: Box<Expr>,
        ty: TypeRef,
    },
}

#[derive(Clone)]
pub struct MemberExpr {
    id: NodeId,
    target: Option<Box<Expr>>,
    member: MemberRef,
}

impl MemberExpr {
    pub fn id(&self) -> NodeId {
        self.id
    }

    /// `None` for static members.
    pub fn target(&self) -> Option<&Expr> {
        self.target.as_deref()
    }

    pub fn member(&self) -> &MemberRef {
        &self.member
    }
}

#[derive(Clone)]
pub struct CallExpr {
    target: Option<Box<Expr>>,
    method: MethodRef,
    args: Vec<Expr>,
}

impl CallExpr {
    pub fn target(&self) -> Option<&Expr> {
        self.target.as_deref()
    }

    pub fn method(&self) -> &MethodRef {
        &self.method
    }

    pub fn args(&self) -> &[Expr] {
        &self.args
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BinaryOp {
    Equal,
    NotEqual,
    AndAlso,
    OrElse,
    Coalesce,
    Add,
    Subtract,
    Multiply,
    Divide,
    Modulo,
    LessThan,
    LessThanOrEqual,
    GreaterThan,
    GreaterThanOrEqual,
}

impl BinaryOp {
    pub fn symbol(self) -> &'static str {
        match self {
            BinaryOp::Equal => "==",
            BinaryOp::NotEqual => "!=",
            BinaryOp::AndAlso => "&&",
            BinaryOp::OrElse => "||",
            BinaryOp::Coalesce => "??",
            BinaryOp::Add => "+",
            BinaryOp::Subtract => "-",
            BinaryOp::Multiply => "*",
            BinaryOp::Divide => "/",
            BinaryOp::Modulo => "%",
            BinaryOp::LessThan => "<",
            BinaryOp::LessThanOrEqual => "<=",
            BinaryOp::GreaterThan => ">",
            BinaryOp::GreaterThanOrEqual => ">=",
        }
    }

    pub fn is_comparison(self) -> bool {
        matches!(
            self,
            BinaryOp::Equal
                | BinaryOp::NotEqual
                | BinaryOp::LessThan
                | BinaryOp::LessThanOrEqual
                | BinaryOp::GreaterThan
                | BinaryOp::GreaterThanOrEqual
        )
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UnaryOp {
    Not,
    Negate,
    Convert,
}

impl Expr {
    pub fn constant<V: Into<Value>>(value: V) -> Expr {
        let value = value.into();
        let ty = value.runtime_type().unwrap_or_else(|| builtin::OBJECT.clone());
        Expr::Constant { value, ty, name: None }
    }

    pub fn typed_constant<V: Into<Value>>(value: V, ty: &TypeRef) -> Expr {
        Expr::Constant {
            value: value.into(),
            ty: ty.clone(),
            name: None,
        }
    }

    pub fn null(ty: &TypeRef) -> Expr {
        Expr::typed_constant(Value::Null, ty)
    }

    /// Constant displayed under `name`.
    pub fn var<N: Into<String>, V: Into<Value>>(name: N, value: V) -> Expr {
        match Expr::constant(value) {
            Expr::Constant { value, ty, .. } => Expr::Constant {
                value,
                ty,
                name: Some(name.into()),
            },
            other => other,
        }
    }

    pub fn object<N: Into<String>, T: Object>(name: N, obj: &Rc<T>) -> Expr {
        Expr::var(name, Value::object(obj))
    }

    pub fn access(target: Option<Expr>, member: &MemberRef) -> Expr {
        Expr::Member(MemberExpr {
            id: next_id(),
            target: target.map(Box::new),
            member: member.clone(),
        })
    }

    /// Member of this expression's static type.
    pub fn member(self, name: &str) -> Result<Expr, Error> {
        let ty = self.static_type()?;
        let member = ty.require_member(name)?;
        Ok(Expr::access(Some(self), &member))
    }

    pub fn static_member(ty: &TypeRef, name: &str) -> Result<Expr, Error> {
        let member = ty.require_member(name)?;
        Ok(Expr::access(None, &member))
    }

    pub fn invoke(target: Option<Expr>, method: &MethodRef, args: Vec<Expr>) -> Expr {
        Expr::Call(CallExpr {
            target: target.map(Box::new),
            method: method.clone(),
            args,
        })
    }

    /// Instance method of this expression's static type.
    pub fn call(self, name: &str, args: Vec<Expr>) -> Result<Expr, Error> {
        let ty = self.static_type()?;
        let method = ty.require_method(name, args.len())?;
        Ok(Expr::invoke(Some(self), &method, args))
    }

    pub fn static_call(ty: &TypeRef, name: &str, args: Vec<Expr>) -> Result<Expr, Error> {
        let method = ty.require_method(name, args.len())?;
        Ok(Expr::invoke(None, &method, args))
    }

    pub fn binary(op: BinaryOp, left: Expr, right: Expr, ty: &TypeRef) -> Expr {
        Expr::Binary {
            op,
            left: Box::new(left),
            right: Box::new(right),
            ty: ty.clone(),
        }
    }

    pub fn equal(left: Expr, right: Expr) -> Expr {
        Expr::binary(BinaryOp::Equal, left, right, &builtin::BOOL)
    }

    pub fn not_equal(left: Expr, right: Expr) -> Expr {
        Expr::binary(BinaryOp::NotEqual, left, right, &builtin::BOOL)
    }

    pub fn and_also(left: Expr, right: Expr) -> Expr {
        Expr::binary(BinaryOp::AndAlso, left, right, &builtin::BOOL)
    }

    pub fn or_else(left: Expr, right: Expr) -> Expr {
        Expr::binary(BinaryOp::OrElse, left, right, &builtin::BOOL)
    }

    pub fn coalesce(left: Expr, right: Expr) -> Expr {
        let ty = left.ty().unwrap_or_else(|| builtin::OBJECT.clone());
        Expr::binary(BinaryOp::Coalesce, left, right, &ty)
    }

    /// `+`; typed `String` when either operand is a string.
    pub fn add(left: Expr, right: Expr) -> Expr {
        let ty = Expr::arithmetic_type(&left, &right);
        Expr::binary(BinaryOp::Add, left, right, &ty)
    }

    /// Arithmetic or comparison operator with the usual result typing.
    pub fn arithmetic(op: BinaryOp, left: Expr, right: Expr) -> Expr {
        let ty = if op.is_comparison() {
            builtin::BOOL.clone()
        } else {
            Expr::arithmetic_type(&left, &right)
        };
        Expr::binary(op, left, right, &ty)
    }

    fn arithmetic_type(left: &Expr, right: &Expr) -> TypeRef {
        let is = |e: &Expr, t: &TypeRef| e.ty().map(|ty| ty.id() == t.id()).unwrap_or(false);
        if is(left, &builtin::STRING) || is(right, &builtin::STRING) {
            builtin::STRING.clone()
        } else if is(left, &builtin::FLOAT) || is(right, &builtin::FLOAT) {
            builtin::FLOAT.clone()
        } else {
            left.ty().unwrap_or_else(|| builtin::OBJECT.clone())
        }
    }

    pub fn not(operand: Expr) -> Expr {
        Expr::Unary {
            op: UnaryOp::Not,
            operand: Box::new(operand),
            ty: builtin::BOOL.clone(),
            method: None,
        }
    }

    pub fn negate(operand: Expr) -> Expr {
        let ty = operand.ty().unwrap_or_else(|| builtin::OBJECT.clone());
        Expr::Unary {
            op: UnaryOp::Negate,
            operand: Box::new(operand),
            ty,
            method: None,
        }
    }

    pub fn convert(operand: Expr, ty: &TypeRef) -> Expr {
        Expr::Unary {
            op: UnaryOp::Convert,
            operand: Box::new(operand),
            ty: ty.clone(),
            method: None,
        }
    }

    /// Conversion through a user-defined static operator.
    pub fn convert_with(operand: Expr, ty: &TypeRef, method: &MethodRef) -> Expr {
        Expr::Unary {
            op: UnaryOp::Convert,
            operand: Box::new(operand),
            ty: ty.clone(),
            method: Some(method.clone()),
        }
    }

    pub fn conditional(test: Expr, if_true: Expr, if_false: Expr) -> Expr {
        let ty = if_true.ty().unwrap_or_else(|| builtin::OBJECT.clone());
        Expr::Conditional {
            test: Box::new(test),
            if_true: Box::new(if_true),
            if_false: Box::new(if_false),
            ty,
        }
    }

    /// Static result type; `None` for calls of void methods.
    pub fn ty(&self) -> Option<TypeRef> {
        match self {
            Expr::Constant { ty, .. } => Some(ty.clone()),
            Expr::Member(m) => Some(m.member.value_type().clone()),
            Expr::Binary { ty, .. } | Expr::Unary { ty, .. } | Expr::Conditional { ty, .. } => Some(ty.clone()),
            Expr::Call(c) => c.method.return_type().cloned(),
        }
    }

    fn static_type(&self) -> Result<TypeRef, Error> {
        self.ty()
            .ok_or_else(|| Error::TypeMismatch(format!("`{self}` has no value")))
    }

    pub fn as_member(&self) -> Option<&MemberExpr> {
        match self {
            Expr::Member(m) => Some(m),
            _ => None,
        }
    }

    pub fn as_call(&self) -> Option<&CallExpr> {
        match self {
            Expr::Call(c) => Some(c),
            _ => None,
        }
    }

    pub fn is_constant(&self) -> bool {
        matches!(self, Expr::Constant { .. })
    }
}

fn write_operand(f: &mut fmt::Formatter<'_>, e: &Expr) -> fmt::Result {
    match e {
        Expr::Binary { .. } | Expr::Conditional { .. } => write!(f, "({e})"),
        _ => write!(f, "{e}"),
    }
}

fn write_receiver(f: &mut fmt::Formatter<'_>, target: Option<&Expr>, declaring: Option<TypeRef>) -> fmt::Result {
    match (target, declaring) {
        (Some(t), _) => write_operand(f, t),
        (None, Some(ty)) => write!(f, "{}", ty.name()),
        (None, None) => write!(f, "?"),
    }
}

/// Readable source form used in diagnostics and error messages.
impl fmt::Display for Expr {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Expr::Constant { name: Some(name), .. } => write!(f, "{name}"),
            Expr::Constant { value, .. } => match value {
                Value::Null => write!(f, "null"),
                Value::String(s) => write!(f, "{s:?}"),
                Value::Object(o) => write!(f, "<{}>", o.type_info().name()),
                other => write!(f, "{}", other.to_display_string()),
            },
            Expr::Member(m) => {
                write_receiver(f, m.target(), m.member.declaring_type())?;
                write!(f, ".{}", m.member.name())
            }
            Expr::Binary { op, left, right, .. } => {
                write_operand(f, left)?;
                write!(f, " {} ", op.symbol())?;
                write_operand(f, right)
            }
            Expr::Unary { op, operand, ty, .. } => {
                match op {
                    UnaryOp::Not => write!(f, "!")?,
                    UnaryOp::Negate => write!(f, "-")?,
                    UnaryOp::Convert => write!(f, "({})", ty.name())?,
                }
                write_operand(f, operand)
            }
            Expr::Call(c) => {
                write_receiver(f, c.target(), c.method.declaring_type())?;
                write!(f, ".{}(", c.method.name())?;
                for (i, arg) in c.args.iter().enumerate() {
                    if i > 0 {
                        write!(f, ", ")?;
                    }
                    write!(f, "{arg}")?;
                }
                write!(f, ")")
            }
            Expr::Conditional { test, if_true, if_false, .. } => {
                write_operand(f, test)?;
                write!(f, " ? ")?;
                write_operand(f, if_true)?;
                write!(f, " : ")?;
                write_operand(f, if_false)
            }
        }
    }
}

impl fmt::Debug for Expr {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Expr({self})")
    }
}
