//! Builds getters, setters and actions for the expression shapes that can run
//! without the generic evaluator.
//!
//! Every builder returns `Ok(None)` when a shape is not supported so the caller
//! can fall back to [`super::eval`]. `Err` is reserved for failures found while
//! building, such as a null receiver in the middle of a member chain.

use super::accessor_cache::{self, PropertyAccessor};
use super::evaluator::eval;
use super::method_cache::{self, is_supported};
use super::type_casting::{change_type, checked_cast};
use super::utils::{concat, expect_bool, loosely_equal, null_reference};
use crate::ast::{BinaryOp, CallExpr, Expr, MemberExpr, NodeId, UnaryOp};
use crate::error::Error;
use crate::reflect::{builtin, MethodRef, TypeRef};
use crate::triggers::SetterContainer;
use crate::types::Value;
use crate::Action;
use std::cell::RefCell;
use std::collections::HashMap;
use std::rc::Rc;
use std::sync::Arc;

pub type Getter = Rc<dyn Fn() -> Result<Value, Error>>;
pub type Setter = Rc<dyn Fn(Value) -> Result<(), Error>>;

fn getter<F: Fn() -> Result<Value, Error> + 'static>(f: F) -> Getter {
    Rc::new(f)
}

fn setter<F: Fn(Value) -> Result<(), Error> + 'static>(f: F) -> Setter {
    Rc::new(f)
}

/// Object a member is read from: an instance, or a type for static members.
#[derive(Clone, Debug)]
pub enum Target {
    Instance(Value),
    Type(TypeRef),
}

impl Target {
    pub fn instance(&self) -> Option<&Value> {
        match self {
            Target::Instance(v) => Some(v),
            Target::Type(_) => None,
        }
    }

    pub fn type_name(&self) -> String {
        match self {
            Target::Instance(v) => v.type_name(),
            Target::Type(t) => t.name().to_string(),
        }
    }
}

/// Resolved receiver of a member access node.
#[derive(Clone)]
enum Receiver {
    Shared(Value),
    /// Value-type instance boxed once; getters and setters built for the same
    /// node see each other's writes.
    Boxed(Rc<RefCell<Value>>),
    Static(TypeRef),
}

impl Receiver {
    fn new(value: Value) -> Self {
        match value {
            Value::Struct(_) => Receiver::Boxed(Rc::new(RefCell::new(value))),
            other => Receiver::Shared(other),
        }
    }

    fn runtime_type(&self) -> Option<TypeRef> {
        match self {
            Receiver::Shared(v) => v.runtime_type(),
            Receiver::Boxed(slot) => slot.borrow().runtime_type(),
            Receiver::Static(t) => Some(t.clone()),
        }
    }

    fn to_target(&self) -> Target {
        match self {
            Receiver::Shared(v) => Target::Instance(v.clone()),
            Receiver::Boxed(slot) => Target::Instance(slot.borrow().clone()),
            Receiver::Static(t) => Target::Type(t.clone()),
        }
    }

    fn accessor(&self, node: &MemberExpr) -> Result<Arc<PropertyAccessor>, Error> {
        let ty = self.runtime_type().ok_or_else(|| Error::NullReference {
            member: node.member().qualified_name(),
            expr: Expr::Member(node.clone()).to_string(),
        })?;
        Ok(accessor_cache::find(node.member(), &ty))
    }

    fn read(&self, accessor: &PropertyAccessor) -> Result<Value, Error> {
        match self {
            Receiver::Shared(v) => accessor.get(v),
            Receiver::Boxed(slot) => {
                let v = slot.borrow().clone();
                accessor.get(&v)
            }
            Receiver::Static(_) => accessor.get(&Value::Null),
        }
    }

    // No RefCell borrow is held while host code runs.
    fn write(&self, accessor: &PropertyAccessor, value: Value) -> Result<(), Error> {
        match self {
            Receiver::Shared(v) => accessor.set(&mut v.clone(), value),
            Receiver::Boxed(slot) => {
                let mut v = slot.borrow().clone();
                accessor.set(&mut v, value)?;
                *slot.borrow_mut() = v;
                Ok(())
            }
            Receiver::Static(_) => accessor.set(&mut Value::Null, value),
        }
    }
}

fn is_type(ty: Option<TypeRef>, expected: &TypeRef) -> bool {
    ty.map(|t| t.id() == expected.id()).unwrap_or(false)
}

/// Interprets one binding's expressions. Receivers are resolved once per
/// member node and cached for the lifetime of the interpreter.
#[derive(Default)]
pub struct ExpressionInterpreter {
    receivers: HashMap<NodeId, Receiver>,
}

impl ExpressionInterpreter {
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of member nodes whose receiver has been resolved.
    pub fn resolved_targets(&self) -> usize {
        self.receivers.len()
    }

    pub fn find_member_object_or_type(&mut self, node: &MemberExpr) -> Result<Target, Error> {
        Ok(self.receiver(node)?.to_target())
    }

    fn receiver(&mut self, node: &MemberExpr) -> Result<Receiver, Error> {
        if let Some(found) = self.receivers.get(&node.id()) {
            return Ok(found.clone());
        }
        let receiver = match node.target() {
            None => {
                let ty = node.member().declaring_type().ok_or_else(|| {
                    Error::TypeMismatch(format!("declaring type of [{}] is gone", node.member().name()))
                })?;
                Receiver::Static(ty)
            }
            Some(target) => {
                let value = match target {
                    Expr::Constant { value, .. } => value.clone(),
                    Expr::Member(parent) => {
                        let parent_receiver = self.receiver(parent)?;
                        let accessor = parent_receiver.accessor(parent)?;
                        parent_receiver.read(&accessor)?
                    }
                    other => eval(other)?,
                };
                if value.is_null() {
                    return Err(null_reference(target, &Expr::Member(node.clone())));
                }
                Receiver::new(value)
            }
        };
        self.receivers.insert(node.id(), receiver.clone());
        Ok(receiver)
    }

    pub fn try_build_getter(&mut self, expr: &Expr) -> Result<Option<Getter>, Error> {
        match expr {
            Expr::Constant { value, .. } => {
                let value = value.clone();
                Ok(Some(getter(move || Ok(value.clone()))))
            }
            Expr::Member(node) => self.member_getter(node),
            Expr::Binary { op, left, right, ty } => self.binary_getter(*op, left, right, ty),
            Expr::Unary { op, operand, ty, method } => self.unary_getter(*op, operand, ty, method.as_ref()),
            Expr::Call(call) => self.call_getter(call),
            Expr::Conditional { .. } => Ok(None),
        }
    }

    fn member_getter(&mut self, node: &MemberExpr) -> Result<Option<Getter>, Error> {
        if node.member().getter().is_none() {
            return Ok(None);
        }
        let receiver = self.receiver(node)?;
        let accessor = receiver.accessor(node)?;
        if !accessor.can_read() {
            return Ok(None);
        }
        Ok(Some(getter(move || receiver.read(&accessor))))
    }

    fn binary_getter(&mut self, op: BinaryOp, left: &Expr, right: &Expr, ty: &TypeRef) -> Result<Option<Getter>, Error> {
        let supported = match op {
            BinaryOp::Coalesce | BinaryOp::AndAlso | BinaryOp::OrElse | BinaryOp::Equal => true,
            BinaryOp::Add => ty.id() == builtin::STRING.id(),
            _ => false,
        };
        if !supported {
            return Ok(None);
        }
        let (l, r) = match (self.try_build_getter(left)?, self.try_build_getter(right)?) {
            (Some(l), Some(r)) => (l, r),
            _ => return Ok(None),
        };
        Ok(Some(match op {
            BinaryOp::Coalesce => getter(move || {
                let v = l()?;
                if v.is_null() {
                    r()
                } else {
                    Ok(v)
                }
            }),
            BinaryOp::AndAlso => getter(move || {
                if !expect_bool(&l()?, "&&")? {
                    return Ok(Value::Boolean(false));
                }
                Ok(Value::Boolean(expect_bool(&r()?, "&&")?))
            }),
            BinaryOp::OrElse => getter(move || {
                if expect_bool(&l()?, "||")? {
                    return Ok(Value::Boolean(true));
                }
                Ok(Value::Boolean(expect_bool(&r()?, "||")?))
            }),
            BinaryOp::Equal => getter(move || Ok(Value::Boolean(loosely_equal(&l()?, &r()?)))),
            _ => getter(move || Ok(concat(&l()?, &r()?))),
        }))
    }

    fn unary_getter(
        &mut self,
        op: UnaryOp,
        operand: &Expr,
        ty: &TypeRef,
        method: Option<&MethodRef>,
    ) -> Result<Option<Getter>, Error> {
        match op {
            UnaryOp::Not if is_type(operand.ty(), &builtin::BOOL) => {
                Ok(self.try_build_getter(operand)?.map(|o| getter(move || Ok(Value::Boolean(!expect_bool(&o()?, "!")?)))))
            }
            UnaryOp::Convert => {
                let o = match self.try_build_getter(operand)? {
                    Some(o) => o,
                    None => return Ok(None),
                };
                let ty = ty.clone();
                if !ty.is_value_type() {
                    return Ok(Some(getter(move || checked_cast(o()?, &ty))));
                }
                match method {
                    None => Ok(Some(getter(move || change_type(o()?, &ty)))),
                    Some(m) if is_supported(m) => {
                        let declaring = m.declaring_type().unwrap_or_else(|| ty.clone());
                        let delegate = method_cache::find(m, &declaring)?;
                        Ok(Some(getter(move || {
                            let mut args = [o()?];
                            Ok(delegate.invoke(&mut args)?.unwrap_or(Value::Null))
                        })))
                    }
                    Some(_) => Ok(None),
                }
            }
            _ => Ok(None),
        }
    }

    fn call_getter(&mut self, call: &CallExpr) -> Result<Option<Getter>, Error> {
        let method = call.method().clone();
        if !is_supported(&method) {
            return Ok(None);
        }
        let receiver = match (call.target(), method.is_static()) {
            (_, true) => None,
            (Some(target), false) => match self.try_build_getter(target)? {
                Some(g) => Some(g),
                None => return Ok(None),
            },
            (None, false) => return Ok(None),
        };
        let mut args = Vec::with_capacity(call.args().len());
        for arg in call.args() {
            match self.try_build_getter(arg)? {
                Some(g) => args.push(g),
                None => return Ok(None),
            }
        }
        // Virtual calls pick their delegate from the receiver's runtime type on every call.
        let fixed = if method.is_virtual() && !method.is_static() {
            None
        } else {
            let declaring = method.declaring_type().ok_or_else(|| {
                Error::TypeMismatch(format!("declaring type of [{}] is gone", method.name()))
            })?;
            Some(method_cache::find(&method, &declaring)?)
        };
        Ok(Some(getter(move || {
            let mut values = Vec::with_capacity(args.len() + 1);
            if let Some(recv) = &receiver {
                values.push(recv()?);
            }
            for arg in &args {
                values.push(arg()?);
            }
            let delegate = match &fixed {
                Some(d) => d.clone(),
                None => {
                    let ty = values.first().and_then(Value::runtime_type).ok_or_else(|| Error::NullReference {
                        member: "receiver".to_string(),
                        expr: method.qualified_name(),
                    })?;
                    method_cache::find(&method, &ty)?
                }
            };
            Ok(delegate.invoke(&mut values)?.unwrap_or(Value::Null))
        })))
    }

    /// Call node as a niladic action, discarding any result.
    pub fn try_build_method_delegate(&mut self, call: &CallExpr) -> Result<Option<Action>, Error> {
        Ok(self.call_getter(call)?.map(|g| -> Action { Rc::new(move || g().map(|_| ())) }))
    }

    pub fn try_build_setter(&mut self, expr: &Expr, custom: Option<&SetterContainer>) -> Result<Option<Setter>, Error> {
        match expr {
            Expr::Member(node) => self.member_setter(node, custom),
            Expr::Unary { op: UnaryOp::Convert, operand, method, .. } => {
                let implicit = method.as_ref().map(|m| m.name() == "op_Implicit").unwrap_or(true);
                let operand_ty = match operand.ty() {
                    Some(t) if implicit && builtin::is_primitive(&t) => t,
                    _ => return Ok(None),
                };
                Ok(self
                    .try_build_setter(operand, custom)?
                    .map(|inner| setter(move |v| inner(change_type(v, &operand_ty)?))))
            }
            _ => Ok(None),
        }
    }

    fn member_setter(&mut self, node: &MemberExpr, custom: Option<&SetterContainer>) -> Result<Option<Setter>, Error> {
        let member = node.member();
        if let Some(custom_set) = custom.and_then(|c| c.find(member)) {
            let target = self.receiver(node)?.to_target();
            return Ok(Some(setter(move |v| custom_set(&target, v))));
        }
        if member.setter().is_none() {
            return Ok(None);
        }
        let receiver = self.receiver(node)?;
        let accessor = receiver.accessor(node)?;
        if !accessor.can_write() {
            return Ok(None);
        }
        Ok(Some(setter(move |v| receiver.write(&accessor, v))))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::reflect::{MemberDef, MethodDef, Object, TypeInfo};
    use crate::types::StructValue;
    use std::cell::Cell;

    struct Node {
        ty: TypeRef,
        child: RefCell<Option<Rc<Node>>>,
        value: Cell<i64>,
    }

    impl Object for Node {
        fn type_info(&self) -> TypeRef {
            self.ty.clone()
        }
    }

    lazy_static::lazy_static! {
        static ref NODE: TypeRef = {
            TypeInfo::class("Node")
                .property("Value", &builtin::INT, |n: &Node| Value::Integer(n.value.get()), |n: &Node, v| {
                    n.value.set(v.try_into()?);
                    Ok(())
                })
                .readonly_property("Child", &builtin::OBJECT, |n: &Node| {
                    n.child.borrow().clone().map(|c| Value::Object(c)).unwrap_or(Value::Null)
                })
                .method(MethodDef::instance("Twice", Some(&builtin::INT), |n: &Node, _| {
                    Ok(Value::Integer(n.value.get() * 2))
                }))
                .member(MemberDef::writeonly_property("Sink", &builtin::INT, |n: &Node, v| {
                    n.value.set(v.try_into()?);
                    Ok(())
                }))
                .build()
        };
    }

    fn node(value: i64) -> Rc<Node> {
        Rc::new(Node { ty: NODE.clone(), child: RefCell::new(None), value: Cell::new(value) })
    }

    fn child_value(root: &Rc<Node>) -> Expr {
        let child = Expr::object("root", root).member("Child").unwrap();
        Expr::access(Some(child), &NODE.member("Value").unwrap())
    }

    #[test]
    fn member_chain_resolves_receiver_once() {
        let root = node(1);
        *root.child.borrow_mut() = Some(node(5));
        let expr = child_value(&root);

        let mut interpreter = ExpressionInterpreter::new();
        let get = interpreter.try_build_getter(&expr).unwrap().unwrap();
        assert_eq!(get().unwrap(), Value::Integer(5));

        // Swapping the child does not affect the already resolved receiver.
        *root.child.borrow_mut() = Some(node(9));
        assert_eq!(get().unwrap(), Value::Integer(5));
        assert_eq!(interpreter.resolved_targets(), 2);
    }

    #[test]
    fn null_in_member_chain_is_fatal() {
        let root = node(1);
        let expr = child_value(&root);
        let mut interpreter = ExpressionInterpreter::new();
        let err = interpreter.try_build_getter(&expr).err().unwrap();
        assert!(matches!(err, Error::NullReference { .. }), "{err}");
        assert!(err.to_string().contains("root.Child"));
    }

    #[test]
    fn unsupported_shapes_return_none() {
        let mut interpreter = ExpressionInterpreter::new();
        let sub = Expr::arithmetic(BinaryOp::Subtract, Expr::constant(3), Expr::constant(1));
        assert!(interpreter.try_build_getter(&sub).unwrap().is_none());
        let int_add = Expr::add(Expr::constant(1), Expr::constant(2));
        assert!(interpreter.try_build_getter(&int_add).unwrap().is_none());
        let sink = Expr::object("n", &node(0)).member("Sink").unwrap();
        assert!(interpreter.try_build_getter(&sink).unwrap().is_none());
        assert!(interpreter.try_build_setter(&sink, None).unwrap().is_some());
    }

    #[test]
    fn implicit_conversion_setter_converts_back() {
        let n = node(0);
        let value = Expr::object("n", &n).member("Value").unwrap();
        let widened = Expr::convert(value, &builtin::FLOAT);
        let mut interpreter = ExpressionInterpreter::new();
        let get = interpreter.try_build_getter(&widened).unwrap().unwrap();
        let set = interpreter.try_build_setter(&widened, None).unwrap().unwrap();
        set(Value::Number(7.0)).unwrap();
        assert_eq!(n.value.get(), 7);
        assert_eq!(get().unwrap(), Value::Number(7.0));
    }

    #[test]
    fn boxed_struct_receiver_is_shared_by_getter_and_setter() {
        let point = TypeInfo::structure("Point").struct_field("X", &builtin::INT).build();
        let x = Expr::var("p", StructValue::new(&point).with("X", 1)).member("X").unwrap();
        let mut interpreter = ExpressionInterpreter::new();
        let get = interpreter.try_build_getter(&x).unwrap().unwrap();
        let set = interpreter.try_build_setter(&x, None).unwrap().unwrap();
        set(Value::Integer(8)).unwrap();
        assert_eq!(get().unwrap(), Value::Integer(8));
    }

    #[test]
    fn unresolvable_receiver_names_the_member_access() {
        let expr = Expr::object("n", &node(0)).member("Value").unwrap();
        let err = Receiver::Shared(Value::Null).accessor(expr.as_member().unwrap()).err().unwrap();
        match err {
            Error::NullReference { member, expr } => {
                assert_eq!(member, "Node.Value");
                assert_eq!(expr, "n.Value");
            }
            other => panic!("unexpected error {other}"),
        }
    }

    #[test]
    fn nested_equality_compares_numbers_by_value() {
        let n = node(2);
        let value = Expr::object("n", &n).member("Value").unwrap();
        let expr = Expr::equal(value, Expr::constant(2.0));
        let mut interpreter = ExpressionInterpreter::new();
        let get = interpreter.try_build_getter(&expr).unwrap().unwrap();
        assert_eq!(get().unwrap(), Value::Boolean(true));
        assert_eq!(get().unwrap(), eval(&expr).unwrap());
        n.value.set(3);
        assert_eq!(get().unwrap(), Value::Boolean(false));
    }

    #[test]
    fn method_delegate_discards_result() {
        let n = node(21);
        let call = Expr::object("n", &n).call("Twice", vec![]).unwrap();
        let mut interpreter = ExpressionInterpreter::new();
        let get = interpreter.try_build_getter(&call).unwrap().unwrap();
        assert_eq!(get().unwrap(), Value::Integer(42));
        let action = interpreter.try_build_method_delegate(call.as_call().unwrap()).unwrap().unwrap();
        action().unwrap();
    }
}
