use super::{MemberTriggerSetup, Trigger};
use crate::ast::{Expr, MemberExpr};
use crate::error::Error;
use crate::runtime::{ExpressionInterpreter, Target};

/// Finds every member access in an expression that can signal a change.
pub struct TriggerCollector<'a> {
    interpreter: &'a mut ExpressionInterpreter,
    setup: &'a MemberTriggerSetup,
}

impl<'a> TriggerCollector<'a> {
    pub fn new(interpreter: &'a mut ExpressionInterpreter, setup: &'a MemberTriggerSetup) -> Self {
        Self { interpreter, setup }
    }

    /// Unsubscribed triggers in pre-order. A member used twice yields two triggers.
    pub fn parse(&mut self, expr: &Expr) -> Result<Vec<Trigger>, Error> {
        let mut triggers = Vec::new();
        self.visit(expr, &mut triggers)?;
        Ok(triggers)
    }

    fn visit(&mut self, expr: &Expr, triggers: &mut Vec<Trigger>) -> Result<(), Error> {
        match expr {
            Expr::Constant { .. } => Ok(()),
            Expr::Member(node) => {
                if let Some(trigger) = self.member_trigger(node)? {
                    triggers.push(trigger);
                }
                match node.target() {
                    Some(target) => self.visit(target, triggers),
                    None => Ok(()),
                }
            }
            Expr::Binary { left, right, .. } => {
                self.visit(left, triggers)?;
                self.visit(right, triggers)
            }
            Expr::Unary { operand, .. } => self.visit(operand, triggers),
            Expr::Call(call) => {
                if let Some(target) = call.target() {
                    self.visit(target, triggers)?;
                }
                for arg in call.args() {
                    self.visit(arg, triggers)?;
                }
                Ok(())
            }
            Expr::Conditional { test, if_true, if_false, .. } => {
                self.visit(test, triggers)?;
                self.visit(if_true, triggers)?;
                self.visit(if_false, triggers)
            }
        }
    }

    fn member_trigger(&mut self, node: &MemberExpr) -> Result<Option<Trigger>, Error> {
        let member = node.member();
        if member.is_static() {
            return Ok(self
                .setup
                .find_trigger_delegate(member, None)
                .zip(member.declaring_type())
                .map(|(delegate, ty)| Trigger::new(Target::Type(ty), delegate, member.qualified_name())));
        }
        let target = self.interpreter.find_member_object_or_type(node)?;
        let runtime_type = target.instance().and_then(|v| v.runtime_type());
        Ok(self
            .setup
            .find_trigger_delegate(member, runtime_type.as_deref())
            .map(|delegate| Trigger::new(target, delegate, member.qualified_name())))
    }
}
