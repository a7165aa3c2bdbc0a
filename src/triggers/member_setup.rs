use super::TriggerDelegate;
use crate::reflect::{MemberInfo, MemberKind, MemberRef, TypeInfo};
use dashmap::DashMap;
use tracing::warn;

/// Trigger registrations keyed by member.
#[derive(Default)]
pub struct MemberTriggerSetup {
    delegates: DashMap<u64, TriggerDelegate>,
}

impl MemberTriggerSetup {
    pub fn new() -> Self {
        Self::default()
    }

    /// Registers `delegate` for `member`. Last registration wins.
    pub fn add_trigger(&self, member: &MemberRef, delegate: TriggerDelegate) {
        if self.delegates.insert(member.id(), delegate).is_some() {
            warn!("[{}] trigger configuration has been overridden", member.qualified_name());
        }
    }

    pub fn contains(&self, member: &MemberInfo) -> bool {
        self.delegates.contains_key(&member.id())
    }

    pub fn len(&self) -> usize {
        self.delegates.len()
    }

    pub fn is_empty(&self) -> bool {
        self.delegates.is_empty()
    }

    /// Explicit registration first; otherwise an implicit property-changed
    /// delegate for instance properties of notifying types.
    pub fn find_trigger_delegate(&self, member: &MemberInfo, receiver_type: Option<&TypeInfo>) -> Option<TriggerDelegate> {
        if let Some(found) = self.delegates.get(&member.id()) {
            return Some(found.clone());
        }
        if member.is_static() || member.kind() != MemberKind::Property {
            return None;
        }
        let notifies = receiver_type.map(TypeInfo::notifies).unwrap_or(false)
            || member.declaring_type().map(|t| t.notifies()).unwrap_or(false);
        notifies.then(|| TriggerDelegate::property_changed(member.name()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::Error;
    use crate::reflect::{builtin, MemberDef};
    use crate::runtime::Target;
    use crate::types::Value;

    fn noop() -> TriggerDelegate {
        TriggerDelegate::new(
            |action: crate::Action| -> crate::Handler { std::rc::Rc::new(action) },
            |_: &Target, _: &crate::Handler| -> Result<(), Error> { Ok(()) },
            |_: &Target, _: &crate::Handler| -> Result<(), Error> { Ok(()) },
        )
    }

    #[test]
    fn implicit_delegates_only_for_notifying_properties() {
        let plain = TypeInfo::class("Plain")
            .member(MemberDef::raw_getter("Name", &builtin::STRING, |_| Ok(Value::Null)))
            .build();
        let notifying = TypeInfo::class("Notifying")
            .notifies()
            .member(MemberDef::raw_getter("Name", &builtin::STRING, |_| Ok(Value::Null)))
            .member(MemberDef::static_readonly("Shared", &builtin::INT, || Value::Integer(0)))
            .build();
        let setup = MemberTriggerSetup::new();

        let name = plain.member("Name").unwrap();
        assert!(setup.find_trigger_delegate(&name, None).is_none());
        assert!(setup.find_trigger_delegate(&name, Some(&notifying)).is_some());
        assert!(setup.find_trigger_delegate(&notifying.member("Name").unwrap(), None).is_some());
        assert!(setup.find_trigger_delegate(&notifying.member("Shared").unwrap(), None).is_none());
    }

    #[test]
    fn explicit_registration_wins_and_overwrites() {
        let ty = TypeInfo::class("Plain")
            .member(MemberDef::raw_getter("Name", &builtin::STRING, |_| Ok(Value::Null)))
            .build();
        let name = ty.member("Name").unwrap();
        let setup = MemberTriggerSetup::new();
        setup.add_trigger(&name, noop());
        setup.add_trigger(&name, noop());
        assert_eq!(setup.len(), 1);
        assert!(setup.contains(&name));
        assert!(setup.find_trigger_delegate(&name, None).is_some());
    }
}
