use crate::error::Error;
use crate::reflect::{MemberInfo, MemberRef};
use crate::runtime::Target;
use crate::types::Value;
use dashmap::DashMap;
use std::sync::Arc;
use tracing::warn;

/// Setter used instead of the member's own one.
pub type CustomSetter = Arc<dyn Fn(&Target, Value) -> Result<(), Error> + Send + Sync>;

/// Setter overrides keyed by member, consulted before the member's own setter.
#[derive(Default)]
pub struct SetterContainer {
    setters: DashMap<u64, CustomSetter>,
}

impl SetterContainer {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add_setter(&self, member: &MemberRef, setter: CustomSetter) {
        if self.setters.insert(member.id(), setter).is_some() {
            warn!("[{}] setter configuration has been overridden", member.qualified_name());
        }
    }

    pub fn find(&self, member: &MemberInfo) -> Option<CustomSetter> {
        self.setters.get(&member.id()).map(|s| s.clone())
    }

    pub fn len(&self) -> usize {
        self.setters.len()
    }

    pub fn is_empty(&self) -> bool {
        self.setters.is_empty()
    }
}
