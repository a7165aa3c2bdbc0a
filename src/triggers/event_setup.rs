use super::TriggerDelegate;
use crate::reflect::{TypeInfo, TypeRef};
use dashmap::DashMap;
use tracing::warn;

/// Trigger registrations keyed by event name and owner type.
///
/// Each name maps to a list ordered most-derived first, so a lookup returns
/// the most specific registration the runtime type is assignable to.
#[derive(Default)]
pub struct EventTriggerSetup {
    delegates: DashMap<String, Vec<(TypeRef, TriggerDelegate)>>,
}

impl EventTriggerSetup {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add_trigger(&self, ty: &TypeRef, event_name: &str, delegate: TriggerDelegate) {
        let mut entries = self.delegates.entry(event_name.to_string()).or_default();
        if let Some(existing) = entries.iter_mut().find(|(t, _)| t.id() == ty.id()) {
            warn!("[{}.{}] trigger configuration has been overridden", ty.name(), event_name);
            existing.1 = delegate;
            return;
        }
        // Insert ahead of the first registered supertype.
        let index = entries
            .iter()
            .position(|(t, _)| t.is_assignable_from(ty))
            .unwrap_or(entries.len());
        entries.insert(index, (ty.clone(), delegate));
    }

    pub fn find_trigger_delegate(&self, event_name: &str, ty: &TypeInfo) -> Option<TriggerDelegate> {
        let entries = self.delegates.get(event_name)?;
        entries
            .iter()
            .find(|(t, _)| t.is_assignable_from(ty))
            .map(|(_, delegate)| delegate.clone())
    }

    /// Registered owner types for `event_name`, in lookup order.
    pub fn registered_types(&self, event_name: &str) -> Vec<TypeRef> {
        self.delegates
            .get(event_name)
            .map(|entries| entries.iter().map(|(t, _)| t.clone()).collect())
            .unwrap_or_default()
    }
}
