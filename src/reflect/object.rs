use super::TypeRef;
use crate::event::{EventSource, PropertyChangedEvent};
use std::any::Any;
use std::rc::Rc;

pub trait AsAny: Any {
    fn as_any(&self) -> &dyn Any;
}

impl<T: Any> AsAny for T {
    fn as_any(&self) -> &dyn Any {
        self
    }
}

/// A host object that can take part in bindings.
pub trait Object: AsAny {
    /// Runtime type of this instance.
    fn type_info(&self) -> TypeRef;

    /// Standard property change notification, when the type supports it.
    fn property_changed(&self) -> Option<&PropertyChangedEvent> {
        None
    }

    /// Named events reachable without an explicit trigger registration.
    fn event(&self, _name: &str) -> Option<&dyn EventSource> {
        None
    }
}

pub type ObjectRef = Rc<dyn Object>;
