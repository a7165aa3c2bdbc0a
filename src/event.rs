//! Multicast events raised by host objects.

use crate::error::Error;
use std::any::Any;
use std::cell::RefCell;
use std::rc::Rc;

/// Niladic callback fired by triggers and event bindings.
pub type Action = Rc<dyn Fn() -> Result<(), Error>>;

/// Opaque subscription token produced by a trigger's handler factory.
pub type Handler = Rc<dyn Any>;

pub type EventHandler<A> = Rc<dyn Fn(&A) -> Result<(), Error>>;

fn same_handler<A: ?Sized>(a: &Rc<A>, b: &Rc<A>) -> bool {
    Rc::as_ptr(a).cast::<()>() == Rc::as_ptr(b).cast::<()>()
}

/// Handler list with add/remove by identity.
///
/// `raise` iterates over a snapshot, so handlers may add or remove handlers
/// (including themselves) while the event is being raised. The first handler
/// error stops the raise and is returned to the caller.
pub struct Event<A> {
    handlers: RefCell<Vec<EventHandler<A>>>,
}

impl<A> Default for Event<A> {
    fn default() -> Self {
        Self { handlers: RefCell::new(Vec::new()) }
    }
}

impl<A: 'static> Event<A> {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add(&self, handler: EventHandler<A>) {
        self.handlers.borrow_mut().push(handler);
    }

    /// Removes the most recently added occurrence of `handler`.
    pub fn remove(&self, handler: &EventHandler<A>) -> bool {
        let mut handlers = self.handlers.borrow_mut();
        match handlers.iter().rposition(|h| same_handler(h, handler)) {
            Some(index) => {
                handlers.remove(index);
                true
            }
            None => false,
        }
    }

    pub fn raise(&self, args: &A) -> Result<(), Error> {
        let snapshot = self.handlers.borrow().clone();
        for handler in snapshot {
            handler(args)?;
        }
        Ok(())
    }

    pub fn handler_count(&self) -> usize {
        self.handlers.borrow().len()
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PropertyChangedArgs {
    property_name: String,
}

impl PropertyChangedArgs {
    pub fn new<N: Into<String>>(property_name: N) -> Self {
        Self { property_name: property_name.into() }
    }

    pub fn property_name(&self) -> &str {
        &self.property_name
    }
}

pub type PropertyChangedEvent = Event<PropertyChangedArgs>;

/// Type-erased access to an event, used when no trigger is registered for it.
pub trait EventSource {
    /// Subscribes `action`, ignoring event arguments.
    fn add_universal(&self, action: Action) -> Handler;

    fn remove_universal(&self, handler: &Handler) -> bool;

    fn handler_count(&self) -> usize;
}

impl<A: 'static> EventSource for Event<A> {
    fn add_universal(&self, action: Action) -> Handler {
        let handler: EventHandler<A> = Rc::new(move |_: &A| action());
        self.add(handler.clone());
        Rc::new(handler)
    }

    fn remove_universal(&self, handler: &Handler) -> bool {
        match handler.downcast_ref::<EventHandler<A>>() {
            Some(h) => self.remove(h),
            None => false,
        }
    }

    fn handler_count(&self) -> usize {
        Event::handler_count(self)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::cell::Cell;

    #[test]
    fn handlers_can_remove_themselves_while_raising() {
        let event: Rc<Event<i32>> = Rc::new(Event::new());
        let hits = Rc::new(Cell::new(0));
        let slot: Rc<RefCell<Option<EventHandler<i32>>>> = Rc::new(RefCell::new(None));

        let (ev, h, s) = (event.clone(), hits.clone(), slot.clone());
        let handler: EventHandler<i32> = Rc::new(move |_: &i32| {
            h.set(h.get() + 1);
            if let Some(me) = s.borrow().as_ref() {
                ev.remove(me);
            }
            Ok(())
        });
        *slot.borrow_mut() = Some(handler.clone());
        event.add(handler);

        event.raise(&1).unwrap();
        event.raise(&2).unwrap();
        assert_eq!(hits.get(), 1);
        assert_eq!(event.handler_count(), 0);
    }

    #[test]
    fn first_error_stops_the_raise() {
        let event: Event<()> = Event::new();
        let hits = Rc::new(Cell::new(0));
        event.add(Rc::new(|_: &()| Err(Error::host("boom"))));
        let h = hits.clone();
        event.add(Rc::new(move |_: &()| {
            h.set(h.get() + 1);
            Ok(())
        }));
        assert!(event.raise(&()).is_err());
        assert_eq!(hits.get(), 0);
    }

    #[test]
    fn universal_handlers_ignore_arguments() {
        let event: Event<PropertyChangedArgs> = Event::new();
        let hits = Rc::new(Cell::new(0));
        let h = hits.clone();
        let token = event.add_universal(Rc::new(move || {
            h.set(h.get() + 1);
            Ok(())
        }));
        event.raise(&PropertyChangedArgs::new("Any")).unwrap();
        assert_eq!(hits.get(), 1);
        assert!(event.remove_universal(&token));
        assert!(!event.remove_universal(&token));
        assert_eq!(EventSource::handler_count(&event), 0);
    }
}
