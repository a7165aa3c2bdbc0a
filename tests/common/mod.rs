#![allow(dead_code)]

use exprbind::{
    builtin, Configuration, Error, Event, EventSource, Expr, MethodDef, Object, PropertyChangedArgs,
    PropertyChangedEvent, TypeInfo, TypeRef, Value,
};
use std::cell::{Cell, RefCell};
use std::rc::Rc;
use std::sync::Arc;

lazy_static::lazy_static! {
    pub static ref NOTIFY_OBJECT: TypeRef = TypeInfo::class("NotifyObject")
        .notifies()
        .property("Int", &builtin::INT, |o: &NotifyObject| Value::Integer(o.int.get()), |o: &NotifyObject, v| {
            o.set_int(v.try_into()?)
        })
        .property("Float", &builtin::FLOAT, |o: &NotifyObject| Value::Number(o.float.get()), |o: &NotifyObject, v| {
            o.set_float(v.try_into()?)
        })
        .property("String", &builtin::STRING, |o: &NotifyObject| o.string.borrow().clone().into(), |o: &NotifyObject, v| {
            o.set_string(v.try_into()?)
        })
        .property("Bool", &builtin::BOOL, |o: &NotifyObject| Value::Boolean(o.boolean.get()), |o: &NotifyObject, v| {
            o.set_bool(v.try_into()?)
        })
        .build();

    pub static ref PLAIN_OBJECT: TypeRef = TypeInfo::class("PlainObject")
        .property("Int", &builtin::INT, |o: &PlainObject| Value::Integer(o.int.get()), |o: &PlainObject, v| {
            o.int.set(v.try_into()?);
            Ok(())
        })
        .build();

    pub static ref RECORDER: TypeRef = TypeInfo::class("Recorder")
        .method(
            MethodDef::instance("Record", None, |r: &Recorder, args: &[Value]| {
                r.calls.borrow_mut().push(args[0].clone());
                Ok(Value::Null)
            })
            .param("value", &builtin::OBJECT),
        )
        .method(
            MethodDef::instance("Join", None, |r: &Recorder, args: &[Value]| {
                let joined = format!("{}{}", args[0].to_display_string(), args[1].to_display_string());
                r.calls.borrow_mut().push(Value::String(joined));
                Ok(Value::Null)
            })
            .param("a", &builtin::OBJECT)
            .param("b", &builtin::OBJECT),
        )
        .build();

    pub static ref POINT: TypeRef = TypeInfo::structure("Point")
        .struct_field("X", &builtin::INT)
        .struct_field("Y", &builtin::INT)
        .build();

    pub static ref HIERARCHY: [TypeRef; 4] = {
        let h0 = TypeInfo::class("HierarchyObject0").build();
        let h1 = TypeInfo::class("HierarchyObject1").extends(&h0).build();
        let h2 = TypeInfo::class("HierarchyObject2").extends(&h1).build();
        let h3 = TypeInfo::class("HierarchyObject3").extends(&h2).build();
        [h0, h1, h2, h3]
    };

    pub static ref VIEW: TypeRef = TypeInfo::class("View")
        .readonly_property("Text", &builtin::STRING, |v: &View| v.text.borrow().clone().into())
        .build();
}

pub struct NotifyObject {
    int: Cell<i64>,
    float: Cell<f64>,
    string: RefCell<Option<String>>,
    boolean: Cell<bool>,
    changed: PropertyChangedEvent,
    notifications: Cell<usize>,
}

impl Object for NotifyObject {
    fn type_info(&self) -> TypeRef {
        NOTIFY_OBJECT.clone()
    }

    fn property_changed(&self) -> Option<&PropertyChangedEvent> {
        Some(&self.changed)
    }
}

impl NotifyObject {
    pub fn new() -> Rc<Self> {
        Rc::new(Self {
            int: Cell::new(0),
            float: Cell::new(0.0),
            string: RefCell::new(None),
            boolean: Cell::new(false),
            changed: Event::new(),
            notifications: Cell::new(0),
        })
    }

    pub fn int(&self) -> i64 {
        self.int.get()
    }

    pub fn float(&self) -> f64 {
        self.float.get()
    }

    pub fn string(&self) -> Option<String> {
        self.string.borrow().clone()
    }

    pub fn boolean(&self) -> bool {
        self.boolean.get()
    }

    /// Number of notifications raised so far.
    pub fn notifications(&self) -> usize {
        self.notifications.get()
    }

    pub fn handler_count(&self) -> usize {
        self.changed.handler_count()
    }

    fn raise(&self, name: &str) -> Result<(), Error> {
        self.notifications.set(self.notifications.get() + 1);
        self.changed.raise(&PropertyChangedArgs::new(name))
    }

    pub fn set_int(&self, v: i64) -> Result<(), Error> {
        if self.int.get() == v {
            return Ok(());
        }
        self.int.set(v);
        self.raise("Int")
    }

    pub fn set_float(&self, v: f64) -> Result<(), Error> {
        if self.float.get() == v {
            return Ok(());
        }
        self.float.set(v);
        self.raise("Float")
    }

    pub fn set_string(&self, v: Option<String>) -> Result<(), Error> {
        if *self.string.borrow() == v {
            return Ok(());
        }
        self.string.replace(v);
        self.raise("String")
    }

    pub fn set_bool(&self, v: bool) -> Result<(), Error> {
        if self.boolean.get() == v {
            return Ok(());
        }
        self.boolean.set(v);
        self.raise("Bool")
    }

    pub fn member(self: &Rc<Self>, name: &str, member: &str) -> Expr {
        Expr::object(name, self).member(member).unwrap()
    }
}

pub struct PlainObject {
    pub int: Cell<i64>,
}

impl Object for PlainObject {
    fn type_info(&self) -> TypeRef {
        PLAIN_OBJECT.clone()
    }
}

impl PlainObject {
    pub fn new(int: i64) -> Rc<Self> {
        Rc::new(Self { int: Cell::new(int) })
    }
}

#[derive(Default)]
pub struct Recorder {
    pub calls: RefCell<Vec<Value>>,
}

impl Object for Recorder {
    fn type_info(&self) -> TypeRef {
        RECORDER.clone()
    }
}

impl Recorder {
    pub fn new() -> Rc<Self> {
        Rc::new(Self::default())
    }

    pub fn calls(&self) -> Vec<Value> {
        self.calls.borrow().clone()
    }
}

pub struct HierarchyObject {
    level: usize,
    pub changed: Event<()>,
}

impl Object for HierarchyObject {
    fn type_info(&self) -> TypeRef {
        HIERARCHY[self.level].clone()
    }
}

impl HierarchyObject {
    pub fn new(level: usize) -> Rc<Self> {
        Rc::new(Self { level, changed: Event::new() })
    }
}

pub struct View {
    pub text: RefCell<String>,
    pub clicked: Event<()>,
    pub text_changed: Event<String>,
}

impl Object for View {
    fn type_info(&self) -> TypeRef {
        VIEW.clone()
    }

    fn event(&self, name: &str) -> Option<&dyn EventSource> {
        match name {
            "Clicked" => Some(&self.clicked),
            "TextChanged" => Some(&self.text_changed),
            _ => None,
        }
    }
}

impl View {
    pub fn new() -> Rc<Self> {
        Rc::new(Self {
            text: RefCell::new(String::new()),
            clicked: Event::new(),
            text_changed: Event::new(),
        })
    }

    /// Updates the text the way user input would.
    pub fn type_text(&self, text: &str) -> Result<(), Error> {
        self.text.replace(text.to_string());
        self.text_changed.raise(&text.to_string())
    }

    pub fn click(&self) -> Result<(), Error> {
        self.clicked.raise(&())
    }
}

/// Configuration private to one test.
pub fn configuration() -> Arc<Configuration> {
    Arc::new(Configuration::new())
}

pub fn counter() -> (Rc<Cell<usize>>, exprbind::Action) {
    let count = Rc::new(Cell::new(0));
    let c = count.clone();
    let action: exprbind::Action = Rc::new(move || {
        c.set(c.get() + 1);
        Ok(())
    });
    (count, action)
}

pub fn clicked(view: &View) -> &Event<()> {
    &view.clicked
}

pub fn text_changed(view: &View) -> &Event<String> {
    &view.text_changed
}

pub fn hierarchy_changed(object: &HierarchyObject) -> &Event<()> {
    &object.changed
}
