use parking_lot::RwLock;
use smol_str::SmolStr;

use crate::error::AccessError;
use crate::value::{Value, ValueKind};

pub type SlotGetter<T> = fn(&T) -> Value;
pub type SlotSetter<T> = fn(&mut T, Value) -> Result<(), AccessError>;
pub type StaticGetter = fn() -> Value;
pub type StaticSetter = fn(Value) -> Result<(), AccessError>;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Visibility {
    Public,
    Private,
}

/// Where the field's data lives.
pub enum Slot<T> {
    Instance {
        get: SlotGetter<T>,
        set: SlotSetter<T>,
    },
    /// Type-level storage shared by every instance.
    Static(&'static RwLock<Value>),
}

impl<T> Clone for Slot<T> {
    fn clone(&self) -> Self {
        *self
    }
}

impl<T> Copy for Slot<T> {}

pub enum Getter<T> {
    Instance(SlotGetter<T>),
    Static(StaticGetter),
}

impl<T> Clone for Getter<T> {
    fn clone(&self) -> Self {
        *self
    }
}

impl<T> Copy for Getter<T> {}

impl<T> Getter<T> {
    #[inline]
    pub fn call(&self, target: &T) -> Value {
        match self {
            Getter::Instance(get) => get(target),
            Getter::Static(get) => get(),
        }
    }

    pub fn is_static(&self) -> bool {
        matches!(self, Getter::Static(_))
    }
}

pub enum Setter<T> {
    Instance(SlotSetter<T>),
    Static(StaticSetter),
}

impl<T> Clone for Setter<T> {
    fn clone(&self) -> Self {
        *self
    }
}

impl<T> Copy for Setter<T> {}

impl<T> Setter<T> {
    #[inline]
    pub fn call(&self, target: &mut T, value: Value) -> Result<(), AccessError> {
        match self {
            Setter::Instance(set) => set(target, value),
            Setter::Static(set) => set(value),
        }
    }

    pub fn is_static(&self) -> bool {
        matches!(self, Setter::Static(_))
    }
}

/// A bean-style accessor method and its visibility.
pub struct Method<F> {
    pub call: F,
    pub visibility: Visibility,
}

impl<F: Copy> Clone for Method<F> {
    fn clone(&self) -> Self {
        *self
    }
}

impl<F: Copy> Copy for Method<F> {}

impl<F> Method<F> {
    pub fn is_public(&self) -> bool {
        self.visibility == Visibility::Public
    }
}

/// Direction a counter field may move in.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum IncrementMode {
    #[default]
    Free,
    Increasing,
    Decreasing,
}

/// Static description of one element field.
///
/// Built with the chained setters below and handed to
/// [`crate::schema::SchemaBuilder::field`]:
///
/// ```ignore
/// FieldDescriptor::new("day", ValueKind::Str)
///     .public()
///     .key(1)
///     .slot(|h: &Hits| Value::from(h.day.clone()), |h, v| { ... })
/// ```
pub struct FieldDescriptor<T> {
    name: SmolStr,
    kind: ValueKind,
    visibility: Visibility,
    read_only: bool,
    slot: Option<Slot<T>>,
    getter: Option<Method<Getter<T>>>,
    setter: Option<Method<Setter<T>>>,
    key_order: Option<u8>,
    increment_mode: IncrementMode,
}

impl<T> FieldDescriptor<T> {
    pub fn new(name: impl Into<SmolStr>, kind: ValueKind) -> Self {
        Self {
            name: name.into(),
            kind,
            visibility: Visibility::Private,
            read_only: false,
            slot: None,
            getter: None,
            setter: None,
            key_order: None,
            increment_mode: IncrementMode::Free,
        }
    }

    pub fn public(mut self) -> Self {
        self.visibility = Visibility::Public;
        self
    }

    pub fn read_only(mut self) -> Self {
        self.read_only = true;
        self
    }

    /// Position of this field inside the element's composite key.
    pub fn key(mut self, order: u8) -> Self {
        self.key_order = Some(order);
        self
    }

    pub fn increment_mode(mut self, mode: IncrementMode) -> Self {
        self.increment_mode = mode;
        self
    }

    pub fn slot(mut self, get: SlotGetter<T>, set: SlotSetter<T>) -> Self {
        self.slot = Some(Slot::Instance { get, set });
        self
    }

    pub fn static_slot(mut self, cell: &'static RwLock<Value>) -> Self {
        self.slot = Some(Slot::Static(cell));
        self
    }

    pub fn getter(mut self, get: SlotGetter<T>, visibility: Visibility) -> Self {
        self.getter = Some(Method {
            call: Getter::Instance(get),
            visibility,
        });
        self
    }

    pub fn static_getter(mut self, get: StaticGetter, visibility: Visibility) -> Self {
        self.getter = Some(Method {
            call: Getter::Static(get),
            visibility,
        });
        self
    }

    pub fn setter(mut self, set: SlotSetter<T>, visibility: Visibility) -> Self {
        self.setter = Some(Method {
            call: Setter::Instance(set),
            visibility,
        });
        self
    }

    pub fn static_setter(mut self, set: StaticSetter, visibility: Visibility) -> Self {
        self.setter = Some(Method {
            call: Setter::Static(set),
            visibility,
        });
        self
    }

    pub fn name(&self) -> &SmolStr {
        &self.name
    }

    pub fn kind(&self) -> ValueKind {
        self.kind
    }

    pub fn is_public(&self) -> bool {
        self.visibility == Visibility::Public
    }

    pub fn is_read_only(&self) -> bool {
        self.read_only
    }

    pub fn is_static(&self) -> bool {
        matches!(self.slot, Some(Slot::Static(_)))
    }

    /// Static fields belong to the type, not to stored elements.
    pub fn is_persisted(&self) -> bool {
        !self.is_static()
    }

    pub fn key_order(&self) -> Option<u8> {
        self.key_order
    }

    pub fn mode(&self) -> IncrementMode {
        self.increment_mode
    }

    pub fn field_slot(&self) -> Option<Slot<T>> {
        self.slot
    }

    pub fn public_getter(&self) -> Option<Getter<T>> {
        self.getter.filter(Method::is_public).map(|m| m.call)
    }

    pub fn public_setter(&self) -> Option<Setter<T>> {
        self.setter.filter(Method::is_public).map(|m| m.call)
    }

    pub(crate) fn denied(&self, operation: crate::error::Operation) -> AccessError {
        AccessError::AccessDenied {
            field: self.name.clone(),
            operation,
        }
    }
}
