// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.
//
// Copyright (c) 2025 Pegasus Heavy Industries, LLC

//! Script objects and property storage.

use super::function::Function;
use super::value::Value;
use rustc_hash::FxHashMap;
use std::any::Any;
use std::cell::{Ref, RefCell};
use std::fmt;
use std::rc::Rc;

/// Array writes further than this past the end are stored as plain
/// properties instead of growing the element vector.
const MAX_ARRAY_GROWTH: usize = 1 << 20;

/// Internal representation of an object.
pub enum ObjectKind {
    /// Plain object
    Ordinary,
    /// Array with dense element storage
    Array(Vec<Value>),
    /// Callable object
    Function(Rc<Function>),
    /// Instance created by one of the error constructors
    Error,
}

/// The shape of an object without its payload.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ObjectClass {
    /// Plain object
    Ordinary,
    /// Array
    Array,
    /// Function
    Function,
    /// Error instance
    Error,
}

#[derive(Clone)]
struct Property {
    value: Value,
    enumerable: bool,
}

/// Properties in insertion order with hashed lookup.
#[derive(Default)]
struct PropertyMap {
    entries: Vec<(Rc<str>, Property)>,
    index: FxHashMap<Rc<str>, usize>,
}

impl PropertyMap {
    fn get(&self, key: &str) -> Option<&Property> {
        self.index.get(key).map(|&i| &self.entries[i].1)
    }

    fn insert(&mut self, key: &str, property: Property) {
        match self.index.get(key) {
            Some(&i) => self.entries[i].1 = property,
            None => {
                let key: Rc<str> = key.into();
                self.index.insert(key.clone(), self.entries.len());
                self.entries.push((key, property));
            }
        }
    }

    fn update(&mut self, key: &str, value: Value) -> bool {
        match self.index.get(key) {
            Some(&i) => {
                self.entries[i].1.value = value;
                true
            }
            None => false,
        }
    }

    fn remove(&mut self, key: &str) -> bool {
        let Some(position) = self.index.remove(key) else {
            return false;
        };
        self.entries.remove(position);
        for (i, (key, _)) in self.entries.iter().enumerate().skip(position) {
            self.index.insert(key.clone(), i);
        }
        true
    }

    /// Enumerable keys: integer-like keys ascending, then insertion order.
    fn enumerable_keys(&self) -> Vec<Rc<str>> {
        let mut indexed: Vec<(usize, Rc<str>)> = Vec::new();
        let mut named = Vec::new();

        for (key, property) in &self.entries {
            if !property.enumerable {
                continue;
            }
            match array_index(key) {
                Some(i) => indexed.push((i, key.clone())),
                None => named.push(key.clone()),
            }
        }

        indexed.sort_by_key(|(i, _)| *i);
        indexed.into_iter().map(|(_, key)| key).chain(named).collect()
    }
}

/// A script object.
pub struct Object {
    kind: ObjectKind,
    properties: PropertyMap,
    prototype: Option<ObjectRef>,
    frozen: bool,
    host_data: Option<Rc<dyn Any>>,
}

/// A shared, mutable reference to an object.
#[derive(Clone)]
pub struct ObjectRef(Rc<RefCell<Object>>);

impl ObjectRef {
    /// Creates a new object.
    pub fn new(kind: ObjectKind, prototype: Option<ObjectRef>) -> Self {
        Self(Rc::new(RefCell::new(Object {
            kind,
            properties: PropertyMap::default(),
            prototype,
            frozen: false,
            host_data: None,
        })))
    }

    /// Returns true if both references point at the same object.
    pub fn ptr_eq(&self, other: &ObjectRef) -> bool {
        Rc::ptr_eq(&self.0, &other.0)
    }

    fn borrow(&self) -> Ref<'_, Object> {
        self.0.borrow()
    }

    /// Returns the shape of this object.
    pub fn class(&self) -> ObjectClass {
        match self.borrow().kind {
            ObjectKind::Ordinary => ObjectClass::Ordinary,
            ObjectKind::Array(_) => ObjectClass::Array,
            ObjectKind::Function(_) => ObjectClass::Function,
            ObjectKind::Error => ObjectClass::Error,
        }
    }

    /// Returns true if this is an array.
    pub fn is_array(&self) -> bool {
        self.class() == ObjectClass::Array
    }

    /// Returns true if this object can be called.
    pub fn is_callable(&self) -> bool {
        self.class() == ObjectClass::Function
    }

    /// Returns true if this object was created by an error constructor.
    pub fn is_error(&self) -> bool {
        self.class() == ObjectClass::Error
    }

    /// Returns the function behind a callable object.
    pub fn function(&self) -> Option<Rc<Function>> {
        match &self.borrow().kind {
            ObjectKind::Function(function) => Some(function.clone()),
            _ => None,
        }
    }

    /// The display name of a function object.
    pub fn function_name(&self) -> String {
        if let Some(Value::String(name)) = self.get_own("name") {
            return name.to_string();
        }
        self.function()
            .map(|function| function.name().to_string())
            .unwrap_or_default()
    }

    pub(crate) fn set_kind(&self, kind: ObjectKind) {
        self.0.borrow_mut().kind = kind;
    }

    /// Returns the prototype of this object.
    pub fn prototype(&self) -> Option<ObjectRef> {
        self.borrow().prototype.clone()
    }

    /// Replaces the prototype of this object.
    pub fn set_prototype(&self, prototype: Option<ObjectRef>) {
        self.0.borrow_mut().prototype = prototype;
    }

    /// Reads an own property.
    pub fn get_own(&self, key: &str) -> Option<Value> {
        let object = self.borrow();
        if let ObjectKind::Array(elements) = &object.kind {
            if key == "length" {
                return Some(Value::from(elements.len()));
            }
            if let Some(element) = array_index(key).and_then(|i| elements.get(i)) {
                return Some(element.clone());
            }
        }
        object.properties.get(key).map(|p| p.value.clone())
    }

    /// Reads a property, following the prototype chain.
    pub fn get(&self, key: &str) -> Value {
        let mut current = self.clone();
        loop {
            if let Some(value) = current.get_own(key) {
                return value;
            }
            match current.prototype() {
                Some(prototype) => current = prototype,
                None => return Value::Undefined,
            }
        }
    }

    /// Returns true if the property exists on this object itself.
    pub fn has_own(&self, key: &str) -> bool {
        self.get_own(key).is_some()
    }

    /// Returns true if the property exists on this object or its prototypes.
    pub fn has_property(&self, key: &str) -> bool {
        let mut current = self.clone();
        loop {
            if current.has_own(key) {
                return true;
            }
            match current.prototype() {
                Some(prototype) => current = prototype,
                None => return false,
            }
        }
    }

    /// Writes an own enumerable property. Returns false if the object is
    /// frozen.
    pub fn set(&self, key: &str, value: impl Into<Value>) -> bool {
        let value = value.into();
        let mut object = self.0.borrow_mut();
        if object.frozen {
            return false;
        }

        if let ObjectKind::Array(elements) = &mut object.kind {
            if key == "length" {
                let Some(length) = valid_length(&value) else {
                    return false;
                };
                if length <= elements.len() + MAX_ARRAY_GROWTH {
                    elements.resize(length, Value::Undefined);
                }
                return true;
            }
            if let Some(i) = array_index(key) {
                if i < elements.len() {
                    elements[i] = value;
                    return true;
                }
                if i <= elements.len() + MAX_ARRAY_GROWTH {
                    elements.resize(i, Value::Undefined);
                    elements.push(value);
                    return true;
                }
            }
        }

        if !object.properties.update(key, value.clone()) {
            object.properties.insert(
                key,
                Property {
                    value,
                    enumerable: true,
                },
            );
        }
        true
    }

    /// Defines a non-enumerable property (methods, `constructor`, ...).
    pub fn define_hidden(&self, key: &str, value: impl Into<Value>) {
        self.0.borrow_mut().properties.insert(
            key,
            Property {
                value: value.into(),
                enumerable: false,
            },
        );
    }

    /// Removes an own property. Returns false if the object is frozen.
    pub fn delete(&self, key: &str) -> bool {
        let mut object = self.0.borrow_mut();
        if object.frozen {
            return false;
        }
        if let ObjectKind::Array(elements) = &mut object.kind {
            if let Some(element) = array_index(key).and_then(|i| elements.get_mut(i)) {
                *element = Value::Undefined;
                return true;
            }
        }
        object.properties.remove(key);
        true
    }

    /// Own enumerable keys in property order.
    pub fn keys(&self) -> Vec<Rc<str>> {
        let object = self.borrow();
        let mut keys = Vec::new();
        if let ObjectKind::Array(elements) = &object.kind {
            keys.extend((0..elements.len()).map(|i| Rc::from(i.to_string())));
        }
        keys.extend(object.properties.enumerable_keys());
        keys
    }

    /// Enumerable keys of this object and its prototypes, as `for…in` visits
    /// them.
    pub fn enumerable_keys(&self) -> Vec<Rc<str>> {
        let mut keys: Vec<Rc<str>> = self.keys();
        let mut current = self.prototype();
        while let Some(object) = current {
            for key in object.keys() {
                if !keys.contains(&key) {
                    keys.push(key);
                }
            }
            current = object.prototype();
        }
        keys
    }

    /// Prevents further changes to this object's own properties.
    pub fn freeze(&self) {
        self.0.borrow_mut().frozen = true;
    }

    /// Returns true if [`freeze`](Self::freeze) was called.
    pub fn is_frozen(&self) -> bool {
        self.borrow().frozen
    }

    /// Returns a copy of the elements if this is an array.
    pub fn array_elements(&self) -> Option<Vec<Value>> {
        match &self.borrow().kind {
            ObjectKind::Array(elements) => Some(elements.clone()),
            _ => None,
        }
    }

    /// Element `index` of an array, if the array currently has one there.
    pub fn array_element(&self, index: usize) -> Option<Value> {
        match &self.borrow().kind {
            ObjectKind::Array(elements) => elements.get(index).cloned(),
            _ => None,
        }
    }

    /// Returns the length if this is an array.
    pub fn array_len(&self) -> Option<usize> {
        match &self.borrow().kind {
            ObjectKind::Array(elements) => Some(elements.len()),
            _ => None,
        }
    }

    /// Runs `f` against the element vector of an unfrozen array.
    pub(crate) fn with_elements_mut<R>(&self, f: impl FnOnce(&mut Vec<Value>) -> R) -> Option<R> {
        let mut object = self.0.borrow_mut();
        if object.frozen {
            return None;
        }
        match &mut object.kind {
            ObjectKind::Array(elements) => Some(f(elements)),
            _ => None,
        }
    }

    /// Attaches host data to this object.
    pub fn set_host_data(&self, data: Rc<dyn Any>) {
        self.0.borrow_mut().host_data = Some(data);
    }

    /// Returns the attached host data if it has type `T`.
    pub fn host_data<T: Any>(&self) -> Option<Rc<T>> {
        let data = self.borrow().host_data.clone()?;
        data.downcast::<T>().ok()
    }
}

impl fmt::Debug for ObjectRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.class() {
            ObjectClass::Ordinary => write!(f, "Object"),
            ObjectClass::Array => write!(f, "Array({})", self.array_len().unwrap_or(0)),
            ObjectClass::Function => write!(f, "Function({})", self.function_name()),
            ObjectClass::Error => write!(f, "Error({})", self.get("message")),
        }
    }
}

/// Parses a canonical array index (`"0"`, `"17"`, but not `"01"` or `"-1"`).
pub fn array_index(key: &str) -> Option<usize> {
    if key.is_empty() || key.len() > 10 || (key.len() > 1 && key.starts_with('0')) {
        return None;
    }
    if !key.bytes().all(|b| b.is_ascii_digit()) {
        return None;
    }
    key.parse::<u32>().ok().filter(|&i| i != u32::MAX).map(|i| i as usize)
}

fn valid_length(value: &Value) -> Option<usize> {
    let n = value.to_number();
    if n >= 0.0 && n.fract() == 0.0 && n < u32::MAX as f64 {
        Some(n as usize)
    } else {
        None
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn ordinary() -> ObjectRef {
        ObjectRef::new(ObjectKind::Ordinary, None)
    }

    #[test]
    fn test_property_order() {
        let object = ordinary();
        object.set("b", 1.0);
        object.set("a", 2.0);
        object.set("2", 3.0);
        object.set("1", 4.0);
        object.set("b", 5.0);
        let keys: Vec<String> = object.keys().iter().map(|k| k.to_string()).collect();
        assert_eq!(keys, ["1", "2", "b", "a"]);
        assert_eq!(object.get("b"), Value::Number(5.0));
    }

    #[test]
    fn test_prototype_chain() {
        let parent = ordinary();
        parent.set("greet", "hi");
        let child = ObjectRef::new(ObjectKind::Ordinary, Some(parent.clone()));
        assert_eq!(child.get("greet"), Value::from("hi"));
        assert!(!child.has_own("greet"));
        assert!(child.has_property("greet"));
        assert!(child.get("missing").is_undefined());
    }

    #[test]
    fn test_hidden_properties_are_not_enumerated() {
        let object = ordinary();
        object.define_hidden("constructor", 1.0);
        object.set("x", 2.0);
        assert_eq!(object.keys().len(), 1);
        assert!(object.has_own("constructor"));
    }

    #[test]
    fn test_array_storage() {
        let array = ObjectRef::new(ObjectKind::Array(vec![Value::from(1.0)]), None);
        assert_eq!(array.get("length"), Value::Number(1.0));
        array.set("3", 4.0);
        assert_eq!(array.array_len(), Some(4));
        assert!(array.get("2").is_undefined());
        array.set("length", 1.0);
        assert_eq!(array.array_elements().unwrap().len(), 1);
        array.set("label", "x");
        assert_eq!(array.keys().len(), 2);
    }

    #[test]
    fn test_freeze() {
        let object = ordinary();
        object.set("x", 1.0);
        object.freeze();
        assert!(!object.set("x", 2.0));
        assert!(!object.delete("x"));
        assert_eq!(object.get("x"), Value::Number(1.0));
    }

    #[test]
    fn test_delete_reindexes() {
        let object = ordinary();
        object.set("a", 1.0);
        object.set("b", 2.0);
        object.set("c", 3.0);
        assert!(object.delete("a"));
        object.set("c", 4.0);
        assert_eq!(object.get("c"), Value::Number(4.0));
        assert_eq!(object.keys().len(), 2);
    }

    #[test]
    fn test_host_data() {
        let object = ordinary();
        object.set_host_data(Rc::new(42u32));
        assert_eq!(object.host_data::<u32>().as_deref(), Some(&42));
        assert!(object.host_data::<String>().is_none());
    }

    #[test]
    fn test_array_index() {
        assert_eq!(array_index("0"), Some(0));
        assert_eq!(array_index("42"), Some(42));
        assert_eq!(array_index("01"), None);
        assert_eq!(array_index("-1"), None);
        assert_eq!(array_index("length"), None);
    }
}
