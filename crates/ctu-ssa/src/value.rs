// SPDX-License-Identifier: (MIT OR Apache-2.0)

//! Compile-time values: immediates in operands and results of evaluation.

use std::cell::RefCell;
use std::fmt;
use std::rc::Rc;

use ctu_tree::{Digit, Sign, Type};
use num_bigint::BigInt;

/// A typed compile-time value.
#[derive(Debug, Clone, PartialEq)]
pub struct Value {
    pub ty: Type,
    pub kind: ValueKind,
}

#[derive(Debug, Clone, PartialEq)]
pub enum ValueKind {
    Digit(BigInt),
    Bool(bool),
    String(String),
    Array(ArrayRef),
    /// Result of a failed computation. The message names the first failure;
    /// anything computed from a poison value is poison too.
    Poison(String),
}

/// A view into array storage at some element offset.
///
/// Views derived from the same storage share it, so a store through one view
/// is visible through every other.
#[derive(Debug, Clone, PartialEq)]
pub struct ArrayRef {
    pub elements: Rc<RefCell<Vec<Option<Value>>>>,
    pub offset: usize,
}

impl ArrayRef {
    /// Fresh storage with every element uninitialized.
    pub fn reserve(len: usize) -> Self {
        ArrayRef {
            elements: Rc::new(RefCell::new(vec![None; len])),
            offset: 0,
        }
    }

    pub fn len(&self) -> usize {
        self.elements.borrow().len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Same storage, different offset.
    pub fn at(&self, offset: usize) -> Self {
        ArrayRef {
            elements: Rc::clone(&self.elements),
            offset,
        }
    }

    pub fn in_bounds(&self) -> bool {
        self.offset < self.len()
    }

    /// Element under this view. `None` when out of bounds or uninitialized.
    pub fn get(&self) -> Option<Value> {
        self.elements.borrow().get(self.offset).cloned().flatten()
    }

    /// Write through this view. Returns false if out of bounds.
    pub fn set(&self, value: Value) -> bool {
        match self.elements.borrow_mut().get_mut(self.offset) {
            Some(slot) => {
                *slot = Some(value);
                true
            }
            None => false,
        }
    }
}

impl Value {
    pub fn digit(value: impl Into<BigInt>, ty: Type) -> Self {
        Value {
            ty,
            kind: ValueKind::Digit(value.into()),
        }
    }

    pub fn bool(value: bool) -> Self {
        Value {
            ty: Type::Bool,
            kind: ValueKind::Bool(value),
        }
    }

    pub fn string(value: impl Into<String>) -> Self {
        Value {
            ty: Type::String,
            kind: ValueKind::String(value.into()),
        }
    }

    pub fn array(array: ArrayRef, ty: Type) -> Self {
        Value {
            ty,
            kind: ValueKind::Array(array),
        }
    }

    pub fn poison(message: impl Into<String>, ty: Type) -> Self {
        Value {
            ty,
            kind: ValueKind::Poison(message.into()),
        }
    }

    /// Unsigned size-class index, the type of synthesized array offsets.
    pub fn index(value: usize) -> Self {
        Value::digit(value, Type::digit(Digit::Size, Sign::Unsigned))
    }

    pub fn is_poison(&self) -> bool {
        matches!(self.kind, ValueKind::Poison(_))
    }

    pub fn as_digit(&self) -> Option<&BigInt> {
        match &self.kind {
            ValueKind::Digit(n) => Some(n),
            _ => None,
        }
    }

    pub fn as_bool(&self) -> Option<bool> {
        match self.kind {
            ValueKind::Bool(b) => Some(b),
            _ => None,
        }
    }

    pub fn as_array(&self) -> Option<&ArrayRef> {
        match &self.kind {
            ValueKind::Array(a) => Some(a),
            _ => None,
        }
    }

    /// Same value, re-tagged with another type.
    pub fn retag(&self, ty: Type) -> Self {
        Value {
            ty,
            kind: self.kind.clone(),
        }
    }
}

impl fmt::Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.kind {
            ValueKind::Digit(n) => write!(f, "{}", n),
            ValueKind::Bool(b) => write!(f, "{}", b),
            ValueKind::String(s) => write!(f, "{:?}", s),
            ValueKind::Array(array) => {
                write!(f, "[")?;
                for (i, elem) in array.elements.borrow().iter().enumerate() {
                    if i > 0 {
                        write!(f, ", ")?;
                    }
                    match elem {
                        Some(v) => write!(f, "{}", v)?,
                        None => write!(f, "?")?,
                    }
                }
                write!(f, "]")?;
                if array.offset > 0 {
                    write!(f, "+{}", array.offset)?;
                }
                Ok(())
            }
            ValueKind::Poison(msg) => write!(f, "poison({})", msg),
        }
    }
}
