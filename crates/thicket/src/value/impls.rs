//! Value trait implementations: constructors, predicates, extractors, From traits, PartialEq

use std::sync::Arc;

use super::*;
use crate::error::{type_name, CloneError};

// ═══════════════════════════════════════════════════════════════════
// Convenience Constructors
// ═══════════════════════════════════════════════════════════════════

impl Value {
    /// Create a string value
    pub fn string(s: impl AsRef<str>) -> Self {
        Value::String(Arc::from(s.as_ref()))
    }

    /// Create an array value
    pub fn array(items: Vec<Value>) -> Self {
        Value::Array(Arc::new(items))
    }

    /// Wrap a closure
    pub fn closure(closure: Closure) -> Self {
        Value::Closure(Arc::new(closure))
    }

    // ═══════════════════════════════════════════════════════════════════
    // Type Predicates
    // ═══════════════════════════════════════════════════════════════════
    /// Check if value is void
    pub fn is_void(&self) -> bool {
        matches!(self, Value::Void)
    }

    /// Check if value is null
    pub fn is_null(&self) -> bool {
        matches!(self, Value::Null)
    }

    /// Check if value is numeric (int or double)
    pub fn is_numeric(&self) -> bool {
        matches!(self, Value::Int(_) | Value::Double(_))
    }

    /// Check if value is a string
    pub fn is_string(&self) -> bool {
        matches!(self, Value::String(_))
    }

    /// Check if value is callable
    pub fn is_callable(&self) -> bool {
        matches!(self, Value::Closure(_))
    }

    /// Boolean interpretation used by conditionals.
    ///
    /// `false`, `null`, `void`, `0`, `0.0`, the empty string and the empty
    /// array are false; everything else is true.
    pub fn is_truthy(&self) -> bool {
        match self {
            Value::Void | Value::Null => false,
            Value::Bool(b) => *b,
            Value::Int(n) => *n != 0,
            Value::Double(n) => *n != 0.0,
            Value::String(s) => !s.is_empty(),
            Value::Array(items) => !items.is_empty(),
            Value::Closure(_) | Value::Resource(_) => true,
        }
    }

    // ═══════════════════════════════════════════════════════════════════
    // Extractors (return Option for safe access)
    // ═══════════════════════════════════════════════════════════════════
    /// Extract boolean value
    pub fn as_bool(&self) -> Option<bool> {
        match self {
            Value::Bool(b) => Some(*b),
            _ => None,
        }
    }

    /// Extract as i64 (numeric strings are accepted)
    pub fn as_i64(&self) -> Option<i64> {
        match self {
            Value::Int(n) => Some(*n),
            Value::String(s) => s.trim().parse().ok(),
            _ => None,
        }
    }

    /// Extract as f64 (ints and numeric strings are accepted)
    pub fn as_f64(&self) -> Option<f64> {
        match self {
            Value::Int(n) => Some(*n as f64),
            Value::Double(n) => Some(*n),
            Value::String(s) => s.trim().parse().ok(),
            _ => None,
        }
    }

    /// Extract string slice
    pub fn as_str(&self) -> Option<&str> {
        match self {
            Value::String(s) => Some(s.as_ref()),
            _ => None,
        }
    }

    /// Extract array items
    pub fn as_array(&self) -> Option<&[Value]> {
        match self {
            Value::Array(items) => Some(items.as_slice()),
            _ => None,
        }
    }

    /// Extract the closure
    pub fn as_closure(&self) -> Option<&Arc<Closure>> {
        match self {
            Value::Closure(c) => Some(c),
            _ => None,
        }
    }

    /// Script-level type name
    pub fn type_name(&self) -> &'static str {
        type_name(self)
    }

    // ═══════════════════════════════════════════════════════════════════
    // Copying
    // ═══════════════════════════════════════════════════════════════════
    /// Produce a copy that shares no mutable state with `self`.
    ///
    /// Strings and arrays are immutable and are shared; host resources are
    /// asked to duplicate themselves. Closures are handles: the copy refers
    /// to the same closure.
    ///
    /// # Errors
    ///
    /// Returns `CloneError::NotCopyable` if a resource (possibly nested in an
    /// array) refuses duplication.
    pub fn deep_clone(&self) -> Result<Value, CloneError> {
        match self {
            Value::Array(items) if items.iter().any(Value::holds_resource) => {
                let copied = items
                    .iter()
                    .map(Value::deep_clone)
                    .collect::<Result<Vec<_>, _>>()?;
                Ok(Value::array(copied))
            }
            Value::Resource(r) => {
                r.duplicate()
                    .map(Value::Resource)
                    .ok_or_else(|| CloneError::NotCopyable {
                        type_name: r.type_name().to_string(),
                    })
            }
            other => Ok(other.clone()),
        }
    }

    fn holds_resource(&self) -> bool {
        match self {
            Value::Resource(_) => true,
            Value::Array(items) => items.iter().any(Value::holds_resource),
            _ => false,
        }
    }
}

// ═══════════════════════════════════════════════════════════════════
// PartialEq Implementation
// ═══════════════════════════════════════════════════════════════════

impl PartialEq for Value {
    fn eq(&self, other: &Self) -> bool {
        match (self, other) {
            (Value::Void, Value::Void) => true,
            (Value::Null, Value::Null) => true,
            (Value::Bool(a), Value::Bool(b)) => a == b,
            (Value::Int(a), Value::Int(b)) => a == b,
            (Value::Double(a), Value::Double(b)) => a == b,
            (Value::String(a), Value::String(b)) => a == b,
            (Value::Array(a), Value::Array(b)) => a == b,
            (Value::Closure(a), Value::Closure(b)) => Arc::ptr_eq(a, b),
            (Value::Resource(a), Value::Resource(b)) => Arc::ptr_eq(a, b),
            _ => false,
        }
    }
}

// ═══════════════════════════════════════════════════════════════════
// From Implementations
// ═══════════════════════════════════════════════════════════════════

impl From<bool> for Value {
    fn from(b: bool) -> Self {
        Value::Bool(b)
    }
}

impl From<i64> for Value {
    fn from(n: i64) -> Self {
        Value::Int(n)
    }
}

impl From<i32> for Value {
    fn from(n: i32) -> Self {
        Value::Int(i64::from(n))
    }
}

impl From<f64> for Value {
    fn from(n: f64) -> Self {
        Value::Double(n)
    }
}

impl From<String> for Value {
    fn from(s: String) -> Self {
        Value::String(Arc::from(s))
    }
}

impl From<&str> for Value {
    fn from(s: &str) -> Self {
        Value::string(s)
    }
}

impl<T: Into<Value>> From<Vec<T>> for Value {
    fn from(v: Vec<T>) -> Self {
        Value::array(v.into_iter().map(Into::into).collect())
    }
}

impl<T: Into<Value>> From<Option<T>> for Value {
    fn from(opt: Option<T>) -> Self {
        opt.map_or(Value::Null, Into::into)
    }
}
