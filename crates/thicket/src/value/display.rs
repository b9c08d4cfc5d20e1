//! Display and Debug implementations for Value

use std::fmt;

use super::*;

impl fmt::Debug for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Value::Void => write!(f, "void"),
            Value::Null => write!(f, "null"),
            Value::Bool(b) => write!(f, "{}", b),
            Value::Int(n) => write!(f, "{}", n),
            Value::Double(n) => write!(f, "{:?}", n),
            Value::String(s) => write!(f, "{:?}", s.as_ref()),

            Value::Array(items) => {
                write!(f, "{{")?;
                for (i, item) in items.iter().enumerate() {
                    if i > 0 {
                        write!(f, ", ")?;
                    }
                    write!(f, "{:?}", item)?;
                }
                write!(f, "}}")
            }

            Value::Closure(c) => write!(f, "<closure {}>", c.to_text()),
            Value::Resource(r) => write!(f, "<resource {}>", r.type_name()),
        }
    }
}

impl fmt::Display for Value {
    /// The value's textual form, as scripts see it when concatenating.
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Value::Void => Ok(()),
            Value::String(s) => write!(f, "{}", s),
            Value::Array(items) => {
                write!(f, "{{")?;
                for (i, item) in items.iter().enumerate() {
                    if i > 0 {
                        write!(f, ", ")?;
                    }
                    write!(f, "{}", item)?;
                }
                write!(f, "}}")
            }
            Value::Closure(c) => write!(f, "{}", c.to_text()),
            _ => fmt::Debug::fmt(self, f),
        }
    }
}
