//! Value representation for runtime values

mod display;
mod impls;
mod resource;

pub use resource::Resource;

use std::sync::Arc;

use crate::closure::Closure;

/// Runtime value representation for the Thicket interpreter.
///
/// Values are organized into three tiers:
/// - Tier 1: Inline scalars (no allocation)
/// - Tier 2: Heap-allocated, immutable, `Arc`-shared data
/// - Tier 3: Callables and host handles
///
/// Tier 2 values are never mutated in place, so cloning a `Value` already
/// has value semantics for them. [`Value::deep_clone`] is the copy used when
/// an [`Environment`](crate::Environment) is snapshotted; it additionally
/// duplicates host resources.
#[derive(Clone)]
pub enum Value {
    // ═══════════════════════════════════════════════════════════════════
    // Tier 1: Inline Scalars
    // ═══════════════════════════════════════════════════════════════════
    /// The result of a statement that produces nothing
    Void,

    /// The explicit null value
    Null,

    /// Boolean: `true` or `false`
    Bool(bool),

    /// 64-bit signed integer
    Int(i64),

    /// 64-bit floating point
    Double(f64),

    // ═══════════════════════════════════════════════════════════════════
    // Tier 2: Heap-Allocated Data
    // ═══════════════════════════════════════════════════════════════════
    /// Immutable string
    String(Arc<str>),

    /// Ordered array
    Array(Arc<Vec<Value>>),

    // ═══════════════════════════════════════════════════════════════════
    // Tier 3: Callables and Host Handles
    // ═══════════════════════════════════════════════════════════════════
    /// Anonymous function with a captured environment
    Closure(Arc<Closure>),

    /// Opaque object owned by the host
    Resource(Arc<dyn Resource>),
}
