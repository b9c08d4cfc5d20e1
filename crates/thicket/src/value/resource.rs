//! Host-owned values

use std::fmt;
use std::sync::Arc;

/// An object handed to scripts by the host (a connection, a file handle).
///
/// Scripts can store resources in variables but cannot look inside them.
/// When an environment is snapshotted, each resource is asked to duplicate
/// itself; returning `None` makes the snapshot fail with
/// [`CloneError::NotCopyable`](crate::CloneError::NotCopyable).
pub trait Resource: fmt::Debug + Send + Sync {
    /// Name shown in messages and by `typeof`-style inspection.
    fn type_name(&self) -> &str;

    /// Produce an independent copy, or `None` if this resource cannot be copied.
    fn duplicate(&self) -> Option<Arc<dyn Resource>>;
}
